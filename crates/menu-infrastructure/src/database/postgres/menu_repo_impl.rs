// ============================================================================
// Menu Infrastructure - PostgreSQL Menu Repository
// File: crates/menu-infrastructure/src/database/postgres/menu_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, error};

use menu_core::domain::{
    assemble_tree, MenuId, MenuRecord, MenuUpdate, NewMenuRow, PersistedRootMenu,
};
use menu_core::error::DomainError;
use menu_core::repositories::{MenuRepository, MenuTransaction, MenuWriter};

/// Postgres caps a statement at 65535 bind parameters; each menu row binds four.
const INSERT_CHUNK_ROWS: usize = 65_535 / 4;

pub struct PgMenuRepository {
    pool: PgPool,
}

impl PgMenuRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuRepository for PgMenuRepository {
    type Transaction = PgMenuTransaction;

    async fn begin(&self) -> Result<PgMenuTransaction, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("beginning menu transaction"))?;

        Ok(PgMenuTransaction { tx })
    }
}

/// Open transaction on the `menu` table. Rolled back by sqlx when dropped uncommitted.
pub struct PgMenuTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl MenuTransaction for PgMenuTransaction {
    async fn commit(self) -> Result<(), DomainError> {
        self.tx
            .commit()
            .await
            .map_err(db_error("committing menu transaction"))
    }
}

#[async_trait]
impl MenuWriter for PgMenuTransaction {
    async fn load_existing_tree(&mut self) -> Result<Vec<PersistedRootMenu>, DomainError> {
        // Row locks keep a concurrent sync from diffing against the same snapshot.
        let rows: Vec<MenuRow> = sqlx::query_as(
            r#"
            SELECT id, parent_id, name, list_order
            FROM menu
            ORDER BY parent_id NULLS FIRST, list_order, id
            FOR UPDATE
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("loading menu tree"))?;

        debug!("Loaded {} menu rows", rows.len());
        assemble_tree(rows.into_iter().map(MenuRecord::from).collect())
    }

    async fn bulk_insert(&mut self, rows: &[NewMenuRow]) -> Result<Vec<MenuId>, DomainError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        // Ids are drawn from the sequence up front so the batch maps back to rows
        // without relying on the order of RETURNING.
        let ids: Vec<MenuId> = sqlx::query_scalar(
            r#"
            SELECT nextval(pg_get_serial_sequence('menu', 'id'))
            FROM generate_series(1, $1)
            "#,
        )
        .bind(rows.len() as i64)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("reserving menu ids"))?;

        let batches = rows.chunks(INSERT_CHUNK_ROWS).zip(ids.chunks(INSERT_CHUNK_ROWS));
        for (chunk, chunk_ids) in batches {
            let mut query_builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO menu (id, parent_id, name, list_order) ");

            query_builder.push_values(chunk.iter().zip(chunk_ids), |mut b, (row, id)| {
                b.push_bind(*id)
                    .push_bind(row.parent_id)
                    .push_bind(&row.name)
                    .push_bind(row.list_order);
            });

            query_builder
                .build()
                .execute(&mut *self.tx)
                .await
                .map_err(db_error("batch inserting menus"))?;
        }

        Ok(ids)
    }

    async fn bulk_update(&mut self, updates: &[MenuUpdate]) -> Result<u64, DomainError> {
        if updates.is_empty() {
            return Ok(0);
        }

        let ids: Vec<MenuId> = updates.iter().map(|u| u.id).collect();
        let names: Vec<String> = updates.iter().map(|u| u.name.clone()).collect();
        let orders: Vec<i32> = updates.iter().map(|u| u.list_order).collect();

        let result = sqlx::query(
            r#"
            UPDATE menu AS m
            SET name = v.name, list_order = v.list_order
            FROM UNNEST($1::int8[], $2::text[], $3::int4[]) AS v(id, name, list_order)
            WHERE m.id = v.id
            "#,
        )
        .bind(ids)
        .bind(names)
        .bind(orders)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("batch updating menus"))?;

        Ok(result.rows_affected())
    }

    async fn delete_by_ids(&mut self, ids: &[MenuId]) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM menu WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("batch deleting menus"))?;

        Ok(result.rows_affected())
    }

    async fn save_single(&mut self, row: &NewMenuRow) -> Result<MenuId, DomainError> {
        let id: MenuId = sqlx::query_scalar(
            r#"
            INSERT INTO menu (parent_id, name, list_order)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(row.parent_id)
        .bind(&row.name)
        .bind(row.list_order)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("inserting menu"))?;

        Ok(id)
    }

    async fn update_single(&mut self, update: &MenuUpdate) -> Result<(), DomainError> {
        sqlx::query("UPDATE menu SET name = $2, list_order = $3 WHERE id = $1")
            .bind(update.id)
            .bind(&update.name)
            .bind(update.list_order)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("updating menu"))?;

        Ok(())
    }

    async fn delete_single(&mut self, id: MenuId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM menu WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("deleting menu"))?;

        Ok(result.rows_affected() > 0)
    }
}

fn db_error(action: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e: sqlx::Error| {
        error!("Database error {}: {}", action, e);
        match e.as_database_error() {
            Some(db_err) if db_err.is_foreign_key_violation() => {
                DomainError::ConstraintViolation(db_err.message().to_string())
            }
            _ => DomainError::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, FromRow)]
struct MenuRow {
    id: i64,
    parent_id: Option<i64>,
    name: String,
    list_order: i32,
}

impl From<MenuRow> for MenuRecord {
    fn from(row: MenuRow) -> Self {
        MenuRecord {
            id: row.id,
            parent_id: row.parent_id,
            name: row.name,
            list_order: row.list_order,
        }
    }
}
