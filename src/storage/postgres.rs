//! PostgreSQL-backed item store.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};

use super::{ItemRepository, StorageError, StorageResult};
use crate::config::StorageConfig;
use crate::models::{Item, ItemStatus};

const CREATE_ITEMS_TABLE: &str = include_str!("../../migrations/20250101000000_create_items.sql");

/// Move the id sequence past an explicitly written id so generated ids never
/// collide with it. Never moves the sequence backwards.
const ADVANCE_ID_SEQUENCE: &str = r#"
    SELECT setval(seq, $1)
    FROM (SELECT pg_get_serial_sequence('items', 'id')::regclass AS seq) s
    WHERE $1 > COALESCE(pg_sequence_last_value(seq), 0)
"#;

/// Row shape of the `items` table
#[derive(Debug, Clone, FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    description: String,
    status: String,
    email: String,
}

impl TryFrom<ItemRow> for Item {
    type Error = StorageError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let status: ItemStatus = row.status.parse().map_err(|_| StorageError::Inconsistent {
            id: row.id,
            reason: format!("unknown status '{}'", row.status),
        })?;

        Ok(Item {
            id: Some(row.id),
            name: row.name,
            description: row.description,
            status,
            email: row.email,
        })
    }
}

fn query_error(operation: &str) -> impl FnOnce(sqlx::Error) -> StorageError + '_ {
    move |e| match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::unavailable(e.to_string())
        }
        other => StorageError::query_failed(operation, other.to_string()),
    }
}

/// Repository over a shared `PgPool`
#[derive(Debug, Clone)]
pub struct PgItemRepository {
    pool: PgPool,
}

impl PgItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using the storage section of the configuration
    pub async fn connect(config: &StorageConfig) -> StorageResult<Self> {
        let database_url = config
            .database_url
            .as_deref()
            .ok_or_else(|| StorageError::unavailable("no database_url configured"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StorageError::unavailable(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Connected to PostgreSQL item store"
        );
        Ok(Self::new(pool))
    }

    /// Create the `items` table when missing
    pub async fn run_migrations(&self) -> StorageResult<()> {
        sqlx::query(CREATE_ITEMS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(query_error("run_migrations"))?;
        debug!("Item table migration applied");
        Ok(())
    }

    async fn upsert_with_id(&self, id: i64, item: &Item) -> Result<ItemRow, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            INSERT INTO items (id, name, description, status, email)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                status = EXCLUDED.status,
                email = EXCLUDED.email
            RETURNING id, name, description, status, email
            "#,
        )
        .bind(id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.status.as_str())
        .bind(&item.email)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(ADVANCE_ID_SEQUENCE)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn find_all_ids(&self) -> StorageResult<Vec<i64>> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM items ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("find_all_ids"))
    }

    async fn find_all(&self) -> StorageResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT id, name, description, status, email FROM items ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_error("find_all"))?;

        rows.into_iter().map(Item::try_from).collect()
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT id, name, description, status, email FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error("find_by_id"))?;

        row.map(Item::try_from).transpose()
    }

    async fn save(&self, item: Item) -> StorageResult<Item> {
        let row = match item.id {
            Some(id) => self.upsert_with_id(id, &item).await,
            None => {
                sqlx::query_as::<_, ItemRow>(
                    r#"
                    INSERT INTO items (name, description, status, email)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id, name, description, status, email
                    "#,
                )
                .bind(&item.name)
                .bind(&item.description)
                .bind(item.status.as_str())
                .bind(&item.email)
                .fetch_one(&self.pool)
                .await
            }
        }
        .map_err(query_error("save"))?;

        Item::try_from(row)
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<()> {
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_error("delete_by_id"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> Item {
        Item::new(name, "Description 1", "email@email.com")
    }

    #[test]
    fn test_unknown_status_is_inconsistent() {
        let row = ItemRow {
            id: 9,
            name: "Item 9".to_string(),
            description: "Description 9".to_string(),
            status: "DONE".to_string(),
            email: "email@email.com".to_string(),
        };

        let err = Item::try_from(row).unwrap_err();

        match err {
            StorageError::Inconsistent { id, reason } => {
                assert_eq!(id, 9);
                assert!(reason.contains("DONE"));
            }
            other => panic!("expected inconsistent state, got {other:?}"),
        }
    }

    #[test]
    fn test_row_converts_to_item() {
        let row = ItemRow {
            id: 3,
            name: "Item 3".to_string(),
            description: "Description 3".to_string(),
            status: "PROCESSED".to_string(),
            email: "email@email.com".to_string(),
        };

        let item = Item::try_from(row).unwrap();

        assert_eq!(item.id, Some(3));
        assert!(item.is_processed());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_find_all_ids_is_ordered(pool: PgPool) {
        let repository = PgItemRepository::new(pool);
        let mut created = Vec::new();
        for n in 1..=3 {
            let saved = repository.save(item(&format!("Item {n}"))).await.unwrap();
            created.push(saved.id.unwrap());
        }
        repository.delete_by_id(created[1]).await.unwrap();

        let ids = repository.find_all_ids().await.unwrap();

        assert_eq!(ids, vec![created[0], created[2]]);
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_save_without_id_assigns_one(pool: PgPool) {
        let repository = PgItemRepository::new(pool);

        let saved = repository.save(item("Item 1")).await.unwrap();

        let id = saved.id.unwrap();
        assert_eq!(saved.status, ItemStatus::Unprocessed);
        assert_eq!(repository.find_by_id(id).await.unwrap(), Some(saved));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_save_with_id_overwrites_row(pool: PgPool) {
        let repository = PgItemRepository::new(pool);
        let saved = repository.save(item("Item 1")).await.unwrap();
        let id = saved.id.unwrap();

        let mut processed = saved.clone();
        processed.mark_processed();
        processed.name = "Renamed item".to_string();
        let updated = repository.save(processed).await.unwrap();

        assert_eq!(updated.id, Some(id));
        assert_eq!(updated.status, ItemStatus::Processed);
        assert_eq!(updated.name, "Renamed item");
        assert_eq!(repository.find_all().await.unwrap(), vec![updated]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_explicit_id_advances_generated_ids(pool: PgPool) {
        let repository = PgItemRepository::new(pool);

        let explicit = repository.save(item("Item 100").with_id(100)).await.unwrap();
        let generated = repository.save(item("Item 101")).await.unwrap();

        assert_eq!(explicit.id, Some(100));
        assert!(generated.id.unwrap() > 100);

        // A lower explicit id leaves the sequence where it is
        repository.save(item("Item 5").with_id(5)).await.unwrap();
        let next = repository.save(item("Item 102")).await.unwrap();
        assert!(next.id.unwrap() > generated.id.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_is_idempotent(pool: PgPool) {
        let repository = PgItemRepository::new(pool);
        let id = repository.save(item("Item 1")).await.unwrap().id.unwrap();

        repository.delete_by_id(id).await.unwrap();
        repository.delete_by_id(id).await.unwrap();
        repository.delete_by_id(404).await.unwrap();

        assert!(repository.find_by_id(id).await.unwrap().is_none());
        assert!(repository.find_all_ids().await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_stored_unknown_status_surfaces_as_inconsistent(pool: PgPool) {
        sqlx::query(
            "INSERT INTO items (id, name, description, status, email) VALUES (7, 'Item 7', 'Description 7', 'DONE', 'e@e.com')",
        )
        .execute(&pool)
        .await
        .unwrap();
        let repository = PgItemRepository::new(pool);

        let err = repository.find_by_id(7).await.unwrap_err();

        assert!(matches!(err, StorageError::Inconsistent { id: 7, .. }));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_run_migrations_is_repeatable(pool: PgPool) {
        let repository = PgItemRepository::new(pool);

        repository.run_migrations().await.unwrap();

        assert!(repository.find_all().await.unwrap().is_empty());
    }
}
