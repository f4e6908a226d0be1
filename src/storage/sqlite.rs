use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Cents, NewStatement, OperationType, Statement, StatementId, User, UserId,
};

use super::{MIGRATION_001_INITIAL, StatementStore, UserStore};

/// SQLite-backed storage for accounts and statements.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(User {
            id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_statement(row: &sqlx::sqlite::SqliteRow) -> Result<Statement> {
        let id_str: String = row.get("id");
        let user_id_str: String = row.get("user_id");
        let sender_id_str: Option<String> = row.get("sender_id");
        let type_str: String = row.get("type");
        let created_at_str: String = row.get("created_at");

        Ok(Statement {
            id: Uuid::parse_str(&id_str).context("Invalid statement ID")?,
            user_id: Uuid::parse_str(&user_id_str).context("Invalid account ID")?,
            sender_id: sender_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid sender ID")?,
            operation: OperationType::from_str(&type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid operation type: {}", type_str))?,
            amount_cents: row.get("amount_cents"),
            description: row.get("description"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by email")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            ORDER BY created_at, email
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_user).collect()
    }
}

#[async_trait]
impl StatementStore for SqliteStore {
    async fn append(&self, new: NewStatement) -> Result<Statement> {
        let statement = new.into_statement();

        // A failed insert must leave no trace of the statement.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO statements (id, user_id, sender_id, type, amount_cents, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(statement.id.to_string())
        .bind(statement.user_id.to_string())
        .bind(statement.sender_id.map(|id| id.to_string()))
        .bind(statement.operation.as_str())
        .bind(statement.amount_cents)
        .bind(&statement.description)
        .bind(statement.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to append statement")?;

        tx.commit()
            .await
            .context("Failed to commit statement")?;

        Ok(statement)
    }

    async fn find_by_id(&self, id: StatementId) -> Result<Option<Statement>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, sender_id, type, amount_cents, description, created_at
            FROM statements
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch statement")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_statement(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, account: UserId) -> Result<Vec<Statement>> {
        let account_str = account.to_string();

        let rows = sqlx::query(
            r#"
            SELECT id, user_id, sender_id, type, amount_cents, description, created_at
            FROM statements
            WHERE user_id = ? OR sender_id = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(&account_str)
        .bind(&account_str)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list statements for account")?;

        rows.iter().map(Self::row_to_statement).collect()
    }

    async fn list_all(&self) -> Result<Vec<Statement>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, sender_id, type, amount_cents, description, created_at
            FROM statements
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list statements")?;

        rows.iter().map(Self::row_to_statement).collect()
    }

    /// Balance via SQL aggregation; must agree with the in-memory fold.
    async fn balance_of(&self, account: UserId) -> Result<Cents> {
        let account_str = account.to_string();

        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN user_id = ? AND type IN ('deposit', 'transfer') THEN amount_cents ELSE 0 END), 0) -
                COALESCE(SUM(CASE WHEN user_id = ? AND type = 'withdraw' THEN amount_cents ELSE 0 END), 0) -
                COALESCE(SUM(CASE WHEN sender_id = ? AND type = 'transfer' THEN amount_cents ELSE 0 END), 0) as balance
            FROM statements
            WHERE user_id = ? OR sender_id = ?
            "#,
        )
        .bind(&account_str)
        .bind(&account_str)
        .bind(&account_str)
        .bind(&account_str)
        .bind(&account_str)
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute balance")?;

        Ok(row.get("balance"))
    }
}
