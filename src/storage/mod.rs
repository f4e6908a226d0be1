mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{Cents, NewStatement, Statement, StatementId, User, UserId};

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Account directory: identity records looked up by id or email.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new account. Fails if the id or email is already taken.
    async fn insert(&self, user: &User) -> Result<()>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// All accounts, oldest first.
    async fn list(&self) -> Result<Vec<User>>;
}

/// Append-only statement ledger plus the balance aggregation.
#[async_trait]
pub trait StatementStore: Send + Sync {
    /// Append one statement, assigning its id and timestamp.
    async fn append(&self, new: NewStatement) -> Result<Statement>;

    async fn find_by_id(&self, id: StatementId) -> Result<Option<Statement>>;

    /// Statements involving the account as owner or sender, oldest first.
    async fn list_for_user(&self, account: UserId) -> Result<Vec<Statement>>;

    /// Every statement in the ledger, oldest first.
    async fn list_all(&self) -> Result<Vec<Statement>>;

    /// Current balance of the account; an account with no history is 0.
    async fn balance_of(&self, account: UserId) -> Result<Cents>;
}
