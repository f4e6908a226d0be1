use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::domain::{Cents, NewStatement, Statement, StatementId, User, UserId, compute_balance};

use super::{StatementStore, UserStore};

/// In-memory storage for accounts and statements. State lives behind std
/// read-write locks, never held across an await point. Suited to unit tests
/// and throwaway runs; nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    statements: RwLock<Vec<Statement>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: &User) -> Result<()> {
        let mut users = self
            .users
            .write()
            .map_err(|_| anyhow!("account lock poisoned"))?;

        if users.contains_key(&user.id) {
            return Err(anyhow!("duplicate account id {}", user.id));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(anyhow!("duplicate account email {}", user.email));
        }

        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| anyhow!("account lock poisoned"))?;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| anyhow!("account lock poisoned"))?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| anyhow!("account lock poisoned"))?;

        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.email.cmp(&b.email))
        });
        Ok(all)
    }
}

#[async_trait]
impl StatementStore for MemoryStore {
    async fn append(&self, new: NewStatement) -> Result<Statement> {
        let statement = new.into_statement();
        let mut statements = self
            .statements
            .write()
            .map_err(|_| anyhow!("statement lock poisoned"))?;
        statements.push(statement.clone());
        Ok(statement)
    }

    async fn find_by_id(&self, id: StatementId) -> Result<Option<Statement>> {
        let statements = self
            .statements
            .read()
            .map_err(|_| anyhow!("statement lock poisoned"))?;
        Ok(statements.iter().find(|s| s.id == id).cloned())
    }

    async fn list_for_user(&self, account: UserId) -> Result<Vec<Statement>> {
        let statements = self
            .statements
            .read()
            .map_err(|_| anyhow!("statement lock poisoned"))?;
        Ok(statements
            .iter()
            .filter(|s| s.involves(account))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Statement>> {
        let statements = self
            .statements
            .read()
            .map_err(|_| anyhow!("statement lock poisoned"))?;
        Ok(statements.clone())
    }

    async fn balance_of(&self, account: UserId) -> Result<Cents> {
        let statements = self
            .statements
            .read()
            .map_err(|_| anyhow!("statement lock poisoned"))?;
        Ok(compute_balance(account, &statements))
    }
}
