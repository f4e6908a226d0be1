// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use arca::application::LedgerService;
use arca::domain::User;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to create a test service backed by in-memory stores
pub fn memory_service() -> LedgerService {
    LedgerService::in_memory()
}

/// Test fixture: standard account setup
pub struct StandardAccounts;

impl StandardAccounts {
    /// Register Alice and return her account
    pub async fn alice(service: &LedgerService) -> Result<User> {
        let user = service
            .register_account("Alice", "alice@example.com", "correct horse battery")
            .await?;
        Ok(user)
    }

    /// Register Bob and return his account
    pub async fn bob(service: &LedgerService) -> Result<User> {
        let user = service
            .register_account("Bob", "bob@example.com", "hunter2hunter2")
            .await?;
        Ok(user)
    }

    /// Register both standard accounts
    pub async fn create_pair(service: &LedgerService) -> Result<(User, User)> {
        let alice = Self::alice(service).await?;
        let bob = Self::bob(service).await?;
        Ok((alice, bob))
    }
}
