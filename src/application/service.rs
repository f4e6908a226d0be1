use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{
    Cents, IntegrityIssue, NewStatement, OperationType, Statement, StatementId, User, UserId,
    compute_all_balances, compute_balance, scan_integrity,
};
use crate::storage::{MemoryStore, SqliteStore, StatementStore, UserStore};

use super::AppError;
use super::password::{hash_password, verify_password};

/// Application service providing high-level operations for the ledger.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
pub struct LedgerService {
    users: Arc<dyn UserStore>,
    statements: Arc<dyn StatementStore>,
    /// Serializes the validate-then-append sequence of `record`.
    write_lock: Mutex<()>,
}

/// An account's statement history together with its derived balance.
#[derive(Debug, Serialize)]
pub struct AccountStatement {
    pub statements: Vec<Statement>,
    pub balance: Cents,
}

/// Balance entry for one account.
pub struct BalanceEntry {
    pub account: User,
    pub balance: Cents,
}

/// Result of a full-ledger integrity scan.
pub struct IntegrityReport {
    pub account_count: usize,
    pub statement_count: usize,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl LedgerService {
    /// Create a new ledger service over the given stores.
    pub fn new(users: Arc<dyn UserStore>, statements: Arc<dyn StatementStore>) -> Self {
        Self {
            users,
            statements,
            write_lock: Mutex::new(()),
        }
    }

    /// Service over in-memory storage; nothing survives the process.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store)
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let store = Arc::new(SqliteStore::init(&db_url).await?);
        Ok(Self::new(store.clone(), store))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let store = Arc::new(SqliteStore::connect(&db_url).await?);
        Ok(Self::new(store.clone(), store))
    }

    // ========================
    // Account operations
    // ========================

    /// Register a new account, storing only the password hash.
    pub async fn register_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AppError::EmailTaken(email.to_string()));
        }

        let password_hash = hash_password(password)?;
        let user = User::new(name, email, password_hash);
        self.users.insert(&user).await?;

        info!(account = %user.id, email = %user.email, "registered account");
        Ok(user)
    }

    /// Verify credentials for an account. An unknown email and a wrong
    /// password are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        debug!(account = %user.id, "credentials verified");
        Ok(user)
    }

    /// Fetch an account by id.
    pub async fn get_profile(&self, account: UserId) -> Result<User, AppError> {
        self.users
            .find_by_id(account)
            .await?
            .ok_or_else(|| AppError::UserNotFound(account.to_string()))
    }

    /// Resolve an account by email.
    pub async fn find_account_by_email(&self, email: &str) -> Result<User, AppError> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::UserNotFound(email.to_string()))
    }

    /// List all accounts, oldest first.
    pub async fn list_accounts(&self) -> Result<Vec<User>, AppError> {
        Ok(self.users.list().await?)
    }

    // ========================
    // Statement engine
    // ========================

    /// Validate and record one monetary operation as an immutable statement.
    ///
    /// Checks run in a fixed order and stop at the first failure: account
    /// existence, amount positivity, then the funds check for the debited
    /// side. A sender is required for transfers and ignored otherwise. The
    /// write lock spans validation and append, so two debits cannot both
    /// pass the funds check and overdraw an account between them.
    pub async fn record(
        &self,
        account: UserId,
        operation: OperationType,
        amount_cents: Cents,
        description: &str,
        sender: Option<UserId>,
    ) -> Result<Statement, AppError> {
        let _guard = self.write_lock.lock().await;

        if self.users.find_by_id(account).await?.is_none() {
            return Err(AppError::UserNotFound(account.to_string()));
        }

        if amount_cents <= 0 {
            return Err(AppError::InvalidAmount(amount_cents));
        }

        let new = match operation {
            OperationType::Deposit => NewStatement::deposit(account, amount_cents, description),

            OperationType::Withdraw => {
                let balance = self.statements.balance_of(account).await?;
                if balance < amount_cents {
                    return Err(AppError::InsufficientFunds {
                        balance,
                        required: amount_cents,
                    });
                }
                NewStatement::withdraw(account, amount_cents, description)
            }

            OperationType::Transfer => {
                let sender = sender.ok_or_else(|| {
                    AppError::InvalidOperation("transfer requires a sender account".to_string())
                })?;
                if sender == account {
                    return Err(AppError::InvalidOperation(
                        "cannot transfer funds to the same account".to_string(),
                    ));
                }
                if self.users.find_by_id(sender).await?.is_none() {
                    return Err(AppError::UserNotFound(sender.to_string()));
                }

                let balance = self.statements.balance_of(sender).await?;
                if balance < amount_cents {
                    return Err(AppError::InsufficientFunds {
                        balance,
                        required: amount_cents,
                    });
                }
                NewStatement::transfer(account, sender, amount_cents, description)
            }
        };

        let statement = self.statements.append(new).await?;

        info!(
            statement = %statement.id,
            account = %statement.user_id,
            operation = %statement.operation,
            amount_cents = statement.amount_cents,
            "recorded statement"
        );
        Ok(statement)
    }

    /// Record a deposit crediting the account.
    pub async fn deposit(
        &self,
        account: UserId,
        amount_cents: Cents,
        description: &str,
    ) -> Result<Statement, AppError> {
        self.record(account, OperationType::Deposit, amount_cents, description, None)
            .await
    }

    /// Record a withdrawal debiting the account.
    pub async fn withdraw(
        &self,
        account: UserId,
        amount_cents: Cents,
        description: &str,
    ) -> Result<Statement, AppError> {
        self.record(account, OperationType::Withdraw, amount_cents, description, None)
            .await
    }

    /// Record a transfer debiting `sender` and crediting `recipient`.
    pub async fn transfer(
        &self,
        recipient: UserId,
        sender: UserId,
        amount_cents: Cents,
        description: &str,
    ) -> Result<Statement, AppError> {
        self.record(
            recipient,
            OperationType::Transfer,
            amount_cents,
            description,
            Some(sender),
        )
        .await
    }

    // ========================
    // Read paths
    // ========================

    /// Current balance for an account.
    pub async fn get_balance(&self, account: UserId) -> Result<Cents, AppError> {
        if self.users.find_by_id(account).await?.is_none() {
            return Err(AppError::UserNotFound(account.to_string()));
        }
        Ok(self.statements.balance_of(account).await?)
    }

    /// One statement by id, visible only to its owner or sender. An unowned
    /// statement is reported as missing so existence does not leak.
    pub async fn get_statement(
        &self,
        account: UserId,
        statement_id: StatementId,
    ) -> Result<Statement, AppError> {
        if self.users.find_by_id(account).await?.is_none() {
            return Err(AppError::UserNotFound(account.to_string()));
        }

        self.statements
            .find_by_id(statement_id)
            .await?
            .filter(|s| s.involves(account))
            .ok_or_else(|| AppError::StatementNotFound(statement_id.to_string()))
    }

    /// Statement history and derived balance in one consistent snapshot.
    pub async fn statement_history(&self, account: UserId) -> Result<AccountStatement, AppError> {
        if self.users.find_by_id(account).await?.is_none() {
            return Err(AppError::UserNotFound(account.to_string()));
        }

        // One read serves both, so the balance always matches the listing.
        let statements = self.statements.list_for_user(account).await?;
        let balance = compute_balance(account, &statements);

        Ok(AccountStatement {
            statements,
            balance,
        })
    }

    /// Balances for all accounts, including those with no history.
    pub async fn get_all_balances(&self) -> Result<Vec<BalanceEntry>, AppError> {
        let accounts = self.users.list().await?;
        let statements = self.statements.list_all().await?;
        let balances = compute_all_balances(&statements);

        Ok(accounts
            .into_iter()
            .map(|account| {
                let balance = balances.get(&account.id).copied().unwrap_or(0);
                BalanceEntry { account, balance }
            })
            .collect())
    }

    /// Every statement in the ledger, oldest first.
    pub async fn list_statements(&self) -> Result<Vec<Statement>, AppError> {
        Ok(self.statements.list_all().await?)
    }

    /// Map of account ids to emails (useful for display).
    pub async fn get_account_emails(&self) -> Result<HashMap<UserId, String>, AppError> {
        let accounts = self.users.list().await?;
        Ok(accounts.into_iter().map(|u| (u.id, u.email)).collect())
    }

    // ========================
    // Integrity operations
    // ========================

    /// Scan the full ledger for rule violations.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let accounts = self.users.list().await?;
        let statements = self.statements.list_all().await?;

        let known: HashSet<UserId> = accounts.iter().map(|u| u.id).collect();
        let issues = scan_integrity(&statements, &known);

        Ok(IntegrityReport {
            account_count: accounts.len(),
            statement_count: statements.len(),
            issues,
        })
    }
}
