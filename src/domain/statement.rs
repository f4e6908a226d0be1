use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, UserId};

pub type StatementId = Uuid;

/// The closed set of ledger operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Credits the owning account.
    Deposit,
    /// Debits the owning account.
    Withdraw,
    /// Credits the owning account and debits the sender account.
    Transfer,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Deposit => "deposit",
            OperationType::Withdraw => "withdraw",
            OperationType::Transfer => "transfer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(OperationType::Deposit),
            "withdraw" => Some(OperationType::Withdraw),
            "transfer" => Some(OperationType::Transfer),
            _ => None,
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable ledger entry. Statements are append-only: once recorded they
/// are never updated or deleted, and balances are always derived from the
/// full history rather than stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub id: StatementId,
    /// The account whose ledger this entry belongs to. Credited by deposits
    /// and incoming transfers, debited by withdrawals.
    pub user_id: UserId,
    /// The debited counterparty; set only for transfers.
    pub sender_id: Option<UserId>,
    #[serde(rename = "type")]
    pub operation: OperationType,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Statement {
    /// Whether the given account appears in this entry, as owner or sender.
    pub fn involves(&self, account: UserId) -> bool {
        self.user_id == account || self.sender_id == Some(account)
    }
}

/// A validated append request. The ledger store assigns id and timestamp at
/// append time.
#[derive(Debug, Clone)]
pub struct NewStatement {
    pub user_id: UserId,
    pub sender_id: Option<UserId>,
    pub operation: OperationType,
    pub amount_cents: Cents,
    pub description: String,
}

impl NewStatement {
    pub fn deposit(user_id: UserId, amount_cents: Cents, description: impl Into<String>) -> Self {
        Self {
            user_id,
            sender_id: None,
            operation: OperationType::Deposit,
            amount_cents,
            description: description.into(),
        }
    }

    pub fn withdraw(user_id: UserId, amount_cents: Cents, description: impl Into<String>) -> Self {
        Self {
            user_id,
            sender_id: None,
            operation: OperationType::Withdraw,
            amount_cents,
            description: description.into(),
        }
    }

    pub fn transfer(
        recipient: UserId,
        sender: UserId,
        amount_cents: Cents,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: recipient,
            sender_id: Some(sender),
            operation: OperationType::Transfer,
            amount_cents,
            description: description.into(),
        }
    }

    /// Materialize the entry with a fresh id and the current time.
    pub fn into_statement(self) -> Statement {
        Statement {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            sender_id: self.sender_id,
            operation: self.operation,
            amount_cents: self.amount_cents,
            description: self.description,
            created_at: Utc::now(),
        }
    }
}
