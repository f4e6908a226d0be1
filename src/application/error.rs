use thiserror::Error;

use crate::domain::{Cents, format_cents};

use super::PasswordError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account not found: {0}")]
    UserNotFound(String),

    #[error("Invalid amount: {} (amounts must be positive)", format_cents(*.0))]
    InvalidAmount(Cents),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error(
        "Insufficient funds: balance {}, required {}",
        format_cents(*balance),
        format_cents(*required)
    )]
    InsufficientFunds { balance: Cents, required: Cents },

    #[error("Statement not found: {0}")]
    StatementNotFound(String),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
