use std::collections::{HashMap, HashSet};

use super::{Cents, OperationType, Statement, StatementId, UserId};

/// Compute the balance for a single account from a statement history.
/// Balance = deposits - withdrawals + incoming transfers - outgoing transfers.
///
/// Performs no existence check: an account with no history is 0. The result
/// is signed and never clamped.
pub fn compute_balance(account: UserId, statements: &[Statement]) -> Cents {
    statements.iter().fold(0, |mut balance, entry| {
        if entry.user_id == account {
            match entry.operation {
                OperationType::Deposit | OperationType::Transfer => {
                    balance += entry.amount_cents;
                }
                OperationType::Withdraw => balance -= entry.amount_cents,
            }
        }
        if entry.operation == OperationType::Transfer && entry.sender_id == Some(account) {
            balance -= entry.amount_cents;
        }
        balance
    })
}

/// Compute balances for every account that appears in the history.
/// Returns a map of account id -> balance.
pub fn compute_all_balances(statements: &[Statement]) -> HashMap<UserId, Cents> {
    let mut balances: HashMap<UserId, Cents> = HashMap::new();

    for entry in statements {
        match entry.operation {
            OperationType::Deposit => {
                *balances.entry(entry.user_id).or_insert(0) += entry.amount_cents;
            }
            OperationType::Withdraw => {
                *balances.entry(entry.user_id).or_insert(0) -= entry.amount_cents;
            }
            OperationType::Transfer => {
                *balances.entry(entry.user_id).or_insert(0) += entry.amount_cents;
                if let Some(sender) = entry.sender_id {
                    *balances.entry(sender).or_insert(0) -= entry.amount_cents;
                }
            }
        }
    }

    balances
}

/// A rule violation found by a ledger scan. A healthy ledger yields none:
/// the engine refuses every write that would create one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    NonPositiveAmount {
        statement_id: StatementId,
        amount_cents: Cents,
    },
    TransferWithoutSender {
        statement_id: StatementId,
    },
    SelfTransfer {
        statement_id: StatementId,
    },
    UnexpectedSender {
        statement_id: StatementId,
    },
    UnknownAccount {
        statement_id: StatementId,
        account: UserId,
    },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::NonPositiveAmount {
                statement_id,
                amount_cents,
            } => {
                write!(
                    f,
                    "statement {} has non-positive amount {} cents",
                    statement_id, amount_cents
                )
            }
            IntegrityIssue::TransferWithoutSender { statement_id } => {
                write!(f, "transfer {} has no sender account", statement_id)
            }
            IntegrityIssue::SelfTransfer { statement_id } => {
                write!(f, "transfer {} sends funds to its own sender", statement_id)
            }
            IntegrityIssue::UnexpectedSender { statement_id } => {
                write!(f, "non-transfer {} carries a sender account", statement_id)
            }
            IntegrityIssue::UnknownAccount {
                statement_id,
                account,
            } => {
                write!(
                    f,
                    "statement {} references unknown account {}",
                    statement_id, account
                )
            }
        }
    }
}

/// Scan a statement history for rule violations. `known_accounts` is the set
/// of ids the account directory can resolve.
pub fn scan_integrity(
    statements: &[Statement],
    known_accounts: &HashSet<UserId>,
) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    for entry in statements {
        if entry.amount_cents <= 0 {
            issues.push(IntegrityIssue::NonPositiveAmount {
                statement_id: entry.id,
                amount_cents: entry.amount_cents,
            });
        }

        match entry.operation {
            OperationType::Transfer => match entry.sender_id {
                None => issues.push(IntegrityIssue::TransferWithoutSender {
                    statement_id: entry.id,
                }),
                Some(sender) if sender == entry.user_id => {
                    issues.push(IntegrityIssue::SelfTransfer {
                        statement_id: entry.id,
                    });
                }
                Some(_) => {}
            },
            _ => {
                if entry.sender_id.is_some() {
                    issues.push(IntegrityIssue::UnexpectedSender {
                        statement_id: entry.id,
                    });
                }
            }
        }

        if !known_accounts.contains(&entry.user_id) {
            issues.push(IntegrityIssue::UnknownAccount {
                statement_id: entry.id,
                account: entry.user_id,
            });
        }
        if let Some(sender) = entry.sender_id {
            if !known_accounts.contains(&sender) {
                issues.push(IntegrityIssue::UnknownAccount {
                    statement_id: entry.id,
                    account: sender,
                });
            }
        }
    }

    issues
}
