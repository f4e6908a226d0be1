mod common;

use anyhow::Result;
use arca::application::AppError;
use arca::domain::OperationType;
use common::{StandardAccounts, memory_service};
use uuid::Uuid;

#[tokio::test]
async fn test_deposits_and_withdrawals_accumulate() -> Result<()> {
    let service = memory_service();
    let alice = StandardAccounts::alice(&service).await?;

    service.deposit(alice.id, 15000, "salary").await?;
    service.withdraw(alice.id, 10000, "rent").await?;
    service.deposit(alice.id, 7500, "refund").await?;

    assert_eq!(service.get_balance(alice.id).await?, 12500);

    let history = service.statement_history(alice.id).await?;
    assert_eq!(history.statements.len(), 3);
    assert_eq!(history.balance, 12500);

    Ok(())
}

#[tokio::test]
async fn test_overdraft_is_rejected() -> Result<()> {
    let service = memory_service();
    let alice = StandardAccounts::alice(&service).await?;

    service.deposit(alice.id, 15000, "salary").await?;
    service.withdraw(alice.id, 10000, "rent").await?;

    // Only 50.00 left; the second 100.00 withdrawal must fail
    let result = service.withdraw(alice.id, 10000, "rent again").await;
    assert!(matches!(
        result,
        Err(AppError::InsufficientFunds {
            balance: 5000,
            required: 10000
        })
    ));

    // The failed withdrawal must leave no statement behind
    let history = service.statement_history(alice.id).await?;
    assert_eq!(history.statements.len(), 2);
    assert_eq!(history.balance, 5000);

    Ok(())
}

#[tokio::test]
async fn test_transfer_moves_funds_between_accounts() -> Result<()> {
    let service = memory_service();
    let (alice, bob) = StandardAccounts::create_pair(&service).await?;

    service.deposit(alice.id, 15000, "salary").await?;
    let statement = service.transfer(bob.id, alice.id, 12000, "loan").await?;

    // A single statement records both sides of the transfer
    assert_eq!(statement.operation, OperationType::Transfer);
    assert_eq!(statement.user_id, bob.id);
    assert_eq!(statement.sender_id, Some(alice.id));
    assert_eq!(statement.amount_cents, 12000);

    assert_eq!(service.get_balance(alice.id).await?, 3000);
    assert_eq!(service.get_balance(bob.id).await?, 12000);

    Ok(())
}

#[tokio::test]
async fn test_failed_transfer_leaves_no_trace() -> Result<()> {
    let service = memory_service();
    let (alice, bob) = StandardAccounts::create_pair(&service).await?;

    // Alice has no funds at all
    let result = service.transfer(bob.id, alice.id, 5000, "loan").await;
    assert!(matches!(
        result,
        Err(AppError::InsufficientFunds {
            balance: 0,
            required: 5000
        })
    ));

    assert_eq!(service.get_balance(alice.id).await?, 0);
    assert_eq!(service.get_balance(bob.id).await?, 0);
    assert!(service.statement_history(alice.id).await?.statements.is_empty());
    assert!(service.statement_history(bob.id).await?.statements.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_unknown_account_is_checked_before_amount() -> Result<()> {
    let service = memory_service();

    // An invalid amount on a nonexistent account still reports the account
    let result = service.deposit(Uuid::new_v4(), -500, "bogus").await;
    assert!(matches!(result, Err(AppError::UserNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_non_positive_amounts_are_rejected() -> Result<()> {
    let service = memory_service();
    let (alice, bob) = StandardAccounts::create_pair(&service).await?;
    service.deposit(alice.id, 10000, "funding").await?;

    assert!(matches!(
        service.deposit(alice.id, 0, "nothing").await,
        Err(AppError::InvalidAmount(0))
    ));
    assert!(matches!(
        service.withdraw(alice.id, -100, "negative").await,
        Err(AppError::InvalidAmount(-100))
    ));
    assert!(matches!(
        service.transfer(bob.id, alice.id, 0, "nothing").await,
        Err(AppError::InvalidAmount(0))
    ));

    // Rejections must not change the ledger
    assert_eq!(service.statement_history(alice.id).await?.statements.len(), 1);
    assert_eq!(service.get_balance(alice.id).await?, 10000);

    Ok(())
}

#[tokio::test]
async fn test_transfer_requires_a_sender() -> Result<()> {
    let service = memory_service();
    let alice = StandardAccounts::alice(&service).await?;

    let result = service
        .record(alice.id, OperationType::Transfer, 1000, "orphan", None)
        .await;
    assert!(matches!(result, Err(AppError::InvalidOperation(_))));

    Ok(())
}

#[tokio::test]
async fn test_self_transfer_is_rejected() -> Result<()> {
    let service = memory_service();
    let alice = StandardAccounts::alice(&service).await?;
    service.deposit(alice.id, 10000, "funding").await?;

    let result = service.transfer(alice.id, alice.id, 1000, "round trip").await;
    assert!(matches!(result, Err(AppError::InvalidOperation(_))));

    assert_eq!(service.get_balance(alice.id).await?, 10000);
    assert_eq!(service.statement_history(alice.id).await?.statements.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_transfer_with_unknown_parties_is_rejected() -> Result<()> {
    let service = memory_service();
    let alice = StandardAccounts::alice(&service).await?;
    service.deposit(alice.id, 10000, "funding").await?;

    // Unknown recipient
    let result = service.transfer(Uuid::new_v4(), alice.id, 1000, "to nobody").await;
    assert!(matches!(result, Err(AppError::UserNotFound(_))));

    // Unknown sender
    let result = service.transfer(alice.id, Uuid::new_v4(), 1000, "from nobody").await;
    assert!(matches!(result, Err(AppError::UserNotFound(_))));

    assert_eq!(service.get_balance(alice.id).await?, 10000);

    Ok(())
}

#[tokio::test]
async fn test_sender_is_ignored_outside_transfers() -> Result<()> {
    let service = memory_service();
    let (alice, bob) = StandardAccounts::create_pair(&service).await?;

    let statement = service
        .record(
            alice.id,
            OperationType::Deposit,
            5000,
            "salary",
            Some(bob.id),
        )
        .await?;
    assert_eq!(statement.sender_id, None);

    let statement = service
        .record(
            alice.id,
            OperationType::Withdraw,
            2000,
            "groceries",
            Some(bob.id),
        )
        .await?;
    assert_eq!(statement.sender_id, None);

    // Bob's balance is untouched by Alice's deposits and withdrawals
    assert_eq!(service.get_balance(bob.id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_statement_round_trip() -> Result<()> {
    let service = memory_service();
    let alice = StandardAccounts::alice(&service).await?;

    let recorded = service.deposit(alice.id, 4200, "first paycheck").await?;
    let fetched = service.get_statement(alice.id, recorded.id).await?;

    assert_eq!(fetched.id, recorded.id);
    assert_eq!(fetched.user_id, alice.id);
    assert_eq!(fetched.sender_id, None);
    assert_eq!(fetched.operation, OperationType::Deposit);
    assert_eq!(fetched.amount_cents, 4200);
    assert_eq!(fetched.description, "first paycheck");
    assert_eq!(fetched.created_at, recorded.created_at);

    Ok(())
}

#[tokio::test]
async fn test_history_is_chronological() -> Result<()> {
    let service = memory_service();
    let alice = StandardAccounts::alice(&service).await?;

    let first = service.deposit(alice.id, 1000, "one").await?;
    let second = service.deposit(alice.id, 2000, "two").await?;
    let third = service.withdraw(alice.id, 500, "three").await?;

    let history = service.statement_history(alice.id).await?;
    let ids: Vec<_> = history.statements.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![first.id, second.id, third.id]);

    let timestamps: Vec<_> = history.statements.iter().map(|s| s.created_at).collect();
    let mut sorted = timestamps.clone();
    sorted.sort();
    assert_eq!(timestamps, sorted);

    Ok(())
}
