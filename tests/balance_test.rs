mod common;

use anyhow::Result;
use common::{test_service, StandardUsers};
use denario::application::LedgerError;
use uuid::Uuid;

#[tokio::test]
async fn test_empty_account_has_zero_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = StandardUsers::single(&service).await?;

    let account = service.get_balance(user.id).await?;
    assert_eq!(account.balance_cents, 0);
    assert!(account.movements.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_balance_of_unknown_user() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service.get_balance(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, LedgerError::UserNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_balance_over_mixed_history() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (alice, bob) = StandardUsers::pair(&service).await?;

    service.deposit(alice.id, 90000, "payroll").await?;
    service.withdraw(alice.id, 12575, "groceries").await?;
    service.transfer(alice.id, bob.id, 30000, "rent share").await?;
    service.deposit(alice.id, 250, "refund").await?;
    service.transfer(bob.id, alice.id, 1000, "change").await?;
    service.withdraw(alice.id, 99, "coffee").await?;

    // 90000 - 12575 - 30000 + 250 + 1000 - 99
    let account = service.get_balance(alice.id).await?;
    assert_eq!(account.balance_cents, 48576);
    assert_eq!(account.movements.len(), 6);

    Ok(())
}

#[tokio::test]
async fn test_balances_are_isolated_between_users() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (alice, bob) = StandardUsers::pair(&service).await?;

    service.deposit(alice.id, 11111, "hers").await?;
    service.deposit(bob.id, 22222, "his").await?;
    service.withdraw(bob.id, 2222, "snacks").await?;

    assert_eq!(service.get_balance(alice.id).await?.balance_cents, 11111);
    assert_eq!(service.get_balance(bob.id).await?.balance_cents, 20000);

    Ok(())
}

#[tokio::test]
async fn test_statement_is_ordered_by_insertion() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = StandardUsers::single(&service).await?;

    service.deposit(user.id, 300, "first").await?;
    service.deposit(user.id, 200, "second").await?;
    service.withdraw(user.id, 100, "third").await?;

    let movements = service.get_balance(user.id).await?.movements;
    let descriptions: Vec<&str> = movements.iter().map(|m| m.description.as_str()).collect();
    assert_eq!(descriptions, ["first", "second", "third"]);

    let sequences: Vec<i64> = movements.iter().map(|m| m.sequence).collect();
    assert!(
        sequences.windows(2).all(|w| w[0] < w[1]),
        "sequences must be strictly increasing"
    );

    Ok(())
}

#[tokio::test]
async fn test_balance_is_reproducible_from_history() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = StandardUsers::funded(&service, "Carol", "carol@example.com", 77777).await?;

    service.withdraw(user.id, 7, "a").await?;
    service.withdraw(user.id, 70, "b").await?;
    service.deposit(user.id, 700, "c").await?;

    let account = service.get_balance(user.id).await?;
    let recomputed = denario::domain::compute_balance(&account.movements);
    assert_eq!(account.balance_cents, recomputed);
    assert_eq!(recomputed, 78400);

    Ok(())
}
