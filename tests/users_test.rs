mod common;

use anyhow::Result;
use common::{test_service, StandardUsers};
use denario::application::LedgerError;
use uuid::Uuid;

#[tokio::test]
async fn test_register_and_fetch_profile() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let registered = service
        .register_user("Ada".into(), "ada@example.com".into(), "s3cret".into())
        .await?;

    let profile = service.get_user_profile(registered.id).await?;
    assert_eq!(profile.id, registered.id);
    assert_eq!(profile.name, "Ada");
    assert_eq!(profile.email, "ada@example.com");
    assert_eq!(profile.password, "s3cret");

    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .register_user("Ada".into(), "ada@example.com".into(), "pw1".into())
        .await?;
    let err = service
        .register_user("Imposter".into(), "ada@example.com".into(), "pw2".into())
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::UserAlreadyExists(_)));

    let users = service.list_users().await?;
    assert_eq!(users.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_find_user_by_email() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (alice, _bob) = StandardUsers::pair(&service).await?;

    let found = service.find_user_by_email("alice@example.com").await?;
    assert_eq!(found.id, alice.id);

    let err = service
        .find_user_by_email("nobody@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::UserNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_unknown_profile_lookup() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service.get_user_profile(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, LedgerError::UserNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_list_users_ordered_by_email() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .register_user("Zed".into(), "zed@example.com".into(), "pw".into())
        .await?;
    service
        .register_user("Ada".into(), "ada@example.com".into(), "pw".into())
        .await?;
    service
        .register_user("Mia".into(), "mia@example.com".into(), "pw".into())
        .await?;

    let users = service.list_users().await?;
    let emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(
        emails,
        ["ada@example.com", "mia@example.com", "zed@example.com"]
    );

    Ok(())
}
