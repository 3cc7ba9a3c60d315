// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use denario::application::LedgerService;
use denario::domain::User;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Test fixture: standard account holders
pub struct StandardUsers;

impl StandardUsers {
    /// Register the usual single account holder
    pub async fn single(service: &LedgerService) -> Result<User> {
        let user = service
            .register_user(
                "Alice".into(),
                "alice@example.com".into(),
                "alice-pw".into(),
            )
            .await?;
        Ok(user)
    }

    /// Register the usual pair of account holders
    pub async fn pair(service: &LedgerService) -> Result<(User, User)> {
        let alice = service
            .register_user(
                "Alice".into(),
                "alice@example.com".into(),
                "alice-pw".into(),
            )
            .await?;
        let bob = service
            .register_user("Bob".into(), "bob@example.com".into(), "bob-pw".into())
            .await?;
        Ok((alice, bob))
    }

    /// Register an account holder and seed their balance with a deposit
    pub async fn funded(
        service: &LedgerService,
        name: &str,
        email: &str,
        amount_cents: i64,
    ) -> Result<User> {
        let user = service
            .register_user(name.into(), email.into(), "pw".into())
            .await?;
        if amount_cents > 0 {
            service
                .deposit(user.id, amount_cents, "opening deposit")
                .await?;
        }
        Ok(user)
    }
}
