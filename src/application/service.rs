use tracing::{debug, info, warn};

use crate::domain::{
    compute_balance, Cents, IntegrityReport, Movement, MovementId, OperationType, User, UserId,
};
use crate::storage::Repository;

use super::LedgerError;

/// Application service providing high-level operations for the ledger.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
pub struct LedgerService {
    repo: Repository,
}

/// A user's balance together with the movement history it derives from.
#[derive(Debug)]
pub struct AccountBalance {
    pub balance_cents: Cents,
    pub movements: Vec<Movement>,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // User operations
    // ========================

    /// Register a new account holder. Emails are unique across the ledger.
    pub async fn register_user(
        &self,
        name: String,
        email: String,
        password: String,
    ) -> Result<User, LedgerError> {
        let mut tx = self.repo.begin().await?;

        if Repository::find_user_by_email_tx(&mut tx, &email)
            .await?
            .is_some()
        {
            return Err(LedgerError::UserAlreadyExists(email));
        }

        let user = User::new(name, email, password);
        Repository::insert_user_tx(&mut tx, &user).await?;
        Repository::commit(tx).await?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Get a user's profile by id.
    pub async fn get_user_profile(&self, user_id: UserId) -> Result<User, LedgerError> {
        self.repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))
    }

    /// Resolve a user by email, the handle clients usually hold.
    pub async fn find_user_by_email(&self, email: &str) -> Result<User, LedgerError> {
        self.repo
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(email.to_string()))
    }

    /// List all registered users.
    pub async fn list_users(&self) -> Result<Vec<User>, LedgerError> {
        Ok(self.repo.list_users().await?)
    }

    // ========================
    // Movement operations
    // ========================

    /// Record a deposit into a user's account.
    pub async fn deposit(
        &self,
        user_id: UserId,
        amount_cents: Cents,
        description: &str,
    ) -> Result<Movement, LedgerError> {
        self.apply_movement(user_id, OperationType::Deposit, amount_cents, description)
            .await
    }

    /// Record a withdrawal from a user's account. Fails with
    /// [`LedgerError::InsufficientFunds`] if it would overdraw the balance.
    pub async fn withdraw(
        &self,
        user_id: UserId,
        amount_cents: Cents,
        description: &str,
    ) -> Result<Movement, LedgerError> {
        self.apply_movement(user_id, OperationType::Withdraw, amount_cents, description)
            .await
    }

    /// Shared deposit/withdraw engine: validates the amount, checks funds
    /// for withdrawals, and appends exactly one movement, all inside one
    /// transaction. Dropping the transaction on an early return rolls it
    /// back.
    async fn apply_movement(
        &self,
        user_id: UserId,
        operation: OperationType,
        amount_cents: Cents,
        description: &str,
    ) -> Result<Movement, LedgerError> {
        if amount_cents <= 0 {
            return Err(LedgerError::InvalidAmount(amount_cents));
        }

        let mut tx = self.repo.begin().await?;

        // The counter update is the first write of the transaction, so it
        // takes the store's write lock here; concurrent movements serialize
        // before any balance is read.
        let sequence = Repository::next_sequence_tx(&mut tx).await?;

        if !Repository::user_exists_tx(&mut tx, user_id).await? {
            return Err(LedgerError::UserNotFound(user_id.to_string()));
        }

        if operation == OperationType::Withdraw {
            let balance = Repository::balance_tx(&mut tx, user_id).await?;
            if balance < amount_cents {
                warn!(
                    %user_id,
                    balance,
                    requested = amount_cents,
                    "withdrawal rejected"
                );
                return Err(LedgerError::InsufficientFunds {
                    balance,
                    required: amount_cents,
                });
            }
        }

        let mut movement = Movement::entry(user_id, operation, amount_cents, description);
        movement.sequence = sequence;

        Repository::insert_movement_tx(&mut tx, &movement).await?;
        Repository::commit(tx).await?;

        info!(
            %user_id,
            operation = %movement.operation,
            amount = movement.amount_cents,
            sequence = movement.sequence,
            "movement recorded"
        );
        Ok(movement)
    }

    /// Move funds between two users as a single atomic unit: either both
    /// legs land in the journal or neither does. A transfer to oneself is
    /// allowed and leaves the balance unchanged.
    pub async fn transfer(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        amount_cents: Cents,
        description: &str,
    ) -> Result<(), LedgerError> {
        if amount_cents <= 0 {
            return Err(LedgerError::InvalidAmount(amount_cents));
        }

        let mut tx = self.repo.begin().await?;

        let debit_sequence = Repository::next_sequence_tx(&mut tx).await?;
        let credit_sequence = Repository::next_sequence_tx(&mut tx).await?;

        // The receiver is resolved before the sender; callers rely on the
        // two failures being distinguishable.
        if !Repository::user_exists_tx(&mut tx, receiver_id).await? {
            return Err(LedgerError::ReceiverNotFound(receiver_id.to_string()));
        }
        if !Repository::user_exists_tx(&mut tx, sender_id).await? {
            return Err(LedgerError::SenderNotFound(sender_id.to_string()));
        }

        let balance = Repository::balance_tx(&mut tx, sender_id).await?;
        if balance < amount_cents {
            warn!(
                %sender_id,
                balance,
                requested = amount_cents,
                "transfer rejected"
            );
            return Err(LedgerError::InsufficientFunds {
                balance,
                required: amount_cents,
            });
        }

        let (mut debit, mut credit) =
            Movement::transfer_pair(sender_id, receiver_id, amount_cents, description);
        debit.sequence = debit_sequence;
        credit.sequence = credit_sequence;

        Repository::insert_movement_tx(&mut tx, &debit).await?;
        Repository::insert_movement_tx(&mut tx, &credit).await?;
        Repository::commit(tx).await?;

        info!(
            %sender_id,
            %receiver_id,
            amount = amount_cents,
            "transfer recorded"
        );
        Ok(())
    }

    // ========================
    // Query operations
    // ========================

    /// Compute a user's current balance from their full movement history.
    pub async fn get_balance(&self, user_id: UserId) -> Result<AccountBalance, LedgerError> {
        if !self.repo.user_exists(user_id).await? {
            return Err(LedgerError::UserNotFound(user_id.to_string()));
        }

        let movements = self.repo.list_movements(user_id).await?;
        let balance_cents = compute_balance(&movements);

        debug!(
            %user_id,
            balance = balance_cents,
            movements = movements.len(),
            "balance computed"
        );
        Ok(AccountBalance {
            balance_cents,
            movements,
        })
    }

    /// Look up a single movement from a user's statement. A movement owned
    /// by someone else is reported as missing, not as someone else's.
    pub async fn get_movement(
        &self,
        user_id: UserId,
        movement_id: MovementId,
    ) -> Result<Movement, LedgerError> {
        if !self.repo.user_exists(user_id).await? {
            return Err(LedgerError::UserNotFound(user_id.to_string()));
        }

        self.repo
            .get_movement(user_id, movement_id)
            .await?
            .ok_or_else(|| LedgerError::StatementNotFound(movement_id.to_string()))
    }

    // ========================
    // Integrity operations
    // ========================

    /// Recheck the journal-wide invariants and report the findings.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, LedgerError> {
        let report = self.repo.integrity_report().await?;

        if report.is_clean() {
            debug!(movements = report.movement_count, "journal integrity verified");
        } else {
            warn!(?report, "journal integrity violations found");
        }
        Ok(report)
    }
}
