use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Cents;
use super::user::UserId;

pub type MovementId = Uuid;

/// The three kinds of journal movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Deposit,
    Withdraw,
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

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only journal entry. Movements are immutable: corrections are
/// made by appending compensating movements, never by rewriting history.
///
/// `amount_cents` is signed. Deposits and withdrawals store the positive
/// magnitude; a transfer stores the negated amount on the sender's leg and
/// the positive amount on the receiver's, so the two legs of a pair sum to
/// zero even when both belong to the same user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    /// Journal-wide insertion order, assigned by the repository.
    pub sequence: i64,
    pub user_id: UserId,
    pub operation: OperationType,
    pub amount_cents: Cents,
    pub description: String,
    /// The other party of a transfer: the receiver on the sender's leg, the
    /// sender on the receiver's. Always `None` for deposits and withdrawals.
    pub counterparty: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Movement {
    fn build(
        user_id: UserId,
        operation: OperationType,
        amount_cents: Cents,
        description: &str,
        counterparty: Option<UserId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            user_id,
            operation,
            amount_cents,
            description: description.to_string(),
            counterparty,
            created_at: Utc::now(),
        }
    }

    /// A direct deposit or withdrawal of `amount_cents` (strictly positive).
    /// Transfer movements are always created in pairs via
    /// [`Movement::transfer_pair`].
    pub fn entry(
        user_id: UserId,
        operation: OperationType,
        amount_cents: Cents,
        description: &str,
    ) -> Self {
        assert!(amount_cents > 0, "Movement amount must be positive");
        assert!(
            operation != OperationType::Transfer,
            "Transfer movements are created in pairs"
        );
        Self::build(user_id, operation, amount_cents, description, None)
    }

    /// The linked legs recording a transfer of `amount_cents` from `sender`
    /// to `receiver`: first the sender's movement carrying the negated
    /// amount, then the receiver's carrying the positive amount.
    pub fn transfer_pair(
        sender: UserId,
        receiver: UserId,
        amount_cents: Cents,
        description: &str,
    ) -> (Self, Self) {
        assert!(amount_cents > 0, "Transfer amount must be positive");
        let debit = Self::build(
            sender,
            OperationType::Transfer,
            -amount_cents,
            description,
            Some(receiver),
        );
        let credit = Self::build(
            receiver,
            OperationType::Transfer,
            amount_cents,
            description,
            Some(sender),
        );
        (debit, credit)
    }

    /// The positive amount this movement was recorded with.
    pub fn magnitude(&self) -> Cents {
        self.amount_cents.abs()
    }

    /// Signed contribution of this movement to its owner's balance.
    pub fn signed_effect(&self) -> Cents {
        match self.operation {
            OperationType::Deposit => self.amount_cents,
            OperationType::Withdraw => -self.amount_cents,
            OperationType::Transfer => self.amount_cents,
        }
    }
}
