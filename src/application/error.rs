use thiserror::Error;

use crate::domain::Cents;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("Sender not found: {0}")]
    SenderNotFound(String),

    #[error("Receiver not found: {0}")]
    ReceiverNotFound(String),

    #[error("Statement not found: {0}")]
    StatementNotFound(String),

    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Cents, required: Cents },

    #[error("Invalid amount: {0} (must be greater than zero)")]
    InvalidAmount(Cents),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
