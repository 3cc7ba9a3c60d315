mod repository;

pub use repository::*;

/// SQL migration for the users table
pub const MIGRATION_001_USERS: &str = include_str!("migrations/001_users.sql");

/// SQL migration for the statement journal
pub const MIGRATION_002_STATEMENTS: &str = include_str!("migrations/002_statements.sql");

/// SQL migration for the sequence counter
pub const MIGRATION_003_SEQUENCE: &str = include_str!("migrations/003_sequence_counter.sql");
