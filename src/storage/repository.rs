use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use uuid::Uuid;

use crate::domain::{Cents, IntegrityReport, Movement, MovementId, OperationType, User, UserId};

use super::{MIGRATION_001_USERS, MIGRATION_002_STATEMENTS, MIGRATION_003_SEQUENCE};

/// Repository for persisting and querying users and journal movements.
///
/// Methods ending in `_tx` operate on an explicit transaction connection;
/// everything else runs against the pool. Write paths that must observe a
/// consistent balance always go through a transaction.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_USERS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::raw_sql(MIGRATION_002_STATEMENTS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        sqlx::raw_sql(MIGRATION_003_SEQUENCE)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 003")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Begin a write transaction. Dropping it without commit rolls back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .context("Failed to begin transaction")
    }

    /// Commit a transaction.
    pub async fn commit(tx: Transaction<'static, Sqlite>) -> Result<()> {
        tx.commit().await.context("Failed to commit transaction")
    }

    // ========================
    // User operations
    // ========================

    /// Insert a new user inside a transaction.
    pub async fn insert_user_tx(conn: &mut SqliteConnection, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await
        .context("Failed to insert user")?;
        Ok(())
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a user by email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by email")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a user by email inside a transaction.
    pub async fn find_user_by_email_tx(
        conn: &mut SqliteConnection,
        email: &str,
    ) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch user by email")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    /// Check whether a user exists.
    pub async fn user_exists(&self, id: UserId) -> Result<bool> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection")?;
        Self::user_exists_tx(&mut conn, id).await
    }

    /// Check whether a user exists inside a transaction.
    pub async fn user_exists_tx(conn: &mut SqliteConnection, id: UserId) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?) as present")
            .bind(id.to_string())
            .fetch_one(&mut *conn)
            .await
            .context("Failed to check user existence")?;

        Ok(row.get::<i64, _>("present") != 0)
    }

    /// List all users, ordered by email.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, password, created_at
            FROM users
            ORDER BY email
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")?;

        rows.iter().map(Self::row_to_user).collect()
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(User {
            id: Uuid::parse_str(&id_str).context("Invalid user ID")?,
            name: row.get("name"),
            email: row.get("email"),
            password: row.get("password"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Movement operations
    // ========================

    /// Get the next sequence number and increment the counter.
    ///
    /// This must be the first statement of every journal transaction: the
    /// update takes SQLite's write lock, so concurrent writers queue here
    /// and every later read inside the transaction sees settled state.
    pub async fn next_sequence_tx(conn: &mut SqliteConnection) -> Result<i64> {
        let row = sqlx::query(
            r#"
            UPDATE sequence_counter
            SET value = value + 1
            WHERE name = 'statement_sequence'
            RETURNING value
            "#,
        )
        .fetch_one(&mut *conn)
        .await
        .context("Failed to get next sequence number")?;

        Ok(row.get("value"))
    }

    /// Append a movement to the journal inside a transaction.
    /// The movement's sequence must already be assigned via
    /// [`Repository::next_sequence_tx`].
    pub async fn insert_movement_tx(conn: &mut SqliteConnection, movement: &Movement) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO statements (id, sequence, user_id, operation, amount_cents, description, counterparty_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(movement.id.to_string())
        .bind(movement.sequence)
        .bind(movement.user_id.to_string())
        .bind(movement.operation.as_str())
        .bind(movement.amount_cents)
        .bind(&movement.description)
        .bind(movement.counterparty.map(|id| id.to_string()))
        .bind(movement.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await
        .context("Failed to insert movement")?;

        Ok(())
    }

    /// Compute a user's balance with SQL aggregation, inside a transaction.
    /// Mirrors [`crate::domain::compute_balance`]: withdrawals negate their
    /// stored magnitude, transfer legs are already signed.
    pub async fn balance_tx(conn: &mut SqliteConnection, user_id: UserId) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(
                CASE WHEN operation = 'withdraw' THEN -amount_cents ELSE amount_cents END
            ), 0) as balance
            FROM statements
            WHERE user_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .fetch_one(&mut *conn)
        .await
        .context("Failed to compute balance")?;

        Ok(row.get("balance"))
    }

    /// List a user's movements in journal order.
    pub async fn list_movements(&self, user_id: UserId) -> Result<Vec<Movement>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sequence, user_id, operation, amount_cents, description, counterparty_id, created_at
            FROM statements
            WHERE user_id = ?
            ORDER BY sequence
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list movements")?;

        rows.iter().map(Self::row_to_movement).collect()
    }

    /// Get one movement by ID, scoped to its owner. A movement belonging to
    /// another user is indistinguishable from a missing one.
    pub async fn get_movement(&self, user_id: UserId, id: MovementId) -> Result<Option<Movement>> {
        let row = sqlx::query(
            r#"
            SELECT id, sequence, user_id, operation, amount_cents, description, counterparty_id, created_at
            FROM statements
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch movement")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_movement(&row)?)),
            None => Ok(None),
        }
    }

    fn row_to_movement(row: &sqlx::sqlite::SqliteRow) -> Result<Movement> {
        let id_str: String = row.get("id");
        let user_id_str: String = row.get("user_id");
        let operation_str: String = row.get("operation");
        let counterparty_str: Option<String> = row.get("counterparty_id");
        let created_at_str: String = row.get("created_at");

        Ok(Movement {
            id: Uuid::parse_str(&id_str).context("Invalid movement ID")?,
            sequence: row.get("sequence"),
            user_id: Uuid::parse_str(&user_id_str).context("Invalid user ID")?,
            operation: OperationType::from_str(&operation_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid operation type: {}", operation_str))?,
            amount_cents: row.get("amount_cents"),
            description: row.get("description"),
            counterparty: counterparty_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid counterparty ID")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Integrity operations
    // ========================

    /// Recompute the journal-wide invariants for integrity checking.
    pub async fn integrity_report(&self) -> Result<IntegrityReport> {
        // Count users
        let user_count: i64 = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        // Count movements
        let movement_count: i64 = sqlx::query("SELECT COUNT(*) as count FROM statements")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        // Check for sequence gaps
        let sequence_check = sqlx::query(
            r#"
            SELECT
                MIN(sequence) as min_seq,
                MAX(sequence) as max_seq,
                COUNT(*) as count
            FROM statements
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let min_seq: Option<i64> = sequence_check.get("min_seq");
        let max_seq: Option<i64> = sequence_check.get("max_seq");
        let count: i64 = sequence_check.get("count");

        let has_sequence_gaps = match (min_seq, max_seq) {
            (Some(min), Some(max)) => (max - min + 1) != count,
            _ => false,
        };

        // Check for references to unknown users
        let unknown_user_refs: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM statements s
            WHERE NOT EXISTS (SELECT 1 FROM users u WHERE u.id = s.user_id)
               OR (s.counterparty_id IS NOT NULL
                   AND NOT EXISTS (SELECT 1 FROM users u WHERE u.id = s.counterparty_id))
            "#,
        )
        .fetch_one(&self.pool)
        .await?
        .get("count");

        // Check for zero amounts
        let zero_amounts: i64 =
            sqlx::query("SELECT COUNT(*) as count FROM statements WHERE amount_cents = 0")
                .fetch_one(&self.pool)
                .await?
                .get("count");

        // Paired transfer legs must cancel out journal-wide
        let transfer_sum_cents: Cents = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0) as total
            FROM statements
            WHERE operation = 'transfer'
            "#,
        )
        .fetch_one(&self.pool)
        .await?
        .get("total");

        Ok(IntegrityReport {
            user_count,
            movement_count,
            has_sequence_gaps,
            unknown_user_refs,
            zero_amounts,
            transfer_sum_cents,
        })
    }
}
