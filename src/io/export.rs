use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{format_cents, Cents, Movement, UserId};

/// Statement snapshot for JSON export. The credential field of the account
/// holder is deliberately left out.
#[derive(Debug, Clone, Serialize)]
pub struct StatementSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub user_id: UserId,
    pub email: String,
    pub balance_cents: Cents,
    pub movements: Vec<Movement>,
}

/// Exporter for rendering a user's statement in interchange formats
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export a user's movements to CSV format
    pub async fn export_statement_csv<W: Write>(&self, user_id: UserId, writer: W) -> Result<usize> {
        let account = self.service.get_balance(user_id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record(&[
            "id",
            "sequence",
            "created_at",
            "operation",
            "amount",
            "amount_cents",
            "counterparty",
            "description",
        ])?;

        let mut count = 0;
        for movement in &account.movements {
            csv_writer.write_record(&[
                movement.id.to_string(),
                movement.sequence.to_string(),
                movement.created_at.to_rfc3339(),
                movement.operation.to_string(),
                format_cents(movement.amount_cents),
                movement.amount_cents.to_string(),
                movement
                    .counterparty
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                movement.description.clone(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export a user's statement as a JSON snapshot
    pub async fn export_statement_json<W: Write>(
        &self,
        user_id: UserId,
        mut writer: W,
    ) -> Result<StatementSnapshot> {
        let user = self.service.get_user_profile(user_id).await?;
        let account = self.service.get_balance(user_id).await?;

        let snapshot = StatementSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            user_id: user.id,
            email: user.email,
            balance_cents: account.balance_cents,
            movements: account.movements,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
