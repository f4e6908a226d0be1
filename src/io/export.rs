use anyhow::Result;
use std::io::Write;

use crate::application::LedgerService;

/// Exporter for converting ledger data to CSV.
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export every statement to CSV. Account columns carry emails; an id
    /// that no longer resolves is written raw.
    pub async fn export_statements_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let statements = self.service.list_statements().await?;
        let emails = self.service.get_account_emails().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record(&[
            "id",
            "created_at",
            "account",
            "type",
            "amount_cents",
            "sender",
            "description",
        ])?;

        let mut count = 0;
        for statement in &statements {
            let account = emails
                .get(&statement.user_id)
                .cloned()
                .unwrap_or_else(|| statement.user_id.to_string());
            let sender = statement
                .sender_id
                .map(|id| emails.get(&id).cloned().unwrap_or_else(|| id.to_string()))
                .unwrap_or_default();

            csv_writer.write_record(&[
                statement.id.to_string(),
                statement.created_at.to_rfc3339(),
                account,
                statement.operation.to_string(),
                statement.amount_cents.to_string(),
                sender,
                statement.description.clone(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export account balances to CSV.
    pub async fn export_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let balances = self.service.get_all_balances().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record(&["account", "email", "balance_cents"])?;

        let mut count = 0;
        for entry in &balances {
            csv_writer.write_record(&[
                entry.account.name.clone(),
                entry.account.email.clone(),
                entry.balance.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }
}
