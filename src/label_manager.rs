//! Lookup-or-create of the marker label
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::MailClient;
use crate::error::{GmailError, Result};
use crate::models::LabelInfo;

/// Makes sure the label marking auto-replied threads exists
pub struct LabelManager {
    client: Arc<dyn MailClient>,
    label_name: String,
}

impl LabelManager {
    pub fn new(client: Arc<dyn MailClient>, label_name: impl Into<String>) -> Self {
        Self {
            client,
            label_name: label_name.into(),
        }
    }

    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    /// Returns the marker label, creating it if the account has none
    ///
    /// Labels are listed on every call rather than cached, so a label deleted
    /// by hand between scans is simply recreated.
    pub async fn ensure_label(&self) -> Result<LabelInfo> {
        let labels = self.client.list_labels().await?;

        if let Some(existing) = labels.into_iter().find(|l| l.name == self.label_name) {
            debug!("Label '{}' already exists with ID: {}", existing.name, existing.id);
            return Ok(existing);
        }

        info!("Creating label: {}", self.label_name);
        let created = self
            .client
            .create_label(&self.label_name)
            .await
            .map_err(|e| match e {
                GmailError::LabelError(_) => e,
                other if other.is_transient() => other,
                other => GmailError::LabelError(format!(
                    "Failed to create label '{}': {}",
                    self.label_name, other
                )),
            })?;

        info!(
            "Successfully created label '{}' with ID: {}",
            created.name, created.id
        );
        Ok(created)
    }
}
