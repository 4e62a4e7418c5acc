use crate::error::Result;
use crate::mail::{MailProvider, NewLabel};

/// Makes sure the marker label exists and hands back its id.
#[derive(Debug, Clone)]
pub struct LabelManager {
    name: String,
}

impl LabelManager {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the id of the label named exactly `name`, creating it when
    /// missing. Visibility of an existing label is left untouched.
    pub async fn ensure_label(&self, provider: &dyn MailProvider) -> Result<String> {
        tracing::info!("Checking if label '{}' exists...", self.name);

        let labels = provider.list_labels().await?;
        if let Some(existing) = labels.into_iter().find(|label| label.name == self.name) {
            tracing::info!("Label '{}' exists ({})", self.name, existing.id);
            return Ok(existing.id);
        }

        let id = provider.create_label(NewLabel::visible(&self.name)).await?;
        tracing::info!("Created label '{}' ({})", self.name, id);
        Ok(id)
    }
}
