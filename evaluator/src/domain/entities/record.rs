//! Domain record entity
//!
//! Records are produced upstream and are read-only inside the evaluator.

use serde::{Deserialize, Serialize};

/// A registered domain name and the metadata the upstream source attached to it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    /// Fully qualified domain name; unique within a batch
    pub domain_name: String,
    pub domain_repo_id: String,
    pub registrar_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar_email_address: Option<String>,
}

#[allow(dead_code)]
impl DomainRecord {
    pub fn new(
        domain_name: impl Into<String>,
        domain_repo_id: impl Into<String>,
        registrar_id: impl Into<String>,
    ) -> Self {
        Self {
            domain_name: domain_name.into(),
            domain_repo_id: domain_repo_id.into(),
            registrar_id: registrar_id.into(),
            registrar_email_address: None,
        }
    }

    pub fn with_registrar_email(mut self, email: impl Into<String>) -> Self {
        self.registrar_email_address = Some(email.into());
        self
    }

    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }
}
