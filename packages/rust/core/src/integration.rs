//! Outbound integration boundary: CRM sync and message sending.
//!
//! No real client ships with DealDesk. [`UnavailableIntegration`] stands in for
//! every provider and always reports failure, so callers exercise their error
//! paths today and a real adapter can slot in behind the same traits.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use dealdesk_shared::{DealDeskError, Result};

/// Error text reported by placeholder integrations.
pub const NOT_IMPLEMENTED: &str = "not implemented";

/// Outcome of one sync call as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntegrationResult {
    pub fn ok(count: usize) -> Self {
        Self {
            success: true,
            count: Some(count),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            count: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOperation {
    Accounts,
    Contacts,
}

impl std::fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accounts => f.write_str("accounts"),
            Self::Contacts => f.write_str("contacts"),
        }
    }
}

/// A CRM provider that can pull accounts and contact details.
pub trait CrmIntegration: Send + Sync {
    fn name(&self) -> &str;

    fn sync_accounts(&self) -> impl Future<Output = IntegrationResult> + Send;

    fn hydrate_contacts(&self) -> impl Future<Output = IntegrationResult> + Send;
}

/// A single outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// A mail or messaging provider.
pub trait MessageSender: Send + Sync {
    fn send_message(&self, message: &OutboundMessage) -> impl Future<Output = Result<()>> + Send;
}

/// Placeholder for every provider. All calls fail with [`NOT_IMPLEMENTED`].
#[derive(Debug, Clone)]
pub struct UnavailableIntegration {
    name: String,
}

impl UnavailableIntegration {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for UnavailableIntegration {
    fn default() -> Self {
        Self::new("unconfigured")
    }
}

impl CrmIntegration for UnavailableIntegration {
    fn name(&self) -> &str {
        &self.name
    }

    async fn sync_accounts(&self) -> IntegrationResult {
        IntegrationResult::failed(NOT_IMPLEMENTED)
    }

    async fn hydrate_contacts(&self) -> IntegrationResult {
        IntegrationResult::failed(NOT_IMPLEMENTED)
    }
}

impl MessageSender for UnavailableIntegration {
    async fn send_message(&self, _message: &OutboundMessage) -> Result<()> {
        Err(DealDeskError::IntegrationUnavailable(format!(
            "{}: {NOT_IMPLEMENTED}",
            self.name
        )))
    }
}

/// Run one sync operation. Any non-success result becomes
/// `IntegrationUnavailable`; there are no retries.
#[instrument(skip(client), fields(provider = client.name()))]
pub async fn run_sync<C: CrmIntegration>(client: &C, operation: SyncOperation) -> Result<usize> {
    let result = match operation {
        SyncOperation::Accounts => client.sync_accounts().await,
        SyncOperation::Contacts => client.hydrate_contacts().await,
    };

    if result.success {
        let count = result.count.unwrap_or(0);
        info!(count, "sync finished");
        return Ok(count);
    }

    let reason = result.error.unwrap_or_else(|| "unknown error".to_string());
    warn!(%reason, "sync failed");
    Err(DealDeskError::IntegrationUnavailable(format!(
        "{} {operation} sync failed: {reason}",
        client.name()
    )))
}

/// Validate and send one message.
#[instrument(skip_all, fields(to = %message.to))]
pub async fn send_message<S: MessageSender>(sender: &S, message: &OutboundMessage) -> Result<()> {
    if message.to.trim().is_empty() {
        return Err(DealDeskError::missing("to"));
    }
    if message.subject.trim().is_empty() {
        return Err(DealDeskError::missing("subject"));
    }
    sender.send_message(message).await
}
