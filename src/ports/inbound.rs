//! Inbound port. The API adapter drives the application through this.

use crate::domain::DomainError;

/// Input port: a front end (HTTP server) that serves the journal use cases.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Serve requests until the listener is closed.
    async fn run(&self) -> Result<(), DomainError>;
}
