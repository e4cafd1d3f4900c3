// # Response Sender Trait
//
// Delivery of the result envelope back to the orchestrator.
//
// ## Implementations
//
// - HTTP PUT to the presigned `ResponseURL`: `cfn-callback-http` crate

use async_trait::async_trait;

use crate::error::Result;
use crate::response::ResponseEnvelope;

/// Delivers a finished response to the orchestrator
///
/// Senders perform a single delivery attempt. Retrying is left to the
/// orchestrator, which re-sends the request if it never hears back.
#[async_trait]
pub trait ResponseSender: Send + Sync {
    /// Deliver `envelope` to `response_url`
    async fn send(&self, response_url: &str, envelope: &ResponseEnvelope) -> Result<()>;

    /// Sender name (for logging)
    fn sender_name(&self) -> &'static str;
}
