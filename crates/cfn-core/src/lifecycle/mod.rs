//! Request lifecycle
//!
//! Drives one request from routing to the finished response:
//!
//! ```text
//! Request ──▶ Router::get_handler ──▶ process_request ──▶ ResponseEnvelope
//!                                          │                      │
//!                          create / update / delete        ResponseSender
//!                         (validate first, then act)     (PUT ResponseURL)
//! ```
//!
//! Every handler failure, panics included, becomes a FAILED envelope;
//! nothing a handler does can make the lifecycle itself return an error.
//! Only delivery of the envelope can fail, and that is reported to the
//! caller of [`RequestProcessor::handle`].

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::handler::{Handler, HandlerStatus};
use crate::registry::Router;
use crate::request::{Request, RequestType};
use crate::response::ResponseEnvelope;
use crate::traits::ResponseSender;

/// Reason reported when a handler fails without saying why
pub const DEFAULT_FAILURE_REASON: &str = "Failed to process request.";

/// Dispatch the handler's request and produce the response envelope
///
/// Create, Update and Delete are routed to the matching handler method;
/// any other request type fails with `Unknown request type: <value>`.
pub async fn process_request(handler: &mut Handler) -> ResponseEnvelope {
    let request = handler.context().request().clone();
    let handler_name = handler.handler_name();

    info!(
        "Processing {} of {} ({}) with handler {}",
        request.request_type, request.logical_resource_id, request.resource_type, handler_name
    );

    let (ctx, resource) = handler.parts_mut();
    let dispatch = async {
        match &request.request_type {
            RequestType::Create => {
                resource
                    .create(&mut *ctx, &request.resource_properties)
                    .await
            }
            RequestType::Update => {
                let old_properties = request.old_properties();
                resource
                    .update(&mut *ctx, &request.resource_properties, &old_properties)
                    .await
            }
            RequestType::Delete => {
                resource
                    .delete(&mut *ctx, &request.resource_properties)
                    .await
            }
            RequestType::Other(other) => Err(Error::UnknownRequestType(other.clone())),
        }
    };

    // After a panic the context may be half-updated; it only feeds the FAILED envelope
    let result = match AssertUnwindSafe(dispatch).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            error!("Handler {} panicked", handler_name);
            Err(Error::Other(format!(
                "{} handler panicked: {}",
                handler_name,
                panic_message(payload.as_ref())
            )))
        }
    };

    match result {
        Ok(()) => {
            ctx.succeed();
            info!(
                "{} of {} succeeded (physical id: {})",
                request.request_type,
                request.logical_resource_id,
                ctx.physical_id().unwrap_or("<none>")
            );
        }
        Err(err) => {
            let reason = match err.to_string() {
                message if !message.is_empty() => message,
                _ => ctx
                    .reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string()),
            };
            warn!(
                "{} of {} failed: {}",
                request.request_type, request.logical_resource_id, reason
            );
            ctx.fail(reason);
        }
    }

    debug_assert_ne!(ctx.status(), HandlerStatus::Pending);
    ctx.to_envelope()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Routes requests, processes them and delivers the responses
///
/// The one-request-per-process daemon builds one of these at startup,
/// after every handler type has been registered with the router.
pub struct RequestProcessor {
    router: Router,
    sender: Option<Box<dyn ResponseSender>>,
}

impl RequestProcessor {
    /// Create a processor that only produces envelopes
    pub fn new(router: Router) -> Self {
        Self {
            router,
            sender: None,
        }
    }

    /// Deliver every envelope through `sender`
    pub fn with_sender(mut self, sender: Box<dyn ResponseSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Process `request` and deliver the response
    ///
    /// # Returns
    ///
    /// - `Ok(ResponseEnvelope)`: The response, delivered if a sender is set
    /// - `Err(Error)`: Delivery failed, or a sender is set but the request
    ///   carries no `ResponseURL`
    pub async fn handle(&self, request: Request) -> Result<ResponseEnvelope> {
        let response_url = request.response_url.clone();
        let mut handler = self.router.get_handler(request);
        let envelope = process_request(&mut handler).await;

        let Some(sender) = &self.sender else {
            debug!("No response sender configured, not delivering");
            return Ok(envelope);
        };

        let url = response_url
            .ok_or_else(|| Error::callback("request carries no ResponseURL"))?;

        if let Err(e) = sender.send(&url, &envelope).await {
            error!("Failed to deliver response via {}: {}", sender.sender_name(), e);
            return Err(e);
        }

        info!("Response delivered via {}", sender.sender_name());
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerContext;
    use crate::request::Properties;
    use crate::response::ResponseStatus;
    use crate::traits::ResourceHandler;

    /// Fails with an empty message, as a handler that forgot a reason would
    struct SilentFailure;

    #[async_trait::async_trait]
    impl ResourceHandler for SilentFailure {
        fn handler_name(&self) -> &'static str {
            "silent"
        }

        async fn create(&self, _ctx: &mut HandlerContext, _p: &Properties) -> Result<()> {
            Err(Error::Other(String::new()))
        }

        async fn update(
            &self,
            ctx: &mut HandlerContext,
            _n: &Properties,
            _o: &Properties,
        ) -> Result<()> {
            ctx.set_reason("update went sideways");
            Err(Error::Other(String::new()))
        }

        async fn delete(&self, _ctx: &mut HandlerContext, _p: &Properties) -> Result<()> {
            Ok(())
        }
    }

    struct Panicking;

    #[async_trait::async_trait]
    impl ResourceHandler for Panicking {
        fn handler_name(&self) -> &'static str {
            "panicking"
        }

        async fn create(&self, ctx: &mut HandlerContext, _p: &Properties) -> Result<()> {
            ctx.set_physical_id("claimed-before-panic");
            panic!("record table corrupted");
        }

        async fn update(
            &self,
            _ctx: &mut HandlerContext,
            _n: &Properties,
            _o: &Properties,
        ) -> Result<()> {
            std::panic::panic_any(42_u32)
        }

        async fn delete(&self, _ctx: &mut HandlerContext, _p: &Properties) -> Result<()> {
            Ok(())
        }
    }

    fn handler(request_type: RequestType) -> Handler {
        let request = Request {
            request_type,
            resource_type: "Custom::Silent".into(),
            resource_properties: Properties::new(),
            old_resource_properties: None,
            request_id: "r".into(),
            stack_id: "s".into(),
            logical_resource_id: "l".into(),
            physical_resource_id: Some("p".into()),
            response_url: None,
        };
        Handler::new(
            HandlerContext::new(request, Default::default()),
            Box::new(SilentFailure),
        )
    }

    fn panicking(request_type: RequestType) -> Handler {
        let request = Request {
            physical_resource_id: None,
            ..handler(request_type).context().request().clone()
        };
        Handler::new(
            HandlerContext::new(request, Default::default()),
            Box::new(Panicking),
        )
    }

    #[tokio::test]
    async fn panic_becomes_failed_envelope() {
        let envelope = process_request(&mut panicking(RequestType::Create)).await;
        assert_eq!(envelope.status, Some(ResponseStatus::Failed));
        assert_eq!(
            envelope.reason.as_deref(),
            Some("panicking handler panicked: record table corrupted")
        );
        assert_eq!(
            envelope.physical_resource_id.as_deref(),
            Some("claimed-before-panic")
        );
    }

    #[tokio::test]
    async fn non_string_panic_payload_is_reported() {
        let envelope = process_request(&mut panicking(RequestType::Update)).await;
        assert_eq!(envelope.status, Some(ResponseStatus::Failed));
        assert_eq!(
            envelope.reason.as_deref(),
            Some("panicking handler panicked: unknown panic")
        );
    }

    #[tokio::test]
    async fn failure_without_reason_gets_default() {
        let envelope = process_request(&mut handler(RequestType::Create)).await;
        assert_eq!(envelope.status, Some(ResponseStatus::Failed));
        assert_eq!(envelope.reason.as_deref(), Some(DEFAULT_FAILURE_REASON));
    }

    #[tokio::test]
    async fn handler_reason_is_kept_when_error_is_silent() {
        let envelope = process_request(&mut handler(RequestType::Update)).await;
        assert_eq!(envelope.reason.as_deref(), Some("update went sideways"));
    }

    #[tokio::test]
    async fn unknown_request_type_fails() {
        let envelope =
            process_request(&mut handler(RequestType::Other("Replace".into()))).await;
        assert_eq!(envelope.status, Some(ResponseStatus::Failed));
        assert_eq!(envelope.reason.as_deref(), Some("Unknown request type: Replace"));
    }

    #[tokio::test]
    async fn success_has_no_reason() {
        let envelope = process_request(&mut handler(RequestType::Delete)).await;
        assert!(envelope.is_success());
        assert_eq!(envelope.reason, None);
        assert_eq!(envelope.physical_resource_id.as_deref(), Some("p"));
    }
}
