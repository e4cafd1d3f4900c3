//! Per-request handler state
//!
//! A [`Handler`] pairs the resource-specific logic resolved by the router
//! with a [`HandlerContext`] holding everything that belongs to the single
//! request being processed. Both are dropped once the response envelope has
//! been produced.

mod unknown;

pub use unknown::{UnknownResourceFactory, UnknownResourceHandler};

use std::sync::Arc;
use tracing::debug;

use crate::config::HandlerConfig;
use crate::contract::ParameterContract;
use crate::error::Result;
use crate::request::{Properties, Request};
use crate::response::{ResponseEnvelope, ResponseStatus};
use crate::traits::ResourceHandler;

/// Outcome of the request as far as it has been processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlerStatus {
    /// Not finished yet
    #[default]
    Pending,
    /// Finished successfully
    Success,
    /// Rejected or failed
    Failed,
}

impl HandlerStatus {
    fn response_status(self) -> Option<ResponseStatus> {
        match self {
            HandlerStatus::Pending => None,
            HandlerStatus::Success => Some(ResponseStatus::Success),
            HandlerStatus::Failed => Some(ResponseStatus::Failed),
        }
    }
}

/// Mutable state of one request
#[derive(Debug)]
pub struct HandlerContext {
    request: Request,
    config: Arc<HandlerConfig>,
    assigned_physical_id: Option<String>,
    status: HandlerStatus,
    reason: Option<String>,
    data: Option<Properties>,
}

impl HandlerContext {
    /// Create the context for `request`
    pub fn new(request: Request, config: Arc<HandlerConfig>) -> Self {
        Self {
            request,
            config,
            assigned_physical_id: None,
            status: HandlerStatus::Pending,
            reason: None,
            data: None,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn request_id(&self) -> &str {
        &self.request.request_id
    }

    pub fn stack_id(&self) -> &str {
        &self.request.stack_id
    }

    pub fn logical_id(&self) -> &str {
        &self.request.logical_resource_id
    }

    pub fn resource_type(&self) -> &str {
        &self.request.resource_type
    }

    /// The physical resource id of this request
    ///
    /// The orchestrator-supplied id always wins. Without one (a Create),
    /// this is whatever the handler assigned, if anything.
    pub fn physical_id(&self) -> Option<&str> {
        self.request
            .physical_resource_id
            .as_deref()
            .or(self.assigned_physical_id.as_deref())
    }

    /// Claim a physical id for the resource
    ///
    /// Has no effect when the orchestrator already supplied one, or when an
    /// id was already assigned during this request.
    pub fn set_physical_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        if let Some(existing) = self.physical_id() {
            debug!(
                "Ignoring physical id {} for {}, already {}",
                id,
                self.logical_id(),
                existing
            );
            return;
        }
        self.assigned_physical_id = Some(id);
    }

    pub fn status(&self) -> HandlerStatus {
        self.status
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Attach a human-readable note to the response
    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.reason = Some(reason.into());
    }

    pub fn data(&self) -> Option<&Properties> {
        self.data.as_ref()
    }

    /// Output values returned to the orchestrator (`Fn::GetAtt`)
    pub fn set_data(&mut self, data: Properties) {
        self.data = Some(data);
    }

    /// Mark the request FAILED with `reason`
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = HandlerStatus::Failed;
        self.reason = Some(reason.into());
    }

    /// Mark the request SUCCESS
    pub fn succeed(&mut self) {
        self.status = HandlerStatus::Success;
    }

    /// Validate `properties` against `contract`
    ///
    /// On failure the request is marked FAILED with the rendered message and
    /// the structured error is returned; on success nothing changes.
    pub fn validate(&mut self, contract: ParameterContract, properties: &Properties) -> Result<()> {
        match contract.check(properties) {
            Ok(()) => Ok(()),
            Err(err) => {
                debug!("Validation failed for {}: {}", self.logical_id(), err);
                self.fail(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Build the response envelope from the current state
    pub fn to_envelope(&self) -> ResponseEnvelope {
        ResponseEnvelope {
            status: self.status.response_status(),
            reason: self.reason.clone(),
            physical_resource_id: self.physical_id().map(str::to_string),
            logical_resource_id: Some(self.request.logical_resource_id.clone()),
            stack_id: Some(self.request.stack_id.clone()),
            request_id: Some(self.request.request_id.clone()),
            data: self.data.clone(),
        }
    }
}

/// A resolved handler ready to process its request
pub struct Handler {
    context: HandlerContext,
    resource: Box<dyn ResourceHandler>,
}

impl Handler {
    pub fn new(context: HandlerContext, resource: Box<dyn ResourceHandler>) -> Self {
        Self { context, resource }
    }

    pub fn context(&self) -> &HandlerContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut HandlerContext {
        &mut self.context
    }

    pub fn resource(&self) -> &dyn ResourceHandler {
        self.resource.as_ref()
    }

    /// Name of the resolved resource handler
    pub fn handler_name(&self) -> &'static str {
        self.resource.handler_name()
    }

    /// Validate `properties` against the resolved handler's contract
    pub fn validate(&mut self, properties: &Properties) -> Result<()> {
        let contract = self.resource.contract();
        self.context.validate(contract, properties)
    }

    /// Split into the context and the resource logic
    pub(crate) fn parts_mut(&mut self) -> (&mut HandlerContext, &dyn ResourceHandler) {
        (&mut self.context, self.resource.as_ref())
    }

    pub fn to_envelope(&self) -> ResponseEnvelope {
        self.context.to_envelope()
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("resource", &self.resource.handler_name())
            .field("context", &self.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestType;
    use serde_json::json;

    fn request(physical: Option<&str>) -> Request {
        Request {
            request_type: RequestType::Create,
            resource_type: "Custom::IPACname".into(),
            resource_properties: json!({"ServiceToken": "arn", "aaa": "bbb"})
                .as_object()
                .cloned()
                .unwrap(),
            old_resource_properties: None,
            request_id: "82a63133-4e23-4736-ad8b-5c71e6bcfdf6".into(),
            stack_id: "arn:aws:cloudformation:us-west-2:841111111111:stack/chh-junk6/d7cad5a0".into(),
            logical_resource_id: "TestResource".into(),
            physical_resource_id: physical.map(str::to_string),
            response_url: None,
        }
    }

    fn context(physical: Option<&str>) -> HandlerContext {
        HandlerContext::new(request(physical), Arc::new(HandlerConfig::new()))
    }

    #[test]
    fn exposes_request_identifiers() {
        let ctx = context(None);
        assert_eq!(ctx.request_id(), "82a63133-4e23-4736-ad8b-5c71e6bcfdf6");
        assert_eq!(ctx.logical_id(), "TestResource");
        assert!(ctx.stack_id().starts_with("arn:aws:cloudformation"));
        assert_eq!(ctx.status(), HandlerStatus::Pending);
    }

    #[test]
    fn physical_id_can_be_assigned_when_not_supplied() {
        let mut ctx = context(None);
        assert_eq!(ctx.physical_id(), None);
        ctx.set_physical_id("blah");
        assert_eq!(ctx.physical_id(), Some("blah"));
    }

    #[test]
    fn physical_id_is_assigned_at_most_once() {
        let mut ctx = context(None);
        ctx.set_physical_id("first");
        ctx.set_physical_id("second");
        assert_eq!(ctx.physical_id(), Some("first"));
    }

    #[test]
    fn supplied_physical_id_cannot_be_replaced() {
        let mut ctx = context(Some("supplied-pid"));
        ctx.set_physical_id("blah");
        assert_eq!(ctx.physical_id(), Some("supplied-pid"));
    }

    #[test]
    fn fail_sets_status_and_reason() {
        let mut ctx = context(None);
        ctx.fail("message");
        assert_eq!(ctx.status(), HandlerStatus::Failed);
        assert_eq!(ctx.reason(), Some("message"));
    }

    #[test]
    fn validate_success_has_no_side_effects() {
        let mut ctx = context(None);
        let props = json!({"ServiceToken": "parameter"}).as_object().cloned().unwrap();
        assert!(ctx.validate(ParameterContract::EMPTY, &props).is_ok());
        assert_eq!(ctx.status(), HandlerStatus::Pending);
        assert_eq!(ctx.reason(), None);
    }

    #[test]
    fn validate_failure_marks_request_failed() {
        let mut ctx = context(None);
        let props = json!({"bad": "parameter"}).as_object().cloned().unwrap();
        let err = ctx.validate(ParameterContract::EMPTY, &props).unwrap_err();
        assert!(matches!(err, crate::Error::Validation(_)));
        assert_eq!(ctx.status(), HandlerStatus::Failed);
        assert!(ctx.reason().unwrap().to_lowercase().contains("unknown parameters"));
    }

    #[test]
    fn validate_is_repeatable() {
        let contract = ParameterContract::new(&["a"], &[]);
        let props = json!({"b": 1}).as_object().cloned().unwrap();

        let mut ctx = context(None);
        let first = ctx.validate(contract, &props).is_ok();
        let first_reason = ctx.reason().map(str::to_string);
        let second = ctx.validate(contract, &props).is_ok();

        assert_eq!(first, second);
        assert_eq!(first_reason.as_deref(), ctx.reason());
    }

    #[test]
    fn envelope_reports_success_without_reason() {
        let mut ctx = context(None);
        ctx.succeed();
        ctx.set_physical_id("pid");
        ctx.set_data(json!({"x": "y"}).as_object().cloned().unwrap());

        let envelope = ctx.to_envelope();
        assert_eq!(envelope.status, Some(ResponseStatus::Success));
        assert_eq!(envelope.reason, None);
        assert_eq!(envelope.physical_resource_id.as_deref(), Some("pid"));
        assert_eq!(envelope.logical_resource_id.as_deref(), Some("TestResource"));
        assert_eq!(envelope.request_id.as_deref(), Some(ctx.request_id()));
        assert_eq!(envelope.data.unwrap()["x"], "y");
    }

    #[test]
    fn pending_envelope_omits_status() {
        let envelope = context(None).to_envelope();
        let json = envelope.to_json().unwrap();
        assert!(!json.contains("Status"));
        assert!(!json.contains("PhysicalResourceId"));
    }
}
