// Fallback for resource types nobody registered.
//
// Create and Update fail loudly so the orchestrator never believes such a
// resource was provisioned. Delete succeeds: whatever failed to be created
// has nothing to tear down, and a failing delete would wedge the stack.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::config::HandlerConfig;
use crate::error::{Error, Result};
use crate::handler::HandlerContext;
use crate::request::Properties;
use crate::traits::{HandlerFactory, ResourceHandler};

/// Default handler used by the router for unregistered resource types
#[derive(Debug, Default, Clone, Copy)]
pub struct UnknownResourceHandler;

#[async_trait]
impl ResourceHandler for UnknownResourceHandler {
    fn handler_name(&self) -> &'static str {
        "unknown"
    }

    async fn create(&self, ctx: &mut HandlerContext, _properties: &Properties) -> Result<()> {
        ctx.set_physical_id(format!("unknown-{}", ctx.request_id()));
        warn!("Create requested for unknown resource type {}", ctx.resource_type());
        Err(Error::UnknownResourceType(ctx.resource_type().to_string()))
    }

    async fn update(
        &self,
        ctx: &mut HandlerContext,
        _new_properties: &Properties,
        _old_properties: &Properties,
    ) -> Result<()> {
        warn!("Update requested for unknown resource type {}", ctx.resource_type());
        Err(Error::UnknownResourceType(ctx.resource_type().to_string()))
    }

    async fn delete(&self, _ctx: &mut HandlerContext, _properties: &Properties) -> Result<()> {
        Ok(())
    }
}

/// Factory for [`UnknownResourceHandler`]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnknownResourceFactory;

impl HandlerFactory for UnknownResourceFactory {
    fn resource_types(&self) -> &'static [&'static str] {
        &[]
    }

    fn create(&self, _config: &Arc<HandlerConfig>) -> Box<dyn ResourceHandler> {
        Box::new(UnknownResourceHandler)
    }
}
