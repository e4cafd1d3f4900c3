// # Resource Handler Trait
//
// Defines the interface every custom resource type implements.
//
// ## Implementations
//
// - `Custom::IPA-CNAME`: `cfn-handler-ipa` crate
// - Fallback for unregistered types: [`crate::handler::UnknownResourceHandler`]
//
// ## Usage
//
// ```rust,ignore
// use cfn_core::{HandlerContext, ParameterContract, Properties, ResourceHandler, Result};
//
// struct Bucket;
//
// #[async_trait::async_trait]
// impl ResourceHandler for Bucket {
//     fn handler_name(&self) -> &'static str { "bucket" }
//
//     fn contract(&self) -> ParameterContract {
//         ParameterContract::new(&["Name"], &[])
//     }
//
//     async fn create(&self, ctx: &mut HandlerContext, props: &Properties) -> Result<()> {
//         ctx.validate(self.contract(), props)?;
//         ctx.set_physical_id(format!("bucket-{}", props["Name"]));
//         Ok(())
//     }
//     // update / delete ...
// }
// ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::HandlerConfig;
use crate::contract::ParameterContract;
use crate::error::Result;
use crate::handler::HandlerContext;
use crate::request::Properties;

/// Create/update/delete logic for one resource type
///
/// Handlers are built fresh for every request and hold no state between
/// requests; per-request state (physical id, status, reason, data) lives in
/// the [`HandlerContext`] passed to each method.
///
/// # Contract
///
/// Every method must validate its input against [`ResourceHandler::contract`]
/// (via [`HandlerContext::validate`]) before touching anything external.
/// Returning `Err` marks the request FAILED with the error text as reason.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Short name for logging and diagnostics
    fn handler_name(&self) -> &'static str;

    /// Properties this handler requires and accepts
    fn contract(&self) -> ParameterContract {
        ParameterContract::EMPTY
    }

    /// Provision the resource described by `properties`
    async fn create(&self, ctx: &mut HandlerContext, properties: &Properties) -> Result<()>;

    /// Move the resource from `old_properties` to `new_properties`
    async fn update(
        &self,
        ctx: &mut HandlerContext,
        new_properties: &Properties,
        old_properties: &Properties,
    ) -> Result<()>;

    /// Tear the resource down
    async fn delete(&self, ctx: &mut HandlerContext, properties: &Properties) -> Result<()>;
}

/// Static descriptor and constructor for a handler type
///
/// The daemon registers one factory per handler type into the
/// [`Router`](crate::Router) at startup; the router then asks the factory
/// for a fresh handler for each request.
pub trait HandlerFactory: Send + Sync {
    /// Resource type strings this handler serves
    fn resource_types(&self) -> &'static [&'static str];

    /// Build a handler for one request
    fn create(&self, config: &Arc<HandlerConfig>) -> Box<dyn ResourceHandler>;
}
