//! Resource type router
//!
//! The router maps resource type strings to handler factories so that
//! dispatch needs no hard-coded if-else chain. Every request resolves to
//! *some* handler: types nobody registered go to the default handler
//! ([`UnknownResourceHandler`](crate::handler::UnknownResourceHandler)
//! unless replaced).
//!
//! ## Registration
//!
//! Handler crates expose a `register()` function that the daemon calls
//! once at startup:
//!
//! ```rust,ignore
//! // In cfn-handler-ipa
//! pub fn register(router: &Router) {
//!     router.register_factory(Arc::new(CnameFactory));
//! }
//! ```
//!
//! Registering the same type twice replaces the earlier factory, which lets
//! tests shadow production handlers deterministically.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::config::HandlerConfig;
use crate::handler::{Handler, HandlerContext, UnknownResourceFactory};
use crate::request::Request;
use crate::traits::HandlerFactory;

/// Resource type → handler factory registry
///
/// ## Thread Safety
///
/// Registrations take a write lock, lookups a read lock. Registration is
/// expected to finish before the first request is routed.
pub struct Router {
    /// Registered handler factories by resource type
    handlers: RwLock<HashMap<String, Arc<dyn HandlerFactory>>>,

    /// Factory for unregistered resource types
    default_handler: RwLock<Arc<dyn HandlerFactory>>,

    /// Configuration handed to every handler
    config: Arc<HandlerConfig>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a router with an empty configuration
    pub fn new() -> Self {
        Self::with_config(HandlerConfig::new())
    }

    /// Create a router that passes `config` to every handler it builds
    pub fn with_config(config: HandlerConfig) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            default_handler: RwLock::new(Arc::new(UnknownResourceFactory)),
            config: Arc::new(config),
        }
    }

    /// Configuration shared by all handlers
    pub fn config(&self) -> &Arc<HandlerConfig> {
        &self.config
    }

    /// Register `factory` for a single resource type
    ///
    /// # Parameters
    ///
    /// - `resource_type`: Resource type string (e.g. `Custom::IPA-CNAME`)
    /// - `factory`: Factory building handlers for that type
    pub fn register(&self, resource_type: impl Into<String>, factory: Arc<dyn HandlerFactory>) {
        let resource_type = resource_type.into();
        debug!("Registering handler for {}", resource_type);
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers.insert(resource_type, factory);
    }

    /// Register `factory` for every resource type it declares
    pub fn register_factory(&self, factory: Arc<dyn HandlerFactory>) {
        for resource_type in factory.resource_types() {
            self.register(*resource_type, Arc::clone(&factory));
        }
    }

    /// Replace the handler used for unregistered resource types
    pub fn set_default_handler(&self, factory: Arc<dyn HandlerFactory>) {
        let mut default = self
            .default_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *default = factory;
    }

    /// Resolve the handler for `request`
    ///
    /// Never fails: an unregistered `ResourceType` yields the default
    /// handler. The shared configuration is passed either way.
    pub fn get_handler(&self, request: Request) -> Handler {
        let factory = self.factory_for(&request.resource_type);
        let resource = factory.create(&self.config);
        debug!(
            "Routed {} to handler {}",
            request.resource_type,
            resource.handler_name()
        );
        Handler::new(
            HandlerContext::new(request, Arc::clone(&self.config)),
            resource,
        )
    }

    fn factory_for(&self, resource_type: &str) -> Arc<dyn HandlerFactory> {
        let registered = {
            let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            handlers.get(resource_type).cloned()
        };

        registered.unwrap_or_else(|| {
            let default = self
                .default_handler
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(&*default)
        })
    }

    /// Check if a resource type is registered
    pub fn has_handler(&self, resource_type: &str) -> bool {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.contains_key(resource_type)
    }

    /// List all registered resource types, sorted
    pub fn list_resource_types(&self) -> Vec<String> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let mut types: Vec<String> = handlers.keys().cloned().collect();
        types.sort();
        types
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("resource_types", &self.list_resource_types())
            .field("config_keys", &self.config.len())
            .finish()
    }
}
