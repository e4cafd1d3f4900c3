// # cfn-core
//
// Core library for CloudFormation custom resource handlers.
//
// ## Architecture Overview
//
// - **ParameterContract**: Declared mandatory/optional properties of a handler type
// - **ResourceHandler**: Trait with create/update/delete for one resource type
// - **HandlerFactory**: Static descriptor used to register a handler type
// - **Router**: Resource type → handler registry with a fallback handler
// - **process_request / RequestProcessor**: Request lifecycle, request in, envelope out
// - **ResponseSender**: Trait for delivering the envelope to the orchestrator
//
// ## Design Principles
//
// 1. **Explicit registration**: Handler crates expose `register()`, the daemon calls it
// 2. **Fail fast**: Handlers validate their contract before any external action
// 3. **Every request resolves**: Unregistered types go to the default handler
// 4. **Every failure is a response**: Handler errors become FAILED envelopes
// 5. **One request, one handler**: No state survives between requests

pub mod config;
pub mod contract;
pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod registry;
pub mod request;
pub mod response;
pub mod traits;

// Re-export core types for convenience
pub use config::HandlerConfig;
pub use contract::{ParameterContract, SERVICE_TOKEN, ValidationError};
pub use error::{Error, Result};
pub use handler::{Handler, HandlerContext, HandlerStatus, UnknownResourceHandler};
pub use lifecycle::{RequestProcessor, process_request};
pub use registry::Router;
pub use request::{Properties, Request, RequestType};
pub use response::{ResponseEnvelope, ResponseStatus};
pub use traits::{HandlerFactory, ResourceHandler, ResponseSender};
