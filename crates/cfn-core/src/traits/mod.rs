//! Core traits for the custom resource framework
//!
//! - [`ResourceHandler`]: create/update/delete logic for one resource type
//! - [`HandlerFactory`]: static descriptor used to register a handler type
//! - [`ResponseSender`]: delivery of the result envelope

pub mod resource_handler;
pub mod response_sender;

pub use resource_handler::{HandlerFactory, ResourceHandler};
pub use response_sender::ResponseSender;
