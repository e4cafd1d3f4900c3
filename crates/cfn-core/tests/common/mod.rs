//! Test doubles and common utilities for framework contract tests

#![allow(dead_code)]

use cfn_core::{
    Error, HandlerConfig, HandlerContext, HandlerFactory, ParameterContract, Properties, Request,
    RequestType, ResourceHandler, ResponseEnvelope, ResponseSender, Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Contract used by the recording handler
pub const ABC_CONTRACT: ParameterContract =
    ParameterContract::new(&["a", "b", "c"], &["x", "y", "z"]);

/// Counts how often each action ran past validation
#[derive(Debug, Default)]
pub struct ActionCounters {
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl ActionCounters {
    pub fn total(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
            + self.updates.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
    }
}

/// A handler that validates against [`ABC_CONTRACT`] and records actions
pub struct RecordingHandler {
    name: &'static str,
    counters: Arc<ActionCounters>,
    succeed: bool,
}

#[async_trait::async_trait]
impl ResourceHandler for RecordingHandler {
    fn handler_name(&self) -> &'static str {
        self.name
    }

    fn contract(&self) -> ParameterContract {
        ABC_CONTRACT
    }

    async fn create(&self, ctx: &mut HandlerContext, properties: &Properties) -> Result<()> {
        ctx.validate(self.contract(), properties)?;
        ctx.set_physical_id(format!("recording-{}", ctx.request_id()));
        self.counters.creates.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }

    async fn update(
        &self,
        ctx: &mut HandlerContext,
        new_properties: &Properties,
        old_properties: &Properties,
    ) -> Result<()> {
        ctx.validate(self.contract(), new_properties)?;
        ctx.validate(self.contract(), old_properties)?;
        self.counters.updates.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }

    async fn delete(&self, ctx: &mut HandlerContext, properties: &Properties) -> Result<()> {
        ctx.validate(self.contract(), properties)?;
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);
        let mut data = Properties::new();
        data.insert("Deleted".into(), serde_json::json!(true));
        ctx.set_data(data);
        self.outcome()
    }
}

impl RecordingHandler {
    fn outcome(&self) -> Result<()> {
        if self.succeed {
            Ok(())
        } else {
            Err(Error::Other("recording handler told to fail".into()))
        }
    }
}

/// Factory for [`RecordingHandler`] sharing one set of counters
pub struct RecordingFactory {
    pub name: &'static str,
    pub types: &'static [&'static str],
    pub counters: Arc<ActionCounters>,
    pub succeed: bool,
    /// Config seen by the most recent `create`
    pub seen_config: Mutex<Option<HandlerConfig>>,
}

impl RecordingFactory {
    pub fn new(name: &'static str, types: &'static [&'static str]) -> Self {
        Self {
            name,
            types,
            counters: Arc::new(ActionCounters::default()),
            succeed: true,
            seen_config: Mutex::new(None),
        }
    }

    pub fn failing(mut self) -> Self {
        self.succeed = false;
        self
    }
}

impl HandlerFactory for RecordingFactory {
    fn resource_types(&self) -> &'static [&'static str] {
        self.types
    }

    fn create(&self, config: &Arc<HandlerConfig>) -> Box<dyn ResourceHandler> {
        *self.seen_config.lock().unwrap() = Some(HandlerConfig::clone(config));
        Box::new(RecordingHandler {
            name: self.name,
            counters: Arc::clone(&self.counters),
            succeed: self.succeed,
        })
    }
}

/// A sender that keeps every delivered envelope
#[derive(Clone, Default)]
pub struct RecordingSender {
    pub delivered: Arc<Mutex<Vec<(String, ResponseEnvelope)>>>,
    pub fail: bool,
}

#[async_trait::async_trait]
impl ResponseSender for RecordingSender {
    async fn send(&self, response_url: &str, envelope: &ResponseEnvelope) -> Result<()> {
        if self.fail {
            return Err(Error::callback("connection refused"));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((response_url.to_string(), envelope.clone()));
        Ok(())
    }

    fn sender_name(&self) -> &'static str {
        "recording"
    }
}

/// Build a property map from a JSON object literal
pub fn props(value: serde_json::Value) -> Properties {
    value.as_object().cloned().unwrap_or_default()
}

/// A Create request for `resource_type`
pub fn create_request(resource_type: &str, properties: Properties) -> Request {
    Request {
        request_type: RequestType::Create,
        resource_type: resource_type.to_string(),
        resource_properties: properties,
        old_resource_properties: None,
        request_id: "82a63133-4e23-4736-ad8b-5c71e6bcfdf6".to_string(),
        stack_id: "arn:aws:cloudformation:us-west-2:841111111111:stack/chh-junk6/d7cad5a0"
            .to_string(),
        logical_resource_id: "TestResource".to_string(),
        physical_resource_id: None,
        response_url: Some("https://cloudformation-custom-resource-response-bogus".to_string()),
    }
}

/// Turn a Create request into an Update from `old` properties
pub fn into_update(mut request: Request, old: Properties) -> Request {
    request.request_type = RequestType::Update;
    request.old_resource_properties = Some(old);
    request.physical_resource_id = Some("supplied-pid".to_string());
    request
}

/// Turn a Create request into a Delete
pub fn into_delete(mut request: Request) -> Request {
    request.request_type = RequestType::Delete;
    request.physical_resource_id = Some("supplied-pid".to_string());
    request
}
