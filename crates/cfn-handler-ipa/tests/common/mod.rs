//! Scripted command runner and request builders for CNAME handler tests

#![allow(dead_code)]

use async_trait::async_trait;
use cfn_core::{HandlerConfig, Properties, Request, RequestType, Router};
use cfn_handler_ipa::{CnameFactory, CommandOutput, CommandRunner, Invocation};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const REQUEST_ID: &str = "82a63133-4e23-4736-ad8b-5c71e6bcfdf6";
pub const KEYTAB: &str = "/etc/ipa/dns.keytab";
pub const PRINCIPAL: &str = "dns-admin@EXAMPLE.COM";
pub const CCACHE: &str = "/tmp/krb-82a63133-4e23-4736-ad8b-5c71e6bcfdf6";

/// Records every invocation and answers with scripted outputs
///
/// Outputs are keyed by program name, or by `ipa` subcommand
/// (`dnsrecord-find`, `dnsrecord-add`, ...). Unscripted commands succeed,
/// except `dnsrecord-find`, which reports "no record" unless scripted.
#[derive(Default)]
pub struct ScriptedRunner {
    pub calls: Mutex<Vec<Invocation>>,
    outputs: Mutex<HashMap<String, CommandOutput>>,
    panic_on: Mutex<Option<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, key: &str, output: CommandOutput) {
        self.outputs.lock().unwrap().insert(key.to_string(), output);
    }

    /// Panic when the command keyed `key` runs
    pub fn panic_on(&self, key: &str) {
        *self.panic_on.lock().unwrap() = Some(key.to_string());
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// `ipa` subcommands issued, in order
    pub fn ipa_subcommands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|inv| inv.program == "ipa")
            .filter_map(|inv| inv.args.first().cloned())
            .collect()
    }

    /// Calls that change DNS data
    pub fn mutations(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|inv| {
                inv.program == "ipa"
                    && inv
                        .args
                        .first()
                        .is_some_and(|sub| sub != "dnsrecord-find")
            })
            .collect()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|inv| inv.program).collect()
    }

    fn key_for(invocation: &Invocation) -> String {
        match (invocation.program.as_str(), invocation.args.first()) {
            ("ipa", Some(sub)) => sub.clone(),
            (program, _) => program.to_string(),
        }
    }

    fn answer(&self, invocation: &Invocation) -> CommandOutput {
        self.calls.lock().unwrap().push(invocation.clone());

        let key = Self::key_for(invocation);
        let panics = self.panic_on.lock().unwrap().as_deref() == Some(key.as_str());
        if panics {
            panic!("scripted panic in {key}");
        }
        if let Some(output) = self.outputs.lock().unwrap().get(&key) {
            return output.clone();
        }
        if key == "dnsrecord-find" {
            return CommandOutput::failed(1, "0 DNS resource records matched");
        }
        CommandOutput::ok("")
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> cfn_core::Result<CommandOutput> {
        Ok(self.answer(invocation))
    }

    fn run_blocking(&self, invocation: &Invocation) -> cfn_core::Result<CommandOutput> {
        Ok(self.answer(invocation))
    }
}

pub fn credentials() -> HandlerConfig {
    HandlerConfig::new()
        .with("cname-keytab", KEYTAB)
        .with("cname-principal", PRINCIPAL)
}

/// Router with the CNAME handler wired to `runner`
pub fn router(runner: Arc<ScriptedRunner>, config: HandlerConfig) -> Router {
    let router = Router::with_config(config);
    router.register_factory(Arc::new(CnameFactory::with_runner(runner)));
    router
}

pub fn cname_props(record_name: &str, host_name: &str) -> Properties {
    props(json!({
        "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:ipa",
        "Zone": "example.com",
        "RecordName": record_name,
        "HostName": host_name
    }))
}

pub fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

pub fn request(request_type: RequestType, properties: Properties) -> Request {
    Request {
        request_type,
        resource_type: "Custom::IPA-CNAME".to_string(),
        resource_properties: properties,
        old_resource_properties: None,
        request_id: REQUEST_ID.to_string(),
        stack_id: "arn:aws:cloudformation:us-east-1:123456789012:stack/dns/1".to_string(),
        logical_resource_id: "WwwAlias".to_string(),
        physical_resource_id: None,
        response_url: Some("https://cloudformation-custom-resource-response-bogus".to_string()),
    }
}

pub fn update(new: Properties, old: Properties) -> Request {
    let mut req = request(RequestType::Update, new);
    req.old_resource_properties = Some(old);
    req.physical_resource_id = Some("cname-www.example.com".to_string());
    req
}

pub fn delete(properties: Properties, physical_id: &str) -> Request {
    let mut req = request(RequestType::Delete, properties);
    req.physical_resource_id = Some(physical_id.to_string());
    req
}
