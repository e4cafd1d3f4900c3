//! `ipa dnsrecord-*` command wrappers

use cfn_core::{Error, Properties, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::command::{CommandRunner, Invocation};
use crate::kerberos::KerberosSession;

/// Config key overriding the `ipa` program
pub const IPA_KEY: &str = "ipa-command";

/// Mutation applied to a CNAME record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    Add,
    Modify,
    Delete,
}

impl RecordAction {
    fn subcommand(self) -> &'static str {
        match self {
            RecordAction::Add => "dnsrecord-add",
            RecordAction::Modify => "dnsrecord-mod",
            RecordAction::Delete => "dnsrecord-del",
        }
    }
}

/// A CNAME record as described by resource properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CnameRecord {
    pub zone: String,
    pub record_name: String,
    pub host_name: String,
}

impl CnameRecord {
    /// Read `Zone`, `RecordName` and `HostName` from validated properties
    ///
    /// Non-string values are used in their JSON rendering.
    pub fn from_properties(properties: &Properties) -> Self {
        let field = |name: &str| match properties.get(name) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        Self {
            zone: field("Zone"),
            record_name: field("RecordName"),
            host_name: field("HostName"),
        }
    }

    /// `<RecordName>.<Zone>`
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.record_name, self.zone)
    }

    /// Whether both records live under the same zone and name
    pub fn same_identity(&self, other: &CnameRecord) -> bool {
        self.zone == other.zone && self.record_name == other.record_name
    }
}

/// Issues FreeIPA DNS commands under a Kerberos session
#[derive(Clone)]
pub struct IpaClient {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl IpaClient {
    pub fn new(program: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    /// Whether any record exists for `record_name` in `zone`
    ///
    /// `ipa dnsrecord-find` exits 0 only when it found something.
    pub async fn record_exists(
        &self,
        session: &KerberosSession,
        zone: &str,
        record_name: &str,
    ) -> Result<bool> {
        let find = session.apply(
            Invocation::new(&self.program)
                .arg("dnsrecord-find")
                .arg(zone)
                .arg(record_name),
        );
        let output = self.runner.run(&find).await?;
        debug!("{} -> exists: {}", find.command_line(), output.success);
        Ok(output.success)
    }

    /// Apply `action` to the CNAME `record`
    ///
    /// A failing command becomes [`Error::ExternalCall`] carrying whatever
    /// the command printed.
    pub async fn cname_record(
        &self,
        session: &KerberosSession,
        action: RecordAction,
        record: &CnameRecord,
    ) -> Result<()> {
        let invocation = session.apply(
            Invocation::new(&self.program)
                .arg(action.subcommand())
                .arg(&record.zone)
                .arg(&record.record_name)
                .arg(format!("--cname-rec={}", record.host_name)),
        );
        let command_line = invocation.command_line();
        let output = self.runner.run(&invocation).await?;

        if output.success {
            info!("{} succeeded", command_line);
            return Ok(());
        }

        let message = match output.combined() {
            text if !text.is_empty() => text,
            _ => format!("{} exited with status {:?}", command_line, output.code),
        };
        Err(Error::external_call(command_line, message))
    }
}

impl std::fmt::Debug for IpaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpaClient")
            .field("program", &self.program)
            .finish()
    }
}
