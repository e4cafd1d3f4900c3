// # FreeIPA CNAME Handler
//
// Serves the `Custom::IPA-CNAME` resource type: one CNAME record in a
// FreeIPA-managed DNS zone per resource.
//
// ## Resource properties
//
// - `Zone`: DNS zone the record lives in (mandatory)
// - `RecordName`: name relative to the zone (mandatory)
// - `HostName`: CNAME target (mandatory)
//
// The physical id is `cname-<RecordName>.<Zone>`.
//
// ## Configuration (router config keys)
//
// - `cname-keytab` / `cname-principal`: Kerberos credentials (required at
//   request time; a request without them fails naming `<unset>`)
// - `cname-ccache-dir`: directory for per-request credential caches (`/tmp`)
// - `ipa-command`, `kinit-command`, `kdestroy-command`: program overrides
//
// ## External commands
//
// All work is done by shelling out to `kinit`, `ipa dnsrecord-*` and
// `kdestroy`. Each request runs under its own credential cache
// (`<ccache-dir>/krb-<RequestId>`), selected through `KRB5CCNAME` on the
// child process only.

pub mod cname;
pub mod command;
pub mod ipa;
pub mod kerberos;

pub use cname::{CNAME_CONTRACT, CNAME_RESOURCE_TYPE, CnameHandler, PHYSICAL_ID_PREFIX};
pub use command::{CommandOutput, CommandRunner, Invocation, SystemCommandRunner};
pub use ipa::{CnameRecord, IpaClient, RecordAction};
pub use kerberos::{KerberosSession, KerberosSettings};

use cfn_core::{HandlerConfig, HandlerFactory, ResourceHandler, Router};
use std::sync::Arc;
use tracing::debug;

/// Builds [`CnameHandler`]s from the router configuration
#[derive(Clone)]
pub struct CnameFactory {
    runner: Arc<dyn CommandRunner>,
}

impl CnameFactory {
    /// Factory running real child processes
    pub fn new() -> Self {
        Self::with_runner(Arc::new(SystemCommandRunner))
    }

    /// Factory running commands through `runner`
    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Default for CnameFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CnameFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CnameFactory").finish_non_exhaustive()
    }
}

impl HandlerFactory for CnameFactory {
    fn resource_types(&self) -> &'static [&'static str] {
        &[CNAME_RESOURCE_TYPE]
    }

    fn create(&self, config: &Arc<HandlerConfig>) -> Box<dyn ResourceHandler> {
        let kerberos = KerberosSettings::from_config(config);
        let ipa = IpaClient::new(config.get_or(ipa::IPA_KEY, "ipa"), Arc::clone(&self.runner));
        debug!("Building CNAME handler with {:?}", ipa);

        Box::new(CnameHandler::new(ipa, Arc::clone(&self.runner), kerberos))
    }
}

/// Register the CNAME handler with a router
pub fn register(router: &Router) {
    router.register_factory(Arc::new(CnameFactory::new()));
}
