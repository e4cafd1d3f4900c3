// # Kerberos credential sessions
//
// Every `ipa` call must run with a Kerberos ticket. A session obtains one
// with `kinit -kt <keytab> <principal>` into a credential cache named after
// the request id, and throws it away with `kdestroy` when done.
//
// The cache is selected per command through `KRB5CCNAME` on that command's
// environment; the daemon's own environment is never touched, so a
// session's ticket is only visible to the commands it was applied to.
//
// Release is explicit (`release().await`). A session dropped without being
// released (early return, panic, cancelled future) runs `kdestroy`
// synchronously from `Drop`.

use chrono::{DateTime, Utc};
use cfn_core::{Error, HandlerConfig, Result};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::command::{CommandRunner, Invocation};

/// Environment variable selecting the credential cache
pub const CCACHE_ENV: &str = "KRB5CCNAME";

/// Config key holding the keytab path
pub const KEYTAB_KEY: &str = "cname-keytab";

/// Config key holding the principal name
pub const PRINCIPAL_KEY: &str = "cname-principal";

/// Config key overriding the credential cache directory
pub const CCACHE_DIR_KEY: &str = "cname-ccache-dir";

/// Config key overriding the `kinit` program
pub const KINIT_KEY: &str = "kinit-command";

/// Config key overriding the `kdestroy` program
pub const KDESTROY_KEY: &str = "kdestroy-command";

const DEFAULT_CCACHE_DIR: &str = "/tmp";

/// Name used in credential failure messages
const HANDLER_LABEL: &str = "IPA CNAME Handler";

/// Where to get credentials from and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KerberosSettings {
    pub keytab: Option<String>,
    pub principal: Option<String>,
    pub ccache_dir: String,
    pub kinit: String,
    pub kdestroy: String,
}

impl KerberosSettings {
    /// Read settings from the router configuration
    pub fn from_config(config: &HandlerConfig) -> Self {
        Self {
            keytab: config.get(KEYTAB_KEY).map(str::to_string),
            principal: config.get(PRINCIPAL_KEY).map(str::to_string),
            ccache_dir: config
                .get_or(CCACHE_DIR_KEY, DEFAULT_CCACHE_DIR)
                .trim_end_matches('/')
                .to_string(),
            kinit: config.get_or(KINIT_KEY, "kinit").to_string(),
            kdestroy: config.get_or(KDESTROY_KEY, "kdestroy").to_string(),
        }
    }

    /// Credential cache path for a request
    pub fn ccache_for(&self, request_id: &str) -> String {
        format!("{}/krb-{}", self.ccache_dir, request_id)
    }

    fn credential_error(&self) -> Error {
        Error::security_context(
            HANDLER_LABEL,
            self.keytab.as_deref().unwrap_or("<unset>"),
            self.principal.as_deref().unwrap_or("<unset>"),
        )
    }
}

/// An acquired Kerberos ticket, scoped to one request
pub struct KerberosSession {
    ccache: String,
    runner: Arc<dyn CommandRunner>,
    kdestroy: String,
    acquired_at: DateTime<Utc>,
    released: bool,
}

impl KerberosSession {
    /// Obtain a ticket for `request_id`
    ///
    /// Fails with [`Error::SecurityContext`] naming the keytab and principal
    /// when they are not configured or `kinit` does not succeed. A failed
    /// `kinit` is still followed by `kdestroy` on the same cache.
    pub async fn acquire(
        runner: Arc<dyn CommandRunner>,
        settings: &KerberosSettings,
        request_id: &str,
    ) -> Result<Self> {
        let (Some(keytab), Some(principal)) = (&settings.keytab, &settings.principal) else {
            error!("Kerberos keytab or principal not configured");
            return Err(settings.credential_error());
        };

        let mut session = Self {
            ccache: settings.ccache_for(request_id),
            runner,
            kdestroy: settings.kdestroy.clone(),
            acquired_at: Utc::now(),
            released: false,
        };

        let kinit = session.apply(
            Invocation::new(&settings.kinit)
                .arg("-kt")
                .arg(keytab)
                .arg(principal),
        );

        let outcome = session.runner.run(&kinit).await;
        match outcome {
            Ok(output) if output.success => {
                session.acquired_at = Utc::now();
                debug!("Obtained Kerberos ticket in {}", session.ccache);
                Ok(session)
            }
            Ok(output) => {
                error!(
                    "kinit failed for principal {} (exit {:?}): {}",
                    principal,
                    output.code,
                    output.combined()
                );
                session.release().await;
                Err(settings.credential_error())
            }
            Err(e) => {
                error!("Unable to run {}: {}", settings.kinit, e);
                session.release().await;
                Err(settings.credential_error())
            }
        }
    }

    /// Credential cache this session writes to
    pub fn ccache(&self) -> &str {
        &self.ccache
    }

    /// Scope `invocation` to this session's credential cache
    pub fn apply(&self, invocation: Invocation) -> Invocation {
        invocation.env(CCACHE_ENV, &self.ccache)
    }

    /// Destroy the ticket
    ///
    /// Teardown failures are logged, never returned: the request outcome is
    /// decided by the work done under the session.
    pub async fn release(mut self) {
        self.released = true;
        let kdestroy = self.teardown_invocation();
        match self.runner.run(&kdestroy).await {
            Ok(output) if output.success => {}
            Ok(output) => warn!("kdestroy for {} failed: {}", self.ccache, output.combined()),
            Err(e) => warn!("Unable to run {}: {}", self.kdestroy, e),
        }
        info!(
            "Kerberos session {} released after {}ms",
            self.ccache,
            (Utc::now() - self.acquired_at).num_milliseconds()
        );
    }

    fn teardown_invocation(&self) -> Invocation {
        self.apply(Invocation::new(&self.kdestroy))
    }
}

impl Drop for KerberosSession {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        // Must finish before drop returns; spawned tasks do not survive
        // runtime shutdown.
        warn!("Kerberos session {} dropped without release", self.ccache);
        let kdestroy = self.teardown_invocation();
        match self.runner.run_blocking(&kdestroy) {
            Ok(output) if output.success => {}
            Ok(output) => warn!("kdestroy for {} failed: {}", self.ccache, output.combined()),
            Err(e) => error!("Unable to destroy credential cache {}: {}", self.ccache, e),
        }
    }
}

impl std::fmt::Debug for KerberosSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KerberosSession")
            .field("ccache", &self.ccache)
            .field("acquired_at", &self.acquired_at)
            .field("released", &self.released)
            .finish()
    }
}
