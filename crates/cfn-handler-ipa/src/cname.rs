//! `Custom::IPA-CNAME` resource handler
//!
//! Manages one CNAME record in FreeIPA DNS per resource.
//!
//! ## Create
//!
//! The physical id `cname-<RecordName>.<Zone>` is claimed *before* talking
//! to IPA. If the create then fails, the orchestrator later sends a Delete
//! carrying that id, and the record (if any) is ours to remove. A create
//! that never got that far is answered with an orchestrator-made id, and
//! the Delete for it does nothing.
//!
//! `ipa dnsrecord-add` happily adds a second value to an existing name,
//! which would quietly turn the name into a round-robin. Create therefore
//! refuses when *any* record already exists under the name.
//!
//! ## Delete
//!
//! Succeeds even if no Kerberos ticket can be obtained or `ipa dnsrecord-del`
//! fails. The usual cause of the latter is that the record is already gone,
//! and a failing delete blocks stack teardown. A credential failure is kept
//! as the response reason.
//!
//! ## Update
//!
//! Same zone and name: one `dnsrecord-mod`. Otherwise the old record is
//! deleted and the new one added under a single session. If the add fails
//! after the delete went through, the old record is gone and nothing
//! replaces it; there is no rollback.

use async_trait::async_trait;
use cfn_core::{HandlerContext, ParameterContract, Properties, ResourceHandler, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::command::CommandRunner;
use crate::ipa::{CnameRecord, IpaClient, RecordAction};
use crate::kerberos::{KerberosSession, KerberosSettings};

/// Resource type served by this handler
pub const CNAME_RESOURCE_TYPE: &str = "Custom::IPA-CNAME";

/// Properties the CNAME resource requires
pub const CNAME_CONTRACT: ParameterContract =
    ParameterContract::new(&["Zone", "RecordName", "HostName"], &[]);

/// Prefix of every physical id this handler assigns
pub const PHYSICAL_ID_PREFIX: &str = "cname-";

/// FreeIPA CNAME record handler
#[derive(Clone)]
pub struct CnameHandler {
    ipa: IpaClient,
    runner: Arc<dyn CommandRunner>,
    kerberos: KerberosSettings,
}

impl CnameHandler {
    pub fn new(ipa: IpaClient, runner: Arc<dyn CommandRunner>, kerberos: KerberosSettings) -> Self {
        Self {
            ipa,
            runner,
            kerberos,
        }
    }

    /// Physical id for a record
    pub fn physical_id_for(record: &CnameRecord) -> String {
        format!("{}{}", PHYSICAL_ID_PREFIX, record.fqdn())
    }

    async fn session(&self, ctx: &HandlerContext) -> Result<KerberosSession> {
        KerberosSession::acquire(Arc::clone(&self.runner), &self.kerberos, ctx.request_id()).await
    }

    async fn add_if_absent(&self, session: &KerberosSession, record: &CnameRecord) -> Result<()> {
        if self
            .ipa
            .record_exists(session, &record.zone, &record.record_name)
            .await?
        {
            warn!("Refusing to create {}: a record already exists", record.fqdn());
            return Err(cfn_core::Error::collision(record.fqdn()));
        }

        self.ipa.cname_record(session, RecordAction::Add, record).await
    }

    async fn replace(
        &self,
        session: &KerberosSession,
        old: &CnameRecord,
        new: &CnameRecord,
    ) -> Result<()> {
        let deleted = self.ipa.cname_record(session, RecordAction::Delete, old).await;
        if let Err(e) = &deleted {
            warn!("Deleting {} during update failed: {}", old.fqdn(), e);
        }

        let added = self.ipa.cname_record(session, RecordAction::Add, new).await;
        if added.is_err() && deleted.is_ok() {
            warn!(
                "{} was deleted but {} could not be added; neither record exists now",
                old.fqdn(),
                new.fqdn()
            );
        }
        added
    }
}

impl std::fmt::Debug for CnameHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CnameHandler")
            .field("ipa", &self.ipa)
            .field("kerberos", &self.kerberos)
            .finish()
    }
}

#[async_trait]
impl ResourceHandler for CnameHandler {
    fn handler_name(&self) -> &'static str {
        "ipa-cname"
    }

    fn contract(&self) -> ParameterContract {
        CNAME_CONTRACT
    }

    async fn create(&self, ctx: &mut HandlerContext, properties: &Properties) -> Result<()> {
        ctx.validate(self.contract(), properties)?;

        let record = CnameRecord::from_properties(properties);
        ctx.set_physical_id(Self::physical_id_for(&record));

        let session = self.session(ctx).await?;
        let result = self.add_if_absent(&session, &record).await;
        session.release().await;

        if result.is_ok() {
            info!("Created CNAME {} -> {}", record.fqdn(), record.host_name);
        }
        result
    }

    async fn update(
        &self,
        ctx: &mut HandlerContext,
        new_properties: &Properties,
        old_properties: &Properties,
    ) -> Result<()> {
        ctx.validate(self.contract(), new_properties)?;
        ctx.validate(self.contract(), old_properties)?;

        let new = CnameRecord::from_properties(new_properties);
        let old = CnameRecord::from_properties(old_properties);

        let session = self.session(ctx).await?;
        let result = if new.same_identity(&old) {
            self.ipa.cname_record(&session, RecordAction::Modify, &new).await
        } else {
            self.replace(&session, &old, &new).await
        };
        session.release().await;

        result
    }

    async fn delete(&self, ctx: &mut HandlerContext, properties: &Properties) -> Result<()> {
        ctx.validate(self.contract(), properties)?;

        let ours = ctx
            .physical_id()
            .is_some_and(|id| id.starts_with(PHYSICAL_ID_PREFIX));
        if !ours {
            info!(
                "Physical id {:?} was not assigned by this handler, nothing to delete",
                ctx.physical_id()
            );
            return Ok(());
        }

        let record = CnameRecord::from_properties(properties);
        let session = match self.session(ctx).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Not deleting {}: {}", record.fqdn(), e);
                ctx.set_reason(e.to_string());
                return Ok(());
            }
        };
        if let Err(e) = self.ipa.cname_record(&session, RecordAction::Delete, &record).await {
            warn!("Ignoring failed delete of {}: {}", record.fqdn(), e);
        }
        session.release().await;

        Ok(())
    }
}
