// # cfnd - Custom Resource Request Processor
//
// Thin integration layer: all resource logic lives in cfn-core and the
// handler crates. One invocation processes exactly one request.
//
// The cfnd binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Reading the request document
// 3. Registering built-in handlers
// 4. Processing the request and delivering the response
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Request
// - `CFN_REQUEST_FILE`: Path to the request JSON (else first argument,
//   else stdin)
// - `CFN_MODE`: `deliver` (default) or `dry-run` (print only, no PUT)
//
// ### IPA CNAME handler
// - `CFN_CNAME_KEYTAB`: Kerberos keytab path
// - `CFN_CNAME_PRINCIPAL`: Kerberos principal
// - `CFN_CCACHE_DIR`: Credential cache directory (default `/tmp`)
// - `CFN_IPA_COMMAND`, `CFN_KINIT_COMMAND`, `CFN_KDESTROY_COMMAND`:
//   program overrides
//
// ### Logging
// - `CFN_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// Logs go to stderr; stdout carries only the response envelope.
//
// ## Example
//
// ```bash
// export CFN_CNAME_KEYTAB=/etc/ipa/dns.keytab
// export CFN_CNAME_PRINCIPAL=dns-admin@EXAMPLE.COM
//
// cfnd /var/run/cfn/request.json
// ```

use anyhow::{Context, Result};
use cfn_core::{HandlerConfig, Request, RequestProcessor, Router};
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible outcomes
///
/// - 0: Response produced (and delivered, unless dry-run)
/// - 1: Configuration or input error
/// - 2: Runtime or delivery error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CfnExitCode {
    /// Response produced
    Done = 0,
    /// Configuration error or unreadable request
    ConfigError = 1,
    /// Delivery failure or unexpected error
    RuntimeError = 2,
}

impl From<CfnExitCode> for ExitCode {
    fn from(code: CfnExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Environment variable to router config key
const HANDLER_KEYS: &[(&str, &str)] = &[
    ("CFN_CNAME_KEYTAB", "cname-keytab"),
    ("CFN_CNAME_PRINCIPAL", "cname-principal"),
    ("CFN_CCACHE_DIR", "cname-ccache-dir"),
    ("CFN_IPA_COMMAND", "ipa-command"),
    ("CFN_KINIT_COMMAND", "kinit-command"),
    ("CFN_KDESTROY_COMMAND", "kdestroy-command"),
];

/// Where the request document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
enum RequestSource {
    File(String),
    Stdin,
}

/// Application configuration
#[derive(Debug)]
struct Config {
    handler: HandlerConfig,
    request_source: RequestSource,
    mode: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables and arguments
    fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok(), env::args().nth(1))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>, first_arg: Option<String>) -> Self {
        let handler = HANDLER_KEYS
            .iter()
            .filter_map(|(var, key)| lookup(var).map(|value| (key.to_string(), value)))
            .collect();

        let request_source = match lookup("CFN_REQUEST_FILE").or(first_arg) {
            Some(path) if path != "-" => RequestSource::File(path),
            _ => RequestSource::Stdin,
        };

        Self {
            handler,
            request_source,
            mode: lookup("CFN_MODE").unwrap_or_else(|| "deliver".to_string()),
            log_level: lookup("CFN_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Validate the configuration
    ///
    /// Credentials may be absent (requests then fail naming `<unset>`),
    /// but when given they must not be empty.
    fn validate(&self) -> Result<()> {
        for (var, key) in HANDLER_KEYS {
            if self.handler.get(key).is_some_and(|v| v.trim().is_empty()) {
                anyhow::bail!("{} is set but empty", var);
            }
        }

        match self.mode.as_str() {
            "deliver" | "dry-run" => {}
            _ => anyhow::bail!(
                "CFN_MODE '{}' is not supported. Supported modes: deliver, dry-run",
                self.mode
            ),
        }

        if let RequestSource::File(path) = &self.request_source
            && path.is_empty()
        {
            anyhow::bail!("CFN_REQUEST_FILE cannot be empty");
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "CFN_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    fn dry_run(&self) -> bool {
        self.mode == "dry-run"
    }

    /// Read and parse the request document
    fn load_request(&self) -> Result<Request> {
        match &self.request_source {
            RequestSource::File(path) => {
                Request::load(path).with_context(|| format!("Failed to read request from {}", path))
            }
            RequestSource::Stdin => Request::from_reader(std::io::stdin().lock())
                .context("Failed to read request from stdin"),
        }
    }
}

fn main() -> ExitCode {
    let config = Config::from_env();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return CfnExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CfnExitCode::ConfigError.into();
    }

    let request = match config.load_request() {
        Ok(request) => request,
        Err(e) => {
            error!("{:#}", e);
            return CfnExitCode::ConfigError.into();
        }
    };

    info!(
        "Received {} request {} for {}",
        request.request_type, request.request_id, request.resource_type
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CfnExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run(config, request).await {
            Ok(()) => CfnExitCode::Done,
            Err(e) => {
                error!("{:#}", e);
                CfnExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Process one request and emit the response
async fn run(config: Config, request: Request) -> Result<()> {
    let router = Router::with_config(config.handler.clone());

    #[cfg(feature = "ipa")]
    {
        info!("Registering IPA CNAME handler");
        cfn_handler_ipa::register(&router);
    }

    info!("Registered resource types: {:?}", router.list_resource_types());

    let processor = build_processor(router, config.dry_run());
    let envelope = processor
        .handle(request)
        .await
        .context("Response delivery failed")?;

    println!("{}", envelope.to_json()?);
    Ok(())
}

#[cfg(feature = "http")]
fn build_processor(router: Router, dry_run: bool) -> RequestProcessor {
    let processor = RequestProcessor::new(router);
    if dry_run {
        info!("Dry-run mode: response will be printed, not delivered");
        return processor;
    }
    processor.with_sender(Box::new(cfn_callback_http::HttpResponseSender::new()))
}

#[cfg(not(feature = "http"))]
fn build_processor(router: Router, dry_run: bool) -> RequestProcessor {
    if !dry_run {
        tracing::warn!("Built without the http feature, response will only be printed");
    }
    RequestProcessor::new(router)
}
