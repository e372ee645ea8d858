//! CLI command implementations

pub mod pr;
pub mod stats;
pub mod team;
pub mod user;

pub use pr::PrArgs;
pub use stats::StatsArgs;
pub use team::TeamArgs;
pub use user::UserArgs;

use std::future::Future;
use std::process::ExitCode;

use rota_core::{CancellationToken, Error, ReviewService};
use serde_json::json;

/// Exit status for expected business outcomes
const DOMAIN_FAILURE: u8 = 2;

/// Shared state for a single command invocation
pub struct Context {
    service: ReviewService,
    cancel: CancellationToken,
}

impl Context {
    pub fn new(service: ReviewService, cancel: CancellationToken) -> Self {
        Self { service, cancel }
    }

    pub fn service(&self) -> &ReviewService {
        &self.service
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run a single-shot operation, abandoning it if the token fires first
    ///
    /// An abandoned operation's open transaction is rolled back on drop.
    pub async fn guard<T>(
        &self,
        op: impl Future<Output = rota_core::Result<T>>,
    ) -> rota_core::Result<T> {
        tokio::select! {
            result = op => result,
            () = self.cancel.cancelled() => Err(Error::Cancelled { reassigned: 0, removed: 0 }),
        }
    }
}

/// Print a JSON document on stdout
pub fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Report a failed command and pick the exit status
///
/// Engine errors are printed as `{"error": {"code", "message"}}` on stdout.
/// Domain outcomes exit with 2, everything else with 1.
pub fn report_error(err: &anyhow::Error) -> ExitCode {
    let Some(engine) = err.downcast_ref::<Error>() else {
        eprintln!("Error: {:#}", err);
        return ExitCode::FAILURE;
    };

    let body = json!({
        "error": {
            "code": engine.code(),
            "message": engine.to_string(),
        }
    });
    println!("{}", body);

    if engine.kind().is_domain() {
        ExitCode::from(DOMAIN_FAILURE)
    } else {
        tracing::error!(error = %engine, "Command failed");
        ExitCode::FAILURE
    }
}
