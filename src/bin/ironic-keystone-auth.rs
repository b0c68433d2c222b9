//! # Ironic Keystone Registration
//!
//! Reconciles the Ironic service account, role grant, catalog service and
//! endpoint against an identity store, printing one line per resource.
//!
//! ## Usage
//!
//! ```bash
//! ironic-keystone-auth params.json            # dry store, forgets everything on exit
//! ironic-keystone-auth params.json state.json # persist observed state between runs
//! ```
//!
//! `params.json` is a JSON object of registration parameters, for example:
//!
//! ```json
//! { "password": "ironic_password", "tenant": "foobar" }
//! ```
//!
//! Set `RUST_LOG=debug` for per-resource decisions.
//!
//! ## Exit Codes
//!
//! - `0` - every resource converged
//! - `1` - at least one resource failed or a store could not be opened
//! - `2` - the parameters were invalid, nothing was applied

use ironic_keystone_auth::config::JsonFileSource;
use ironic_keystone_auth::{
    Error, IdentityStore, InMemoryIdentityStore, JsonFileIdentityStore, ReconcileReport,
    Reconciler, Result,
};
use log::error;
use std::env;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <params.json> [state.json]", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} ironic-auth.json", args[0]);
        eprintln!("  {} ironic-auth.json /var/lib/ironic/keystone-state.json", args[0]);
        process::exit(2);
    }

    let source = JsonFileSource::new(&args[1]);
    let result = match args.get(2) {
        Some(state_path) => match JsonFileIdentityStore::open(state_path).await {
            Ok(store) => reconcile(store, &source).await,
            Err(e) => Err(e.into()),
        },
        None => reconcile(InMemoryIdentityStore::new(), &source).await,
    };

    let code = match result {
        Ok(report) => {
            println!("{}", report);
            if report.is_converged() { 0 } else { 1 }
        }
        Err(e @ Error::Config(_)) => {
            error!("{}", e);
            2
        }
        Err(e) => {
            error!("{}", e);
            1
        }
    };
    process::exit(code);
}

async fn reconcile<S: IdentityStore>(store: S, source: &JsonFileSource) -> Result<ReconcileReport> {
    Ok(Reconciler::new(store).run(source).await?)
}
