mod bulk_import;
mod config;
mod ipc;
mod marks;
mod session;

use std::io::{self, BufRead, Write};
use tracing::{debug, error, info};

/// Logs go to stderr; stdout carries protocol frames only.
fn setup_logging() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_env(config::ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("markimportd=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_ansi(false)
                .with_writer(io::stderr),
        )
        .init();
}

fn main() {
    setup_logging();

    let cfg = config::Config::from_env();
    debug!(?cfg, "configuration loaded");
    let mut state = ipc::AppState::new(cfg);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    info!(version = env!("CARGO_PKG_VERSION"), "markimportd ready");

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                // No id to echo back.
                debug!(error = %e, "undecodable request line");
                ipc::bad_json(e.to_string())
            }
        };

        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    info!("stdin closed, exiting");
}
