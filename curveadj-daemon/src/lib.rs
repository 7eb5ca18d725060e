#![warn(clippy::pedantic)]

mod config;
pub mod configurer;
pub mod runner;
mod server;
mod socket;
mod suspend;

#[cfg(test)]
mod tests;

use anyhow::Context;
use config::Config;
use futures::future::select_all;
use server::Server;
use std::str::FromStr;
use tokio::{
    runtime,
    signal::unix::{signal, SignalKind},
};
use tracing::{debug_span, info, Level};

const SHUTDOWN_SIGNALS: [SignalKind; 4] = [
    SignalKind::terminate(),
    SignalKind::interrupt(),
    SignalKind::quit(),
    SignalKind::hangup(),
];

/// Run the daemon, binding to the default socket.
///
/// # Errors
/// Returns an error when the daemon cannot initialize.
pub fn run() -> anyhow::Result<()> {
    let rt = runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Could not initialize tokio runtime")?;
    rt.block_on(async {
        let config = Config::load_or_create()?;

        let max_level = Level::from_str(&config.daemon.log_level).context("Invalid log level")?;
        tracing_subscriber::fmt().with_max_level(max_level).init();

        let server = Server::new(&config).await?;

        if config.reapply_on_resume {
            tokio::spawn(suspend::listen_events(server.handler.clone()));
        } else {
            info!("reapplying on resume is disabled");
        }

        let signals = SHUTDOWN_SIGNALS
            .into_iter()
            .map(signal)
            .collect::<Result<Vec<_>, _>>()
            .context("Could not listen to shutdown signals")?;
        tokio::spawn(listen_shutdown(signals));

        server.run().await;
        Ok(())
    })
}

async fn listen_shutdown(mut signals: Vec<tokio::signal::unix::Signal>) {
    let signal_futures = signals.iter_mut().map(|signal| Box::pin(signal.recv()));
    select_all(signal_futures).await;

    info!("cleaning up and shutting down...");
    debug_span!("shutdown_cleanup").in_scope(socket::cleanup);
    std::process::exit(0);
}
