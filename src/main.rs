use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use timing_tower::config::{resolve_config_path, SessionConfigFile, Settings};
use timing_tower::fetch::OpenF1Client;
use timing_tower::poller::Tracker;
use timing_tower::render::{BoardHub, LogSink, RenderSink};
use timing_tower::server;
use timing_tower::session::SessionContext;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn load_session_config(settings: &Settings) -> SessionConfigFile {
    let path = resolve_config_path(&settings.session_config);
    match SessionConfigFile::load(&path) {
        Ok(cfg) => {
            info!(path = %path.display(), sessions = cfg.sessions.len(), "loaded session config");
            cfg
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "no session config; total laps and flag unavailable");
            SessionConfigFile::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let settings = Settings::parse();

    let client = OpenF1Client::new(&settings.api_base, settings.request_timeout())?;

    let session = client
        .discover_session(&settings.session_key)
        .await
        .with_context(|| format!("session discovery failed for '{}'", settings.session_key))?;
    let meeting = match session.meeting_key {
        Some(key) => client.fetch_meeting(key).await.unwrap_or_else(|e| {
            warn!(error = %e, meeting_key = key, "meeting lookup failed");
            None
        }),
        None => None,
    };

    let session_config = load_session_config(&settings);
    let entry = session_config.entry(session.session_key);
    if entry.is_none() {
        warn!(session_key = session.session_key, "session not in config");
    }
    let ctx = SessionContext::new(session, meeting, entry);
    info!(session_key = ctx.session_key(), title = %ctx.title(), "tracking session");

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let hub = Arc::new(BoardHub::default());

    let listener = server::bind(settings.bind).await?;
    let server_task = tokio::spawn(server::serve(listener, hub.clone(), cancel_rx.clone()));

    let ctrl_c_tx = cancel_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            let _ = ctrl_c_tx.send(true);
        }
    });

    let sinks: Vec<Arc<dyn RenderSink>> = vec![hub, Arc::new(LogSink)];
    let mut tracker = Tracker::new(Arc::new(client), sinks, ctx, settings.poll_interval());
    tracker.run(cancel_rx).await;

    // Keep serving the final board until Ctrl-C.
    info!("polling finished; board still served until shutdown");
    server_task.await.context("board server task panicked")??;
    drop(cancel_tx);
    Ok(())
}
