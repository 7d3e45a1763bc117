//! Standalone CLI that follows the incident feed
//!
//! Run with: cargo run --features cli --bin pulse-cli

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use incident_pulse::client_native::{fetch_snapshot, StreamSubscriber};
    use incident_pulse::core::{ClientConfig, DashboardView, IngestOutcome, Session, StreamState};
    use std::time::Duration;
    use tracing::{error, info, warn};
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,incident_pulse=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = ClientConfig::from_env();
    info!(api = %config.api_url, limit = config.snapshot_limit, "Starting incident feed");

    let http = reqwest::Client::new();
    let mut session = Session::new(DashboardView::default(), &config);

    // Snapshot must be fully ingested before the stream opens
    let snapshot = fetch_snapshot(&http, &config).await?;
    let cursor = session.load_snapshot(snapshot);
    if let Some(bounds) = session.sink_mut().take_viewport() {
        info!(
            south = bounds.south,
            west = bounds.west,
            north = bounds.north,
            east = bounds.east,
            "Initial viewport"
        );
    }
    info!(status = %session.status_line(), "Bootstrap complete");

    let mut subscriber =
        StreamSubscriber::open(http, config.stream_url(cursor), config.reconnect_delay);
    let mut stats_interval = tokio::time::interval(Duration::from_secs(5));
    let mut ingested_last_interval = 0u64;

    loop {
        tokio::select! {
            item = subscriber.recv() => {
                match item {
                    Some(Ok(incident)) => {
                        let id = incident.id;
                        if let IngestOutcome::Added { marker } = session.ingest(incident) {
                            ingested_last_interval += 1;
                            if let Some(row) = session.sink().rows().next() {
                                info!(
                                    id = %id,
                                    source = %row.source,
                                    title = %row.title,
                                    severity = %row.severity,
                                    when = %row.occurred,
                                    marker,
                                    "Incident"
                                );
                            }
                        }
                    }
                    Some(Err(e)) => session.record_malformed(&e),
                    None => {
                        match subscriber.state() {
                            StreamState::Failed(reason) => {
                                error!(reason = %reason, "Stream failed");
                                return Err(reason.into());
                            }
                            state => warn!(state = ?state, "Stream ended"),
                        }
                        break;
                    }
                }
            }
            _ = stats_interval.tick() => {
                let counters = session.counters();
                let state = subscriber.state();
                if !state.is_open() {
                    warn!(state = ?state, "Stream not live");
                }
                info!(
                    status = %session.status_line(),
                    cursor = %session.cursor(),
                    stream = state.label(),
                    reconnects = subscriber.reconnects(),
                    duplicates = counters.duplicates,
                    malformed = counters.malformed,
                    "/sec" = format!("{:.1}", ingested_last_interval as f64 / 5.0),
                    "stats"
                );
                ingested_last_interval = 0;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, closing stream");
                subscriber.close();
                break;
            }
        }
    }

    info!(status = %session.status_line(), "Stopped");
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
