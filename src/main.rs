use anyhow::Result;
use elektra::Config;
use elektra::host::HostRegistry;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config =
        Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    elektra::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Elektra {} starting up", env!("APP_VERSION"));

    let mut registry = HostRegistry::new();
    let instance = registry
        .setup(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Setup failed: {}", e))?;
    info!("Instance {} ready", instance);

    // The scheduling port: the refresh timer lives here in the host role,
    // never inside the coordinator
    let mut ticker =
        tokio::time::interval(std::time::Duration::from_secs(config.refresh_interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately; setup already refreshed
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match registry.refresh(&instance).await {
                    Ok(snapshot) => {
                        let rendered: Vec<String> = elektra::metrics::metric_values(&snapshot)
                            .iter()
                            .map(|(key, value)| match value {
                                Some(v) => format!("{}={:.4}", key, v),
                                None => format!("{}=n/a", key),
                            })
                            .collect();
                        info!(
                            "{} entries today={} tomorrow={}",
                            rendered.join(" "),
                            snapshot.prices_today.len(),
                            snapshot.prices_tomorrow.len(),
                        );
                    }
                    Err(failure) if failure.kind.is_transient() => {
                        error!("Refresh failed, retrying on schedule: {}", failure);
                    }
                    Err(failure) => {
                        error!("Refresh failed, check credentials: {}", failure);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    registry
        .teardown(&instance)
        .map_err(|e| anyhow::anyhow!("Teardown failed: {}", e))?;
    info!("Shutdown complete");
    Ok(())
}
