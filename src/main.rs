use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use tintlog::{LogValue, Logger, LoggerOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tintlog=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let root = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tintlog/logs");

    let logger = Logger::new(LoggerOptions {
        dir_path: Some(root.clone()),
        ..Default::default()
    })?;
    tracing::info!(root = %root.display(), "logging to calendar-partitioned files");

    let mut events = logger.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!(channel = ?event.channel, "subscriber saw a record");
        }
    });

    logger.log("none", ["Plain message with &_5markup&r &-2:)"]);
    logger.info([
        LogValue::from("Startup complete, answer is"),
        LogValue::from(42),
    ]);
    logger.debug(["Debug detail"]);
    logger.warn(["Disk space low"]);
    logger.error(["Something broke"]);

    // file writes are fire-and-forget, give them a moment to land
    tokio::time::sleep(Duration::from_millis(200)).await;

    if let Some(persistence) = logger.persistence() {
        println!("\nToday's file:");
        for line in persistence.latest_log().await {
            println!("{line}");
        }
    }
    Ok(())
}
