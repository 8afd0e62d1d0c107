use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::export::SCRATCH_PREFIX;

/// Start the cron job that removes scratch directories left behind by
/// crashed or killed exports
pub async fn start_sweeper(config: &Config) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let root = config.export_root.clone();
    let max_age = Duration::from_secs(config.sweep_max_age_minutes * 60);
    info!(
        "Scheduling scratch sweep of {} (cron: {}, max age {} min)",
        root.display(),
        config.sweep_cron,
        config.sweep_max_age_minutes
    );

    let job = Job::new_async(config.sweep_cron.as_str(), move |_uuid, _l| {
        let root = root.clone();
        Box::pin(async move {
            let result =
                tokio::task::spawn_blocking(move || sweep_stale(&root, max_age, SystemTime::now()))
                    .await;
            match result {
                Ok(Ok(0)) => debug!("Scratch sweep found nothing to remove"),
                Ok(Ok(removed)) => info!("Scratch sweep removed {} stale entries", removed),
                Ok(Err(e)) => error!("Scratch sweep failed: {}", e),
                Err(e) => error!("Scratch sweep task failed: {}", e),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!("✓ Scheduler started");

    Ok(scheduler)
}

/// Remove `gp-bulk-export-*` entries under `root` last modified more than
/// `max_age` before `now`. Returns how many were removed.
pub fn sweep_stale(root: &Path, max_age: Duration, now: SystemTime) -> Result<usize> {
    if !root.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(root)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", root.display(), e);
                continue;
            }
        };

        let is_scratch = entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with(SCRATCH_PREFIX))
            .unwrap_or(false);
        if !is_scratch {
            continue;
        }

        let path: PathBuf = entry.path();
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!("Cannot read age of {}: {}", path.display(), e);
                continue;
            }
        };
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age < max_age {
            continue;
        }

        let result = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        match result {
            Ok(()) => {
                debug!("Removed stale scratch {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
        }
    }

    Ok(removed)
}
