//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GatewayConfig;
use crate::observability::metrics;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are
    /// wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        match load_config(&path) {
                            Ok(new_config) => {
                                let _ = tx.send(new_config);
                            }
                            Err(e) => {
                                metrics::record_config_reload("rejected");
                                tracing::error!(
                                    "Failed to reload config: {}. Keeping current configuration.",
                                    e
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CONFIG: &str = r#"
        [[websites]]
        id = 1
        code = "base"

        [[stores]]
        id = 1
        code = "us"
        website_id = 1
    "#;

    #[tokio::test]
    async fn test_reload_on_change() {
        let dir = std::env::temp_dir().join(format!("locale-redirect-watch-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gateway.toml");
        fs::write(&path, CONFIG).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _guard = watcher.run().unwrap();

        // Give the backend a moment to register before writing.
        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::write(&path, CONFIG.replace("code = \"us\"", "code = \"fr\"")).unwrap();

        let update = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match updates.recv().await {
                    // A write may be observed half-done; wait for the full one.
                    Some(config)
                        if config.stores.first().map(|s| s.code.as_str()) == Some("fr") =>
                    {
                        return config
                    }
                    Some(_) => continue,
                    None => panic!("watcher channel closed"),
                }
            }
        })
        .await
        .expect("no reload observed");

        assert_eq!(update.stores.len(), 1);
        let _ = fs::remove_dir_all(&dir);
    }
}
