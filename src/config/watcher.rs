//! Configuration file watcher for hot reload.
//!
//! Edits that fail to load or validate are logged and dropped; the proxy
//! keeps serving the rule table it already has.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ProxyConfig;

/// Monitors the configuration file and publishes validated configs.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ProxyConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ProxyConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let reload_path = path.clone();

        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                tracing::info!(path = ?reload_path, "Config file changed, reloading");
                match load_config(&reload_path) {
                    Ok(config) => {
                        let _ = update_tx.send(config);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected config reload, keeping current rules");
                    }
                }
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = ?e, "Config watch error"),
        };

        let mut watcher = RecommendedWatcher::new(
            handler,
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn rule_file(target: &str) -> String {
        format!("[[rules]]\nprefix = \"/api\"\ntarget = \"{}\"\n", target)
    }

    #[tokio::test]
    async fn test_truncated_file_is_not_published() {
        let path = std::env::temp_dir().join(format!(
            "dev-proxy-watcher-truncate-{}.toml",
            std::process::id()
        ));
        fs::write(&path, rule_file("http://localhost:9001")).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();

        // An editor truncating the file before writing it back
        fs::File::create(&path).unwrap();
        let early = tokio::time::timeout(Duration::from_millis(500), updates.recv()).await;
        assert!(early.is_err(), "empty config was published: {:?}", early);

        fs::write(&path, rule_file("http://localhost:9002")).unwrap();
        let config = tokio::time::timeout(Duration::from_secs(5), updates.recv())
            .await
            .expect("no update after rewrite")
            .unwrap();
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].target, "http://localhost:9002");

        let _ = fs::remove_file(path);
    }
}
