//! File provider: dynamic configuration read from a file on disk.
//!
//! The first load happens inside `provide`, so its message is delivered
//! before `provide` returns. Watching is handed to the pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::FileProviderConfig;
use crate::dynamic::{Configuration, Message};
use crate::lifecycle::pool::TaskPool;
use crate::provider::{check, emit, Provider, ProviderError};

const RELOAD_DEBOUNCE: Duration = Duration::from_millis(100);

/// Reads routes and backends from a TOML (or `.json`) file.
#[derive(Debug, Clone)]
pub struct FileProvider {
    config: FileProviderConfig,
}

impl FileProvider {
    pub const NAME: &'static str = "file";

    pub fn new(config: FileProviderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Provider for FileProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn init(&mut self) -> Result<(), ProviderError> {
        let path = &self.config.path;
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|source| ProviderError::Io {
                path: path.clone(),
                source,
            })?;

        if !metadata.is_file() {
            return Err(ProviderError::Other(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        Ok(())
    }

    async fn provide(
        &self,
        sink: mpsc::Sender<Message>,
        pool: Arc<dyn TaskPool>,
    ) -> Result<(), ProviderError> {
        let path = self.config.path.clone();

        // Watch before the first load so no edit can slip in between.
        let watch = if self.config.watch {
            Some(watch_file(&path)?)
        } else {
            None
        };

        let configuration = load_dynamic(&path).await?;
        emit(&sink, Self::NAME, configuration.clone()).await?;

        if let Some((watcher, changes)) = watch {
            tracing::info!(path = ?path, "Configuration file watcher started");
            let task = watch_loop(path, watcher, changes, sink, pool.token(), configuration);
            pool.go(Box::pin(task));
        }
        Ok(())
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "path": self.config.path.display().to_string(),
            "watch": self.config.watch,
        })
    }
}

/// Read, decode and validate a dynamic configuration file.
pub async fn load_dynamic(path: &Path) -> Result<Configuration, ProviderError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ProviderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let origin = path.display().to_string();

    let configuration: Configuration = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content).map_err(|e| ProviderError::Decode {
            origin: origin.clone(),
            reason: e.to_string(),
        })?
    } else {
        toml::from_str(&content).map_err(|e| ProviderError::Decode {
            origin: origin.clone(),
            reason: e.to_string(),
        })?
    };

    check(&configuration, &origin)?;
    Ok(configuration)
}

/// Watch the parent directory so editors that replace the file are seen.
fn watch_file(
    path: &Path,
) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<()>), ProviderError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let file_name = path.file_name().map(|name| name.to_os_string());

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let relevant = (event.kind.is_modify() || event.kind.is_create())
                    && event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == file_name.as_deref());
                if relevant {
                    let _ = tx.send(());
                }
            }
            Err(e) => tracing::error!("Watch error: {:?}", e),
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    )?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok((watcher, rx))
}

async fn watch_loop(
    path: PathBuf,
    watcher: RecommendedWatcher,
    mut changes: mpsc::UnboundedReceiver<()>,
    sink: mpsc::Sender<Message>,
    token: CancellationToken,
    mut current: Configuration,
) {
    let _watcher = watcher;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            change = changes.recv() => {
                let Some(()) = change else { break };
                // One save usually fires several events.
                tokio::time::sleep(RELOAD_DEBOUNCE).await;
                while changes.try_recv().is_ok() {}

                match load_dynamic(&path).await {
                    Ok(configuration) if configuration == current => {
                        tracing::debug!(path = ?path, "Configuration file unchanged");
                    }
                    Ok(configuration) => {
                        tracing::info!(path = ?path, "Configuration file change detected");
                        if emit(&sink, FileProvider::NAME, configuration.clone()).await.is_err() {
                            tracing::warn!(path = ?path, "Configuration sink closed, stopping watcher");
                            break;
                        }
                        current = configuration;
                    }
                    Err(e) => {
                        tracing::error!(path = ?path, error = %e, "Failed to reload configuration file. Keeping current configuration.");
                    }
                }
            }
        }
    }

    tracing::debug!(path = ?path, "Configuration file watcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::pool::Pool;

    const DYNAMIC: &str = r#"
[[routes]]
name = "r1"
path_prefix = "/"
backend_group = "web"

[[backends]]
name = "b1"
group = "web"
address = "127.0.0.1:3000"
"#;

    fn provider(path: PathBuf, watch: bool) -> FileProvider {
        FileProvider::new(FileProviderConfig { path, watch })
    }

    #[tokio::test]
    async fn test_emits_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic.toml");
        std::fs::write(&path, DYNAMIC).unwrap();

        let mut file = provider(path, false);
        file.init().await.unwrap();

        let pool = Arc::new(Pool::new());
        let (tx, mut rx) = mpsc::channel(4);
        file.provide(tx, pool.clone()).await.unwrap();

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.provider_name, "file");
        assert_eq!(msg.configuration.routes[0].name, "r1");
        assert_eq!(msg.configuration.backends[0].weight, 1);
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_json_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic.json");
        std::fs::write(
            &path,
            r#"{"backends":[{"name":"b1","group":"web","address":"127.0.0.1:3000"}]}"#,
        )
        .unwrap();

        let configuration = load_dynamic(&path).await.unwrap();
        assert_eq!(configuration.backends.len(), 1);
        assert!(configuration.routes.is_empty());
    }

    #[tokio::test]
    async fn test_init_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();

        let err = provider(dir.path().join("missing.toml"), false)
            .init()
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Io { .. }));

        let err = provider(dir.path().to_path_buf(), false).init().await.unwrap_err();
        assert!(matches!(err, ProviderError::Other(_)));
    }

    #[tokio::test]
    async fn test_undecodable_file_fails_provide() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic.toml");
        std::fs::write(&path, "routes = 12").unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        let err = provider(path, false)
            .provide(tx, Arc::new(Pool::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Decode { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_watch_emits_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic.toml");
        std::fs::write(&path, DYNAMIC).unwrap();

        let pool = Arc::new(Pool::new());
        let (tx, mut rx) = mpsc::channel(4);
        provider(path.clone(), true).provide(tx, pool.clone()).await.unwrap();
        assert_eq!(pool.len(), 1);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.configuration.routes.len(), 1);

        let staged = dir.path().join("dynamic.toml.new");
        std::fs::write(&staged, DYNAMIC.replace("r1", "r2")).unwrap();
        std::fs::rename(&staged, &path).unwrap();
        let second = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no reload observed")
            .unwrap();
        assert_eq!(second.provider_name, "file");
        assert_eq!(second.configuration.routes[0].name, "r2");

        pool.stop().await;
        assert!(pool.is_empty());
    }
}
