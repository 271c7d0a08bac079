use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{info, warn};

use crate::domain::DomainError;

/// Runs a local Chroma server over the persist directory.
pub struct ChromaServer {
    binary: String,
    persist_dir: PathBuf,
    host: String,
    port: u16,
}

impl ChromaServer {
    pub fn new(
        binary: impl Into<String>,
        persist_dir: &Path,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            binary: binary.into(),
            persist_dir: persist_dir.to_path_buf(),
            host: host.into(),
            port,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            "run".to_string(),
            "--path".to_string(),
            self.persist_dir.display().to_string(),
            "--host".to_string(),
            self.host.clone(),
            "--port".to_string(),
            self.port.to_string(),
        ]
    }

    /// Starts the server and waits until it exits or Ctrl-C is pressed.
    pub async fn run(&self) -> Result<(), DomainError> {
        tokio::fs::create_dir_all(&self.persist_dir).await?;

        info!(
            "Starting Chroma server ({}) with data in {}",
            self.binary,
            self.persist_dir.display()
        );
        let mut child = Command::new(&self.binary)
            .args(self.args())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DomainError::internal(format!("Failed to start '{}': {}", self.binary, e))
            })?;

        info!("Chroma server listening on {}", self.url());

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    Ok(())
                } else {
                    Err(DomainError::internal(format!("Chroma server exited with {}", status)))
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping Chroma server");
                child.kill().await?;
                Ok(())
            }
        }
    }
}
