use std::{fmt, path::PathBuf, process::Stdio, time::Duration};

use reqwest::Client;
use tokio::{
    process::{Child, Command},
    time::sleep,
};

use crate::{config, debug, success};

const STARTUP_ATTEMPTS: u32 = 30;

#[derive(Debug)]
pub enum ServerError {
    Spawn(std::io::Error),
    Exited(Option<i32>),
    StartupTimeout(u32),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Spawn(e) => write!(f, "cannot start node: {}", e),
            ServerError::Exited(code) => write!(f, "API server exited early (status {:?})", code),
            ServerError::StartupTimeout(secs) => {
                write!(f, "API server did not answer within {} seconds", secs)
            }
        }
    }
}

impl std::error::Error for ServerError {}

/// A NeteaseCloudMusicApi node process owned by this program.
///
/// The child is killed when the value is dropped.
pub struct ApiServer {
    child: Child,
    base_url: String,
}

impl ApiServer {
    /// Starts `node <script>` with `PORT=<port>` and waits until the server
    /// answers on `http://localhost:<port>`, polling once per second.
    pub async fn start(script: PathBuf, port: u16) -> Result<Self, ServerError> {
        let base_url = format!("http://localhost:{}", port);

        let child = Command::new("node")
            .arg(&script)
            .env("PORT", port.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(ServerError::Spawn)?;

        let mut server = Self { child, base_url };
        server.wait_until_ready().await?;
        success!("NetEase Cloud Music API server started on port {}", port);
        Ok(server)
    }

    /// Starts the server from configuration when `NETEASE_API_SPAWN` is set.
    pub async fn start_if_configured() -> Result<Option<Self>, ServerError> {
        if !config::spawn_api_server() {
            return Ok(None);
        }
        Self::start(config::api_script(), config::api_port())
            .await
            .map(Some)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn wait_until_ready(&mut self) -> Result<(), ServerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| ServerError::Spawn(std::io::Error::other(e)))?;

        for attempt in 1..=STARTUP_ATTEMPTS {
            if let Ok(Some(status)) = self.child.try_wait() {
                return Err(ServerError::Exited(status.code()));
            }

            match client.get(&self.base_url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => debug!("API server answered {} ({})", resp.status(), attempt),
                Err(_) => debug!("API server not up yet ({}/{})", attempt, STARTUP_ATTEMPTS),
            }
            sleep(Duration::from_secs(1)).await;
        }

        let _ = self.child.start_kill();
        Err(ServerError::StartupTimeout(STARTUP_ATTEMPTS))
    }
}
