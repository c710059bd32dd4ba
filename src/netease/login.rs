use std::{
    fmt,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::sleep;

use crate::{
    config, info,
    types::{
        LoginStatusResponse, Profile, QrCheckResponse, QrCreateData, QrCreateResponse,
        QrKeyResponse, QrStatus, Session,
    },
    utils, warning,
};

use super::{ApiClient, ApiError};

const QR_EXPIRED: i64 = 800;
const QR_WAITING: i64 = 801;
const QR_SCANNED: i64 = 802;
const QR_AUTHORIZED: i64 = 803;

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug)]
pub enum LoginError {
    Api(ApiError),
    Expired,
    TimedOut,
}

impl From<ApiError> for LoginError {
    fn from(err: ApiError) -> Self {
        LoginError::Api(err)
    }
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginError::Api(e) => write!(f, "{}", e),
            LoginError::Expired => write!(f, "QR code expired twice, giving up"),
            LoginError::TimedOut => write!(f, "QR login timed out"),
        }
    }
}

impl std::error::Error for LoginError {}

/// Requests a fresh QR login key.
pub async fn qr_key(client: &ApiClient) -> Result<String, ApiError> {
    let response: QrKeyResponse = client.get_json("/login/qr/key", &[]).await?;
    Ok(response.data.unikey)
}

/// Requests the login URL and its rendered QR image for `key`.
pub async fn qr_create(client: &ApiClient, key: &str) -> Result<QrCreateData, ApiError> {
    let response: QrCreateResponse = client
        .get_json(
            "/login/qr/create",
            &[("key", key.to_string()), ("qrimg", "true".to_string())],
        )
        .await?;
    Ok(response.data)
}

/// Polls the state of a QR login once.
pub async fn qr_check(client: &ApiClient, key: &str) -> Result<QrStatus, ApiError> {
    match client
        .get_value("/login/qr/check", &[("key", key.to_string())])
        .await
    {
        Ok(value) => {
            let response: QrCheckResponse = serde_json::from_value(value)?;
            Ok(qr_status(response.code, response.cookie))
        }
        Err(ApiError::Api { code, .. }) if (QR_EXPIRED..=QR_AUTHORIZED).contains(&code) => {
            Ok(qr_status(code, None))
        }
        Err(e) => Err(e),
    }
}

/// Maps a `/login/qr/check` code to a [`QrStatus`].
pub fn qr_status(code: i64, cookie: Option<String>) -> QrStatus {
    match code {
        QR_EXPIRED => QrStatus::Expired,
        QR_WAITING => QrStatus::Waiting,
        QR_SCANNED => QrStatus::Scanned,
        QR_AUTHORIZED => match cookie.filter(|c| !c.is_empty()) {
            Some(cookie) => QrStatus::Authorized(cookie),
            None => QrStatus::Unknown(code),
        },
        other => QrStatus::Unknown(other),
    }
}

/// Returns the profile of the account behind the client's cookie, or
/// `None` when the cookie is not (or no longer) logged in.
pub async fn login_status(client: &ApiClient) -> Result<Option<Profile>, ApiError> {
    if client.cookie().is_none() {
        return Ok(None);
    }
    match client
        .get_json::<LoginStatusResponse>("/login/status", &[])
        .await
    {
        Ok(response) => Ok(response.data.profile),
        Err(ApiError::NotLoggedIn) => Ok(None),
        Err(e) => Err(e),
    }
}

pub async fn logout(client: &ApiClient) -> Result<(), ApiError> {
    client.get_value("/logout", &[]).await.map(|_| ())
}

/// Writes the QR image carried as a base64 data URL to `path`.
pub async fn save_qr_image(data_url: &str, path: &Path) -> Result<(), String> {
    let bytes = utils::decode_data_url(data_url).ok_or("QR image is not a base64 data URL")?;
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }
    async_fs::write(path, bytes).await.map_err(|e| e.to_string())
}

/// Runs the complete QR login.
///
/// 1. fetch a key and its QR code
/// 2. save the QR image and open it in the default viewer
/// 3. poll until the user scans and confirms in the mobile app
/// 4. fetch the profile for the returned cookie
///
/// An expired code is replaced once; the whole flow gives up after two
/// minutes per code.
pub async fn qr_login(client: &ApiClient) -> Result<Session, LoginError> {
    for round in 0..2 {
        if round > 0 {
            warning!("QR code expired, generating a new one...");
        }

        let key = qr_key(client).await?;
        let qr = qr_create(client, &key).await?;
        present_qr(&qr).await;

        match poll_until_done(client, &key).await? {
            Some(cookie) => {
                let profile = login_status(&client.clone().with_cookie(Some(cookie.clone())))
                    .await
                    .unwrap_or(None);
                return Ok(Session {
                    cookie,
                    user_id: profile.as_ref().map(|p| p.user_id),
                    nickname: profile.map(|p| p.nickname),
                    obtained_at: Utc::now().timestamp() as u64,
                });
            }
            None => continue,
        }
    }

    Err(LoginError::Expired)
}

/// `Some(cookie)` on success, `None` when the code expired.
async fn poll_until_done(client: &ApiClient, key: &str) -> Result<Option<String>, LoginError> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Waiting for the QR code to be scanned...");

    let start = Instant::now();
    while start.elapsed() < LOGIN_TIMEOUT {
        match qr_check(client, key).await {
            Ok(QrStatus::Authorized(cookie)) => {
                pb.finish_and_clear();
                return Ok(Some(cookie));
            }
            Ok(QrStatus::Expired) => {
                pb.finish_and_clear();
                return Ok(None);
            }
            Ok(QrStatus::Scanned) => pb.set_message("Scanned, confirm the login in the app..."),
            Ok(QrStatus::Waiting) | Ok(QrStatus::Unknown(_)) => {}
            Err(e) => {
                pb.finish_and_clear();
                return Err(LoginError::Api(e));
            }
        }
        sleep(POLL_INTERVAL).await;
    }

    pb.finish_and_clear();
    Err(LoginError::TimedOut)
}

async fn present_qr(qr: &QrCreateData) {
    let image_path = qr_image_path();
    let opened = match &qr.qrimg {
        Some(img) => match save_qr_image(img, &image_path).await {
            Ok(()) => webbrowser::open(&image_path.to_string_lossy()).is_ok(),
            Err(e) => {
                warning!("Cannot save QR image: {}", e);
                false
            }
        },
        None => false,
    };

    if opened {
        info!(
            "Scan the QR code with the NetEase Cloud Music app ({}).",
            image_path.display()
        );
    } else {
        warning!(
            "Could not show the QR code. Open this link on a logged-in device instead:\n{}",
            qr.qrurl
        );
    }
}

fn qr_image_path() -> PathBuf {
    config::data_dir().join("login-qr.png")
}
