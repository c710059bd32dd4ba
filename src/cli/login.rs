use crate::{
    config, error, info,
    management::SessionManager,
    netease::{ApiClient, login, server::ApiServer},
    success,
    types::Session,
    warning,
};

pub async fn login() {
    let server = start_server().await;
    let mut client = api_client(server.as_ref());
    if let Err(e) = login_and_persist(&mut client).await {
        error!("Login failed: {}", e);
    }
}

pub async fn logout() {
    let server = start_server().await;
    let mut sessions = load_sessions().await;

    if let Some(cookie) = sessions.cookie() {
        let client = api_client(server.as_ref()).with_cookie(Some(cookie));
        if let Err(e) = login::logout(&client).await {
            warning!("Remote logout failed, removing the local session anyway: {}", e);
        }
    } else {
        info!("No stored session.");
    }

    match sessions.clear().await {
        Ok(()) => success!("Logged out."),
        Err(e) => error!("Cannot remove session file: {}", e),
    }
}

pub async fn status() {
    let sessions = load_sessions().await;
    let Some(cookie) = sessions.cookie() else {
        info!("Not logged in. Run grabnetease login.");
        return;
    };

    let server = start_server().await;
    let client = api_client(server.as_ref()).with_cookie(Some(cookie));
    match login::login_status(&client).await {
        Ok(Some(profile)) => success!(
            "Logged in as {} (user id {})",
            profile.nickname,
            profile.user_id
        ),
        Ok(None) => match sessions.current().and_then(|s| s.nickname.as_deref()) {
            Some(name) => warning!("The session of {} has expired. Run grabnetease login.", name),
            None => warning!("The stored session has expired. Run grabnetease login."),
        },
        Err(e) => error!("Cannot query login status: {}", e),
    }
}

/// Runs the QR login, stores the session and puts its cookie on `client`.
pub async fn login_and_persist(client: &mut ApiClient) -> crate::Res<Session> {
    let session = login::qr_login(client).await?;

    let mut sessions = SessionManager::new();
    sessions.set(session.clone());
    if let Err(e) = sessions.persist().await {
        warning!(
            "Cannot save session to {}, you will have to log in again next time: {}",
            sessions.path().display(),
            e
        );
    }

    client.set_cookie(Some(session.cookie.clone()));
    match &session.nickname {
        Some(name) => success!("Logged in as {}.", name),
        None => success!("Logged in."),
    }
    Ok(session)
}

/// Puts the stored session cookie on `client`, logging in first when there
/// is no usable session.
pub async fn ensure_session(client: &mut ApiClient) -> crate::Res<()> {
    let sessions = load_sessions().await;
    if let Some(cookie) = sessions.cookie() {
        client.set_cookie(Some(cookie));
        match login::login_status(client).await {
            Ok(Some(_)) => return Ok(()),
            Ok(None) => warning!("Stored session has expired, please log in again."),
            Err(e) => {
                warning!("Cannot verify the stored session ({}), continuing with it.", e);
                return Ok(());
            }
        }
    } else {
        info!("No stored session, starting QR login.");
    }

    login_and_persist(client).await.map(|_| ())
}

/// Spawns the local API server when `NETEASE_API_SPAWN` asks for it. It
/// lives as long as the returned value.
pub(crate) async fn start_server() -> Option<ApiServer> {
    match ApiServer::start_if_configured().await {
        Ok(server) => server,
        Err(e) => error!("Cannot start the API server: {}", e),
    }
}

/// Client for the spawned server when there is one, else for
/// `NETEASE_API_URL`.
pub(crate) fn api_client(server: Option<&ApiServer>) -> ApiClient {
    let client = match server {
        Some(server) => ApiClient::new(server.base_url(), config::http_timeout()),
        None => ApiClient::from_config(),
    };
    match client {
        Ok(client) => client,
        Err(e) => error!("Cannot build HTTP client: {}", e),
    }
}

async fn load_sessions() -> SessionManager {
    match SessionManager::new().load().await {
        Ok(sessions) => sessions,
        Err(e) => {
            warning!("Ignoring unreadable session file: {}", e);
            SessionManager::new()
        }
    }
}
