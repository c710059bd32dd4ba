use std::{fmt, io, path::PathBuf};

use crate::{config, types::Session};

#[derive(Debug)]
pub enum SessionError {
    IoError(io::Error),
    SerdeError(serde_json::Error),
}

impl From<io::Error> for SessionError {
    fn from(err: io::Error) -> Self {
        SessionError::IoError(err)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::SerdeError(err)
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::IoError(e) => write!(f, "{}", e),
            SessionError::SerdeError(e) => write!(f, "corrupt session file: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

/// Stores the login cookie between runs.
pub struct SessionManager {
    path: PathBuf,
    session: Option<Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::at(Self::session_path())
    }

    /// Session file at a custom location.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            session: None,
        }
    }

    /// Reads the session file; a missing file yields an empty manager.
    pub async fn load(mut self) -> Result<Self, SessionError> {
        match async_fs::read_to_string(&self.path).await {
            Ok(content) => {
                self.session = serde_json::from_str::<Option<Session>>(&content)?;
                Ok(self)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(self),
            Err(e) => Err(SessionError::IoError(e)),
        }
    }

    pub async fn persist(&self) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.session)?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }

    pub fn set(&mut self, session: Session) -> &mut Self {
        self.session = Some(session);
        self
    }

    /// Forgets the session and removes the file.
    pub async fn clear(&mut self) -> Result<(), SessionError> {
        self.session = None;
        match async_fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::IoError(e)),
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn cookie(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.cookie.clone())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn session_path() -> PathBuf {
        config::data_dir().join("session.json")
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
