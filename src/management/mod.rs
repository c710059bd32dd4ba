mod session;

pub use session::SessionError;
pub use session::SessionManager;
