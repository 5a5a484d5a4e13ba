// Application state for HTTP handlers
use crate::application::session::SessionManager;

pub struct AppState {
    pub sessions: SessionManager,
}
