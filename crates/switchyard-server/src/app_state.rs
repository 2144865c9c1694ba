use std::sync::Arc;

use crate::gateway::Gateway;
use crate::session::SessionManager;

/// Shared application state with injected dependencies.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub sessions: Arc<SessionManager>,
}
