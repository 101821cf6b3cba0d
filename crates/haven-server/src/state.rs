use haven::service::AgentService;
use std::sync::Arc;

/// Shared application state. The agent service, with its tool registry and provider,
/// is built once at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AgentService>,
}

impl AppState {
    pub fn new(service: AgentService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
