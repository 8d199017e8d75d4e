// Application state for HTTP handlers
use crate::application::design_service::DesignService;

#[derive(Clone)]
pub struct AppState {
    pub design_service: DesignService,
}
