// Application state for HTTP handlers
use crate::application::runtime::DashboardHandle;
use crate::infrastructure::published_views::ViewReceivers;

#[derive(Clone)]
pub struct AppState {
    pub views: ViewReceivers,
    pub dashboard: DashboardHandle,
}
