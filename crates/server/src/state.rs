use chrono::{DateTime, Utc};

use hostwatch_monitor::AnalysisHandle;

pub struct AppState {
    /// Latest published cycle. Handlers never wait on the monitor.
    pub analysis: AnalysisHandle,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(analysis: AnalysisHandle) -> Self {
        Self {
            analysis,
            started_at: Utc::now(),
        }
    }
}
