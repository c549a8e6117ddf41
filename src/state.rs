use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::db::Database;
use crate::response::AppError;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(db: Option<Arc<Database>>) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            db,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn db(&self) -> Option<Arc<Database>> {
        self.db.clone()
    }

    /// Database handle for request handlers; 503 when the pool was never
    /// initialized.
    pub fn require_db(&self) -> Result<Arc<Database>, AppError> {
        self.db
            .clone()
            .ok_or_else(|| AppError::service_unavailable("Database unavailable"))
    }
}
