//! Shared state for the API layer.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::analyzer::SymptomAnalyzer;
use crate::api::error::ApiError;
use crate::medication::MedicationGuide;

/// Shared context for all API routes: the database handle plus the two
/// model-backed assistants, constructed once at startup.
#[derive(Clone)]
pub struct ApiContext {
    db: Arc<Mutex<Connection>>,
    pub analyzer: Arc<SymptomAnalyzer>,
    pub medication_guide: Arc<MedicationGuide>,
}

impl ApiContext {
    pub fn new(
        conn: Connection,
        analyzer: SymptomAnalyzer,
        medication_guide: MedicationGuide,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            analyzer: Arc::new(analyzer),
            medication_guide: Arc::new(medication_guide),
        }
    }

    /// Lock the database connection. Handlers must release the guard before
    /// awaiting anything.
    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))
    }
}
