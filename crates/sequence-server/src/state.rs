use sequence_core::{Db, SequenceRegistry, StepRegistry};

/// Shared application state passed to all route handlers. Both registries
/// wrap the same store handle.
#[derive(Clone)]
pub struct AppState {
    pub sequences: SequenceRegistry,
    pub steps: StepRegistry,
}

impl AppState {
    pub fn new(db: Db) -> Self {
        Self {
            sequences: SequenceRegistry::new(db.clone()),
            steps: StepRegistry::new(db),
        }
    }
}
