use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkoutError {
    #[error("Invalid metric input: {0}")]
    InvalidMetricInput(String),
    #[error("Invalid workout input: {0}")]
    InvalidWorkoutInput(String),
    #[error("Workout id {0} already exists")]
    DuplicateId(String),
    #[error("No workout with id {0}")]
    NotFound(String),
    #[error("Corrupt persisted data: {0}")]
    CorruptPersistedData(String),
    /// Carries the id of the workout that is already being edited.
    #[error("Already editing workout {0}")]
    EditAlreadyInProgress(String),
    #[error("I/O failure: {0}")]
    IoFailure(String),
}
