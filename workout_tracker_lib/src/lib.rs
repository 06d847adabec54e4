pub mod error;
pub mod metrics;
pub mod workout;
pub mod workout_store;
pub mod edit_session;
pub mod presentation;

pub use error::WorkoutError;
