use const_format::concatcp;

pub mod persistence;
mod workout_manager;

pub use workout_manager::*;

pub const DATA_DIR: &str = "data/";
pub const WORKOUTS_BLOB_PATH: &str = concatcp!(DATA_DIR, "workouts.json");
pub const LOG_DIR: &str = concatcp!(DATA_DIR, "log");
