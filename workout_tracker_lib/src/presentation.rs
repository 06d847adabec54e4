use crate::workout::{Location, WorkoutPayload, WorkoutRecord};

pub const MAP_ZOOM_LEVEL: u8 = 13;
/// Extra zoom applied when the map is moved to a selected workout.
pub const FOCUS_ZOOM_OFFSET: u8 = 3;

/// The surface workouts are shown on: a list and a map with one marker per workout.
/// Implementations draw, they never mutate workouts.
pub trait PresentationGateway {
    /// Show the workout as a list entry.
    fn render(&mut self, workout: &WorkoutRecord);

    fn add_marker(&mut self, workout: &WorkoutRecord);

    fn remove_marker(&mut self, workout_id: &str);

    /// Hide the list entry of a workout while it is being edited.
    fn hide_entry(&mut self, workout_id: &str);

    /// Repopulate the input form with the fields of the workout being edited.
    fn show_prefill(&mut self, prefill: &WorkoutPayload);

    fn focus(&mut self, location: Location, zoom: u8);

    /// A user facing message about a rejected intent.
    fn notify(&mut self, message: &str);

    /// Drops every entry and marker.
    fn clear(&mut self);
}

/// What the presentation side asks of the core.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// The workout form was submitted. Creates a workout, or completes the open edit.
    SubmitNew(WorkoutPayload),
    RequestEdit(String),
    Cancel,
    Select(String),
}
