use workout_tracker_lib::{
    presentation::PresentationGateway,
    workout::{Location, WorkoutDetails, WorkoutKind, WorkoutPayload, WorkoutRecord},
};

/// Prints workouts to stdout. Map operations have no terminal counterpart and are only traced.
pub struct ConsolePresenter {
    echo: bool,
}

impl ConsolePresenter {
    pub fn new(echo: bool) -> Self {
        Self { echo }
    }

    /// Entries are only printed while echo is on, so startup rendering can be kept quiet.
    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }
}

impl PresentationGateway for ConsolePresenter {
    fn render(&mut self, workout: &WorkoutRecord) {
        if self.echo {
            println!("{}", format_entry(workout));
        }
    }

    fn add_marker(&mut self, workout: &WorkoutRecord) {
        let Location { latitude, longitude } = workout.location();
        tracing::debug!("Marker for {} at [{latitude}, {longitude}]", workout.id());
    }

    fn remove_marker(&mut self, workout_id: &str) {
        tracing::debug!("Removed marker for {workout_id}");
    }

    fn hide_entry(&mut self, workout_id: &str) {
        tracing::debug!("Hiding {workout_id} while editing");
    }

    fn show_prefill(&mut self, prefill: &WorkoutPayload) {
        if self.echo {
            println!(
                "Editing {} workout: {} km, {} min, {} {}",
                prefill.kind,
                prefill.distance_km,
                prefill.duration_min,
                prefill.kind_specific_value,
                kind_specific_unit(prefill.kind),
            );
        }
    }

    fn focus(&mut self, location: Location, zoom: u8) {
        if self.echo {
            println!("Map centred on [{}, {}] at zoom {zoom}", location.latitude, location.longitude);
        }
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn clear(&mut self) {
        tracing::debug!("Cleared all entries and markers");
    }
}

fn kind_specific_unit(kind: WorkoutKind) -> &'static str {
    match kind {
        WorkoutKind::Running => "spm",
        WorkoutKind::Cycling => "m",
    }
}

/// One tab separated line per workout.
pub fn format_entry(workout: &WorkoutRecord) -> String {
    let (metric, metric_unit, value, value_unit) = match *workout.details() {
        WorkoutDetails::Running { cadence_spm, pace_min_per_km } => (pace_min_per_km, "min/km", cadence_spm, "spm"),
        WorkoutDetails::Cycling { elevation_gain_m, speed_km_per_h } => (speed_km_per_h, "km/h", elevation_gain_m, "m"),
    };

    format!(
        "{}\t{} {}\t{} km\t{} min\t{:.1} {}\t{} {}\t{}",
        workout.id(),
        workout.kind().icon(),
        workout.description(),
        workout.distance_km(),
        workout.duration_min(),
        metric,
        metric_unit,
        value,
        value_unit,
        workout.created_at().format("%d/%m/%Y %H:%M (UTC)"),
    )
}

/// Every stored fact of a workout, one per line.
pub fn format_details(workout: &WorkoutRecord) -> String {
    let Location { latitude, longitude } = workout.location();
    let details = match *workout.details() {
        WorkoutDetails::Running { cadence_spm, pace_min_per_km } => {
            format!("Pace:       {pace_min_per_km:.1} min/km\nCadence:    {cadence_spm} spm")
        }
        WorkoutDetails::Cycling { elevation_gain_m, speed_km_per_h } => {
            format!("Speed:      {speed_km_per_h:.1} km/h\nElevation:  {elevation_gain_m} m")
        }
    };

    format!(
        "{} {}\nId:         {}\nCreated:    {}\nLocation:   [{latitude}, {longitude}]\nDistance:   {} km\nDuration:   {} min\n{details}\nSelected:   {} times",
        workout.kind().icon(),
        workout.description(),
        workout.id(),
        workout.created_at().to_rfc3339(),
        workout.distance_km(),
        workout.duration_min(),
        workout.interaction_count(),
    )
}
