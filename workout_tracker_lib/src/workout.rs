use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::{
    metrics::{compute_pace, compute_speed},
    WorkoutError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub fn name(&self) -> &'static str {
        match self {
            WorkoutKind::Running => "Running",
            WorkoutKind::Cycling => "Cycling",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WorkoutKind::Running => "🏃‍♂️",
            WorkoutKind::Cycling => "🚴‍♀️",
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WorkoutKind {
    type Err = WorkoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "running" => Ok(WorkoutKind::Running),
            "cycling" => Ok(WorkoutKind::Cycling),
            other => Err(WorkoutError::InvalidWorkoutInput(format!("Unknown workout kind: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn validate(&self) -> Result<(), WorkoutError> {
        let in_range = self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude);

        if in_range {
            Ok(())
        } else {
            Err(WorkoutError::InvalidWorkoutInput(format!(
                "Location [{}, {}] is not a valid coordinate",
                self.latitude, self.longitude
            )))
        }
    }
}

// geo-types uses x for longitude and y for latitude
impl From<Location> for Point {
    fn from(location: Location) -> Self {
        Point::new(location.longitude, location.latitude)
    }
}

impl From<Point> for Location {
    fn from(point: Point) -> Self {
        Location::new(point.y(), point.x())
    }
}

/// The kind specific measurement together with the metric derived for that kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutDetails {
    Running { cadence_spm: f64, pace_min_per_km: f64 },
    Cycling { elevation_gain_m: f64, speed_km_per_h: f64 },
}

impl WorkoutDetails {
    pub fn kind(&self) -> WorkoutKind {
        match self {
            WorkoutDetails::Running { .. } => WorkoutKind::Running,
            WorkoutDetails::Cycling { .. } => WorkoutKind::Cycling,
        }
    }

    /// Cadence for running, elevation gain for cycling.
    pub fn kind_specific_value(&self) -> f64 {
        match *self {
            WorkoutDetails::Running { cadence_spm, .. } => cadence_spm,
            WorkoutDetails::Cycling { elevation_gain_m, .. } => elevation_gain_m,
        }
    }

    /// Pace for running, speed for cycling.
    pub fn derived_metric(&self) -> f64 {
        match *self {
            WorkoutDetails::Running { pace_min_per_km, .. } => pace_min_per_km,
            WorkoutDetails::Cycling { speed_km_per_h, .. } => speed_km_per_h,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutRecord {
    id: String,
    created_at: DateTime<Utc>,
    location: Location,
    distance_km: f64,
    duration_min: f64,
    details: WorkoutDetails,
    description: String,
    interaction_count: u32,
}

impl WorkoutRecord {
    /// Assembles a record from already known parts without validating or recomputing anything.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: String,
        created_at: DateTime<Utc>,
        location: Location,
        distance_km: f64,
        duration_min: f64,
        details: WorkoutDetails,
        description: String,
        interaction_count: u32,
    ) -> Self {
        Self {
            id,
            created_at,
            location,
            distance_km,
            duration_min,
            details,
            description,
            interaction_count,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn kind(&self) -> WorkoutKind {
        self.details.kind()
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn details(&self) -> &WorkoutDetails {
        &self.details
    }

    pub fn kind_specific_value(&self) -> f64 {
        self.details.kind_specific_value()
    }

    pub fn derived_metric(&self) -> f64 {
        self.details.derived_metric()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn interaction_count(&self) -> u32 {
        self.interaction_count
    }

    /// Counts an explicit selection of this workout. Returns the new count.
    pub fn register_interaction(&mut self) -> u32 {
        self.interaction_count = self.interaction_count.saturating_add(1);
        self.interaction_count
    }

    pub(crate) fn set_interaction_count(&mut self, interaction_count: u32) {
        self.interaction_count = interaction_count;
    }
}

/// The facts a user submits for a workout, and the prefill handed back when editing one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkoutPayload {
    pub kind: WorkoutKind,
    pub location: Location,
    pub distance_km: f64,
    pub duration_min: f64,
    pub kind_specific_value: f64,
}

impl From<&WorkoutRecord> for WorkoutPayload {
    fn from(record: &WorkoutRecord) -> Self {
        Self {
            kind: record.kind(),
            location: record.location(),
            distance_km: record.distance_km(),
            duration_min: record.duration_min(),
            kind_specific_value: record.kind_specific_value(),
        }
    }
}

/// Creates a new workout with a fresh id, timestamped now.
pub fn create_workout(
    kind: WorkoutKind,
    location: Location,
    distance_km: f64,
    duration_min: f64,
    kind_specific_value: f64,
) -> Result<WorkoutRecord, WorkoutError> {
    build_workout(
        new_workout_id(),
        Utc::now(),
        kind,
        location,
        distance_km,
        duration_min,
        kind_specific_value,
    )
}

/// Validates the inputs and builds a record with the given identity.
/// Nothing is derived before every input has passed validation.
pub(crate) fn build_workout(
    id: String,
    created_at: DateTime<Utc>,
    kind: WorkoutKind,
    location: Location,
    distance_km: f64,
    duration_min: f64,
    kind_specific_value: f64,
) -> Result<WorkoutRecord, WorkoutError> {
    validate_inputs(kind, location, distance_km, duration_min, kind_specific_value)?;

    // Finite inputs can still overflow the metric
    let out_of_range = |err: WorkoutError| match err {
        WorkoutError::InvalidMetricInput(reason) => WorkoutError::InvalidWorkoutInput(reason),
        other => other,
    };
    let details = match kind {
        WorkoutKind::Running => WorkoutDetails::Running {
            cadence_spm: kind_specific_value,
            pace_min_per_km: compute_pace(distance_km, duration_min).map_err(out_of_range)?,
        },
        WorkoutKind::Cycling => WorkoutDetails::Cycling {
            elevation_gain_m: kind_specific_value,
            speed_km_per_h: compute_speed(distance_km, duration_min).map_err(out_of_range)?,
        },
    };

    Ok(WorkoutRecord::from_parts(
        id,
        created_at,
        location,
        distance_km,
        duration_min,
        details,
        describe(kind, created_at),
        0,
    ))
}

fn validate_inputs(
    kind: WorkoutKind,
    location: Location,
    distance_km: f64,
    duration_min: f64,
    kind_specific_value: f64,
) -> Result<(), WorkoutError> {
    if ![distance_km, duration_min, kind_specific_value].iter().all(|value| value.is_finite()) {
        return Err(WorkoutError::InvalidWorkoutInput("Inputs have to be finite numbers".into()));
    }

    if distance_km <= 0. || duration_min <= 0. {
        return Err(WorkoutError::InvalidWorkoutInput(
            "Distance and duration have to be positive numbers".into(),
        ));
    }

    match kind {
        WorkoutKind::Running if kind_specific_value <= 0. => {
            return Err(WorkoutError::InvalidWorkoutInput("Cadence has to be a positive number".into()));
        }
        WorkoutKind::Cycling if kind_specific_value < 0. => {
            return Err(WorkoutError::InvalidWorkoutInput("Elevation gain cannot be negative".into()));
        }
        _ => {}
    }

    location.validate()
}

/// E.g. "Running on April 14".
pub fn describe(kind: WorkoutKind, created_at: DateTime<Utc>) -> String {
    format!("{} on {}", kind, created_at.format("%B %-d"))
}

pub(crate) fn new_workout_id() -> String {
    let random_bytes: [u8; 16] = rand::random();
    hex::encode(random_bytes)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn here() -> Location {
        Location::new(10., 20.)
    }

    #[test]
    fn running_derives_pace() {
        let workout = create_workout(WorkoutKind::Running, here(), 5., 25., 180.).unwrap();

        assert_eq!(workout.kind(), WorkoutKind::Running);
        assert_eq!(workout.kind().name(), "Running");
        assert_eq!(
            *workout.details(),
            WorkoutDetails::Running { cadence_spm: 180., pace_min_per_km: 5. }
        );
        assert_eq!(workout.interaction_count(), 0);
        assert!(workout.description().starts_with("Running on "));
    }

    #[test]
    fn cycling_accepts_zero_elevation() {
        let workout = create_workout(WorkoutKind::Cycling, here(), 20., 60., 0.).unwrap();

        assert_eq!(workout.kind(), WorkoutKind::Cycling);
        assert_eq!(workout.derived_metric(), 20.);
        assert_eq!(workout.kind_specific_value(), 0.);
    }

    #[test]
    fn rejects_invalid_inputs() {
        let cases = [
            (WorkoutKind::Cycling, -5., 60., 10.),
            (WorkoutKind::Cycling, 20., 0., 10.),
            (WorkoutKind::Cycling, 20., 60., -1.),
            (WorkoutKind::Running, 5., 25., 0.),
            (WorkoutKind::Running, f64::NAN, 25., 180.),
            (WorkoutKind::Running, 5., f64::INFINITY, 180.),
            (WorkoutKind::Running, 5., 25., f64::NAN),
        ];

        for (kind, distance, duration, value) in cases {
            let result = create_workout(kind, here(), distance, duration, value);
            assert!(
                matches!(result, Err(WorkoutError::InvalidWorkoutInput(_))),
                "{kind} {distance} {duration} {value} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_inputs_whose_metric_overflows() {
        let cycling = create_workout(WorkoutKind::Cycling, here(), 1e300, 1e-10, 0.);
        let running = create_workout(WorkoutKind::Running, here(), 1e-10, 1e300, 180.);

        assert!(matches!(cycling, Err(WorkoutError::InvalidWorkoutInput(_))));
        assert!(matches!(running, Err(WorkoutError::InvalidWorkoutInput(_))));
    }

    #[test]
    fn rejects_invalid_location() {
        for location in [Location::new(91., 0.), Location::new(0., -180.5), Location::new(f64::NAN, 0.)] {
            let result = create_workout(WorkoutKind::Running, location, 5., 25., 180.);
            assert!(matches!(result, Err(WorkoutError::InvalidWorkoutInput(_))));
        }
    }

    #[test]
    fn ids_are_unique() {
        let first = create_workout(WorkoutKind::Running, here(), 5., 25., 180.).unwrap();
        let second = create_workout(WorkoutKind::Running, here(), 5., 25., 180.).unwrap();

        assert_ne!(first.id(), second.id());
        assert_eq!(first.id().len(), 32);
    }

    #[test]
    fn description_uses_month_and_day() {
        let created_at = Utc.with_ymd_and_hms(2024, 4, 7, 9, 30, 0).unwrap();
        assert_eq!(describe(WorkoutKind::Cycling, created_at), "Cycling on April 7");

        let workout = build_workout("abc".into(), created_at, WorkoutKind::Running, here(), 5., 25., 180.).unwrap();
        assert_eq!(workout.description(), "Running on April 7");
        assert_eq!(workout.created_at(), created_at);
        assert_eq!(workout.id(), "abc");
    }

    #[test]
    fn location_converts_to_geo_point() {
        let point: Point = Location::new(55.6, 12.5).into();
        assert_eq!(point.x(), 12.5);
        assert_eq!(point.y(), 55.6);
        assert_eq!(Location::from(point), Location::new(55.6, 12.5));
    }

    #[test]
    fn parses_kind_names() {
        assert_eq!("running".parse::<WorkoutKind>().unwrap(), WorkoutKind::Running);
        assert_eq!("Cycling".parse::<WorkoutKind>().unwrap(), WorkoutKind::Cycling);
        assert!("swimming".parse::<WorkoutKind>().is_err());
    }
}
