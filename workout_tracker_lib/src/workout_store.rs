use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    workout::{Location, WorkoutDetails, WorkoutKind, WorkoutRecord},
    WorkoutError,
};

/// Version written into every blob. Blobs without a version (a bare array of workouts)
/// are read as version 0.
pub const BLOB_VERSION: u32 = 1;

/// Ordered collection of workouts. Insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutStore {
    workouts: Vec<WorkoutRecord>,
}

impl WorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, workout: WorkoutRecord) -> Result<(), WorkoutError> {
        if self.position(workout.id()).is_some() {
            return Err(WorkoutError::DuplicateId(workout.id().to_owned()));
        }

        self.workouts.push(workout);
        Ok(())
    }

    /// Substitutes the workout with the given id, keeping its position.
    pub fn replace(&mut self, id: &str, workout: WorkoutRecord) -> Result<(), WorkoutError> {
        let index = self.position(id).ok_or_else(|| WorkoutError::NotFound(id.to_owned()))?;

        if workout.id() != id {
            return Err(WorkoutError::InvalidWorkoutInput(format!(
                "Replacement for {id} carries a different id {}",
                workout.id()
            )));
        }

        self.workouts[index] = workout;
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> Option<&WorkoutRecord> {
        self.workouts.iter().find(|workout| workout.id() == id)
    }

    pub(crate) fn find_by_id_mut(&mut self, id: &str) -> Option<&mut WorkoutRecord> {
        self.workouts.iter_mut().find(|workout| workout.id() == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.workouts.iter().position(|workout| workout.id() == id)
    }

    pub fn all(&self) -> &[WorkoutRecord] {
        &self.workouts
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn clear(&mut self) {
        self.workouts.clear();
    }

    /// Counts a selection of the workout. Returns the new interaction count.
    pub fn register_interaction(&mut self, id: &str) -> Result<u32, WorkoutError> {
        self.find_by_id_mut(id)
            .map(|workout| workout.register_interaction())
            .ok_or_else(|| WorkoutError::NotFound(id.to_owned()))
    }

    pub fn serialize(&self) -> Result<Vec<u8>, WorkoutError> {
        let blob = PersistedStore {
            version: Some(BLOB_VERSION),
            workouts: self.workouts.iter().map(PersistedWorkout::from).collect(),
        };

        serde_json::to_vec(&blob).map_err(|err| WorkoutError::IoFailure(format!("Failed to serialize workouts: {err}")))
    }

    /// Rebuilds a store from a blob. Derived fields are taken as stored, not recomputed.
    pub fn deserialize(blob: &[u8]) -> Result<Self, WorkoutError> {
        let value: Value = serde_json::from_slice(blob).map_err(|err| corrupt(format!("Blob is not valid JSON: {err}")))?;

        let persisted = match value {
            // Versionless blob, a bare array of workouts
            Value::Array(_) => serde_json::from_value::<Vec<PersistedWorkout>>(value)
                .map_err(|err| corrupt(format!("Malformed workout list: {err}")))?,
            Value::Object(_) => {
                let store = serde_json::from_value::<PersistedStore>(value)
                    .map_err(|err| corrupt(format!("Malformed workout store: {err}")))?;

                match store.version {
                    Some(version) if version <= BLOB_VERSION => store.workouts,
                    Some(version) => return Err(corrupt(format!("Unsupported blob version {version}"))),
                    None => return Err(corrupt("Blob has no version".into())),
                }
            }
            _ => return Err(corrupt("Blob is neither a workout store nor a workout list".into())),
        };

        let mut store = WorkoutStore::new();
        for (index, workout) in persisted.into_iter().enumerate() {
            let record = workout.into_record().map_err(|err| corrupt(format!("Workout #{index}: {err}")))?;
            store.append(record).map_err(|err| corrupt(format!("Workout #{index}: {err}")))?;
        }

        Ok(store)
    }
}

fn corrupt(message: String) -> WorkoutError {
    WorkoutError::CorruptPersistedData(message)
}

#[derive(Serialize, Deserialize)]
struct PersistedStore {
    version: Option<u32>,
    workouts: Vec<PersistedWorkout>,
}

/// Wire shape of one workout. Field names follow the browser storage format, so blobs
/// written before versioning was introduced can still be read.
/// Every field is optional here so that absence is reported as corrupt data rather than a parse error.
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedWorkout {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "date", skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<WorkoutKind>,
    /// [latitude, longitude]
    #[serde(skip_serializing_if = "Option::is_none")]
    coords: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cadence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pace: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elevation_gain: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "clicks", skip_serializing_if = "Option::is_none")]
    interaction_count: Option<u32>,
}

impl From<&WorkoutRecord> for PersistedWorkout {
    fn from(workout: &WorkoutRecord) -> Self {
        let location = workout.location();
        let mut persisted = PersistedWorkout {
            id: Some(workout.id().to_owned()),
            created_at: Some(workout.created_at()),
            kind: Some(workout.kind()),
            coords: Some([location.latitude, location.longitude]),
            distance: Some(workout.distance_km()),
            duration: Some(workout.duration_min()),
            description: Some(workout.description().to_owned()),
            interaction_count: Some(workout.interaction_count()),
            ..Default::default()
        };

        match *workout.details() {
            WorkoutDetails::Running { cadence_spm, pace_min_per_km } => {
                persisted.cadence = Some(cadence_spm);
                persisted.pace = Some(pace_min_per_km);
            }
            WorkoutDetails::Cycling { elevation_gain_m, speed_km_per_h } => {
                persisted.elevation_gain = Some(elevation_gain_m);
                persisted.speed = Some(speed_km_per_h);
            }
        }

        persisted
    }
}

impl PersistedWorkout {
    fn into_record(self) -> Result<WorkoutRecord, String> {
        fn required<T>(field: Option<T>, name: &str) -> Result<T, String> {
            field.ok_or_else(|| format!("Missing field `{name}`"))
        }

        let kind = required(self.kind, "type")?;
        let details = match kind {
            WorkoutKind::Running => {
                if self.elevation_gain.is_some() || self.speed.is_some() {
                    return Err("Running workout carries cycling fields".into());
                }
                WorkoutDetails::Running {
                    cadence_spm: required(self.cadence, "cadence")?,
                    pace_min_per_km: required(self.pace, "pace")?,
                }
            }
            WorkoutKind::Cycling => {
                if self.cadence.is_some() || self.pace.is_some() {
                    return Err("Cycling workout carries running fields".into());
                }
                WorkoutDetails::Cycling {
                    elevation_gain_m: required(self.elevation_gain, "elevationGain")?,
                    speed_km_per_h: required(self.speed, "speed")?,
                }
            }
        };

        let [latitude, longitude] = required(self.coords, "coords")?;

        Ok(WorkoutRecord::from_parts(
            required(self.id, "id")?,
            required(self.created_at, "date")?,
            Location::new(latitude, longitude),
            required(self.distance, "distance")?,
            required(self.duration, "duration")?,
            details,
            required(self.description, "description")?,
            required(self.interaction_count, "clicks")?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::workout::create_workout;

    use super::*;

    fn running() -> WorkoutRecord {
        create_workout(WorkoutKind::Running, Location::new(10., 20.), 5., 25., 180.).unwrap()
    }

    fn cycling() -> WorkoutRecord {
        create_workout(WorkoutKind::Cycling, Location::new(55.67, 12.57), 27.3, 71., 0.).unwrap()
    }

    #[test]
    fn append_keeps_insertion_order() {
        let mut store = WorkoutStore::new();
        let (first, second) = (running(), cycling());
        store.append(first.clone()).unwrap();
        store.append(second.clone()).unwrap();

        assert_eq!(store.all(), &[first.clone(), second]);
        assert_eq!(store.find_by_id(first.id()), Some(&first));
        assert_eq!(store.find_by_id("missing"), None);
    }

    #[test]
    fn duplicate_append_leaves_store_unchanged() {
        let mut store = WorkoutStore::new();
        let workout = running();
        store.append(workout.clone()).unwrap();
        store.append(cycling()).unwrap();
        let before = store.clone();

        let result = store.append(workout.clone());

        assert_eq!(result, Err(WorkoutError::DuplicateId(workout.id().to_owned())));
        assert_eq!(store, before);
    }

    #[test]
    fn replace_preserves_position() {
        let mut store = WorkoutStore::new();
        let (first, second, third) = (running(), cycling(), running());
        for workout in [&first, &second, &third] {
            store.append(workout.clone()).unwrap();
        }

        let replacement = crate::workout::build_workout(
            second.id().to_owned(),
            second.created_at(),
            WorkoutKind::Cycling,
            second.location(),
            40.,
            90.,
            350.,
        )
        .unwrap();
        store.replace(second.id(), replacement.clone()).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.position(second.id()), Some(1));
        assert_eq!(store.all()[1], replacement);
        assert_eq!(store.all()[0], first);
        assert_eq!(store.all()[2], third);
    }

    #[test]
    fn replace_unknown_id_fails() {
        let mut store = WorkoutStore::new();
        store.append(running()).unwrap();

        let result = store.replace("abc", running());
        assert_eq!(result, Err(WorkoutError::NotFound("abc".into())));
    }

    #[test]
    fn replace_with_foreign_id_fails() {
        let mut store = WorkoutStore::new();
        let workout = running();
        store.append(workout.clone()).unwrap();

        let result = store.replace(workout.id(), cycling());
        assert!(matches!(result, Err(WorkoutError::InvalidWorkoutInput(_))));
        assert_eq!(store.all(), &[workout]);
    }

    #[test]
    fn register_interaction_counts_selections() {
        let mut store = WorkoutStore::new();
        let workout = running();
        store.append(workout.clone()).unwrap();

        assert_eq!(store.register_interaction(workout.id()), Ok(1));
        assert_eq!(store.register_interaction(workout.id()), Ok(2));
        assert_eq!(store.find_by_id(workout.id()).unwrap().interaction_count(), 2);
        assert_eq!(store.register_interaction("nope"), Err(WorkoutError::NotFound("nope".into())));
    }

    #[test]
    fn serialize_round_trip_reproduces_every_record() {
        let mut store = WorkoutStore::new();
        store.append(running()).unwrap();
        store.append(cycling()).unwrap();
        store.append(create_workout(WorkoutKind::Running, Location::new(-33.9, 151.2), 0.3, 1.7, 171.5).unwrap()).unwrap();
        let id = store.all()[1].id().to_owned();
        store.register_interaction(&id).unwrap();
        store.register_interaction(&id).unwrap();

        let blob = store.serialize().unwrap();
        let restored = WorkoutStore::deserialize(&blob).unwrap();

        assert_eq!(restored, store);
        assert_eq!(restored.all()[1].interaction_count(), 2);
    }

    #[test]
    fn accepted_extreme_workouts_survive_a_reload() {
        let extremes = [f64::MIN_POSITIVE, 1e-10, 1e-3, 1., 1e150, 1e300, f64::MAX];
        let mut store = WorkoutStore::new();
        let mut rejected = 0;

        for kind in [WorkoutKind::Running, WorkoutKind::Cycling] {
            for distance in extremes {
                for duration in extremes {
                    match create_workout(kind, Location::new(-90., 180.), distance, duration, 1e300) {
                        Ok(workout) => store.append(workout).unwrap(),
                        Err(err) => {
                            assert!(matches!(err, WorkoutError::InvalidWorkoutInput(_)));
                            rejected += 1;
                        }
                    }
                }
            }
        }

        // Overflowing pace and speed are refused up front
        assert!(rejected > 0);
        assert!(store.all().iter().all(|workout| match *workout.details() {
            WorkoutDetails::Running { pace_min_per_km, .. } => pace_min_per_km.is_finite(),
            WorkoutDetails::Cycling { speed_km_per_h, .. } => speed_km_per_h.is_finite(),
        }));

        let restored = WorkoutStore::deserialize(&store.serialize().unwrap()).unwrap();
        assert_eq!(restored, store);
    }

    #[test]
    fn blob_carries_version() {
        let blob = WorkoutStore::new().serialize().unwrap();
        let value: Value = serde_json::from_slice(&blob).unwrap();
        assert_eq!(value["version"], BLOB_VERSION);
    }

    #[test]
    fn deserialize_trusts_stored_metrics() {
        let blob = br#"{"version":1,"workouts":[{"id":"a1","date":"2024-04-14T08:00:00Z","type":"running",
            "coords":[10.0,20.0],"distance":5.0,"duration":25.0,"cadence":180.0,"pace":4.9,
            "description":"Running on April 14","clicks":3}]}"#;

        let store = WorkoutStore::deserialize(blob).unwrap();
        let workout = store.find_by_id("a1").unwrap();

        assert_eq!(workout.derived_metric(), 4.9);
        assert_eq!(workout.interaction_count(), 3);
        assert_eq!(workout.location(), Location::new(10., 20.));
    }

    #[test]
    fn reads_versionless_browser_blob() {
        let blob = br#"[{"date":"2023-06-02T17:41:08.123Z","id":"5724468123","clicks":0,"coords":[51.5,-0.12],
            "distance":20,"duration":60,"type":"cycling","elevationGain":0,"speed":20,"description":"Cycling on June 2"}]"#;

        let store = WorkoutStore::deserialize(blob).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].kind(), WorkoutKind::Cycling);
        assert_eq!(store.all()[0].derived_metric(), 20.);
    }

    #[test]
    fn corrupt_blobs_are_rejected() {
        let cases: [&[u8]; 8] = [
            b"not json",
            b"42",
            br#"{"workouts":[]}"#,
            br#"{"version":99,"workouts":[]}"#,
            // missing pace
            br#"[{"id":"a","date":"2024-04-14T08:00:00Z","type":"running","coords":[1,2],"distance":5,
                "duration":25,"cadence":180,"description":"d","clicks":0}]"#,
            // running with cycling fields
            br#"[{"id":"a","date":"2024-04-14T08:00:00Z","type":"running","coords":[1,2],"distance":5,
                "duration":25,"cadence":180,"pace":5,"speed":12,"description":"d","clicks":0}]"#,
            // unknown kind
            br#"[{"id":"a","date":"2024-04-14T08:00:00Z","type":"swimming","coords":[1,2],"distance":5,
                "duration":25,"description":"d","clicks":0}]"#,
            // duplicate ids
            br#"[{"id":"a","date":"2024-04-14T08:00:00Z","type":"cycling","coords":[1,2],"distance":5,
                "duration":25,"elevationGain":3,"speed":12,"description":"d","clicks":0},
                {"id":"a","date":"2024-04-14T08:00:00Z","type":"cycling","coords":[1,2],"distance":5,
                "duration":25,"elevationGain":3,"speed":12,"description":"d","clicks":0}]"#,
        ];

        for blob in cases {
            let result = WorkoutStore::deserialize(blob);
            assert!(
                matches!(result, Err(WorkoutError::CorruptPersistedData(_))),
                "{} should be corrupt",
                String::from_utf8_lossy(blob)
            );
        }
    }
}
