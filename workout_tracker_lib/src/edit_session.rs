use crate::{
    workout::{build_workout, create_workout, WorkoutPayload},
    workout_store::WorkoutStore,
    WorkoutError,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum EditState {
    #[default]
    Idle,
    Editing {
        target_id: String,
        /// Snapshot of the target used to repopulate the input form.
        prefill: WorkoutPayload,
    },
}

/// The marker of this workout is stale and must be removed and drawn again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRefresh {
    pub workout_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(String),
    Replaced(MarkerRefresh),
}

impl SubmitOutcome {
    pub fn workout_id(&self) -> &str {
        match self {
            SubmitOutcome::Created(id) => id,
            SubmitOutcome::Replaced(refresh) => &refresh.workout_id,
        }
    }
}

/// Single edit slot. At most one workout is edited at a time, and a second
/// edit request is rejected rather than queued.
#[derive(Debug, Default)]
pub struct EditSession {
    state: EditState,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing { .. })
    }

    pub fn target_id(&self) -> Option<&str> {
        match &self.state {
            EditState::Idle => None,
            EditState::Editing { target_id, .. } => Some(target_id),
        }
    }

    pub fn prefill(&self) -> Option<&WorkoutPayload> {
        match &self.state {
            EditState::Idle => None,
            EditState::Editing { prefill, .. } => Some(prefill),
        }
    }

    /// Opens the edit slot for the workout. Leaves the session untouched on failure.
    pub fn request_edit(&mut self, store: &WorkoutStore, id: &str) -> Result<WorkoutPayload, WorkoutError> {
        if let EditState::Editing { target_id, .. } = &self.state {
            return Err(WorkoutError::EditAlreadyInProgress(target_id.clone()));
        }

        let target = store.find_by_id(id).ok_or_else(|| WorkoutError::NotFound(id.to_owned()))?;

        let prefill = WorkoutPayload::from(target);
        self.state = EditState::Editing {
            target_id: target.id().to_owned(),
            prefill,
        };

        Ok(prefill)
    }

    /// Appends a new workout when idle, or replaces the edited one.
    ///
    /// An edit keeps the original id, creation time, location and interaction count.
    /// If validation fails the session stays as it was, so the form can be corrected
    /// and submitted again.
    pub fn submit(&mut self, store: &mut WorkoutStore, payload: WorkoutPayload) -> Result<SubmitOutcome, WorkoutError> {
        let EditState::Editing { target_id, .. } = &self.state else {
            let workout = create_workout(
                payload.kind,
                payload.location,
                payload.distance_km,
                payload.duration_min,
                payload.kind_specific_value,
            )?;
            let id = workout.id().to_owned();
            store.append(workout)?;
            return Ok(SubmitOutcome::Created(id));
        };

        let target_id = target_id.clone();
        let Some(original) = store.find_by_id(&target_id) else {
            // The target disappeared, nothing left to edit
            self.state = EditState::Idle;
            return Err(WorkoutError::NotFound(target_id));
        };

        if payload.kind != original.kind() {
            return Err(WorkoutError::InvalidWorkoutInput(format!(
                "Cannot change a {} workout into a {}",
                original.kind(),
                payload.kind
            )));
        }

        let mut replacement = build_workout(
            target_id.clone(),
            original.created_at(),
            original.kind(),
            original.location(),
            payload.distance_km,
            payload.duration_min,
            payload.kind_specific_value,
        )?;
        replacement.set_interaction_count(original.interaction_count());

        store.replace(&target_id, replacement)?;
        self.state = EditState::Idle;

        Ok(SubmitOutcome::Replaced(MarkerRefresh { workout_id: target_id }))
    }

    /// Closes the edit slot without touching the store.
    pub fn cancel(&mut self) -> Option<MarkerRefresh> {
        match std::mem::take(&mut self.state) {
            EditState::Idle => None,
            EditState::Editing { target_id, .. } => Some(MarkerRefresh { workout_id: target_id }),
        }
    }
}
