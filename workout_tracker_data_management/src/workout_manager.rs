use workout_tracker_lib::{
    edit_session::{EditSession, MarkerRefresh, SubmitOutcome},
    presentation::{Intent, PresentationGateway, FOCUS_ZOOM_OFFSET, MAP_ZOOM_LEVEL},
    workout::WorkoutPayload,
    workout_store::WorkoutStore,
    WorkoutError,
};

use crate::persistence::PersistenceGateway;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Why the persisted workouts could not be used. The manager then starts empty.
    pub error: Option<WorkoutError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveStatus {
    Saved,
    /// The change is kept in memory only. Saving is not retried.
    Failed(WorkoutError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntentOutcome {
    Created { workout_id: String, save: SaveStatus },
    Replaced { workout_id: String, save: SaveStatus },
    EditStarted { workout_id: String, prefill: WorkoutPayload },
    Cancelled { workout_id: Option<String> },
    Selected { workout_id: String, interaction_count: u32, save: SaveStatus },
}

/// Application state: the workouts, the edit slot and the two gateways.
/// Every intent runs to completion, including the save, before the next one is handled.
pub struct WorkoutManager<P, V> {
    store: WorkoutStore,
    session: EditSession,
    persistence: P,
    presenter: V,
}

impl<P: PersistenceGateway, V: PresentationGateway> WorkoutManager<P, V> {
    /// Loads the persisted workouts and renders them.
    /// Unusable persisted data is reported, not fatal: the manager then starts empty.
    pub async fn start(persistence: P, presenter: V) -> (Self, LoadReport) {
        let (store, error) = match persistence.load().await {
            Ok(None) => (WorkoutStore::new(), None),
            Ok(Some(blob)) => match WorkoutStore::deserialize(&blob) {
                Ok(store) => (store, None),
                Err(err) => {
                    tracing::error!("Discarding persisted workouts: {err}");
                    (WorkoutStore::new(), Some(err))
                }
            },
            Err(err) => {
                tracing::error!("Failed to load persisted workouts: {err}");
                (WorkoutStore::new(), Some(err))
            }
        };

        let mut manager = Self {
            store,
            session: EditSession::new(),
            persistence,
            presenter,
        };

        for workout in manager.store.all() {
            manager.presenter.render(workout);
            manager.presenter.add_marker(workout);
        }

        tracing::info!("Loaded {} workouts", manager.store.len());

        let report = LoadReport {
            loaded: manager.store.len(),
            error,
        };
        (manager, report)
    }

    pub fn store(&self) -> &WorkoutStore {
        &self.store
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn presenter_mut(&mut self) -> &mut V {
        &mut self.presenter
    }

    pub async fn handle(&mut self, intent: Intent) -> Result<IntentOutcome, WorkoutError> {
        match intent {
            Intent::SubmitNew(payload) => self.submit(payload).await,
            Intent::RequestEdit(workout_id) => self.request_edit(&workout_id),
            Intent::Cancel => Ok(self.cancel()),
            Intent::Select(workout_id) => self.select(&workout_id).await,
        }
    }

    /// Submits the workout form: a new workout when idle, otherwise the open edit.
    pub async fn submit(&mut self, payload: WorkoutPayload) -> Result<IntentOutcome, WorkoutError> {
        let outcome = self
            .session
            .submit(&mut self.store, payload)
            .inspect_err(|err| self.reject(err))?;

        let save = self.persist().await;

        match outcome {
            SubmitOutcome::Created(workout_id) => {
                if let Some(workout) = self.store.find_by_id(&workout_id) {
                    tracing::info!("Created workout {workout_id}: {}", workout.description());
                    self.presenter.render(workout);
                    self.presenter.add_marker(workout);
                }
                Ok(IntentOutcome::Created { workout_id, save })
            }
            SubmitOutcome::Replaced(refresh) => {
                tracing::info!("Updated workout {}", refresh.workout_id);
                self.refresh_marker(&refresh);
                Ok(IntentOutcome::Replaced {
                    workout_id: refresh.workout_id,
                    save,
                })
            }
        }
    }

    pub fn request_edit(&mut self, workout_id: &str) -> Result<IntentOutcome, WorkoutError> {
        let prefill = self
            .session
            .request_edit(&self.store, workout_id)
            .inspect_err(|err| self.reject(err))?;

        tracing::debug!("Editing workout {workout_id}");
        self.presenter.hide_entry(workout_id);
        self.presenter.show_prefill(&prefill);

        Ok(IntentOutcome::EditStarted {
            workout_id: workout_id.to_owned(),
            prefill,
        })
    }

    /// Closes the open edit. The edited workout is drawn again from the untouched store.
    pub fn cancel(&mut self) -> IntentOutcome {
        let refresh = self.session.cancel();

        if let Some(refresh) = &refresh {
            tracing::debug!("Cancelled edit of workout {}", refresh.workout_id);
            self.refresh_marker(refresh);
        }

        IntentOutcome::Cancelled {
            workout_id: refresh.map(|refresh| refresh.workout_id),
        }
    }

    /// Counts the selection and moves the map to the workout.
    pub async fn select(&mut self, workout_id: &str) -> Result<IntentOutcome, WorkoutError> {
        let interaction_count = self
            .store
            .register_interaction(workout_id)
            .inspect_err(|err| self.reject(err))?;

        let save = self.persist().await;

        if let Some(workout) = self.store.find_by_id(workout_id) {
            self.presenter.focus(workout.location(), MAP_ZOOM_LEVEL + FOCUS_ZOOM_OFFSET);
        }

        Ok(IntentOutcome::Selected {
            workout_id: workout_id.to_owned(),
            interaction_count,
            save,
        })
    }

    /// Forgets every workout, in memory and in persistence.
    pub async fn reset(&mut self) -> Result<(), WorkoutError> {
        self.session.cancel();
        self.store.clear();
        self.presenter.clear();

        tracing::info!("Removed all workouts");
        self.persistence
            .clear()
            .await
            .inspect_err(|err| tracing::warn!("Failed to clear persisted workouts: {err}"))
    }

    fn refresh_marker(&mut self, refresh: &MarkerRefresh) {
        self.presenter.remove_marker(&refresh.workout_id);

        if let Some(workout) = self.store.find_by_id(&refresh.workout_id) {
            self.presenter.add_marker(workout);
            self.presenter.render(workout);
        }
    }

    async fn persist(&self) -> SaveStatus {
        let result = match self.store.serialize() {
            Ok(blob) => self.persistence.save(&blob).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => SaveStatus::Saved,
            Err(err) => {
                tracing::warn!("Failed to save workouts, keeping them in memory: {err}");
                SaveStatus::Failed(err)
            }
        }
    }

    fn reject(&mut self, err: &WorkoutError) {
        let message = match err {
            WorkoutError::EditAlreadyInProgress(_) => {
                tracing::debug!("{err}");
                "You're editing another workout".to_owned()
            }
            WorkoutError::InvalidWorkoutInput(reason) => {
                tracing::debug!("Rejected workout input: {reason}");
                reason.clone()
            }
            other => {
                tracing::warn!("Rejected intent: {other}");
                other.to_string()
            }
        };

        self.presenter.notify(&message);
    }
}
