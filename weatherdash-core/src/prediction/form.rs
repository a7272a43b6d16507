use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::{
    cache::Mutation,
    config::Config,
    error::{DashboardError, Result},
    model::Location,
    provider::SnapshotSource,
    validation::{BoundSet, FieldValue},
};

use super::{FormInput, PredictionKind, PredictionResult, PredictionService, autofill};

/// Where a prediction form is in its lifecycle.
#[derive(Debug, Clone)]
pub enum FormPhase {
    Idle,
    Filling,
    Submitting,
    Resolved(PredictionResult),
    /// The submit failed; entered values are kept.
    Failed(DashboardError),
}

impl FormPhase {
    /// Whether the form accepts edits and submits.
    pub fn is_open(&self) -> bool {
        matches!(self, FormPhase::Filling | FormPhase::Submitting | FormPhase::Failed(_))
    }
}

struct FormState<I> {
    phase: FormPhase,
    input: I,
    /// Bumped on every open/close so late responses from an earlier
    /// session are ignored.
    session: u64,
}

/// One prediction form session: typed input, bounds, auto-fill and submit.
pub struct PredictionForm<I: FormInput> {
    bounds: BoundSet,
    state: Mutex<FormState<I>>,
    autofill: Mutation,
    submit: Mutation,
}

impl<I: FormInput> Default for PredictionForm<I> {
    fn default() -> Self {
        Self::with_bounds(I::declared_bounds())
    }
}

impl<I: FormInput> PredictionForm<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounds(bounds: BoundSet) -> Self {
        Self {
            bounds,
            state: Mutex::new(FormState {
                phase: FormPhase::Idle,
                input: I::default(),
                session: 0,
            }),
            autofill: Mutation::new(),
            submit: Mutation::new(),
        }
    }

    /// Declared bounds with the `[bounds.<kind>]` overrides from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let bounds = match config.bound_overrides(I::KIND) {
            Some(overrides) => I::declared_bounds().with_overrides(overrides)?,
            None => I::declared_bounds(),
        };
        Ok(Self::with_bounds(bounds))
    }

    pub fn kind(&self) -> PredictionKind {
        I::KIND
    }

    pub fn bounds(&self) -> &BoundSet {
        &self.bounds
    }

    pub fn phase(&self) -> FormPhase {
        self.state.lock().phase.clone()
    }

    pub fn input(&self) -> I {
        self.state.lock().input.clone()
    }

    /// Start a fresh session with default values.
    pub fn open(&self) {
        self.reset(FormPhase::Filling);
    }

    /// Drop the session; entered values are discarded.
    pub fn close(&self) {
        self.reset(FormPhase::Idle);
    }

    fn reset(&self, phase: FormPhase) {
        let mut state = self.state.lock();
        state.phase = phase;
        state.input = I::default();
        state.session += 1;
    }

    pub fn set_field(&self, field: &str, value: FieldValue) -> Result<()> {
        let mut state = self.state.lock();
        ensure_open(&state.phase)?;
        if matches!(state.phase, FormPhase::Submitting) {
            return Err(DashboardError::Busy);
        }
        state.input.set(field, value)?;
        state.phase = FormPhase::Filling;
        Ok(())
    }

    /// Check every field against its bound.
    pub fn validate(&self) -> Result<()> {
        self.bounds.validate(self.state.lock().input.values())
    }

    /// Submit is enabled only for an open, valid form with nothing in flight.
    pub fn can_submit(&self) -> bool {
        let open = self.state.lock().phase.is_open();
        open && !self.submit.is_mutating() && self.validate().is_ok()
    }

    pub fn is_submitting(&self) -> bool {
        self.submit.is_mutating()
    }

    /// Populate the form from the latest current conditions at `location`.
    pub async fn auto_fill(&self, source: &dyn SnapshotSource, location: &Location) -> Result<()> {
        let session = {
            let state = self.state.lock();
            ensure_open(&state.phase)?;
            state.session
        };

        let snapshot = self.autofill.trigger(source.current_snapshot(location)).await?;
        let values = autofill::resolve(I::autofill_rules(), &snapshot.current);

        let mut state = self.state.lock();
        if state.session != session {
            debug!(kind = %I::KIND, "form closed during auto-fill; discarding snapshot");
            return Ok(());
        }
        for (field, value) in values {
            state.input.set(field, value)?;
        }
        if matches!(state.phase, FormPhase::Failed(_)) {
            state.phase = FormPhase::Filling;
        }
        debug!(kind = %I::KIND, location = %location, "form auto-filled");
        Ok(())
    }

    /// Validate and send the form. At most one submit is outstanding.
    ///
    /// On success the form moves to `Resolved` and its values are dropped.
    /// On failure it moves to `Failed` and keeps what the user entered.
    pub async fn submit(&self, service: &dyn PredictionService) -> Result<PredictionResult> {
        let (payload, session) = {
            let state = self.state.lock();
            ensure_open(&state.phase)?;
            self.bounds.validate(state.input.values())?;
            let payload = serde_json::to_value(&state.input)
                .map_err(|e| {
                    DashboardError::schema(format!("could not encode {} input: {e}", I::KIND))
                })?;
            (payload, state.session)
        };

        self.submit
            .trigger(async {
                self.state.lock().phase = FormPhase::Submitting;
                info!(kind = %I::KIND, "submitting prediction");

                let outcome = service.predict(I::KIND, payload).await;

                let mut state = self.state.lock();
                if state.session != session {
                    debug!(kind = %I::KIND, "form closed during submit; result not applied");
                    return outcome;
                }
                match &outcome {
                    Ok(result) => {
                        info!(kind = %I::KIND, %result, "prediction resolved");
                        state.phase = FormPhase::Resolved(*result);
                        state.input = I::default();
                    }
                    Err(err) => {
                        error!(kind = %I::KIND, error = %err, "prediction failed");
                        state.phase = FormPhase::Failed(err.clone());
                    }
                }
                outcome
            })
            .await
    }
}

fn ensure_open(phase: &FormPhase) -> Result<()> {
    if phase.is_open() {
        Ok(())
    } else {
        Err(DashboardError::FormClosed)
    }
}
