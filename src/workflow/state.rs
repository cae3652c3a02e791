//! Generation state machine as a pure reducer.
//!
//! `Idle -> Validating -> Submitting -> (Success | Failed) -> Idle`. Validation and the
//! two outcomes resolve inside a single `reduce` call, so only `Idle` and `Submitting`
//! are observable between actions. Side effects are returned as data for the caller to run.

use crate::error::AppError;
use crate::gallery::GenerationRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowState {
    pub phase: Phase,
    /// Prompt of the in-flight request, kept verbatim for the record.
    pub pending_prompt: Option<String>,
    /// Last image shown to the user; only a successful generation replaces it.
    pub last_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Submit { prompt: String, credential: String },
    GenerationSucceeded { image_url: String },
    GenerationFailed { cause: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    EmptyPrompt,
    MissingCredential,
    GenerationFailed(String),
}

impl From<Rejection> for AppError {
    fn from(value: Rejection) -> Self {
        match value {
            Rejection::EmptyPrompt => AppError::EmptyPrompt,
            Rejection::MissingCredential => AppError::MissingCredential,
            Rejection::GenerationFailed(cause) => AppError::GenerationFailed(cause),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the provider call; its result comes back as a `Generation*` action.
    Invoke { prompt: String, credential: String },
    /// Append to the gallery. The new state is only valid if this succeeds.
    Persist(GenerationRecord),
    Reject(Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: WorkflowState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: &WorkflowState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }

    fn reject(state: &WorkflowState, rejection: Rejection) -> Self {
        Self {
            state: state.clone(),
            effects: vec![Effect::Reject(rejection)],
        }
    }
}

pub fn reduce(state: &WorkflowState, action: Action) -> Transition {
    match (state.phase, action) {
        // Single-flight: a second submit while one is running is dropped
        (Phase::Submitting, Action::Submit { .. }) => Transition::unchanged(state),

        (Phase::Idle, Action::Submit { prompt, credential }) => {
            if prompt.trim().is_empty() {
                return Transition::reject(state, Rejection::EmptyPrompt);
            }
            if credential.trim().is_empty() {
                return Transition::reject(state, Rejection::MissingCredential);
            }
            Transition {
                state: WorkflowState {
                    phase: Phase::Submitting,
                    pending_prompt: Some(prompt.clone()),
                    last_image: state.last_image.clone(),
                },
                effects: vec![Effect::Invoke { prompt, credential }],
            }
        }

        (Phase::Submitting, Action::GenerationSucceeded { image_url }) => {
            let prompt = state.pending_prompt.clone().unwrap_or_default();
            Transition {
                state: WorkflowState {
                    phase: Phase::Idle,
                    pending_prompt: None,
                    last_image: Some(image_url.clone()),
                },
                effects: vec![Effect::Persist(GenerationRecord::new(prompt, image_url))],
            }
        }

        (Phase::Submitting, Action::GenerationFailed { cause }) => Transition {
            state: WorkflowState {
                phase: Phase::Idle,
                pending_prompt: None,
                last_image: state.last_image.clone(),
            },
            effects: vec![Effect::Reject(Rejection::GenerationFailed(cause))],
        },

        // Results with no request in flight are stale
        (Phase::Idle, Action::GenerationSucceeded { .. } | Action::GenerationFailed { .. }) => {
            Transition::unchanged(state)
        }
    }
}
