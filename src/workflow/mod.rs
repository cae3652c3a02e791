pub mod controller;
pub mod state;

pub use controller::{AppContext, GenerationController, SubmitOutcome};
pub use state::{reduce, Action, Effect, Phase, Rejection, Transition, WorkflowState};
