pub mod action;

pub use action::{ActionKind, ActionState, ActionStatus, NavAction, Outcome};
