//! Whole-session operations and the context object owning all state.

pub mod controller;

pub use controller::{PlayMode, Session, SessionClose};
