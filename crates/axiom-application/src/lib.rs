//! Application layer for Axiom.
//!
//! Owns the solve/history state machine and turns solved problems into
//! display blocks. Nothing here touches the terminal or the network directly.

pub mod controller;
pub mod render;

pub use controller::{AppController, PendingSolve, SolveOutcome, ViewState};
