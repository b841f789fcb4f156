//! Table pool and the rotation algorithm.

pub mod engine;
pub mod models;

pub use engine::RotationEngine;
pub use models::{
    CorrectionOutcome, FinalResult, NextSlot, PoolSummary, RequeuePolicy, RotationOutcome, Table,
    TableNumber, TableStatus,
};
