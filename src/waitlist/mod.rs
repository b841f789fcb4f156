//! FIFO wait queue of teams awaiting a table.

pub mod queue;

pub use queue::WaitList;
