//! # Got Next
//!
//! A rotation engine for social card-table game sessions: teams wait in a
//! queue, get seated when a table opens, and the winner stays on while the
//! loser rejoins the line.
//!
//! The crate is the scheduling core only. Messaging transports, command
//! parsing, and file I/O are collaborator concerns; the core exposes typed
//! operations, typed errors, and a drainable queue of data events for the
//! shell to render.
//!
//! ## Architecture
//!
//! - [`team`]: team registry with win/loss/streak bookkeeping (single-level
//!   undo via bounded snapshots)
//! - [`waitlist`]: FIFO wait queue with membership uniqueness and
//!   all-or-nothing dequeues
//! - [`rotation`]: table pool, capacity target, and the result-recording
//!   step with lazy teardown
//! - [`session`]: the context object owning all of the above, plus
//!   whole-session operations (end of session, bulk clears)
//! - [`records`]: persisted record-line layouts shared with the
//!   file-writing collaborator
//!
//! ## Example
//!
//! ```
//! use got_next::{RequeuePolicy, Session};
//!
//! let mut session = Session::new();
//! session.create_team("Alice", Some("Bob"), None)?;
//! session.create_team("Cara", Some("Dana"), None)?;
//! session.create_team("Eve", None, None)?;
//!
//! session.increase_capacity();
//! session.enqueue_team(0)?;
//! session.enqueue_team(1)?;
//! session.enqueue_team(2)?;
//!
//! let seated = session.dequeue_teams(2)?;
//! let table = session.seat_new_table(seated[0], seated[1], "A1")?;
//! let outcome = session.record_result(table, 0, "B2", RequeuePolicy::Requeue)?;
//! assert_eq!(outcome.winner.current_streak, 1);
//! # Ok::<(), got_next::RotationError>(())
//! ```

pub mod constants;
pub mod errors;
pub mod events;
pub mod records;
pub mod rotation;
pub mod session;
pub mod team;
pub mod waitlist;

pub use errors::{RotationError, RotationResult};
pub use events::SessionEvent;
pub use records::TeamLine;
pub use rotation::{
    CorrectionOutcome, NextSlot, PoolSummary, RequeuePolicy, RotationEngine, RotationOutcome,
    Table, TableNumber,
};
pub use session::{PlayMode, Session, SessionClose};
pub use team::{Team, TeamNumber, TeamRecord, TeamRegistry, TeamStanding};
pub use waitlist::WaitList;
