//! Response decomposition for PatchChat.
//!
//! One user prompt becomes one turn: the model gateway is called once,
//! and the ordered parts of its response are decomposed into a flat,
//! ordered stream of path-addressed leaf patches. Tool executions run as
//! independent tasks whose output patches join the stream as they
//! resolve; the stream ends when every part and every executor has been
//! accounted for.

pub mod runner;

pub use runner::{TurnError, TurnOptions, TurnRunner, UnknownToolPolicy};
