//! # PatchChat Core
//!
//! Domain types, traits, and the patch protocol for PatchChat.
//! This crate has **zero framework dependencies** — it defines the data
//! model that all other crates implement against.
//!
//! The protocol core lives here:
//! - [`patch::flatten`] decomposes an arbitrarily nested JSON value into
//!   one `(path, scalar)` patch per leaf.
//! - [`tree::Transcript`] replays an ordered patch stream back into the
//!   nested message tree, last write winning at each path.
//!
//! Every other crate depends inward on this one.

pub mod error;
pub mod gateway;
pub mod part;
pub mod patch;
pub mod tool;
pub mod tree;

// Re-export key types at crate root for ergonomics
pub use error::{Error, GatewayError, PatchError, Result, ToolError};
pub use gateway::ModelGateway;
pub use part::Part;
pub use patch::{Patch, PatchPath, PathStep, flatten};
pub use tool::{Tool, ToolDeclaration, ToolOutcome, ToolRegistry};
pub use tree::{ChatRole, ChatTurn, Transcript};
