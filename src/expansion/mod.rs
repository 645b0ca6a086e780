// SPDX-License-Identifier: Apache-2.0

//! The visible subset of a design and the reversible commands that change it.
//!
//! Commands are kept on an undo stack and a redo stack. Both are strictly
//! last-in first-out, so replaying a command's recorded node and net sets in
//! reverse restores the previous state exactly. Issuing a new command that
//! changes anything discards the redo stack.
//!
//! Throughout, a net is visible exactly when at least two of its pins belong
//! to visible nodes.

mod command;
mod state;

pub use command::{
    CollapseScope, CommandId, CommandKind, CommandPolicy, CommandSummary, ExpansionCommand,
    Origin,
};
pub use state::ExpansionState;
