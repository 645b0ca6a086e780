// SPDX-License-Identifier: Apache-2.0

//! Incremental exploration of flattened gate-level netlists.
//!
//! A design is loaded once into an immutable [`ConnectivityGraph`]. An
//! [`ExpansionState`] tracks the part of it a user has opened so far, grown
//! and shrunk through [`ConeTraverser`] queries with undo/redo, and
//! [`assign_layers`] ranks any visible subgraph left to right for drawing.
//!
//! ```
//! use netscope::netlist::cone::{Direction, Scope};
//! use netscope::test_utils::{graph_from_edges, output_pin};
//! use netscope::{assign_layers, ExpansionState};
//!
//! // IN -> A -> B
//! let (graph, ids) = graph_from_edges(&["IN", "A", "B"], &[(0, 1), (1, 2)]);
//! let mut state = ExpansionState::new(&graph);
//! state
//!     .expand(output_pin(&graph, ids[0]), Direction::Fanout, Scope::HopCount(2))
//!     .unwrap();
//! let layers = assign_layers(&state.visible_view().unwrap()).unwrap();
//! assert_eq!(layers.layer(ids[2]), Some(2));
//! ```

pub mod config;
pub mod error;
pub mod expansion;
pub mod ids;
pub mod layers;
pub mod netlist;
pub mod test_utils;
pub mod topo;

pub use error::{ExploreError, Missing, Result};
pub use expansion::{CommandSummary, ExpansionCommand, ExpansionState};
pub use ids::{NetId, NodeId, PinId};
pub use layers::{assign_layers, GraphView, LayerAssignment};
pub use netlist::cone::ConeTraverser;
pub use netlist::connectivity::ConnectivityGraph;
