// SPDX-License-Identifier: Apache-2.0

//! Dense arena indices for netlist entities.
//!
//! [`NodeId`], [`PinId`] and [`NetId`] are `u32` newtypes that index directly
//! into the tables owned by a
//! [`ConnectivityGraph`](crate::netlist::connectivity::ConnectivityGraph).
//! They carry no lifetime and are cheap to copy, hash and serialize.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Returns the id as a table index.
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Creates an id from a table index.
            ///
            /// Tables are bounded by `u32::MAX` entries; the graph builder
            /// rejects larger designs before any id is minted.
            pub fn from_index(index: usize) -> Self {
                debug_assert!(index <= u32::MAX as usize);
                $name(index as u32)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

define_id!(
    /// Index of a cell or port in the node table.
    NodeId,
    "node#"
);

define_id!(
    /// Index of a pin in the pin table.
    PinId,
    "pin#"
);

define_id!(
    /// Index of a net in the net table.
    NetId,
    "net#"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_prefix() {
        assert_eq!(NodeId(3).to_string(), "node#3");
        assert_eq!(PinId(0).to_string(), "pin#0");
        assert_eq!(NetId(12).to_string(), "net#12");
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&vec![NodeId(1), NodeId(7)]).unwrap();
        assert_eq!(json, "[1,7]");
        let back: Vec<NodeId> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![NodeId(1), NodeId(7)]);
    }
}
