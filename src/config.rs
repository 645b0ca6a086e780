// SPDX-License-Identifier: Apache-2.0

//! Name-pattern classification of nets and cells.
//!
//! Parsers rarely know which nets are supplies or which cells are flops; the
//! usual answer is a list of name patterns kept alongside the design.
//! [`ClassifyConfig`] holds those patterns (deserializable from TOML) and
//! [`Classifier`] applies them to a [`DesignBundle`] before the graph is
//! built.
//!
//! Patterns are regular expressions matched against the whole name.
//!
//! ```
//! use netscope::config::ClassifyConfig;
//!
//! let cfg = ClassifyConfig::from_toml_str(r#"
//! power_nets = ["VDD.*"]
//! ground_nets = ["VSS.*"]
//! sequential_cells = ["MYFF.*"]
//! "#).unwrap();
//! let classifier = cfg.compile().unwrap();
//! assert!(classifier.is_sequential_cell("myff_x2"));
//! ```

use crate::error::{ExploreError, Result};
use crate::netlist::design::{DesignBundle, NetClass, NodeKind};
use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifyConfig {
    /// Net names treated as power supplies.
    pub power_nets: Vec<String>,
    /// Net names treated as ground.
    pub ground_nets: Vec<String>,
    /// Cell type names treated as latches or flip-flops.
    pub sequential_cells: Vec<String>,
    pub case_insensitive: bool,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        let strings = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        ClassifyConfig {
            power_nets: strings(&["VDD[A-Z0-9_]*", "VCC[A-Z0-9_]*", "VPWR", "VPB"]),
            ground_nets: strings(&["VSS[A-Z0-9_]*", "GND[A-Z0-9_]*", "VGND", "VNB"]),
            sequential_cells: strings(&[
                ".*DFF.*",
                ".*LATCH.*",
                ".*DLAT.*",
                ".*__(df|dl|sdf|edf)[a-z]*_[0-9]+",
            ]),
            case_insensitive: true,
        }
    }
}

impl ClassifyConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ExploreError::Config(e.to_string()))
    }

    pub fn compile(&self) -> Result<Classifier> {
        Ok(Classifier {
            power: self.build_set("power_nets", &self.power_nets)?,
            ground: self.build_set("ground_nets", &self.ground_nets)?,
            sequential: self.build_set("sequential_cells", &self.sequential_cells)?,
        })
    }

    fn build_set(&self, field: &str, patterns: &[String]) -> Result<RegexSet> {
        RegexSetBuilder::new(patterns.iter().map(|p| format!("^(?:{})$", p)))
            .case_insensitive(self.case_insensitive)
            .build()
            .map_err(|e| ExploreError::Config(format!("{}: {}", field, e)))
    }
}

/// Compiled form of a [`ClassifyConfig`].
#[derive(Debug, Clone)]
pub struct Classifier {
    power: RegexSet,
    ground: RegexSet,
    sequential: RegexSet,
}

/// What [`Classifier::apply`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    pub power_nets: usize,
    pub ground_nets: usize,
    pub sequential_cells: usize,
}

impl Classifier {
    /// Classification for a net named `name`. Power wins if both sets match.
    pub fn net_class(&self, name: &str) -> NetClass {
        if self.power.is_match(name) {
            NetClass::Power
        } else if self.ground.is_match(name) {
            NetClass::Ground
        } else {
            NetClass::Signal
        }
    }

    pub fn is_sequential_cell(&self, cell_type: &str) -> bool {
        self.sequential.is_match(cell_type)
    }

    /// Classifies nets still marked `Signal` and flags matching cells as
    /// sequential. Classifications already present in the bundle are kept.
    pub fn apply(&self, bundle: &mut DesignBundle) -> ClassifyStats {
        let mut stats = ClassifyStats::default();
        for net in &mut bundle.nets {
            if net.class != NetClass::Signal {
                continue;
            }
            net.class = self.net_class(&net.name);
            match net.class {
                NetClass::Power => stats.power_nets += 1,
                NetClass::Ground => stats.ground_nets += 1,
                NetClass::Signal => {}
            }
        }
        for node in &mut bundle.nodes {
            if let NodeKind::Cell {
                cell_type,
                is_sequential,
                ..
            } = &mut node.kind
            {
                if !*is_sequential && self.is_sequential_cell(cell_type) {
                    *is_sequential = true;
                    stats.sequential_cells += 1;
                }
            }
        }
        log::debug!(
            "classified {} power net(s), {} ground net(s), {} sequential cell(s)",
            stats.power_nets,
            stats.ground_nets,
            stats.sequential_cells
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::builder::DesignBuilder;
    use crate::netlist::design::PinDirection;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("VDD", NetClass::Power; "bare vdd")]
    #[test_case("vdd_core", NetClass::Power; "lower case suffixed vdd")]
    #[test_case("VGND", NetClass::Ground; "sky130 ground")]
    #[test_case("GND", NetClass::Ground; "bare gnd")]
    #[test_case("n_vdd_sense", NetClass::Signal; "vdd inside a signal name")]
    #[test_case("data_in", NetClass::Signal; "plain signal")]
    fn default_net_classes(name: &str, want: NetClass) {
        let c = ClassifyConfig::default().compile().unwrap();
        assert_eq!(c.net_class(name), want);
    }

    #[test_case("DFFRX1", true; "generic flop")]
    #[test_case("sky130_fd_sc_hd__dfxtp_1", true; "sky130 flop")]
    #[test_case("sky130_fd_sc_hd__dlxtp_1", true; "sky130 latch")]
    #[test_case("LATCHX2", true; "generic latch")]
    #[test_case("NAND2X1", false; "combinational")]
    #[test_case("sky130_fd_sc_hd__nand2_1", false; "sky130 combinational")]
    fn default_sequential_cells(cell: &str, want: bool) {
        let c = ClassifyConfig::default().compile().unwrap();
        assert_eq!(c.is_sequential_cell(cell), want);
    }

    #[test]
    fn toml_overrides_and_defaults_mix() {
        let cfg = ClassifyConfig::from_toml_str("sequential_cells = [\"REG.*\"]\n").unwrap();
        assert_eq!(cfg.sequential_cells, vec!["REG.*".to_string()]);
        assert_eq!(cfg.power_nets, ClassifyConfig::default().power_nets);
    }

    #[test]
    fn bad_toml_and_bad_regex_are_config_errors() {
        let err = ClassifyConfig::from_toml_str("unknown_key = 1").unwrap_err();
        assert!(matches!(err, ExploreError::Config(_)), "{:?}", err);

        let cfg = ClassifyConfig {
            ground_nets: vec!["(".to_string()],
            ..ClassifyConfig::default()
        };
        let err = cfg.compile().unwrap_err();
        assert!(err.to_string().contains("ground_nets"), "{}", err);
    }

    #[test]
    fn apply_keeps_explicit_classes() {
        let mut b = DesignBuilder::new();
        let ff = b.add_cell("r0", "DFFX1", &[("Q", PinDirection::Output)]);
        let inv = b.add_cell("u0", "INVX1", &[("A", PinDirection::Input)]);
        let q = b.pin(ff, "Q").unwrap();
        let a = b.pin(inv, "A").unwrap();
        b.add_net("VDD", &[q, a]);
        b.add_net_with_class("tie_hi", &[q, a], NetClass::Power);
        b.add_net("q", &[q, a]);
        let mut bundle = b.build();

        let stats = ClassifyConfig::default().compile().unwrap().apply(&mut bundle);
        assert_eq!(
            stats,
            ClassifyStats {
                power_nets: 1,
                ground_nets: 0,
                sequential_cells: 1,
            }
        );
        let classes: Vec<NetClass> = bundle.nets.iter().map(|n| n.class).collect();
        assert_eq!(classes, vec![NetClass::Power, NetClass::Power, NetClass::Signal]);
        assert!(bundle.nodes[0].is_sequential());
        assert!(!bundle.nodes[1].is_sequential());
    }
}
