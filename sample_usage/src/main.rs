// SPDX-License-Identifier: Apache-2.0

//! Walks through a short exploration session over a small registered
//! accumulator: seed the output port, grow upstream to the register, open the
//! feedback loop, then undo and lay out each snapshot.

mod multithread;

use netscope::config::ClassifyConfig;
use netscope::netlist::builder::DesignBuilder;
use netscope::netlist::cone::{BoundaryPolicy, Direction, Scope};
use netscope::netlist::design::{DesignBundle, PinDirection, PortDirection};
use netscope::{assign_layers, ConnectivityGraph, ExpansionState, LayerAssignment, NodeId};

/// `a, b -> u_add -> r_acc (DFF) -> u_buf -> y`, with `r_acc.Q` fed back into
/// `u_add` and every cell tied to VDD/VSS.
pub fn accumulator_design() -> DesignBundle {
    let mut b = DesignBuilder::new();
    let a = b.add_port("a", PortDirection::Input);
    let bb = b.add_port("b", PortDirection::Input);
    let y = b.add_port("y", PortDirection::Output);
    let supply = [("VPWR", PinDirection::Inout), ("VGND", PinDirection::Inout)];
    let cell = |b: &mut DesignBuilder, name: &str, ty: &str, pins: &[(&str, PinDirection)]| {
        let mut all = pins.to_vec();
        all.extend_from_slice(&supply);
        b.add_cell(name, ty, &all)
    };
    let add = cell(
        &mut b,
        "u_add",
        "ADD3X1",
        &[
            ("A", PinDirection::Input),
            ("B", PinDirection::Input),
            ("C", PinDirection::Input),
            ("S", PinDirection::Output),
        ],
    );
    let acc = cell(
        &mut b,
        "r_acc",
        "DFFX1",
        &[("D", PinDirection::Input), ("Q", PinDirection::Output)],
    );
    let buf = cell(
        &mut b,
        "u_buf",
        "BUFX2",
        &[("A", PinDirection::Input), ("Y", PinDirection::Output)],
    );

    let pin = |b: &DesignBuilder, node: NodeId, name: &str| b.pin(node, name).expect("cell pin");
    let nets = [
        ("a", vec![b.port_pin(a), pin(&b, add, "A")]),
        ("b", vec![b.port_pin(bb), pin(&b, add, "B")]),
        ("sum", vec![pin(&b, add, "S"), pin(&b, acc, "D")]),
        ("acc", vec![pin(&b, acc, "Q"), pin(&b, add, "C"), pin(&b, buf, "A")]),
        ("y", vec![pin(&b, buf, "Y"), b.port_pin(y)]),
        ("VDD", [add, acc, buf].iter().map(|n| pin(&b, *n, "VPWR")).collect()),
        ("VSS", [add, acc, buf].iter().map(|n| pin(&b, *n, "VGND")).collect()),
    ];
    for (name, pins) in nets {
        b.add_net(name, &pins);
    }
    b.build()
}

/// The accumulator with default supply and flop classification applied.
pub fn accumulator_graph() -> netscope::Result<ConnectivityGraph> {
    let mut bundle = accumulator_design();
    let stats = ClassifyConfig::default().compile()?.apply(&mut bundle);
    log::info!("classification: {:?}", stats);
    ConnectivityGraph::build(bundle)
}

fn describe(graph: &ConnectivityGraph, layers: &LayerAssignment) -> String {
    layers
        .layers()
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|n| graph.node(*n).map(|n| n.name().to_string()).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn explore() -> anyhow::Result<Vec<String>> {
    let graph = accumulator_graph()?;
    let y = graph
        .node_by_name("y")
        .ok_or_else(|| anyhow::anyhow!("port y missing"))?;
    let y_pin = graph.node(y)?.pins[0];
    let acc = graph
        .node_by_name("r_acc")
        .ok_or_else(|| anyhow::anyhow!("register r_acc missing"))?;
    let acc_d = graph.node(acc)?.pins[0];

    let mut state = ExpansionState::new(&graph);
    let mut snapshots = Vec::new();
    state.seed(y)?;
    state.expand(y_pin, Direction::Fanin, Scope::Boundary(BoundaryPolicy::Sequential))?;
    snapshots.push(state.visible_view()?);
    state.expand(acc_d, Direction::Fanin, Scope::HopCount(2))?;
    snapshots.push(state.visible_view()?);
    state.undo();
    snapshots.push(state.visible_view()?);

    let mut lines = Vec::new();
    for view in &snapshots {
        let layers = assign_layers(view)?;
        lines.push(describe(&graph, &layers));
    }
    Ok(lines)
}

fn main() -> anyhow::Result<()> {
    let _ = env_logger::try_init();
    for line in explore()? {
        println!("{}", line);
    }
    multithread::layer_snapshots_in_parallel()?;
    Ok(())
}

#[test]
fn test_explore() {
    let _ = env_logger::try_init();
    let lines = explore().expect("exploration should succeed");
    assert_eq!(
        lines,
        vec![
            "r_acc | u_buf | y".to_string(),
            "a,b | u_add | r_acc | u_buf | y".to_string(),
            "r_acc | u_buf | y".to_string(),
        ]
    );
}
