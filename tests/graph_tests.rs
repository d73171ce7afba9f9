//! Integration tests for the graph sequencer.
//!
//! Checks the ordering contract over several shapes of graph and the cycle
//! diagnostics callers see.

use std::collections::HashMap;

use anyhow::{Context, Result, ensure};
use rstest::rstest;
use shikumi::graph::{CycleError, topologically_sorted};

type Graph = Vec<(&'static str, Vec<&'static str>)>;

fn sort(graph: &Graph) -> Result<Vec<&'static str>, CycleError<&'static str>> {
    let edges: HashMap<&str, Vec<&str>> = graph.iter().cloned().collect();
    topologically_sorted(graph.iter().map(|(node, _)| *node), &|node: &&str| {
        edges.get(node).cloned().unwrap_or_default()
    })
}

fn ensure_edges_respected(graph: &Graph, order: &[&str]) -> Result<()> {
    let position: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(index, node)| (*node, index))
        .collect();
    for (node, targets) in graph {
        let from = position.get(node).context("node missing from order")?;
        for target in targets {
            let to = position.get(target).context("target missing from order")?;
            ensure!(from < to, "{node} must precede {target} in {order:?}");
        }
    }
    ensure!(position.len() == order.len(), "duplicates in {order:?}");
    Ok(())
}

#[rstest]
#[case(vec![("a", vec!["b", "c"]), ("b", vec![]), ("c", vec!["d"]), ("d", vec!["b"])])]
#[case(vec![("lib", vec![]), ("app", vec!["lib"]), ("test", vec!["app", "lib"])])]
#[case(vec![("x", vec![]), ("y", vec![]), ("z", vec![])])]
#[case(vec![("root", vec!["m1", "m2", "m3"]), ("m1", vec!["leaf"]), ("m2", vec!["leaf"]), ("m3", vec!["leaf"]), ("leaf", vec![])])]
fn acyclic_graphs_respect_every_edge(#[case] graph: Graph) -> Result<()> {
    let order = sort(&graph)?;
    ensure!(order.len() == graph.len(), "{order:?} is not a permutation");
    ensure_edges_respected(&graph, &order)
}

#[test]
fn documented_example_order() -> Result<()> {
    let graph: Graph = vec![
        ("a", vec!["b", "c"]),
        ("b", vec![]),
        ("c", vec!["d"]),
        ("d", vec!["b"]),
    ];
    let order = sort(&graph)?;
    ensure!(order == ["a", "c", "d", "b"], "unexpected order {order:?}");
    Ok(())
}

#[rstest]
#[case(vec![("a", vec!["a"])])]
#[case(vec![("a", vec!["b"]), ("b", vec!["a"])])]
#[case(vec![("a", vec!["b"]), ("b", vec!["c"]), ("c", vec!["d"]), ("d", vec!["a"])])]
#[case(vec![("ok", vec![]), ("a", vec!["b"]), ("b", vec!["c"]), ("c", vec!["b"])])]
fn cyclic_graphs_fail(#[case] graph: Graph) -> Result<()> {
    let Err(err) = sort(&graph) else {
        anyhow::bail!("expected a cycle in {graph:?}");
    };
    let nodes = err.nodes();
    ensure!(
        nodes.first() == nodes.last() && nodes.len() >= 2,
        "cycle should be closed: {nodes:?}"
    );
    ensure!(
        err.to_string().starts_with("dependency cycle detected"),
        "unexpected message {err}"
    );
    Ok(())
}

#[test]
fn disconnected_nodes_keep_input_order() -> Result<()> {
    let graph: Graph = vec![("z", vec![]), ("a", vec![]), ("m", vec![])];
    let order = sort(&graph)?;
    ensure!(order == ["z", "a", "m"], "unexpected order {order:?}");
    Ok(())
}
