use anyhow::Result;
use dsi_progress_logger::no_logging;
use propgraph_algo::algo::sssp::{
    shortest_path, shortest_path_statistics, shortest_path_validate, SsspPlan,
};
use propgraph_algo::graph::PropertyGraph;
use propgraph_algo::Error;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

const WEIGHT: &str = "weight";

fn all_plans() -> Vec<(&'static str, SsspPlan)> {
    vec![
        ("delta_step", SsspPlan::delta_step(2)),
        ("delta_step_tile", SsspPlan::delta_step_tile(2)),
        ("delta_step_barrier", SsspPlan::delta_step_barrier(2)),
        ("serial_delta", SsspPlan::serial_delta(2)),
        ("serial_delta_tile", SsspPlan::serial_delta_tile(2)),
        ("dijkstra", SsspPlan::dijkstra()),
        ("dijkstra_tile", SsspPlan::dijkstra_tile()),
        ("topological", SsspPlan::topological()),
        ("topological_tile", SsspPlan::topological_tile()),
    ]
}

/// Textbook Dijkstra on the arc list, used as the reference.
fn reference_distances(num_nodes: usize, arcs: &[(usize, usize, u32)], source: usize) -> Vec<u64> {
    let mut successors = vec![Vec::new(); num_nodes];
    for &(src, dest, weight) in arcs {
        successors[src].push((dest, weight as u64));
    }
    let mut dist = vec![u64::MAX; num_nodes];
    dist[source] = 0;
    let mut heap = BinaryHeap::new();
    heap.push(Reverse((0u64, source)));
    while let Some(Reverse((d, node))) = heap.pop() {
        if d > dist[node] {
            continue;
        }
        for &(dest, weight) in &successors[node] {
            if d + weight < dist[dest] {
                dist[dest] = d + weight;
                heap.push(Reverse((dist[dest], dest)));
            }
        }
    }
    dist
}

fn random_arcs(
    rng: &mut StdRng,
    num_nodes: usize,
    num_arcs: usize,
    max_weight: u32,
) -> Vec<(usize, usize, u32)> {
    (0..num_arcs)
        .map(|_| {
            (
                rng.random_range(0..num_nodes),
                rng.random_range(0..num_nodes),
                rng.random_range(1..=max_weight),
            )
        })
        .collect()
}

#[test]
fn test_unit_cycle() -> Result<()> {
    let arcs = [(0, 1, 1u32), (1, 2, 1), (2, 3, 1), (3, 0, 1)];
    for (name, plan) in all_plans() {
        let mut graph = PropertyGraph::from_weighted_arcs(4, &arcs, WEIGHT);
        shortest_path(&mut graph, 0, WEIGHT, "distance", &plan, no_logging![])?;
        assert_eq!(
            graph.node_values::<u32>("distance")?,
            &[0, 1, 2, 3],
            "wrong distances with {}",
            name
        );
        shortest_path_validate(&graph, 0, WEIGHT, "distance")?;
    }
    Ok(())
}

#[test]
fn test_disconnected_node_stays_at_infinity() -> Result<()> {
    let arcs = [(0, 1, 5u32)];
    let mut graph = PropertyGraph::from_weighted_arcs(3, &arcs, WEIGHT);
    shortest_path(
        &mut graph,
        0,
        WEIGHT,
        "distance",
        &SsspPlan::default(),
        no_logging![],
    )?;

    let dist = graph.node_values::<u32>("distance")?;
    assert_eq!(dist[0], 0);
    assert_eq!(dist[1], 5);
    assert_eq!(dist[2], u32::MAX / 2);

    let stats = shortest_path_statistics(&graph, "distance")?;
    assert_eq!(stats.reached_nodes, 2);
    assert_eq!(stats.max_distance, 5.0);
    assert_eq!(stats.average_distance, 2.5);
    Ok(())
}

#[test]
fn test_statistics_on_cycle() -> Result<()> {
    let arcs = [(0, 1, 1u32), (1, 2, 1), (2, 3, 1), (3, 0, 1)];
    let mut graph = PropertyGraph::from_weighted_arcs(4, &arcs, WEIGHT);
    shortest_path(
        &mut graph,
        0,
        WEIGHT,
        "distance",
        &SsspPlan::serial_delta(0),
        no_logging![],
    )?;
    let stats = shortest_path_statistics(&graph, "distance")?;
    assert_eq!(stats.reached_nodes, 4);
    assert_eq!(stats.max_distance, 3.0);
    assert_eq!(stats.average_distance, 1.5);
    Ok(())
}

#[test]
fn test_delta_grid_matches_dijkstra() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5_55_5);
    for trial in 0..5 {
        let num_nodes = 64;
        let arcs = random_arcs(&mut rng, num_nodes, 400, 100);
        let source = rng.random_range(0..num_nodes);
        let expected: Vec<u32> = reference_distances(num_nodes, &arcs, source)
            .into_iter()
            .map(|d| if d == u64::MAX { u32::MAX / 2 } else { d as u32 })
            .collect();

        for delta in [0, 1, 4, 16] {
            for plan in [
                SsspPlan::delta_step(delta),
                SsspPlan::delta_step_tile(delta),
                SsspPlan::delta_step_barrier(delta),
                SsspPlan::serial_delta(delta),
            ] {
                let mut graph = PropertyGraph::from_weighted_arcs(num_nodes, &arcs, WEIGHT);
                shortest_path(&mut graph, source, WEIGHT, "distance", &plan, no_logging![])?;
                assert_eq!(
                    graph.node_values::<u32>("distance")?,
                    expected.as_slice(),
                    "trial {} diverged with {:?} delta {}",
                    trial,
                    plan.algorithm,
                    delta
                );
                shortest_path_validate(&graph, source, WEIGHT, "distance")?;
            }
        }
    }
    Ok(())
}

#[test]
fn test_all_variants_agree_on_random_graph() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0xdead);
    let num_nodes = 48;
    let arcs = random_arcs(&mut rng, num_nodes, 300, 50);
    let expected: Vec<u32> = reference_distances(num_nodes, &arcs, 0)
        .into_iter()
        .map(|d| if d == u64::MAX { u32::MAX / 2 } else { d as u32 })
        .collect();

    for (name, plan) in all_plans() {
        let mut graph = PropertyGraph::from_weighted_arcs(num_nodes, &arcs, WEIGHT);
        shortest_path(&mut graph, 0, WEIGHT, "distance", &plan, no_logging![])?;
        assert_eq!(
            graph.node_values::<u32>("distance")?,
            expected.as_slice(),
            "wrong distances with {}",
            name
        );
    }
    Ok(())
}

#[test]
fn test_float_weights() -> Result<()> {
    let arcs = [
        (0, 1, 0.5f64),
        (1, 2, 0.25),
        (0, 2, 1.0),
        (2, 3, 2.5),
        (3, 0, 1.0),
    ];
    for (name, plan) in all_plans() {
        let mut graph = PropertyGraph::from_weighted_arcs(4, &arcs, WEIGHT);
        shortest_path(&mut graph, 0, WEIGHT, "distance", &plan, no_logging![])?;
        let dist = graph.node_values::<f64>("distance")?;
        let expected = [0.0, 0.5, 0.75, 3.25];
        for (node, (&d, &e)) in dist.iter().zip(&expected).enumerate() {
            assert!(
                (d - e).abs() < 1E-12,
                "node {} has distance {} instead of {} with {}",
                node,
                d,
                e,
                name
            );
        }
        shortest_path_validate(&graph, 0, WEIGHT, "distance")?;
    }
    Ok(())
}

#[test]
fn test_converged_rerun_changes_nothing() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let arcs = random_arcs(&mut rng, 32, 150, 20);
    let mut graph = PropertyGraph::from_weighted_arcs(32, &arcs, WEIGHT);

    let plan = SsspPlan::delta_step(4);
    shortest_path(&mut graph, 3, WEIGHT, "first", &plan, no_logging![])?;
    shortest_path(&mut graph, 3, WEIGHT, "second", &plan, no_logging![])?;
    assert_eq!(
        graph.node_values::<u32>("first")?,
        graph.node_values::<u32>("second")?
    );
    Ok(())
}

#[test]
fn test_invalid_start_node() {
    let mut graph = PropertyGraph::from_weighted_arcs(2, &[(0, 1, 1u32)], WEIGHT);
    let result = shortest_path(
        &mut graph,
        7,
        WEIGHT,
        "distance",
        &SsspPlan::default(),
        no_logging![],
    );
    assert!(matches!(
        result,
        Err(Error::InvalidStartNode { node: 7, num_nodes: 2 })
    ));
    // The caller error left no partial output behind.
    assert!(graph.node_property("distance").is_err());
}

#[test]
fn test_output_property_collision() {
    let mut graph = PropertyGraph::from_weighted_arcs(2, &[(0, 1, 1u32)], WEIGHT);
    shortest_path(
        &mut graph,
        0,
        WEIGHT,
        "distance",
        &SsspPlan::default(),
        no_logging![],
    )
    .unwrap();
    assert!(matches!(
        shortest_path(
            &mut graph,
            0,
            WEIGHT,
            "distance",
            &SsspPlan::default(),
            no_logging![],
        ),
        Err(Error::PropertyExists(_))
    ));
}

#[test]
fn test_missing_weight_property() {
    let mut graph = PropertyGraph::from_weighted_arcs(2, &[(0, 1, 1u32)], WEIGHT);
    assert!(matches!(
        shortest_path(
            &mut graph,
            0,
            "no_such_property",
            "distance",
            &SsspPlan::default(),
            no_logging![],
        ),
        Err(Error::PropertyNotFound(_))
    ));
}

#[test]
fn test_validate_rejects_tampered_distances() -> Result<()> {
    let arcs = [(0, 1, 1u32), (1, 2, 1), (2, 3, 1), (3, 0, 1)];
    let mut graph = PropertyGraph::from_weighted_arcs(4, &arcs, WEIGHT);
    shortest_path(
        &mut graph,
        0,
        WEIGHT,
        "distance",
        &SsspPlan::dijkstra(),
        no_logging![],
    )?;

    graph.node_values_mut::<u32>("distance")?[2] = 9;
    assert!(matches!(
        shortest_path_validate(&graph, 0, WEIGHT, "distance"),
        Err(Error::AssertionFailed(_))
    ));

    graph.node_values_mut::<u32>("distance")?[2] = 2;
    graph.node_values_mut::<u32>("distance")?[0] = 1;
    assert!(matches!(
        shortest_path_validate(&graph, 0, WEIGHT, "distance"),
        Err(Error::AssertionFailed(_))
    ));
    Ok(())
}

#[test]
fn test_track_work() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let arcs = random_arcs(&mut rng, 32, 200, 10);
    let mut graph = PropertyGraph::from_weighted_arcs(32, &arcs, WEIGHT);
    let plan = SsspPlan {
        track_work: true,
        ..SsspPlan::delta_step(8)
    };
    shortest_path(&mut graph, 0, WEIGHT, "distance", &plan, no_logging![])?;
    shortest_path_validate(&graph, 0, WEIGHT, "distance")?;
    Ok(())
}

#[cfg(feature = "slow_tests")]
#[test]
fn test_delta_grid_matches_dijkstra_large() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0xbeef);
    let num_nodes = 2000;
    let arcs = random_arcs(&mut rng, num_nodes, 20000, 1000);
    let expected: Vec<u32> = reference_distances(num_nodes, &arcs, 0)
        .into_iter()
        .map(|d| if d == u64::MAX { u32::MAX / 2 } else { d as u32 })
        .collect();

    for delta in [0, 4, 16] {
        let mut graph = PropertyGraph::from_weighted_arcs(num_nodes, &arcs, WEIGHT);
        shortest_path(
            &mut graph,
            0,
            WEIGHT,
            "distance",
            &SsspPlan::delta_step(delta),
            no_logging![],
        )?;
        assert_eq!(graph.node_values::<u32>("distance")?, expected.as_slice());
    }
    Ok(())
}
