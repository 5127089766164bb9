use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::graph_db::GraphDb;
use crate::SearchStats;

/// Every edge lying on at least one shortest path from `src` to `dst`, sorted
/// ascending by `(u, v)`. See [`shortest_path_dag_with_stats`].
pub fn shortest_path_dag(src: u32, dst: u32, graph: &GraphDb) -> Option<Vec<(u32, u32)>> {
    shortest_path_dag_with_stats(src, dst, graph).0
}

/// Bidirectional layered BFS that keeps going to the end of the layer in
/// which the searches first meet, so every minimum-distance meeting vertex is
/// collected. The edge set is then read off the two depth maps: walking back
/// from the meetings keeps `(u, v)` with `d_fwd[u] + 1 == d_fwd[v]`, walking
/// on toward `dst` keeps `(v, w)` with `d_bwd[v] == d_bwd[w] + 1`.
///
/// Returns `None` when `dst` is unreachable (stats still reflect the
/// exhausted frontiers) and `Some(vec![])` when `src == dst`.
pub fn shortest_path_dag_with_stats(
    src: u32,
    dst: u32,
    graph: &GraphDb,
) -> (Option<Vec<(u32, u32)>>, SearchStats) {
    let start_time = Instant::now();
    let mut stats = SearchStats::default();

    if src == 0 || dst == 0 || src >= graph.vertex_count() || dst >= graph.vertex_count() {
        stats.time_taken_ms = start_time.elapsed().as_millis() as u64;
        return (None, stats);
    }
    if src == dst {
        stats.vertices_reached = 1;
        stats.time_taken_ms = start_time.elapsed().as_millis() as u64;
        return (Some(Vec::new()), stats);
    }

    let mut depth_fwd: HashMap<u32, u32> = HashMap::from([(src, 0)]);
    let mut depth_bwd: HashMap<u32, u32> = HashMap::from([(dst, 0)]);
    stats.vertices_reached = 2;
    let mut fringe_fwd = vec![src];
    let mut fringe_bwd = vec![dst];
    let mut meetings: Vec<u32> = Vec::new();

    while !fringe_fwd.is_empty() && !fringe_bwd.is_empty() {
        if fringe_fwd.len() <= fringe_bwd.len() {
            log::debug!("expanding forward layer of {}", fringe_fwd.len());
            let mut next = Vec::new();
            for &u in &fringe_fwd {
                stats.vertices_expanded += 1;
                let du = depth_fwd[&u];
                for &v in graph.forward_edges(u) {
                    stats.edges_expanded += 1;
                    if depth_fwd.contains_key(&v) {
                        continue;
                    }
                    depth_fwd.insert(v, du + 1);
                    if depth_bwd.contains_key(&v) {
                        meetings.push(v);
                    } else {
                        stats.vertices_reached += 1;
                        next.push(v);
                    }
                }
            }
            fringe_fwd = next;
        } else {
            log::debug!("expanding backward layer of {}", fringe_bwd.len());
            let mut next = Vec::new();
            for &u in &fringe_bwd {
                stats.vertices_expanded += 1;
                let du = depth_bwd[&u];
                for &v in graph.backward_edges(u) {
                    stats.edges_expanded += 1;
                    if depth_bwd.contains_key(&v) {
                        continue;
                    }
                    depth_bwd.insert(v, du + 1);
                    if depth_fwd.contains_key(&v) {
                        meetings.push(v);
                    } else {
                        stats.vertices_reached += 1;
                        next.push(v);
                    }
                }
            }
            fringe_bwd = next;
        }
        if !meetings.is_empty() {
            break;
        }
    }

    if meetings.is_empty() {
        stats.time_taken_ms = start_time.elapsed().as_millis() as u64;
        return (None, stats);
    }

    let mut edges = Vec::new();

    // From the meeting layer back toward src.
    let mut seen: HashSet<u32> = meetings.iter().copied().collect();
    let mut stack = meetings.clone();
    while let Some(v) = stack.pop() {
        let dv = depth_fwd[&v];
        if dv == 0 {
            continue;
        }
        for &u in graph.backward_edges(v) {
            if depth_fwd.get(&u) == Some(&(dv - 1)) {
                edges.push((u, v));
                if seen.insert(u) {
                    stack.push(u);
                }
            }
        }
    }

    // From the meeting layer on toward dst.
    let mut seen: HashSet<u32> = meetings.iter().copied().collect();
    let mut stack = meetings;
    while let Some(v) = stack.pop() {
        let dv = depth_bwd[&v];
        if dv == 0 {
            continue;
        }
        for &w in graph.forward_edges(v) {
            if depth_bwd.get(&w) == Some(&(dv - 1)) {
                edges.push((v, w));
                if seen.insert(w) {
                    stack.push(w);
                }
            }
        }
    }

    edges.sort_unstable();
    stats.time_taken_ms = start_time.elapsed().as_millis() as u64;
    (Some(edges), stats)
}
