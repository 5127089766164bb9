use std::collections::HashMap;
use std::time::Instant;

use crate::graph_db::GraphDb;
use crate::SearchStats;

/// Shortest path from `src` to `dst` as page ids, `[src, ..., dst]`, or empty
/// when no path exists. See [`shortest_path_with_stats`].
pub fn shortest_path(src: u32, dst: u32, graph: &GraphDb) -> Vec<u32> {
    shortest_path_with_stats(src, dst, graph).0
}

/// Bidirectional breadth-first search meeting in the middle.
///
/// Each round expands one full layer of whichever frontier is smaller (ties
/// go to the forward side). The search stops the moment an inspected edge
/// reaches a vertex the opposite side has already visited; adjacency lists
/// are sorted and frontiers expand in insertion order, so the meeting vertex
/// is deterministic. Out-of-range endpoints and the reserved id 0 yield an
/// empty path with zeroed counters.
pub fn shortest_path_with_stats(src: u32, dst: u32, graph: &GraphDb) -> (Vec<u32>, SearchStats) {
    let start_time = Instant::now();
    let mut stats = SearchStats::default();

    if src == 0 || dst == 0 || src >= graph.vertex_count() || dst >= graph.vertex_count() {
        stats.time_taken_ms = start_time.elapsed().as_millis() as u64;
        return (Vec::new(), stats);
    }
    if src == dst {
        stats.vertices_reached = 1;
        stats.time_taken_ms = start_time.elapsed().as_millis() as u64;
        return (vec![src], stats);
    }

    // Each visited map records how its own search discovered a vertex: the
    // forward map points at the previous page on the path, the backward map
    // at the next one. 0 marks the two roots.
    let mut visited_fwd: HashMap<u32, u32> = HashMap::from([(src, 0)]);
    let mut visited_bwd: HashMap<u32, u32> = HashMap::from([(dst, 0)]);
    stats.vertices_reached = 2;
    let mut fringe_fwd = vec![src];
    let mut fringe_bwd = vec![dst];
    let mut meeting = None;

    'search: while !fringe_fwd.is_empty() && !fringe_bwd.is_empty() {
        if fringe_fwd.len() <= fringe_bwd.len() {
            log::debug!("expanding forward fringe of {}", fringe_fwd.len());
            let mut next = Vec::new();
            for &u in &fringe_fwd {
                stats.vertices_expanded += 1;
                for &v in graph.forward_edges(u) {
                    stats.edges_expanded += 1;
                    if visited_bwd.contains_key(&v) {
                        visited_fwd.entry(v).or_insert(u);
                        meeting = Some(v);
                        break 'search;
                    }
                    if !visited_fwd.contains_key(&v) {
                        visited_fwd.insert(v, u);
                        stats.vertices_reached += 1;
                        next.push(v);
                    }
                }
            }
            fringe_fwd = next;
        } else {
            log::debug!("expanding backward fringe of {}", fringe_bwd.len());
            let mut next = Vec::new();
            for &u in &fringe_bwd {
                stats.vertices_expanded += 1;
                for &v in graph.backward_edges(u) {
                    stats.edges_expanded += 1;
                    if visited_fwd.contains_key(&v) {
                        visited_bwd.entry(v).or_insert(u);
                        meeting = Some(v);
                        break 'search;
                    }
                    if !visited_bwd.contains_key(&v) {
                        visited_bwd.insert(v, u);
                        stats.vertices_reached += 1;
                        next.push(v);
                    }
                }
            }
            fringe_bwd = next;
        }
    }

    let path = match meeting {
        Some(m) => reconstruct(&visited_fwd, &visited_bwd, m),
        None => Vec::new(),
    };
    stats.time_taken_ms = start_time.elapsed().as_millis() as u64;
    (path, stats)
}

fn reconstruct(
    visited_fwd: &HashMap<u32, u32>,
    visited_bwd: &HashMap<u32, u32>,
    meeting: u32,
) -> Vec<u32> {
    let mut path = Vec::new();
    let mut cur = meeting;
    loop {
        path.push(cur);
        match visited_fwd.get(&cur) {
            Some(&prev) if prev != 0 => cur = prev,
            _ => break,
        }
    }
    path.reverse();
    let mut cur = meeting;
    loop {
        match visited_bwd.get(&cur) {
            Some(&next) if next != 0 => {
                cur = next;
                path.push(cur);
            }
            _ => break,
        }
    }
    path
}
