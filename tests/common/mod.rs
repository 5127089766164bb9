#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::Result;
use tempfile::TempDir;
use wikihop::annotated::{AnnotatedDag, AnnotatedLink};
use wikihop::builder::{GraphFileBuilder, MetadataBuilder};
use wikihop::reader::metadata_path_for;
use wikihop::Reader;

pub struct Fixture {
    _dir: TempDir,
    pub graph_path: PathBuf,
}

impl Fixture {
    pub fn reader(&self) -> Result<Reader> {
        Ok(Reader::open(&self.graph_path)?)
    }
}

/// Writes a graph/metadata pair into a temp dir. `titles[0]` names page 1;
/// every edge gets a link entry, with display text taken from `texts` where
/// present (`""` is the pipe-trick sentinel).
pub fn write_fixture(
    titles: &[&str],
    edges: &[(u32, u32)],
    texts: &[(u32, u32, &str)],
) -> Result<Fixture> {
    let dir = TempDir::new()?;
    let graph_path = dir.path().join("fixture.graph");
    let vertex_count = titles.len() as u32 + 1;

    let mut graph = GraphFileBuilder::new(vertex_count);
    for &(src, dst) in edges {
        graph.add_edge(src, dst)?;
    }
    graph.write(&graph_path)?;

    let mut metadata = MetadataBuilder::new(vertex_count);
    for (i, title) in titles.iter().enumerate() {
        metadata.set_title(i as u32 + 1, title)?;
    }
    for &(src, dst) in edges {
        let text = texts
            .iter()
            .find(|&&(s, d, _)| (s, d) == (src, dst))
            .map(|&(_, _, text)| text);
        metadata.add_link(src, dst, text);
    }
    metadata.write(metadata_path_for(&graph_path))?;

    Ok(Fixture {
        _dir: dir,
        graph_path,
    })
}

/// Seven-vertex colors graph: three mutually linked colors, a rose, and the
/// two violets that exercise the pipe trick.
///
/// ids: 1 Red, 2 Green, 3 Blue, 4 Rose, 5 Violet (flower), 6 Violet (color)
pub fn colors() -> Result<Fixture> {
    write_fixture(
        &["Red", "Green", "Blue", "Rose", "Violet (flower)", "Violet (color)"],
        &[
            (1, 2),
            (1, 3),
            (2, 1),
            (2, 3),
            (3, 1),
            (3, 2),
            (4, 1),
            (4, 5),
            (5, 6),
            (6, 3),
        ],
        &[(4, 5, "violets"), (5, 6, "")],
    )
}

/// Fifteen-vertex lattice with rows A1..A3, B1..B2, C1..C3, D1..D2, E1..E3,
/// F1..F2. A2 to F2 has exactly seven shortest paths; the F row is a sink
/// pair, so nothing is reachable from it except F1 and F2 themselves.
///
/// ids: 1 A1, 2 A2, 3 A3, 4 B1, 5 B2, 6 C1, 7 C2, 8 C3, 9 D1, 10 D2,
///      11 E1, 12 E2, 13 E3, 14 F1, 15 F2
pub fn lattice() -> Result<Fixture> {
    write_fixture(
        &[
            "A1", "A2", "A3", "B1", "B2", "C1", "C2", "C3", "D1", "D2", "E1", "E2", "E3", "F1",
            "F2",
        ],
        &[
            (2, 1),
            (2, 3),
            (2, 4),
            (2, 5),
            (4, 5),
            (4, 6),
            (5, 4),
            (5, 7),
            (5, 8),
            (6, 7),
            (6, 9),
            (7, 6),
            (7, 8),
            (7, 10),
            (8, 7),
            (8, 10),
            (9, 10),
            (9, 11),
            (9, 12),
            (9, 13),
            (10, 12),
            (10, 13),
            (11, 12),
            (11, 15),
            (12, 11),
            (12, 13),
            (12, 15),
            (13, 12),
            (13, 15),
            (14, 15),
            (15, 14),
        ],
        &[],
    )
}

pub const LATTICE_START: u32 = 2; // A2
pub const LATTICE_FINISH: u32 = 15; // F2

/// Branching graph whose middle layer carries display-text records that
/// disagree with id order, for exercising TEXT-ordered enumeration.
///
/// ids: 1 Start, 2 C, 3 A, 4 B, 5 G, 6 H, 7 Finish
pub fn branching() -> Result<Fixture> {
    write_fixture(
        &["Start", "C", "A", "B", "G", "H", "Finish"],
        &[
            (1, 2),
            (1, 3),
            (1, 4),
            (2, 5),
            (2, 6),
            (3, 5),
            (3, 6),
            (4, 5),
            (4, 6),
            (5, 7),
            (6, 7),
        ],
        &[(2, 5, "x"), (2, 6, "y"), (3, 5, "y"), (3, 6, "x")],
    )
}

/// A chain of `n` diamonds from vertex 1, giving exactly 2^n shortest paths.
/// Junctions are ids `3k + 1`; the two middle vertices of diamond `k` are
/// `3k + 2` and `3k + 3`.
pub fn diamond_chain(n: u32) -> Result<Fixture> {
    let titles: Vec<String> = (1..=3 * n + 1).map(|id| format!("V{id}")).collect();
    let title_refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    let mut edges = Vec::new();
    for k in 0..n {
        let junction = 3 * k + 1;
        edges.push((junction, junction + 1));
        edges.push((junction, junction + 2));
        edges.push((junction + 1, junction + 3));
        edges.push((junction + 2, junction + 3));
    }
    write_fixture(&title_refs, &edges, &[])
}

pub fn path_titles(dag: &AnnotatedDag, path: &[AnnotatedLink]) -> Vec<String> {
    let mut titles = vec![dag.start().title.clone()];
    titles.extend(path.iter().map(|link| link.dst.title.clone()));
    titles
}

pub fn paths_titles(dag: &AnnotatedDag, paths: &[Vec<AnnotatedLink>]) -> Vec<Vec<String>> {
    paths.iter().map(|path| path_titles(dag, path)).collect()
}
