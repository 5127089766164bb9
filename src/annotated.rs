use std::collections::{HashMap, HashSet};
use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::reader::Reader;

/// Order of a page's outgoing DAG links during enumeration. Storage is always
/// id-sorted; this only affects what comes out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkOrder {
    /// Ascending destination id.
    #[default]
    Id,
    /// Ascending destination title (case-sensitive), ties by id.
    Title,
    /// Ascending displayed text, ties by id.
    Text,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnnotatedPage {
    pub id: u32,
    /// Resolved title; `"untitled"` when the metadata has none.
    pub title: String,
}

impl AnnotatedPage {
    pub fn ref_str(&self) -> String {
        format!("#{} ({})", self.id, self.title)
    }
}

impl fmt::Display for AnnotatedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.id, self.title)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnnotatedLink {
    pub src: AnnotatedPage,
    pub dst: AnnotatedPage,
    /// Displayed text: the explicit record, the pipe-trick derivation, the
    /// destination title, or `"unknown"` when the link cannot be resolved.
    pub text: String,
}

impl AnnotatedLink {
    pub fn forward_ref(&self) -> String {
        if self.text == self.dst.title {
            self.dst.ref_str()
        } else {
            format!("#{} ({}; displayed as: {})", self.dst.id, self.dst.title, self.text)
        }
    }

    pub fn backward_ref(&self) -> String {
        if self.text == self.dst.title {
            self.src.ref_str()
        } else {
            format!("#{} ({}; displayed as: {})", self.src.id, self.src.title, self.text)
        }
    }
}

impl fmt::Display for AnnotatedLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.forward_ref())
    }
}

/// Total number of shortest paths, saturating at `u64::MAX`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PathCount {
    pub count: u64,
    pub saturated: bool,
}

/// The shortest-path DAG between two pages, dressed with titles and link
/// text. Borrows the reader it was built from and must not outlive it.
pub struct AnnotatedDag<'r> {
    reader: &'r Reader,
    start: AnnotatedPage,
    finish: AnnotatedPage,
    edges: Vec<(u32, u32)>,
    /// DAG successors per vertex, ascending by id.
    successors: HashMap<u32, Vec<u32>>,
    /// Shortest paths from each DAG vertex to `finish`, saturating.
    counts: HashMap<u32, u64>,
    saturated: bool,
}

impl<'r> AnnotatedDag<'r> {
    pub(crate) fn new(
        reader: &'r Reader,
        start: u32,
        finish: u32,
        edges: Vec<(u32, u32)>,
    ) -> AnnotatedDag<'r> {
        let mut successors: HashMap<u32, Vec<u32>> = HashMap::new();
        for &(u, v) in &edges {
            successors.entry(u).or_default().push(v);
        }

        // Every edge goes one BFS layer down, so grouping vertices by depth
        // from `start` gives a topological order for the count recurrence.
        let mut levels: Vec<Vec<u32>> = vec![vec![start]];
        let mut seen: HashSet<u32> = HashSet::from([start]);
        let mut i = 0;
        while i < levels.len() {
            let mut next = Vec::new();
            for &v in &levels[i] {
                for &w in successors.get(&v).map(Vec::as_slice).unwrap_or_default() {
                    if seen.insert(w) {
                        next.push(w);
                    }
                }
            }
            if !next.is_empty() {
                levels.push(next);
            }
            i += 1;
        }

        let mut counts: HashMap<u32, u64> = HashMap::from([(finish, 1)]);
        let mut saturated = false;
        for layer in levels.iter().rev() {
            for &v in layer {
                if v == finish {
                    continue;
                }
                let mut total = 0u64;
                for &w in successors.get(&v).map(Vec::as_slice).unwrap_or_default() {
                    total = match total.checked_add(counts.get(&w).copied().unwrap_or(0)) {
                        Some(sum) => sum,
                        None => {
                            saturated = true;
                            u64::MAX
                        }
                    };
                }
                counts.insert(v, total);
            }
        }

        AnnotatedDag {
            start: annotate_page(reader, start),
            finish: annotate_page(reader, finish),
            reader,
            edges,
            successors,
            counts,
            saturated,
        }
    }

    pub fn start(&self) -> &AnnotatedPage {
        &self.start
    }

    pub fn finish(&self) -> &AnnotatedPage {
        &self.finish
    }

    /// The raw DAG edge set, ascending by `(src, dst)`.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Outgoing DAG links of `page` in the given order.
    pub fn links_from(&self, page: u32, order: LinkOrder) -> Vec<AnnotatedLink> {
        self.ordered_list(page, order)
            .into_iter()
            .map(|dst| self.make_link(page, dst))
            .collect_vec()
    }

    /// Total number of distinct shortest paths from start to finish.
    pub fn count_paths(&self) -> PathCount {
        PathCount {
            count: self.count_from(self.start.id),
            saturated: self.saturated,
        }
    }

    pub fn path_enumerator(&self, skip: u64, order: LinkOrder) -> PathEnumerator<'_, 'r> {
        PathEnumerator::new(self, skip, order)
    }

    /// Up to `maxlen` paths starting at position `skip` of the enumeration.
    pub fn paths(&self, maxlen: usize, skip: u64, order: LinkOrder) -> Vec<Vec<AnnotatedLink>> {
        self.path_enumerator(skip, order).take(maxlen).collect()
    }

    fn count_from(&self, v: u32) -> u64 {
        self.counts.get(&v).copied().unwrap_or(0)
    }

    fn make_link(&self, src: u32, dst: u32) -> AnnotatedLink {
        AnnotatedLink {
            src: annotate_page(self.reader, src),
            dst: annotate_page(self.reader, dst),
            text: self.reader.link_text(src, dst),
        }
    }

    /// `page`'s DAG successors rearranged into `order`. The single home of
    /// the ordering rule; link views and the enumerator both go through it.
    fn ordered_list(&self, page: u32, order: LinkOrder) -> Vec<u32> {
        let mut succs = self.successors.get(&page).cloned().unwrap_or_default();
        match order {
            LinkOrder::Id => {}
            LinkOrder::Title => succs.sort_by_cached_key(|&w| (self.reader.page_title(w), w)),
            LinkOrder::Text => {
                succs.sort_by_cached_key(|&w| (self.reader.link_text(page, w), w))
            }
        }
        succs
    }

    fn ordered_successors(&self, order: LinkOrder) -> HashMap<u32, Vec<u32>> {
        self.successors
            .keys()
            .map(|&v| (v, self.ordered_list(v, order)))
            .collect()
    }
}

fn annotate_page(reader: &Reader, id: u32) -> AnnotatedPage {
    AnnotatedPage {
        id,
        title: reader.page_title(id),
    }
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    vertex: u32,
    choice: usize,
}

/// Walks the shortest-path DAG emitting one concrete path at a time, in
/// lexicographic order of the chosen link order at every branching vertex.
///
/// The walk is an explicit stack machine, one frame per non-final path
/// vertex, so arbitrarily long paths cost no call stack. `advance` skips by
/// rank arithmetic over the per-vertex path counts rather than stepping.
/// Cloning snapshots the position; clones advance independently.
#[derive(Clone)]
pub struct PathEnumerator<'d, 'r> {
    dag: &'d AnnotatedDag<'r>,
    ordered: HashMap<u32, Vec<u32>>,
    stack: Vec<Frame>,
    exhausted: bool,
}

impl<'d, 'r> PathEnumerator<'d, 'r> {
    fn new(dag: &'d AnnotatedDag<'r>, skip: u64, order: LinkOrder) -> PathEnumerator<'d, 'r> {
        let mut enumerator = PathEnumerator {
            dag,
            ordered: dag.ordered_successors(order),
            stack: Vec::new(),
            exhausted: false,
        };
        enumerator.descend(dag.start.id);
        enumerator.advance(skip);
        enumerator
    }

    /// Whether the current state names a valid path.
    pub fn has_path(&self) -> bool {
        !self.exhausted
    }

    /// The current path as links, `Some(vec![])` when start equals finish,
    /// `None` once exhausted.
    pub fn path(&self) -> Option<Vec<AnnotatedLink>> {
        if self.exhausted {
            return None;
        }
        Some(
            self.stack
                .iter()
                .map(|frame| {
                    let chosen = self.ordered[&frame.vertex][frame.choice];
                    self.dag.make_link(frame.vertex, chosen)
                })
                .collect(),
        )
    }

    /// Move forward by `k` paths. Advancing to or past the end exhausts the
    /// enumerator; advancing an exhausted enumerator is a no-op.
    pub fn advance(&mut self, k: u64) {
        if self.exhausted || k == 0 {
            return;
        }
        let target = self.rank().saturating_add(k);
        if target >= self.dag.count_paths().count {
            self.exhausted = true;
            self.stack.clear();
            return;
        }
        self.seek(target);
    }

    /// Extend the stack from `v` down to finish, taking the first choice at
    /// every vertex.
    fn descend(&mut self, mut v: u32) {
        while v != self.dag.finish.id {
            let succs = &self.ordered[&v];
            self.stack.push(Frame { vertex: v, choice: 0 });
            v = succs[0];
        }
    }

    /// Position of the current path in the enumeration.
    fn rank(&self) -> u64 {
        let mut rank = 0u64;
        for frame in &self.stack {
            for &w in &self.ordered[&frame.vertex][..frame.choice] {
                rank = rank.saturating_add(self.dag.count_from(w));
            }
        }
        rank
    }

    /// Rebuild the stack to name the path at position `rank`, which must be
    /// in range.
    fn seek(&mut self, mut rank: u64) {
        self.stack.clear();
        let mut v = self.dag.start.id;
        while v != self.dag.finish.id {
            let succs = &self.ordered[&v];
            let mut choice = 0;
            loop {
                let below = self.dag.count_from(succs[choice]);
                if rank < below {
                    break;
                }
                rank -= below;
                choice += 1;
            }
            self.stack.push(Frame { vertex: v, choice });
            v = succs[choice];
        }
    }
}

impl Iterator for PathEnumerator<'_, '_> {
    type Item = Vec<AnnotatedLink>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.path()?;
        self.advance(1);
        Some(path)
    }
}
