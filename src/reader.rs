use std::path::{Path, PathBuf};

use rand::Rng;

use crate::annotated::AnnotatedDag;
use crate::errors::{Error, Result};
use crate::graph_db::{GraphDb, OpenOptions};
use crate::metadata_db::{pipe_trick, MetadataDb};
use crate::{bfs, dag, Link, Page, SearchStats, NO_PAGE};

/// The metadata file lives next to the graph file with its extension swapped.
pub fn metadata_path_for(graph_path: &Path) -> PathBuf {
    graph_path.with_extension("metadata")
}

/// Combined handle over a graph file and its sibling metadata file.
///
/// Formatting helpers (`page_ref`, `link_text`, ...) never fail: unknown
/// pages render as `"untitled"` and unresolvable links as `"unknown"`. The
/// fallible surface is `find_page` and `link`, which return `PageNotFound`
/// and `LinkNotFound` with messages fit for a command line.
pub struct Reader {
    graph: GraphDb,
    metadata: MetadataDb,
}

impl Reader {
    pub fn open(graph_path: impl AsRef<Path>) -> Result<Reader> {
        Self::open_with_options(graph_path, &OpenOptions::default())
    }

    pub fn open_with_options(graph_path: impl AsRef<Path>, options: &OpenOptions) -> Result<Reader> {
        let graph_path = graph_path.as_ref();
        let metadata_path = metadata_path_for(graph_path);
        let graph = GraphDb::open_with_options(graph_path, options)?;
        let metadata = MetadataDb::open_with_options(&metadata_path, options)?;
        Ok(Reader { graph, metadata })
    }

    pub fn graph(&self) -> &GraphDb {
        &self.graph
    }

    pub fn metadata(&self) -> &MetadataDb {
        &self.metadata
    }

    pub fn is_valid_page_id(&self, id: u32) -> bool {
        id != NO_PAGE && id < self.graph.vertex_count()
    }

    /// A uniformly random valid page id, or 0 when the graph has none.
    pub fn random_page_id(&self) -> u32 {
        let vertex_count = self.graph.vertex_count();
        if vertex_count <= 1 {
            return NO_PAGE;
        }
        rand::thread_rng().gen_range(1..vertex_count)
    }

    /// Resolves a textual page argument: `#N` is an id, `?` is a random page,
    /// anything else is an exact title. Returns 0 on any miss.
    pub fn parse_page_argument(&self, arg: &str) -> u32 {
        if let Some(digits) = arg.strip_prefix('#') {
            return match digits.parse() {
                Ok(id) if self.is_valid_page_id(id) => id,
                _ => NO_PAGE,
            };
        }
        if arg == "?" {
            return self.random_page_id();
        }
        self.metadata
            .get_page_by_title(arg)
            .map(|page| page.id)
            .unwrap_or(NO_PAGE)
    }

    /// Like [`parse_page_argument`](Self::parse_page_argument), but a miss
    /// becomes a `PageNotFound` carrying the argument as given.
    pub fn find_page(&self, arg: &str) -> Result<Page> {
        let id = self.parse_page_argument(arg);
        let not_found = || {
            Error::PageNotFound(if arg.starts_with('#') || arg == "?" {
                arg.to_owned()
            } else {
                format!("{arg:?}")
            })
        };
        if id == NO_PAGE {
            return Err(not_found());
        }
        self.metadata
            .get_page_by_id(id)
            .ok_or_else(|| Error::PageNotFound(format!("#{id}")))
    }

    pub fn link(&self, src: u32, dst: u32) -> Result<Link> {
        self.metadata
            .get_link(src, dst)
            .ok_or(Error::LinkNotFound { src, dst })
    }

    pub fn page_title(&self, id: u32) -> String {
        self.metadata
            .get_page_by_id(id)
            .map(|page| page.title)
            .unwrap_or_else(|| "untitled".to_owned())
    }

    pub fn page_ref(&self, id: u32) -> String {
        format!("#{id} ({})", self.page_title(id))
    }

    /// The text the link `(src, dst)` displays: the explicit record, the
    /// pipe-trick derivation, the destination title, or `"unknown"`.
    pub fn link_text(&self, src: u32, dst: u32) -> String {
        match self.metadata.get_link(src, dst) {
            None => "unknown".to_owned(),
            Some(link) => match link.text {
                None => self.page_title(dst),
                Some(text) if text.is_empty() => {
                    let title = self.page_title(dst);
                    pipe_trick(&title).to_owned()
                }
                Some(text) => text,
            },
        }
    }

    pub fn forward_link_ref(&self, src: u32, dst: u32) -> String {
        let text = self.link_text(src, dst);
        let title = self.page_title(dst);
        if text == title {
            self.page_ref(dst)
        } else {
            format!("#{dst} ({title}; displayed as: {text})")
        }
    }

    pub fn backward_link_ref(&self, src: u32, dst: u32) -> String {
        let text = self.link_text(src, dst);
        if text == self.page_title(dst) {
            self.page_ref(src)
        } else {
            format!("#{src} ({}; displayed as: {text})", self.page_title(src))
        }
    }

    pub fn shortest_path(&self, src: u32, dst: u32) -> Vec<u32> {
        bfs::shortest_path(src, dst, &self.graph)
    }

    pub fn shortest_path_with_stats(&self, src: u32, dst: u32) -> (Vec<u32>, SearchStats) {
        bfs::shortest_path_with_stats(src, dst, &self.graph)
    }

    pub fn shortest_path_dag(&self, src: u32, dst: u32) -> Option<Vec<(u32, u32)>> {
        dag::shortest_path_dag(src, dst, &self.graph)
    }

    pub fn shortest_path_dag_with_stats(
        &self,
        src: u32,
        dst: u32,
    ) -> (Option<Vec<(u32, u32)>>, SearchStats) {
        dag::shortest_path_dag_with_stats(src, dst, &self.graph)
    }

    /// The full shortest-path DAG between two pages, annotated with titles
    /// and link text, or `None` when `finish` is unreachable.
    pub fn shortest_path_annotated_dag(&self, start: u32, finish: u32) -> Option<AnnotatedDag<'_>> {
        self.shortest_path_annotated_dag_with_stats(start, finish).0
    }

    pub fn shortest_path_annotated_dag_with_stats(
        &self,
        start: u32,
        finish: u32,
    ) -> (Option<AnnotatedDag<'_>>, SearchStats) {
        let (edges, stats) = dag::shortest_path_dag_with_stats(start, finish, &self.graph);
        (
            edges.map(|edges| AnnotatedDag::new(self, start, finish, edges)),
            stats,
        )
    }
}
