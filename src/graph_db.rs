use std::fs::File;
use std::path::Path;

use itertools::Itertools;
use memmap2::{Mmap, MmapOptions};

use crate::errors::{Error, Result};

pub const GRAPH_MAGIC: [u8; 8] = *b"WIKIHOPG";
pub const GRAPH_VERSION: u32 = 1;

/// magic + version + reserved + vertex_count + edge_count
const HEADER_LEN: u64 = 8 + 4 + 4 + 8 + 8;

#[derive(Clone, Copy, Debug, Default)]
pub struct OpenOptions {
    /// Advise the OS to keep the mapping resident. Best-effort; failure is
    /// logged and ignored.
    pub lock_into_memory: bool,
}

/// Memory-mapped graph file: vertex offset tables plus forward and backward
/// adjacency, all little-endian.
///
/// Layout after the header: `vertex_count + 1` u64 forward offsets (edge
/// indices), `edge_count` u32 forward targets, `vertex_count + 1` u64
/// backward offsets, `edge_count` u32 backward targets. Vertex `v`'s list is
/// the half-open slice `targets[offsets[v]..offsets[v + 1]]`, sorted
/// ascending with no duplicates.
pub struct GraphDb {
    mmap: Mmap,
    vertex_count: u32,
    edge_count: u64,
    fwd_offsets: usize,
    fwd_targets: usize,
    bwd_offsets: usize,
    bwd_targets: usize,
}

impl GraphDb {
    pub fn open(path: impl AsRef<Path>) -> Result<GraphDb> {
        Self::open_with_options(path, &OpenOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: &OpenOptions) -> Result<GraphDb> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        if options.lock_into_memory {
            if let Err(err) = mmap.lock() {
                log::debug!("mlock of {} failed: {err}", path.display());
            }
        }

        if mmap.len() < HEADER_LEN as usize {
            return Err(Error::InvalidFormat("file shorter than header".into()));
        }
        if mmap[..8] != GRAPH_MAGIC {
            return Err(Error::InvalidFormat("bad magic".into()));
        }
        let version = read_u32(&mmap, 8);
        if version != GRAPH_VERSION {
            return Err(Error::Unsupported(version));
        }
        let vertex_count = read_u64(&mmap, 16);
        let edge_count = read_u64(&mmap, 24);
        if vertex_count == 0 || vertex_count > u32::MAX as u64 {
            return Err(Error::InvalidFormat(format!(
                "vertex count {vertex_count} out of range"
            )));
        }

        let offsets_len = 8 * (vertex_count + 1);
        let targets_len = 4 * edge_count;
        let expected = HEADER_LEN
            .checked_add(2 * offsets_len)
            .and_then(|n| n.checked_add(2 * targets_len))
            .ok_or_else(|| Error::InvalidFormat("section sizes overflow".into()))?;
        if mmap.len() as u64 != expected {
            return Err(Error::InvalidFormat(format!(
                "file is {} bytes, layout wants {expected}",
                mmap.len()
            )));
        }

        let fwd_offsets = HEADER_LEN as usize;
        let fwd_targets = fwd_offsets + offsets_len as usize;
        let bwd_offsets = fwd_targets + targets_len as usize;
        let bwd_targets = bwd_offsets + offsets_len as usize;
        log::debug!(
            "opened graph {}: {vertex_count} vertices, {edge_count} edges",
            path.display()
        );
        Ok(GraphDb {
            mmap,
            vertex_count: vertex_count as u32,
            edge_count,
            fwd_offsets,
            fwd_targets,
            bwd_offsets,
            bwd_targets,
        })
    }

    /// Number of vertices, including the reserved id 0.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn edge_count(&self) -> u64 {
        self.edge_count
    }

    /// Pages linked from `v`, sorted ascending. Empty for the reserved id 0
    /// and for out-of-range ids; callers that care classify that themselves.
    pub fn forward_edges(&self, v: u32) -> &[u32] {
        self.edge_slice(self.fwd_offsets, self.fwd_targets, v)
    }

    /// Pages linking to `v`, sorted ascending.
    pub fn backward_edges(&self, v: u32) -> &[u32] {
        self.edge_slice(self.bwd_offsets, self.bwd_targets, v)
    }

    pub fn has_edge(&self, u: u32, v: u32) -> bool {
        self.forward_edges(u).binary_search(&v).is_ok()
    }

    fn offset_at(&self, table: usize, i: u32) -> u64 {
        read_u64(&self.mmap, table + 8 * i as usize)
    }

    fn edge_slice(&self, offsets: usize, targets: usize, v: u32) -> &[u32] {
        if v == 0 || v >= self.vertex_count {
            return &[];
        }
        let lo = self.offset_at(offsets, v);
        let hi = self.offset_at(offsets, v + 1);
        if lo > hi || hi > self.edge_count {
            return &[];
        }
        let len = (hi - lo) as usize;
        if len == 0 {
            return &[];
        }
        let base = targets + 4 * lo as usize;
        // The target regions start at multiples of 4 from the page-aligned
        // mapping, and the file is little-endian like every supported host.
        debug_assert_eq!(base % 4, 0);
        unsafe { std::slice::from_raw_parts(self.mmap[base..].as_ptr() as *const u32, len) }
    }

    /// Deep invariant sweep over the whole file: monotone offset tables,
    /// strictly ascending adjacency, no zero ids, and forward/backward
    /// regions that are exact transposes of each other.
    pub fn validate(&self) -> Result<()> {
        for (table, targets, what) in [
            (self.fwd_offsets, self.fwd_targets, "forward"),
            (self.bwd_offsets, self.bwd_targets, "backward"),
        ] {
            if self.offset_at(table, 0) != 0 || self.offset_at(table, 1) != 0 {
                return Err(Error::InvalidFormat(format!(
                    "{what} offsets for the reserved vertex are not empty"
                )));
            }
            for (i, (lo, hi)) in (0..=self.vertex_count)
                .map(|v| self.offset_at(table, v))
                .tuple_windows()
                .enumerate()
            {
                if lo > hi || hi > self.edge_count {
                    return Err(Error::InvalidFormat(format!(
                        "{what} offsets of vertex {i} are not monotone"
                    )));
                }
            }
            if self.offset_at(table, self.vertex_count) != self.edge_count {
                return Err(Error::InvalidFormat(format!(
                    "{what} region does not cover edge_count edges"
                )));
            }
            for v in 1..self.vertex_count {
                let list = self.edge_slice(table, targets, v);
                for (a, b) in list.iter().tuple_windows() {
                    if a >= b {
                        return Err(Error::InvalidFormat(format!(
                            "{what} list of vertex {v} is not strictly ascending"
                        )));
                    }
                }
                for &w in list {
                    if w == 0 || w >= self.vertex_count {
                        return Err(Error::InvalidFormat(format!(
                            "{what} list of vertex {v} names invalid vertex {w}"
                        )));
                    }
                }
            }
        }
        for u in 1..self.vertex_count {
            for &v in self.forward_edges(u) {
                if self.backward_edges(v).binary_search(&u).is_err() {
                    return Err(Error::InvalidFormat(format!(
                        "edge ({u}, {v}) has no backward counterpart"
                    )));
                }
            }
            for &v in self.backward_edges(u) {
                if self.forward_edges(v).binary_search(&u).is_err() {
                    return Err(Error::InvalidFormat(format!(
                        "backward edge ({v}, {u}) has no forward counterpart"
                    )));
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap())
}

pub(crate) fn read_u64(data: &[u8], pos: usize) -> u64 {
    u64::from_le_bytes(data[pos..pos + 8].try_into().unwrap())
}
