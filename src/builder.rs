use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use itertools::Itertools;

use crate::errors::{Error, Result};
use crate::graph_db::{GRAPH_MAGIC, GRAPH_VERSION};
use crate::metadata_db::{METADATA_MAGIC, METADATA_VERSION};

/// Writes a graph file from forward adjacency. The backward region is the
/// derived transpose; both regions come out sorted and deduplicated, which
/// the readers rely on.
pub struct GraphFileBuilder {
    forward: Vec<Vec<u32>>,
}

impl GraphFileBuilder {
    /// `vertex_count` includes the reserved id 0; valid page ids are
    /// `1..vertex_count`.
    pub fn new(vertex_count: u32) -> GraphFileBuilder {
        GraphFileBuilder {
            forward: vec![Vec::new(); vertex_count as usize],
        }
    }

    pub fn add_edge(&mut self, src: u32, dst: u32) -> Result<()> {
        let vertex_count = self.forward.len() as u32;
        for id in [src, dst] {
            if id == 0 || id >= vertex_count {
                return Err(Error::InvalidArgument(format!(
                    "edge ({src}, {dst}) names invalid vertex {id}"
                )));
            }
        }
        self.forward[src as usize].push(dst);
        Ok(())
    }

    pub fn write(mut self, path: impl AsRef<Path>) -> Result<()> {
        for list in &mut self.forward {
            list.sort_unstable();
            list.dedup();
        }
        let mut backward: Vec<Vec<u32>> = vec![Vec::new(); self.forward.len()];
        for (src, list) in self.forward.iter().enumerate() {
            for &dst in list {
                // sources arrive in ascending order, so each list stays sorted
                backward[dst as usize].push(src as u32);
            }
        }
        let edge_count: u64 = self.forward.iter().map(|list| list.len() as u64).sum();

        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(&GRAPH_MAGIC)?;
        out.write_u32::<LittleEndian>(GRAPH_VERSION)?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_u64::<LittleEndian>(self.forward.len() as u64)?;
        out.write_u64::<LittleEndian>(edge_count)?;
        for lists in [&self.forward, &backward] {
            let mut offset = 0u64;
            out.write_u64::<LittleEndian>(offset)?;
            for list in lists {
                offset += list.len() as u64;
                out.write_u64::<LittleEndian>(offset)?;
            }
            for list in lists {
                for &id in list {
                    out.write_u32::<LittleEndian>(id)?;
                }
            }
        }
        out.flush()?;
        Ok(())
    }
}

/// Writes a metadata file: page titles plus one link entry per edge with an
/// optional display-text record (`Some("")` is the pipe-trick sentinel).
pub struct MetadataBuilder {
    titles: Vec<String>,
    links: Vec<(u32, u32, Option<String>)>,
}

impl MetadataBuilder {
    pub fn new(page_count: u32) -> MetadataBuilder {
        MetadataBuilder {
            titles: vec![String::new(); page_count as usize],
            links: Vec::new(),
        }
    }

    pub fn set_title(&mut self, id: u32, title: &str) -> Result<()> {
        if id == 0 || id as usize >= self.titles.len() {
            return Err(Error::InvalidArgument(format!("page id {id} out of range")));
        }
        self.titles[id as usize] = title.to_owned();
        Ok(())
    }

    pub fn add_link(&mut self, src: u32, dst: u32, text: Option<&str>) {
        self.links.push((src, dst, text.map(str::to_owned)));
    }

    pub fn write(mut self, path: impl AsRef<Path>) -> Result<()> {
        self.links.sort_by_key(|&(src, dst, _)| (src, dst));
        for (a, b) in self.links.iter().tuple_windows() {
            if (a.0, a.1) == (b.0, b.1) {
                return Err(Error::InvalidArgument(format!(
                    "duplicate link entry ({}, {})",
                    a.0, a.1
                )));
            }
        }
        let titled = (1..self.titles.len() as u32)
            .filter(|&id| !self.titles[id as usize].is_empty())
            .sorted_by(|&a, &b| self.titles[a as usize].cmp(&self.titles[b as usize]))
            .collect_vec();
        for (&a, &b) in titled.iter().tuple_windows() {
            if self.titles[a as usize] == self.titles[b as usize] {
                return Err(Error::InvalidArgument(format!(
                    "pages {a} and {b} share the title {:?}",
                    self.titles[a as usize]
                )));
            }
        }

        let mut text_blob = Vec::new();
        let mut entries = Vec::with_capacity(self.links.len());
        for (src, dst, text) in &self.links {
            let (off, len) = match text {
                None => (u32::MAX, 0),
                Some(text) => {
                    let off = u32::try_from(text_blob.len()).map_err(|_| {
                        Error::InvalidArgument("link text section exceeds 4 GiB".to_owned())
                    })?;
                    text_blob.extend_from_slice(text.as_bytes());
                    (off, text.len() as u32)
                }
            };
            entries.push((*src, *dst, off, len));
        }

        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(&METADATA_MAGIC)?;
        out.write_u32::<LittleEndian>(METADATA_VERSION)?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_u64::<LittleEndian>(self.titles.len() as u64)?;
        out.write_u64::<LittleEndian>(entries.len() as u64)?;
        out.write_u64::<LittleEndian>(titled.len() as u64)?;
        let mut offset = 0u64;
        out.write_u64::<LittleEndian>(offset)?;
        for title in &self.titles {
            offset += title.len() as u64;
            out.write_u64::<LittleEndian>(offset)?;
        }
        for &id in &titled {
            out.write_u32::<LittleEndian>(id)?;
        }
        for (src, dst, off, len) in entries {
            out.write_u32::<LittleEndian>(src)?;
            out.write_u32::<LittleEndian>(dst)?;
            out.write_u32::<LittleEndian>(off)?;
            out.write_u32::<LittleEndian>(len)?;
        }
        for title in &self.titles {
            out.write_all(title.as_bytes())?;
        }
        out.write_all(&text_blob)?;
        out.flush()?;
        Ok(())
    }
}
