use std::cmp::Ordering;
use std::fs::File;
use std::path::Path;

use memmap2::{Mmap, MmapOptions};

use crate::errors::{Error, Result};
use crate::graph_db::{read_u32, read_u64, OpenOptions};
use crate::{Link, Page};

pub const METADATA_MAGIC: [u8; 8] = *b"WIKIHOPM";
pub const METADATA_VERSION: u32 = 1;

/// magic + version + reserved + page_count + link_count + titled_count
const HEADER_LEN: u64 = 8 + 4 + 4 + 8 + 8 + 8;

/// Marks a link entry with no text record.
const NO_TEXT: u32 = u32::MAX;

const LINK_ENTRY_LEN: usize = 16;

/// Memory-mapped metadata file: page titles, a title-sorted id index, and one
/// link entry per edge carrying the optional display-text record.
///
/// Layout after the header: `page_count + 1` u64 title offsets, `titled_count`
/// u32 ids sorted by title bytes, `link_count` entries of
/// `(src u32, dst u32, text_off u32, text_len u32)` sorted by `(src, dst)`
/// with `text_off == u32::MAX` meaning "no record", then the title blob and
/// the text blob.
pub struct MetadataDb {
    mmap: Mmap,
    page_count: u32,
    link_count: u64,
    titled_count: u32,
    title_offsets: usize,
    title_index: usize,
    link_entries: usize,
    title_blob: usize,
    text_blob: usize,
}

impl MetadataDb {
    pub fn open(path: impl AsRef<Path>) -> Result<MetadataDb> {
        Self::open_with_options(path, &OpenOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: &OpenOptions) -> Result<MetadataDb> {
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
        if mmap[..8] != METADATA_MAGIC {
            return Err(Error::InvalidFormat("bad magic".into()));
        }
        let version = read_u32(&mmap, 8);
        if version != METADATA_VERSION {
            return Err(Error::Unsupported(version));
        }
        let page_count = read_u64(&mmap, 16);
        let link_count = read_u64(&mmap, 24);
        let titled_count = read_u64(&mmap, 32);
        if page_count == 0 || page_count > u32::MAX as u64 || titled_count > page_count {
            return Err(Error::InvalidFormat("header counts out of range".into()));
        }

        let title_offsets = HEADER_LEN as usize;
        let title_index = title_offsets + 8 * (page_count as usize + 1);
        let link_entries = title_index + 4 * titled_count as usize;
        let title_blob = link_entries
            .checked_add(LINK_ENTRY_LEN * link_count as usize)
            .ok_or_else(|| Error::InvalidFormat("section sizes overflow".into()))?;
        if title_blob > mmap.len() {
            return Err(Error::InvalidFormat("sections extend past end of file".into()));
        }
        let title_blob_len = read_u64(&mmap, title_offsets + 8 * page_count as usize) as usize;
        let text_blob = title_blob
            .checked_add(title_blob_len)
            .ok_or_else(|| Error::InvalidFormat("title blob overflows".into()))?;
        if text_blob > mmap.len() {
            return Err(Error::InvalidFormat("title blob extends past end of file".into()));
        }
        log::debug!(
            "opened metadata {}: {page_count} pages, {link_count} links",
            path.display()
        );
        Ok(MetadataDb {
            mmap,
            page_count: page_count as u32,
            link_count,
            titled_count: titled_count as u32,
            title_offsets,
            title_index,
            link_entries,
            title_blob,
            text_blob,
        })
    }

    /// Number of page slots, including the reserved id 0.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn get_page_by_id(&self, id: u32) -> Option<Page> {
        let title = self.title_bytes(id)?;
        if title.is_empty() {
            return None;
        }
        Some(Page {
            id,
            title: String::from_utf8_lossy(title).into_owned(),
        })
    }

    /// Exact, case-sensitive title lookup via the sorted id index.
    pub fn get_page_by_title(&self, title: &str) -> Option<Page> {
        let needle = title.as_bytes();
        let mut lo = 0u32;
        let mut hi = self.titled_count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let id = read_u32(&self.mmap, self.title_index + 4 * mid as usize);
            match self.title_bytes(id).unwrap_or(b"").cmp(needle) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return self.get_page_by_id(id),
            }
        }
        None
    }

    /// The link record for the edge `(src, dst)`, or `None` when the pair is
    /// not an edge of the graph.
    pub fn get_link(&self, src: u32, dst: u32) -> Option<Link> {
        let mut lo = 0u64;
        let mut hi = self.link_count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let pos = self.link_entries + LINK_ENTRY_LEN * mid as usize;
            let entry = (read_u32(&self.mmap, pos), read_u32(&self.mmap, pos + 4));
            match entry.cmp(&(src, dst)) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => {
                    let off = read_u32(&self.mmap, pos + 8);
                    let len = read_u32(&self.mmap, pos + 12);
                    let text = (off != NO_TEXT).then(|| {
                        let start = self.text_blob + off as usize;
                        let bytes = self
                            .mmap
                            .get(start..start + len as usize)
                            .unwrap_or_default();
                        String::from_utf8_lossy(bytes).into_owned()
                    });
                    return Some(Link { src, dst, text });
                }
            }
        }
        None
    }

    fn title_bytes(&self, id: u32) -> Option<&[u8]> {
        if id == 0 || id >= self.page_count {
            return None;
        }
        let lo = read_u64(&self.mmap, self.title_offsets + 8 * id as usize) as usize;
        let hi = read_u64(&self.mmap, self.title_offsets + 8 * (id as usize + 1)) as usize;
        self.mmap.get(self.title_blob + lo..self.title_blob + hi)
    }
}

/// Display text the wiki pipe trick derives from a destination title: drop a
/// trailing parenthesized disambiguator, else drop a leading namespace
/// prefix, else leave the title alone.
pub fn pipe_trick(title: &str) -> &str {
    if title.ends_with(')') {
        if let Some(open) = title.rfind(" (") {
            return &title[..open];
        }
    }
    if let Some(colon) = title.find(':') {
        return &title[colon + 1..];
    }
    title
}
