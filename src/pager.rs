use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, trace};

use crate::errors::fatal;
use crate::node::{Page, MAX_PAGES, PAGE_SIZE};

/// Demand-paged, non-evicting page cache over a single on-disk file.
///
/// Pages are loaded lazily on first access and stay resident until `close`.
/// There is no LRU eviction: `MAX_PAGES` (100) is a hard ceiling and
/// exceeding it is a fatal error, not a recoverable one (see DESIGN.md).
#[derive(Debug)]
pub struct Pager {
    file: File,
    file_length: u64,
    num_pages: u32,
    pages: Vec<Option<Page>>,
}

impl Pager {
    pub fn open<P: AsRef<Path>>(path: P) -> Pager {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())
            .unwrap_or_else(|e| fatal(&format!("Unable to open file: {}", e)));

        let file_length = file
            .metadata()
            .unwrap_or_else(|e| fatal(&format!("Unable to stat file: {}", e)))
            .len();

        if file_length % (PAGE_SIZE as u64) != 0 {
            fatal("Db file is not a whole number of pages. Corrupt file.");
        }

        let num_pages = (file_length / PAGE_SIZE as u64) as u32;
        debug!(num_pages, file_length, "pager opened");

        let mut pages = Vec::with_capacity(MAX_PAGES);
        pages.resize_with(MAX_PAGES, || None);

        Pager {
            file,
            file_length,
            num_pages,
            pages,
        }
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// The next unused page index. The caller is expected to follow with
    /// `get` on the returned index, which is what actually extends `num_pages`.
    pub fn unused_page_idx(&self) -> u32 {
        self.num_pages
    }

    pub fn get(&mut self, page_idx: u32) -> &mut Page {
        if page_idx as usize >= MAX_PAGES {
            fatal(&format!(
                "Tried to fetch page number out of bounds. {} >= {}",
                page_idx, MAX_PAGES
            ));
        }

        let idx = page_idx as usize;
        if self.pages[idx].is_none() {
            trace!(page_idx, "page fault");
            let mut buf = vec![0u8; PAGE_SIZE];
            let on_disk_pages = self.file_length / PAGE_SIZE as u64
                + if self.file_length % PAGE_SIZE as u64 != 0 { 1 } else { 0 };
            if (page_idx as u64) < on_disk_pages {
                if let Err(e) = self.file.seek(SeekFrom::Start(page_idx as u64 * PAGE_SIZE as u64)) {
                    fatal(&format!("Error seeking: {}", e));
                }
                if let Err(e) = self.file.read_exact(&mut buf) {
                    // A short read on the last page of a file written by a
                    // crashed process is tolerated; corrupt lengths were
                    // already rejected in `open`.
                    if e.kind() != std::io::ErrorKind::UnexpectedEof {
                        fatal(&format!("Error reading file: {}", e));
                    }
                }
            }
            self.pages[idx] = Some(buf);
            if page_idx >= self.num_pages {
                self.num_pages = page_idx + 1;
            }
        }

        self.pages[idx].as_mut().unwrap()
    }

    pub fn flush(&mut self, page_idx: u32) {
        if page_idx as usize >= MAX_PAGES {
            fatal(&format!("Tried to flush page number out of bounds: {}", page_idx));
        }

        let idx = page_idx as usize;
        let offset = page_idx as u64 * PAGE_SIZE as u64;
        match self.pages[idx].as_ref() {
            Some(page) => {
                if let Err(e) = self.file.seek(SeekFrom::Start(offset)) {
                    fatal(&format!("Error seeking: {}", e));
                }
                if let Err(e) = self.file.write_all(page) {
                    fatal(&format!("Error writing: {}", e));
                }
            }
            None => fatal("Tried to flush null page"),
        }
    }

    /// Flush every resident page and truncate the file to the highest
    /// touched page. Durability only happens here: there is no WAL and no
    /// fsync between statements (see DESIGN.md).
    pub fn close(&mut self) {
        let mut max_page_used: Option<u32> = None;
        for i in 0..self.pages.len() as u32 {
            if self.pages[i as usize].is_some() {
                self.flush(i);
                max_page_used = Some(max_page_used.map_or(i, |m| m.max(i)));
            }
        }
        for slot in self.pages.iter_mut() {
            *slot = None;
        }

        let expected_size = (max_page_used.map_or(0, |m| m + 1)) as u64 * PAGE_SIZE as u64;
        if let Err(e) = self.file.set_len(expected_size) {
            fatal(&format!("Error truncating db file: {}", e));
        }
        if let Err(e) = self.file.flush() {
            fatal(&format!("Error closing db file: {}", e));
        }
        debug!(expected_size, "pager closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{initialize_leaf_node, leaf_node_num_cells, set_leaf_node_num_cells};

    #[test]
    fn get_extends_num_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut pager = Pager::open(&path);
        assert_eq!(pager.num_pages(), 0);
        let page = pager.get(0);
        initialize_leaf_node(page);
        assert_eq!(pager.num_pages(), 1);
    }

    #[test]
    fn flush_then_reopen_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let mut pager = Pager::open(&path);
            let page = pager.get(0);
            initialize_leaf_node(page);
            set_leaf_node_num_cells(page, 3);
            pager.close();
        }
        let mut pager = Pager::open(&path);
        assert_eq!(pager.num_pages(), 1);
        let page = pager.get(0);
        assert_eq!(leaf_node_num_cells(page), 3);
    }
}
