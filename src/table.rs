//! The open-database handle: wires a `Pager` to the tree root and exposes
//! the operations the statement executor calls.

use std::path::Path;

use tracing::info;

use crate::btree;
use crate::cursor::Cursor;
use crate::node::{initialize_leaf_node, set_node_root};
use crate::pager::Pager;
use crate::row::{UpdatePayload, UserRow};

pub struct Table {
    pager: Pager,
    root_page_idx: u32,
}

impl Table {
    pub fn open<P: AsRef<Path>>(path: P) -> Table {
        let mut pager = Pager::open(path);
        if pager.num_pages() == 0 {
            let root = pager.get(0);
            initialize_leaf_node(root);
            set_node_root(root, true);
            info!("initialized empty database");
        }
        Table {
            pager,
            root_page_idx: 0,
        }
    }

    pub fn close(&mut self) {
        self.pager.close();
    }

    pub fn start(&mut self) -> Cursor {
        btree::start(&mut self.pager, self.root_page_idx)
    }

    pub fn find(&mut self, key: u32) -> Cursor {
        btree::find(&mut self.pager, self.root_page_idx, key)
    }

    pub fn row_at(&mut self, cursor: Cursor) -> UserRow {
        UserRow::deserialize(cursor.value(&mut self.pager))
    }

    pub fn cursor_hit(&mut self, cursor: Cursor, key: u32) -> bool {
        btree::cursor_hit(&mut self.pager, cursor, key)
    }

    pub fn advance(&mut self, cursor: &mut Cursor) {
        cursor.advance(&mut self.pager);
    }

    pub fn insert(&mut self, row: &UserRow) -> bool {
        btree::insert(&mut self.pager, self.root_page_idx, row)
    }

    pub fn delete(&mut self, key: u32) -> bool {
        btree::delete(&mut self.pager, &mut self.root_page_idx, key)
    }

    pub fn update(&mut self, payload: &UpdatePayload) -> bool {
        btree::update(&mut self.pager, self.root_page_idx, payload)
    }

    pub fn root_page_idx(&self) -> u32 {
        self.root_page_idx
    }

    pub fn pager_mut(&mut self) -> &mut Pager {
        &mut self.pager
    }

    pub fn num_pages(&self) -> u32 {
        self.pager.num_pages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_find_and_scan_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::open(dir.path().join("t.db"));
        for id in 1..=5u32 {
            let row = UserRow::new(id, format!("u{}", id), format!("u{}@x", id));
            assert!(table.insert(&row));
        }
        let mut cursor = table.start();
        let mut ids = Vec::new();
        while !cursor.end_of_table {
            ids.push(table.row_at(cursor).id);
            table.advance(&mut cursor);
        }
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        table.close();
    }

    #[test]
    fn reopening_persists_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        {
            let mut table = Table::open(&path);
            table.insert(&UserRow::new(1, "alice", "a@x"));
            table.close();
        }
        let mut table = Table::open(&path);
        let cursor = table.find(1);
        assert!(table.cursor_hit(cursor, 1));
        assert_eq!(table.row_at(cursor).username, "alice");
    }
}
