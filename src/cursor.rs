/// A position in the ordered sequence of records: a leaf page plus a cell
/// index within it. Unlike a cursor that borrows the table, this cursor is
/// plain data; operations that need table access take `&mut Pager` alongside
/// it — see DESIGN.md for the rationale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub page_idx: u32,
    pub cell_idx: u32,
    pub end_of_table: bool,
}

impl Cursor {
    pub fn new(page_idx: u32, cell_idx: u32) -> Self {
        Cursor {
            page_idx,
            cell_idx,
            end_of_table: false,
        }
    }

    /// The serialized row this cursor currently points at.
    pub fn value<'a>(&self, pager: &'a mut crate::pager::Pager) -> &'a [u8] {
        crate::node::leaf_node_value(pager.get(self.page_idx), self.cell_idx as usize)
    }

    /// Step to the next record, following the leaf chain and setting
    /// `end_of_table` once the last leaf is exhausted.
    pub fn advance(&mut self, pager: &mut crate::pager::Pager) {
        let node = pager.get(self.page_idx);
        self.cell_idx += 1;
        if self.cell_idx >= crate::node::leaf_node_num_cells(node) {
            let next_leaf = crate::node::leaf_node_next_leaf(node);
            if next_leaf == 0 {
                self.end_of_table = true;
            } else {
                self.page_idx = next_leaf;
                self.cell_idx = 0;
            }
        }
    }
}
