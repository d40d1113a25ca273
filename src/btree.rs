//! Tree algorithms: search, insert/split, delete/rebalance.
//!
//! Every operation takes the `Pager` and the root page index explicitly
//! rather than bundling them into a `Table` struct with interior mutability;
//! this keeps each function's borrows scoped to one `pager.get(..)` call at a
//! time, which is what the borrow checker demands once pages are addressed
//! by index into a single owner (see DESIGN.md).

use tracing::{debug, trace};

use crate::cursor::Cursor;
use crate::errors::fatal;
use crate::node::*;
use crate::pager::Pager;
use crate::row::{UpdateField, UpdatePayload, UserRow};

pub fn get_node_max_key(pager: &mut Pager, page_idx: u32) -> u32 {
    let (is_leaf, count, right_child) = {
        let node = pager.get(page_idx);
        match get_node_type(node) {
            NodeType::Leaf => (true, leaf_node_num_cells(node) as usize, 0u32),
            NodeType::Internal => (
                false,
                internal_node_num_keys(node) as usize,
                internal_node_right_child(node),
            ),
        }
    };
    if is_leaf {
        let node = pager.get(page_idx);
        leaf_node_key(node, count - 1)
    } else {
        get_node_max_key(pager, right_child)
    }
}

/// Index of `child_page_idx` among `parent_node`'s children (0..=num_keys,
/// where `num_keys` denotes the right-child slot).
pub fn get_node_child_index(parent_node: &Page, child_page_idx: u32) -> u32 {
    let num_keys = internal_node_num_keys(parent_node);
    for i in 0..num_keys {
        if internal_node_child_raw(parent_node, i as usize) == child_page_idx {
            return i;
        }
    }
    if internal_node_right_child(parent_node) == child_page_idx {
        return num_keys;
    }
    fatal(&format!("Could not find child {} in parent.", child_page_idx));
}

fn update_internal_node_key(node: &mut Page, old_key: u32, new_key: u32) {
    let old_child_index = internal_node_find_child(node, old_key);
    set_internal_node_key(node, old_child_index as usize, new_key);
}

/*
 * Search
 */

pub fn leaf_node_find(pager: &mut Pager, page_idx: u32, key: u32) -> Cursor {
    let node = pager.get(page_idx);
    let num_cells = leaf_node_num_cells(node);

    let mut min_index = 0u32;
    let mut one_past_max = num_cells;
    while one_past_max != min_index {
        let index = (min_index + one_past_max) / 2;
        let key_at_index = leaf_node_key(node, index as usize);
        if key == key_at_index {
            return Cursor::new(page_idx, index);
        }
        if key < key_at_index {
            one_past_max = index;
        } else {
            min_index = index + 1;
        }
    }
    Cursor::new(page_idx, min_index)
}

/// Smallest child index whose separator is `>= key`.
pub fn internal_node_find_child(node: &Page, key: u32) -> u32 {
    let num_keys = internal_node_num_keys(node);
    let mut min_index = 0u32;
    let mut max_index = num_keys;
    while min_index != max_index {
        let index = (min_index + max_index) / 2;
        let key_to_right = internal_node_key(node, index as usize);
        if key_to_right >= key {
            max_index = index;
        } else {
            min_index = index + 1;
        }
    }
    min_index
}

pub fn internal_node_find(pager: &mut Pager, page_idx: u32, key: u32) -> Cursor {
    let child_num = {
        let node = pager.get(page_idx);
        let child_idx = internal_node_find_child(node, key);
        internal_node_child(node, child_idx as usize)
    };
    let child_type = get_node_type(pager.get(child_num));
    match child_type {
        NodeType::Leaf => leaf_node_find(pager, child_num, key),
        NodeType::Internal => internal_node_find(pager, child_num, key),
    }
}

pub fn find(pager: &mut Pager, root_page_idx: u32, key: u32) -> Cursor {
    let root_type = get_node_type(pager.get(root_page_idx));
    match root_type {
        NodeType::Leaf => leaf_node_find(pager, root_page_idx, key),
        NodeType::Internal => internal_node_find(pager, root_page_idx, key),
    }
}

pub fn start(pager: &mut Pager, root_page_idx: u32) -> Cursor {
    let mut cursor = find(pager, root_page_idx, 0);
    let node = pager.get(cursor.page_idx);
    cursor.end_of_table = leaf_node_num_cells(node) == 0;
    cursor
}

/*
 * Insert / split
 */

pub fn create_new_root(pager: &mut Pager, root_page_idx: u32, right_child_page_idx: u32) {
    let root_type = get_node_type(pager.get(root_page_idx));
    // `right_child_page_idx` must be materialized before we ask the pager
    // for the next unused index, or an as-yet-unfetched right child and the
    // freshly chosen left child alias the same page.
    let _ = pager.get(right_child_page_idx);
    let left_child_page_idx = pager.unused_page_idx();

    if root_type == NodeType::Internal {
        initialize_internal_node(pager.get(right_child_page_idx));
        initialize_internal_node(pager.get(left_child_page_idx));
    }

    let root_copy = pager.get(root_page_idx).clone();
    {
        let left_child = pager.get(left_child_page_idx);
        copy_page(&root_copy, left_child);
        set_node_root(left_child, false);
    }

    let left_type = get_node_type(pager.get(left_child_page_idx));
    if left_type == NodeType::Internal {
        let num_keys = internal_node_num_keys(pager.get(left_child_page_idx));
        for i in 0..num_keys {
            let child_idx = internal_node_child(pager.get(left_child_page_idx), i as usize);
            set_node_parent(pager.get(child_idx), left_child_page_idx);
        }
        let right_of_left = internal_node_right_child(pager.get(left_child_page_idx));
        set_node_parent(pager.get(right_of_left), left_child_page_idx);
    }

    {
        let root = pager.get(root_page_idx);
        initialize_internal_node(root);
        set_node_root(root, true);
        set_internal_node_num_keys(root, 1);
        set_internal_node_child_raw(root, 0, left_child_page_idx);
    }
    let left_child_max_key = get_node_max_key(pager, left_child_page_idx);
    {
        let root = pager.get(root_page_idx);
        set_internal_node_key(root, 0, left_child_max_key);
        set_internal_node_right_child(root, right_child_page_idx);
    }
    set_node_parent(pager.get(left_child_page_idx), root_page_idx);
    set_node_parent(pager.get(right_child_page_idx), root_page_idx);

    debug!(root_page_idx, left_child_page_idx, right_child_page_idx, "root promoted");
}

pub fn leaf_node_insert(pager: &mut Pager, root_page_idx: u32, cursor: Cursor, key: u32, row: &UserRow) {
    let num_cells = leaf_node_num_cells(pager.get(cursor.page_idx));
    if num_cells as usize >= LEAF_NODE_MAX_CELLS {
        leaf_node_split_and_insert(pager, root_page_idx, cursor, key, row);
        return;
    }

    let node = pager.get(cursor.page_idx);
    if cursor.cell_idx < num_cells {
        let start = leaf_node_cell_offset(cursor.cell_idx as usize);
        let end = leaf_node_cell_offset(num_cells as usize);
        node.copy_within(start..end, start + LEAF_NODE_CELL_SIZE);
    }
    set_leaf_node_num_cells(node, num_cells + 1);
    set_leaf_node_key(node, cursor.cell_idx as usize, key);
    set_leaf_node_value(node, cursor.cell_idx as usize, &row.serialize());
    trace!(page_idx = cursor.page_idx, key, "leaf insert");
}

fn leaf_node_split_and_insert(pager: &mut Pager, root_page_idx: u32, cursor: Cursor, key: u32, row: &UserRow) {
    let new_page_idx = pager.unused_page_idx();

    let old_parent = node_parent(pager.get(cursor.page_idx));
    let old_next_leaf = leaf_node_next_leaf(pager.get(cursor.page_idx));
    {
        let new_node = pager.get(new_page_idx);
        initialize_leaf_node(new_node);
        set_node_parent(new_node, old_parent);
        set_leaf_node_next_leaf(new_node, old_next_leaf);
    }
    set_leaf_node_next_leaf(pager.get(cursor.page_idx), new_page_idx);

    let old_num_cells = leaf_node_num_cells(pager.get(cursor.page_idx)) as usize;

    let mut temp_keys = vec![0u32; LEAF_NODE_MAX_CELLS + 1];
    let mut temp_values: Vec<Vec<u8>> = vec![Vec::new(); LEAF_NODE_MAX_CELLS + 1];
    {
        let old_node = pager.get(cursor.page_idx);
        let mut j = 0usize;
        for i in 0..old_num_cells {
            if j == cursor.cell_idx as usize {
                j += 1;
            }
            temp_keys[j] = leaf_node_key(old_node, i);
            temp_values[j] = leaf_node_value(old_node, i).to_vec();
            j += 1;
        }
    }
    temp_keys[cursor.cell_idx as usize] = key;
    temp_values[cursor.cell_idx as usize] = row.serialize();

    {
        let old_node = pager.get(cursor.page_idx);
        set_leaf_node_num_cells(old_node, 0);
        for i in 0..LEAF_NODE_LEFT_SPLIT_COUNT {
            set_leaf_node_key(old_node, i, temp_keys[i]);
            set_leaf_node_value(old_node, i, &temp_values[i]);
        }
        set_leaf_node_num_cells(old_node, LEAF_NODE_LEFT_SPLIT_COUNT as u32);
    }
    {
        let new_node = pager.get(new_page_idx);
        set_leaf_node_num_cells(new_node, 0);
        for i in 0..LEAF_NODE_RIGHT_SPLIT_COUNT {
            let idx = i + LEAF_NODE_LEFT_SPLIT_COUNT;
            set_leaf_node_key(new_node, i, temp_keys[idx]);
            set_leaf_node_value(new_node, i, &temp_values[idx]);
        }
        set_leaf_node_num_cells(new_node, LEAF_NODE_RIGHT_SPLIT_COUNT as u32);
    }

    let was_root = is_node_root(pager.get(cursor.page_idx));
    debug!(old = cursor.page_idx, new = new_page_idx, was_root, "leaf split");

    if was_root {
        create_new_root(pager, root_page_idx, new_page_idx);
    } else {
        let new_max_of_old = get_node_max_key(pager, cursor.page_idx);
        let new_max_of_new = get_node_max_key(pager, new_page_idx);
        update_internal_node_key(pager.get(old_parent), new_max_of_old, new_max_of_new);
        internal_node_insert(pager, root_page_idx, old_parent, new_page_idx);
    }
}

pub fn internal_node_insert(pager: &mut Pager, root_page_idx: u32, parent_page_idx: u32, child_page_idx: u32) {
    let child_max_key = get_node_max_key(pager, child_page_idx);
    let (index, original_num_keys, right_child_page_idx) = {
        let parent = pager.get(parent_page_idx);
        (
            internal_node_find_child(parent, child_max_key),
            internal_node_num_keys(parent),
            internal_node_right_child(parent),
        )
    };

    if original_num_keys as usize >= INTERNAL_NODE_MAX_KEYS {
        internal_node_split_and_insert(pager, root_page_idx, parent_page_idx, child_page_idx);
        return;
    }

    if right_child_page_idx == INVALID_PAGE_IDX {
        set_internal_node_right_child(pager.get(parent_page_idx), child_page_idx);
        return;
    }

    let right_child_max = get_node_max_key(pager, right_child_page_idx);
    let parent = pager.get(parent_page_idx);
    set_internal_node_num_keys(parent, original_num_keys + 1);
    if child_max_key > right_child_max {
        set_internal_node_child_raw(parent, original_num_keys as usize, right_child_page_idx);
        set_internal_node_key(parent, original_num_keys as usize, right_child_max);
        set_internal_node_right_child(parent, child_page_idx);
    } else {
        for i in (index + 1..=original_num_keys).rev() {
            copy_internal_node_cell(&parent.clone(), (i - 1) as usize, parent, i as usize);
        }
        set_internal_node_child_raw(parent, index as usize, child_page_idx);
        set_internal_node_key(parent, index as usize, child_max_key);
    }
}

fn internal_node_split_and_insert(pager: &mut Pager, root_page_idx: u32, parent_page_idx: u32, child_page_idx: u32) {
    let old_max_key = get_node_max_key(pager, parent_page_idx);
    let child_max_key = get_node_max_key(pager, child_page_idx);
    let new_page_idx = pager.unused_page_idx();
    let splitting_root = is_node_root(pager.get(parent_page_idx));

    let (old_page_idx, parent_idx) = if splitting_root {
        create_new_root(pager, root_page_idx, new_page_idx);
        let old_page_idx = internal_node_child(pager.get(root_page_idx), 0);
        (old_page_idx, root_page_idx)
    } else {
        let parent_idx = node_parent(pager.get(parent_page_idx));
        initialize_internal_node(pager.get(new_page_idx));
        (parent_page_idx, parent_idx)
    };

    let right_child_page_num = internal_node_right_child(pager.get(old_page_idx));
    internal_node_insert(pager, root_page_idx, new_page_idx, right_child_page_num);
    set_node_parent(pager.get(right_child_page_num), new_page_idx);
    set_internal_node_right_child(pager.get(old_page_idx), INVALID_PAGE_IDX);

    let mut old_num_keys = internal_node_num_keys(pager.get(old_page_idx));
    let mut i = INTERNAL_NODE_MAX_KEYS as u32 - 1;
    while i > (INTERNAL_NODE_MAX_KEYS as u32) / 2 {
        let cur_page_num = internal_node_child_raw(pager.get(old_page_idx), i as usize);
        internal_node_insert(pager, root_page_idx, new_page_idx, cur_page_num);
        set_node_parent(pager.get(cur_page_num), new_page_idx);
        old_num_keys -= 1;
        i -= 1;
    }
    set_internal_node_num_keys(pager.get(old_page_idx), old_num_keys);

    let promoted_child = internal_node_child(pager.get(old_page_idx), (old_num_keys - 1) as usize);
    {
        let old_node = pager.get(old_page_idx);
        set_internal_node_right_child(old_node, promoted_child);
        set_internal_node_num_keys(old_node, old_num_keys - 1);
    }

    let max_after_split = get_node_max_key(pager, old_page_idx);
    let destination_page_num = if child_max_key < max_after_split {
        old_page_idx
    } else {
        new_page_idx
    };

    internal_node_insert(pager, root_page_idx, destination_page_num, child_page_idx);
    set_node_parent(pager.get(child_page_idx), destination_page_num);

    let new_old_max = get_node_max_key(pager, old_page_idx);
    update_internal_node_key(pager.get(parent_idx), old_max_key, new_old_max);

    if !splitting_root {
        internal_node_insert(pager, root_page_idx, parent_idx, new_page_idx);
        set_node_parent(pager.get(new_page_idx), parent_idx);
    }

    debug!(old_page_idx, new_page_idx, splitting_root, "internal split");
}

/*
 * Delete / rebalance
 */

fn merge_leaf(pager: &mut Pager, node_page_idx: u32, sibling_page_idx: u32) {
    let node_num_cells = leaf_node_num_cells(pager.get(node_page_idx));
    let (sibling_bytes, sibling_num_cells, sibling_next_leaf) = {
        let sibling = pager.get(sibling_page_idx);
        let n = leaf_node_num_cells(sibling) as usize;
        let start = leaf_node_cell_offset(0);
        let end = leaf_node_cell_offset(n);
        (sibling[start..end].to_vec(), n, leaf_node_next_leaf(sibling))
    };
    let node = pager.get(node_page_idx);
    let dest = leaf_node_cell_offset(node_num_cells as usize);
    node[dest..dest + sibling_bytes.len()].copy_from_slice(&sibling_bytes);
    set_leaf_node_num_cells(node, node_num_cells + sibling_num_cells as u32);
    set_leaf_node_next_leaf(node, sibling_next_leaf);
}

fn merge_internal(pager: &mut Pager, parent_page_idx: u32, node_page_idx: u32, sibling_page_idx: u32, sibling_child_index_in_parent: u32) {
    let node_num_keys = internal_node_num_keys(pager.get(node_page_idx));
    let key_from_parent = internal_node_key(pager.get(parent_page_idx), (sibling_child_index_in_parent - 1) as usize);
    set_internal_node_key(pager.get(node_page_idx), node_num_keys as usize, key_from_parent);

    let (sibling_bytes, sibling_num_keys, sibling_right_child) = {
        let sibling = pager.get(sibling_page_idx);
        let n = internal_node_num_keys(sibling);
        let start = internal_node_cell_offset(0);
        let end = internal_node_cell_offset(n as usize);
        (sibling[start..end].to_vec(), n, internal_node_right_child(sibling))
    };

    {
        let node = pager.get(node_page_idx);
        let dest = internal_node_cell_offset(node_num_keys as usize + 1);
        node[dest..dest + sibling_bytes.len()].copy_from_slice(&sibling_bytes);
        set_internal_node_right_child(node, sibling_right_child);
        set_internal_node_num_keys(node, node_num_keys + sibling_num_keys + 1);
    }

    let total_keys = internal_node_num_keys(pager.get(node_page_idx));
    for i in (node_num_keys + 1)..=total_keys {
        let child_page_idx = internal_node_child(pager.get(node_page_idx), i as usize);
        set_node_parent(pager.get(child_page_idx), node_page_idx);
    }
}

pub fn merge_nodes(pager: &mut Pager, root_page_idx: &mut u32, parent_page_idx: u32, node_page_idx: u32, sibling_page_idx: u32) {
    let sibling_child_index_in_parent = get_node_child_index(pager.get(parent_page_idx), sibling_page_idx);

    let node_type = get_node_type(pager.get(node_page_idx));
    match node_type {
        NodeType::Leaf => merge_leaf(pager, node_page_idx, sibling_page_idx),
        NodeType::Internal => merge_internal(pager, parent_page_idx, node_page_idx, sibling_page_idx, sibling_child_index_in_parent),
    }

    let num_parent_keys = internal_node_num_keys(pager.get(parent_page_idx));
    {
        let parent = pager.get(parent_page_idx);
        for i in (sibling_child_index_in_parent - 1)..(num_parent_keys - 1) {
            copy_internal_node_cell(&parent.clone(), (i + 1) as usize, parent, i as usize);
        }
        if sibling_child_index_in_parent == num_parent_keys {
            let new_right = internal_node_child_raw(parent, (num_parent_keys - 1) as usize);
            set_internal_node_right_child(parent, new_right);
        }
        set_internal_node_num_keys(parent, num_parent_keys - 1);
    }

    let parent_of_parent_idx = node_parent(pager.get(parent_page_idx));
    if parent_of_parent_idx != 0 {
        let old_max = {
            let grandparent = pager.get(parent_of_parent_idx);
            let idx = get_node_child_index(grandparent, parent_page_idx);
            internal_node_key(grandparent, idx as usize)
        };
        let new_max = get_node_max_key(pager, parent_page_idx);
        update_internal_node_key(pager.get(parent_of_parent_idx), old_max, new_max);
    }

    debug!(node_page_idx, sibling_page_idx, "nodes merged");
    adjust_tree_after_delete(pager, root_page_idx, parent_page_idx);
}

pub fn redistribute_cells(pager: &mut Pager, parent_page_idx: u32, node_page_idx: u32, sibling_page_idx: u32) {
    let node_child_index = get_node_child_index(pager.get(parent_page_idx), node_page_idx);
    let sibling_child_index = get_node_child_index(pager.get(parent_page_idx), sibling_page_idx);

    if node_child_index < sibling_child_index {
        let num_cells_node = leaf_node_num_cells(pager.get(node_page_idx));
        let first_cell = {
            let sibling = pager.get(sibling_page_idx);
            let start = leaf_node_cell_offset(0);
            sibling[start..start + LEAF_NODE_CELL_SIZE].to_vec()
        };
        {
            let node = pager.get(node_page_idx);
            let dest = leaf_node_cell_offset(num_cells_node as usize);
            node[dest..dest + LEAF_NODE_CELL_SIZE].copy_from_slice(&first_cell);
            set_leaf_node_num_cells(node, num_cells_node + 1);
        }
        {
            let sibling = pager.get(sibling_page_idx);
            let num_cells_sibling = leaf_node_num_cells(sibling) as usize;
            let start = leaf_node_cell_offset(1);
            let end = leaf_node_cell_offset(num_cells_sibling);
            sibling.copy_within(start..end, leaf_node_cell_offset(0));
            set_leaf_node_num_cells(sibling, (num_cells_sibling - 1) as u32);
        }
        let new_key = leaf_node_key(pager.get(node_page_idx), num_cells_node as usize);
        set_internal_node_key(pager.get(parent_page_idx), node_child_index as usize, new_key);
    } else {
        let num_cells_node = leaf_node_num_cells(pager.get(node_page_idx));
        {
            let node = pager.get(node_page_idx);
            let start = leaf_node_cell_offset(0);
            let end = leaf_node_cell_offset(num_cells_node as usize);
            node.copy_within(start..end, leaf_node_cell_offset(1));
        }
        let (last_cell, sibling_num_cells_after) = {
            let sibling = pager.get(sibling_page_idx);
            let n = leaf_node_num_cells(sibling) as usize;
            let start = leaf_node_cell_offset(n - 1);
            (sibling[start..start + LEAF_NODE_CELL_SIZE].to_vec(), n - 1)
        };
        {
            let node = pager.get(node_page_idx);
            let dest = leaf_node_cell_offset(0);
            node[dest..dest + LEAF_NODE_CELL_SIZE].copy_from_slice(&last_cell);
            set_leaf_node_num_cells(node, num_cells_node + 1);
        }
        set_leaf_node_num_cells(pager.get(sibling_page_idx), sibling_num_cells_after as u32);
        let sibling_new_max = leaf_node_key(pager.get(sibling_page_idx), sibling_num_cells_after - 1);
        set_internal_node_key(pager.get(parent_page_idx), (node_child_index - 1) as usize, sibling_new_max);
    }
}

pub fn handle_root_shrink(pager: &mut Pager, root_page_idx: &mut u32) {
    let (is_internal, num_keys) = {
        let root = pager.get(*root_page_idx);
        (get_node_type(root) == NodeType::Internal, internal_node_num_keys(root))
    };
    if is_internal && num_keys == 0 {
        let new_root_page_idx = internal_node_child(pager.get(*root_page_idx), 0);
        {
            let new_root = pager.get(new_root_page_idx);
            set_node_root(new_root, true);
            set_node_parent(new_root, 0);
        }
        debug!(old_root = *root_page_idx, new_root = new_root_page_idx, "root collapsed");
        *root_page_idx = new_root_page_idx;
    }
}

pub fn adjust_tree_after_delete(pager: &mut Pager, root_page_idx: &mut u32, page_idx: u32) {
    let (node_type, num_cells, is_root) = {
        let node = pager.get(page_idx);
        let t = get_node_type(node);
        let n = match t {
            NodeType::Leaf => leaf_node_num_cells(node),
            NodeType::Internal => internal_node_num_keys(node),
        };
        (t, n, is_node_root(node))
    };

    if is_root {
        handle_root_shrink(pager, root_page_idx);
        return;
    }

    let min_cells = match node_type {
        NodeType::Leaf => LEAF_NODE_MIN_CELLS as u32,
        NodeType::Internal => INTERNAL_NODE_MIN_KEYS as u32,
    };
    if num_cells >= min_cells {
        return;
    }

    let parent_page_idx = node_parent(pager.get(page_idx));
    let child_index = get_node_child_index(pager.get(parent_page_idx), page_idx);
    let parent_num_keys = internal_node_num_keys(pager.get(parent_page_idx));

    let sibling_page_idx = if child_index == parent_num_keys {
        internal_node_child(pager.get(parent_page_idx), (child_index - 1) as usize)
    } else {
        internal_node_child(pager.get(parent_page_idx), (child_index + 1) as usize)
    };

    let sibling_num_cells = {
        let sibling = pager.get(sibling_page_idx);
        match get_node_type(sibling) {
            NodeType::Leaf => leaf_node_num_cells(sibling),
            NodeType::Internal => internal_node_num_keys(sibling),
        }
    };

    if sibling_num_cells > min_cells {
        redistribute_cells(pager, parent_page_idx, page_idx, sibling_page_idx);
    } else {
        let sibling_child_index = get_node_child_index(pager.get(parent_page_idx), sibling_page_idx);
        if child_index > sibling_child_index {
            merge_nodes(pager, root_page_idx, parent_page_idx, sibling_page_idx, page_idx);
        } else {
            merge_nodes(pager, root_page_idx, parent_page_idx, page_idx, sibling_page_idx);
        }
    }
}

/*
 * Top-level operations used by the statement executor.
 */

/// Returns `false` on duplicate key, matching `EXECUTE_DUPLICATE_KEY`.
pub fn insert(pager: &mut Pager, root_page_idx: u32, row: &UserRow) -> bool {
    let cursor = find(pager, root_page_idx, row.id);
    let duplicate = {
        let node = pager.get(cursor.page_idx);
        let num_cells = leaf_node_num_cells(node);
        cursor.cell_idx < num_cells && leaf_node_key(node, cursor.cell_idx as usize) == row.id
    };
    if duplicate {
        return false;
    }
    leaf_node_insert(pager, root_page_idx, cursor, row.id, row);
    true
}

pub fn cursor_hit(pager: &mut Pager, cursor: Cursor, key: u32) -> bool {
    let node = pager.get(cursor.page_idx);
    let num_cells = leaf_node_num_cells(node);
    cursor.cell_idx < num_cells && leaf_node_key(node, cursor.cell_idx as usize) == key
}

/// Returns `false` if no record with the given id exists (a no-op delete).
pub fn delete(pager: &mut Pager, root_page_idx: &mut u32, key: u32) -> bool {
    let cursor = find(pager, *root_page_idx, key);
    if !cursor_hit(pager, cursor, key) {
        return false;
    }
    leaf_node_remove_cell(pager.get(cursor.page_idx), cursor.cell_idx as usize);
    adjust_tree_after_delete(pager, root_page_idx, cursor.page_idx);
    true
}

/// Returns `false` if no record with `payload.id` exists.
pub fn update(pager: &mut Pager, root_page_idx: u32, payload: &UpdatePayload) -> bool {
    let cursor = find(pager, root_page_idx, payload.id);
    if !cursor_hit(pager, cursor, payload.id) {
        return false;
    }
    let mut row = UserRow::deserialize(leaf_node_value(pager.get(cursor.page_idx), cursor.cell_idx as usize));
    match payload.field {
        UpdateField::Username => row.username = payload.new_value.clone(),
        UpdateField::Email => row.email = payload.new_value.clone(),
    }
    set_leaf_node_value(pager.get(cursor.page_idx), cursor.cell_idx as usize, &row.serialize());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::initialize_leaf_node;

    fn fresh_pager() -> (Pager, u32) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut pager = Pager::open(&path);
        std::mem::forget(dir);
        let root = pager.get(0);
        initialize_leaf_node(root);
        set_node_root(root, true);
        (pager, 0)
    }

    #[test]
    fn insert_and_find_single_row() {
        let (mut pager, root) = fresh_pager();
        let row = UserRow::new(1, "alice", "alice@x");
        assert!(insert(&mut pager, root, &row));
        let cursor = find(&mut pager, root, 1);
        assert!(cursor_hit(&mut pager, cursor, 1));
        let got = UserRow::deserialize(cursor.value(&mut pager));
        assert_eq!(got, row);
    }

    #[test]
    fn duplicate_insert_rejected() {
        let (mut pager, root) = fresh_pager();
        let row = UserRow::new(1, "alice", "alice@x");
        assert!(insert(&mut pager, root, &row));
        assert!(!insert(&mut pager, root, &row));
    }

    #[test]
    fn inserting_fourteen_rows_splits_into_two_leaves() {
        let (mut pager, mut root) = fresh_pager();
        for id in 1..=14u32 {
            let row = UserRow::new(id, format!("user{}", id), format!("user{}@x", id));
            assert!(insert(&mut pager, root, &row));
        }
        assert_eq!(get_node_type(pager.get(root)), NodeType::Internal);
        assert_eq!(internal_node_num_keys(pager.get(root)), 1);

        let left = internal_node_child(pager.get(root), 0);
        let right = internal_node_right_child(pager.get(root));
        assert_eq!(leaf_node_num_cells(pager.get(left)), 7);
        assert_eq!(leaf_node_num_cells(pager.get(right)), 7);
        assert_eq!(leaf_node_next_leaf(pager.get(left)), right);

        let mut cursor = start(&mut pager, root);
        let mut seen = Vec::new();
        while !cursor.end_of_table {
            seen.push(UserRow::deserialize(cursor.value(&mut pager)).id);
            cursor.advance(&mut pager);
        }
        assert_eq!(seen, (1..=14).collect::<Vec<_>>());
        let _ = &mut root;
    }

    #[test]
    fn delete_then_scan_skips_removed_key() {
        let (mut pager, mut root) = fresh_pager();
        for id in 1..=20u32 {
            let row = UserRow::new(id, format!("u{}", id), format!("u{}@x", id));
            assert!(insert(&mut pager, root, &row));
        }
        assert!(delete(&mut pager, &mut root, 10));
        let mut cursor = start(&mut pager, root);
        let mut seen = Vec::new();
        while !cursor.end_of_table {
            seen.push(UserRow::deserialize(cursor.value(&mut pager)).id);
            cursor.advance(&mut pager);
        }
        let expected: Vec<u32> = (1..=20).filter(|&x| x != 10).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn deleting_absent_key_is_a_no_op() {
        let (mut pager, mut root) = fresh_pager();
        let row = UserRow::new(1, "a", "a@x");
        insert(&mut pager, root, &row);
        assert!(!delete(&mut pager, &mut root, 999));
        let cursor = find(&mut pager, root, 1);
        assert!(cursor_hit(&mut pager, cursor, 1));
    }

    #[test]
    fn internal_split_recurses_through_two_levels() {
        // Driving a real internal split by insertion alone needs ~511 leaf
        // pages, far past MAX_PAGES. Instead we build a root already at
        // INTERNAL_NODE_MAX_KEYS and insert one more child directly, which
        // forces internal_node_split_and_insert's self-recursive re-insert
        // path the same way a genuinely large table would. All child slots
        // alias one dummy leaf page to stay inside the page budget; only the
        // structural invariants below depend on that, not on exact keys.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut pager = Pager::open(&path);
        std::mem::forget(dir);

        let root = 0u32;
        let dummy_leaf = pager.unused_page_idx();
        {
            let leaf = pager.get(dummy_leaf);
            initialize_leaf_node(leaf);
            set_leaf_node_num_cells(leaf, 1);
            set_leaf_node_key(leaf, 0, 100);
        }

        {
            let node = pager.get(root);
            initialize_internal_node(node);
            set_node_root(node, true);
            set_internal_node_num_keys(node, INTERNAL_NODE_MAX_KEYS as u32);
            for i in 0..INTERNAL_NODE_MAX_KEYS {
                set_internal_node_child_raw(node, i, dummy_leaf);
                set_internal_node_key(node, i, 100);
            }
            set_internal_node_right_child(node, dummy_leaf);
        }
        set_node_parent(pager.get(dummy_leaf), root);

        internal_node_insert(&mut pager, root, root, dummy_leaf);

        assert_eq!(get_node_type(pager.get(root)), NodeType::Internal);
        assert_eq!(internal_node_num_keys(pager.get(root)), 1);

        let left = internal_node_child(pager.get(root), 0);
        let right = internal_node_right_child(pager.get(root));
        assert_eq!(get_node_type(pager.get(left)), NodeType::Internal);
        assert_eq!(get_node_type(pager.get(right)), NodeType::Internal);

        // The 511 original children (510 keys + root's right child) plus the
        // one newly inserted child must all land somewhere across the two
        // new siblings.
        let left_slots = internal_node_num_keys(pager.get(left)) + 1;
        let right_slots = internal_node_num_keys(pager.get(right)) + 1;
        assert_eq!(left_slots + right_slots, INTERNAL_NODE_MAX_KEYS as u32 + 2);

        assert_eq!(get_node_max_key(&mut pager, root), 100);
    }

    #[test]
    fn update_overwrites_chosen_field_only() {
        let (mut pager, root) = fresh_pager();
        let row = UserRow::new(1, "a", "a@x");
        insert(&mut pager, root, &row);
        let payload = UpdatePayload {
            id: 1,
            field: UpdateField::Email,
            new_value: "new@x".to_string(),
        };
        assert!(update(&mut pager, root, &payload));
        let cursor = find(&mut pager, root, 1);
        let got = UserRow::deserialize(cursor.value(&mut pager));
        assert_eq!(got.username, "a");
        assert_eq!(got.email, "new@x");
    }
}
