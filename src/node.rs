//! Typed field access over a raw 4096-byte page. A page holds exactly one
//! node, leaf or internal, tagged by a one-byte discriminant at offset 0.

use byteorder::{ByteOrder, LittleEndian};

use crate::row::USER_ROW_SIZE;

pub const PAGE_SIZE: usize = 4096;
pub const MAX_PAGES: usize = 100;

/// Sentinel meaning "no page" - used for the internal right-child slot
/// before it is populated, and for `next_leaf` meaning "no successor".
pub const INVALID_PAGE_IDX: u32 = u32::MAX;

pub type Page = Vec<u8>;

pub fn new_page() -> Page {
    vec![0u8; PAGE_SIZE]
}

/*
 * Common node header
 */
const NODE_TYPE_OFFSET: usize = 0;
const NODE_TYPE_SIZE: usize = 1;
const IS_ROOT_OFFSET: usize = NODE_TYPE_OFFSET + NODE_TYPE_SIZE;
const IS_ROOT_SIZE: usize = 1;
const PARENT_POINTER_OFFSET: usize = IS_ROOT_OFFSET + IS_ROOT_SIZE;
const PARENT_POINTER_SIZE: usize = 4;
pub const COMMON_NODE_HEADER_SIZE: usize = NODE_TYPE_SIZE + IS_ROOT_SIZE + PARENT_POINTER_SIZE;

/*
 * Leaf node header + body
 */
const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
const LEAF_NODE_NUM_CELLS_SIZE: usize = 4;
const LEAF_NODE_NEXT_LEAF_OFFSET: usize = LEAF_NODE_NUM_CELLS_OFFSET + LEAF_NODE_NUM_CELLS_SIZE;
const LEAF_NODE_NEXT_LEAF_SIZE: usize = 4;
pub const LEAF_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + LEAF_NODE_NUM_CELLS_SIZE + LEAF_NODE_NEXT_LEAF_SIZE;

const LEAF_NODE_KEY_SIZE: usize = 4;
const LEAF_NODE_VALUE_SIZE: usize = USER_ROW_SIZE;
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + LEAF_NODE_VALUE_SIZE;
pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;
pub const LEAF_NODE_RIGHT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1) / 2;
pub const LEAF_NODE_LEFT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1) - LEAF_NODE_RIGHT_SPLIT_COUNT;
pub const LEAF_NODE_MIN_CELLS: usize = LEAF_NODE_LEFT_SPLIT_COUNT - 1;

/*
 * Internal node header + body
 */
const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
const INTERNAL_NODE_NUM_KEYS_SIZE: usize = 4;
const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize =
    INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE;
const INTERNAL_NODE_RIGHT_CHILD_SIZE: usize = 4;
pub const INTERNAL_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + INTERNAL_NODE_NUM_KEYS_SIZE + INTERNAL_NODE_RIGHT_CHILD_SIZE;

const INTERNAL_NODE_CHILD_SIZE: usize = 4;
const INTERNAL_NODE_KEY_SIZE: usize = 4;
pub const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_CHILD_SIZE + INTERNAL_NODE_KEY_SIZE;
pub const INTERNAL_NODE_MAX_KEYS: usize =
    (PAGE_SIZE - INTERNAL_NODE_HEADER_SIZE) / INTERNAL_NODE_CELL_SIZE;
pub const INTERNAL_NODE_MIN_KEYS: usize = INTERNAL_NODE_MAX_KEYS / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Leaf,
    Internal,
}

pub fn get_node_type(node: &Page) -> NodeType {
    match node[NODE_TYPE_OFFSET] {
        0 => NodeType::Leaf,
        1 => NodeType::Internal,
        other => unreachable!("corrupt node type byte {}", other),
    }
}

pub fn set_node_type(node: &mut Page, t: NodeType) {
    node[NODE_TYPE_OFFSET] = match t {
        NodeType::Leaf => 0,
        NodeType::Internal => 1,
    };
}

pub fn is_node_root(node: &Page) -> bool {
    node[IS_ROOT_OFFSET] != 0
}

pub fn set_node_root(node: &mut Page, is_root: bool) {
    node[IS_ROOT_OFFSET] = if is_root { 1 } else { 0 };
}

pub fn node_parent(node: &Page) -> u32 {
    LittleEndian::read_u32(&node[PARENT_POINTER_OFFSET..PARENT_POINTER_OFFSET + PARENT_POINTER_SIZE])
}

pub fn set_node_parent(node: &mut Page, parent: u32) {
    LittleEndian::write_u32(
        &mut node[PARENT_POINTER_OFFSET..PARENT_POINTER_OFFSET + PARENT_POINTER_SIZE],
        parent,
    );
}

pub fn leaf_node_num_cells(node: &Page) -> u32 {
    LittleEndian::read_u32(&node[LEAF_NODE_NUM_CELLS_OFFSET..LEAF_NODE_NUM_CELLS_OFFSET + LEAF_NODE_NUM_CELLS_SIZE])
}

pub fn set_leaf_node_num_cells(node: &mut Page, num_cells: u32) {
    LittleEndian::write_u32(
        &mut node[LEAF_NODE_NUM_CELLS_OFFSET..LEAF_NODE_NUM_CELLS_OFFSET + LEAF_NODE_NUM_CELLS_SIZE],
        num_cells,
    );
}

pub fn leaf_node_next_leaf(node: &Page) -> u32 {
    LittleEndian::read_u32(&node[LEAF_NODE_NEXT_LEAF_OFFSET..LEAF_NODE_NEXT_LEAF_OFFSET + LEAF_NODE_NEXT_LEAF_SIZE])
}

pub fn set_leaf_node_next_leaf(node: &mut Page, next: u32) {
    LittleEndian::write_u32(
        &mut node[LEAF_NODE_NEXT_LEAF_OFFSET..LEAF_NODE_NEXT_LEAF_OFFSET + LEAF_NODE_NEXT_LEAF_SIZE],
        next,
    );
}

pub fn leaf_node_cell_offset(cell_idx: usize) -> usize {
    LEAF_NODE_HEADER_SIZE + cell_idx * LEAF_NODE_CELL_SIZE
}

pub fn leaf_node_key(node: &Page, cell_idx: usize) -> u32 {
    let off = leaf_node_cell_offset(cell_idx);
    LittleEndian::read_u32(&node[off..off + LEAF_NODE_KEY_SIZE])
}

pub fn set_leaf_node_key(node: &mut Page, cell_idx: usize, key: u32) {
    let off = leaf_node_cell_offset(cell_idx);
    LittleEndian::write_u32(&mut node[off..off + LEAF_NODE_KEY_SIZE], key);
}

pub fn leaf_node_value(node: &Page, cell_idx: usize) -> &[u8] {
    let off = leaf_node_cell_offset(cell_idx) + LEAF_NODE_KEY_SIZE;
    &node[off..off + LEAF_NODE_VALUE_SIZE]
}

pub fn set_leaf_node_value(node: &mut Page, cell_idx: usize, value: &[u8]) {
    let off = leaf_node_cell_offset(cell_idx) + LEAF_NODE_KEY_SIZE;
    node[off..off + LEAF_NODE_VALUE_SIZE].copy_from_slice(value);
}

pub fn copy_leaf_node_cell(from: &Page, from_idx: usize, to: &mut Page, to_idx: usize) {
    let from_off = leaf_node_cell_offset(from_idx);
    let to_off = leaf_node_cell_offset(to_idx);
    let cell = from[from_off..from_off + LEAF_NODE_CELL_SIZE].to_vec();
    to[to_off..to_off + LEAF_NODE_CELL_SIZE].copy_from_slice(&cell);
}

pub fn leaf_node_remove_cell(node: &mut Page, cell_idx: usize) {
    let num_cells = leaf_node_num_cells(node) as usize;
    for i in cell_idx..num_cells - 1 {
        copy_leaf_node_cell(&node.clone(), i + 1, node, i);
    }
    set_leaf_node_num_cells(node, (num_cells - 1) as u32);
}

pub fn initialize_leaf_node(node: &mut Page) {
    set_node_type(node, NodeType::Leaf);
    set_node_root(node, false);
    set_leaf_node_num_cells(node, 0);
    set_leaf_node_next_leaf(node, 0);
    set_node_parent(node, 0);
}

pub fn internal_node_cell_offset(cell_idx: usize) -> usize {
    INTERNAL_NODE_HEADER_SIZE + cell_idx * INTERNAL_NODE_CELL_SIZE
}

pub fn internal_node_num_keys(node: &Page) -> u32 {
    LittleEndian::read_u32(
        &node[INTERNAL_NODE_NUM_KEYS_OFFSET..INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE],
    )
}

pub fn set_internal_node_num_keys(node: &mut Page, num_keys: u32) {
    LittleEndian::write_u32(
        &mut node[INTERNAL_NODE_NUM_KEYS_OFFSET..INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE],
        num_keys,
    );
}

pub fn internal_node_right_child(node: &Page) -> u32 {
    LittleEndian::read_u32(
        &node[INTERNAL_NODE_RIGHT_CHILD_OFFSET..INTERNAL_NODE_RIGHT_CHILD_OFFSET + INTERNAL_NODE_RIGHT_CHILD_SIZE],
    )
}

pub fn set_internal_node_right_child(node: &mut Page, ptr: u32) {
    LittleEndian::write_u32(
        &mut node[INTERNAL_NODE_RIGHT_CHILD_OFFSET..INTERNAL_NODE_RIGHT_CHILD_OFFSET + INTERNAL_NODE_RIGHT_CHILD_SIZE],
        ptr,
    );
}

/// Raw accessor: does not validate bounds. Callers that need the
/// "child_num == num_keys means right child" semantics use `internal_node_child`.
pub fn internal_node_child_raw(node: &Page, cell_idx: usize) -> u32 {
    let off = internal_node_cell_offset(cell_idx);
    LittleEndian::read_u32(&node[off..off + INTERNAL_NODE_CHILD_SIZE])
}

pub fn set_internal_node_child_raw(node: &mut Page, cell_idx: usize, ptr: u32) {
    let off = internal_node_cell_offset(cell_idx);
    LittleEndian::write_u32(&mut node[off..off + INTERNAL_NODE_CHILD_SIZE], ptr);
}

pub fn internal_node_key(node: &Page, cell_idx: usize) -> u32 {
    let off = internal_node_cell_offset(cell_idx) + INTERNAL_NODE_CHILD_SIZE;
    LittleEndian::read_u32(&node[off..off + INTERNAL_NODE_KEY_SIZE])
}

pub fn set_internal_node_key(node: &mut Page, cell_idx: usize, key: u32) {
    let off = internal_node_cell_offset(cell_idx) + INTERNAL_NODE_CHILD_SIZE;
    LittleEndian::write_u32(&mut node[off..off + INTERNAL_NODE_KEY_SIZE], key);
}

pub fn copy_internal_node_cell(from: &Page, from_idx: usize, to: &mut Page, to_idx: usize) {
    let from_off = internal_node_cell_offset(from_idx);
    let to_off = internal_node_cell_offset(to_idx);
    let cell = from[from_off..from_off + INTERNAL_NODE_CELL_SIZE].to_vec();
    to[to_off..to_off + INTERNAL_NODE_CELL_SIZE].copy_from_slice(&cell);
}

/// `child_num == num_keys` selects the right-child slot, matching the
/// reference's `internal_node_child`.
pub fn internal_node_child(node: &Page, child_num: usize) -> u32 {
    let num_keys = internal_node_num_keys(node) as usize;
    if child_num == num_keys {
        internal_node_right_child(node)
    } else {
        internal_node_child_raw(node, child_num)
    }
}

pub fn set_internal_node_child(node: &mut Page, child_num: usize, ptr: u32) {
    let num_keys = internal_node_num_keys(node) as usize;
    if child_num == num_keys {
        set_internal_node_right_child(node, ptr);
    } else {
        set_internal_node_child_raw(node, child_num, ptr);
    }
}

pub fn initialize_internal_node(node: &mut Page) {
    set_node_type(node, NodeType::Internal);
    set_node_root(node, false);
    set_internal_node_num_keys(node, 0);
    set_internal_node_right_child(node, INVALID_PAGE_IDX);
    set_node_parent(node, 0);
}

pub fn copy_page(from: &Page, to: &mut Page) {
    to.copy_from_slice(from);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_header_round_trips() {
        let mut page = new_page();
        initialize_leaf_node(&mut page);
        set_leaf_node_num_cells(&mut page, 5);
        set_leaf_node_next_leaf(&mut page, 42);
        assert_eq!(leaf_node_num_cells(&page), 5);
        assert_eq!(leaf_node_next_leaf(&page), 42);
        assert_eq!(get_node_type(&page), NodeType::Leaf);
    }

    #[test]
    fn internal_header_round_trips() {
        let mut page = new_page();
        initialize_internal_node(&mut page);
        assert_eq!(internal_node_right_child(&page), INVALID_PAGE_IDX);
        set_internal_node_num_keys(&mut page, 3);
        set_internal_node_key(&mut page, 0, 10);
        set_internal_node_child_raw(&mut page, 0, 7);
        assert_eq!(internal_node_key(&page, 0), 10);
        assert_eq!(internal_node_child(&page, 0), 7);
    }

    #[test]
    fn derived_constants_match_expected_values() {
        assert_eq!(USER_ROW_SIZE, 293);
        assert_eq!(LEAF_NODE_CELL_SIZE, 297);
        assert_eq!(LEAF_NODE_MAX_CELLS, 13);
        assert_eq!(LEAF_NODE_RIGHT_SPLIT_COUNT, 7);
        assert_eq!(LEAF_NODE_LEFT_SPLIT_COUNT, 7);
        assert_eq!(LEAF_NODE_MIN_CELLS, 6);
        assert_eq!(INTERNAL_NODE_CELL_SIZE, 8);
        assert_eq!(INTERNAL_NODE_MAX_KEYS, 510);
        assert_eq!(INTERNAL_NODE_MIN_KEYS, 255);
    }
}
