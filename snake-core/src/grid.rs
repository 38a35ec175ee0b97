use snake_types::Cell;

pub(crate) fn in_bounds(cell: Cell, board_size: i32) -> bool {
    cell.x >= 0 && cell.y >= 0 && cell.x < board_size && cell.y < board_size
}

pub(crate) fn cell_index(cell: Cell, board_size: i32) -> Option<usize> {
    if !in_bounds(cell, board_size) {
        return None;
    }
    Some(cell.y as usize * board_size as usize + cell.x as usize)
}

pub(crate) fn cell_at(idx: usize, board_size: i32) -> Cell {
    let width = board_size as usize;
    Cell::new((idx % width) as i32, (idx / width) as i32)
}

pub(crate) fn board_capacity(board_size: u32) -> usize {
    board_size as usize * board_size as usize
}

/// Head cell of a fresh body.
pub(crate) fn spawn_cell(board_size: i32) -> Cell {
    Cell::new(board_size / 2, board_size / 2)
}

/// Three segments, head at the center, trailing downward.
pub(crate) fn spawn_body(board_size: i32) -> [Cell; 3] {
    let head = spawn_cell(board_size);
    [head, head.offset(0, 1), head.offset(0, 2)]
}

/// 6x6 region around the spawn cell that obstacle layouts leave open.
pub(crate) fn in_safe_zone(cell: Cell, board_size: i32) -> bool {
    let center = spawn_cell(board_size);
    (center.x - 3..center.x + 3).contains(&cell.x) && (center.y - 3..center.y + 3).contains(&cell.y)
}
