//! Constrained flood search over the cell grid.
//!
//! Used for movement ranges (terrain resistance, enemy obstacles) and for
//! attack threat ranges (uniform resistance, no obstacles).

use std::collections::{HashMap, HashSet};

use warbound_core::Cell;

/// Set of cells reachable from `origin` with the given movement budget.
///
/// Explores the 4-neighbourhood with an explicit worklist. Each step into a
/// neighbour consumes `resistance(neighbour)` points and is taken only while
/// the remaining budget covers it. A cell is re-expanded only when reached
/// with strictly more remaining budget than any earlier visit; without that
/// rule the search would either prune valid higher-budget paths or loop.
/// Cells outside `[0,width) x [0,height)` or in `obstacles` are never
/// expanded, and the origin itself is excluded from the result.
pub(crate) fn reachable<F>(
    origin: Cell,
    budget: i32,
    width: i32,
    height: i32,
    resistance: F,
    obstacles: &HashSet<Cell>,
) -> HashSet<Cell>
where
    F: Fn(Cell) -> i32,
{
    let mut result = HashSet::new();
    if budget <= 0 {
        return result;
    }

    let mut best_seen: HashMap<Cell, i32> = HashMap::new();
    let mut worklist = vec![(origin, budget)];

    while let Some((cell, remaining)) = worklist.pop() {
        match best_seen.get(&cell) {
            Some(seen) if *seen >= remaining => continue,
            _ => {}
        }
        let _ = best_seen.insert(cell, remaining);
        if cell != origin {
            let _ = result.insert(cell);
        }

        for neighbour in cell.neighbours() {
            if neighbour.x() < 0
                || neighbour.x() >= width
                || neighbour.y() < 0
                || neighbour.y() >= height
            {
                continue;
            }
            if obstacles.contains(&neighbour) {
                continue;
            }
            let cost = resistance(neighbour);
            if remaining >= cost {
                worklist.push((neighbour, remaining - cost));
            }
        }
    }

    result
}

/// Cells a unit standing on `origin` threatens with the given range band.
///
/// Reuses [`reachable`] with uniform resistance one, so reachable distance
/// equals Manhattan distance, then filters by the band's lower bound. The
/// minimum-range filter accepts a cell when either axis offset alone clears
/// the bound, so diagonal cells inside the band slip through on one axis.
pub(crate) fn under_threat(
    origin: Cell,
    max_range: u32,
    min_range: u32,
    width: i32,
    height: i32,
) -> HashSet<Cell> {
    let cells = reachable(
        origin,
        max_range as i32,
        width,
        height,
        |_| 1,
        &HashSet::new(),
    );
    cells
        .into_iter()
        .filter(|cell| {
            let dx = cell.x().abs_diff(origin.x());
            let dy = cell.y().abs_diff(origin.y());
            dx >= min_range || dy >= min_range
        })
        .collect()
}
