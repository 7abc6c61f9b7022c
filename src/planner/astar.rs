use crate::grid::{Bounds, Direction, Path, Position};

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use tracing::{debug, trace};

/// One expanded or frontier cell. Lives in the per-search arena; `parent`
/// indexes into that arena.
#[derive(Clone, Copy, Debug)]
struct SearchNode {
    position: Position,
    parent: Option<usize>,
    g_cost: u32,
    h_cost: u32,
    f_cost: u32,
}

impl SearchNode {
    fn new(position: Position, parent: Option<usize>, g_cost: u32, h_cost: u32) -> Self {
        Self {
            position,
            parent,
            g_cost,
            h_cost,
            f_cost: g_cost + h_cost,
        }
    }
}

// heap entry: lowest f, then lowest h, then earliest push
#[derive(PartialEq, Eq)]
struct OpenEntry {
    f_cost: u32,
    h_cost: u32,
    seq: u64,
    node: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so every key is reversed
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.h_cost.cmp(&self.h_cost))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* over the 4-connected grid.
///
/// The heuristic is Manhattan distance plus `proximity_weight` for every
/// obstacle within Chebyshev distance 1 of the cell. Any non-zero weight makes
/// the heuristic inadmissible: paths hug open space instead of the snake's
/// body at the price of sometimes being longer than the shortest route. With
/// a weight of zero the search returns shortest paths.
#[derive(Clone, Debug)]
pub struct PathPlanner {
    proximity_weight: u32,
}

impl PathPlanner {
    pub fn new(proximity_weight: u32) -> Self {
        Self { proximity_weight }
    }

    /// Shortest-path search without the obstacle bias.
    pub fn unpenalized() -> Self {
        Self::new(0)
    }

    pub fn search(&self, start: Position, goal: Position, obstacles: &HashSet<Position>, bounds: Bounds) -> Path {
        if !bounds.contains(start) || !bounds.contains(goal) {
            return Path::new();
        }
        if start == goal {
            return vec![start];
        }

        let mut arena: Vec<SearchNode> = Vec::new();
        let mut open = BinaryHeap::new();
        let mut open_f: HashMap<Position, u32> = HashMap::new();
        let mut closed: HashSet<Position> = HashSet::new();
        let mut seq = 0u64;

        let root = SearchNode::new(start, None, 0, self.heuristic(start, goal, obstacles));
        open_f.insert(start, root.f_cost);
        open.push(OpenEntry { f_cost: root.f_cost, h_cost: root.h_cost, seq, node: 0 });
        arena.push(root);

        while let Some(entry) = open.pop() {
            let current = arena[entry.node];
            if !closed.insert(current.position) {
                // a cheaper copy of this cell was already expanded
                continue;
            }
            if open_f.get(&current.position) == Some(&current.f_cost) {
                open_f.remove(&current.position);
            }

            if current.position == goal {
                let path = Self::reconstruct(&arena, entry.node);
                debug!(expanded = closed.len(), length = path.len(), "path found");
                return path;
            }

            for direction in Direction::ALL {
                let next = current.position.step(direction);
                if !bounds.contains(next) || obstacles.contains(&next) || closed.contains(&next) {
                    continue;
                }

                let neighbor = SearchNode::new(
                    next,
                    Some(entry.node),
                    current.g_cost + 1,
                    self.heuristic(next, goal, obstacles),
                );
                if open_f.get(&next).is_some_and(|&f| f <= neighbor.f_cost) {
                    continue;
                }

                seq += 1;
                open_f.insert(next, neighbor.f_cost);
                open.push(OpenEntry { f_cost: neighbor.f_cost, h_cost: neighbor.h_cost, seq, node: arena.len() });
                arena.push(neighbor);
            }
        }

        trace!(?start, ?goal, expanded = closed.len(), "no path");
        Path::new()
    }

    fn heuristic(&self, cell: Position, goal: Position, obstacles: &HashSet<Position>) -> u32 {
        let mut h = cell.manhattan(goal);
        if self.proximity_weight > 0 {
            h += self.proximity_weight * Self::nearby_obstacles(cell, obstacles);
        }
        h
    }

    // obstacles in the 3x3 block centred on `cell`
    fn nearby_obstacles(cell: Position, obstacles: &HashSet<Position>) -> u32 {
        let mut count = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if (dx, dy) != (0, 0) && obstacles.contains(&Position::new(cell.x + dx, cell.y + dy)) {
                    count += 1;
                }
            }
        }
        count
    }

    fn reconstruct(arena: &[SearchNode], goal_index: usize) -> Path {
        let mut path = Vec::new();
        let mut cursor = Some(goal_index);
        while let Some(index) = cursor {
            path.push(arena[index].position);
            cursor = arena[index].parent;
        }
        path.reverse();
        path
    }
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self::new(1)
    }
}
