use gridsnake::{Bounds, Direction, PathPlanner, Position, SurvivalHeuristic};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};

const SIDE: i32 = 8;

fn bounds() -> Bounds {
    Bounds::new(SIDE, SIDE)
}

fn cell_strategy() -> impl Strategy<Value = Position> {
    (0..SIDE, 0..SIDE).prop_map(|(x, y)| Position::new(x, y))
}

// start, goal and a scatter of obstacles that never covers either endpoint
fn scene_strategy() -> impl Strategy<Value = (Position, Position, HashSet<Position>)> {
    (cell_strategy(), cell_strategy(), prop::collection::hash_set(cell_strategy(), 0..24)).prop_map(
        |(start, goal, mut obstacles)| {
            obstacles.remove(&start);
            obstacles.remove(&goal);
            (start, goal, obstacles)
        },
    )
}

fn bfs_distance(start: Position, goal: Position, obstacles: &HashSet<Position>) -> Option<usize> {
    let mut dist = HashMap::from([(start, 0usize)]);
    let mut queue = VecDeque::from([start]);
    while let Some(cell) = queue.pop_front() {
        if cell == goal {
            return dist.get(&cell).copied();
        }
        let d = dist[&cell];
        for direction in Direction::ALL {
            let next = cell.step(direction);
            if bounds().contains(next) && !obstacles.contains(&next) && !dist.contains_key(&next) {
                dist.insert(next, d + 1);
                queue.push_back(next);
            }
        }
    }
    None
}

fn assert_valid_path(path: &[Position], start: Position, goal: Position, obstacles: &HashSet<Position>) {
    assert_eq!(path.first(), Some(&start));
    assert_eq!(path.last(), Some(&goal));
    for pair in path.windows(2) {
        assert!(pair[0].is_adjacent(pair[1]), "{:?} -> {:?} is not a single move", pair[0], pair[1]);
    }
    for cell in &path[1..] {
        assert!(bounds().contains(*cell));
        assert!(!obstacles.contains(cell), "path crosses obstacle {:?}", cell);
    }
}

proptest! {
    #[test]
    fn test_unpenalized_paths_are_shortest((start, goal, obstacles) in scene_strategy()) {
        let path = PathPlanner::unpenalized().search(start, goal, &obstacles, bounds());
        match bfs_distance(start, goal, &obstacles) {
            Some(distance) => {
                assert_valid_path(&path, start, goal, &obstacles);
                prop_assert_eq!(path.len(), distance + 1);
            }
            None => prop_assert!(path.is_empty()),
        }
    }

    #[test]
    fn test_penalized_paths_are_valid((start, goal, obstacles) in scene_strategy(), weight in 1u32..5) {
        let path = PathPlanner::new(weight).search(start, goal, &obstacles, bounds());
        let reachable = bfs_distance(start, goal, &obstacles).is_some();
        prop_assert_eq!(path.is_empty(), !reachable);
        if reachable {
            assert_valid_path(&path, start, goal, &obstacles);
        }
    }

    #[test]
    fn test_survival_move_is_safe(head in cell_strategy(), obstacles in prop::collection::hash_set(cell_strategy(), 0..40)) {
        let mut obstacles = obstacles;
        obstacles.insert(head);
        let free_neighbor = Direction::ALL
            .into_iter()
            .any(|d| bounds().contains(head.step(d)) && !obstacles.contains(&head.step(d)));

        match SurvivalHeuristic::new().evaluate(head, &obstacles, bounds()) {
            Some(direction) => {
                let cell = head.step(direction);
                prop_assert!(bounds().contains(cell));
                prop_assert!(!obstacles.contains(&cell));
            }
            None => prop_assert!(!free_neighbor),
        }
    }
}
