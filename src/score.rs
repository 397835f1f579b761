use crate::map::{ConnectionSet, Destination, Map};
use crate::player::PlayerState;

use smallvec::SmallVec;
use std::cmp::{max, Reverse};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{mpsc, Arc, Mutex};
use threadpool::ThreadPool;

lazy_static! {
    static ref THREAD_POOL: Mutex<ThreadPool> = Mutex::new(ThreadPool::default());
}

/// Granted to every player sharing the longest continuous path.
pub const LONGEST_PATH_BONUS: i32 = 20;

/// Granted for every connected destination, and taken away for every other one.
pub const DESTINATION_POINTS: i32 = 10;

/// Score of an excluded player. Lower than anything a player can actually score.
pub const EXCLUDED_SCORE: i32 = -21;

/// Neighbors of a city, with the length of the longest connection leading to each of them.
type Neighbors = SmallVec<[(usize, u32); 4]>;

/// One point per rail used.
pub fn connection_score(map: &Map, claimed: &ConnectionSet) -> i32 {
    claimed
        .iter()
        .filter_map(|id| map.connection(*id))
        .map(|connection| i32::from(connection.length()))
        .sum()
}

/// Plus or minus [`DESTINATION_POINTS`] per destination, whether it is connected by `claimed`.
pub fn destination_score<'a>(
    map: &Map,
    claimed: &ConnectionSet,
    destinations: impl IntoIterator<Item = &'a Destination>,
) -> i32 {
    destinations
        .into_iter()
        .map(|destination| {
            if map.connects(destination, claimed) {
                DESTINATION_POINTS
            } else {
                -DESTINATION_POINTS
            }
        })
        .sum()
}

/// Returns the length of the longest path going through distinct cities, using the connections in `claimed`.
///
/// When several connections link the same two cities, a path uses the longest of them.
/// This enumerates every simple path, which is fine given how few connections one player can claim.
///
/// # Examples:
/// ```
/// use trains::city::City;
/// use trains::color::CardColor;
/// use trains::map::{Connection, Map};
/// use trains::score::longest_path;
///
/// let (austin, boise, boston) = (
///     City::new("Austin", 10, 10),
///     City::new("Boise", 20, 20),
///     City::new("Boston", 30, 30),
/// );
/// let connections = vec![
///     Connection::new(austin.clone(), boise.clone(), CardColor::Red, 3).unwrap(),
///     Connection::new(austin.clone(), boise.clone(), CardColor::Green, 5).unwrap(),
///     Connection::new(boise.clone(), boston.clone(), CardColor::Blue, 4).unwrap(),
/// ];
/// let map = Map::new(100, 100, vec![austin, boise, boston], connections).unwrap();
///
/// // Austin -> Boise through the green connection, then Boston.
/// assert_eq!(longest_path(&map, &map.all_connection_ids()), 9);
/// ```
pub fn longest_path(map: &Map, claimed: &ConnectionSet) -> u32 {
    let cities = map.cities();

    // Collapse parallel connections into one edge, weighted by the longest of them.
    let mut edges: BTreeMap<(usize, usize), u32> = BTreeMap::new();
    for connection in claimed.iter().filter_map(|id| map.connection(*id)) {
        let (from, to) = connection.cities();
        if let (Ok(from), Ok(to)) = (cities.binary_search(from), cities.binary_search(to)) {
            let length = edges.entry((from, to)).or_insert(0);
            *length = max(*length, u32::from(connection.length()));
        }
    }

    let mut adjacency = vec![Neighbors::new(); cities.len()];
    let mut cities_to_visit = BTreeSet::new();
    for ((from, to), length) in edges {
        adjacency[from].push((to, length));
        adjacency[to].push((from, length));
        cities_to_visit.insert(from);
        cities_to_visit.insert(to);
    }

    // Prepare multi-threading.
    let adjacency = Arc::new(adjacency);
    let (tx, rx) = mpsc::sync_channel(0);
    let thread_pool = match THREAD_POOL.lock() {
        Ok(thread_pool) => thread_pool,
        Err(poisoned) => poisoned.into_inner(),
    };

    // Each city is explored by a separate thread from the pool, which computes the longest
    // path starting at that city.
    for city in cities_to_visit {
        let adjacency = adjacency.clone();
        let tx = tx.clone();

        thread_pool.execute(move || {
            let mut visited = vec![false; adjacency.len()];
            // The receiver outlives every job.
            let _ = tx.send(longest_path_from(city, &adjacency, &mut visited));
        });
    }

    // Receiving stops once every job has dropped its sender.
    drop(tx);
    rx.iter().fold(0, max)
}

fn longest_path_from(city: usize, adjacency: &[Neighbors], visited: &mut [bool]) -> u32 {
    visited[city] = true;

    let mut longest_path = 0;
    for (next, length) in &adjacency[city] {
        if !visited[*next] {
            longest_path = max(
                longest_path,
                length + longest_path_from(*next, adjacency, visited),
            );
        }
    }

    visited[city] = false;
    longest_path
}

/// Scores every seat of a finished game. Excluded seats get [`EXCLUDED_SCORE`].
///
/// Every non-excluded seat tied for the longest path gets [`LONGEST_PATH_BONUS`].
pub fn score_game(map: &Map, players: &[&PlayerState], excluded: &BTreeSet<usize>) -> Vec<i32> {
    let longest_paths: Vec<_> = players
        .iter()
        .enumerate()
        .map(|(seat, player)| {
            if excluded.contains(&seat) {
                None
            } else {
                Some(longest_path(map, player.claimed()))
            }
        })
        .collect();
    let longest = longest_paths.iter().flatten().max().copied();

    players
        .iter()
        .zip(longest_paths)
        .map(|(player, path)| match path {
            None => EXCLUDED_SCORE,
            Some(path) => {
                let bonus = if Some(path) == longest {
                    LONGEST_PATH_BONUS
                } else {
                    0
                };

                connection_score(map, player.claimed())
                    + destination_score(map, player.claimed(), player.destinations())
                    + bonus
            }
        })
        .collect()
}

/// Groups seats by descending score, ties sharing a rank and ordered by name.
///
/// `scores` holds the name and score of every seat. Excluded seats are left out.
pub fn rank(scores: &[(&str, i32)]) -> Vec<Vec<usize>> {
    let mut seats: Vec<_> = (0..scores.len())
        .filter(|seat| scores[*seat].1 != EXCLUDED_SCORE)
        .collect();
    seats.sort_by_key(|seat| (Reverse(scores[*seat].1), scores[*seat].0));

    let mut rankings: Vec<Vec<usize>> = Vec::new();
    for seat in seats {
        match rankings.last_mut() {
            Some(tied) if scores[tied[0]].1 == scores[seat].1 => tied.push(seat),
            _ => rankings.push(vec![seat]),
        }
    }

    rankings
}
