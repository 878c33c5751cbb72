//! Dependency ordering of model files.
//!
//! A depth-first post-order over the `uses` graph. Roots are visited in input
//! order and dependencies in declaration order, so identical input always
//! yields the identical order.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::error::StoreError;

/// Color states for cycle detection using DFS.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    /// Not visited yet.
    White,
    /// On the current DFS path.
    Gray,
    /// Fully explored.
    Black,
}

/// Order `items` so that each one comes after every dependency inside the set.
///
/// `deps` may name items outside the set; those are ignored. A cycle yields
/// [`StoreError::CyclicDependency`] with the path that closes it.
pub fn topological_sort<'a, T, K, D, I>(
    items: &'a [T],
    key: K,
    deps: D,
) -> Result<Vec<&'a T>, StoreError>
where
    K: Fn(&'a T) -> &'a str,
    D: Fn(&'a T) -> I,
    I: IntoIterator<Item = &'a str>,
{
    let index: FxHashMap<&str, usize> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (key(item), i))
        .collect();
    let edges: Vec<Vec<usize>> = items
        .iter()
        .map(|item| {
            deps(item)
                .into_iter()
                .filter_map(|dep| index.get(dep).copied())
                .collect()
        })
        .collect();

    let mut sorter = Sorter {
        edges: &edges,
        colors: vec![Color::White; items.len()],
        path: Vec::new(),
        order: Vec::with_capacity(items.len()),
    };
    for root in 0..items.len() {
        if sorter.colors[root] == Color::White {
            if let Some(cycle) = sorter.visit(root) {
                return Err(StoreError::CyclicDependency {
                    cycle: cycle
                        .into_iter()
                        .map(|i| SmolStr::new(key(&items[i])))
                        .collect(),
                });
            }
        }
    }

    Ok(sorter.order.into_iter().map(|i| &items[i]).collect())
}

struct Sorter<'g> {
    edges: &'g [Vec<usize>],
    colors: Vec<Color>,
    path: Vec<usize>,
    order: Vec<usize>,
}

impl Sorter<'_> {
    /// Returns `Some(cycle_path)` if a cycle is reachable from `node`.
    fn visit(&mut self, node: usize) -> Option<Vec<usize>> {
        self.colors[node] = Color::Gray;
        self.path.push(node);

        for &next in &self.edges[node] {
            match self.colors[next] {
                Color::Gray => {
                    let start = self.path.iter().position(|&n| n == next).unwrap_or(0);
                    let mut cycle = self.path[start..].to_vec();
                    cycle.push(next);
                    return Some(cycle);
                }
                Color::White => {
                    if let Some(cycle) = self.visit(next) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }

        self.path.pop();
        self.colors[node] = Color::Black;
        self.order.push(node);
        None
    }
}
