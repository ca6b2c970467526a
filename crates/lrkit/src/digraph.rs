//! The `Digraph` algorithm from DeRemer and Pennello (1982).
//!
//! Given a relation `R` and an initial value `F'(x)` for each node, it
//! computes `F(x) = F'(x) ∪ ⋃{ F(y) | x R y }` in a single traversal,
//! collapsing strongly connected components as it goes.

use crate::util::Map;
use indexmap::map::Slice;
use std::{cmp, hash::Hash};

pub trait Set {
    fn union_with(&mut self, other: &Self);
}

/// Close `result` over the relation given by `successors`.
///
/// Successors that are not keys of `result` are ignored.
pub fn digraph<K, T, F, I>(result: &mut Map<K, T>, successors: F)
where
    K: Clone + Eq + Hash,
    T: Set,
    F: Fn(&K) -> I,
    I: IntoIterator<Item = K>,
{
    let edges: Vec<Vec<usize>> = result
        .keys()
        .map(|k| {
            successors(k)
                .into_iter()
                .filter_map(|y| result.get_index_of(&y))
                .collect()
        })
        .collect();
    Digraph {
        result: result.as_mut_slice(),
        n: vec![0; edges.len()],
        edges,
        stack: vec![],
    }
    .run()
}

struct Digraph<'a, K, T> {
    result: &'a mut Slice<K, T>,
    edges: Vec<Vec<usize>>,
    n: Vec<usize>,
    stack: Vec<usize>,
}

impl<K, T: Set> Digraph<'_, K, T> {
    fn run(&mut self) {
        for x in 0..self.edges.len() {
            if self.n[x] == 0 {
                self.traverse(x);
            }
        }
    }

    fn traverse(&mut self, x: usize) {
        self.stack.push(x);
        let d = self.stack.len();
        self.n[x] = d;

        for i in 0..self.edges[x].len() {
            let y = self.edges[x][i];
            if self.n[y] == 0 {
                self.traverse(y);
            }
            self.n[x] = cmp::min(self.n[x], self.n[y]);
            if x != y {
                let (slot, added) = get_two_mut(self.result, x, y);
                slot.union_with(added);
            }
        }

        if self.n[x] != d {
            return;
        }

        // x is the root of a component: every member gets F(x).
        while let Some(s) = self.stack.pop() {
            self.n[s] = usize::MAX;
            if s == x {
                break;
            }
            let (slot, root) = get_two_mut(self.result, s, x);
            slot.union_with(root);
        }
    }
}

fn get_two_mut<K, V>(slice: &mut Slice<K, V>, x: usize, y: usize) -> (&mut V, &V) {
    debug_assert!(x != y && cmp::max(x, y) < slice.len());
    if x < y {
        let (a, b) = slice.split_at_mut(y);
        (&mut a[x], &b[0])
    } else {
        let (a, b) = slice.split_at_mut(x);
        (&mut b[0], &a[y])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Set for Vec<u32> {
        fn union_with(&mut self, other: &Self) {
            for v in other {
                if !self.contains(v) {
                    self.push(*v);
                }
            }
            self.sort_unstable();
        }
    }

    #[test]
    fn closes_over_cycles_and_chains() {
        // a -> b -> c -> b, d -> a
        let mut map: Map<&str, Vec<u32>> = Map::default();
        map.insert("a", vec![1]);
        map.insert("b", vec![2]);
        map.insert("c", vec![3]);
        map.insert("d", vec![4]);
        digraph(&mut map, |k| match *k {
            "a" => vec!["b"],
            "b" => vec!["c"],
            "c" => vec!["b", "missing"],
            "d" => vec!["a"],
            _ => vec![],
        });
        assert_eq!(map["a"], [1, 2, 3]);
        assert_eq!(map["b"], [2, 3]);
        assert_eq!(map["c"], [2, 3]);
        assert_eq!(map["d"], [1, 2, 3, 4]);
    }

    #[test]
    fn test_get_two_mut() {
        let mut map: Map<&str, &str> = Map::default();
        map.insert("a", "a");
        map.insert("b", "b");
        map.insert("c", "c");
        map.insert("d", "d");
        let slice = map.as_mut_slice();
        assert!(matches!(get_two_mut(slice, 0, 1), t if *t.0=="a" && *t.1=="b"));
        assert!(matches!(get_two_mut(slice, 1, 0), t if *t.0=="b" && *t.1=="a"));
        assert!(matches!(get_two_mut(slice, 0, 2), t if *t.0=="a" && *t.1=="c"));
        assert!(matches!(get_two_mut(slice, 3, 2), t if *t.0=="d" && *t.1=="c"));
    }
}
