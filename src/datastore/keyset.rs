//! Ordered set algebra over document keys.
//!
//! Results keep first-seen order: keys of the left side first, then the
//! right side's.

use std::collections::HashSet;

pub fn union<'a>(left: &[&'a str], right: &[&'a str]) -> Vec<String> {
    let mut seen = HashSet::new();
    left.iter()
        .chain(right.iter())
        .filter(|key| seen.insert(**key))
        .map(|key| key.to_string())
        .collect()
}

pub fn intersect(left: &[&str], right: &[&str]) -> Vec<String> {
    let right: HashSet<&str> = right.iter().copied().collect();
    let mut seen = HashSet::new();
    left.iter()
        .filter(|key| right.contains(**key) && seen.insert(**key))
        .map(|key| key.to_string())
        .collect()
}

/// Symmetric difference.
pub fn difference(left: &[&str], right: &[&str]) -> Vec<String> {
    let left_set: HashSet<&str> = left.iter().copied().collect();
    let right_set: HashSet<&str> = right.iter().copied().collect();
    let mut seen = HashSet::new();

    let only_left = left.iter().filter(|key| !right_set.contains(**key));
    let only_right = right.iter().filter(|key| !left_set.contains(**key));
    only_left
        .chain(only_right)
        .filter(|key| seen.insert(**key))
        .map(|key| key.to_string())
        .collect()
}
