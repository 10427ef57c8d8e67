//! Circular dependency detection between quantities.
//!
//! The renderer defers an equation until its dependencies have been
//! calculated. With a cycle (A uses B, B uses A) that never happens, so
//! before re-deferring an address the renderer asks this module whether a
//! cycle is reachable from it.

use std::collections::HashSet;

use super::address::Address;
use super::quantity::QuantityBuilder;

/// Detect circular dependencies starting from a row.
/// Returns Some(cycle_path) if a cycle is found, None otherwise.
///
/// Only equations are followed; constants end a path.
pub fn detect_cycle(start: &Address, builder: &mut QuantityBuilder<'_>) -> Option<Vec<Address>> {
    let mut visiting = HashSet::new();
    let mut done = HashSet::new();
    let mut path = Vec::new();

    if detect_cycle_dfs(&start.row_address(), builder, &mut visiting, &mut done, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn detect_cycle_dfs(
    current: &Address,
    builder: &mut QuantityBuilder<'_>,
    visiting: &mut HashSet<Address>,
    done: &mut HashSet<Address>,
    path: &mut Vec<Address>,
) -> bool {
    let q = builder.quantity(current);
    let current = q.address().clone();

    if visiting.contains(&current) {
        path.push(current);
        return true;
    }
    if done.contains(&current) || q.is_empty() || q.is_constant() {
        return false;
    }

    let deps = builder.dependencies(&current);

    visiting.insert(current.clone());
    path.push(current.clone());

    for dep in deps.iter() {
        if detect_cycle_dfs(dep, builder, visiting, done, path) {
            return true;
        }
    }

    path.pop();
    visiting.remove(&current);
    done.insert(current);
    false
}
