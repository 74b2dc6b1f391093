//! Deterministic dependency resolution for module boot sequencing.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::error::{Error, Result};
use crate::registry::ModuleDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Produces a validated topological order over the given module set.
///
/// Cycle detection is a three-color depth-first search. Ordering comes
/// from a ready-queue pass: a module is placed only after every one of
/// its dependencies is placed, and when several modules have no unmet
/// dependencies at the same step the tie is broken by their position in
/// `modules`, i.e. registration order. Repeated runs over the same input
/// yield the same sequence. The input is never mutated.
///
/// # Errors
///
/// - [`Error::MissingDependency`] if a module depends on a name absent
///   from the given set (disabled or unregistered).
/// - [`Error::CyclicDependency`] if the restricted graph contains a cycle;
///   the error carries the ordered cycle path. A self-dependency is a
///   one-element cycle.
pub fn resolve(modules: &[ModuleDescriptor]) -> Result<Vec<ModuleDescriptor>> {
    let index: HashMap<&str, usize> = modules
        .iter()
        .enumerate()
        .map(|(idx, descriptor)| (descriptor.name.as_str(), idx))
        .collect();

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); modules.len()];
    let mut pending: Vec<usize> = vec![0; modules.len()];
    for (idx, descriptor) in modules.iter().enumerate() {
        for dependency in &descriptor.dependencies {
            let Some(&dep_idx) = index.get(dependency.as_str()) else {
                return Err(Error::MissingDependency {
                    module: descriptor.name.clone(),
                    dependency: dependency.clone(),
                });
            };
            dependents[dep_idx].push(idx);
            pending[idx] += 1;
        }
    }

    let mut marks = vec![Mark::Unvisited; modules.len()];
    let mut trail = Vec::new();
    for idx in 0..modules.len() {
        check_cycles(idx, modules, &index, &mut marks, &mut trail)?;
    }

    // Graph validated; the ready queue drains completely. The min-heap
    // over indices yields the earliest-registered ready module first.
    let mut ready: BinaryHeap<Reverse<usize>> = pending
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count == 0)
        .map(|(idx, _)| Reverse(idx))
        .collect();

    let mut order = Vec::with_capacity(modules.len());
    while let Some(Reverse(idx)) = ready.pop() {
        order.push(idx);
        for &dependent in &dependents[idx] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    Ok(order.into_iter().map(|idx| modules[idx].clone()).collect())
}

fn check_cycles(
    idx: usize,
    modules: &[ModuleDescriptor],
    index: &HashMap<&str, usize>,
    marks: &mut [Mark],
    trail: &mut Vec<usize>,
) -> Result<()> {
    match marks[idx] {
        Mark::Done => return Ok(()),
        Mark::InProgress => {
            // The trail from the first occurrence of `idx` is the cycle.
            let start = trail.iter().position(|&i| i == idx).unwrap_or(0);
            let cycle = trail[start..]
                .iter()
                .map(|&i| modules[i].name.clone())
                .collect();
            return Err(Error::CyclicDependency { cycle });
        }
        Mark::Unvisited => {}
    }

    marks[idx] = Mark::InProgress;
    trail.push(idx);

    for dependency in &modules[idx].dependencies {
        // edges were validated while counting; unknown names cannot occur
        if let Some(&dep_idx) = index.get(dependency.as_str()) {
            check_cycles(dep_idx, modules, index, marks, trail)?;
        }
    }

    trail.pop();
    marks[idx] = Mark::Done;

    Ok(())
}
