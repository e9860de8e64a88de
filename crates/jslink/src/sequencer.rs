//! Orders modules so that every module is defined before the modules that require it.

use indexmap::IndexMap;

use crate::types::Module;

/// Sorts `modules` by their `require` edges.
///
/// The result is a depth-first postorder that starts from the modules in identifier order
/// and visits required modules in the order of their `require` statements. Requires of
/// modules that are not part of `modules` are ignored. Cycles are broken where the
/// traversal meets them, so the order is always total and deterministic.
#[tracing::instrument(level = "debug", skip_all)]
pub fn sort_modules(modules: Vec<Module>) -> Vec<Module> {
  let mut modules = modules
    .into_iter()
    .map(|module| (module.identifier.clone(), module))
    .collect::<IndexMap<_, _>>();
  modules.sort_keys();

  let edges = modules
    .values()
    .map(|module| {
      let mut targets = Vec::new();
      for target in module.required_modules() {
        if let Some(index) = modules.get_index_of(target) {
          if !targets.contains(&index) {
            targets.push(index);
          }
        }
      }
      targets
    })
    .collect::<Vec<_>>();

  let order = postorder(&edges);

  tracing::debug!(modules = order.len(), "Sorted modules");

  let mut slots = modules.into_values().map(Some).collect::<Vec<_>>();
  order
    .into_iter()
    .filter_map(|index| slots[index].take())
    .collect()
}

/// Depth-first postorder over every vertex of an adjacency list.
fn postorder(edges: &[Vec<usize>]) -> Vec<usize> {
  let mut visited = vec![false; edges.len()];
  let mut order = Vec::with_capacity(edges.len());
  // Each frame is a vertex and the position of the next successor to visit
  let mut stack: Vec<(usize, usize)> = Vec::new();

  for root in 0..edges.len() {
    if visited[root] {
      continue;
    }

    visited[root] = true;
    stack.push((root, 0));

    while let Some((vertex, next)) = stack.last_mut() {
      let vertex = *vertex;
      if let Some(&successor) = edges[vertex].get(*next) {
        *next += 1;
        if !visited[successor] {
          visited[successor] = true;
          stack.push((successor, 0));
        }
      } else {
        order.push(vertex);
        stack.pop();
      }
    }
  }

  order
}
