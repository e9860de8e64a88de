//! The whole-program dependency graph between members and exports.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexSet;

use crate::types::{Key, Module, ModuleElement, ModuleIdentifier, Visibility};

/// Directed graph of every member and export entry of the build.
///
/// Vertices are numbered in module order, then statement order, which makes every traversal
/// deterministic.
#[derive(Debug, Default)]
pub struct DependencyGraph {
  vertices: IndexSet<Key>,
  /// Outgoing edges of each vertex, by index
  edges: Vec<Vec<usize>>,
  /// Every dependency of each vertex, including keys that have no vertex
  dependencies: Vec<Vec<Key>>,
}

impl DependencyGraph {
  pub fn build(modules: &[Module]) -> Self {
    let mut graph = DependencyGraph::default();

    for module in modules {
      for element in &module.elements {
        match element {
          ModuleElement::Member {
            visibility,
            name,
            dependencies,
            ..
          } => {
            graph.add_vertex(
              Key::new(&module.identifier, name.clone(), *visibility),
              dependencies,
            );
          }
          ModuleElement::ExportsList { entries, .. } => {
            for entry in entries {
              graph.add_vertex(entry.key(&module.identifier), &entry.dependencies);
            }
          }
          _ => {}
        }
      }
    }

    for index in 0..graph.vertices.len() {
      let edges = graph.dependencies[index]
        .iter()
        .filter_map(|dependency| graph.vertices.get_index_of(dependency))
        .collect();
      graph.edges[index] = edges;
    }

    tracing::debug!(
      vertices = graph.vertices.len(),
      edges = graph.edges.iter().map(Vec::len).sum::<usize>(),
      "Built dependency graph"
    );

    graph
  }

  fn add_vertex(&mut self, key: Key, dependencies: &IndexSet<Key>) {
    let (index, inserted) = self.vertices.insert_full(key);
    if inserted {
      self.edges.push(Vec::new());
      self.dependencies.push(dependencies.iter().cloned().collect());
    } else {
      // The same binding assigned twice, its uses are the union of both
      self.dependencies[index].extend(dependencies.iter().cloned());
    }
  }

  /// Computes everything reachable from the public members of `entry_points`.
  pub fn reachable_from(&self, entry_points: &HashSet<ModuleIdentifier>) -> Reachability {
    let mut visited = vec![false; self.vertices.len()];
    let mut queue = VecDeque::new();

    for (index, key) in self.vertices.iter().enumerate() {
      if key.visibility == Visibility::Public && entry_points.contains(&key.module) {
        visited[index] = true;
        queue.push_back(index);
      }
    }

    while let Some(index) = queue.pop_front() {
      for &next in &self.edges[index] {
        if !visited[next] {
          visited[next] = true;
          queue.push_back(next);
        }
      }
    }

    let mut reachability = Reachability::default();
    for (index, key) in self.vertices.iter().enumerate() {
      if !visited[index] {
        continue;
      }

      let referenced = reachability
        .referenced_modules
        .entry(key.module.clone())
        .or_default();
      for dependency in &self.dependencies[index] {
        if dependency.module != key.module {
          referenced.insert(dependency.module.clone());
        }
      }

      reachability.live.insert(key.clone());
    }

    tracing::debug!(
      live = reachability.live_count(),
      total = self.vertices.len(),
      "Computed reachable members"
    );

    reachability
  }
}

/// The live part of a build.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reachability {
  live: HashSet<Key>,
  /// Modules referenced by the live members of each module
  referenced_modules: HashMap<ModuleIdentifier, HashSet<ModuleIdentifier>>,
}

impl Reachability {
  pub fn is_live(&self, key: &Key) -> bool {
    self.live.contains(key)
  }

  pub fn live_count(&self) -> usize {
    self.live.len()
  }

  pub fn is_referenced(&self, from: &ModuleIdentifier, module: &ModuleIdentifier) -> bool {
    self
      .referenced_modules
      .get(from)
      .is_some_and(|referenced| referenced.contains(module))
  }
}
