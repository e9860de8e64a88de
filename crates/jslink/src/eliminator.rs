//! Dead-code elimination over classified modules.

use crate::graph::Reachability;
use crate::types::{Key, Module, ModuleElement, RequireTarget};

/// Replaces every element that is not reachable by a [`ModuleElement::Skip`] and drops the
/// modules that are left with nothing observable.
///
/// Element order is preserved. Running this again on its own output with the same
/// reachability changes nothing.
#[tracing::instrument(level = "debug", skip_all)]
pub fn eliminate(modules: Vec<Module>, reachability: &Reachability) -> Vec<Module> {
  let total = modules.len();

  let filtered = modules
    .into_iter()
    .map(|module| filter_module(module, reachability))
    .collect::<Vec<_>>();

  let modules = filtered
    .into_iter()
    .filter(|module| {
      let empty = module.is_empty();
      if empty {
        tracing::trace!(module = %module.identifier, "Dropping empty module");
      }
      !empty
    })
    .collect::<Vec<_>>();

  tracing::debug!(kept = modules.len(), total, "Eliminated dead code");

  modules
}

fn filter_module(module: Module, reachability: &Reachability) -> Module {
  let identifier = module.identifier.clone();

  let elements = module
    .elements
    .into_iter()
    .map(|element| match element {
      ModuleElement::Member {
        statement,
        visibility,
        name,
        value,
        dependencies,
      } => {
        if reachability.is_live(&Key::new(&identifier, name.as_str(), visibility)) {
          ModuleElement::Member {
            statement,
            visibility,
            name,
            value,
            dependencies,
          }
        } else {
          tracing::trace!(module = %identifier, %name, "Skipping member");
          ModuleElement::Skip(statement)
        }
      }
      ModuleElement::ExportsList { statement, entries } => ModuleElement::ExportsList {
        statement,
        entries: entries
          .into_iter()
          .filter(|entry| reachability.is_live(&entry.key(&identifier)))
          .collect(),
      },
      ModuleElement::Require {
        statement,
        alias,
        target: RequireTarget::Resolved(target),
      } => {
        if reachability.is_referenced(&identifier, &target) {
          ModuleElement::Require {
            statement,
            alias,
            target: RequireTarget::Resolved(target),
          }
        } else {
          tracing::trace!(module = %identifier, required = %target, "Skipping require");
          ModuleElement::Skip(statement)
        }
      }
      element => element,
    })
    .collect();

  Module {
    elements,
    ..module
  }
}
