use std::collections::HashSet;

use rayon::prelude::*;

use crate::classifier::classify_module;
use crate::codegen::generate;
use crate::dependency_analyzer::analyze_dependencies;
use crate::eliminator::eliminate;
use crate::error::{BundleError, BundleResult};
use crate::graph::DependencyGraph;
use crate::options::BundleOptions;
use crate::sequencer::sort_modules;
use crate::source_map::SourceMapping;
use crate::types::{Module, ModuleIdentifier, ModuleInput};

/// The linked program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundleOutput {
  pub code: String,
  /// Present when an output file was configured
  pub source_map: Option<SourceMapping>,
}

/// Links `inputs` into a single program containing only the code reachable from the
/// configured entry points.
///
/// Fails on the first error. Errors found while parsing modules are reported in input order.
#[tracing::instrument(level = "debug", skip_all, fields(modules = inputs.len()))]
pub fn bundle(inputs: Vec<ModuleInput>, options: &BundleOptions) -> BundleResult<BundleOutput> {
  let entry_points = entry_points(&inputs, options)?;

  let module_names = inputs
    .iter()
    .map(|input| input.identifier.name.clone())
    .collect::<HashSet<_>>();

  let modules = inputs
    .par_iter()
    .map(|input| classify_module(input, &module_names).map(analyze_dependencies))
    .collect::<Vec<_>>()
    .into_iter()
    .collect::<BundleResult<Vec<Module>>>()?;

  let graph = DependencyGraph::build(&modules);
  let reachability = graph.reachable_from(&entry_points);

  let modules = eliminate(modules, &reachability);
  let modules = sort_modules(modules);

  Ok(generate(&modules, options))
}

/// Entry points of the build, including the main module.
fn entry_points(
  inputs: &[ModuleInput],
  options: &BundleOptions,
) -> BundleResult<HashSet<ModuleIdentifier>> {
  let identifiers = inputs
    .iter()
    .map(|input| &input.identifier)
    .collect::<HashSet<_>>();

  let mut entry_points = HashSet::new();
  for entry_point in &options.entry_points {
    if !identifiers.contains(entry_point) {
      return Err(BundleError::MissingEntryPoint(entry_point.to_string()));
    }

    entry_points.insert(entry_point.clone());
  }

  if let Some(main_module) = &options.main_module {
    let main_module = ModuleIdentifier::regular(main_module.as_str());
    if !identifiers.contains(&main_module) {
      return Err(BundleError::MissingMainModule(main_module.name));
    }

    entry_points.insert(main_module);
  }

  tracing::debug!(entry_points = entry_points.len(), "Validated options");

  Ok(entry_points)
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::options::BundleOptionsBuilder;

  fn inputs() -> Vec<ModuleInput> {
    vec![
      ModuleInput::new(ModuleIdentifier::regular("Main"), "exports.main = 1;\n"),
      ModuleInput::new(ModuleIdentifier::regular("Lib"), "exports.x = 1;\n"),
    ]
  }

  #[test]
  fn test_main_module_is_an_entry_point() {
    let options = BundleOptionsBuilder::default()
      .entry_points(vec![ModuleIdentifier::regular("Lib")])
      .main_module("Main")
      .build();

    assert_eq!(
      entry_points(&inputs(), &options).unwrap(),
      HashSet::from([
        ModuleIdentifier::regular("Lib"),
        ModuleIdentifier::regular("Main")
      ])
    );
  }

  #[test]
  fn test_missing_entry_point() {
    let options = BundleOptionsBuilder::default()
      .entry_points(vec![ModuleIdentifier::foreign("Main")])
      .build();

    let error = bundle(inputs(), &options).unwrap_err();

    assert!(matches!(error, BundleError::MissingEntryPoint(ref name) if name == "Main (foreign)"));
    assert_eq!(
      error.to_string(),
      "Entry point module Main (foreign) was not found in the input"
    );
  }

  #[test]
  fn test_missing_main_module() {
    let options = BundleOptionsBuilder::default().main_module("App").build();

    let error = bundle(inputs(), &options).unwrap_err();

    assert!(matches!(error, BundleError::MissingMainModule(ref name) if name == "App"));
  }

  #[test]
  fn test_options_are_validated_before_parsing() {
    let mut inputs = inputs();
    inputs.push(ModuleInput::new(ModuleIdentifier::regular("Broken"), "var = ;"));

    let options = BundleOptionsBuilder::default().main_module("App").build();
    let error = bundle(inputs, &options).unwrap_err();

    assert!(matches!(error, BundleError::MissingMainModule(_)));
  }
}
