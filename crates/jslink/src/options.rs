use std::path::PathBuf;

use derive_builder::Builder;
use serde::Deserialize;

use crate::types::ModuleIdentifier;

/// Namespace object used when none is configured
pub const DEFAULT_NAMESPACE: &str = "PS";

/// Controls how a set of modules is linked.
#[derive(Builder, Clone, Debug, Deserialize, Eq, PartialEq)]
#[builder(build_fn(skip), pattern = "owned", setter(into, strip_option))]
#[serde(default, rename_all = "camelCase")]
pub struct BundleOptions {
  /// Modules whose public members are all kept
  pub entry_points: Vec<ModuleIdentifier>,

  /// Module whose `main` export is called at the end of the bundle
  ///
  /// The main module is always treated as an entry point.
  ///
  pub main_module: Option<String>,

  /// Name of the global object that holds the exports of every module
  pub namespace: String,

  /// Path the bundle will be written to
  ///
  /// When set, a source mapping is generated and the bundle ends with a `sourceMappingURL`
  /// comment. Module paths in the mapping are relative to this file's directory.
  ///
  pub output_file: Option<PathBuf>,
}

impl Default for BundleOptions {
  fn default() -> Self {
    Self {
      entry_points: Vec::new(),
      main_module: None,
      namespace: DEFAULT_NAMESPACE.to_string(),
      output_file: None,
    }
  }
}

impl BundleOptionsBuilder {
  pub fn build(self) -> BundleOptions {
    let defaults = BundleOptions::default();

    BundleOptions {
      entry_points: self.entry_points.unwrap_or(defaults.entry_points),
      main_module: self.main_module.unwrap_or(defaults.main_module),
      namespace: self.namespace.unwrap_or(defaults.namespace),
      output_file: self.output_file.unwrap_or(defaults.output_file),
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn test_builder_defaults() {
    let options = BundleOptionsBuilder::default()
      .entry_points(vec![ModuleIdentifier::regular("Main")])
      .build();

    assert_eq!(
      options,
      BundleOptions {
        entry_points: vec![ModuleIdentifier::regular("Main")],
        main_module: None,
        namespace: String::from("PS"),
        output_file: None,
      }
    );
  }

  #[test]
  fn test_builder_setters() {
    let options = BundleOptionsBuilder::default()
      .main_module("Main")
      .namespace("App")
      .output_file("dist/app.js")
      .build();

    assert_eq!(options.main_module, Some(String::from("Main")));
    assert_eq!(options.namespace, "App");
    assert_eq!(options.output_file, Some(PathBuf::from("dist/app.js")));
    assert!(options.entry_points.is_empty());
  }

  #[test]
  fn test_deserialize() {
    let options: BundleOptions = serde_json::from_str(
      r#"{
        "entryPoints": [{ "name": "Main", "kind": "regular" }],
        "outputFile": "dist/app.js"
      }"#,
    )
    .unwrap();

    assert_eq!(
      options,
      BundleOptions {
        entry_points: vec![ModuleIdentifier::regular("Main")],
        main_module: None,
        namespace: String::from("PS"),
        output_file: Some(PathBuf::from("dist/app.js")),
      }
    );
  }
}
