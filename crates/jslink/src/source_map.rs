use std::collections::HashMap;

use serde::Serialize;
use sourcemap::SourceMapBuilder;

use crate::error::BundleResult;

/// Maps one generated line back to the line of the module it was copied from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMapping {
  pub original_line: usize,
  pub original_column: usize,
  /// Path of the module, relative to the directory of the bundle
  pub source_file: String,
  pub generated_line: usize,
  pub generated_column: usize,
}

/// Line mappings of a bundle, in generated line order.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapping {
  /// File name of the bundle
  pub file: String,
  pub mappings: Vec<LineMapping>,
}

impl SourceMapping {
  pub fn new(file: impl Into<String>) -> Self {
    Self {
      file: file.into(),
      mappings: Vec::new(),
    }
  }

  /// Renders the mappings as a version 3 source map.
  pub fn to_json(&self) -> BundleResult<String> {
    let mut builder = SourceMapBuilder::new(Some(self.file.as_str()));
    let mut sources = HashMap::<&str, u32>::new();

    for mapping in &self.mappings {
      let source_id = *sources
        .entry(mapping.source_file.as_str())
        .or_insert_with(|| builder.add_source(&mapping.source_file));

      builder.add_raw(
        mapping.generated_line as u32,
        mapping.generated_column as u32,
        mapping.original_line as u32,
        mapping.original_column as u32,
        Some(source_id),
        None,
        false,
      );
    }

    let mut buffer = Vec::new();
    builder.into_sourcemap().to_writer(&mut buffer)?;

    Ok(String::from_utf8_lossy(&buffer).into_owned())
  }
}
