use thiserror::Error;

use crate::types::ModuleIdentifier;

pub type BundleResult<T> = std::result::Result<T, BundleError>;

/// Errors produced while linking modules.
///
/// These are structured values; turning them into user facing messages is up to the caller.
#[derive(Error, Debug)]
pub enum BundleError {
  #[error("Unsupported module path: {0}")]
  UnsupportedModulePath(String),

  #[error("Expected a list of top-level statements")]
  InvalidTopLevel,

  #[error("Unable to parse module (line {}): {message}", .line + 1)]
  UnableToParseModule { message: String, line: usize },

  #[error("Unsupported export: {0}")]
  UnsupportedExport(String),

  #[error("Entry point module {0} was not found in the input")]
  MissingEntryPoint(String),

  #[error("Main module {0} was not found in the input")]
  MissingMainModule(String),

  #[error("Error in module {module}: {source}")]
  ErrorInModule {
    module: ModuleIdentifier,
    #[source]
    source: Box<BundleError>,
  },

  #[error("Failed to generate source map: {0}")]
  SourceMap(#[from] sourcemap::Error),
}

impl BundleError {
  pub fn in_module(self, module: &ModuleIdentifier) -> Self {
    BundleError::ErrorInModule {
      module: module.clone(),
      source: Box::new(self),
    }
  }

  /// The error with any module context removed
  pub fn root_cause(&self) -> &BundleError {
    match self {
      BundleError::ErrorInModule { source, .. } => source.root_cause(),
      error => error,
    }
  }
}
