use std::fmt::Display;
use std::fmt::Formatter;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde::Deserialize;
use serde::Serialize;
use swc_core::ecma::ast::Expr;

use crate::error::BundleError;
use crate::source::{ModuleSource, SourceSpan};

/// Whether a module was produced by the compiler or is the hand-written foreign code paired
/// with it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
  Regular,
  Foreign,
}

/// Identifies one compilation unit.
///
/// A module and its foreign companion share the same `name` and differ in `kind`.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ModuleIdentifier {
  pub name: String,
  pub kind: ModuleKind,
}

impl ModuleIdentifier {
  pub fn regular(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind: ModuleKind::Regular,
    }
  }

  pub fn foreign(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind: ModuleKind::Foreign,
    }
  }

  /// Infers the identifier from the compiler's output layout, where every module is written
  /// to `<Module.Name>/index.js` and its foreign code to `<Module.Name>/foreign.js`.
  pub fn from_path(path: &Path) -> Result<Self, BundleError> {
    let unsupported = || BundleError::UnsupportedModulePath(path.display().to_string());

    let file_name = path
      .file_name()
      .and_then(|file_name| file_name.to_str())
      .ok_or_else(unsupported)?;

    let kind = match file_name {
      "index.js" => ModuleKind::Regular,
      "foreign.js" => ModuleKind::Foreign,
      _ => return Err(unsupported()),
    };

    let name = path
      .parent()
      .and_then(|directory| directory.file_name())
      .and_then(|name| name.to_str())
      .filter(|name| !name.is_empty())
      .ok_or_else(unsupported)?;

    Ok(Self {
      name: name.to_string(),
      kind,
    })
  }

  pub fn is_foreign(&self) -> bool {
    self.kind == ModuleKind::Foreign
  }
}

impl Display for ModuleIdentifier {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.kind {
      ModuleKind::Regular => f.write_str(&self.name),
      ModuleKind::Foreign => write!(f, "{} (foreign)", self.name),
    }
  }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Visibility {
  /// Exported and observable from other modules
  Public,
  /// A module-local binding
  Internal,
}

/// Identity of one vertex of the dependency graph.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Key {
  pub module: ModuleIdentifier,
  pub name: String,
  pub visibility: Visibility,
}

impl Key {
  pub fn new(module: &ModuleIdentifier, name: impl Into<String>, visibility: Visibility) -> Self {
    Self {
      module: module.clone(),
      name: name.into(),
      visibility,
    }
  }
}

impl Display for Key {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.visibility {
      Visibility::Public => write!(f, "{}.{}", self.module, self.name),
      Visibility::Internal => write!(f, "{}#{}", self.module, self.name),
    }
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExportType {
  /// The export is bound to the given local expression, usually a member name
  RegularExport(String),
  /// The export is taken as-is from the paired foreign module
  ForeignReexport,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RequireTarget {
  /// A path outside of the bundle, kept as a literal `require` call
  Unresolved(String),
  Resolved(ModuleIdentifier),
}

/// One property of the `module.exports = { ... }` table.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportEntry {
  pub export_type: ExportType,
  /// The exported name
  pub name: String,
  pub value: Box<Expr>,
  /// Span of the property value
  pub span: SourceSpan,
  pub dependencies: IndexSet<Key>,
}

impl ExportEntry {
  pub fn key(&self, module: &ModuleIdentifier) -> Key {
    Key::new(module, self.name.clone(), Visibility::Public)
  }
}

/// The span of a top-level statement, used to re-emit it verbatim.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Statement {
  pub span: SourceSpan,
}

/// A classified top-level statement.
///
/// Elements keep the order of the statements in the module text.
#[derive(Clone, Debug, PartialEq)]
pub enum ModuleElement {
  Require {
    statement: Statement,
    alias: String,
    target: RequireTarget,
  },
  Member {
    statement: Statement,
    visibility: Visibility,
    name: String,
    value: Box<Expr>,
    dependencies: IndexSet<Key>,
  },
  ExportsList {
    statement: Statement,
    entries: Vec<ExportEntry>,
  },
  /// Any other statement, passed through verbatim
  Other(Statement),
  /// A dead statement, kept only for its line span
  Skip(Statement),
}

impl ModuleElement {
  pub fn statement(&self) -> &Statement {
    match self {
      ModuleElement::Require { statement, .. }
      | ModuleElement::Member { statement, .. }
      | ModuleElement::ExportsList { statement, .. }
      | ModuleElement::Other(statement)
      | ModuleElement::Skip(statement) => statement,
    }
  }

  pub fn is_skip(&self) -> bool {
    matches!(self, ModuleElement::Skip(_))
  }
}

/// A module as seen by the linker: its identity, text and classified statements.
#[derive(Clone, Debug, PartialEq)]
pub struct Module {
  pub identifier: ModuleIdentifier,
  pub file_path: Option<PathBuf>,
  pub source: ModuleSource,
  pub elements: Vec<ModuleElement>,
}

impl Module {
  /// A module is empty when it has nothing left that another module could observe: no
  /// members, and at most an exports table without entries.
  pub fn is_empty(&self) -> bool {
    self.elements.iter().all(|element| match element {
      ModuleElement::Require { .. } | ModuleElement::Other(_) | ModuleElement::Skip(_) => true,
      ModuleElement::ExportsList { entries, .. } => entries.is_empty(),
      ModuleElement::Member { .. } => false,
    })
  }

  /// Resolved `require` targets in statement order
  pub fn required_modules(&self) -> impl Iterator<Item = &ModuleIdentifier> {
    self.elements.iter().filter_map(|element| match element {
      ModuleElement::Require {
        target: RequireTarget::Resolved(target),
        ..
      } => Some(target),
      _ => None,
    })
  }
}

/// One module as produced by the compiler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleInput {
  pub identifier: ModuleIdentifier,
  pub file_path: Option<PathBuf>,
  pub source: String,
}

impl ModuleInput {
  pub fn new(identifier: ModuleIdentifier, source: impl Into<String>) -> Self {
    Self {
      identifier,
      file_path: None,
      source: source.into(),
    }
  }

  pub fn with_file_path(mut self, file_path: impl Into<PathBuf>) -> Self {
    self.file_path = Some(file_path.into());
    self
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn test_module_identifier_from_path() {
    assert_eq!(
      ModuleIdentifier::from_path(Path::new("output/Data.Maybe/index.js")).unwrap(),
      ModuleIdentifier::regular("Data.Maybe")
    );
    assert_eq!(
      ModuleIdentifier::from_path(Path::new("output/Data.Maybe/foreign.js")).unwrap(),
      ModuleIdentifier::foreign("Data.Maybe")
    );
  }

  #[test]
  fn test_module_identifier_from_unsupported_path() {
    let result = ModuleIdentifier::from_path(Path::new("output/Data.Maybe/other.js"));

    assert!(matches!(
      result,
      Err(BundleError::UnsupportedModulePath(path)) if path == "output/Data.Maybe/other.js"
    ));
  }

  #[test]
  fn test_module_identifier_ordering() {
    let mut identifiers = vec![
      ModuleIdentifier::foreign("B"),
      ModuleIdentifier::regular("B"),
      ModuleIdentifier::regular("A"),
    ];
    identifiers.sort();

    assert_eq!(
      identifiers,
      vec![
        ModuleIdentifier::regular("A"),
        ModuleIdentifier::regular("B"),
        ModuleIdentifier::foreign("B"),
      ]
    );
  }

  #[test]
  fn test_module_identifier_serde() {
    let identifier: ModuleIdentifier =
      serde_json::from_str(r#"{ "name": "Main", "kind": "foreign" }"#).unwrap();

    assert_eq!(identifier, ModuleIdentifier::foreign("Main"));
    assert_eq!(identifier.to_string(), "Main (foreign)");
  }
}
