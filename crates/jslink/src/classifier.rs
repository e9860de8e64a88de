//! Turns the top-level statements of one module into [`ModuleElement`]s.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;

use indexmap::IndexSet;
use jslink_swc_runner::{parse_script, ParseScriptError, ParsedScript};
use swc_core::common::{Span, Spanned};
use swc_core::ecma::ast::{
  AssignOp, Decl, Expr, ExprStmt, FnExpr, Lit, Prop, PropOrSpread, Stmt, Str, Tpl,
};
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::error::{BundleError, BundleResult};
use crate::source::{LineIndex, ModuleSource, SourceSpan};
use crate::types::{
  ExportEntry, ExportType, Module, ModuleElement, ModuleIdentifier, ModuleInput, RequireTarget,
  Statement, Visibility,
};
use crate::utils::{
  assignment_target_member, property_key_name, static_member_access, static_property_name,
};

/// Path under which every module requires its own foreign code
pub const FOREIGN_MODULE_PATH: &str = "./foreign.js";

/// Parses and classifies one module.
///
/// `module_names` must contain the name of every module taking part in the build, so that
/// `require` paths pointing at other modules can be resolved. The returned elements carry
/// no dependencies yet, see [`crate::dependency_analyzer`].
#[tracing::instrument(level = "trace", skip_all, fields(module = %input.identifier))]
pub fn classify_module(
  input: &ModuleInput,
  module_names: &HashSet<String>,
) -> BundleResult<Module> {
  classify(input, module_names).map_err(|error| error.in_module(&input.identifier))
}

fn classify(input: &ModuleInput, module_names: &HashSet<String>) -> BundleResult<Module> {
  let text: Arc<str> = Arc::from(input.source.as_str());
  let parsed = parse_script(&text).map_err(|error| match error {
    ParseScriptError::SwcParse { message, offset } => BundleError::UnableToParseModule {
      message,
      line: LineIndex::new(&text).line_of(offset),
    },
    ParseScriptError::ModuleDeclarations => BundleError::InvalidTopLevel,
  })?;

  let mut literals = MultilineLiteralCollector {
    parsed: &parsed,
    text: &text,
    ranges: Vec::new(),
  };
  parsed.script.visit_with(&mut literals);
  let literal_ranges = literals.ranges;

  let source = ModuleSource::new(text.clone(), literal_ranges);
  let mut classifier = ModuleClassifier {
    identifier: &input.identifier,
    module_names,
    parsed: &parsed,
    source: &source,
    imports: HashMap::new(),
  };

  let elements = parsed
    .script
    .body
    .iter()
    .map(|stmt| classifier.classify_statement(stmt))
    .collect::<BundleResult<Vec<_>>>()?;

  tracing::trace!(elements = elements.len(), "Classified module");

  Ok(Module {
    identifier: input.identifier.clone(),
    file_path: input.file_path.clone(),
    source,
    elements,
  })
}

struct ModuleClassifier<'a> {
  identifier: &'a ModuleIdentifier,
  module_names: &'a HashSet<String>,
  parsed: &'a ParsedScript,
  source: &'a ModuleSource,
  /// Resolved imports seen so far, by alias
  imports: HashMap<String, ModuleIdentifier>,
}

impl ModuleClassifier<'_> {
  fn span(&self, span: Span) -> SourceSpan {
    self.source.span(self.parsed.range(span))
  }

  fn classify_statement(&mut self, stmt: &Stmt) -> BundleResult<ModuleElement> {
    let statement = Statement {
      span: self.span(stmt.span()),
    };

    if let Some((alias, path)) = match_require(stmt) {
      let target = self.resolve_require_path(path);
      if let RequireTarget::Resolved(target) = &target {
        self.imports.insert(alias.to_string(), target.clone());
      }

      return Ok(ModuleElement::Require {
        statement,
        alias: alias.to_string(),
        target,
      });
    }

    if let Some((name, value)) = match_member(stmt) {
      return Ok(ModuleElement::Member {
        statement,
        visibility: Visibility::Internal,
        name,
        value,
        dependencies: IndexSet::new(),
      });
    }

    if let Some(props) = match_exports_table(stmt) {
      let entries = props
        .iter()
        .map(|prop| self.classify_export(prop))
        .collect::<BundleResult<Vec<_>>>()?;

      return Ok(ModuleElement::ExportsList { statement, entries });
    }

    if let Some((name, value)) = match_export_assignment(stmt) {
      return Ok(ModuleElement::Member {
        statement,
        visibility: Visibility::Public,
        name: name.to_string(),
        value: Box::new(value.clone()),
        dependencies: IndexSet::new(),
      });
    }

    Ok(ModuleElement::Other(statement))
  }

  /// Modules only ever require their own foreign code or another module's entry file.
  /// Anything else is left for the runtime to resolve.
  fn resolve_require_path(&self, path: &str) -> RequireTarget {
    if path == FOREIGN_MODULE_PATH {
      return RequireTarget::Resolved(ModuleIdentifier::foreign(&self.identifier.name));
    }

    let name = path.strip_prefix("../").map(|name| {
      name
        .strip_suffix("/index.js")
        .unwrap_or_else(|| name.trim_end_matches('/'))
    });

    match name {
      Some(name) if self.module_names.contains(name) => {
        RequireTarget::Resolved(ModuleIdentifier::regular(name))
      }
      _ => RequireTarget::Unresolved(path.to_string()),
    }
  }

  fn classify_export(&self, prop: &PropOrSpread) -> BundleResult<ExportEntry> {
    let unsupported = |span: Span| {
      BundleError::UnsupportedExport(self.source.slice(&self.span(span)).to_string())
    };

    let PropOrSpread::Prop(prop) = prop else {
      return Err(unsupported(prop.span()));
    };

    let (name, value) = match &**prop {
      // { name }
      Prop::Shorthand(ident) => (
        ident.sym.to_string(),
        Box::new(Expr::Ident(ident.clone())),
      ),
      // { name: value } or { "name": value }
      Prop::KeyValue(key_value) => {
        let name = property_key_name(&key_value.key).ok_or_else(|| unsupported(prop.span()))?;
        (name.to_string(), key_value.value.clone())
      }
      _ => return Err(unsupported(prop.span())),
    };

    let span = self.span(value.span());
    let export_type = self
      .export_type(&value, &span)
      .ok_or_else(|| unsupported(prop.span()))?;

    Ok(ExportEntry {
      export_type,
      name,
      value,
      span,
      dependencies: IndexSet::new(),
    })
  }

  /// Exports are either plain references to a local binding (or a value of another module),
  /// or re-exports of the paired foreign module.
  fn export_type(&self, value: &Expr, span: &SourceSpan) -> Option<ExportType> {
    match value {
      Expr::Ident(ident) => Some(ExportType::RegularExport(ident.sym.to_string())),
      Expr::Member(member) => {
        let (object, _) = static_member_access(member)?;
        match self.imports.get(object) {
          Some(target) if target.is_foreign() => Some(ExportType::ForeignReexport),
          _ => Some(ExportType::RegularExport(
            self.source.slice(span).to_string(),
          )),
        }
      }
      _ => None,
    }
  }
}

/// `var <alias> = require("<path>")`
fn match_require(stmt: &Stmt) -> Option<(&str, &str)> {
  let Stmt::Decl(Decl::Var(var)) = stmt else {
    return None;
  };
  let [declarator] = var.decls.as_slice() else {
    return None;
  };

  let alias = declarator.name.as_ident()?;
  let call_expr = declarator.init.as_ref()?.as_call()?;
  let callee = call_expr
    .callee
    .as_expr()
    .and_then(|expr| expr.as_ident())?;

  if &*callee.sym != "require" {
    return None;
  }

  let [argument] = call_expr.args.as_slice() else {
    return None;
  };
  if argument.spread.is_some() {
    return None;
  }

  let Lit::Str(path) = argument.expr.as_lit()? else {
    return None;
  };

  Some((&*alias.id.sym, &*path.value))
}

/// `var <name> = <expr>` or `function <name>(...) { ... }`
fn match_member(stmt: &Stmt) -> Option<(String, Box<Expr>)> {
  match stmt {
    Stmt::Decl(Decl::Var(var)) => {
      let [declarator] = var.decls.as_slice() else {
        return None;
      };
      let name = declarator.name.as_ident()?;
      let init = declarator.init.as_ref()?;

      Some((name.id.sym.to_string(), init.clone()))
    }
    Stmt::Decl(Decl::Fn(fn_decl)) => Some((
      fn_decl.ident.sym.to_string(),
      Box::new(Expr::Fn(FnExpr {
        ident: Some(fn_decl.ident.clone()),
        function: fn_decl.function.clone(),
      })),
    )),
    _ => None,
  }
}

/// `module.exports = { ... }`
fn match_exports_table(stmt: &Stmt) -> Option<&[PropOrSpread]> {
  let Stmt::Expr(ExprStmt { expr, .. }) = stmt else {
    return None;
  };
  let assign = expr.as_assign()?;
  if assign.op != AssignOp::Assign {
    return None;
  }

  let target = assignment_target_member(&assign.left)?;
  if static_member_access(target)? != ("module", "exports") {
    return None;
  }

  let object = assign.right.as_object()?;
  Some(&object.props)
}

/// `exports.<name> = <expr>` or `exports["<name>"] = <expr>`
fn match_export_assignment(stmt: &Stmt) -> Option<(&str, &Expr)> {
  let Stmt::Expr(ExprStmt { expr, .. }) = stmt else {
    return None;
  };
  let assign = expr.as_assign()?;
  if assign.op != AssignOp::Assign {
    return None;
  }

  let target = assignment_target_member(&assign.left)?;
  let object = target.obj.as_ident()?;
  if &*object.sym != "exports" {
    return None;
  }

  let name = static_property_name(&target.prop)?;
  Some((name, &assign.right))
}

/// Records string and template literals spanning several lines.
struct MultilineLiteralCollector<'a> {
  parsed: &'a ParsedScript,
  text: &'a str,
  ranges: Vec<Range<usize>>,
}

impl MultilineLiteralCollector<'_> {
  fn add(&mut self, span: Span) {
    let range = self.parsed.range(span);
    if self
      .text
      .get(range.clone())
      .is_some_and(|literal| literal.contains('\n'))
    {
      self.ranges.push(range);
    }
  }
}

impl Visit for MultilineLiteralCollector<'_> {
  fn visit_tpl(&mut self, node: &Tpl) {
    self.add(node.span);
    node.visit_children_with(self);
  }

  fn visit_str(&mut self, node: &Str) {
    self.add(node.span);
  }
}
