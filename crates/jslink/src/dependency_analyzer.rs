//! Finds the members and exports every element of a module refers to.
//!
//! Each member value and export entry is walked with the set of names that are bound at
//! module level: internal members and resolved imports. Function parameters shadow those
//! names for the function's body only.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use swc_core::ecma::ast::{
  ArrowExpr, AssignTargetPat, Constructor, Expr, ForHead, Function, MemberExpr,
  ParamOrTsParamProp, Prop, SetterProp, SimpleAssignTarget,
};
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::types::{Key, Module, ModuleElement, ModuleIdentifier, RequireTarget, Visibility};
use crate::utils::{
  collect_array_pat_bindings, collect_object_pat_bindings, collect_pat_bindings,
  static_member_access,
};

/// Fills in the dependencies of every member and export entry of `module`.
#[tracing::instrument(level = "trace", skip_all, fields(module = %module.identifier))]
pub fn analyze_dependencies(module: Module) -> Module {
  let scope = ModuleScope::new(&module);

  let elements = module
    .elements
    .into_iter()
    .map(|element| match element {
      ModuleElement::Member {
        statement,
        visibility,
        name,
        value,
        ..
      } => {
        let dependencies = scope.dependencies_of(&value);
        tracing::trace!(%name, dependencies = dependencies.len(), "Analyzed member");

        ModuleElement::Member {
          statement,
          visibility,
          name,
          value,
          dependencies,
        }
      }
      ModuleElement::ExportsList { statement, entries } => ModuleElement::ExportsList {
        statement,
        entries: entries
          .into_iter()
          .map(|mut entry| {
            entry.dependencies = scope.dependencies_of(&entry.value);
            entry
          })
          .collect(),
      },
      element => element,
    })
    .collect();

  Module {
    elements,
    ..module
  }
}

/// Module level bindings of one module.
struct ModuleScope {
  module: ModuleIdentifier,
  members: HashSet<String>,
  imports: HashMap<String, ModuleIdentifier>,
}

impl ModuleScope {
  fn new(module: &Module) -> Self {
    let mut members = HashSet::new();
    let mut imports = HashMap::new();

    for element in &module.elements {
      match element {
        ModuleElement::Member {
          visibility: Visibility::Internal,
          name,
          ..
        } => {
          members.insert(name.clone());
        }
        ModuleElement::Require {
          alias,
          target: RequireTarget::Resolved(target),
          ..
        } => {
          imports.insert(alias.clone(), target.clone());
        }
        _ => {}
      }
    }

    Self {
      module: module.identifier.clone(),
      members,
      imports,
    }
  }

  fn dependencies_of(&self, value: &Expr) -> IndexSet<Key> {
    let mut collector = DependencyCollector {
      scope: self,
      bound: self
        .members
        .iter()
        .chain(self.imports.keys())
        .cloned()
        .collect(),
      dependencies: IndexSet::new(),
    };

    value.visit_with(&mut collector);
    collector.dependencies
  }
}

struct DependencyCollector<'a> {
  scope: &'a ModuleScope,
  /// Module level names that are not shadowed at the current position
  bound: HashSet<String>,
  dependencies: IndexSet<Key>,
}

impl DependencyCollector<'_> {
  fn add(&mut self, module: &ModuleIdentifier, name: &str, visibility: Visibility) {
    self
      .dependencies
      .insert(Key::new(module, name, visibility));
  }

  fn reference(&mut self, name: &str) {
    if self.bound.contains(name) && self.scope.members.contains(name) {
      let module = &self.scope.module;
      self
        .dependencies
        .insert(Key::new(module, name, Visibility::Internal));
    }
  }

  fn reference_all(&mut self, names: Vec<String>) {
    for name in names {
      self.reference(&name);
    }
  }

  fn import_target(&self, alias: &str) -> Option<&ModuleIdentifier> {
    if !self.bound.contains(alias) {
      return None;
    }

    self.scope.imports.get(alias)
  }

  /// Visits a function with its parameters shadowing module level names.
  fn with_params<N: VisitWith<Self>>(&mut self, params: Vec<String>, node: &N) {
    let shadowed = params
      .into_iter()
      .filter(|name| self.bound.remove(name))
      .collect::<Vec<_>>();

    node.visit_children_with(self);

    self.bound.extend(shadowed);
  }
}

impl Visit for DependencyCollector<'_> {
  fn visit_expr(&mut self, node: &Expr) {
    if let Expr::Ident(ident) = node {
      self.reference(&ident.sym);
      return;
    }

    node.visit_children_with(self);
  }

  fn visit_member_expr(&mut self, node: &MemberExpr) {
    if let Some((object, property)) = static_member_access(node) {
      if let Some(target) = self.import_target(object).cloned() {
        self.add(&target, property, Visibility::Public);
        return;
      }

      if object == "exports" {
        let module = self.scope.module.clone();
        self.add(&module, property, Visibility::Public);
        return;
      }
    }

    node.visit_children_with(self);
  }

  fn visit_simple_assign_target(&mut self, node: &SimpleAssignTarget) {
    if let SimpleAssignTarget::Ident(binding_ident) = node {
      self.reference(&binding_ident.id.sym);
      return;
    }

    node.visit_children_with(self);
  }

  fn visit_assign_target_pat(&mut self, node: &AssignTargetPat) {
    let mut names = Vec::new();
    match node {
      AssignTargetPat::Array(array_pat) => collect_array_pat_bindings(array_pat, &mut names),
      AssignTargetPat::Object(object_pat) => collect_object_pat_bindings(object_pat, &mut names),
      AssignTargetPat::Invalid(_) => {}
    }
    self.reference_all(names);

    node.visit_children_with(self);
  }

  fn visit_for_head(&mut self, node: &ForHead) {
    // `for (x in o)` assigns to `x`, a declaration in the head binds a new local
    if let ForHead::Pat(pat) = node {
      let mut names = Vec::new();
      collect_pat_bindings(pat, &mut names);
      self.reference_all(names);
    }

    node.visit_children_with(self);
  }

  fn visit_prop(&mut self, node: &Prop) {
    if let Prop::Shorthand(ident) = node {
      self.reference(&ident.sym);
      return;
    }

    node.visit_children_with(self);
  }

  fn visit_function(&mut self, node: &Function) {
    let mut params = Vec::new();
    for param in &node.params {
      collect_pat_bindings(&param.pat, &mut params);
    }

    self.with_params(params, node);
  }

  fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
    let mut params = Vec::new();
    for pat in &node.params {
      collect_pat_bindings(pat, &mut params);
    }

    self.with_params(params, node);
  }

  fn visit_constructor(&mut self, node: &Constructor) {
    let mut params = Vec::new();
    for param in &node.params {
      if let ParamOrTsParamProp::Param(param) = param {
        collect_pat_bindings(&param.pat, &mut params);
      }
    }

    self.with_params(params, node);
  }

  fn visit_setter_prop(&mut self, node: &SetterProp) {
    let mut params = Vec::new();
    collect_pat_bindings(&node.param, &mut params);

    self.with_params(params, node);
  }
}
