use swc_core::ecma::ast::{
  ArrayPat, AssignTarget, ComputedPropName, Expr, Lit, MemberExpr, MemberProp, ObjectPat,
  ObjectPatProp, Pat, PropName, SimpleAssignTarget,
};

/// The name of a property that is known statically, `a.name` or `a["name"]`.
pub(crate) fn static_property_name(prop: &MemberProp) -> Option<&str> {
  match prop {
    MemberProp::Ident(ident) => Some(&*ident.sym),
    MemberProp::Computed(ComputedPropName { expr, .. }) => match &**expr {
      Expr::Lit(Lit::Str(value)) => Some(&*value.value),
      _ => None,
    },
    MemberProp::PrivateName(_) => None,
  }
}

/// Matches `<object>.<property>` where both sides are known statically, returning the two
/// names.
pub(crate) fn static_member_access(member: &MemberExpr) -> Option<(&str, &str)> {
  let object = member.obj.as_ident()?;
  let property = static_property_name(&member.prop)?;
  Some((&*object.sym, property))
}

pub(crate) fn property_key_name(key: &PropName) -> Option<&str> {
  match key {
    PropName::Ident(ident) => Some(&*ident.sym),
    PropName::Str(value) => Some(&*value.value),
    _ => None,
  }
}

pub(crate) fn assignment_target_member(target: &AssignTarget) -> Option<&MemberExpr> {
  match target {
    AssignTarget::Simple(SimpleAssignTarget::Member(member)) => Some(member),
    _ => None,
  }
}

/// Collects every name bound by a binding pattern.
///
/// For example `{ a, b: [c, ...d], e = 1 }` binds `a`, `c`, `d` and `e`.
pub(crate) fn collect_pat_bindings(pat: &Pat, names: &mut Vec<String>) {
  match pat {
    Pat::Ident(binding_ident) => names.push(binding_ident.id.sym.to_string()),
    Pat::Array(array_pat) => collect_array_pat_bindings(array_pat, names),
    Pat::Object(object_pat) => collect_object_pat_bindings(object_pat, names),
    Pat::Rest(rest_pat) => collect_pat_bindings(&rest_pat.arg, names),
    Pat::Assign(assign_pat) => collect_pat_bindings(&assign_pat.left, names),
    // Only valid as the target of for-in/for-of loops
    Pat::Expr(_) => {}
    Pat::Invalid(_) => {}
  }
}

pub(crate) fn collect_array_pat_bindings(array_pat: &ArrayPat, names: &mut Vec<String>) {
  for elem in array_pat.elems.iter().flatten() {
    collect_pat_bindings(elem, names);
  }
}

pub(crate) fn collect_object_pat_bindings(object_pat: &ObjectPat, names: &mut Vec<String>) {
  for prop in &object_pat.props {
    match prop {
      ObjectPatProp::KeyValue(prop) => {
        collect_pat_bindings(&prop.value, names);
      }
      ObjectPatProp::Assign(prop) => {
        names.push(prop.key.id.sym.to_string());
      }
      ObjectPatProp::Rest(rest_pat) => {
        collect_pat_bindings(&rest_pat.arg, names);
      }
    }
  }
}

/// Quotes `value` as a JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
  serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn test_js_string() {
    assert_eq!(js_string("Data.Maybe"), "\"Data.Maybe\"");
    assert_eq!(js_string("a\"b"), "\"a\\\"b\"");
  }
}
