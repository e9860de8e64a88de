//! Writes the bundle: every module wrapped in a function bound to its namespace slot.

use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;

use crate::bundle::BundleOutput;
use crate::options::BundleOptions;
use crate::source::{ModuleSource, SourceSpan};
use crate::source_map::{LineMapping, SourceMapping};
use crate::types::{ExportType, Module, ModuleElement, ModuleIdentifier, RequireTarget};
use crate::utils::js_string;

const INDENT: &str = "  ";
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Generates the code of the bundle for `modules`, which must already be sorted.
///
/// A source mapping is produced when `options.output_file` is set.
#[tracing::instrument(level = "debug", skip_all)]
pub fn generate(modules: &[Module], options: &BundleOptions) -> BundleOutput {
  let output_file = options.output_file.as_deref();
  let mut writer = BundleWriter::new(output_file.is_some());
  let namespace = options.namespace.as_str();

  let in_bundle = modules
    .iter()
    .map(|module| &module.identifier)
    .collect::<HashSet<_>>();

  writer.write_line(&format!("var {namespace} = {{}};"), None);

  for module in modules {
    let source_file = output_file.and_then(|output_file| {
      let file_path = module.file_path.as_deref()?;
      Some(relative_source_path(file_path, output_file))
    });

    ModuleWriter {
      writer: &mut writer,
      module,
      namespace,
      in_bundle: &in_bundle,
      source_file: source_file.as_deref(),
    }
    .write();
  }

  if let Some(main_module) = &options.main_module {
    writer.write_line(
      &format!("{namespace}[{}].main();", js_string(main_module)),
      None,
    );
  }

  let file_name = output_file
    .and_then(|output_file| output_file.file_name())
    .map(|file_name| file_name.to_string_lossy().into_owned());

  if let Some(file_name) = &file_name {
    writer.write_line(&format!("//# sourceMappingURL={file_name}.map"), None);
  }

  tracing::debug!(
    modules = modules.len(),
    lines = writer.line,
    "Generated bundle"
  );

  let source_map = writer.mappings.map(|mappings| SourceMapping {
    file: file_name.unwrap_or_default(),
    mappings,
  });

  BundleOutput {
    code: writer.code,
    source_map,
  }
}

/// Path of a module relative to the directory the bundle is written to
fn relative_source_path(file_path: &Path, output_file: &Path) -> String {
  let base = output_file.parent().unwrap_or_else(|| Path::new(""));
  let relative = pathdiff::diff_paths(file_path, base).unwrap_or_else(|| file_path.to_path_buf());

  relative.to_string_lossy().replace('\\', "/")
}

/// Appends whole lines to the bundle, keeping count of the generated line.
struct BundleWriter {
  code: String,
  /// Zero-based line the next write starts at
  line: usize,
  mappings: Option<Vec<LineMapping>>,
}

impl BundleWriter {
  fn new(source_map: bool) -> Self {
    Self {
      code: String::new(),
      line: 0,
      mappings: source_map.then(Vec::new),
    }
  }

  /// Writes one line, mapped to `origin` (source file and original line) when there is one.
  fn write_line(&mut self, text: &str, origin: Option<(&str, usize)>) {
    if let (Some(mappings), Some((source_file, original_line))) = (&mut self.mappings, origin) {
      mappings.push(LineMapping {
        original_line,
        original_column: 0,
        source_file: source_file.to_string(),
        generated_line: self.line,
        generated_column: 0,
      });
    }

    self.code.push_str(text);
    self.code.push('\n');
    self.line += 1;
  }
}

struct ModuleWriter<'a> {
  writer: &'a mut BundleWriter,
  module: &'a Module,
  namespace: &'a str,
  in_bundle: &'a HashSet<&'a ModuleIdentifier>,
  source_file: Option<&'a str>,
}

impl ModuleWriter<'_> {
  fn write(mut self) {
    let module = self.module;
    let slot = self.slot(&module.identifier.name);

    self.writer.write_line("(function(exports) {", None);

    let mut previous_end = 0;
    for element in &module.elements {
      let span = element.statement().span;
      if !element.is_skip() {
        self.write_comments(&module.source, previous_end..span.start);
      }
      previous_end = span.end;

      match element {
        ModuleElement::Skip(_) => {}
        ModuleElement::Require {
          statement,
          alias,
          target: RequireTarget::Resolved(target),
        } if !module.identifier.is_foreign() && self.in_bundle.contains(target) => {
          let line = format!("{INDENT}var {alias} = {};", self.slot(&target.name));
          self.write_line(&line, statement.span.start_line);
        }
        ModuleElement::ExportsList { entries, .. } => {
          for entry in entries {
            let value = match &entry.export_type {
              ExportType::RegularExport(name) => name.as_str(),
              ExportType::ForeignReexport => module.source.slice(&entry.span),
            };
            let line = format!("{INDENT}exports[{}] = {value};", js_string(&entry.name));
            self.write_line(&line, entry.span.start_line);
          }
        }
        element => self.write_verbatim(&module.source, &element.statement().span),
      }
    }
    self.write_comments(&module.source, previous_end..module.source.text().len());

    self
      .writer
      .write_line(&format!("}})({slot} = {slot} || {{}});"), None);
  }

  fn slot(&self, name: &str) -> String {
    format!("{}[{}]", self.namespace, js_string(name))
  }

  fn write_line(&mut self, text: &str, original_line: usize) {
    let origin = self.source_file.map(|source_file| (source_file, original_line));
    self.writer.write_line(text, origin);
  }

  /// Copies the comments between two statements. Comments leading a skipped statement are
  /// dropped with it by the caller.
  fn write_comments(&mut self, source: &ModuleSource, range: Range<usize>) {
    let Some(text) = source.text().get(range.clone()) else {
      return;
    };

    let mut offset = range.start;
    for line in text.split('\n') {
      let line_start = offset;
      offset += line.len() + 1;

      let line = line.trim_start_matches(BYTE_ORDER_MARK);
      if line.trim().is_empty() || (line_start == 0 && line.starts_with("#!")) {
        continue;
      }

      // The rest of the line a statement ends on
      let line = if line_start == range.start && line_start > 0 {
        line.trim()
      } else {
        line.trim_end()
      };

      let original_line = source.lines().line_of(line_start);
      self.write_line(&format!("{INDENT}{line}"), original_line);
    }
  }

  /// Copies a statement line by line, indenting every line that does not continue a
  /// multi-line literal.
  fn write_verbatim(&mut self, source: &ModuleSource, span: &SourceSpan) {
    let mut offset = span.start;

    for (index, line) in source.slice(span).split('\n').enumerate() {
      let line_start = offset;
      offset += line.len() + 1;

      let line = line.strip_suffix('\r').unwrap_or(line);
      let text = if line.is_empty() || (index > 0 && source.is_inside_literal(line_start)) {
        line.to_string()
      } else {
        format!("{INDENT}{line}")
      };

      self.write_line(&text, span.start_line + index);
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;
  use std::path::PathBuf;

  use indoc::indoc;
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::classifier::classify_module;
  use crate::options::BundleOptionsBuilder;
  use crate::types::ModuleInput;

  fn load(inputs: &[ModuleInput]) -> Vec<Module> {
    let names = inputs
      .iter()
      .map(|input| input.identifier.name.clone())
      .collect::<HashSet<_>>();

    inputs
      .iter()
      .map(|input| classify_module(input, &names).unwrap())
      .collect()
  }

  #[test]
  fn test_wraps_modules_in_namespace_slots() {
    let modules = load(&[
      ModuleInput::new(
        ModuleIdentifier::regular("Data.Show"),
        indoc! {r#"
          "use strict";
          var show = function (x) {
              return "" + x;
          };
          module.exports = {
              show: show
          };
        "#},
      ),
      ModuleInput::new(
        ModuleIdentifier::regular("Main"),
        indoc! {r#"
          var Data_Show = require("../Data.Show/index.js");
          var fs = require("fs");
          exports.main = function () {
              return Data_Show.show(1);
          };
        "#},
      ),
    ]);

    let options = BundleOptionsBuilder::default().main_module("Main").build();
    let output = generate(&modules, &options);

    assert_eq!(
      output.code,
      indoc! {r#"
        var PS = {};
        (function(exports) {
          "use strict";
          var show = function (x) {
              return "" + x;
          };
          exports["show"] = show;
        })(PS["Data.Show"] = PS["Data.Show"] || {});
        (function(exports) {
          var Data_Show = PS["Data.Show"];
          var fs = require("fs");
          exports.main = function () {
              return Data_Show.show(1);
          };
        })(PS["Main"] = PS["Main"] || {});
        PS["Main"].main();
      "#}
    );
    assert_eq!(output.source_map, None);
  }

  #[test]
  fn test_foreign_modules_share_the_slot() {
    let modules = load(&[
      ModuleInput::new(
        ModuleIdentifier::foreign("Main"),
        "var helper = require(\"../Data.Show/index.js\");\nexports.log = function (s) {\n  console.log(s);\n};\n",
      ),
      ModuleInput::new(
        ModuleIdentifier::regular("Main"),
        "var $foreign = require(\"./foreign.js\");\nmodule.exports = { log: $foreign.log };\n",
      ),
      ModuleInput::new(ModuleIdentifier::regular("Data.Show"), "exports.x = 1;\n"),
    ]);

    let options = BundleOptionsBuilder::default().namespace("App").build();
    let output = generate(&modules, &options);

    assert_eq!(
      output.code,
      indoc! {r#"
        var App = {};
        (function(exports) {
          var helper = require("../Data.Show/index.js");
          exports.log = function (s) {
            console.log(s);
          };
        })(App["Main"] = App["Main"] || {});
        (function(exports) {
          var $foreign = App["Main"];
          exports["log"] = $foreign.log;
        })(App["Main"] = App["Main"] || {});
        (function(exports) {
          exports.x = 1;
        })(App["Data.Show"] = App["Data.Show"] || {});
      "#}
    );
  }

  #[test]
  fn test_multiline_literals_are_not_indented() {
    let modules = load(&[ModuleInput::new(
      ModuleIdentifier::regular("Main"),
      "var text = `first\nsecond\n  third`;\nvar other = 1;\n",
    )]);

    let output = generate(&modules, &BundleOptions::default());

    assert_eq!(
      output.code,
      "var PS = {};\n(function(exports) {\n  var text = `first\nsecond\n  third`;\n  var other = 1;\n})(PS[\"Main\"] = PS[\"Main\"] || {});\n"
    );
  }

  #[test]
  fn test_skipped_statements_only_advance_the_original_line() {
    let mut modules = load(&[ModuleInput::new(
      ModuleIdentifier::regular("Main"),
      indoc! {r#"
        var dead = function () {
            return 0;
        };
        var alive = 1;
        module.exports = {
            alive: alive
        };
      "#},
    )
    .with_file_path("output/Main/index.js")]);

    let statement = *modules[0].elements[0].statement();
    modules[0].elements[0] = ModuleElement::Skip(statement);

    let options = BundleOptionsBuilder::default()
      .output_file("dist/bundle.js")
      .build();
    let output = generate(&modules, &options);

    assert_eq!(
      output.code,
      indoc! {r#"
        var PS = {};
        (function(exports) {
          var alive = 1;
          exports["alive"] = alive;
        })(PS["Main"] = PS["Main"] || {});
        //# sourceMappingURL=bundle.js.map
      "#}
    );

    let source_map = output.source_map.unwrap();
    assert_eq!(source_map.file, "bundle.js");
    assert_eq!(
      source_map
        .mappings
        .iter()
        .map(|mapping| (
          mapping.generated_line,
          mapping.original_line,
          mapping.source_file.as_str()
        ))
        .collect::<Vec<_>>(),
      vec![
        (2, 3, "../output/Main/index.js"),
        (3, 5, "../output/Main/index.js"),
      ]
    );
  }

  #[test]
  fn test_relative_source_path() {
    assert_eq!(
      relative_source_path(
        &PathBuf::from("output/Main/index.js"),
        &PathBuf::from("bundle.js")
      ),
      "output/Main/index.js"
    );
    assert_eq!(
      relative_source_path(
        &PathBuf::from("/project/output/Main/index.js"),
        &PathBuf::from("/project/dist/app.js")
      ),
      "../output/Main/index.js"
    );
  }

  #[test]
  fn test_comments_between_statements_are_kept() {
    let mut modules = load(&[ModuleInput::new(
      ModuleIdentifier::regular("Main"),
      indoc! {r#"
        #!/usr/bin/env node
        // Generated by the compiler
        "use strict";
        /**
         * Dead code
         */
        var dead = 0;
        var alive = 1; // trailing
        /* license
         * text */
        exports.x = alive;
        // end
      "#},
    )
    .with_file_path("output/Main/index.js")]);

    let statement = *modules[0].elements[1].statement();
    modules[0].elements[1] = ModuleElement::Skip(statement);

    let options = BundleOptionsBuilder::default().output_file("bundle.js").build();
    let output = generate(&modules, &options);

    assert_eq!(
      output.code,
      indoc! {r#"
        var PS = {};
        (function(exports) {
          // Generated by the compiler
          "use strict";
          var alive = 1;
          // trailing
          /* license
           * text */
          exports.x = alive;
          // end
        })(PS["Main"] = PS["Main"] || {});
        //# sourceMappingURL=bundle.js.map
      "#}
    );

    let original_lines = output
      .source_map
      .unwrap()
      .mappings
      .iter()
      .map(|mapping| mapping.original_line)
      .collect::<Vec<_>>();
    assert_eq!(original_lines, vec![1, 2, 7, 7, 8, 9, 10, 11]);
  }
}
