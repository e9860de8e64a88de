use std::ops::Range;

use swc_core::common::input::StringInput;
use swc_core::common::sync::Lrc;
use swc_core::common::{BytePos, FileName, SourceMap, Span, Spanned};
use swc_core::ecma::ast::{ModuleItem, Program, Script};
use swc_core::ecma::parser::error::Error as SwcError;
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::Parser;

/// A script parsed by SWC.
///
/// SWC positions are relative to the source map the file was registered in, so the start
/// position of the file is kept around to translate spans back into byte offsets of the
/// original text. SWC also drops a leading byte order mark before lexing, which shifts every
/// position by the length of the mark.
pub struct ParsedScript {
  pub script: Script,
  origin: TextOrigin,
}

impl ParsedScript {
  /// Byte offset of `pos` within the parsed source text
  pub fn offset(&self, pos: BytePos) -> usize {
    self.origin.offset(pos)
  }

  /// Byte range of `span` within the parsed source text
  pub fn range(&self, span: Span) -> Range<usize> {
    self.offset(span.lo)..self.offset(span.hi)
  }
}

/// Where the text handed to `parse_script` starts in SWC positions.
#[derive(Clone, Copy, Debug)]
struct TextOrigin {
  start_pos: BytePos,
  bom_len: usize,
}

impl TextOrigin {
  fn new(code: &str, start_pos: BytePos) -> Self {
    let bom_len = if code.starts_with(BYTE_ORDER_MARK) {
      BYTE_ORDER_MARK.len_utf8()
    } else {
      0
    };

    Self { start_pos, bom_len }
  }

  fn offset(&self, pos: BytePos) -> usize {
    pos.0.saturating_sub(self.start_pos.0) as usize + self.bom_len
  }
}

const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Debug, thiserror::Error)]
pub enum ParseScriptError {
  #[error("{message}")]
  SwcParse { message: String, offset: usize },
  #[error("Expected a list of statements but found ES module declarations")]
  ModuleDeclarations,
}

impl ParseScriptError {
  fn from_swc(error: SwcError, origin: TextOrigin) -> Self {
    ParseScriptError::SwcParse {
      message: error.kind().msg().to_string(),
      offset: origin.offset(error.span().lo),
    }
  }
}

/// Parse `code` as a classic (non ES module) script.
///
/// Any recoverable error reported by the parser is treated as fatal. Sources containing
/// `import`/`export` declarations are rejected with [`ParseScriptError::ModuleDeclarations`].
pub fn parse_script(code: &str) -> Result<ParsedScript, ParseScriptError> {
  let source_map = Lrc::new(SourceMap::default());
  let source_file = source_map.new_source_file(Lrc::new(FileName::Anon), code.into());
  let origin = TextOrigin::new(code, source_file.start_pos);

  let lexer = Lexer::new(
    Default::default(),
    Default::default(),
    StringInput::from(&*source_file),
    None,
  );

  let mut parser = Parser::new_from(lexer);
  let program = parser
    .parse_program()
    .map_err(|error| ParseScriptError::from_swc(error, origin))?;

  if let Some(error) = parser.take_errors().into_iter().next() {
    return Err(ParseScriptError::from_swc(error, origin));
  }

  let script = match program {
    Program::Script(script) => script,
    Program::Module(module) => {
      let mut body = Vec::with_capacity(module.body.len());
      for item in module.body {
        match item {
          ModuleItem::Stmt(stmt) => body.push(stmt),
          ModuleItem::ModuleDecl(_) => return Err(ParseScriptError::ModuleDeclarations),
        }
      }

      Script {
        span: module.span,
        body,
        shebang: module.shebang,
      }
    }
  };

  tracing::trace!(statements = script.body.len(), "Parsed script");

  Ok(ParsedScript { script, origin })
}
