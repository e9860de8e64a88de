pub mod runner;

pub use runner::{parse_script, ParseScriptError, ParsedScript};
