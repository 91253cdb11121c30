use std::collections::HashMap;
use std::convert::Infallible;
use std::path::Path;
use std::str::FromStr;

use crate::config::Config;
use crate::error::{Reason, TableError};
use crate::eval::{Scope, classify_with};
use crate::parser::LiteralParser;
use crate::source::logical_lines;
use crate::value::{LiteralValue, Verdict};

/// One `#define` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroEntry {
    pub identifier: String,
    pub body: String,
    /// Parameter names, for function-like macros
    pub params: Option<Vec<String>>,
    /// Physical line the definition starts on; 0 when not read from a file
    pub line: usize,
}

impl MacroEntry {
    pub fn new(identifier: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            body: body.into(),
            params: None,
            line: 0,
        }
    }

    pub fn is_function_like(&self) -> bool {
        self.params.is_some()
    }
}

/// Table of macro definitions and their verdicts, in definition order.
///
/// Bodies may name earlier definitions; those resolve to the earlier
/// definition's value.
#[derive(Debug, Default, Clone)]
pub struct MacroTable {
    entries: Vec<(MacroEntry, Verdict)>,
    index: HashMap<String, usize>,
    config: Config,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load every `#define` of a source text.
    /// Lines that are not `#define` directives are ignored.
    pub fn load(&mut self, source: &str) {
        for line in logical_lines(source) {
            let text = line.text.trim();
            let Some(directive) = text.strip_prefix('#') else {
                if !text.is_empty() {
                    log::trace!("line {}: skipping non-directive", line.number);
                }
                continue;
            };

            match LiteralParser::parse_define(text) {
                Ok(define) => {
                    self.define(MacroEntry {
                        identifier: define.name.to_owned(),
                        body: define.body.to_owned(),
                        params: define
                            .params
                            .map(|params| params.into_iter().map(str::to_owned).collect()),
                        line: line.number,
                    });
                }
                Err(e) if directive.trim_start().starts_with("define") => {
                    log::warn!("line {}: malformed #define: {}", line.number, e);
                }
                Err(_) => log::trace!("line {}: skipping directive", line.number),
            }
        }
    }

    /// Load macro definitions from a file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), TableError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load(&source);
        Ok(())
    }

    /// Classify and record a definition.
    ///
    /// A redefinition replaces the earlier entry but keeps its position.
    pub fn define(&mut self, entry: MacroEntry) -> &Verdict {
        let verdict = if entry.is_function_like() {
            Verdict::Invalid(Reason::ParameterizedMacro)
        } else {
            classify_with(self.config, &entry.body, self)
        };
        match &verdict {
            Verdict::Valid(value) => log::debug!("{} = {:?}", entry.identifier, value),
            Verdict::Invalid(reason) => log::debug!("{} is invalid: {}", entry.identifier, reason),
        }

        let existing = self.index.get(&entry.identifier).copied();
        let pos = match existing {
            Some(pos) => {
                log::warn!(
                    "line {}: redefinition of {} (first defined on line {})",
                    entry.line,
                    entry.identifier,
                    self.entries[pos].0.line
                );
                self.entries[pos] = (entry, verdict);
                pos
            }
            None => {
                self.index.insert(entry.identifier.clone(), self.entries.len());
                self.entries.push((entry, verdict));
                self.entries.len() - 1
            }
        };
        &self.entries[pos].1
    }

    /// Get the verdict of a definition
    pub fn get(&self, ident: &str) -> Option<&Verdict> {
        self.index.get(ident).map(|&pos| &self.entries[pos].1)
    }

    /// Get the value of a valid definition
    pub fn value(&self, ident: &str) -> Option<&LiteralValue> {
        self.get(ident).and_then(Verdict::value)
    }

    pub fn entry(&self, ident: &str) -> Option<&MacroEntry> {
        self.index.get(ident).map(|&pos| &self.entries[pos].0)
    }

    /// Check if a macro is defined, whether or not it is valid
    pub fn is_defined(&self, ident: &str) -> bool {
        self.index.contains_key(ident)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in definition order
    pub fn iter(&self) -> impl Iterator<Item = (&MacroEntry, &Verdict)> {
        self.entries.iter().map(|(entry, verdict)| (entry, verdict))
    }
}

impl Scope for MacroTable {
    fn lookup(&self, ident: &str) -> Option<&LiteralValue> {
        self.value(ident)
    }
}

impl FromStr for MacroTable {
    type Err = Infallible;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let mut table = MacroTable::new();
        table.load(source);
        Ok(table)
    }
}
