use crate::diagnostics::{DiagnosticSink, PpErrorKind};
use crate::token::{Location, Token};
use std::cell::Cell;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKind {
    Object,
    Function,
}

/// A single macro table entry.
///
/// `expansion_count` is a `Cell` because the table hands out shared
/// references to entries while the expanding lexer is recursively expanding
/// other macros; it is incremented for the duration of one expansion and
/// decremented afterwards, guarding against `#undef` of a macro that is
/// currently being expanded (directly or through a chain of other macros)
/// and against infinite self-recursion.
#[derive(Debug)]
pub struct Macro {
    pub name: String,
    pub kind: MacroKind,
    pub parameters: Vec<String>,
    pub replacement: Vec<Token>,
    pub predefined: bool,
    pub expansion_count: Cell<u32>,
}

impl Macro {
    fn body_equals(&self, other: &Macro) -> bool {
        self.kind == other.kind
            && self.parameters == other.parameters
            && self.replacement.len() == other.replacement.len()
            && self
                .replacement
                .iter()
                .zip(other.replacement.iter())
                .all(|(a, b)| a.kind == b.kind && a.text == b.text)
    }
}

#[derive(Default)]
pub struct MacroTable {
    macros: HashMap<String, Macro>,
}

impl MacroTable {
    pub fn new() -> MacroTable {
        MacroTable::default()
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    /// Registers a macro, enforcing the invariants in the data model:
    /// `GL_`-prefixed names are reserved, predefined macros cannot be
    /// redefined, and redefinition to a token-for-token-identical body is
    /// silently accepted while any other redefinition is an error and the
    /// existing entry is kept.
    pub fn define(&mut self, candidate: Macro, loc: Location, sink: &mut impl DiagnosticSink) {
        if candidate.name.starts_with("GL_") {
            sink.error(loc, PpErrorKind::ReservedMacroName);
            return;
        }
        if has_duplicate_parameter(&candidate.parameters) {
            let dup = first_duplicate(&candidate.parameters).unwrap_or_default();
            sink.error(loc, PpErrorKind::DuplicateParameterNames(dup));
            return;
        }
        if candidate.name.starts_with("__") || candidate.name.contains("__") {
            sink.warn(loc, PpErrorKind::DoubleUnderscoreReserved(candidate.name.clone()));
        }

        if let Some(existing) = self.macros.get(&candidate.name) {
            if existing.predefined {
                sink.error(loc, PpErrorKind::ReservedMacroName);
                return;
            }
            if !existing.body_equals(&candidate) {
                sink.error(loc, PpErrorKind::MacroRedefinitionMismatch);
                return;
            }
            // Identical redefinition: silently accepted, keep the old entry
            // (and its possibly-nonzero expansion_count) in place.
            return;
        }

        self.macros.insert(candidate.name.clone(), candidate);
    }

    pub fn undef(&mut self, name: &str, loc: Location, sink: &mut impl DiagnosticSink) {
        match self.macros.get(name) {
            None => {} // #undef of an unknown name is a silent no-op per the GLSL spec.
            Some(m) if m.predefined => {
                sink.error(loc, PpErrorKind::UndefPredefined(name.to_string()));
            }
            Some(m) if m.expansion_count.get() > 0 => {
                sink.error(loc, PpErrorKind::UndefWhileExpanding(name.to_string()));
            }
            Some(_) => {
                self.macros.remove(name);
            }
        }
    }

    pub fn define_predefined(&mut self, name: &str, value: &str) {
        use crate::token::{TokenFlags, TokenKind};
        let replacement = if value.is_empty() {
            vec![]
        } else {
            vec![Token::new(TokenKind::IntConstant, value, Location::new(0, 0), TokenFlags::empty())]
        };
        self.macros.insert(
            name.to_string(),
            Macro {
                name: name.to_string(),
                kind: MacroKind::Object,
                parameters: vec![],
                replacement,
                predefined: true,
                expansion_count: Cell::new(0),
            },
        );
    }
}

fn has_duplicate_parameter(params: &[String]) -> bool {
    first_duplicate(params).is_some()
}

fn first_duplicate(params: &[String]) -> Option<String> {
    for i in 0..params.len() {
        for j in (i + 1)..params.len() {
            if params[i] == params[j] {
                return Some(params[i].clone());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::VecDiagnosticSink;

    fn loc() -> Location {
        Location::new(0, 1)
    }

    #[test]
    fn rejects_duplicate_parameter_names() {
        let mut table = MacroTable::new();
        let mut sink = VecDiagnosticSink::default();
        let m = Macro {
            name: "A".into(),
            kind: MacroKind::Function,
            parameters: vec!["x".into(), "x".into()],
            replacement: vec![],
            predefined: false,
            expansion_count: Cell::new(0),
        };
        table.define(m, loc(), &mut sink);
        assert!(!table.is_defined("A"));
        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.0[0].kind, PpErrorKind::DuplicateParameterNames("x".into()));
    }

    #[test]
    fn redefinition_with_identical_body_is_silent() {
        let mut table = MacroTable::new();
        let mut sink = VecDiagnosticSink::default();
        let make = || Macro {
            name: "A".into(),
            kind: MacroKind::Object,
            parameters: vec![],
            replacement: vec![],
            predefined: false,
            expansion_count: Cell::new(0),
        };
        table.define(make(), loc(), &mut sink);
        table.define(make(), loc(), &mut sink);
        assert!(sink.0.is_empty());
    }

    #[test]
    fn redefinition_with_different_body_is_an_error() {
        use crate::token::{TokenFlags, TokenKind};
        let mut table = MacroTable::new();
        let mut sink = VecDiagnosticSink::default();
        table.define(
            Macro { name: "A".into(), kind: MacroKind::Object, parameters: vec![], replacement: vec![], predefined: false, expansion_count: Cell::new(0) },
            loc(),
            &mut sink,
        );
        table.define(
            Macro {
                name: "A".into(),
                kind: MacroKind::Object,
                parameters: vec![],
                replacement: vec![Token::new(TokenKind::IntConstant, "1", loc(), TokenFlags::empty())],
                predefined: false,
                expansion_count: Cell::new(0),
            },
            loc(),
            &mut sink,
        );
        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.0[0].kind, PpErrorKind::MacroRedefinitionMismatch);
    }

    #[test]
    fn cannot_undef_while_expanding() {
        let mut table = MacroTable::new();
        let mut sink = VecDiagnosticSink::default();
        table.define(
            Macro { name: "A".into(), kind: MacroKind::Object, parameters: vec![], replacement: vec![], predefined: false, expansion_count: Cell::new(1) },
            loc(),
            &mut sink,
        );
        table.undef("A", loc(), &mut sink);
        assert!(table.is_defined("A"));
        assert_eq!(sink.0[0].kind, PpErrorKind::UndefWhileExpanding("A".into()));
    }
}
