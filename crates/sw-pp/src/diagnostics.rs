use crate::token::Location;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PpErrorKind {
    #[error("macro redefined with a different body")]
    MacroRedefinitionMismatch,
    #[error("cannot undefine predefined macro `{0}`")]
    UndefPredefined(String),
    #[error("cannot undefine `{0}` while it is still expanding")]
    UndefWhileExpanding(String),
    #[error("macro names beginning with `GL_` are reserved")]
    ReservedMacroName,
    #[error("duplicate parameter name `{0}` in macro parameter list")]
    DuplicateParameterNames(String),
    #[error("`#version` must appear before any other token, on the first line")]
    VersionNotFirst,
    #[error("unsupported shader language version {0}")]
    UnsupportedVersion(u32),
    #[error("malformed `#{0}` directive")]
    MalformedDirective(&'static str),
    #[error("`#error`: {0}")]
    UserError(String),
    #[error("`#if`/`#elif` without matching `#endif`")]
    UnterminatedConditional,
    #[error("`#else`/`#elif`/`#endif` without matching `#if`")]
    UnmatchedConditional,
    #[error("double-underscore identifier `{0}` is reserved for future use")]
    DoubleUnderscoreReserved(String),
    #[error("unrecognized extension `{0}`")]
    UnknownExtension(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub loc: Location,
    pub severity: Severity,
    pub kind: PpErrorKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sev = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}: {}", self.loc, sev, self.kind)
    }
}

/// Decouples the preprocessor (and later stages) from how diagnostics are
/// surfaced. Errors do not abort a run: tokens are still forwarded so that
/// downstream messages remain localized to real source positions.
pub trait DiagnosticSink {
    fn report(&mut self, diag: Diagnostic);

    fn error(&mut self, loc: Location, kind: PpErrorKind) {
        self.report(Diagnostic { loc, severity: Severity::Error, kind });
    }

    fn warn(&mut self, loc: Location, kind: PpErrorKind) {
        self.report(Diagnostic { loc, severity: Severity::Warning, kind });
    }
}

#[derive(Debug, Default)]
pub struct VecDiagnosticSink(pub Vec<Diagnostic>);

impl DiagnosticSink for VecDiagnosticSink {
    fn report(&mut self, diag: Diagnostic) {
        self.0.push(diag);
    }
}

impl VecDiagnosticSink {
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }
}
