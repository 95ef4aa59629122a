use sw_pp::token::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemaErrorKind {
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("unexpected end of shader")]
    UnexpectedEof,
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("undeclared identifier `{0}`")]
    UndeclaredIdentifier(String),
    #[error("redefinition of `{0}` in the same scope")]
    Redefinition(String),
    #[error("sampler values are not assignable")]
    SamplerNotAssignable,
    #[error("sampler values may not appear in arithmetic expressions")]
    SamplerNotArithmetic,
    #[error("array index must be a constant expression")]
    NonConstantArrayIndex,
    #[error("no overload of `{0}` matches the given argument types")]
    NoMatchingOverload(String),
    #[error("call to `{0}` passes the enclosing loop index by `out`/`inout`")]
    LoopIndexByReference(String),
    #[error("loop does not match the accepted `for` loop form")]
    UnsupportedLoopForm,
    #[error("loop body assigns to the loop index `{0}`")]
    LoopIndexAssignedInBody(String),
    #[error("type mismatch: expected `{0}`, found `{1}`")]
    TypeMismatch(String, String),
    #[error("`{0}` cannot be used outside a loop")]
    ControlFlowOutsideLoop(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub loc: Location,
    pub severity: Severity,
    pub kind: SemaErrorKind,
}

pub trait DiagnosticSink {
    fn report(&mut self, diag: Diagnostic);

    fn error(&mut self, loc: Location, kind: SemaErrorKind) {
        self.report(Diagnostic { loc, severity: Severity::Error, kind });
    }

    fn warn(&mut self, loc: Location, kind: SemaErrorKind) {
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
