//! Parses a preprocessed GLSL ES token stream into a typed AST: symbol
//! resolution, loop-form validation, and function-overload resolution all
//! happen here so the IR lowerer in `sw-shader-ir` only ever sees code that
//! is already known to be well-typed.

pub mod ast;
pub mod builtins;
pub mod diagnostics;
mod parser;
mod semantic;
pub mod symbol;
pub mod types;

use ast::TranslationUnit;
use diagnostics::DiagnosticSink;
use sw_pp::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

pub fn parse_and_analyze(
    tokens: &[Token],
    stage: ShaderStage,
    sink: &mut impl DiagnosticSink,
) -> TranslationUnit {
    let mut parser = parser::Parser::new(tokens, sink);
    let mut unit = parser.parse_translation_unit();
    let mut analyzer = semantic::Analyzer::new(stage == ShaderStage::Vertex, sink);
    analyzer.analyze(&mut unit);
    unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagnostics::VecDiagnosticSink;
    use sw_pp::Preprocessor;

    fn compile(src: &str, stage: ShaderStage) -> (TranslationUnit, VecDiagnosticSink) {
        let mut pp = Preprocessor::new();
        let mut pp_sink = sw_pp::diagnostics::VecDiagnosticSink::default();
        let result = pp.preprocess(&[src], &mut pp_sink);
        assert!(!pp_sink.has_errors(), "{:?}", pp_sink.0);
        let mut sink = VecDiagnosticSink::default();
        let unit = parse_and_analyze(&result.tokens, stage, &mut sink);
        (unit, sink)
    }

    #[test]
    fn parses_simple_fragment_shader() {
        let src = "precision mediump float;\nuniform sampler2D tex;\nvarying vec2 uv;\nvoid main() {\n  gl_FragColor = texture2D(tex, uv);\n}\n";
        let (unit, sink) = compile(src, ShaderStage::Fragment);
        assert!(!sink.has_errors(), "{:?}", sink.0);
        assert_eq!(unit.functions.len(), 1);
        assert_eq!(unit.functions[0].name, "main");
    }

    #[test]
    fn rejects_sampler_in_arithmetic() {
        let src = "uniform sampler2D tex;\nvoid main() {\n  float x = tex + 1.0;\n}\n";
        let (_unit, sink) = compile(src, ShaderStage::Fragment);
        assert!(sink.0.iter().any(|d| matches!(d.kind, diagnostics::SemaErrorKind::SamplerNotArithmetic)));
    }

    #[test]
    fn accepts_unrolled_loop_form() {
        let src = "void main() {\n  for (int i = 0; i < 4; i++) {\n    float x = float(i);\n  }\n}\n";
        let (_unit, sink) = compile(src, ShaderStage::Vertex);
        assert!(!sink.has_errors(), "{:?}", sink.0);
    }

    #[test]
    fn rejects_loop_body_assigning_index() {
        let src = "void main() {\n  for (int i = 0; i < 4; i++) {\n    i = 2;\n  }\n}\n";
        let (_unit, sink) = compile(src, ShaderStage::Vertex);
        assert!(sink.0.iter().any(|d| matches!(d.kind, diagnostics::SemaErrorKind::LoopIndexAssignedInBody(_))));
    }

    #[test]
    fn rejects_undeclared_identifier() {
        let src = "void main() {\n  float x = y;\n}\n";
        let (_unit, sink) = compile(src, ShaderStage::Fragment);
        assert!(sink.0.iter().any(|d| matches!(d.kind, diagnostics::SemaErrorKind::UndeclaredIdentifier(_))));
    }
}
