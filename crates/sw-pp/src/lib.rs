//! GLSL ES preprocessor: line-continuation splicing, tokenization, macro
//! definition/expansion, and `#if`/`#elif` conditional-compilation
//! evaluation. Produces a flat token stream for the parser (`sw-glsl`); it
//! never re-serializes to text, since nothing downstream of this crate
//! consumes GLSL source text again.

pub mod diagnostics;
pub mod directive;
mod expand;
mod expr;
mod lexer;
pub mod macros;
pub mod token;

use diagnostics::{DiagnosticSink, PpErrorKind};
use directive::{ConditionalKind, ConditionalStack};
use expand::expand_line;
use lexer::{splice_continuations, Lexer};
use macros::{Macro, MacroKind, MacroTable};
use std::cell::Cell;
use token::{Location, Token, TokenFlags, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionBehavior {
    Require,
    Enable,
    Warn,
    Disable,
}

const KNOWN_EXTENSIONS: &[&str] = &[
    "GL_OES_standard_derivatives",
    "GL_EXT_shader_texture_lod",
    "GL_EXT_frag_depth",
    "GL_OES_texture_3D",
    "GL_EXT_draw_buffers",
];

pub struct PreprocessResult {
    pub tokens: Vec<Token>,
    pub version: u32,
    pub is_es_profile: bool,
    pub extensions: Vec<(String, ExtensionBehavior)>,
}

pub struct Preprocessor {
    table: MacroTable,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor {
    pub fn new() -> Preprocessor {
        let mut table = MacroTable::new();
        table.define_predefined("GL_ES", "1");
        table.define_predefined("__LINE__", "0");
        table.define_predefined("__FILE__", "0");
        table.define_predefined("__VERSION__", "100");
        Preprocessor { table }
    }

    pub fn define_macro(&mut self, name: &str, value: &str, sink: &mut impl DiagnosticSink) {
        let replacement = if value.is_empty() {
            vec![]
        } else {
            let (text, lines) = splice_continuations(value, u32::MAX);
            let mut lx = Lexer::new(&text, &lines, u32::MAX);
            let mut toks = Vec::new();
            loop {
                let t = lx.next_token();
                if t.is_eod() || t.kind == TokenKind::Newline {
                    break;
                }
                toks.push(t);
            }
            toks
        };
        self.table.define(
            Macro {
                name: name.to_string(),
                kind: MacroKind::Object,
                parameters: vec![],
                replacement,
                predefined: false,
                expansion_count: Cell::new(0),
            },
            Location::new(0, 0),
            sink,
        );
    }

    /// Preprocesses a concatenated translation unit made of one or more
    /// source strings (mirroring the `(const char *const *, const int *)`
    /// entry point in the external interface), returning the fully expanded
    /// token stream plus the directives that influence downstream stages.
    pub fn preprocess(&mut self, sources: &[&str], sink: &mut impl DiagnosticSink) -> PreprocessResult {
        let mut out_tokens = Vec::new();
        let mut version: u32 = 100;
        let mut is_es_profile = false;
        let mut version_seen = false;
        let mut extensions = Vec::new();
        let mut cond_stack = ConditionalStack::default();
        let mut any_real_token_seen = false;

        for (file_id, src) in sources.iter().enumerate() {
            let file_id = file_id as u32;
            let (text, lines) = splice_continuations(src, file_id);
            let mut lx = Lexer::new(&text, &lines, file_id);

            let mut line_tokens: Vec<Token> = Vec::new();
            let mut first_line_of_first_file = file_id == 0;
            let mut is_first_line = true;

            loop {
                let t = lx.next_token();
                let is_end = t.is_eod() || t.kind == TokenKind::Newline;
                if !is_end {
                    line_tokens.push(t);
                    continue;
                }
                let eod = t.is_eod();

                process_line(
                    &line_tokens,
                    &mut self.table,
                    &mut cond_stack,
                    &mut out_tokens,
                    &mut version,
                    &mut is_es_profile,
                    &mut version_seen,
                    &mut extensions,
                    &mut any_real_token_seen,
                    first_line_of_first_file && is_first_line,
                    sink,
                );

                line_tokens.clear();
                is_first_line = false;
                first_line_of_first_file = file_id == 0;
                if eod {
                    break;
                }
            }
        }

        if cond_stack.depth() != 0 {
            sink.error(Location::new(0, 0), PpErrorKind::UnterminatedConditional);
        }

        PreprocessResult { tokens: out_tokens, version, is_es_profile, extensions }
    }
}

#[allow(clippy::too_many_arguments)]
fn process_line(
    line: &[Token],
    table: &mut MacroTable,
    cond_stack: &mut ConditionalStack,
    out: &mut Vec<Token>,
    version: &mut u32,
    is_es_profile: &mut bool,
    version_seen: &mut bool,
    extensions: &mut Vec<(String, ExtensionBehavior)>,
    any_real_token_seen: &mut bool,
    is_very_first_line: bool,
    sink: &mut impl DiagnosticSink,
) {
    if line.is_empty() {
        return;
    }

    let loc = line[0].loc;

    if line[0].is_punct("#") {
        let rest = &line[1..];
        let Some(directive) = rest.first() else {
            return; // bare `#` on a line is a legal null directive.
        };
        let args = &rest[1..];

        match directive.text.as_str() {
            "define" => {
                if !cond_stack.is_active() {
                    return;
                }
                define_directive(table, args, loc, sink);
            }
            "undef" => {
                if !cond_stack.is_active() {
                    return;
                }
                if let Some(name) = args.first() {
                    table.undef(&name.text, loc, sink);
                } else {
                    sink.error(loc, PpErrorKind::MalformedDirective("undef"));
                }
            }
            "ifdef" | "ifndef" => {
                let parent_active = cond_stack.is_active();
                let taken = if parent_active {
                    let defined = args.first().map(|t| table.is_defined(&t.text)).unwrap_or(false);
                    if directive.text == "ifdef" { defined } else { !defined }
                } else {
                    false
                };
                cond_stack.push(
                    if directive.text == "ifdef" { ConditionalKind::Ifdef } else { ConditionalKind::Ifndef },
                    taken,
                );
            }
            "if" => {
                let parent_active = cond_stack.is_active();
                let taken = parent_active && expr::eval_condition(table, args, loc, sink) != 0;
                cond_stack.push(ConditionalKind::If, taken);
            }
            "elif" => {
                if cond_stack.depth() == 0 {
                    sink.error(loc, PpErrorKind::UnmatchedConditional);
                    return;
                }
                // An elif whose conditional already took a group must NOT
                // evaluate its expression (e.g. to avoid spurious errors
                // from a divide-by-zero in a branch that can't be reached).
                let needs_eval = !cond_stack.innermost_found_valid_group();
                let taken = if needs_eval {
                    expr::eval_condition(table, args, loc, sink) != 0
                } else {
                    false
                };
                if !cond_stack.enter_elif(taken) {
                    sink.error(loc, PpErrorKind::MalformedDirective("elif"));
                }
            }
            "else" => {
                if !cond_stack.enter_else() {
                    sink.error(loc, PpErrorKind::UnmatchedConditional);
                }
            }
            "endif" => {
                if !cond_stack.pop() {
                    sink.error(loc, PpErrorKind::UnmatchedConditional);
                }
            }
            "error" => {
                if cond_stack.is_active() {
                    let msg = args.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ");
                    sink.error(loc, PpErrorKind::UserError(msg));
                }
            }
            "pragma" => { /* STDGL / vendor pragmas: accepted, not semantically interpreted here. */ }
            "extension" => {
                if cond_stack.is_active() {
                    parse_extension_directive(args, loc, extensions, sink);
                }
            }
            "version" => {
                if !is_very_first_line || *any_real_token_seen {
                    sink.error(loc, PpErrorKind::VersionNotFirst);
                }
                parse_version_directive(args, loc, version, is_es_profile, version_seen, sink);
            }
            "line" => {
                if cond_stack.is_active() && args.is_empty() {
                    sink.error(loc, PpErrorKind::MalformedDirective("line"));
                }
            }
            _ => {
                sink.error(loc, PpErrorKind::MalformedDirective("unknown"));
            }
        }
        return;
    }

    if !cond_stack.is_active() {
        return;
    }

    *any_real_token_seen = true;
    let expanded = expand_line(table, line);
    out.extend(expanded);
    out.push(Token::new(TokenKind::Newline, "\n", loc, TokenFlags::empty()));
}

fn define_directive(table: &mut MacroTable, tokens: &[Token], loc: Location, sink: &mut impl DiagnosticSink) {
    let Some(name_tok) = tokens.first() else {
        sink.error(loc, PpErrorKind::MalformedDirective("define"));
        return;
    };
    if name_tok.kind != TokenKind::Identifier {
        sink.error(loc, PpErrorKind::MalformedDirective("define"));
        return;
    }
    let name = name_tok.text.clone();

    // Function-like iff `(` immediately follows the name with no
    // intervening whitespace.
    let is_function_like =
        tokens.get(1).map(|t| t.is_punct("(") && !t.has_leading_space()).unwrap_or(false);

    let (parameters, body_start) = if is_function_like {
        let mut params = Vec::new();
        let mut i = 2usize;
        if tokens.get(i).map(|t| t.is_punct(")")).unwrap_or(false) {
            i += 1;
        } else {
            loop {
                match tokens.get(i) {
                    Some(t) if t.kind == TokenKind::Identifier => {
                        params.push(t.text.clone());
                        i += 1;
                    }
                    _ => {
                        sink.error(loc, PpErrorKind::MalformedDirective("define"));
                        return;
                    }
                }
                match tokens.get(i) {
                    Some(t) if t.is_punct(",") => {
                        i += 1;
                    }
                    Some(t) if t.is_punct(")") => {
                        i += 1;
                        break;
                    }
                    _ => {
                        sink.error(loc, PpErrorKind::MalformedDirective("define"));
                        return;
                    }
                }
            }
        }
        (params, i)
    } else {
        (Vec::new(), 1)
    };

    let mut replacement: Vec<Token> = tokens[body_start.min(tokens.len())..].to_vec();
    if let Some(first) = replacement.first_mut() {
        first.flags.set(TokenFlags::LEADING_SPACE, false);
    }

    table.define(
        Macro { name, kind: if is_function_like { MacroKind::Function } else { MacroKind::Object }, parameters, replacement, predefined: false, expansion_count: Cell::new(0) },
        loc,
        sink,
    );
}

fn parse_version_directive(
    tokens: &[Token],
    loc: Location,
    version: &mut u32,
    is_es_profile: &mut bool,
    version_seen: &mut bool,
    sink: &mut impl DiagnosticSink,
) {
    let Some(num_tok) = tokens.first() else {
        sink.error(loc, PpErrorKind::MalformedDirective("version"));
        return;
    };
    let Ok(ver) = num_tok.text.parse::<u32>() else {
        sink.error(loc, PpErrorKind::MalformedDirective("version"));
        return;
    };
    let es_tok = tokens.get(1).map(|t| t.is_ident("es")).unwrap_or(false);
    if ver >= 300 && !es_tok {
        sink.error(loc, PpErrorKind::MalformedDirective("version"));
    }
    if !matches!(ver, 100 | 300 | 310 | 320) {
        sink.error(loc, PpErrorKind::UnsupportedVersion(ver));
    } else if ver > 300 {
        // ES 3.0 is the supported ceiling per the purpose & scope; newer
        // profile numbers are recognized (so the diagnostic is precise)
        // but rejected.
        sink.error(loc, PpErrorKind::UnsupportedVersion(ver));
    }
    *version = ver;
    *is_es_profile = es_tok || ver >= 300;
    *version_seen = true;
}

fn parse_extension_directive(
    tokens: &[Token],
    loc: Location,
    extensions: &mut Vec<(String, ExtensionBehavior)>,
    sink: &mut impl DiagnosticSink,
) {
    let Some(name_tok) = tokens.first() else {
        sink.error(loc, PpErrorKind::MalformedDirective("extension"));
        return;
    };
    let name = name_tok.text.clone();
    let Some(colon) = tokens.get(1) else {
        sink.error(loc, PpErrorKind::MalformedDirective("extension"));
        return;
    };
    if !colon.is_punct(":") {
        sink.error(loc, PpErrorKind::MalformedDirective("extension"));
        return;
    }
    let Some(behavior_tok) = tokens.get(2) else {
        sink.error(loc, PpErrorKind::MalformedDirective("extension"));
        return;
    };
    let behavior = match behavior_tok.text.as_str() {
        "require" => ExtensionBehavior::Require,
        "enable" => ExtensionBehavior::Enable,
        "warn" => ExtensionBehavior::Warn,
        "disable" => ExtensionBehavior::Disable,
        _ => {
            sink.error(loc, PpErrorKind::MalformedDirective("extension"));
            return;
        }
    };
    if name != "all" && !KNOWN_EXTENSIONS.contains(&name.as_str()) {
        sink.warn(loc, PpErrorKind::UnknownExtension(name.clone()));
    }
    extensions.push((name, behavior));
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagnostics::VecDiagnosticSink;

    fn pp(sources: &[&str]) -> (PreprocessResult, VecDiagnosticSink) {
        let mut pp = Preprocessor::new();
        let mut sink = VecDiagnosticSink::default();
        let result = pp.preprocess(sources, &mut sink);
        (result, sink)
    }

    #[test]
    fn version_300_es_on_line_one_is_accepted() {
        let (result, sink) = pp(&["#version 300 es\nvoid main(){}\n"]);
        assert!(!sink.has_errors(), "{:?}", sink.0);
        assert_eq!(result.version, 300);
        assert!(result.is_es_profile);
    }

    #[test]
    fn version_310_es_is_unsupported() {
        let (_result, sink) = pp(&["#version 310 es\n"]);
        assert!(sink
            .0
            .iter()
            .any(|d| matches!(d.kind, PpErrorKind::UnsupportedVersion(310))));
    }

    #[test]
    fn duplicate_macro_parameter_names_rejected() {
        let (result, sink) = pp(&["#define A(x,x) x\nA(1)\n"]);
        assert!(sink
            .0
            .iter()
            .any(|d| matches!(&d.kind, PpErrorKind::DuplicateParameterNames(p) if p == "x")));
        // Macro was never registered: `A` is left unexpanded.
        let texts: Vec<_> = result.tokens.iter().map(|t| t.text.as_str()).collect();
        assert!(texts.contains(&"A"));
    }

    #[test]
    fn running_twice_is_idempotent_modulo_location() {
        let (first, sink1) = pp(&["#version 100\n#define N 4\nfor (int i = 0; i < N; i++) {}\n"]);
        assert!(!sink1.has_errors());
        let rejoined: String =
            first.tokens.iter().map(|t| if t.kind == TokenKind::Newline { "\n".to_string() } else { format!("{} ", t.text) }).collect();
        let (second, sink2) = pp(&[&rejoined]);
        assert!(!sink2.has_errors());
        let k1: Vec<_> = first.tokens.iter().map(|t| t.kind).collect();
        let k2: Vec<_> = second.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(k1, k2);
    }

    #[test]
    fn elif_after_true_branch_not_evaluated() {
        let (result, sink) = pp(&[
            "#if 1\nA\n#elif UNDEFINED_MACRO_USED_AS_DIVISOR\nB\n#else\nC\n#endif\n",
        ]);
        assert!(!sink.has_errors());
        let texts: Vec<_> = result.tokens.iter().map(|t| t.text.as_str()).filter(|t| *t != "\n").collect();
        assert_eq!(texts, vec!["A"]);
    }
}
