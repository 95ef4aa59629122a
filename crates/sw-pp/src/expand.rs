use crate::macros::{Macro, MacroKind, MacroTable};
use crate::token::{Token, TokenFlags, TokenKind};

/// Expands a flat token stream (already split into lines by the caller) with
/// respect to `table`, following the closed-form GLSL ES macro expansion
/// rules: function-like macros are recognized only when `(` immediately
/// follows the name with no leading whitespace; expansion is idempotent
/// after one fixed-point pass, since every expanded token is tagged
/// `EXPANDED` and a macro name token produced as the *result* of its own
/// expansion is never rescanned against the same macro (blue paint, applied
/// here via the `expansion_count` guard rather than a per-token paint set).
pub fn expand_line(table: &MacroTable, tokens: &[Token]) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    expand_into(table, tokens, &mut i, &mut out, 0);
    out
}

fn expand_into(table: &MacroTable, tokens: &[Token], i: &mut usize, out: &mut Vec<Token>, depth: u32) {
    const MAX_DEPTH: u32 = 4096;
    while *i < tokens.len() {
        let tok = &tokens[*i];
        if tok.kind != TokenKind::Identifier {
            out.push(tok.clone());
            *i += 1;
            continue;
        }

        let Some(m) = table.get(&tok.text) else {
            out.push(tok.clone());
            *i += 1;
            continue;
        };

        if m.expansion_count.get() > 0 {
            // Self-referential expansion: leave as a plain, non-expanding identifier.
            out.push(tok.clone());
            *i += 1;
            continue;
        }

        match m.kind {
            MacroKind::Object => {
                let leading = tok.flags.contains(TokenFlags::LEADING_SPACE);
                *i += 1;
                if depth < MAX_DEPTH {
                    expand_macro_body(table, m, &[], out, leading, depth);
                }
            }
            MacroKind::Function => {
                // Must be followed (possibly after whitespace, across the
                // remaining tokens of this logical line) by `(`.
                let mut j = *i + 1;
                while j < tokens.len() && tokens[j].kind == TokenKind::Newline {
                    j += 1;
                }
                if j >= tokens.len() || !tokens[j].is_punct("(") {
                    out.push(tok.clone());
                    *i += 1;
                    continue;
                }
                let leading = tok.flags.contains(TokenFlags::LEADING_SPACE);
                j += 1;
                let (args, after) = collect_arguments(tokens, j);
                *i = after;
                if depth < MAX_DEPTH {
                    let expanded_args: Vec<Vec<Token>> =
                        args.iter().map(|a| expand_line(table, a)).collect();
                    expand_macro_body(table, m, &expanded_args, out, leading, depth);
                }
            }
        }
    }
}

fn collect_arguments(tokens: &[Token], mut j: usize) -> (Vec<Vec<Token>>, usize) {
    let mut args = vec![Vec::new()];
    let mut depth = 0i32;
    while j < tokens.len() {
        let t = &tokens[j];
        if t.is_punct("(") {
            depth += 1;
            args.last_mut().unwrap().push(t.clone());
        } else if t.is_punct(")") {
            if depth == 0 {
                j += 1;
                break;
            }
            depth -= 1;
            args.last_mut().unwrap().push(t.clone());
        } else if t.is_punct(",") && depth == 0 {
            args.push(Vec::new());
        } else if t.kind != TokenKind::Newline {
            args.last_mut().unwrap().push(t.clone());
        }
        j += 1;
    }
    if args.len() == 1 && args[0].is_empty() {
        args.clear();
    }
    (args, j)
}

fn expand_macro_body(
    table: &MacroTable,
    m: &Macro,
    args: &[Vec<Token>],
    out: &mut Vec<Token>,
    first_leading_space: bool,
    depth: u32,
) {
    m.expansion_count.set(m.expansion_count.get() + 1);

    let mut substituted: Vec<Token> = Vec::with_capacity(m.replacement.len());
    for (idx, rt) in m.replacement.iter().enumerate() {
        if rt.kind == TokenKind::Identifier {
            if let Some(param_idx) = m.parameters.iter().position(|p| p == &rt.text) {
                if let Some(arg) = args.get(param_idx) {
                    for (k, at) in arg.iter().enumerate() {
                        let mut t = at.clone();
                        if k == 0 && idx == 0 {
                            t.flags.set(TokenFlags::LEADING_SPACE, false);
                        }
                        t.flags |= TokenFlags::EXPANDED;
                        substituted.push(t);
                    }
                    continue;
                }
            }
        }
        let mut t = rt.clone();
        if idx == 0 {
            // The leading-space flag of the first replacement token is
            // cleared; the macro invocation's own leading space wins instead.
            t.flags.set(TokenFlags::LEADING_SPACE, first_leading_space);
        }
        t.flags |= TokenFlags::EXPANDED;
        substituted.push(t);
    }

    // Rescan the substituted body so nested macro invocations expand too.
    let mut j = 0;
    expand_into(table, &substituted, &mut j, out, depth + 1);

    m.expansion_count.set(m.expansion_count.get() - 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::VecDiagnosticSink;
    use crate::lexer::{splice_continuations, Lexer};
    use crate::token::Location;
    use std::cell::Cell;

    fn define(table: &mut MacroTable, m: Macro) {
        let mut sink = VecDiagnosticSink::default();
        table.define(m, Location::new(0, 1), &mut sink);
        assert!(sink.0.is_empty(), "unexpected diagnostics: {:?}", sink.0);
    }

    fn lex_all(src: &str) -> Vec<Token> {
        let (text, lines) = splice_continuations(src, 0);
        let mut lx = Lexer::new(&text, &lines, 0);
        let mut out = Vec::new();
        loop {
            let t = lx.next_token();
            if t.is_eod() {
                break;
            }
            out.push(t);
        }
        out
    }

    fn object_macro(name: &str, body: &str) -> Macro {
        Macro {
            name: name.into(),
            kind: MacroKind::Object,
            parameters: vec![],
            replacement: lex_all(body),
            predefined: false,
            expansion_count: Cell::new(0),
        }
    }

    #[test]
    fn expands_object_macro() {
        let mut table = MacroTable::new();
        define(&mut table, object_macro("FOO", "1 + 2"));
        let toks = lex_all("FOO\n");
        let expanded = expand_line(&table, &toks);
        let text: Vec<_> = expanded.iter().filter(|t| t.kind != TokenKind::Newline).map(|t| t.text.clone()).collect();
        assert_eq!(text, vec!["1", "+", "2"]);
    }

    #[test]
    fn expands_function_macro_with_args() {
        let mut table = MacroTable::new();
        let m = Macro {
            name: "ADD".into(),
            kind: MacroKind::Function,
            parameters: vec!["a".into(), "b".into()],
            replacement: lex_all("(a) + (b)"),
            predefined: false,
            expansion_count: Cell::new(0),
        };
        define(&mut table, m);
        let toks = lex_all("ADD(1, 2)\n");
        let expanded = expand_line(&table, &toks);
        let text: Vec<_> = expanded.iter().filter(|t| t.kind != TokenKind::Newline).map(|t| t.text.clone()).collect();
        assert_eq!(text, vec!["(", "1", ")", "+", "(", "2", ")"]);
    }

    #[test]
    fn idempotent_after_one_fixed_point_pass() {
        let mut table = MacroTable::new();
        define(&mut table, object_macro("X", "Y"));
        define(&mut table, object_macro("Y", "1"));
        let toks = lex_all("X\n");
        let once = expand_line(&table, &toks);
        let twice = expand_line(&table, &once);
        let a: Vec<_> = once.iter().map(|t| t.text.clone()).collect();
        let b: Vec<_> = twice.iter().map(|t| t.text.clone()).collect();
        assert_eq!(a, b);
    }
}
