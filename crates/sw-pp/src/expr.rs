use crate::diagnostics::{DiagnosticSink, PpErrorKind};
use crate::expand::expand_line;
use crate::macros::MacroTable;
use crate::token::{Location, Token, TokenKind};

/// Evaluates a `#if`/`#elif` controlling expression: a `defined(X)` /
/// `defined X` form is recognized *before* macro expansion (so that `X`
/// itself is never expanded), everything else is macro-expanded and then
/// parsed as an integer expression by a small recursive-descent parser.
pub fn eval_condition(
    table: &MacroTable,
    tokens: &[Token],
    loc: Location,
    sink: &mut impl DiagnosticSink,
) -> i64 {
    let substituted = substitute_defined(table, tokens);
    let expanded = expand_line(table, &substituted);
    let filtered: Vec<Token> =
        expanded.into_iter().filter(|t| t.kind != TokenKind::Newline).collect();
    let mut parser = ExprParser { tokens: &filtered, pos: 0, loc, sink };
    let value = parser.parse_conditional();
    if parser.pos != filtered.len() {
        sink.error(loc, PpErrorKind::MalformedDirective("if"));
    }
    value
}

/// Replaces `defined(NAME)` / `defined NAME` with a literal `0`/`1` token,
/// scanning left to right over the un-expanded token list.
fn substitute_defined(table: &MacroTable, tokens: &[Token]) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_ident("defined") {
            let mut j = i + 1;
            let has_paren = j < tokens.len() && tokens[j].is_punct("(");
            if has_paren {
                j += 1;
            }
            if j < tokens.len() && tokens[j].kind == TokenKind::Identifier {
                let name = tokens[j].text.clone();
                let mut end = j + 1;
                if has_paren {
                    if end < tokens.len() && tokens[end].is_punct(")") {
                        end += 1;
                    }
                }
                let defined = table.is_defined(&name);
                out.push(Token::new(
                    TokenKind::IntConstant,
                    if defined { "1" } else { "0" },
                    tokens[i].loc,
                    tokens[i].flags,
                ));
                i = end;
                continue;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

struct ExprParser<'a, S: DiagnosticSink> {
    tokens: &'a [Token],
    pos: usize,
    loc: Location,
    sink: &'a mut S,
}

impl<'a, S: DiagnosticSink> ExprParser<'a, S> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        self.pos += 1;
        t
    }

    fn eat_punct(&mut self, s: &str) -> bool {
        if self.peek().map(|t| t.is_punct(s)).unwrap_or(false) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_conditional(&mut self) -> i64 {
        self.parse_binary(0)
    }

    // Precedence-climbing over the standard C integer-expression operators
    // that matter for `#if`: `||`, `&&`, `|`, `^`, `&`, `==`/`!=`,
    // relational, shifts, additive, multiplicative, unary.
    fn parse_binary(&mut self, min_prec: u8) -> i64 {
        let mut lhs = self.parse_unary();
        loop {
            let Some((op, prec, right_assoc)) = self.peek_binop() else { break };
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let next_min = if right_assoc { prec } else { prec + 1 };
            let rhs = self.parse_binary(next_min);
            lhs = apply_binop(op, lhs, rhs);
        }
        lhs
    }

    fn peek_binop(&self) -> Option<(&'static str, u8, bool)> {
        let t = self.peek()?;
        if t.kind != TokenKind::Punctuator {
            return None;
        }
        Some(match t.text.as_str() {
            "||" => ("||", 1, false),
            "&&" => ("&&", 2, false),
            "|" => ("|", 3, false),
            "^" => ("^", 4, false),
            "&" => ("&", 5, false),
            "==" => ("==", 6, false),
            "!=" => ("!=", 6, false),
            "<" => ("<", 7, false),
            ">" => (">", 7, false),
            "<=" => ("<=", 7, false),
            ">=" => (">=", 7, false),
            "<<" => ("<<", 8, false),
            ">>" => (">>", 8, false),
            "+" => ("+", 9, false),
            "-" => ("-", 9, false),
            "*" => ("*", 10, false),
            "/" => ("/", 10, false),
            "%" => ("%", 10, false),
            _ => return None,
        })
    }

    fn parse_unary(&mut self) -> i64 {
        if self.eat_punct("!") {
            return (self.parse_unary() == 0) as i64;
        }
        if self.eat_punct("-") {
            return -self.parse_unary();
        }
        if self.eat_punct("+") {
            return self.parse_unary();
        }
        if self.eat_punct("~") {
            return !self.parse_unary();
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> i64 {
        if self.eat_punct("(") {
            let v = self.parse_conditional();
            if !self.eat_punct(")") {
                self.sink.error(self.loc, PpErrorKind::MalformedDirective("if"));
            }
            return v;
        }
        match self.bump() {
            Some(t) if t.kind == TokenKind::IntConstant || t.kind == TokenKind::UintConstant => {
                parse_int_literal(&t.text)
            }
            Some(t) if t.kind == TokenKind::Identifier => {
                // Any remaining (un-expandable) identifier evaluates to 0,
                // matching the GLSL ES preprocessor's treatment of
                // undefined macros used outside `defined()`.
                let _ = t;
                0
            }
            _ => {
                self.sink.error(self.loc, PpErrorKind::MalformedDirective("if"));
                0
            }
        }
    }
}

fn parse_int_literal(text: &str) -> i64 {
    let t = text.trim_end_matches(['u', 'U']);
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).unwrap_or(0)
    } else if t.len() > 1 && t.starts_with('0') {
        i64::from_str_radix(t, 8).unwrap_or(0)
    } else {
        t.parse::<i64>().unwrap_or(0)
    }
}

fn apply_binop(op: &str, a: i64, b: i64) -> i64 {
    match op {
        "||" => ((a != 0) || (b != 0)) as i64,
        "&&" => ((a != 0) && (b != 0)) as i64,
        "|" => a | b,
        "^" => a ^ b,
        "&" => a & b,
        "==" => (a == b) as i64,
        "!=" => (a != b) as i64,
        "<" => (a < b) as i64,
        ">" => (a > b) as i64,
        "<=" => (a <= b) as i64,
        ">=" => (a >= b) as i64,
        "<<" => a.checked_shl(b as u32).unwrap_or(0),
        ">>" => a.checked_shr(b as u32).unwrap_or(0),
        "+" => a.wrapping_add(b),
        "-" => a.wrapping_sub(b),
        "*" => a.wrapping_mul(b),
        "/" => if b != 0 { a / b } else { 0 },
        "%" => if b != 0 { a % b } else { 0 },
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::VecDiagnosticSink;
    use crate::lexer::{splice_continuations, Lexer};

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

    #[test]
    fn evaluates_arithmetic() {
        let table = MacroTable::new();
        let mut sink = VecDiagnosticSink::default();
        let toks = lex_all("1 + 2 * 3 == 7\n");
        let v = eval_condition(&table, &toks, Location::new(0, 1), &mut sink);
        assert_eq!(v, 1);
        assert!(sink.0.is_empty());
    }

    #[test]
    fn defined_is_recognized_before_expansion() {
        let mut table = MacroTable::new();
        table.define_predefined("FOO", "");
        let mut sink = VecDiagnosticSink::default();
        let toks = lex_all("defined(FOO)\n");
        let v = eval_condition(&table, &toks, Location::new(0, 1), &mut sink);
        assert_eq!(v, 1);
    }
}
