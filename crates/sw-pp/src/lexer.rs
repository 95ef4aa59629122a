use crate::token::{Location, Token, TokenFlags, TokenKind};

/// Collapses `\` followed by `\n`, `\r\n` or `\r` into nothing, tracking the
/// logical line number so that diagnostics still point at the line the
/// author wrote rather than the line after splicing.
///
/// Overflow of the line counter (more than `u32::MAX` logical lines) is
/// reported by truncating the remaining input, which the caller sees as an
/// early end-of-data; this matches the source's treatment of the condition
/// as unrecoverable rather than panicking.
pub fn splice_continuations(source: &str, file_id: u32) -> (String, Vec<Location>) {
    let mut out = String::with_capacity(source.len());
    // `line_of_byte[i]` is the logical line of the i-th *output* character.
    let mut line_of_byte = Vec::with_capacity(source.len());

    let bytes = source.as_bytes();
    let mut i = 0;
    let mut logical_line: u32 = 1;

    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let rest = &source[i + 1..];
            if let Some(consumed) = newline_len(rest) {
                i += 1 + consumed;
                logical_line = logical_line.saturating_add(1);
                if logical_line == u32::MAX {
                    break;
                }
                continue;
            }
        }
        if let Some(consumed) = newline_len(&source[i..]) {
            out.push('\n');
            line_of_byte.push(Location::new(file_id, logical_line));
            i += consumed;
            logical_line = logical_line.saturating_add(1);
            continue;
        }
        let ch_len = source[i..].chars().next().map(|c| c.len_utf8()).unwrap_or(1);
        out.push_str(&source[i..i + ch_len]);
        line_of_byte.push(Location::new(file_id, logical_line));
        i += ch_len;
    }

    (out, line_of_byte)
}

fn newline_len(s: &str) -> Option<usize> {
    if s.starts_with("\r\n") {
        Some(2)
    } else if s.starts_with('\n') || s.starts_with('\r') {
        Some(1)
    } else {
        None
    }
}

/// Tokenizes a single already-spliced source string, yielding `Newline`
/// tokens at the end of each line (directives are line-delimited) and a
/// trailing `Eod` token.
pub struct Lexer<'a> {
    text: &'a str,
    lines: &'a [Location],
    pos: usize,
    file_id: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str, lines: &'a [Location], file_id: u32) -> Lexer<'a> {
        Lexer { text, lines, pos: 0, file_id }
    }

    fn loc(&self) -> Location {
        self.lines.get(self.pos.min(self.lines.len().saturating_sub(1)))
            .copied()
            .unwrap_or(Location::new(self.file_id, 0))
    }

    fn peek_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub fn next_token(&mut self) -> Token {
        let mut leading_space = false;
        loop {
            match self.peek_char() {
                Some(' ') | Some('\t') => {
                    leading_space = true;
                    self.bump();
                }
                Some('/') if self.text[self.pos..].starts_with("//") => {
                    leading_space = true;
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.text[self.pos..].starts_with("/*") => {
                    leading_space = true;
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek_char() {
                            None => break,
                            Some('*') if self.text[self.pos..].starts_with("*/") => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            _ => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => break,
            }
        }

        let loc = self.loc();
        let mut flags = TokenFlags::empty();
        if leading_space {
            flags |= TokenFlags::LEADING_SPACE;
        }

        let c = match self.peek_char() {
            None => return Token::new(TokenKind::Eod, "", loc, flags),
            Some(c) => c,
        };

        if c == '\n' {
            self.bump();
            return Token::new(TokenKind::Newline, "\n", loc, flags);
        }

        if c.is_alphabetic() || c == '_' {
            let start = self.pos;
            while matches!(self.peek_char(), Some(c) if c.is_alphanumeric() || c == '_') {
                self.bump();
            }
            return Token::new(TokenKind::Identifier, &self.text[start..self.pos], loc, flags);
        }

        if c.is_ascii_digit() || (c == '.' && self.peek_digit_after_dot()) {
            return self.lex_number(loc, flags);
        }

        // Punctuation: try the longest match among GLSL multi-char operators.
        const MULTI: &[&str] = &[
            "<<=", ">>=", "==", "!=", "<=", ">=", "&&", "||", "^^", "<<", ">>",
            "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "++", "--",
        ];
        let rest = &self.text[self.pos..];
        if let Some(op) = MULTI.iter().find(|op| rest.starts_with(**op)) {
            for _ in 0..op.chars().count() {
                self.bump();
            }
            return Token::new(TokenKind::Punctuator, *op, loc, flags);
        }

        self.bump();
        Token::new(TokenKind::Punctuator, c.to_string(), loc, flags)
    }

    fn peek_digit_after_dot(&self) -> bool {
        self.text[self.pos..].chars().nth(1).map(|c| c.is_ascii_digit()).unwrap_or(false)
    }

    fn lex_number(&mut self, loc: Location, flags: TokenFlags) -> Token {
        let start = self.pos;
        let mut is_float = false;

        if self.peek_char() == Some('0')
            && matches!(self.text[self.pos + 1..].chars().next(), Some('x') | Some('X'))
        {
            self.bump();
            self.bump();
            while matches!(self.peek_char(), Some(c) if c.is_ascii_hexdigit()) {
                self.bump();
            }
        } else {
            while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
            if self.peek_char() == Some('.') {
                is_float = true;
                self.bump();
                while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                    self.bump();
                }
            }
            if matches!(self.peek_char(), Some('e') | Some('E')) {
                is_float = true;
                self.bump();
                if matches!(self.peek_char(), Some('+') | Some('-')) {
                    self.bump();
                }
                while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }

        let mut kind = if is_float { TokenKind::FloatConstant } else { TokenKind::IntConstant };
        match self.peek_char() {
            Some('f') | Some('F') => {
                kind = TokenKind::FloatConstant;
                self.bump();
            }
            Some('u') | Some('U') => {
                kind = TokenKind::UintConstant;
                self.bump();
            }
            _ => {}
        }

        Token::new(kind, &self.text[start..self.pos], loc, flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splices_all_continuation_forms() {
        let (out, _) = splice_continuations("a\\\nb\\\r\nc\\\rd", 0);
        assert_eq!(out, "abcd");
    }

    #[test]
    fn tokenizes_identifiers_and_numbers() {
        let (text, lines) = splice_continuations("foo 1.5f 0x1A 3u\n", 0);
        let mut lx = Lexer::new(&text, &lines, 0);
        let t1 = lx.next_token();
        assert_eq!(t1.kind, TokenKind::Identifier);
        assert_eq!(t1.text, "foo");
        let t2 = lx.next_token();
        assert_eq!(t2.kind, TokenKind::FloatConstant);
        assert_eq!(t2.text, "1.5f");
        assert!(t2.has_leading_space());
        let t3 = lx.next_token();
        assert_eq!(t3.kind, TokenKind::IntConstant);
        assert_eq!(t3.text, "0x1A");
        let t4 = lx.next_token();
        assert_eq!(t4.kind, TokenKind::UintConstant);
        assert_eq!(t4.text, "3u");
    }

    #[test]
    fn strips_comments() {
        let (text, lines) = splice_continuations("a /* c */ b // trailing\nc\n", 0);
        let mut lx = Lexer::new(&text, &lines, 0);
        let t1 = lx.next_token();
        assert_eq!(t1.text, "a");
        let t2 = lx.next_token();
        assert_eq!(t2.text, "b");
        assert!(t2.has_leading_space());
        let t3 = lx.next_token();
        assert_eq!(t3.kind, TokenKind::Newline);
        let t4 = lx.next_token();
        assert_eq!(t4.text, "c");
    }
}
