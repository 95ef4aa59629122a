use std::fmt;

/// Position of a token in the (already line-continuation-collapsed) source.
///
/// `file_id` indexes the source-string array passed to [`crate::Preprocessor::new`];
/// `line` is the 1-based logical line number within that string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub file_id: u32,
    pub line: u32,
}

impl Location {
    pub fn new(file_id: u32, line: u32) -> Location {
        Location { file_id, line }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_id, self.line)
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TokenFlags: u8 {
        /// At least one whitespace character (other than the continuation
        /// backslash-newline sequence, which is collapsed away before the
        /// lexer runs) preceded this token on its logical line.
        const LEADING_SPACE = 1 << 0;
        /// Token was produced by a macro expansion rather than appearing
        /// verbatim in the source; used to suppress re-expansion loops.
        const EXPANDED = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    IntConstant,
    UintConstant,
    FloatConstant,
    /// Any operator or punctuation token (`+`, `(`, `::`, ...); the exact
    /// spelling lives in [`Token::text`].
    Punctuator,
    /// End of the current logical line (directives are line-terminated).
    Newline,
    /// End of the whole token stream.
    Eod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub loc: Location,
    pub flags: TokenFlags,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, loc: Location, flags: TokenFlags) -> Token {
        Token { kind, text: text.into(), loc, flags }
    }

    pub fn has_leading_space(&self) -> bool {
        self.flags.contains(TokenFlags::LEADING_SPACE)
    }

    pub fn is_eod(&self) -> bool {
        self.kind == TokenKind::Eod
    }

    pub fn is_punct(&self, s: &str) -> bool {
        self.kind == TokenKind::Punctuator && self.text == s
    }

    pub fn is_ident(&self, s: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == s
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
