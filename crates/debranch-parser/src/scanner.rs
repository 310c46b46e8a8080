//! Hand-written tokenizer for the ES5 subset the transform operates on.
//!
//! `/` is ambiguous between division and a regex literal; the scanner cannot
//! decide alone, so it always produces `Slash`/`SlashEquals` and the parser
//! calls [`Scanner::rescan_regex`] when a `/` shows up where a primary
//! expression is expected.

use crate::error::ParseError;
use debranch_common::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    /// A keyword of full JavaScript that this tool does not accept in
    /// statement position (`while`, `for`, `try`, ...). Kept distinct so the
    /// parser can report it as unsupported instead of misparsing.
    ReservedWord(String),
    NumericLiteral(f64),
    StringLiteral(String),
    RegexLiteral {
        pattern: String,
        flags: String,
    },

    // Keywords
    If,
    Else,
    Function,
    Var,
    Let,
    Const,
    Return,
    New,
    Delete,
    Void,
    TypeOf,
    In,
    InstanceOf,
    This,
    True,
    False,
    Null,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,
    Dot,
    Question,
    Colon,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    Ampersand,
    Bar,
    Caret,
    Tilde,
    AmpersandAmpersand,
    BarBar,
    Exclamation,
    LessThan,
    GreaterThan,
    LessEquals,
    GreaterEquals,
    LessLess,
    GreaterGreater,
    GreaterGreaterGreater,
    EqualsEquals,
    ExclamationEquals,
    EqualsEqualsEquals,
    ExclamationEqualsEquals,
    Equals,
    PlusEquals,
    MinusEquals,
    StarEquals,
    SlashEquals,
    PercentEquals,
    LessLessEquals,
    GreaterGreaterEquals,
    GreaterGreaterGreaterEquals,
    AmpersandEquals,
    BarEquals,
    CaretEquals,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// A line terminator appeared between the previous token and this one.
    /// Drives automatic semicolon insertion and `return` restriction.
    pub newline_before: bool,
}

pub struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.pos as u32)
    }

    fn error(&self, message: impl Into<String>, start: usize) -> ParseError {
        ParseError::new(message, self.span_from(start))
    }

    /// Skip whitespace and comments, reporting whether a line terminator was
    /// crossed.
    fn skip_trivia(&mut self) -> Result<bool, ParseError> {
        let mut newline = false;
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(0x0b) | Some(0x0c) => {
                    self.pos += 1;
                }
                Some(b'\n') | Some(b'\r') => {
                    newline = true;
                    self.pos += 1;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' || b == b'\r' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        match self.peek() {
                            None => return Err(self.error("unterminated block comment", start)),
                            Some(b'*') if self.peek_at(1) == Some(b'/') => {
                                self.pos += 2;
                                break;
                            }
                            Some(b) => {
                                if b == b'\n' || b == b'\r' {
                                    newline = true;
                                }
                                self.pos += 1;
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(newline)
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        let newline_before = self.skip_trivia()?;
        let start = self.pos;

        let Some(b) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: self.span_from(start),
                newline_before,
            });
        };

        let kind = match b {
            b'0'..=b'9' => self.scan_number(start)?,
            b'.' if matches!(self.peek_at(1), Some(b'0'..=b'9')) => self.scan_number(start)?,
            b'\'' | b'"' => self.scan_string(start)?,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => self.scan_identifier(start),
            _ if b >= 0x80 => self.scan_identifier(start),
            _ => self.scan_punctuation(start)?,
        };

        Ok(Token {
            kind,
            span: self.span_from(start),
            newline_before,
        })
    }

    /// Re-scan a `/` or `/=` token as a regex literal. The parser calls this
    /// when the slash sits in primary-expression position.
    pub fn rescan_regex(&mut self, slash: &Token) -> Result<Token, ParseError> {
        let start = slash.span.start as usize;
        self.pos = start + 1; // past the '/'

        let mut in_class = false;
        loop {
            match self.peek() {
                None | Some(b'\n') | Some(b'\r') => {
                    return Err(self.error("unterminated regular expression literal", start));
                }
                Some(b'\\') => {
                    self.pos += 1;
                    if matches!(self.peek(), None | Some(b'\n') | Some(b'\r')) {
                        return Err(self.error("unterminated regular expression literal", start));
                    }
                    self.pos += 1;
                }
                Some(b'[') => {
                    in_class = true;
                    self.pos += 1;
                }
                Some(b']') => {
                    in_class = false;
                    self.pos += 1;
                }
                Some(b'/') if !in_class => {
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        let pattern = self.src[start + 1..self.pos].to_string();
        self.pos += 1; // closing '/'

        let flags_start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'$' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let flags = self.src[flags_start..self.pos].to_string();

        Ok(Token {
            kind: TokenKind::RegexLiteral { pattern, flags },
            span: self.span_from(start),
            newline_before: slash.newline_before,
        })
    }

    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        while self.pos < self.src.len() {
            let rest = &self.src[self.pos..];
            let c = rest.chars().next().unwrap_or('\0');
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let text = &self.src[start..self.pos];
        match text {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "function" => TokenKind::Function,
            "var" => TokenKind::Var,
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "return" => TokenKind::Return,
            "new" => TokenKind::New,
            "delete" => TokenKind::Delete,
            "void" => TokenKind::Void,
            "typeof" => TokenKind::TypeOf,
            "in" => TokenKind::In,
            "instanceof" => TokenKind::InstanceOf,
            "this" => TokenKind::This,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "break" | "case" | "catch" | "class" | "continue" | "debugger" | "default" | "do"
            | "enum" | "export" | "extends" | "finally" | "for" | "import" | "super"
            | "switch" | "throw" | "try" | "while" | "with" | "yield" => {
                TokenKind::ReservedWord(text.to_string())
            }
            _ => TokenKind::Identifier(text.to_string()),
        }
    }

    fn scan_number(&mut self, start: usize) -> Result<TokenKind, ParseError> {
        // Hex literal
        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x') | Some(b'X')) {
            self.pos += 2;
            let digits_start = self.pos;
            while matches!(self.peek(), Some(b) if b.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            if self.pos == digits_start {
                return Err(self.error("missing hexadecimal digits", start));
            }
            let value = u64::from_str_radix(&self.src[digits_start..self.pos], 16)
                .map_err(|_| self.error("hexadecimal literal out of range", start))?;
            return Ok(TokenKind::NumericLiteral(value as f64));
        }

        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            if matches!(self.peek(), Some(b'0'..=b'9')) {
                while matches!(self.peek(), Some(b'0'..=b'9')) {
                    self.pos += 1;
                }
            } else {
                // `1e` followed by something else: not an exponent
                self.pos = mark;
            }
        }
        let text = &self.src[start..self.pos];
        let value = text
            .parse::<f64>()
            .map_err(|_| self.error(format!("invalid numeric literal `{text}`"), start))?;
        Ok(TokenKind::NumericLiteral(value))
    }

    fn scan_string(&mut self, start: usize) -> Result<TokenKind, ParseError> {
        let quote = self.bump().unwrap_or(b'"');
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some(b'\n') | Some(b'\r') => {
                    return Err(self.error("unterminated string literal", start));
                }
                Some(b) if b == quote => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    self.scan_escape(&mut value, start)?;
                }
                Some(b) if b < 0x80 => {
                    value.push(b as char);
                    self.pos += 1;
                }
                Some(_) => {
                    let c = self.src[self.pos..].chars().next().unwrap_or('\u{fffd}');
                    value.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
        Ok(TokenKind::StringLiteral(value))
    }

    fn scan_escape(&mut self, value: &mut String, start: usize) -> Result<(), ParseError> {
        let Some(b) = self.bump() else {
            return Err(self.error("unterminated string literal", start));
        };
        match b {
            b'n' => value.push('\n'),
            b't' => value.push('\t'),
            b'r' => value.push('\r'),
            b'b' => value.push('\u{8}'),
            b'f' => value.push('\u{c}'),
            b'v' => value.push('\u{b}'),
            b'0' if !matches!(self.peek(), Some(b'0'..=b'9')) => value.push('\0'),
            b'x' => {
                let c = self.scan_hex_escape(2, start)?;
                value.push(c);
            }
            b'u' => {
                let c = self.scan_hex_escape(4, start)?;
                value.push(c);
            }
            b'\n' => {} // line continuation
            b'\r' => {
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
            }
            _ if b < 0x80 => value.push(b as char),
            _ => {
                // escaped multi-byte character: back up and take the char
                self.pos -= 1;
                let c = self.src[self.pos..].chars().next().unwrap_or('\u{fffd}');
                value.push(c);
                self.pos += c.len_utf8();
            }
        }
        Ok(())
    }

    fn scan_hex_escape(&mut self, digits: usize, start: usize) -> Result<char, ParseError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let Some(b) = self.peek() else {
                return Err(self.error("invalid hexadecimal escape sequence", start));
            };
            let digit = (b as char)
                .to_digit(16)
                .ok_or_else(|| self.error("invalid hexadecimal escape sequence", start))?;
            code = code * 16 + digit;
            self.pos += 1;
        }
        char::from_u32(code).ok_or_else(|| self.error("invalid character escape", start))
    }

    fn scan_punctuation(&mut self, start: usize) -> Result<TokenKind, ParseError> {
        use TokenKind::*;
        let b = self.bump().unwrap_or(0);
        let kind = match b {
            b'(' => LeftParen,
            b')' => RightParen,
            b'{' => LeftBrace,
            b'}' => RightBrace,
            b'[' => LeftBracket,
            b']' => RightBracket,
            b';' => Semicolon,
            b',' => Comma,
            b'.' => Dot,
            b'?' => Question,
            b':' => Colon,
            b'~' => Tilde,
            b'+' => match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    PlusPlus
                }
                Some(b'=') => {
                    self.pos += 1;
                    PlusEquals
                }
                _ => Plus,
            },
            b'-' => match self.peek() {
                Some(b'-') => {
                    self.pos += 1;
                    MinusMinus
                }
                Some(b'=') => {
                    self.pos += 1;
                    MinusEquals
                }
                _ => Minus,
            },
            b'*' => match self.peek() {
                Some(b'=') => {
                    self.pos += 1;
                    StarEquals
                }
                _ => Star,
            },
            b'/' => match self.peek() {
                Some(b'=') => {
                    self.pos += 1;
                    SlashEquals
                }
                _ => Slash,
            },
            b'%' => match self.peek() {
                Some(b'=') => {
                    self.pos += 1;
                    PercentEquals
                }
                _ => Percent,
            },
            b'&' => match self.peek() {
                Some(b'&') => {
                    self.pos += 1;
                    AmpersandAmpersand
                }
                Some(b'=') => {
                    self.pos += 1;
                    AmpersandEquals
                }
                _ => Ampersand,
            },
            b'|' => match self.peek() {
                Some(b'|') => {
                    self.pos += 1;
                    BarBar
                }
                Some(b'=') => {
                    self.pos += 1;
                    BarEquals
                }
                _ => Bar,
            },
            b'^' => match self.peek() {
                Some(b'=') => {
                    self.pos += 1;
                    CaretEquals
                }
                _ => Caret,
            },
            b'!' => {
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                    if self.peek() == Some(b'=') {
                        self.pos += 1;
                        ExclamationEqualsEquals
                    } else {
                        ExclamationEquals
                    }
                } else {
                    Exclamation
                }
            }
            b'=' => {
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                    if self.peek() == Some(b'=') {
                        self.pos += 1;
                        EqualsEqualsEquals
                    } else {
                        EqualsEquals
                    }
                } else {
                    Equals
                }
            }
            b'<' => match self.peek() {
                Some(b'=') => {
                    self.pos += 1;
                    LessEquals
                }
                Some(b'<') => {
                    self.pos += 1;
                    if self.peek() == Some(b'=') {
                        self.pos += 1;
                        LessLessEquals
                    } else {
                        LessLess
                    }
                }
                _ => LessThan,
            },
            b'>' => match self.peek() {
                Some(b'=') => {
                    self.pos += 1;
                    GreaterEquals
                }
                Some(b'>') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(b'=') => {
                            self.pos += 1;
                            GreaterGreaterEquals
                        }
                        Some(b'>') => {
                            self.pos += 1;
                            if self.peek() == Some(b'=') {
                                self.pos += 1;
                                GreaterGreaterGreaterEquals
                            } else {
                                GreaterGreaterGreater
                            }
                        }
                        _ => GreaterGreater,
                    }
                }
                _ => GreaterThan,
            },
            other => {
                return Err(self.error(
                    format!("unexpected character `{}`", other as char),
                    start,
                ));
            }
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(src: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(src);
        let mut kinds = Vec::new();
        loop {
            let tok = scanner.next_token().expect("scan failure");
            if tok.kind == TokenKind::Eof {
                break;
            }
            kinds.push(tok.kind);
        }
        kinds
    }

    #[test]
    fn scans_numbers() {
        assert_eq!(
            scan_all("1 2.5 .5 0x1f 1e3"),
            vec![
                TokenKind::NumericLiteral(1.0),
                TokenKind::NumericLiteral(2.5),
                TokenKind::NumericLiteral(0.5),
                TokenKind::NumericLiteral(31.0),
                TokenKind::NumericLiteral(1000.0),
            ]
        );
    }

    #[test]
    fn scans_strings_with_escapes() {
        assert_eq!(
            scan_all(r#"'a\n' "b\"c" '\x41B'"#),
            vec![
                TokenKind::StringLiteral("a\n".to_string()),
                TokenKind::StringLiteral("b\"c".to_string()),
                TokenKind::StringLiteral("AB".to_string()),
            ]
        );
    }

    #[test]
    fn scans_keywords_and_identifiers() {
        assert_eq!(
            scan_all("if __DEV__ typeof instanceof"),
            vec![
                TokenKind::If,
                TokenKind::Identifier("__DEV__".to_string()),
                TokenKind::TypeOf,
                TokenKind::InstanceOf,
            ]
        );
    }

    #[test]
    fn reserved_words_are_flagged() {
        assert_eq!(
            scan_all("while"),
            vec![TokenKind::ReservedWord("while".to_string())]
        );
    }

    #[test]
    fn multi_char_punctuation() {
        assert_eq!(
            scan_all("=== !== >>> >>>= && ||"),
            vec![
                TokenKind::EqualsEqualsEquals,
                TokenKind::ExclamationEqualsEquals,
                TokenKind::GreaterGreaterGreater,
                TokenKind::GreaterGreaterGreaterEquals,
                TokenKind::AmpersandAmpersand,
                TokenKind::BarBar,
            ]
        );
    }

    #[test]
    fn comments_are_trivia() {
        assert_eq!(
            scan_all("a // line\n/* block */ b"),
            vec![
                TokenKind::Identifier("a".to_string()),
                TokenKind::Identifier("b".to_string()),
            ]
        );
    }

    #[test]
    fn newline_flag_tracks_terminators() {
        let mut scanner = Scanner::new("a\nb c");
        let a = scanner.next_token().unwrap();
        let b = scanner.next_token().unwrap();
        let c = scanner.next_token().unwrap();
        assert!(!a.newline_before);
        assert!(b.newline_before);
        assert!(!c.newline_before);
    }

    #[test]
    fn rescans_regex() {
        let mut scanner = Scanner::new("/ab[/]c/gi");
        let slash = scanner.next_token().unwrap();
        assert_eq!(slash.kind, TokenKind::Slash);
        let regex = scanner.rescan_regex(&slash).unwrap();
        assert_eq!(
            regex.kind,
            TokenKind::RegexLiteral {
                pattern: "ab[/]c".to_string(),
                flags: "gi".to_string(),
            }
        );
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut scanner = Scanner::new("'abc");
        assert!(scanner.next_token().is_err());
    }
}
