//! JavaScript lexer - tokenizes source text up front
//!
//! Division and regular expression literals share the `/` character. The
//! lexer guesses from the previous significant token. Where that guess is
//! wrong (`if (a) /x/.test(b)`), the parser finds a `/` in operand position
//! and asks for the token to be read again with [`Lexer::rescan_regex`].

use crate::parser::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier, keyword, or `true`/`false`/`null`
    Name(String),
    /// Operator or delimiter
    Punct(&'static str),
    /// Numeric literal, already evaluated
    Number(f64),
    /// String literal with escapes resolved
    String(String),
    /// Regular expression literal
    Regex { pattern: String, flags: String },
    /// End of input
    Eof,
}

impl TokenKind {
    /// Source-like rendering used in error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Name(name) => name.clone(),
            TokenKind::Punct(p) => p.to_string(),
            TokenKind::Number(n) => n.to_string(),
            TokenKind::String(s) => format!("'{}'", s),
            TokenKind::Regex { pattern, flags } => format!("/{}/{}", pattern, flags),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    /// A line terminator separates this token from the previous one
    pub newline_before: bool,
}

/// Punctuators, longest first so the first prefix match wins
const PUNCTUATORS: &[&str] = &[
    ">>>=", "===", "!==", ">>>", "<<=", ">>=", "==", "!=", "<=", ">=", "&&", "||", "++", "--",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "{", "}", "(", ")", "[", "]",
    ";", ",", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".",
];

/// Keywords after which a `/` starts a regular expression
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
];

pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += ch.len_utf8();
        if is_line_terminator(ch) {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn invalid(&self, ch: char) -> ParseError {
        ParseError::InvalidCharacter {
            ch,
            line: self.line,
            column: self.column,
        }
    }

    /// Skip whitespace and comments, reporting whether a line terminator was crossed
    fn skip_trivia(&mut self) -> Result<bool, ParseError> {
        let mut newline = false;
        loop {
            match self.peek() {
                Some(ch) if is_line_terminator(ch) => {
                    newline = true;
                    self.advance();
                }
                Some(ch) if is_whitespace(ch) => {
                    self.advance();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(ch) = self.peek() {
                        if is_line_terminator(ch) {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_second() == Some('*') => {
                    let (line, column) = (self.line, self.column);
                    self.advance();
                    self.advance();
                    loop {
                        match self.advance() {
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                break;
                            }
                            Some(ch) if is_line_terminator(ch) => newline = true,
                            Some(_) => {}
                            None => return Err(ParseError::UnterminatedComment { line, column }),
                        }
                    }
                }
                _ => return Ok(newline),
            }
        }
    }

    /// Tokenize the whole input, ending with an `Eof` token
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        match self.tokenize_partial() {
            (tokens, None) => Ok(tokens),
            (_, Some(error)) => Err(error),
        }
    }

    /// Tokenize as far as the input allows. A lexing error ends the stream
    /// with an `Eof` token and is returned next to it.
    pub fn tokenize_partial(&mut self) -> (Vec<Token>, Option<ParseError>) {
        self.scan_after(Vec::new())
    }

    /// Read the `/` or `/=` token again as a regular expression literal,
    /// then tokenize the rest of the input after it
    pub fn rescan_regex(
        input: &'a str,
        slash: &Token,
    ) -> Result<(Vec<Token>, Option<ParseError>), ParseError> {
        let mut lexer = Self {
            input,
            position: slash.offset,
            line: slash.line,
            column: slash.column,
        };
        let kind = lexer.read_regex()?;
        let regex = Token {
            kind,
            offset: slash.offset,
            line: slash.line,
            column: slash.column,
            newline_before: slash.newline_before,
        };
        Ok(lexer.scan_after(vec![regex]))
    }

    fn scan_after(&mut self, mut tokens: Vec<Token>) -> (Vec<Token>, Option<ParseError>) {
        loop {
            match self.next_token(tokens.last()) {
                Ok(token) => {
                    let done = token.kind == TokenKind::Eof;
                    tokens.push(token);
                    if done {
                        return (tokens, None);
                    }
                }
                Err(error) => {
                    tokens.push(Token {
                        kind: TokenKind::Eof,
                        offset: self.position,
                        line: self.line,
                        column: self.column,
                        newline_before: false,
                    });
                    return (tokens, Some(error));
                }
            }
        }
    }

    fn next_token(&mut self, previous: Option<&Token>) -> Result<Token, ParseError> {
        let newline_before = self.skip_trivia()?;
        let (offset, line, column) = (self.position, self.line, self.column);
        let kind = self.next_kind(regex_allowed(previous.map(|t| &t.kind)))?;
        Ok(Token {
            kind,
            offset,
            line,
            column,
            newline_before,
        })
    }

    fn next_kind(&mut self, regex_allowed: bool) -> Result<TokenKind, ParseError> {
        let Some(ch) = self.peek() else {
            return Ok(TokenKind::Eof);
        };

        if is_identifier_start(ch) {
            return Ok(TokenKind::Name(self.read_name()));
        }
        let leading_dot = ch == '.' && self.peek_second().is_some_and(|c| c.is_ascii_digit());
        if ch.is_ascii_digit() || leading_dot {
            return self.read_number();
        }
        if ch == '"' || ch == '\'' {
            return self.read_string(ch);
        }
        if ch == '/' && regex_allowed {
            return self.read_regex();
        }

        let rest = self.rest();
        match PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) {
            Some(punct) => {
                for _ in 0..punct.len() {
                    self.advance();
                }
                Ok(TokenKind::Punct(punct))
            }
            None => Err(self.invalid(ch)),
        }
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if !is_identifier_part(ch) {
                break;
            }
            name.push(ch);
            self.advance();
        }
        name
    }

    fn read_number(&mut self) -> Result<TokenKind, ParseError> {
        let (line, column) = (self.line, self.column);
        let start = self.position;

        let value = if self.peek() == Some('0') && matches!(self.peek_second(), Some('x' | 'X')) {
            self.advance();
            self.advance();
            let mut value = 0f64;
            let mut digits = 0;
            while let Some(digit) = self.peek().and_then(|c| c.to_digit(16)) {
                value = value * 16.0 + f64::from(digit);
                digits += 1;
                self.advance();
            }
            if digits == 0 {
                return Err(ParseError::InvalidNumber { line, column });
            }
            value
        } else {
            self.consume_digits();
            if self.peek() == Some('.') {
                self.advance();
                self.consume_digits();
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    return Err(ParseError::InvalidNumber { line, column });
                }
                self.consume_digits();
            }
            self.input[start..self.position]
                .parse::<f64>()
                .map_err(|_| ParseError::InvalidNumber { line, column })?
        };

        // `3in x` and `0x1g` are not numbers followed by names
        if self.peek().is_some_and(is_identifier_start) {
            return Err(ParseError::InvalidNumber { line, column });
        }
        Ok(TokenKind::Number(value))
    }

    fn consume_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn read_string(&mut self, quote: char) -> Result<TokenKind, ParseError> {
        let (line, column) = (self.line, self.column);
        self.advance();
        let mut result = String::new();

        loop {
            let ch = match self.peek() {
                None => return Err(ParseError::UnterminatedString { line, column }),
                Some(ch) if is_line_terminator(ch) => {
                    return Err(ParseError::UnterminatedString { line, column })
                }
                Some(ch) => ch,
            };
            self.advance();

            if ch == quote {
                return Ok(TokenKind::String(result));
            }
            if ch != '\\' {
                result.push(ch);
                continue;
            }

            let Some(escaped) = self.advance() else {
                return Err(ParseError::UnterminatedString { line, column });
            };
            match escaped {
                'n' => result.push('\n'),
                't' => result.push('\t'),
                'r' => result.push('\r'),
                'b' => result.push('\u{8}'),
                'f' => result.push('\u{c}'),
                'v' => result.push('\u{b}'),
                '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => result.push('\0'),
                'x' => {
                    let code = self.read_hex_digits(2).ok_or_else(|| self.invalid('x'))?;
                    result.push(char::from_u32(code).ok_or_else(|| self.invalid('x'))?);
                }
                'u' => {
                    let code = self.read_unicode_escape().ok_or_else(|| self.invalid('u'))?;
                    result.push(code);
                }
                '\r' => {
                    // Line continuation; `\r\n` counts as one terminator
                    if self.peek() == Some('\n') {
                        self.advance();
                    }
                }
                c if is_line_terminator(c) => {}
                c => result.push(c),
            }
        }
    }

    fn read_hex_digits(&mut self, count: usize) -> Option<u32> {
        let mut value = 0;
        for _ in 0..count {
            let digit = self.peek()?.to_digit(16)?;
            value = value * 16 + digit;
            self.advance();
        }
        Some(value)
    }

    fn read_unicode_escape(&mut self) -> Option<char> {
        if self.peek() == Some('{') {
            self.advance();
            let mut value = 0u32;
            while let Some(digit) = self.peek().and_then(|c| c.to_digit(16)) {
                value = value.checked_mul(16)?.checked_add(digit)?;
                self.advance();
            }
            if self.advance()? != '}' {
                return None;
            }
            return char::from_u32(value);
        }

        let high = self.read_hex_digits(4)?;
        if (0xD800..0xDC00).contains(&high) && self.rest().starts_with("\\u") {
            // Surrogate pair spelled as two escapes
            let saved = (self.position, self.line, self.column);
            self.advance();
            self.advance();
            if let Some(low) = self.read_hex_digits(4) {
                if (0xDC00..0xE000).contains(&low) {
                    return char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00));
                }
            }
            (self.position, self.line, self.column) = saved;
        }
        Some(char::from_u32(high).unwrap_or('\u{FFFD}'))
    }

    fn read_regex(&mut self) -> Result<TokenKind, ParseError> {
        let (line, column) = (self.line, self.column);
        self.advance();
        let mut pattern = String::new();
        let mut in_class = false;

        loop {
            let ch = match self.advance() {
                None => return Err(ParseError::UnterminatedRegex { line, column }),
                Some(ch) if is_line_terminator(ch) => {
                    return Err(ParseError::UnterminatedRegex { line, column })
                }
                Some(ch) => ch,
            };
            match ch {
                '\\' => {
                    pattern.push(ch);
                    match self.advance() {
                        Some(next) if !is_line_terminator(next) => pattern.push(next),
                        _ => return Err(ParseError::UnterminatedRegex { line, column }),
                    }
                }
                '[' => {
                    in_class = true;
                    pattern.push(ch);
                }
                ']' => {
                    in_class = false;
                    pattern.push(ch);
                }
                '/' if !in_class => break,
                _ => pattern.push(ch),
            }
        }

        let flags = self.read_name();
        Ok(TokenKind::Regex { pattern, flags })
    }
}

fn regex_allowed(previous: Option<&TokenKind>) -> bool {
    match previous {
        None => true,
        Some(TokenKind::Punct(p)) => !matches!(*p, ")" | "]" | "}"),
        Some(TokenKind::Name(name)) => REGEX_PRECEDING_KEYWORDS.contains(&name.as_str()),
        Some(_) => false,
    }
}

pub fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

pub fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\u{b}' | '\u{c}' | '\u{a0}' | '\u{feff}')
        || (!ch.is_ascii() && ch.is_whitespace() && !is_line_terminator(ch))
}

pub fn is_identifier_start(ch: char) -> bool {
    ch == '$' || ch == '_' || ch.is_ascii_alphabetic() || (!ch.is_ascii() && ch.is_alphabetic())
}

pub fn is_identifier_part(ch: char) -> bool {
    is_identifier_start(ch)
        || ch.is_ascii_digit()
        || (!ch.is_ascii() && ch.is_alphanumeric())
        || ch == '\u{200c}'
        || ch == '\u{200d}'
}
