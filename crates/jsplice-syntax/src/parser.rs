//! JavaScript parser - recursive descent over the token stream into ESTree

use thiserror::Error;

use crate::lexer::{Lexer, Token, TokenKind};
use crate::raw::{RawNode, RawValue, RegexLiteral, Scalar};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Line {line}: Unexpected token {found}")]
    UnexpectedToken {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("Line {line}: Unexpected end of input")]
    UnexpectedEnd { line: usize, column: usize },

    #[error("Line {line}: Invalid or unexpected token '{ch}'")]
    InvalidCharacter { ch: char, line: usize, column: usize },

    #[error("Line {line}: Unterminated string literal")]
    UnterminatedString { line: usize, column: usize },

    #[error("Line {line}: Unterminated comment")]
    UnterminatedComment { line: usize, column: usize },

    #[error("Line {line}: Invalid regular expression: missing /")]
    UnterminatedRegex { line: usize, column: usize },

    #[error("Line {line}: Invalid number literal")]
    InvalidNumber { line: usize, column: usize },

    #[error("Line {line}: Invalid left-hand side in {context}")]
    InvalidTarget {
        context: &'static str,
        line: usize,
        column: usize,
    },

    #[error("Line {line}: Missing catch or finally after try")]
    MissingHandler { line: usize, column: usize },
}

impl ParseError {
    /// 1-based line the error was reported at
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { line, .. }
            | ParseError::UnexpectedEnd { line, .. }
            | ParseError::InvalidCharacter { line, .. }
            | ParseError::UnterminatedString { line, .. }
            | ParseError::UnterminatedComment { line, .. }
            | ParseError::UnterminatedRegex { line, .. }
            | ParseError::InvalidNumber { line, .. }
            | ParseError::InvalidTarget { line, .. }
            | ParseError::MissingHandler { line, .. } => *line,
        }
    }
}

const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with",
];

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "<<=", ">>=", ">>>=", "&=", "|=", "^=",
];

/// Parse a complete program
pub fn parse_program(source: &str) -> Result<RawNode, ParseError> {
    Parser::new(source).parse_program()
}

type ParseResult = Result<RawNode, ParseError>;

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    position: usize,
    /// Lexing error that ended the token stream, raised once parsing reaches it
    lex_error: Option<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let (tokens, lex_error) = Lexer::new(source).tokenize_partial();
        Self {
            source,
            tokens,
            position: 0,
            lex_error,
        }
    }

    // ==================== Token helpers ====================

    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.position.min(last)]
    }

    fn peek_kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.position + offset).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn is_punct(&self, punct: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Punct(p) if *p == punct)
    }

    fn is_name(&self, name: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Name(n) if n == name)
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.is_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_name(&mut self, name: &str) -> bool {
        if self.is_name(name) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: &str) -> Result<(), ParseError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_name(&mut self, name: &str) -> Result<(), ParseError> {
        if self.eat_name(name) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&self) -> ParseError {
        let token = self.peek();
        if let (TokenKind::Eof, Some(error)) = (&token.kind, &self.lex_error) {
            return error.clone();
        }
        match &token.kind {
            TokenKind::Eof => ParseError::UnexpectedEnd {
                line: token.line,
                column: token.column,
            },
            kind => ParseError::UnexpectedToken {
                found: kind.describe(),
                line: token.line,
                column: token.column,
            },
        }
    }

    fn invalid_target(&self, context: &'static str) -> ParseError {
        let token = self.peek();
        ParseError::InvalidTarget {
            context,
            line: token.line,
            column: token.column,
        }
    }

    /// Automatic semicolon insertion
    fn consume_semicolon(&mut self) -> Result<(), ParseError> {
        if self.eat_punct(";") {
            return Ok(());
        }
        let token = self.peek();
        if token.newline_before || matches!(token.kind, TokenKind::Punct("}") | TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// True when the next token may not continue a restricted production
    fn at_statement_end(&self) -> bool {
        let token = self.peek();
        token.newline_before
            || matches!(
                token.kind,
                TokenKind::Punct(";") | TokenKind::Punct("}") | TokenKind::Eof
            )
    }

    // ==================== Statements ====================

    pub fn parse_program(&mut self) -> ParseResult {
        let mut body = Vec::new();
        while self.peek().kind != TokenKind::Eof {
            body.push(self.parse_statement()?);
        }
        if let Some(error) = self.lex_error.take() {
            return Err(error);
        }
        Ok(RawNode::new("Program").with("body", body))
    }

    fn parse_statement(&mut self) -> ParseResult {
        let keyword = match self.peek().kind.clone() {
            TokenKind::Punct("{") => return self.parse_block(),
            TokenKind::Punct(";") => {
                self.advance();
                return Ok(RawNode::new("EmptyStatement"));
            }
            TokenKind::Name(name) => name,
            _ => return self.parse_expression_statement(),
        };

        match keyword.as_str() {
            "var" | "const" => self.parse_variable_statement(),
            "let" if matches!(self.peek_kind_at(1), Some(TokenKind::Name(_))) => {
                self.parse_variable_statement()
            }
            "if" => self.parse_if(),
            "for" => self.parse_for(),
            "while" => self.parse_while(),
            "do" => self.parse_do_while(),
            "continue" => self.parse_jump("ContinueStatement"),
            "break" => self.parse_jump("BreakStatement"),
            "return" => self.parse_return(),
            "with" => self.parse_with(),
            "switch" => self.parse_switch(),
            "throw" => self.parse_throw(),
            "try" => self.parse_try(),
            "debugger" => {
                self.advance();
                self.consume_semicolon()?;
                Ok(RawNode::new("DebuggerStatement"))
            }
            "function" => self.parse_function("FunctionDeclaration", true),
            _ if !RESERVED.contains(&keyword.as_str())
                && matches!(self.peek_kind_at(1), Some(TokenKind::Punct(":"))) =>
            {
                let label = self.parse_identifier()?;
                self.expect_punct(":")?;
                let body = self.parse_statement()?;
                Ok(RawNode::new("LabeledStatement")
                    .with("label", label)
                    .with("body", body))
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> ParseResult {
        let expression = self.parse_expression(true)?;
        self.consume_semicolon()?;
        Ok(RawNode::new("ExpressionStatement").with("expression", expression))
    }

    fn parse_block(&mut self) -> ParseResult {
        self.expect_punct("{")?;
        let mut body = Vec::new();
        while !self.is_punct("}") {
            if self.peek().kind == TokenKind::Eof {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement()?);
        }
        self.advance();
        Ok(RawNode::new("BlockStatement").with("body", body))
    }

    fn parse_variable_statement(&mut self) -> ParseResult {
        let declaration = self.parse_variable_declaration(true)?;
        self.consume_semicolon()?;
        Ok(declaration)
    }

    fn parse_variable_declaration(&mut self, allow_in: bool) -> ParseResult {
        let kind = match self.advance().kind {
            TokenKind::Name(name) => name,
            _ => return Err(self.unexpected()),
        };

        let mut declarations = Vec::new();
        loop {
            let id = self.parse_identifier()?;
            let init = if self.eat_punct("=") {
                Some(self.parse_assignment(allow_in)?)
            } else {
                None
            };
            declarations.push(
                RawNode::new("VariableDeclarator")
                    .with("id", id)
                    .with("init", init),
            );
            if !self.eat_punct(",") {
                break;
            }
        }

        Ok(RawNode::new("VariableDeclaration")
            .with("declarations", declarations)
            .with("kind", kind.as_str()))
    }

    fn parse_if(&mut self) -> ParseResult {
        self.expect_name("if")?;
        self.expect_punct("(")?;
        let test = self.parse_expression(true)?;
        self.expect_punct(")")?;
        let consequent = self.parse_statement()?;
        let alternate = if self.eat_name("else") {
            Some(self.parse_statement()?)
        } else {
            None
        };
        Ok(RawNode::new("IfStatement")
            .with("test", test)
            .with("consequent", consequent)
            .with("alternate", alternate))
    }

    fn parse_for(&mut self) -> ParseResult {
        self.expect_name("for")?;
        self.expect_punct("(")?;

        let mut init = None;
        if !self.is_punct(";") {
            let declares = self.is_name("var")
                || self.is_name("const")
                || (self.is_name("let")
                    && matches!(self.peek_kind_at(1), Some(TokenKind::Name(_))));
            let head = if declares {
                self.parse_variable_declaration(false)?
            } else {
                self.parse_expression(false)?
            };

            if self.is_name("in") {
                let single =
                    head.kind != "VariableDeclaration" || head.list("declarations").len() == 1;
                if !single || !(declares || is_assignment_target(&head)) {
                    return Err(self.invalid_target("for-in"));
                }
                self.advance();
                let right = self.parse_expression(true)?;
                self.expect_punct(")")?;
                let body = self.parse_statement()?;
                return Ok(RawNode::new("ForInStatement")
                    .with("left", head)
                    .with("right", right)
                    .with("body", body));
            }
            init = Some(head);
        }

        self.expect_punct(";")?;
        let test = if self.is_punct(";") {
            None
        } else {
            Some(self.parse_expression(true)?)
        };
        self.expect_punct(";")?;
        let update = if self.is_punct(")") {
            None
        } else {
            Some(self.parse_expression(true)?)
        };
        self.expect_punct(")")?;
        let body = self.parse_statement()?;

        Ok(RawNode::new("ForStatement")
            .with("init", init)
            .with("test", test)
            .with("update", update)
            .with("body", body))
    }

    fn parse_while(&mut self) -> ParseResult {
        self.expect_name("while")?;
        self.expect_punct("(")?;
        let test = self.parse_expression(true)?;
        self.expect_punct(")")?;
        let body = self.parse_statement()?;
        Ok(RawNode::new("WhileStatement")
            .with("test", test)
            .with("body", body))
    }

    fn parse_do_while(&mut self) -> ParseResult {
        self.expect_name("do")?;
        let body = self.parse_statement()?;
        self.expect_name("while")?;
        self.expect_punct("(")?;
        let test = self.parse_expression(true)?;
        self.expect_punct(")")?;
        self.eat_punct(";");
        Ok(RawNode::new("DoWhileStatement")
            .with("body", body)
            .with("test", test))
    }

    fn parse_jump(&mut self, kind: &str) -> ParseResult {
        self.advance();
        let label = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_identifier()?)
        };
        self.consume_semicolon()?;
        Ok(RawNode::new(kind).with("label", label))
    }

    fn parse_return(&mut self) -> ParseResult {
        self.expect_name("return")?;
        let argument = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression(true)?)
        };
        self.consume_semicolon()?;
        Ok(RawNode::new("ReturnStatement").with("argument", argument))
    }

    fn parse_with(&mut self) -> ParseResult {
        self.expect_name("with")?;
        self.expect_punct("(")?;
        let object = self.parse_expression(true)?;
        self.expect_punct(")")?;
        let body = self.parse_statement()?;
        Ok(RawNode::new("WithStatement")
            .with("object", object)
            .with("body", body))
    }

    fn parse_switch(&mut self) -> ParseResult {
        self.expect_name("switch")?;
        self.expect_punct("(")?;
        let discriminant = self.parse_expression(true)?;
        self.expect_punct(")")?;
        self.expect_punct("{")?;

        let mut cases = Vec::new();
        while !self.eat_punct("}") {
            let test = if self.eat_name("case") {
                Some(self.parse_expression(true)?)
            } else {
                self.expect_name("default")?;
                None
            };
            self.expect_punct(":")?;

            let mut consequent = Vec::new();
            while !(self.is_name("case") || self.is_name("default") || self.is_punct("}")) {
                if self.peek().kind == TokenKind::Eof {
                    return Err(self.unexpected());
                }
                consequent.push(self.parse_statement()?);
            }
            cases.push(
                RawNode::new("SwitchCase")
                    .with("test", test)
                    .with("consequent", consequent),
            );
        }

        Ok(RawNode::new("SwitchStatement")
            .with("discriminant", discriminant)
            .with("cases", cases))
    }

    fn parse_throw(&mut self) -> ParseResult {
        self.expect_name("throw")?;
        if self.peek().newline_before {
            return Err(self.unexpected());
        }
        let argument = self.parse_expression(true)?;
        self.consume_semicolon()?;
        Ok(RawNode::new("ThrowStatement").with("argument", argument))
    }

    fn parse_try(&mut self) -> ParseResult {
        let start = self.peek().clone();
        self.expect_name("try")?;
        let block = self.parse_block()?;

        let handler = if self.eat_name("catch") {
            self.expect_punct("(")?;
            let param = self.parse_identifier()?;
            self.expect_punct(")")?;
            let body = self.parse_block()?;
            Some(
                RawNode::new("CatchClause")
                    .with("param", param)
                    .with("body", body),
            )
        } else {
            None
        };
        let finalizer = if self.eat_name("finally") {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(ParseError::MissingHandler {
                line: start.line,
                column: start.column,
            });
        }

        Ok(RawNode::new("TryStatement")
            .with("block", block)
            .with("handler", handler)
            .with("finalizer", finalizer))
    }

    fn parse_function(&mut self, kind: &str, require_id: bool) -> ParseResult {
        self.expect_name("function")?;
        let id = if require_id || matches!(self.peek().kind, TokenKind::Name(_)) {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(RawNode::new(kind)
            .with("id", id)
            .with("params", params)
            .with("body", body)
            .with("generator", false)
            .with("expression", false))
    }

    fn parse_params(&mut self) -> Result<Vec<RawNode>, ParseError> {
        self.expect_punct("(")?;
        let mut params = Vec::new();
        while !self.eat_punct(")") {
            params.push(self.parse_identifier()?);
            if !self.is_punct(")") {
                self.expect_punct(",")?;
            }
        }
        Ok(params)
    }

    // ==================== Expressions ====================

    fn parse_expression(&mut self, allow_in: bool) -> ParseResult {
        let first = self.parse_assignment(allow_in)?;
        if !self.is_punct(",") {
            return Ok(first);
        }

        let mut expressions = vec![first];
        while self.eat_punct(",") {
            expressions.push(self.parse_assignment(allow_in)?);
        }
        Ok(RawNode::new("SequenceExpression").with("expressions", expressions))
    }

    fn parse_assignment(&mut self, allow_in: bool) -> ParseResult {
        let left = self.parse_conditional(allow_in)?;

        let operator = match &self.peek().kind {
            TokenKind::Punct(p) if ASSIGNMENT_OPERATORS.contains(p) => *p,
            _ => return Ok(left),
        };
        if !is_assignment_target(&left) {
            return Err(self.invalid_target("assignment"));
        }
        self.advance();
        let right = self.parse_assignment(allow_in)?;

        Ok(RawNode::new("AssignmentExpression")
            .with("operator", operator)
            .with("left", left)
            .with("right", right))
    }

    fn parse_conditional(&mut self, allow_in: bool) -> ParseResult {
        let test = self.parse_binary(1, allow_in)?;
        if !self.eat_punct("?") {
            return Ok(test);
        }
        let consequent = self.parse_assignment(true)?;
        self.expect_punct(":")?;
        let alternate = self.parse_assignment(allow_in)?;

        Ok(RawNode::new("ConditionalExpression")
            .with("test", test)
            .with("consequent", consequent)
            .with("alternate", alternate))
    }

    fn binary_operator(&self, allow_in: bool) -> Option<(&'static str, u8)> {
        let operator: &'static str = match &self.peek().kind {
            TokenKind::Punct(p) => *p,
            TokenKind::Name(n) if n == "instanceof" => "instanceof",
            TokenKind::Name(n) if n == "in" && allow_in => "in",
            _ => return None,
        };
        let precedence = match operator {
            "||" => 1,
            "&&" => 2,
            "|" => 3,
            "^" => 4,
            "&" => 5,
            "==" | "!=" | "===" | "!==" => 6,
            "<" | ">" | "<=" | ">=" | "instanceof" | "in" => 7,
            "<<" | ">>" | ">>>" => 8,
            "+" | "-" => 9,
            "*" | "/" | "%" => 10,
            _ => return None,
        };
        Some((operator, precedence))
    }

    fn parse_binary(&mut self, min_precedence: u8, allow_in: bool) -> ParseResult {
        let mut left = self.parse_unary()?;

        while let Some((operator, precedence)) = self.binary_operator(allow_in) {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_binary(precedence + 1, allow_in)?;
            let kind = if operator == "||" || operator == "&&" {
                "LogicalExpression"
            } else {
                "BinaryExpression"
            };
            left = RawNode::new(kind)
                .with("operator", operator)
                .with("left", left)
                .with("right", right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult {
        let operator: &'static str = match &self.peek().kind {
            TokenKind::Punct(p @ ("!" | "~" | "+" | "-" | "++" | "--")) => *p,
            TokenKind::Name(n) if n == "typeof" => "typeof",
            TokenKind::Name(n) if n == "void" => "void",
            TokenKind::Name(n) if n == "delete" => "delete",
            _ => return self.parse_postfix(),
        };
        self.advance();
        let argument = self.parse_unary()?;

        if operator == "++" || operator == "--" {
            if !is_assignment_target(&argument) {
                return Err(self.invalid_target("prefix operation"));
            }
            return Ok(RawNode::new("UpdateExpression")
                .with("operator", operator)
                .with("argument", argument)
                .with("prefix", true));
        }

        Ok(RawNode::new("UnaryExpression")
            .with("operator", operator)
            .with("argument", argument)
            .with("prefix", true))
    }

    fn parse_postfix(&mut self) -> ParseResult {
        let argument = self.parse_left_hand_side(true)?;
        let token = self.peek();
        let operator = match token.kind {
            TokenKind::Punct(p @ ("++" | "--")) if !token.newline_before => p,
            _ => return Ok(argument),
        };
        if !is_assignment_target(&argument) {
            return Err(self.invalid_target("postfix operation"));
        }
        self.advance();
        Ok(RawNode::new("UpdateExpression")
            .with("operator", operator)
            .with("argument", argument)
            .with("prefix", false))
    }

    fn parse_left_hand_side(&mut self, allow_call: bool) -> ParseResult {
        let mut expression = if self.is_name("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            if self.eat_punct(".") {
                let property = self.parse_identifier_name()?;
                expression = RawNode::new("MemberExpression")
                    .with("computed", false)
                    .with("object", expression)
                    .with("property", property);
            } else if self.eat_punct("[") {
                let property = self.parse_expression(true)?;
                self.expect_punct("]")?;
                expression = RawNode::new("MemberExpression")
                    .with("computed", true)
                    .with("object", expression)
                    .with("property", property);
            } else if allow_call && self.is_punct("(") {
                let arguments = self.parse_arguments()?;
                expression = RawNode::new("CallExpression")
                    .with("callee", expression)
                    .with("arguments", arguments);
            } else {
                return Ok(expression);
            }
        }
    }

    fn parse_new(&mut self) -> ParseResult {
        self.expect_name("new")?;
        let callee = self.parse_left_hand_side(false)?;
        let arguments = if self.is_punct("(") {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(RawNode::new("NewExpression")
            .with("callee", callee)
            .with("arguments", arguments))
    }

    fn parse_arguments(&mut self) -> Result<Vec<RawNode>, ParseError> {
        self.expect_punct("(")?;
        let mut arguments = Vec::new();
        while !self.eat_punct(")") {
            arguments.push(self.parse_assignment(true)?);
            if !self.is_punct(")") {
                self.expect_punct(",")?;
            }
        }
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> ParseResult {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(literal(Scalar::Number(n)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(literal(Scalar::String(s)))
            }
            TokenKind::Regex { pattern, flags } => {
                self.advance();
                Ok(literal(Scalar::Regex(RegexLiteral { pattern, flags })))
            }
            TokenKind::Punct("/" | "/=") => {
                self.rescan_regex()?;
                self.parse_primary()
            }
            TokenKind::Punct("(") => {
                self.advance();
                let expression = self.parse_expression(true)?;
                self.expect_punct(")")?;
                Ok(expression)
            }
            TokenKind::Punct("[") => self.parse_array(),
            TokenKind::Punct("{") => self.parse_object(),
            TokenKind::Name(name) => match name.as_str() {
                "this" => {
                    self.advance();
                    Ok(RawNode::new("ThisExpression"))
                }
                "true" | "false" => {
                    self.advance();
                    Ok(literal(Scalar::Bool(name == "true")))
                }
                "null" => {
                    self.advance();
                    Ok(literal(Scalar::Null))
                }
                "function" => self.parse_function("FunctionExpression", false),
                _ => self.parse_identifier(),
            },
            _ => Err(self.unexpected()),
        }
    }

    /// The lexer took this `/` for division; an operand starts here, so it opens a regex
    fn rescan_regex(&mut self) -> Result<(), ParseError> {
        let (tokens, lex_error) = Lexer::rescan_regex(self.source, self.peek())?;
        self.tokens.truncate(self.position);
        self.tokens.extend(tokens);
        self.lex_error = lex_error;
        Ok(())
    }

    fn parse_array(&mut self) -> ParseResult {
        self.expect_punct("[")?;
        let mut elements = Vec::new();
        while !self.eat_punct("]") {
            if self.eat_punct(",") {
                elements.push(RawValue::null());
                continue;
            }
            elements.push(RawValue::Node(self.parse_assignment(true)?));
            if !self.is_punct("]") {
                self.expect_punct(",")?;
            }
        }
        Ok(RawNode::new("ArrayExpression").with("elements", elements))
    }

    fn parse_object(&mut self) -> ParseResult {
        self.expect_punct("{")?;
        let mut properties = Vec::new();
        while !self.eat_punct("}") {
            properties.push(self.parse_property()?);
            if !self.is_punct("}") {
                self.expect_punct(",")?;
            }
        }
        Ok(RawNode::new("ObjectExpression").with("properties", properties))
    }

    fn parse_property(&mut self) -> ParseResult {
        let accessor = match &self.peek().kind {
            TokenKind::Name(n) if n == "get" || n == "set" => !matches!(
                self.peek_kind_at(1),
                Some(TokenKind::Punct(":" | "," | "}" | "("))
            ),
            _ => false,
        };

        if accessor {
            let kind = match self.advance().kind {
                TokenKind::Name(n) => n,
                _ => return Err(self.unexpected()),
            };
            let key = self.parse_property_key()?;
            let params = self.parse_params()?;
            let body = self.parse_block()?;
            let value = RawNode::new("FunctionExpression")
                .with("id", RawValue::null())
                .with("params", params)
                .with("body", body)
                .with("generator", false)
                .with("expression", false);
            return Ok(RawNode::new("Property")
                .with("key", key)
                .with("value", value)
                .with("kind", kind.as_str()));
        }

        let key = self.parse_property_key()?;
        self.expect_punct(":")?;
        let value = self.parse_assignment(true)?;
        Ok(RawNode::new("Property")
            .with("key", key)
            .with("value", value)
            .with("kind", "init"))
    }

    fn parse_property_key(&mut self) -> ParseResult {
        match self.peek().kind.clone() {
            TokenKind::String(s) => {
                self.advance();
                Ok(literal(Scalar::String(s)))
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(literal(Scalar::Number(n)))
            }
            _ => self.parse_identifier_name(),
        }
    }

    /// Identifier that must not be a reserved word
    fn parse_identifier(&mut self) -> ParseResult {
        match &self.peek().kind {
            TokenKind::Name(name) if !RESERVED.contains(&name.as_str()) => {
                let node = identifier(name);
                self.advance();
                Ok(node)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Any name, reserved words included (property positions)
    fn parse_identifier_name(&mut self) -> ParseResult {
        match &self.peek().kind {
            TokenKind::Name(name) => {
                let node = identifier(name);
                self.advance();
                Ok(node)
            }
            _ => Err(self.unexpected()),
        }
    }
}

fn literal(value: Scalar) -> RawNode {
    RawNode::new("Literal").with("value", value)
}

fn identifier(name: &str) -> RawNode {
    RawNode::new("Identifier").with("name", name)
}

fn is_assignment_target(node: &RawNode) -> bool {
    node.kind == "Identifier" || node.kind == "MemberExpression"
}
