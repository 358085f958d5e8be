//! Code generation - prints a raw ESTree tree back to JavaScript
//!
//! Layout follows escodegen: the same precedence table, the same spacing
//! rules when joining fragments, and the same handling of the optional
//! semicolon on the last statement of a program or block. Trees that went
//! through escodegen and trees that go through this generator print
//! identically for the supported syntax.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lexer::{is_identifier_part, is_line_terminator, is_whitespace};
use crate::raw::{RawNode, RawValue, Scalar};

/// Errors that can occur while printing a tree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error("Unknown node type: {0}")]
    UnknownNode(String),

    #[error("{kind} is missing required field `{field}`")]
    MissingField { kind: String, field: String },

    #[error("Numeric literal whose value is NaN")]
    NotANumber,
}

/// Preferred quote character for string literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quotes {
    #[default]
    Single,
    Double,
    /// Whichever needs fewer escapes
    Auto,
}

/// Printer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// One level of indentation
    pub indent: String,
    /// Number of indentation levels applied to every line
    pub base: usize,
    pub newline: String,
    pub space: String,
    pub quotes: Quotes,
    /// Drop all optional whitespace
    pub compact: bool,
    /// Keep parentheses on argument-less `new` expressions
    pub parentheses: bool,
    /// When false, the semicolon of the last statement in a program or block is omitted
    pub semicolons: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            base: 0,
            newline: "\n".to_string(),
            space: " ".to_string(),
            quotes: Quotes::Single,
            compact: false,
            parentheses: true,
            semicolons: true,
        }
    }
}

impl FormatOptions {
    /// Everything on one line, no optional whitespace
    pub fn compact() -> Self {
        Self {
            compact: true,
            ..Self::default()
        }
    }

    /// Default layout without terminal semicolons
    pub fn without_semicolons() -> Self {
        Self {
            semicolons: false,
            ..Self::default()
        }
    }
}

/// Print a program, statement or expression
pub fn generate(node: &RawNode, options: &FormatOptions) -> Result<String, CodegenError> {
    let mut generator = Generator::new(options);
    if is_statement_kind(&node.kind) {
        generator.statement(node, S_TFFF)
    } else if is_expression_kind(&node.kind) {
        generator.expression(node, precedence::SEQUENCE, E_TTT)
    } else {
        Err(CodegenError::UnknownNode(node.kind.clone()))
    }
}

pub fn is_statement_kind(kind: &str) -> bool {
    matches!(
        kind,
        "Program"
            | "BlockStatement"
            | "EmptyStatement"
            | "ExpressionStatement"
            | "IfStatement"
            | "LabeledStatement"
            | "BreakStatement"
            | "ContinueStatement"
            | "WithStatement"
            | "SwitchStatement"
            | "SwitchCase"
            | "ReturnStatement"
            | "ThrowStatement"
            | "TryStatement"
            | "CatchClause"
            | "WhileStatement"
            | "DoWhileStatement"
            | "ForStatement"
            | "ForInStatement"
            | "DebuggerStatement"
            | "FunctionDeclaration"
            | "VariableDeclaration"
            | "VariableDeclarator"
    )
}

pub fn is_expression_kind(kind: &str) -> bool {
    matches!(
        kind,
        "SequenceExpression"
            | "AssignmentExpression"
            | "ConditionalExpression"
            | "LogicalExpression"
            | "BinaryExpression"
            | "CallExpression"
            | "NewExpression"
            | "MemberExpression"
            | "UnaryExpression"
            | "UpdateExpression"
            | "FunctionExpression"
            | "ArrayExpression"
            | "ObjectExpression"
            | "Property"
            | "ThisExpression"
            | "Identifier"
            | "Literal"
    )
}

mod precedence {
    pub const SEQUENCE: u8 = 0;
    pub const ASSIGNMENT: u8 = 1;
    pub const CONDITIONAL: u8 = 2;
    pub const LOGICAL_OR: u8 = 3;
    pub const UNARY: u8 = 14;
    pub const POSTFIX: u8 = 15;
    pub const CALL: u8 = 17;
    pub const NEW: u8 = 18;
    pub const MEMBER: u8 = 20;
    pub const PRIMARY: u8 = 21;

    pub fn binary(operator: &str) -> Option<u8> {
        Some(match operator {
            "||" => 3,
            "&&" => 4,
            "|" => 5,
            "^" => 6,
            "&" => 7,
            "==" | "!=" | "===" | "!==" => 8,
            "<" | ">" | "<=" | ">=" | "instanceof" | "in" => 9,
            "<<" | ">>" | ">>>" => 10,
            "+" | "-" => 11,
            "*" | "/" | "%" => 12,
            _ => return None,
        })
    }
}

// Expression flags
const F_ALLOW_IN: u8 = 1;
const F_ALLOW_CALL: u8 = 1 << 1;
const F_ALLOW_UNPARATH_NEW: u8 = 1 << 2;
// Statement flags
const F_SEMICOLON_OPT: u8 = 1 << 5;

const E_TTT: u8 = F_ALLOW_IN | F_ALLOW_CALL | F_ALLOW_UNPARATH_NEW;
const E_FTT: u8 = F_ALLOW_CALL | F_ALLOW_UNPARATH_NEW;
const E_TTF: u8 = F_ALLOW_IN | F_ALLOW_CALL;
const E_TFF: u8 = F_ALLOW_IN;
const E_TFT: u8 = F_ALLOW_IN | F_ALLOW_UNPARATH_NEW;

const S_TFFF: u8 = F_ALLOW_IN;
const S_TFFT: u8 = F_ALLOW_IN | F_SEMICOLON_OPT;
const S_FFFF: u8 = 0;

type GenResult = Result<String, CodegenError>;

struct Generator {
    indent: String,
    base: String,
    newline: String,
    space: String,
    quotes: Quotes,
    parentheses: bool,
    semicolons: bool,
}

impl Generator {
    fn new(options: &FormatOptions) -> Self {
        let (indent, base, newline, space) = if options.compact {
            (String::new(), String::new(), String::new(), String::new())
        } else {
            (
                options.indent.clone(),
                options.indent.repeat(options.base),
                options.newline.clone(),
                options.space.clone(),
            )
        };
        Self {
            indent,
            base,
            newline,
            space,
            quotes: options.quotes,
            parentheses: options.parentheses,
            semicolons: options.semicolons,
        }
    }

    // ==================== Layout helpers ====================

    fn with_indent<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = self.base.clone();
        let indent = self.indent.clone();
        self.base.push_str(&indent);
        let result = f(self);
        self.base = previous;
        result
    }

    fn add_indent(&self, text: &str) -> String {
        format!("{}{}", self.base, text)
    }

    fn no_empty_space(&self) -> String {
        if self.space.is_empty() {
            " ".to_string()
        } else {
            self.space.clone()
        }
    }

    fn semicolon(&self, flags: u8) -> &'static str {
        if !self.semicolons && flags & F_SEMICOLON_OPT != 0 {
            ""
        } else {
            ";"
        }
    }

    /// Concatenate two fragments with the least whitespace that keeps them apart
    fn join(&self, left: &str, right: &str) -> String {
        let (Some(last), Some(first)) = (left.chars().last(), right.chars().next()) else {
            return format!("{}{}", left, right);
        };

        if ((last == '+' || last == '-') && last == first)
            || (is_identifier_part(last) && is_identifier_part(first))
            || (last == '/' && first == 'i')
        {
            format!("{}{}{}", left, self.no_empty_space(), right)
        } else if is_whitespace(last)
            || is_line_terminator(last)
            || is_whitespace(first)
            || is_line_terminator(first)
        {
            format!("{}{}", left, right)
        } else {
            format!("{}{}{}", left, self.space, right)
        }
    }

    fn maybe_block(&mut self, stmt: &RawNode, flags: u8) -> GenResult {
        match stmt.kind.as_str() {
            "BlockStatement" => {
                let block = self.statement(stmt, flags)?;
                Ok(format!("{}{}", self.space, block))
            }
            "EmptyStatement" => Ok(";".to_string()),
            _ => self.with_indent(|g| -> GenResult {
                let body = g.statement(stmt, flags)?;
                Ok(format!("{}{}", g.newline, g.add_indent(&body)))
            }),
        }
    }

    fn maybe_block_suffix(&self, stmt: &RawNode, result: String) -> String {
        let ends = ends_with_line_terminator(&result);
        if stmt.kind == "BlockStatement" && !ends {
            format!("{}{}", result, self.space)
        } else if ends {
            format!("{}{}", result, self.base)
        } else {
            format!("{}{}{}", result, self.newline, self.base)
        }
    }

    // ==================== Statements ====================

    fn statement(&mut self, stmt: &RawNode, flags: u8) -> GenResult {
        match stmt.kind.as_str() {
            "Program" => self.program(stmt),
            "BlockStatement" => self.block(stmt),
            "EmptyStatement" => Ok(";".to_string()),
            "ExpressionStatement" => self.expression_statement(stmt, flags),
            "VariableDeclaration" => self.variable_declaration(stmt, flags),
            "VariableDeclarator" => self.variable_declarator(stmt, flags),
            "IfStatement" => self.if_statement(stmt, flags),
            "LabeledStatement" => {
                let label = name_of(required(stmt, "label")?)?;
                let body_flags = if flags & F_SEMICOLON_OPT != 0 { S_TFFT } else { S_TFFF };
                let body = self.maybe_block(required(stmt, "body")?, body_flags)?;
                Ok(format!("{}:{}", label, body))
            }
            "BreakStatement" => self.jump("break", stmt, flags),
            "ContinueStatement" => self.jump("continue", stmt, flags),
            "ReturnStatement" => match stmt.node("argument") {
                Some(argument) => {
                    let argument = self.expression(argument, precedence::SEQUENCE, E_TTT)?;
                    Ok(format!("{}{}", self.join("return", &argument), self.semicolon(flags)))
                }
                None => Ok(format!("return{}", self.semicolon(flags))),
            },
            "ThrowStatement" => {
                let argument =
                    self.expression(required(stmt, "argument")?, precedence::SEQUENCE, E_TTT)?;
                Ok(format!("{}{}", self.join("throw", &argument), self.semicolon(flags)))
            }
            "DebuggerStatement" => Ok(format!("debugger{}", self.semicolon(flags))),
            "WithStatement" => {
                let object = self.with_indent(|g| {
                    g.expression(required(stmt, "object")?, precedence::SEQUENCE, E_TTT)
                })?;
                let body_flags = if flags & F_SEMICOLON_OPT != 0 { S_TFFT } else { S_TFFF };
                let body = self.maybe_block(required(stmt, "body")?, body_flags)?;
                Ok(format!("with{}({}){}", self.space, object, body))
            }
            "WhileStatement" => {
                let test = self.with_indent(|g| {
                    g.expression(required(stmt, "test")?, precedence::SEQUENCE, E_TTT)
                })?;
                let body_flags = if flags & F_SEMICOLON_OPT != 0 { S_TFFT } else { S_TFFF };
                let body = self.maybe_block(required(stmt, "body")?, body_flags)?;
                Ok(format!("while{}({}){}", self.space, test, body))
            }
            "DoWhileStatement" => {
                let body_node = required(stmt, "body")?;
                let body = self.maybe_block(body_node, S_TFFF)?;
                let result = self.maybe_block_suffix(body_node, self.join("do", &body));
                let test = self.expression(required(stmt, "test")?, precedence::SEQUENCE, E_TTT)?;
                let tail = format!("while{}({}){}", self.space, test, self.semicolon(flags));
                Ok(self.join(&result, &tail))
            }
            "ForStatement" => self.for_statement(stmt, flags),
            "ForInStatement" => self.for_in_statement(stmt, flags),
            "SwitchStatement" => self.switch_statement(stmt),
            "SwitchCase" => self.switch_case(stmt, flags),
            "TryStatement" => self.try_statement(stmt),
            "CatchClause" => {
                let param = self.with_indent(|g| {
                    g.expression(required(stmt, "param")?, precedence::SEQUENCE, E_TTT)
                })?;
                let body = self.maybe_block(required(stmt, "body")?, S_TFFF)?;
                Ok(format!("catch{}({}){}", self.space, param, body))
            }
            "FunctionDeclaration" => {
                let id = match stmt.node("id") {
                    Some(id) => name_of(id)?.to_string(),
                    None => String::new(),
                };
                let body = self.function_body(stmt)?;
                Ok(format!("function{}{}{}", self.no_empty_space(), id, body))
            }
            other => Err(CodegenError::UnknownNode(other.to_string())),
        }
    }

    fn program(&mut self, stmt: &RawNode) -> GenResult {
        let body = nodes(stmt, "body")?;
        let mut result = String::new();
        for (i, item) in body.iter().enumerate() {
            let mut flags = S_TFFF;
            if i + 1 == body.len() {
                flags |= F_SEMICOLON_OPT;
            }
            let statement = self.statement(item, flags)?;
            let fragment = self.add_indent(&statement);
            result.push_str(&fragment);
            if i + 1 < body.len() && !ends_with_line_terminator(&fragment) {
                result.push_str(&self.newline);
            }
        }
        Ok(result)
    }

    fn block(&mut self, stmt: &RawNode) -> GenResult {
        let body = nodes(stmt, "body")?;
        let mut result = format!("{{{}", self.newline);
        self.with_indent(|g| -> Result<(), CodegenError> {
            for (i, item) in body.iter().enumerate() {
                let mut flags = S_TFFF;
                if i + 1 == body.len() {
                    flags |= F_SEMICOLON_OPT;
                }
                let statement = g.statement(item, flags)?;
                let fragment = g.add_indent(&statement);
                result.push_str(&fragment);
                if !ends_with_line_terminator(&fragment) {
                    result.push_str(&g.newline);
                }
            }
            Ok(())
        })?;
        result.push_str(&self.add_indent("}"));
        Ok(result)
    }

    fn expression_statement(&mut self, stmt: &RawNode, flags: u8) -> GenResult {
        let expression =
            self.expression(required(stmt, "expression")?, precedence::SEQUENCE, E_TTT)?;
        // A leading `{` or `function` would be read back as a statement
        if expression.starts_with('{') || is_function_prefixed(&expression) {
            Ok(format!("({}){}", expression, self.semicolon(flags)))
        } else {
            Ok(format!("{}{}", expression, self.semicolon(flags)))
        }
    }

    fn variable_declaration(&mut self, stmt: &RawNode, flags: u8) -> GenResult {
        let kind = stmt.str("kind").unwrap_or("var");
        let declarations = nodes(stmt, "declarations")?;
        let body_flags = if flags & F_ALLOW_IN != 0 { S_TFFF } else { S_FFFF };

        let mut result = kind.to_string();
        let mut render = |g: &mut Self| -> Result<(), CodegenError> {
            for (i, declarator) in declarations.iter().enumerate() {
                if i == 0 {
                    result.push_str(&g.no_empty_space());
                } else {
                    result.push(',');
                    result.push_str(&g.space);
                }
                result.push_str(&g.statement(declarator, body_flags)?);
            }
            Ok(())
        };
        if declarations.len() > 1 {
            self.with_indent(render)?;
        } else {
            render(self)?;
        }

        result.push_str(self.semicolon(flags));
        Ok(result)
    }

    fn variable_declarator(&mut self, stmt: &RawNode, flags: u8) -> GenResult {
        let item_flags = if flags & F_ALLOW_IN != 0 { E_TTT } else { E_FTT };
        let id = self.expression(required(stmt, "id")?, precedence::ASSIGNMENT, item_flags)?;
        match stmt.node("init") {
            Some(init) => {
                let init = self.expression(init, precedence::ASSIGNMENT, item_flags)?;
                Ok(format!("{}{}={}{}", id, self.space, self.space, init))
            }
            None => Ok(id),
        }
    }

    fn if_statement(&mut self, stmt: &RawNode, flags: u8) -> GenResult {
        let test = self.with_indent(|g| {
            g.expression(required(stmt, "test")?, precedence::SEQUENCE, E_TTT)
        })?;
        let mut result = format!("if{}({})", self.space, test);
        let body_flags = if flags & F_SEMICOLON_OPT != 0 { S_TFFT } else { S_TFFF };
        let consequent = required(stmt, "consequent")?;

        match stmt.node("alternate") {
            Some(alternate) => {
                result.push_str(&self.maybe_block(consequent, S_TFFF)?);
                result = self.maybe_block_suffix(consequent, result);
                let tail = if alternate.kind == "IfStatement" {
                    format!("else {}", self.statement(alternate, body_flags)?)
                } else {
                    let block = self.maybe_block(alternate, body_flags)?;
                    self.join("else", &block)
                };
                Ok(self.join(&result, &tail))
            }
            None => {
                result.push_str(&self.maybe_block(consequent, body_flags)?);
                Ok(result)
            }
        }
    }

    fn jump(&self, keyword: &str, stmt: &RawNode, flags: u8) -> GenResult {
        match stmt.node("label") {
            Some(label) => Ok(format!(
                "{} {}{}",
                keyword,
                name_of(label)?,
                self.semicolon(flags)
            )),
            None => Ok(format!("{}{}", keyword, self.semicolon(flags))),
        }
    }

    fn for_statement(&mut self, stmt: &RawNode, flags: u8) -> GenResult {
        let head = self.with_indent(|g| -> GenResult {
            let mut head = format!("for{}(", g.space);
            match stmt.node("init") {
                Some(init) if init.kind == "VariableDeclaration" => {
                    head.push_str(&g.statement(init, S_FFFF)?);
                }
                Some(init) => {
                    head.push_str(&g.expression(init, precedence::SEQUENCE, E_FTT)?);
                    head.push(';');
                }
                None => head.push(';'),
            }
            if let Some(test) = stmt.node("test") {
                let test = g.expression(test, precedence::SEQUENCE, E_TTT)?;
                head.push_str(&g.space);
                head.push_str(&test);
            }
            head.push(';');
            if let Some(update) = stmt.node("update") {
                let update = g.expression(update, precedence::SEQUENCE, E_TTT)?;
                head.push_str(&g.space);
                head.push_str(&update);
            }
            head.push(')');
            Ok(head)
        })?;

        let body_flags = if flags & F_SEMICOLON_OPT != 0 { S_TFFT } else { S_TFFF };
        let body = self.maybe_block(required(stmt, "body")?, body_flags)?;
        Ok(format!("{}{}", head, body))
    }

    fn for_in_statement(&mut self, stmt: &RawNode, flags: u8) -> GenResult {
        let head = self.with_indent(|g| -> GenResult {
            let left_node = required(stmt, "left")?;
            let left = if left_node.kind == "VariableDeclaration" {
                let kind = left_node.str("kind").unwrap_or("var");
                let declarators = nodes(left_node, "declarations")?;
                let first = declarators.first().ok_or_else(|| CodegenError::MissingField {
                    kind: left_node.kind.clone(),
                    field: "declarations".to_string(),
                })?;
                g.with_indent(|g| -> GenResult {
                    Ok(format!("{}{}{}", kind, g.no_empty_space(), g.statement(first, S_FFFF)?))
                })?
            } else {
                g.expression(left_node, precedence::CALL, E_TTT)?
            };
            let head = g.join(&format!("for{}({}", g.space, left), "in");
            let right = g.expression(required(stmt, "right")?, precedence::ASSIGNMENT, E_TTT)?;
            Ok(format!("{})", g.join(&head, &right)))
        })?;

        let body = self.maybe_block(required(stmt, "body")?, flags)?;
        Ok(format!("{}{}", head, body))
    }

    fn switch_statement(&mut self, stmt: &RawNode) -> GenResult {
        let discriminant = self.with_indent(|g| {
            g.expression(required(stmt, "discriminant")?, precedence::SEQUENCE, E_TTT)
        })?;
        let mut result = format!(
            "switch{}({}){}{{{}",
            self.space, discriminant, self.space, self.newline
        );

        let cases = nodes(stmt, "cases")?;
        for (i, case) in cases.iter().enumerate() {
            let mut flags = S_TFFF;
            if i + 1 == cases.len() {
                flags |= F_SEMICOLON_OPT;
            }
            let statement = self.statement(case, flags)?;
            let fragment = self.add_indent(&statement);
            result.push_str(&fragment);
            if !ends_with_line_terminator(&fragment) {
                result.push_str(&self.newline);
            }
        }
        result.push_str(&self.add_indent("}"));
        Ok(result)
    }

    fn switch_case(&mut self, stmt: &RawNode, flags: u8) -> GenResult {
        self.with_indent(|g| -> GenResult {
            let mut result = match stmt.node("test") {
                Some(test) => {
                    let test = g.expression(test, precedence::SEQUENCE, E_TTT)?;
                    format!("{}:", g.join("case", &test))
                }
                None => "default:".to_string(),
            };

            let consequent = nodes(stmt, "consequent")?;
            let mut start = 0;
            if let Some(first) = consequent.first() {
                if first.kind == "BlockStatement" {
                    result.push_str(&g.maybe_block(first, S_TFFF)?);
                    start = 1;
                }
            }
            if start != consequent.len() && !ends_with_line_terminator(&result) {
                result.push_str(&g.newline);
            }

            for (i, item) in consequent.iter().enumerate().skip(start) {
                let mut body_flags = S_TFFF;
                if i + 1 == consequent.len() && flags & F_SEMICOLON_OPT != 0 {
                    body_flags |= F_SEMICOLON_OPT;
                }
                let statement = g.statement(item, body_flags)?;
                let fragment = g.add_indent(&statement);
                result.push_str(&fragment);
                if i + 1 != consequent.len() && !ends_with_line_terminator(&fragment) {
                    result.push_str(&g.newline);
                }
            }
            Ok(result)
        })
    }

    fn try_statement(&mut self, stmt: &RawNode) -> GenResult {
        let block_node = required(stmt, "block")?;
        let block = self.maybe_block(block_node, S_TFFF)?;
        let mut result = self.maybe_block_suffix(block_node, format!("try{}", block));

        if let Some(handler) = stmt.node("handler") {
            let clause = self.statement(handler, S_TFFF)?;
            result = self.join(&result, &clause);
            if stmt.node("finalizer").is_some() {
                result = self.maybe_block_suffix(required(handler, "body")?, result);
            }
        }
        if let Some(finalizer) = stmt.node("finalizer") {
            let finalizer = self.maybe_block(finalizer, S_TFFF)?;
            result = self.join(&result, &format!("finally{}", finalizer));
        }
        Ok(result)
    }

    fn function_body(&mut self, node: &RawNode) -> GenResult {
        let params = nodes(node, "params")?;
        let mut result = "(".to_string();
        for (i, param) in params.iter().enumerate() {
            result.push_str(&self.expression(param, precedence::ASSIGNMENT, E_TTT)?);
            if i + 1 < params.len() {
                result.push(',');
                result.push_str(&self.space);
            }
        }
        result.push(')');
        result.push_str(&self.maybe_block(required(node, "body")?, S_TFFF)?);
        Ok(result)
    }

    // ==================== Expressions ====================

    fn expression(&mut self, expr: &RawNode, precedence: u8, flags: u8) -> GenResult {
        match expr.kind.as_str() {
            "SequenceExpression" => {
                let flags = if precedence::SEQUENCE < precedence {
                    flags | F_ALLOW_IN
                } else {
                    flags
                };
                let items = nodes(expr, "expressions")?;
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(self.expression(item, precedence::ASSIGNMENT, flags)?);
                }
                let separator = format!(",{}", self.space);
                Ok(parenthesize(parts.join(&separator), precedence::SEQUENCE, precedence))
            }
            "AssignmentExpression" => {
                let flags = if precedence::ASSIGNMENT < precedence {
                    flags | F_ALLOW_IN
                } else {
                    flags
                };
                let left = self.expression(required(expr, "left")?, precedence::CALL, flags)?;
                let right =
                    self.expression(required(expr, "right")?, precedence::ASSIGNMENT, flags)?;
                let operator = expr.str("operator").unwrap_or("=");
                let text = format!("{}{}{}{}{}", left, self.space, operator, self.space, right);
                Ok(parenthesize(text, precedence::ASSIGNMENT, precedence))
            }
            "ConditionalExpression" => {
                let flags = if precedence::CONDITIONAL < precedence {
                    flags | F_ALLOW_IN
                } else {
                    flags
                };
                let test = self.expression(required(expr, "test")?, precedence::LOGICAL_OR, flags)?;
                let consequent =
                    self.expression(required(expr, "consequent")?, precedence::ASSIGNMENT, flags)?;
                let alternate =
                    self.expression(required(expr, "alternate")?, precedence::ASSIGNMENT, flags)?;
                let s = &self.space;
                let text = format!("{test}{s}?{s}{consequent}{s}:{s}{alternate}");
                Ok(parenthesize(text, precedence::CONDITIONAL, precedence))
            }
            "LogicalExpression" | "BinaryExpression" => self.binary(expr, precedence, flags),
            "CallExpression" => {
                let callee = self.expression(required(expr, "callee")?, precedence::CALL, E_TTF)?;
                let arguments = self.arguments(expr)?;
                let text = format!("{}{}", callee, arguments);
                if flags & F_ALLOW_CALL == 0 {
                    return Ok(format!("({})", text));
                }
                Ok(parenthesize(text, precedence::CALL, precedence))
            }
            "NewExpression" => {
                let argument_count = nodes(expr, "arguments")?.len();
                let item_flags = if flags & F_ALLOW_UNPARATH_NEW != 0
                    && !self.parentheses
                    && argument_count == 0
                {
                    E_TFT
                } else {
                    E_TFF
                };
                let callee =
                    self.expression(required(expr, "callee")?, precedence::NEW, item_flags)?;
                let mut text = self.join("new", &callee);
                if flags & F_ALLOW_UNPARATH_NEW == 0 || self.parentheses || argument_count > 0 {
                    text.push_str(&self.arguments(expr)?);
                }
                Ok(parenthesize(text, precedence::NEW, precedence))
            }
            "MemberExpression" => self.member(expr, precedence, flags),
            "UnaryExpression" => {
                let operator = expr.str("operator").unwrap_or("!");
                let argument =
                    self.expression(required(expr, "argument")?, precedence::UNARY, E_TTT)?;
                let text = if self.space.is_empty() || operator.len() > 2 {
                    self.join(operator, &argument)
                } else {
                    let last = operator.chars().last();
                    let first = argument.chars().next();
                    match (last, first) {
                        (Some(l), Some(f))
                            if ((l == '+' || l == '-') && l == f)
                                || (is_identifier_part(l) && is_identifier_part(f)) =>
                        {
                            format!("{}{}{}", operator, self.no_empty_space(), argument)
                        }
                        _ => format!("{}{}", operator, argument),
                    }
                };
                Ok(parenthesize(text, precedence::UNARY, precedence))
            }
            "UpdateExpression" => {
                let operator = expr.str("operator").unwrap_or("++");
                let argument = required(expr, "argument")?;
                if expr.bool("prefix") {
                    let argument = self.expression(argument, precedence::UNARY, E_TTT)?;
                    let text = format!("{}{}", operator, argument);
                    Ok(parenthesize(text, precedence::UNARY, precedence))
                } else {
                    let argument = self.expression(argument, precedence::POSTFIX, E_TTT)?;
                    let text = format!("{}{}", argument, operator);
                    Ok(parenthesize(text, precedence::POSTFIX, precedence))
                }
            }
            "FunctionExpression" => {
                let body = self.function_body(expr)?;
                match expr.node("id") {
                    Some(id) => {
                        let name = name_of(id)?;
                        Ok(format!("function{}{}{}", self.no_empty_space(), name, body))
                    }
                    None => Ok(format!("function{}{}", self.space, body)),
                }
            }
            "ArrayExpression" => self.array(expr),
            "ObjectExpression" => self.object(expr),
            "Property" => self.property(expr),
            "ThisExpression" => Ok("this".to_string()),
            "Identifier" => Ok(name_of(expr)?.to_string()),
            "Literal" => self.literal(expr, precedence),
            other => Err(CodegenError::UnknownNode(other.to_string())),
        }
    }

    fn binary(&mut self, expr: &RawNode, precedence: u8, flags: u8) -> GenResult {
        let operator = expr.str("operator").unwrap_or("+");
        let current = precedence::binary(operator).unwrap_or(precedence::PRIMARY);
        let flags = if current < precedence { flags | F_ALLOW_IN } else { flags };

        let left = self.expression(required(expr, "left")?, current, flags)?;
        let word_operator = operator.chars().next().is_some_and(is_identifier_part);
        let mut text = if left.ends_with('/') && word_operator {
            // `/re/ in x` must not fuse the regex flags with the operator
            format!("{}{}{}", left, self.no_empty_space(), operator)
        } else {
            self.join(&left, operator)
        };

        let right = self.expression(required(expr, "right")?, current + 1, flags)?;
        if (operator == "/" && right.starts_with('/'))
            || (operator.ends_with('<') && right.starts_with("!--"))
        {
            text.push_str(&self.no_empty_space());
            text.push_str(&right);
        } else {
            text = self.join(&text, &right);
        }

        if operator == "in" && flags & F_ALLOW_IN == 0 {
            return Ok(format!("({})", text));
        }
        Ok(parenthesize(text, current, precedence))
    }

    fn arguments(&mut self, expr: &RawNode) -> GenResult {
        let arguments = nodes(expr, "arguments")?;
        let mut result = "(".to_string();
        for (i, argument) in arguments.iter().enumerate() {
            result.push_str(&self.expression(argument, precedence::ASSIGNMENT, E_TTT)?);
            if i + 1 < arguments.len() {
                result.push(',');
                result.push_str(&self.space);
            }
        }
        result.push(')');
        Ok(result)
    }

    fn member(&mut self, expr: &RawNode, precedence: u8, flags: u8) -> GenResult {
        let object_node = required(expr, "object")?;
        let object_flags = if flags & F_ALLOW_CALL != 0 { E_TTF } else { E_TFF };
        let mut result = self.expression(object_node, precedence::CALL, object_flags)?;
        let property = required(expr, "property")?;

        if expr.bool("computed") {
            let property_flags = if flags & F_ALLOW_CALL != 0 { E_TTT } else { E_TFT };
            let property = self.expression(property, precedence::SEQUENCE, property_flags)?;
            result = format!("{}[{}]", result, property);
        } else {
            // `1.toString()` would lex as a malformed number
            let numeric_object = object_node.kind == "Literal"
                && matches!(object_node.scalar("value"), Some(Scalar::Number(_)));
            if numeric_object
                && !result.contains('.')
                && !result.contains(['e', 'E', 'x', 'X'])
                && result.chars().last().is_some_and(|c| c.is_ascii_digit())
                && !(result.len() >= 2 && result.starts_with('0'))
            {
                result.push(' ');
            }
            result = format!("{}.{}", result, name_of(property)?);
        }
        Ok(parenthesize(result, precedence::MEMBER, precedence))
    }

    fn array(&mut self, expr: &RawNode) -> GenResult {
        let elements = expr.list("elements");
        if elements.is_empty() {
            return Ok("[]".to_string());
        }

        let multiline = elements.len() > 1;
        let mut result = format!("[{}", if multiline { self.newline.as_str() } else { "" });
        self.with_indent(|g| -> Result<(), CodegenError> {
            for (i, element) in elements.iter().enumerate() {
                match element {
                    RawValue::Node(node) => {
                        if multiline {
                            result.push_str(&g.base);
                        }
                        result.push_str(&g.expression(node, precedence::ASSIGNMENT, E_TTT)?);
                    }
                    _ => {
                        // Hole
                        if multiline {
                            result.push_str(&g.base);
                        }
                        if i + 1 == elements.len() {
                            result.push(',');
                        }
                    }
                }
                if i + 1 < elements.len() {
                    result.push(',');
                    result.push_str(if multiline { &g.newline } else { &g.space });
                }
            }
            Ok(())
        })?;

        if multiline && !ends_with_line_terminator(&result) {
            result.push_str(&self.newline);
        }
        if multiline {
            result.push_str(&self.base);
        }
        result.push(']');
        Ok(result)
    }

    fn object(&mut self, expr: &RawNode) -> GenResult {
        let properties = nodes(expr, "properties")?;
        let Some(first) = properties.first() else {
            return Ok("{}".to_string());
        };

        let multiline = properties.len() > 1;
        let first = self.with_indent(|g| g.expression(first, precedence::SEQUENCE, E_TTT))?;
        if !multiline && !has_line_terminator(&first) {
            return Ok(format!("{{{}{}{}}}", self.space, first, self.space));
        }

        let mut result = self.with_indent(|g| -> GenResult {
            let mut result = format!("{{{}{}{}", g.newline, g.base, first);
            if multiline {
                result.push(',');
                result.push_str(&g.newline);
                for (i, property) in properties.iter().enumerate().skip(1) {
                    result.push_str(&g.base);
                    result.push_str(&g.expression(property, precedence::SEQUENCE, E_TTT)?);
                    if i + 1 < properties.len() {
                        result.push(',');
                        result.push_str(&g.newline);
                    }
                }
            }
            Ok(result)
        })?;

        if !ends_with_line_terminator(&result) {
            result.push_str(&self.newline);
        }
        result.push_str(&self.base);
        result.push('}');
        Ok(result)
    }

    fn property(&mut self, expr: &RawNode) -> GenResult {
        let key_node = required(expr, "key")?;
        let key = if expr.bool("computed") {
            format!("[{}]", self.expression(key_node, precedence::SEQUENCE, E_TTT)?)
        } else {
            self.expression(key_node, precedence::SEQUENCE, E_TTT)?
        };
        let value = required(expr, "value")?;

        match expr.str("kind") {
            Some(kind @ ("get" | "set")) => {
                let body = self.function_body(value)?;
                Ok(format!("{}{}{}{}", kind, self.no_empty_space(), key, body))
            }
            _ => {
                let value = self.expression(value, precedence::ASSIGNMENT, E_TTT)?;
                Ok(format!("{}:{}{}", key, self.space, value))
            }
        }
    }

    fn literal(&self, expr: &RawNode, precedence: u8) -> GenResult {
        match expr.scalar("value") {
            Some(Scalar::Regex(regex)) => Ok(format!("/{}/{}", regex.pattern, regex.flags)),
            Some(Scalar::String(s)) => Ok(escape_string(s, self.quotes)),
            Some(Scalar::Number(n)) => {
                if n.is_nan() {
                    return Err(CodegenError::NotANumber);
                }
                if n.is_sign_negative() && *n != 0.0 {
                    // Negative values only arise from setters; print them as a negation
                    let text = format!("-{}", number_to_string(-n));
                    return Ok(parenthesize(text, precedence::UNARY, precedence));
                }
                Ok(number_to_string(*n))
            }
            Some(Scalar::Bool(b)) => Ok(b.to_string()),
            Some(Scalar::Null) | None => Ok("null".to_string()),
            Some(Scalar::Opaque(json)) => Ok(json.to_string()),
        }
    }
}

// ==================== Free helpers ====================

fn parenthesize(text: String, current: u8, should: u8) -> String {
    if current < should {
        format!("({})", text)
    } else {
        text
    }
}

fn required<'n>(node: &'n RawNode, field: &str) -> Result<&'n RawNode, CodegenError> {
    node.node(field).ok_or_else(|| CodegenError::MissingField {
        kind: node.kind.clone(),
        field: field.to_string(),
    })
}

fn nodes<'n>(node: &'n RawNode, field: &str) -> Result<Vec<&'n RawNode>, CodegenError> {
    node.list(field)
        .iter()
        .map(|value| {
            value.as_node().ok_or_else(|| CodegenError::MissingField {
                kind: node.kind.clone(),
                field: field.to_string(),
            })
        })
        .collect()
}

fn name_of(node: &RawNode) -> Result<&str, CodegenError> {
    node.str("name").ok_or_else(|| CodegenError::MissingField {
        kind: node.kind.clone(),
        field: "name".to_string(),
    })
}

fn ends_with_line_terminator(text: &str) -> bool {
    text.chars().last().is_some_and(is_line_terminator)
}

fn has_line_terminator(text: &str) -> bool {
    text.chars().any(is_line_terminator)
}

fn is_function_prefixed(text: &str) -> bool {
    text.strip_prefix("function").is_some_and(|rest| {
        rest.chars()
            .next()
            .is_some_and(|c| c == '(' || c == '*' || is_whitespace(c) || is_line_terminator(c))
    })
}

/// Quote and escape a string literal
pub fn escape_string(value: &str, quotes: Quotes) -> String {
    let mut escaped = String::new();
    let mut single_quotes = 0;
    let mut double_quotes = 0;
    let chars: Vec<char> = value.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        match ch {
            '\'' => single_quotes += 1,
            '"' => double_quotes += 1,
            '\\' => {
                escaped.push_str("\\\\");
                continue;
            }
            '\n' => {
                escaped.push_str("\\n");
                continue;
            }
            '\r' => {
                escaped.push_str("\\r");
                continue;
            }
            '\u{2028}' => {
                escaped.push_str("\\u2028");
                continue;
            }
            '\u{2029}' => {
                escaped.push_str("\\u2029");
                continue;
            }
            c if !is_identifier_part(c) && ((c as u32) < 0x20 || (c as u32) > 0x7E) => {
                let next = chars.get(i + 1).copied();
                escaped.push_str(&escape_disallowed(c, next));
                continue;
            }
            _ => {}
        }
        escaped.push(ch);
    }

    let single = !(quotes == Quotes::Double
        || (quotes == Quotes::Auto && double_quotes < single_quotes));
    let quote = if single { '\'' } else { '"' };
    let needs_escape = if single { single_quotes } else { double_quotes };

    let mut result = String::with_capacity(escaped.len() + 2);
    result.push(quote);
    if needs_escape == 0 {
        result.push_str(&escaped);
    } else {
        for ch in escaped.chars() {
            if ch == quote {
                result.push('\\');
            }
            result.push(ch);
        }
    }
    result.push(quote);
    result
}

fn escape_disallowed(ch: char, next: Option<char>) -> String {
    match ch {
        '\u{8}' => "\\b".to_string(),
        '\u{c}' => "\\f".to_string(),
        '\t' => "\\t".to_string(),
        '\0' if !next.is_some_and(|c| c.is_ascii_digit()) => "\\0".to_string(),
        '\u{b}' => "\\x0B".to_string(),
        c if (c as u32) <= 0xFF => format!("\\x{:02X}", c as u32),
        c => {
            let mut units = [0u16; 2];
            c.encode_utf16(&mut units)
                .iter()
                .map(|unit| format!("\\u{:04X}", unit))
                .collect()
        }
    }
}

/// Format a non-negative number the way JavaScript's `String(n)` does
pub fn number_to_string(value: f64) -> String {
    if value.is_infinite() {
        return "1e+400".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    // Shortest round-trip digits and decimal exponent
    let formatted = format!("{:e}", value);
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    let k = digits.len() as i32;
    let n = exponent + 1;

    if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        format!("{}.{}", &digits[..n as usize], &digits[n as usize..])
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let sign = if n - 1 < 0 { '-' } else { '+' };
        let (head, tail) = digits.split_at(1);
        if tail.is_empty() {
            format!("{}e{}{}", head, sign, (n - 1).abs())
        } else {
            format!("{}.{}e{}{}", head, tail, sign, (n - 1).abs())
        }
    }
}
