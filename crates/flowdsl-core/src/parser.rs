//! Recursive-descent parser: token stream to [`Program`]
//!
//! The parser is single-shot: the first grammar violation aborts with an
//! [`Error::Parse`] pointing at the offending token. String literals that
//! contain `${` become [`Expression::Template`]; their interior is not
//! parsed here.

use serde_json::{Number, Value};

use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer;
use crate::token::{Token, TokenKind};

/// Parse a token stream into a program.
pub fn parse(tokens: Vec<Token>) -> Result<Program> {
    Parser::new(tokens).parse_program()
}

/// Lex and parse a source string.
pub fn parse_source(source: &str) -> Result<Program> {
    parse(lexer::tokenize(source)?)
}

/// Parser state over a token vector
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a parser. An EOF token is appended if the stream lacks one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|t| t.is(TokenKind::Eof)) {
            let (line, column) = tokens
                .last()
                .map(|t| (t.line, t.column + t.text.chars().count()))
                .unwrap_or((1, 1));
            tokens.push(Token::new(TokenKind::Eof, "", line, column));
        }
        Self { tokens, pos: 0 }
    }

    /// `Program := Workflow EOF`
    pub fn parse_program(&mut self) -> Result<Program> {
        let workflow = self.parse_workflow()?;
        if !self.check(TokenKind::Eof) {
            return Err(self.error("expected end of input after workflow"));
        }
        Ok(Program { workflow })
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !token.is(TokenKind::Eof) {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().is(kind)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(&format!("expected {}", what)))
        }
    }

    fn span(&self) -> Span {
        let t = self.current();
        Span::new(t.line, t.column)
    }

    fn describe(token: &Token) -> String {
        match token.kind {
            TokenKind::Identifier => format!("identifier '{}'", token.text),
            TokenKind::String => format!("string \"{}\"", token.text),
            TokenKind::Number | TokenKind::Boolean => format!("{} {}", token.kind, token.text),
            _ => token.kind.to_string(),
        }
    }

    fn error(&self, message: &str) -> Error {
        self.error_at(self.current(), message)
    }

    fn error_at(&self, token: &Token, message: &str) -> Error {
        Error::Parse {
            message: format!("{}, found {}", message, Self::describe(token)),
            line: token.line,
            column: token.column,
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// `Workflow := 'workflow' STRING '{' (Param | Var | Node | Module | Connect)* '}'`
    fn parse_workflow(&mut self) -> Result<WorkflowDeclaration> {
        let span = self.span();
        self.expect(TokenKind::Workflow, "'workflow'")?;
        let name = self.expect(TokenKind::String, "workflow name string")?.text;
        self.expect(TokenKind::LBrace, "'{' after workflow name")?;

        let mut workflow = WorkflowDeclaration::new(name);
        workflow.span = span;

        loop {
            match self.current().kind {
                TokenKind::Param => workflow.parameters.push(self.parse_param()?),
                TokenKind::Var => workflow.variables.push(self.parse_var()?),
                TokenKind::Node => workflow.nodes.push(NodeEntry::Node(self.parse_node()?)),
                TokenKind::Module => workflow
                    .nodes
                    .push(NodeEntry::Module(self.parse_module()?)),
                TokenKind::Connect => workflow.connections.push(self.parse_connect()?),
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                _ => {
                    return Err(self.error(
                        "expected 'param', 'var', 'node', 'module', 'connect' or '}'",
                    ));
                }
            }
            self.eat(TokenKind::Semicolon);
        }

        tracing::debug!(
            workflow = %workflow.name,
            parameters = workflow.parameters.len(),
            variables = workflow.variables.len(),
            nodes = workflow.nodes.len(),
            connections = workflow.connections.len(),
            "parsed workflow"
        );

        Ok(workflow)
    }

    /// `Param := 'param' IDENT TYPE ('=' Expression)? ('{' constraints '}')?`
    fn parse_param(&mut self) -> Result<ParameterDeclaration> {
        let span = self.span();
        self.expect(TokenKind::Param, "'param'")?;
        let name = self.expect(TokenKind::Identifier, "parameter name")?.text;

        let type_token = self.expect(TokenKind::Identifier, "parameter type")?;
        let param_type = ParamType::from_name(&type_token.text).ok_or_else(|| {
            self.error_at(
                &type_token,
                "expected one of 'string', 'number', 'boolean', 'array', 'object'",
            )
        })?;

        let default_value = if self.eat(TokenKind::Equals) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let constraints = if self.check(TokenKind::LBrace) {
            self.parse_constraints()?
        } else {
            ParamConstraints::default()
        };

        Ok(ParameterDeclaration {
            name,
            param_type,
            required: default_value.is_none(),
            default_value,
            constraints,
            span,
        })
    }

    fn parse_constraints(&mut self) -> Result<ParamConstraints> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut constraints = ParamConstraints::default();

        while !self.check(TokenKind::RBrace) {
            let key = self.expect(TokenKind::Identifier, "constraint name")?;
            self.expect(TokenKind::Colon, "':' after constraint name")?;
            let value_token = self.current().clone();
            let value = self.parse_expression()?;
            let literal = literal_value(&value);

            match key.text.as_str() {
                "min" | "max" => {
                    let n = literal.as_ref().and_then(Value::as_f64).ok_or_else(|| {
                        self.error_at(&value_token, &format!("'{}' must be a number", key.text))
                    })?;
                    if key.text == "min" {
                        constraints.min = Some(n);
                    } else {
                        constraints.max = Some(n);
                    }
                }
                "pattern" => {
                    let s = literal
                        .as_ref()
                        .and_then(Value::as_str)
                        .ok_or_else(|| self.error_at(&value_token, "'pattern' must be a string"))?;
                    constraints.pattern = Some(s.to_string());
                }
                "allowed" => match literal {
                    Some(Value::Array(items)) => constraints.allowed = Some(items),
                    _ => {
                        return Err(
                            self.error_at(&value_token, "'allowed' must be an array of literals")
                        );
                    }
                },
                _ => {
                    return Err(self.error_at(
                        &key,
                        "expected constraint 'min', 'max', 'pattern' or 'allowed'",
                    ));
                }
            }
            self.eat(TokenKind::Comma);
        }

        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(constraints)
    }

    /// `Var := 'var' IDENT '=' Expression`
    fn parse_var(&mut self) -> Result<VariableDeclaration> {
        let span = self.span();
        self.expect(TokenKind::Var, "'var'")?;
        let name = self.expect(TokenKind::Identifier, "variable name")?.text;
        self.expect(TokenKind::Equals, "'=' after variable name")?;
        let value = self.parse_expression()?;
        Ok(VariableDeclaration { name, value, span })
    }

    /// `Node := 'node' IDENT STRING '{' (IDENT ':' Expression ','?)* '}'`
    fn parse_node(&mut self) -> Result<NodeDeclaration> {
        let span = self.span();
        self.expect(TokenKind::Node, "'node'")?;
        let name = self.expect(TokenKind::Identifier, "node name")?.text;
        let node_type = self.expect(TokenKind::String, "node type string")?.text;

        let mut position = None;
        let mut parameters = Vec::new();
        for (key, value) in self.parse_body()? {
            if key.text == "position" {
                position = Some(position_value(&value).ok_or_else(|| {
                    self.error_at(&key, "'position' must be an array of two numbers")
                })?);
            } else {
                parameters.push((key.text, value));
            }
        }

        Ok(NodeDeclaration {
            name,
            node_type,
            parameters,
            position,
            span,
        })
    }

    /// `Module := 'module' IDENT '=' STRING '{' (IDENT ':' Expression ','?)* '}'`
    fn parse_module(&mut self) -> Result<ModuleDeclaration> {
        let span = self.span();
        self.expect(TokenKind::Module, "'module'")?;
        let name = self.expect(TokenKind::Identifier, "module name")?.text;
        self.expect(TokenKind::Equals, "'=' after module name")?;
        let module_path = self.expect(TokenKind::String, "module path string")?.text;
        let parameters = self
            .parse_body()?
            .into_iter()
            .map(|(key, value)| (key.text, value))
            .collect();

        Ok(ModuleDeclaration {
            name,
            module_path,
            parameters,
            span,
        })
    }

    fn parse_body(&mut self) -> Result<Vec<(Token, Expression)>> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut entries = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let key = self.expect(TokenKind::Identifier, "parameter name or '}'")?;
            self.expect(TokenKind::Colon, "':' after parameter name")?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            self.eat(TokenKind::Comma);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(entries)
    }

    /// `Connect := 'connect' IDENT ('.' PORT)? '->' IDENT ('.' PORT)?`
    fn parse_connect(&mut self) -> Result<ConnectionDeclaration> {
        let span = self.span();
        self.expect(TokenKind::Connect, "'connect'")?;
        let source = self.parse_endpoint("source node name")?;
        self.expect(TokenKind::Arrow, "'->'")?;
        let target = self.parse_endpoint("target node name")?;
        Ok(ConnectionDeclaration {
            source,
            target,
            span,
        })
    }

    fn parse_endpoint(&mut self, what: &str) -> Result<Endpoint> {
        let node = self.expect(TokenKind::Identifier, what)?.text;
        let port = if self.eat(TokenKind::Dot) {
            if self.check(TokenKind::Identifier) || self.check(TokenKind::Boolean) {
                self.advance().text
            } else {
                return Err(self.error("expected port name"));
            }
        } else {
            DEFAULT_PORT.to_string()
        };
        Ok(Endpoint { node, port })
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Parse one expression
    pub fn parse_expression(&mut self) -> Result<Expression> {
        match self.current().kind {
            TokenKind::String => {
                let text = self.advance().text;
                if text.contains("${") {
                    Ok(Expression::Template(text))
                } else {
                    Ok(Expression::Literal(Value::String(text)))
                }
            }
            TokenKind::Number => {
                let token = self.advance();
                number_value(&token.text)
                    .map(Expression::Literal)
                    .ok_or_else(|| self.error_at(&token, "invalid number"))
            }
            TokenKind::Boolean => {
                let token = self.advance();
                Ok(Expression::Literal(Value::Bool(token.text == "true")))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expression::Literal(Value::Null))
            }
            TokenKind::Identifier if self.peek_kind(1) == TokenKind::LParen => {
                self.parse_function_call()
            }
            TokenKind::Identifier => Ok(Expression::Identifier(self.advance().text)),
            TokenKind::LBrace => self.parse_object(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::TemplateStart => self.parse_bare_template(),
            _ => Err(self.error("expected expression")),
        }
    }

    fn parse_function_call(&mut self) -> Result<Expression> {
        let name = self.advance().text;
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) {
            args.push(self.parse_expression()?);
            self.eat(TokenKind::Comma);
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Expression::FunctionCall { name, args })
    }

    /// `ObjectExpr := '{' ((IDENT|STRING) ':' Expression ','?)* '}'`
    fn parse_object(&mut self) -> Result<Expression> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut entries = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let key = if self.check(TokenKind::Identifier) || self.check(TokenKind::String) {
                self.advance().text
            } else {
                return Err(self.error("expected object key or '}'"));
            };
            self.expect(TokenKind::Colon, "':' after object key")?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            self.eat(TokenKind::Comma);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Expression::Object(entries))
    }

    /// `ArrayExpr := '[' (Expression ','?)* ']'`
    fn parse_array(&mut self) -> Result<Expression> {
        self.expect(TokenKind::LBracket, "'['")?;
        let mut items = Vec::new();
        while !self.check(TokenKind::RBracket) {
            items.push(self.parse_expression()?);
            self.eat(TokenKind::Comma);
        }
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(Expression::Array(items))
    }

    /// Unquoted `${ ... }`: inner tokens are re-joined without whitespace.
    fn parse_bare_template(&mut self) -> Result<Expression> {
        let start = self.advance();
        let mut text = String::from("${");
        let mut depth = 0usize;

        loop {
            let token = self.current().clone();
            match token.kind {
                TokenKind::Eof => {
                    return Err(self.error_at(&start, "unterminated template expression"));
                }
                TokenKind::RBrace if depth == 0 => {
                    self.advance();
                    break;
                }
                TokenKind::LBrace | TokenKind::TemplateStart => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            if token.is(TokenKind::String) {
                text.push('"');
                text.push_str(&token.text);
                text.push('"');
            } else {
                text.push_str(&token.text);
            }
            self.advance();
        }

        text.push('}');
        Ok(Expression::Template(text))
    }
}

fn number_value(text: &str) -> Option<Value> {
    if !text.contains('.') {
        if let Ok(i) = text.parse::<i64>() {
            return Some(Value::Number(i.into()));
        }
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Fold an expression made only of literals into a JSON value.
pub fn literal_value(expr: &Expression) -> Option<Value> {
    match expr {
        Expression::Literal(v) => Some(v.clone()),
        Expression::Array(items) => items
            .iter()
            .map(literal_value)
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        Expression::Object(entries) => entries
            .iter()
            .map(|(k, v)| literal_value(v).map(|v| (k.clone(), v)))
            .collect::<Option<serde_json::Map<_, _>>>()
            .map(Value::Object),
        _ => None,
    }
}

fn position_value(expr: &Expression) -> Option<[f64; 2]> {
    match literal_value(expr)? {
        Value::Array(items) if items.len() == 2 => Some([items[0].as_f64()?, items[1].as_f64()?]),
        _ => None,
    }
}
