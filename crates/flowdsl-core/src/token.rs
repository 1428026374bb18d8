//! Token definitions produced by the lexer

use std::fmt;

/// Kind of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// String literal; `text` holds the unescaped contents
    String,
    /// Integer or decimal literal; `text` holds the source digits
    Number,
    /// `true` or `false`
    Boolean,
    /// `null`
    Null,
    /// `[A-Za-z_][A-Za-z0-9_]*` that is not a keyword
    Identifier,

    // Keywords
    /// `workflow`
    Workflow,
    /// `param`
    Param,
    /// `var`
    Var,
    /// `node`
    Node,
    /// `module`
    Module,
    /// `connect`
    Connect,

    // Punctuation
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `=`
    Equals,
    /// `->`
    Arrow,
    /// `.`
    Dot,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `${`
    TemplateStart,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Map a bare word to its keyword kind, if it is one
    pub fn keyword(word: &str) -> Option<TokenKind> {
        match word {
            "workflow" => Some(TokenKind::Workflow),
            "param" => Some(TokenKind::Param),
            "var" => Some(TokenKind::Var),
            "node" => Some(TokenKind::Node),
            "module" => Some(TokenKind::Module),
            "connect" => Some(TokenKind::Connect),
            "true" | "false" => Some(TokenKind::Boolean),
            "null" => Some(TokenKind::Null),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Boolean => "boolean",
            TokenKind::Null => "null",
            TokenKind::Identifier => "identifier",
            TokenKind::Workflow => "'workflow'",
            TokenKind::Param => "'param'",
            TokenKind::Var => "'var'",
            TokenKind::Node => "'node'",
            TokenKind::Module => "'module'",
            TokenKind::Connect => "'connect'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Equals => "'='",
            TokenKind::Arrow => "'->'",
            TokenKind::Dot => "'.'",
            TokenKind::And => "'&&'",
            TokenKind::Or => "'||'",
            TokenKind::TemplateStart => "'${'",
            TokenKind::Eof => "end of input",
        };
        f.write_str(s)
    }
}

/// A single token with its source position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token kind
    pub kind: TokenKind,
    /// Token text (unescaped contents for strings)
    pub text: String,
    /// 1-based line of the first character
    pub line: usize,
    /// 1-based column of the first character
    pub column: usize,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    /// Whether this token has the given kind
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
