//! Lexer: DSL source text to token stream
//!
//! Comments and whitespace are consumed here and never reach the parser.
//! The characters `* ? \ | &` are tolerated outside string literals: each
//! one is skipped and reported as a [`LexWarning`]. Any other unknown
//! character is a fatal [`Error::Lex`].

use crate::error::{Error, Result};
use crate::token::{Token, TokenKind};

/// A character skipped by the lexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexWarning {
    /// The skipped character
    pub character: char,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
}

impl LexWarning {
    /// Human-readable message for diagnostics
    pub fn message(&self) -> String {
        format!("skipped unexpected character '{}'", self.character)
    }
}

/// Output of a successful lex
#[derive(Debug, Clone)]
pub struct Lexed {
    /// Tokens, always terminated by an EOF token
    pub tokens: Vec<Token>,
    /// Recoverable problems encountered along the way
    pub warnings: Vec<LexWarning>,
}

/// Tokenize `source`, discarding recoverable warnings.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).run().map(|lexed| lexed.tokens)
}

/// Tokenize `source`, returning tokens together with skip warnings.
pub fn tokenize_with_warnings(source: &str) -> Result<Lexed> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    warnings: Vec<LexWarning>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Lexed> {
        while let Some(c) = self.peek() {
            let (line, column) = (self.line, self.column);

            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.bump();
                }
                '/' if self.peek_at(1) == Some('/') => self.line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.block_comment()?,
                '"' if self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"') => {
                    self.triple_string()?
                }
                '"' | '\'' => self.string(c)?,
                '0'..='9' => self.number(),
                '-' if self.peek_at(1) == Some('>') => {
                    self.bump();
                    self.bump();
                    self.push(TokenKind::Arrow, "->", line, column);
                }
                '-' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.number(),
                c if c.is_ascii_alphabetic() || c == '_' => self.word(),
                '$' if self.peek_at(1) == Some('{') => {
                    self.bump();
                    self.bump();
                    self.push(TokenKind::TemplateStart, "${", line, column);
                }
                '&' if self.peek_at(1) == Some('&') => {
                    self.bump();
                    self.bump();
                    self.push(TokenKind::And, "&&", line, column);
                }
                '|' if self.peek_at(1) == Some('|') => {
                    self.bump();
                    self.bump();
                    self.push(TokenKind::Or, "||", line, column);
                }
                '*' | '?' | '\\' | '|' | '&' => {
                    self.bump();
                    tracing::warn!(line, column, "skipping unexpected character '{}'", c);
                    self.warnings.push(LexWarning {
                        character: c,
                        line,
                        column,
                    });
                }
                _ => {
                    let kind = match c {
                        '{' => TokenKind::LBrace,
                        '}' => TokenKind::RBrace,
                        '[' => TokenKind::LBracket,
                        ']' => TokenKind::RBracket,
                        '(' => TokenKind::LParen,
                        ')' => TokenKind::RParen,
                        ',' => TokenKind::Comma,
                        ':' => TokenKind::Colon,
                        ';' => TokenKind::Semicolon,
                        '=' => TokenKind::Equals,
                        '.' => TokenKind::Dot,
                        _ => {
                            return Err(Error::Lex {
                                message: format!("unexpected character '{}'", c),
                                line,
                                column,
                            });
                        }
                    };
                    self.bump();
                    self.push(kind, c.to_string(), line, column);
                }
            }
        }

        let (line, column) = (self.line, self.column);
        self.push(TokenKind::Eof, "", line, column);

        tracing::debug!(
            tokens = self.tokens.len(),
            warnings = self.warnings.len(),
            "lexed source"
        );

        Ok(Lexed {
            tokens: self.tokens,
            warnings: self.warnings,
        })
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, text: impl Into<String>, line: usize, column: usize) {
        self.tokens.push(Token::new(kind, text, line, column));
    }

    fn line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn block_comment(&mut self) -> Result<()> {
        let (line, column) = (self.line, self.column);
        self.bump();
        self.bump();

        loop {
            match self.bump() {
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
                None => {
                    return Err(Error::Lex {
                        message: "unterminated block comment".to_string(),
                        line,
                        column,
                    });
                }
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<()> {
        let (line, column) = (self.line, self.column);
        self.bump();

        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(Error::Lex {
                        message: "unterminated string literal".to_string(),
                        line,
                        column,
                    });
                }
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    let escaped = self.bump().ok_or_else(|| Error::Lex {
                        message: "unterminated string literal".to_string(),
                        line,
                        column,
                    })?;
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '\\' => value.push('\\'),
                        '"' => value.push('"'),
                        '\'' => value.push('\''),
                        '/' => value.push('/'),
                        // Unknown escapes are kept verbatim so regex patterns survive
                        other => {
                            value.push('\\');
                            value.push(other);
                        }
                    }
                }
                Some(c) => {
                    self.bump();
                    value.push(c);
                }
            }
        }

        self.push(TokenKind::String, value, line, column);
        Ok(())
    }

    fn triple_string(&mut self) -> Result<()> {
        let (line, column) = (self.line, self.column);
        for _ in 0..3 {
            self.bump();
        }

        let mut value = String::new();
        loop {
            if self.peek() == Some('"') && self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"')
            {
                for _ in 0..3 {
                    self.bump();
                }
                break;
            }
            match self.bump() {
                Some(c) => value.push(c),
                None => {
                    return Err(Error::Lex {
                        message: "unterminated triple-quoted string".to_string(),
                        line,
                        column,
                    });
                }
            }
        }

        self.push(TokenKind::String, value.trim(), line, column);
        Ok(())
    }

    fn number(&mut self) {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();

        if self.peek() == Some('-') {
            self.bump();
            text.push('-');
        }
        self.digits(&mut text);

        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            text.push('.');
            self.digits(&mut text);
        }

        self.push(TokenKind::Number, text, line, column);
    }

    fn digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek().filter(|c| c.is_ascii_digit()) {
            self.bump();
            text.push(c);
        }
    }

    fn word(&mut self) {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        while let Some(c) = self
            .peek()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        {
            self.bump();
            text.push(c);
        }

        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier);
        self.push(kind, text, line, column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_empty_source_yields_eof() {
        let tokens = tokenize("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is(TokenKind::Eof));
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("workflow param var node module connect foo_1 true null"),
            vec![
                TokenKind::Workflow,
                TokenKind::Param,
                TokenKind::Var,
                TokenKind::Node,
                TokenKind::Module,
                TokenKind::Connect,
                TokenKind::Identifier,
                TokenKind::Boolean,
                TokenKind::Null,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("{ } [ ] ( ) , : ; = -> . && || ${"),
            vec![
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Comma,
                TokenKind::Colon,
                TokenKind::Semicolon,
                TokenKind::Equals,
                TokenKind::Arrow,
                TokenKind::Dot,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::TemplateStart,
                TokenKind::Eof,
            ]
        );
    }

    #[rstest]
    #[case(r#""a\nb""#, "a\nb")]
    #[case(r#""tab\there""#, "tab\there")]
    #[case(r#""quote \" inside""#, "quote \" inside")]
    #[case(r#"'single \' quote'"#, "single ' quote")]
    #[case(r#""slash \/ back \\""#, "slash / back \\")]
    #[case(r#""keep \d+""#, "keep \\d+")]
    fn test_string_escapes(#[case] source: &str, #[case] expected: &str) {
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, expected);
    }

    #[test]
    fn test_triple_quoted_string_is_trimmed() {
        let source = "\"\"\"\n    return items;\n\"\"\" x";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "return items;");
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("42 3.14 -7 1.").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["42", "3.14", "-7", "1", ".", ""]);
    }

    #[test]
    fn test_comments_are_discarded_and_lines_tracked() {
        let source = "// heading\n/* block\n comment */ node\nfoo";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Node);
        assert_eq!((tokens[0].line, tokens[0].column), (3, 13));
        assert_eq!((tokens[1].line, tokens[1].column), (4, 1));
    }

    #[test]
    fn test_loose_characters_are_skipped_with_warning() {
        let lexed = tokenize_with_warnings("a * b ? c | d & e \\").unwrap();
        assert_eq!(lexed.tokens.len(), 6);
        let skipped: Vec<char> = lexed.warnings.iter().map(|w| w.character).collect();
        assert_eq!(skipped, vec!['*', '?', '|', '&', '\\']);
        assert_eq!(lexed.warnings[0].column, 3);
    }

    #[rstest]
    #[case("@", 1, 1)]
    #[case("node\n  #", 2, 3)]
    #[case("a - b", 1, 3)]
    fn test_unknown_character_is_fatal(
        #[case] source: &str,
        #[case] line: usize,
        #[case] column: usize,
    ) {
        let err = tokenize(source).unwrap_err();
        assert!(matches!(err, Error::Lex { .. }));
        assert_eq!(err.position(), Some((line, column)));
    }

    #[rstest]
    #[case("\"open")]
    #[case("'open\n'")]
    #[case("\"\"\"never closed")]
    #[case("/* never closed")]
    fn test_unterminated_literals_are_fatal(#[case] source: &str) {
        assert!(matches!(tokenize(source), Err(Error::Lex { .. })));
    }

    #[test]
    fn test_template_text_stays_inside_string() {
        let tokens = tokenize(r#""Hello ${name}""#).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "Hello ${name}");
    }
}
