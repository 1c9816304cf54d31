//! Rule-driven lexer.
//!
//! Three rule kinds are tried at the cursor, in order: ignore patterns
//! (whitespace, line comments), exact keyword literals, and regex token
//! classes. Keywords are sorted by descending length so that `<=` wins over
//! `<` and `!=` over `!`.

pub mod token;


pub use token::{Token, TokenKind};

use crate::error::LumenError;
use crate::source::SourceText;
use log::debug;
use regex::Regex;

const IGNORES: &[&str] = &[r"[ \n\r\t]+", r"//[^\n]*"];

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("function", TokenKind::Function),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("while", TokenKind::While),
    ("for", TokenKind::For),
    ("var", TokenKind::Var),
    ("return", TokenKind::Return),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    (",", TokenKind::Comma),
    (";", TokenKind::Semicolon),
    ("{", TokenKind::LeftBrace),
    ("}", TokenKind::RightBrace),
    ("(", TokenKind::LeftParen),
    (")", TokenKind::RightParen),
    (">", TokenKind::Greater),
    (">=", TokenKind::GreaterEqual),
    ("<", TokenKind::Less),
    ("<=", TokenKind::LessEqual),
    ("==", TokenKind::EqualEqual),
    ("!=", TokenKind::NotEqual),
    ("=", TokenKind::Equal),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("!", TokenKind::Bang),
    ("&&", TokenKind::AndAnd),
    ("||", TokenKind::OrOr),
    ("+=", TokenKind::PlusEqual),
    ("-=", TokenKind::MinusEqual),
    ("*=", TokenKind::StarEqual),
    ("/=", TokenKind::SlashEqual),
    ("%=", TokenKind::PercentEqual),
];

const CLASSES: &[(&str, TokenKind)] = &[
    (r"[A-Za-z_][A-Za-z0-9_]*", TokenKind::Identifier),
    (r"[0-9]+", TokenKind::Integer),
    (r"'(\\.|[^'])*'", TokenKind::String),
];

pub struct Lexer {
    ignores: Vec<Regex>,
    keywords: Vec<(&'static str, TokenKind)>,
    classes: Vec<(Regex, TokenKind)>,
}

impl Lexer {
    pub fn new() -> Self {
        let mut keywords = KEYWORDS.to_vec();
        // Longest literal first; lexicographic order breaks length ties.
        keywords.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));

        Self {
            ignores: IGNORES.iter().map(|pattern| anchored(pattern)).collect(),
            keywords,
            classes: CLASSES
                .iter()
                .map(|(pattern, kind)| (anchored(pattern), *kind))
                .collect(),
        }
    }

    pub fn tokenize(&self, source: &SourceText) -> Result<Vec<Token>, LumenError> {
        let text = source.text();
        let mut offset = 0;
        let mut tokens = Vec::new();

        while offset < text.len() {
            if let Some(ignored) = self.match_ignore(&text[offset..]) {
                offset += ignored;
                continue;
            }

            let position = source.position_at(offset);
            let rest = &text[offset..];

            let matched = self
                .match_keyword(rest)
                .or_else(|| self.match_class(rest));

            match matched {
                Some((kind, length)) => {
                    tokens.push(Token::new(kind, &rest[..length], position));
                    offset += length;
                }
                None => {
                    let ch = rest.chars().next().unwrap_or('\0');
                    return Err(LumenError::unknown_character(ch, position));
                }
            }
        }

        tokens.push(Token::new(
            TokenKind::EndOfSource,
            "",
            source.position_at(text.len()),
        ));
        debug!("lexed {} tokens", tokens.len());
        Ok(tokens)
    }

    fn match_ignore(&self, rest: &str) -> Option<usize> {
        self.ignores
            .iter()
            .find_map(|pattern| pattern.find(rest))
            .map(|matched| matched.end())
    }

    fn match_keyword(&self, rest: &str) -> Option<(TokenKind, usize)> {
        self.keywords
            .iter()
            .find(|(literal, _)| rest.starts_with(literal))
            .map(|(literal, kind)| (*kind, literal.len()))
    }

    fn match_class(&self, rest: &str) -> Option<(TokenKind, usize)> {
        self.classes
            .iter()
            .find_map(|(pattern, kind)| pattern.find(rest).map(|matched| (*kind, matched.end())))
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

fn anchored(pattern: &str) -> Regex {
    // The rules only ever apply at the cursor itself.
    match Regex::new(&format!("^(?:{pattern})")) {
        Ok(regex) => regex,
        Err(error) => panic!("invalid lexer rule '{pattern}': {error}"),
    }
}

/// Tokenize a source string in one call.
pub fn lex(source: &SourceText) -> Result<Vec<Token>, LumenError> {
    Lexer::new().tokenize(source)
}
