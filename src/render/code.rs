use crate::utils::Styling;
use std::fmt::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Literal,
    Comment,

    /// Operators, brackets and whitespace.
    Punctuation,
}

impl TokenKind {
    fn class(self) -> &'static str {
        match self {
            TokenKind::Keyword => "keyword",
            TokenKind::Identifier => "identifier",
            TokenKind::Literal => "literal",
            TokenKind::Comment => "comment",
            TokenKind::Punctuation => "punctuation",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

/// Rendered source as a list of tokens. Adjacent tokens of the same kind are merged.
#[derive(Clone, Debug, Default)]
pub struct Code {
    tokens: Vec<Token>,
}

impl Code {
    pub fn new() -> Self {
        Code { tokens: Vec::new() }
    }

    pub fn push(&mut self, kind: TokenKind, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.tokens.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(text),
            _ => self.tokens.push(Token {
                kind,
                text: text.to_string(),
            }),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn append(&mut self, other: Code) {
        for token in other.tokens {
            self.push(token.kind, &token.text);
        }
    }

    pub fn to_plain_text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    /// Each token becomes a span whose class is the token kind.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for token in &self.tokens {
            let mut text = String::with_capacity(token.text.len());
            for c in token.text.chars() {
                match c {
                    '&' => text.push_str("&amp;"),
                    '<' => text.push_str("&lt;"),
                    '>' => text.push_str("&gt;"),
                    '"' => text.push_str("&quot;"),
                    '\'' => text.push_str("&apos;"),
                    ' ' => text.push_str("&nbsp;"),
                    '\n' => text.push_str("<br>"),
                    _ => text.push(c),
                }
            }
            let _ = write!(html, "<span class=\"{}\">{}</span>", token.kind.class(), text);
        }
        html
    }

    /// Uses the "code" styles from the user's style file.
    pub fn to_styled(&self) -> String {
        let mut styled = String::new();
        for token in &self.tokens {
            let text = token.text.as_str();
            let _ = match token.kind {
                TokenKind::Keyword => write!(styled, "{}", text.code_keyword()),
                TokenKind::Identifier => write!(styled, "{}", text.code_identifier()),
                TokenKind::Literal => write!(styled, "{}", text.code_literal()),
                TokenKind::Comment => write!(styled, "{}", text.code_comment()),
                TokenKind::Punctuation => write!(styled, "{}", text.code_punctuation()),
            };
        }
        styled
    }
}
