//! Logos-based lexer for model files
//!
//! Fast tokenization using the logos crate.

use logos::Logos;
use text_size::{TextRange, TextSize};

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub range: TextRange,
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(input),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let span = self.inner.span();
        let range = TextRange::new(
            TextSize::new(span.start as u32),
            TextSize::new(span.end as u32),
        );

        let kind = logos_token.unwrap_or(TokenKind::Error);

        Some(Token { kind, text, range })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    BlockComment,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("=")]
    Eq,

    // =========================================================================
    // KEYWORDS (alphabetical)
    // =========================================================================
    #[token("abstract")]
    AbstractKw,
    #[token("alias")]
    AliasKw,
    #[token("annotations")]
    AnnotationsKw,
    #[token("as")]
    AsKw,
    #[token("association")]
    AssociationKw,
    #[token("autogenerated")]
    AutogeneratedKw,
    #[token("class")]
    ClassKw,
    #[token("comment")]
    CommentKw,
    #[token("composition")]
    CompositionKw,
    #[token("default")]
    DefaultKw,
    #[token("description")]
    DescriptionKw,
    #[token("domain")]
    DomainKw,
    #[token("endpoint")]
    EndpointKw,
    #[token("exclude")]
    ExcludeKw,
    #[token("extends")]
    ExtendsKw,
    #[token("field")]
    FieldKw,
    #[token("file")]
    FileKw,
    #[token("from")]
    FromKw,
    #[token("include")]
    IncludeKw,
    #[token("key")]
    KeyKw,
    #[token("label")]
    LabelKw,
    #[token("length")]
    LengthKw,
    #[token("method")]
    MethodKw,
    #[token("of")]
    OfKw,
    #[token("param")]
    ParamKw,
    #[token("persistent")]
    PersistentKw,
    #[token("prefix")]
    PrefixKw,
    #[token("reference")]
    ReferenceKw,
    #[token("required")]
    RequiredKw,
    #[token("returns")]
    ReturnsKw,
    #[token("role")]
    RoleKw,
    #[token("route")]
    RouteKw,
    #[token("suffix")]
    SuffixKw,
    #[token("target")]
    TargetKw,
    #[token("uses")]
    UsesKw,
    #[token("values")]
    ValuesKw,

    /// Unrecognized input.
    Error,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    /// Keywords are contextual: anywhere a name is expected they read as identifiers.
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            AbstractKw
                | AliasKw
                | AnnotationsKw
                | AsKw
                | AssociationKw
                | AutogeneratedKw
                | ClassKw
                | CommentKw
                | CompositionKw
                | DefaultKw
                | DescriptionKw
                | DomainKw
                | EndpointKw
                | ExcludeKw
                | ExtendsKw
                | FieldKw
                | FileKw
                | FromKw
                | IncludeKw
                | KeyKw
                | LabelKw
                | LengthKw
                | MethodKw
                | OfKw
                | ParamKw
                | PersistentKw
                | PrefixKw
                | ReferenceKw
                | RequiredKw
                | ReturnsKw
                | RoleKw
                | RouteKw
                | SuffixKw
                | TargetKw
                | UsesKw
                | ValuesKw
        )
    }

    pub fn is_name(self) -> bool {
        self == TokenKind::Ident || self.is_keyword()
    }

    /// Human-readable form used in syntax errors.
    pub fn describe(self) -> &'static str {
        use TokenKind::*;
        match self {
            Whitespace => "whitespace",
            LineComment | BlockComment => "comment",
            Ident => "identifier",
            Integer => "integer",
            String => "string",
            LBrace => "`{`",
            RBrace => "`}`",
            LBracket => "`[`",
            RBracket => "`]`",
            Semicolon => "`;`",
            Colon => "`:`",
            Comma => "`,`",
            Dot => "`.`",
            Eq => "`=`",
            Error => "invalid token",
            _ => "keyword",
        }
    }
}
