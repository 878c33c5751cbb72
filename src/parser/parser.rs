//! Recursive descent parser for model files
//!
//! Builds a [`ParsedFile`] directly from the token stream. Errors are
//! collected with recovery at `;` and `}` so one bad member does not hide the
//! rest of the file.

use std::fmt;
use std::path::Path;

use text_size::{TextRange, TextSize};

use super::lexer::{Lexer, Token, TokenKind};
use crate::base::{LineIndex, Span};
use crate::syntax::{
    AliasDecl, ClassDecl, DomainDecl, EndpointDecl, FileAliasDecl, ParsedFile, PropertyDecl,
    PropertyDeclKind, Reference, ValueRow,
};

/// Parse result containing the file and any errors
#[derive(Debug, Clone)]
pub struct Parse {
    pub file: ParsedFile,
    pub errors: Vec<SyntaxError>,
}

impl Parse {
    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A syntax error with location and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
    pub span: Span,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.span, self.message)
    }
}

/// Parse model source into a structural file
pub fn parse(input: &str, path: &Path) -> Parse {
    let tokens: Vec<_> = Lexer::new(input).filter(|t| !t.kind.is_trivia()).collect();
    let mut parser = Parser::new(&tokens, input);
    let mut file = parser.parse_file();
    file.path = path.to_path_buf();
    Parse {
        file,
        errors: parser.errors,
    }
}

/// The parser state
struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    line_index: LineIndex,
    end: TextSize,
    errors: Vec<SyntaxError>,
    /// Error count when the current member started.
    member_errors: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>], input: &str) -> Self {
        Self {
            tokens,
            pos: 0,
            line_index: LineIndex::new(input),
            end: TextSize::of(input),
            errors: Vec::new(),
            member_errors: 0,
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&'a Token<'a>> {
        let tokens = self.tokens;
        tokens.get(self.pos)
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current_kind() == Some(kind)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn nth(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn current_range(&self) -> TextRange {
        self.current()
            .map(|t| t.range)
            .unwrap_or_else(|| TextRange::empty(self.end))
    }

    fn span(&self, range: TextRange) -> Span {
        self.line_index.span(range)
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) -> Option<&'a Token<'a>> {
        let token = self.current()?;
        self.pos += 1;
        Some(token)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error(format!("expected {}", kind.describe()));
            false
        }
    }

    fn name(&mut self) -> Option<Reference> {
        match self.current() {
            Some(token) if token.kind.is_name() => {
                let reference = Reference::new(token.text, self.span(token.range));
                self.pos += 1;
                Some(reference)
            }
            _ => {
                self.error("expected identifier");
                None
            }
        }
    }

    /// `Ident ('.' Ident)*`, spanning the whole path.
    fn qualified_name(&mut self) -> Option<Reference> {
        let start = self.current_range().start();
        let mut text = self.name()?.name.to_string();
        let mut end = self.tokens[self.pos - 1].range.end();
        while self.at(TokenKind::Dot) && self.nth(1).is_some_and(TokenKind::is_name) {
            self.pos += 1;
            let segment = self.name()?;
            text.push('.');
            text.push_str(&segment.name);
            end = self.tokens[self.pos - 1].range.end();
        }
        Some(Reference::new(text, self.span(TextRange::new(start, end))))
    }

    fn string(&mut self) -> Option<String> {
        match self.current() {
            Some(token) if token.kind == TokenKind::String => {
                self.pos += 1;
                Some(unescape(token.text))
            }
            _ => {
                self.error("expected string");
                None
            }
        }
    }

    fn integer(&mut self) -> Option<u32> {
        match self.current() {
            Some(token) if token.kind == TokenKind::Integer => {
                self.pos += 1;
                match token.text.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        self.errors.push(SyntaxError {
                            message: format!("integer out of range: {}", token.text),
                            range: token.range,
                            span: self.span(token.range),
                        });
                        None
                    }
                }
            }
            _ => {
                self.error("expected integer");
                None
            }
        }
    }

    fn names(&mut self) -> Vec<Reference> {
        let mut names = Vec::new();
        loop {
            match self.name() {
                Some(name) => names.push(name),
                None => break,
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        names
    }

    /// `'[' name (',' name)* ']'`
    fn name_list(&mut self) -> Vec<Reference> {
        if !self.expect(TokenKind::LBracket) {
            return Vec::new();
        }
        let names = if self.at(TokenKind::RBracket) {
            Vec::new()
        } else {
            self.names()
        };
        self.expect(TokenKind::RBracket);
        names
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    fn error(&mut self, message: impl Into<String>) {
        let range = self.current_range();
        let mut message = message.into();
        match self.current() {
            Some(token) => message.push_str(&format!(", found `{}`", token.text)),
            None => message.push_str(", found end of file"),
        }
        self.errors.push(SyntaxError {
            message,
            range,
            span: self.span(range),
        });
    }

    /// Skip to the end of the current member: past the next `;`, or up to a `}`.
    fn recover_member(&mut self) {
        let start = self.pos;
        while !self.at_eof() && !self.at(TokenKind::RBrace) {
            if self.eat(TokenKind::Semicolon) {
                return;
            }
            self.pos += 1;
        }
        // Always make progress outside of a block end
        if self.pos == start && !self.at_eof() && !self.at(TokenKind::RBrace) {
            self.pos += 1;
        }
    }

    /// Skip to the next top-level declaration keyword.
    fn recover_item(&mut self) {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(kind) = self.current_kind() {
            match kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth = depth.saturating_sub(1),
                _ if depth == 0 && self.pos != start && starts_item(kind) => return,
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Parse a `{ ... }` body, calling `member` until the closing brace.
    fn block(&mut self, mut member: impl FnMut(&mut Self)) {
        if !self.expect(TokenKind::LBrace) {
            return;
        }
        while !self.at_eof() && !self.at(TokenKind::RBrace) {
            let before = self.pos;
            self.member_errors = self.errors.len();
            member(self);
            if self.pos == before {
                self.recover_member();
            }
        }
        self.expect(TokenKind::RBrace);
    }

    /// Expect the closing `;`, or skip past it if the member already failed.
    fn terminate_member(&mut self) {
        if self.errors.len() > self.member_errors || !self.expect(TokenKind::Semicolon) {
            self.recover_member();
        }
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    fn parse_file(&mut self) -> ParsedFile {
        let mut file = ParsedFile::default();

        if self.eat(TokenKind::FileKw) {
            if let Some(name) = self.qualified_name() {
                file.name = name.name;
            }
            self.terminate_member();
        } else {
            self.error("expected `file` declaration");
        }

        self.member_errors = self.errors.len();
        if self.eat(TokenKind::UsesKw) {
            loop {
                match self.qualified_name() {
                    Some(dep) => file.uses.push(dep),
                    None => break,
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.terminate_member();
        }

        while let Some(kind) = self.current_kind() {
            match kind {
                TokenKind::AliasKw if self.nth(1) == Some(TokenKind::FromKw) => {
                    if let Some(alias) = self.file_alias() {
                        file.aliases.push(alias);
                    }
                }
                TokenKind::DomainKw => {
                    if let Some(domain) = self.domain() {
                        file.domains.push(domain);
                    }
                }
                TokenKind::AbstractKw
                | TokenKind::ReferenceKw
                | TokenKind::PersistentKw
                | TokenKind::ClassKw => {
                    if let Some(class) = self.class() {
                        file.classes.push(class);
                    }
                }
                TokenKind::EndpointKw => {
                    if let Some(endpoint) = self.endpoint() {
                        file.endpoints.push(endpoint);
                    }
                }
                _ => {
                    self.error("expected `domain`, `class`, `endpoint` or `alias from`");
                    self.recover_item();
                }
            }
        }

        file
    }

    fn file_alias(&mut self) -> Option<FileAliasDecl> {
        self.bump();
        self.bump();
        let file = self.qualified_name()?;
        let mut alias = FileAliasDecl {
            file,
            classes: Vec::new(),
            endpoints: Vec::new(),
        };
        self.block(|p| {
            if p.eat(TokenKind::ClassKw) {
                let names = p.names();
                alias.classes.extend(names);
                p.terminate_member();
            } else if p.eat(TokenKind::EndpointKw) {
                let names = p.names();
                alias.endpoints.extend(names);
                p.terminate_member();
            } else {
                p.error("expected `class` or `endpoint`");
                p.recover_member();
            }
        });
        Some(alias)
    }

    fn domain(&mut self) -> Option<DomainDecl> {
        self.bump();
        let name = self.name()?;
        let mut domain = DomainDecl {
            name: name.name,
            span: name.span,
            ..DomainDecl::default()
        };
        self.block(|p| {
            match p.current_kind() {
                Some(TokenKind::LabelKw) => {
                    p.bump();
                    domain.label = p.string();
                }
                Some(TokenKind::LengthKw) => {
                    p.bump();
                    domain.length = p.integer();
                }
                Some(TokenKind::AutogeneratedKw) => {
                    p.bump();
                    domain.autogenerated_key = true;
                }
                Some(TokenKind::TargetKw) => {
                    p.bump();
                    if let (Some(target), Some(type_name)) = (p.name(), p.string()) {
                        let mut annotations = Vec::new();
                        if p.eat(TokenKind::AnnotationsKw) && p.expect(TokenKind::LBracket) {
                            while let Some(annotation) = p.string() {
                                annotations.push(annotation);
                                if !p.eat(TokenKind::Comma) {
                                    break;
                                }
                            }
                            p.expect(TokenKind::RBracket);
                        }
                        domain.targets.insert(target.name, (type_name, annotations));
                    }
                }
                _ => {
                    p.error("expected `label`, `length`, `autogenerated` or `target`");
                    p.recover_member();
                    return;
                }
            }
            p.terminate_member();
        });
        Some(domain)
    }

    fn class(&mut self) -> Option<ClassDecl> {
        let mut class = ClassDecl::default();
        loop {
            if self.eat(TokenKind::AbstractKw) {
                class.abstract_ = true;
            } else if self.eat(TokenKind::ReferenceKw) {
                class.reference = true;
            } else if self.eat(TokenKind::PersistentKw) {
                class.persistent = true;
            } else {
                break;
            }
        }
        if !self.expect(TokenKind::ClassKw) {
            self.recover_item();
            return None;
        }
        let name = self.name()?;
        class.name = name.name;
        class.span = name.span;
        if self.eat(TokenKind::ExtendsKw) {
            class.extends = self.name();
        }
        self.block(|p| match p.current_kind() {
            Some(TokenKind::LabelKw) => {
                p.bump();
                class.label = p.string();
                p.terminate_member();
            }
            Some(TokenKind::CommentKw) => {
                p.bump();
                class.comment = p.string();
                p.terminate_member();
            }
            Some(TokenKind::ValuesKw) => {
                p.bump();
                p.values(&mut class.values);
            }
            Some(kind) if starts_property(kind) => {
                if let Some(property) = p.property() {
                    class.properties.push(property);
                }
                p.terminate_member();
            }
            _ => {
                p.error("expected property, `label`, `comment` or `values`");
                p.recover_member();
            }
        });
        Some(class)
    }

    fn values(&mut self, rows: &mut Vec<ValueRow>) {
        self.block(|p| {
            let Some(name) = p.name() else {
                p.recover_member();
                return;
            };
            let mut row = ValueRow {
                name: name.name,
                ..ValueRow::default()
            };
            p.block(|p| {
                let Some(key) = p.name() else {
                    p.recover_member();
                    return;
                };
                if p.expect(TokenKind::Eq) {
                    if let Some(value) = p.string() {
                        row.values.insert(key.name, value);
                    }
                }
                if !p.at(TokenKind::RBrace) {
                    p.expect(TokenKind::Comma);
                }
            });
            p.eat(TokenKind::Semicolon);
            rows.push(row);
        });
    }

    fn endpoint(&mut self) -> Option<EndpointDecl> {
        self.bump();
        let name = self.name()?;
        let mut endpoint = EndpointDecl {
            name: name.name,
            span: name.span,
            ..EndpointDecl::default()
        };
        self.block(|p| {
            match p.current_kind() {
                Some(TokenKind::MethodKw) => {
                    p.bump();
                    endpoint.method = p.name().map(|m| m.name);
                }
                Some(TokenKind::RouteKw) => {
                    p.bump();
                    endpoint.route = p.string();
                }
                Some(TokenKind::DescriptionKw) => {
                    p.bump();
                    endpoint.description = p.string();
                }
                Some(TokenKind::ParamKw) => {
                    p.bump();
                    if let Some(param) = p.property() {
                        endpoint.params.push(param);
                    }
                }
                Some(TokenKind::ReturnsKw) => {
                    p.bump();
                    if let Some(returns) = p.property() {
                        if endpoint.returns.is_some() {
                            p.error("endpoint already declares `returns`");
                        }
                        endpoint.returns = Some(returns);
                    }
                }
                _ => {
                    p.error("expected `method`, `route`, `description`, `param` or `returns`");
                    p.recover_member();
                    return;
                }
            }
            p.terminate_member();
        });
        Some(endpoint)
    }

    fn property(&mut self) -> Option<PropertyDecl> {
        let start = self.current_range();
        let primary_key = self.eat(TokenKind::KeyKw);
        let (name, kind) = match self.current_kind() {
            Some(TokenKind::FieldKw) => {
                self.bump();
                let name = self.name()?;
                if !self.expect(TokenKind::Colon) {
                    return None;
                }
                let domain = self.name()?;
                (Some(name.name), PropertyDeclKind::Field { domain })
            }
            Some(TokenKind::AssociationKw) => {
                self.bump();
                let class = self.name()?;
                let name = if self.eat(TokenKind::AsKw) {
                    Some(self.name()?.name)
                } else {
                    None
                };
                let role = if self.eat(TokenKind::RoleKw) {
                    Some(self.name()?.name)
                } else {
                    None
                };
                (name, PropertyDeclKind::Association { class, role })
            }
            Some(TokenKind::CompositionKw) => {
                if primary_key {
                    self.error("a composition cannot be a primary key");
                }
                self.bump();
                let name = self.name()?;
                if !self.expect(TokenKind::Colon) {
                    return None;
                }
                let class = self.name()?;
                if !self.expect(TokenKind::OfKw) {
                    return None;
                }
                let kind = self.name()?;
                (Some(name.name), PropertyDeclKind::Composition { class, kind })
            }
            Some(TokenKind::AliasKw) => {
                self.bump();
                let class = self.name()?;
                let include = if self.eat(TokenKind::IncludeKw) {
                    self.name_list()
                } else {
                    Vec::new()
                };
                let exclude = if self.eat(TokenKind::ExcludeKw) {
                    self.name_list()
                } else {
                    Vec::new()
                };
                let list_domain = if self.eat(TokenKind::OfKw) {
                    Some(self.name()?)
                } else {
                    None
                };
                let prefix = if self.eat(TokenKind::PrefixKw) {
                    self.string()
                } else {
                    None
                };
                let suffix = if self.eat(TokenKind::SuffixKw) {
                    self.string()
                } else {
                    None
                };
                let alias = AliasDecl {
                    class,
                    include,
                    exclude,
                    list_domain,
                    prefix,
                    suffix,
                };
                (None, PropertyDeclKind::Alias(alias))
            }
            _ => {
                self.error("expected `field`, `association`, `composition` or `alias`");
                return None;
            }
        };

        let mut property = PropertyDecl {
            name,
            span: self.span(start),
            label: None,
            comment: None,
            primary_key,
            required: false,
            default_value: None,
            kind,
        };

        loop {
            match self.current_kind() {
                Some(TokenKind::RequiredKw) => {
                    self.bump();
                    property.required = true;
                }
                Some(TokenKind::LabelKw) => {
                    self.bump();
                    property.label = self.string();
                }
                Some(TokenKind::CommentKw) => {
                    self.bump();
                    property.comment = self.string();
                }
                Some(TokenKind::DefaultKw) => {
                    self.bump();
                    property.default_value = self.string();
                }
                _ => break,
            }
        }

        Some(property)
    }
}

fn starts_item(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::AliasKw
            | TokenKind::DomainKw
            | TokenKind::AbstractKw
            | TokenKind::ReferenceKw
            | TokenKind::PersistentKw
            | TokenKind::ClassKw
            | TokenKind::EndpointKw
    )
}

fn starts_property(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::KeyKw
            | TokenKind::FieldKw
            | TokenKind::AssociationKw
            | TokenKind::CompositionKw
            | TokenKind::AliasKw
    )
}

/// Strip quotes and resolve `\"`, `\\`, `\n` and `\t`.
fn unescape(literal: &str) -> String {
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
