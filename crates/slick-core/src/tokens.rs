//! Immutable, range-ordered store of tokens and comments.
//!
//! Tokens and comments are produced by the external parser and never overlap.
//! The store merges them once into a single range-ordered timeline and
//! answers directional neighbor queries against it.

use crate::line_index::LineIndex;
use crate::span::{Range, Span};
use serde::{Deserialize, Serialize};

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Punctuation and operators.
    Punctuator,
    /// Language keyword.
    Keyword,
    /// Identifier token.
    Identifier,
    /// Numeric literal.
    Numeric,
    /// String literal.
    String,
    /// Template string chunk.
    Template,
    /// Legacy embedded-text token; may carry internal whitespace.
    Text,
}

/// A single lexed token with its source extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lexical category.
    pub kind: TokenKind,
    /// Raw token text.
    pub value: String,
    /// Byte range in the source.
    pub range: Range,
    /// Line/column span, derived from the same line index as `range`.
    pub loc: Span,
}

impl Token {
    /// Creates a token, deriving its span from `index`.
    #[must_use]
    pub fn new(kind: TokenKind, value: impl Into<String>, range: Range, index: &LineIndex) -> Self {
        Self {
            kind,
            value: value.into(),
            range,
            loc: index.span(range),
        }
    }
}

/// Kind of a source comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    /// `// ...` comment.
    Line,
    /// `/* ... */` comment.
    Block,
    /// First-in-file script marker (`#!...`), reclassified from a line
    /// comment during source-code construction. Never carries directives.
    Shebang,
}

/// A source comment with its extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Comment kind.
    pub kind: CommentKind,
    /// Comment text without delimiters.
    pub value: String,
    /// Byte range in the source, including delimiters.
    pub range: Range,
    /// Line/column span.
    pub loc: Span,
}

impl Comment {
    /// Creates a comment, deriving its span from `index`.
    #[must_use]
    pub fn new(
        kind: CommentKind,
        value: impl Into<String>,
        range: Range,
        index: &LineIndex,
    ) -> Self {
        Self {
            kind,
            value: value.into(),
            range,
            loc: index.span(range),
        }
    }
}

/// One entry of the merged timeline, by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceElement<'a> {
    /// A token entry.
    Token(&'a Token),
    /// A comment entry.
    Comment(&'a Comment),
}

impl SourceElement<'_> {
    /// Byte range of the element.
    #[must_use]
    pub fn range(&self) -> Range {
        match self {
            Self::Token(t) => t.range,
            Self::Comment(c) => c.range,
        }
    }

    /// Line/column span of the element.
    #[must_use]
    pub fn loc(&self) -> Span {
        match self {
            Self::Token(t) => t.loc,
            Self::Comment(c) => c.loc,
        }
    }

    /// Raw text of the element.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Token(t) => &t.value,
            Self::Comment(c) => &c.value,
        }
    }

    /// Returns true for comment entries.
    #[must_use]
    pub fn is_comment(&self) -> bool {
        matches!(self, Self::Comment(_))
    }
}

/// Inclusion predicate for neighbor queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenFilter {
    /// Whether comment entries are candidates.
    pub include_comments: bool,
}

impl TokenFilter {
    /// Filter matching tokens only.
    #[must_use]
    pub fn tokens_only() -> Self {
        Self {
            include_comments: false,
        }
    }

    /// Filter matching tokens and comments.
    #[must_use]
    pub fn with_comments() -> Self {
        Self {
            include_comments: true,
        }
    }

    fn admits(self, element: SourceElement<'_>) -> bool {
        self.include_comments || !element.is_comment()
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Token(usize),
    Comment(usize),
}

/// Range-ordered sequence of tokens and comments.
#[derive(Debug)]
pub struct TokenStore {
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    // Stable two-pointer merge of the two inputs, strictly increasing by
    // start offset.
    timeline: Vec<(Range, Slot)>,
}

impl TokenStore {
    /// Merges `tokens` and `comments` into a single timeline.
    ///
    /// Both inputs must already be sorted by start offset; the caller
    /// validates this before construction.
    #[must_use]
    pub fn new(tokens: Vec<Token>, comments: Vec<Comment>) -> Self {
        let mut timeline = Vec::with_capacity(tokens.len() + comments.len());
        let (mut ti, mut ci) = (0, 0);
        while ti < tokens.len() && ci < comments.len() {
            if tokens[ti].range.start <= comments[ci].range.start {
                timeline.push((tokens[ti].range, Slot::Token(ti)));
                ti += 1;
            } else {
                timeline.push((comments[ci].range, Slot::Comment(ci)));
                ci += 1;
            }
        }
        for (i, t) in tokens.iter().enumerate().skip(ti) {
            timeline.push((t.range, Slot::Token(i)));
        }
        for (i, c) in comments.iter().enumerate().skip(ci) {
            timeline.push((c.range, Slot::Comment(i)));
        }
        Self {
            tokens,
            comments,
            timeline,
        }
    }

    /// All tokens, in source order.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// All comments, in source order.
    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Number of merged timeline entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    /// Returns true if the store holds no tokens or comments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    fn element(&self, slot: Slot) -> SourceElement<'_> {
        match slot {
            Slot::Token(i) => SourceElement::Token(&self.tokens[i]),
            Slot::Comment(i) => SourceElement::Comment(&self.comments[i]),
        }
    }

    /// Iterates over the merged timeline in source order.
    pub fn iter(&self) -> impl Iterator<Item = SourceElement<'_>> {
        self.timeline.iter().map(|&(_, slot)| self.element(slot))
    }

    /// Last element ending at or before the start of `range` that passes
    /// `filter`.
    #[must_use]
    pub fn before(&self, range: Range, filter: TokenFilter) -> Option<SourceElement<'_>> {
        let upper = self.timeline.partition_point(|(r, _)| r.start < range.start);
        self.timeline[..upper]
            .iter()
            .rev()
            .map(|&(_, slot)| self.element(slot))
            .find(|e| e.range().end <= range.start && filter.admits(*e))
    }

    /// First element starting at or after the end of `range` that passes
    /// `filter`.
    #[must_use]
    pub fn after(&self, range: Range, filter: TokenFilter) -> Option<SourceElement<'_>> {
        let lower = self.timeline.partition_point(|(r, _)| r.start < range.end);
        self.timeline[lower..]
            .iter()
            .map(|&(_, slot)| self.element(slot))
            .find(|e| filter.admits(*e))
    }

    /// First element lying entirely inside `range` that passes `filter`.
    #[must_use]
    pub fn first_inside(&self, range: Range, filter: TokenFilter) -> Option<SourceElement<'_>> {
        let lower = self.timeline.partition_point(|(r, _)| r.start < range.start);
        self.timeline[lower..]
            .iter()
            .take_while(|(r, _)| r.start < range.end)
            .map(|&(_, slot)| self.element(slot))
            .find(|e| e.range().end <= range.end && filter.admits(*e))
    }

    /// Last element lying entirely inside `range` that passes `filter`.
    #[must_use]
    pub fn last_inside(&self, range: Range, filter: TokenFilter) -> Option<SourceElement<'_>> {
        let lower = self.timeline.partition_point(|(r, _)| r.start < range.start);
        let upper = self.timeline.partition_point(|(r, _)| r.start < range.end);
        self.timeline[lower..upper]
            .iter()
            .rev()
            .map(|&(_, slot)| self.element(slot))
            .find(|e| e.range().end <= range.end && filter.admits(*e))
    }

    /// Returns true if any whitespace (or skipped text) separates the two
    /// ranges.
    ///
    /// Order-independent: overlapping ranges yield false; otherwise the
    /// merged timeline between the two is walked and any gap between
    /// adjacent entries counts as space. O(k) in the number of entries
    /// between `a` and `b`.
    #[must_use]
    pub fn is_space_between(&self, a: Range, b: Range) -> bool {
        self.space_between(a, b, false)
    }

    /// Legacy variant of [`Self::is_space_between`] that additionally treats
    /// a [`TokenKind::Text`] token carrying internal whitespace as a positive
    /// match. Preserved for backward compatibility with pre-existing rule
    /// behavior.
    #[must_use]
    pub fn is_space_between_legacy(&self, a: Range, b: Range) -> bool {
        self.space_between(a, b, true)
    }

    fn space_between(&self, a: Range, b: Range, match_text_whitespace: bool) -> bool {
        if a.overlaps(b) {
            return false;
        }
        let (first, second) = if a.start <= b.start { (a, b) } else { (b, a) };

        let mut prev_end = first.end;
        let lower = self.timeline.partition_point(|(r, _)| r.start < first.end);
        for &(range, slot) in &self.timeline[lower..] {
            if range.end > second.start {
                break;
            }
            if range.start != prev_end {
                return true;
            }
            if match_text_whitespace {
                if let SourceElement::Token(token) = self.element(slot) {
                    if token.kind == TokenKind::Text
                        && token.value.chars().any(char::is_whitespace)
                    {
                        return true;
                    }
                }
            }
            prev_end = range.end;
        }
        prev_end != second.start
    }
}
