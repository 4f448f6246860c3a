//! Syntax types produced by the directive matcher

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Which structured-data renderer a listing embed is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingKind {
    Publication,
    Art,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Publication => "publication",
            ListingKind::Art => "art",
        }
    }
}

impl std::fmt::Display for ListingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural instruction found inside a `<!-- ... -->` comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `<!-- alias = target -->`
    Assignment { alias: String, target: String },
    /// `<!-- include: path -->`
    Include { path: String },
    /// `<!-- css: path -->`
    Stylesheet { path: String },
    /// `<!-- js: path -->`
    Script { path: String },
    /// `<!-- image: path | description -->`
    Image { path: String, description: String },
    /// `<!-- publication: path -->` or `<!-- art: path -->`
    Listing { kind: ListingKind, path: String },
}

impl Directive {
    /// Position in the fixed matching order; lower wins when a line
    /// carries several directives.
    pub fn priority(&self) -> u8 {
        match self {
            Directive::Assignment { .. } => 0,
            Directive::Include { .. } => 1,
            Directive::Stylesheet { .. } => 2,
            Directive::Script { .. } => 3,
            Directive::Image { .. } => 4,
            Directive::Listing {
                kind: ListingKind::Publication,
                ..
            } => 5,
            Directive::Listing {
                kind: ListingKind::Art,
                ..
            } => 6,
        }
    }

    /// Terminal directives consume the whole line: no variable
    /// resolution runs after them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Directive::Assignment { .. }
                | Directive::Include { .. }
                | Directive::Stylesheet { .. }
                | Directive::Script { .. }
        )
    }
}

/// A `{{name}}` reference inside a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Variable name with surrounding whitespace removed
    pub name: String,
    /// The reference exactly as written, braces included
    pub raw: String,
}

/// One piece of a tokenized line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Reference(Spanned<Reference>),
}

impl Segment {
    /// Source text of the segment, unresolved
    pub fn raw(&self) -> &str {
        match self {
            Segment::Literal(text) => text,
            Segment::Reference(reference) => &reference.node.raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let ordered = [
            Directive::Assignment {
                alias: "a".into(),
                target: "b".into(),
            },
            Directive::Include { path: "x".into() },
            Directive::Stylesheet { path: "x".into() },
            Directive::Script { path: "x".into() },
            Directive::Image {
                path: "x".into(),
                description: String::new(),
            },
            Directive::Listing {
                kind: ListingKind::Publication,
                path: "x".into(),
            },
            Directive::Listing {
                kind: ListingKind::Art,
                path: "x".into(),
            },
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].priority() < pair[1].priority());
        }
    }

    #[test]
    fn test_terminal_directives() {
        assert!(Directive::Include { path: "x".into() }.is_terminal());
        assert!(Directive::Script { path: "x".into() }.is_terminal());
        assert!(!Directive::Image {
            path: "x".into(),
            description: String::new()
        }
        .is_terminal());
        assert!(!Directive::Listing {
            kind: ListingKind::Art,
            path: "x".into()
        }
        .is_terminal());
    }
}
