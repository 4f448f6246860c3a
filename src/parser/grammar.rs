//! Directive matching: comment bodies are parsed with chumsky, lines are
//! scanned with the logos line lexer

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::{self, LineToken, Token};

/// Opening marker of a directive comment
pub const COMMENT_MARKER: &str = "<!--";
/// Closing marker of a directive comment
const COMMENT_END: &str = "-->";
/// Opening marker of a variable reference
pub const REFERENCE_MARKER: &str = "{{";

/// Fast path check: lines without either marker pass through untouched
pub fn has_markers(line: &str) -> bool {
    line.contains(COMMENT_MARKER) || line.contains(REFERENCE_MARKER)
}

/// Parse the body of a `<!-- ... -->` comment into a directive.
///
/// Returns `None` for ordinary comments. The image description is
/// everything after the first `|`, kept verbatim.
pub fn parse_directive(body: &str) -> Option<Directive> {
    let (head, description) = match body.split_once('|') {
        Some((head, description)) => (head, Some(description.trim())),
        None => (body, None),
    };
    let len = head.len();

    let token_iter = lexer::lex(head).map(|(tok, span)| (tok, span.into()));
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    let directive = directive_parser()
        .parse(token_stream)
        .into_result()
        .ok()?;

    match (directive, description) {
        (Directive::Image { path, .. }, description) => Some(Directive::Image {
            path,
            description: description.unwrap_or_default().to_string(),
        }),
        // Only images take a description
        (_, Some(_)) => None,
        (directive, None) => Some(directive),
    }
}

/// Find the winning structural directive on a line.
///
/// Every comment on the line is considered; the directive earliest in the
/// fixed priority order wins regardless of its position in the line.
pub fn match_line(line: &str) -> Option<Spanned<Directive>> {
    if !line.contains(COMMENT_MARKER) {
        return None;
    }
    lexer::lex_line(line)
        .filter_map(|(tok, span)| match tok {
            LineToken::Comment(body) => {
                parse_directive(&body).map(|directive| Spanned::new(directive, span))
            }
            _ => None,
        })
        .min_by_key(|directive| directive.node.priority())
}

/// Split a line into literal text and `{{name}}` references, left to right.
///
/// References inside comments count too, e.g. in conditional comments.
pub fn segments(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal_start = 0;

    for (name, span) in references(line) {
        if literal_start < span.start {
            segments.push(Segment::Literal(line[literal_start..span.start].to_string()));
        }
        let raw = line[span.clone()].to_string();
        segments.push(Segment::Reference(Spanned::new(Reference { name, raw }, span.clone())));
        literal_start = span.end;
    }
    if literal_start < line.len() {
        segments.push(Segment::Literal(line[literal_start..].to_string()));
    }

    segments
}

/// Every reference in a line with its span, comment bodies included
fn references(line: &str) -> Vec<(String, std::ops::Range<usize>)> {
    let mut found = Vec::new();

    for (tok, span) in lexer::lex_line(line) {
        match tok {
            LineToken::Reference(name) => found.push((name, span)),
            LineToken::Comment(_) => {
                // A body never holds a complete comment, so one level is enough
                let body = span.start + COMMENT_MARKER.len()..span.end - COMMENT_END.len();
                let offset = body.start;
                found.extend(lexer::lex_line(&line[body]).filter_map(|(tok, inner)| {
                    match tok {
                        LineToken::Reference(name) => {
                            Some((name, offset + inner.start..offset + inner.end))
                        }
                        _ => None,
                    }
                }));
            }
            _ => {}
        }
    }

    found
}

fn directive_parser<'a, I>() -> impl Parser<'a, I, Directive, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    // Keywords are plain names outside the keyword position
    let word = select! {
        Token::Word(s) => s,
        Token::Include => "include".to_string(),
        Token::Css => "css".to_string(),
        Token::Js => "js".to_string(),
        Token::Image => "image".to_string(),
        Token::Publication => "publication".to_string(),
        Token::Art => "art".to_string(),
    };

    // alias = target
    let assignment = word
        .clone()
        .then_ignore(just(Token::Equals))
        .then(word.clone())
        .map(|(alias, target)| Directive::Assignment { alias, target });

    let include = just(Token::Include)
        .ignore_then(just(Token::Colon))
        .ignore_then(word.clone())
        .map(|path| Directive::Include { path });

    let stylesheet = just(Token::Css)
        .ignore_then(just(Token::Colon))
        .ignore_then(word.clone())
        .map(|path| Directive::Stylesheet { path });

    let script = just(Token::Js)
        .ignore_then(just(Token::Colon))
        .ignore_then(word.clone())
        .map(|path| Directive::Script { path });

    let image = just(Token::Image)
        .ignore_then(just(Token::Colon))
        .ignore_then(word.clone())
        .map(|path| Directive::Image {
            path,
            description: String::new(),
        });

    let listing_kind = choice((
        just(Token::Publication).to(ListingKind::Publication),
        just(Token::Art).to(ListingKind::Art),
    ));

    let listing = listing_kind
        .then_ignore(just(Token::Colon))
        .then(word)
        .map(|(kind, path)| Directive::Listing { kind, path });

    choice((assignment, include, stylesheet, script, image, listing)).then_ignore(end())
}
