//! Lexers for template lines and directive bodies using logos

use logos::Logos;

use crate::parser::ast::Span;

/// Tokens of a raw template line.
///
/// Every byte of the line belongs to some token, so slicing by span
/// reconstructs the line exactly.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum LineToken {
    /// `{{ name }}`, carrying the trimmed name
    #[regex(r"\{\{[ \t]*[A-Za-z0-9_.\-]+[ \t]*\}\}", |lex| {
        let s = lex.slice();
        s[2..s.len()-2].trim().to_string()
    })]
    Reference(String),

    /// `<!-- ... -->`, carrying the text between the markers
    #[regex(r"<!--([^-]|-[^-])*-->", |lex| {
        let s = lex.slice();
        s[4..s.len()-3].to_string()
    })]
    Comment(String),

    #[regex(r"[^{<]+")]
    Text,

    #[token("{")]
    Brace,

    #[token("<")]
    Angle,
}

/// Tokens inside a directive comment body
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    #[token("include")]
    Include,
    #[token("css")]
    Css,
    #[token("js")]
    Js,
    #[token("image")]
    Image,
    #[token("publication")]
    Publication,
    #[token("art")]
    Art,

    #[token(":")]
    Colon,
    #[token("=")]
    Equals,

    // Names and paths - must come after keywords
    #[regex(r"[^ \t\n\r:=|]+", |lex| lex.slice().to_string(), priority = 1)]
    Word(String),
}

/// Lex a template line into tokens with spans
pub fn lex_line(input: &str) -> impl Iterator<Item = (LineToken, Span)> + '_ {
    LineToken::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}

/// Lex a directive body into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_reference() {
        let tokens: Vec<_> = lex_line("Hi {{ name }}!").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                LineToken::Text,
                LineToken::Reference("name".to_string()),
                LineToken::Text
            ]
        );
    }

    #[test]
    fn test_line_comment() {
        let tokens: Vec<_> = lex_line("<!-- css: a.css -->\n").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![LineToken::Comment(" css: a.css ".to_string()), LineToken::Text]
        );
    }

    #[test]
    fn test_line_spans_cover_input() {
        let input = "<p>{ {{a}} <!-- x --> {{b_en}}</p>\n";
        let mut end = 0;
        for (_, span) in lex_line(input) {
            assert_eq!(span.start, end);
            end = span.end;
        }
        assert_eq!(end, input.len());
    }

    #[test]
    fn test_unterminated_markers_fall_back() {
        let tokens: Vec<_> = lex_line("{{name <!-- open").map(|(t, _)| t).collect();
        assert!(!tokens
            .iter()
            .any(|t| matches!(t, LineToken::Reference(_) | LineToken::Comment(_))));
    }

    #[test]
    fn test_directive_keywords() {
        let tokens: Vec<_> = lex("include css js image publication art")
            .map(|(t, _)| t)
            .collect();
        assert_eq!(
            tokens,
            vec![
                Token::Include,
                Token::Css,
                Token::Js,
                Token::Image,
                Token::Publication,
                Token::Art
            ]
        );
    }

    #[test]
    fn test_paths_are_words() {
        let tokens: Vec<_> = lex("css: css/site.min.css").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Css,
                Token::Colon,
                Token::Word("css/site.min.css".to_string())
            ]
        );
    }

    #[test]
    fn test_assignment_tokens() {
        let tokens: Vec<_> = lex("heading = title_cn").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Word("heading".to_string()),
                Token::Equals,
                Token::Word("title_cn".to_string())
            ]
        );
    }
}
