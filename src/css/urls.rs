//! `url(...)` rewriting over cssparser tokens
//!
//! Only real url tokens are visited, including those nested inside other
//! functions or blocks (`image-set(url(a.png) 1x)`, `@media { ... }`).
//! Strings, comments and all other text are copied through untouched.

use cssparser::{ParseError, Parser, ParserInput, Token};

/// Rewrite every `url(...)` reference in `css`
///
/// `rewrite` receives the unescaped reference and returns the replacement, or
/// `None` to leave the original token text as-is. Replacements are emitted as
/// `url("...")`.
pub fn map_css_urls<F>(css: &str, mut rewrite: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    rewrite_urls_in_parser(&mut parser, &mut rewrite)
}

/// Every `url(...)` reference in `css`, in document order
#[must_use]
pub fn collect_css_urls(css: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let _ = map_css_urls(css, |url| {
        urls.push(url.to_string());
        None
    });
    urls
}

fn escape_url_for_css(url: &str) -> String {
    let mut escaped = String::with_capacity(url.len());
    for ch in url.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\a "),
            '\r' => escaped.push_str("\\d "),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn rewrite_urls_in_parser<'i, 't>(
    parser: &mut Parser<'i, 't>,
    rewrite: &mut dyn FnMut(&str) -> Option<String>,
) -> String {
    let mut out = String::new();
    let mut last_emitted = parser.position();

    loop {
        let token_start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::UnquotedUrl(ref value) => {
                if let Some(replacement) = rewrite(value.as_ref()) {
                    out.push_str(parser.slice(last_emitted..token_start));
                    out.push_str(&format!("url(\"{}\")", escape_url_for_css(&replacement)));
                    last_emitted = parser.position();
                }
            }
            Token::Function(ref name) if name.eq_ignore_ascii_case("url") => {
                let arg = parser.parse_nested_block(|nested| {
                    let mut arg = None;
                    while let Ok(token) = nested.next() {
                        match token {
                            Token::QuotedString(s) | Token::UnquotedUrl(s) | Token::Ident(s) => {
                                arg = Some(s.as_ref().to_string());
                            }
                            _ => {
                                arg = None;
                                break;
                            }
                        }
                    }
                    Ok::<_, ParseError<'i, ()>>(arg)
                });

                if let Ok(Some(arg)) = arg
                    && let Some(replacement) = rewrite(&arg)
                {
                    out.push_str(parser.slice(last_emitted..token_start));
                    out.push_str(&format!("url(\"{}\")", escape_url_for_css(&replacement)));
                    last_emitted = parser.position();
                }
            }
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => {
                let after_open = parser.position();
                let nested = parser.parse_nested_block(|nested| {
                    let inner = rewrite_urls_in_parser(nested, &mut *rewrite);
                    Ok::<_, ParseError<'i, ()>>((inner, nested.position()))
                });
                let end = parser.position();

                if let Ok((inner, inner_end)) = nested {
                    if inner != parser.slice(after_open..inner_end) {
                        out.push_str(parser.slice(last_emitted..after_open));
                        out.push_str(&inner);
                        out.push_str(parser.slice(inner_end..end));
                        last_emitted = end;
                    }
                }
            }
            _ => {}
        }
    }

    out.push_str(parser.slice_from(last_emitted));
    out
}
