//! Stylesheet parsing and printing on top of lightningcss
//!
//! The merger and the ignore filter both work on a parsed [`StyleSheet`] and
//! print it back minified. Parsing uses error recovery, so a malformed rule
//! is skipped with a warning rather than failing the whole run.

use anyhow::{Result, anyhow};
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::traits::ToCss;

/// Parse `css`, recovering from invalid rules and declarations
pub fn parse_stylesheet(css: &str) -> Result<StyleSheet<'_>> {
    let options = ParserOptions {
        error_recovery: true,
        ..ParserOptions::default()
    };
    StyleSheet::parse(css, options).map_err(|e| anyhow!("Failed to parse CSS: {e}"))
}

pub(crate) fn minified() -> PrinterOptions<'static> {
    PrinterOptions {
        minify: true,
        ..PrinterOptions::default()
    }
}

/// Print a stylesheet without whitespace or comments
pub fn print_stylesheet(sheet: &StyleSheet<'_>) -> Result<String> {
    sheet
        .to_css(minified())
        .map(|out| out.code)
        .map_err(|e| anyhow!("Failed to print CSS: {e}"))
}

/// Minify a stylesheet without merging or reordering its rules
///
/// CSS that cannot be parsed at all is returned as given.
#[must_use]
pub fn minify(css: &str) -> String {
    match parse_stylesheet(css).and_then(|sheet| print_stylesheet(&sheet)) {
        Ok(out) => out,
        Err(e) => {
            log::warn!("Leaving CSS unminified: {e:#}");
            css.to_string()
        }
    }
}

/// Minified text of a single rule, used to compare rules for equality
pub(crate) fn rule_key(rule: &CssRule<'_>) -> Option<String> {
    rule.to_css_string(minified()).ok()
}

/// The nested rule list of a grouping rule
pub(crate) fn child_rules_mut<'a, 'i>(rule: &'a mut CssRule<'i>) -> Option<&'a mut CssRuleList<'i>> {
    match rule {
        CssRule::Media(media) => Some(&mut media.rules),
        CssRule::Supports(supports) => Some(&mut supports.rules),
        CssRule::LayerBlock(layer) => Some(&mut layer.rules),
        CssRule::Container(container) => Some(&mut container.rules),
        CssRule::MozDocument(document) => Some(&mut document.rules),
        CssRule::Style(style) => Some(&mut style.rules),
        _ => None,
    }
}

pub(crate) fn child_rules<'a, 'i>(rule: &'a CssRule<'i>) -> Option<&'a CssRuleList<'i>> {
    match rule {
        CssRule::Media(media) => Some(&media.rules),
        CssRule::Supports(supports) => Some(&supports.rules),
        CssRule::LayerBlock(layer) => Some(&layer.rules),
        CssRule::Container(container) => Some(&container.rules),
        CssRule::MozDocument(document) => Some(&document.rules),
        CssRule::Style(style) => Some(&style.rules),
        _ => None,
    }
}

/// True for rules that print nothing useful: no selectors, no declarations
/// and no nested rules, or a grouping rule with no children
pub(crate) fn is_empty_rule(rule: &CssRule<'_>) -> bool {
    match rule {
        CssRule::Style(style) => {
            style.selectors.0.is_empty()
                || (style.declarations.declarations.is_empty()
                    && style.declarations.important_declarations.is_empty()
                    && style.rules.0.is_empty())
        }
        CssRule::FontFace(font_face) => font_face.properties.is_empty(),
        CssRule::Keyframes(keyframes) => keyframes.keyframes.is_empty(),
        CssRule::Ignored => true,
        other => child_rules(other).is_some_and(|children| children.0.is_empty()),
    }
}

/// At-rule name without the `@`, `None` for style rules
pub(crate) fn at_rule_name(rule: &CssRule<'_>) -> Option<String> {
    let name = match rule {
        CssRule::Media(_) => "media",
        CssRule::Import(_) => "import",
        CssRule::Keyframes(_) => "keyframes",
        CssRule::FontFace(_) => "font-face",
        CssRule::Page(_) => "page",
        CssRule::Supports(_) => "supports",
        CssRule::CounterStyle(_) => "counter-style",
        CssRule::Namespace(_) => "namespace",
        CssRule::MozDocument(_) => "-moz-document",
        CssRule::Viewport(_) => "viewport",
        CssRule::CustomMedia(_) => "custom-media",
        CssRule::LayerStatement(_) | CssRule::LayerBlock(_) => "layer",
        CssRule::Property(_) => "property",
        CssRule::Container(_) => "container",
        CssRule::Unknown(unknown) => return Some(unknown.name.to_string()),
        _ => return None,
    };
    Some(name.to_string())
}

/// Minified media query list of an `@media` rule
pub(crate) fn media_query(rule: &CssRule<'_>) -> Option<String> {
    match rule {
        CssRule::Media(media) => media.query.to_css_string(minified()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minify_drops_comments_and_whitespace() {
        let css = "/* header */\nh1 ,  h2 > span {\n  margin : 0 ;\n}\n";
        assert_eq!(minify(css), "h1,h2>span{margin:0}");
    }

    #[test]
    fn invalid_declarations_are_not_fatal() {
        let sheet = parse_stylesheet("a{color:red;width:}b{margin:0}").unwrap();
        assert_eq!(sheet.rules.0.len(), 2);
    }

    #[test]
    fn classifies_rules() {
        let sheet = parse_stylesheet("@media print{}a{margin:0}@font-face{font-family:X}").unwrap();
        let rules = &sheet.rules.0;
        assert_eq!(at_rule_name(&rules[0]).as_deref(), Some("media"));
        assert_eq!(media_query(&rules[0]).as_deref(), Some("print"));
        assert!(is_empty_rule(&rules[0]));
        assert_eq!(at_rule_name(&rules[1]), None);
        assert!(!is_empty_rule(&rules[1]));
        assert_eq!(at_rule_name(&rules[2]).as_deref(), Some("font-face"));
    }
}
