//! Ignore rules applied to the merged critical CSS

use regex::Regex;
use serde::{Deserialize, Serialize};

use lightningcss::declaration::DeclarationBlock;
use lightningcss::properties::Property;
use lightningcss::rules::CssRule;
use lightningcss::traits::ToCss;

use crate::css::stylesheet::{at_rule_name, child_rules_mut, is_empty_rule, media_query, minified};
use crate::css::{parse_stylesheet, print_stylesheet};
use crate::error::CriticalError;

/// A single ignore entry: an exact string or a `/pattern/flags` regex
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IgnoreRule {
    Exact(String),
    Pattern(Regex),
}

impl IgnoreRule {
    #[must_use]
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact(value.into())
    }

    /// Compile a regex rule; matching is unanchored like `RegExp.test`
    pub fn pattern(pattern: &str, case_insensitive: bool) -> Result<Self, CriticalError> {
        let source = if case_insensitive {
            format!("(?i){pattern}")
        } else {
            pattern.to_string()
        };
        Regex::new(&source)
            .map(Self::Pattern)
            .map_err(|e| CriticalError::Config(format!("invalid ignore pattern /{pattern}/: {e}")))
    }

    /// Parse the textual form: `/body/i` is a regex, anything else is exact
    pub fn parse(text: &str) -> Result<Self, CriticalError> {
        if let Some(rest) = text.strip_prefix('/')
            && let Some(end) = rest.rfind('/')
        {
            let (body, flags) = (&rest[..end], &rest[end + 1..]);
            if flags.chars().all(|c| matches!(c, 'i' | 'g' | 'm' | 's' | 'u')) {
                return Self::pattern(body, flags.contains('i'));
            }
        }
        Ok(Self::exact(text))
    }

    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Exact(value) => value == text,
            Self::Pattern(regex) => regex.is_match(text),
        }
    }
}

impl TryFrom<String> for IgnoreRule {
    type Error = CriticalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IgnoreRule> for String {
    fn from(rule: IgnoreRule) -> Self {
        match rule {
            IgnoreRule::Exact(value) => value,
            IgnoreRule::Pattern(regex) => format!("/{}/", regex.as_str()),
        }
    }
}

/// Which parts of the CSS an ignore rule is tested against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IgnoreOptions {
    pub match_selectors: bool,
    pub match_types: bool,
    pub match_declaration_properties: bool,
    pub match_declaration_values: bool,
    pub match_media: bool,
}

impl Default for IgnoreOptions {
    fn default() -> Self {
        Self {
            match_selectors: true,
            match_types: true,
            match_declaration_properties: true,
            match_declaration_values: false,
            match_media: true,
        }
    }
}

/// Remove everything in `css` matched by `rules`
///
/// Returns the input untouched when there are no rules; otherwise the output
/// is minified as a side effect of reprinting.
#[must_use]
pub fn filter_css(css: &str, rules: &[IgnoreRule], options: &IgnoreOptions) -> String {
    if rules.is_empty() {
        return css.to_string();
    }
    let mut sheet = match parse_stylesheet(css) {
        Ok(sheet) => sheet,
        Err(e) => {
            log::warn!("Ignore rules not applied: {e:#}");
            return css.to_string();
        }
    };
    let filter = Filter { rules, options };
    let kept = filter.filter_rules(std::mem::take(&mut sheet.rules.0));
    sheet.rules.0 = kept;
    print_stylesheet(&sheet).unwrap_or_else(|e| {
        log::warn!("Ignore rules not applied: {e:#}");
        css.to_string()
    })
}

struct Filter<'a> {
    rules: &'a [IgnoreRule],
    options: &'a IgnoreOptions,
}

impl Filter<'_> {
    fn hit(&self, text: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(text))
    }

    fn filter_rules<'i>(&self, rules: Vec<CssRule<'i>>) -> Vec<CssRule<'i>> {
        rules
            .into_iter()
            .filter_map(|rule| self.rule(rule))
            .filter(|rule| !is_empty_rule(rule))
            .collect()
    }

    fn rule<'i>(&self, mut rule: CssRule<'i>) -> Option<CssRule<'i>> {
        if self.options.match_types
            && let Some(name) = at_rule_name(&rule)
            && (self.hit(&name) || self.hit(&format!("@{name}")))
        {
            return None;
        }
        if self.options.match_media
            && let Some(query) = media_query(&rule)
            && self.hit(&query)
        {
            return None;
        }

        match &mut rule {
            CssRule::Style(style) => {
                if self.options.match_selectors {
                    style.selectors.0.retain(|selector| {
                        selector
                            .to_css_string(minified())
                            .map_or(true, |text| !self.hit(&text))
                    });
                    if style.selectors.0.is_empty() {
                        return None;
                    }
                }
                self.declarations(&mut style.declarations);
            }
            CssRule::Page(page) => self.declarations(&mut page.declarations),
            _ => {}
        }

        if let Some(children) = child_rules_mut(&mut rule) {
            let taken = std::mem::take(&mut children.0);
            children.0 = self.filter_rules(taken);
        }
        Some(rule)
    }

    fn declarations(&self, block: &mut DeclarationBlock<'_>) {
        block.declarations.retain(|property| self.keeps(property));
        block.important_declarations.retain(|property| self.keeps(property));
    }

    fn keeps(&self, property: &Property<'_>) -> bool {
        let id = property.property_id();
        let name = id.name();
        if self.options.match_declaration_properties && self.hit(name) {
            return false;
        }
        if self.options.match_declaration_values
            && let Ok(value) = property.value_to_css_string(minified())
            && (self.hit(&value) || self.hit(&format!("{name}:{value}")))
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(items: &[&str]) -> Vec<IgnoreRule> {
        items.iter().map(|s| IgnoreRule::parse(s).unwrap()).collect()
    }

    #[test]
    fn parses_regex_and_exact_forms() {
        assert!(matches!(IgnoreRule::parse(".foo").unwrap(), IgnoreRule::Exact(_)));
        let rule = IgnoreRule::parse("/^\\.AD/i").unwrap();
        assert!(rule.matches(".ad-banner"));
        assert!(!rule.matches("div .ad"));
        assert!(IgnoreRule::parse("/(unclosed/").is_err());
        // Not a flag suffix, so it stays literal
        assert!(matches!(IgnoreRule::parse("/a/b").unwrap(), IgnoreRule::Exact(_)));
    }

    #[test]
    fn drops_matching_selectors_only() {
        let css = "h1,.ad{color:red}.ad{margin:0}p{padding:0}";
        let out = filter_css(css, &rules(&[".ad"]), &IgnoreOptions::default());
        assert_eq!(out, "h1{color:red}p{padding:0}");
    }

    #[test]
    fn drops_at_rules_by_type_and_media() {
        let css = "@font-face{font-family:X;src:url(x.woff)}@media print{a{color:red}}@media screen{b{color:red}}";
        let out = filter_css(css, &rules(&["@font-face", "print"]), &IgnoreOptions::default());
        assert_eq!(out, "@media screen{b{color:red}}");
    }

    #[test]
    fn declaration_values_are_opt_in() {
        let css = "a{color:red;background-image:url(x.png)}";
        let rule = rules(&["/url\\(/"]);
        assert_eq!(filter_css(css, &rule, &IgnoreOptions::default()), css);

        let options = IgnoreOptions {
            match_declaration_values: true,
            ..IgnoreOptions::default()
        };
        assert_eq!(filter_css(css, &rule, &options), "a{color:red}");
    }

    #[test]
    fn removes_rules_left_empty() {
        let css = "a{color:red}@media screen{a{color:red}}";
        let out = filter_css(css, &rules(&["color"]), &IgnoreOptions::default());
        assert_eq!(out, "");
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: IgnoreOptions = serde_json::from_str(r#"{"matchMedia":false}"#).unwrap();
        assert!(!options.match_media);
        assert!(options.match_selectors);
        assert!(!options.match_declaration_values);
    }
}
