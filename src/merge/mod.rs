//! Combining per-dimension critical CSS fragments
//!
//! Fragments computed for different viewports overlap heavily. Merging runs a
//! deliberately narrow set of structural passes over the combined rule list:
//!
//! - empty rules and blocks are removed
//! - identical `@media` blocks collapse to their last occurrence
//! - `@media` blocks with the same condition are merged when no rule between
//!   them sets a property the moved block also sets
//! - identical style rules within one scope collapse to their last occurrence
//! - identical `@font-face` rules collapse to their first occurrence
//!
//! Nothing else is restructured; reordering declarations or merging rules by
//! selector could change the cascade between independently computed fragments.

pub mod filter;

use std::collections::HashSet;

use lightningcss::rules::CssRule;

use crate::css::stylesheet::{child_rules, child_rules_mut, is_empty_rule, media_query, rule_key};
use crate::css::{parse_stylesheet, print_stylesheet};

pub use filter::{IgnoreOptions, IgnoreRule, filter_css};

/// Merge critical CSS fragments into one minified stylesheet
///
/// A single fragment is returned exactly as given.
#[must_use]
pub fn merge(fragments: &[String]) -> String {
    if let [single] = fragments {
        return single.clone();
    }

    let combined = fragments.join("\n");
    let mut sheet = match parse_stylesheet(&combined) {
        Ok(sheet) => sheet,
        Err(e) => {
            log::warn!("Concatenating fragments unmerged: {e:#}");
            return combined.clone();
        }
    };

    let rules = std::mem::take(&mut sheet.rules.0);
    let rules = remove_empty(rules);
    let rules = keep_last_where(rules, is_media);
    let rules = merge_media(rules);
    let rules = remove_duplicate_rules(rules);
    let rules = remove_duplicate_font_faces(rules);
    sheet.rules.0 = remove_empty(rules);

    log::debug!("Merged {} fragments into {} top-level rules", fragments.len(), sheet.rules.0.len());
    print_stylesheet(&sheet).unwrap_or_else(|e| {
        log::warn!("Concatenating fragments unmerged: {e:#}");
        combined.clone()
    })
}

fn is_media(rule: &CssRule<'_>) -> bool {
    matches!(rule, CssRule::Media(_))
}

fn remove_empty<'i>(rules: Vec<CssRule<'i>>) -> Vec<CssRule<'i>> {
    rules
        .into_iter()
        .map(|rule| map_children(rule, remove_empty))
        .filter(|rule| !is_empty_rule(rule))
        .collect()
}

/// Apply `f` to the child rule list of a grouping rule
fn map_children<'i>(mut rule: CssRule<'i>, f: fn(Vec<CssRule<'i>>) -> Vec<CssRule<'i>>) -> CssRule<'i> {
    if let Some(children) = child_rules_mut(&mut rule) {
        let taken = std::mem::take(&mut children.0);
        children.0 = f(taken);
    }
    rule
}

/// Drop every rule selected by `select` that is repeated later in the list
fn keep_last_where<'i>(rules: Vec<CssRule<'i>>, select: fn(&CssRule<'_>) -> bool) -> Vec<CssRule<'i>> {
    let mut seen = HashSet::new();
    let mut kept: Vec<CssRule<'i>> = rules
        .into_iter()
        .rev()
        .filter(|rule| !select(rule) || rule_key(rule).is_none_or(|key| seen.insert(key)))
        .collect();
    kept.reverse();
    kept
}

/// Merge `@media` blocks that share a condition
///
/// For a pair of blocks the earlier one is moved forward into the later one
/// when none of its properties are set by a rule in between; failing that the
/// later one is moved back. When both moves would cross a conflicting rule
/// the blocks stay apart.
fn merge_media<'i>(mut rules: Vec<CssRule<'i>>) -> Vec<CssRule<'i>> {
    'scan: loop {
        for i in 0..rules.len() {
            let Some(query) = media_query(&rules[i]) else { continue };
            for j in i + 1..rules.len() {
                if media_query(&rules[j]).as_deref() != Some(query.as_str()) {
                    continue;
                }
                let between = &rules[i + 1..j];
                if can_move(&rules[i], between) {
                    let earlier = rules.remove(i);
                    if let (CssRule::Media(earlier), CssRule::Media(later)) = (earlier, &mut rules[j - 1]) {
                        let mut children = earlier.rules.0;
                        children.append(&mut later.rules.0);
                        later.rules.0 = children;
                    }
                    continue 'scan;
                }
                if can_move(&rules[j], between) {
                    let later = rules.remove(j);
                    if let (CssRule::Media(later), CssRule::Media(earlier)) = (later, &mut rules[i]) {
                        earlier.rules.0.extend(later.rules.0);
                    }
                    continue 'scan;
                }
                break;
            }
        }
        break;
    }
    rules.into_iter().map(|rule| map_children(rule, merge_media)).collect()
}

fn can_move(block: &CssRule<'_>, crossed: &[CssRule<'_>]) -> bool {
    let mut moved = HashSet::new();
    collect_property_families(std::slice::from_ref(block), &mut moved);
    let mut other = HashSet::new();
    collect_property_families(crossed, &mut other);
    moved.is_disjoint(&other)
}

/// Shorthand family of every property set by `rules`: `margin-top` and
/// `margin` both count as `margin`, custom properties stand alone
fn collect_property_families(rules: &[CssRule<'_>], out: &mut HashSet<String>) {
    for rule in rules {
        if let CssRule::Style(style) = rule {
            let block = &style.declarations;
            for property in block.declarations.iter().chain(&block.important_declarations) {
                let id = property.property_id();
                out.insert(property_family(id.name()));
            }
        }
        if let Some(children) = child_rules(rule) {
            collect_property_families(&children.0, out);
        }
    }
}

fn property_family(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    let mut parts = name.split('-');
    if name.starts_with('-') {
        // vendor prefix
        parts.nth(1);
    }
    parts.next().unwrap_or(name).to_string()
}

fn remove_duplicate_rules<'i>(rules: Vec<CssRule<'i>>) -> Vec<CssRule<'i>> {
    let rules = keep_last_where(rules, |rule| matches!(rule, CssRule::Style(_)));
    rules
        .into_iter()
        .map(|rule| map_children(rule, remove_duplicate_rules))
        .collect()
}

fn remove_duplicate_font_faces<'i>(rules: Vec<CssRule<'i>>) -> Vec<CssRule<'i>> {
    let mut seen = HashSet::new();
    rules
        .into_iter()
        .filter(|rule| {
            !matches!(rule, CssRule::FontFace(_)) || rule_key(rule).is_none_or(|key| seen.insert(key))
        })
        .map(|rule| map_children(rule, remove_duplicate_font_faces))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn single_fragment_is_verbatim() {
        let css = "a {  color : red }\n/* keep */";
        assert_eq!(merge(&fragments(&[css])), css);
    }

    #[test]
    fn identical_fragments_collapse() {
        assert_eq!(merge(&fragments(&["a{color:red}", "a{color:red}"])), "a{color:red}");
    }

    #[test]
    fn duplicate_rules_keep_last_position() {
        let out = merge(&fragments(&["a{color:red}b{margin:0}", "a{color:red}"]));
        assert_eq!(out, "b{margin:0}a{color:red}");
    }

    #[test]
    fn media_blocks_with_same_condition_merge() {
        let out = merge(&fragments(&[
            "@media screen{a{color:red}}h1{margin:0}",
            "@media  screen{b{padding:0}}",
        ]));
        assert_eq!(out, "h1{margin:0}@media screen{a{color:red}b{padding:0}}");
    }

    #[test]
    fn media_merge_moves_the_later_block_back_when_forward_conflicts() {
        let out = merge(&fragments(&[
            "@media screen{a{margin:1px}}",
            "a{margin:2px}@media screen{b{padding:0}}",
        ]));
        assert_eq!(out, "@media screen{a{margin:1px}b{padding:0}}a{margin:2px}");
    }

    #[test]
    fn media_blocks_stay_apart_when_both_moves_conflict() {
        let out = merge(&fragments(&[
            "@media screen{a{margin:1px}}",
            "a{margin-top:2px}@media screen{a{margin:3px}}",
        ]));
        assert_eq!(out, "@media screen{a{margin:1px}}a{margin-top:2px}@media screen{a{margin:3px}}");
    }

    #[test]
    fn duplicate_media_blocks_collapse() {
        let out = merge(&fragments(&[
            "@media print{a{color:red}}",
            "@media print{a{color:red}}",
        ]));
        assert_eq!(out, "@media print{a{color:red}}");
    }

    #[test]
    fn font_faces_keep_first_and_empties_vanish() {
        let out = merge(&fragments(&[
            "@font-face{font-family:X;src:url(x.woff)}a{}",
            "b{color:red}@font-face{font-family:X;src:url(x.woff)}@media screen{}",
        ]));
        assert_eq!(out.matches("@font-face").count(), 1, "got {out}");
        assert!(out.starts_with("@font-face"), "got {out}");
        assert!(out.ends_with("b{color:red}"), "got {out}");
        assert!(!out.contains("@media"), "got {out}");
    }

    #[test]
    fn distinct_rules_are_preserved_in_order() {
        let out = merge(&fragments(&["a{margin:0}", "a{margin:1px}"]));
        assert_eq!(out, "a{margin:0}a{margin:1px}");
    }

    #[test]
    fn property_families_group_longhands() {
        assert_eq!(property_family("margin-top"), "margin");
        assert_eq!(property_family("-webkit-transform"), "transform");
        assert_eq!(property_family("--brand-color"), "--brand-color");
    }
}
