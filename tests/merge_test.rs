//! Merging per-dimension fragments and filtering the result

use kodegen_tools_critical::css::{minify, parse_stylesheet};
use kodegen_tools_critical::{IgnoreOptions, IgnoreRule, filter_css, merge};

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn test_single_fragment_is_returned_unchanged() {
    let fragment = "body {\n  color: red; /* keep */\n}\n";
    assert_eq!(merge(&owned(&[fragment])), fragment);
}

#[test]
fn test_overlapping_fragments_have_no_duplicate_bodies() {
    let small = "html{font-size:14px}a{color:red}@media screen{.nav{display:flex}}";
    let large = "a{color:red}\n@media screen{.nav{display:flex}.hero{height:60vh}}\nh1{margin:0}";
    let out = merge(&owned(&[small, large]));

    assert_eq!(out.matches("a{color:red}").count(), 1, "got {out}");
    assert_eq!(out.matches("@media").count(), 1, "got {out}");
    assert_eq!(out.matches(".nav{display:flex}").count(), 1, "got {out}");
    assert!(out.contains(".hero{height:60vh}"));
    assert!(out.contains("html{font-size:14px}"));
    assert!(out.contains("h1{margin:0}"));
}

#[test]
fn test_different_conditions_stay_separate() {
    let out = merge(&owned(&[
        "@media screen{a{color:red}}",
        "@media print{a{color:red}}",
    ]));
    assert_eq!(parse_stylesheet(&out).unwrap().rules.0.len(), 2, "got {out}");
}

#[test]
fn test_merge_output_is_stable_under_minify() {
    let out = merge(&owned(&["a { color : red }", "b{ margin: 0 auto; }"]));
    assert_eq!(minify(&out), out);
}

#[test]
fn test_ignore_removes_matching_selector_only() {
    let css = "h1,.cookie-banner{margin:0}.cookie-banner{position:fixed}p{color:red}";
    let rules = vec![IgnoreRule::exact(".cookie-banner")];
    let out = filter_css(css, &rules, &IgnoreOptions::default());

    assert!(!out.contains(".cookie-banner"), "got {out}");
    assert_eq!(out, "h1{margin:0}p{color:red}");
}

#[test]
fn test_ignore_declarations_and_at_rules() {
    let css = "@font-face{font-family:X;src:url(x.woff)}a{color:red;cursor:pointer}";
    let rules = vec![
        IgnoreRule::exact("@font-face"),
        IgnoreRule::parse("/^cursor$/").unwrap(),
    ];
    assert_eq!(filter_css(css, &rules, &IgnoreOptions::default()), "a{color:red}");
}

#[test]
fn test_non_matching_rules_leave_css_intact() {
    let css = "a{color:red}b{margin:0}";
    let rules = vec![IgnoreRule::exact(".missing")];
    assert_eq!(filter_css(css, &rules, &IgnoreOptions::default()), css);
}

#[test]
fn test_media_merge_keeps_later_overrides_last() {
    let out = merge(&owned(&[
        "@media screen{a{color:red}}",
        "a{color:#00f}@media screen{b{font-weight:700}}",
    ]));
    let media_rule = out.find("a{color:red}").unwrap();
    let plain_rule = out.find("a{color:#00f}").unwrap();
    assert!(media_rule < plain_rule, "got {out}");
    assert_eq!(out.matches("@media").count(), 1, "got {out}");
}
