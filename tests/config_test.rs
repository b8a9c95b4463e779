//! Tests for the configuration builder and JSON options

use std::path::Path;
use std::time::Duration;

use kodegen_tools_critical::{CriticalConfig, CriticalError, Dimension, Source};

#[test]
fn test_builder_defaults() {
    let config = CriticalConfig::builder().src("index.html").build().unwrap();

    assert_eq!(config.source(), Some(Source::Location("index.html")));
    assert_eq!(config.dimensions(), vec![Dimension::new(1300, 900)]);
    assert!(config.css().is_empty());
    assert!(!config.inline_images());
    assert_eq!(config.max_image_file_size(), 10240);
    assert!(config.asset_paths().is_empty());
    assert!(config.ignore().is_empty());
    assert!(config.authorization().is_none());
    assert!(config.user_agent().is_none());
    assert!(!config.fetch_user_agent().is_empty());
    assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
    assert_eq!(config.extraction_timeout(), Duration::from_secs(60));
    assert_eq!(config.penthouse(), &Default::default());
}

#[test]
fn test_literal_html_takes_precedence() {
    let config: CriticalConfig =
        CriticalConfig::from_json_str(r#"{"src":"index.html","html":"<p></p>"}"#).unwrap();
    assert_eq!(config.source(), Some(Source::Html("<p></p>")));
}

#[test]
fn test_blank_html_is_invalid_input() {
    let err = CriticalConfig::from_json_str(r#"{"html":""}"#).unwrap_err();
    assert!(matches!(err, CriticalError::InvalidInput(_)), "got {err:?}");

    let err = CriticalConfig::builder().html("  \n").build().unwrap_err();
    assert!(matches!(err, CriticalError::InvalidInput(_)), "got {err:?}");

    let config = CriticalConfig::from_json_str(r#"{"src":"index.html","html":""}"#).unwrap();
    assert_eq!(config.source(), Some(Source::Location("index.html")));
}

#[test]
fn test_width_height_shorthand_yields_one_dimension() {
    let config = CriticalConfig::builder()
        .html("<p></p>")
        .width(320)
        .height(480)
        .build()
        .unwrap();
    assert_eq!(config.dimensions(), vec![Dimension::new(320, 480)]);

    let config = CriticalConfig::builder()
        .html("<p></p>")
        .width(320)
        .dimensions([Dimension::new(1024, 768), Dimension::new(320, 480)])
        .build()
        .unwrap();
    assert_eq!(
        config.dimensions(),
        vec![Dimension::new(1024, 768), Dimension::new(320, 480)]
    );
}

#[test]
fn test_zero_dimension_is_rejected() {
    let err = CriticalConfig::builder()
        .html("<p></p>")
        .dimensions([Dimension::new(0, 900)])
        .build()
        .unwrap_err();
    assert!(matches!(err, CriticalError::Config(_)));
}

#[test]
fn test_credentials_build_basic_authorization() {
    let config = CriticalConfig::builder()
        .src("https://example.com")
        .credentials("user", "pass")
        .build()
        .unwrap();
    assert_eq!(config.authorization().as_deref(), Some("Basic dXNlcjpwYXNz"));
}

#[test]
fn test_json_options_use_camel_case() {
    let json = r#"{
        "src": "https://example.com/",
        "base": "dist",
        "dimensions": [{"width": 375, "height": 667}, {"width": 1440, "height": 900}],
        "css": "dist/site.css",
        "inlineImages": true,
        "maxImageFileSize": 2048,
        "assetPaths": ["dist/img", "https://cdn.example.com/"],
        "ignore": [".ad", "/^\\.promo/i", "@font-face"],
        "ignoreOptions": {"matchDeclarationValues": true},
        "user": "user",
        "pass": "pass",
        "userAgent": "critical-test",
        "penthouse": {"timeoutMs": 5000, "forceInclude": [".hero"], "blockJSRequests": false},
        "fetchTimeoutSecs": 5,
        "extractionTimeoutSecs": 10
    }"#;
    let config = CriticalConfig::from_json_str(json).unwrap();

    assert_eq!(config.base(), Some(Path::new("dist")));
    assert_eq!(config.dimensions().len(), 2);
    assert_eq!(config.css(), ["dist/site.css".to_string()]);
    assert!(config.inline_images());
    assert_eq!(config.max_image_file_size(), 2048);
    assert_eq!(config.asset_paths().len(), 2);
    assert_eq!(config.ignore().len(), 3);
    assert!(config.ignore()[1].matches(".PROMO-bar"));
    assert!(!config.ignore()[1].matches(".ad"));
    assert!(config.ignore_options().match_declaration_values);
    assert!(config.ignore_options().match_selectors);
    assert_eq!(config.user_agent(), Some("critical-test"));
    assert_eq!(config.fetch_user_agent(), "critical-test");
    assert_eq!(config.penthouse().timeout_ms, Some(5000));
    assert_eq!(config.penthouse().force_include, vec![".hero".to_string()]);
    assert_eq!(
        config.penthouse().extra.get("blockJSRequests"),
        Some(&serde_json::Value::Bool(false))
    );
    assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
    assert_eq!(config.extraction_timeout(), Duration::from_secs(10));
}

#[test]
fn test_invalid_ignore_pattern_is_a_config_error() {
    let err = CriticalConfig::from_json_str(r#"{"html":"<p></p>","ignore":["/([/"]}"#).unwrap_err();
    assert!(matches!(err, CriticalError::Config(_)), "got {err:?}");
}

#[test]
fn test_dimension_parses_from_text() {
    assert_eq!("1300x900".parse::<Dimension>().unwrap(), Dimension::new(1300, 900));
    assert_eq!(" 320 X 480 ".parse::<Dimension>().unwrap(), Dimension::new(320, 480));
    assert!("1300".parse::<Dimension>().is_err());
    assert!("widexhigh".parse::<Dimension>().is_err());
    assert_eq!(Dimension::new(320, 480).to_string(), "320x480");
}
