//! kodegen-critical: extract the critical-path CSS of an HTML page

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Map, Value, json};

use kodegen_tools_critical::{CriticalConfig, Dimension, generate_with_chrome};

#[derive(Parser)]
#[command(name = "kodegen-critical")]
#[command(version)]
#[command(about = "Extract critical-path CSS for one or more viewports", long_about = None)]
struct Cli {
    /// Path or URL of the HTML document
    #[arg(long, conflicts_with = "html_file")]
    src: Option<String>,

    /// Read literal HTML from this file instead of resolving `--src`
    #[arg(long, value_name = "FILE")]
    html_file: Option<PathBuf>,

    /// Base directory for relative stylesheet and asset references
    #[arg(long, value_name = "DIR")]
    base: Option<PathBuf>,

    /// Viewport as WIDTHxHEIGHT; repeat for several viewports
    #[arg(long = "dimension", value_name = "WxH")]
    dimensions: Vec<Dimension>,

    /// Stylesheet to use instead of discovering them; repeatable
    #[arg(long, value_name = "PATH_OR_URL")]
    css: Vec<String>,

    /// Embed small images as data URIs
    #[arg(long)]
    inline_images: bool,

    /// Largest image to embed, in bytes
    #[arg(long, value_name = "BYTES")]
    max_image_file_size: Option<u64>,

    /// Extra directory or URL searched for images; repeatable
    #[arg(long = "asset-path", value_name = "DIR_OR_URL")]
    asset_paths: Vec<String>,

    /// Selector, at-rule or declaration to drop; `/regex/i` for patterns
    #[arg(long, value_name = "RULE")]
    ignore: Vec<String>,

    /// Basic-auth user for protected resources
    #[arg(long, requires = "pass")]
    user: Option<String>,

    /// Basic-auth password
    #[arg(long, requires = "user")]
    pass: Option<String>,

    #[arg(long)]
    user_agent: Option<String>,

    /// JSON options file; command line flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the CSS here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,
}

impl Cli {
    /// Overlay the flags that were given onto the JSON options
    fn into_options(self) -> Result<(Map<String, Value>, Option<PathBuf>)> {
        let mut options = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                match serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
                {
                    Value::Object(map) => map,
                    _ => anyhow::bail!("Config {} must be a JSON object", path.display()),
                }
            }
            None => Map::new(),
        };

        if let Some(src) = self.src {
            options.insert("src".into(), json!(src));
        }
        if let Some(path) = &self.html_file {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            options.insert("html".into(), json!(html));
            if self.base.is_none()
                && !options.contains_key("base")
                && let Some(parent) = path.parent()
            {
                options.insert("base".into(), json!(parent));
            }
        }
        if let Some(base) = self.base {
            options.insert("base".into(), json!(base));
        }
        if !self.dimensions.is_empty() {
            options.insert("dimensions".into(), json!(self.dimensions));
        }
        if !self.css.is_empty() {
            options.insert("css".into(), json!(self.css));
        }
        if self.inline_images {
            options.insert("inlineImages".into(), json!(true));
        }
        if let Some(size) = self.max_image_file_size {
            options.insert("maxImageFileSize".into(), json!(size));
        }
        if !self.asset_paths.is_empty() {
            options.insert("assetPaths".into(), json!(self.asset_paths));
        }
        if !self.ignore.is_empty() {
            options.insert("ignore".into(), json!(self.ignore));
        }
        if let Some(user) = self.user {
            options.insert("user".into(), json!(user));
        }
        if let Some(pass) = self.pass {
            options.insert("pass".into(), json!(pass));
        }
        if let Some(user_agent) = self.user_agent {
            options.insert("userAgent".into(), json!(user_agent));
        }
        Ok((options, self.out))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let (options, out) = Cli::parse().into_options()?;
    let config = CriticalConfig::from_json_str(&Value::Object(options).to_string())?;
    let css = generate_with_chrome(&config).await?;

    match out {
        Some(path) => tokio::fs::write(&path, &css)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{css}"),
    }
    Ok(())
}
