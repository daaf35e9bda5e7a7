//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. A single optional
//! file at the content root overrides the stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "Blog"            # Shown in the header and the <title> of every page
//! language = "en"           # <html lang="…">
//!
//! [blog]
//! entries_per_page = 10     # Entries per blog list page
//! pagination_window = 9     # Page links shown in the pagination bar (odd)
//!
//! [hashtags]
//! occurrences_per_page = 20 # Tagged items per hashtag page
//! pagination_window = 9
//!
//! [search]
//! fuzzy_threshold = 0.4     # Max edit distance relative to the term length
//!
//! [assets.copy]
//! "vendor/katex.min.css" = "css/katex.min.css"  # source → target below assets/
//!
//! [colors.light]
//! background = "#ffffff"
//! text = "#111111"
//! text_muted = "#666666"    # Nav menu, dates, pagination
//! border = "#e0e0e0"
//! link = "#333333"
//! link_hover = "#000000"
//! mark = "#fff3a3"          # Search term highlight
//!
//! [colors.dark]
//! background = "#0a0a0a"
//! text = "#eeeeee"
//! text_muted = "#999999"
//! border = "#333333"
//! link = "#cccccc"
//! link_hover = "#ffffff"
//! mark = "#5c4d00"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! The config file is sparse: override just the values you want:
//!
//! ```toml
//! [site]
//! title = "Notes"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::search::SearchOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site-wide metadata.
    pub site: SiteMeta,
    /// Blog list pagination.
    pub blog: BlogConfig,
    /// Hashtag page pagination.
    pub hashtags: HashtagsConfig,
    /// Query evaluation tuning.
    pub search: SearchConfig,
    /// Extra files copied into the output `assets/` directory.
    pub assets: AssetsConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.title.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site.title must not be empty".into(),
            ));
        }
        validate_pagination(
            "blog",
            self.blog.entries_per_page,
            self.blog.pagination_window,
        )?;
        validate_pagination(
            "hashtags",
            self.hashtags.occurrences_per_page,
            self.hashtags.pagination_window,
        )?;
        if !(0.0..=1.0).contains(&self.search.fuzzy_threshold) {
            return Err(ConfigError::Validation(
                "search.fuzzy_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        for (source, target) in &self.assets.copy {
            if Path::new(target).is_absolute() || target.split('/').any(|part| part == "..") {
                return Err(ConfigError::Validation(format!(
                    "assets.copy target for {source:?} must stay inside assets/: {target:?}"
                )));
            }
        }
        Ok(())
    }
}

fn validate_pagination(section: &str, per_page: usize, window: usize) -> Result<(), ConfigError> {
    if per_page == 0 {
        return Err(ConfigError::Validation(format!(
            "{section} items per page must be at least 1"
        )));
    }
    if window == 0 || window % 2 == 0 {
        return Err(ConfigError::Validation(format!(
            "{section}.pagination_window must be an odd number"
        )));
    }
    Ok(())
}

/// Site-wide metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMeta {
    /// Site title, shown in the header and every `<title>`.
    pub title: String,
    /// Value of the `lang` attribute of every page.
    pub language: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            language: "en".to_string(),
        }
    }
}

/// Blog list pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlogConfig {
    pub entries_per_page: usize,
    /// Number of page links in the pagination bar. Must be odd.
    pub pagination_window: usize,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            entries_per_page: 10,
            pagination_window: 9,
        }
    }
}

/// Hashtag page pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HashtagsConfig {
    pub occurrences_per_page: usize,
    /// Number of page links in the pagination bar. Must be odd.
    pub pagination_window: usize,
}

impl Default for HashtagsConfig {
    fn default() -> Self {
        Self {
            occurrences_per_page: 20,
            pagination_window: 9,
        }
    }
}

/// Query evaluation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Largest edit distance accepted by fuzzy terms, as a fraction of the
    /// query term's length (0.4 lets a five-letter term differ in two places).
    pub fuzzy_threshold: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: SearchOptions::default().fuzzy_threshold,
        }
    }
}

impl SearchConfig {
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            fuzzy_threshold: self.fuzzy_threshold,
        }
    }
}

/// Extra files copied into the output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Source path (relative to the content root) → target path below
    /// `<output>/assets/`. Sources may be files or directories.
    pub copy: BTreeMap<String, String>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel rendering workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Light mode color scheme.
    pub light: ColorScheme,
    /// Dark mode color scheme.
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    /// Background color.
    pub background: String,
    /// Primary text color.
    pub text: String,
    /// Muted/secondary text color (nav menu, dates, pagination).
    pub text_muted: String,
    /// Border color.
    pub border: String,
    /// Link color.
    pub link: String,
    /// Link hover color.
    pub link_hover: String,
    /// Background of highlighted search terms.
    pub mark: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#111111".to_string(),
            text_muted: "#666666".to_string(),
            border: "#e0e0e0".to_string(),
            link: "#333333".to_string(),
            link_hover: "#000000".to_string(),
            mark: "#fff3a3".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#0a0a0a".to_string(),
            text: "#eeeeee".to_string(),
            text_muted: "#999999".to_string(),
            border: "#333333".to_string(),
            link: "#cccccc".to_string(),
            link_hover: "#ffffff".to_string(),
            mark: "#5c4d00".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Leafpress Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file at the root of your sources (next to pages/ and blog/).
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
# Shown in the header and in the <title> of every page.
title = "Blog"

# Value of the lang attribute of every page.
language = "en"

# ---------------------------------------------------------------------------
# Blog list
# ---------------------------------------------------------------------------
[blog]
# Entries per list page (index.html, blog-2.html, ...).
entries_per_page = 10

# Page links shown in the pagination bar. Must be odd.
pagination_window = 9

# ---------------------------------------------------------------------------
# Hashtag pages
# ---------------------------------------------------------------------------
[hashtags]
# Tagged pages and entries per hashtag page.
occurrences_per_page = 20

# Page links shown in the pagination bar. Must be odd.
pagination_window = 9

# ---------------------------------------------------------------------------
# Search
# ---------------------------------------------------------------------------
[search]
# Largest edit distance accepted for fuzzy terms, relative to the length of
# the searched term. 0.0 only finds terms containing the searched one.
fuzzy_threshold = 0.4

# ---------------------------------------------------------------------------
# Extra assets
# ---------------------------------------------------------------------------
[assets.copy]
# Files or directories (relative to the sources) copied below assets/.
# "vendor/katex/katex.min.css" = "css/katex.min.css"

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#111111"
text_muted = "#666666"    # Nav, dates, pagination
border = "#e0e0e0"
link = "#333333"
link_hover = "#000000"
mark = "#fff3a3"          # Highlighted search terms

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#0a0a0a"
text = "#eeeeee"
text_muted = "#999999"
border = "#333333"
link = "#cccccc"
link_hover = "#ffffff"
mark = "#5c4d00"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel rendering workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --color-bg: {light_bg};
    --color-text: {light_text};
    --color-text-muted: {light_text_muted};
    --color-border: {light_border};
    --color-link: {light_link};
    --color-link-hover: {light_link_hover};
    --color-mark: {light_mark};
}}

@media (prefers-color-scheme: dark) {{
    :root {{
        --color-bg: {dark_bg};
        --color-text: {dark_text};
        --color-text-muted: {dark_text_muted};
        --color-border: {dark_border};
        --color-link: {dark_link};
        --color-link-hover: {dark_link_hover};
        --color-mark: {dark_mark};
    }}
}}"#,
        light_bg = colors.light.background,
        light_text = colors.light.text,
        light_text_muted = colors.light.text_muted,
        light_border = colors.light.border,
        light_link = colors.light.link,
        light_link_hover = colors.light.link_hover,
        light_mark = colors.light.mark,
        dark_bg = colors.dark.background,
        dark_text = colors.dark.text,
        dark_text_muted = colors.dark.text_muted,
        dark_border = colors.dark.border,
        dark_link = colors.dark.link,
        dark_link_hover = colors.dark.link_hover,
        dark_mark = colors.dark.mark,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_colors() {
        let config = SiteConfig::default();
        assert_eq!(config.colors.light.background, "#ffffff");
        assert_eq!(config.colors.dark.background, "#0a0a0a");
    }

    #[test]
    fn default_config_has_pagination_settings() {
        let config = SiteConfig::default();
        assert_eq!(config.blog.entries_per_page, 10);
        assert_eq!(config.blog.pagination_window, 9);
        assert_eq!(config.hashtags.occurrences_per_page, 20);
        assert_eq!(config.hashtags.pagination_window, 9);
        assert_eq!(config.search.fuzzy_threshold, 0.4);
        assert!(config.assets.copy.is_empty());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[colors.light]
background = "#fafafa"
"##;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        // Overridden value
        assert_eq!(config.colors.light.background, "#fafafa");
        // Default values preserved
        assert_eq!(config.colors.light.text, "#111111");
        assert_eq!(config.colors.dark.background, "#0a0a0a");
        assert_eq!(config.site.title, "Blog");
    }

    #[test]
    fn parse_site_and_blog_settings() {
        let toml = r#"
[site]
title = "Notes"

[blog]
entries_per_page = 5
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.site.title, "Notes");
        assert_eq!(config.site.language, "en");
        assert_eq!(config.blog.entries_per_page, 5);
        assert_eq!(config.blog.pagination_window, 9);
    }

    #[test]
    fn parse_assets_copy_table() {
        let toml = r#"
[assets.copy]
"vendor/app.js" = "js/app.js"
"vendor/fonts" = "fonts"
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.assets.copy.len(), 2);
        assert_eq!(config.assets.copy["vendor/fonts"], "fonts");
    }

    #[test]
    fn search_config_converts_to_options() {
        let config = SearchConfig {
            fuzzy_threshold: 0.25,
        };
        assert_eq!(config.options().fuzzy_threshold, 0.25);
    }

    #[test]
    fn generate_css_uses_config_colors() {
        let mut colors = ColorConfig::default();
        colors.light.background = "#f0f0f0".to_string();
        colors.dark.background = "#1a1a1a".to_string();

        let css = generate_color_css(&colors);
        assert!(css.contains("--color-bg: #f0f0f0"));
        assert!(css.contains("--color-bg: #1a1a1a"));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();

        assert_eq!(config.colors.light.background, "#ffffff");
        assert_eq!(config.blog.entries_per_page, 10);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r##"
[colors.light]
background = "#123456"
text = "#abcdef"

[hashtags]
occurrences_per_page = 3
"##,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.colors.light.background, "#123456");
        assert_eq!(config.colors.light.text, "#abcdef");
        assert_eq!(config.hashtags.occurrences_per_page, 3);
        // Unspecified values should be defaults
        assert_eq!(config.colors.dark.background, "#0a0a0a");
        assert_eq!(config.hashtags.pagination_window, 9);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // CSS generation tests
    // =========================================================================

    #[test]
    fn generate_css_includes_all_variables() {
        let css = generate_color_css(&ColorConfig::default());

        assert!(css.contains("--color-bg:"));
        assert!(css.contains("--color-text:"));
        assert!(css.contains("--color-text-muted:"));
        assert!(css.contains("--color-border:"));
        assert!(css.contains("--color-link:"));
        assert!(css.contains("--color-link-hover:"));
        assert!(css.contains("--color-mark:"));
        assert!(css.contains("@media (prefers-color-scheme: dark)"));
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let config = ProcessingConfig {
            max_processes: None,
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_never_zero() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"entries_per_page = 10"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"entries_per_page = 4"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(
            merged.get("entries_per_page").unwrap().as_integer(),
            Some(4)
        );
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str(
            r##"
[colors.light]
background = "#fff"
text = "#000"
"##,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r##"
[colors.light]
background = "#fafafa"
"##,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let light = merged.get("colors").unwrap().get("light").unwrap();
        assert_eq!(light.get("background").unwrap().as_str(), Some("#fafafa"));
        assert_eq!(light.get("text").unwrap().as_str(), Some("#000"));
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[blog]
entries_per_pag = 5
"#;
        let result: Result<SiteConfig, _> = toml::from_str(toml_str);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[serach]\nfuzzy_threshold = 0.2\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[site]\ntitel = \"x\"\n").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_even_window_rejected() {
        let mut config = SiteConfig::default();
        config.blog.pagination_window = 8;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("blog.pagination_window"));
    }

    #[test]
    fn validate_zero_per_page_rejected() {
        let mut config = SiteConfig::default();
        config.hashtags.occurrences_per_page = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_fuzzy_threshold_range() {
        let mut config = SiteConfig::default();
        config.search.fuzzy_threshold = 1.0;
        assert!(config.validate().is_ok());
        config.search.fuzzy_threshold = 1.5;
        assert!(config.validate().is_err());
        config.search.fuzzy_threshold = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_asset_target_must_stay_inside() {
        let mut config = SiteConfig::default();
        config
            .assets
            .copy
            .insert("a.js".to_string(), "../a.js".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[blog]\npagination_window = 4\n",
        )
        .unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // resolve_config / stock config tests
    // =========================================================================

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        assert!(load_raw_config(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn resolve_config_with_overlay() {
        let overlay: toml::Value = toml::from_str("[search]\nfuzzy_threshold = 0.2\n").unwrap();
        let config = resolve_config(stock_defaults_value(), Some(overlay)).unwrap();
        assert_eq!(config.search.fuzzy_threshold, 0.2);
        assert_eq!(config.blog.entries_per_page, 10);
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config.site.title, "Blog");
        assert_eq!(config.blog.entries_per_page, 10);
        assert_eq!(config.hashtags.occurrences_per_page, 20);
        assert_eq!(config.search.fuzzy_threshold, 0.4);
        assert_eq!(config.colors.light.mark, "#fff3a3");
        assert_eq!(config.colors.dark.background, "#0a0a0a");
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in [
            "[site]",
            "[blog]",
            "[hashtags]",
            "[search]",
            "[assets.copy]",
            "[colors.light]",
            "[colors.dark]",
            "[processing]",
        ] {
            assert!(content.contains(section), "missing {section}");
        }
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        assert!(val.is_table());
        for key in ["site", "blog", "hashtags", "search", "colors", "processing"] {
            assert!(val.get(key).is_some(), "missing {key}");
        }
    }
}
