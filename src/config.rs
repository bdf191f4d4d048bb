use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Viewer configuration, read once at startup and handed to the handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Lines of context shown around each change
    #[serde(default = "default_context_lines")]
    pub num_context_lines: usize,
    #[serde(default = "default_tab_width")]
    pub tab_width: u8,
    /// Glob patterns matched against file and directory names to skip
    #[serde(default)]
    pub ignore_name: Vec<String>,
    #[serde(default)]
    pub colors: ColorConfig,
}

/// [colors] section configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub foreground: Rgb,
    pub background: Rgb,
    pub title_fg: Rgb,
    pub title_bg: Rgb,
    pub margin_fg: Rgb,
    pub margin_bg: Rgb,
    pub removed_bg: Rgb,
    pub removed_margin_bg: Rgb,
    pub added_bg: Rgb,
    pub added_margin_bg: Rgb,
    pub filler_bg: Rgb,
    pub hunk_bg: Rgb,
    pub hunk_margin_bg: Rgb,
    pub select_bg: Rgb,
    /// `"none"` leaves the terminal's selection foreground untouched
    pub select_fg: OptionalRgb,
}

fn default_context_lines() -> usize {
    3
}

fn default_tab_width() -> u8 {
    4
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            num_context_lines: default_context_lines(),
            tab_width: default_tab_width(),
            ignore_name: Vec::new(),
            colors: ColorConfig::default(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            foreground: Rgb::BLACK,
            background: Rgb::WHITE,
            title_fg: Rgb::BLACK,
            title_bg: Rgb::WHITE,
            margin_fg: Rgb::new(0xaa, 0xaa, 0xaa),
            margin_bg: Rgb::new(0xfa, 0xfb, 0xfc),
            removed_bg: Rgb::new(0xff, 0xee, 0xf0),
            removed_margin_bg: Rgb::new(0xff, 0xdc, 0xe0),
            added_bg: Rgb::new(0xe6, 0xff, 0xed),
            added_margin_bg: Rgb::new(0xcd, 0xff, 0xd8),
            filler_bg: Rgb::new(0xfa, 0xfb, 0xfc),
            hunk_bg: Rgb::new(0xf1, 0xf8, 0xff),
            hunk_margin_bg: Rgb::new(0xdb, 0xed, 0xff),
            select_bg: Rgb::new(0xb4, 0xd5, 0xfe),
            select_fg: OptionalRgb(Some(Rgb::BLACK)),
        }
    }
}

// ── Colors ──

/// A 24-bit color, written as `#rrggbb` (or `black` / `white`) in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// `#rrggbb` form, as used by OSC color escapes
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Rgb> for crossterm::style::Color {
    fn from(c: Rgb) -> Self {
        crossterm::style::Color::Rgb { r: c.r, g: c.g, b: c.b }
    }
}

impl TryFrom<String> for Rgb {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        parse_color(&s)
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_hex()
    }
}

/// A color that may be explicitly unset with `"none"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OptionalRgb(pub Option<Rgb>);

impl TryFrom<String> for OptionalRgb {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("none") {
            Ok(OptionalRgb(None))
        } else {
            parse_color(&s).map(|c| OptionalRgb(Some(c)))
        }
    }
}

impl From<OptionalRgb> for String {
    fn from(c: OptionalRgb) -> Self {
        c.0.map(Rgb::to_hex).unwrap_or_else(|| "none".to_string())
    }
}

fn parse_color(s: &str) -> Result<Rgb> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
        "black" => return Ok(Rgb::BLACK),
        "white" => return Ok(Rgb::WHITE),
        _ => {}
    }
    let hex = s
        .strip_prefix('#')
        .ok_or_else(|| anyhow::anyhow!("Invalid color '{}': expected #rrggbb", s))?;
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| anyhow::anyhow!("Invalid color '{}': expected #rrggbb", s))
    };
    match hex.len() {
        6 => Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => {
            // #rgb shorthand
            let (r, g, b) = (channel(0..1)?, channel(1..2)?, channel(2..3)?);
            Ok(Rgb::new(r * 17, g * 17, b * 17))
        }
        _ => anyhow::bail!("Invalid color '{}': expected #rrggbb", s),
    }
}

// ── Loading ──

/// Load config by merging, lowest priority first: built-in defaults, the global
/// `~/.config/sidediff/diff.toml`, an explicit `--config` file, then
/// `key=value` overrides from the command line.
/// Merging is deep: individual fields within `[colors]` override independently.
pub fn load_config(extra: Option<&Path>, overrides: &[String]) -> Result<DiffConfig> {
    let global_table = dirs::config_dir()
        .map(|d| d.join("sidediff/diff.toml"))
        .and_then(|p| std::fs::read_to_string(p).ok())
        .and_then(|c| c.parse::<toml::Table>().ok());

    let mut merged = global_table.unwrap_or_default();

    if let Some(path) = extra {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let table = content
            .parse::<toml::Table>()
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        deep_merge(&mut merged, table);
    }

    for item in overrides {
        deep_merge(&mut merged, parse_override(item)?);
    }

    toml::Value::Table(merged)
        .try_into()
        .context("Invalid configuration")
}

/// Parse one `key=value` override. Values that are not valid TOML are taken as strings,
/// so `colors.foreground=#202020` works unquoted.
fn parse_override(item: &str) -> Result<toml::Table> {
    let (key, value) = item
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid override '{}': expected KEY=VALUE", item))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() {
        anyhow::bail!("Invalid override '{}': empty key", item);
    }
    format!("{key} = {value}")
        .parse::<toml::Table>()
        .or_else(|_| format!("{key} = {}", toml::Value::String(value.to_string())).parse())
        .with_context(|| format!("Invalid override '{}'", item))
}

/// Recursively merge `overlay` into `base`. Overlay values win; nested tables are merged recursively.
fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_color_accepts_hex_and_names() {
        assert_eq!(parse_color("#ff8000").unwrap(), Rgb::new(0xff, 0x80, 0x00));
        assert_eq!(parse_color("#fff").unwrap(), Rgb::WHITE);
        assert_eq!(parse_color("Black").unwrap(), Rgb::BLACK);
    }

    #[test]
    fn parse_color_rejects_garbage() {
        assert!(parse_color("ff8000").is_err());
        assert!(parse_color("#ff80").is_err());
        assert!(parse_color("#gg0000").is_err());
    }

    #[test]
    fn rgb_to_hex_is_lowercase_six_digits() {
        assert_eq!(Rgb::new(0xb4, 0xd5, 0xfe).to_hex(), "#b4d5fe");
    }

    #[test]
    fn empty_table_yields_defaults() {
        let config: DiffConfig = toml::Value::Table(toml::Table::new()).try_into().unwrap();
        assert_eq!(config.num_context_lines, 3);
        assert_eq!(config.tab_width, 4);
        assert_eq!(config.colors.select_fg, OptionalRgb(Some(Rgb::BLACK)));
    }

    #[test]
    fn select_fg_none_unsets_color() {
        let table: toml::Table = "[colors]\nselect_fg = \"none\"".parse().unwrap();
        let config: DiffConfig = toml::Value::Table(table).try_into().unwrap();
        assert_eq!(config.colors.select_fg, OptionalRgb(None));
        // untouched fields keep their defaults
        assert_eq!(config.colors.select_bg, Rgb::new(0xb4, 0xd5, 0xfe));
    }

    #[test]
    fn deep_merge_overrides_nested_fields_independently() {
        let mut base: toml::Table = "[colors]\nforeground = \"#111111\"\nbackground = \"#222222\""
            .parse()
            .unwrap();
        let overlay: toml::Table = "[colors]\nbackground = \"#333333\"".parse().unwrap();
        deep_merge(&mut base, overlay);
        let colors = base["colors"].as_table().unwrap();
        assert_eq!(colors["foreground"].as_str(), Some("#111111"));
        assert_eq!(colors["background"].as_str(), Some("#333333"));
    }

    #[test]
    fn parse_override_handles_numbers_and_bare_strings() {
        let t = parse_override("num_context_lines=7").unwrap();
        assert_eq!(t["num_context_lines"].as_integer(), Some(7));

        let t = parse_override("colors.foreground=#202020").unwrap();
        assert_eq!(t["colors"]["foreground"].as_str(), Some("#202020"));

        assert!(parse_override("no_equals_sign").is_err());
    }

    #[test]
    fn load_config_merges_file_then_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "num_context_lines = 5\nignore_name = [\"*.pyc\"]").unwrap();

        let config = load_config(Some(file.path()), &["num_context_lines=9".to_string()]).unwrap();
        assert_eq!(config.num_context_lines, 9);
        assert_eq!(config.ignore_name, vec!["*.pyc".to_string()]);
    }

    #[test]
    fn load_config_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(Some(&missing), &[]).is_err());
    }
}
