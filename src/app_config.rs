//! Application configuration loading and merge with CLI flags.
//!
//! Precedence: explicit CLI flag > config file value > built-in default.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use stream_saver::download::{
    CONNECT_TIMEOUT_SECS, DEFAULT_HOP_BUDGET, DEFAULT_MAX_ATTEMPTS, READ_TIMEOUT_SECS, SizeCheck,
};

use crate::cli::Args;

/// TOML-style file configuration for download defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Default number of redirects to follow.
    pub max_redirects: Option<u32>,
    /// Default attempts per hop on read timeout.
    pub max_attempts: Option<u32>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Per-read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Size mismatch policy.
    pub size_check: Option<SizeCheck>,
}

impl FileConfig {
    /// Validates config values against the CLI ranges.
    pub fn validate(&self) -> Result<()> {
        if let Some(max_redirects) = self.max_redirects
            && max_redirects > 20
        {
            bail!(
                "Invalid config value for `max_redirects`: {max_redirects}. Expected range: 0..=20"
            );
        }
        if let Some(max_attempts) = self.max_attempts
            && !(1..=10).contains(&max_attempts)
        {
            bail!(
                "Invalid config value for `max_attempts`: {max_attempts}. Expected range: 1..=10"
            );
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Effective settings after merging CLI flags, file config and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub max_redirects: u32,
    pub max_attempts: u32,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub size_check: SizeCheck,
}

/// Merges CLI flags over the file config over built-in defaults.
#[must_use]
pub fn resolve_settings(args: &Args, file: Option<&FileConfig>) -> Settings {
    let file = file.cloned().unwrap_or_default();
    let size_check = if args.warn_on_size_mismatch {
        SizeCheck::WarnOnly
    } else {
        file.size_check.unwrap_or_default()
    };
    Settings {
        max_redirects: args
            .max_redirects
            .or(file.max_redirects)
            .unwrap_or(DEFAULT_HOP_BUDGET),
        max_attempts: args
            .max_attempts
            .or(file.max_attempts)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS),
        connect_timeout_secs: args
            .connect_timeout
            .or(file.connect_timeout_secs)
            .unwrap_or(CONNECT_TIMEOUT_SECS),
        read_timeout_secs: args
            .read_timeout
            .or(file.read_timeout_secs)
            .unwrap_or(READ_TIMEOUT_SECS),
        size_check,
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/stream-saver/config.toml`
/// 2. `$HOME/.config/stream-saver/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("stream-saver")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("stream-saver")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "max_redirects" => {
                let parsed = parse_integer_u32(value)
                    .with_context(|| format!("Invalid `max_redirects` value on line {line_no}"))?;
                cfg.max_redirects = Some(parsed);
            }
            "max_attempts" => {
                let parsed = parse_integer_u32(value)
                    .with_context(|| format!("Invalid `max_attempts` value on line {line_no}"))?;
                cfg.max_attempts = Some(parsed);
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_no}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "read_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `read_timeout_secs` value on line {line_no}")
                })?;
                cfg.read_timeout_secs = Some(parsed);
            }
            "size_check" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `size_check` value on line {line_no}"))?;
                cfg.size_check = Some(parse_size_check(&parsed).with_context(|| {
                    format!("Invalid `size_check` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_integer_u32(raw_value: &str) -> Result<u32> {
    let value = parse_integer_u64(raw_value)?;
    u32::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u32"))
}

fn parse_size_check(value: &str) -> Result<SizeCheck> {
    match value {
        "enforce" => Ok(SizeCheck::Enforce),
        "warn" => Ok(SizeCheck::WarnOnly),
        _ => bail!("Expected one of: enforce, warn"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["stream-saver"];
        argv.extend_from_slice(extra);
        argv.push("https://example.com/file.bin");
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
max_redirects = 5
max_attempts = 2
connect_timeout_secs = 10
read_timeout_secs = 60
size_check = "warn"
"#,
        )
        .expect("full config should parse");
        assert_eq!(
            cfg,
            FileConfig {
                max_redirects: Some(5),
                max_attempts: Some(2),
                connect_timeout_secs: Some(10),
                read_timeout_secs: Some(60),
                size_check: Some(SizeCheck::WarnOnly),
            }
        );
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(
            r#"
# budgets
max_redirects = 0 # never follow
size_check = "enforce" # strict
"#,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.max_redirects, Some(0));
        assert_eq!(cfg.size_check, Some(SizeCheck::Enforce));
    }

    #[test]
    fn test_parse_config_rejects_out_of_range_attempts() {
        let err = parse_config_str("max_attempts = 0").expect_err("invalid max_attempts expected");
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn test_parse_config_rejects_trailing_tokens() {
        let err = parse_config_str("max_redirects = 4 trailing")
            .expect_err("expected trailing token error");
        assert!(err.to_string().contains("max_redirects"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_size_check() {
        let err = parse_config_str(r#"size_check = "sometimes""#)
            .expect_err("invalid size_check expected");
        assert!(err.to_string().contains("size_check"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("concurrency = 4").expect_err("unknown key expected");
        assert!(err.to_string().contains("Unknown configuration key"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("max_redirects").expect_err("syntax error expected");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_resolve_settings_defaults() {
        let settings = resolve_settings(&args(&[]), None);
        assert_eq!(
            settings,
            Settings {
                max_redirects: 3,
                max_attempts: 5,
                connect_timeout_secs: 30,
                read_timeout_secs: 300,
                size_check: SizeCheck::Enforce,
            }
        );
    }

    #[test]
    fn test_resolve_settings_file_overrides_defaults() {
        let file = FileConfig {
            max_redirects: Some(7),
            size_check: Some(SizeCheck::WarnOnly),
            ..FileConfig::default()
        };
        let settings = resolve_settings(&args(&[]), Some(&file));
        assert_eq!(settings.max_redirects, 7);
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.size_check, SizeCheck::WarnOnly);
    }

    #[test]
    fn test_resolve_settings_cli_overrides_file() {
        let file = FileConfig {
            max_redirects: Some(7),
            read_timeout_secs: Some(10),
            ..FileConfig::default()
        };
        let settings = resolve_settings(
            &args(&["--max-redirects", "1", "--read-timeout", "2"]),
            Some(&file),
        );
        assert_eq!(settings.max_redirects, 1);
        assert_eq!(settings.read_timeout_secs, 2);
    }

    #[test]
    fn test_resolve_default_config_path_prefers_xdg() {
        let temp = tempfile::TempDir::new().unwrap();
        let prev = env::var_os("XDG_CONFIG_HOME");
        // SAFETY: test isolates env change and restores on drop.
        unsafe {
            env::set_var("XDG_CONFIG_HOME", temp.path());
        }
        let _restore = RestoreEnv::new("XDG_CONFIG_HOME", prev);

        assert_eq!(
            resolve_default_config_path(),
            Some(temp.path().join("stream-saver").join("config.toml"))
        );
        let loaded = load_default_file_config().unwrap();
        assert!(loaded.config.is_none(), "no file means no config");
    }

    /// Restores an env var to its previous value (or removes it) when dropped.
    struct RestoreEnv {
        key: &'static str,
        value: Option<std::ffi::OsString>,
    }

    impl RestoreEnv {
        fn new(key: &'static str, value: Option<std::ffi::OsString>) -> Self {
            Self { key, value }
        }
    }

    impl Drop for RestoreEnv {
        fn drop(&mut self) {
            // SAFETY: test restores env to prior state.
            match &self.value {
                Some(v) => unsafe { env::set_var(self.key, v) },
                None => unsafe { env::remove_var(self.key) },
            }
        }
    }
}
