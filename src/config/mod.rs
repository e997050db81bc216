/// Configuration system for gridcast.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — [`schema::GridcastConfig::default()`]
/// 2. **User global config** — `~/.gridcast/config.toml`
/// 3. **Project local config** — `.gridcast.toml` in the current directory
/// 4. **Environment variables** — `GRIDCAST_*` overrides (highest precedence)
///
/// Layers are merged key by key: a file that sets only `[predictor] url`
/// leaves every other value from the layer below intact. Malformed files are
/// ignored so a bad config never blocks startup.
///
/// # Usage
///
/// ```rust,ignore
/// let cfg = gridcast::config::load();
/// let predictor = Predictor::from_config(&cfg.predictor);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::GridcastConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration: defaults → global TOML → project
/// TOML → environment variables.
pub fn load() -> GridcastConfig {
    let mut config = load_from(global_config_path(), project_config_path());
    apply_env_overrides(&mut config);
    config
}

/// Merge the given config files over the defaults, without env overrides.
pub fn load_from(global: Option<PathBuf>, project: Option<PathBuf>) -> GridcastConfig {
    let Ok(mut merged) = toml::Value::try_from(GridcastConfig::default()) else {
        return GridcastConfig::default();
    };

    for layer in [global, project].into_iter().flatten().filter_map(load_toml_value) {
        merge_values(&mut merged, layer);
    }

    merged.try_into().unwrap_or_default()
}

/// Read a TOML file as a raw value tree. `None` if missing or malformed.
fn load_toml_value(path: PathBuf) -> Option<toml::Value> {
    let content = fs::read_to_string(&path).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    // Reject files whose values don't fit the schema at all.
    value.clone().try_into::<GridcastConfig>().ok()?;
    Some(value)
}

/// Recursively overlay `overlay` onto `base`, table by table.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.gridcast/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".gridcast").join("config.toml"))
}

/// Path to the project local config: `.gridcast.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".gridcast.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `GRIDCAST_PREDICTOR_URL` — prediction endpoint
/// - `GRIDCAST_STORAGE_DIR` — record directory
/// - `GRIDCAST_LOGIN_DELAY_MS` — simulated login latency
/// - `GRIDCAST_EXPORT_DIR` — report output directory
/// - `GRIDCAST_LOGGING` — event log on/off (`1`/`true`/`yes`/`on`)
/// - `GRIDCAST_LOG_LEVEL` — `debug`, `info`, `warn`, `error`
/// - `GRIDCAST_WEB_ADDR` — dashboard listen address
pub fn apply_env_overrides(config: &mut GridcastConfig) {
    if let Ok(val) = std::env::var("GRIDCAST_PREDICTOR_URL")
        && !val.is_empty()
    {
        config.predictor.url = val;
    }
    if let Ok(val) = std::env::var("GRIDCAST_STORAGE_DIR")
        && !val.is_empty()
    {
        config.storage.dir = val;
    }
    if let Ok(val) = std::env::var("GRIDCAST_LOGIN_DELAY_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.session.login_delay_ms = ms;
    }
    if let Ok(val) = std::env::var("GRIDCAST_EXPORT_DIR")
        && !val.is_empty()
    {
        config.export.dir = val;
    }
    if let Ok(val) = std::env::var("GRIDCAST_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("GRIDCAST_LOG_LEVEL")
        && crate::events::Level::parse(&val).is_some()
    {
        config.logging.level = val.to_ascii_lowercase();
    }
    if let Ok(val) = std::env::var("GRIDCAST_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.gridcast/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    write_default_config(&path, force)?;
    Ok(path)
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }

    fs::write(path, GridcastConfig::default_toml()).context("failed to write config file")?;
    Ok(())
}

/// Set a single config key in the global config file.
///
/// Supports dotted keys like `predictor.url`. The existing value's type
/// decides how `value` is parsed.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;
    set_config_value_in(&path, key, value)
}

fn set_config_value_in(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut root: toml::Value = if path.exists() {
        let content = fs::read_to_string(path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config as TOML value")?
    } else {
        toml::Value::try_from(GridcastConfig::default())
            .context("failed to serialize default config")?
    };

    // Sections missing from a hand-written file fall back to the defaults so
    // `set` works for any schema key.
    let mut with_defaults = toml::Value::try_from(GridcastConfig::default())
        .context("failed to serialize default config")?;
    merge_values(&mut with_defaults, root.clone());
    set_toml_value(&mut with_defaults, key, value)?;

    // Only write back what the user had plus the changed key.
    let (section, leaf) = key.split_once('.').unwrap_or(("", key));
    let new_leaf = with_defaults
        .get(section)
        .and_then(|s| s.get(leaf))
        .cloned()
        .with_context(|| format!("config key not found: '{key}'"))?;
    let root_table = root.as_table_mut().context("config root is not a table")?;
    let section_table = root_table
        .entry(section.to_string())
        .or_insert(toml::Value::Table(toml::map::Map::new()))
        .as_table_mut()
        .with_context(|| format!("expected table at '{section}'"))?;
    section_table.insert(leaf.to_string(), new_leaf);

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, output).context("failed to write config file")?;
    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("config key must look like 'section.key', got '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];
    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("unsupported value type for '{key}'"),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
