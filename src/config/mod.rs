use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::DEFAULT_ARCH;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    pub manifest: ManifestConfig,
    pub output: OutputConfig,
    pub exit: ExitConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestConfig {
    pub default_arch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputConfig {
    pub pretty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExitConfig {
    pub detailed_codes: bool,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            manifest: ManifestConfig {
                default_arch: DEFAULT_ARCH.to_string(),
            },
            output: OutputConfig { pretty: false },
            exit: ExitConfig {
                detailed_codes: false,
            },
            config_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    manifest: Option<RawManifestConfig>,
    output: Option<RawOutputConfig>,
    exit: Option<RawExitConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifestConfig {
    default_arch: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutputConfig {
    pretty: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExitConfig {
    detailed_codes: Option<bool>,
}

pub const ENV_CONFIG: &str = "COPA_WIZ_CONFIG";
pub const ENV_DEFAULT_ARCH: &str = "COPA_WIZ_DEFAULT_ARCH";
pub const ENV_OUTPUT_PRETTY: &str = "COPA_WIZ_OUTPUT_PRETTY";
pub const ENV_EXIT_DETAILED_CODES: &str = "COPA_WIZ_EXIT_DETAILED_CODES";

pub fn default_config_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/copa-wiz/config.toml")
}

/// Loads the config file (if any) and applies environment overrides.
///
/// An explicit `config_path` must exist; the default location is optional.
pub fn load(config_path: Option<&Path>, home_dir: Option<&Path>) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let path = match (config_path, home_dir) {
        (Some(path), _) => Some(path.to_owned()),
        (None, Some(home)) => {
            let path = default_config_path(home);
            path.exists().then_some(path)
        }
        (None, None) => None,
    };

    if let Some(path) = path {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&s)
            .with_context(|| format!("failed to parse config file (TOML): {}", path.display()))?;
        apply_raw_config(&mut cfg, raw);
        cfg.config_path = Some(path.display().to_string());
    }

    apply_env_overrides(&mut cfg)?;

    if cfg.manifest.default_arch.trim().is_empty() {
        anyhow::bail!("manifest.default_arch must not be empty");
    }

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(manifest) = raw.manifest {
        if let Some(default_arch) = manifest.default_arch {
            cfg.manifest.default_arch = default_arch.trim().to_string();
        }
    }

    if let Some(output) = raw.output {
        if let Some(pretty) = output.pretty {
            cfg.output.pretty = pretty;
        }
    }

    if let Some(exit) = raw.exit {
        if let Some(detailed_codes) = exit.detailed_codes {
            cfg.exit.detailed_codes = detailed_codes;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) -> Result<()> {
    if let Ok(v) = std::env::var(ENV_DEFAULT_ARCH) {
        let v = v.trim();
        if !v.is_empty() {
            cfg.manifest.default_arch = v.to_string();
        }
    }
    if let Ok(v) = std::env::var(ENV_OUTPUT_PRETTY) {
        cfg.output.pretty = parse_bool(&v).context(ENV_OUTPUT_PRETTY)?;
    }
    if let Some(detailed) = detailed_codes_from_env()? {
        cfg.exit.detailed_codes = detailed;
    }

    Ok(())
}

/// Reads the exit code style override on its own, for failures that happen
/// before the full config can be loaded.
pub fn detailed_codes_from_env() -> Result<Option<bool>> {
    match std::env::var(ENV_EXIT_DETAILED_CODES) {
        Ok(v) => Ok(Some(parse_bool(&v).context(ENV_EXIT_DETAILED_CODES)?)),
        Err(_) => Ok(None),
    }
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "invalid boolean: {s} (expected true|false|1|0|yes|no|on|off)"
        )),
    }
}
