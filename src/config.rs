use anyhow::{Context, Result};
use caption_convtr::{DebouncePolicy, ReadOptions, SccOptions, TranscriptMode, WriteOptions};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: Logging,
    pub policy: Policy,
    pub formats: Formats,
}

impl Config {
    pub fn load(path_opt: Option<&Path>) -> Result<Self> {
        let default_path = Path::new("config.toml");
        let path = if let Some(p) = path_opt {
            Some(p)
        } else if default_path.exists() {
            Some(default_path)
        } else {
            None
        };

        let mut cfg = Config::default();

        if let Some(path) = path {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed reading config file: {}", path.display()))?;
            let parsed: Config = toml::from_str(&raw)
                .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
            cfg = parsed;
        }

        Ok(cfg)
    }

    pub fn to_toml_pretty(&self) -> Result<String> {
        let s = toml::to_string_pretty(self).context("failed serializing config as TOML")?;
        Ok(s)
    }

    pub fn read_options(&self) -> ReadOptions {
        let scc = &self.formats.scc;
        ReadOptions {
            language: self.policy.language.clone(),
            offset_us: self.policy.time_offset_ms * 1000,
            scc: SccOptions {
                simulate_roll_up: scc.simulate_roll_up,
                strict_positioning: scc.strict_positioning,
                debounce: if scc.debounce_special_chars {
                    DebouncePolicy::CommandsAndCharacters
                } else {
                    DebouncePolicy::CommandsOnly
                },
            },
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            language: self.policy.language.clone(),
            wrap_width: (self.formats.srt.wrap_width > 0).then_some(self.formats.srt.wrap_width),
            vtt_positions: self.formats.vtt.emit_positions,
            dfxp_default_region: self.formats.dfxp.default_region.clone(),
            txt_mode: self.formats.txt.mode,
            json_wrapped: self.formats.json.wrapped,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub format: String,
    pub debug_caption_samples: usize,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            debug_caption_samples: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Language for single-language inputs and outputs.
    pub language: Option<String>,
    pub time_offset_ms: i64,
    pub trim_text: bool,
    pub normalize_whitespace: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            language: None,
            time_offset_ms: 0,
            trim_text: true,
            normalize_whitespace: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Formats {
    pub scc: SccCfg,
    pub srt: SrtCfg,
    pub vtt: VttCfg,
    pub dfxp: DfxpCfg,
    pub txt: TxtCfg,
    pub json: JsonCfg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SccCfg {
    pub simulate_roll_up: bool,
    pub strict_positioning: bool,
    /// Treat a doubled special/extended character as one, like a command.
    pub debounce_special_chars: bool,
}

impl Default for SccCfg {
    fn default() -> Self {
        Self {
            simulate_roll_up: false,
            strict_positioning: false,
            debounce_special_chars: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SrtCfg {
    /// 0 disables wrapping. Also applies to WebVTT.
    pub wrap_width: usize,
}

impl Default for SrtCfg {
    fn default() -> Self {
        Self { wrap_width: 42 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VttCfg {
    pub emit_positions: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DfxpCfg {
    pub default_region: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TxtCfg {
    pub mode: TranscriptMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonCfg {
    pub wrapped: bool,
}

impl Default for JsonCfg {
    fn default() -> Self {
        Self { wrapped: true }
    }
}

pub fn init_tracing(logging: &Logging, cli_override_level: Option<&str>) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = cli_override_level.unwrap_or(logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let is_json = logging.format.to_lowercase() == "json";

    if is_json {
        fmt()
            .with_env_filter(filter)
            .event_format(fmt::format().json())
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .pretty()
            .init();
    }

    tracing::info!(
        level = level,
        format = logging.format.as_str(),
        "logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let cfg = Config::default();
        let text = cfg.to_toml_pretty().unwrap();
        assert!(text.contains("[formats.scc]"));
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.formats.srt.wrap_width, 42);
        assert!(back.formats.scc.debounce_special_chars);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: Config = toml::from_str(
            "[policy]\nlanguage = \"fr\"\ntime_offset_ms = 250\n\n[formats.scc]\nsimulate_roll_up = true\ndebounce_special_chars = false\n",
        )
        .unwrap();
        let read = cfg.read_options();
        assert_eq!(read.language(), "fr");
        assert_eq!(read.offset_us, 250_000);
        assert!(read.scc.simulate_roll_up);
        assert_eq!(read.scc.debounce, DebouncePolicy::CommandsOnly);
        assert_eq!(cfg.write_options().wrap_width, Some(42));
        assert_eq!(cfg.logging.level, "info");
    }
}
