pub mod dfxp;
pub mod inline;
pub mod json;
pub mod scc;
pub mod srt;
pub mod time;
pub mod txt;
pub mod vtt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::model::CaptionSet;
use scc::SccOptions;

/// Language tag given to captions from formats that do not carry one.
pub const DEFAULT_LANGUAGE: &str = "en-US";

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Scc,
    Dfxp,
    Srt,
    Vtt,
    Txt,
    Json,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Scc => "scc",
            Format::Dfxp => "dfxp",
            Format::Srt => "srt",
            Format::Vtt => "vtt",
            Format::Txt => "txt",
            Format::Json => "json",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Format> {
        let f = match ext.to_ascii_lowercase().as_str() {
            "scc" => Format::Scc,
            "dfxp" | "ttml" | "xml" => Format::Dfxp,
            "srt" => Format::Srt,
            "vtt" => Format::Vtt,
            "txt" => Format::Txt,
            "json" => Format::Json,
            _ => return None,
        };
        Some(f)
    }

    pub fn detect(content: &str) -> Option<Format> {
        let trimmed = content.trim_start_matches('\u{feff}').trim_start();
        if scc::detect(trimmed) {
            return Some(Format::Scc);
        }
        if trimmed.starts_with("WEBVTT") {
            return Some(Format::Vtt);
        }
        if trimmed.starts_with('{') {
            return Some(Format::Json);
        }
        if trimmed.starts_with('<') && (trimmed.contains("<tt") || trimmed.contains(":tt")) {
            return Some(Format::Dfxp);
        }
        let mut lines = trimmed.lines().map(str::trim);
        let first = lines.next().unwrap_or("");
        let second = lines.next().unwrap_or("");
        let is_index = !first.is_empty() && first.chars().all(|c| c.is_ascii_digit());
        if (is_index && second.contains("-->")) || first.contains("-->") {
            return Some(Format::Srt);
        }
        None
    }

    pub fn can_read(self) -> bool {
        self != Format::Txt
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub language: Option<String>,
    pub offset_us: i64,
    pub scc: SccOptions,
}

impl ReadOptions {
    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptMode {
    #[default]
    TimestampRange,
    TextOnly,
}

#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub language: Option<String>,
    pub wrap_width: Option<usize>,
    pub vtt_positions: bool,
    pub dfxp_default_region: Option<String>,
    pub txt_mode: TranscriptMode,
    pub json_wrapped: bool,
}

pub fn select_language<'a>(set: &'a CaptionSet, language: Option<&str>) -> Option<&'a str> {
    match language {
        Some(lang) => set
            .languages()
            .find(|l| *l == lang)
            .or_else(|| set.languages().next()),
        None => set.languages().next(),
    }
}
