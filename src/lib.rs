//! Closed-caption conversion between SCC (CEA-608), DFXP/TTML, SRT and
//! WebVTT, through one shared caption model.

pub mod error;
pub mod formats;
pub mod model;

pub use error::{CaptionError, Result};
pub use formats::{
    scc::{DebouncePolicy, SccOptions},
    Format, ReadOptions, TranscriptMode, WriteOptions,
};
pub use model::{Alignment, Caption, CaptionNode, CaptionSet, Layout, Point, Style};

use tracing::info;

pub fn read(content: &str, format: Format, opts: &ReadOptions) -> Result<CaptionSet> {
    info!(?format, "reading captions");
    match format {
        Format::Scc => formats::scc::read_scc(content, opts),
        Format::Dfxp => formats::dfxp::read_dfxp(content, opts),
        Format::Srt => formats::srt::read_srt(content, opts),
        Format::Vtt => formats::vtt::read_vtt(content, opts),
        Format::Json => formats::json::read_json(content, opts),
        Format::Txt => Err(CaptionError::InvalidInput(
            "plain transcripts can be written but not read".to_string(),
        )),
    }
}

/// Like [`read`], for raw bytes that must be UTF-8 text.
pub fn read_bytes(bytes: &[u8], format: Format, opts: &ReadOptions) -> Result<CaptionSet> {
    let content = std::str::from_utf8(bytes)
        .map_err(|e| CaptionError::InvalidInput(format!("content is not UTF-8 text: {e}")))?;
    read(content.trim_start_matches('\u{feff}'), format, opts)
}

pub fn write(set: &CaptionSet, format: Format, opts: &WriteOptions) -> Result<String> {
    info!(?format, captions = set.caption_count(), "writing captions");
    let out = match format {
        Format::Scc => formats::scc::write_scc(set, opts.language.as_deref()),
        Format::Dfxp => formats::dfxp::write_dfxp(set, opts),
        Format::Srt => formats::srt::write_srt(set, opts),
        Format::Vtt => formats::vtt::write_vtt(set, opts),
        Format::Txt => formats::txt::write_txt(set, opts),
        Format::Json => formats::json::write_json(set, opts.json_wrapped)?,
    };
    Ok(out)
}
