//! Scenarist SCC: CEA-608 line-21 captions as timecoded hex words.

pub mod constants;
pub mod decoder;
pub mod instructions;
pub mod modes;
pub mod normalize;
pub mod position;
pub mod reader;
pub mod stash;
pub mod timing;
pub mod writer;

use tracing::info;

pub use decoder::DebouncePolicy;
pub use writer::write_scc;

use crate::error::Result;
use crate::formats::ReadOptions;
use crate::model::CaptionSet;
use reader::SccReader;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SccOptions {
    /// Emit roll-up captions as the accumulated rows on screen instead of
    /// one caption per row.
    pub simulate_roll_up: bool,
    /// Fail on text that arrives before any PAC instead of placing it on
    /// row 14.
    pub strict_positioning: bool,
    pub debounce: DebouncePolicy,
}

pub fn read_scc(content: &str, opts: &ReadOptions) -> Result<CaptionSet> {
    info!(
        simulate_roll_up = opts.scc.simulate_roll_up,
        strict = opts.scc.strict_positioning,
        "reading scc"
    );
    let captions = SccReader::new(&opts.scc, opts.offset_us).read(content)?;
    Ok(CaptionSet::with_language(opts.language(), captions))
}

pub fn detect(content: &str) -> bool {
    content
        .trim_start_matches('\u{feff}')
        .lines()
        .next()
        .is_some_and(|l| l.trim() == constants::HEADER)
}
