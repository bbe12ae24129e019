use tracing::debug;

use crate::{
    error::{CaptionError, Result},
    formats::{
        inline::{parse_inline, render_inline, Dialect},
        select_language,
        time::{format_srt_timestamp, parse_time_range_arrow},
        ReadOptions, WriteOptions,
    },
    model::{Caption, CaptionSet},
};

pub fn read_srt(input: &str, opts: &ReadOptions) -> Result<CaptionSet> {
    let mut captions = Vec::new();
    let mut lines = input.trim_start_matches('\u{feff}').lines().peekable();

    while lines.peek().is_some() {
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }
        let Some(first) = lines.next() else {
            break;
        };

        let timing = if first.contains("-->") {
            first
        } else {
            match lines.next() {
                Some(line) => line,
                None => break,
            }
        };
        let (start, end, _) = parse_time_range_arrow(timing.trim())?;

        let mut text_lines = Vec::new();
        while let Some(line) = lines.next_if(|l| !l.trim().is_empty()) {
            text_lines.push(line.trim_end());
        }

        let caption = Caption::new(start, end, parse_inline(&text_lines.join("\n"), Dialect::Srt));
        if caption.has_text() {
            captions.push(caption);
        }
    }

    if captions.is_empty() {
        return Err(CaptionError::NoCaptions("empty SRT document".to_string()));
    }
    debug!(captions = captions.len(), "srt decoded");

    let mut set = CaptionSet::with_language(opts.language(), captions);
    if opts.offset_us != 0 {
        set.adjust_timing(-opts.offset_us, 1.0);
    }
    Ok(set)
}

pub fn write_srt(set: &CaptionSet, opts: &WriteOptions) -> String {
    let mut out = String::new();
    let Some(lang) = select_language(set, opts.language.as_deref()) else {
        return out;
    };

    for (i, caption) in set.captions(lang).iter().enumerate() {
        out.push_str(&(i + 1).to_string());
        out.push('\n');

        out.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(caption.start),
            format_srt_timestamp(caption.end)
        ));

        out.push_str(&render_inline(&caption.nodes, Dialect::Srt, opts.wrap_width));
        out.push_str("\n\n");
    }

    out
}
