use tracing::debug;

use crate::{
    error::{CaptionError, Result},
    formats::{
        inline::{parse_inline, render_inline, Dialect},
        select_language,
        time::{format_vtt_timestamp, parse_time_range_arrow},
        ReadOptions, WriteOptions,
    },
    model::{Alignment, Caption, CaptionSet, Layout, Point},
};

const HEADER: &str = "WEBVTT";

pub fn read_vtt(input: &str, opts: &ReadOptions) -> Result<CaptionSet> {
    let mut lines = input.trim_start_matches('\u{feff}').lines().peekable();

    let first = lines.next().unwrap_or_default();
    if !first.trim().starts_with(HEADER) {
        return Err(CaptionError::InvalidFormat(
            "WebVTT document must start with 'WEBVTT'".to_string(),
        ));
    }
    while lines.next_if(|l| !l.trim().is_empty()).is_some() {}

    let mut captions = Vec::new();
    loop {
        while lines.next_if(|l| l.trim().is_empty()).is_some() {}
        let Some(first) = lines.next() else {
            break;
        };
        let first = first.trim();

        if first.starts_with("NOTE") || first.starts_with("STYLE") || first.starts_with("REGION") {
            while lines.next_if(|l| !l.trim().is_empty()).is_some() {}
            continue;
        }

        let timing = if first.contains("-->") {
            first
        } else {
            match lines.next() {
                Some(line) => line.trim(),
                None => break,
            }
        };
        let (start, end, settings) = parse_time_range_arrow(timing)?;

        let mut text_lines = Vec::new();
        while let Some(line) = lines.next_if(|l| !l.trim().is_empty()) {
            text_lines.push(line.trim_end());
        }

        let mut caption =
            Caption::new(start, end, parse_inline(&text_lines.join("\n"), Dialect::Vtt));
        caption.layout = parse_cue_settings(settings);
        if caption.has_text() {
            captions.push(caption);
        }
    }

    if captions.is_empty() {
        return Err(CaptionError::NoCaptions("WebVTT document has no cues".to_string()));
    }
    debug!(captions = captions.len(), "vtt decoded");

    let mut set = CaptionSet::with_language(opts.language(), captions);
    if opts.offset_us != 0 {
        set.adjust_timing(-opts.offset_us, 1.0);
    }
    Ok(set)
}

fn parse_percent(v: &str) -> Option<f64> {
    let v = v.split(',').next()?;
    v.strip_suffix('%')?.parse().ok()
}

fn parse_cue_settings(settings: &str) -> Option<Layout> {
    let mut layout = Layout::default();
    let mut x = None;
    let mut y = None;

    for setting in settings.split_whitespace() {
        let Some((key, value)) = setting.split_once(':') else {
            continue;
        };
        match key {
            "position" => x = parse_percent(value),
            "line" => y = parse_percent(value),
            "align" => {
                layout.alignment = match value {
                    "start" | "left" => Some(Alignment::Start),
                    "center" | "middle" => Some(Alignment::Center),
                    "end" | "right" => Some(Alignment::End),
                    _ => None,
                }
            }
            _ => {}
        }
    }

    if x.is_some() || y.is_some() {
        layout.origin = Some(Point {
            x: x.unwrap_or(0.0),
            y: y.unwrap_or(0.0),
        });
    }
    (layout != Layout::default()).then_some(layout)
}

fn format_cue_settings(layout: &Layout) -> String {
    let mut parts = Vec::new();
    if let Some(origin) = layout.origin {
        parts.push(format!("position:{}%", trim_float(origin.x)));
        parts.push(format!("line:{}%", trim_float(origin.y)));
    }
    if let Some(alignment) = layout.alignment {
        let align = match alignment {
            Alignment::Start => "start",
            Alignment::Center => "center",
            Alignment::End => "end",
        };
        parts.push(format!("align:{align}"));
    }
    parts.join(" ")
}

fn trim_float(v: f64) -> String {
    let s = format!("{v:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn write_vtt(set: &CaptionSet, opts: &WriteOptions) -> String {
    let mut out = format!("{HEADER}\n\n");
    let Some(lang) = select_language(set, opts.language.as_deref()) else {
        return out;
    };

    for caption in set.captions(lang) {
        out.push_str(&format!(
            "{} --> {}",
            format_vtt_timestamp(caption.start),
            format_vtt_timestamp(caption.end)
        ));
        if opts.vtt_positions {
            let settings = caption
                .layout
                .as_ref()
                .or_else(|| set.layout(lang))
                .map(format_cue_settings)
                .unwrap_or_default();
            if !settings.is_empty() {
                out.push(' ');
                out.push_str(&settings);
            }
        }
        out.push('\n');

        out.push_str(&render_inline(&caption.nodes, Dialect::Vtt, opts.wrap_width));
        out.push_str("\n\n");
    }

    out
}
