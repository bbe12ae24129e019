use once_cell::sync::Lazy;
use regex::Regex;
use textwrap::wrap;

use crate::model::{CaptionNode, Style};

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([^\s>./]*)([^>]*)>").expect("static tag pattern"));

static FONT_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"color\s*=\s*["']?([^"'\s>]+)["']?"#).expect("static color pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Srt,
    Vtt,
}

/// Parses cue text into caption nodes. Newlines become breaks, known tags
/// become paired style nodes and everything else is dropped.
pub fn parse_inline(text: &str, dialect: Dialect) -> Vec<CaptionNode> {
    let mut nodes = Vec::new();
    let mut open: Vec<(String, Style)> = Vec::new();
    let mut last_end = 0;

    for cap in TAG.captures_iter(text) {
        let Some(full) = cap.get(0) else {
            continue;
        };
        push_text(&mut nodes, &text[last_end..full.start()], dialect);
        last_end = full.end();

        let name = cap[2].to_ascii_lowercase();
        if &cap[1] == "/" {
            if let Some(pos) = open.iter().rposition(|(n, _)| *n == name) {
                for (_, style) in open.drain(pos..).rev() {
                    nodes.push(CaptionNode::Style {
                        start: false,
                        style,
                    });
                }
            }
            continue;
        }

        if let Some(style) = tag_style(&name, &cap[3], dialect) {
            nodes.push(CaptionNode::Style {
                start: true,
                style: style.clone(),
            });
            open.push((name, style));
        }
    }
    push_text(&mut nodes, &text[last_end..], dialect);

    for (_, style) in open.into_iter().rev() {
        nodes.push(CaptionNode::Style {
            start: false,
            style,
        });
    }
    nodes
}

fn tag_style(name: &str, rest: &str, dialect: Dialect) -> Option<Style> {
    let style = match name {
        "i" => Style::italics(),
        "b" => Style::bold(),
        "u" => Style::underline(),
        "font" => {
            let cap = FONT_COLOR.captures(rest)?;
            Style::color(&cap[1])
        }
        "c" if dialect == Dialect::Vtt => {
            let classes: Vec<&str> = rest
                .split_whitespace()
                .next()
                .unwrap_or("")
                .split('.')
                .filter(|c| !c.is_empty())
                .collect();
            if classes.is_empty() {
                return None;
            }
            Style {
                class: Some(classes.join(" ")),
                ..Style::default()
            }
        }
        _ => return None,
    };
    Some(style)
}

fn push_text(nodes: &mut Vec<CaptionNode>, raw: &str, dialect: Dialect) {
    for (i, line) in raw.split('\n').enumerate() {
        if i > 0 {
            nodes.push(CaptionNode::Break);
        }
        if line.is_empty() {
            continue;
        }
        let content = match dialect {
            Dialect::Vtt => unescape_vtt(line),
            Dialect::Srt => line.to_string(),
        };
        nodes.push(CaptionNode::Text { content });
    }
}

fn unescape_vtt(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&lrm;", "\u{200e}")
        .replace("&rlm;", "\u{200f}")
        .replace("&amp;", "&")
}

fn escape_vtt(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn style_tags(style: &Style, dialect: Dialect) -> Vec<(String, &'static str)> {
    let mut tags = Vec::new();
    if style.italics == Some(true) {
        tags.push(("<i>".to_string(), "</i>"));
    }
    if style.bold == Some(true) {
        tags.push(("<b>".to_string(), "</b>"));
    }
    if style.underline == Some(true) {
        tags.push(("<u>".to_string(), "</u>"));
    }
    match dialect {
        Dialect::Srt => {
            if let Some(color) = &style.color {
                tags.push((format!("<font color=\"{color}\">"), "</font>"));
            }
        }
        Dialect::Vtt => {
            let classes: Vec<&str> = style
                .color
                .iter()
                .chain(style.class.iter())
                .flat_map(|s| s.split_whitespace())
                .collect();
            if !classes.is_empty() {
                tags.push((format!("<c.{}>", classes.join(".")), "</c>"));
            }
        }
    }
    tags
}

/// Renders caption nodes back to cue text. Lines holding a single plain
/// text run are wrapped at `wrap_width` when given.
pub fn render_inline(nodes: &[CaptionNode], dialect: Dialect, wrap_width: Option<usize>) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut plain = true;

    let flush = |line: &mut String, plain: &mut bool, lines: &mut Vec<String>| {
        let done = std::mem::take(line);
        match wrap_width {
            Some(width) if *plain && width > 0 && !done.is_empty() => {
                lines.extend(wrap(&done, width).into_iter().map(|l| l.into_owned()));
            }
            _ => lines.push(done),
        }
        *plain = true;
    };

    for node in nodes {
        match node {
            CaptionNode::Text { content } => match dialect {
                Dialect::Vtt => line.push_str(&escape_vtt(content)),
                Dialect::Srt => line.push_str(content),
            },
            CaptionNode::Break => flush(&mut line, &mut plain, &mut lines),
            CaptionNode::Style { start, style } => {
                let tags = style_tags(style, dialect);
                if tags.is_empty() {
                    continue;
                }
                plain = false;
                if *start {
                    tags.iter().for_each(|(open, _)| line.push_str(open));
                } else {
                    tags.iter().rev().for_each(|(_, close)| line.push_str(close));
                }
            }
        }
    }
    flush(&mut line, &mut plain, &mut lines);

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srt_tags_become_style_nodes() {
        let nodes = parse_inline("<i>hello</i>\nworld", Dialect::Srt);
        assert_eq!(
            nodes,
            vec![
                CaptionNode::italics(true),
                CaptionNode::text("hello"),
                CaptionNode::italics(false),
                CaptionNode::Break,
                CaptionNode::text("world"),
            ]
        );
    }

    #[test]
    fn font_color_and_unclosed_tags() {
        let nodes = parse_inline("<font color=\"#ff0000\"><b>red", Dialect::Srt);
        assert_eq!(nodes.len(), 5);
        assert_eq!(
            nodes[0],
            CaptionNode::Style {
                start: true,
                style: Style::color("#ff0000")
            }
        );
        assert_eq!(nodes[3], CaptionNode::Style { start: false, style: Style::bold() });
    }

    #[test]
    fn vtt_classes_voices_and_entities() {
        let nodes = parse_inline("<v Bob><c.yellow.big>a &amp; b</c></v>", Dialect::Vtt);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[1], CaptionNode::text("a & b"));
        match &nodes[0] {
            CaptionNode::Style { start: true, style } => {
                assert_eq!(style.class.as_deref(), Some("yellow big"))
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn vtt_timestamp_tags_are_dropped() {
        let nodes = parse_inline("one <00:00:01.000>two", Dialect::Vtt);
        let text: String = nodes
            .iter()
            .filter_map(|n| match n {
                CaptionNode::Text { content } => Some(content.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "one two");
    }

    #[test]
    fn renders_tags_per_dialect() {
        let nodes = vec![
            CaptionNode::text("a "),
            CaptionNode::italics(true),
            CaptionNode::text("<b>"),
            CaptionNode::italics(false),
            CaptionNode::Break,
            CaptionNode::text("c"),
        ];
        assert_eq!(render_inline(&nodes, Dialect::Srt, None), "a <i><b></i>\nc");
        assert_eq!(
            render_inline(&nodes, Dialect::Vtt, None),
            "a <i>&lt;b&gt;</i>\nc"
        );
    }

    #[test]
    fn wraps_plain_lines_only() {
        let nodes = vec![CaptionNode::text("one two three four")];
        assert_eq!(
            render_inline(&nodes, Dialect::Srt, Some(9)),
            "one two\nthree\nfour"
        );
        let styled = vec![
            CaptionNode::italics(true),
            CaptionNode::text("one two three four"),
            CaptionNode::italics(false),
        ];
        assert_eq!(
            render_inline(&styled, Dialect::Srt, Some(9)),
            "<i>one two three four</i>"
        );
    }
}
