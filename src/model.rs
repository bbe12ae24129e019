use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionSet {
    captions: BTreeMap<String, Vec<Caption>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    styles: BTreeMap<String, Style>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    layouts: BTreeMap<String, Layout>,
}

impl CaptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(lang: impl Into<String>, captions: Vec<Caption>) -> Self {
        let mut set = Self::new();
        set.set_captions(lang, captions);
        set
    }

    pub fn set_captions(&mut self, lang: impl Into<String>, mut captions: Vec<Caption>) {
        captions.sort_by_key(|c| c.start);
        self.captions.insert(lang.into(), captions);
    }

    pub fn captions(&self, lang: &str) -> &[Caption] {
        self.captions.get(lang).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn captions_mut(&mut self, lang: &str) -> Option<&mut Vec<Caption>> {
        self.captions.get_mut(lang)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.captions.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.captions.values().all(Vec::is_empty)
    }

    pub fn caption_count(&self) -> usize {
        self.captions.values().map(Vec::len).sum()
    }

    pub fn set_style(&mut self, id: impl Into<String>, style: Style) {
        self.styles.insert(id.into(), style);
    }

    pub fn style(&self, id: &str) -> Option<&Style> {
        self.styles.get(id)
    }

    pub fn styles(&self) -> &BTreeMap<String, Style> {
        &self.styles
    }

    pub fn set_layout(&mut self, lang: impl Into<String>, layout: Layout) {
        self.layouts.insert(lang.into(), layout);
    }

    pub fn layout(&self, lang: &str) -> Option<&Layout> {
        self.layouts.get(lang)
    }

    pub fn adjust_timing(&mut self, offset_us: i64, rate_skew: f64) {
        let adjust = |t: i64| (((t as f64) * rate_skew).round() as i64 + offset_us).max(0);
        for captions in self.captions.values_mut() {
            for c in captions.iter_mut() {
                c.start = adjust(c.start);
                if c.end != 0 {
                    c.end = adjust(c.end);
                }
            }
        }
    }

    pub fn duration_us(&self) -> i64 {
        self.captions
            .values()
            .filter_map(|cs| cs.iter().map(|c| c.end).max())
            .max()
            .unwrap_or(0)
    }
}

/// One timed display event.
///
/// `end == 0` marks a caption whose end is not known yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub start: i64,
    pub end: i64,
    pub nodes: Vec<CaptionNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}

impl Caption {
    pub fn new(start: i64, end: i64, nodes: Vec<CaptionNode>) -> Self {
        Self {
            start,
            end,
            nodes,
            style: None,
            layout: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end == 0
    }

    pub fn duration(&self) -> i64 {
        (self.end - self.start).max(0)
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                CaptionNode::Text { content } => out.push_str(content),
                CaptionNode::Break => out.push('\n'),
                CaptionNode::Style { .. } => {}
            }
        }
        out
    }

    pub fn has_text(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| matches!(n, CaptionNode::Text { content } if !content.is_empty()))
    }

    pub fn trim_lines(&mut self) {
        let mut at_edge = true;
        for node in self.nodes.iter_mut() {
            match node {
                CaptionNode::Text { content } => {
                    if at_edge {
                        *content = content.trim_start().to_string();
                    }
                    at_edge = at_edge && content.is_empty();
                }
                CaptionNode::Break => at_edge = true,
                CaptionNode::Style { .. } => {}
            }
        }

        at_edge = true;
        for node in self.nodes.iter_mut().rev() {
            match node {
                CaptionNode::Text { content } => {
                    if at_edge {
                        *content = content.trim_end().to_string();
                    }
                    at_edge = at_edge && content.is_empty();
                }
                CaptionNode::Break => at_edge = true,
                CaptionNode::Style { .. } => {}
            }
        }

        self.nodes
            .retain(|n| !matches!(n, CaptionNode::Text { content } if content.is_empty()));
    }

    pub fn collapse_whitespace(&mut self) {
        for node in self.nodes.iter_mut() {
            if let CaptionNode::Text { content } = node {
                let mut out = String::with_capacity(content.len());
                let mut prev_space = false;
                for ch in content.chars() {
                    if ch.is_whitespace() {
                        if !prev_space {
                            out.push(' ');
                        }
                        prev_space = true;
                    } else {
                        out.push(ch);
                        prev_space = false;
                    }
                }
                *content = out;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaptionNode {
    Text { content: String },
    Break,
    Style { start: bool, style: Style },
}

impl CaptionNode {
    pub fn text(content: impl Into<String>) -> Self {
        CaptionNode::Text {
            content: content.into(),
        }
    }

    pub fn italics(start: bool) -> Self {
        CaptionNode::Style {
            start,
            style: Style::italics(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italics: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl Style {
    pub fn italics() -> Self {
        Self {
            italics: Some(true),
            ..Self::default()
        }
    }

    pub fn bold() -> Self {
        Self {
            bold: Some(true),
            ..Self::default()
        }
    }

    pub fn underline() -> Self {
        Self {
            underline: Some(true),
            ..Self::default()
        }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..Self::default()
        }
    }

    pub fn is_italic(&self) -> bool {
        self.italics == Some(true)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
}

impl Layout {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            origin: Some(Point { x, y }),
            ..Self::default()
        }
    }

    /// Converts a CEA-608 cell (rows 1-15, columns 0-31) to percent.
    pub fn from_cell(row: u8, col: u8) -> Self {
        let x = 100.0 * f64::from(col) / 32.0;
        let y = 100.0 * f64::from(row.saturating_sub(1)) / 15.0;
        Self::at(x, y)
    }
}
