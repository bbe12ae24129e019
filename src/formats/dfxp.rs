use std::collections::{BTreeMap, HashMap};

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, trace};

use crate::{
    error::{CaptionError, Result},
    formats::{
        select_language,
        time::{format_ttml_time, parse_ttml_time},
        ReadOptions, WriteOptions, DEFAULT_LANGUAGE,
    },
    model::{Alignment, Caption, CaptionNode, CaptionSet, Layout, Point, Style},
};

const TTML_NS: &str = "http://www.w3.org/ns/ttml";
const TTS_NS: &str = "http://www.w3.org/ns/ttml#styling";

const DEFAULT_STYLE_ID: &str = "p";

type Attrs = HashMap<String, String>;

pub fn read_dfxp(input: &str, opts: &ReadOptions) -> Result<CaptionSet> {
    let mut reader = Reader::from_str(input.trim_start_matches('\u{feff}'));
    reader.trim_text(false);

    let mut builder = DocumentBuilder::new(opts.language());
    loop {
        match reader.read_event()? {
            Event::Start(e) => builder.open(&e)?,
            Event::Empty(e) => {
                builder.open(&e)?;
                builder.close(e.local_name().as_ref())?;
            }
            Event::End(e) => builder.close(e.local_name().as_ref())?,
            Event::Text(t) => builder.text(&t.unescape()?),
            Event::CData(c) => builder.text(&String::from_utf8_lossy(&c.into_inner())),
            Event::Eof => break,
            _ => {}
        }
    }

    let mut set = builder.finish()?;
    if opts.offset_us != 0 {
        set.adjust_timing(-opts.offset_us, 1.0);
    }
    Ok(set)
}

fn attributes(e: &BytesStart) -> Result<Attrs> {
    let mut map = Attrs::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        map.insert(key, attr.unescape_value()?.into_owned());
    }
    Ok(map)
}

/// Traversal state for one document. Lives only for a single read.
struct DocumentBuilder {
    set: CaptionSet,
    captions: BTreeMap<String, Vec<Caption>>,
    regions: HashMap<String, Layout>,
    /// Inherited `xml:lang` of each open container element.
    langs: Vec<String>,
    paragraph: Option<Caption>,
    /// Style opened by each open span, if it had any.
    spans: Vec<Option<Style>>,
}

impl DocumentBuilder {
    fn new(default_lang: &str) -> Self {
        Self {
            set: CaptionSet::new(),
            captions: BTreeMap::new(),
            regions: HashMap::new(),
            langs: vec![default_lang.to_string()],
            paragraph: None,
            spans: Vec::new(),
        }
    }

    fn lang(&self) -> String {
        self.langs
            .last()
            .cloned()
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }

    fn open(&mut self, e: &BytesStart) -> Result<()> {
        let name = e.local_name();
        let name = name.as_ref();
        let attrs = attributes(e)?;

        match name {
            b"tt" | b"body" | b"div" => {
                let lang = attrs.get("lang").cloned().unwrap_or_else(|| self.lang());
                if let Some(layout) = attrs.get("region").and_then(|r| self.regions.get(r)) {
                    self.set.set_layout(lang.clone(), layout.clone());
                }
                self.langs.push(lang);
            }
            b"style" if self.paragraph.is_none() => {
                if let Some(id) = attrs.get("id") {
                    let style = self.resolve(style_from_attrs(&attrs));
                    self.set.set_style(id.clone(), style);
                }
            }
            b"region" => {
                if let Some(id) = attrs.get("id") {
                    self.regions.insert(id.clone(), layout_from_attrs(&attrs));
                }
            }
            b"p" => self.open_paragraph(&attrs)?,
            b"span" => {
                let style = self.resolve(style_from_attrs(&attrs));
                if let Some(p) = self.paragraph.as_mut() {
                    if style.is_empty() {
                        self.spans.push(None);
                    } else {
                        p.nodes.push(CaptionNode::Style {
                            start: true,
                            style: style.clone(),
                        });
                        self.spans.push(Some(style));
                    }
                }
            }
            b"br" => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.nodes.push(CaptionNode::Break);
                }
            }
            other => trace!(element = %String::from_utf8_lossy(other), "ignoring dfxp element"),
        }
        Ok(())
    }

    fn open_paragraph(&mut self, attrs: &Attrs) -> Result<()> {
        let begin = attrs
            .get("begin")
            .ok_or_else(|| CaptionError::Syntax("<p> without begin time".to_string()))?;
        let start = parse_ttml_time(begin)?;
        let end = match (attrs.get("end"), attrs.get("dur")) {
            (Some(end), _) => parse_ttml_time(end)?,
            (None, Some(dur)) => start + parse_ttml_time(dur)?,
            (None, None) => {
                return Err(CaptionError::Syntax(format!(
                    "<p begin=\"{begin}\"> without end or dur"
                )))
            }
        };
        if end < start {
            return Err(CaptionError::InvalidInput(format!(
                "<p> ends before it begins at {begin}"
            )));
        }

        let mut caption = Caption::new(start, end, Vec::new());
        let style = self.resolve(style_from_attrs(attrs));
        if !style.is_empty() {
            caption.style = Some(style);
        }
        caption.layout = if attrs.contains_key("origin") {
            Some(layout_from_attrs(attrs))
        } else {
            attrs
                .get("region")
                .and_then(|r| self.regions.get(r))
                .cloned()
        };

        let lang = attrs.get("lang").cloned().unwrap_or_else(|| self.lang());
        self.langs.push(lang);
        self.paragraph = Some(caption);
        self.spans.clear();
        Ok(())
    }

    fn close(&mut self, name: &[u8]) -> Result<()> {
        match name {
            b"tt" | b"body" | b"div" => {
                if self.langs.len() > 1 {
                    self.langs.pop();
                }
            }
            b"span" => {
                if let (Some(Some(style)), Some(p)) = (self.spans.pop(), self.paragraph.as_mut()) {
                    p.nodes.push(CaptionNode::Style {
                        start: false,
                        style,
                    });
                }
            }
            b"p" => {
                let lang = self.langs.pop().unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
                if let Some(mut caption) = self.paragraph.take() {
                    caption.trim_lines();
                    if caption.has_text() {
                        self.captions.entry(lang).or_default().push(caption);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, raw: &str) {
        let Some(p) = self.paragraph.as_mut() else {
            return;
        };
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut content = String::new();
        if raw.starts_with(char::is_whitespace) {
            content.push(' ');
        }
        content.push_str(&collapsed);
        if !collapsed.is_empty() && raw.ends_with(char::is_whitespace) {
            content.push(' ');
        }
        if !content.is_empty() {
            p.nodes.push(CaptionNode::Text { content });
        }
    }

    fn resolve(&self, mut style: Style) -> Style {
        let Some(base) = style.class.as_deref().and_then(|id| self.set.style(id)) else {
            return style;
        };
        style.italics = style.italics.or(base.italics);
        style.bold = style.bold.or(base.bold);
        style.underline = style.underline.or(base.underline);
        style.color = style.color.or_else(|| base.color.clone());
        style.font_family = style.font_family.or_else(|| base.font_family.clone());
        style.font_size = style.font_size.or_else(|| base.font_size.clone());
        style.text_align = style.text_align.or_else(|| base.text_align.clone());
        style
    }

    fn finish(mut self) -> Result<CaptionSet> {
        if self.captions.values().all(Vec::is_empty) {
            return Err(CaptionError::NoCaptions("empty DFXP body".to_string()));
        }
        for (lang, captions) in std::mem::take(&mut self.captions) {
            debug!(lang = lang.as_str(), captions = captions.len(), "dfxp decoded");
            self.set.set_captions(lang, captions);
        }
        Ok(self.set)
    }
}

fn style_from_attrs(attrs: &Attrs) -> Style {
    Style {
        italics: attrs.get("fontStyle").map(|v| v == "italic" || v == "oblique"),
        bold: attrs.get("fontWeight").map(|v| v == "bold"),
        underline: attrs.get("textDecoration").map(|v| v.contains("underline")),
        color: attrs.get("color").cloned(),
        font_family: attrs.get("fontFamily").cloned(),
        font_size: attrs.get("fontSize").cloned(),
        text_align: attrs.get("textAlign").cloned(),
        class: attrs.get("style").cloned(),
    }
}

fn parse_point(v: &str) -> Option<Point> {
    let mut parts = v.split_whitespace();
    let x = parts.next()?.strip_suffix('%')?.parse().ok()?;
    let y = parts.next()?.strip_suffix('%')?.parse().ok()?;
    Some(Point { x, y })
}

fn layout_from_attrs(attrs: &Attrs) -> Layout {
    Layout {
        origin: attrs.get("origin").and_then(|v| parse_point(v)),
        extent: attrs.get("extent").and_then(|v| parse_point(v)),
        alignment: attrs.get("textAlign").and_then(|v| match v.as_str() {
            "left" | "start" => Some(Alignment::Start),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::End),
            _ => None,
        }),
    }
}

fn style_attrs(style: &Style) -> String {
    let mut out = String::new();
    let mut attr = |name: &str, value: &str| {
        out.push_str(&format!(" {name}=\"{}\"", escape(value)));
    };
    if let Some(class) = &style.class {
        attr("style", class);
    }
    if let Some(italics) = style.italics {
        attr("tts:fontStyle", if italics { "italic" } else { "normal" });
    }
    if let Some(bold) = style.bold {
        attr("tts:fontWeight", if bold { "bold" } else { "normal" });
    }
    if let Some(underline) = style.underline {
        attr(
            "tts:textDecoration",
            if underline { "underline" } else { "noUnderline" },
        );
    }
    if let Some(color) = &style.color {
        attr("tts:color", color);
    }
    if let Some(family) = &style.font_family {
        attr("tts:fontFamily", family);
    }
    if let Some(size) = &style.font_size {
        attr("tts:fontSize", size);
    }
    if let Some(align) = &style.text_align {
        attr("tts:textAlign", align);
    }
    out
}

fn format_point(p: Point) -> String {
    format!("{}% {}%", p.x, p.y)
}

fn layout_attrs(layout: &Layout) -> String {
    let mut out = String::new();
    if let Some(origin) = layout.origin {
        out.push_str(&format!(" tts:origin=\"{}\"", format_point(origin)));
    }
    if let Some(extent) = layout.extent {
        out.push_str(&format!(" tts:extent=\"{}\"", format_point(extent)));
    }
    if let Some(alignment) = layout.alignment {
        let align = match alignment {
            Alignment::Start => "start",
            Alignment::Center => "center",
            Alignment::End => "end",
        };
        out.push_str(&format!(" tts:textAlign=\"{align}\""));
    }
    out
}

fn render_nodes(nodes: &[CaptionNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            CaptionNode::Text { content } => out.push_str(&escape(content)),
            CaptionNode::Break => out.push_str("<br/>"),
            CaptionNode::Style { start: true, style } => {
                out.push_str(&format!("<span{}>", style_attrs(style)));
            }
            CaptionNode::Style { start: false, .. } => out.push_str("</span>"),
        }
    }
    out
}

pub fn write_dfxp(set: &CaptionSet, opts: &WriteOptions) -> String {
    let root_lang = select_language(set, opts.language.as_deref()).unwrap_or(DEFAULT_LANGUAGE);

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str(&format!(
        "<tt xml:lang=\"{}\" xmlns=\"{TTML_NS}\" xmlns:tts=\"{TTS_NS}\">\n",
        escape(root_lang)
    ));

    out.push_str(" <head>\n  <styling>\n");
    if set.styles().is_empty() {
        out.push_str(&format!(
            "   <style xml:id=\"{DEFAULT_STYLE_ID}\" tts:color=\"#ffffff\" tts:fontFamily=\"monospaceSansSerif\"/>\n"
        ));
    }
    for (id, style) in set.styles() {
        out.push_str(&format!(
            "   <style xml:id=\"{}\"{}/>\n",
            escape(id),
            style_attrs(style)
        ));
    }
    out.push_str("  </styling>\n  <layout>\n");
    if let Some(region) = &opts.dfxp_default_region {
        out.push_str(&format!(
            "   <region xml:id=\"{}\" tts:origin=\"10% 80%\" tts:extent=\"80% 20%\" tts:textAlign=\"center\" tts:displayAlign=\"after\"/>\n",
            escape(region)
        ));
    }
    out.push_str("  </layout>\n </head>\n <body>\n");

    for lang in set.languages() {
        out.push_str(&format!("  <div xml:lang=\"{}\">\n", escape(lang)));
        for caption in set.captions(lang) {
            out.push_str(&format!(
                "   <p begin=\"{}\" end=\"{}\"",
                format_ttml_time(caption.start),
                format_ttml_time(caption.end)
            ));
            match &caption.style {
                Some(style) => out.push_str(&style_attrs(style)),
                None if set.styles().is_empty() => {
                    out.push_str(&format!(" style=\"{DEFAULT_STYLE_ID}\""));
                }
                None => {}
            }
            match (&caption.layout, &opts.dfxp_default_region) {
                (Some(layout), _) => out.push_str(&layout_attrs(layout)),
                (None, Some(region)) => {
                    out.push_str(&format!(" region=\"{}\"", escape(region)));
                }
                (None, None) => {}
            }
            out.push('>');
            out.push_str(&render_nodes(&caption.nodes));
            out.push_str("</p>\n");
        }
        out.push_str("  </div>\n");
    }

    out.push_str(" </body>\n</tt>\n");
    out
}
