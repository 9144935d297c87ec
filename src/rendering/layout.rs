/// Block-flow layout over an owned node tree parsed from HTML.
///
/// Every element is a block box stacked vertically inside its parent, except
/// inline elements and text, which are gathered into wrapped line runs on the
/// nearest block. Coordinates are absolute CSS px from the fragment origin.

use crate::rendering::font::{FontSet, ASCENT_EM};
use crate::rendering::style::{ComputedStyle, TextAlign};
use scraper::{ElementRef, Html, Selector};

pub type NodeId = usize;

/// Attribute marking an element as an atomic block
pub const BLOCK_MARKER: &str = "data-pdf-block";
/// Attribute requesting a new page before the element
pub const BREAK_MARKER: &str = "data-pdf-break-before";
/// Attribute excluding an element from output
pub const IGNORE_MARKER: &str = "data-pdf-ignore";

const INLINE_TAGS: &[&str] = &[
    "a", "b", "br", "code", "em", "i", "label", "s", "small", "span", "strong", "sub", "sup", "u",
];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// A laid-out piece of text sharing one style, positioned by its baseline
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub baseline: f32,
    pub text: String,
    pub style: ComputedStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element { tag: String, attrs: Vec<(String, String)> },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
    pub style: ComputedStyle,
    pub rect: Rect,
    pub runs: Vec<TextRun>,
}

impl Node {
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { attrs, .. } => {
                attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
            }
            NodeKind::Text(_) => None,
        }
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    fn is_inline(&self) -> bool {
        match &self.kind {
            NodeKind::Text(_) => true,
            NodeKind::Element { tag, .. } => INLINE_TAGS.contains(&tag.as_str()),
        }
    }

    /// Hidden elements take no space and are never painted.
    pub fn is_hidden(&self) -> bool {
        self.style.display_none || self.has_attr(IGNORE_MARKER)
    }
}

/// An owned document fragment. Node 0 is the root (`<body>`).
#[derive(Debug, Clone)]
pub struct Fragment {
    nodes: Vec<Node>,
    laid_out_width: Option<f32>,
}

impl Fragment {
    pub const ROOT: NodeId = 0;

    /// Parse an HTML document or fragment; the `<body>` becomes the root.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let root_style = ComputedStyle::default();
        let mut fragment = Fragment {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Element { tag: "body".into(), attrs: Vec::new() },
                style: root_style,
                rect: Rect::default(),
                runs: Vec::new(),
            }],
            laid_out_width: None,
        };
        let body = Selector::parse("body")
            .ok()
            .and_then(|sel| document.select(&sel).next())
            .unwrap_or_else(|| document.root_element());
        if let Some(style) = body.value().attr("style") {
            fragment.nodes[Self::ROOT].style.apply_inline(style);
        }
        fragment.nodes[Self::ROOT].kind = NodeKind::Element {
            tag: "body".into(),
            attrs: body.value().attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        };
        fragment.convert_children(body, Self::ROOT);
        fragment
    }

    fn convert_children(&mut self, element: ElementRef<'_>, parent: NodeId) {
        let parent_tag = self.nodes[parent].tag().unwrap_or_default().to_string();
        let mut list_index = 0usize;
        for child in element.children() {
            if let Some(el) = ElementRef::wrap(child) {
                let tag = el.value().name().to_ascii_lowercase();
                let style = ComputedStyle::compute(&self.nodes[parent].style, &tag, el.value().attr("style"));
                let attrs = el.value().attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect();
                let id = self.push(parent, NodeKind::Element { tag: tag.clone(), attrs }, style);
                if tag == "li" {
                    list_index += 1;
                    let marker = if parent_tag == "ol" { format!("{}.", list_index) } else { "\u{2022}".to_string() };
                    let marker_style = self.nodes[id].style.clone();
                    self.push(id, NodeKind::Text(marker), marker_style);
                }
                self.convert_children(el, id);
            } else if let Some(text) = child.value().as_text() {
                let raw: &str = &text.text;
                if raw.trim().is_empty() {
                    continue;
                }
                let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
                let style = self.nodes[parent].style.clone();
                self.push(parent, NodeKind::Text(collapsed), style);
            }
        }
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind, style: ComputedStyle) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
            style,
            rect: Rect::default(),
            runs: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Node ids in document (pre-)order starting at `from`.
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    /// Ancestors of `id`, nearest first (excluding `id`).
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id].parent, move |&p| self.nodes[p].parent)
    }

    /// Width this fragment was last laid out at.
    pub fn laid_out_width(&self) -> Option<f32> {
        self.laid_out_width
    }

    /// Total laid-out height of the root box.
    pub fn height(&self) -> f32 {
        self.nodes[Self::ROOT].rect.height
    }

    /// Lay the whole fragment out at `width` CSS px.
    pub fn layout(&mut self, width: f32, fonts: &FontSet) {
        self.layout_block(Self::ROOT, 0.0, 0.0, width, fonts);
        self.laid_out_width = Some(width);
    }

    /// Returns the outer (margin-box) height consumed.
    fn layout_block(&mut self, id: NodeId, x: f32, y: f32, avail: f32, fonts: &FontSet) -> f32 {
        if self.nodes[id].is_hidden() {
            self.nodes[id].rect = Rect { x, y, width: 0.0, height: 0.0 };
            self.nodes[id].runs.clear();
            return 0.0;
        }
        let style = self.nodes[id].style.clone();
        let m = style.margin;
        let b = style.border;
        let p = style.padding;
        let box_x = x + m.left;
        let box_y = y + m.top;
        let box_w = style.width.unwrap_or(avail - m.horizontal()).max(0.0);
        let content_x = box_x + b.left + p.left;
        let content_w = (box_w - b.horizontal() - p.horizontal()).max(0.0);
        let content_top = box_y + b.top + p.top;

        let mut cursor = content_top;
        let mut runs = Vec::new();
        let children = self.nodes[id].children.clone();

        if self.nodes[id].tag() == Some("img") {
            // Replaced content: size from attributes, falling back to style.
            let attr_px = |name: &str| self.nodes[id].attr(name).and_then(|v| v.trim_end_matches("px").parse::<f32>().ok());
            let w = style.width.or_else(|| attr_px("width")).unwrap_or(content_w).min(avail);
            let h = style.height.or_else(|| attr_px("height")).unwrap_or(w);
            let rect = Rect { x: box_x, y: box_y, width: w + b.horizontal() + p.horizontal(), height: h + b.vertical() + p.vertical() };
            self.nodes[id].rect = rect;
            self.nodes[id].runs.clear();
            return m.vertical() + rect.height;
        }

        let mut i = 0;
        while i < children.len() {
            if self.nodes[children[i]].is_inline() {
                let start = i;
                while i < children.len() && self.nodes[children[i]].is_inline() {
                    i += 1;
                }
                let mut words = Vec::new();
                for &c in &children[start..i] {
                    self.collect_words(c, &mut words);
                }
                cursor = wrap_words(&words, content_x, cursor, content_w, style.text_align, fonts, &mut runs);
            } else {
                cursor += self.layout_block(children[i], content_x, cursor, content_w, fonts);
                i += 1;
            }
        }

        let content_h = style.height.unwrap_or(cursor - content_top).max(0.0);
        let rect = Rect {
            x: box_x,
            y: box_y,
            width: box_w,
            height: content_h + b.vertical() + p.vertical(),
        };
        let node = &mut self.nodes[id];
        node.rect = rect;
        node.runs = runs;
        m.vertical() + rect.height
    }

    fn collect_words(&self, id: NodeId, out: &mut Vec<Word>) {
        let node = &self.nodes[id];
        if node.is_hidden() {
            return;
        }
        match &node.kind {
            NodeKind::Text(text) => {
                for w in text.split_whitespace() {
                    out.push(Word::Text(w.to_string(), node.style.clone()));
                }
            }
            NodeKind::Element { tag, .. } if tag == "br" => out.push(Word::Break),
            NodeKind::Element { .. } => {
                for &c in &node.children {
                    self.collect_words(c, out);
                }
            }
        }
    }
}

enum Word {
    Text(String, ComputedStyle),
    Break,
}

/// Greedy line wrapping. Returns the y just below the last line.
fn wrap_words(
    words: &[Word],
    x: f32,
    top: f32,
    width: f32,
    align: TextAlign,
    fonts: &FontSet,
    runs: &mut Vec<TextRun>,
) -> f32 {
    let mut lines: Vec<Vec<(String, ComputedStyle, f32)>> = vec![Vec::new()];
    let mut line_w = 0.0f32;
    for word in words {
        match word {
            Word::Break => {
                lines.push(Vec::new());
                line_w = 0.0;
            }
            Word::Text(text, style) => {
                let w = fonts.measure(text, style.font_size, style.bold);
                let space = fonts.measure(" ", style.font_size, style.bold);
                let started = lines.last().map(|l| !l.is_empty()).unwrap_or(false);
                if started && line_w + space + w > width {
                    lines.push(Vec::new());
                    line_w = 0.0;
                }
                if let Some(current) = lines.last_mut() {
                    if !current.is_empty() {
                        line_w += space;
                    }
                    current.push((text.clone(), style.clone(), line_w));
                    line_w += w;
                }
            }
        }
    }

    let mut y = top;
    for line in lines.iter().filter(|l| !l.is_empty()) {
        let line_height = line
            .iter()
            .map(|(_, s, _)| s.font_size * s.line_height)
            .fold(0.0f32, f32::max);
        let max_size = line.iter().map(|(_, s, _)| s.font_size).fold(0.0f32, f32::max);
        let baseline = y + (line_height - max_size) / 2.0 + max_size * ASCENT_EM;
        let (last_text, last_style, last_x) = &line[line.len() - 1];
        let used = last_x + fonts.measure(last_text, last_style.font_size, last_style.bold);
        let shift = match align {
            TextAlign::Left => 0.0,
            TextAlign::Center => ((width - used) / 2.0).max(0.0),
            TextAlign::Right => (width - used).max(0.0),
        };

        // Merge consecutive words sharing a style into one run.
        let mut current: Option<TextRun> = None;
        for (text, style, offset) in line {
            match current.as_mut() {
                Some(run) if run.style == *style => {
                    run.text.push(' ');
                    run.text.push_str(text);
                }
                _ => {
                    if let Some(run) = current.take() {
                        runs.push(run);
                    }
                    current = Some(TextRun { x: x + shift + offset, baseline, text: text.clone(), style: style.clone() });
                }
            }
        }
        if let Some(run) = current {
            runs.push(run);
        }
        y += line_height;
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laid_out(html: &str, width: f32) -> Fragment {
        let mut f = Fragment::parse(html);
        f.layout(width, &FontSet::empty());
        f
    }

    fn find(f: &Fragment, tag: &str) -> NodeId {
        f.descendants(Fragment::ROOT)
            .into_iter()
            .find(|&id| f.node(id).tag() == Some(tag))
            .expect("tag present")
    }

    #[test]
    fn stacks_blocks_vertically() {
        let f = laid_out(
            r#"<div style="height: 100px"></div><section style="height: 50px; margin-top: 10px"></section>"#,
            200.0,
        );
        let div = f.node(find(&f, "div")).rect;
        let section = f.node(find(&f, "section")).rect;
        assert_eq!(div.y, 0.0);
        assert_eq!(div.height, 100.0);
        assert_eq!(section.y, 110.0);
        assert_eq!(section.width, 200.0);
        assert_eq!(f.height(), 160.0);
    }

    #[test]
    fn wraps_text_to_content_width() {
        // 10 chars at 10px * 0.5em = 50px per word; 120px fits two words per line.
        let f = laid_out(
            r#"<p style="font-size: 10px; line-height: 2; margin: 0">aaaaaaaaaa bbbbbbbbbb cccccccccc</p>"#,
            120.0,
        );
        let p = f.node(find(&f, "p"));
        assert_eq!(p.runs.len(), 2);
        assert_eq!(p.runs[0].text, "aaaaaaaaaa bbbbbbbbbb");
        assert_eq!(p.rect.height, 40.0);
    }

    #[test]
    fn hidden_elements_take_no_space() {
        let f = laid_out(
            r#"<div style="display:none; height: 300px"></div><div data-pdf-ignore style="height: 300px"></div><p style="margin:0; height: 20px"></p>"#,
            100.0,
        );
        assert_eq!(f.height(), 20.0);
    }

    #[test]
    fn list_items_get_markers() {
        let f = laid_out("<ol><li>first</li><li>second</li></ol>", 400.0);
        let texts: Vec<String> = f
            .descendants(Fragment::ROOT)
            .into_iter()
            .filter_map(|id| f.node(id).runs.first().map(|r| r.text.clone()))
            .collect();
        assert_eq!(texts, vec!["1. first".to_string(), "2. second".to_string()]);
    }

    #[test]
    fn image_uses_attribute_size() {
        let f = laid_out(r#"<img src="data:," width="48" height="24">"#, 400.0);
        let img = f.node(find(&f, "img")).rect;
        assert_eq!((img.width, img.height), (48.0, 24.0));
    }
}
