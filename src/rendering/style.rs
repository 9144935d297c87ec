//! Computed style for the block-flow renderer.
//!
//! Only the subset of CSS that affects block geometry and paint is
//! understood: box edges, explicit sizes, backgrounds, borders, text size,
//! weight, colour, alignment, `display: none` and page-break hints. Values are
//! read from a tiny user-agent sheet keyed by tag plus the element's inline
//! `style` attribute.

/// Pixels per point (CSS px are 1/96 in, PDF points 1/72 in)
pub const PX_PER_PT: f32 = 96.0 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn is_visible(&self) -> bool {
        self.a > 0
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()` and a few names.
    pub fn parse(value: &str) -> Option<Color> {
        let v = value.trim().to_ascii_lowercase();
        if let Some(hex) = v.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(args) = v
            .strip_prefix("rgba(")
            .or_else(|| v.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            if parts.len() < 3 {
                return None;
            }
            let channel = |s: &str| s.parse::<f32>().ok().map(|c| c.clamp(0.0, 255.0) as u8);
            let alpha = match parts.get(3) {
                Some(a) => (a.parse::<f32>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8,
                None => 255,
            };
            return Some(Color {
                r: channel(parts[0])?,
                g: channel(parts[1])?,
                b: channel(parts[2])?,
                a: alpha,
            });
        }
        match v.as_str() {
            "white" => Some(Color::WHITE),
            "black" => Some(Color::BLACK),
            "red" => Some(Color::rgb(255, 0, 0)),
            "green" => Some(Color::rgb(0, 128, 0)),
            "blue" => Some(Color::rgb(0, 0, 255)),
            "gray" | "grey" => Some(Color::rgb(128, 128, 128)),
            "transparent" => Some(Color::TRANSPARENT),
            _ => None,
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let byte = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut it = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some(Color::rgb(it.next()??, it.next()??, it.next()??))
        }
        6 => Some(Color::rgb(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
        8 => Some(Color {
            r: byte(&hex[0..2])?,
            g: byte(&hex[2..4])?,
            b: byte(&hex[4..6])?,
            a: byte(&hex[6..8])?,
        }),
        _ => None,
    }
}

/// Four box edges (margin, border width or padding) in CSS px
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    fn vertical_only(v: f32) -> Self {
        Edges { top: v, right: 0.0, bottom: v, left: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub display_none: bool,
    pub background: Option<Color>,
    pub color: Color,
    pub font_size: f32,
    pub bold: bool,
    /// Multiplier of `font_size`
    pub line_height: f32,
    pub text_align: TextAlign,
    pub margin: Edges,
    pub padding: Edges,
    pub border: Edges,
    pub border_color: Color,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub break_before: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display_none: false,
            background: None,
            color: Color::rgb(17, 24, 39),
            font_size: 16.0,
            bold: false,
            line_height: 1.4,
            text_align: TextAlign::Left,
            margin: Edges::default(),
            padding: Edges::default(),
            border: Edges::default(),
            border_color: Color::rgb(229, 231, 235),
            width: None,
            height: None,
            break_before: false,
        }
    }
}

impl ComputedStyle {
    /// Start a child style: inherited properties carry over, box properties reset.
    pub fn inherit(parent: &ComputedStyle) -> Self {
        Self {
            color: parent.color,
            font_size: parent.font_size,
            bold: parent.bold,
            line_height: parent.line_height,
            text_align: parent.text_align,
            ..Default::default()
        }
    }

    /// Compute the style of an element from its parent, tag and inline style.
    pub fn compute(parent: &ComputedStyle, tag: &str, inline: Option<&str>) -> Self {
        let mut style = Self::inherit(parent);
        style.apply_user_agent(tag);
        if let Some(decls) = inline {
            style.apply_inline(decls);
        }
        style
    }

    fn apply_user_agent(&mut self, tag: &str) {
        match tag {
            "h1" => self.heading(32.0, 0.67),
            "h2" => self.heading(24.0, 0.83),
            "h3" => self.heading(18.72, 1.0),
            "h4" => self.heading(16.0, 1.33),
            "p" => self.margin = Edges::vertical_only(self.font_size),
            "ul" | "ol" => {
                self.margin = Edges::vertical_only(self.font_size);
                self.padding.left = 40.0;
            }
            "strong" | "b" | "th" => self.bold = true,
            "small" => self.font_size *= 0.83,
            "hr" => {
                self.border.top = 1.0;
                self.margin = Edges::vertical_only(8.0);
            }
            "head" | "script" | "style" | "template" | "noscript" => self.display_none = true,
            _ => {}
        }
    }

    fn heading(&mut self, size: f32, margin_em: f32) {
        self.font_size = size;
        self.bold = true;
        self.margin = Edges::vertical_only(size * margin_em);
    }

    /// Apply `prop: value; ...` declarations. Unknown properties are ignored.
    pub fn apply_inline(&mut self, decls: &str) {
        for decl in decls.split(';') {
            let Some((prop, value)) = decl.split_once(':') else { continue };
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim().trim_end_matches("!important").trim();
            self.apply_declaration(&prop, value);
        }
    }

    fn apply_declaration(&mut self, prop: &str, value: &str) {
        let em = self.font_size;
        match prop {
            "display" => self.display_none = value.eq_ignore_ascii_case("none"),
            "background" | "background-color" => {
                self.background = value.split_whitespace().find_map(Color::parse);
            }
            "color" => {
                if let Some(c) = Color::parse(value) {
                    self.color = c;
                }
            }
            "font-size" => {
                if let Some(px) = parse_length(value, em) {
                    self.font_size = px;
                }
            }
            "font-weight" => {
                self.bold = match value {
                    "bold" | "bolder" => true,
                    "normal" | "lighter" => false,
                    n => n.parse::<u16>().map(|w| w >= 600).unwrap_or(self.bold),
                };
            }
            "line-height" => {
                if let Ok(factor) = value.parse::<f32>() {
                    self.line_height = factor;
                } else if let Some(px) = parse_length(value, em) {
                    self.line_height = px / self.font_size.max(1.0);
                }
            }
            "text-align" => {
                self.text_align = match value {
                    "center" => TextAlign::Center,
                    "right" | "end" => TextAlign::Right,
                    _ => TextAlign::Left,
                };
            }
            "margin" => self.margin = parse_edges(value, em).unwrap_or(self.margin),
            "margin-top" => set_edge(&mut self.margin.top, value, em),
            "margin-right" => set_edge(&mut self.margin.right, value, em),
            "margin-bottom" => set_edge(&mut self.margin.bottom, value, em),
            "margin-left" => set_edge(&mut self.margin.left, value, em),
            "padding" => self.padding = parse_edges(value, em).unwrap_or(self.padding),
            "padding-top" => set_edge(&mut self.padding.top, value, em),
            "padding-right" => set_edge(&mut self.padding.right, value, em),
            "padding-bottom" => set_edge(&mut self.padding.bottom, value, em),
            "padding-left" => set_edge(&mut self.padding.left, value, em),
            "border" => {
                let (width, color) = parse_border(value, em);
                self.border = Edges { top: width, right: width, bottom: width, left: width };
                if let Some(c) = color {
                    self.border_color = c;
                }
            }
            "border-top" | "border-right" | "border-bottom" | "border-left" => {
                let (width, color) = parse_border(value, em);
                match prop {
                    "border-top" => self.border.top = width,
                    "border-right" => self.border.right = width,
                    "border-bottom" => self.border.bottom = width,
                    _ => self.border.left = width,
                }
                if let Some(c) = color {
                    self.border_color = c;
                }
            }
            "border-width" => self.border = parse_edges(value, em).unwrap_or(self.border),
            "border-color" => {
                if let Some(c) = Color::parse(value) {
                    self.border_color = c;
                }
            }
            "width" => self.width = parse_length(value, em),
            "height" => self.height = parse_length(value, em),
            "page-break-before" => self.break_before = value == "always" || value == "page",
            "break-before" => self.break_before = matches!(value, "page" | "always"),
            _ => {}
        }
    }
}

/// Parse a CSS length into px. Percentages and `auto` yield `None`.
pub fn parse_length(value: &str, em: f32) -> Option<f32> {
    let v = value.trim();
    if v == "0" {
        return Some(0.0);
    }
    let (number, factor) = if let Some(n) = v.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = v.strip_suffix("rem") {
        (n, 16.0)
    } else if let Some(n) = v.strip_suffix("em") {
        (n, em)
    } else if let Some(n) = v.strip_suffix("pt") {
        (n, PX_PER_PT)
    } else if let Some(n) = v.strip_suffix("in") {
        (n, 96.0)
    } else {
        (v, 1.0)
    };
    number.trim().parse::<f32>().ok().filter(|n| n.is_finite()).map(|n| n * factor)
}

fn set_edge(slot: &mut f32, value: &str, em: f32) {
    if let Some(px) = parse_length(value, em) {
        *slot = px;
    } else if value == "auto" {
        *slot = 0.0;
    }
}

fn parse_edges(value: &str, em: f32) -> Option<Edges> {
    let vals: Vec<f32> = value
        .split_whitespace()
        .map(|v| if v == "auto" { Some(0.0) } else { parse_length(v, em) })
        .collect::<Option<Vec<_>>>()?;
    let (top, right, bottom, left) = match vals.as_slice() {
        [a] => (*a, *a, *a, *a),
        [v, h] => (*v, *h, *v, *h),
        [t, h, b] => (*t, *h, *b, *h),
        [t, r, b, l] => (*t, *r, *b, *l),
        _ => return None,
    };
    Some(Edges { top, right, bottom, left })
}

fn parse_border(value: &str, em: f32) -> (f32, Option<Color>) {
    if value == "none" || value == "0" {
        return (0.0, None);
    }
    let mut width = 1.0;
    let mut color = None;
    for token in value.split_whitespace() {
        if let Some(px) = parse_length(token, em) {
            width = px;
        } else if let Some(c) = Color::parse(token) {
            color = Some(c);
        }
    }
    (width, color)
}
