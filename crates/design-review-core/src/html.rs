//! Lightweight markup inspection used by the category checkers.
//!
//! Operates on the visible HTML returned by the browser bridge. This is
//! pattern matching over serialized markup, not a DOM: it only needs to be
//! good enough to count headings, unlabeled controls and inline styles.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex pattern"))
}

/// An element matched in markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Opening tag as written, e.g. `<img src="a.png">`.
    pub open_tag: String,
    pub attrs: BTreeMap<String, String>,

    /// Inner markup; empty for void elements.
    pub inner: String,
}

impl Element {
    fn from_open_tag(open_tag: &str, inner: &str) -> Self {
        Self {
            open_tag: open_tag.to_string(),
            attrs: attributes(open_tag),
            inner: inner.to_string(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Accessible name from `aria-label`, `aria-labelledby` or `title`.
    pub fn has_aria_name(&self) -> bool {
        ["aria-label", "aria-labelledby", "title"]
            .iter()
            .any(|a| self.attr(a).is_some_and(|v| !v.trim().is_empty()))
    }

    /// Text content with tags removed and whitespace collapsed.
    pub fn text(&self) -> String {
        strip_tags(&self.inner)
    }
}

/// Parse the attributes of an opening tag. Keys are lowercased; boolean
/// attributes map to an empty string.
pub fn attributes(open_tag: &str) -> BTreeMap<String, String> {
    static TAG_NAME: OnceLock<Regex> = OnceLock::new();
    static ATTR: OnceLock<Regex> = OnceLock::new();

    let body = cached(&TAG_NAME, r"^<\s*[A-Za-z][A-Za-z0-9-]*").replace(open_tag, "");
    let body = body.trim_end_matches('>').trim_end_matches('/');

    cached(
        &ATTR,
        r#"([A-Za-z_:@][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#,
    )
    .captures_iter(body)
    .map(|c| {
        let value = c
            .get(2)
            .or_else(|| c.get(3))
            .or_else(|| c.get(4))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        (c[1].to_ascii_lowercase(), value)
    })
    .collect()
}

/// Void elements such as `img` or `input`.
pub fn void_elements(html: &str, tag: VoidTag) -> Vec<Element> {
    static IMG: OnceLock<Regex> = OnceLock::new();
    static CONTROL: OnceLock<Regex> = OnceLock::new();
    static META: OnceLock<Regex> = OnceLock::new();
    static HTML_OPEN: OnceLock<Regex> = OnceLock::new();

    let re = match tag {
        VoidTag::Img => cached(&IMG, r"(?i)<img\b[^>]*>"),
        VoidTag::FormControl => cached(&CONTROL, r"(?i)<(?:input|select|textarea)\b[^>]*>"),
        VoidTag::Meta => cached(&META, r"(?i)<meta\b[^>]*>"),
        VoidTag::Html => cached(&HTML_OPEN, r"(?i)<html\b[^>]*>"),
    };
    re.find_iter(html)
        .map(|m| Element::from_open_tag(m.as_str(), ""))
        .collect()
}

/// Paired elements with inner content, such as `a` or `button`.
pub fn paired_elements(html: &str, tag: PairedTag) -> Vec<Element> {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    static BUTTON: OnceLock<Regex> = OnceLock::new();
    static FORM: OnceLock<Regex> = OnceLock::new();
    static LABEL: OnceLock<Regex> = OnceLock::new();

    let re = match tag {
        PairedTag::Anchor => cached(&ANCHOR, r"(?is)(<a\b[^>]*>)(.*?)</a\s*>"),
        PairedTag::Button => cached(&BUTTON, r"(?is)(<button\b[^>]*>)(.*?)</button\s*>"),
        PairedTag::Form => cached(&FORM, r"(?is)(<form\b[^>]*>)(.*?)</form\s*>"),
        PairedTag::Label => cached(&LABEL, r"(?is)(<label\b[^>]*>)(.*?)</label\s*>"),
    };
    re.captures_iter(html)
        .map(|c| Element::from_open_tag(&c[1], &c[2]))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoidTag {
    Img,
    /// `input`, `select` and `textarea`.
    FormControl,
    Meta,
    Html,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairedTag {
    Anchor,
    Button,
    Form,
    Label,
}

/// Heading levels (1–6) in document order.
pub fn heading_levels(html: &str) -> Vec<u8> {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    cached(&HEADING, r"(?i)<h([1-6])\b")
        .captures_iter(html)
        .filter_map(|c| c[1].parse().ok())
        .collect()
}

/// Hex colours used in inline styles and style blocks, normalized to
/// lowercase six-digit form, in first-seen order.
pub fn style_colors(html: &str) -> Vec<String> {
    static COLOR: OnceLock<Regex> = OnceLock::new();
    let mut colors: Vec<String> = Vec::new();
    for c in cached(
        &COLOR,
        r"(?i)(?:color|background(?:-color)?|border(?:-color)?|fill|stroke)\s*:\s*(#[0-9a-f]{6}|#[0-9a-f]{3})\b",
    )
    .captures_iter(html)
    {
        let color = normalize_hex(&c[1]);
        if !colors.contains(&color) {
            colors.push(color);
        }
    }
    colors
}

/// Primary font families declared via `font-family`, in first-seen order.
pub fn font_families(html: &str) -> Vec<String> {
    static FONT: OnceLock<Regex> = OnceLock::new();
    let mut fonts: Vec<String> = Vec::new();
    for c in cached(&FONT, r#"(?i)font-family\s*:\s*([^;}"<>]+)"#).captures_iter(html) {
        let primary = c[1]
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_matches(|ch| ch == '\'' || ch == '"')
            .to_string();
        if !primary.is_empty() && !fonts.contains(&primary) {
            fonts.push(primary);
        }
    }
    fonts
}

/// Expand `#abc` to `#aabbcc` and lowercase.
pub fn normalize_hex(color: &str) -> String {
    let hex = color.trim().trim_start_matches('#').to_ascii_lowercase();
    if hex.len() == 3 {
        let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
        format!("#{expanded}")
    } else {
        format!("#{hex}")
    }
}

/// Remove scripts, styles and tags; collapse whitespace.
pub fn strip_tags(html: &str) -> String {
    static BLOCKS: OnceLock<Regex> = OnceLock::new();
    static TAGS: OnceLock<Regex> = OnceLock::new();
    let without_blocks =
        cached(&BLOCKS, r"(?is)<(script|style)\b[^>]*>.*?</(?:script|style)\s*>").replace_all(html, " ");
    let text = cached(&TAGS, r"(?s)<[^>]*>").replace_all(&without_blocks, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
