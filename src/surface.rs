//! In-memory SVG drawing surface.
//!
//! Elements live in an arena and are addressed by [`ElementId`]. Region
//! paths drawn by the basemap are registered by name so overlays can find
//! them in constant time.

use std::collections::HashMap;
use std::fmt::Write;

/// Handle to an element on a [`Surface`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementId(usize);

#[derive(Clone, Debug)]
struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    text: Option<String>,
    children: Vec<ElementId>,
}

impl Element {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }
}

/// A drawing surface that serializes to a standalone SVG document
#[derive(Clone, Debug)]
pub struct Surface {
    width: f64,
    height: f64,
    elements: Vec<Element>,
    styles: Vec<String>,
    region_index: HashMap<String, Vec<ElementId>>,
    region_order: Vec<String>,
}

/// Chained attribute setter returned by [`Surface::append`]
pub struct ElementMut<'a> {
    surface: &'a mut Surface,
    id: ElementId,
}

impl ElementMut<'_> {
    pub fn attr(self, key: &'static str, value: impl ToString) -> Self {
        self.surface.set_attr(self.id, key, value);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.surface.elements[self.id.0].text = Some(text.into());
        self
    }

    pub fn id(&self) -> ElementId {
        self.id
    }
}

impl Surface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: vec![Element::new("svg")],
            styles: Vec::new(),
            region_index: HashMap::new(),
            region_order: Vec::new(),
        }
    }

    /// A surface that only says the chart could not be drawn
    pub fn placeholder(width: f64, height: f64, title: &str, reason: &str) -> Self {
        let mut surface = Self::new(width, height);
        let root = surface.root();
        surface
            .append(root, "rect")
            .attr("class", "placeholder")
            .attr("width", num(width))
            .attr("height", num(height))
            .attr("fill", "#eeeeee");
        surface
            .append(root, "text")
            .attr("x", num(width / 2.0))
            .attr("y", num(height / 2.0))
            .attr("text-anchor", "middle")
            .attr("font-size", "14px")
            .attr("fill", "#555555")
            .text(format!("{title}: data unavailable"));
        surface
            .append(root, "text")
            .attr("x", num(width / 2.0))
            .attr("y", num(height / 2.0 + 18.0))
            .attr("text-anchor", "middle")
            .attr("font-size", "10px")
            .attr("fill", "#888888")
            .text(reason);
        surface
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    pub fn append(&mut self, parent: ElementId, tag: &'static str) -> ElementMut<'_> {
        let id = ElementId(self.elements.len());
        self.elements.push(Element::new(tag));
        self.elements[parent.0].children.push(id);
        ElementMut { surface: self, id }
    }

    /// Append a `<g class=..>` and return its id
    pub fn group(&mut self, parent: ElementId, class: &str) -> ElementId {
        self.append(parent, "g").attr("class", class).id()
    }

    /// Insert a new element as the first child so it paints underneath siblings
    pub fn prepend(&mut self, parent: ElementId, tag: &'static str) -> ElementMut<'_> {
        let id = ElementId(self.elements.len());
        self.elements.push(Element::new(tag));
        self.elements[parent.0].children.insert(0, id);
        ElementMut { surface: self, id }
    }

    pub fn set_attr(&mut self, id: ElementId, key: &'static str, value: impl ToString) {
        let value = value.to_string();
        let attrs = &mut self.elements[id.0].attrs;
        match attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => attrs.push((key, value)),
        }
    }

    pub fn attr(&self, id: ElementId, key: &str) -> Option<&str> {
        self.elements[id.0]
            .attrs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        self.elements[id.0].text = Some(text.into());
    }

    pub fn tag(&self, id: ElementId) -> &'static str {
        self.elements[id.0].tag
    }

    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.elements[id.0].text.as_deref()
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.elements[id.0].children
    }

    /// All elements with a given tag, in creation order
    pub fn find_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = ElementId> + 'a {
        self.elements
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.tag == tag)
            .map(|(i, _)| ElementId(i))
    }

    /// All elements whose `class` attribute contains `class`
    pub fn find_by_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = ElementId> + 'a {
        (0..self.elements.len()).map(ElementId).filter(move |&id| {
            self.attr(id, "class")
                .is_some_and(|c| c.split_whitespace().any(|c| c == class))
        })
    }

    pub fn add_style(&mut self, css: impl Into<String>) {
        self.styles.push(css.into());
    }

    /// Register a region path under its name for later lookup. A region
    /// split over several features keeps one path per feature.
    pub fn tag_region(&mut self, name: &str, id: ElementId) {
        let paths = self.region_index.entry(name.to_string()).or_default();
        if paths.is_empty() {
            self.region_order.push(name.to_string());
        }
        paths.push(id);
    }

    /// First path tagged with `name`
    pub fn region(&self, name: &str) -> Option<ElementId> {
        self.region_paths(name).first().copied()
    }

    /// Every path tagged with `name`, in drawing order
    pub fn region_paths(&self, name: &str) -> &[ElementId] {
        self.region_index.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Region names in drawing order
    pub fn region_names(&self) -> &[String] {
        &self.region_order
    }

    /// Restyle every path of one tagged region; returns false for unknown names
    pub fn set_region_style(&mut self, name: &str, fill: &str, stroke: &str) -> bool {
        let paths = self.region_paths(name).to_vec();
        for &id in &paths {
            self.set_attr(id, "fill", fill);
            self.set_attr(id, "stroke", stroke);
        }
        !paths.is_empty()
    }

    /// Drop all stylesheet rules, e.g. inherited hover rules on a copied surface
    pub fn clear_styles(&mut self) {
        self.styles.clear();
    }

    /// Serialize to a standalone SVG document
    pub fn to_svg(&self) -> String {
        let mut out = String::with_capacity(self.elements.len() * 64);
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 {} {}""#,
            num(self.width),
            num(self.height)
        );
        write_attrs(&mut out, &self.elements[0].attrs);
        out.push('>');
        if !self.styles.is_empty() {
            out.push_str("<style>");
            for css in &self.styles {
                out.push_str(&escape(css));
            }
            out.push_str("</style>");
        }
        for &child in &self.elements[0].children {
            self.write_element(&mut out, child);
        }
        out.push_str("</svg>\n");
        out
    }

    fn write_element(&self, out: &mut String, id: ElementId) {
        let element = &self.elements[id.0];
        out.push('<');
        out.push_str(element.tag);
        write_attrs(out, &element.attrs);
        if element.children.is_empty() && element.text.is_none() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &element.text {
            out.push_str(&escape(text));
        }
        for &child in &element.children {
            self.write_element(out, child);
        }
        let _ = write!(out, "</{}>", element.tag);
    }
}

fn write_attrs(out: &mut String, attrs: &[(&'static str, String)]) {
    for (key, value) in attrs {
        let _ = write!(out, r#" {key}="{}""#, escape(value));
    }
}

/// XML-escape text and attribute values
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Compact number formatting for coordinates (at most 3 decimals)
pub fn num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_format() {
        assert_eq!(num(12.0), "12");
        assert_eq!(num(12.5), "12.5");
        assert_eq!(num(1.23456), "1.235");
        assert_eq!(num(-0.0001), "0");
        assert_eq!(num(f64::NAN), "0");
    }

    #[test]
    fn test_serialize_nested() {
        let mut s = Surface::new(10.0, 20.0);
        let root = s.root();
        let g = s.group(root, "layer");
        s.append(g, "circle").attr("r", 4).attr("fill", "red");
        s.append(g, "text").text("a < b & \"c\"");
        let svg = s.to_svg();
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains(r#"viewBox="0 0 10 20""#));
        assert!(svg.contains(r#"<g class="layer"><circle r="4" fill="red"/>"#));
        assert!(svg.contains("a &lt; b &amp; &quot;c&quot;"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_set_attr_overwrites() {
        let mut s = Surface::new(1.0, 1.0);
        let root = s.root();
        let id = s.append(root, "rect").attr("fill", "red").id();
        s.set_attr(id, "fill", "blue");
        assert_eq!(s.attr(id, "fill"), Some("blue"));
        assert_eq!(s.to_svg().matches("fill=").count(), 1);
    }

    #[test]
    fn test_region_index() {
        let mut s = Surface::new(1.0, 1.0);
        let root = s.root();
        let a = s.append(root, "path").id();
        s.tag_region("Region A", a);
        assert_eq!(s.region("Region A"), Some(a));
        assert!(s.set_region_style("Region A", "#f00", "#000"));
        assert!(!s.set_region_style("Nowhere", "#f00", "#000"));
        assert_eq!(s.attr(a, "fill"), Some("#f00"));
        assert_eq!(s.region_names(), ["Region A".to_string()]);
    }

    #[test]
    fn test_region_split_over_features_keeps_every_path() {
        let mut s = Surface::new(1.0, 1.0);
        let root = s.root();
        let mainland = s.append(root, "path").id();
        let island = s.append(root, "path").id();
        s.tag_region("Yangon", mainland);
        s.tag_region("Yangon", island);
        assert_eq!(s.region("Yangon"), Some(mainland));
        assert_eq!(s.region_paths("Yangon"), [mainland, island]);
        assert_eq!(s.region_names(), ["Yangon".to_string()]);
        assert!(s.set_region_style("Yangon", "#f00", "#000"));
        assert_eq!(s.attr(mainland, "fill"), Some("#f00"));
        assert_eq!(s.attr(island, "fill"), Some("#f00"));
    }

    #[test]
    fn test_prepend_paints_first() {
        let mut s = Surface::new(1.0, 1.0);
        let root = s.root();
        s.append(root, "circle");
        let band = s.prepend(root, "rect").id();
        assert_eq!(s.children(root)[0], band);
    }

    #[test]
    fn test_placeholder_mentions_unavailable() {
        let s = Surface::placeholder(100.0, 50.0, "Waffle", "file missing");
        let svg = s.to_svg();
        assert!(svg.contains("Waffle: data unavailable"));
        assert!(svg.contains("file missing"));
        assert_eq!(s.find_by_class("placeholder").count(), 1);
    }
}
