//! Style translation: CSS-like property maps to utility classes.
//!
//! Every property fed in ends up in exactly one place: as utility class
//! token(s) or verbatim in the residual inline-style map. Nothing is dropped.

use indexmap::{IndexMap, IndexSet};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::validate::{format_number, StyleValue};

lazy_static! {
    /// Keyword properties: `"property:value"` -> token.
    static ref KEYWORD_CLASSES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        // display
        m.insert("display:flex", "flex");
        m.insert("display:inline-flex", "inline-flex");
        m.insert("display:block", "block");
        m.insert("display:inline-block", "inline-block");
        m.insert("display:inline", "inline");
        m.insert("display:grid", "grid");
        m.insert("display:inline-grid", "inline-grid");
        m.insert("display:contents", "contents");
        m.insert("display:table", "table");
        m.insert("display:none", "hidden");
        // position
        m.insert("position:static", "static");
        m.insert("position:relative", "relative");
        m.insert("position:absolute", "absolute");
        m.insert("position:fixed", "fixed");
        m.insert("position:sticky", "sticky");
        // flex axis
        m.insert("flexDirection:row", "flex-row");
        m.insert("flexDirection:row-reverse", "flex-row-reverse");
        m.insert("flexDirection:column", "flex-col");
        m.insert("flexDirection:column-reverse", "flex-col-reverse");
        m.insert("flexWrap:wrap", "flex-wrap");
        m.insert("flexWrap:nowrap", "flex-nowrap");
        m.insert("flexWrap:wrap-reverse", "flex-wrap-reverse");
        // alignment
        m.insert("justifyContent:flex-start", "justify-start");
        m.insert("justifyContent:start", "justify-start");
        m.insert("justifyContent:flex-end", "justify-end");
        m.insert("justifyContent:end", "justify-end");
        m.insert("justifyContent:center", "justify-center");
        m.insert("justifyContent:space-between", "justify-between");
        m.insert("justifyContent:space-around", "justify-around");
        m.insert("justifyContent:space-evenly", "justify-evenly");
        m.insert("alignItems:flex-start", "items-start");
        m.insert("alignItems:start", "items-start");
        m.insert("alignItems:flex-end", "items-end");
        m.insert("alignItems:end", "items-end");
        m.insert("alignItems:center", "items-center");
        m.insert("alignItems:baseline", "items-baseline");
        m.insert("alignItems:stretch", "items-stretch");
        m.insert("alignSelf:auto", "self-auto");
        m.insert("alignSelf:flex-start", "self-start");
        m.insert("alignSelf:flex-end", "self-end");
        m.insert("alignSelf:center", "self-center");
        m.insert("alignSelf:stretch", "self-stretch");
        // text
        m.insert("textAlign:left", "text-left");
        m.insert("textAlign:center", "text-center");
        m.insert("textAlign:right", "text-right");
        m.insert("textAlign:justify", "text-justify");
        m.insert("textDecoration:underline", "underline");
        m.insert("textDecoration:line-through", "line-through");
        m.insert("textDecoration:none", "no-underline");
        m.insert("textTransform:uppercase", "uppercase");
        m.insert("textTransform:lowercase", "lowercase");
        m.insert("textTransform:capitalize", "capitalize");
        m.insert("fontWeight:normal", "font-normal");
        m.insert("fontWeight:bold", "font-bold");
        // overflow
        m.insert("overflow:auto", "overflow-auto");
        m.insert("overflow:hidden", "overflow-hidden");
        m.insert("overflow:visible", "overflow-visible");
        m.insert("overflow:scroll", "overflow-scroll");
        m.insert("overflowX:auto", "overflow-x-auto");
        m.insert("overflowX:hidden", "overflow-x-hidden");
        m.insert("overflowX:scroll", "overflow-x-scroll");
        m.insert("overflowY:auto", "overflow-y-auto");
        m.insert("overflowY:hidden", "overflow-y-hidden");
        m.insert("overflowY:scroll", "overflow-y-scroll");
        m
    };

    static ref FONT_WEIGHTS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("100", "font-thin");
        m.insert("200", "font-extralight");
        m.insert("300", "font-light");
        m.insert("400", "font-normal");
        m.insert("500", "font-medium");
        m.insert("600", "font-semibold");
        m.insert("700", "font-bold");
        m.insert("800", "font-extrabold");
        m.insert("900", "font-black");
        m
    };

    /// Pixel value -> spacing scale unit.
    static ref SPACING_SCALE: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("0", "0");
        m.insert("1", "px");
        m.insert("2", "0.5");
        m.insert("4", "1");
        m.insert("6", "1.5");
        m.insert("8", "2");
        m.insert("10", "2.5");
        m.insert("12", "3");
        m.insert("14", "3.5");
        m.insert("16", "4");
        m.insert("20", "5");
        m.insert("24", "6");
        m.insert("28", "7");
        m.insert("32", "8");
        m.insert("36", "9");
        m.insert("40", "10");
        m.insert("44", "11");
        m.insert("48", "12");
        m.insert("56", "14");
        m.insert("64", "16");
        m.insert("80", "20");
        m.insert("96", "24");
        m.insert("112", "28");
        m.insert("128", "32");
        m.insert("144", "36");
        m.insert("160", "40");
        m.insert("176", "44");
        m.insert("192", "48");
        m.insert("208", "52");
        m.insert("224", "56");
        m.insert("240", "60");
        m.insert("256", "64");
        m.insert("288", "72");
        m.insert("320", "80");
        m.insert("384", "96");
        m
    };

    /// Pixel value -> border radius suffix ("" is the bare `rounded`).
    static ref RADIUS_SCALE: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("0", "none");
        m.insert("2", "sm");
        m.insert("4", "");
        m.insert("6", "md");
        m.insert("8", "lg");
        m.insert("12", "xl");
        m.insert("16", "2xl");
        m.insert("24", "3xl");
        m.insert("9999", "full");
        m
    };

    static ref FONT_SIZES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("12", "text-xs");
        m.insert("14", "text-sm");
        m.insert("16", "text-base");
        m.insert("18", "text-lg");
        m.insert("20", "text-xl");
        m.insert("24", "text-2xl");
        m.insert("30", "text-3xl");
        m.insert("36", "text-4xl");
        m.insert("48", "text-5xl");
        m.insert("60", "text-6xl");
        m
    };

    static ref BORDER_WIDTHS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("0", "border-0");
        m.insert("1", "border");
        m.insert("2", "border-2");
        m.insert("4", "border-4");
        m.insert("8", "border-8");
        m
    };

    /// Closed hex -> color token table. Unlisted hex values stay inline.
    static ref COLOR_TOKENS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("#000000", "black");
        m.insert("#ffffff", "white");
        m.insert("#f9fafb", "gray-50");
        m.insert("#f3f4f6", "gray-100");
        m.insert("#e5e7eb", "gray-200");
        m.insert("#d1d5db", "gray-300");
        m.insert("#9ca3af", "gray-400");
        m.insert("#6b7280", "gray-500");
        m.insert("#4b5563", "gray-600");
        m.insert("#374151", "gray-700");
        m.insert("#1f2937", "gray-800");
        m.insert("#111827", "gray-900");
        m.insert("#fee2e2", "red-100");
        m.insert("#ef4444", "red-500");
        m.insert("#dc2626", "red-600");
        m.insert("#f97316", "orange-500");
        m.insert("#eab308", "yellow-500");
        m.insert("#dcfce7", "green-100");
        m.insert("#22c55e", "green-500");
        m.insert("#16a34a", "green-600");
        m.insert("#14b8a6", "teal-500");
        m.insert("#dbeafe", "blue-100");
        m.insert("#3b82f6", "blue-500");
        m.insert("#2563eb", "blue-600");
        m.insert("#1d4ed8", "blue-700");
        m.insert("#6366f1", "indigo-500");
        m.insert("#a855f7", "purple-500");
        m.insert("#ec4899", "pink-500");
        m
    };

    static ref PX_RE: Regex = Regex::new(r"^(-?\d+(?:\.\d+)?)(?:px)?$").unwrap();
    static ref HEX_RE: Regex = Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap();
    static ref CURSOR_RE: Regex = Regex::new(r"^[a-z][a-z-]*$").unwrap();
}

/// Accumulated translation result for one node (or a merged group).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleTranslator {
    classes: IndexSet<String>,
    custom_styles: IndexMap<String, StyleValue>,
    translated: IndexSet<String>,
}

impl StyleTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_styles(&mut self, styles: &IndexMap<String, StyleValue>) {
        for (property, value) in styles {
            self.add_style(property, value);
        }
    }

    pub fn add_style(&mut self, property: &str, value: &StyleValue) {
        let property = camel_case_property(property);
        match translate_property(&property, value) {
            Some(tokens) => {
                self.classes.extend(tokens);
                self.translated.insert(property);
            }
            None => {
                self.custom_styles.insert(property, value.clone());
            }
        }
    }

    /// Space-joined utility classes, in first-seen order without repeats.
    pub fn class_name(&self) -> String {
        self.classes.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    /// Properties with no utility equivalent, keyed by camelCase name.
    pub fn custom_styles(&self) -> &IndexMap<String, StyleValue> {
        &self.custom_styles
    }

    pub fn has_custom_styles(&self) -> bool {
        !self.custom_styles.is_empty()
    }

    /// Properties that became utility classes.
    pub fn translated_properties(&self) -> impl Iterator<Item = &str> {
        self.translated.iter().map(String::as_str)
    }

    pub fn merge(&mut self, other: &StyleTranslator) {
        self.classes.extend(other.classes.iter().cloned());
        self.translated.extend(other.translated.iter().cloned());
        for (property, value) in &other.custom_styles {
            self.custom_styles.insert(property.clone(), value.clone());
        }
    }

    pub fn clear(&mut self) {
        self.classes.clear();
        self.custom_styles.clear();
        self.translated.clear();
    }
}

/// `justify-content` -> `justifyContent`; camelCase input is returned as is.
/// Custom properties (`--brand`) are left untouched.
pub fn camel_case_property(property: &str) -> String {
    let property = property.trim();
    if property.starts_with("--") || !property.contains('-') {
        return property.to_string();
    }
    let mut out = String::with_capacity(property.len());
    let mut upper = false;
    for c in property.chars() {
        if c == '-' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Translate one camelCase property. `None` means "keep it inline".
pub fn translate_property(property: &str, value: &StyleValue) -> Option<Vec<String>> {
    let text = value.to_string();
    let text = text.trim();

    if let Some(token) = KEYWORD_CLASSES.get(format!("{}:{}", property, text).as_str()) {
        return Some(vec![token.to_string()]);
    }

    let single = |token: Option<String>| token.map(|t| vec![t]);

    match property {
        "fontWeight" => single(FONT_WEIGHTS.get(text).map(|t| t.to_string())),
        "fontSize" => single(
            parse_px(value).and_then(|px| FONT_SIZES.get(format_number(px).as_str()).map(|t| t.to_string())),
        ),
        "cursor" if CURSOR_RE.is_match(text) => Some(vec![format!("cursor-{}", text)]),
        "opacity" => single(opacity_class(value)),
        "zIndex" => single(z_index_class(text)),
        "margin" => single(spacing_class("m", value)),
        "marginTop" => single(spacing_class("mt", value)),
        "marginRight" => single(spacing_class("mr", value)),
        "marginBottom" => single(spacing_class("mb", value)),
        "marginLeft" => single(spacing_class("ml", value)),
        "padding" => single(spacing_class("p", value)),
        "paddingTop" => single(spacing_class("pt", value)),
        "paddingRight" => single(spacing_class("pr", value)),
        "paddingBottom" => single(spacing_class("pb", value)),
        "paddingLeft" => single(spacing_class("pl", value)),
        "gap" => single(spacing_class("gap", value)),
        "rowGap" => single(spacing_class("gap-y", value)),
        "columnGap" => single(spacing_class("gap-x", value)),
        "width" => single(size_class("w", value)),
        "height" => single(size_class("h", value)),
        "minHeight" => single(match text {
            "100vh" => Some("min-h-screen".to_string()),
            "100%" => Some("min-h-full".to_string()),
            _ => None,
        }),
        "color" => single(color_token(text).map(|t| format!("text-{}", t))),
        "backgroundColor" | "background" => single(color_token(text).map(|t| format!("bg-{}", t))),
        "borderColor" => single(color_token(text).map(|t| format!("border-{}", t))),
        "borderWidth" => single(
            parse_px(value).and_then(|px| BORDER_WIDTHS.get(format_number(px).as_str()).map(|t| t.to_string())),
        ),
        "borderRadius" => Some(vec![radius_class(value)]),
        _ => None,
    }
}

/// Pixel length of a value: bare numbers and `Npx` strings.
fn parse_px(value: &StyleValue) -> Option<f64> {
    match value {
        StyleValue::Number(n) if n.is_finite() => Some(*n),
        StyleValue::Number(_) => None,
        StyleValue::Text(s) => PX_RE
            .captures(s.trim())
            .and_then(|caps| caps[1].parse::<f64>().ok()),
    }
}

fn spacing_class(prefix: &str, value: &StyleValue) -> Option<String> {
    let is_margin = prefix.starts_with('m');
    if let StyleValue::Text(s) = value {
        if s.trim() == "auto" {
            return is_margin.then(|| format!("{}-auto", prefix));
        }
    }
    let px = parse_px(value)?;
    let unit = SPACING_SCALE.get(format_number(px.abs()).as_str())?;
    if px < 0.0 {
        is_margin.then(|| format!("-{}-{}", prefix, unit))
    } else {
        Some(format!("{}-{}", prefix, unit))
    }
}

fn size_class(prefix: &str, value: &StyleValue) -> Option<String> {
    if let StyleValue::Text(s) = value {
        let keyword = match s.trim() {
            "100%" => Some("full"),
            "auto" => Some("auto"),
            "100vw" | "100vh" | "100dvh" | "100svh" => Some("screen"),
            "50%" => Some("1/2"),
            "25%" => Some("1/4"),
            "75%" => Some("3/4"),
            "fit-content" => Some("fit"),
            "min-content" => Some("min"),
            "max-content" => Some("max"),
            _ => None,
        };
        if let Some(keyword) = keyword {
            return Some(format!("{}-{}", prefix, keyword));
        }
    }
    let px = parse_px(value)?;
    if px < 0.0 {
        return None;
    }
    SPACING_SCALE
        .get(format_number(px).as_str())
        .map(|unit| format!("{}-{}", prefix, unit))
}

fn opacity_class(value: &StyleValue) -> Option<String> {
    let fraction = value.as_number()?;
    if !(0.0..=1.0).contains(&fraction) {
        return None;
    }
    Some(format!("opacity-{}", (fraction * 100.0).round() as i64))
}

fn z_index_class(text: &str) -> Option<String> {
    match text {
        "auto" => Some("z-auto".to_string()),
        "0" | "10" | "20" | "30" | "40" | "50" => Some(format!("z-{}", text)),
        _ => None,
    }
}

fn radius_class(value: &StyleValue) -> String {
    if let StyleValue::Text(s) = value {
        if s.trim() == "50%" {
            return "rounded-full".to_string();
        }
    }
    match parse_px(value).and_then(|px| RADIUS_SCALE.get(format_number(px).as_str())) {
        Some(suffix) if suffix.is_empty() => "rounded".to_string(),
        Some(suffix) => format!("rounded-{}", suffix),
        None => "rounded".to_string(),
    }
}

fn color_token(text: &str) -> Option<&'static str> {
    match text {
        "transparent" => return Some("transparent"),
        "currentColor" | "currentcolor" => return Some("current"),
        "black" => return Some("black"),
        "white" => return Some("white"),
        _ => {}
    }
    if !HEX_RE.is_match(text) {
        return None;
    }
    COLOR_TOKENS.get(normalize_hex(text).as_str()).copied()
}

/// `#FFF` -> `#ffffff`.
fn normalize_hex(hex: &str) -> String {
    let digits = hex.trim_start_matches('#').to_ascii_lowercase();
    if digits.len() == 3 {
        let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
        format!("#{}", expanded)
    } else {
        format!("#{}", digits)
    }
}
