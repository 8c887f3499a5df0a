//! Declarative content pages.
//!
//! A page is an ordered list of elements loaded from configuration. At render
//! time each element's data-store key is looked up; absent keys fall back to
//! the element's static label. Unknown element types and icon names are
//! logged and skipped.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use log::warn;
use serde::{Deserialize, Deserializer};

use super::icons::{self, IconKind};
use super::store::{DataStore, KEY_CHARGING, is_truthy};
use crate::font::FontId;
use crate::graphics::Rgba;
use crate::graphics::color::{COLOR_ACCENT, COLOR_TEXT};

// ---------------------------------------------------------------------------
// Page model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageSpec {
    pub name: String,
    #[serde(default)]
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Text(TextElement),
    Icon(IconElement),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextElement {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub font: FontId,
    #[serde(default = "default_text_color", deserialize_with = "de_color")]
    pub color: Rgba,
    /// Data store key supplying the value
    #[serde(default)]
    pub key: Option<String>,
    /// Shown when the key is absent or unset
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IconElement {
    pub x: i32,
    pub y: i32,
    pub name: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default = "default_icon_size")]
    pub size: u32,
    #[serde(default = "default_icon_color", deserialize_with = "de_color")]
    pub color: Rgba,
}

fn default_text_color() -> Rgba {
    COLOR_TEXT
}

fn default_icon_color() -> Rgba {
    COLOR_ACCENT
}

fn default_icon_size() -> u32 {
    12
}

fn de_color<'de, D>(deserializer: D) -> Result<Rgba, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    Rgba::from_hex(&text)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid colour {text:?}")))
}

impl PageSpec {
    /// Status page used when the configuration defines none.
    pub fn builtin_status() -> Self {
        let text = |y: i32, label: &str, key: &str| {
            Element::Text(TextElement {
                x: 12,
                y,
                font: FontId::Medium,
                color: COLOR_TEXT,
                key: Some(key.into()),
                label: "--".into(),
                prefix: format!("{label:<8}"),
                suffix: String::new(),
                align: Align::Left,
            })
        };
        Self {
            name: "status".into(),
            elements: vec![
                Element::Text(TextElement {
                    x: 12,
                    y: 8,
                    font: FontId::Large,
                    color: COLOR_ACCENT,
                    key: Some("hostname".into()),
                    label: "gatepanel".into(),
                    prefix: String::new(),
                    suffix: String::new(),
                    align: Align::Left,
                }),
                text(44, "Uptime", "uptime"),
                text(64, "Load", "loadavg"),
                text(84, "Memory", "memory"),
                text(104, "Network", "network"),
                text(124, "Battery", "battery_percent"),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Draw `page` with current store values. Returns how many elements were
/// skipped.
pub fn render_page<D>(page: &PageSpec, store: &DataStore, target: &mut D) -> Result<usize, D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let mut skipped = 0;
    for (i, element) in page.elements.iter().enumerate() {
        match element {
            Element::Text(text) => draw_text(text, store, target)?,
            Element::Icon(icon) => {
                if !draw_icon(icon, store, target)? {
                    warn!(
                        "Page {}: unknown icon {:?} skipped (element {})",
                        page.name, icon.name, i
                    );
                    skipped += 1;
                }
            }
            Element::Unknown => {
                warn!("Page {}: unknown element type skipped (element {})", page.name, i);
                skipped += 1;
            }
        }
    }
    Ok(skipped)
}

fn draw_text<D>(text: &TextElement, store: &DataStore, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let value = text
        .key
        .as_deref()
        .and_then(|key| store.get(key))
        .unwrap_or_else(|| text.label.clone());
    let line = format!("{}{}{}", text.prefix, value, text.suffix);

    let face = text.font.face();
    let width = face.measure(&line) as i32;
    let x = match text.align {
        Align::Left => text.x,
        Align::Center => text.x - width / 2,
        Align::Right => text.x - width,
    };
    face.draw(&line, Point::new(x, text.y), text.color, target)
}

/// Returns `Ok(false)` for an unknown icon name.
fn draw_icon<D>(icon: &IconElement, store: &DataStore, target: &mut D) -> Result<bool, D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let Some(kind) = IconKind::from_name(&icon.name) else {
        return Ok(false);
    };
    let origin = Point::new(icon.x, icon.y);
    let value = icon.key.as_deref().and_then(|key| store.get(key));
    // Flag icons without a key are always shown.
    let flag = icon.key.is_none() || value.as_deref().is_some_and(is_truthy);

    match kind {
        IconKind::Battery => icons::draw_battery(
            target,
            origin,
            icon.size,
            value.and_then(|v| v.trim().parse().ok()),
            store.get_flag(KEY_CHARGING),
            icon.color,
        )?,
        IconKind::Signal => icons::draw_signal(
            target,
            origin,
            icon.size,
            value.and_then(|v| v.trim().parse().ok()),
            icon.color,
        )?,
        IconKind::Dot => icons::draw_dot(target, origin, icon.size, flag, icon.color)?,
        IconKind::Bolt if flag => icons::draw_bolt(target, origin, icon.size, icon.color)?,
        IconKind::Warning if flag => icons::draw_warning(target, origin, icon.size, icon.color)?,
        IconKind::Bolt | IconKind::Warning => {}
    }
    Ok(true)
}
