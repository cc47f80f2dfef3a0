/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Layered text styles.
//!
//! A style is assembled from several [`StyleOverride`] layers, each of which only sets the
//! attributes it cares about. Layers are merged highest precedence first:
//!
//! 1. global forced overrides from the render configuration
//! 2. the auto-color preset for the target's dynamic range, when enabled
//! 3. the run's own style, then the cue's style
//! 4. the document's default style
//!
//! Whatever is still unset afterwards takes the built-in defaults, yielding a flat
//! [`ResolvedStyle`].


use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};
use thiserror::Error as ThisError;

/// Font size used when no layer sets one.
pub const DEFAULT_FONT_SIZE: FontSize = FontSize::Vh(4.5);

/// Distance between consecutive baselines, relative to the font size.
pub const LINE_HEIGHT: f32 = 1.25;

#[derive(ThisError, Debug, PartialEq)]
pub enum StyleParseError {
    #[error("color \"{value}\" is not of the form #RRGGBB or #RRGGBBAA")]
    InvalidColor {
        value: String,
    },
    #[error("font size \"{value}\" is not a number followed by px, vh, rh, or em")]
    InvalidFontSize {
        value: String,
    },
}

/// A straight (non-premultiplied) RGBA color.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {

    pub const TRANSPARENT: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0 };
    pub const BLACK: Rgba = Rgba { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Rgba = Rgba { r: 255, g: 255, b: 255, a: 255 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// The same color with its alpha scaled by `factor`.
    pub fn with_opacity(self, factor: f32) -> Self {
        Self {
            a: (self.a as f32 * factor.clamp(0.0, 1.0)).round() as u8,
            ..self
        }
    }

    /// Draws `self` over `below`.
    pub fn over(self, below: Rgba) -> Rgba {

        if self.a == 255 || below.a == 0 {
            return self
        }
        if self.a == 0 {
            return below
        }

        let sa = self.a as u32;
        let da = below.a as u32 * (255 - sa) / 255;
        let out_a = sa + da;
        let blend = |s: u8, d: u8| ((s as u32 * sa + d as u32 * da + out_a / 2) / out_a) as u8;

        Rgba {
            r: blend(self.r, below.r),
            g: blend(self.g, below.g),
            b: blend(self.b, below.b),
            a: out_a as u8,
        }
    }
}

impl FromStr for Rgba {

    type Err = StyleParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {

        let invalid = || StyleParseError::InvalidColor { value: value.to_string() };
        let hex = value.strip_prefix('#').ok_or_else(invalid)?;

        if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
            return Err(invalid())
        }

        let channel = |index: usize| {
            u8::from_str_radix(&hex[index..index + 2], 16).map_err(|_| invalid())
        };

        Ok(
            Rgba {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: if hex.len() == 8 { channel(6)? } else { 255 },
            }
        )
    }
}

impl TryFrom<String> for Rgba {

    type Error = StyleParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

impl Display for Rgba {

    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {

        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

/// A font size and the unit it is measured in.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum FontSize {
    /// Canvas pixels.
    Px(f32),
    /// Percent of the content box height.
    Vh(f32),
    /// Percent of the region height.
    Rh(f32),
    /// Multiples of the default font size.
    Em(f32),
}

impl FontSize {

    /// The size in canvas pixels.
    pub fn resolve(&self, content_height: f32, region_height: f32) -> f32 {
        match *self {
            FontSize::Px(px) => px,
            FontSize::Vh(vh) => vh * content_height / 100.0,
            FontSize::Rh(rh) => rh * region_height / 100.0,
            FontSize::Em(em) => em * DEFAULT_FONT_SIZE.resolve(content_height, region_height),
        }
    }
}

impl FromStr for FontSize {

    type Err = StyleParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {

        let trimmed = value.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(split);
        let size = number.trim().parse::<f32>()
            .ok()
            .filter(|size| size.is_finite() && *size >= 0.0)
            .ok_or_else(|| StyleParseError::InvalidFontSize { value: value.to_string() })?;

        match unit {
            "" | "px" => Ok(FontSize::Px(size)),
            "vh" => Ok(FontSize::Vh(size)),
            "rh" => Ok(FontSize::Rh(size)),
            "em" => Ok(FontSize::Em(size)),
            _ => Err(StyleParseError::InvalidFontSize { value: value.to_string() }),
        }
    }
}

impl TryFrom<String> for FontSize {

    type Error = StyleParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FontSize> for String {
    fn from(size: FontSize) -> Self {
        match size {
            FontSize::Px(px) => format!("{}px", px),
            FontSize::Vh(vh) => format!("{}vh", vh),
            FontSize::Rh(rh) => format!("{}rh", rh),
            FontSize::Em(em) => format!("{}em", em),
        }
    }
}

/// A border drawn around every glyph.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Outline {
    pub color: Rgba,
    /// Thickness in canvas pixels; zero disables the outline.
    pub width: u32,
}

impl Default for Outline {
    fn default() -> Self {
        Self { color: Rgba::BLACK, width: 3 }
    }
}

/// A copy of the glyphs (and their outline) drawn offset beneath them.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Shadow {
    pub color: Rgba,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl Default for Shadow {
    fn default() -> Self {
        Self { color: Rgba::BLACK, offset_x: 2, offset_y: 2 }
    }
}

/// One layer of style attributes; unset attributes fall through to lower layers.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct StyleOverride {
    pub color: Option<Rgba>,
    /// Multiplies the alpha of every layer of the glyphs, `0.0` to `1.0`.
    pub opacity: Option<f32>,
    pub font_size: Option<FontSize>,
    pub outline: Option<Outline>,
    pub shadow: Option<Shadow>,
    /// Whether the auto-color preset may replace the color of this text.
    pub auto_color: Option<bool>,
}

impl StyleOverride {

    /// Fills every attribute this layer leaves unset from `lower`.
    pub fn or(&self, lower: &StyleOverride) -> StyleOverride {
        StyleOverride {
            color: self.color.or(lower.color),
            opacity: self.opacity.or(lower.opacity),
            font_size: self.font_size.or(lower.font_size),
            outline: self.outline.or(lower.outline),
            shadow: self.shadow.or(lower.shadow),
            auto_color: self.auto_color.or(lower.auto_color),
        }
    }

    /// Merges layers given highest precedence first.
    pub fn layered<'a, I>(layers: I) -> StyleOverride where
        I: IntoIterator<Item = &'a StyleOverride>,
    {
        layers.into_iter().fold(StyleOverride::default(), |merged, layer| merged.or(layer))
    }
}

/// The color an enabled auto-color pass forces onto text.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct AutoColorPreset {
    pub color: Rgba,
    pub opacity: f32,
}

impl AutoColorPreset {

    /// Full white at full opacity.
    pub const SDR: AutoColorPreset = AutoColorPreset {
        color: Rgba::WHITE,
        opacity: 1.0,
    };

    /// Mid-gray at 90% opacity, so that text does not glare on HDR displays.
    pub const HDR: AutoColorPreset = AutoColorPreset {
        color: Rgba::rgb(0xA1, 0xA1, 0xA1),
        opacity: 0.9,
    };

    fn as_override(&self) -> StyleOverride {
        StyleOverride {
            color: Some(self.color),
            opacity: Some(self.opacity),
            ..Default::default()
        }
    }
}

/// A style with every attribute decided.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedStyle {
    pub color: Rgba,
    pub opacity: f32,
    pub font_size: FontSize,
    pub outline: Outline,
    pub shadow: Option<Shadow>,
}

impl ResolvedStyle {

    /// Resolves the style of a run of text.
    ///
    /// `local` holds the run and cue layers, highest precedence first. The auto-color preset
    /// ranks below the global overrides but above everything local, so colors carried by the
    /// document give way to it. An explicit global color switches the preset off entirely,
    /// opacity included.
    pub fn resolve(
        global: &StyleOverride,
        auto_color: Option<&AutoColorPreset>,
        local: &[&StyleOverride],
        defaults: &StyleOverride,
    ) -> ResolvedStyle {

        let below_auto = StyleOverride::layered(local.iter().copied().chain([defaults]));
        let auto_layer = auto_color
            .filter(|_| global.color.is_none())
            .filter(|_| global.auto_color.or(below_auto.auto_color).unwrap_or(true))
            .map(AutoColorPreset::as_override)
            .unwrap_or_default();
        let merged = StyleOverride::layered([global, &auto_layer, &below_auto]);

        ResolvedStyle {
            color: merged.color.unwrap_or(Rgba::WHITE),
            opacity: merged.opacity.unwrap_or(1.0).clamp(0.0, 1.0),
            font_size: merged.font_size.unwrap_or(DEFAULT_FONT_SIZE),
            outline: merged.outline.unwrap_or_default(),
            shadow: Some(merged.shadow.unwrap_or_default()).filter(|shadow|
                shadow.offset_x != 0 || shadow.offset_y != 0
            ),
        }
    }

    /// The fill color with opacity applied.
    pub fn fill(&self) -> Rgba {
        self.color.with_opacity(self.opacity)
    }
}
