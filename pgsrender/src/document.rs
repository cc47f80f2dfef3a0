/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! The parsed subtitle document handed over by a TTML or WebVTT parser.

use super::style::StyleOverride;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ParsedSubtitleDocument {
    /// BCP 47 language of the text, passed through to the remuxer.
    pub language: Option<String>,
    /// Regions keyed by the ID cues refer to them with.
    pub regions: BTreeMap<String, Region>,
    /// The document's default style, the lowest precedence layer.
    pub default_style: StyleOverride,
    /// Cues in document order.
    pub cues: Vec<RawCue>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RawCue {
    pub start_ms: i64,
    pub end_ms: i64,
    pub runs: Vec<RawRun>,
    /// `None` places the cue in the default region.
    pub region: Option<String>,
    /// Overrides the region's writing mode.
    pub writing_mode: Option<WritingMode>,
    pub style: StyleOverride,
    pub selected: bool,
}

impl Default for RawCue {
    fn default() -> Self {
        Self {
            start_ms: 0,
            end_ms: 0,
            runs: vec![],
            region: None,
            writing_mode: None,
            style: StyleOverride::default(),
            selected: true,
        }
    }
}

/// A span of text sharing one style. Line breaks are `\n`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RawRun {
    pub text: String,
    pub style: StyleOverride,
    /// Ruby text annotating this run.
    pub ruby: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingMode {
    #[default]
    Horizontal,
    /// Top to bottom columns, progressing right to left.
    Vertical,
    /// Top to bottom columns, progressing left to right.
    VerticalLr,
}

/// Alignment along the inline axis (horizontal text: left to right).
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Start,
    #[default]
    Center,
    End,
}

/// Alignment along the block axis (horizontal text: top to bottom).
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayAlign {
    Before,
    Center,
    #[default]
    After,
}

/// A rectangular placement area.
///
/// Position and size are percentages of the content box. The offsets are canvas pixels added
/// afterwards, so they stay put when the content box changes with the aspect ratio.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub text_align: TextAlign,
    pub display_align: DisplayAlign,
    pub writing_mode: WritingMode,
    /// Stacking order; higher is drawn on top.
    pub z_index: i32,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            x: 10.0,
            y: 10.0,
            width: 80.0,
            height: 80.0,
            offset_x: 0,
            offset_y: 0,
            text_align: TextAlign::Center,
            display_align: DisplayAlign::After,
            writing_mode: WritingMode::Horizontal,
            z_index: 0,
        }
    }
}
