/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Settings passed into each render call.


use super::style::{AutoColorPreset, StyleOverride};
use pgs::TICKS_PER_SECOND;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug, PartialEq)]
pub enum ConfigParseError {
    #[error("aspect ratio \"{value}\" is not of the form W:H with non-zero terms")]
    InvalidAspectRatio {
        value: String,
    },
    #[error("frame rate \"{value}\" is not a positive number or N/D fraction")]
    InvalidFrameRate {
        value: String,
    },
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum DynamicRange {
    #[default]
    Sdr,
    Hdr,
}

/// A frame rate kept as an exact fraction.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct FrameRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl FrameRate {

    pub const FILM: FrameRate = FrameRate { numerator: 24_000, denominator: 1_001 };

    /// The PCS frame rate code, stored in the high nibble.
    pub fn pcs_code(&self) -> u8 {

        let codes = [
            (24_000, 1_001, 0x10),
            (24, 1, 0x20),
            (25, 1, 0x30),
            (30_000, 1_001, 0x40),
            (30, 1, 0x50),
            (50, 1, 0x60),
            (60_000, 1_001, 0x70),
        ];

        codes.iter()
            .find(|(numerator, denominator, _)|
                *numerator as u64 * self.denominator as u64
                    == self.numerator as u64 * *denominator as u64
            )
            .map(|(_, _, code)| *code)
            .unwrap_or(0x10)
    }

    /// Snaps a millisecond timestamp to the nearest frame and returns that frame's start in
    /// 90 kHz ticks.
    pub fn snap(&self, ms: u64) -> u32 {

        let numerator = self.numerator.max(1) as u128;
        let denominator = self.denominator.max(1) as u128;
        let frame_divisor = 1_000 * denominator;
        let frames = (ms as u128 * numerator * 2 + frame_divisor) / (2 * frame_divisor);
        let ticks = (frames * TICKS_PER_SECOND as u128 * denominator * 2 + numerator)
            / (2 * numerator);

        ticks.min(u32::MAX as u128) as u32
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FILM
    }
}

impl FromStr for FrameRate {

    type Err = ConfigParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {

        let invalid = || ConfigParseError::InvalidFrameRate { value: value.to_string() };

        if let Some((numerator, denominator)) = value.split_once('/') {
            let numerator = numerator.trim().parse::<u32>().map_err(|_| invalid())?;
            let denominator = denominator.trim().parse::<u32>().map_err(|_| invalid())?;
            if numerator == 0 || denominator == 0 {
                return Err(invalid())
            }
            return Ok(FrameRate { numerator, denominator })
        }

        match value.trim() {
            "23.976" | "23.98" => Ok(FrameRate { numerator: 24_000, denominator: 1_001 }),
            "29.97" => Ok(FrameRate { numerator: 30_000, denominator: 1_001 }),
            "59.94" => Ok(FrameRate { numerator: 60_000, denominator: 1_001 }),
            other => {
                let fps = other.parse::<f64>().map_err(|_| invalid())?;
                if !(fps.is_finite() && fps > 0.0 && fps < 1_000.0) {
                    return Err(invalid())
                }
                Ok(FrameRate { numerator: (fps * 1_000.0).round() as u32, denominator: 1_000 })
            }
        }
    }
}

/// The ratio of a content box's width to its height.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {

    pub const WIDESCREEN: AspectRatio = AspectRatio { width: 16, height: 9 };

    pub fn as_f64(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

impl FromStr for AspectRatio {

    type Err = ConfigParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {

        let invalid = || ConfigParseError::InvalidAspectRatio { value: value.to_string() };
        let (width, height) = value.split_once(':').ok_or_else(invalid)?;

        if let (Ok(width), Ok(height)) = (width.trim().parse::<u32>(), height.trim().parse::<u32>()) {
            if width == 0 || height == 0 {
                return Err(invalid())
            }
            return Ok(AspectRatio { width, height })
        }

        let parse_term = |term: &str| {
            term.trim().parse::<f64>().ok().filter(|term| term.is_finite() && *term > 0.0)
        };
        let width = parse_term(width).ok_or_else(invalid)?;
        let height = parse_term(height).ok_or_else(invalid)?;

        // Fractional terms such as 2.39:1 are kept exact by scaling both.
        Ok(
            AspectRatio {
                width: (width * 100.0).round().max(1.0) as u32,
                height: (height * 100.0).round().max(1.0) as u32,
            }
        )
    }
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// What a metadata probe reports about the video the subtitles are made for.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct TargetVideoInfo {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub dynamic_range: DynamicRange,
    #[serde(default)]
    pub frame_rate: FrameRate,
}

impl Default for TargetVideoInfo {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            dynamic_range: DynamicRange::Sdr,
            frame_rate: FrameRate::FILM,
        }
    }
}

/// Options for one render pass.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Shifts every cue by this many milliseconds.
    pub offset_ms: i64,
    /// Skips cues the user has not selected.
    pub render_only_selected_cues: bool,
    /// Replaces document colors with a preset suited to the target's dynamic range.
    pub auto_color: bool,
    /// Treats the whole canvas as the content box regardless of the video's aspect ratio.
    pub force_16_9: bool,
    pub override_content_aspect_ratio: Option<AspectRatio>,
    /// Removes the temporary output file when a render fails or is cancelled.
    pub cleanup_temp_files: bool,
    pub canvas_width: u16,
    pub canvas_height: u16,
    /// Forced style attributes that beat everything else.
    pub overrides: StyleOverride,
    pub auto_color_sdr: AutoColorPreset,
    pub auto_color_hdr: AutoColorPreset,
}

impl RenderConfig {

    /// The auto-color preset to apply for a target, if auto-color is enabled.
    pub fn auto_color_preset(&self, dynamic_range: DynamicRange) -> Option<&AutoColorPreset> {

        if !self.auto_color {
            return None
        }

        match dynamic_range {
            DynamicRange::Sdr => Some(&self.auto_color_sdr),
            DynamicRange::Hdr => Some(&self.auto_color_hdr),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            offset_ms: 0,
            render_only_selected_cues: false,
            auto_color: false,
            force_16_9: false,
            override_content_aspect_ratio: None,
            cleanup_temp_files: true,
            canvas_width: 1920,
            canvas_height: 1080,
            overrides: StyleOverride::default(),
            auto_color_sdr: AutoColorPreset::SDR,
            auto_color_hdr: AutoColorPreset::HDR,
        }
    }
}

/// Lets another thread stop a batch between cues.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
