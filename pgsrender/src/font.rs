/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Glyph sources for layout and rasterization.


use fontdue::{Font, FontSettings};
use std::{
    fs,
    io::Error as IoError,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;
use tracing::debug;

pub type FontResult<T> = Result<T, FontError>;

#[derive(ThisError, Debug)]
pub enum FontError {
    #[error("could not read font file {path:?}")]
    IoError {
        path: PathBuf,
        source: IoError,
    },
    #[error("could not parse font: {message}")]
    ParseError {
        message: String,
    },
    #[error("no fonts were given")]
    NoFonts,
}

/// Placement of a rasterized glyph relative to its pen position on the baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphMetrics {
    /// Offset from the pen position to the left edge of the coverage bitmap.
    pub xmin: i32,
    /// Offset from the baseline up to the bottom edge of the coverage bitmap.
    pub ymin: i32,
    pub width: usize,
    pub height: usize,
    pub advance_width: f32,
}

/// Vertical extent of a line set in one font size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineMetrics {
    /// Distance from the baseline up to the top of the tallest glyphs.
    pub ascent: f32,
    /// Distance from the baseline down to the bottom of the lowest glyphs, negative.
    pub descent: f32,
}

impl LineMetrics {
    pub fn height(&self) -> f32 {
        self.ascent - self.descent
    }
}

/// Anything that can measure and draw characters.
pub trait GlyphSource: Sync {

    fn line_metrics(&self, px: f32) -> LineMetrics;

    /// How far the pen moves after drawing `ch`.
    fn advance(&self, ch: char, px: f32) -> f32;

    /// Draws `ch`, returning its metrics and an 8-bit coverage bitmap, row by row.
    fn rasterize(&self, ch: char, px: f32) -> (GlyphMetrics, Vec<u8>);
}

/// An ordered list of fonts; each character is drawn with the first font that has it.
pub struct FontStack {
    fonts: Vec<Font>,
}

impl FontStack {

    pub fn from_bytes(fonts: Vec<Vec<u8>>) -> FontResult<Self> {

        if fonts.is_empty() {
            return Err(FontError::NoFonts)
        }

        let fonts = fonts.into_iter()
            .map(|data| Font::from_bytes(data, FontSettings::default())
                .map_err(|message| FontError::ParseError { message: message.to_string() })
            )
            .collect::<FontResult<Vec<Font>>>()?;

        Ok(Self { fonts })
    }

    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> FontResult<Self> {

        let fonts = paths.iter()
            .map(|path| {
                debug!("Loading font {:?}.", path.as_ref());
                fs::read(path).map_err(|source| FontError::IoError {
                    path: path.as_ref().to_path_buf(),
                    source,
                })
            })
            .collect::<FontResult<Vec<Vec<u8>>>>()?;

        Self::from_bytes(fonts)
    }

    fn font_for(&self, ch: char) -> &Font {
        self.fonts.iter()
            .find(|font| font.lookup_glyph_index(ch) != 0)
            .unwrap_or(&self.fonts[0])
    }
}

impl GlyphSource for FontStack {

    fn line_metrics(&self, px: f32) -> LineMetrics {
        match self.fonts[0].horizontal_line_metrics(px) {
            Some(metrics) => LineMetrics {
                ascent: metrics.ascent,
                descent: metrics.descent,
            },
            None => LineMetrics {
                ascent: px * 0.8,
                descent: px * -0.2,
            },
        }
    }

    fn advance(&self, ch: char, px: f32) -> f32 {
        self.font_for(ch).metrics(ch, px).advance_width
    }

    fn rasterize(&self, ch: char, px: f32) -> (GlyphMetrics, Vec<u8>) {

        let (metrics, coverage) = self.font_for(ch).rasterize(ch, px);

        (
            GlyphMetrics {
                xmin: metrics.xmin,
                ymin: metrics.ymin,
                width: metrics.width,
                height: metrics.height,
                advance_width: metrics.advance_width,
            },
            coverage,
        )
    }
}

/// Draws every visible character as a solid box, so that renders are predictable without any
/// font file.
#[cfg(test)]
pub(crate) struct BlockGlyphs;

#[cfg(test)]
impl GlyphSource for BlockGlyphs {

    fn line_metrics(&self, px: f32) -> LineMetrics {
        LineMetrics {
            ascent: px * 0.8,
            descent: px * -0.2,
        }
    }

    fn advance(&self, ch: char, px: f32) -> f32 {
        if crate::layout::is_wide(ch) { px } else { (px * 0.5).round() }
    }

    fn rasterize(&self, ch: char, px: f32) -> (GlyphMetrics, Vec<u8>) {

        let advance_width = self.advance(ch, px);

        if ch.is_whitespace() {
            return (GlyphMetrics { advance_width, ..Default::default() }, vec![])
        }

        let width = (advance_width as usize).saturating_sub(2).max(1);
        let height = (px * 0.7).round().max(1.0) as usize;

        (
            GlyphMetrics {
                xmin: 1,
                ymin: 0,
                width,
                height,
                advance_width,
            },
            vec![255; width * height],
        )
    }
}
