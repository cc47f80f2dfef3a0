/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Draws laid out cues into RGBA bitmaps.
//!
//! Each glyph is drawn in three layers: its shadow, then its outline, then its fill. Every
//! layer of every glyph is finished before the next layer starts, so outlines never cover a
//! neighbouring glyph's fill. Anti-aliasing goes into the alpha channel only; the background
//! stays fully transparent.

#[cfg(test)]
mod tests;

use super::{
    bitmap::Bitmap,
    font::GlyphSource,
    layout::LaidOutCue,
    style::{ResolvedStyle, Rgba},
};

struct Mask {
    x: i32,
    y: i32,
    width: usize,
    height: usize,
    coverage: Vec<u8>,
}

impl Mask {

    /// Grows the mask by `radius` pixels in every direction. The radius is limited to the
    /// mask's own size.
    fn dilate(&self, radius: u32) -> Mask {

        let radius = radius.min(self.width.max(self.height) as u32);

        if radius == 0 {
            return Mask { coverage: self.coverage.clone(), ..*self }
        }

        let r = radius as i32;
        let width = self.width + 2 * radius as usize;
        let height = self.height + 2 * radius as usize;
        let offsets = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
            .collect::<Vec<(i32, i32)>>();
        let mut coverage = vec![0_u8; width * height];

        for row in 0..self.height as i32 {
            for column in 0..self.width as i32 {
                let value = self.coverage[row as usize * self.width + column as usize];
                if value == 0 {
                    continue
                }
                for (dx, dy) in offsets.iter() {
                    let index = (row + r + dy) as usize * width + (column + r + dx) as usize;
                    coverage[index] = coverage[index].max(value);
                }
            }
        }

        Mask {
            x: self.x - r,
            y: self.y - r,
            width,
            height,
            coverage,
        }
    }

    fn paint(&self, bitmap: &mut Bitmap, color: Rgba, offset_x: i32, offset_y: i32) {

        if color.a == 0 {
            return
        }

        for row in 0..self.height {
            for column in 0..self.width {
                let value = self.coverage[row * self.width + column];
                if value == 0 {
                    continue
                }
                let alpha = (color.a as u32 * value as u32 + 127) / 255;
                bitmap.blend(
                    self.x + column as i32 + offset_x,
                    self.y + row as i32 + offset_y,
                    Rgba { a: alpha as u8, ..color },
                );
            }
        }
    }
}

/// Draws a cue, returning a bitmap cropped to what was drawn and aligned to even pixels, or
/// `None` when nothing visible was drawn.
pub fn rasterize(cue: &LaidOutCue, glyphs: &dyn GlyphSource) -> Option<Bitmap> {

    let clip = cue.clip?;
    let mut bitmap = Bitmap::new(clip);
    let masks = cue.glyphs.iter()
        .filter_map(|glyph| {
            let (metrics, coverage) = glyphs.rasterize(glyph.ch, glyph.px);
            if metrics.width == 0 || metrics.height == 0 {
                return None
            }
            let mask = Mask {
                x: glyph.x.round() as i32 + metrics.xmin,
                y: glyph.baseline.round() as i32 - (metrics.ymin + metrics.height as i32),
                width: metrics.width,
                height: metrics.height,
                coverage,
            };
            Some((mask, &cue.styles[glyph.run]))
        })
        .collect::<Vec<(Mask, &ResolvedStyle)>>();
    let outlined = masks.iter()
        .map(|(mask, style)| mask.dilate(style.outline.width))
        .collect::<Vec<Mask>>();

    for ((_, style), outline) in masks.iter().zip(outlined.iter()) {
        if let Some(shadow) = style.shadow {
            outline.paint(
                &mut bitmap,
                shadow.color.with_opacity(style.opacity),
                shadow.offset_x,
                shadow.offset_y,
            );
        }
    }
    for ((_, style), outline) in masks.iter().zip(outlined.iter()) {
        if style.outline.width > 0 {
            outline.paint(&mut bitmap, style.outline.color.with_opacity(style.opacity), 0, 0);
        }
    }
    for (mask, style) in masks.iter() {
        mask.paint(&mut bitmap, style.fill(), 0, 0);
    }

    bitmap.crop_to_content().map(|bitmap| bitmap.align_even())
}
