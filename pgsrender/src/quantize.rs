/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Reduces RGBA bitmaps to palette-indexed, run-length encoded images.
//!
//! Index 0 is reserved for full transparency. A bitmap with at most 255 other colors is
//! converted losslessly; anything more goes through a weighted median cut. Both paths are
//! deterministic: ties are always broken by color value, never by hash order.

#[cfg(test)]
mod tests;

use super::{
    bitmap::Bitmap,
    layout::Rect,
    style::Rgba,
};
use pgs::rle::{self, DecodeResult};
use std::collections::BTreeMap;
use tracing::debug;

/// The most colors a palette holds besides the transparent entry.
pub const MAX_COLORS: usize = 255;

/// A palette-indexed image placed on the canvas.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct IndexedImage {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
    /// Entry 0 is always fully transparent.
    pub palette: Vec<Rgba>,
    /// Rows of palette indices, run-length encoded.
    pub data: Vec<u8>,
}

impl IndexedImage {

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width as i32,
            height: self.height as i32,
        }
    }

    /// Decodes the rows of palette indices.
    pub fn lines(&self) -> DecodeResult<Vec<Vec<u8>>> {
        rle::decode(&self.data, self.width as usize, self.height as usize)
    }

    /// Expands the image back into RGBA.
    pub fn to_bitmap(&self) -> DecodeResult<Bitmap> {

        let lines = self.lines()?;
        let mut bitmap = Bitmap::new(self.rect());

        bitmap.pixels = lines.iter()
            .flatten()
            .map(|&index| self.palette.get(index as usize).copied().unwrap_or(Rgba::TRANSPARENT))
            .collect();

        Ok(bitmap)
    }
}

/// The result of quantizing one bitmap.
#[derive(Clone, Debug, PartialEq)]
pub struct Quantized {
    pub image: IndexedImage,
    /// The number of distinct colors, when it had to be reduced.
    pub reduced_from: Option<usize>,
}

/// Converts a bitmap into an indexed image.
pub fn quantize(bitmap: &Bitmap) -> Quantized {

    let mut counts = BTreeMap::<Rgba, usize>::new();

    for &color in bitmap.pixels.iter().filter(|color| color.a > 0) {
        *counts.entry(color).or_insert(0) += 1;
    }

    let distinct = counts.len();
    let (palette, lookup) = if distinct <= MAX_COLORS {
        exact_palette(counts)
    } else {
        debug!("Reducing {} colors to a {}-color palette.", distinct, MAX_COLORS);
        reduced_palette(counts)
    };
    let indices = bitmap.pixels.iter()
        .map(|color| if color.a == 0 { 0 } else { lookup.get(color).copied().unwrap_or(0) })
        .collect::<Vec<u8>>();

    Quantized {
        image: IndexedImage {
            x: bitmap.x,
            y: bitmap.y,
            width: bitmap.width as u16,
            height: bitmap.height as u16,
            palette,
            data: rle::encode(&indices, bitmap.width),
        },
        reduced_from: (distinct > MAX_COLORS).then(|| distinct),
    }
}

/// Most frequent colors first, so the common ones get the short literal encodings.
fn exact_palette(counts: BTreeMap<Rgba, usize>) -> (Vec<Rgba>, BTreeMap<Rgba, u8>) {

    let mut colors = counts.into_iter().collect::<Vec<(Rgba, usize)>>();

    colors.sort_by(|(a, a_count), (b, b_count)| b_count.cmp(a_count).then(a.cmp(b)));

    let palette = [Rgba::TRANSPARENT].into_iter()
        .chain(colors.iter().map(|(color, _)| *color))
        .collect::<Vec<Rgba>>();
    let lookup = colors.iter()
        .enumerate()
        .map(|(index, (color, _))| (*color, index as u8 + 1))
        .collect();

    (palette, lookup)
}

fn channel(color: &Rgba, channel: usize) -> u8 {
    match channel {
        0 => color.r,
        1 => color.g,
        2 => color.b,
        _ => color.a,
    }
}

/// The channel with the largest spread and the spread itself.
fn widest_channel(colors: &[(Rgba, usize)]) -> (usize, u8) {
    (0..4)
        .map(|index| {
            let values = colors.iter().map(|(color, _)| channel(color, index));
            let min = values.clone().min().unwrap_or(0);
            let max = values.max().unwrap_or(0);
            (index, max - min)
        })
        .fold((0, 0), |widest, candidate| if candidate.1 > widest.1 { candidate } else { widest })
}

fn reduced_palette(counts: BTreeMap<Rgba, usize>) -> (Vec<Rgba>, BTreeMap<Rgba, u8>) {

    let mut boxes = vec![counts.into_iter().collect::<Vec<(Rgba, usize)>>()];

    while boxes.len() < MAX_COLORS {

        let widest = boxes.iter()
            .enumerate()
            .filter(|(_, colors)| colors.len() > 1)
            .map(|(index, colors)| (index, widest_channel(colors)))
            .max_by(|(a_index, (_, a_range)), (b_index, (_, b_range))|
                a_range.cmp(b_range).then(b_index.cmp(a_index))
            );
        let (index, split_channel) = match widest {
            Some((index, (split_channel, _))) => (index, split_channel),
            None => break,
        };
        let mut colors = boxes.remove(index);

        colors.sort_by_key(|(color, _)| (channel(color, split_channel), *color));

        let total = colors.iter().map(|(_, count)| count).sum::<usize>();
        let mut accumulated = 0;
        let mut split = 1;

        for (position, (_, count)) in colors.iter().enumerate() {
            accumulated += count;
            if accumulated * 2 >= total {
                split = (position + 1).clamp(1, colors.len() - 1);
                break
            }
        }

        let upper = colors.split_off(split);

        boxes.push(colors);
        boxes.push(upper);
    }

    let mut representatives = boxes.iter()
        .map(|colors| {
            let total = colors.iter().map(|(_, count)| *count as u64).sum::<u64>().max(1);
            let mean = |index: usize| {
                let sum = colors.iter()
                    .map(|(color, count)| channel(color, index) as u64 * *count as u64)
                    .sum::<u64>();
                ((sum + total / 2) / total) as u8
            };
            (Rgba { r: mean(0), g: mean(1), b: mean(2), a: mean(3).max(1) }, total, colors)
        })
        .collect::<Vec<(Rgba, u64, &Vec<(Rgba, usize)>)>>();

    representatives.sort_by(|(a, a_total, _), (b, b_total, _)| b_total.cmp(a_total).then(a.cmp(b)));

    let palette = [Rgba::TRANSPARENT].into_iter()
        .chain(representatives.iter().map(|(color, _, _)| *color))
        .collect::<Vec<Rgba>>();
    let lookup = representatives.iter()
        .enumerate()
        .flat_map(|(index, (_, _, colors))|
            colors.iter().map(move |(color, _)| (*color, index as u8 + 1))
        )
        .collect();

    (palette, lookup)
}
