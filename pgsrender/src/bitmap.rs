/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

#[cfg(test)]
mod tests;

use super::{
    layout::Rect,
    style::Rgba,
};

/// An RGBA pixel buffer placed on the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgba>,
}

impl Bitmap {

    /// A fully transparent bitmap covering `rect`.
    pub fn new(rect: Rect) -> Self {

        let width = rect.width.max(0) as usize;
        let height = rect.height.max(0) as usize;

        Self {
            x: rect.x,
            y: rect.y,
            width,
            height,
            pixels: vec![Rgba::TRANSPARENT; width * height],
        }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width as i32,
            height: self.height as i32,
        }
    }

    /// The pixel at canvas coordinates, if the bitmap covers them.
    pub fn get(&self, x: i32, y: i32) -> Option<Rgba> {
        self.index(x, y).map(|index| self.pixels[index])
    }

    /// Draws `color` over the pixel at canvas coordinates; pixels outside are ignored.
    pub fn blend(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some(index) = self.index(x, y) {
            self.pixels[index] = color.over(self.pixels[index]);
        }
    }

    /// Draws another bitmap over this one.
    pub fn composite_over(&mut self, other: &Bitmap) {
        for row in 0..other.height {
            for column in 0..other.width {
                let color = other.pixels[row * other.width + column];
                if color.a > 0 {
                    self.blend(other.x + column as i32, other.y + row as i32, color);
                }
            }
        }
    }

    /// Shrinks the bitmap to the pixels that are not fully transparent, if there are any.
    pub fn crop_to_content(&self) -> Option<Bitmap> {

        let mut bounds: Option<(usize, usize, usize, usize)> = None;

        for row in 0..self.height {
            for column in 0..self.width {
                if self.pixels[row * self.width + column].a > 0 {
                    bounds = Some(match bounds {
                        Some((left, top, right, bottom)) => (
                            left.min(column),
                            top.min(row),
                            right.max(column),
                            bottom.max(row),
                        ),
                        None => (column, row, column, row),
                    });
                }
            }
        }

        bounds.map(|(left, top, right, bottom)| {
            self.extract(Rect {
                x: self.x + left as i32,
                y: self.y + top as i32,
                width: (right - left + 1) as i32,
                height: (bottom - top + 1) as i32,
            })
        })
    }

    /// Grows the bitmap so that its position and size are even. On a canvas with even
    /// dimensions the result never leaves the canvas.
    pub fn align_even(&self) -> Bitmap {

        let left = self.x - self.x.rem_euclid(2);
        let top = self.y - self.y.rem_euclid(2);
        let right = self.x + self.width as i32;
        let bottom = self.y + self.height as i32;

        self.extract(Rect {
            x: left,
            y: top,
            width: (right - left + 1) / 2 * 2,
            height: (bottom - top + 1) / 2 * 2,
        })
    }

    /// Copies the pixels inside `rect`; the parts `rect` adds are transparent.
    pub fn extract(&self, rect: Rect) -> Bitmap {

        let mut bitmap = Bitmap::new(rect);

        for row in 0..bitmap.height {
            for column in 0..bitmap.width {
                if let Some(color) = self.get(rect.x + column as i32, rect.y + row as i32) {
                    bitmap.pixels[row * bitmap.width + column] = color;
                }
            }
        }

        bitmap
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {

        let column = x - self.x;
        let row = y - self.y;

        if column < 0 || row < 0 || column as usize >= self.width || row as usize >= self.height {
            return None
        }

        Some(row as usize * self.width + column as usize)
    }
}
