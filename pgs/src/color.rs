/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Converts between the RGB space subtitles are drawn in and the limited-range YCbCr space PGS
//! palettes are stored in.

#[cfg(test)]
mod tests;

/// The matrix coefficients used to derive luma and chroma from RGB.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ColorMatrix {
    /// ITU-R BT.601, used for standard definition video.
    Bt601,
    /// ITU-R BT.709, used for high definition video.
    Bt709,
}

impl ColorMatrix {

    /// Selects the matrix a player assumes for a video of the given height.
    pub fn for_height(height: u16) -> Self {
        if height > 576 {
            Self::Bt709
        } else {
            Self::Bt601
        }
    }

    fn coefficients(&self) -> (f64, f64) {
        match self {
            Self::Bt601 => (0.299, 0.114),
            Self::Bt709 => (0.2126, 0.0722),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct YcbcrPixel {
    pub y: u8,
    pub cb: u8,
    pub cr: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RgbPixel {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

pub fn ycbcr_pixel(matrix: ColorMatrix, rgb: RgbPixel) -> YcbcrPixel {

    let (kr, kb) = matrix.coefficients();
    let red = rgb.red as f64 / 255.0;
    let green = rgb.green as f64 / 255.0;
    let blue = rgb.blue as f64 / 255.0;
    let luma = kr * red + (1.0 - kr - kb) * green + kb * blue;
    let pb = (blue - luma) / (2.0 * (1.0 - kb));
    let pr = (red - luma) / (2.0 * (1.0 - kr));

    YcbcrPixel {
        y: quantize(16.0 + 219.0 * luma, 16.0, 235.0),
        cb: quantize(128.0 + 224.0 * pb, 16.0, 240.0),
        cr: quantize(128.0 + 224.0 * pr, 16.0, 240.0),
    }
}

pub fn rgb_pixel(matrix: ColorMatrix, ycbcr: YcbcrPixel) -> RgbPixel {

    let (kr, kb) = matrix.coefficients();
    let luma = (ycbcr.y as f64 - 16.0) / 219.0;
    let pb = (ycbcr.cb as f64 - 128.0) / 224.0;
    let pr = (ycbcr.cr as f64 - 128.0) / 224.0;
    let red = luma + 2.0 * (1.0 - kr) * pr;
    let blue = luma + 2.0 * (1.0 - kb) * pb;
    let green = (luma - kr * red - kb * blue) / (1.0 - kr - kb);

    RgbPixel {
        red: quantize(red * 255.0, 0.0, 255.0),
        green: quantize(green * 255.0, 0.0, 255.0),
        blue: quantize(blue * 255.0, 0.0, 255.0),
    }
}

fn quantize(value: f64, min: f64, max: f64) -> u8 {
    value.max(min).min(max).round() as u8
}
