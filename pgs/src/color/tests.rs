/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;

#[test]
fn test_reference_colors() {

    let white = RgbPixel { red: 255, green: 255, blue: 255 };
    let black = RgbPixel { red: 0, green: 0, blue: 0 };

    for matrix in [ColorMatrix::Bt601, ColorMatrix::Bt709] {
        assert_eq!(ycbcr_pixel(matrix, white), YcbcrPixel { y: 235, cb: 128, cr: 128 });
        assert_eq!(ycbcr_pixel(matrix, black), YcbcrPixel { y: 16, cb: 128, cr: 128 });
    }
}

#[test]
fn test_matrix_for_height() {
    assert_eq!(ColorMatrix::for_height(480), ColorMatrix::Bt601);
    assert_eq!(ColorMatrix::for_height(576), ColorMatrix::Bt601);
    assert_eq!(ColorMatrix::for_height(1080), ColorMatrix::Bt709);
}

#[test]
fn test_grays_survive_conversion() {

    for value in 0..=255 {

        let gray = RgbPixel { red: value, green: value, blue: value };
        let cycled = rgb_pixel(ColorMatrix::Bt709, ycbcr_pixel(ColorMatrix::Bt709, gray));

        assert!((cycled.red as i16 - value as i16).abs() <= 1);
        assert_eq!(cycled.red, cycled.green);
        assert_eq!(cycled.green, cycled.blue);
    }
}

#[test]
fn test_every_sampled_rgb_combination() {

    for matrix in [ColorMatrix::Bt601, ColorMatrix::Bt709] {
        for red in (0..=255).step_by(15) {
            for green in (0..=255).step_by(15) {
                for blue in (0..=255).step_by(15) {

                    let rgb = RgbPixel { red, green, blue };
                    let cycled = rgb_pixel(matrix, ycbcr_pixel(matrix, rgb));

                    assert!((cycled.red as i16 - red as i16).abs() <= 3);
                    assert!((cycled.green as i16 - green as i16).abs() <= 3);
                    assert!((cycled.blue as i16 - blue as i16).abs() <= 3);
                }
            }
        }
    }
}
