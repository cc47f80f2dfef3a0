/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;

#[test]
fn test_crop_to_content() {

    let mut bitmap = Bitmap::new(Rect { x: 100, y: 50, width: 20, height: 10 });

    assert_eq!(bitmap.crop_to_content(), None);

    bitmap.blend(105, 52, Rgba::WHITE);
    bitmap.blend(110, 56, Rgba::BLACK);

    let cropped = bitmap.crop_to_content().unwrap();

    assert_eq!(cropped.rect(), Rect { x: 105, y: 52, width: 6, height: 5 });
    assert_eq!(cropped.get(105, 52), Some(Rgba::WHITE));
    assert_eq!(cropped.get(110, 56), Some(Rgba::BLACK));
    assert_eq!(cropped.get(106, 52), Some(Rgba::TRANSPARENT));
}

#[test]
fn test_align_even() {

    let mut bitmap = Bitmap::new(Rect { x: 101, y: 51, width: 3, height: 4 });

    bitmap.blend(101, 51, Rgba::WHITE);

    let aligned = bitmap.align_even();

    assert_eq!(aligned.rect(), Rect { x: 100, y: 50, width: 4, height: 6 });
    assert_eq!(aligned.get(101, 51), Some(Rgba::WHITE));
    assert_eq!(aligned.get(100, 50), Some(Rgba::TRANSPARENT));
}

#[test]
fn test_align_even_keeps_even_bitmaps() {

    let bitmap = Bitmap::new(Rect { x: 10, y: 20, width: 30, height: 40 });

    assert_eq!(bitmap.align_even(), bitmap);
}

#[test]
fn test_composite_over() {

    let mut below = Bitmap::new(Rect { x: 0, y: 0, width: 4, height: 4 });
    let mut above = Bitmap::new(Rect { x: 2, y: 2, width: 4, height: 4 });

    below.blend(2, 2, Rgba::rgb(255, 0, 0));
    below.blend(0, 0, Rgba::rgb(0, 255, 0));
    above.blend(2, 2, Rgba { r: 0, g: 0, b: 255, a: 255 });
    above.blend(3, 3, Rgba { r: 0, g: 0, b: 255, a: 128 });
    below.composite_over(&above);

    assert_eq!(below.get(0, 0), Some(Rgba::rgb(0, 255, 0)));
    assert_eq!(below.get(2, 2), Some(Rgba::rgb(0, 0, 255)));
    assert_eq!(below.get(3, 3), Some(Rgba { r: 0, g: 0, b: 255, a: 128 }));
    assert_eq!(below.get(5, 5), None);
}
