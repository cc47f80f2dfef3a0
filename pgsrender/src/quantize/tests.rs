/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use proptest::prelude::*;

fn bitmap_from(width: usize, pixels: Vec<Rgba>) -> Bitmap {
    Bitmap {
        x: 20,
        y: 30,
        width,
        height: pixels.len() / width,
        pixels,
    }
}

#[test]
fn test_exact_palette_order() {

    let red = Rgba::rgb(255, 0, 0);
    let blue = Rgba::rgb(0, 0, 255);
    let green = Rgba::rgb(0, 255, 0);
    let bitmap = bitmap_from(4, vec![
        Rgba::TRANSPARENT, red, red, red,
        blue, green, blue, Rgba::TRANSPARENT,
    ]);
    let quantized = quantize(&bitmap);
    let image = &quantized.image;

    assert_eq!(quantized.reduced_from, None);
    assert_eq!(image.palette, vec![Rgba::TRANSPARENT, red, blue, green]);
    assert_eq!(image.lines().unwrap(), vec![vec![0, 1, 1, 1], vec![2, 3, 2, 0]]);
    assert_eq!(image.rect(), Rect { x: 20, y: 30, width: 4, height: 2 });
    assert_eq!(image.to_bitmap().unwrap(), bitmap);
}

#[test]
fn test_invisible_colors_are_transparent() {

    let bitmap = bitmap_from(2, vec![Rgba { r: 255, g: 255, b: 255, a: 0 }, Rgba::WHITE]);
    let image = quantize(&bitmap).image;

    assert_eq!(image.palette, vec![Rgba::TRANSPARENT, Rgba::WHITE]);
    assert_eq!(image.lines().unwrap(), vec![vec![0, 1]]);
}

#[test]
fn test_reduction() {

    let mut pixels = (0..1_000_u32)
        .map(|value| Rgba {
            r: (value % 256) as u8,
            g: (value / 256 * 64) as u8,
            b: 128,
            a: 255,
        })
        .collect::<Vec<Rgba>>();

    pixels.extend([Rgba::TRANSPARENT; 1_000]);

    let bitmap = bitmap_from(100, pixels);
    let quantized = quantize(&bitmap);
    let image = &quantized.image;
    let restored = image.to_bitmap().unwrap();

    assert_eq!(quantized.reduced_from, Some(1_000));
    assert!(image.palette.len() <= MAX_COLORS + 1);
    assert_eq!(image.palette[0], Rgba::TRANSPARENT);

    for (original, restored) in bitmap.pixels.iter().zip(restored.pixels.iter()) {
        if original.a == 0 {
            assert_eq!(*restored, Rgba::TRANSPARENT);
        } else {
            assert!((original.r as i32 - restored.r as i32).abs() <= 16);
            assert!((original.g as i32 - restored.g as i32).abs() <= 16);
            assert_eq!(restored.b, 128);
            assert_eq!(restored.a, 255);
        }
    }
}

#[test]
fn test_reduction_is_deterministic() {

    let pixels = (0..4_096_u32)
        .map(|value| Rgba {
            r: (value * 7 % 256) as u8,
            g: (value * 13 % 256) as u8,
            b: (value % 64) as u8,
            a: (value % 200 + 56) as u8,
        })
        .collect::<Vec<Rgba>>();
    let bitmap = bitmap_from(64, pixels);

    assert_eq!(quantize(&bitmap), quantize(&bitmap.clone()));
}

proptest! {

    #[test]
    fn test_quantize_is_deterministic_and_lossless(
        width in 1_usize..24,
        seeds in proptest::collection::vec(0_u8..6, 1..400),
    ) {

        let pixels = seeds.iter()
            .take(seeds.len() / width * width)
            .map(|seed| match seed {
                0 => Rgba::TRANSPARENT,
                seed => Rgba { r: seed * 40, g: 255 - seed * 30, b: 7, a: seed * 42 },
            })
            .collect::<Vec<Rgba>>();

        prop_assume!(!pixels.is_empty());

        let bitmap = bitmap_from(width, pixels);
        let first = quantize(&bitmap);
        let second = quantize(&bitmap);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.image.to_bitmap().unwrap(), bitmap);
    }
}
