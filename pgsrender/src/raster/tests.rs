/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use crate::{
    font::BlockGlyphs,
    layout::{PlacedGlyph, Rect},
    style::{FontSize, Outline, Shadow, StyleOverride},
};

fn plain_style() -> ResolvedStyle {
    ResolvedStyle::resolve(
        &StyleOverride {
            outline: Some(Outline { color: Rgba::BLACK, width: 0 }),
            shadow: Some(Shadow { color: Rgba::BLACK, offset_x: 0, offset_y: 0 }),
            ..Default::default()
        },
        None,
        &[],
        &StyleOverride::default(),
    )
}

fn laid_out(text: &str, style: ResolvedStyle, clip: Option<Rect>) -> LaidOutCue {
    LaidOutCue {
        cue: 0,
        clip,
        glyphs: text.chars().enumerate().map(|(index, ch)| PlacedGlyph {
            ch,
            px: 20.0,
            x: 10.0 + 10.0 * index as f32,
            baseline: 50.0,
            run: 0,
        }).collect(),
        styles: vec![style],
        overflow: None,
    }
}

fn full_canvas() -> Option<Rect> {
    Some(Rect { x: 0, y: 0, width: 200, height: 100 })
}

#[test]
fn test_single_glyph() {

    let bitmap = rasterize(&laid_out("A", plain_style(), full_canvas()), &BlockGlyphs).unwrap();

    assert_eq!(bitmap.rect(), Rect { x: 10, y: 36, width: 10, height: 14 });
    assert_eq!(bitmap.get(11, 36), Some(Rgba::WHITE));
    assert_eq!(bitmap.get(18, 49), Some(Rgba::WHITE));
    assert_eq!(bitmap.get(10, 36), Some(Rgba::TRANSPARENT));
    assert_eq!(bitmap.get(19, 36), Some(Rgba::TRANSPARENT));
}

#[test]
fn test_outline_and_shadow_layers() {

    let style = ResolvedStyle {
        outline: Outline { color: Rgba::rgb(0, 0, 255), width: 1 },
        shadow: Some(Shadow { color: Rgba::rgb(255, 0, 0), offset_x: 2, offset_y: 2 }),
        ..plain_style()
    };
    let bitmap = rasterize(&laid_out("A", style, full_canvas()), &BlockGlyphs).unwrap();

    assert_eq!(bitmap.get(12, 40), Some(Rgba::WHITE));
    assert_eq!(bitmap.get(10, 40), Some(Rgba::rgb(0, 0, 255)));
    assert_eq!(bitmap.get(20, 52), Some(Rgba::rgb(255, 0, 0)));
    assert_eq!(bitmap.x % 2, 0);
    assert_eq!(bitmap.y % 2, 0);
    assert_eq!(bitmap.width % 2, 0);
    assert_eq!(bitmap.height % 2, 0);
}

#[test]
fn test_opacity_scales_alpha() {

    let style = ResolvedStyle { opacity: 0.5, ..plain_style() };
    let bitmap = rasterize(&laid_out("A", style, full_canvas()), &BlockGlyphs).unwrap();

    assert_eq!(bitmap.get(12, 40), Some(Rgba { a: 128, ..Rgba::WHITE }));
}

#[test]
fn test_clipped_to_region() {

    let clip = Some(Rect { x: 0, y: 40, width: 14, height: 60 });
    let bitmap = rasterize(&laid_out("AB", plain_style(), clip), &BlockGlyphs).unwrap();

    assert_eq!(bitmap.rect(), Rect { x: 10, y: 40, width: 4, height: 10 });
}

#[test]
fn test_nothing_visible() {
    assert_eq!(rasterize(&laid_out("   ", plain_style(), full_canvas()), &BlockGlyphs), None);
    assert_eq!(rasterize(&laid_out("A", plain_style(), None), &BlockGlyphs), None);
}

#[test]
fn test_styles_follow_runs() {

    let mut cue = laid_out("AB", plain_style(), full_canvas());

    cue.styles.push(ResolvedStyle {
        color: Rgba::rgb(255, 255, 0),
        font_size: FontSize::Px(20.0),
        ..plain_style()
    });
    cue.glyphs[1].run = 1;

    let bitmap = rasterize(&cue, &BlockGlyphs).unwrap();

    assert_eq!(bitmap.get(12, 40), Some(Rgba::WHITE));
    assert_eq!(bitmap.get(22, 40), Some(Rgba::rgb(255, 255, 0)));
}

#[test]
fn test_outline_limited_to_glyph_size() {

    let mask = Mask { x: 0, y: 0, width: 3, height: 2, coverage: vec![255; 6] };
    let dilated = mask.dilate(u32::MAX);

    assert_eq!((dilated.x, dilated.y), (-3, -3));
    assert_eq!((dilated.width, dilated.height), (9, 8));
    assert_eq!(dilated.coverage.len(), 72);

    let style = ResolvedStyle {
        outline: Outline { color: Rgba::BLACK, width: u32::MAX },
        ..plain_style()
    };
    let bitmap = rasterize(&laid_out("A", style, full_canvas()), &BlockGlyphs).unwrap();

    assert!(bitmap.width <= 200);
    assert_eq!(bitmap.get(2, 40), Some(Rgba::BLACK));
}
