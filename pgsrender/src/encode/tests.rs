/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use pgs::{
    decoder::window_write_ticks,
    displayset::ReadDisplaySetExt,
    segment::{ReadSegmentExt, Segment},
};
use std::io::Cursor;

const FPS_25: FrameRate = FrameRate { numerator: 25, denominator: 1 };

fn settings() -> EncoderSettings {
    EncoderSettings {
        width: 1920,
        height: 1080,
        frame_rate: FPS_25,
    }
}

fn image(x: i32, y: i32, width: i32, height: i32, color: Rgba) -> IndexedImage {

    let mut bitmap = Bitmap::new(Rect { x, y, width, height });

    bitmap.pixels.fill(color);

    quantize(&bitmap).image
}

fn frame(cue: usize, start_ms: u64, end_ms: u64, image: IndexedImage) -> CueFrame {
    CueFrame {
        cue,
        start_ms,
        end_ms,
        z_index: 0,
        region: image.rect(),
        image: Some(image),
    }
}

const TOP: Rect = Rect { x: 192, y: 54, width: 1536, height: 200 };
const BOTTOM: Rect = Rect { x: 192, y: 826, width: 1536, height: 200 };

fn in_region(region: Rect, cue: usize, start_ms: u64, end_ms: u64, image: IndexedImage) -> CueFrame {
    CueFrame { region, ..frame(cue, start_ms, end_ms, image) }
}

fn object_segments(data: &[u8]) -> usize {
    segments(data).iter()
        .filter(|segment| matches!(segment, Segment::SingleObjectDefinition(_)))
        .count()
}

fn encode(frames: &[CueFrame]) -> (Vec<u8>, EncodeResult<EncodeSummary>) {

    let mut sink = Vec::<u8>::new();
    let result = SegmentEncoder::new(&mut sink, settings()).encode(frames, &CancelToken::new());

    (sink, result)
}

fn display_sets(data: &[u8]) -> Vec<DisplaySet> {

    let mut cursor = Cursor::new(data);
    let mut display_sets = Vec::new();

    while (cursor.position() as usize) < data.len() {
        display_sets.push(cursor.read_display_set().unwrap());
    }

    display_sets
}

fn segments(data: &[u8]) -> Vec<Segment> {

    let mut cursor = Cursor::new(data);
    let mut segments = Vec::new();

    while (cursor.position() as usize) < data.len() {
        segments.push(cursor.read_segment().unwrap());
    }

    segments
}

#[test]
fn test_single_cue() {

    let (data, result) = encode(&[frame(0, 1_000, 2_000, image(200, 900, 100, 50, Rgba::WHITE))]);
    let summary = result.unwrap();
    let display_sets = display_sets(&data);

    assert_eq!(summary.display_sets, 2);
    assert_eq!(summary.epochs, 1);
    assert_eq!(summary.object_definitions, 1);
    assert!(summary.diagnostics.is_empty());
    assert_eq!(display_sets.len(), 2);

    let shown = &display_sets[0];

    assert_eq!(shown.pts, 90_000);
    assert_eq!(shown.frame_rate, 0x30);
    assert_eq!(shown.composition.state, CompositionState::EpochStart);
    assert_eq!(shown.windows[&0], Window { x: 200, y: 900, width: 100, height: 50 });
    assert_eq!(shown.palettes[&Vid { id: 0, version: 0 }].entries.len(), 2);
    assert_eq!(shown.palettes[&Vid { id: 0, version: 0 }].entries[&0].alpha, 0);
    assert_eq!(shown.objects[&Vid { id: 0, version: 0 }].width, 100);
    assert_eq!(
        shown.composition.objects[&Cid { object_id: 0, window_id: 0 }],
        CompositionObject { x: 200, y: 900, forced: false, crop: None },
    );

    let cleared = &display_sets[1];

    assert_eq!(cleared.pts, 180_000);
    assert_eq!(cleared.composition.number, 1);
    assert_eq!(cleared.composition.state, CompositionState::Normal);
    assert!(cleared.composition.objects.is_empty());
    assert_eq!(cleared.windows, shown.windows);
    assert!(cleared.objects.is_empty());
}

#[test]
fn test_palette_uses_video_matrix() {

    let (data, result) = encode(&[frame(0, 1_000, 2_000, image(0, 0, 10, 10, Rgba::rgb(255, 0, 0)))]);

    result.unwrap();

    let display_sets = display_sets(&data);
    let entry = display_sets[0].palettes[&Vid { id: 0, version: 0 }].entries[&1];
    let expected = ycbcr_pixel(ColorMatrix::Bt709, RgbPixel { red: 255, green: 0, blue: 0 });

    assert_eq!(entry, PaletteEntry { y: expected.y, cr: expected.cr, cb: expected.cb, alpha: 255 });
}

#[test]
fn test_identical_cues_share_object() {

    let text = image(400, 900, 300, 60, Rgba::WHITE);
    let (data, result) = encode(&[
        frame(0, 1_000, 2_000, text.clone()),
        frame(1, 3_000, 4_000, text),
    ]);
    let summary = result.unwrap();
    let display_sets = display_sets(&data);

    assert_eq!(object_segments(&data), 1);
    assert_eq!(summary.object_definitions, 1);
    assert_eq!(summary.reused_objects, 1);
    assert_eq!(display_sets.len(), 4);
    assert_eq!(display_sets[2].pts, 270_000);
    assert_eq!(display_sets[2].composition.state, CompositionState::Normal);
    assert!(display_sets[2].objects.is_empty());
    assert!(display_sets[2].palettes.is_empty());
    assert_eq!(display_sets[2].composition.objects.len(), 1);
}

#[test]
fn test_back_to_back_identical_cues() {

    let text = image(400, 900, 300, 60, Rgba::WHITE);
    let (data, result) = encode(&[
        frame(0, 1_000, 2_000, text.clone()),
        frame(1, 2_000, 3_000, text),
    ]);
    let summary = result.unwrap();
    let display_sets = display_sets(&data);

    assert_eq!(summary.display_sets, 2);
    assert_eq!(display_sets[0].pts, 90_000);
    assert_eq!(display_sets[1].pts, 270_000);
    assert!(display_sets[1].composition.objects.is_empty());
}

#[test]
fn test_palette_grows_within_epoch() {

    let (data, result) = encode(&[
        frame(0, 1_000, 2_000, image(400, 900, 300, 60, Rgba::WHITE)),
        frame(1, 2_000, 3_000, image(400, 900, 300, 60, Rgba::rgb(255, 255, 0))),
    ]);

    result.unwrap();

    let display_sets = display_sets(&data);
    let changed = &display_sets[1];

    assert_eq!(changed.composition.state, CompositionState::Normal);
    assert_eq!(changed.windows.len(), 1);
    assert_eq!(changed.palettes[&Vid { id: 0, version: 1 }].entries.len(), 3);
    assert_eq!(
        changed.objects[&Vid { id: 0, version: 1 }].lines().unwrap()[0][0],
        2,
    );
}

#[test]
fn test_separate_windows() {

    let (data, result) = encode(&[
        frame(0, 1_000, 3_000, image(100, 100, 200, 50, Rgba::WHITE)),
        frame(1, 1_000, 2_000, image(100, 900, 200, 50, Rgba::WHITE)),
    ]);
    let summary = result.unwrap();
    let display_sets = display_sets(&data);

    assert_eq!(summary.epochs, 1);
    assert_eq!(summary.reused_objects, 1);
    assert_eq!(display_sets.len(), 3);
    assert_eq!(display_sets[0].windows.len(), 2);
    assert_eq!(display_sets[0].windows[&0], Window { x: 100, y: 100, width: 200, height: 50 });
    assert_eq!(display_sets[0].windows[&1], Window { x: 100, y: 900, width: 200, height: 50 });
    assert_eq!(display_sets[0].objects.len(), 2);
    assert_eq!(display_sets[0].composition.objects.len(), 2);
    assert_eq!(display_sets[1].pts, 180_000);
    assert_eq!(display_sets[1].composition.state, CompositionState::Normal);
    assert!(display_sets[1].objects.is_empty());
    assert_eq!(display_sets[1].windows, display_sets[0].windows);
    assert_eq!(
        display_sets[1].composition.objects.keys().copied().collect::<Vec<Cid>>(),
        vec![Cid { object_id: 0, window_id: 0 }],
    );
}

#[test]
fn test_region_keeps_object_across_gaps() {

    let line = image(600, 900, 700, 60, Rgba::WHITE);
    let (data, result) = encode(&[
        in_region(BOTTOM, 0, 1_000, 2_000, line.clone()),
        in_region(TOP, 1, 2_500, 3_000, image(800, 100, 300, 60, Rgba::rgb(255, 255, 0))),
        in_region(BOTTOM, 2, 3_500, 4_500, line),
    ]);
    let summary = result.unwrap();
    let display_sets = display_sets(&data);

    assert_eq!(summary.epochs, 1);
    assert_eq!(summary.object_definitions, 2);
    assert_eq!(summary.reused_objects, 1);
    assert_eq!(object_segments(&data), 2);
    assert_eq!(display_sets.len(), 6);
    assert_eq!(display_sets[0].windows[&0], Window { x: 800, y: 100, width: 300, height: 60 });
    assert_eq!(display_sets[0].windows[&1], Window { x: 600, y: 900, width: 700, height: 60 });
    assert_eq!(
        display_sets[0].composition.objects.keys().copied().collect::<Vec<Cid>>(),
        vec![Cid { object_id: 1, window_id: 1 }],
    );
    assert_eq!(display_sets[4].composition.state, CompositionState::Normal);
    assert!(display_sets[4].objects.is_empty());
}

#[test]
fn test_region_keeps_object_under_other_cue() {

    let line = image(600, 900, 700, 60, Rgba::WHITE);
    let (data, result) = encode(&[
        in_region(BOTTOM, 0, 1_000, 4_000, line),
        in_region(TOP, 1, 2_000, 3_000, image(800, 100, 300, 60, Rgba::WHITE)),
    ]);
    let summary = result.unwrap();
    let display_sets = display_sets(&data);

    assert_eq!(summary.epochs, 1);
    assert_eq!(summary.display_sets, 4);
    assert_eq!(summary.object_definitions, 2);
    assert_eq!(summary.reused_objects, 2);
    assert_eq!(
        display_sets[1].objects.keys().copied().collect::<Vec<Vid<u16>>>(),
        vec![Vid { id: 0, version: 0 }],
    );
    assert_eq!(display_sets[1].composition.objects.len(), 2);
    assert!(display_sets[2].objects.is_empty());
    assert_eq!(display_sets[2].composition.objects.len(), 1);
    assert!(display_sets[3].composition.objects.is_empty());
}

#[test]
fn test_cues_in_one_region_share_window() {

    let (data, result) = encode(&[
        in_region(BOTTOM, 0, 1_000, 2_000, image(800, 900, 300, 60, Rgba::WHITE)),
        in_region(BOTTOM, 1, 3_000, 4_000, image(600, 880, 700, 80, Rgba::WHITE)),
    ]);
    let summary = result.unwrap();
    let display_sets = display_sets(&data);

    assert_eq!(summary.epochs, 1);
    assert_eq!(display_sets[0].windows.len(), 1);
    assert_eq!(display_sets[0].windows[&0], Window { x: 600, y: 880, width: 700, height: 80 });
    assert_eq!(display_sets[2].composition.state, CompositionState::Normal);
    assert_eq!(display_sets[2].objects[&Vid { id: 0, version: 1 }].width, 700);
}

#[test]
fn test_overlapping_regions_start_new_epoch() {

    let (data, result) = encode(&[
        in_region(BOTTOM, 0, 1_000, 2_000, image(600, 900, 700, 60, Rgba::WHITE)),
        in_region(TOP, 1, 3_000, 4_000, image(600, 920, 700, 60, Rgba::WHITE)),
    ]);
    let summary = result.unwrap();
    let display_sets = display_sets(&data);

    assert_eq!(summary.epochs, 2);
    assert_eq!(display_sets[2].composition.state, CompositionState::EpochStart);
    assert_eq!(display_sets[2].windows[&0], Window { x: 600, y: 920, width: 700, height: 60 });
    assert!(summary.diagnostics.is_empty());
}

#[test]
fn test_third_region_joins_nearest_windows() {

    let third = Rect { x: 192, y: 500, width: 1536, height: 100 };
    let (data, result) = encode(&[
        in_region(TOP, 0, 1_000, 2_000, image(800, 100, 300, 60, Rgba::WHITE)),
        in_region(third, 1, 1_000, 2_000, image(800, 200, 300, 60, Rgba::WHITE)),
        in_region(BOTTOM, 2, 1_000, 2_000, image(800, 900, 300, 60, Rgba::WHITE)),
    ]);
    let summary = result.unwrap();
    let display_sets = display_sets(&data);

    assert_eq!(display_sets[0].windows.len(), 2);
    assert_eq!(display_sets[0].windows[&0], Window { x: 800, y: 100, width: 300, height: 160 });
    assert_eq!(summary.diagnostics, vec![Diagnostic::ObjectsMerged { cues: vec![0, 1] }]);
}

#[test]
fn test_clear_is_charged_for_window_redraw() {

    let (data, result) = encode(&[frame(0, 1_000, 2_000, image(0, 0, 1920, 200, Rgba::WHITE))]);

    result.unwrap();

    let display_sets = display_sets(&data);
    let cleared = &display_sets[1];

    assert!(cleared.composition.objects.is_empty());
    assert_eq!(cleared.decode_duration(), window_write_ticks(1920, 200));
    assert_eq!(cleared.dts(), Some(180_000 - window_write_ticks(1920, 200)));
}

#[test]
fn test_overlapping_cues_merge() {

    let (data, result) = encode(&[
        frame(0, 1_000, 2_000, image(100, 100, 200, 100, Rgba::rgb(255, 0, 0))),
        frame(1, 1_000, 2_000, image(200, 150, 200, 100, Rgba::rgb(0, 0, 255))),
    ]);
    let summary = result.unwrap();
    let display_sets = display_sets(&data);
    let shown = &display_sets[0];
    let object = &shown.objects[&Vid { id: 0, version: 0 }];
    let lines = object.lines().unwrap();
    let palette = &shown.palettes[&Vid { id: 0, version: 0 }];
    let blue = ycbcr_pixel(ColorMatrix::Bt709, RgbPixel { red: 0, green: 0, blue: 255 });

    assert_eq!(summary.diagnostics, vec![Diagnostic::ObjectsMerged { cues: vec![0, 1] }]);
    assert_eq!(shown.windows.len(), 1);
    assert_eq!(shown.windows[&0], Window { x: 100, y: 100, width: 300, height: 150 });
    assert_eq!((object.width, object.height), (300, 150));
    assert_eq!(lines[0][299], 0);
    assert_eq!(palette.entries[&lines[60][150]].y, blue.y);
    assert_eq!(palette.entries[&lines[60][150]].cb, blue.cb);
}

#[test]
fn test_stacking_order() {

    let (data, result) = encode(&[
        CueFrame { z_index: 1, ..frame(0, 1_000, 2_000, image(0, 0, 100, 100, Rgba::rgb(255, 0, 0))) },
        frame(1, 1_000, 2_000, image(0, 0, 100, 100, Rgba::rgb(0, 0, 255))),
    ]);
    let summary = result.unwrap();
    let display_sets = display_sets(&data);
    let shown = &display_sets[0];
    let lines = shown.objects[&Vid { id: 0, version: 0 }].lines().unwrap();
    let red = ycbcr_pixel(ColorMatrix::Bt709, RgbPixel { red: 255, green: 0, blue: 0 });

    assert_eq!(summary.diagnostics, vec![Diagnostic::ObjectsMerged { cues: vec![1, 0] }]);
    assert_eq!(shown.palettes[&Vid { id: 0, version: 0 }].entries[&lines[50][50]].cr, red.cr);
}

#[test]
fn test_timing_overflow() {

    let (data, result) = encode(&[
        frame(0, 1_000, 1_040, image(0, 0, 1920, 540, Rgba::WHITE)),
        frame(1, 1_040, 2_000, image(0, 540, 1920, 540, Rgba::WHITE)),
    ]);

    match result {
        Err(EncodeError::TimingOverflow { previous_cue, cue, pts, needed, available }) => {
            assert_eq!(previous_cue, 0);
            assert_eq!(cue, 1);
            assert_eq!(pts, 93_600);
            assert!(needed > available);
            assert_eq!(available, 3_600);
        }
        other => panic!("expected a timing overflow, got {:?}", other),
    }

    // The first cue was already written in full.
    assert_eq!(display_sets(&data).len(), 1);
}

#[test]
fn test_presentation_delayed_at_stream_start() {

    let (data, result) = encode(&[frame(3, 0, 1_000, image(0, 0, 400, 100, Rgba::WHITE))]);
    let summary = result.unwrap();
    let display_sets = display_sets(&data);
    let needed = display_sets[0].decode_duration();

    assert_eq!(display_sets[0].pts, needed);
    assert_eq!(display_sets[0].dts(), Some(0));
    assert_eq!(
        summary.diagnostics,
        vec![Diagnostic::PresentationDelayed { cue: 3, requested_pts: 0, pts: needed }],
    );
}

#[test]
fn test_cropped_to_canvas() {

    let (data, result) = encode(&[frame(0, 1_000, 2_000, image(1900, 1060, 40, 40, Rgba::WHITE))]);

    result.unwrap();

    let display_sets = display_sets(&data);

    assert_eq!(display_sets[0].windows[&0], Window { x: 1900, y: 1060, width: 20, height: 20 });
}

#[test]
fn test_invisible_and_short_cues_skipped() {

    let (data, result) = encode(&[
        CueFrame { image: None, ..frame(0, 1_000, 2_000, image(0, 0, 2, 2, Rgba::WHITE)) },
        frame(1, 3_000, 3_010, image(0, 0, 2, 2, Rgba::WHITE)),
    ]);
    let summary = result.unwrap();

    assert_eq!(summary.display_sets, 0);
    assert!(data.is_empty());
}

#[test]
fn test_cancelled() {

    let cancel = CancelToken::new();
    let mut sink = Vec::<u8>::new();

    cancel.cancel();

    let summary = SegmentEncoder::new(&mut sink, settings())
        .encode(&[frame(0, 1_000, 2_000, image(0, 0, 2, 2, Rgba::WHITE))], &cancel)
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.display_sets, 0);
    assert!(sink.is_empty());
}

#[test]
fn test_decode_timing_invariants() {

    let frames = (0..24_u64)
        .map(|index| {
            let width = 200 + 60 * (index as i32 % 7);
            let y = if index % 3 == 0 { 100 } else { 900 };
            let color = Rgba::rgb(255, (index * 10) as u8, 0);
            frame(index as usize, 1_000 + index * 700, 1_600 + index * 700 + index % 2 * 500, image(600, y, width, 80, color))
        })
        .collect::<Vec<CueFrame>>();
    let (data, result) = encode(&frames);

    result.unwrap();

    let segments = segments(&data);
    let display_sets = display_sets(&data);

    for pair in segments.windows(2) {
        assert!(pair[0].dts() <= pair[1].dts());
    }
    for pair in display_sets.windows(2) {
        assert!(pair[1].dts().unwrap() >= pair[0].pts);
    }
    for display_set in display_sets.iter() {
        assert!(display_set.windows.len() <= 2);
        assert!(display_set.composition.objects.len() <= 2);
    }
    for segment in segments.iter() {
        if let Segment::SingleObjectDefinition(ods) = segment {
            let pcs_pts = display_sets.iter()
                .filter(|display_set| display_set.dts().unwrap() <= ods.dts)
                .map(|display_set| display_set.pts)
                .last()
                .unwrap();
            assert!(ods.pts <= pcs_pts);
        }
    }
}
