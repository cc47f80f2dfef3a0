/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::{
    *,
    super::segment::{
        CompositionState,
        Crop,
        EndSegment,
        IODS_DATA_SIZE,
        MODS_DATA_SIZE,
        Segment,
        WriteSegmentExt,
    },
};
use std::{
    collections::BTreeMap,
    io::Cursor,
};
use rand::{thread_rng, Rng};

fn random_pts<R: Rng>(rng: &mut R) -> u32 {
    rng.gen_range(1_000_000..u32::MAX)
}

#[test]
fn test_ds_cycle_empty() {

    let mut rng = thread_rng();
    let display_set = DisplaySet {
        pts: random_pts(&mut rng),
        width: 1920,
        height: 1080,
        frame_rate: 0x10,
        palette_update_id: None,
        windows: BTreeMap::<u8, Window>::new(),
        palettes: BTreeMap::<Vid<u8>, Palette>::new(),
        objects: BTreeMap::<Vid<u16>, Object>::new(),
        composition: Composition {
            number: rng.gen(),
            state: CompositionState::EpochStart,
            objects: BTreeMap::<Cid, CompositionObject>::new(),
        },
    };

    cycle(&display_set);
}

#[test]
fn test_ds_cycle_full() {

    let mut rng = thread_rng();
    let mut windows = BTreeMap::<u8, Window>::new();
    let mut palettes = BTreeMap::<Vid<u8>, Palette>::new();
    let mut objects = BTreeMap::<Vid<u16>, Object>::new();
    let mut composition_objects = BTreeMap::<Cid, CompositionObject>::new();

    windows.insert(0, Window { x: 100, y: 800, width: 600, height: 100 });
    windows.insert(1, Window { x: 100, y: 920, width: 600, height: 100 });
    palettes.insert(
        Vid { id: 0, version: rng.gen() },
        Palette {
            entries: (1..=255).map(|id|
                (id, PaletteEntry {
                    y: rng.gen(),
                    cr: rng.gen(),
                    cb: rng.gen(),
                    alpha: rng.gen(),
                })
            ).collect(),
        },
    );
    for object_id in 0..2_u16 {
        let lines = (0..100).map(|_|
            (0..600).map(|_| rng.gen_range(0..4)).collect::<Vec<u8>>()
        ).collect::<Vec<Vec<u8>>>();
        objects.insert(Vid { id: object_id, version: 0 }, Object::from_lines(&lines));
        composition_objects.insert(
            Cid { object_id, window_id: object_id as u8 },
            CompositionObject {
                x: 100,
                y: 800 + 120 * object_id,
                forced: object_id == 1,
                crop: if object_id == 1 {
                    Some(Crop { x: 0, y: 0, width: 300, height: 100 })
                } else {
                    None
                },
            },
        );
    }

    let display_set = DisplaySet {
        pts: random_pts(&mut rng),
        width: 1920,
        height: 1080,
        frame_rate: 0x10,
        palette_update_id: None,
        windows,
        palettes,
        objects,
        composition: Composition {
            number: rng.gen(),
            state: CompositionState::EpochStart,
            objects: composition_objects,
        },
    };

    cycle(&display_set);
}

#[test]
fn test_ds_fragmented_object() {

    let mut rng = thread_rng();
    let mut objects = BTreeMap::<Vid<u16>, Object>::new();

    objects.insert(
        Vid { id: 0, version: 0 },
        Object {
            width: 1920,
            height: 1080,
            data: (0..(IODS_DATA_SIZE + MODS_DATA_SIZE + 100)).map(|_| rng.gen()).collect(),
        },
    );

    let display_set = DisplaySet {
        pts: random_pts(&mut rng),
        width: 1920,
        height: 1080,
        frame_rate: 0x10,
        palette_update_id: None,
        windows: BTreeMap::new(),
        palettes: BTreeMap::new(),
        objects,
        composition: Composition {
            number: 0,
            state: CompositionState::Normal,
            objects: BTreeMap::new(),
        },
    };
    let segments = display_set.to_segments().unwrap();

    assert!(matches!(segments[1], Segment::InitialObjectDefinition(_)));
    assert!(matches!(segments[2], Segment::MiddleObjectDefinition(_)));
    assert!(matches!(segments[3], Segment::FinalObjectDefinition(_)));
    assert!(matches!(segments[4], Segment::End(_)));
    assert_eq!(segments.len(), 5);

    cycle(&display_set);
}

#[test]
fn test_ds_segment_timing() {

    let mut windows = BTreeMap::<u8, Window>::new();
    let mut objects = BTreeMap::<Vid<u16>, Object>::new();
    let mut composition_objects = BTreeMap::<Cid, CompositionObject>::new();
    let lines = vec![vec![1_u8; 1000]; 100];

    windows.insert(0, Window { x: 0, y: 0, width: 1000, height: 100 });
    objects.insert(Vid { id: 0, version: 0 }, Object::from_lines(&lines));
    composition_objects.insert(Cid { object_id: 0, window_id: 0 }, CompositionObject::default());

    let display_set = DisplaySet {
        pts: 90_000,
        width: 1920,
        height: 1080,
        frame_rate: 0x10,
        palette_update_id: None,
        windows,
        palettes: BTreeMap::new(),
        objects,
        composition: Composition {
            number: 0,
            state: CompositionState::EpochStart,
            objects: composition_objects,
        },
    };
    let segments = display_set.to_segments().unwrap();
    let dts = display_set.dts().unwrap();

    // 467 ticks of plane initialization, 563 of object decoding and 23 of window writing.
    assert_eq!(display_set.decode_duration(), 467 + 563 + 23);
    assert_eq!(dts, 90_000 - 1053);
    assert_eq!(segments[0].dts(), dts);
    assert_eq!(segments[0].pts(), 90_000);
    assert_eq!(segments[1].pts(), 90_000 - 23);
    assert_eq!(segments[2].dts(), dts + 467);
    assert_eq!(segments[2].pts(), dts + 467 + 563);
    assert_eq!(segments[3].pts(), segments[2].pts());

    for pair in segments.windows(2) {
        assert!(pair[0].dts() <= pair[1].dts());
    }
    for segment in segments.iter() {
        assert!(segment.pts() <= display_set.pts);
        assert!(segment.dts() <= segment.pts());
    }
}

#[test]
fn test_ds_insufficient_decode_time() {

    let display_set = DisplaySet {
        pts: 100,
        width: 1920,
        height: 1080,
        frame_rate: 0x10,
        composition: Composition {
            state: CompositionState::EpochStart,
            ..Default::default()
        },
        ..Default::default()
    };

    assert!(display_set.dts().is_none());
    assert!(matches!(
        display_set.to_segments(),
        Err(WriteError::InsufficientDecodeTime { pts: 100, duration: 467 }),
    ));
}

#[test]
fn test_ds_missing_pcs() {

    let mut buffer = vec![];

    buffer.write_segment(&Segment::End(EndSegment { pts: 0, dts: 0 })).unwrap();

    let mut cursor = Cursor::new(buffer);

    assert!(matches!(
        cursor.read_display_set(),
        Err(ReadError::MissingPresentationCompositionSegment),
    ));
}

#[test]
fn test_object_lines() {

    let lines = vec![
        vec![0, 0, 1, 1, 1, 2],
        vec![3, 3, 3, 3, 3, 3],
    ];
    let object = Object::from_lines(&lines);

    assert_eq!(object.width, 6);
    assert_eq!(object.height, 2);
    assert_eq!(object.lines().unwrap(), lines);
}

#[test]
fn test_window_overlaps() {

    let a = Window { x: 0, y: 0, width: 100, height: 50 };
    let b = Window { x: 99, y: 49, width: 10, height: 10 };
    let c = Window { x: 100, y: 0, width: 10, height: 10 };

    assert!(a.overlaps(&b));
    assert!(b.overlaps(&a));
    assert!(!a.overlaps(&c));
}

fn cycle(display_set: &DisplaySet) {

    let mut buffer = vec![];

    buffer.write_display_set(display_set).unwrap();

    let mut cursor = Cursor::new(buffer);
    let cycled_display_set = cursor.read_display_set().unwrap();

    assert_eq!(cycled_display_set, *display_set);
}
