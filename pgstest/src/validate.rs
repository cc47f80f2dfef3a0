/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Checks a segment stream against the limits of the decoder model.


use pgs::{
    decoder::{MAX_COMPOSITION_OBJECTS, MAX_WINDOWS},
    displayset::Window,
    segment::{CompositionState, Segment},
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error as ThisError;

pub type ValidateResult<T> = Result<T, Violation>;

/// A way in which a stream asks more of a decoder than it can give.
#[derive(ThisError, Clone, Debug, PartialEq)]
pub enum Violation {
    #[error("segment {index} decodes at {dts} after a segment decoding at {previous}")]
    DecreasingDts {
        index: usize,
        dts: u32,
        previous: u32,
    },
    #[error("composition at {pts} starts decoding at {dts} while the previous one waits for {previous}")]
    EarlyComposition {
        pts: u32,
        dts: u32,
        previous: u32,
    },
    #[error("object {object_id} finishes decoding at {decoded} after its composition at {pts}")]
    LateObject {
        object_id: u16,
        decoded: u32,
        pts: u32,
    },
    #[error("composition at {pts} shows {count} objects")]
    TooManyObjects {
        pts: u32,
        count: usize,
    },
    #[error("window definition at {pts} defines {count} windows")]
    TooManyWindows {
        pts: u32,
        count: usize,
    },
    #[error("windows {first} and {second} overlap")]
    OverlappingWindows {
        first: u8,
        second: u8,
    },
    #[error("composition at {pts} uses undefined window {window_id}")]
    UnknownWindow {
        pts: u32,
        window_id: u8,
    },
    #[error("composition at {pts} is not an epoch start but no epoch is open")]
    MissingEpochStart {
        pts: u32,
    },
    #[error("segment {index} is outside of any display set")]
    OrphanSegment {
        index: usize,
    },
    #[error("display set at {pts} is not closed by an end segment")]
    UnterminatedDisplaySet {
        pts: u32,
    },
}

/// What a valid stream contained.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    pub segments: usize,
    pub display_sets: usize,
    pub epochs: usize,
    pub objects: usize,
}

struct OpenDisplaySet {
    pts: u32,
    window_ids: Vec<u8>,
}

/// Follows a stream one segment at a time.
#[derive(Default)]
pub struct Validator {
    summary: Summary,
    last_dts: Option<u32>,
    last_pts: Option<u32>,
    epoch_windows: Option<BTreeMap<u8, Window>>,
    open: Option<OpenDisplaySet>,
}

impl Validator {

    pub fn new() -> Self {
        Self::default()
    }

    /// Checks the next segment of the stream.
    pub fn check(&mut self, segment: &Segment) -> ValidateResult<()> {

        let index = self.summary.segments;

        self.summary.segments += 1;

        if let Some(previous) = self.last_dts {
            if segment.dts() < previous {
                return Err(Violation::DecreasingDts { index, dts: segment.dts(), previous })
            }
        }
        self.last_dts = Some(segment.dts());

        match segment {
            Segment::PresentationComposition(pcs) => {
                if let Some(open) = &self.open {
                    return Err(Violation::UnterminatedDisplaySet { pts: open.pts })
                }
                if let Some(previous) = self.last_pts {
                    if pcs.dts < previous {
                        return Err(Violation::EarlyComposition {
                            pts: pcs.pts,
                            dts: pcs.dts,
                            previous,
                        })
                    }
                }
                if pcs.composition_objects.len() > MAX_COMPOSITION_OBJECTS {
                    return Err(Violation::TooManyObjects {
                        pts: pcs.pts,
                        count: pcs.composition_objects.len(),
                    })
                }
                match pcs.composition_state {
                    CompositionState::EpochStart => {
                        self.epoch_windows = Some(BTreeMap::new());
                        self.summary.epochs += 1;
                    }
                    _ => {
                        if self.epoch_windows.is_none() {
                            return Err(Violation::MissingEpochStart { pts: pcs.pts })
                        }
                    }
                }
                self.last_pts = Some(pcs.pts);
                self.open = Some(OpenDisplaySet {
                    pts: pcs.pts,
                    window_ids: pcs.composition_objects.iter()
                        .map(|object| object.window_id)
                        .collect(),
                });
            }
            Segment::WindowDefinition(wds) => {
                self.open_display_set(index)?;
                if wds.windows.len() > MAX_WINDOWS {
                    return Err(Violation::TooManyWindows {
                        pts: wds.pts,
                        count: wds.windows.len(),
                    })
                }
                let windows = wds.windows.iter()
                    .map(|definition| {
                        (definition.id, Window {
                            x: definition.x,
                            y: definition.y,
                            width: definition.width,
                            height: definition.height,
                        })
                    })
                    .collect::<BTreeMap<u8, Window>>();
                for (position, (first, first_window)) in windows.iter().enumerate() {
                    for (second, second_window) in windows.iter().skip(position + 1) {
                        if first_window.overlaps(second_window) {
                            return Err(Violation::OverlappingWindows {
                                first: *first,
                                second: *second,
                            })
                        }
                    }
                }
                self.epoch_windows = Some(windows);
            }
            Segment::PaletteDefinition(_) => {
                self.open_display_set(index)?;
            }
            Segment::SingleObjectDefinition(ods) => {
                self.check_object(index, ods.id, ods.pts)?;
                self.summary.objects += 1;
            }
            Segment::InitialObjectDefinition(ods) => {
                self.check_object(index, ods.id, ods.pts)?;
                self.summary.objects += 1;
            }
            Segment::MiddleObjectDefinition(ods) => {
                self.check_object(index, ods.id, ods.pts)?;
            }
            Segment::FinalObjectDefinition(ods) => {
                self.check_object(index, ods.id, ods.pts)?;
            }
            Segment::End(_) => {
                let open = self.open.take().ok_or(Violation::OrphanSegment { index })?;
                let defined = self.epoch_windows.as_ref()
                    .map(|windows| windows.keys().copied().collect::<BTreeSet<u8>>())
                    .unwrap_or_default();
                if let Some(window_id) = open.window_ids.iter()
                    .find(|window_id| !defined.contains(window_id))
                {
                    return Err(Violation::UnknownWindow { pts: open.pts, window_id: *window_id })
                }
                self.summary.display_sets += 1;
            }
        }

        Ok(())
    }

    /// Checks that the stream ended cleanly.
    pub fn finish(self) -> ValidateResult<Summary> {

        if let Some(open) = self.open {
            return Err(Violation::UnterminatedDisplaySet { pts: open.pts })
        }

        Ok(self.summary)
    }

    fn open_display_set(&self, index: usize) -> ValidateResult<&OpenDisplaySet> {
        self.open.as_ref().ok_or(Violation::OrphanSegment { index })
    }

    fn check_object(&self, index: usize, object_id: u16, decoded: u32) -> ValidateResult<()> {

        let open = self.open_display_set(index)?;

        if decoded > open.pts {
            return Err(Violation::LateObject { object_id, decoded, pts: open.pts })
        }

        Ok(())
    }
}
