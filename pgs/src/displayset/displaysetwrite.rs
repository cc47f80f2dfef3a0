/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    DisplaySet,
    super::{
        decoder::{object_decode_ticks, window_write_ticks},
        segment::{
            CompositionObject,
            EndSegment,
            FinalObjectDefinitionSegment,
            InitialObjectDefinitionSegment,
            IODS_DATA_SIZE,
            MiddleObjectDefinitionSegment,
            MODS_DATA_SIZE,
            PaletteDefinitionSegment,
            PaletteEntry,
            PresentationCompositionSegment,
            SingleObjectDefinitionSegment,
            WindowDefinition,
            WindowDefinitionSegment,
            WriteError as SegmentWriteError,
            WriteSegmentExt,
            Segment,
        },
    },
};
use std::io::Write;
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for display set-writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// The error type for [WriteDisplaySetExt].
///
/// Errors are caused by either an inability to deconstruct a display set (DS) into segments, or
/// by an underlying I/O error.
#[derive(ThisError, Debug)]
pub enum WriteError {
    /// The display set could not be written because of an underlying segment error.
    #[error("segment value error")]
    SegmentError {
        #[from]
        source: SegmentWriteError,
    },
    /// The display set is presented too early for its objects to be decoded in time.
    #[error("display set at {pts} needs {duration} ticks to decode")]
    InsufficientDecodeTime {
        pts: u32,
        duration: u32,
    },
}

/// Allows writing display sets to a sink.
pub trait WriteDisplaySetExt {
    /// Writes the next display set to a sink.
    fn write_display_set(&mut self, display_set: &DisplaySet) -> WriteResult<()>;
}

impl<T> WriteDisplaySetExt for T where
    T: Write,
{

    fn write_display_set(&mut self, display_set: &DisplaySet) -> WriteResult<()> {

        let segments = display_set.to_segments()?;

        for segment in segments.iter() {
            self.write_segment(segment)?;
        }

        Ok(())
    }
}

impl DisplaySet {

    /// The time at which decoding of this display set has to begin.
    pub fn dts(&self) -> Option<u32> {
        self.pts.checked_sub(self.decode_duration())
    }

    /// Deconstructs the display set into its segments, in stream order.
    pub fn to_segments(&self) -> WriteResult<Vec<Segment>> {

        let dts = self.dts().ok_or(WriteError::InsufficientDecodeTime {
            pts: self.pts,
            duration: self.decode_duration(),
        })?;
        let mut segments = Vec::<Segment>::new();

        segments.push(Segment::PresentationComposition(
            PresentationCompositionSegment {
                pts: self.pts,
                dts,
                width: self.width,
                height: self.height,
                frame_rate: self.frame_rate,
                composition_number: self.composition.number,
                composition_state: self.composition.state,
                palette_update_id: self.palette_update_id,
                composition_objects: self.composition.objects.iter().map(|(cid, co)|
                    CompositionObject {
                        object_id: cid.object_id,
                        window_id: cid.window_id,
                        x: co.x,
                        y: co.y,
                        forced: co.forced,
                        crop: co.crop.clone(),
                    }
                ).collect::<Vec<CompositionObject>>(),
            }
        ));

        if !self.windows.is_empty() {
            segments.push(Segment::WindowDefinition(
                WindowDefinitionSegment {
                    pts: self.pts - self.windows.values()
                        .map(|window| window_write_ticks(window.width, window.height))
                        .sum::<u32>(),
                    dts,
                    windows: self.windows.iter().map(|(&window_id, window)|
                        WindowDefinition {
                            id: window_id,
                            x: window.x,
                            y: window.y,
                            width: window.width,
                            height: window.height,
                        }
                    ).collect::<Vec<WindowDefinition>>(),
                }
            ));
        }

        for (vid, palette) in &self.palettes {
            segments.push(Segment::PaletteDefinition(
                PaletteDefinitionSegment {
                    pts: dts,
                    dts,
                    id: vid.id,
                    version: vid.version,
                    entries: palette.entries.iter().map(|(&id, entry)|
                        PaletteEntry {
                            id,
                            y: entry.y,
                            cr: entry.cr,
                            cb: entry.cb,
                            alpha: entry.alpha,
                        }
                    ).collect::<Vec<PaletteEntry>>(),
                }
            ));
        }

        let mut decode_end = dts + self.plane_initialization_duration();

        for (vid, object) in &self.objects {

            let ods_dts = decode_end;
            let ods_pts = ods_dts + object_decode_ticks(object.width, object.height);
            let data = &object.data;

            if data.len() > IODS_DATA_SIZE {

                let mut index = IODS_DATA_SIZE;

                segments.push(Segment::InitialObjectDefinition(
                    InitialObjectDefinitionSegment {
                        pts: ods_pts,
                        dts: ods_dts,
                        id: vid.id,
                        version: vid.version,
                        width: object.width,
                        height: object.height,
                        length: data.len() + 4,
                        data: Vec::from(&data[..index]),
                    }
                ));
                while data.len() - index > MODS_DATA_SIZE {
                    segments.push(Segment::MiddleObjectDefinition(
                        MiddleObjectDefinitionSegment {
                            pts: ods_pts,
                            dts: ods_dts,
                            id: vid.id,
                            version: vid.version,
                            data: Vec::from(&data[index..(index + MODS_DATA_SIZE)]),
                        }
                    ));
                    index += MODS_DATA_SIZE;
                }
                segments.push(Segment::FinalObjectDefinition(
                    FinalObjectDefinitionSegment {
                        pts: ods_pts,
                        dts: ods_dts,
                        id: vid.id,
                        version: vid.version,
                        data: Vec::from(&data[index..]),
                    }
                ));
            } else {
                segments.push(Segment::SingleObjectDefinition(
                    SingleObjectDefinitionSegment {
                        pts: ods_pts,
                        dts: ods_dts,
                        id: vid.id,
                        version: vid.version,
                        width: object.width,
                        height: object.height,
                        data: data.clone(),
                    }
                ));
            }

            decode_end = ods_pts;
        }

        segments.push(Segment::End(
            EndSegment {
                pts: decode_end,
                dts: decode_end,
            }
        ));

        Ok(segments)
    }
}
