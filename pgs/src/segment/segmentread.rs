/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    CompositionObject,
    Crop,
    CompositionState,
    EndSegment,
    FinalObjectDefinitionSegment,
    InitialObjectDefinitionSegment,
    MiddleObjectDefinitionSegment,
    PaletteDefinitionSegment,
    PaletteEntry,
    PresentationCompositionSegment,
    Segment,
    SingleObjectDefinitionSegment,
    WindowDefinition,
    WindowDefinitionSegment,
};
use std::{
    io::{Cursor, Error as IoError, Read},
};
use byteorder::{BigEndian, ReadBytesExt};
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for segment-reading operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// The error type for [ReadSegmentExt].
#[derive(ThisError, Debug)]
pub enum ReadError {
    #[error("segment IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    #[error("segment has unrecognized magic number")]
    UnrecognizedMagicNumber,
    #[error("segment has unrecognized kind")]
    UnrecognizedKind,
    #[error("presentation composition segment has unrecognized composition state")]
    UnrecognizedCompositionState,
    #[error("presentation composition segment has unrecognized palette update flag")]
    UnrecognizedPaletteUpdateFlag,
    #[error("unrecognized object definition sequence flag")]
    UnrecognizedObjectSequenceFlag,
    #[error("object definition segment declares a length too short for its dimensions")]
    InvalidObjectDataLength,
}

/// Allows reading segments from a source.
pub trait ReadSegmentExt {
    /// Reads the next segment from a source.
    fn read_segment(&mut self) -> ReadResult<Segment>;
}

impl<T: Read> ReadSegmentExt for T {

    fn read_segment(&mut self) -> ReadResult<Segment> {

        if self.read_u16::<BigEndian>()? != 0x5047 {
            return Err(ReadError::UnrecognizedMagicNumber)
        }

        let pts = self.read_u32::<BigEndian>()?;
        let dts = self.read_u32::<BigEndian>()?;
        let kind = self.read_u8()?;
        let size = self.read_u16::<BigEndian>()? as usize;

        let mut payload = vec![0u8; size];
        self.read_exact(&mut payload)?;

        Ok(
            match kind {
                0x14 => Segment::PaletteDefinition(parse_pds(pts, dts, &payload)?),
                0x15 => parse_ods(pts, dts, &payload)?,
                0x16 => Segment::PresentationComposition(parse_pcs(pts, dts, &payload)?),
                0x17 => Segment::WindowDefinition(parse_wds(pts, dts, &payload)?),
                0x80 => Segment::End(EndSegment { pts, dts }),
                _ => return Err(ReadError::UnrecognizedKind),
            }
        )
    }
}

fn parse_pcs(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> ReadResult<PresentationCompositionSegment> {

    let mut input = Cursor::new(payload);
    let width = input.read_u16::<BigEndian>()?;
    let height = input.read_u16::<BigEndian>()?;
    let frame_rate = input.read_u8()?;
    let composition_number = input.read_u16::<BigEndian>()?;
    let composition_state = match input.read_u8()? {
        0x00 => CompositionState::Normal,
        0x40 => CompositionState::AcquisitionPoint,
        0x80 => CompositionState::EpochStart,
        _ => return Err(ReadError::UnrecognizedCompositionState),
    };
    let palette_update_id = match input.read_u8()? {
        0x00 => {
            input.read_u8()?;
            None
        }
        0x80 => {
            Some(input.read_u8()?)
        }
        _ => {
            return Err(ReadError::UnrecognizedPaletteUpdateFlag)
        }
    };
    let comp_obj_count = input.read_u8()? as usize;
    let mut composition_objects = Vec::new();

    for _ in 0..comp_obj_count {

        let object_id = input.read_u16::<BigEndian>()?;
        let window_id = input.read_u8()?;
        let flags = input.read_u8()?;
        let x = input.read_u16::<BigEndian>()?;
        let y = input.read_u16::<BigEndian>()?;
        let remaining = payload.len() - input.position() as usize;

        // Some discs flag an object as cropped and then end the payload.
        let crop = if flags & 0x80 != 0 && remaining >= 8 {
            Some(
                Crop {
                    x: input.read_u16::<BigEndian>()?,
                    y: input.read_u16::<BigEndian>()?,
                    width: input.read_u16::<BigEndian>()?,
                    height: input.read_u16::<BigEndian>()?,
                }
            )
        } else {
            None
        };

        composition_objects.push(
            CompositionObject {
                object_id,
                window_id,
                x,
                y,
                forced: flags & 0x40 != 0,
                crop,
            }
        );
    }

    Ok(
        PresentationCompositionSegment {
            pts,
            dts,
            width,
            height,
            frame_rate,
            composition_number,
            composition_state,
            palette_update_id,
            composition_objects,
        }
    )
}

fn parse_wds(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> ReadResult<WindowDefinitionSegment> {

    let mut input = Cursor::new(payload);
    let mut windows = Vec::new();
    let count = input.read_u8()?;

    for _ in 0..count {
        windows.push(
            WindowDefinition {
                id: input.read_u8()?,
                x: input.read_u16::<BigEndian>()?,
                y: input.read_u16::<BigEndian>()?,
                width: input.read_u16::<BigEndian>()?,
                height: input.read_u16::<BigEndian>()?,
            }
        );
    }

    Ok(
        WindowDefinitionSegment {
            pts,
            dts,
            windows,
        }
    )
}

fn parse_pds(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> ReadResult<PaletteDefinitionSegment> {

    let mut input = Cursor::new(payload);
    let count = payload.len().saturating_sub(2) / 5;
    let id = input.read_u8()?;
    let version = input.read_u8()?;
    let mut entries = Vec::new();

    for _ in 0..count {

        let id = input.read_u8()?;
        let y = input.read_u8()?;
        let cr = input.read_u8()?;
        let cb = input.read_u8()?;
        let alpha = input.read_u8()?;

        entries.push(PaletteEntry { id, y, cr, cb, alpha });
    }

    Ok(
        PaletteDefinitionSegment {
            pts,
            dts,
            id,
            version,
            entries,
        }
    )
}

fn parse_ods(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> ReadResult<Segment> {

    let mut input = Cursor::new(payload);
    let id = input.read_u16::<BigEndian>()?;
    let version = input.read_u8()?;
    let sequence = input.read_u8()?;

    Ok(
        match sequence {
            0xC0 => {
                let length = input.read_u24::<BigEndian>()? as usize;
                let width = input.read_u16::<BigEndian>()?;
                let height = input.read_u16::<BigEndian>()?;
                if length < 4 {
                    return Err(ReadError::InvalidObjectDataLength)
                }
                let mut data = vec![0u8; length - 4];
                input.read_exact(&mut data)?;
                Segment::SingleObjectDefinition(
                    SingleObjectDefinitionSegment {
                        pts,
                        dts,
                        id,
                        version,
                        width,
                        height,
                        data,
                    }
                )
            }
            0x80 => {
                let length = input.read_u24::<BigEndian>()? as usize;
                let width = input.read_u16::<BigEndian>()?;
                let height = input.read_u16::<BigEndian>()?;
                let mut data = vec![];
                input.read_to_end(&mut data)?;
                Segment::InitialObjectDefinition(
                    InitialObjectDefinitionSegment {
                        pts,
                        dts,
                        id,
                        version,
                        length,
                        width,
                        height,
                        data,
                    }
                )
            }
            0x00 => {
                let mut data = vec![];
                input.read_to_end(&mut data)?;
                Segment::MiddleObjectDefinition(
                    MiddleObjectDefinitionSegment {
                        pts,
                        dts,
                        id,
                        version,
                        data,
                    }
                )
            }
            0x40 => {
                let mut data = vec![];
                input.read_to_end(&mut data)?;
                Segment::FinalObjectDefinition(
                    FinalObjectDefinitionSegment {
                        pts,
                        dts,
                        id,
                        version,
                        data,
                    }
                )
            }
            _ => return Err(ReadError::UnrecognizedObjectSequenceFlag),
        }
    )
}
