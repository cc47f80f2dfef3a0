/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    CompositionState,
    FinalObjectDefinitionSegment,
    InitialObjectDefinitionSegment,
    MiddleObjectDefinitionSegment,
    PaletteDefinitionSegment,
    PresentationCompositionSegment,
    Segment,
    SingleObjectDefinitionSegment,
    WindowDefinitionSegment,
};
use std::io::{
    Error as IoError,
    Write,
};
use byteorder::{BigEndian, WriteBytesExt};
use thiserror::Error as ThisError;

/// The largest payload a single segment can carry.
pub const MAX_PAYLOAD_SIZE: usize = 65_535;

/// The largest amount of object data that fits into a single or initial ODS.
pub const IODS_DATA_SIZE: usize = MAX_PAYLOAD_SIZE - 11;

/// The largest amount of object data that fits into a middle or final ODS.
pub const MODS_DATA_SIZE: usize = MAX_PAYLOAD_SIZE - 4;

/// A specialized [`Result`](std::result::Result) type for segment-writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// The error type for [WriteSegmentExt].
///
/// Errors are caused by either invalid state or by an underlying I/O error.
#[derive(ThisError, Debug)]
pub enum WriteError {
    /// The [`Segment`] could not be written because of an underlying I/O error.
    #[error("segment IO error")]
    IoError {
        /// The underlying I/O error.
        #[from]
        source: IoError,
    },
    /// The [`Segment`] ([`PresentationCompositionSegment`]) being written has more than 255
    /// composition objects.
    #[error("too many composition objects in presentation composition segment")]
    TooManyCompositionObjects,
    /// The [`Segment`] ([`WindowDefinitionSegment`]) being written has more than 255 window
    /// definitions.
    #[error("too many window definitions")]
    TooManyWindowDefinitions,
    /// The [`Segment`] ([`PaletteDefinitionSegment`]) being written has more than 256
    /// entries.
    #[error("too many palette entries")]
    TooManyPaletteEntries,
    /// The object data declared by an ODS exceeds 16,777,215 bytes.
    #[error("object data is too large")]
    ObjectDataTooLarge,
    /// The payload of the [`Segment`] would exceed 65,535 bytes.
    #[error("segment payload is too large")]
    PayloadTooLarge,
}

/// Allows writing segments to a destination.
pub trait WriteSegmentExt {
    /// Writes a segment to a destination.
    fn write_segment(&mut self, segment: &Segment) -> WriteResult<()>;
}

impl<T> WriteSegmentExt for T where
    T: Write,
{

    fn write_segment(&mut self, segment: &Segment) -> WriteResult<()> {

        let (kind, payload) = match segment {
            Segment::PresentationComposition(pcs) => (0x16, generate_pcs(pcs)?),
            Segment::WindowDefinition(wds) => (0x17, generate_wds(wds)?),
            Segment::PaletteDefinition(pds) => (0x14, generate_pds(pds)?),
            Segment::SingleObjectDefinition(sods) => (0x15, generate_sods(sods)?),
            Segment::InitialObjectDefinition(iods) => (0x15, generate_iods(iods)?),
            Segment::MiddleObjectDefinition(mods) => (0x15, generate_mods(mods)?),
            Segment::FinalObjectDefinition(fods) => (0x15, generate_fods(fods)?),
            Segment::End(_) => (0x80, vec![]),
        };

        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(WriteError::PayloadTooLarge)
        }

        self.write_u16::<BigEndian>(0x5047)?;
        self.write_u32::<BigEndian>(segment.pts())?;
        self.write_u32::<BigEndian>(segment.dts())?;
        self.write_u8(kind)?;
        self.write_u16::<BigEndian>(payload.len() as u16)?;
        self.write_all(&payload)?;

        Ok(())
    }
}

fn generate_pcs(pcs: &PresentationCompositionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u16::<BigEndian>(pcs.width)?;
    payload.write_u16::<BigEndian>(pcs.height)?;
    payload.write_u8(pcs.frame_rate)?;
    payload.write_u16::<BigEndian>(pcs.composition_number)?;
    payload.write_u8(
        match pcs.composition_state {
            CompositionState::Normal => 0x00,
            CompositionState::AcquisitionPoint => 0x40,
            CompositionState::EpochStart => 0x80,
        }
    )?;

    match pcs.palette_update_id {
        Some(pal_id) => {
            payload.write_u8(0x80)?;
            payload.write_u8(pal_id)?;
        }
        None => {
            payload.write_u8(0x00)?;
            payload.write_u8(0)?;
        }
    }

    if pcs.composition_objects.len() <= 255 {
        payload.write_u8(pcs.composition_objects.len() as u8)?;
    } else {
        return Err(WriteError::TooManyCompositionObjects)
    }

    for comp_obj in &pcs.composition_objects {

        payload.write_u16::<BigEndian>(comp_obj.object_id)?;
        payload.write_u8(comp_obj.window_id)?;

        let mut flags = 0x00;

        if comp_obj.crop.is_some() {
            flags |= 0x80;
        }
        if comp_obj.forced {
            flags |= 0x40;
        }

        payload.write_u8(flags)?;
        payload.write_u16::<BigEndian>(comp_obj.x)?;
        payload.write_u16::<BigEndian>(comp_obj.y)?;

        if let Some(crop) = &comp_obj.crop {
            payload.write_u16::<BigEndian>(crop.x)?;
            payload.write_u16::<BigEndian>(crop.y)?;
            payload.write_u16::<BigEndian>(crop.width)?;
            payload.write_u16::<BigEndian>(crop.height)?;
        }
    }

    Ok(payload)
}

fn generate_wds(wds: &WindowDefinitionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    if wds.windows.len() <= 255 {
        payload.write_u8(wds.windows.len() as u8)?;
    } else {
        return Err(WriteError::TooManyWindowDefinitions)
    }

    for window in wds.windows.iter() {
        payload.write_u8(window.id)?;
        payload.write_u16::<BigEndian>(window.x)?;
        payload.write_u16::<BigEndian>(window.y)?;
        payload.write_u16::<BigEndian>(window.width)?;
        payload.write_u16::<BigEndian>(window.height)?;
    }

    Ok(payload)
}

fn generate_pds(pds: &PaletteDefinitionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    if pds.entries.len() > 256 {
        return Err(WriteError::TooManyPaletteEntries)
    }

    payload.write_u8(pds.id)?;
    payload.write_u8(pds.version)?;

    for entry in &pds.entries {
        payload.write_u8(entry.id)?;
        payload.write_u8(entry.y)?;
        payload.write_u8(entry.cr)?;
        payload.write_u8(entry.cb)?;
        payload.write_u8(entry.alpha)?;
    }

    Ok(payload)
}

fn generate_sods(sods: &SingleObjectDefinitionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u16::<BigEndian>(sods.id)?;
    payload.write_u8(sods.version)?;
    payload.write_u8(0xC0)?;
    write_object_length(&mut payload, sods.data.len() + 4)?;
    payload.write_u16::<BigEndian>(sods.width)?;
    payload.write_u16::<BigEndian>(sods.height)?;
    payload.write_all(&sods.data)?;

    Ok(payload)
}

fn generate_iods(iods: &InitialObjectDefinitionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u16::<BigEndian>(iods.id)?;
    payload.write_u8(iods.version)?;
    payload.write_u8(0x80)?;
    write_object_length(&mut payload, iods.length)?;
    payload.write_u16::<BigEndian>(iods.width)?;
    payload.write_u16::<BigEndian>(iods.height)?;
    payload.write_all(&iods.data)?;

    Ok(payload)
}

fn generate_mods(mods: &MiddleObjectDefinitionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u16::<BigEndian>(mods.id)?;
    payload.write_u8(mods.version)?;
    payload.write_u8(0x00)?;
    payload.write_all(&mods.data)?;

    Ok(payload)
}

fn generate_fods(fods: &FinalObjectDefinitionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u16::<BigEndian>(fods.id)?;
    payload.write_u8(fods.version)?;
    payload.write_u8(0x40)?;
    payload.write_all(&fods.data)?;

    Ok(payload)
}

fn write_object_length(payload: &mut Vec<u8>, length: usize) -> WriteResult<()> {

    if length <= 16_777_215 {
        payload.write_u24::<BigEndian>(length as u32)?;
    } else {
        return Err(WriteError::ObjectDataTooLarge)
    }

    Ok(())
}
