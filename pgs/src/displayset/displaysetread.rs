/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    Cid,
    Composition,
    CompositionObject,
    DisplaySet,
    Object,
    Palette,
    PaletteEntry,
    Vid,
    Window,
    super::segment::{
        ReadError as SegmentReadError,
        ReadSegmentExt,
        Segment,
    },
};
use std::{
    collections::BTreeMap,
    io::Read,
};
use thiserror::Error as ThisError;

pub type ReadResult<T> = Result<T, ReadError>;

#[derive(ThisError, Debug)]
pub enum ReadError {
    #[error("segment value error")]
    SegmentError {
        #[from]
        source: SegmentReadError,
    },
    #[error("first segment is not a presentation composition segment")]
    MissingPresentationCompositionSegment,
    #[error("segment is decoded before its presentation composition segment")]
    SegmentPrecedesComposition,
    #[error("unexpected presentation composition segment within display set")]
    UnexpectedPresentationCompositionSegment,
    #[error("duplicate window ID detected")]
    DuplicateWindowId,
    #[error("duplicate palette ID and version detected")]
    DuplicatePaletteVid,
    #[error("duplicate object ID and version detected")]
    DuplicateObjectVid,
    #[error("object fragment does not continue the object in progress")]
    UnexpectedObjectFragment,
    #[error("display set ended while an object was still incomplete")]
    IncompleteObject,
    #[error("fragmented object length does not match its data")]
    InconsistentObjectLength,
    #[error("composition references unknown window ID")]
    CompositionReferencesUnknownWindowId,
}

pub trait ReadDisplaySetExt {
    fn read_display_set(&mut self) -> ReadResult<DisplaySet>;
}

struct PartialObject {
    vid: Vid<u16>,
    length: usize,
    width: u16,
    height: u16,
    data: Vec<u8>,
}

impl<T> ReadDisplaySetExt for T where
    T: Read,
{

    fn read_display_set(&mut self) -> ReadResult<DisplaySet> {

        let mut windows = BTreeMap::<u8, Window>::new();
        let mut palettes = BTreeMap::<Vid<u8>, Palette>::new();
        let mut objects = BTreeMap::<Vid<u16>, Object>::new();
        let mut composition_objects = BTreeMap::<Cid, CompositionObject>::new();
        let mut partial: Option<PartialObject> = None;
        let first_seg = self.read_segment()?;
        let pcs = match first_seg {
            Segment::PresentationComposition(pcs) => pcs,
            _ => return Err(ReadError::MissingPresentationCompositionSegment),
        };

        loop {

            let segment = self.read_segment()?;

            if segment.dts() < pcs.dts {
                return Err(ReadError::SegmentPrecedesComposition)
            }

            match segment {
                Segment::PresentationComposition(_) => {
                    return Err(ReadError::UnexpectedPresentationCompositionSegment)
                }
                Segment::WindowDefinition(wds) => {
                    for wd in wds.windows.iter() {
                        if windows.contains_key(&wd.id) {
                            return Err(ReadError::DuplicateWindowId)
                        }
                        windows.insert(
                            wd.id,
                            Window {
                                x: wd.x,
                                y: wd.y,
                                width: wd.width,
                                height: wd.height,
                            },
                        );
                    }
                }
                Segment::PaletteDefinition(pds) => {
                    let vid = Vid {
                        id: pds.id,
                        version: pds.version,
                    };
                    if palettes.contains_key(&vid) {
                        return Err(ReadError::DuplicatePaletteVid)
                    }
                    palettes.insert(
                        vid,
                        Palette {
                            entries: pds.entries.iter().map(|pe|
                                (pe.id, PaletteEntry {
                                    y: pe.y,
                                    cr: pe.cr,
                                    cb: pe.cb,
                                    alpha: pe.alpha,
                                })
                            ).collect::<BTreeMap<u8, PaletteEntry>>()
                        },
                    );
                }
                Segment::SingleObjectDefinition(sods) => {
                    if partial.is_some() {
                        return Err(ReadError::UnexpectedObjectFragment)
                    }
                    insert_object(
                        &mut objects,
                        Vid { id: sods.id, version: sods.version },
                        Object {
                            width: sods.width,
                            height: sods.height,
                            data: sods.data,
                        },
                    )?;
                }
                Segment::InitialObjectDefinition(iods) => {
                    if partial.is_some() {
                        return Err(ReadError::UnexpectedObjectFragment)
                    }
                    partial = Some(PartialObject {
                        vid: Vid { id: iods.id, version: iods.version },
                        length: iods.length,
                        width: iods.width,
                        height: iods.height,
                        data: iods.data,
                    });
                }
                Segment::MiddleObjectDefinition(mods) => {
                    match partial.as_mut() {
                        Some(po) if po.vid == (Vid { id: mods.id, version: mods.version }) => {
                            po.data.extend_from_slice(&mods.data);
                        }
                        _ => return Err(ReadError::UnexpectedObjectFragment),
                    }
                }
                Segment::FinalObjectDefinition(fods) => {
                    match partial.take() {
                        Some(mut po) if po.vid == (Vid { id: fods.id, version: fods.version }) => {
                            po.data.extend_from_slice(&fods.data);
                            if po.data.len() + 4 != po.length {
                                return Err(ReadError::InconsistentObjectLength)
                            }
                            insert_object(
                                &mut objects,
                                po.vid,
                                Object {
                                    width: po.width,
                                    height: po.height,
                                    data: po.data,
                                },
                            )?;
                        }
                        _ => return Err(ReadError::UnexpectedObjectFragment),
                    }
                }
                Segment::End(_) => {
                    if partial.is_some() {
                        return Err(ReadError::IncompleteObject)
                    }
                    break
                }
            }
        }

        // Objects and palettes may have been defined by an earlier display set of the epoch,
        // so only windows defined here can be checked.
        for co in pcs.composition_objects.iter() {
            if !windows.is_empty() && !windows.contains_key(&co.window_id) {
                return Err(ReadError::CompositionReferencesUnknownWindowId)
            }
            composition_objects.insert(
                Cid {
                    object_id: co.object_id,
                    window_id: co.window_id,
                },
                CompositionObject {
                    x: co.x,
                    y: co.y,
                    forced: co.forced,
                    crop: co.crop.clone(),
                },
            );
        }

        let composition = Composition {
            number: pcs.composition_number,
            state: pcs.composition_state,
            objects: composition_objects,
        };

        Ok(
            DisplaySet {
                pts: pcs.pts,
                width: pcs.width,
                height: pcs.height,
                frame_rate: pcs.frame_rate,
                palette_update_id: pcs.palette_update_id,
                windows,
                palettes,
                objects,
                composition,
            }
        )
    }
}

fn insert_object(
    objects: &mut BTreeMap<Vid<u16>, Object>,
    vid: Vid<u16>,
    object: Object,
) -> ReadResult<()> {

    if objects.contains_key(&vid) {
        return Err(ReadError::DuplicateObjectVid)
    }

    objects.insert(vid, object);

    Ok(())
}
