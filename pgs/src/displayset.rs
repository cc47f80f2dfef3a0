/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Operates on display sets.
//!
//! A display set (DS) is the group of segments, opened by a PCS and closed by an ES, that a
//! decoder turns into one composition on screen. Writing a [`DisplaySet`] derives the DTS and
//! PTS of every segment from the decoder model in [`decoder`](crate::decoder), so that each
//! object is fully decoded by the time the composition is presented.

#[cfg(test)]
mod tests;

mod displaysetread;
mod displaysetwrite;

pub use displaysetread::*;
pub use displaysetwrite::*;

use super::{
    decoder::{object_decode_ticks, plane_initialization_ticks, window_write_ticks},
    rle::{self, DecodeResult},
    segment::{CompositionState, Crop},
};
use std::collections::BTreeMap;

/// A complete composition as seen by the decoder.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct DisplaySet {
    /// The time at which the composition is presented.
    pub pts: u32,
    pub width: u16,
    pub height: u16,
    pub frame_rate: u8,
    pub palette_update_id: Option<u8>,
    /// The windows (re)defined by this display set.
    pub windows: BTreeMap<u8, Window>,
    /// The palettes (re)defined by this display set.
    pub palettes: BTreeMap<Vid<u8>, Palette>,
    /// The objects (re)defined by this display set.
    pub objects: BTreeMap<Vid<u16>, Object>,
    pub composition: Composition,
}

impl DisplaySet {

    /// The ticks a decoder needs between the start of decoding and presentation.
    ///
    /// Only windows carried in [`windows`](Self::windows) are counted as redrawn.
    pub fn decode_duration(&self) -> u32 {
        self.plane_initialization_duration()
            + self.object_decode_duration()
            + self.window_write_duration()
    }

    fn plane_initialization_duration(&self) -> u32 {
        match self.composition.state {
            CompositionState::EpochStart => plane_initialization_ticks(self.width, self.height),
            _ => 0,
        }
    }

    fn object_decode_duration(&self) -> u32 {
        self.objects.values()
            .map(|object| object_decode_ticks(object.width, object.height))
            .sum()
    }

    fn window_write_duration(&self) -> u32 {
        self.windows.values()
            .map(|window| window_write_ticks(window.width, window.height))
            .sum()
    }
}

/// Identifies a versioned palette or object.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Vid<T> {
    pub id: T,
    pub version: u8,
}

/// Identifies a composition object by the object it shows and the window it shows it in.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Cid {
    pub object_id: u16,
    pub window_id: u8,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Composition {
    pub number: u16,
    pub state: CompositionState,
    pub objects: BTreeMap<Cid, CompositionObject>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct CompositionObject {
    pub x: u16,
    pub y: u16,
    pub forced: bool,
    pub crop: Option<Crop>,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Window {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Window {

    /// Determines whether two windows share any pixel.
    pub fn overlaps(&self, other: &Window) -> bool {
        (self.x as u32) < other.x as u32 + other.width as u32
            && (other.x as u32) < self.x as u32 + self.width as u32
            && (self.y as u32) < other.y as u32 + other.height as u32
            && (other.y as u32) < self.y as u32 + self.height as u32
    }
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Palette {
    pub entries: BTreeMap<u8, PaletteEntry>,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PaletteEntry {
    pub y: u8,
    pub cr: u8,
    pub cb: u8,
    pub alpha: u8,
}

/// An object whose pixels are kept run-length encoded.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Object {
    pub width: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

impl Object {

    /// Builds an object from rows of palette indices.
    pub fn from_lines(lines: &[Vec<u8>]) -> Self {

        let width = lines.first().map(|line| line.len()).unwrap_or(0);

        Self {
            width: width as u16,
            height: lines.len() as u16,
            data: rle::encode(&lines.concat(), width),
        }
    }

    /// Decodes the object's rows of palette indices.
    pub fn lines(&self) -> DecodeResult<Vec<Vec<u8>>> {
        rle::decode(&self.data, self.width as usize, self.height as usize)
    }
}
