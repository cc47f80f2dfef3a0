/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Models the timing a compliant decoder is held to.
//!
//! Object data is decoded at a fixed rate into the object buffer and then composed into the
//! graphics plane at a much higher rate. A display set has to be scheduled so that all of its
//! objects are decoded, and its windows drawn, before the composition's PTS arrives. All
//! durations here are expressed in 90 kHz ticks.
//!
//! Window write time is charged for the windows a display set defines. A decoder redraws the
//! epoch's windows for every composition, clearing ones included, so a stream that leaves the
//! window definition out of its normal display sets is charged nothing for those redraws. The
//! encoder in this workspace repeats the epoch's window definition in each display set for
//! that reason.

#[cfg(test)]
mod tests;

use super::TICKS_PER_SECOND;

/// The rate, in bits per second, at which object data is decoded.
pub const OBJECT_DECODE_RATE: u64 = 128_000_000;

/// The rate, in bits per second, at which the graphics plane is written.
pub const COMPOSITION_RATE: u64 = 3_200_000_000;

/// The most composition objects a single composition may show.
pub const MAX_COMPOSITION_OBJECTS: usize = 2;

/// The most windows a single epoch may define.
pub const MAX_WINDOWS: usize = 2;

/// The ticks needed to decode an object of the given dimensions.
pub fn object_decode_ticks(width: u16, height: u16) -> u32 {
    transfer_ticks(width as u64 * height as u64, OBJECT_DECODE_RATE)
}

/// The ticks needed to clear the whole graphics plane at the start of an epoch.
pub fn plane_initialization_ticks(width: u16, height: u16) -> u32 {
    transfer_ticks(width as u64 * height as u64, COMPOSITION_RATE)
}

/// The ticks needed to draw a window into the graphics plane.
pub fn window_write_ticks(width: u16, height: u16) -> u32 {
    transfer_ticks(width as u64 * height as u64, COMPOSITION_RATE)
}

fn transfer_ticks(pixels: u64, rate: u64) -> u32 {

    let bits = pixels * 8 * TICKS_PER_SECOND;

    ((bits + rate - 1) / rate) as u32
}
