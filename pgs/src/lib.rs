/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Reads and writes Presentation Graphics Stream (PGS) bitstreams.
//!
//! The [`segment`] module handles individual segments on the wire, while the [`displayset`]
//! module groups them into the display sets a player actually decodes. The [`rle`],
//! [`color`], and [`decoder`] modules cover the object compression scheme, the YCbCr palette
//! space, and the timing model a compliant decoder is held to.

pub mod color;
pub mod decoder;
pub mod displayset;
pub mod rle;
pub mod segment;

/// The number of PGS timestamp ticks in one second.
pub const TICKS_PER_SECOND: u64 = 90_000;

/// Renders a 90 kHz timestamp as `HH:MM:SS.mmm`.
pub fn ts_to_timestamp(ts: u32) -> String {

    let ms = ts as u64 / 90;
    let hours = ms / 3_600_000;
    let minutes = ms / 60_000 % 60;
    let seconds = ms / 1_000 % 60;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}
