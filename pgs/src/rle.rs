/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Compresses and decompresses object pixel data.
//!
//! Each pixel is a palette index. A non-zero byte is a literal index, while a zero byte starts
//! one of these sequences:
//!
//! | Bytes          | Meaning                                    |
//! |----------------|--------------------------------------------|
//! | `00 00`        | end of line                                |
//! | `00 NN`        | index 0, `NN` (1-63) times                 |
//! | `00 4N NN`     | index 0, `N NN` (64-16,383) times          |
//! | `00 8N CC`     | index `CC`, `N` (3-63) times               |
//! | `00 CN NN CC`  | index `CC`, `N NN` (64-16,383) times       |
//!
//! Runs never cross a line boundary and every line, including a fully transparent one, is
//! terminated by its own end-of-line marker.


use thiserror::Error as ThisError;

/// The longest run a single sequence can describe.
pub const MAX_RUN: usize = 16_383;

/// A specialized [`Result`](std::result::Result) type for decompression.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// The error type for [decode].
#[derive(ThisError, Debug, PartialEq)]
pub enum DecodeError {
    /// The data ended in the middle of a sequence.
    #[error("object data ends in the middle of a run")]
    TruncatedRun,
    /// A line decoded to a different number of pixels than the object's width.
    #[error("object line {line} has {found} pixels instead of {expected}")]
    LineWidthMismatch {
        line: usize,
        found: usize,
        expected: usize,
    },
    /// The data decoded to a different number of lines than the object's height.
    #[error("object has {found} lines instead of {expected}")]
    LineCountMismatch {
        found: usize,
        expected: usize,
    },
}

/// Compresses rows of palette indices.
pub fn encode(pixels: &[u8], width: usize) -> Vec<u8> {

    let mut output = Vec::<u8>::with_capacity(pixels.len() / 4);

    if width == 0 {
        return output
    }

    for line in pixels.chunks(width) {

        let mut byte = line[0];
        let mut count = 0_usize;

        for &next_byte in line {
            if next_byte == byte {
                count += 1;
            } else {
                output_rle_sequence(&mut output, byte, count);
                byte = next_byte;
                count = 1;
            }
        }

        output_rle_sequence(&mut output, byte, count);
        output.push(0x00);
        output.push(0x00);
    }

    output
}

fn output_rle_sequence(output: &mut Vec<u8>, byte: u8, mut count: usize) {

    while count > 0 {

        let run = count.min(MAX_RUN);

        if byte == 0x00 {
            match run {
                1 ..= 63 => {
                    output.push(0x00);
                    output.push(run as u8);
                }
                _ => {
                    output.push(0x00);
                    output.push(0x40 | (run >> 8) as u8);
                    output.push((run & 0xFF) as u8);
                }
            }
        } else {
            match run {
                1 => {
                    output.push(byte);
                }
                2 => {
                    output.push(byte);
                    output.push(byte);
                }
                3 ..= 63 => {
                    output.push(0x00);
                    output.push(0x80 | run as u8);
                    output.push(byte);
                }
                _ => {
                    output.push(0x00);
                    output.push(0xC0 | (run >> 8) as u8);
                    output.push((run & 0xFF) as u8);
                    output.push(byte);
                }
            }
        }

        count -= run;
    }
}

/// Decompresses object data into its lines of palette indices.
pub fn decode(data: &[u8], width: usize, height: usize) -> DecodeResult<Vec<Vec<u8>>> {

    let mut lines = Vec::<Vec<u8>>::with_capacity(height);
    let mut line = Vec::<u8>::with_capacity(width);
    let mut pos = 0;

    while pos < data.len() {

        let byte1 = data[pos];
        pos += 1;

        if byte1 != 0x00 {
            line.push(byte1);
            continue
        }

        let byte2 = *data.get(pos).ok_or(DecodeError::TruncatedRun)?;
        pos += 1;

        if byte2 == 0x00 {
            if line.len() != width {
                return Err(DecodeError::LineWidthMismatch {
                    line: lines.len(),
                    found: line.len(),
                    expected: width,
                })
            }
            lines.push(line);
            line = Vec::with_capacity(width);
            continue
        }

        let extended = byte2 & 0x40 != 0;
        let colored = byte2 & 0x80 != 0;
        let mut count = (byte2 & 0x3F) as usize;

        if extended {
            count = (count << 8) | *data.get(pos).ok_or(DecodeError::TruncatedRun)? as usize;
            pos += 1;
        }

        let value = if colored {
            let value = *data.get(pos).ok_or(DecodeError::TruncatedRun)?;
            pos += 1;
            value
        } else {
            0x00
        };

        line.resize(line.len() + count, value);
    }

    if !line.is_empty() {
        return Err(DecodeError::TruncatedRun)
    }

    if lines.len() != height {
        return Err(DecodeError::LineCountMismatch {
            found: lines.len(),
            expected: height,
        })
    }

    Ok(lines)
}
