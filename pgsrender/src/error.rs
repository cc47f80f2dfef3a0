/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    encode::EncodeError,
    font::FontError,
    layout::OverflowWarning,
};
use std::{
    fmt::{self, Display, Formatter},
    io::Error as IoError,
};
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for render passes.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that abort the render of a whole file.
#[derive(ThisError, Debug)]
pub enum RenderError {
    #[error("stream encoding error")]
    EncodeError {
        #[from]
        source: EncodeError,
    },
    #[error("font error")]
    FontError {
        #[from]
        source: FontError,
    },
    #[error("output error")]
    IoError {
        #[from]
        source: IoError,
    },
    #[error("canvas of {width}x{height} is not usable")]
    InvalidCanvas {
        width: u16,
        height: u16,
    },
}

/// A non-fatal observation about a render pass, for the caller to surface.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// A cue's text does not fit its region and was clipped.
    Overflow(OverflowWarning),
    /// The configured offset moved a cue before zero, so it was clamped or dropped.
    OffsetClamped {
        cue: usize,
    },
    /// The first composition could not be decoded in time and is shown later than asked.
    PresentationDelayed {
        cue: usize,
        requested_pts: u32,
        pts: u32,
    },
    /// A bitmap had more colors than a palette holds and was reduced.
    PaletteReduced {
        cue: usize,
        colors: usize,
    },
    /// Overlapping or surplus bitmaps were combined into one object.
    ObjectsMerged {
        cues: Vec<usize>,
    },
}

impl Display for Diagnostic {

    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Overflow(warning) => {
                write!(
                    f,
                    "cue {} needs {}x{} pixels but its region is {}x{}; text is clipped",
                    warning.cue,
                    warning.needed_width,
                    warning.needed_height,
                    warning.region_width,
                    warning.region_height,
                )
            }
            Diagnostic::OffsetClamped { cue } => {
                write!(f, "cue {} was clamped to zero by the time offset", cue)
            }
            Diagnostic::PresentationDelayed { cue, requested_pts, pts } => {
                write!(
                    f,
                    "cue {} is presented at {} instead of {} to leave time for decoding",
                    cue,
                    pgs::ts_to_timestamp(*pts),
                    pgs::ts_to_timestamp(*requested_pts),
                )
            }
            Diagnostic::PaletteReduced { cue, colors } => {
                write!(f, "cue {} had {} colors and was reduced to a 255-color palette", cue, colors)
            }
            Diagnostic::ObjectsMerged { cues } => {
                write!(f, "cues {:?} were merged into one object", cues)
            }
        }
    }
}
