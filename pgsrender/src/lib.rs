/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Renders styled, timed text subtitles into Presentation Graphics Streams.
//!
//! A render pass takes a [`ParsedSubtitleDocument`] through these stages:
//!
//! 1. [`normalize`] resolves regions, timing, and styles into render cues.
//! 2. [`layout`] places every character on the canvas, honoring letterboxing.
//! 3. [`raster`] draws each cue into an RGBA bitmap.
//! 4. [`quantize`] turns bitmaps into palette-indexed, run-length encoded images.
//! 5. [`encode`] schedules the images into display sets a decoder can keep up with.
//!
//! [`render`] drives the whole pass into any writer, and [`render_to_path`] into a file.

pub mod bitmap;
pub mod config;
pub mod document;
pub mod encode;
pub mod error;
pub mod font;
pub mod layout;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod quantize;
pub mod raster;
pub mod style;

pub use config::{CancelToken, DynamicRange, RenderConfig, TargetVideoInfo};
pub use document::ParsedSubtitleDocument;
pub use error::{Diagnostic, RenderError, RenderResult};
pub use font::{FontStack, GlyphSource};
pub use output::render_to_path;
pub use pipeline::{render, RenderReport};
