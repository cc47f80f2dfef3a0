/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Runs a whole document through every stage, from raw cues to a written stream.
//!
//! Layout, rasterization, and quantization are independent per cue and run in parallel. Their
//! results are gathered in cue order before the encoder, which sees the timeline as a whole,
//! runs on the calling thread.


use super::{
    config::{CancelToken, RenderConfig, TargetVideoInfo},
    document::ParsedSubtitleDocument,
    encode::{CueFrame, EncoderSettings, SegmentEncoder},
    error::{Diagnostic, RenderError, RenderResult},
    font::GlyphSource,
    layout::{layout, CanvasSpec},
    normalize::{normalize, CueError, RenderCue},
    quantize::quantize,
    raster::rasterize,
};
use rayon::prelude::*;
use std::io::Write;
use tracing::{debug, info};

/// The outcome of rendering one document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderReport {
    /// Language of the document, for the track metadata of the remuxed file.
    pub language: Option<String>,
    pub cues_rendered: usize,
    /// Cues that were skipped, and why.
    pub cue_errors: Vec<CueError>,
    pub diagnostics: Vec<Diagnostic>,
    pub display_sets: usize,
    pub object_definitions: usize,
    pub cancelled: bool,
}

struct Rendered {
    frame: CueFrame,
    diagnostics: Vec<Diagnostic>,
}

/// Renders a document into a stream written to `sink`.
///
/// Problems with single cues are collected into the report. Errors are returned only for
/// problems that make the stream as a whole unusable.
pub fn render<W: Write>(
    document: &ParsedSubtitleDocument,
    video: &TargetVideoInfo,
    config: &RenderConfig,
    glyphs: &dyn GlyphSource,
    cancel: &CancelToken,
    sink: W,
) -> RenderResult<RenderReport> {

    if config.canvas_width == 0 || config.canvas_height == 0 {
        return Err(RenderError::InvalidCanvas {
            width: config.canvas_width,
            height: config.canvas_height,
        })
    }

    let normalized = normalize(document, config, video.dynamic_range);
    let canvas = CanvasSpec::new(config, video);
    let mut report = RenderReport {
        language: document.language.clone(),
        cue_errors: normalized.errors,
        diagnostics: normalized.diagnostics,
        ..Default::default()
    };

    debug!(
        "Rendering {} cues onto a {}x{} canvas with content box {:?}.",
        normalized.cues.len(),
        canvas.output_width,
        canvas.output_height,
        canvas.content_box(),
    );

    let rendered = normalized.cues
        .par_iter()
        .map(|cue| render_cue(cue, &canvas, glyphs, cancel))
        .collect::<Vec<Option<Rendered>>>();

    if cancel.is_cancelled() {
        info!("Render cancelled before encoding.");
        report.cancelled = true;
        return Ok(report)
    }

    let mut frames = Vec::<CueFrame>::with_capacity(rendered.len());

    for rendered in rendered.into_iter().flatten() {
        report.diagnostics.extend(rendered.diagnostics);
        frames.push(rendered.frame);
    }

    report.cues_rendered = frames.len();

    let settings = EncoderSettings {
        width: config.canvas_width,
        height: config.canvas_height,
        frame_rate: video.frame_rate,
    };
    let summary = SegmentEncoder::new(sink, settings).encode(&frames, cancel)?;

    report.diagnostics.extend(summary.diagnostics);
    report.display_sets = summary.display_sets;
    report.object_definitions = summary.object_definitions;
    report.cancelled = summary.cancelled;

    Ok(report)
}

/// Takes one cue through layout, rasterization, and quantization, or returns `None` once the
/// batch has been cancelled.
fn render_cue(
    cue: &RenderCue,
    canvas: &CanvasSpec,
    glyphs: &dyn GlyphSource,
    cancel: &CancelToken,
) -> Option<Rendered> {

    let mut diagnostics = Vec::new();

    if cancel.is_cancelled() {
        return None
    }

    let laid_out = layout(cue, canvas, glyphs);

    if let Some(warning) = laid_out.overflow {
        diagnostics.push(Diagnostic::Overflow(warning));
    }
    if cancel.is_cancelled() {
        return None
    }

    let bitmap = rasterize(&laid_out, glyphs);

    if cancel.is_cancelled() {
        return None
    }

    let image = bitmap.map(|bitmap| {
        let quantized = quantize(&bitmap);
        if let Some(colors) = quantized.reduced_from {
            diagnostics.push(Diagnostic::PaletteReduced { cue: cue.index, colors });
        }
        quantized.image
    });

    if image.is_none() {
        debug!("Cue {} has nothing visible to draw.", cue.index);
    }

    Some(
        Rendered {
            frame: CueFrame {
                cue: cue.index,
                start_ms: cue.start_ms,
                end_ms: cue.end_ms,
                z_index: cue.region.z_index,
                region: canvas.region_rect(&cue.region),
                image,
            },
            diagnostics,
        }
    )
}
