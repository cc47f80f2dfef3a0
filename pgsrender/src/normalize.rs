/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Turns raw cues into render cues.
//!
//! Every cue that survives normalization has valid timing, a resolved region, and a fully
//! resolved style per run. Bad cues are reported individually and skipped; they never stop
//! their siblings from rendering.


use super::{
    config::{DynamicRange, RenderConfig},
    document::{ParsedSubtitleDocument, RawCue, Region, WritingMode},
    error::Diagnostic,
    style::{AutoColorPreset, ResolvedStyle},
};
use thiserror::Error as ThisError;
use tracing::{debug, warn};

/// A problem confined to a single cue.
#[derive(ThisError, Clone, Debug, PartialEq)]
pub enum CueError {
    #[error("cue {cue} references unknown region \"{region}\"")]
    InvalidReference {
        cue: usize,
        region: String,
    },
    #[error("cue {cue} has invalid timing {start_ms} ms to {end_ms} ms")]
    InvalidTiming {
        cue: usize,
        start_ms: i64,
        end_ms: i64,
    },
}

impl CueError {

    /// The document index of the offending cue.
    pub fn cue(&self) -> usize {
        match self {
            CueError::InvalidReference { cue, .. } => *cue,
            CueError::InvalidTiming { cue, .. } => *cue,
        }
    }
}

/// A span of text with its final style.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub style: ResolvedStyle,
}

/// Ruby text attached to one run of a cue.
#[derive(Clone, Debug, PartialEq)]
pub struct RubyAnnotation {
    /// Index into the cue's text runs.
    pub run: usize,
    pub text: String,
}

/// A cue ready for layout. Times include the configured offset.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderCue {
    /// Position of the cue in the source document.
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text_runs: Vec<TextRun>,
    pub region_id: Option<String>,
    pub region: Region,
    pub writing_mode: WritingMode,
    pub ruby_annotations: Vec<RubyAnnotation>,
}

/// The outcome of normalizing a document.
#[derive(Clone, Debug, Default)]
pub struct Normalized {
    /// Cues sorted by start time, ties in document order.
    pub cues: Vec<RenderCue>,
    pub errors: Vec<CueError>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Normalizes every cue of a document.
pub fn normalize(
    document: &ParsedSubtitleDocument,
    config: &RenderConfig,
    dynamic_range: DynamicRange,
) -> Normalized {

    let mut normalized = Normalized::default();
    let auto_color = config.auto_color_preset(dynamic_range);

    for (index, raw_cue) in document.cues.iter().enumerate() {

        if config.render_only_selected_cues && !raw_cue.selected {
            debug!("Skipping unselected cue {}.", index);
            continue
        }

        match normalize_cue(index, raw_cue, document, config, auto_color) {
            Ok(Some((cue, clamped))) => {
                if clamped {
                    normalized.diagnostics.push(Diagnostic::OffsetClamped { cue: index });
                }
                normalized.cues.push(cue);
            }
            Ok(None) => {
                normalized.diagnostics.push(Diagnostic::OffsetClamped { cue: index });
            }
            Err(err) => {
                warn!("{}", err);
                normalized.errors.push(err);
            }
        }
    }

    // Stable, so cues starting together keep their document order.
    normalized.cues.sort_by_key(|cue| cue.start_ms);

    normalized
}

/// Returns the cue and whether the offset had to be clamped, or `None` when the offset
/// moved the whole cue before zero.
fn normalize_cue(
    index: usize,
    raw_cue: &RawCue,
    document: &ParsedSubtitleDocument,
    config: &RenderConfig,
    auto_color: Option<&AutoColorPreset>,
) -> Result<Option<(RenderCue, bool)>, CueError> {

    if raw_cue.start_ms < 0 || raw_cue.start_ms >= raw_cue.end_ms {
        return Err(CueError::InvalidTiming {
            cue: index,
            start_ms: raw_cue.start_ms,
            end_ms: raw_cue.end_ms,
        })
    }

    let region = match &raw_cue.region {
        Some(region_id) => {
            document.regions.get(region_id).cloned().ok_or_else(|| CueError::InvalidReference {
                cue: index,
                region: region_id.clone(),
            })?
        }
        None => Region::default(),
    };
    let start_ms = raw_cue.start_ms.saturating_add(config.offset_ms);
    let end_ms = raw_cue.end_ms.saturating_add(config.offset_ms);

    if end_ms <= 0 {
        warn!("Cue {} lies entirely before zero after applying the offset; skipping.", index);
        return Ok(None)
    }

    let clamped = start_ms < 0;

    if clamped {
        warn!("Cue {} starts before zero after applying the offset; clamping.", index);
    }

    let text_runs = raw_cue.runs.iter()
        .map(|run| TextRun {
            text: run.text.clone(),
            style: ResolvedStyle::resolve(
                &config.overrides,
                auto_color,
                &[&run.style, &raw_cue.style],
                &document.default_style,
            ),
        })
        .collect::<Vec<TextRun>>();
    let ruby_annotations = raw_cue.runs.iter()
        .enumerate()
        .filter_map(|(run, raw_run)| {
            raw_run.ruby.as_ref()
                .filter(|text| !text.is_empty())
                .map(|text| RubyAnnotation { run, text: text.clone() })
        })
        .collect::<Vec<RubyAnnotation>>();

    Ok(
        Some((
            RenderCue {
                index,
                start_ms: start_ms.max(0) as u64,
                end_ms: end_ms as u64,
                text_runs,
                region_id: raw_cue.region.clone(),
                writing_mode: raw_cue.writing_mode.unwrap_or(region.writing_mode),
                region,
                ruby_annotations,
            },
            clamped,
        ))
    )
}
