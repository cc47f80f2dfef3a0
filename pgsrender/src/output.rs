/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Renders straight to a file.
//!
//! The stream goes to a temporary file in the destination's directory and only replaces the
//! destination once the render has finished. A failed or cancelled render never leaves a
//! truncated stream under the destination's name.

#[cfg(test)]
mod tests;

use super::{
    config::{CancelToken, RenderConfig, TargetVideoInfo},
    document::ParsedSubtitleDocument,
    error::RenderResult,
    font::GlyphSource,
    pipeline::{render, RenderReport},
};
use std::{
    io::{BufWriter, Write},
    path::Path,
};
use tempfile::{Builder as TempFileBuilder, NamedTempFile};
use tracing::{info, warn};

/// Renders a document into the file at `path`.
pub fn render_to_path<P: AsRef<Path>>(
    path: P,
    document: &ParsedSubtitleDocument,
    video: &TargetVideoInfo,
    config: &RenderConfig,
    glyphs: &dyn GlyphSource,
    cancel: &CancelToken,
) -> RenderResult<RenderReport> {

    let path = path.as_ref();
    let directory = path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp_file = TempFileBuilder::new()
        .prefix(".pgsrender-")
        .suffix(".sup.tmp")
        .tempfile_in(directory)?;
    let result = {
        let mut writer = BufWriter::new(temp_file.as_file());
        render(document, video, config, glyphs, cancel, &mut writer).and_then(|report| {
            writer.flush()?;
            Ok(report)
        })
    };

    match result {
        Ok(report) if !report.cancelled => {
            temp_file.persist(path).map_err(|err| err.error)?;
            info!("Wrote {} display sets to {:?}.", report.display_sets, path);
            Ok(report)
        }
        outcome => {
            discard(temp_file, config.cleanup_temp_files);
            outcome
        }
    }
}

fn discard(temp_file: NamedTempFile, cleanup: bool) {

    if cleanup {
        let path = temp_file.path().to_path_buf();
        if let Err(err) = temp_file.close() {
            warn!("Could not remove temporary file {:?}: {}", path, err);
        }
        return
    }

    match temp_file.keep() {
        Ok((_, path)) => warn!("Keeping partial output in {:?}.", path),
        Err(err) => warn!("Could not keep temporary file: {}", err),
    }
}
