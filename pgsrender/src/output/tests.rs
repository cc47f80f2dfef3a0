/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use crate::{
    document::{RawCue, RawRun},
    error::RenderError,
    font::BlockGlyphs,
};
use std::{fs, path::PathBuf};

fn document() -> ParsedSubtitleDocument {
    ParsedSubtitleDocument {
        cues: vec![
            RawCue {
                start_ms: 1_000,
                end_ms: 2_000,
                runs: vec![RawRun { text: "output".to_string(), ..Default::default() }],
                ..Default::default()
            },
        ],
        ..Default::default()
    }
}

fn entries(directory: &Path) -> Vec<PathBuf> {

    let mut entries = fs::read_dir(directory).unwrap()
        .map(|entry| entry.unwrap().path())
        .collect::<Vec<PathBuf>>();

    entries.sort();

    entries
}

#[test]
fn test_render_to_path() {

    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("out.sup");
    let report = render_to_path(
        &path,
        &document(),
        &TargetVideoInfo::default(),
        &RenderConfig::default(),
        &BlockGlyphs,
        &CancelToken::new(),
    ).unwrap();

    assert_eq!(report.display_sets, 2);
    assert_eq!(entries(directory.path()), vec![path.clone()]);
    assert_eq!(&fs::read(&path).unwrap()[..2], b"PG");
}

#[test]
fn test_cancelled_render_is_removed() {

    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("out.sup");
    let cancel = CancelToken::new();

    cancel.cancel();

    let report = render_to_path(
        &path,
        &document(),
        &TargetVideoInfo::default(),
        &RenderConfig::default(),
        &BlockGlyphs,
        &cancel,
    ).unwrap();

    assert!(report.cancelled);
    assert!(entries(directory.path()).is_empty());
}

#[test]
fn test_cancelled_render_is_kept() {

    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("out.sup");
    let cancel = CancelToken::new();
    let config = RenderConfig { cleanup_temp_files: false, ..Default::default() };

    cancel.cancel();

    render_to_path(
        &path,
        &document(),
        &TargetVideoInfo::default(),
        &config,
        &BlockGlyphs,
        &cancel,
    ).unwrap();

    let entries = entries(directory.path());

    assert_eq!(entries.len(), 1);
    assert!(!path.exists());
    assert!(entries[0].to_string_lossy().ends_with(".sup.tmp"));
}

#[test]
fn test_failed_render_is_removed() {

    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("out.sup");
    let config = RenderConfig { canvas_width: 0, ..Default::default() };
    let result = render_to_path(
        &path,
        &document(),
        &TargetVideoInfo::default(),
        &config,
        &BlockGlyphs,
        &CancelToken::new(),
    );

    assert!(matches!(result, Err(RenderError::InvalidCanvas { .. })));
    assert!(entries(directory.path()).is_empty());
}
