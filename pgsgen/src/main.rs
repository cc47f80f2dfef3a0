/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use pgsrender::{
    config::{AspectRatio, FrameRate},
    font::FontError,
    render,
    render_to_path,
    CancelToken,
    DynamicRange,
    FontStack,
    ParsedSubtitleDocument,
    RenderConfig,
    RenderError,
    RenderReport,
    TargetVideoInfo,
};
use std::{
    error::Error,
    fs,
    io::{stderr, stdout, BufWriter, Error as IoError, Write},
    process::exit,
    str::FromStr,
};
use clap::{
    app_from_crate,
    crate_authors,
    crate_description,
    crate_name,
    crate_version,
    Arg,
    ArgMatches,
};
use thiserror::Error as ThisError;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(ThisError, Debug)]
enum GenError {
    #[error("could not read {path}")]
    ReadError {
        path: String,
        source: IoError,
    },
    #[error("could not parse {path}")]
    JsonError {
        path: String,
        source: serde_json::Error,
    },
    #[error("could not load fonts")]
    FontError {
        #[from]
        source: FontError,
    },
    #[error("could not render subtitles")]
    RenderError {
        #[from]
        source: RenderError,
    },
    #[error("could not write to STDOUT")]
    OutputError {
        source: IoError,
    },
}

fn main() {

    let matches = app_from_crate!()
        .arg(Arg::with_name("font")
            .long("font")
            .short("f")
            .value_name("FONT-FILE")
            .help("Font to draw with; repeat to add fallbacks in order")
            .takes_value(true)
            .multiple(true)
            .number_of_values(1)
            .required(true)
        )
        .arg(Arg::with_name("video-info")
            .long("video-info")
            .short("i")
            .value_name("JSON-FILE")
            .help("Target video properties as reported by a metadata probe")
            .takes_value(true)
            .required(false)
        )
        .arg(Arg::with_name("config")
            .long("config")
            .short("c")
            .value_name("JSON-FILE")
            .help("Render settings to start from; other options override them")
            .takes_value(true)
            .required(false)
        )
        .arg(Arg::with_name("width")
            .long("width")
            .value_name("PIXELS")
            .help("Width of the target video")
            .takes_value(true)
            .required(false)
            .validator(is_parsable::<u32>)
        )
        .arg(Arg::with_name("height")
            .long("height")
            .value_name("PIXELS")
            .help("Height of the target video")
            .takes_value(true)
            .required(false)
            .validator(is_parsable::<u32>)
        )
        .arg(Arg::with_name("hdr")
            .long("hdr")
            .help("Treats the target video as HDR")
        )
        .arg(Arg::with_name("fps")
            .long("fps")
            .value_name("RATE")
            .help("Frame rate of the target video, such as 23.976 or 24000/1001")
            .takes_value(true)
            .required(false)
            .validator(is_parsable::<FrameRate>)
        )
        .arg(Arg::with_name("offset-ms")
            .long("offset-ms")
            .value_name("MILLISECONDS")
            .help("Shifts every cue; write negative values as --offset-ms=-500")
            .takes_value(true)
            .required(false)
            .validator(is_parsable::<i64>)
        )
        .arg(Arg::with_name("force-16-9")
            .long("force-16-9")
            .help("Places regions on the full canvas, ignoring letterboxing")
        )
        .arg(Arg::with_name("aspect")
            .long("aspect")
            .value_name("W:H")
            .help("Overrides the aspect ratio of the picture inside the video")
            .takes_value(true)
            .required(false)
            .validator(is_parsable::<AspectRatio>)
        )
        .arg(Arg::with_name("auto-color")
            .long("auto-color")
            .help("Replaces document colors with a preset suited to SDR or HDR")
        )
        .arg(Arg::with_name("selected-only")
            .long("selected-only")
            .help("Renders only the cues marked as selected")
        )
        .arg(Arg::with_name("keep-temp")
            .long("keep-temp")
            .help("Keeps the partial output of a failed render")
        )
        .arg(Arg::with_name("verbose")
            .long("verbose")
            .short("v")
            .help("Logs every decision the encoder makes")
        )
        .arg(Arg::with_name("document")
            .index(1)
            .value_name("DOCUMENT-FILE")
            .help("Parsed subtitle document in JSON form")
            .required(true)
        )
        .arg(Arg::with_name("output")
            .index(2)
            .value_name("OUTPUT-FILE")
            .help("Output PGS file; use - for STDOUT")
            .required(true)
        )
        .after_help(format!("This utility will render timed text subtitles into a PGS \
            elementary stream that can be muxed alongside the video it was made for.\n\n\
            Copyright © 2021 William Swartzendruber\n\
            Licensed under the Mozilla Public License 2.0\n\
            <{}>", env!("CARGO_PKG_REPOSITORY")).as_str())
        .get_matches();

    init_logging(matches.is_present("verbose"));

    match run(&matches) {
        Ok(report) => {
            for err in report.cue_errors.iter() {
                eprintln!("Skipped: {}", err);
            }
            for diagnostic in report.diagnostics.iter() {
                eprintln!("Warning: {}", diagnostic);
            }
            if let Some(language) = &report.language {
                eprintln!("Language: {}", language);
            }
            eprintln!(
                "Rendered {} cues into {} display sets with {} objects.",
                report.cues_rendered,
                report.display_sets,
                report.object_definitions,
            );
        }
        Err(err) => {
            eprintln!("Error: {}", describe(&err));
            exit(1)
        }
    }
}

fn run(matches: &ArgMatches) -> Result<RenderReport, GenError> {

    let document_path = matches.value_of("document").unwrap_or_default();
    let document = serde_json::from_slice::<ParsedSubtitleDocument>(&read(document_path)?)
        .map_err(|source| GenError::JsonError { path: document_path.to_string(), source })?;
    let mut video = match matches.value_of("video-info") {
        Some(path) => serde_json::from_slice::<TargetVideoInfo>(&read(path)?)
            .map_err(|source| GenError::JsonError { path: path.to_string(), source })?,
        None => TargetVideoInfo::default(),
    };
    let mut config = match matches.value_of("config") {
        Some(path) => serde_json::from_slice::<RenderConfig>(&read(path)?)
            .map_err(|source| GenError::JsonError { path: path.to_string(), source })?,
        None => RenderConfig::default(),
    };

    if let Some(width) = value_of(matches, "width") {
        video.width = width;
    }
    if let Some(height) = value_of(matches, "height") {
        video.height = height;
    }
    if matches.is_present("hdr") {
        video.dynamic_range = DynamicRange::Hdr;
    }
    if let Some(frame_rate) = value_of(matches, "fps") {
        video.frame_rate = frame_rate;
    }
    if let Some(offset_ms) = value_of(matches, "offset-ms") {
        config.offset_ms = offset_ms;
    }
    if let Some(aspect_ratio) = value_of(matches, "aspect") {
        config.override_content_aspect_ratio = Some(aspect_ratio);
    }

    config.force_16_9 |= matches.is_present("force-16-9");
    config.auto_color |= matches.is_present("auto-color");
    config.render_only_selected_cues |= matches.is_present("selected-only");
    config.cleanup_temp_files &= !matches.is_present("keep-temp");

    debug!("Target video: {:?}", video);
    debug!("Render settings: {:?}", config);

    let fonts = matches.values_of("font").map(|values| values.collect::<Vec<&str>>()).unwrap_or_default();
    let glyphs = FontStack::from_paths(&fonts)?;
    let cancel = CancelToken::new();
    let output_value = matches.value_of("output").unwrap_or("-");

    info!("Rendering {} cues from {}.", document.cues.len(), document_path);

    if output_value == "-" {
        let mut output = BufWriter::new(stdout());
        let report = render(&document, &video, &config, &glyphs, &cancel, &mut output)?;
        output.flush().map_err(|source| GenError::OutputError { source })?;
        Ok(report)
    } else {
        Ok(render_to_path(output_value, &document, &video, &config, &glyphs, &cancel)?)
    }
}

fn init_logging(verbose: bool) {

    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).ok();
}

fn read(path: &str) -> Result<Vec<u8>, GenError> {
    fs::read(path).map_err(|source| GenError::ReadError { path: path.to_string(), source })
}

fn value_of<T: FromStr>(matches: &ArgMatches, name: &str) -> Option<T> {
    matches.value_of(name).and_then(|value| value.parse::<T>().ok())
}

fn is_parsable<T: FromStr>(value: String) -> Result<(), String> {
    match value.parse::<T>() {
        Ok(_) => Ok(()),
        Err(_) => Err(format!("\"{}\" is not a valid value", value)),
    }
}

/// Joins an error with all of its causes.
fn describe(err: &dyn Error) -> String {

    let mut description = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }

    description
}
