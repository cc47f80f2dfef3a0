/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

mod validate;

use validate::Validator;
use pgs::{
    ts_to_timestamp,
    segment::{ReadError, ReadSegmentExt},
};
use std::{
    fs::File,
    io::{stdin, BufReader, ErrorKind, Read},
    process::exit,
};
use clap::{app_from_crate, crate_authors, crate_description, crate_name, crate_version, Arg};

fn main() {

    let matches = app_from_crate!()
        .arg(Arg::with_name("input")
            .index(1)
            .value_name("INPUT-FILE")
            .help("Input PGS file; use - for STDIN")
            .required(true)
        )
        .after_help(format!("This utility will test PGS subtitles against the timing and \
            composition limits of a compliant decoder.\n\n\
            Copyright © 2021 William Swartzendruber\n\
            Licensed under the Mozilla Public License 2.0\n\
            <{}>", env!("CARGO_PKG_REPOSITORY")).as_str())
        .get_matches();
    let input_value = matches.value_of("input").unwrap_or("-");
    let (mut stdin_read, mut file_read);
    let mut input = BufReader::<&mut dyn Read>::new(
        if input_value == "-" {
            stdin_read = stdin();
            &mut stdin_read
        } else {
            file_read = match File::open(input_value) {
                Ok(file) => file,
                Err(err) => {
                    eprintln!("Could not open input file {}: {}", input_value, err);
                    exit(1)
                }
            };
            &mut file_read
        }
    );
    let mut validator = Validator::new();

    eprintln!("Iterating through PGS segments...");

    //
    // READ
    //

    loop {

        match input.read_segment() {
            Ok(segment) => {
                if let Err(violation) = validator.check(&segment) {
                    eprintln!(
                        "Violation in segment at {}: {}",
                        ts_to_timestamp(segment.pts()),
                        violation,
                    );
                    exit(1)
                }
            }
            Err(ReadError::IoError { source }) if source.kind() == ErrorKind::UnexpectedEof => {
                break
            }
            Err(err) => {
                eprintln!("Could not read segment: {}", err);
                exit(1)
            }
        }
    }

    match validator.finish() {
        Ok(summary) => {
            println!(
                "Valid: {} segments in {} display sets across {} epochs, {} objects.",
                summary.segments,
                summary.display_sets,
                summary.epochs,
                summary.objects,
            );
        }
        Err(violation) => {
            eprintln!("Violation at end of stream: {}", violation);
            exit(1)
        }
    }
}
