/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use pgs::{
    ts_to_timestamp,
    segment::{
        CompositionState,
        ReadSegmentExt,
        Segment,
        ReadError,
    },
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
        .after_help(format!("This utility will dump PGS subtitle bitstream data.\n\n\
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
    let mut count = 0_usize;

    eprintln!("Iterating through PGS segments...");

    //
    // READ
    //

    loop {

        match input.read_segment() {
            Ok(segment) => {
                count += 1;
                match segment {
                    Segment::PresentationComposition(pcs) => {
                        println!(
                            "presentation_composition_segment({}, dts {})",
                            ts_to_timestamp(pcs.pts),
                            ts_to_timestamp(pcs.dts),
                        );
                        println!("  video_width = {}", pcs.width);
                        println!("  video_height = {}", pcs.height);
                        println!("  frame_rate = 0x{:02X}", pcs.frame_rate);
                        println!("  composition_number = {}", pcs.composition_number);
                        println!("  composition_state = {}", match pcs.composition_state {
                            CompositionState::EpochStart => "EPOCH_START",
                            CompositionState::Normal => "NORMAL_CASE",
                            CompositionState::AcquisitionPoint => "ACQUISITION_POINT",
                        });
                        if let Some(pal_id) = pcs.palette_update_id {
                            println!("  palette_update_id = {}", pal_id);
                        }
                        for comp_obj in pcs.composition_objects.iter() {
                            println!("  composition_object");
                            println!("    object_id = {}", comp_obj.object_id);
                            println!("    window_id = {}", comp_obj.window_id);
                            println!("    object_horizontal_position = {}", comp_obj.x);
                            println!("    object_vertical_position = {}", comp_obj.y);
                            println!("    forced_on = {}", comp_obj.forced);
                            if let Some(crop) = &comp_obj.crop {
                                println!("    object_cropping_horizontal_position = {}", crop.x);
                                println!("    object_cropping_vertical_position = {}", crop.y);
                                println!("    object_cropping_width = {}", crop.width);
                                println!("    object_cropping_height = {}", crop.height);
                            }
                        }
                    }
                    Segment::WindowDefinition(wds) => {
                        println!(
                            "window_definition_segment({}, dts {})",
                            ts_to_timestamp(wds.pts),
                            ts_to_timestamp(wds.dts),
                        );
                        for wd in wds.windows.iter() {
                            println!("  window_id = {}", wd.id);
                            println!("  window_horizontal_position = {}", wd.x);
                            println!("  window_vertical_position = {}", wd.y);
                            println!("  window_width = {}", wd.width);
                            println!("  window_height = {}", wd.height);
                        }
                    }
                    Segment::SingleObjectDefinition(sods) => {
                        println!(
                            "single_object_definition_segment({}, dts {})",
                            ts_to_timestamp(sods.pts),
                            ts_to_timestamp(sods.dts),
                        );
                        println!("  object_id = {}", sods.id);
                        println!("  object_version = {}", sods.version);
                        println!("  object_width = {}", sods.width);
                        println!("  object_height = {}", sods.height);
                        println!("  object_data = [{}]", sods.data.len());
                    }
                    Segment::InitialObjectDefinition(iods) => {
                        println!(
                            "initial_object_definition_segment({}, dts {})",
                            ts_to_timestamp(iods.pts),
                            ts_to_timestamp(iods.dts),
                        );
                        println!("  object_id = {}", iods.id);
                        println!("  object_version = {}", iods.version);
                        println!("  object_length = {}", iods.length);
                        println!("  object_width = {}", iods.width);
                        println!("  object_height = {}", iods.height);
                        println!("  object_data = [{}]", iods.data.len());
                    }
                    Segment::MiddleObjectDefinition(mods) => {
                        println!(
                            "middle_object_definition_segment({}, dts {})",
                            ts_to_timestamp(mods.pts),
                            ts_to_timestamp(mods.dts),
                        );
                        println!("  object_id = {}", mods.id);
                        println!("  object_version = {}", mods.version);
                        println!("  object_data = [{}]", mods.data.len());
                    }
                    Segment::FinalObjectDefinition(fods) => {
                        println!(
                            "final_object_definition_segment({}, dts {})",
                            ts_to_timestamp(fods.pts),
                            ts_to_timestamp(fods.dts),
                        );
                        println!("  object_id = {}", fods.id);
                        println!("  object_version = {}", fods.version);
                        println!("  object_data = [{}]", fods.data.len());
                    }
                    Segment::PaletteDefinition(pds) => {
                        println!(
                            "palette_definition_segment({}, dts {})",
                            ts_to_timestamp(pds.pts),
                            ts_to_timestamp(pds.dts),
                        );
                        println!("  palette_id = {}", pds.id);
                        println!("  palette_version = {}", pds.version);
                        println!("  palette_entries = [{}]", pds.entries.len());
                    }
                    Segment::End(es) => {
                        println!("end_segment({})", ts_to_timestamp(es.pts));
                        println!();
                    }
                }
            }
            Err(ReadError::IoError { source }) if source.kind() == ErrorKind::UnexpectedEof => {
                break
            }
            Err(err) => {
                eprintln!("Could not read segment {}: {}", count + 1, err);
                exit(1)
            }
        };
    }

    eprintln!("Read {} segments.", count);
}
