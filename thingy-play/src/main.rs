// Thingy ADPCM
// Copyright (c) 2026 The Thingy ADPCM Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use symphonia_core::audio::{AsAudioBufferRef, Signal};
use thingy_adpcm::errors::{Error, Result};
use thingy_adpcm::staging;
use thingy_adpcm::{DecoderOptions, FramingMode, StreamDecoder};

use clap::{Arg, ArgMatches};
use log::{error, info, warn};

mod output;

#[cfg_attr(target_os = "linux", allow(dead_code))]
mod resampler;

fn main() {
    pretty_env_logger::init();

    let args = build_cli().get_matches();

    // For any error, return an exit code -1. Otherwise return the exit code provided.
    let code = match run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            -1
        }
    };

    std::process::exit(code)
}

fn build_cli() -> clap::Command<'static> {
    clap::Command::new("Thingy Play")
        .version("1.0")
        .about("Decode and play Nordic Thingy ADPCM microphone recordings")
        .arg(
            Arg::new("framing")
                .long("framing")
                .short('f')
                .value_name("MODE")
                .possible_values(["strict", "drain"])
                .default_value("strict")
                .help("Cut exact 131-byte frames, or drain everything buffered as one frame"),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .short('c')
                .value_name("BYTES")
                .validator(parse_chunk_size)
                .help("Feed the input to the decoder in chunks of this many bytes"),
        )
        .arg(
            Arg::new("clamp-predictor")
                .long("clamp-predictor")
                .help("Saturate the predictor itself, not only the decoded samples"),
        )
        .arg(
            Arg::new("decode-only")
                .long("decode-only")
                .help("Decode, but do not play the audio"),
        )
        .arg(
            Arg::new("dump")
                .long("dump")
                .short('d')
                .help("Print the decoded samples to standard output, one per line"),
        )
        .arg(
            Arg::new("INPUT")
                .help("The input file path, or - to use standard input")
                .required(true)
                .index(1),
        )
}

/// Parses a chunk size, which must be a positive number of bytes.
fn parse_chunk_size(value: &str) -> std::result::Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("chunk size must be greater than zero".to_string()),
        Ok(size) => Ok(size),
        Err(err) => Err(format!("invalid chunk size: {}", err)),
    }
}

fn run(args: &ArgMatches) -> Result<i32> {
    let data = read_input(args.value_of("INPUT").unwrap_or("-"))?;

    let framing = match args.value_of("framing") {
        Some("drain") => FramingMode::Drain,
        _ => FramingMode::Strict,
    };

    // Already validated by the argument parser.
    let chunk_size = args.value_of("chunk-size").and_then(|size| parse_chunk_size(size).ok());

    let decode_opts = DecoderOptions { clamp_predictor: args.is_present("clamp-predictor") };

    let samples = decode(&data, framing, &decode_opts, chunk_size)?;

    info!(
        "decoded {} samples ({:.2}s) from {} bytes",
        samples.len(),
        samples.len() as f64 / f64::from(staging::SAMPLE_RATE),
        data.len()
    );

    if args.is_present("dump") {
        dump(&samples)?;
    }

    if args.is_present("decode-only") {
        return Ok(0);
    }

    play(&samples)
}

/// Reads the whole resource into memory. The file is closed before returning.
fn read_input(path: &str) -> Result<Vec<u8>> {
    let mut data = Vec::new();

    if path == "-" {
        std::io::stdin().lock().read_to_end(&mut data)?;
    }
    else {
        let mut file = File::open(Path::new(path))?;
        file.read_to_end(&mut data)?;
    }

    Ok(data)
}

fn decode(
    data: &[u8],
    framing: FramingMode,
    decode_opts: &DecoderOptions,
    chunk_size: Option<usize>,
) -> Result<Vec<i16>> {
    let mut stream = StreamDecoder::new(framing, decode_opts);

    let mut samples = Vec::with_capacity(2 * data.len());

    // Without a chunk size, hand the decoder everything at once.
    let chunk_size = chunk_size.unwrap_or(data.len()).max(1);

    for chunk in data.chunks(chunk_size) {
        let mut input = chunk;

        // Skip malformed frames and carry on with the ones still buffered.
        loop {
            match stream.push(input, &mut samples) {
                Ok(_) => break,
                Err(Error::MalformedFrame(err)) => {
                    warn!("skipping frame: {}", err);
                    input = &[];
                }
                Err(err) => return Err(err),
            }
        }
    }

    if stream.pending() > 0 {
        warn!("discarding {} byte(s) of an incomplete frame", stream.pending());
    }

    Ok(samples)
}

fn dump(samples: &[i16]) -> Result<()> {
    let mut out = std::io::stdout().lock();

    for sample in samples {
        writeln!(out, "{}", sample)?;
    }

    out.flush()?;

    Ok(())
}

fn play(samples: &[i16]) -> Result<i32> {
    if samples.is_empty() {
        info!("nothing to play");
        return Ok(0);
    }

    let buf = staging::stage(samples);

    let mut audio_output = output::try_open(*buf.spec(), buf.frames() as u64)?;

    audio_output.write(buf.as_audio_buffer_ref())?;
    audio_output.flush();

    info!("end of stream");

    Ok(0)
}
