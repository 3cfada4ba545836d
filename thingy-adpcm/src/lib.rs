// Thingy ADPCM
// Copyright (c) 2026 The Thingy ADPCM Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoder for the Intel/DVI ADPCM audio streamed by the Nordic Thingy microphone.
//!
//! The microphone sends 16 kHz mono audio in 131-byte frames:
//!
//! | Offset   | Length | Content                                           |
//! |----------|--------|---------------------------------------------------|
//! | 0        | 2      | Predictor seed, big-endian signed 16-bit          |
//! | 2        | 1      | Initial step index, 0 to 88                       |
//! | 3        | 128    | 256 4-bit codes, high nibble first                |
//!
//! Every frame is seeded by its own header, so frames decode independently of each other.
//! [`FrameAccumulator`] assembles frames from arbitrarily sized chunks, [`AdpcmDecoder`] turns a
//! frame into 16-bit PCM, and [`StreamDecoder`] does both. [`staging`] prepares decoded PCM for
//! a floating-point audio sink.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
// The following lints are allowed in all Thingy ADPCM crates. Please see the workspace manifest
// for their justification.
#![allow(clippy::comparison_chain)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

mod codec_dvi;
mod common;
mod frame;
mod stream;

pub mod errors;
pub mod staging;

pub use codec_dvi::{AdpcmDecoder, DecoderOptions, DecoderState, FrameDecoder, MAX_STEP_INDEX};
pub use frame::{Frame, FrameAccumulator, FramingMode, FRAME_LEN, FRAME_SAMPLES, HEADER_LEN};
pub use stream::StreamDecoder;
