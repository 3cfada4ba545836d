// Thingy ADPCM
// Copyright (c) 2026 The Thingy ADPCM Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use symphonia_core::io::{BufReader, ReadBytes};
use symphonia_core::util::clamp::clamp_i16;

use log::{debug, warn};

use crate::common::Nibble;
use crate::errors::{malformed_frame_error, Result};
use crate::frame::{Frame, HEADER_LEN};

/// The largest valid step index.
pub const MAX_STEP_INDEX: i32 = 88;

#[rustfmt::skip]
const DVI_INDEX_TABLE: [i32; 16] = [
    -1, -1, -1, -1, 2, 4, 6, 8,
    -1, -1, -1, -1, 2, 4, 6, 8,
];

#[rustfmt::skip]
const DVI_STEP_TABLE: [i32; 89] = [
    7, 8, 9, 10, 11, 12, 13, 14, 16, 17,
    19, 21, 23, 25, 28, 31, 34, 37, 41, 45,
    50, 55, 60, 66, 73, 80, 88, 97, 107, 118,
    130, 143, 157, 173, 190, 209, 230, 253, 279, 307,
    337, 371, 408, 449, 494, 544, 598, 658, 724, 796,
    876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066,
    2272, 2499, 2749, 3024, 3327, 3660, 4026, 4428, 4871, 5358,
    5894, 6484, 7132, 7845, 8630, 9493, 10442, 11487, 12635, 13899,
    15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794, 32767,
];

/// `DecoderOptions` is a common set of options that the decoder will use.
#[derive(Copy, Clone, Debug, Default)]
pub struct DecoderOptions {
    /// Write the saturated sample back into the predictor after every nibble.
    ///
    /// The Thingy firmware's reference decoder only saturates the emitted sample and lets the
    /// predictor run past the 16-bit range, which is the default. Conventional IMA decoders
    /// saturate the predictor itself.
    pub clamp_predictor: bool,
}

/// `DecoderState` holds the running predictor and quantizer of a single frame.
///
/// The state is seeded by each frame's header and discarded after the frame is decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderState {
    predicted: i32,
    index: i32,
    step: i32,
    clamp_predictor: bool,
}

impl DecoderState {
    /// Seed a new state from a predicted value and step index.
    pub fn new(predicted: i16, index: u8, options: &DecoderOptions) -> Result<Self> {
        let index = i32::from(index);

        if index > MAX_STEP_INDEX {
            warn!("rejecting frame with step index {}", index);
            return malformed_frame_error("dvi adpcm: step index out of range");
        }

        Ok(DecoderState {
            predicted: i32::from(predicted),
            index,
            step: DVI_STEP_TABLE[index as usize],
            clamp_predictor: options.clamp_predictor,
        })
    }

    fn read_header<B: ReadBytes>(stream: &mut B, options: &DecoderOptions) -> Result<Self> {
        let predicted = stream.read_be_u16()? as i16;
        let index = stream.read_u8()?;
        DecoderState::new(predicted, index, options)
    }

    /// Gets the predictor. Unless the predictor is clamped, this may lie outside the 16-bit
    /// range.
    pub fn predicted(&self) -> i32 {
        self.predicted
    }

    /// Gets the current step index.
    pub fn index(&self) -> i32 {
        self.index
    }

    /// Gets the step size that will be applied to the next nibble.
    pub fn step(&self) -> i32 {
        self.step
    }

    /// Expands one 4-bit code into a sample.
    ///
    /// The step index is adapted first, but the difference is reconstructed with the step
    /// carried over from the previous nibble. The step is refreshed last.
    pub fn expand(&mut self, nibble: u8) -> i16 {
        let nibble = nibble & 0x0F;

        self.index = (self.index + DVI_INDEX_TABLE[nibble as usize]).clamp(0, MAX_STEP_INDEX);

        let sign = (nibble & 0x08) != 0;
        let magnitude = nibble & 0x07;

        let mut diff = self.step >> 3;
        if magnitude & 4 != 0 {
            diff += self.step;
        }
        if magnitude & 2 != 0 {
            diff += self.step >> 1;
        }
        if magnitude & 1 != 0 {
            diff += self.step >> 2;
        }

        // Only a run of codes far longer than a frame can reach the i32 limits.
        if sign {
            self.predicted = self.predicted.saturating_sub(diff);
        }
        else {
            self.predicted = self.predicted.saturating_add(diff);
        }

        let sample = clamp_i16(self.predicted);

        if self.clamp_predictor {
            self.predicted = i32::from(sample);
        }

        self.step = DVI_STEP_TABLE[self.index as usize];

        sample
    }

    fn expand_nibble(&mut self, byte: u8, nibble: Nibble) -> i16 {
        self.expand(nibble.get_nibble(byte))
    }
}

/// A `FrameDecoder` turns a complete frame into PCM. There is no encoding counterpart.
pub trait FrameDecoder {
    /// Decodes `frame`, appending the samples to `out`. Returns the number of samples appended.
    ///
    /// If an error is returned, `out` is left unmodified.
    fn decode_into(&self, frame: &Frame, out: &mut Vec<i16>) -> Result<usize>;

    /// Decodes `frame` into a new buffer.
    fn decode(&self, frame: &Frame) -> Result<Vec<i16>> {
        let mut out = Vec::with_capacity(frame.sample_count());
        self.decode_into(frame, &mut out)?;
        Ok(out)
    }
}

/// Intel/DVI ADPCM decoder for mono Thingy frames.
///
/// Every frame carries its own predictor seed and step index, so the decoder keeps nothing
/// between frames.
#[derive(Clone, Debug, Default)]
pub struct AdpcmDecoder {
    options: DecoderOptions,
}

impl AdpcmDecoder {
    /// Instantiate a new decoder.
    pub fn new(options: &DecoderOptions) -> Self {
        AdpcmDecoder { options: *options }
    }

    /// Gets the options the decoder was instantiated with.
    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }
}

impl FrameDecoder for AdpcmDecoder {
    fn decode_into(&self, frame: &Frame, out: &mut Vec<i16>) -> Result<usize> {
        if frame.len() < HEADER_LEN {
            warn!("rejecting frame of {} bytes", frame.len());
            return malformed_frame_error("dvi adpcm: frame is shorter than the header");
        }

        let mut stream = BufReader::new(frame.as_bytes());

        let mut status = DecoderState::read_header(&mut stream, &self.options)?;

        let count = frame.sample_count();
        out.reserve(count);

        for _ in HEADER_LEN..frame.len() {
            let nibbles = stream.read_u8()?;
            for nibble in Nibble::ORDER {
                out.push(status.expand_nibble(nibbles, nibble));
            }
        }

        debug!("decoded frame: len={}, samples={}", frame.len(), count);

        Ok(count)
    }
}
