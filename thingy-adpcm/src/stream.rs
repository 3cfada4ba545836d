// Thingy ADPCM
// Copyright (c) 2026 The Thingy ADPCM Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::debug;

use crate::codec_dvi::{AdpcmDecoder, DecoderOptions, FrameDecoder};
use crate::errors::Result;
use crate::frame::{FrameAccumulator, FramingMode};

/// `StreamDecoder` accumulates the bytes of a single stream and decodes frames as they complete.
///
/// Each concurrently decoded stream needs its own `StreamDecoder`.
#[derive(Clone, Debug, Default)]
pub struct StreamDecoder {
    accumulator: FrameAccumulator,
    decoder: AdpcmDecoder,
}

impl StreamDecoder {
    /// Instantiate a new stream decoder with an empty accumulator.
    pub fn new(framing: FramingMode, options: &DecoderOptions) -> Self {
        StreamDecoder {
            accumulator: FrameAccumulator::new(framing),
            decoder: AdpcmDecoder::new(options),
        }
    }

    /// Gets the frame accumulator.
    pub fn accumulator(&self) -> &FrameAccumulator {
        &self.accumulator
    }

    /// Gets the frame decoder.
    pub fn decoder(&self) -> &AdpcmDecoder {
        &self.decoder
    }

    /// Gets the number of bytes buffered towards the next frame.
    pub fn pending(&self) -> usize {
        self.accumulator.pending()
    }

    /// Feeds `bytes` into the stream and appends the samples of every frame completed by them to
    /// `out`. Returns the number of frames decoded.
    ///
    /// A malformed frame stops the call with an error. The frame is consumed, so any remaining
    /// buffered frames are decoded by the next call.
    pub fn push(&mut self, bytes: &[u8], out: &mut Vec<i16>) -> Result<usize> {
        let mut frames = 0;
        let mut input = bytes;

        while let Some(frame) = self.accumulator.feed(input) {
            input = &[];
            self.decoder.decode_into(&frame, out)?;
            frames += 1;
        }

        if frames > 0 {
            debug!("decoded {} frame(s), {} byte(s) pending", frames, self.pending());
        }

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::frame::{FRAME_LEN, FRAME_SAMPLES};

    fn silent_frame(seed: u8) -> Vec<u8> {
        let mut frame = vec![0u8; FRAME_LEN];
        frame[0] = seed;
        frame
    }

    #[test]
    fn verify_push_in_small_chunks() {
        let mut stream = StreamDecoder::default();

        let mut data = silent_frame(0x01);
        data.extend(silent_frame(0x02));

        let mut out = Vec::new();
        let mut frames = 0;

        for chunk in data.chunks(20) {
            frames += stream.push(chunk, &mut out).unwrap();
        }

        assert_eq!(frames, 2);
        assert_eq!(out.len(), 2 * FRAME_SAMPLES);
        assert!(out[..FRAME_SAMPLES].iter().all(|&s| s == 256));
        assert!(out[FRAME_SAMPLES..].iter().all(|&s| s == 512));
        assert_eq!(stream.pending(), 0);
    }

    #[test]
    fn verify_push_whole_input() {
        let mut data = silent_frame(0x01);
        data.extend(silent_frame(0x02));
        data.extend_from_slice(&[0; 10]);

        // Strict framing reseeds at every frame boundary.
        let mut strict = StreamDecoder::new(FramingMode::Strict, &DecoderOptions::default());
        assert_eq!(strict.accumulator().mode(), FramingMode::Strict);
        assert!(!strict.decoder().options().clamp_predictor);

        let mut out = Vec::new();
        assert_eq!(strict.push(&data, &mut out).unwrap(), 2);
        assert_eq!(out[FRAME_SAMPLES], 512);
        assert_eq!(strict.pending(), 10);

        // Draining decodes everything with the first seed.
        let options = DecoderOptions { clamp_predictor: true };
        let mut drain = StreamDecoder::new(FramingMode::Drain, &options);
        assert_eq!(drain.accumulator().mode(), FramingMode::Drain);
        assert!(drain.decoder().options().clamp_predictor);

        let mut out = Vec::new();
        assert_eq!(drain.push(&data, &mut out).unwrap(), 1);
        assert_eq!(out.len(), 2 * (data.len() - 3));
        assert_eq!(drain.pending(), 0);
    }

    #[test]
    fn verify_malformed_frame_is_isolated() {
        let mut bad = silent_frame(0x01);
        bad[2] = 200;

        let mut data = bad;
        data.extend(silent_frame(0x02));

        let mut stream = StreamDecoder::default();
        let mut out = Vec::new();

        assert!(matches!(stream.push(&data, &mut out), Err(Error::MalformedFrame(_))));
        assert!(out.is_empty());

        // The following frame is still buffered and decodes normally.
        assert_eq!(stream.push(&[], &mut out).unwrap(), 1);
        assert_eq!(out.len(), FRAME_SAMPLES);
        assert!(out.iter().all(|&s| s == 512));
    }
}
