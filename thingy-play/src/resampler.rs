// Thingy ADPCM
// Copyright (c) 2026 The Thingy ADPCM Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thingy_adpcm::errors::{sink_error, Result, SinkErrorKind};

use log::error;

/// Converts mono `f32` audio to the sample rate of the output device.
pub struct Resampler {
    resampler: rubato::FftFixedIn<f32>,
    chunk: Vec<f32>,
    chunk_len: usize,
}

impl Resampler {
    pub fn new(from_rate: u32, to_rate: u32, chunk_len: usize) -> Result<Self> {
        let resampler = match rubato::FftFixedIn::<f32>::new(
            from_rate as usize,
            to_rate as usize,
            chunk_len,
            2,
            1,
        ) {
            Ok(resampler) => resampler,
            Err(err) => {
                error!("failed to create a {} Hz to {} Hz resampler: {}", from_rate, to_rate, err);
                return sink_error(SinkErrorKind::OpenStream);
            }
        };

        Ok(Resampler { resampler, chunk: Vec::with_capacity(chunk_len), chunk_len })
    }

    /// Resamples a complete mono signal.
    ///
    /// The last chunk is padded with silence and one more silent chunk flushes the resampler's
    /// delay line, so the output carries a short tail of silence.
    pub fn resample(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        let mut output = Vec::new();

        let flush = [0.0f32; 0];

        for chunk in input.chunks(self.chunk_len).chain(std::iter::once(&flush[..])) {
            self.chunk.clear();
            self.chunk.extend_from_slice(chunk);
            self.chunk.resize(self.chunk_len, 0.0);

            match rubato::Resampler::process(&mut self.resampler, &[&self.chunk], None) {
                Ok(planes) => output.extend_from_slice(&planes[0]),
                Err(err) => {
                    error!("resampling error: {}", err);
                    return sink_error(SinkErrorKind::StreamClosed);
                }
            }
        }

        Ok(output)
    }
}
