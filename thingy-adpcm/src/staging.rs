// Thingy ADPCM
// Copyright (c) 2026 The Thingy ADPCM Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Staging of decoded PCM for floating-point audio sinks.

use symphonia_core::audio::{AudioBuffer, Channels, Signal, SignalSpec};

/// The sample rate of a Thingy microphone stream.
pub const SAMPLE_RATE: u32 = 16_000;

/// Gets the signal specification of a decoded stream: 16 kHz mono.
pub fn signal_spec() -> SignalSpec {
    SignalSpec::new(SAMPLE_RATE, Channels::FRONT_LEFT)
}

/// Normalizes a sample by `i16::MAX`. `i16::MIN` maps slightly below -1.0.
#[inline]
pub fn normalize(sample: i16) -> f32 {
    f32::from(sample) / f32::from(i16::MAX)
}

/// Stages decoded samples into a single-channel `f32` buffer.
pub fn stage(samples: &[i16]) -> AudioBuffer<f32> {
    let mut buf = AudioBuffer::<f32>::new(samples.len() as u64, signal_spec());

    buf.render_reserved(Some(samples.len()));

    // The generic sample conversion scales by 32768, normalize explicitly instead.
    for (out, &sample) in buf.chan_mut(0).iter_mut().zip(samples) {
        *out = normalize(sample);
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_normalize() {
        assert_eq!(normalize(0), 0.0);
        assert_eq!(normalize(i16::MAX), 1.0);
        assert_eq!(normalize(-i16::MAX), -1.0);
        assert!(normalize(i16::MIN) < -1.0);
        assert_eq!(normalize(16384), 16384.0 / 32767.0);
    }

    #[test]
    fn verify_stage() {
        let buf = stage(&[0, i16::MAX, -i16::MAX, 256]);

        assert_eq!(buf.spec().rate, SAMPLE_RATE);
        assert_eq!(buf.spec().channels.count(), 1);
        assert_eq!(buf.frames(), 4);
        assert_eq!(buf.chan(0), &[0.0, 1.0, -1.0, 256.0 / 32767.0]);
    }

    #[test]
    fn verify_stage_empty() {
        let buf = stage(&[]);
        assert_eq!(buf.frames(), 0);
    }
}
