// Thingy ADPCM
// Copyright (c) 2026 The Thingy ADPCM Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frame definition and the byte accumulator that assembles frames from arbitrarily sized
//! chunks.

use log::{debug, warn};

/// The length in bytes of a complete frame.
pub const FRAME_LEN: usize = 131;

/// The length in bytes of the frame header: a 16-bit big-endian predictor seed followed by the
/// initial step index.
pub const HEADER_LEN: usize = 3;

/// The number of samples decoded from a complete frame.
pub const FRAME_SAMPLES: usize = 2 * (FRAME_LEN - HEADER_LEN);

/// A `Frame` is one self-seeded block of ADPCM data.
///
/// A frame produced by a [`FrameAccumulator`] in [`FramingMode::Strict`] is always exactly
/// [`FRAME_LEN`] bytes long. In [`FramingMode::Drain`] it may be longer. Frames built directly
/// from bytes are not validated until they are decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Box<[u8]>,
}

impl Frame {
    /// Instantiate a frame from raw bytes.
    pub fn new<B: Into<Box<[u8]>>>(data: B) -> Self {
        Frame { data: data.into() }
    }

    /// Gets the raw bytes of the frame, including the header.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Gets the length of the frame in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the frame holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Gets the number of samples the frame decodes to. A frame too short to hold a header
    /// decodes to nothing.
    pub fn sample_count(&self) -> usize {
        2 * self.data.len().saturating_sub(HEADER_LEN)
    }

    /// Consumes the frame, returning the underlying bytes.
    pub fn into_inner(self) -> Box<[u8]> {
        self.data
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// `FramingMode` selects how a [`FrameAccumulator`] cuts frames out of its buffer once it holds
/// at least [`FRAME_LEN`] bytes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FramingMode {
    /// Emit exactly [`FRAME_LEN`] bytes and keep any excess buffered as the start of the next
    /// frame.
    #[default]
    Strict,
    /// Emit the entire buffer as one frame and discard the buffer, regardless of how much it
    /// exceeds [`FRAME_LEN`]. This is bit-compatible with the Thingy companion application.
    Drain,
}

/// `FrameAccumulator` buffers byte chunks until a complete frame is available.
#[derive(Clone, Debug, Default)]
pub struct FrameAccumulator {
    mode: FramingMode,
    buf: Vec<u8>,
}

impl FrameAccumulator {
    /// Instantiate a new, empty, accumulator.
    pub fn new(mode: FramingMode) -> Self {
        FrameAccumulator { mode, buf: Vec::with_capacity(FRAME_LEN) }
    }

    /// Gets the framing mode.
    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    /// Gets the number of bytes buffered and not yet emitted in a frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Discards all buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Appends `bytes` to the buffer and, if a complete frame is buffered, returns it.
    ///
    /// In strict mode, a single chunk may complete more than one frame. Call `feed` with an empty
    /// slice until it returns `None` to drain them.
    pub fn feed(&mut self, bytes: &[u8]) -> Option<Frame> {
        self.buf.extend_from_slice(bytes);

        if self.buf.len() < FRAME_LEN {
            return None;
        }

        let frame = match self.mode {
            FramingMode::Strict => {
                let rest = self.buf.split_off(FRAME_LEN);
                Frame::new(std::mem::replace(&mut self.buf, rest))
            }
            FramingMode::Drain => {
                if self.buf.len() > FRAME_LEN {
                    warn!(
                        "emitting oversized frame of {} bytes ({} bytes past a frame)",
                        self.buf.len(),
                        self.buf.len() - FRAME_LEN
                    );
                }
                Frame::new(std::mem::take(&mut self.buf))
            }
        };

        debug!("frame ready: len={}, pending={}", frame.len(), self.buf.len());

        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_frame_layout_constants() {
        assert_eq!(FRAME_SAMPLES, 256);
        assert_eq!(Frame::new(vec![0; FRAME_LEN]).sample_count(), 256);
        assert_eq!(Frame::new(vec![0; 200]).sample_count(), 394);
        assert_eq!(Frame::new(vec![0; 2]).sample_count(), 0);
    }

    #[test]
    fn verify_frame_bytes() {
        let frame = Frame::new(vec![0x01, 0x00, 0x05, 0xa5]);

        assert_eq!(frame.as_ref(), &[0x01, 0x00, 0x05, 0xa5]);
        assert_eq!(frame.as_ref(), frame.as_bytes());
        assert!(!frame.is_empty());
        assert!(Frame::new(Vec::new()).is_empty());

        let data = frame.into_inner();
        assert_eq!(&data[..], &[0x01, 0x00, 0x05, 0xa5]);
    }

    #[test]
    fn verify_feed_threshold() {
        for mode in [FramingMode::Strict, FramingMode::Drain] {
            let mut acc = FrameAccumulator::new(mode);

            assert!(acc.feed(&[]).is_none());
            assert!(acc.feed(&[0x11; 100]).is_none());
            assert!(acc.feed(&[0x22; 30]).is_none());
            assert_eq!(acc.pending(), 130);

            let frame = acc.feed(&[0x33]).expect("frame at 131 bytes");
            assert_eq!(frame.len(), FRAME_LEN);
            assert_eq!(frame.as_bytes()[0], 0x11);
            assert_eq!(frame.as_bytes()[100], 0x22);
            assert_eq!(frame.as_bytes()[130], 0x33);

            // Empty again until refilled.
            assert_eq!(acc.pending(), 0);
            assert!(acc.feed(&[]).is_none());
            assert!(acc.feed(&[0; 130]).is_none());
            assert!(acc.feed(&[0]).is_some());
        }
    }

    #[test]
    fn verify_strict_carry_over() {
        let mut acc = FrameAccumulator::new(FramingMode::Strict);

        let chunk: Vec<u8> = (0..200u32).map(|i| i as u8).collect();

        let frame = acc.feed(&chunk).unwrap();
        assert_eq!(frame.as_bytes(), &chunk[..FRAME_LEN]);
        assert_eq!(acc.pending(), 69);
        assert!(acc.feed(&[]).is_none());

        let frame = acc.feed(&[0xff; 62]).unwrap();
        assert_eq!(frame.len(), FRAME_LEN);
        assert_eq!(&frame.as_bytes()[..69], &chunk[FRAME_LEN..]);
        assert_eq!(acc.pending(), 0);
    }

    #[test]
    fn verify_strict_drains_multiple_frames() {
        let mut acc = FrameAccumulator::new(FramingMode::Strict);

        let mut frames = 0;
        let mut input: &[u8] = &[0; 3 * FRAME_LEN + 10];

        while let Some(frame) = acc.feed(input) {
            assert_eq!(frame.len(), FRAME_LEN);
            frames += 1;
            input = &[];
        }

        assert_eq!(frames, 3);
        assert_eq!(acc.pending(), 10);
    }

    #[test]
    fn verify_drain_takes_everything() {
        let mut acc = FrameAccumulator::new(FramingMode::Drain);

        assert!(acc.feed(&[0; 100]).is_none());

        let frame = acc.feed(&[0; 100]).unwrap();
        assert_eq!(frame.len(), 200);
        assert_eq!(acc.pending(), 0);
        assert!(acc.feed(&[]).is_none());
    }

    #[test]
    fn verify_clear() {
        let mut acc = FrameAccumulator::default();
        assert_eq!(acc.mode(), FramingMode::Strict);

        acc.feed(&[0; 64]);
        acc.clear();
        assert_eq!(acc.pending(), 0);
        assert!(acc.feed(&[0; 100]).is_none());
    }
}
