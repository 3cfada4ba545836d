// Thingy ADPCM
// Copyright (c) 2026 The Thingy ADPCM Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform-dependant Audio Outputs

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration as WallDuration, Instant};

use symphonia_core::audio::{AudioBufferRef, SignalSpec};
use symphonia_core::units::Duration;

use thingy_adpcm::errors::Result;

pub trait AudioOutput {
    fn write(&mut self, decoded: AudioBufferRef<'_>) -> Result<()>;
    fn flush(&mut self);
}

/// Time allowed on top of the buffered duration for a sink to play out its buffer.
#[cfg_attr(target_os = "linux", allow(dead_code))]
const FLUSH_MARGIN: WallDuration = WallDuration::from_millis(500);

/// How a wait for a sink's buffer to empty ended.
#[cfg_attr(target_os = "linux", allow(dead_code))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DrainOutcome {
    Drained,
    StreamFailed,
    TimedOut,
}

/// Polls `is_drained` until it returns `true`, `failed` is set by the stream's error callback, or
/// `timeout` elapses.
#[cfg_attr(target_os = "linux", allow(dead_code))]
fn wait_for_drain<F>(mut is_drained: F, failed: &AtomicBool, timeout: WallDuration) -> DrainOutcome
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;

    loop {
        if is_drained() {
            return DrainOutcome::Drained;
        }
        if failed.load(Ordering::Relaxed) {
            return DrainOutcome::StreamFailed;
        }
        if Instant::now() >= deadline {
            return DrainOutcome::TimedOut;
        }
        std::thread::sleep(WallDuration::from_millis(10));
    }
}

#[cfg(target_os = "linux")]
mod pulseaudio {
    use super::{AudioOutput, Result};

    use symphonia_core::audio::*;
    use symphonia_core::units::Duration;
    use thingy_adpcm::errors::{sink_error, SinkErrorKind};

    use libpulse_binding as pulse;
    use libpulse_simple_binding as psimple;

    use log::error;

    pub struct PulseAudioOutput {
        pa: psimple::Simple,
        sample_buf: RawSampleBuffer<f32>,
    }

    impl PulseAudioOutput {
        pub fn try_open(spec: SignalSpec, duration: Duration) -> Result<Box<dyn AudioOutput>> {
            // PulseAudio takes raw native-endian bytes. Use a RawSampleBuffer to move data from
            // the staged AudioBuffer.
            let sample_buf = RawSampleBuffer::<f32>::new(duration, spec);

            let pa_spec = pulse::sample::Spec {
                format: pulse::sample::Format::FLOAT32NE,
                channels: spec.channels.count() as u8,
                rate: spec.rate,
            };

            if !pa_spec.is_valid() {
                error!("invalid audio output specification: {:?}", spec);
                return sink_error(SinkErrorKind::OpenStream);
            }

            let pa_ch_map = map_channels_to_pa_channelmap(spec.channels);

            let pa_result = psimple::Simple::new(
                None,                               // Use default server
                "Thingy Player",                    // Application name
                pulse::stream::Direction::Playback, // Playback stream
                None,                               // Default playback device
                "Speech",                           // Description of the stream
                &pa_spec,                           // Signal specification
                pa_ch_map.as_ref(),                 // Channel map
                None,                               // Custom buffering attributes
            );

            match pa_result {
                Ok(pa) => Ok(Box::new(PulseAudioOutput { pa, sample_buf })),
                Err(err) => {
                    error!("audio output stream open error: {}", err);

                    sink_error(SinkErrorKind::OpenStream)
                }
            }
        }
    }

    impl AudioOutput for PulseAudioOutput {
        fn write(&mut self, decoded: AudioBufferRef<'_>) -> Result<()> {
            if decoded.frames() == 0 {
                return Ok(());
            }

            self.sample_buf.copy_interleaved_ref(decoded);

            match self.pa.write(self.sample_buf.as_bytes()) {
                Err(err) => {
                    error!("audio output stream write error: {}", err);

                    sink_error(SinkErrorKind::StreamClosed)
                }
                _ => Ok(()),
            }
        }

        fn flush(&mut self) {
            // Flush is best-effort, ignore the returned result.
            let _ = self.pa.drain();
        }
    }

    /// Maps the channels of a decoded stream to a PulseAudio channel map. Only mono is produced.
    fn map_channels_to_pa_channelmap(channels: Channels) -> Option<pulse::channelmap::Map> {
        if channels != Channels::FRONT_LEFT {
            return None;
        }

        let mut map: pulse::channelmap::Map = Default::default();
        map.init();
        map.set_len(1);
        map.get_mut()[0] = pulse::channelmap::Position::Mono;

        Some(map)
    }
}

#[cfg(not(target_os = "linux"))]
mod cpal {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time;

    use crate::resampler::Resampler;

    use super::{wait_for_drain, AudioOutput, DrainOutcome, Result, FLUSH_MARGIN};

    use symphonia_core::audio::{AudioBufferRef, SampleBuffer, SignalSpec};
    use symphonia_core::units::Duration;
    use thingy_adpcm::errors::{sink_error, SinkErrorKind};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use rb::*;

    use log::{error, info, warn};

    /// Input chunk length of the resampler, in frames.
    const RESAMPLER_CHUNK_LEN: usize = 1024;

    pub struct CpalAudioOutput;

    trait AudioOutputSample: cpal::Sample + std::marker::Send + 'static {}

    impl AudioOutputSample for f32 {}
    impl AudioOutputSample for i16 {}
    impl AudioOutputSample for u16 {}

    impl CpalAudioOutput {
        pub fn try_open(spec: SignalSpec, duration: Duration) -> Result<Box<dyn AudioOutput>> {
            let host = cpal::default_host();

            let device = match host.default_output_device() {
                Some(device) => device,
                _ => {
                    error!("failed to get default audio output device");
                    return sink_error(SinkErrorKind::OpenStream);
                }
            };

            // Shared-mode devices only accept their own mix format, so open the stream with the
            // device's default configuration and convert to it.
            let config = match device.default_output_config() {
                Ok(config) => config,
                Err(err) => {
                    error!("failed to get default audio output device config: {}", err);
                    return sink_error(SinkErrorKind::OpenStream);
                }
            };

            match config.sample_format() {
                cpal::SampleFormat::F32 => {
                    CpalAudioOutputImpl::<f32>::try_open(spec, duration, &device, config.config())
                }
                cpal::SampleFormat::I16 => {
                    CpalAudioOutputImpl::<i16>::try_open(spec, duration, &device, config.config())
                }
                cpal::SampleFormat::U16 => {
                    CpalAudioOutputImpl::<u16>::try_open(spec, duration, &device, config.config())
                }
            }
        }
    }

    struct CpalAudioOutputImpl<T: AudioOutputSample> {
        ring_buf: SpscRb<T>,
        ring_buf_producer: rb::Producer<T>,
        sample_buf: SampleBuffer<f32>,
        stream: cpal::Stream,
        stream_failed: Arc<AtomicBool>,
        resampler: Option<Resampler>,
        config: cpal::StreamConfig,
    }

    impl<T: AudioOutputSample> CpalAudioOutputImpl<T> {
        fn try_open(
            spec: SignalSpec,
            duration: Duration,
            device: &cpal::Device,
            config: cpal::StreamConfig,
        ) -> Result<Box<dyn AudioOutput>> {
            let num_channels = usize::from(config.channels);

            // Create a ring buffer with a capacity for up-to 200ms of audio.
            let ring_len = ((200 * config.sample_rate.0 as usize) / 1000) * num_channels;

            let ring_buf = SpscRb::new(ring_len);
            let (ring_buf_producer, ring_buf_consumer) = (ring_buf.producer(), ring_buf.consumer());

            let stream_failed = Arc::new(AtomicBool::new(false));
            let error_flag = Arc::clone(&stream_failed);

            let stream_result = device.build_output_stream(
                &config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let written = ring_buf_consumer.read(data).unwrap_or(0);

                    // Mute any remaining samples.
                    let silence = <T as cpal::Sample>::from(&0.0f32);
                    data[written..].iter_mut().for_each(|s| *s = silence);
                },
                move |err| {
                    error!("audio output error: {}", err);
                    error_flag.store(true, Ordering::Relaxed);
                },
            );

            let stream = match stream_result {
                Ok(stream) => stream,
                Err(err) => {
                    error!("audio output stream open error: {}", err);
                    return sink_error(SinkErrorKind::OpenStream);
                }
            };

            if let Err(err) = stream.play() {
                error!("audio output stream play error: {}", err);
                return sink_error(SinkErrorKind::PlayStream);
            }

            let sample_buf = SampleBuffer::<f32>::new(duration, spec);

            let resampler = if spec.rate != config.sample_rate.0 {
                info!("resampling {} Hz to {} Hz", spec.rate, config.sample_rate.0);
                Some(Resampler::new(spec.rate, config.sample_rate.0, RESAMPLER_CHUNK_LEN)?)
            }
            else {
                None
            };

            Ok(Box::new(CpalAudioOutputImpl {
                ring_buf,
                ring_buf_producer,
                sample_buf,
                stream,
                stream_failed,
                resampler,
                config,
            }))
        }
    }

    impl<T: AudioOutputSample> AudioOutput for CpalAudioOutputImpl<T> {
        fn write(&mut self, decoded: AudioBufferRef<'_>) -> Result<()> {
            if decoded.frames() == 0 {
                return Ok(());
            }

            self.sample_buf.copy_interleaved_ref(decoded);

            let resampled;

            let mono = match &mut self.resampler {
                Some(resampler) => {
                    resampled = resampler.resample(self.sample_buf.samples())?;
                    &resampled[..]
                }
                None => self.sample_buf.samples(),
            };

            // Copy the mono signal to every device channel.
            let num_channels = usize::from(self.config.channels);

            let mut interleaved = Vec::with_capacity(mono.len() * num_channels);

            for sample in mono {
                let sample = <T as cpal::Sample>::from(sample);
                interleaved.extend(std::iter::repeat(sample).take(num_channels));
            }

            let mut samples = &interleaved[..];

            while !samples.is_empty() {
                if self.stream_failed.load(Ordering::Relaxed) {
                    return sink_error(SinkErrorKind::StreamClosed);
                }

                match self.ring_buf_producer.write(samples) {
                    Ok(written) => samples = &samples[written..],
                    Err(_) => std::thread::sleep(time::Duration::from_millis(5)),
                }
            }

            Ok(())
        }

        fn flush(&mut self) {
            let rate = u64::from(self.config.sample_rate.0) * u64::from(self.config.channels);
            let buffered =
                time::Duration::from_millis(1000 * self.ring_buf.count() as u64 / rate.max(1));

            let outcome = wait_for_drain(
                || self.ring_buf.is_empty(),
                &self.stream_failed,
                buffered + FLUSH_MARGIN,
            );

            match outcome {
                DrainOutcome::Drained => (),
                DrainOutcome::StreamFailed => {
                    warn!("audio output failed, dropping {} buffered samples", self.ring_buf.count())
                }
                DrainOutcome::TimedOut => {
                    warn!("audio output stalled, dropping {} buffered samples", self.ring_buf.count())
                }
            }

            // Flush is best-effort, ignore the returned result.
            let _ = self.stream.pause();
        }
    }
}

#[cfg(target_os = "linux")]
pub fn try_open(spec: SignalSpec, duration: Duration) -> Result<Box<dyn AudioOutput>> {
    pulseaudio::PulseAudioOutput::try_open(spec, duration)
}

#[cfg(not(target_os = "linux"))]
pub fn try_open(spec: SignalSpec, duration: Duration) -> Result<Box<dyn AudioOutput>> {
    cpal::CpalAudioOutput::try_open(spec, duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_wait_for_drain_stops_when_empty() {
        let failed = AtomicBool::new(false);
        let mut polls = 0;

        let outcome = wait_for_drain(
            || {
                polls += 1;
                polls == 3
            },
            &failed,
            WallDuration::from_secs(10),
        );

        assert_eq!(outcome, DrainOutcome::Drained);
        assert_eq!(polls, 3);
    }

    #[test]
    fn verify_wait_for_drain_stops_on_stream_failure() {
        let failed = AtomicBool::new(true);

        let start = Instant::now();
        let outcome = wait_for_drain(|| false, &failed, WallDuration::from_secs(10));

        assert_eq!(outcome, DrainOutcome::StreamFailed);
        assert!(start.elapsed() < WallDuration::from_secs(5));
    }

    #[test]
    fn verify_wait_for_drain_is_bounded() {
        let failed = AtomicBool::new(false);

        let start = Instant::now();
        let outcome = wait_for_drain(|| false, &failed, WallDuration::from_millis(50));

        assert_eq!(outcome, DrainOutcome::TimedOut);
        assert!(start.elapsed() >= WallDuration::from_millis(50));
    }
}
