//! # Audio Capture Module
//!
//! The waveform source the detection cycle pulls from, and its
//! implementation on top of CPAL (Cross-Platform Audio Library).
//!
//! The device callback runs on CPAL's audio thread. It only downmixes each
//! chunk to mono and hands it over a bounded channel; the detection tick
//! drains the channel into a rolling window of the most recent samples.
//!
//! ## Features
//! - Automatic audio device selection
//! - Preferred sample rate with fallback to the device default
//! - Mono downmix of multi-channel input
//! - Non-blocking hand-off out of the audio callback

use crate::AcquisitionError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SupportedStreamConfig};
use crossbeam_channel::{Receiver, Sender};
use log::{error, info, warn};

/// Chunks buffered between the audio callback and the detection tick.
const CHANNEL_DEPTH: usize = 64;

/// A live audio input the detection cycle can sample once per tick.
pub trait WaveformSource {
    /// Acquires the input. This is the one place a user-visible failure can
    /// happen.
    fn open(&mut self) -> Result<(), AcquisitionError>;

    /// Releases the input. Closing a closed source does nothing.
    fn close(&mut self);

    /// The most recent analysis window, oldest sample first. Always the same
    /// length; before enough audio has arrived the front is zero.
    fn current_waveform(&mut self) -> &[f32];

    fn sample_rate(&self) -> u32;
}

/// Fixed-length window that keeps the newest samples.
#[derive(Debug, Clone)]
pub struct RollingBuffer {
    samples: Vec<f32>,
}

impl RollingBuffer {
    pub fn new(len: usize) -> Self {
        Self { samples: vec![0.0; len] }
    }

    /// Appends `chunk`, discarding as many of the oldest samples.
    pub fn push(&mut self, chunk: &[f32]) {
        let len = self.samples.len();
        if chunk.len() >= len {
            self.samples.copy_from_slice(&chunk[chunk.len() - len..]);
            return;
        }
        self.samples.copy_within(chunk.len().., 0);
        self.samples[len - chunk.len()..].copy_from_slice(chunk);
    }

    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }
}

/// Averages interleaved frames down to one channel.
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Microphone input from the default CPAL input device.
pub struct CpalWaveformSource {
    preferred_rate: u32,
    sample_rate: u32,
    window: RollingBuffer,
    receiver: Option<Receiver<Vec<f32>>>,
    stream: Option<cpal::Stream>,
}

impl CpalWaveformSource {
    /// # Arguments
    /// * `window_len` - Number of samples returned by `current_waveform`
    /// * `preferred_rate` - Sample rate to request from the device
    pub fn new(window_len: usize, preferred_rate: u32) -> Self {
        Self {
            preferred_rate,
            sample_rate: preferred_rate,
            window: RollingBuffer::new(window_len),
            receiver: None,
            stream: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl WaveformSource for CpalWaveformSource {
    fn open(&mut self) -> Result<(), AcquisitionError> {
        if self.is_open() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AcquisitionError::NoInputDevice)?;
        info!(
            "Using audio input device: {}",
            device.name().unwrap_or_else(|_| "unknown".into())
        );

        let supported = select_input_config(&device, self.preferred_rate)?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        info!("Capture config: {sample_rate} Hz, {channels} ch, {format:?}");

        let (tx, rx) = crossbeam_channel::bounded::<Vec<f32>>(CHANNEL_DEPTH);
        let err_fn = |err: cpal::StreamError| error!("An error occurred on the audio stream: {err}");

        let stream = match format {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    forward(&tx, downmix(data, channels));
                },
                err_fn,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let floats: Vec<f32> = data.iter().map(|&s| s as f32 / 32768.0).collect();
                    forward(&tx, downmix(&floats, channels));
                },
                err_fn,
                None,
            ),
            other => {
                return Err(AcquisitionError::UnsupportedConfig(format!(
                    "sample format {other:?}"
                )));
            }
        }
        .map_err(|e| AcquisitionError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AcquisitionError::Stream(e.to_string()))?;

        self.sample_rate = sample_rate;
        self.window.clear();
        self.receiver = Some(rx);
        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!("Error pausing input stream: {e}");
            }
            drop(stream);
            info!("Audio input closed");
        }
        self.receiver = None;
        self.window.clear();
    }

    fn current_waveform(&mut self) -> &[f32] {
        if let Some(rx) = &self.receiver {
            for chunk in rx.try_iter() {
                self.window.push(&chunk);
            }
        }
        self.window.as_slice()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Sends a chunk without ever blocking the audio callback; chunks are
/// dropped while the channel is full.
fn forward(tx: &Sender<Vec<f32>>, chunk: Vec<f32>) {
    let _ = tx.try_send(chunk);
}

/// Picks an input configuration at the preferred rate, fewest channels
/// first, falling back to the device default.
fn select_input_config(
    device: &cpal::Device,
    preferred_rate: u32,
) -> Result<SupportedStreamConfig, AcquisitionError> {
    let preferred = cpal::SampleRate(preferred_rate);
    let ranged = device.supported_input_configs().ok().and_then(|configs| {
        configs
            .filter(|c| {
                c.sample_format() == SampleFormat::F32
                    && c.min_sample_rate() <= preferred
                    && c.max_sample_rate() >= preferred
            })
            .min_by_key(|c| c.channels())
            .map(|c| c.with_sample_rate(preferred))
    });

    match ranged {
        Some(config) => Ok(config),
        None => device
            .default_input_config()
            .map_err(|e| AcquisitionError::UnsupportedConfig(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_buffer_keeps_newest_samples() {
        let mut buffer = RollingBuffer::new(4);
        buffer.push(&[1.0, 2.0]);
        assert_eq!(buffer.as_slice(), &[0.0, 0.0, 1.0, 2.0]);

        buffer.push(&[3.0, 4.0, 5.0]);
        assert_eq!(buffer.as_slice(), &[2.0, 3.0, 4.0, 5.0]);

        buffer.push(&[6.0, 7.0, 8.0, 9.0, 10.0]);
        assert_eq!(buffer.as_slice(), &[7.0, 8.0, 9.0, 10.0]);

        buffer.clear();
        assert_eq!(buffer.as_slice(), &[0.0; 4]);
    }

    #[test]
    fn stereo_is_averaged_to_mono() {
        assert_eq!(downmix(&[1.0, 0.0, 0.5, 0.5], 2), vec![0.5, 0.5]);
        assert_eq!(downmix(&[0.25, -0.25], 1), vec![0.25, -0.25]);
    }

    #[test]
    fn closed_source_reports_a_silent_window() {
        let mut source = CpalWaveformSource::new(8, 44100);
        assert!(!source.is_open());
        assert_eq!(source.current_waveform(), &[0.0; 8]);
        assert_eq!(source.sample_rate(), 44100);
        source.close();
    }
}
