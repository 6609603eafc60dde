//! # Tone Engine Module
//!
//! Playback side of the drone. [`ToneEngine`] is what the drone controller
//! talks to; [`CpalToneEngine`] implements it with sine voices rendered in
//! the CPAL output callback.

use crate::NoteSpecError;
use crate::theory::{midi_to_frequency, parse_note};
use anyhow::{Context, Result, anyhow, bail};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info, warn};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Linear attack time of a voice.
const ATTACK_SECONDS: f32 = 0.02;
/// Linear release time of a voice.
const RELEASE_SECONDS: f32 = 1.0;

/// A polyphonic note player.
pub trait ToneEngine {
    /// Connects the engine to its audio output.
    fn connect(&mut self) -> Result<()>;

    /// Starts the named notes after `when`. Names accept `#`/`b` and
    /// `♯`/`♭` accidentals.
    fn trigger_notes(&mut self, notes: &[String], when: Duration) -> Result<(), NoteSpecError>;

    /// Moves every sounding note into its release.
    fn release_all(&mut self);

    fn set_volume_db(&mut self, volume_db: f32);
}

#[derive(Debug, Clone)]
struct Voice {
    frequency: f32,
    phase: f32,
    level: f32,
    delay: usize,
    releasing: bool,
}

impl Voice {
    fn finished(&self) -> bool {
        self.releasing && (self.level <= 0.0 || self.delay > 0)
    }
}

/// Sine voices with a linear attack/release envelope.
#[derive(Debug, Clone)]
pub struct VoiceBank {
    voices: Vec<Voice>,
    gain: f32,
    sample_rate: f32,
}

impl VoiceBank {
    pub fn new(sample_rate: u32) -> Self {
        Self { voices: Vec::new(), gain: 1.0, sample_rate: sample_rate.max(1) as f32 }
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1) as f32;
    }

    pub fn set_gain_db(&mut self, volume_db: f32) {
        self.gain = 10f32.powf(volume_db / 20.0);
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn trigger(&mut self, frequency: f32, when: Duration) {
        self.voices.push(Voice {
            frequency,
            phase: 0.0,
            level: 0.0,
            delay: (when.as_secs_f32() * self.sample_rate) as usize,
            releasing: false,
        });
    }

    pub fn release_all(&mut self) {
        for voice in &mut self.voices {
            voice.releasing = true;
        }
        self.voices.retain(|v| !v.finished());
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Renders interleaved frames into `out`, writing the same mono signal
    /// to every channel.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let attack_step = 1.0 / (ATTACK_SECONDS * self.sample_rate);
        let release_step = 1.0 / (RELEASE_SECONDS * self.sample_rate);

        for frame in out.chunks_mut(channels) {
            let mut sample = 0.0;
            for voice in &mut self.voices {
                if voice.delay > 0 {
                    voice.delay -= 1;
                    continue;
                }
                if voice.releasing {
                    voice.level = (voice.level - release_step).max(0.0);
                } else {
                    voice.level = (voice.level + attack_step).min(1.0);
                }
                sample += (voice.phase * std::f32::consts::TAU).sin() * voice.level;
                voice.phase = (voice.phase + voice.frequency / self.sample_rate).fract();
            }
            frame.fill(sample * self.gain);
        }

        self.voices.retain(|v| !v.finished());
    }
}

/// Drone output on the default CPAL output device.
pub struct CpalToneEngine {
    bank: Arc<Mutex<VoiceBank>>,
    stream: Option<cpal::Stream>,
}

impl Default for CpalToneEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalToneEngine {
    pub fn new() -> Self {
        Self { bank: Arc::new(Mutex::new(VoiceBank::new(44100))), stream: None }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn with_bank(&self, f: impl FnOnce(&mut VoiceBank)) {
        match self.bank.lock() {
            Ok(mut bank) => f(&mut bank),
            Err(_) => warn!("Voice bank lock poisoned; drone command dropped"),
        }
    }
}

impl ToneEngine for CpalToneEngine {
    fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No output device available"))?;
        let supported = device
            .default_output_config()
            .context("querying default output config")?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            bail!("unsupported output sample format {:?}", supported.sample_format());
        }

        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        self.with_bank(|bank| bank.set_sample_rate(sample_rate));

        let bank = Arc::clone(&self.bank);
        let stream = device
            .build_output_stream(
                &supported.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| match bank.try_lock() {
                    Ok(mut bank) => bank.render(data, channels),
                    Err(_) => data.fill(0.0),
                },
                |err| error!("An error occurred on the output stream: {err}"),
                None,
            )
            .context("building drone output stream")?;
        stream.play().context("starting drone output stream")?;

        info!(
            "Drone output on {} at {sample_rate} Hz",
            device.name().unwrap_or_else(|_| "unknown".into())
        );
        self.stream = Some(stream);
        Ok(())
    }

    fn trigger_notes(&mut self, notes: &[String], when: Duration) -> Result<(), NoteSpecError> {
        let frequencies = notes
            .iter()
            .map(|name| parse_note(name).map(|midi| midi_to_frequency(midi as f32)))
            .collect::<Result<Vec<f32>, _>>()?;
        self.with_bank(|bank| {
            for frequency in frequencies {
                bank.trigger(frequency, when);
            }
        });
        Ok(())
    }

    fn release_all(&mut self) {
        self.with_bank(VoiceBank::release_all);
    }

    fn set_volume_db(&mut self, volume_db: f32) {
        self.with_bank(|bank| bank.set_gain_db(volume_db));
    }
}
