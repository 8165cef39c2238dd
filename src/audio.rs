use std::{
    f64::consts::{PI, TAU},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use anyhow::Context;
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Device, Sample, Stream, StreamConfig,
};

/// How long a single beep lasts, in seconds.
const BEEP_SECONDS: f64 = 0.15;

/// The pitch of the beep, in Hz.
const BEEP_FREQUENCY: f64 = 440.0;

/// Manages the audio on the current system, and plays a short tone
/// each time [`System::beep`] is called.
pub struct System {
    stream: Stream,
    /// Samples left to play of the current beep, shared with the stream callback.
    remaining: Arc<AtomicU32>,
    sample_rate: u32,
}

impl System {
    /// Create a new [`System`] on the default output device.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no output device or if an output stream
    /// cannot be built for it.
    pub fn new() -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("No audio output device available")?;

        let remaining = Arc::new(AtomicU32::new(0));
        let (stream, sample_rate) = Self::get_stream(&device, remaining.clone())?;
        Ok(Self {
            stream,
            remaining,
            sample_rate,
        })
    }

    /// Builds an output stream in whichever sample format `device` prefers,
    /// returning it along with the device's sample rate.
    fn get_stream(device: &Device, remaining: Arc<AtomicU32>) -> anyhow::Result<(Stream, u32)> {
        let config = device.default_output_config()?;
        let sample_rate = config.sample_rate().0;
        let stream = match config.sample_format() {
            cpal::SampleFormat::I16 => {
                Self::create_stream::<i16>(device, &config.into(), remaining)
            }
            cpal::SampleFormat::U16 => {
                Self::create_stream::<u16>(device, &config.into(), remaining)
            }
            cpal::SampleFormat::F32 => {
                Self::create_stream::<f32>(device, &config.into(), remaining)
            }
            format => anyhow::bail!("Unsupported sample format {format:?}"),
        }?;
        Ok((stream, sample_rate))
    }

    /// Builds a stream that plays a triangle wave while `remaining` is
    /// above zero, counting it down one sample frame at a time.
    fn create_stream<T>(
        device: &Device,
        config: &StreamConfig,
        remaining: Arc<AtomicU32>,
    ) -> anyhow::Result<Stream>
    where
        T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f64>,
    {
        let sample_rate = f64::from(config.sample_rate.0);
        let channels = usize::from(config.channels);

        let mut sample_clock = 0f64;
        let mut next_sample = move || {
            sample_clock = (sample_clock + 1.0) % sample_rate;
            let playing = remaining
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |left| {
                    left.checked_sub(1)
                })
                .is_ok();
            if playing {
                (BEEP_FREQUENCY * TAU * sample_clock / sample_rate).sin().asin() * 2.0 / PI
            } else {
                0.0
            }
        };

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let value: T = next_sample().to_sample();
                    for sample in frame.iter_mut() {
                        *sample = value;
                    }
                }
            },
            |err| log::error!("An error occurred on the audio stream: {err}"),
            None,
        )?;
        Ok(stream)
    }

    /// Starts the output stream. Silent until the first [`System::beep`].
    ///
    /// # Errors
    ///
    /// Returns an error if the host refuses to start the stream.
    pub fn play(&self) -> anyhow::Result<()> {
        self.stream.play().context("Failed to play audio stream.")
    }

    /// Start a beep, restarting it if one is already playing.
    pub fn beep(&self) {
        let samples = (f64::from(self.sample_rate) * BEEP_SECONDS) as u32;
        self.remaining.store(samples, Ordering::Relaxed);
    }
}
