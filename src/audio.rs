use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::PlayerError;

pub trait AudioOutput {
    fn play(&mut self) -> anyhow::Result<()>;

    fn stop(&mut self) -> anyhow::Result<()>;
}

/// Decoded WAV contents, interleaved.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    pub samples: Arc<[f32]>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl AudioTrack {
    pub fn load(path: &Path) -> Result<Self, PlayerError> {
        if !path.is_file() {
            return Err(PlayerError::MissingAsset(path.to_path_buf()));
        }
        let reader = hound::WavReader::open(path).map_err(|source| PlayerError::Audio {
            path: path.to_path_buf(),
            source,
        })?;
        let spec = reader.spec();

        let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
            hound::SampleFormat::Float => reader.into_samples::<f32>().collect(),
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|sample| sample.map(|s| s as f32 * scale))
                    .collect()
            }
        };
        let samples = samples.map_err(|source| PlayerError::Audio {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(
            ?path,
            channels = spec.channels,
            sample_rate = spec.sample_rate,
            samples = samples.len(),
            "decoded audio track"
        );
        Ok(Self {
            samples: samples.into(),
            channels: spec.channels,
            sample_rate: spec.sample_rate,
        })
    }

    pub fn duration_secs(&self) -> f64 {
        let frames = self.samples.len() / self.channels.max(1) as usize;
        frames as f64 / self.sample_rate.max(1) as f64
    }
}

/// Copies the next chunk of `samples` into `out`, silence once exhausted.
fn fill_from(samples: &[f32], cursor: &AtomicUsize, out: &mut [f32]) {
    let start = cursor.fetch_add(out.len(), Ordering::Relaxed).min(samples.len());
    let end = (start + out.len()).min(samples.len());
    let copied = end - start;
    out[..copied].copy_from_slice(&samples[start..end]);
    out[copied..].fill(0.0);
}

/// First f32 output range that takes the track as is. Nothing is resampled
/// or remixed, so channels and rate must both fit.
pub fn pick_config(
    ranges: &[cpal::SupportedStreamConfigRange],
    channels: u16,
    sample_rate: u32,
) -> Option<cpal::StreamConfig> {
    let rate = cpal::SampleRate(sample_rate);
    ranges
        .iter()
        .find(|range| {
            range.channels() == channels
                && range.sample_format() == cpal::SampleFormat::F32
                && range.min_sample_rate() <= rate
                && rate <= range.max_sample_rate()
        })
        .map(|range| cpal::StreamConfig {
            channels,
            sample_rate: rate,
            buffer_size: cpal::BufferSize::Default,
        })
}

/// Plays an [`AudioTrack`] once through the default output device.
pub struct WavPlayer {
    track: AudioTrack,
    device: cpal::Device,
    config: cpal::StreamConfig,
    stream: Option<cpal::Stream>,
}

impl WavPlayer {
    /// Resolves the output device and a stream format for `track` up front so
    /// an unusable device is reported before any window opens.
    pub fn new(track: AudioTrack) -> Result<Self, PlayerError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(PlayerError::NoAudioDevice)?;
        let ranges: Vec<_> = device.supported_output_configs()?.collect();
        let config = pick_config(&ranges, track.channels, track.sample_rate).ok_or(
            PlayerError::UnsupportedAudioFormat {
                channels: track.channels,
                sample_rate: track.sample_rate,
            },
        )?;
        tracing::debug!(
            device = %device.name().unwrap_or_default(),
            ?config,
            "audio output resolved"
        );
        Ok(Self {
            track,
            device,
            config,
            stream: None,
        })
    }
}

impl AudioOutput for WavPlayer {
    fn play(&mut self) -> anyhow::Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let samples = Arc::clone(&self.track.samples);
        let cursor = AtomicUsize::new(0);
        let stream = self.device.build_output_stream(
            &self.config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                fill_from(&samples, &cursor, data)
            },
            |err| tracing::error!(%err, "audio stream error"),
            None,
        )?;
        stream.play()?;
        tracing::info!(
            duration_secs = self.track.duration_secs(),
            "audio playback started"
        );
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        if let Some(stream) = self.stream.take() {
            stream.pause()?;
            tracing::debug!("audio playback stopped");
        }
        Ok(())
    }
}
