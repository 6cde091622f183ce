use std::f32::consts::PI;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use tracing::debug;

pub const DEFAULT_FFT_SIZE: usize = 2048;
pub const DEFAULT_SMOOTHING: f32 = 0.8;
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

/// One snapshot of audio features for the current playback position.
///
/// Arrays keep a fixed length for a given analysis resolution and are
/// replaced wholesale every tick. Band levels are averages on the same
/// 0..=255 scale as `frequency_data`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFeatureFrame {
    pub frequency_data: Vec<u8>,
    pub time_domain_data: Vec<u8>,
    pub bass_level: f32,
    pub mid_level: f32,
    pub treble_level: f32,
    pub average_frequency: f32,
}

impl Default for AudioFeatureFrame {
    fn default() -> Self {
        Self::silent(DEFAULT_FFT_SIZE / 2)
    }
}

impl AudioFeatureFrame {
    /// Zero-energy frame: empty spectrum, flat waveform at the midline.
    pub fn silent(bins: usize) -> Self {
        Self {
            frequency_data: vec![0; bins],
            time_domain_data: vec![128; bins * 2],
            bass_level: 0.0,
            mid_level: 0.0,
            treble_level: 0.0,
            average_frequency: 0.0,
        }
    }

    /// Builds a frame from raw arrays, deriving band levels from the spectrum.
    pub fn from_arrays(frequency_data: Vec<u8>, time_domain_data: Vec<u8>) -> Self {
        let (bass_level, mid_level, treble_level, average_frequency) = band_levels(&frequency_data);
        Self {
            frequency_data,
            time_domain_data,
            bass_level,
            mid_level,
            treble_level,
            average_frequency,
        }
    }

    /// Deterministic test/benchmark frame: a decaying spectrum whose low end
    /// swells with `bass` (0..=1) and a sine waveform.
    pub fn synthetic(bins: usize, t: f32, bass: f32) -> Self {
        let bass = bass.clamp(0.0, 1.0);
        let freq = (0..bins)
            .map(|i| {
                let x = i as f32 / bins.max(1) as f32;
                let body = (1.0 - x).powf(1.5) * 180.0;
                let wobble = ((x * 40.0 + t * 3.0).sin() * 0.5 + 0.5) * 50.0;
                let kick = if x < 0.08 { bass * 75.0 } else { 0.0 };
                (body + wobble + kick).clamp(0.0, 255.0) as u8
            })
            .collect();
        let time = (0..bins * 2)
            .map(|i| {
                let s = (i as f32 * 0.05 + t * 6.0).sin() * (0.3 + bass * 0.6);
                (128.0 + s * 127.0).clamp(0.0, 255.0) as u8
            })
            .collect();
        Self::from_arrays(freq, time)
    }

    /// Band energies normalised to 0..=1.
    pub fn bass(&self) -> f32 {
        self.bass_level / 255.0
    }

    pub fn mid(&self) -> f32 {
        self.mid_level / 255.0
    }

    pub fn treble(&self) -> f32 {
        self.treble_level / 255.0
    }

    pub fn energy(&self) -> f32 {
        (self.bass_level + self.mid_level + self.treble_level) / (3.0 * 255.0)
    }

    /// Spectrum value at a fractional position 0..1, 0 when the array is empty.
    pub fn freq_at(&self, pos: f32) -> u8 {
        sample_at(&self.frequency_data, pos)
    }

    /// Waveform value at a fractional position 0..1, 128 when empty.
    pub fn wave_at(&self, pos: f32) -> u8 {
        if self.time_domain_data.is_empty() {
            return 128;
        }
        sample_at(&self.time_domain_data, pos)
    }
}

fn sample_at(data: &[u8], pos: f32) -> u8 {
    if data.is_empty() {
        return 0;
    }
    let pos = if pos.is_finite() { pos.clamp(0.0, 1.0) } else { 0.0 };
    let idx = ((pos * data.len() as f32) as usize).min(data.len() - 1);
    data[idx]
}

/// Splits the spectrum into disjoint bass / mid / treble ranges (first
/// sixteenth, up to a quarter, remainder) and averages each.
pub fn band_levels(freq: &[u8]) -> (f32, f32, f32, f32) {
    let n = freq.len();
    if n == 0 {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let bass_end = (n / 16).max(1).min(n);
    let mid_end = (n / 4).max(bass_end).min(n);
    let avg = |s: &[u8]| {
        if s.is_empty() {
            0.0
        } else {
            s.iter().map(|&v| v as f32).sum::<f32>() / s.len() as f32
        }
    };
    (
        avg(&freq[..bass_end]),
        avg(&freq[bass_end..mid_end]),
        avg(&freq[mid_end..]),
        avg(freq),
    )
}

/// Producer of audio frames, polled once per tick with the playback
/// position. `None` means "not ready"; callers treat it as silence.
pub trait AudioSource {
    fn audio_data(&mut self, position: Duration) -> Option<AudioFeatureFrame>;
}

impl<F> AudioSource for F
where
    F: FnMut(Duration) -> Option<AudioFeatureFrame>,
{
    fn audio_data(&mut self, position: Duration) -> Option<AudioFeatureFrame> {
        self(position)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AudioLoadError {
    #[error("read wav: {0}")]
    Wav(#[from] hound::Error),
    #[error("wav has no channels")]
    NoChannels,
    #[error("wav has no samples")]
    Empty,
}

/// Decoded mono track.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

impl AudioTrack {
    pub fn load_wav(path: &Path) -> Result<Self, AudioLoadError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels as usize;
        if channels == 0 {
            return Err(AudioLoadError::NoChannels);
        }
        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()?
            }
        };
        let samples: Vec<f32> = interleaved
            .chunks(channels)
            .map(|frame| (frame.iter().sum::<f32>() / channels as f32).clamp(-1.0, 1.0))
            .collect();
        if samples.is_empty() {
            return Err(AudioLoadError::Empty);
        }
        debug!(
            path = %path.display(),
            sample_rate = spec.sample_rate,
            channels,
            frames = samples.len(),
            "loaded wav"
        );
        Ok(Self {
            sample_rate_hz: spec.sample_rate,
            samples,
        })
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate_hz == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate_hz as f64)
    }
}

/// Spectrum analyser producing byte spectra on the usual -100..-30 dB scale:
/// Blackman window, magnitude smoothing across calls, `fft_size / 2` bins.
pub struct FeatureAnalyzer {
    fft_size: usize,
    smoothing: f32,
    window: Vec<f32>,
    fft: Arc<dyn rustfft::Fft<f32>>,
    fft_buf: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    scratch: Vec<f32>,
}

impl FeatureAnalyzer {
    pub fn new(fft_size: usize, smoothing: f32) -> Self {
        let n = fft_size.max(32).next_power_of_two();
        let window = (0..n)
            .map(|i| {
                let x = i as f32 / n as f32;
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            })
            .collect();
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);
        Self {
            fft_size: n,
            smoothing: smoothing.clamp(0.0, 0.99),
            window,
            fft,
            fft_buf: vec![Complex { re: 0.0, im: 0.0 }; n],
            smoothed: vec![0.0; n / 2],
            scratch: vec![0.0; n],
        }
    }

    pub fn bins(&self) -> usize {
        self.fft_size / 2
    }

    pub fn set_smoothing(&mut self, smoothing: f32) {
        if smoothing.is_finite() {
            self.smoothing = smoothing.clamp(0.0, 0.99);
        }
    }

    /// Analyses the `fft_size` samples ending at `sample_end`.
    pub fn analyze(&mut self, samples: &[f32], sample_end: usize) -> AudioFeatureFrame {
        let n = self.fft_size;
        fill_window(samples, sample_end, &mut self.scratch);

        let time: Vec<u8> = self
            .scratch
            .iter()
            .map(|&s| (128.0 * (1.0 + s)).clamp(0.0, 255.0) as u8)
            .collect();

        for i in 0..n {
            self.fft_buf[i].re = self.scratch[i] * self.window[i];
            self.fft_buf[i].im = 0.0;
        }
        self.fft.process(&mut self.fft_buf);

        let k = self.smoothing;
        let scale = 255.0 / (MAX_DECIBELS - MIN_DECIBELS);
        let mut freq = Vec::with_capacity(n / 2);
        for (i, c) in self.fft_buf.iter().take(n / 2).enumerate() {
            let mag = (c.re * c.re + c.im * c.im).sqrt() / n as f32;
            let s = k * self.smoothed[i] + (1.0 - k) * mag;
            self.smoothed[i] = if s.is_finite() { s } else { 0.0 };
            let db = 20.0 * self.smoothed[i].max(1e-12).log10();
            freq.push(((db - MIN_DECIBELS) * scale).clamp(0.0, 255.0) as u8);
        }
        AudioFeatureFrame::from_arrays(freq, time)
    }
}

fn fill_window(samples: &[f32], sample_end: usize, out: &mut [f32]) {
    out.fill(0.0);
    let len = out.len();
    let end = sample_end.min(samples.len());
    let start = end.saturating_sub(len);
    let src = &samples[start..end];
    let dst_off = len.saturating_sub(src.len());
    out[dst_off..].copy_from_slice(src);
}

/// Plays a decoded track through an analyser.
pub struct TrackSource {
    track: AudioTrack,
    analyzer: FeatureAnalyzer,
}

impl TrackSource {
    pub fn new(track: AudioTrack, analyzer: FeatureAnalyzer) -> Self {
        Self { track, analyzer }
    }

    pub fn track(&self) -> &AudioTrack {
        &self.track
    }

    /// Forwards the visualizer's `smoothing` setting to the analyser.
    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.analyzer.set_smoothing(smoothing);
    }
}

impl AudioSource for TrackSource {
    fn audio_data(&mut self, position: Duration) -> Option<AudioFeatureFrame> {
        let end = (position.as_secs_f64() * self.track.sample_rate_hz as f64).floor() as usize;
        if end > self.track.samples.len() + self.analyzer.fft_size {
            return None;
        }
        Some(self.analyzer.analyze(&self.track.samples, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_levels_split_spectrum_disjointly() {
        let mut freq = vec![0u8; 64];
        freq[..4].fill(200);
        let (bass, mid, treble, avg) = band_levels(&freq);
        assert_eq!(bass, 200.0);
        assert_eq!(mid, 0.0);
        assert_eq!(treble, 0.0);
        assert!((avg - 12.5).abs() < 1e-4);
    }

    #[test]
    fn analyzer_finds_the_tone_bin() {
        let sr = 48_000.0f32;
        let hz = 1_500.0f32;
        let samples: Vec<f32> = (0..4096)
            .map(|i| (2.0 * PI * hz * i as f32 / sr).sin() * 0.01)
            .collect();
        let mut an = FeatureAnalyzer::new(2048, 0.0);
        let frame = an.analyze(&samples, samples.len());
        assert_eq!(frame.frequency_data.len(), 1024);
        assert_eq!(frame.time_domain_data.len(), 2048);
        let peak = frame
            .frequency_data
            .iter()
            .enumerate()
            .max_by_key(|(_, v)| **v)
            .map(|(i, _)| i)
            .unwrap();
        let expected = (hz / sr * 2048.0).round() as usize;
        assert!(peak.abs_diff(expected) <= 1, "peak {peak} expected {expected}");
    }

    #[test]
    fn silence_maps_to_zero_spectrum() {
        let mut an = FeatureAnalyzer::new(1024, 0.8);
        let frame = an.analyze(&[0.0; 2048], 2048);
        assert!(frame.frequency_data.iter().all(|&v| v == 0));
        assert!(frame.time_domain_data.iter().all(|&v| v == 128));
    }
}
