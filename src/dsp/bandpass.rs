//! Butterworth bandpass filter
//!
//! Designed in the analog domain (low-pass prototype → band-pass transform
//! around pre-warped band edges), mapped to digital with the bilinear
//! transform and stored as a cascade of second-order sections. Each section
//! has its zeros at DC and Nyquist and is scaled to unity gain at the
//! geometric band centre, so the cascade is too.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;
use tracing::debug;

use crate::engine::AudioBuffer;
use crate::error::{Result, SonicPrepError};

/// Bilinear transform constant for frequencies normalized to Nyquist = 1
const FS: f64 = 2.0;

/// One second-order section: `(b0 + b2·z⁻²) / (1 + a1·z⁻¹ + a2·z⁻²)`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Section {
    b0: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Section {
    /// Build a section from two analog poles whose sum and product are real
    fn from_analog_poles(s1: Complex<f64>, s2: Complex<f64>, centre: f64) -> Self {
        let z1 = bilinear(s1);
        let z2 = bilinear(s2);
        let mut section = Self {
            b0: 1.0,
            b2: -1.0,
            a1: -(z1 + z2).re,
            a2: (z1 * z2).re,
        };
        let gain = section.response(centre).norm();
        if gain > 0.0 && gain.is_finite() {
            section.b0 /= gain;
            section.b2 /= gain;
        }
        section
    }

    /// Complex frequency response at digital angular frequency `omega`
    fn response(&self, omega: f64) -> Complex<f64> {
        let z1 = Complex::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = z2 * self.b2 + self.b0;
        let den = z1 * self.a1 + z2 * self.a2 + 1.0;
        num / den
    }
}

/// Transposed direct form II state for one section
#[derive(Debug, Clone, Copy, Default)]
struct SectionState {
    s1: f64,
    s2: f64,
}

impl SectionState {
    #[inline]
    fn process(&mut self, input: f64, c: &Section) -> f64 {
        let output = c.b0 * input + self.s1;
        self.s1 = self.s2 - c.a1 * output;
        self.s2 = c.b2 * input - c.a2 * output;
        output
    }
}

#[inline]
fn bilinear(s: Complex<f64>) -> Complex<f64> {
    (s + 2.0 * FS) / (-s + 2.0 * FS)
}

/// Pre-warp a Nyquist-normalized frequency for the bilinear transform
#[inline]
fn prewarp(normalized: f64) -> f64 {
    2.0 * FS * (PI * normalized / FS).tan()
}

/// Butterworth IIR bandpass filter
#[derive(Debug, Clone, PartialEq)]
pub struct BandpassFilter {
    order: usize,
    sample_rate: u32,
    low_hz: f64,
    high_hz: f64,
    sections: Vec<Section>,
}

impl BandpassFilter {
    /// Design a bandpass filter
    ///
    /// `order` is the order of the low-pass prototype; the resulting filter
    /// has `order` second-order sections.
    ///
    /// # Errors
    /// * `InvalidParameter` - If `order` is zero, `sample_rate` is zero,
    ///   `low_hz >= high_hz`, or either cutoff divided by Nyquist is outside
    ///   the open interval (0, 1)
    pub fn new(order: usize, sample_rate: u32, low_hz: f64, high_hz: f64) -> Result<Self> {
        if order == 0 {
            return Err(SonicPrepError::invalid_parameter("filter_order", order, ">= 1"));
        }
        if sample_rate == 0 {
            return Err(SonicPrepError::invalid_parameter(
                "sample_rate",
                sample_rate,
                "> 0 Hz",
            ));
        }
        if !(low_hz < high_hz) {
            return Err(SonicPrepError::invalid_parameter(
                "filter_band",
                format!("{low_hz}..{high_hz} Hz"),
                "low cutoff below high cutoff",
            ));
        }

        let nyquist = sample_rate as f64 / 2.0;
        let low = low_hz / nyquist;
        let high = high_hz / nyquist;
        for (param, value, normalized) in [("filter_low_hz", low_hz, low), ("filter_high_hz", high_hz, high)] {
            if !(normalized > 0.0 && normalized < 1.0) {
                return Err(SonicPrepError::invalid_parameter(
                    param,
                    value,
                    format!("strictly between 0 and Nyquist ({nyquist} Hz)"),
                ));
            }
        }

        let sections = design_sections(order, low, high);
        debug!(order, sample_rate, low_hz, high_hz, "designed bandpass");

        Ok(Self {
            order,
            sample_rate,
            low_hz,
            high_hz,
            sections,
        })
    }

    /// Prototype order
    pub fn order(&self) -> usize {
        self.order
    }

    /// Design sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Pass band edges in Hz
    pub fn band(&self) -> (f64, f64) {
        (self.low_hz, self.high_hz)
    }

    /// Number of second-order sections in the cascade
    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Magnitude response of the cascade at `freq_hz`
    pub fn magnitude_at(&self, freq_hz: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / self.sample_rate as f64;
        self.sections
            .iter()
            .map(|s| s.response(omega))
            .fold(Complex::new(1.0, 0.0), |acc, h| acc * h)
            .norm()
    }

    /// Filter every channel causally, starting from zero state
    ///
    /// # Errors
    /// * `InvalidParameter` - If the buffer's rate differs from the design rate
    pub fn filter(&self, buffer: &AudioBuffer) -> Result<AudioBuffer> {
        if buffer.sample_rate != self.sample_rate {
            return Err(SonicPrepError::invalid_parameter(
                "sample_rate",
                buffer.sample_rate,
                format!("{} Hz (filter design rate)", self.sample_rate),
            ));
        }

        let samples = buffer
            .samples
            .iter()
            .map(|channel| self.filter_channel(channel))
            .collect();
        Ok(buffer.with_samples(samples))
    }

    fn filter_channel(&self, channel: &[f32]) -> Vec<f32> {
        let mut states = vec![SectionState::default(); self.sections.len()];
        channel
            .iter()
            .map(|&x| {
                let y = self
                    .sections
                    .iter()
                    .zip(states.iter_mut())
                    .fold(x as f64, |acc, (section, state)| state.process(acc, section));
                y as f32
            })
            .collect()
    }
}

/// Bandpass `buffer` at its own sample rate
pub fn bandpass(buffer: &AudioBuffer, order: usize, low_hz: f64, high_hz: f64) -> Result<AudioBuffer> {
    BandpassFilter::new(order, buffer.sample_rate, low_hz, high_hz)?.filter(buffer)
}

/// Design the cascade for band edges normalized to Nyquist
fn design_sections(order: usize, low: f64, high: f64) -> Vec<Section> {
    let wl = prewarp(low);
    let wh = prewarp(high);
    let bw = wh - wl;
    let w0 = (wl * wh).sqrt();
    // Digital frequency the analog centre lands on
    let centre = 2.0 * (w0 / (2.0 * FS)).atan();

    // Each prototype pole p maps to the pair p·bw/2 ± sqrt((p·bw/2)² − w0²)
    let split = |p: Complex<f64>| {
        let half = p * (bw / 2.0);
        let root = (half * half - w0 * w0).sqrt();
        (half + root, half - root)
    };

    let n = order as f64;
    let mut sections = Vec::with_capacity(order);
    for k in 0..order / 2 {
        let theta = PI * (2.0 * k as f64 + n + 1.0) / (2.0 * n);
        let p = Complex::from_polar(1.0, theta);
        let (a, b) = split(p);
        let (a_conj, b_conj) = split(p.conj());
        sections.push(Section::from_analog_poles(a, a_conj, centre));
        sections.push(Section::from_analog_poles(b, b_conj, centre));
    }
    if order % 2 == 1 {
        let (a, b) = split(Complex::new(-1.0, 0.0));
        sections.push(Section::from_analog_poles(a, b, centre));
    }
    sections
}
