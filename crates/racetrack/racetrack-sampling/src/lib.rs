//! Adaptive sampling controller.
//!
//! Gates whether a given memory access actually runs the FastTrack rules.
//! Two schemes are selectable at startup: a single global counter pair
//! (`Count`) or a counter pair attached to every `ShadowVar` (`Adaptive`,
//! whose rate decays as a location is observed repeatedly).
//!
//! The inclusion test is shared by both schemes: `S * (100 - rate) < N * rate`.
//! Counters use relaxed atomics deliberately — an occasional lost
//! increment only perturbs the empirical sampled fraction, never the
//! correctness of the rules that run when included.

use std::sync::atomic::{AtomicU64, Ordering};

/// `rate := max(rate * exp(-1/100), threshold)` decay factor for `Adaptive`.
pub const ADAPTIVE_DECAY_FACTOR: f64 = 0.990_049_833_749_168_1; // exp(-1/100)

/// A `(rate ∈ [0, 100]) -> included?` counter pair.
///
/// `sampled` (`S`) and `not_sampled` (`N`) both start at `1`, which keeps
/// the inclusion test well-defined (and biased towards inclusion) before
/// any observations have been made.
#[derive(Debug)]
pub struct SampleCounters {
    sampled: AtomicU64,
    not_sampled: AtomicU64,
}

impl Default for SampleCounters {
    fn default() -> Self {
        SampleCounters {
            sampled: AtomicU64::new(1),
            not_sampled: AtomicU64::new(1),
        }
    }
}

impl SampleCounters {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn decide(&self, rate: u8) -> bool {
        let rate = rate as u64;
        let s = self.sampled.load(Ordering::Relaxed);
        let n = self.not_sampled.load(Ordering::Relaxed);
        let included = s * (100 - rate) < n * rate;
        if included {
            self.sampled.fetch_add(1, Ordering::Relaxed);
        } else {
            self.not_sampled.fetch_add(1, Ordering::Relaxed);
        }
        included
    }

    pub fn sampled(&self) -> u64 {
        self.sampled.load(Ordering::Relaxed)
    }

    pub fn not_sampled(&self) -> u64 {
        self.not_sampled.load(Ordering::Relaxed)
    }
}

/// Global `Count` scheme: one shared counter pair, fixed `rate` for the
/// lifetime of the run.
#[derive(Debug)]
pub struct CountSampler {
    counters: SampleCounters,
    rate: u8,
}

impl CountSampler {
    pub fn new(rate: u8) -> Self {
        CountSampler {
            counters: SampleCounters::new(),
            rate: rate.min(100),
        }
    }

    #[inline]
    pub fn include(&self) -> bool {
        self.counters.decide(self.rate)
    }
}

/// Per-location `Adaptive` scheme. One instance lives inside each
/// `ShadowVar`; `rate` decays towards `threshold` as the location is
/// repeatedly observed, so hot, frequently-raced locations converge to a
/// lower sampling probability over time while cold locations stay close to
/// the starting rate.
#[derive(Debug)]
pub struct AdaptiveSampler {
    counters: SampleCounters,
    /// Current sampling rate for this location, fixed-point (value *
    /// 2^32) so it can live in an `AtomicU64` alongside the counters.
    rate: AtomicU64,
    threshold: u8,
}

const RATE_FIXED_POINT_SHIFT: u32 = 32;

impl AdaptiveSampler {
    pub fn new(initial_rate: u8, threshold: u8) -> Self {
        let fixed = (initial_rate as u64) << RATE_FIXED_POINT_SHIFT;
        AdaptiveSampler {
            counters: SampleCounters::new(),
            rate: AtomicU64::new(fixed),
            threshold,
        }
    }

    #[inline]
    fn rate_f64(&self) -> f64 {
        (self.rate.load(Ordering::Relaxed) as f64) / (1u64 << RATE_FIXED_POINT_SHIFT) as f64
    }

    #[inline]
    fn set_rate_f64(&self, rate: f64) {
        let fixed = (rate * (1u64 << RATE_FIXED_POINT_SHIFT) as f64) as u64;
        self.rate.store(fixed, Ordering::Relaxed);
    }

    /// Runs the inclusion test against the current rate, then decays the
    /// rate towards `threshold`: `rate := max(rate * expFactor,
    /// threshold)`. Decay happens unconditionally after every evaluation,
    /// whether or not the access was included.
    #[inline]
    pub fn include(&self) -> bool {
        let rate = self.rate_f64();
        let included = self.counters.decide(rate.round() as u8);
        let decayed = (rate * ADAPTIVE_DECAY_FACTOR).max(self.threshold as f64);
        self.set_rate_f64(decayed);
        included
    }

    pub fn current_rate(&self) -> f64 {
        self.rate_f64()
    }
}

/// Dispatches to whichever scheme `sampling_scheme` selected at startup.
#[derive(Debug)]
pub enum SamplingScheme {
    Count(CountSampler),
    Adaptive { default_rate: u8, threshold: u8 },
}

impl SamplingScheme {
    pub fn count(rate: u8) -> Self {
        SamplingScheme::Count(CountSampler::new(rate))
    }

    pub fn adaptive(default_rate: u8, threshold: u8) -> Self {
        SamplingScheme::Adaptive { default_rate, threshold }
    }

    /// For `Adaptive`, the per-`ShadowVar` sampler is constructed with
    /// these parameters; this scheme itself holds no shared state for that
    /// case (each location owns its own `AdaptiveSampler`).
    pub fn adaptive_params(&self) -> Option<(u8, u8)> {
        match self {
            SamplingScheme::Adaptive { default_rate, threshold } => Some((*default_rate, *threshold)),
            SamplingScheme::Count(_) => None,
        }
    }

    /// For `Count`, decides inclusion directly against the shared global
    /// counters. Returns `None` for `Adaptive`, whose decision is per-`ShadowVar`.
    pub fn include_global(&self) -> Option<bool> {
        match self {
            SamplingScheme::Count(c) => Some(c.include()),
            SamplingScheme::Adaptive { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_sampler_at_rate_100_always_includes() {
        let s = CountSampler::new(100);
        for _ in 0..1000 {
            assert!(s.include());
        }
    }

    #[test]
    fn count_sampler_at_rate_0_never_includes() {
        let s = CountSampler::new(0);
        for _ in 0..1000 {
            assert!(!s.include());
        }
    }

    #[test]
    fn count_sampler_converges_towards_rate() {
        let s = CountSampler::new(50);
        let mut included = 0u64;
        let trials = 100_000u64;
        for _ in 0..trials {
            if s.include() {
                included += 1;
            }
        }
        let frac = included as f64 / trials as f64;
        assert!((frac - 0.5).abs() < 0.02, "empirical fraction {frac} too far from 0.5");
    }

    #[test]
    fn adaptive_sampler_decays_towards_threshold() {
        let s = AdaptiveSampler::new(100, 10);
        assert!((s.current_rate() - 100.0).abs() < 1e-6);
        for _ in 0..2000 {
            s.include();
        }
        assert!(s.current_rate() <= 11.0, "rate {} did not decay near threshold", s.current_rate());
        assert!(s.current_rate() >= 10.0);
    }
}
