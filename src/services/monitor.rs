//! Simulated heart-rate and waveform feed for the live preview.
//!
//! Purely cosmetic: the numbers are synthesized, not measured.

use std::collections::VecDeque;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);
pub const WINDOW_LEN: usize = 200;

const RESTING_BPM: u32 = 72;
const MIN_BPM: u32 = 60;
const MAX_BPM: u32 = 100;
/// Beat phase advanced per sample at the resting rate.
const PHASE_STEP: f64 = 1.0 / 50.0;

/// Snapshot published on every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub heart_rate: u32,
    /// Most recent `WINDOW_LEN` samples, oldest first, roughly in [-0.3, 1.0].
    pub waveform: Vec<f32>,
}

/// Synthetic PQRST complex sampled at `phase` in [0, 1).
pub fn ecg_point(phase: f64) -> f32 {
    let wave = |center: f64, width: f64, height: f64| {
        let d = (phase - center) / width;
        height * (-d * d).exp()
    };
    (wave(0.20, 0.025, 0.15)
        + wave(0.36, 0.010, -0.10)
        + wave(0.40, 0.012, 1.00)
        + wave(0.44, 0.012, -0.25)
        + wave(0.70, 0.050, 0.30)) as f32
}

struct Simulator {
    phase: f64,
    heart_rate: u32,
    window: VecDeque<f32>,
}

impl Simulator {
    fn new() -> Self {
        let mut sim = Self {
            phase: 0.0,
            heart_rate: RESTING_BPM,
            window: VecDeque::with_capacity(WINDOW_LEN),
        };
        for _ in 0..WINDOW_LEN {
            sim.advance();
        }
        sim
    }

    fn advance(&mut self) {
        if self.window.len() == WINDOW_LEN {
            self.window.pop_front();
        }
        self.window.push_back(ecg_point(self.phase));
        let step = PHASE_STEP * f64::from(self.heart_rate) / f64::from(RESTING_BPM);
        self.phase = (self.phase + step).fract();
    }

    fn tick(&mut self, rng: &mut impl Rng) {
        self.advance();
        let drift: i32 = rng.gen_range(-1..=1);
        self.heart_rate = self
            .heart_rate
            .saturating_add_signed(drift)
            .clamp(MIN_BPM, MAX_BPM);
    }

    fn reading(&self) -> Reading {
        Reading {
            heart_rate: self.heart_rate,
            waveform: self.window.iter().copied().collect(),
        }
    }
}

/// Repeating task that refreshes the preview feed. Stops when dropped.
pub struct WaveformMonitor {
    readings: watch::Receiver<Reading>,
    task: JoinHandle<()>,
}

impl WaveformMonitor {
    pub fn start(interval: Duration) -> Self {
        let mut sim = Simulator::new();
        let (tx, rx) = watch::channel(sim.reading());

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                sim.tick(&mut rand::thread_rng());
                if tx.send(sim.reading()).is_err() {
                    break;
                }
            }
        });

        tracing::debug!(interval_ms = interval.as_millis() as u64, "Waveform monitor started");
        Self { readings: rx, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<Reading> {
        self.readings.clone()
    }

    pub fn latest(&self) -> Reading {
        self.readings.borrow().clone()
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for WaveformMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}
