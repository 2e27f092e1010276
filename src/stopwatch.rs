use std::time::Instant;

use tracing::info;

/// Wall time of the named phases of one run, in the order they finished.
#[derive(Clone)]
pub struct Stopwatch {
    start_time: Instant,
    phase_durations: Vec<PhaseDurationMicros>,
}

pub type PhaseDurationMicros = (&'static str, u128);

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Stopwatch {
        Stopwatch {
            start_time: Instant::now(),
            phase_durations: Vec::new(),
        }
    }

    pub fn start(&mut self) {
        self.start_time = Instant::now();
    }

    /// Records the time since the last `start` (or `stop`) under `phase` and restarts.
    pub fn stop(&mut self, phase: &'static str) {
        let duration_as_micros = self.start_time.elapsed().as_micros();
        self.phase_durations.push((phase, duration_as_micros));
        self.start_time = Instant::now();
    }

    pub fn get_n(&self) -> usize {
        self.phase_durations.len()
    }

    pub fn total_micros(&self) -> u128 {
        self.phase_durations.iter().map(|(_, micros)| micros).sum()
    }

    pub fn get_raw_durations(&self) -> &[PhaseDurationMicros] {
        &self.phase_durations
    }

    pub fn log(&self) {
        for (phase, micros) in &self.phase_durations {
            info!(phase = *phase, micros = *micros as u64, "phase finished");
        }
        info!(
            phases = self.get_n(),
            micros = self.total_micros() as u64,
            "run finished"
        );
    }
}
