use std::time::{Duration, Instant};

use tracing::info;

#[derive(Debug, Clone)]
pub struct StepTiming {
    pub name: String,
    pub count: u64,
    pub total: Duration,
    pub max: Duration,
}

impl StepTiming {
    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos((self.total.as_nanos() / u128::from(self.count)) as u64)
        }
    }
}

/// Per-step durations accumulated over the whole poll loop, in first-seen order.
#[derive(Debug, Default)]
pub struct LoopTimings {
    steps: Vec<StepTiming>,
}

impl LoopTimings {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add_step(&mut self, name: impl Into<String>, duration: Duration) {
        let name = name.into();
        match self.steps.iter_mut().find(|s| s.name == name) {
            Some(step) => {
                step.count += 1;
                step.total += duration;
                step.max = step.max.max(duration);
            }
            None => self.steps.push(StepTiming {
                name,
                count: 1,
                total: duration,
                max: duration,
            }),
        }
    }

    pub fn record(&mut self, (name, duration): (String, Duration)) {
        self.add_step(name, duration);
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.total).sum()
    }

    pub fn get_step(&self, name: &str) -> Option<&StepTiming> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }

    pub fn log_summary(&self) {
        let total = self.total_duration();
        info!("Loop timing summary:");
        for step in &self.steps {
            let percentage = if total.as_secs_f64() > 0.0 {
                (step.total.as_secs_f64() / total.as_secs_f64()) * 100.0
            } else {
                0.0
            };
            info!(
                "{:<10} n={:<6} mean {:>9.3}ms  max {:>9.3}ms ({:>5.1}%)",
                step.name,
                step.count,
                step.mean().as_secs_f64() * 1000.0,
                step.max.as_secs_f64() * 1000.0,
                percentage
            );
        }
        info!("{:<10} {:>12.3}ms", "total", total.as_secs_f64() * 1000.0);
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    pub fn stop(self) -> (String, Duration) {
        (self.name, self.start.elapsed())
    }
}
