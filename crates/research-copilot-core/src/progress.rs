//! Simulated processing progress for uploads.
//!
//! The backend does all processing inside the upload request and reports no
//! milestones. The stages shown here are paced by a fixed schedule of
//! elapsed-time offsets and are an approximation for display only.

use std::time::Duration;
use tokio::time::Instant;

use crate::config::ProgressConfig;

/// Stage of an in-flight upload as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProcessingStage {
    NotStarted,
    Uploading,
    Extracting,
    Summarizing,
    Indexing,
    Finalizing,
    Complete,
}

impl ProcessingStage {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Waiting for a file",
            Self::Uploading => "Uploading file",
            Self::Extracting => "Extracting text",
            Self::Summarizing => "Generating summary",
            Self::Indexing => "Indexing for questions",
            Self::Finalizing => "Finalizing",
            Self::Complete => "Processing complete",
        }
    }
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Elapsed-time offsets at which each intermediate stage begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSchedule {
    steps: Vec<(Duration, ProcessingStage)>,
    tick: Duration,
}

impl ProgressSchedule {
    pub fn from_config(config: &ProgressConfig) -> Self {
        let mut steps = vec![
            (Duration::ZERO, ProcessingStage::Uploading),
            (Duration::from_millis(config.extracting_after_ms), ProcessingStage::Extracting),
            (Duration::from_millis(config.summarizing_after_ms), ProcessingStage::Summarizing),
            (Duration::from_millis(config.indexing_after_ms), ProcessingStage::Indexing),
            (Duration::from_millis(config.finalizing_after_ms), ProcessingStage::Finalizing),
        ];
        // Out-of-order offsets in a config file must not make stages go backwards
        steps.sort_by_key(|(offset, stage)| (*offset, *stage));

        Self {
            steps,
            tick: Duration::from_millis(config.tick_ms.max(1)),
        }
    }

    /// Stage shown after `elapsed` time in flight. Never reaches
    /// [`ProcessingStage::Complete`]; only a finished request does that.
    pub fn stage_at(&self, elapsed: Duration) -> ProcessingStage {
        self.steps
            .iter()
            .take_while(|(offset, _)| *offset <= elapsed)
            .map(|(_, stage)| *stage)
            .max()
            .unwrap_or(ProcessingStage::Uploading)
    }

    /// How often the indicator should be re-evaluated
    pub const fn tick(&self) -> Duration {
        self.tick
    }
}

impl Default for ProgressSchedule {
    fn default() -> Self {
        Self::from_config(&ProgressConfig::default())
    }
}

/// Progress of one upload, anchored at the moment it started.
#[derive(Debug, Clone)]
pub struct SimulatedProgress {
    started: Instant,
    schedule: ProgressSchedule,
}

impl SimulatedProgress {
    pub fn start(schedule: ProgressSchedule) -> Self {
        Self {
            started: Instant::now(),
            schedule,
        }
    }

    pub fn stage(&self) -> ProcessingStage {
        self.schedule.stage_at(self.started.elapsed())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub const fn schedule(&self) -> &ProgressSchedule {
        &self.schedule
    }
}

/// Receives stage changes while an upload is in flight.
pub trait ProgressSink: Send + Sync {
    fn stage_changed(&self, stage: ProcessingStage);
}

/// Sink that drops every update
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn stage_changed(&self, _stage: ProcessingStage) {}
}
