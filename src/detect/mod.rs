//! Sources for the "currently active application" label consumed by the
//! auto-tracking scheduler. Real window detection is out of scope,
//! [SimulatedDetector] stands in for it.

use anyhow::Result;

/// Contract for resolving what the user is working on right now. The
/// scheduler only ever talks to this trait, so tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
pub trait ActivityDetector: Send + 'static {
    /// Raw label of the active window or document, before normalization.
    fn detect_active_label(&mut self) -> Result<String>;
}

/// Rotates through a fixed set of realistic raw titles instead of querying
/// the OS for the focused window.
pub struct SimulatedDetector {
    samples: Vec<String>,
    position: usize,
}

const SAMPLE_TITLES: &[&str] = &[
    "Quarterly Report.docx - Word",
    "Budget 2026.xlsx - Excel",
    "Team Sync Notes - Google Docs",
    "Roadmap.pptx - PowerPoint",
    "Invoice March.pdf - Adobe Acrobat",
    "Inbox",
];

impl SimulatedDetector {
    pub fn new() -> Self {
        Self {
            samples: SAMPLE_TITLES.iter().map(|v| v.to_string()).collect(),
            position: 0,
        }
    }
}

impl Default for SimulatedDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityDetector for SimulatedDetector {
    fn detect_active_label(&mut self) -> Result<String> {
        let label = self.samples[self.position % self.samples.len()].clone();
        self.position += 1;
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::{ActivityDetector, SimulatedDetector};

    #[test]
    fn simulated_detector_cycles_through_samples() {
        let mut detector = SimulatedDetector::new();
        let first = detector.detect_active_label().unwrap();
        let second = detector.detect_active_label().unwrap();
        assert_ne!(first, second);

        for _ in 0..super::SAMPLE_TITLES.len() - 2 {
            detector.detect_active_label().unwrap();
        }
        assert_eq!(detector.detect_active_label().unwrap(), first);
    }
}
