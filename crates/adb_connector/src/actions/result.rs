//! Outcome of a device action

use serde::Serialize;

/// How much an action's success flag can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Backed by a fresh state read from the device
    Verified,
    /// Inferred from the shape of adb's output (empty output, intent acknowledgment)
    Heuristic,
}

/// Result of an action execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub confidence: Confidence,
    pub message: Option<String>,
}

impl ActionResult {
    /// Success read from adb's output only
    pub fn heuristic(success: bool) -> Self {
        Self {
            success,
            confidence: Confidence::Heuristic,
            message: None,
        }
    }

    /// Success or failure confirmed against device state
    pub fn verified(success: bool) -> Self {
        Self {
            success,
            confidence: Confidence::Verified,
            message: None,
        }
    }

    /// Action not attempted because a precondition did not hold
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            confidence: Confidence::Verified,
            message: Some(message.into()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_verified(&self) -> bool {
        self.confidence == Confidence::Verified
    }
}

/// Per-step results of a gesture sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceReport {
    pub steps: Vec<ActionResult>,
}

impl SequenceReport {
    pub fn succeeded(&self) -> usize {
        self.steps.iter().filter(|s| s.success).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_result_constructors() {
        let result = ActionResult::heuristic(true);
        assert!(result.success);
        assert!(!result.is_verified());

        let result = ActionResult::rejected("device need to be awake");
        assert!(!result.success);
        assert!(result.is_verified());
        assert_eq!(result.message.as_deref(), Some("device need to be awake"));
    }

    #[test]
    fn test_sequence_report_counts() {
        let report = SequenceReport {
            steps: vec![
                ActionResult::heuristic(true),
                ActionResult::heuristic(false),
                ActionResult::heuristic(true),
            ],
        };
        assert_eq!(report.succeeded(), 2);
        assert!(!report.all_succeeded());
    }
}
