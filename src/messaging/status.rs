// Status messages - short feedback lines for the controller UI

use std::time::{SystemTime, UNIX_EPOCH};

/// Severity of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Which part of the application produced the message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Clock,
    Midi,
    Grid,
    Settings,
}

/// Status message with timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub category: StatusCategory,
    pub message: String,
    pub timestamp: u64, // Unix timestamp in milliseconds
}

impl StatusMessage {
    /// Creates a new status message stamped with the current time
    pub fn new(level: StatusLevel, category: StatusCategory, message: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            level,
            category,
            message: message.into(),
            timestamp,
        }
    }

    pub fn info(category: StatusCategory, message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Info, category, message)
    }

    pub fn warning(category: StatusCategory, message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Warning, category, message)
    }

    pub fn error(category: StatusCategory, message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Error, category, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_creation() {
        let status = StatusMessage::info(StatusCategory::Clock, "New BPM set.");

        assert_eq!(status.level, StatusLevel::Info);
        assert_eq!(status.category, StatusCategory::Clock);
        assert_eq!(status.message, "New BPM set.");
        assert!(status.timestamp > 0);
    }

    #[test]
    fn test_status_helpers() {
        let warning = StatusMessage::warning(StatusCategory::Midi, "Device gone");
        let error = StatusMessage::error(StatusCategory::Settings, "Unreadable");

        assert_eq!(warning.level, StatusLevel::Warning);
        assert_eq!(error.level, StatusLevel::Error);
    }
}
