use serde::{Deserialize, Serialize};

/// Progress state tracked for each member task.
///
/// Stored in the sheet as its numeric value so the conditional formatting
/// rules can match on cell contents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Status {
    NotStarted,
    InProgress,
    Complete,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::NotStarted, Status::InProgress, Status::Complete];

    pub fn value(self) -> u8 {
        match self {
            Status::NotStarted => 0,
            Status::InProgress => 1,
            Status::Complete => 2,
        }
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Status::NotStarted),
            1 => Some(Status::InProgress),
            2 => Some(Status::Complete),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_values() {
        assert_eq!(Status::NotStarted.value(), 0);
        assert_eq!(Status::InProgress.value(), 1);
        assert_eq!(Status::Complete.value(), 2);
    }

    #[test]
    fn test_status_from_value_roundtrip() {
        for status in Status::ALL {
            assert_eq!(Status::from_value(status.value()), Some(status));
        }
        assert_eq!(Status::from_value(3), None);
    }
}
