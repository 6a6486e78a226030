use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// A `ClassSession` is one scheduled occurrence of a live class.
///
/// Sessions are created and edited elsewhere, this engine only reads them.
/// The course and lesson titles are denormalized onto the session when it is
/// loaded so that reminder messages can be rendered without extra lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSession {
    pub id: ID,
    /// The live class this session belongs to
    pub live_class_id: ID,
    /// The lesson (recorded video) associated with this session
    pub lesson_id: Option<ID>,
    /// Scheduled start as a timestamp in millis
    pub scheduled_at: i64,
    pub status: SessionStatus,
    pub session_type: SessionType,
    pub course_title: String,
    pub lesson_title: String,
}

impl Entity for ClassSession {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    Live,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Unknown {kind}: `{value}`")]
pub struct UnknownVariantError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for SessionStatus {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "live" => Ok(Self::Live),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(UnknownVariantError {
                kind: "session status",
                value: s.to_string(),
            }),
        }
    }
}

/// Part of day the session runs in. Only used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Morning,
    Afternoon,
    Evening,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Morning => "🌅",
            Self::Afternoon => "☀️",
            Self::Evening => "🌙",
        }
    }
}

impl FromStr for SessionType {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            _ => Err(UnknownVariantError {
                kind: "session type",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_session_types() {
        for t in &[SessionType::Morning, SessionType::Afternoon, SessionType::Evening] {
            assert_eq!(t.as_str().parse::<SessionType>().unwrap(), *t);
        }
        assert!("night".parse::<SessionType>().is_err());
    }

    #[test]
    fn it_parses_session_status() {
        assert_eq!(
            "scheduled".parse::<SessionStatus>().unwrap(),
            SessionStatus::Scheduled
        );
        assert_eq!(
            "unknown".parse::<SessionStatus>(),
            Err(UnknownVariantError {
                kind: "session status",
                value: "unknown".into()
            })
        );
    }
}
