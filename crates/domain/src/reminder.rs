use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::class_session::UnknownVariantError;

const MINUTE_MILLIS: i64 = 1000 * 60;
const HOUR_MILLIS: i64 = MINUTE_MILLIS * 60;

/// Default symmetric tolerance around every `ReminderKind` offset
pub const DEFAULT_TOLERANCE_MILLIS: i64 = 5 * MINUTE_MILLIS;

/// A `ReminderKind` is a point in time, measured backwards from the start of a
/// `ClassSession`, at which participants should be notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    DayBefore,
    TwoHoursBefore,
    OneHourBefore,
    ThirtyMinutesBefore,
    TwoMinutesBefore,
    Start,
}

/// The bucket a `ReminderKind` is recorded under in the delivery ledger.
/// Several kinds may share one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerCategory {
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "countdown_1hr")]
    Countdown1Hr,
    #[serde(rename = "countdown_30min")]
    Countdown30Min,
    #[serde(rename = "countdown_2min")]
    Countdown2Min,
    #[serde(rename = "class_start")]
    ClassStart,
}

/// Where the broadcast variant of a reminder is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastTarget {
    /// Every configured broadcast destination
    AllDestinations,
    /// Only the configured default destination
    DefaultDestination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderChannel {
    /// Personalized message to each entitled recipient
    Direct,
    Broadcast(BroadcastTarget),
}

impl ReminderKind {
    pub const ALL: [ReminderKind; 6] = [
        ReminderKind::DayBefore,
        ReminderKind::TwoHoursBefore,
        ReminderKind::OneHourBefore,
        ReminderKind::ThirtyMinutesBefore,
        ReminderKind::TwoMinutesBefore,
        ReminderKind::Start,
    ];

    /// Millis before the session start at which this reminder is due
    pub fn offset_millis(&self) -> i64 {
        match self {
            Self::DayBefore => 24 * HOUR_MILLIS,
            Self::TwoHoursBefore => 2 * HOUR_MILLIS,
            Self::OneHourBefore => HOUR_MILLIS,
            Self::ThirtyMinutesBefore => 30 * MINUTE_MILLIS,
            Self::TwoMinutesBefore => 2 * MINUTE_MILLIS,
            Self::Start => 0,
        }
    }

    /// Note that `DayBefore` and `TwoHoursBefore` share the `Email` category,
    /// so the ledger cannot tell them apart.
    pub fn ledger_category(&self) -> LedgerCategory {
        match self {
            Self::DayBefore | Self::TwoHoursBefore => LedgerCategory::Email,
            Self::OneHourBefore => LedgerCategory::Countdown1Hr,
            Self::ThirtyMinutesBefore => LedgerCategory::Countdown30Min,
            Self::TwoMinutesBefore => LedgerCategory::Countdown2Min,
            Self::Start => LedgerCategory::ClassStart,
        }
    }

    pub fn channel(&self) -> ReminderChannel {
        match self {
            Self::DayBefore | Self::TwoHoursBefore => ReminderChannel::Direct,
            Self::Start => ReminderChannel::Broadcast(BroadcastTarget::AllDestinations),
            Self::OneHourBefore | Self::ThirtyMinutesBefore | Self::TwoMinutesBefore => {
                ReminderChannel::Broadcast(BroadcastTarget::DefaultDestination)
            }
        }
    }

    /// Human readable lead time, e.g. "2 hours"
    pub fn lead_time(&self) -> &'static str {
        match self {
            Self::DayBefore => "24 hours",
            Self::TwoHoursBefore => "2 hours",
            Self::OneHourBefore => "1 hour",
            Self::ThirtyMinutesBefore => "30 minutes",
            Self::TwoMinutesBefore => "2 minutes",
            Self::Start => "now",
        }
    }

    pub fn window(&self, tolerance_millis: i64) -> ReminderWindow {
        ReminderWindow {
            offset_millis: self.offset_millis(),
            tolerance_millis,
        }
    }

    /// Whether this reminder is due at `now` for a session starting at `session_start`
    pub fn fires(&self, now: i64, session_start: i64, tolerance_millis: i64) -> bool {
        self.window(tolerance_millis).contains(session_start - now)
    }
}

/// Symmetric time range around a reminder offset in which a periodic check is
/// still considered on time. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    pub offset_millis: i64,
    pub tolerance_millis: i64,
}

impl ReminderWindow {
    pub fn earliest(&self) -> i64 {
        self.offset_millis - self.tolerance_millis
    }

    pub fn latest(&self) -> i64 {
        self.offset_millis + self.tolerance_millis
    }

    pub fn contains(&self, millis_until_session: i64) -> bool {
        millis_until_session >= self.earliest() && millis_until_session <= self.latest()
    }
}

/// The longest interval between two dispatch runs that still guarantees no
/// reminder window is skipped.
pub fn max_invocation_interval_millis(tolerance_millis: i64) -> i64 {
    2 * tolerance_millis
}

impl LedgerCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Countdown1Hr => "countdown_1hr",
            Self::Countdown30Min => "countdown_30min",
            Self::Countdown2Min => "countdown_2min",
            Self::ClassStart => "class_start",
        }
    }
}

impl FromStr for LedgerCategory {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "countdown_1hr" => Ok(Self::Countdown1Hr),
            "countdown_30min" => Ok(Self::Countdown30Min),
            "countdown_2min" => Ok(Self::Countdown2Min),
            "class_start" => Ok(Self::ClassStart),
            _ => Err(UnknownVariantError {
                kind: "ledger category",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: i64 = DEFAULT_TOLERANCE_MILLIS;

    fn firing_kinds(millis_until_session: i64) -> Vec<ReminderKind> {
        let now = 1_613_862_000_000;
        ReminderKind::ALL
            .iter()
            .copied()
            .filter(|k| k.fires(now, now + millis_until_session, T))
            .collect()
    }

    #[test]
    fn window_includes_both_boundaries() {
        for kind in ReminderKind::ALL.iter() {
            let window = kind.window(T);
            assert!(window.contains(kind.offset_millis() - T));
            assert!(window.contains(kind.offset_millis() + T));
            assert!(!window.contains(kind.offset_millis() - T - 1));
            assert!(!window.contains(kind.offset_millis() + T + 1));
        }
    }

    #[test]
    fn one_hour_before_fires_alone_at_sixty_minutes() {
        assert_eq!(firing_kinds(HOUR_MILLIS), vec![ReminderKind::OneHourBefore]);
    }

    #[test]
    fn start_fires_slightly_after_start() {
        assert_eq!(firing_kinds(-4 * MINUTE_MILLIS), vec![ReminderKind::Start]);
        assert!(firing_kinds(-6 * MINUTE_MILLIS).is_empty());
    }

    #[test]
    fn two_minutes_and_start_windows_overlap() {
        assert_eq!(
            firing_kinds(MINUTE_MILLIS),
            vec![ReminderKind::TwoMinutesBefore, ReminderKind::Start]
        );
    }

    #[test]
    fn nothing_fires_between_windows() {
        assert!(firing_kinds(5 * HOUR_MILLIS).is_empty());
        assert!(firing_kinds(45 * MINUTE_MILLIS).is_empty());
    }

    #[test]
    fn email_kinds_collapse_into_one_category() {
        assert_eq!(
            ReminderKind::DayBefore.ledger_category(),
            ReminderKind::TwoHoursBefore.ledger_category()
        );
        assert_eq!(ReminderKind::DayBefore.channel(), ReminderChannel::Direct);
        assert_eq!(
            ReminderKind::Start.channel(),
            ReminderChannel::Broadcast(BroadcastTarget::AllDestinations)
        );
        assert_eq!(
            ReminderKind::ThirtyMinutesBefore.channel(),
            ReminderChannel::Broadcast(BroadcastTarget::DefaultDestination)
        );
    }

    #[test]
    fn ledger_categories_roundtrip_through_strings() {
        for kind in ReminderKind::ALL.iter() {
            let category = kind.ledger_category();
            assert_eq!(category.as_str().parse::<LedgerCategory>(), Ok(category));
        }
    }

    #[test]
    fn max_interval_is_twice_the_tolerance() {
        assert_eq!(max_invocation_interval_millis(T), 10 * MINUTE_MILLIS);
    }
}
