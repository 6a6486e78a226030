mod access_grant;
mod class_session;
mod delivery;
mod reminder;
mod shared;

pub use access_grant::{resolve_recipients, AccessGrant, GrantScope, Recipient};
pub use class_session::{ClassSession, SessionStatus, SessionType, UnknownVariantError};
pub use delivery::{DeliveryRecord, DeliveryStatus, DeliveryTarget};
pub use reminder::{
    max_invocation_interval_millis, BroadcastTarget, LedgerCategory, ReminderChannel,
    ReminderKind, ReminderWindow, DEFAULT_TOLERANCE_MILLIS,
};
pub use shared::entity::{Entity, InvalidIDError, ID};
