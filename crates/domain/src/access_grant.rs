use crate::shared::entity::ID;
use std::collections::HashMap;

/// An `AccessGrant` entitles a user either to a single `ClassSession` or to
/// every session of a live class.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessGrant {
    pub user_id: ID,
    pub scope: GrantScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantScope {
    /// Access to one session, identified by the session id
    Session(ID),
    /// Access to the whole live class, identified by the live class id
    FullCourse(ID),
}

impl GrantScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session(_) => "session",
            Self::FullCourse(_) => "full_course",
        }
    }
}

/// A user entitled to receive direct reminders for a session
#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    pub user_id: ID,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Recipient {
    /// The email to deliver to, if the recipient has a usable one
    pub fn deliverable_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// Unions the recipients of session scoped and course scoped grants.
///
/// Users are deduplicated by id. When a user appears in both lists the entry
/// seen last wins, while the position of the first occurrence is kept.
pub fn resolve_recipients(
    session_grantees: Vec<Recipient>,
    course_grantees: Vec<Recipient>,
) -> Vec<Recipient> {
    let mut positions: HashMap<ID, usize> = HashMap::new();
    let mut recipients: Vec<Recipient> = Vec::new();

    for recipient in session_grantees.into_iter().chain(course_grantees) {
        match positions.get(&recipient.user_id) {
            Some(&pos) => recipients[pos] = recipient,
            None => {
                positions.insert(recipient.user_id, recipients.len());
                recipients.push(recipient);
            }
        }
    }

    recipients
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(user_id: ID, email: &str) -> Recipient {
        Recipient {
            user_id,
            email: Some(email.into()),
            display_name: None,
        }
    }

    #[test]
    fn it_deduplicates_users_with_both_grants() {
        let both = ID::new();
        let only_session = ID::new();
        let only_course = ID::new();

        let recipients = resolve_recipients(
            vec![recipient(both, "old@x.io"), recipient(only_session, "s@x.io")],
            vec![recipient(only_course, "c@x.io"), recipient(both, "new@x.io")],
        );

        assert_eq!(recipients.len(), 3);
        assert_eq!(recipients[0].user_id, both);
        assert_eq!(recipients[0].email.as_deref(), Some("new@x.io"));
        assert_eq!(recipients[1].user_id, only_session);
        assert_eq!(recipients[2].user_id, only_course);
    }

    #[test]
    fn it_handles_no_grants() {
        assert!(resolve_recipients(Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn blank_emails_are_not_deliverable() {
        let mut r = recipient(ID::new(), "  ");
        assert_eq!(r.deliverable_email(), None);
        r.email = None;
        assert_eq!(r.deliverable_email(), None);
        r.email = Some("a@b.io".into());
        assert_eq!(r.deliverable_email(), Some("a@b.io"));
    }
}
