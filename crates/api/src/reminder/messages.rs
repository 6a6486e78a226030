use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use class_reminders_domain::{ClassSession, Recipient, ReminderKind};
use class_reminders_infra::OutboundEmail;

/// Links and time formatting shared by every rendered message
pub struct MessageContext<'a> {
    pub site_url: &'a str,
    pub timezone: Tz,
}

impl<'a> MessageContext<'a> {
    fn local_time(&self, session: &ClassSession) -> String {
        match Utc.timestamp_millis_opt(session.scheduled_at).single() {
            Some(start) => start
                .with_timezone(&self.timezone)
                .format("%A, %B %-d at %H:%M %Z")
                .to_string(),
            None => String::from("unknown time"),
        }
    }

    fn session_link(&self, session: &ClassSession) -> String {
        format!("{}/sessions/{}", self.site_url, session.id)
    }

    fn live_class_link(&self, session: &ClassSession) -> String {
        format!(
            "{}/live-classes/{}?session={}",
            self.site_url, session.live_class_id, session.id
        )
    }
}

fn broadcast_header(kind: ReminderKind) -> String {
    match kind {
        ReminderKind::Start => "🔴 <b>Class starting now!</b>".into(),
        _ => format!("⏰ <b>Class starts in {}</b>", kind.lead_time()),
    }
}

/// Renders the bot message for a broadcast reminder, using Telegram's HTML
/// markup
pub fn render_broadcast(
    ctx: &MessageContext,
    session: &ClassSession,
    kind: ReminderKind,
) -> String {
    let (link, call_to_action) = match kind {
        ReminderKind::Start => (ctx.live_class_link(session), "Join the class"),
        _ => (ctx.session_link(session), "View session"),
    };

    format!(
        "{}\n\n📚 <b>{}</b>\n📖 {}\n{} {}\n\n<a href=\"{}\">{}</a>",
        broadcast_header(kind),
        escape_html(&session.course_title),
        escape_html(&session.lesson_title),
        session.session_type.glyph(),
        ctx.local_time(session),
        link,
        call_to_action
    )
}

/// Renders the personalized email for a direct reminder
pub fn render_email(
    ctx: &MessageContext,
    session: &ClassSession,
    kind: ReminderKind,
    recipient: &Recipient,
    to: &str,
) -> OutboundEmail {
    let name = recipient
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("there");
    let course = escape_html(&session.course_title);

    let html = format!(
        r#"<div style="font-family: sans-serif; max-width: 560px; margin: 0 auto;">
  <p>Hi {name},</p>
  <p>This is a reminder that your live class <strong>{course}</strong> starts in {lead_time}.</p>
  <ul>
    <li><strong>Lesson:</strong> {lesson}</li>
    <li><strong>When:</strong> {glyph} {time}</li>
  </ul>
  <p><a href="{link}" style="display: inline-block; padding: 12px 20px; background: #2563eb; color: #ffffff; text-decoration: none; border-radius: 6px;">View session</a></p>
  <p>See you in class!</p>
</div>"#,
        name = escape_html(name),
        course = course,
        lead_time = kind.lead_time(),
        lesson = escape_html(&session.lesson_title),
        glyph = session.session_type.glyph(),
        time = ctx.local_time(session),
        link = ctx.session_link(session),
    );

    OutboundEmail {
        to: to.to_string(),
        subject: format!(
            "Reminder: {} starts in {}",
            session.course_title,
            kind.lead_time()
        ),
        html,
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use class_reminders_domain::{SessionStatus, SessionType, ID};

    fn session() -> ClassSession {
        ClassSession {
            id: ID::new(),
            live_class_id: ID::new(),
            lesson_id: None,
            // 2021-02-21T18:00:00Z
            scheduled_at: 1_613_930_400_000,
            status: SessionStatus::Scheduled,
            session_type: SessionType::Evening,
            course_title: "Rust <Basics> & more".into(),
            lesson_title: "Ownership".into(),
        }
    }

    fn ctx() -> MessageContext<'static> {
        MessageContext {
            site_url: "https://academy.test",
            timezone: Tz::UTC,
        }
    }

    #[test]
    fn it_escapes_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn start_message_links_to_the_live_class() {
        let session = session();
        let text = render_broadcast(&ctx(), &session, ReminderKind::Start);
        assert!(text.starts_with("🔴 <b>Class starting now!</b>"));
        assert!(text.contains("<b>Rust &lt;Basics&gt; &amp; more</b>"));
        assert!(text.contains("🌙 Sunday, February 21 at 18:00 UTC"));
        assert!(text.contains(&format!(
            "https://academy.test/live-classes/{}?session={}",
            session.live_class_id, session.id
        )));
    }

    #[test]
    fn countdown_message_links_to_the_session() {
        let session = session();
        let text = render_broadcast(&ctx(), &session, ReminderKind::ThirtyMinutesBefore);
        assert!(text.starts_with("⏰ <b>Class starts in 30 minutes</b>"));
        assert!(text.contains(&format!("https://academy.test/sessions/{}", session.id)));
    }

    #[test]
    fn it_formats_time_in_the_display_timezone() {
        let ctx = MessageContext {
            site_url: "https://academy.test",
            timezone: chrono_tz::Asia::Kolkata,
        };
        let text = render_broadcast(&ctx, &session(), ReminderKind::OneHourBefore);
        assert!(text.contains("Sunday, February 21 at 23:30 IST"));
    }

    #[test]
    fn email_greets_recipient_by_name() {
        let session = session();
        let recipient = Recipient {
            user_id: ID::new(),
            email: Some("alice@academy.test".into()),
            display_name: Some("Alice".into()),
        };
        let email = render_email(
            &ctx(),
            &session,
            ReminderKind::TwoHoursBefore,
            &recipient,
            "alice@academy.test",
        );
        assert_eq!(email.to, "alice@academy.test");
        assert_eq!(email.subject, "Reminder: Rust <Basics> & more starts in 2 hours");
        assert!(email.html.contains("Hi Alice,"));
        assert!(email
            .html
            .contains(&format!("https://academy.test/sessions/{}", session.id)));

        let anonymous = Recipient {
            display_name: None,
            ..recipient
        };
        let email = render_email(
            &ctx(),
            &session,
            ReminderKind::DayBefore,
            &anonymous,
            "alice@academy.test",
        );
        assert_eq!(email.subject, "Reminder: Rust <Basics> & more starts in 24 hours");
        assert!(email.html.contains("Hi there,"));
    }
}
