//! Transactional email bodies.
//!
//! Rendering is pure: a template plus an [`EmailPayload`] gives a subject and
//! an HTML body built from one autoescaped tera layout. The outbox stores the rendered result next to the payload.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tera::{Context, Tera};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    BookingConfirmation,
    InterviewerBooking,
    Reminder,
    FeedbackRequest,
    RescheduleNotice,
    CancellationNotice,
    ResumeReviewReceived,
    ResumeReviewCompleted,
}

impl EmailTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailTemplate::BookingConfirmation => "booking_confirmation",
            EmailTemplate::InterviewerBooking => "interviewer_booking",
            EmailTemplate::Reminder => "reminder",
            EmailTemplate::FeedbackRequest => "feedback_request",
            EmailTemplate::RescheduleNotice => "reschedule_notice",
            EmailTemplate::CancellationNotice => "cancellation_notice",
            EmailTemplate::ResumeReviewReceived => "resume_review_received",
            EmailTemplate::ResumeReviewCompleted => "resume_review_completed",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailPayload {
    pub recipient_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterpart_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_slot_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_ons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

const LAYOUT_NAME: &str = "email_layout.html";

const LAYOUT: &str = r#"<!DOCTYPE html><html><body style="font-family:Arial,sans-serif;color:#111">
<p>Hi {{ recipient_name }},</p><p>{{ intro }}</p><table>
{%- for row in rows %}<tr><td style="padding:4px 12px 4px 0;color:#555">{{ row.label }}</td><td style="padding:4px 0"><strong>{{ row.value }}</strong></td></tr>{% endfor -%}
</table>
{%- if action %}<p><a href="{{ action.href }}" style="background:#2563eb;color:#fff;padding:10px 18px;border-radius:6px;text-decoration:none">{{ action.label }}</a></p>{% endif %}
<p style="color:#777;font-size:12px">MockHire</p></body></html>"#;

static ENGINE: OnceLock<std::result::Result<Tera, String>> = OnceLock::new();

/// Template engine with the shared layout; `.html` names are autoescaped.
fn engine() -> Result<&'static Tera> {
    ENGINE
        .get_or_init(|| {
            let mut tera = Tera::default();
            tera.add_raw_template(LAYOUT_NAME, LAYOUT)
                .map_err(|e| e.to_string())?;
            Ok(tera)
        })
        .as_ref()
        .map_err(|e| Error::Internal(format!("email layout failed to compile: {}", e)))
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    label: &'static str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct Action<'a> {
    label: &'static str,
    href: &'a str,
}

fn rows<'a>(pairs: &[(&'static str, Option<&'a str>)]) -> Vec<Row<'a>> {
    pairs
        .iter()
        .filter_map(|&(label, value)| match value {
            Some(v) if !v.trim().is_empty() => Some(Row { label, value: v }),
            _ => None,
        })
        .collect()
}

fn action<'a>(label: &'static str, href: Option<&'a str>) -> Option<Action<'a>> {
    href.filter(|h| !h.trim().is_empty()).map(|href| Action { label, href })
}

fn layout(recipient_name: &str, intro: &str, rows: &[Row<'_>], action: Option<Action<'_>>) -> Result<String> {
    let mut context = Context::new();
    context.insert("recipient_name", recipient_name);
    context.insert("intro", intro);
    context.insert("rows", rows);
    context.insert("action", &action);
    engine()?
        .render(LAYOUT_NAME, &context)
        .map_err(|e| Error::Internal(format!("email render failed: {}", e)))
}

pub fn render(template: EmailTemplate, p: &EmailPayload) -> Result<RenderedEmail> {
    let slot = p.slot_label.as_deref();
    let role = p.target_role.as_deref();
    let counterpart = p.counterpart_name.as_deref();
    let plan = p.plan_type.as_deref();
    let add_ons = (!p.add_ons.is_empty()).then(|| p.add_ons.join(", "));
    let add_ons = add_ons.as_deref();
    let meeting = action("Join meeting", p.meeting_link.as_deref());
    let name = p.recipient_name.as_str();

    let (subject, html) = match template {
        EmailTemplate::BookingConfirmation => (
            format!("Your mock interview is confirmed: {}", slot.unwrap_or("scheduled")),
            layout(
                name,
                "Your payment was received and your mock interview is booked.",
                &rows(&[("When", slot), ("Interviewer", counterpart), ("Role", role), ("Plan", plan), ("Add-ons", add_ons)]),
                meeting,
            )?,
        ),
        EmailTemplate::InterviewerBooking => (
            format!("New mock interview booked: {}", slot.unwrap_or("scheduled")),
            layout(
                name,
                "A candidate has booked a mock interview with you.",
                &rows(&[("When", slot), ("Candidate", counterpart), ("Role", role), ("Plan", plan), ("Add-ons", add_ons)]),
                meeting,
            )?,
        ),
        EmailTemplate::Reminder => (
            format!("Reminder: mock interview {}", slot.unwrap_or("coming up")),
            layout(
                name,
                "This is a reminder about your upcoming mock interview.",
                &rows(&[("When", slot), ("With", counterpart), ("Role", role)]),
                meeting,
            )?,
        ),
        EmailTemplate::FeedbackRequest => (
            "How did your mock interview go?".to_string(),
            layout(
                name,
                "Thanks for attending. We would love to hear your feedback on the session.",
                &rows(&[("Session", slot), ("With", counterpart)]),
                None,
            )?,
        ),
        EmailTemplate::RescheduleNotice => (
            format!("Mock interview moved to {}", slot.unwrap_or("a new time")),
            layout(
                name,
                "Your mock interview has been rescheduled.",
                &rows(&[("Previous time", p.previous_slot_label.as_deref()), ("New time", slot), ("With", counterpart)]),
                meeting,
            )?,
        ),
        EmailTemplate::CancellationNotice => (
            format!("Mock interview cancelled: {}", slot.unwrap_or("session")),
            layout(
                name,
                "Your mock interview has been cancelled.",
                &rows(&[("When", slot), ("With", counterpart), ("Reason", p.reason.as_deref())]),
                None,
            )?,
        ),
        EmailTemplate::ResumeReviewReceived => (
            "We received your resume".to_string(),
            layout(
                name,
                "Your payment was received. A reviewer will look at your resume shortly.",
                &rows(&[("Target role", role)]),
                None,
            )?,
        ),
        EmailTemplate::ResumeReviewCompleted => (
            "Your resume review is ready".to_string(),
            layout(
                name,
                "Your resume review report is ready.",
                &rows(&[("Target role", role), ("Notes", p.notes.as_deref())]),
                action("Download report", p.report_url.as_deref()),
            )?,
        ),
    };
    Ok(RenderedEmail { subject, html })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tera::escape_html;

    fn payload() -> EmailPayload {
        EmailPayload {
            recipient_name: "Priya".into(),
            counterpart_name: Some("Ada Lovelace".into()),
            target_role: Some("Backend Engineer".into()),
            slot_label: Some("Tuesday, 20/10/2026 10:00-11:00".into()),
            meeting_link: Some("https://meet.jit.si/mockhire-abc".into()),
            plan_type: Some("pro".into()),
            add_ons: vec!["Resume deep-dive".into()],
            ..Default::default()
        }
    }

    #[test]
    fn confirmation_carries_booking_details() {
        let email = render(EmailTemplate::BookingConfirmation, &payload()).unwrap();
        assert_eq!(email.subject, "Your mock interview is confirmed: Tuesday, 20/10/2026 10:00-11:00");
        assert!(email.html.contains("Hi Priya"));
        assert!(email.html.contains("Ada Lovelace"));
        assert!(email.html.contains(&escape_html("https://meet.jit.si/mockhire-abc")));
        assert!(email.html.contains("Resume deep-dive"));
    }

    #[test]
    fn missing_fields_are_left_out() {
        let email = render(
            EmailTemplate::CancellationNotice,
            &EmailPayload {
                recipient_name: "Sam".into(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(email.subject, "Mock interview cancelled: session");
        assert!(!email.html.contains("Reason"));
    }

    #[test]
    fn user_text_is_escaped() {
        let mut p = payload();
        p.recipient_name = "<script>alert(1)</script>".into();
        let email = render(EmailTemplate::Reminder, &p).unwrap();
        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;"));
    }

    #[test]
    fn link_targets_cannot_break_out_of_attributes() {
        let mut p = payload();
        p.meeting_link = Some("https://x.test/\" onclick=\"steal()".into());
        let email = render(EmailTemplate::BookingConfirmation, &p).unwrap();
        assert!(!email.html.contains("\" onclick="));
        assert!(email.html.contains("&quot; onclick=&quot;"));
    }

    #[test]
    fn every_template_renders() {
        for template in [
            EmailTemplate::BookingConfirmation,
            EmailTemplate::InterviewerBooking,
            EmailTemplate::Reminder,
            EmailTemplate::FeedbackRequest,
            EmailTemplate::RescheduleNotice,
            EmailTemplate::CancellationNotice,
            EmailTemplate::ResumeReviewReceived,
            EmailTemplate::ResumeReviewCompleted,
        ] {
            let email = render(template, &payload()).unwrap();
            assert!(email.html.starts_with("<!DOCTYPE html>"), "{}", template.as_str());
            assert!(!email.subject.is_empty());
        }
    }

    #[test]
    fn reschedule_shows_both_times() {
        let mut p = payload();
        p.previous_slot_label = Some("Monday, 19/10/2026 09:00-10:00".into());
        let email = render(EmailTemplate::RescheduleNotice, &p).unwrap();
        assert!(email.html.contains(&escape_html("Monday, 19/10/2026 09:00-10:00")));
        assert!(email.html.contains(&escape_html("Tuesday, 20/10/2026 10:00-11:00")));
    }

    #[test]
    fn report_email_links_the_report() {
        let p = EmailPayload {
            recipient_name: "Lee".into(),
            report_url: Some("/uploads/reports/r.pdf".into()),
            ..Default::default()
        };
        let email = render(EmailTemplate::ResumeReviewCompleted, &p).unwrap();
        assert!(email.html.contains(&escape_html("/uploads/reports/r.pdf")));
        assert!(email.html.contains("Download report"));
    }
}
