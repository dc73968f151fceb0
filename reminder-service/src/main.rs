use aws_lambda_events::event::cloudwatch_events::CloudWatchEvent;
use chrono::{DateTime, NaiveDate, Utc};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use log::{debug, error, info, warn};
use rsvp_shared::config::Settings;
use rsvp_shared::dispatch::{InvitationDispatcher, MessageKind};
use rsvp_shared::mail::mailer_from_settings;
use rsvp_shared::models::{Event, ResponseStatus};
use rsvp_shared::store::dynamo::DynamoEventStore;
use rsvp_shared::store::{EventStore, StoreError};
use rsvp_shared::token::TokenCodec;
use std::sync::Arc;

/// Reminder intervals in hours
const REMINDER_1_HOURS: i64 = 24;
const REMINDER_2_HOURS: i64 = 72;
const REMINDER_3_HOURS: i64 = 168; // 1 week

/// Width of each window; the service is scheduled every 6 hours.
const REMINDER_WINDOW_HOURS: i64 = 6;

/// Grace period before first reminder (give guests time to see the invitation)
const GRACE_PERIOD_HOURS: i64 = 1;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting Reminder Service Lambda");

    let settings = Settings::from_env()?;
    let store = Arc::new(DynamoEventStore::with_table(settings.events_table.clone()).await);
    let codec = Arc::new(TokenCodec::from_settings(&settings)?);
    let dispatcher = Arc::new(InvitationDispatcher::new(
        codec,
        mailer_from_settings(&settings),
        &settings.public_base_url,
    ));

    lambda_runtime::run(service_fn(|event| {
        handler(event, store.clone(), dispatcher.clone())
    }))
    .await?;

    Ok(())
}

async fn handler(
    _event: LambdaEvent<CloudWatchEvent>,
    store: Arc<DynamoEventStore>,
    dispatcher: Arc<InvitationDispatcher>,
) -> Result<(), Error> {
    info!("Reminder service triggered");

    let summary = send_due_reminders(store.as_ref(), &dispatcher, Utc::now())
        .await
        .map_err(|e| {
            error!("Failed to scan events: {}", e);
            Error::from(format!("Failed to scan events: {}", e))
        })?;

    info!(
        "Reminder service completed. Checked {} events, sent {} reminders, {} failed",
        summary.events_checked, summary.reminders_sent, summary.failures
    );

    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RunSummary {
    events_checked: usize,
    reminders_sent: usize,
    failures: usize,
}

/// Re-sends response links to guests who were invited but have not answered.
async fn send_due_reminders<S>(
    store: &S,
    dispatcher: &InvitationDispatcher,
    now: DateTime<Utc>,
) -> Result<RunSummary, StoreError>
where
    S: EventStore + ?Sized,
{
    let events = store.list_events().await?;
    let mut summary = RunSummary::default();

    for event in &events {
        if event_has_passed(event, now) {
            debug!("Skipping past event {}", event.id);
            continue;
        }
        summary.events_checked += 1;
        process_event(store, dispatcher, event, now, &mut summary).await;
    }

    Ok(summary)
}

/// Events on an unparseable date are still processed.
fn event_has_passed(event: &Event, now: DateTime<Utc>) -> bool {
    match NaiveDate::parse_from_str(&event.date, "%Y-%m-%d") {
        Ok(date) => date < now.date_naive(),
        Err(_) => {
            warn!("Event {} has an unreadable date '{}'", event.id, event.date);
            false
        }
    }
}

async fn process_event<S>(
    store: &S,
    dispatcher: &InvitationDispatcher,
    event: &Event,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) where
    S: EventStore + ?Sized,
{
    for (index, guest) in event.guests.iter().enumerate() {
        if guest.status != ResponseStatus::Pending {
            continue;
        }

        // Guests who were never invited get no reminder
        let Some(invited_at) = guest
            .invited_at
            .as_ref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
        else {
            continue;
        };

        let hours_since_invite = (now - invited_at).num_hours();
        let reminder_number = determine_reminder_number(hours_since_invite);

        if reminder_number == 0 || guest.reminders_sent >= reminder_number {
            continue;
        }

        info!(
            "Sending reminder {} to {} for event {} (hours since invitation: {})",
            reminder_number, guest.email, event.id, hours_since_invite
        );

        if let Err(e) = dispatcher
            .send(event, guest, MessageKind::Reminder(reminder_number))
            .await
        {
            error!("Failed to send reminder to {}: {}", guest.email, e);
            summary.failures += 1;
            continue;
        }
        summary.reminders_sent += 1;

        let mut updated = guest.clone();
        updated.reminders_sent = reminder_number;
        if let Err(e) = store
            .update_guest(&event.id, index, &guest.email, updated)
            .await
        {
            // The guest answered or was removed in the meantime
            warn!("Could not record reminder for {}: {}", guest.email, e);
        }
    }
}

/// Determines which reminder number to send based on hours since the invitation.
/// Returns 0 if no reminder should be sent (either too early or already past all reminder windows).
///
/// Logic:
/// - Reminder 1: 24 to 30 hours after the invitation
/// - Reminder 2: 72 to 78 hours
/// - Reminder 3: 168 to 174 hours (1 week)
fn determine_reminder_number(hours_since_invite: i64) -> u32 {
    if hours_since_invite < GRACE_PERIOD_HOURS {
        return 0;
    }

    [REMINDER_1_HOURS, REMINDER_2_HOURS, REMINDER_3_HOURS]
        .iter()
        .position(|start| {
            hours_since_invite >= *start && hours_since_invite < start + REMINDER_WINDOW_HOURS
        })
        .map(|i| i as u32 + 1)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rsvp_shared::models::Guest;
    use rsvp_shared::test_utils::mock_event_store::{sample_event, MockEventStore};
    use rsvp_shared::test_utils::mock_mailer::MockMailer;

    #[test]
    fn test_determine_reminder_number() {
        // Too early
        assert_eq!(determine_reminder_number(0), 0);
        assert_eq!(determine_reminder_number(12), 0);
        assert_eq!(determine_reminder_number(23), 0);

        // Reminder 1 window (24-30 hours)
        assert_eq!(determine_reminder_number(24), 1);
        assert_eq!(determine_reminder_number(29), 1);

        // Between reminder 1 and 2
        assert_eq!(determine_reminder_number(30), 0);
        assert_eq!(determine_reminder_number(71), 0);

        // Reminder 2 window (72-78 hours)
        assert_eq!(determine_reminder_number(72), 2);
        assert_eq!(determine_reminder_number(77), 2);

        // Reminder 3 window (168-174 hours)
        assert_eq!(determine_reminder_number(167), 0);
        assert_eq!(determine_reminder_number(168), 3);
        assert_eq!(determine_reminder_number(173), 3);

        // After all reminders
        assert_eq!(determine_reminder_number(174), 0);
        assert_eq!(determine_reminder_number(-5), 0);
    }

    fn invited(name: &str, email: &str, invited_at: DateTime<Utc>) -> Guest {
        let mut guest = Guest::new(name, email, None);
        guest.invited_at = Some(invited_at.to_rfc3339());
        guest
    }

    fn dispatcher(mailer: Arc<MockMailer>) -> InvitationDispatcher {
        let codec = Arc::new(TokenCodec::new("reminder-test-key", Duration::days(7)).unwrap());
        InvitationDispatcher::new(codec, mailer, "http://rsvp.test")
    }

    #[tokio::test]
    async fn test_reminds_pending_guests_once_per_window() {
        let now = Utc::now();
        let store = MockEventStore::new();
        let mut answered = invited("Carla", "carla@example.com", now - Duration::hours(25));
        answered.status = ResponseStatus::Confirmed;
        let event = store
            .create_event(sample_event(vec![
                invited("Ana", "ana@example.com", now - Duration::hours(25)),
                invited("Bruno", "bruno@example.com", now - Duration::hours(5)),
                answered,
                Guest::new("Dani", "dani@example.com", None),
            ]))
            .await
            .unwrap();
        let mailer = Arc::new(MockMailer::new());
        let dispatcher = dispatcher(mailer.clone());

        let summary = send_due_reminders(&store, &dispatcher, now).await.unwrap();
        assert_eq!(summary.events_checked, 1);
        assert_eq!(summary.reminders_sent, 1);

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@example.com");
        assert!(sent[0].subject.starts_with("Reminder"));
        assert!(sent[0].html.contains("/respond/confirm/"));

        let stored = store.get_event(&event.id).await.unwrap();
        assert_eq!(stored.guests[0].reminders_sent, 1);
        assert_eq!(stored.guests[0].invited_at, event.guests[0].invited_at);

        // The next run inside the same window sends nothing
        let summary = send_due_reminders(&store, &dispatcher, now + Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(summary.reminders_sent, 0);
        assert_eq!(mailer.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_skips_past_events_and_counts_failures() {
        let now = Utc::now();
        let store = MockEventStore::new();

        let mut past = sample_event(vec![invited("Ana", "ana@example.com", now - Duration::hours(25))]);
        past.date = "2000-01-01".to_string();
        store.create_event(past).await.unwrap();
        store
            .create_event(sample_event(vec![invited(
                "Bruno",
                "bruno@example.com",
                now - Duration::hours(73),
            )]))
            .await
            .unwrap();

        let mailer = Arc::new(MockMailer::new());
        mailer.fail_for("bruno@example.com").await;
        let dispatcher = dispatcher(mailer.clone());

        let summary = send_due_reminders(&store, &dispatcher, now).await.unwrap();
        assert_eq!(
            summary,
            RunSummary {
                events_checked: 1,
                reminders_sent: 0,
                failures: 1,
            }
        );
        assert!(mailer.sent().await.is_empty());
    }
}
