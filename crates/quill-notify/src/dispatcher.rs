//! Event-bus consumer that turns server events into outbound email.

use std::sync::Arc;

use tracing::warn;

use quill_core::{defaults, EventBus, ServerEvent};

use crate::mailer::Mailer;
use crate::templates::{NoteCreatedEmail, WelcomeEmail};

/// Consume the event bus and send notification email until the bus closes.
///
/// Spawned once at boot. Each send runs on its own task so a slow SMTP
/// server never backs up the receive loop. Failed sends are logged and
/// dropped.
pub async fn run_dispatcher(event_bus: Arc<EventBus>, mailer: Mailer) {
    let app_url = std::env::var("APP_URL").unwrap_or_else(|_| defaults::APP_URL.to_string());

    let mut rx = event_bus.subscribe();
    // Keep only the receiver. Holding the bus here would keep its sender
    // alive and the Closed signal could never arrive.
    drop(event_bus);
    loop {
        match rx.recv().await {
            Ok(event) => dispatch(&mailer, &app_url, event),
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "Email dispatcher lagged");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn dispatch(mailer: &Mailer, app_url: &str, event: ServerEvent) {
    match event {
        ServerEvent::UserRegistered {
            email, first_name, ..
        } => {
            let mailer = mailer.clone();
            let message = WelcomeEmail { first_name };
            tokio::spawn(async move {
                if let Err(e) = mailer.send(&email, &message.subject(), message.body()).await {
                    warn!(error = %e, to = %email, "Failed to send welcome email");
                }
            });
        }
        ServerEvent::NoteCreated {
            note_id,
            owner_email,
            title,
            ..
        } => {
            let mailer = mailer.clone();
            let message = NoteCreatedEmail {
                title,
                note_id,
                app_url: app_url.to_string(),
            };
            tokio::spawn(async move {
                if let Err(e) = mailer
                    .send(&owner_email, &message.subject(), message.body())
                    .await
                {
                    warn!(error = %e, to = %owner_email, "Failed to send note-created email");
                }
            });
        }
        // Updates, deletes and shares are not mailed.
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_dispatcher_exits_when_bus_closes() {
        let bus = Arc::new(EventBus::new(32));
        let handle = tokio::spawn(run_dispatcher(bus.clone(), Mailer::disabled()));

        bus.emit(ServerEvent::UserRegistered {
            user_id: Uuid::nil(),
            email: "new@example.com".to_string(),
            first_name: "New".to_string(),
        });

        // Let the dispatcher drain, then close the bus by dropping the sender.
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(bus);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("dispatcher should exit after bus close")
            .unwrap();
    }

    #[tokio::test]
    async fn test_dispatcher_ignores_unmailed_events() {
        let bus = Arc::new(EventBus::new(32));
        let handle = tokio::spawn(run_dispatcher(bus.clone(), Mailer::disabled()));

        bus.emit(ServerEvent::NoteUpdated {
            note_id: Uuid::nil(),
            owner_id: Uuid::nil(),
        });
        bus.emit(ServerEvent::NoteDeleted {
            note_id: Uuid::nil(),
            owner_id: Uuid::nil(),
        });
        bus.emit(ServerEvent::NoteShared {
            note_id: Uuid::nil(),
            shared_with: "peer@example.com".to_string(),
            permission: "view".to_string(),
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(bus);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("dispatcher should exit after bus close")
            .unwrap();
    }

    #[tokio::test]
    async fn test_dispatcher_survives_bad_recipient() {
        let bus = Arc::new(EventBus::new(32));
        let handle = tokio::spawn(run_dispatcher(bus.clone(), Mailer::disabled()));

        // Composes to an invalid mailbox; the send task logs and drops.
        bus.emit(ServerEvent::NoteCreated {
            note_id: Uuid::nil(),
            owner_id: Uuid::nil(),
            owner_email: "not an address".to_string(),
            title: "Broken".to_string(),
        });
        // A later good event still flows.
        bus.emit(ServerEvent::UserRegistered {
            user_id: Uuid::nil(),
            email: "fine@example.com".to_string(),
            first_name: "Fine".to_string(),
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(bus);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("dispatcher should exit after bus close")
            .unwrap();
    }
}
