//! Session lifecycle notifications.
//!
//! Clients that need to react to a sign-out elsewhere (for example to reset
//! their navigation) subscribe here instead of polling. A subscription only
//! sees its own account's events and unsubscribes when dropped.

use crate::domain::models::UserRole;
use futures::Stream;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SignedIn { account_id: Uuid, role: UserRole },
    SignedOut { account_id: Uuid },
    PasswordChanged { account_id: Uuid },
}

impl SessionEvent {
    pub fn account_id(&self) -> Uuid {
        match self {
            SessionEvent::SignedIn { account_id, .. }
            | SessionEvent::SignedOut { account_id }
            | SessionEvent::PasswordChanged { account_id } => *account_id,
        }
    }

    /// Events after which the client no longer holds a usable session.
    pub fn ends_session(&self) -> bool {
        !matches!(self, SessionEvent::SignedIn { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::SignedIn { .. } => "signed_in",
            SessionEvent::SignedOut { .. } => "signed_out",
            SessionEvent::PasswordChanged { .. } => "password_changed",
        }
    }
}

#[derive(Clone)]
pub struct SessionHub {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: SessionEvent) {
        // No subscribers is the common case.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self, account_id: Uuid) -> SessionSubscription {
        SessionSubscription {
            account_id,
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new(64)
    }
}

pub struct SessionSubscription {
    account_id: Uuid,
    rx: broadcast::Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// Next event for this account; `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.account_id() == self.account_id => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "Session subscription for {} lagged, skipped {} events",
                        self.account_id,
                        skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Yields events up to and including the first one that ends the session.
    pub fn into_stream(self) -> impl Stream<Item = SessionEvent> {
        futures::stream::unfold(Some(self), |state| async move {
            let mut sub = state?;
            let event = sub.next().await?;
            let rest = if event.ends_session() { None } else { Some(sub) };
            Some((event, rest))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_subscription_filters_by_account() {
        let hub = SessionHub::default();
        let me = Uuid::new_v4();
        let mut sub = hub.subscribe(me);

        hub.publish(SessionEvent::SignedOut {
            account_id: Uuid::new_v4(),
        });
        hub.publish(SessionEvent::SignedOut { account_id: me });

        assert_eq!(sub.next().await, Some(SessionEvent::SignedOut { account_id: me }));
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let hub = SessionHub::default();
        let sub = hub.subscribe(Uuid::new_v4());
        assert_eq!(hub.subscriber_count(), 1);
        drop(sub);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_stream_ends_after_sign_out() {
        let hub = SessionHub::default();
        let me = Uuid::new_v4();
        let stream = hub.subscribe(me).into_stream();

        hub.publish(SessionEvent::SignedIn {
            account_id: me,
            role: UserRole::Employee,
        });
        hub.publish(SessionEvent::PasswordChanged { account_id: me });
        hub.publish(SessionEvent::SignedIn {
            account_id: me,
            role: UserRole::Employee,
        });

        let seen: Vec<&'static str> = stream.map(|e| e.name()).collect().await;
        assert_eq!(seen, vec!["signed_in", "password_changed"]);
    }
}
