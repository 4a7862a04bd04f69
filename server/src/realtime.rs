// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use common::Notification;
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

/// Fan-out of freshly created notifications to live subscribers.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns the number of subscribers that received the notification.
    pub fn publish(&self, notification: Notification) -> usize {
        // No subscriber is not an error: the row is already stored.
        self.sender.send(notification).unwrap_or(0)
    }

    /// Notifications for one user, from the moment of the call onwards.
    /// A subscriber that falls behind skips what it missed.
    pub fn subscribe(
        &self,
        user_id: String,
    ) -> impl Stream<Item = Notification> + Send + 'static + use<> {
        let receiver = self.sender.subscribe();

        futures::stream::unfold((receiver, user_id), |(mut receiver, user_id)| async move {
            loop {
                match receiver.recv().await {
                    Ok(notification) if notification.user_id == user_id => {
                        return Some((notification, (receiver, user_id)));
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Notification stream for {} skipped {} messages.", user_id, skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
    }
}
