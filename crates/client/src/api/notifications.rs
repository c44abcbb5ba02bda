//! Notifications.

use dewdrop_core::NotificationId;
use serde::Deserialize;

use crate::client::{ApiClient, ApiRequest};
use crate::error::Result;
use crate::types::{Notification, Page};

#[derive(Deserialize)]
struct UnreadCount {
    #[serde(alias = "unread_count")]
    count: u32,
}

/// Notification endpoints.
pub struct NotificationsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> NotificationsApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self) -> Result<Vec<Notification>> {
        let page: Page<Notification> = self
            .client
            .execute(ApiRequest::get("notifications/"))
            .await?;
        Ok(page.results)
    }

    /// Number of unread notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn unread_count(&self) -> Result<u32> {
        let body: UnreadCount = self
            .client
            .execute(ApiRequest::get("notifications/unread-count/"))
            .await?;
        Ok(body.count)
    }

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn mark_read(&self, id: NotificationId) -> Result<()> {
        self.client
            .execute_unit(ApiRequest::post(format!("notifications/{id}/read/")))
            .await
    }

    /// Mark every notification read.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn mark_all_read(&self) -> Result<()> {
        self.client
            .execute_unit(ApiRequest::post("notifications/read-all/"))
            .await
    }
}
