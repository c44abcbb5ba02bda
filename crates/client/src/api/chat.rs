//! Direct messages.

use dewdrop_core::{ConversationId, UserId};
use serde_json::json;
use tracing::instrument;

use crate::client::{ApiClient, ApiRequest};
use crate::error::{ApiError, Result};
use crate::types::{Conversation, Message, Page};

/// Longest message the backend accepts.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Chat endpoints.
pub struct ChatApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ChatApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Conversations, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn conversations(&self) -> Result<Vec<Conversation>> {
        let page: Page<Conversation> = self
            .client
            .execute(ApiRequest::get("chat/conversations/"))
            .await?;
        Ok(page.results)
    }

    /// Open (or reuse) a conversation with another user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn start_conversation(&self, user: UserId) -> Result<Conversation> {
        let request =
            ApiRequest::post("chat/conversations/").json(&json!({ "participant_id": user }))?;
        self.client.execute(request).await
    }

    /// Messages in a conversation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn messages(&self, conversation: ConversationId) -> Result<Vec<Message>> {
        let page: Page<Message> = self
            .client
            .execute(ApiRequest::get(format!("chat/messages/{conversation}/")))
            .await?;
        Ok(page.results)
    }

    /// Send a text message.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for an empty or over-long message.
    #[instrument(skip(self, content))]
    pub async fn send(&self, conversation: ConversationId, content: &str) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ApiError::InvalidInput("message is empty".to_string()));
        }
        if content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ApiError::InvalidInput(format!(
                "message is longer than {MAX_MESSAGE_CHARS} characters"
            )));
        }

        let request = ApiRequest::post(format!("chat/messages/{conversation}/"))
            .json(&json!({ "content": content }))?;
        self.client.execute(request).await
    }

    /// Mark every message in a conversation as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn mark_read(&self, conversation: ConversationId) -> Result<()> {
        self.client
            .execute_unit(ApiRequest::post(format!(
                "chat/conversations/{conversation}/read/"
            )))
            .await
    }
}
