//! Follow graph, user search and product sharing.

use dewdrop_core::{ConversationId, ProductId, UserId};
use serde_json::json;
use tracing::instrument;

use crate::client::{ApiClient, ApiRequest, Auth};
use crate::error::{ApiError, Result};
use crate::types::{Message, Page, SocialUser};

/// Social endpoints.
pub struct SocialApi<'a> {
    client: &'a ApiClient,
}

impl<'a> SocialApi<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    fn ensure_not_self(&self, user: UserId) -> Result<()> {
        let me = self.client.store().load()?.map(|session| session.user.id);
        if me == Some(user) {
            return Err(ApiError::InvalidInput("you cannot follow yourself".to_string()));
        }
        Ok(())
    }

    /// Follow a user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` when `user` is the signed-in user.
    #[instrument(skip(self))]
    pub async fn follow(&self, user: UserId) -> Result<()> {
        self.ensure_not_self(user)?;
        self.client
            .execute_unit(ApiRequest::post(format!("social/follow/{user}/")))
            .await
    }

    /// Stop following a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn unfollow(&self, user: UserId) -> Result<()> {
        self.client
            .execute_unit(ApiRequest::post(format!("social/unfollow/{user}/")))
            .await
    }

    /// Users following the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn followers(&self) -> Result<Vec<SocialUser>> {
        self.users(ApiRequest::get("social/followers/")).await
    }

    /// Users the signed-in user follows.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn following(&self) -> Result<Vec<SocialUser>> {
        self.users(ApiRequest::get("social/following/")).await
    }

    /// Search users by username. A blank query returns nothing without a
    /// request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn search(&self, query: &str) -> Result<Vec<SocialUser>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.users(ApiRequest::get("social/search/").query("q", query))
            .await
    }

    /// Users the backend suggests following.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn suggestions(&self) -> Result<Vec<SocialUser>> {
        self.users(ApiRequest::get("social/suggestions/")).await
    }

    /// A public profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown username.
    pub async fn profile(&self, username: &str) -> Result<SocialUser> {
        let username = username.trim().trim_start_matches('@');
        if !is_valid_username(username) {
            return Err(ApiError::InvalidInput(format!("invalid username {username:?}")));
        }
        self.client
            .execute(ApiRequest::get(format!("social/users/{username}/")).auth(Auth::Optional))
            .await
    }

    /// Send a product into a conversation, with an optional note.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, note))]
    pub async fn share_product(
        &self,
        product: ProductId,
        conversation: ConversationId,
        note: Option<&str>,
    ) -> Result<Message> {
        let request = ApiRequest::post("social/share/").json(&json!({
            "product_id": product,
            "conversation_id": conversation,
            "message": note.map(str::trim).unwrap_or_default(),
        }))?;
        self.client.execute(request).await
    }

    async fn users(&self, request: ApiRequest) -> Result<Vec<SocialUser>> {
        let page: Page<SocialUser> = self.client.execute(request).await?;
        Ok(page.results)
    }
}

/// Usernames become a single path segment, so anything that could change
/// the request path or query is rejected.
fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username != "."
        && username != ".."
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::tests::signed_in_client;

    #[tokio::test]
    async fn test_cannot_follow_self() {
        let server = MockServer::start().await;
        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;

        // The sample session belongs to user 7.
        let err = client.social().follow(UserId::new(7)).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/social/search/"))
            .and(query_param("q", "dew"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 2, "username": "dewy", "is_following": true}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;
        assert!(client.social().search("   ").await.unwrap().is_empty());

        let users = client.social().search(" dew ").await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].is_following);
    }

    #[tokio::test]
    async fn test_profile_rejects_usernames_that_escape_the_path() {
        let server = MockServer::start().await;
        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;

        for username in ["", "@", "..", ".", "a/b", "a?admin=1", "x#frag", "a b", "%2e%2e"] {
            let err = client.social().profile(username).await.unwrap_err();
            assert!(matches!(err, ApiError::InvalidInput(_)), "{username:?}: {err:?}");
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/social/users/glow.getter-2_/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(
                {"id": 12, "username": "glow.getter-2_", "followers_count": 3}
            )))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server, "a1", Some("r1")).await;
        let user = client.social().profile(" @glow.getter-2_ ").await.unwrap();

        assert_eq!(user.id, UserId::new(12));
        assert_eq!(user.followers_count, 3);
    }
}
