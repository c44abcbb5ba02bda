//! Social graph, chat and notifications.

use dewdrop_client::ApiClient;
use dewdrop_core::{ConversationId, NotificationId, ProductId, UserId};

use super::CommandError;
use crate::output;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub async fn follow(client: &ApiClient, user: UserId, follow: bool) -> CommandResult {
    if follow {
        client.social().follow(user).await?;
        tracing::info!(user_id = %user, "Following");
    } else {
        client.social().unfollow(user).await?;
        tracing::info!(user_id = %user, "Unfollowed");
    }
    Ok(())
}

pub async fn followers(client: &ApiClient) -> CommandResult {
    output::users(&client.social().followers().await?);
    Ok(())
}

pub async fn following(client: &ApiClient) -> CommandResult {
    output::users(&client.social().following().await?);
    Ok(())
}

pub async fn search(client: &ApiClient, query: &str) -> CommandResult {
    output::users(&client.social().search(query).await?);
    Ok(())
}

pub async fn suggestions(client: &ApiClient) -> CommandResult {
    output::users(&client.social().suggestions().await?);
    Ok(())
}

pub async fn profile(client: &ApiClient, username: &str) -> CommandResult {
    output::users(&[client.social().profile(username).await?]);
    Ok(())
}

pub async fn share(
    client: &ApiClient,
    product: ProductId,
    conversation: ConversationId,
    note: Option<&str>,
) -> CommandResult {
    let message = client
        .social()
        .share_product(product, conversation, note)
        .await?;
    output::messages(&[message]);
    Ok(())
}

pub async fn conversations(client: &ApiClient) -> CommandResult {
    output::conversations(&client.chat().conversations().await?);
    Ok(())
}

pub async fn start_conversation(client: &ApiClient, user: UserId) -> CommandResult {
    let conversation = client.chat().start_conversation(user).await?;
    output::conversations(&[conversation]);
    Ok(())
}

pub async fn read_conversation(client: &ApiClient, conversation: ConversationId) -> CommandResult {
    let chat = client.chat();
    output::messages(&chat.messages(conversation).await?);
    chat.mark_read(conversation).await?;
    Ok(())
}

pub async fn send(client: &ApiClient, conversation: ConversationId, content: &str) -> CommandResult {
    let message = client.chat().send(conversation, content).await?;
    output::messages(&[message]);
    Ok(())
}

pub async fn notifications(client: &ApiClient) -> CommandResult {
    let notifications = client.notifications();
    let unread = notifications.unread_count().await?;
    output::notifications(&notifications.list().await?, unread);
    Ok(())
}

pub async fn mark_notifications_read(
    client: &ApiClient,
    id: Option<NotificationId>,
    all: bool,
) -> CommandResult {
    match (id, all) {
        (_, true) => client.notifications().mark_all_read().await?,
        (Some(id), false) => client.notifications().mark_read(id).await?,
        (None, false) => {
            return Err(CommandError::InvalidArgument(
                "pass a notification id or --all".to_string(),
            )
            .into());
        }
    }
    Ok(())
}
