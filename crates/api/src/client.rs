use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use snafu::{ResultExt, ensure};

use super::error::{
    ApiResult, BuildClientSnafu, DecodeSnafu, InvalidCookieSnafu, NicknameTooLongSnafu,
    ReadBodySnafu, RequestSnafu, StatusSnafu,
};
use super::ids::{ConversationId, ItemId, UserId};
use super::query::{ConversationOrder, ConversationTypes, MessageQuery, NameOrder};
use super::types::{
    Conversation, GlobalStats, MessagePage, NICKNAME_MAX_CHARS, NameUpdate, Page, Participant,
    RawMessageEnvelope, User,
};
use super::{BoxFuture, MessageSource};

/// Typed client for the archive's REST API.
#[derive(Clone, Debug)]
pub struct ArchiveClient {
    base_url: String,
    http: reqwest::Client,
}

impl ArchiveClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        Self::with_cookie(base_url, None)
    }

    /// Sends `cookie` verbatim with every request, e.g. an `Authorization=...` pair.
    pub fn with_cookie(base_url: impl Into<String>, cookie: Option<&str>) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = cookie.filter(|value| !value.is_empty()) {
            let value = HeaderValue::from_str(cookie).context(InvalidCookieSnafu {
                stage: "client-cookie-header",
            })?;
            headers.insert(COOKIE, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context(BuildClientSnafu {
                stage: "client-build",
            })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_text(&self, path: &str, query: &[(&'static str, String)]) -> ApiResult<String> {
        tracing::debug!(endpoint = path, ?query, "archive request");
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .context(RequestSnafu {
                stage: "get-send",
                endpoint: path,
            })?;

        let status = response.status();
        let body = response.text().await.context(ReadBodySnafu {
            stage: "get-read-body",
            endpoint: path,
        })?;
        ensure!(
            status.is_success(),
            StatusSnafu {
                stage: "get-status",
                endpoint: path,
                status: status.as_u16(),
                body,
            }
        );
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> ApiResult<T> {
        let body = self.get_text(path, query).await?;
        serde_json::from_str(&body).context(DecodeSnafu {
            stage: "get-decode",
            endpoint: path,
        })
    }

    async fn get_messages(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> ApiResult<MessagePage> {
        let envelope: RawMessageEnvelope = self.get_json(path, query).await?;
        let page = MessagePage::from_envelope(envelope, path);
        tracing::debug!(
            endpoint = path,
            items = page.items.len(),
            skipped = page.skipped,
            users = page.users.len(),
            "message page received"
        );
        Ok(page)
    }

    async fn post_text(&self, path: &str, id: &str, body: String) -> ApiResult<()> {
        let response = self
            .http
            .post(self.url(path))
            .query(&[("id", id)])
            .body(body)
            .send()
            .await
            .context(RequestSnafu {
                stage: "post-send",
                endpoint: path,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.context(ReadBodySnafu {
                stage: "post-read-body",
                endpoint: path,
            })?;
            return StatusSnafu {
                stage: "post-status",
                endpoint: path,
                status: status.as_u16(),
                body,
            }
            .fail();
        }
        Ok(())
    }

    pub async fn messages(&self, query: &MessageQuery) -> ApiResult<MessagePage> {
        self.get_messages("/api/messages", &query.query_pairs())
            .await
    }

    pub async fn random_messages(&self) -> ApiResult<MessagePage> {
        self.get_messages("/api/messages/random", &[]).await
    }

    pub async fn message(&self, id: &ItemId) -> ApiResult<MessagePage> {
        self.get_messages("/api/message", &[("id", id.to_string())])
            .await
    }

    pub async fn conversations(
        &self,
        order: ConversationOrder,
        types: ConversationTypes,
        page: u32,
    ) -> ApiResult<Page<Conversation>> {
        let query = [
            ("first", order.as_param().to_string()),
            ("types", types.as_param()),
            ("page", page.to_string()),
        ];
        self.get_json("/api/conversations", &query).await
    }

    pub async fn conversations_with_user(
        &self,
        user: &UserId,
        page: u32,
    ) -> ApiResult<Page<Conversation>> {
        let query = [("id", user.to_string()), ("page", page.to_string())];
        self.get_json("/api/conversations/withuser", &query).await
    }

    pub async fn conversation(&self, id: &ConversationId) -> ApiResult<Conversation> {
        self.get_json("/api/conversation", &[("id", id.to_string())])
            .await
    }

    pub async fn conversation_names(
        &self,
        conversation: &ConversationId,
        order: NameOrder,
        page: u32,
    ) -> ApiResult<Page<NameUpdate>> {
        let query = [
            ("conversation", conversation.to_string()),
            ("first", order.as_param().to_string()),
            ("page", page.to_string()),
        ];
        self.get_json("/api/conversation/names", &query).await
    }

    pub async fn users(&self, page: u32) -> ApiResult<Page<User>> {
        self.get_json("/api/users", &[("page", page.to_string())])
            .await
    }

    pub async fn participants(
        &self,
        conversation: &ConversationId,
        page: u32,
    ) -> ApiResult<Page<Participant>> {
        let query = [
            ("conversation", conversation.to_string()),
            ("page", page.to_string()),
        ];
        self.get_json("/api/users", &query).await
    }

    pub async fn user(&self, id: &UserId) -> ApiResult<User> {
        self.get_json("/api/user", &[("id", id.to_string())]).await
    }

    pub async fn global_stats(&self) -> ApiResult<GlobalStats> {
        self.get_json("/api/globalstats", &[]).await
    }

    pub async fn set_user_nickname(&self, id: &UserId, nickname: &str) -> ApiResult<()> {
        let length = nickname.chars().count();
        ensure!(
            length <= NICKNAME_MAX_CHARS,
            NicknameTooLongSnafu {
                stage: "nickname-validate",
                length,
                limit: NICKNAME_MAX_CHARS,
            }
        );
        self.post_text("/api/user/nickname", id.as_str(), nickname.to_string())
            .await
    }

    pub async fn set_user_notes(&self, id: &UserId, notes: &str) -> ApiResult<()> {
        self.post_text("/api/user/notes", id.as_str(), notes.to_string())
            .await
    }

    pub async fn set_conversation_notes(&self, id: &ConversationId, notes: &str) -> ApiResult<()> {
        self.post_text("/api/conversation/notes", id.as_str(), notes.to_string())
            .await
    }
}

impl MessageSource for ArchiveClient {
    fn fetch_messages<'a>(&'a self, query: &'a MessageQuery) -> BoxFuture<'a, ApiResult<MessagePage>> {
        Box::pin(self.messages(query))
    }
}
