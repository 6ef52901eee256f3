use std::time::Duration;

use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue};
use salon_core::{
    ErrorBody, MemberAction, MessageId, MessagesQuery, MessagesResponse, RoomId,
    RoomListResponse, RoomStateResponse, SendResponse, TypingResponse, UserId,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use super::backend::{BoxFuture, ChatBackend};
use super::error::{
    BackendResult, BuildClientSnafu, DecodeSnafu, InvalidHeaderSnafu, StatusSnafu, TransportSnafu,
};
use super::routes::Routes;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

const CSRF_FORM_FIELD: &str = "csrfmiddlewaretoken";
const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrftoken");

/// Connection settings of the HTTP backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Cross-site request forgery token handed out by the host page.
    pub csrf_token: String,
    /// Raw `Cookie` header value carrying the authenticated session.
    pub session_cookie: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            csrf_token: String::new(),
            session_cookie: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl BackendConfig {
    pub fn normalized(mut self) -> Self {
        let base_url = self.base_url.trim().trim_end_matches('/');
        self.base_url = if base_url.is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            base_url.to_string()
        };
        self.csrf_token = self.csrf_token.trim().to_string();
        self.session_cookie = self
            .session_cookie
            .map(|cookie| cookie.trim().to_string())
            .filter(|cookie| !cookie.is_empty());
        if self.request_timeout_ms == 0 {
            self.request_timeout_ms = DEFAULT_REQUEST_TIMEOUT_MS;
        }
        self
    }

    pub fn routes(&self) -> Routes {
        Routes::new(&self.base_url)
    }
}

/// `ChatBackend` speaking JSON over HTTP to the chat server.
pub struct HttpBackend {
    client: reqwest::Client,
    routes: Routes,
    csrf_token: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.session_cookie {
            let value = HeaderValue::from_str(cookie).context(InvalidHeaderSnafu {
                stage: "session-cookie-header",
                header: "cookie",
            })?;
            headers.insert(COOKIE, value);
        }
        if !config.csrf_token.is_empty() {
            let value = HeaderValue::from_str(&config.csrf_token).context(InvalidHeaderSnafu {
                stage: "csrf-header",
                header: "x-csrftoken",
            })?;
            headers.insert(CSRF_HEADER, value);
        }

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .context(BuildClientSnafu {
                stage: "build-client",
            })?;

        Ok(Self {
            client,
            routes: config.routes(),
            csrf_token: config.csrf_token.clone(),
        })
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    async fn get_json<T>(
        &self,
        endpoint: &'static str,
        url: String,
        query: &[(&str, String)],
    ) -> BackendResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .context(TransportSnafu {
                stage: "send-get-request",
                endpoint,
            })?;
        let body = read_success_body(endpoint, response).await?;
        serde_json::from_str(&body).context(DecodeSnafu {
            stage: "decode-get-response",
            endpoint,
        })
    }

    async fn post_form(
        &self,
        endpoint: &'static str,
        url: String,
        fields: &[(&str, &str)],
    ) -> BackendResult<String> {
        let mut form = Vec::with_capacity(fields.len() + 1);
        form.extend_from_slice(fields);
        form.push((CSRF_FORM_FIELD, self.csrf_token.as_str()));

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .context(TransportSnafu {
                stage: "send-post-request",
                endpoint,
            })?;
        read_success_body(endpoint, response).await
    }
}

async fn read_success_body(
    endpoint: &'static str,
    response: reqwest::Response,
) -> BackendResult<String> {
    let status = response.status();
    let body = response.text().await.context(TransportSnafu {
        stage: "read-response-body",
        endpoint,
    })?;

    if !status.is_success() {
        let code = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .map(|body| body.error)
            .filter(|code| !code.is_empty());
        tracing::debug!(
            endpoint,
            status = status.as_u16(),
            code = ?code,
            "backend answered with a failure status"
        );
        return StatusSnafu {
            stage: "check-response-status",
            endpoint,
            status: status.as_u16(),
            code,
        }
        .fail();
    }

    Ok(body)
}

impl ChatBackend for HttpBackend {
    fn messages(
        &self,
        room: RoomId,
        query: MessagesQuery,
    ) -> BoxFuture<'_, BackendResult<MessagesResponse>> {
        Box::pin(async move {
            let mut params = vec![("after", query.after.to_string())];
            if let Some(since) = query.since {
                params.push(("since", since.to_rfc3339()));
            }
            self.get_json("messages", self.routes.messages(room), &params)
                .await
        })
    }

    fn send_message<'a>(
        &'a self,
        room: RoomId,
        content: &'a str,
    ) -> BoxFuture<'a, BackendResult<SendResponse>> {
        Box::pin(async move {
            let body = self
                .post_form("send", self.routes.send(room), &[("content", content)])
                .await?;
            serde_json::from_str(&body).context(DecodeSnafu {
                stage: "decode-send-response",
                endpoint: "send",
            })
        })
    }

    fn delete_message(
        &self,
        room: RoomId,
        message_id: MessageId,
    ) -> BoxFuture<'_, BackendResult<()>> {
        Box::pin(async move {
            self.post_form(
                "delete",
                self.routes.delete_message(room, message_id),
                &[],
            )
            .await?;
            Ok(())
        })
    }

    fn typing_ping(&self, room: RoomId) -> BoxFuture<'_, BackendResult<()>> {
        Box::pin(async move {
            self.post_form("typing-ping", self.routes.typing(room), &[])
                .await?;
            Ok(())
        })
    }

    fn typing_state(&self, room: RoomId) -> BoxFuture<'_, BackendResult<TypingResponse>> {
        Box::pin(async move {
            self.get_json("typing-state", self.routes.typing(room), &[])
                .await
        })
    }

    fn room_list(&self) -> BoxFuture<'_, BackendResult<RoomListResponse>> {
        Box::pin(async move { self.get_json("room-list", self.routes.room_list(), &[]).await })
    }

    fn room_state(&self, room: RoomId) -> BoxFuture<'_, BackendResult<RoomStateResponse>> {
        Box::pin(async move {
            self.get_json("room-state", self.routes.room_state(room), &[])
                .await
        })
    }

    fn change_role(
        &self,
        room: RoomId,
        user_id: UserId,
        action: MemberAction,
    ) -> BoxFuture<'_, BackendResult<()>> {
        Box::pin(async move {
            // The backend answers with a redirect to the room page; reaching any 2xx is success.
            self.post_form(
                "change-role",
                self.routes.change_role(room, action, user_id),
                &[],
            )
            .await?;
            Ok(())
        })
    }
}
