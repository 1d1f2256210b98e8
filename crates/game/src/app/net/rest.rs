use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use url::Url;

use super::backend::{parse_rows, Backend, BackendError, ChatRow, NewChatMessage, PlayerRow};

const PLAYERS_TABLE: &str = "players";
const CHAT_TABLE: &str = "chat";

/// PostgREST-style table access over HTTP.
#[derive(Clone)]
pub(crate) struct RestBackend {
    http: Client,
    rest_root: Url,
    api_key: Option<String>,
}

impl RestBackend {
    pub(crate) fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            rest_root: rest_root(base_url)?,
            api_key,
        })
    }

    fn table_url(&self, table: &str) -> Result<Url, BackendError> {
        Ok(self.rest_root.join(table)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {key}")),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        // Keep the upstream body; PostgREST puts the reason there.
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn listing(&self, url: Url) -> Result<Value, BackendError> {
        let response = self.send(self.http.get(url)).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn upsert_player(&self, row: &PlayerRow) -> Result<(), BackendError> {
        let mut url = self.table_url(PLAYERS_TABLE)?;
        url.query_pairs_mut().append_pair("on_conflict", "id");
        let request = self
            .http
            .post(url)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&[row]);
        self.send(request).await?;
        Ok(())
    }

    async fn list_other_players(
        &self,
        exclude_id: &str,
        live_since_ms: i64,
    ) -> Result<Vec<PlayerRow>, BackendError> {
        let mut url = self.table_url(PLAYERS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &format!("neq.{exclude_id}"))
            .append_pair("last_seen_at", &format!("gt.{live_since_ms}"));
        let body = self.listing(url).await?;
        Ok(parse_rows(PLAYERS_TABLE, body))
    }

    async fn insert_chat_message(&self, message: &NewChatMessage) -> Result<(), BackendError> {
        let url = self.table_url(CHAT_TABLE)?;
        self.send(self.http.post(url).json(&[message])).await?;
        Ok(())
    }

    async fn list_chat_messages_since(
        &self,
        since: Option<&str>,
    ) -> Result<Vec<ChatRow>, BackendError> {
        let mut url = self.table_url(CHAT_TABLE)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("select", "*")
                .append_pair("order", "created_at.asc");
            if let Some(since) = since {
                query.append_pair("created_at", &format!("gt.{since}"));
            }
        }
        let body = self.listing(url).await?;
        Ok(parse_rows(CHAT_TABLE, body))
    }

    async fn delete_player(&self, id: &str) -> Result<(), BackendError> {
        let mut url = self.table_url(PLAYERS_TABLE)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

/// `<base>/rest/v1/`, with the trailing slash `Url::join` needs.
fn rest_root(base_url: &str) -> Result<Url, BackendError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    Ok(Url::parse(&format!("{trimmed}/rest/v1/"))?)
}
