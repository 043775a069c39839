//! 流的创建、查询、列举和禁用

use super::Client;
use crate::list::{ListRequest, PageCursor, PaginatedLister};
use crate::pili::Error;
use crate::transport::{HttpMethod, RequestBody, TransportRequest};
use bon::Builder;
use kodo_sdk_common::helper::urlsafe_base64;
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;

/// 流名：4-200个字符，只能包含字母、数字、`-`和`_`
pub(crate) fn validate_stream_key(key: &str) -> Result<(), Error> {
    let len = key.len();
    if !(4..=200).contains(&len) {
        return Err(Error::InvalidInput(format!(
            "stream key length must be between 4 and 200, got {len}"
        )));
    }
    if !key
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(Error::InvalidInput(format!(
            "stream key `{key}` contains invalid characters"
        )));
    }
    Ok(())
}

// region:    --- list streams
#[derive(Builder)]
pub struct ListStreams<'a> {
    #[builder(start_fn)]
    pub(crate) client: &'a Client,
    /// 只列举正在直播的流
    liveonly: Option<bool>,
    prefix: Option<&'a str>,
    marker: Option<&'a str>,
    /// 最多返回的流数量，`<= 0`表示不限制
    limit: Option<i64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StreamItem {
    pub key: String,
}

impl ListStreams<'_> {
    pub fn lister(&self) -> PaginatedLister<StreamItem> {
        let client = self.client;
        let fixed_query = self
            .liveonly
            .map(|v| ("liveonly".to_owned(), v.to_string()))
            .into_iter()
            .collect();

        let request = ListRequest {
            base_url: client.base_url(),
            path: client.streams_path(),
            query: fixed_query,
            page_size: Some(client.config.list_page_size),
        };
        let cursor = PageCursor {
            marker: self.marker.map(ToOwned::to_owned),
            prefix: self.prefix.map(ToOwned::to_owned),
            limit: self.limit,
        };
        PaginatedLister::new(client.transport.clone(), request, cursor)
    }
}
// endregion: --- list streams

// region:    --- stream info
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    /// unix秒
    pub created_at: i64,
    pub updated_at: i64,
    pub expire_at: i64,
    /// 0表示未禁用，-1表示永久禁用
    pub disabled_till: i64,
    #[serde(default)]
    pub converts: Vec<String>,
}

impl StreamInfo {
    pub fn is_disabled(&self, now: OffsetDateTime) -> bool {
        self.disabled_till == -1 || self.disabled_till > now.unix_timestamp()
    }
}
// endregion: --- stream info

impl Client {
    pub fn list_streams(&self) -> ListStreamsBuilder<'_> {
        ListStreams::builder(self)
    }

    fn stream_path(&self, key: &str) -> String {
        format!("{}/{}", self.streams_path(), urlsafe_base64(key))
    }

    pub async fn create_stream(&self, key: &str) -> Result<(), Error> {
        validate_stream_key(key)?;

        let req = TransportRequest::builder()
            .method(HttpMethod::Post)
            .base_url(self.base_url())
            .path(self.streams_path())
            .body(RequestBody::Json(json!({ "key": key })))
            .build();
        self.transport.request(req).await?;
        Ok(())
    }

    pub async fn stream_info(&self, key: &str) -> Result<StreamInfo, Error> {
        validate_stream_key(key)?;

        let req = TransportRequest::builder()
            .method(HttpMethod::Get)
            .base_url(self.base_url())
            .path(self.stream_path(key))
            .build();
        let resp = self.transport.request(req).await?;
        serde_json::from_value(resp.body)
            .map_err(|e| Error::Common(format!("JSON parse error: {}", e)))
    }

    /// `till`为`None`时永久禁用
    pub async fn disable_stream(
        &self,
        key: &str,
        till: Option<OffsetDateTime>,
    ) -> Result<(), Error> {
        let disabled_till = till.map_or(-1, |t| t.unix_timestamp());
        self.set_disabled_till(key, disabled_till).await
    }

    pub async fn enable_stream(&self, key: &str) -> Result<(), Error> {
        self.set_disabled_till(key, 0).await
    }

    async fn set_disabled_till(&self, key: &str, disabled_till: i64) -> Result<(), Error> {
        validate_stream_key(key)?;

        let req = TransportRequest::builder()
            .method(HttpMethod::Post)
            .base_url(self.base_url())
            .path(format!("{}/disabled", self.stream_path(key)))
            .body(RequestBody::Json(json!({ "disabledTill": disabled_till })))
            .build();
        self.transport.request(req).await?;
        Ok(())
    }
}

#[test]
fn validate_stream_key_test() {
    assert!(validate_stream_key("room_01-a").is_ok());
    assert!(validate_stream_key("abc").is_err());
    assert!(validate_stream_key(&"a".repeat(201)).is_err());
    assert!(validate_stream_key("bad key").is_err());
    assert!(validate_stream_key("中文流名").is_err());
}

#[test]
fn stream_info_disabled_test() {
    let now = OffsetDateTime::from_unix_timestamp(1_000).unwrap();
    let mut info = StreamInfo {
        created_at: 0,
        updated_at: 0,
        expire_at: 0,
        disabled_till: 0,
        converts: vec![],
    };
    assert!(!info.is_disabled(now));
    info.disabled_till = -1;
    assert!(info.is_disabled(now));
    info.disabled_till = 2_000;
    assert!(info.is_disabled(now));
    info.disabled_till = 500;
    assert!(!info.is_disabled(now));
}
