//! 请求执行层
//!
//! 上层模块（列举、batch、hub）只通过`Transport` trait发送请求，只关心状态码和解析后的json body。
//! 重试、超时等策略都属于具体的Transport实现，上层不会自动重试。

use crate::credentials::{CredentialsError, CredentialsProvider};
use bon::{Builder, bon};
use kodo_sdk_common::auth::{ManagementSignParams, management_token};
use kodo_sdk_common::helper::{into_header_map, into_request_failed_error};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use url::{Url, form_urlencoded};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    /// `application/x-www-form-urlencoded`，key可以重复，顺序保持不变
    Form(Vec<(String, String)>),
}

impl RequestBody {
    fn content_type(&self) -> Option<&'static str> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Json(_) => Some("application/json"),
            RequestBody::Form(_) => Some("application/x-www-form-urlencoded"),
        }
    }

    fn to_bytes(&self) -> Result<Vec<u8>, TransportError> {
        match self {
            RequestBody::Empty => Ok(Vec::new()),
            RequestBody::Json(v) => {
                serde_json::to_vec(v).map_err(|e| TransportError::Common(e.to_string()))
            }
            RequestBody::Form(pairs) => {
                let mut serializer = form_urlencoded::Serializer::new(String::new());
                for (k, v) in pairs {
                    serializer.append_pair(k, v);
                }
                Ok(serializer.finish().into_bytes())
            }
        }
    }
}

#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(on(String, into))]
pub struct TransportRequest {
    pub method: HttpMethod,
    /// 由`EndpointResolver`得到，如`https://rs-z0.qiniuapi.com`
    pub base_url: String,
    /// 以`/`开头，已经完成了必要的转义
    pub path: String,
    #[builder(default)]
    pub query: Vec<(String, String)>,
    #[builder(default)]
    pub headers: HashMap<String, String>,
    #[builder(default)]
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// body为空时为`Value::Null`
    pub body: Value,
}

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("error: {0}")]
    Common(String),
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("response status is not success: {status}, text: {text}")]
    RequestAPIFailed { status: String, text: String },
    #[error("decode response body failed: {0}")]
    Decode(String),
    #[error("credentials error: {0}")]
    Credentials(#[from] CredentialsError),
}

impl From<kodo_sdk_common::Error> for TransportError {
    fn from(e: kodo_sdk_common::Error) -> Self {
        match e {
            kodo_sdk_common::Error::Common(msg) => TransportError::Common(msg),
            kodo_sdk_common::Error::RequestAPIFailed { status, message } => {
                TransportError::RequestAPIFailed {
                    status,
                    text: message,
                }
            }
            kodo_sdk_common::Error::Reqwest(e) => TransportError::Reqwest(e),
        }
    }
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, req: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// 基于reqwest的实现，每个请求都会带上管理凭证
pub struct HttpTransport {
    credentials_provider: Arc<dyn CredentialsProvider>,
    http_client: reqwest::Client,
}

#[bon]
impl HttpTransport {
    /// `http_client`可以传入自定义了超时、代理等配置的`reqwest::Client`
    #[builder]
    pub fn new(
        credentials_provider: Arc<dyn CredentialsProvider>,
        http_client: Option<reqwest::Client>,
    ) -> Self {
        Self {
            credentials_provider,
            http_client: http_client.unwrap_or_default(),
        }
    }
}

pub(crate) fn build_url(req: &TransportRequest) -> Result<Url, TransportError> {
    let mut url = Url::parse(&format!("{}{}", req.base_url, req.path))
        .map_err(|e| TransportError::Common(format!("invalid request url: {e}")))?;
    if !req.query.is_empty() {
        url.query_pairs_mut().extend_pairs(req.query.iter());
    }
    Ok(url)
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn request(&self, req: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = build_url(&req)?;
        let host = match (url.host_str(), url.port()) {
            (Some(h), Some(p)) => format!("{h}:{p}"),
            (Some(h), None) => h.to_owned(),
            (None, _) => return Err(TransportError::Common("request url has no host".to_owned())),
        };
        let body = req.body.to_bytes()?;
        let content_type = req.body.content_type();

        let creds = self.credentials_provider.load().await?;
        let method = req.method.to_string();
        let sign_params = ManagementSignParams {
            method: &method,
            path: url.path(),
            query: url.query(),
            host: &host,
            content_type,
            body: &body,
        };
        let authorization = management_token(&creds.access_key, &creds.secret_key, &sign_params);

        let mut header_map = req.headers;
        header_map.insert("Authorization".to_owned(), authorization);
        if let Some(ct) = content_type {
            header_map.insert("Content-Type".to_owned(), ct.to_owned());
        }
        let headers = into_header_map(&header_map)?;

        tracing::trace!(method = %req.method, url = %url, "sending request");
        let resp = self
            .http_client
            .request(req.method.into(), url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        // 298表示batch部分成功，属于2xx
        let status = resp.status();
        if !status.is_success() {
            return Err(into_request_failed_error(resp).await.into());
        }

        let text = resp.text().await?;
        let body = decode_body(&text)?;

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// 空body（如删除成功时）解析为`Value::Null`
fn decode_body(text: &str) -> Result<Value, TransportError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text)
        .map_err(|e| TransportError::Decode(format!("{e}, response text: {text}")))
}
