//! 下载url
//!
//! `PublicUrl`保存构成url的各个字段，每次`render`（或`Display`）都根据当前字段重新生成字符串，
//! 修改字段的方法返回`&mut Self`，同一个实例可以反复修改后再使用。
//!
//! - 公开url：`<scheme>://<domain>/<escaped key>[?<transform>][&attname=<filename>][&t=<token>]`
//! - 私有url：在公开url后追加`e=<deadline>`和`token=<AccessKey>:<sign>`，
//!   [下载凭证文档](https://developer.qiniu.com/kodo/1202/download-token)

use super::Client;
use super::utils::escape_strict;
use crate::clock::Clock;
use crate::credentials::Credentials;
use crate::kodo::Error;
use bon::Builder;
use kodo_sdk_common::auth::sign_data;
use std::fmt::{Display, Formatter};
use time::{Duration, OffsetDateTime};

/// 未指定过期时间时默认一小时
pub const DEFAULT_URL_TTL: Duration = Duration::hours(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Display for Scheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrl {
    domain: String,
    key: String,
    scheme: Scheme,
    filename: Option<String>,
    transform_params: Option<String>,
    cache_bust_token: Option<String>,
}

impl PublicUrl {
    /// `domain`为不带scheme的域名，可以带端口
    pub fn new(domain: impl Into<String>, key: impl Into<String>, scheme: Scheme) -> Self {
        Self {
            domain: domain.into(),
            key: key.into(),
            scheme,
            filename: None,
            transform_params: None,
            cache_bust_token: None,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn transform_params(&self) -> Option<&str> {
        self.transform_params.as_deref()
    }

    pub fn cache_bust_token(&self) -> Option<&str> {
        self.cache_bust_token.as_deref()
    }

    /// 下载时浏览器保存的文件名，空字符串等同于清除
    pub fn set_filename(&mut self, filename: impl Into<String>) -> &mut Self {
        self.filename = Some(filename.into()).filter(|s| !s.is_empty());
        self
    }

    /// 数据处理参数，如`imageView2/1/w/200`，原样拼接在query中
    pub fn set_transform_params(&mut self, params: impl Into<String>) -> &mut Self {
        self.transform_params = Some(params.into()).filter(|s| !s.is_empty());
        self
    }

    /// 用当前时间（微秒）更新`t`参数，绕过CDN缓存，其它字段不变
    pub fn refresh(&mut self, clock: &dyn Clock) -> &mut Self {
        let micros = clock.now().unix_timestamp_nanos() / 1_000;
        self.cache_bust_token = Some(micros.to_string());
        self
    }

    /// `<scheme>://<domain>`
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.domain.trim_end_matches('/'))
    }

    /// `/<escaped key>`
    pub fn path(&self) -> String {
        format!("/{}", escape_strict(&self.key))
    }

    /// 不含`?`，没有参数时返回`None`
    pub fn query(&self) -> Option<String> {
        let mut parts = Vec::with_capacity(3);
        if let Some(p) = &self.transform_params {
            parts.push(p.clone());
        }
        if let Some(name) = &self.filename {
            parts.push(format!("attname={}", escape_strict(name)));
        }
        if let Some(t) = &self.cache_bust_token {
            parts.push(format!("t={t}"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("&"))
        }
    }

    pub fn render(&self) -> String {
        let mut s = self.origin();
        s.push_str(&self.path());
        if let Some(q) = self.query() {
            s.push('?');
            s.push_str(&q);
        }
        s
    }

    pub fn private(&self) -> PrivateUrlBuilder<'_> {
        PrivateUrl::builder(self)
    }
}

impl Display for PublicUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&PublicUrl> for String {
    fn from(u: &PublicUrl) -> Self {
        u.render()
    }
}

/// 过期时间只能通过`ttl`或`deadline`其中一个指定，都不指定时使用`DEFAULT_URL_TTL`。
/// 返回过期时间的unix秒。`ttl`在调用时根据`clock`计算。
pub(crate) fn resolve_deadline(
    ttl: Option<Duration>,
    deadline: Option<OffsetDateTime>,
    clock: &dyn Clock,
) -> Result<i64, String> {
    match (ttl, deadline) {
        (Some(_), Some(_)) => Err("ttl and deadline cannot be set at the same time".to_owned()),
        (None, Some(deadline)) => Ok(deadline.unix_timestamp()),
        (ttl, None) => {
            let ttl = ttl.unwrap_or(DEFAULT_URL_TTL);
            if !ttl.is_positive() {
                return Err("ttl must be positive".to_owned());
            }
            Ok((clock.now() + ttl).unix_timestamp())
        }
    }
}

/// 带过期时间和签名的私有url
#[derive(Builder)]
pub struct PrivateUrl<'a> {
    #[builder(start_fn)]
    url: &'a PublicUrl,
    ttl: Option<Duration>,
    deadline: Option<OffsetDateTime>,
}

impl PrivateUrl<'_> {
    /// 参数错误（缺少密钥、同时指定ttl和deadline）时直接返回错误，不会进行签名计算
    pub fn sign(&self, credentials: &Credentials, clock: &dyn Clock) -> Result<String, Error> {
        if credentials.access_key.is_empty() || credentials.secret_key.is_empty() {
            return Err(Error::InvalidInput(
                "access key and secret key are required to sign a private url".to_owned(),
            ));
        }
        let deadline = resolve_deadline(self.ttl, self.deadline, clock).map_err(Error::InvalidInput)?;

        let mut url = self.url.render();
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&format!("e={deadline}"));
        let token = sign_data(
            &credentials.access_key,
            &credentials.secret_key,
            url.as_bytes(),
        );
        url.push_str("&token=");
        url.push_str(&token);
        Ok(url)
    }
}

impl Client {
    /// scheme由`Config::use_https`决定
    pub fn public_url(&self, domain: &str, key: &str) -> PublicUrl {
        let scheme = if self.config.use_https {
            Scheme::Https
        } else {
            Scheme::Http
        };
        PublicUrl::new(domain, key, scheme)
    }
}
