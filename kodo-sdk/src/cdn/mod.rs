//! CDN时间戳防盗链
//!
//! 签名放在路径中：`<scheme>://<domain>/<sign>/<deadline_hex>/<escaped key>[?<query>]`，
//! 其中`sign = md5(<secret><path><deadline_hex>)`，`path`为`/<escaped key>`，`deadline_hex`为过期时间unix秒的小写十六进制。
//! 原url上的参数（数据处理、attname等）保持不变。

mod error;
pub use error::Error;

use crate::clock::Clock;
use crate::kodo::download_url::{PublicUrl, resolve_deadline};
use bon::Builder;
use md5::{Digest, Md5};
use time::{Duration, OffsetDateTime};

#[derive(Builder)]
pub struct TimestampUrl<'a> {
    #[builder(start_fn)]
    url: &'a PublicUrl,
    ttl: Option<Duration>,
    deadline: Option<OffsetDateTime>,
}

fn timestamp_sign(secret: &str, path: &str, deadline_hex: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(secret.as_bytes());
    hasher.update(path.as_bytes());
    hasher.update(deadline_hex.as_bytes());
    hex::encode(hasher.finalize())
}

impl TimestampUrl<'_> {
    /// `secret`为CDN域名上配置的防盗链密钥
    pub fn sign(&self, secret: &str, clock: &dyn Clock) -> Result<String, Error> {
        if secret.is_empty() {
            return Err(Error::InvalidInput(
                "anti-leech secret cannot be empty".to_owned(),
            ));
        }
        let deadline = resolve_deadline(self.ttl, self.deadline, clock).map_err(Error::InvalidInput)?;
        if deadline < 0 {
            return Err(Error::InvalidInput(
                "deadline cannot be before unix epoch".to_owned(),
            ));
        }

        let deadline_hex = format!("{:x}", deadline);
        let path = self.url.path();
        let sign = timestamp_sign(secret, &path, &deadline_hex);

        let mut s = format!("{}/{}/{}{}", self.url.origin(), sign, deadline_hex, path);
        if let Some(q) = self.url.query() {
            s.push('?');
            s.push_str(&q);
        }
        Ok(s)
    }
}

impl PublicUrl {
    pub fn timestamp(&self) -> TimestampUrlBuilder<'_> {
        TimestampUrl::builder(self)
    }
}
