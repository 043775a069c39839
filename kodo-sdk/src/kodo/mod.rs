//! 对象存储：列举、批量操作、下载url
//!
//! 所有请求都由构建时传入的`Transport`发送，域名由`EndpointResolver`决定。

pub mod batch;
pub mod bucket;
pub mod download_url;

mod error;
pub use error::Error;

pub(crate) mod utils;

use crate::config::Config;
use crate::region::{EndpointResolver, ServiceKind};
use crate::transport::Transport;
use bon::bon;
use std::sync::Arc;

pub struct Client {
    transport: Arc<dyn Transport>,
    endpoint_resolver: Arc<dyn EndpointResolver>,
    bucket: String,
    config: Config,
}

#[bon]
impl Client {
    /// `config`缺省时使用`Config::default()`
    #[builder(on(String, into))]
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint_resolver: Arc<dyn EndpointResolver>,
        bucket: String,
        config: Option<Config>,
    ) -> Self {
        Self {
            transport,
            endpoint_resolver,
            bucket,
            config: config.unwrap_or_default(),
        }
    }
}

impl Client {
    pub fn set_bucket(&mut self, bucket: &str) {
        bucket.clone_into(&mut self.bucket);
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn base_url(&self, kind: ServiceKind) -> String {
        self.endpoint_resolver.resolve(kind, self.config.use_https)
    }
}
