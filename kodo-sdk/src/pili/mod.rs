//! 直播空间（hub）管理
//!
//! [API 文档](https://developer.qiniu.com/pili/2515/server-api-reference)

mod error;
pub mod stream;

pub use error::Error;

use crate::config::Config;
use crate::region::{EndpointResolver, ServiceKind};
use crate::transport::Transport;
use bon::bon;
use std::sync::Arc;

pub struct Client {
    transport: Arc<dyn Transport>,
    endpoint_resolver: Arc<dyn EndpointResolver>,
    hub: String,
    config: Config,
}

#[bon]
impl Client {
    #[builder(on(String, into))]
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint_resolver: Arc<dyn EndpointResolver>,
        hub: String,
        config: Option<Config>,
    ) -> Self {
        Self {
            transport,
            endpoint_resolver,
            hub,
            config: config.unwrap_or_default(),
        }
    }
}

impl Client {
    pub fn hub(&self) -> &str {
        &self.hub
    }

    pub(crate) fn base_url(&self) -> String {
        self.endpoint_resolver
            .resolve(ServiceKind::Pili, self.config.use_https)
    }

    pub(crate) fn streams_path(&self) -> String {
        format!("/v2/hubs/{}/streams", self.hub)
    }
}
