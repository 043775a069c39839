//! 基于marker的分页列举
//!
//! 列举接口每次返回`{items, marker}`，`PaginatedLister`把它变成一个按需拉取的序列：
//! 只有在当前页的条目被消费完后才会请求下一页。
//!
//! - 返回的页为空时结束（即使还带有marker）
//! - 返回的marker为空或不存在时，当前页消费完后结束
//! - 设置了`limit`时，产出`limit`个条目后立即结束，不会再请求下一页
//! - 请求失败时返回错误并结束，不会重试
//!
//! lister只能遍历一次。需要从某个位置继续时，用`marker()`得到的值构造一个新的lister。

use crate::transport::{HttpMethod, Transport, TransportError, TransportRequest};
use async_stream::stream;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio_stream::Stream;

/// 列举的起始位置和过滤条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursor {
    /// 服务端返回的不透明值，原样传回
    pub marker: Option<String>,
    /// 空字符串等同于不过滤
    pub prefix: Option<String>,
    /// 最多返回的条目数，`<= 0`表示不限制
    pub limit: Option<i64>,
}

impl PageCursor {
    fn normalized_limit(&self) -> Option<usize> {
        self.limit
            .filter(|l| *l > 0)
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
    }

    fn normalized_prefix(&self) -> Option<String> {
        self.prefix.clone().filter(|p| !p.is_empty())
    }
}

/// 列举请求的模板，每一页都使用相同的路径和固定参数
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub base_url: String,
    pub path: String,
    /// 每页都会带上的固定参数，例如`bucket`
    pub query: Vec<(String, String)>,
    /// 每页的条目上限
    pub page_size: Option<u32>,
}

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    marker: Option<String>,
}

pub struct PaginatedLister<T> {
    transport: Arc<dyn Transport>,
    request: ListRequest,
    prefix: Option<String>,
    marker: Option<String>,
    remaining: Option<usize>,
    buffer: VecDeque<T>,
    exhausted: bool,
}

impl<T> std::fmt::Debug for PaginatedLister<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedLister")
            .field("request", &self.request)
            .field("prefix", &self.prefix)
            .field("marker", &self.marker)
            .field("remaining", &self.remaining)
            .field("buffered", &self.buffer.len())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

impl<T: DeserializeOwned + Send> PaginatedLister<T> {
    pub fn new(transport: Arc<dyn Transport>, request: ListRequest, cursor: PageCursor) -> Self {
        Self {
            transport,
            prefix: cursor.normalized_prefix(),
            remaining: cursor.normalized_limit(),
            marker: cursor.marker.filter(|m| !m.is_empty()),
            request,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// 服务端最近一次返回的marker，即下一页的起始位置。
    ///
    /// 注意它指向已拉取页之后的位置，当前页还在缓冲中未消费的条目不包含在内。
    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    /// 拉取下一个条目，`None`表示结束。返回错误后序列也随之结束。
    pub async fn next(&mut self) -> Option<Result<T, TransportError>> {
        loop {
            if self.remaining == Some(0) {
                return None;
            }

            if let Some(item) = self.buffer.pop_front() {
                if let Some(r) = self.remaining.as_mut() {
                    *r -= 1;
                }
                return Some(Ok(item));
            }

            if self.exhausted {
                return None;
            }

            tracing::debug!(path = %self.request.path, marker = ?self.marker, "fetching list page");
            let req = self.page_request();
            match Self::fetch_page(self.transport.as_ref(), req).await {
                Ok(page) => {
                    if page.items.is_empty() {
                        self.exhausted = true;
                        return None;
                    }
                    self.marker = page.marker.filter(|m| !m.is_empty());
                    if self.marker.is_none() {
                        self.exhausted = true;
                    }
                    self.buffer.extend(page.items);
                }
                Err(e) => {
                    tracing::warn!(path = %self.request.path, error = %e, "list page request failed");
                    self.exhausted = true;
                    return Some(Err(e));
                }
            }
        }
    }

    fn page_query(&self) -> Vec<(String, String)> {
        let mut query = self.request.query.clone();
        if let Some(marker) = &self.marker {
            query.push(("marker".to_owned(), marker.clone()));
        }
        if let Some(prefix) = &self.prefix {
            query.push(("prefix".to_owned(), prefix.clone()));
        }
        let page_size = self.request.page_size.filter(|s| *s > 0).map(|s| s as usize);
        let limit = match (page_size, self.remaining) {
            (Some(s), Some(r)) => Some(s.min(r)),
            (s, r) => s.or(r),
        };
        if let Some(limit) = limit {
            query.push(("limit".to_owned(), limit.to_string()));
        }
        query
    }

    fn page_request(&self) -> TransportRequest {
        TransportRequest::builder()
            .method(HttpMethod::Get)
            .base_url(self.request.base_url.clone())
            .path(self.request.path.clone())
            .query(self.page_query())
            .build()
    }

    // 跨await只借用transport
    async fn fetch_page(
        transport: &dyn Transport,
        req: TransportRequest,
    ) -> Result<Page<T>, TransportError> {
        let resp = transport.request(req).await?;
        serde_json::from_value(resp.body)
            .map_err(|e| TransportError::Decode(format!("list page: {e}")))
    }

    /// 拉取全部条目，遇到错误立即返回
    pub async fn collect_all(mut self) -> Result<Vec<T>, TransportError> {
        let mut res = Vec::new();
        while let Some(item) = self.next().await {
            res.push(item?);
        }
        Ok(res)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<T, TransportError>> + Send + Unpin
    where
        T: 'static,
    {
        let mut lister = self;
        let s = stream! {
            while let Some(item) = lister.next().await {
                yield item;
            }
        };
        Box::pin(s)
    }
}
