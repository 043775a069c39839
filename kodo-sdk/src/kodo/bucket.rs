//! bucket内对象的列举和单个对象的管理
//!
//! [API 文档](https://developer.qiniu.com/kodo/3939/overview-of-the-api)

use super::Client;
use super::utils::{encoded_entry, send_json, validate_bucket_name, validate_key};
use crate::kodo::Error;
use crate::list::{ListRequest, PageCursor, PaginatedLister};
use crate::region::ServiceKind;
use crate::transport::{HttpMethod, TransportRequest};
use bon::Builder;
use serde::Deserialize;

// region:    --- list objects
#[derive(Builder)]
pub struct ListObjects<'a> {
    #[builder(start_fn)]
    pub(crate) client: &'a Client,
    prefix: Option<&'a str>,
    /// 从上一次列举返回的marker处继续
    marker: Option<&'a str>,
    /// 最多返回的对象数，`<= 0`表示不限制
    limit: Option<i64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectItem {
    pub key: String,
    pub hash: String,
    pub fsize: u64,
    pub mime_type: String,
    /// 单位为100纳秒
    pub put_time: i64,
    /// 存储类型：0标准、1低频、2归档、3深度归档
    #[serde(rename = "type", default)]
    pub storage_type: u8,
    /// 0启用、1禁用
    #[serde(default)]
    pub status: u8,
    pub end_user: Option<String>,
}

impl ListObjects<'_> {
    pub fn lister(&self) -> PaginatedLister<ObjectItem> {
        let client = self.client;
        let request = ListRequest {
            base_url: client.base_url(ServiceKind::Rsf),
            path: "/list".to_owned(),
            query: vec![("bucket".to_owned(), client.bucket.clone())],
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
// endregion: --- list objects

// region:    --- stat / delete
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStat {
    pub fsize: u64,
    pub hash: String,
    pub mime_type: String,
    pub put_time: i64,
    #[serde(rename = "type", default)]
    pub storage_type: u8,
    #[serde(default)]
    pub status: u8,
    pub md5: Option<String>,
}

impl Client {
    pub async fn stat_object(&self, key: &str) -> Result<ObjectStat, Error> {
        validate_bucket_name(&self.bucket)?;
        validate_key(key)?;

        let req = TransportRequest::builder()
            .method(HttpMethod::Get)
            .base_url(self.base_url(ServiceKind::Rs))
            .path(format!("/stat/{}", encoded_entry(&self.bucket, key)))
            .build();
        send_json(self.transport.as_ref(), req).await
    }

    pub async fn delete_object(&self, key: &str) -> Result<(), Error> {
        validate_bucket_name(&self.bucket)?;
        validate_key(key)?;

        let req = TransportRequest::builder()
            .method(HttpMethod::Post)
            .base_url(self.base_url(ServiceKind::Rs))
            .path(format!("/delete/{}", encoded_entry(&self.bucket, key)))
            .build();
        self.transport.request(req).await?;
        Ok(())
    }
}
// endregion: --- stat / delete

// region:    --- buckets / domains
impl Client {
    /// 当前账号下的所有bucket名称
    pub async fn buckets(&self) -> Result<Vec<String>, Error> {
        let req = TransportRequest::builder()
            .method(HttpMethod::Get)
            .base_url(self.base_url(ServiceKind::Uc))
            .path("/buckets")
            .build();
        send_json(self.transport.as_ref(), req).await
    }

    /// 绑定在当前bucket上的下载域名
    pub async fn domains(&self) -> Result<Vec<String>, Error> {
        validate_bucket_name(&self.bucket)?;

        let req = TransportRequest::builder()
            .method(HttpMethod::Get)
            .base_url(self.base_url(ServiceKind::Api))
            .path("/v6/domain/list")
            .query(vec![("tbl".to_owned(), self.bucket.clone())])
            .build();
        send_json(self.transport.as_ref(), req).await
    }
}
// endregion: --- buckets / domains

impl Client {
    pub fn list_objects(&self) -> ListObjectsBuilder<'_> {
        ListObjects::builder(self)
    }
}
