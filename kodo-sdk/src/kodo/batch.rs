//! 批量操作
//!
//! 服务端对单个batch请求的操作数有上限（`Config::max_batch_size`），`BatchSession`会把排队的操作
//! 按提交顺序切分成多个请求依次发送，再按原顺序拼回结果：
//!
//! - 结果数量总是等于操作数量，`operation_index`即提交时的下标
//! - 服务端对单个操作的失败（如文件不存在）只体现在该操作的`BatchResult`中
//! - 某个分片的请求整体失败时，该分片内的每个操作都记录为失败，之后的分片继续执行
//!
//! [API 文档](https://developer.qiniu.com/kodo/1250/batch)

use super::Client;
use super::utils::{encoded_entry, validate_bucket_name, validate_key};
use crate::kodo::Error;
use crate::region::ServiceKind;
use crate::transport::{HttpMethod, RequestBody, Transport, TransportError, TransportRequest};
use kodo_sdk_common::helper::urlsafe_base64;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Standard,
    /// 低频存储
    InfrequentAccess,
    /// 归档存储
    Archive,
    /// 深度归档存储
    DeepArchive,
}

impl StorageClass {
    fn as_u8(self) -> u8 {
        match self {
            StorageClass::Standard => 0,
            StorageClass::InfrequentAccess => 1,
            StorageClass::Archive => 2,
            StorageClass::DeepArchive => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub bucket: String,
    pub key: String,
}

impl Entry {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    fn encoded(&self) -> String {
        encoded_entry(&self.bucket, &self.key)
    }

    fn validate(&self) -> Result<(), Error> {
        validate_bucket_name(&self.bucket)?;
        validate_key(&self.key)
    }
}

/// 单个对象上的操作，入队后不可修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Stat(Entry),
    Delete(Entry),
    Copy { src: Entry, dest: Entry, force: bool },
    Move { src: Entry, dest: Entry, force: bool },
    /// 同一bucket内的移动
    Rename {
        entry: Entry,
        new_key: String,
        force: bool,
    },
    SetStorageClass { entry: Entry, class: StorageClass },
    ChangeMimeType { entry: Entry, mime_type: String },
    /// 禁用后对象无法被公开访问
    Disable(Entry),
    Enable(Entry),
}

impl Operation {
    /// 渲染为batch请求中的一条`op`
    pub fn command(&self) -> String {
        match self {
            Operation::Stat(e) => format!("/stat/{}", e.encoded()),
            Operation::Delete(e) => format!("/delete/{}", e.encoded()),
            Operation::Copy { src, dest, force } => {
                format!("/copy/{}/{}/force/{}", src.encoded(), dest.encoded(), force)
            }
            Operation::Move { src, dest, force } => {
                format!("/move/{}/{}/force/{}", src.encoded(), dest.encoded(), force)
            }
            Operation::Rename {
                entry,
                new_key,
                force,
            } => format!(
                "/move/{}/{}/force/{}",
                entry.encoded(),
                encoded_entry(&entry.bucket, new_key),
                force
            ),
            Operation::SetStorageClass { entry, class } => {
                format!("/chtype/{}/type/{}", entry.encoded(), class.as_u8())
            }
            Operation::ChangeMimeType { entry, mime_type } => format!(
                "/chgm/{}/mime/{}",
                entry.encoded(),
                urlsafe_base64(mime_type)
            ),
            Operation::Disable(e) => format!("/chstatus/{}/status/1", e.encoded()),
            Operation::Enable(e) => format!("/chstatus/{}/status/0", e.encoded()),
        }
    }

    fn validate(&self) -> Result<(), Error> {
        match self {
            Operation::Stat(e)
            | Operation::Delete(e)
            | Operation::Disable(e)
            | Operation::Enable(e)
            | Operation::SetStorageClass { entry: e, .. } => e.validate(),
            Operation::Copy { src, dest, .. } | Operation::Move { src, dest, .. } => {
                src.validate()?;
                dest.validate()
            }
            Operation::Rename { entry, new_key, .. } => {
                entry.validate()?;
                validate_key(new_key)
            }
            Operation::ChangeMimeType { entry, mime_type } => {
                entry.validate()?;
                if mime_type.trim().is_empty() {
                    return Err(Error::InvalidInput("mime type cannot be empty".to_owned()));
                }
                Ok(())
            }
        }
    }
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum BatchItemError {
    /// 服务端对该操作返回了非200的code
    #[error("operation failed with code {code}: {message}")]
    Server { code: u16, message: String },
    /// 操作所在的分片请求整体失败，同一分片内的操作共享这个错误
    #[error("batch request failed: {0}")]
    Transport(Arc<TransportError>),
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    /// 操作在提交顺序中的下标
    pub operation_index: usize,
    /// 服务端给出的单项code，分片请求失败时为`None`
    pub status_code: Option<u16>,
    /// 成功时为服务端返回的data，没有data时为`Value::Null`
    pub outcome: Result<Value, BatchItemError>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    fn transport_failure(operation_index: usize, err: Arc<TransportError>) -> Self {
        Self {
            operation_index,
            status_code: None,
            outcome: Err(BatchItemError::Transport(err)),
        }
    }
}

#[derive(Deserialize)]
struct ItemOutcome {
    code: u16,
    #[serde(default)]
    data: Value,
}

impl ItemOutcome {
    fn into_result(self, operation_index: usize) -> BatchResult {
        let outcome = if self.code == 200 {
            Ok(self.data)
        } else {
            let message = self
                .data
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            Err(BatchItemError::Server {
                code: self.code,
                message,
            })
        };
        BatchResult {
            operation_index,
            status_code: Some(self.code),
            outcome,
        }
    }
}

/// 一组排队的操作，调用`execute`时才会发出请求
///
/// ```no_run
/// # async fn run(client: &kodo_sdk::kodo::Client) -> Result<(), kodo_sdk::kodo::Error> {
/// let results = client
///     .batch()
///     .stat("a.txt")
///     .rename("b.txt", "c.txt", false)
///     .execute()
///     .await?;
/// assert_eq!(results.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct BatchSession<'a> {
    client: &'a Client,
    operations: Vec<Operation>,
}

impl<'a> BatchSession<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self {
            client,
            operations: Vec::new(),
        }
    }

    fn entry(&self, key: &str) -> Entry {
        Entry::new(self.client.bucket(), key)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn add(&mut self, op: Operation) -> &mut Self {
        self.operations.push(op);
        self
    }

    pub fn stat(&mut self, key: &str) -> &mut Self {
        let entry = self.entry(key);
        self.add(Operation::Stat(entry))
    }

    pub fn delete(&mut self, key: &str) -> &mut Self {
        let entry = self.entry(key);
        self.add(Operation::Delete(entry))
    }

    pub fn copy(&mut self, key: &str, dest_bucket: &str, dest_key: &str, force: bool) -> &mut Self {
        let src = self.entry(key);
        self.add(Operation::Copy {
            src,
            dest: Entry::new(dest_bucket, dest_key),
            force,
        })
    }

    pub fn move_to(
        &mut self,
        key: &str,
        dest_bucket: &str,
        dest_key: &str,
        force: bool,
    ) -> &mut Self {
        let src = self.entry(key);
        self.add(Operation::Move {
            src,
            dest: Entry::new(dest_bucket, dest_key),
            force,
        })
    }

    pub fn rename(&mut self, key: &str, new_key: &str, force: bool) -> &mut Self {
        let entry = self.entry(key);
        self.add(Operation::Rename {
            entry,
            new_key: new_key.to_owned(),
            force,
        })
    }

    pub fn set_storage_class(&mut self, key: &str, class: StorageClass) -> &mut Self {
        let entry = self.entry(key);
        self.add(Operation::SetStorageClass { entry, class })
    }

    pub fn change_mime_type(&mut self, key: &str, mime_type: &str) -> &mut Self {
        let entry = self.entry(key);
        self.add(Operation::ChangeMimeType {
            entry,
            mime_type: mime_type.to_owned(),
        })
    }

    pub fn disable(&mut self, key: &str) -> &mut Self {
        let entry = self.entry(key);
        self.add(Operation::Disable(entry))
    }

    pub fn enable(&mut self, key: &str) -> &mut Self {
        let entry = self.entry(key);
        self.add(Operation::Enable(entry))
    }

    /// 发送所有排队的操作，返回与提交顺序一致的结果。
    ///
    /// 只有参数错误时返回`Err`，此时不会发出任何请求，队列保持不变；
    /// 请求失败不会返回`Err`，需要检查每个`BatchResult`。执行后队列被清空。
    pub async fn execute(&mut self) -> Result<Vec<BatchResult>, Error> {
        let max_batch_size = self.client.config().max_batch_size;
        if max_batch_size == 0 {
            return Err(Error::InvalidInput(
                "max_batch_size must be greater than 0".to_owned(),
            ));
        }
        for (i, op) in self.operations.iter().enumerate() {
            if let Err(e) = op.validate() {
                let msg = match e {
                    Error::InvalidInput(msg) => msg,
                    other => other.to_string(),
                };
                return Err(Error::InvalidInput(format!("operation #{i}: {msg}")));
            }
        }

        let operations = std::mem::take(&mut self.operations);
        let commands = operations.iter().map(Operation::command).collect::<Vec<_>>();
        let base_url = self.client.base_url(ServiceKind::Rs);
        let transport = self.client.transport.as_ref();

        let mut results = Vec::with_capacity(commands.len());
        for (chunk_index, chunk) in commands.chunks(max_batch_size).enumerate() {
            let offset = chunk_index * max_batch_size;
            tracing::debug!(chunk_index, offset, size = chunk.len(), "sending batch chunk");

            match send_chunk(transport, &base_url, chunk).await {
                Ok(outcomes) => results.extend(
                    outcomes
                        .into_iter()
                        .enumerate()
                        .map(|(i, o)| o.into_result(offset + i)),
                ),
                Err(e) => {
                    tracing::warn!(
                        chunk_index,
                        size = chunk.len(),
                        error = %e,
                        "batch chunk failed, marking all its operations as failed"
                    );
                    let e = Arc::new(e);
                    results.extend(
                        (offset..offset + chunk.len())
                            .map(|i| BatchResult::transport_failure(i, e.clone())),
                    );
                }
            }
        }

        Ok(results)
    }
}

async fn send_chunk(
    transport: &dyn Transport,
    base_url: &str,
    commands: &[String],
) -> Result<Vec<ItemOutcome>, TransportError> {
    let form = commands
        .iter()
        .map(|c| ("op".to_owned(), c.clone()))
        .collect::<Vec<_>>();
    let req = TransportRequest::builder()
        .method(HttpMethod::Post)
        .base_url(base_url)
        .path("/batch")
        .body(RequestBody::Form(form))
        .build();

    let resp = transport.request(req).await?;
    let outcomes: Vec<ItemOutcome> = serde_json::from_value(resp.body)
        .map_err(|e| TransportError::Decode(format!("batch response: {e}")))?;
    // 数量对不上时无法确定对应关系，按整个分片失败处理
    if outcomes.len() != commands.len() {
        return Err(TransportError::Decode(format!(
            "batch response has {} entries, expected {}",
            outcomes.len(),
            commands.len()
        )));
    }
    Ok(outcomes)
}

impl Client {
    pub fn batch(&self) -> BatchSession<'_> {
        BatchSession::new(self)
    }
}
