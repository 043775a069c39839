#![allow(dead_code)]

//! 记录请求并按handler返回响应的Transport

use kodo_sdk::transport::{
    RequestBody, Transport, TransportError, TransportRequest, TransportResponse,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

type Handler =
    Box<dyn Fn(usize, &TransportRequest) -> Result<TransportResponse, TransportError> + Send + Sync>;

pub struct MockTransport {
    handler: Handler,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    /// handler的第一个参数为请求序号（从0开始）
    pub fn new(
        handler: impl Fn(usize, &TransportRequest) -> Result<TransportResponse, TransportError>
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// 依次返回给定的json body
    pub fn with_bodies(bodies: Vec<Value>) -> Arc<Self> {
        Self::new(move |i, _| match bodies.get(i) {
            Some(body) => Ok(ok(body.clone())),
            None => Err(TransportError::Common(format!("unexpected request #{i}"))),
        })
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn request(&self, req: TransportRequest) -> Result<TransportResponse, TransportError> {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(req.clone());
            requests.len() - 1
        };
        (self.handler)(index, &req)
    }
}

pub fn ok(body: Value) -> TransportResponse {
    TransportResponse { status: 200, body }
}

/// batch请求中的所有op
pub fn form_ops(req: &TransportRequest) -> Vec<String> {
    match &req.body {
        RequestBody::Form(pairs) => pairs
            .iter()
            .filter(|(k, _)| k == "op")
            .map(|(_, v)| v.clone())
            .collect(),
        other => panic!("expected form body, got {other:?}"),
    }
}

pub fn query_value<'a>(req: &'a TransportRequest, key: &str) -> Option<&'a str> {
    req.query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
