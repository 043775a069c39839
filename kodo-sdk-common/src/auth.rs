//! 管理凭证与下载凭证的签名计算
//!
//! - 下载凭证：`<AccessKey>:<urlsafe_base64(hmac_sha1(SecretKey, data))>`
//! - 管理凭证：`Qiniu <AccessKey>:<urlsafe_base64(hmac_sha1(SecretKey, signing_str))>`

use crate::helper::{sign_hmac_sha1, urlsafe_base64};

/// 返回`<access_key>:<encoded_sign>`
pub fn sign_data(access_key: &str, secret_key: &str, data: &[u8]) -> String {
    let sign = sign_hmac_sha1(secret_key.as_bytes(), data);
    format!("{}:{}", access_key, urlsafe_base64(sign))
}

pub struct ManagementSignParams<'a> {
    pub method: &'a str,
    /// 以`/`开头，不含query
    pub path: &'a str,
    /// 已编码的query，不含`?`
    pub query: Option<&'a str>,
    pub host: &'a str,
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
}

// 待签名字符串：
// <Method> <Path>[?<Query>]\nHost: <Host>\n[Content-Type: <ct>\n]\n[<Body>]
// body只有在content-type存在且不为application/octet-stream时才参与签名
fn management_signing_str(params: &ManagementSignParams<'_>) -> Vec<u8> {
    let mut s = format!("{} {}", params.method, params.path);
    if let Some(q) = params.query.filter(|q| !q.is_empty()) {
        s.push('?');
        s.push_str(q);
    }
    s.push_str(&format!("\nHost: {}", params.host));
    if let Some(ct) = params.content_type {
        s.push_str(&format!("\nContent-Type: {}", ct));
    }
    s.push_str("\n\n");

    let mut data = s.into_bytes();
    let sign_body = params
        .content_type
        .is_some_and(|ct| ct != "application/octet-stream");
    if sign_body && !params.body.is_empty() {
        data.extend_from_slice(params.body);
    }
    data
}

/// 生成Authorization头的值
pub fn management_token(
    access_key: &str,
    secret_key: &str,
    params: &ManagementSignParams<'_>,
) -> String {
    let data = management_signing_str(params);
    format!("Qiniu {}", sign_data(access_key, secret_key, &data))
}
