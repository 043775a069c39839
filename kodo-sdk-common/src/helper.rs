use crate::Error;
use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use sha1::Sha1;
use std::collections::HashMap;

/// URL安全的base64编码（`+`->`-`，`/`->`_`，保留`=`填充）
pub fn urlsafe_base64(bytes: impl AsRef<[u8]>) -> String {
    general_purpose::URL_SAFE.encode(bytes)
}

/// header名或值不合法时返回错误，不会panic
pub fn into_header_map(map: &HashMap<String, String>) -> Result<HeaderMap, Error> {
    map.iter()
        .map(|(k, v)| {
            let name = HeaderName::from_bytes(k.as_bytes())
                .map_err(|e| Error::Common(format!("invalid header name `{k}`: {e}")))?;
            let value = HeaderValue::from_str(v)
                .map_err(|e| Error::Common(format!("invalid header value for `{k}`: {e}")))?;
            Ok((name, value))
        })
        .collect()
}

pub fn sign_hmac_sha1(secret: &[u8], str_to_sign: &[u8]) -> Vec<u8> {
    type HmacSha1 = Hmac<Sha1>;
    // hmac接受任意长度的key，这里不会失败
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(str_to_sign);
    mac.finalize().into_bytes().to_vec()
}

pub async fn into_request_failed_error(resp: reqwest::Response) -> Error {
    let status = resp.status();
    let body = resp.text().await;
    match body {
        Ok(message) => Error::RequestAPIFailed {
            status: status.to_string(),
            message,
        },
        Err(e) => Error::Reqwest(e),
    }
}
