use crate::kodo::Error;
use crate::transport::{Transport, TransportRequest};
use kodo_sdk_common::helper::urlsafe_base64;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;

// 只保留RFC 3986中的unreserved字符，`/`、`?`、`#`、空格等全部转义
pub(crate) const STRICT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub(crate) fn escape_strict(s: &str) -> String {
    utf8_percent_encode(s, STRICT_ENCODE_SET).to_string()
}

/// `urlsafe_base64("<bucket>:<key>")`
pub(crate) fn encoded_entry(bucket: &str, key: &str) -> String {
    urlsafe_base64(format!("{bucket}:{key}"))
}

/// key最长750字节
pub(crate) const MAX_KEY_LEN: usize = 750;

pub(crate) fn validate_bucket_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::InvalidInput("bucket name cannot be empty".to_owned()));
    }
    if name.len() > 63 {
        return Err(Error::InvalidInput(
            "bucket name is too long, max is 63 bytes".to_owned(),
        ));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(Error::InvalidInput(format!(
            "bucket name `{name}` contains invalid characters"
        )));
    }
    Ok(())
}

pub(crate) fn validate_key(key: &str) -> Result<(), Error> {
    if key.is_empty() {
        return Err(Error::InvalidInput("key cannot be empty".to_owned()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(Error::InvalidInput(format!(
            "key is too long, max is {MAX_KEY_LEN} bytes"
        )));
    }
    if key.bytes().any(|b| b == b'\r' || b == b'\n') {
        return Err(Error::InvalidInput(
            "key cannot contain control characters".to_owned(),
        ));
    }
    Ok(())
}

pub(crate) async fn send_json<T: DeserializeOwned>(
    transport: &dyn Transport,
    req: TransportRequest,
) -> Result<T, Error> {
    let resp = transport.request(req).await?;
    serde_json::from_value(resp.body)
        .map_err(|e| Error::Common(format!("JSON parse error: {}", e)))
}
