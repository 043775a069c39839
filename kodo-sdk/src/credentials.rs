//! Credentials and CredentialsProvider definitions.
//!
//! 构建`HttpTransport`的时候需要传入实现了`CredentialsProvider`的类型。`load`是异步的，
//! 方便从远程（如密钥服务）按需获取；下载url的签名是纯计算，直接使用`Credentials`。
//!
//! # Example
//! ```no_run
//! use kodo_sdk::credentials::{Credentials, CredentialsError, CredentialsProvider};
//!
//! pub struct EnvCredsProvider;
//!
//! #[async_trait::async_trait]
//! impl CredentialsProvider for EnvCredsProvider {
//!     async fn load(&self) -> Result<Credentials, CredentialsError> {
//!         let ak = std::env::var("KODO_ACCESS_KEY")
//!             .map_err(|e| CredentialsError::Provider(e.to_string()))?;
//!         let sk = std::env::var("KODO_SECRET_KEY")
//!             .map_err(|e| CredentialsError::Provider(e.to_string()))?;
//!         Ok(Credentials::new(ak, sk))
//!     }
//! }
//! ```

#[derive(Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

// secret_key不能出现在日志里
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"******")
            .finish()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CredentialsError {
    #[error("failed to load credentials: {0}")]
    Provider(String),
}

#[async_trait::async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn load(&self) -> Result<Credentials, CredentialsError>;
}

/// 固定不变的AK/SK
pub struct StaticCredentialsProvider {
    creds: Credentials,
}

impl StaticCredentialsProvider {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            creds: Credentials::new(access_key, secret_key),
        }
    }
}

#[async_trait::async_trait]
impl CredentialsProvider for StaticCredentialsProvider {
    async fn load(&self) -> Result<Credentials, CredentialsError> {
        Ok(self.creds.clone())
    }
}
