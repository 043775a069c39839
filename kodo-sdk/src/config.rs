use serde::Deserialize;

/// 单次batch请求允许的最大操作数，由服务端限制
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;
/// 列举时每页的最大条目数
pub const DEFAULT_LIST_PAGE_SIZE: u32 = 1000;

/// 客户端配置，可以直接从toml等配置文件反序列化，缺省字段使用默认值
///
/// ```toml
/// use_https = true
/// max_batch_size = 500
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub use_https: bool,
    pub max_batch_size: usize,
    pub list_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_https: true,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
        }
    }
}

#[test]
fn config_default_test() {
    let conf: Config = serde_json::from_str(r#"{"max_batch_size": 3}"#).unwrap();
    assert_eq!(conf.max_batch_size, 3);
    assert!(conf.use_https);
    assert_eq!(conf.list_page_size, DEFAULT_LIST_PAGE_SIZE);
}
