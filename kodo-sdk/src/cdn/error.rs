#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// 调用参数错误
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
