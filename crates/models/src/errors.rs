use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// A stored row does not have the shape of a provider record.
    #[error("decode error: {0}")]
    Decode(String),
    #[error("database error: {0}")]
    Db(String),
}
