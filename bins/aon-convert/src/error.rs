use aon_api::CodecError;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Codec(#[from] CodecError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
