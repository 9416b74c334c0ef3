use tch::TchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RustBeamError {
    #[error("IO error: {0}")]
    IOError(String),

    #[error("Tch tensor error: {0}")]
    TchError(String),

    #[error("Value error: {0}")]
    ValueError(String),
}

impl From<std::io::Error> for RustBeamError {
    fn from(error: std::io::Error) -> Self {
        RustBeamError::IOError(error.to_string())
    }
}

impl From<TchError> for RustBeamError {
    fn from(error: TchError) -> Self {
        RustBeamError::TchError(error.to_string())
    }
}
