use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarapaceError {
    #[error("Invalid cell format: '{0}' (expected 2 letters + 2 digits, e.g. AB34)")]
    InvalidCellFormat(String),
    #[error("Invalid column '{0}': must be between AA and EP")]
    InvalidColumn(String),
    #[error("Invalid row '{0}': must be between 00 and 49")]
    InvalidRow(String),
    #[error("Invalid coordinate code: {0}")]
    InvalidCode(String),
    #[error("Invalid layer format: '{0}' (expected L followed by digits)")]
    InvalidLayerFormat(String),
    #[error("Incompatible coordinates: {0}")]
    IncompatibleCoordinates(String),
    #[error("Storage error: {0}")]
    StorageError(#[from] io::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}
