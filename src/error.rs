//! Error types for TarangIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// TarangIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// GPIO access error
    #[error("GPIO error: {0}")]
    Gpio(#[from] rppal::gpio::Error),

    /// SPI access error
    #[error("SPI error: {0}")]
    Spi(#[from] rppal::spi::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Recording file error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Unknown pin backend name in configuration
    #[error("Unknown hardware backend: {0}")]
    UnknownBackend(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
