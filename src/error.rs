//! Error types for refnav operations.
//!
//! Document operations themselves never fail: a missing container or a
//! dangling fragment simply means nothing happens. Errors come from loading
//! configuration, compiling selectors and I/O at the edges.

use thiserror::Error;

/// Errors that can occur while configuring or running refnav.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
