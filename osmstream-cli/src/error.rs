//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use osmstream::download::DownloadError;
use osmstream::pbf::DecodeError;
use osmstream::process::ProcessError;
use osmstream::resolver::FallbackError;
use osmstream::store::StoreError;
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// PBF file could not be opened or decoded
    Decode(DecodeError),
    /// A processing pass failed
    Process(ProcessError),
    /// Coordinate file error outside a pass
    Store(StoreError),
    /// PBF download failed
    Download(DownloadError),
    /// Fallback resolver could not be constructed
    Resolver(FallbackError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Store(StoreError::Format(_)) => {
                eprintln!();
                eprintln!("The coordinate file looks corrupt or was produced by an");
                eprintln!("incompatible version. Re-run the ingest to regenerate it.");
            }
            CliError::Process(ProcessError::Resolver { .. }) => {
                eprintln!();
                eprintln!("A node reference was missing from the coordinate file and the");
                eprintln!("OSM API fallback failed. Check network access, or re-run");
                eprintln!("against a PBF extract that contains all referenced nodes.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Decode(e) => write!(f, "Failed to read PBF: {}", e),
            CliError::Process(e) => write!(f, "Processing failed: {}", e),
            CliError::Store(e) => write!(f, "Coordinate store error: {}", e),
            CliError::Download(e) => write!(f, "Download failed: {}", e),
            CliError::Resolver(e) => write!(f, "Fallback resolver error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Decode(e) => Some(e),
            CliError::Process(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::Download(e) => Some(e),
            CliError::Resolver(e) => Some(e),
            CliError::LoggingInit(_) => None,
        }
    }
}

impl From<DecodeError> for CliError {
    fn from(e: DecodeError) -> Self {
        CliError::Decode(e)
    }
}

impl From<ProcessError> for CliError {
    fn from(e: ProcessError) -> Self {
        CliError::Process(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<DownloadError> for CliError {
    fn from(e: DownloadError) -> Self {
        CliError::Download(e)
    }
}

impl From<FallbackError> for CliError {
    fn from(e: FallbackError) -> Self {
        CliError::Resolver(e)
    }
}
