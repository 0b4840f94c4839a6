//! Command-line arguments.

use clap::Parser;

use otterfetch::config::{DEFAULT_CERT_PASSWORD, DEFAULT_EXTENSION, WHOLE_OBJECT_MAX_BYTES};

use crate::error::CliError;

/// Download a single object from an OTTER server.
#[derive(Parser, Debug)]
#[command(name = "otterfetch", version, about)]
pub struct Cli {
    /// UUID of the object to download (mandatory)
    #[arg(short = 'u', long = "object-id", value_name = "UUID")]
    pub object_id: Option<String>,

    /// Filename extension of the downloaded content
    #[arg(
        short = 'e',
        long = "extension",
        value_name = "EXT",
        default_value = DEFAULT_EXTENSION
    )]
    pub extension: String,

    /// Password for the certificate
    #[arg(
        short = 'p',
        long = "password",
        value_name = "PASSWORD",
        default_value = DEFAULT_CERT_PASSWORD
    )]
    pub password: String,

    /// Force file overwriting
    #[arg(short = 'f', long = "force")]
    pub force: bool,

    /// Expected object size in bytes; sizes up to 10 MiB are retrieved in
    /// one call instead of blockwise
    #[arg(short = 's', long = "size", value_name = "BYTES")]
    pub size: Option<String>,

    /// Proxy URL, e.g. http://proxy.example:3128
    #[arg(long = "proxy", value_name = "URL")]
    pub proxy: Option<String>,
}

/// Parses and bounds-checks the expected-size argument.
///
/// Accepted values lie in `(0, 10 MiB]`; everything else is rejected with
/// the invalid-size exit code.
pub fn parse_expected_size(raw: &str) -> Result<u64, CliError> {
    let size: u64 = raw
        .parse()
        .map_err(|_| CliError::InvalidSize(raw.to_string()))?;
    if size == 0 || size > WHOLE_OBJECT_MAX_BYTES {
        return Err(CliError::InvalidSize(raw.to_string()));
    }
    Ok(size)
}
