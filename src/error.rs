// This file is part of the untouch package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that terminate an invocation.
///
/// Every variant is reported once on stderr, followed by the usage text
/// and exit code 1. Nothing is retried and nothing is rolled back; the
/// source file, if any, is never modified.
#[derive(Debug, Error)]
pub enum UntouchError {
    #[error("missing arguments")]
    MissingArguments,

    #[error("arguments must not be empty")]
    EmptyArgument,

    #[error("datetime is undefined or invalid")]
    MissingTimeSource,

    #[error("file to update is undefined or does not exist")]
    MissingDestination,

    #[error("a source file and an explicit datetime cannot both be given")]
    AmbiguousTimeSource,

    /// The source file's timestamps could not be read.
    #[error("failed to get timestamps of '{}': {error}", .path.display())]
    GetTimestamps {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    /// The destination file's timestamps could not be written.
    #[error("failed to set timestamps of '{}': {error}", .path.display())]
    SetTimestamps {
        path: PathBuf,
        #[source]
        error: io::Error,
    },
}
