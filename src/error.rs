use snafu::Snafu;
use std::{io, path::PathBuf};

#[derive(Debug, Snafu)]
pub enum VMetricsError {
    #[snafu(display("Invalid argument: {}", reason))]
    InvalidArgument { reason: String },

    /// A table the normalizer needs is not in the font. Callers treat
    /// this as "nothing to do" rather than as a failure.
    #[snafu(display("Font has no {} table", table))]
    MissingTable { table: String },

    #[snafu(display("Table {} has no {} field", table, field))]
    MissingField { table: String, field: String },

    #[snafu(display("Field {}.{} has unusable value {:?}", table, field, value))]
    MalformedField {
        table: String,
        field: String,
        value: String,
    },

    #[snafu(display("Error parsing font: {}", reason))]
    BadFont { reason: String },

    #[snafu(display("Error handling TTX XML: {}", reason))]
    Xml { reason: String },

    #[snafu(display("{} exited with {}: {}", program, status, stderr))]
    Compiler {
        program: String,
        status: String,
        stderr: String,
    },

    #[snafu(display("IO Error for file {}: {}", path.display(), source))]
    Io { source: io::Error, path: PathBuf },
}

pub type Result<T, E = VMetricsError> = std::result::Result<T, E>;
