use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn invalid_data(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidData {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn unexpected_eof(element: impl Into<String>) -> Error {
        Error::invalid_data(element, "unexpected end of stream")
    }

    pub fn checksum_mismatch(element: impl Into<String>) -> Error {
        Error(
            ErrorKind::ChecksumMismatch {
                element: element.into(),
            }
            .into(),
        )
    }

    pub fn out_of_range(
        name: impl Into<String>,
        value: impl ToString,
        target: impl Into<String>,
    ) -> Error {
        Error(
            ErrorKind::OutOfRange {
                name: name.into(),
                value: value.to_string(),
                target: target.into(),
            }
            .into(),
        )
    }

    pub fn unsupported_type(name: impl Into<String>) -> Error {
        Error(ErrorKind::UnsupportedType { name: name.into() }.into())
    }

    pub fn timed_out(operation: impl Into<String>, millis: u64) -> Error {
        Error(
            ErrorKind::TimedOut {
                operation: operation.into(),
                millis,
            }
            .into(),
        )
    }

    pub fn interrupted(operation: impl Into<String>) -> Error {
        Error(
            ErrorKind::Interrupted {
                operation: operation.into(),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    /// Wraps this error with higher-level context (e.g. row/column position),
    /// preserving the original as the source.
    pub fn with_context(self, context: impl Into<String>) -> Error {
        Error(
            ErrorKind::Context {
                context: context.into(),
                source: self,
            }
            .into(),
        )
    }

    /// Returns `true` for failures that invalidate the whole stream (corrupt
    /// or truncated input), as opposed to per-value range violations.
    pub fn is_fatal(&self) -> bool {
        match self.kind() {
            ErrorKind::InvalidData { .. }
            | ErrorKind::ChecksumMismatch { .. }
            | ErrorKind::UnsupportedType { .. }
            | ErrorKind::Io { .. } => true,
            ErrorKind::Context { source, .. } => source.is_fatal(),
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("malformed data in '{element}': {message}")]
    InvalidData { element: String, message: String },

    #[error("checksum mismatch for '{element}'")]
    ChecksumMismatch { element: String },

    #[error("value {value} of {name} does not fit in {target}")]
    OutOfRange {
        name: String,
        value: String,
        target: String,
    },

    #[error("unsupported type '{name}'")]
    UnsupportedType { name: String },

    #[error("{operation} timed out after {millis} ms")]
    TimedOut { operation: String, millis: u64 },

    #[error("{operation} interrupted: the other side of the stream is gone")]
    Interrupted { operation: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::unexpected_eof("stream")
        } else {
            Error::io("", e)
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        let kind = match e.kind() {
            ErrorKind::Io { source, .. } => source.kind(),
            ErrorKind::TimedOut { .. } => std::io::ErrorKind::TimedOut,
            ErrorKind::Interrupted { .. } => std::io::ErrorKind::BrokenPipe,
            ErrorKind::InvalidData { .. } | ErrorKind::ChecksumMismatch { .. } => {
                std::io::ErrorKind::InvalidData
            }
            _ => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, e)
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(_: std::convert::Infallible) -> Self {
        Error::invalid_operation("conversion")
    }
}
