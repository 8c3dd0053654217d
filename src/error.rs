use std::ffi::NulError;
use std::fmt::Display;
use std::fmt::Formatter;

use config::ConfigError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Internal(String),
    Value(String),
    /// Reported by the database engine, message as the engine wrote it.
    Engine(String),
    /// The driver connection was closed before the call.
    ConnectionClosed,
    /// Umbrella for every error the driver API itself rejects with.
    Api(Box<Error>),
    ScalarUdfCreate(Box<Error>),
    ScalarUdfCreateSet(Box<Error>),
    ScalarUdfAddToSet(Box<Error>),
    ScalarUdf(UdfCause),
    /// A scalar UDF failed while executing a batch.
    Execution(String),
}

/// Structural reasons a scalar UDF registration is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UdfCause {
    IsNil,
    NoName,
    NilInputTypes,
    EmptyInputTypes,
    InputTypeIsNil,
    ResultTypeIsNil,
    ResultTypeIsAny,
    DuplicateName(String),
    HandleInUse,
    SetTooSmall(usize),
}

impl Error {
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    pub fn value(msg: impl Into<String>) -> Self {
        Error::Value(msg.into())
    }

    /// Maps an engine error message back to the bridge error that caused
    /// it. A batch aborted by a scalar UDF carries the rendered
    /// `API -> execution` error inside the engine's message.
    pub fn engine(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let marker = Error::api(Error::execution("")).to_string();
        match msg.find(&marker) {
            Some(pos) => Error::api(Error::execution(msg[pos + marker.len()..].trim_end())),
            None => Error::Engine(msg),
        }
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Error::Execution(msg.into())
    }

    pub fn api(err: Error) -> Self {
        Error::Api(Box::new(err))
    }

    /// `API -> create scalar UDF -> cause`
    pub fn udf_create(cause: UdfCause) -> Self {
        Error::api(Error::ScalarUdfCreate(Box::new(Error::ScalarUdf(cause))))
    }

    /// `API -> create scalar UDF set -> cause`
    pub fn udf_create_set(cause: UdfCause) -> Self {
        Error::api(Error::ScalarUdfCreateSet(Box::new(Error::ScalarUdf(cause))))
    }

    /// Walks the error and all of its wrapped causes, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |err| err.inner())
    }

    /// Returns the innermost cause.
    pub fn root_cause(&self) -> &Error {
        self.chain().last().unwrap_or(self)
    }

    fn inner(&self) -> Option<&Error> {
        match self {
            Error::Api(err)
            | Error::ScalarUdfCreate(err)
            | Error::ScalarUdfCreateSet(err)
            | Error::ScalarUdfAddToSet(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl Display for UdfCause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UdfCause::IsNil => f.write_str("scalar UDF is nil"),
            UdfCause::NoName => f.write_str("missing scalar UDF name"),
            UdfCause::NilInputTypes => f.write_str("input types are nil"),
            UdfCause::EmptyInputTypes => f.write_str("input types are empty"),
            UdfCause::InputTypeIsNil => f.write_str("input type is nil"),
            UdfCause::ResultTypeIsNil => f.write_str("result type is nil"),
            UdfCause::ResultTypeIsAny => f.write_str("result type cannot be ANY"),
            UdfCause::DuplicateName(name) => {
                write!(f, "scalar function with name {} already exists", name)
            }
            UdfCause::HandleInUse => f.write_str("scalar UDF handle is already registered"),
            UdfCause::SetTooSmall(n) => {
                write!(f, "scalar UDF set needs at least 2 functions, got {}", n)
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Internal(s) | Error::Value(s) | Error::Engine(s) => write!(f, "{}", s),
            Error::ConnectionClosed => f.write_str("connection is already closed"),
            Error::Api(err) => write!(f, "API error: {}", err),
            Error::ScalarUdfCreate(err) => write!(f, "could not create scalar UDF: {}", err),
            Error::ScalarUdfCreateSet(err) => {
                write!(f, "could not create scalar UDF set: {}", err)
            }
            Error::ScalarUdfAddToSet(err) => {
                write!(f, "could not add the function to the set: {}", err)
            }
            Error::ScalarUdf(cause) => write!(f, "{}", cause),
            Error::Execution(s) => write!(f, "scalar UDF execution failed: {}", s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner().map(|err| err as &(dyn std::error::Error + 'static))
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<NulError> for Error {
    fn from(err: NulError) -> Self {
        Error::Value(err.to_string())
    }
}

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Error::engine(err.to_string())
    }
}

#[macro_export]
macro_rules! value_err {
    ($($arg:tt)*) => {
        $crate::error::Error::Value(format!($($arg)*))
    };
}
