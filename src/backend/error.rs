use std::fmt;

/// Raised when an adapter cannot reach its backing store at all - a dead
/// connection, a DNS failure, an auth rejection before a query is even sent
/// (§4.1, §7 `connection` kind). Unlike [`ExecutionError`] this is never the
/// query's fault.
#[derive(Debug)]
pub struct ConnectionError(pub String);

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ConnectionError {}

/// Raised when the backend rejects a rendered query or returns malformed
/// data, or when a post-processing transformation fails (§4.1, §4.8, §7
/// `execution` kind).
#[derive(Debug)]
pub struct ExecutionError(pub String);

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ExecutionError {}

/// What [`super::Adapter::execute`] can fail with.
#[derive(Debug)]
pub enum AdapterError {
    Connection(ConnectionError),
    Execution(ExecutionError),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::Connection(e) => write!(f, "{e}"),
            AdapterError::Execution(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AdapterError {}

impl From<ConnectionError> for AdapterError {
    fn from(item: ConnectionError) -> Self {
        AdapterError::Connection(item)
    }
}

impl From<ExecutionError> for AdapterError {
    fn from(item: ExecutionError) -> Self {
        AdapterError::Execution(item)
    }
}
