use std::fmt;

/// Failures raised by the kernel itself.
///
/// Everything except [`KernelError::TypeMismatch`] can occur while an
/// invocation is in flight and is converted into a reply by the dispatcher's
/// error mapping. `TypeMismatch` is only returned from
/// [`KernelBuilder::build`](crate::dispatcher::KernelBuilder::build).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// A configured component does not satisfy the contract it was named for
    TypeMismatch {
        /// What was being configured (`transformer`, `body format`, ...)
        component: &'static str,
        /// The value that could not be resolved
        found: String,
    },
    /// A response status code that is not an integer
    InvalidStatus(String),
    /// The dispatch configuration carries no callable action
    InvalidAction,
    /// A transformer left one of its extraction operations unimplemented
    NotImplemented {
        /// Name of the extraction operation
        operation: &'static str,
    },
    /// The action produced something other than a response or deferred response
    InvalidResult(&'static str),
    /// The event could not be converted into request data
    TransformFailure(String),
    /// A deferred value was dropped before it settled
    DeferredDropped,
    /// Middleware, the action, or a deferred computation panicked
    Panicked(String),
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::TypeMismatch { component, found } => {
                write!(
                    f,
                    "{component} provided to Kernel is not supported, it is: {found}"
                )
            }
            KernelError::InvalidStatus(found) => {
                write!(f, "Response code must be an integer, got: {found}")
            }
            KernelError::InvalidAction => {
                write!(f, "action provided to dispatcher must be a callable")
            }
            KernelError::NotImplemented { operation } => {
                write!(f, "{operation} must be implemented by the transformer")
            }
            KernelError::InvalidResult(message) => write!(f, "{message}"),
            KernelError::TransformFailure(message) => write!(f, "{message}"),
            KernelError::DeferredDropped => {
                write!(f, "deferred value dropped before settling")
            }
            KernelError::Panicked(message) => write!(f, "handler panicked: {message}"),
        }
    }
}

impl std::error::Error for KernelError {}

/// Message used when an action returns a value that is not a response.
pub const NOT_A_RESPONSE: &str = "controller methods must return a Response or a Promise";

/// Message used when a deferred value settles with something other than a response.
pub const DEFERRED_NOT_A_RESPONSE: &str =
    "Promises returned by controller methods must resolve to a Response";
