use std::any::Any;

use smallvec::SmallVec;

use crate::env::Env;
use crate::request::Request;

/// Maximum inline middleware per invocation before heap allocation
pub const MAX_INLINE_MIDDLEWARE: usize = 8;

/// The per-request value a middleware hands to the action
pub type ContextValue = Box<dyn Any + Send>;

/// Request-scoped middleware state.
///
/// The kernel obtains one instance per middleware per invocation, calls
/// [`create`](MiddlewareInstance::create) before the action runs and
/// [`destroy`](MiddlewareInstance::destroy) exactly once afterwards, even if
/// `create` failed or was never reached.
pub trait MiddlewareInstance: Send {
    /// Produce the value passed to the action. May acquire resources.
    fn create(&mut self, req: &Request, env: &Env) -> anyhow::Result<ContextValue>;

    /// Release whatever `create` acquired.
    fn destroy(&mut self) {}
}

/// Long-lived middleware registered on a kernel or a dispatch configuration.
///
/// Holds configuration only; all request state lives in the instance it
/// builds for each invocation.
pub trait Middleware: Send + Sync {
    fn instance(&self) -> Box<dyn MiddlewareInstance>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F, I> Middleware for F
where
    F: Fn() -> I + Send + Sync,
    I: MiddlewareInstance + 'static,
{
    fn instance(&self) -> Box<dyn MiddlewareInstance> {
        Box::new(self())
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<I>()
    }
}

/// Context values produced by middleware, in middleware order.
///
/// Position `i` holds the value of the `i`-th middleware (configured
/// middleware first, then per-call middleware).
#[derive(Default)]
pub struct MiddlewareValues {
    values: SmallVec<[Option<ContextValue>; MAX_INLINE_MIDDLEWARE]>,
}

impl MiddlewareValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, value: ContextValue) {
        self.values.push(Some(value));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the value at `idx` if it is a `T` and has not been taken
    #[must_use]
    pub fn get<T: Any>(&self, idx: usize) -> Option<&T> {
        self.values
            .get(idx)
            .and_then(Option::as_ref)
            .and_then(|v| v.downcast_ref::<T>())
    }

    #[must_use]
    pub fn get_mut<T: Any>(&mut self, idx: usize) -> Option<&mut T> {
        self.values
            .get_mut(idx)
            .and_then(Option::as_mut)
            .and_then(|v| v.downcast_mut::<T>())
    }

    /// Move the value at `idx` out; a value of another type is left in place
    pub fn take<T: Any>(&mut self, idx: usize) -> Option<T> {
        let slot = self.values.get_mut(idx)?;
        let value = slot.take()?;
        match value.downcast::<T>() {
            Ok(v) => Some(*v),
            Err(other) => {
                *slot = Some(other);
                None
            }
        }
    }
}

impl std::fmt::Debug for MiddlewareValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareValues")
            .field("len", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_access_by_position() {
        let mut values = MiddlewareValues::new();
        values.push(Box::new(7_u32));
        values.push(Box::new(String::from("db")));

        assert_eq!(values.len(), 2);
        assert_eq!(values.get::<u32>(0), Some(&7));
        assert_eq!(values.get::<u32>(1), None);
        assert_eq!(values.get::<String>(1).map(String::as_str), Some("db"));
        assert_eq!(values.get::<u32>(5), None);
    }

    #[test]
    fn take_moves_out_once() {
        let mut values = MiddlewareValues::new();
        values.push(Box::new(String::from("conn")));

        assert_eq!(values.take::<u32>(0), None);
        assert_eq!(values.take::<String>(0), Some("conn".to_string()));
        assert_eq!(values.take::<String>(0), None);
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn get_mut_allows_in_place_updates() {
        let mut values = MiddlewareValues::new();
        values.push(Box::new(vec![1, 2]));
        if let Some(v) = values.get_mut::<Vec<i32>>(0) {
            v.push(3);
        }
        assert_eq!(values.get::<Vec<i32>>(0), Some(&vec![1, 2, 3]));
    }
}
