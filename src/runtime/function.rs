//! Runtime functions: named, shareable callables over [`Value`]s.

use std::fmt;
use std::sync::Arc;

use gradecase_core::{Fault, Value};

use super::panic;

/// Body of a runtime function.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, Fault> + Send + Sync;

/// A named callable. Cloning shares the body.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    body: Arc<NativeFn>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(&[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: Arc::from(name.into()),
            body: Arc::new(body),
        }
    }

    /// Wrap a zero-argument body whose result is discarded, the shape of a test function.
    pub fn nullary(name: impl Into<String>, body: impl Fn() -> Result<(), Fault> + Send + Sync + 'static) -> Self {
        Self::new(name, move |_| body().map(|()| Value::None))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The same body under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            body: Arc::clone(&self.body),
        }
    }

    /// Whether both handles share one body.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }

    /// Call the function.
    ///
    /// A panic inside the body is converted into a fault. Every fault leaving the call carries this
    /// function's name as a frame.
    pub fn call(&self, args: &[Value]) -> Result<Value, Fault> {
        match panic::catch(|| (self.body)(args)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(fault)) | Err(fault) => Err(fault.with_frame(self.name())),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name)
    }
}

/// Fetch positional argument `index` or raise a `TypeError` naming `function`.
pub fn arg<'a>(function: &str, args: &'a [Value], index: usize) -> Result<&'a Value, Fault> {
    args.get(index).ok_or_else(|| {
        Fault::type_error(format!(
            "{function}() missing required positional argument {}",
            index + 1
        ))
    })
}
