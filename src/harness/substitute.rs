//! Scoped substitutions: function patches and module swaps.
//!
//! Both substitutions are guards. Acquiring one mutates the runtime; releasing it undoes the mutation.
//! `release` reports restoration failures to the caller. A guard dropped without being released (an
//! early return, an unwinding panic) restores in `Drop` and can only log what went wrong.
//!
//! A module swap follows this sequence, and its release undoes it in the same shape:
//!
//! 1. unregister the target name, keeping the original module object,
//! 2. import the replacement and register it under the target name,
//! 3. reload the owning test module so its imports rebind to the replacement.
//!
//! Modules the swap had to import (the replacement under its own name, an owner that was not loaded yet)
//! are unregistered again on release, so the registry ends up with the names it started with.

use std::fmt;
use std::sync::Arc;

use gradecase_core::{Fault, Value};

use crate::runtime::{Function, Member, Module, Registry, RegistryError};

use super::error::HarnessError;

/// Body of a delegating replacement: receives the original function and the call's arguments.
pub type DelegateFn = dyn Fn(&Function, &[Value]) -> Result<Value, Fault> + Send + Sync;

/// What calls through a patched name are routed to.
#[derive(Clone)]
pub enum Replacement {
    /// Called instead of the original.
    Function(Function),
    /// Called with the original, which it may invoke.
    Delegating(Arc<DelegateFn>),
}

impl Replacement {
    pub fn delegating(body: impl Fn(&Function, &[Value]) -> Result<Value, Fault> + Send + Sync + 'static) -> Self {
        Replacement::Delegating(Arc::new(body))
    }

    fn wrap(&self, original: &Function) -> Function {
        match self {
            Replacement::Function(replacement) => {
                let replacement = replacement.clone();
                Function::new(original.name(), move |args| replacement.call(args))
            }
            Replacement::Delegating(body) => {
                let body = Arc::clone(body);
                let inner = original.clone();
                Function::new(original.name(), move |args| body(&inner, args))
            }
        }
    }
}

impl From<Function> for Replacement {
    fn from(function: Function) -> Self {
        Replacement::Function(function)
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Function(function) => write!(f, "{function:?}"),
            Replacement::Delegating(_) => f.write_str("<delegating replacement>"),
        }
    }
}

/// Route calls through `target` (`<module path>.<name>`) to `replacement`.
#[derive(Clone, Debug)]
pub struct FunctionSubstitution {
    pub target: String,
    pub replacement: Replacement,
}

impl FunctionSubstitution {
    pub fn new(target: impl Into<String>, replacement: impl Into<Replacement>) -> Self {
        Self {
            target: target.into(),
            replacement: replacement.into(),
        }
    }
}

/// Register the module named `replacement` under the name `target`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleSubstitution {
    pub target: String,
    pub replacement: String,
}

impl ModuleSubstitution {
    pub fn new(target: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            replacement: replacement.into(),
        }
    }
}

/// The substitutions applied to one run. Either half may be absent; both may be present.
#[derive(Clone, Debug, Default)]
pub struct Substitution {
    pub function: Option<FunctionSubstitution>,
    pub module: Option<ModuleSubstitution>,
}

impl Substitution {
    /// No substitution at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_function(mut self, target: impl Into<String>, replacement: impl Into<Replacement>) -> Self {
        self.function = Some(FunctionSubstitution::new(target, replacement));
        self
    }

    pub fn with_module(mut self, target: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.module = Some(ModuleSubstitution::new(target, replacement));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.function.is_none() && self.module.is_none()
    }
}

/// A function binding replaced for the lifetime of the guard.
pub struct FunctionPatch {
    module: Arc<Module>,
    name: String,
    original: Member,
    released: bool,
}

impl FunctionPatch {
    pub fn apply(registry: &Registry, substitution: &FunctionSubstitution) -> Result<Self, HarnessError> {
        let (module, name) = registry.resolve_target(&substitution.target)?;
        let original = match module.get(&name) {
            Some(Member::Function(function)) => function,
            Some(other) => {
                return Err(RegistryError::NotCallable {
                    path: substitution.target.clone(),
                    kind: other.kind_name(),
                }
                .into());
            }
            None => {
                return Err(RegistryError::AttributeNotFound {
                    module: module.name().to_string(),
                    name,
                }
                .into());
            }
        };
        tracing::debug!(path = %substitution.target, replacement = ?substitution.replacement, "patching function");
        let wrapper = substitution.replacement.wrap(&original);
        module.set(name.as_str(), Member::Function(wrapper));
        Ok(Self {
            module,
            name,
            original: Member::Function(original),
            released: false,
        })
    }

    /// Put the original binding back.
    pub fn release(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        tracing::debug!(module = self.module.name(), name = %self.name, "restoring patched function");
        self.module.set(self.name.as_str(), self.original.clone());
    }
}

impl Drop for FunctionPatch {
    fn drop(&mut self) {
        self.restore();
    }
}

/// A module registration swapped for the lifetime of the guard.
pub struct ModuleSwap {
    registry: Registry,
    target: String,
    original: Arc<Module>,
    owner: String,
    /// Names imported by the swap itself, dropped again on release.
    imported: Vec<String>,
    released: bool,
}

impl ModuleSwap {
    /// Swap the registration and reload `owner` against the replacement.
    pub fn acquire(
        registry: &Registry,
        substitution: &ModuleSubstitution,
        owner: &str,
    ) -> Result<Self, HarnessError> {
        let target = substitution.target.as_str();
        let imported: Vec<String> = [substitution.replacement.as_str(), owner]
            .into_iter()
            .filter(|name| *name != target && !registry.is_loaded(name))
            .map(str::to_string)
            .collect();
        let original = registry
            .remove(target)
            .ok_or_else(|| RegistryError::NotRegistered { name: target.to_string() })?;
        let replacement = match registry.import(&substitution.replacement) {
            Ok(module) => module,
            Err(err) => {
                registry.insert(target, original);
                return Err(err.into());
            }
        };
        tracing::debug!(module = target, replacement = replacement.name(), owner, "swapping module");
        registry.insert(target, replacement);

        // From here on the guard owns restoration, including when the reload below fails.
        let swap = Self {
            registry: registry.clone(),
            target: target.to_string(),
            original,
            owner: owner.to_string(),
            imported,
            released: false,
        };
        registry.refresh(owner)?;
        Ok(swap)
    }

    /// Reinstate the original module and reload the owner against it.
    pub fn release(mut self) -> Result<(), HarnessError> {
        self.restore()
    }

    fn restore(&mut self) -> Result<(), HarnessError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        tracing::debug!(module = %self.target, owner = %self.owner, "restoring module");
        self.registry.remove(&self.target);
        self.registry.insert(self.target.as_str(), Arc::clone(&self.original));
        for name in &self.imported {
            self.registry.remove(name);
        }
        if !self.imported.contains(&self.owner) {
            self.registry.refresh(&self.owner)?;
        }
        Ok(())
    }
}

impl Drop for ModuleSwap {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            tracing::warn!(module = %self.target, owner = %self.owner, error = %err, "module restore failed");
        }
    }
}
