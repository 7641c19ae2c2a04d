//! The module registry: definitions that can be loaded, and the table of loaded modules.
//!
//! The *loaded* table is the process-wide registration every `import` consults. Module substitution
//! works by editing that table and reloading the modules that import from it.
//!
//! ## Notes
//!
//! - A module is registered before its loader runs, so loaders that import each other terminate. If the
//!   loader faults (or panics) the registration is rolled back.
//! - `reload` re-runs the definition for the module's *own* name into the same module object. Bindings
//!   the loader does not redefine stay as they were.
//! - Individual operations are locked; multi-step edits (a module swap) need the caller to serialize
//!   runs against one registry.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use gradecase_core::Fault;
use miette::Diagnostic;
use thiserror::Error;

use super::function::Function;
use super::module::{Member, Module, ModuleBuilder};
use super::panic;

/// A module definition: populates a fresh (or reloading) module.
pub type Loader = Arc<dyn Fn(&mut ModuleBuilder<'_>) -> Result<(), Fault> + Send + Sync>;

/// Errors raised while importing, reloading or resolving names in the registry.
#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    #[error("no module named '{name}'")]
    #[diagnostic(
        code(gradecase::registry::module_not_found),
        help("define the module on the registry before importing it")
    )]
    ModuleNotFound { name: String },

    #[error("module '{name}' is not registered")]
    #[diagnostic(code(gradecase::registry::not_registered))]
    NotRegistered { name: String },

    #[error("module '{module}' has no attribute '{name}'")]
    #[diagnostic(code(gradecase::registry::attribute_not_found))]
    AttributeNotFound { module: String, name: String },

    #[error("'{path}' is a {kind}, not a function")]
    #[diagnostic(code(gradecase::registry::not_callable))]
    NotCallable { path: String, kind: &'static str },

    #[error("'{path}' is not a qualified '<module>.<name>' path")]
    #[diagnostic(code(gradecase::registry::invalid_path))]
    InvalidPath { path: String },

    #[error("error while loading module '{module}': {fault}")]
    #[diagnostic(code(gradecase::registry::load))]
    Load { module: String, fault: Fault },
}

#[derive(Default)]
struct RegistryInner {
    definitions: RwLock<HashMap<String, Loader>>,
    loaded: RwLock<HashMap<String, Arc<Module>>>,
}

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Handle to a module registry. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// An empty, isolated registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Registry {
        GLOBAL.clone()
    }

    pub fn ptr_eq(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Make a module importable under `name`.
    pub fn define(
        &self,
        name: impl Into<String>,
        loader: impl Fn(&mut ModuleBuilder<'_>) -> Result<(), Fault> + Send + Sync + 'static,
    ) {
        let name = name.into();
        tracing::debug!(module = %name, "defining module");
        self.inner
            .definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(loader));
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.inner
            .definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    fn loader(&self, name: &str) -> Result<Loader, RegistryError> {
        self.inner
            .definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::ModuleNotFound { name: name.to_string() })
    }

    /// The module registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Arc<Module>> {
        self.inner
            .loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Register `module` under `name`, returning the previous registration.
    pub fn insert(&self, name: impl Into<String>, module: Arc<Module>) -> Option<Arc<Module>> {
        let name = name.into();
        tracing::debug!(name = %name, module = module.name(), "registering module");
        self.inner
            .loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, module)
    }

    /// Unregister `name`, returning what was registered.
    pub fn remove(&self, name: &str) -> Option<Arc<Module>> {
        tracing::debug!(name, "unregistering module");
        self.inner
            .loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Names currently registered, sorted.
    pub fn loaded_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .inner
            .loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Names that can be imported, sorted.
    pub fn defined_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .inner
            .definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Return the registered module, loading it from its definition on first use.
    pub fn import(&self, name: &str) -> Result<Arc<Module>, RegistryError> {
        if let Some(module) = self.get(name) {
            return Ok(module);
        }
        let loader = self.loader(name)?;
        let module = Arc::new(Module::new(name));
        self.insert(name, Arc::clone(&module));
        if let Err(fault) = self.execute(&loader, &module) {
            self.remove(name);
            return Err(RegistryError::Load {
                module: name.to_string(),
                fault,
            });
        }
        Ok(module)
    }

    /// Re-run the definition of the module registered under `name` into the same module object.
    pub fn reload(&self, name: &str) -> Result<Arc<Module>, RegistryError> {
        let module = self
            .get(name)
            .ok_or_else(|| RegistryError::NotRegistered { name: name.to_string() })?;
        let loader = self.loader(module.name())?;
        tracing::debug!(name, module = module.name(), "reloading module");
        self.execute(&loader, &module).map_err(|fault| RegistryError::Load {
            module: module.name().to_string(),
            fault,
        })?;
        Ok(module)
    }

    /// Reload `name` if it is registered, import it otherwise.
    pub fn refresh(&self, name: &str) -> Result<Arc<Module>, RegistryError> {
        if self.is_loaded(name) {
            self.reload(name)
        } else {
            self.import(name)
        }
    }

    /// Run `loader` into `module`. A panicking loader faults like any other.
    fn execute(&self, loader: &Loader, module: &Arc<Module>) -> Result<(), Fault> {
        let mut builder = ModuleBuilder::new(Arc::clone(module), self);
        panic::catch(|| loader(&mut builder))?
    }

    /// Split `<module path>.<name>` and import the module part.
    pub fn resolve_target(&self, path: &str) -> Result<(Arc<Module>, String), RegistryError> {
        let (module, name) = split_path(path)?;
        Ok((self.import(module)?, name.to_string()))
    }

    /// Resolve `<module path>.<name>` to a function.
    pub fn resolve_function(&self, path: &str) -> Result<Function, RegistryError> {
        let (module, name) = self.resolve_target(path)?;
        match module.get(&name) {
            Some(Member::Function(function)) => Ok(function),
            Some(other) => Err(RegistryError::NotCallable {
                path: path.to_string(),
                kind: other.kind_name(),
            }),
            None => Err(RegistryError::AttributeNotFound {
                module: module.name().to_string(),
                name,
            }),
        }
    }
}

/// Split a qualified path at its last `.`.
pub fn split_path(path: &str) -> Result<(&str, &str), RegistryError> {
    match path.rsplit_once('.') {
        Some((module, name)) if !module.is_empty() && !name.is_empty() => Ok((module, name)),
        _ => Err(RegistryError::InvalidPath { path: path.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradecase_core::{FaultKind, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry_with_helpers() -> Registry {
        let registry = Registry::new();
        registry.define("helpers", |m| {
            m.def("answer", |_| Ok(Value::Int(42)));
            m.value("VERSION", 1);
            Ok(())
        });
        registry
    }

    #[test]
    fn test_import_loads_once() {
        let registry = Registry::new();
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        registry.define("once", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let first = registry.import("once").unwrap();
        let second = registry.import("once").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_import_unknown_module() {
        let err = Registry::new().import("nope").unwrap_err();
        assert!(matches!(err, RegistryError::ModuleNotFound { ref name } if name == "nope"));
        assert_eq!(err.to_string(), "no module named 'nope'");
    }

    #[test]
    fn test_failed_load_is_unregistered() {
        let registry = Registry::new();
        registry.define("broken", |_| Err(Fault::value_error("bad module")));
        let err = registry.import("broken").unwrap_err();
        assert!(matches!(err, RegistryError::Load { .. }));
        assert!(!registry.is_loaded("broken"));
    }

    #[test]
    fn test_panicking_load_is_unregistered() {
        let registry = Registry::new();
        registry.define("panicky", |m| {
            let empty: Vec<i64> = Vec::new();
            m.value("FIRST", empty[0]);
            Ok(())
        });
        match registry.import("panicky").unwrap_err() {
            RegistryError::Load { module, fault } => {
                assert_eq!(module, "panicky");
                assert_eq!(fault.kind(), FaultKind::Panic);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!registry.is_loaded("panicky"));
    }

    #[test]
    fn test_import_from_missing_name() {
        let registry = registry_with_helpers();
        registry.define("consumer", |m| {
            m.import_from("helpers", "missing")?;
            Ok(())
        });
        match registry.import("consumer").unwrap_err() {
            RegistryError::Load { fault, .. } => {
                assert_eq!(fault.kind(), FaultKind::ImportError);
                assert_eq!(fault.message(), "cannot import name 'missing' from 'helpers'");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reload_keeps_identity_and_rebinds() {
        let registry = registry_with_helpers();
        registry.define("replacement", |m| {
            m.def("answer", |_| Ok(Value::Int(7)));
            Ok(())
        });
        registry.define("consumer", |m| {
            m.import_from("helpers", "answer")?;
            Ok(())
        });
        let consumer = registry.import("consumer").unwrap();
        assert_eq!(consumer.call("answer", &[]).unwrap(), Value::Int(42));

        let helpers = registry.remove("helpers").unwrap();
        registry.insert("helpers", registry.import("replacement").unwrap());
        let reloaded = registry.reload("consumer").unwrap();
        assert!(Arc::ptr_eq(&consumer, &reloaded));
        assert_eq!(consumer.call("answer", &[]).unwrap(), Value::Int(7));

        registry.insert("helpers", helpers);
        registry.reload("consumer").unwrap();
        assert_eq!(consumer.call("answer", &[]).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_reload_unregistered() {
        let err = registry_with_helpers().reload("helpers").unwrap_err();
        assert!(matches!(err, RegistryError::NotRegistered { .. }));
    }

    #[test]
    fn test_resolve_function() {
        let registry = registry_with_helpers();
        let answer = registry.resolve_function("helpers.answer").unwrap();
        assert_eq!(answer.name(), "helpers.answer");
        assert!(matches!(
            registry.resolve_function("helpers.VERSION"),
            Err(RegistryError::NotCallable { kind: "int", .. })
        ));
        assert!(matches!(
            registry.resolve_function("helpers.nope"),
            Err(RegistryError::AttributeNotFound { .. })
        ));
        assert!(matches!(
            registry.resolve_function("answer"),
            Err(RegistryError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_split_path_uses_last_dot() {
        assert_eq!(split_path("pkg.mod.fn").unwrap(), ("pkg.mod", "fn"));
        assert!(split_path(".fn").is_err());
        assert!(split_path("mod.").is_err());
    }
}
