//! Modules: named namespaces of functions, classes, values and other modules.
//!
//! A module's namespace is mutable behind a lock. Function patches and reloads rebind names in place,
//! and closures that captured the module's [`Globals`] see the new binding on their next lookup.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use gradecase_core::{Fault, Value};

use super::class::Class;
use super::function::Function;
use super::registry::Registry;

/// A named member of a module (or of an instance, during discovery).
#[derive(Clone)]
pub enum Member {
    Function(Function),
    Class(Arc<Class>),
    Module(Arc<Module>),
    Value(Value),
}

impl Member {
    /// Short type description used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Member::Function(_) => "function",
            Member::Class(_) => "class",
            Member::Module(_) => "module",
            Member::Value(value) => value.type_name(),
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Function(function) => write!(f, "{function:?}"),
            Member::Class(class) => write!(f, "<class {}>", class.name()),
            Member::Module(module) => write!(f, "<module {}>", module.name()),
            Member::Value(value) => write!(f, "{}", value.repr()),
        }
    }
}

/// A loaded module.
pub struct Module {
    name: String,
    namespace: RwLock<BTreeMap<String, Member>>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: RwLock::new(BTreeMap::new()),
        }
    }

    /// The module's own name, which is also the definition reloads re-run.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<Member> {
        self.namespace
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Bind `name`, returning the previous binding.
    pub fn set(&self, name: impl Into<String>, member: Member) -> Option<Member> {
        self.namespace
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), member)
    }

    pub fn remove(&self, name: &str) -> Option<Member> {
        self.namespace
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.namespace
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Snapshot of every binding, sorted by name.
    pub fn members(&self) -> Vec<(String, Member)> {
        self.namespace
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, member)| (name.clone(), member.clone()))
            .collect()
    }

    /// Look up a callable binding.
    pub fn function(&self, name: &str) -> Result<Function, Fault> {
        match self.get(name) {
            Some(Member::Function(function)) => Ok(function),
            Some(other) => Err(Fault::type_error(format!(
                "'{}' object '{name}' is not callable",
                other.kind_name()
            ))),
            None => Err(Fault::name_error(name)),
        }
    }

    /// Look up `name` at call time and call it.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, Fault> {
        // The lock is released before the call so the callee may rebind names.
        let function = self.function(name)?;
        function.call(args)
    }

    /// Look up a value binding.
    pub fn value(&self, name: &str) -> Result<Value, Fault> {
        match self.get(name) {
            Some(Member::Value(value)) => Ok(value),
            Some(other) => Err(Fault::type_error(format!("'{name}' is a {}, not a value", other.kind_name()))),
            None => Err(Fault::name_error(name)),
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<module {}>", self.name)
    }
}

/// Weak handle to a module's namespace, captured by the closures a loader defines.
///
/// Names are resolved on every call, so a patched or reloaded binding is what the closure sees.
#[derive(Clone)]
pub struct Globals {
    module: Weak<Module>,
}

impl Globals {
    pub fn new(module: &Arc<Module>) -> Self {
        Self {
            module: Arc::downgrade(module),
        }
    }

    pub fn module(&self) -> Result<Arc<Module>, Fault> {
        self.module
            .upgrade()
            .ok_or_else(|| Fault::runtime("module namespace no longer exists"))
    }

    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, Fault> {
        self.module()?.call(name, args)
    }

    pub fn get(&self, name: &str) -> Result<Member, Fault> {
        self.module()?.get(name).ok_or_else(|| Fault::name_error(name))
    }

    pub fn value(&self, name: &str) -> Result<Value, Fault> {
        self.module()?.value(name)
    }

    /// Call `attr` on the module bound to `module_name` in this namespace (`module_name.attr(...)`).
    pub fn call_attr(&self, module_name: &str, attr: &str, args: &[Value]) -> Result<Value, Fault> {
        match self.get(module_name)? {
            Member::Module(module) => match module.get(attr) {
                Some(Member::Function(function)) => function.call(args),
                Some(other) => Err(Fault::type_error(format!(
                    "'{}' object '{module_name}.{attr}' is not callable",
                    other.kind_name()
                ))),
                None => Err(Fault::attribute_error(module.name(), attr)),
            },
            other => Err(Fault::attribute_error(other.kind_name(), attr)),
        }
    }
}

/// Handed to a module loader to populate the namespace.
pub struct ModuleBuilder<'r> {
    module: Arc<Module>,
    registry: &'r Registry,
}

impl<'r> ModuleBuilder<'r> {
    pub(crate) fn new(module: Arc<Module>, registry: &'r Registry) -> Self {
        Self { module, registry }
    }

    pub fn name(&self) -> &str {
        self.module.name()
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// Handle for closures that need to resolve names in this module at call time.
    pub fn globals(&self) -> Globals {
        Globals::new(&self.module)
    }

    /// Define a function named `<module>.<name>` bound to `name`.
    pub fn def(
        &mut self,
        name: &str,
        body: impl Fn(&[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    ) -> &mut Self {
        let qualified = format!("{}.{name}", self.module.name());
        self.module.set(name, Member::Function(Function::new(qualified, body)));
        self
    }

    /// Define a zero-argument test-shaped function.
    pub fn def_test(&mut self, name: &str, body: impl Fn() -> Result<(), Fault> + Send + Sync + 'static) -> &mut Self {
        let qualified = format!("{}.{name}", self.module.name());
        self.module.set(name, Member::Function(Function::nullary(qualified, body)));
        self
    }

    /// Bind an existing function under `name`.
    pub fn function(&mut self, name: &str, function: Function) -> &mut Self {
        self.module.set(name, Member::Function(function));
        self
    }

    pub fn class(&mut self, name: &str, class: Arc<Class>) -> &mut Self {
        self.module.set(name, Member::Class(class));
        self
    }

    pub fn value(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.module.set(name, Member::Value(value.into()));
        self
    }

    /// `import <module>`: bind the registered module under its own name.
    pub fn import_module(&mut self, module: &str) -> Result<&mut Self, Fault> {
        self.import_module_as(module, module)
    }

    /// `import <module> as <alias>`.
    pub fn import_module_as(&mut self, module: &str, alias: &str) -> Result<&mut Self, Fault> {
        let imported = self
            .registry
            .import(module)
            .map_err(|err| Fault::import_error(err.to_string()))?;
        self.module.set(alias, Member::Module(imported));
        Ok(self)
    }

    /// `from <module> import <name>`.
    pub fn import_from(&mut self, module: &str, name: &str) -> Result<&mut Self, Fault> {
        self.import_from_as(module, name, name)
    }

    /// `from <module> import <name> as <alias>`.
    pub fn import_from_as(&mut self, module: &str, name: &str, alias: &str) -> Result<&mut Self, Fault> {
        let imported = self
            .registry
            .import(module)
            .map_err(|err| Fault::import_error(err.to_string()))?;
        let member = imported.get(name).ok_or_else(|| {
            Fault::import_error(format!("cannot import name '{name}' from '{module}'"))
        })?;
        self.module.set(alias, member);
        Ok(self)
    }
}
