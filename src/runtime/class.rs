//! Classes and instances.
//!
//! A class is an immutable template of methods, nested classes and values. Instantiating it yields an
//! [`Instance`] whose members are the class members with methods bound to that instance, which is the
//! view discovery enumerates when it is handed a class.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use gradecase_core::{Fault, Value};

use super::function::Function;
use super::module::Member;

/// Body of a method: receives the instance it is bound to.
pub type MethodFn = dyn Fn(&Instance, &[Value]) -> Result<Value, Fault> + Send + Sync;

#[derive(Clone)]
pub struct Method {
    body: Arc<MethodFn>,
}

impl Method {
    pub fn new(body: impl Fn(&Instance, &[Value]) -> Result<Value, Fault> + Send + Sync + 'static) -> Self {
        Self { body: Arc::new(body) }
    }
}

#[derive(Clone)]
pub enum ClassMember {
    Method(Method),
    Class(Arc<Class>),
    Value(Value),
}

pub struct Class {
    name: String,
    /// Framework-native test-case class (the equivalent of subclassing a unit-test base class).
    framework: bool,
    members: BTreeMap<String, ClassMember>,
}

impl Class {
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            framework: false,
            members: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_framework(&self) -> bool {
        self.framework
    }

    pub fn member(&self, name: &str) -> Option<&ClassMember> {
        self.members.get(name)
    }

    pub fn instantiate(self: &Arc<Self>) -> Arc<Instance> {
        Arc::new(Instance {
            class: Arc::clone(self),
            fields: Mutex::new(BTreeMap::new()),
        })
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("framework", &self.framework)
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .finish()
    }
}

pub struct ClassBuilder {
    name: String,
    framework: bool,
    members: BTreeMap<String, ClassMember>,
}

impl ClassBuilder {
    /// Mark the class as a framework-native test case.
    pub fn framework(mut self) -> Self {
        self.framework = true;
        self
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        body: impl Fn(&Instance, &[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    ) -> Self {
        self.members.insert(name.into(), ClassMember::Method(Method::new(body)));
        self
    }

    /// A zero-argument method whose result is discarded, the shape of a test method.
    pub fn test(
        self,
        name: impl Into<String>,
        body: impl Fn(&Instance) -> Result<(), Fault> + Send + Sync + 'static,
    ) -> Self {
        self.method(name, move |instance, _| body(instance).map(|()| Value::None))
    }

    pub fn class(mut self, name: impl Into<String>, class: Arc<Class>) -> Self {
        self.members.insert(name.into(), ClassMember::Class(class));
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.insert(name.into(), ClassMember::Value(value.into()));
        self
    }

    pub fn build(self) -> Arc<Class> {
        Arc::new(Class {
            name: self.name,
            framework: self.framework,
            members: self.members,
        })
    }
}

/// An instance of a class, with its own field storage.
pub struct Instance {
    class: Arc<Class>,
    fields: Mutex<BTreeMap<String, Value>>,
}

impl Instance {
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    pub fn is_framework(&self) -> bool {
        self.class.is_framework()
    }

    /// Instance fields shadow class values.
    pub fn field(&self, name: &str) -> Result<Value, Fault> {
        let fields = self.fields.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = fields.get(name) {
            return Ok(value.clone());
        }
        match self.class.member(name) {
            Some(ClassMember::Value(value)) => Ok(value.clone()),
            _ => Err(Fault::attribute_error(self.class.name(), name)),
        }
    }

    pub fn set_field(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value.into());
    }

    /// Bind method `name` to this instance as a function named `<Class>.<name>`.
    pub fn bind(self: &Arc<Self>, name: &str) -> Option<Function> {
        match self.class.member(name) {
            Some(ClassMember::Method(method)) => Some(self.bind_method(name, method)),
            _ => None,
        }
    }

    pub fn call_method(self: &Arc<Self>, name: &str, args: &[Value]) -> Result<Value, Fault> {
        self.bind(name)
            .ok_or_else(|| Fault::attribute_error(self.class.name(), name))?
            .call(args)
    }

    /// Every member visible on the instance, sorted by name: methods bound, nested classes and values as
    /// they are.
    pub fn members(self: &Arc<Self>) -> Vec<(String, Member)> {
        self.class
            .members
            .iter()
            .map(|(name, member)| {
                let member = match member {
                    ClassMember::Method(method) => Member::Function(self.bind_method(name, method)),
                    ClassMember::Class(class) => Member::Class(Arc::clone(class)),
                    ClassMember::Value(value) => Member::Value(value.clone()),
                };
                (name.clone(), member)
            })
            .collect()
    }

    fn bind_method(self: &Arc<Self>, name: &str, method: &Method) -> Function {
        let instance = Arc::clone(self);
        let body = Arc::clone(&method.body);
        Function::new(format!("{}.{name}", self.class.name()), move |args| {
            body(&instance, args)
        })
    }
}
