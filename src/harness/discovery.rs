//! Test discovery over modules and classes.
//!
//! Discovery runs in two stages. Every member of the source is first classified by name and capability
//! alone (a test class, a test callable, or something else) and only then dispatched. Test classes are
//! searched recursively and their cases are flattened to `<ClassName>.<name>`.
//!
//! Which callables are kept depends on two independent switches:
//!
//! | source                  | `allow_plain` | `allow_native` | callables kept |
//! |-------------------------|---------------|----------------|----------------|
//! | module or plain class   | yes           | any            | all            |
//! | module or plain class   | no            | any            | none           |
//! | framework-native class  | any           | yes            | all, as suites |
//! | framework-native class  | any           | no             | none           |

use std::collections::BTreeMap;
use std::sync::Arc;

use gradecase_core::Conventions;

use crate::runtime::{Class, Function, Member, Module, Registry};
use crate::suite::Suite;

use super::case::{Payload, TestCase};
use super::error::HarnessError;

/// Qualified name to case, for one discovery pass.
pub type DiscoveredSet = BTreeMap<String, TestCase>;

/// What discovery is run against.
#[derive(Clone, Debug)]
pub enum Source {
    Module(Arc<Module>),
    /// Instantiated before its members are inspected.
    Class(Arc<Class>),
}

impl Source {
    pub fn name(&self) -> &str {
        match self {
            Source::Module(module) => module.name(),
            Source::Class(class) => class.name(),
        }
    }
}

impl From<Arc<Module>> for Source {
    fn from(module: Arc<Module>) -> Self {
        Source::Module(module)
    }
}

impl From<Arc<Class>> for Source {
    fn from(class: Arc<Class>) -> Self {
        Source::Class(class)
    }
}

/// Which conventions discovery accepts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Keep test methods of framework-native test-case classes.
    pub allow_native: bool,
    /// Keep plain test functions and methods of plain test classes.
    pub allow_plain: bool,
    pub conventions: Conventions,
}

impl DiscoveryOptions {
    pub fn new(allow_native: bool, allow_plain: bool) -> Self {
        Self {
            allow_native,
            allow_plain,
            conventions: Conventions::default(),
        }
    }

    pub fn native() -> Self {
        Self::new(true, false)
    }

    pub fn plain() -> Self {
        Self::new(false, true)
    }

    pub fn all() -> Self {
        Self::new(true, true)
    }

    pub fn with_conventions(mut self, conventions: Conventions) -> Self {
        self.conventions = conventions;
        self
    }
}

enum Classified {
    TestClass(Arc<Class>),
    TestCallable(Function),
    Other,
}

fn classify(name: &str, member: Member, conventions: &Conventions) -> Classified {
    match member {
        Member::Class(class) if conventions.is_test_class_name(name) => Classified::TestClass(class),
        Member::Function(function) if conventions.is_test_name(name) => Classified::TestCallable(function),
        _ => Classified::Other,
    }
}

/// Discover the test cases in `source`.
///
/// Cases are bound to `module_name` when given, otherwise to the module's own name. A class has no
/// module name of its own, so discovering one directly requires `module_name`.
#[tracing::instrument(skip_all, fields(source = %source.name()))]
pub fn discover(
    registry: &Registry,
    source: &Source,
    options: &DiscoveryOptions,
    module_name: Option<&str>,
) -> Result<DiscoveredSet, HarnessError> {
    let mut discovered = DiscoveredSet::new();

    let (members, native_class, owner) = match source {
        Source::Module(module) => (module.members(), None, module_name.unwrap_or(module.name())),
        Source::Class(class) => {
            let owner = module_name.ok_or_else(|| HarnessError::MissingModuleName {
                class: class.name().to_string(),
            })?;
            let instance = class.instantiate();
            if instance.is_framework() && !options.allow_native {
                tracing::debug!("skipping framework-native class");
                return Ok(discovered);
            }
            let native_class = instance.is_framework().then(|| class.name());
            (instance.members(), native_class, owner)
        }
    };

    for (name, member) in members {
        match classify(&name, member, &options.conventions) {
            Classified::TestClass(class) => {
                let nested = discover(registry, &Source::Class(class), options, Some(owner))?;
                for (key, case) in nested {
                    let qualified = options.conventions.qualify(&name, &key);
                    discovered.insert(qualified.clone(), case.with_name(qualified));
                }
            }
            Classified::TestCallable(function) => {
                let keep = options.allow_plain || (options.allow_native && native_class.is_some());
                if !keep {
                    continue;
                }
                let payload = match native_class {
                    Some(class) => Payload::Suite(Suite::single(format!("{owner}.{class}.{name}"), function)),
                    None => Payload::Callable(function),
                };
                discovered.insert(name.clone(), TestCase::new(name, payload, owner, registry.clone()));
            }
            Classified::Other => {}
        }
    }

    tracing::debug!(cases = discovered.len(), "discovered");
    Ok(discovered)
}

/// Import the module registered as `name` and discover its test cases.
pub fn discover_module(
    registry: &Registry,
    name: &str,
    options: &DiscoveryOptions,
) -> Result<DiscoveredSet, HarnessError> {
    let module = registry.import(name)?;
    discover(registry, &Source::Module(module), options, None)
}
