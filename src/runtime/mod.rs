//! The in-process runtime the harness operates on.
//!
//! ## Modules
//!
//! - `function` - named callables over [`Value`]s, with panic capture and trace frames
//! - `module` - mutable namespaces, the [`Globals`] handle closures capture, and the loader builder
//! - `class` - class templates, instances and bound methods
//! - `registry` - module definitions and the process-wide table of loaded modules
//!
//! [`Value`]: gradecase_core::Value

pub mod class;
pub mod function;
pub mod module;
mod panic;
pub mod registry;

pub use class::{Class, ClassBuilder, ClassMember, Instance, Method};
pub use function::{Function, NativeFn, arg};
pub use module::{Globals, Member, Module, ModuleBuilder};
pub use registry::{Loader, Registry, RegistryError, split_path};
