//! Naming conventions used by test discovery.
//!
//! Discovery is purely name-driven: a callable is a test when its name starts with the test prefix, a
//! class is a container of tests when its name starts with the class prefix. Matching is exact-prefix and
//! case-sensitive.

/// Default prefix marking a test callable.
pub const TEST_PREFIX: &str = "test";

/// Default prefix marking a test class.
pub const TEST_CLASS_PREFIX: &str = "Test";

/// Default separator joining a class name and a nested case name.
pub const NAME_SEPARATOR: &str = ".";

/// Naming rules for discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conventions {
    /// Prefix a callable's name must start with to be collected
    pub test_prefix: String,
    /// Prefix a class's name must start with to be searched for nested cases
    pub class_prefix: String,
    /// Separator used when flattening `<Class><sep><case>`
    pub separator: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            test_prefix: TEST_PREFIX.to_string(),
            class_prefix: TEST_CLASS_PREFIX.to_string(),
            separator: NAME_SEPARATOR.to_string(),
        }
    }
}

impl Conventions {
    /// Create conventions with the default `test` / `Test` / `.` settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the test callable prefix
    pub fn with_test_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.test_prefix = prefix.into();
        self
    }

    /// Set the test class prefix
    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = prefix.into();
        self
    }

    /// Set the flattening separator
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Whether `name` carries the test callable prefix.
    pub fn is_test_name(&self, name: &str) -> bool {
        name.starts_with(self.test_prefix.as_str())
    }

    /// Whether `name` carries the test class prefix.
    pub fn is_test_class_name(&self, name: &str) -> bool {
        name.starts_with(self.class_prefix.as_str())
    }

    /// Join an outer class name and a nested case name.
    pub fn qualify(&self, outer: &str, inner: &str) -> String {
        let mut out = String::with_capacity(outer.len() + self.separator.len() + inner.len());
        out.push_str(outer);
        out.push_str(&self.separator);
        out.push_str(inner);
        out
    }
}
