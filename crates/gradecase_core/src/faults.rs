//! Fault vocabulary: kinds, the raised error itself, and traceback rendering.
//!
//! A [`Fault`] is what runtime functions return on the error path. Every runtime function it unwinds
//! through appends a [`Frame`], so by the time the harness sees it the fault carries the call chain and
//! can be rendered as a full traceback-style block of text.

use std::fmt;

/// Header line of a rendered trace.
pub const TRACE_HEADER: &str = "Traceback (most recent call last):";

/// Kinds of faults the runtime can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    AssertionError,
    TypeError,
    ValueError,
    NameError,
    AttributeError,
    ImportError,
    TimeoutError,
    RuntimeError,
    /// A Rust panic that escaped test or helper code.
    Panic,
}

impl FaultKind {
    /// Every fault kind, in declaration order.
    pub const ALL: [FaultKind; 9] = [
        FaultKind::AssertionError,
        FaultKind::TypeError,
        FaultKind::ValueError,
        FaultKind::NameError,
        FaultKind::AttributeError,
        FaultKind::ImportError,
        FaultKind::TimeoutError,
        FaultKind::RuntimeError,
        FaultKind::Panic,
    ];

    /// Canonical spelling (e.g. `"AssertionError"`).
    pub fn as_str(self) -> &'static str {
        match self {
            FaultKind::AssertionError => "AssertionError",
            FaultKind::TypeError => "TypeError",
            FaultKind::ValueError => "ValueError",
            FaultKind::NameError => "NameError",
            FaultKind::AttributeError => "AttributeError",
            FaultKind::ImportError => "ImportError",
            FaultKind::TimeoutError => "TimeoutError",
            FaultKind::RuntimeError => "RuntimeError",
            FaultKind::Panic => "Panic",
        }
    }

    /// User-facing description of the kind.
    pub fn description(self) -> &'static str {
        match self {
            FaultKind::AssertionError => "Raised when a test assertion does not hold.",
            FaultKind::TypeError => "Raised when a value of an inappropriate type reaches an operation.",
            FaultKind::ValueError => "Raised when a value has the right type but an invalid content.",
            FaultKind::NameError => "Raised when a name is not bound in the calling module.",
            FaultKind::AttributeError => "Raised when a module or instance has no member of the requested name.",
            FaultKind::ImportError => "Raised when a module loader cannot import a module or one of its names.",
            FaultKind::TimeoutError => "Raised when a bounded call exceeds its time limit.",
            FaultKind::RuntimeError => "Raised for errors that fit no other kind.",
            FaultKind::Panic => "A Rust panic caught at a runtime call boundary.",
        }
    }

    /// Resolve a canonical spelling. Matching is case-sensitive.
    pub fn from_name(name: &str) -> Option<FaultKind> {
        FaultKind::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Whether a suite records this kind as a *failure* rather than an *error*.
    pub fn is_failure(self) -> bool {
        matches!(self, FaultKind::AssertionError)
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a fault's trace: the qualified name of the function it unwound through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub name: String,
}

impl Frame {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A raised runtime error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    kind: FaultKind,
    message: String,
    /// Innermost frame first; frames are appended while unwinding.
    trace: Vec<Frame>,
}

impl Fault {
    /// Create a fault with no trace yet.
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            trace: Vec::new(),
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(FaultKind::AssertionError, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(FaultKind::TypeError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(FaultKind::ValueError, message)
    }

    pub fn name_error(name: &str) -> Self {
        Self::new(FaultKind::NameError, format!("name '{name}' is not defined"))
    }

    pub fn attribute_error(owner: &str, name: &str) -> Self {
        Self::new(FaultKind::AttributeError, format!("'{owner}' has no attribute '{name}'"))
    }

    pub fn import_error(message: impl Into<String>) -> Self {
        Self::new(FaultKind::ImportError, message)
    }

    pub fn timeout(seconds: f64) -> Self {
        Self::new(FaultKind::TimeoutError, format!("Test timed out after {seconds} seconds."))
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(FaultKind::RuntimeError, message)
    }

    pub fn panic(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Panic, message)
    }

    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Append the frame the fault is currently unwinding through.
    pub fn with_frame(mut self, name: impl Into<String>) -> Self {
        self.trace.push(Frame::new(name));
        self
    }

    /// Frames from the outermost call to the innermost one.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.trace.iter().rev()
    }

    /// `Kind: message`, or just `Kind` when the message is empty.
    pub fn summary(&self) -> String {
        if self.message.is_empty() {
            self.kind.as_str().to_string()
        } else {
            format!("{}: {}", self.kind, self.message)
        }
    }

    /// Render the full trace text. Never empty.
    pub fn render(&self) -> String {
        let mut out = String::from(TRACE_HEADER);
        out.push('\n');
        for frame in self.frames() {
            out.push_str("  in ");
            out.push_str(&frame.name);
            out.push('\n');
        }
        out.push_str(&self.summary());
        out.push('\n');
        out
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for Fault {}
