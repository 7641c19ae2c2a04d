//! Convert panics raised inside runtime calls into faults.
//!
//! A process-wide hook is installed once. While at least one guarded call is active on the current
//! thread, the hook records the panic location instead of printing; otherwise it defers to whatever hook
//! was installed before.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use gradecase_core::{Fault, FaultKind};

static INSTALL_HOOK: Once = Once::new();

thread_local! {
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if GUARD_DEPTH.with(Cell::get) > 0 {
                let location = info.location().map(ToString::to_string);
                LAST_LOCATION.with(|slot| *slot.borrow_mut() = location);
            } else {
                previous(info);
            }
        }));
    });
}

/// Decrements the guard depth even if the guarded closure unwinds.
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
        DepthGuard
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        GUARD_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Run `f`, turning a panic into a [`Fault`].
pub(crate) fn catch<R>(f: impl FnOnce() -> R) -> Result<R, Fault> {
    install_hook();
    let result = {
        let _depth = DepthGuard::enter();
        panic::catch_unwind(AssertUnwindSafe(f))
    };
    result.map_err(|payload| {
        let location = LAST_LOCATION.with(|slot| slot.borrow_mut().take());
        fault_from_payload(payload, location)
    })
}

fn fault_from_payload(payload: Box<dyn Any + Send>, location: Option<String>) -> Fault {
    let payload = match payload.downcast::<Fault>() {
        Ok(fault) => return *fault,
        Err(payload) => payload,
    };
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    };

    let fault = classify_message(&message);
    match location {
        Some(location) => fault.with_frame(format!("panic at {location}")),
        None => fault,
    }
}

/// `Kind: message` panics (as raised by `gradecase_stdlib::errors::panic_kind`) keep their kind; std
/// assertion macros become `AssertionError`; anything else is a `Panic`.
fn classify_message(message: &str) -> Fault {
    if let Some((kind, rest)) = message.split_once(": ") {
        if let Some(kind) = FaultKind::from_name(kind) {
            return Fault::new(kind, rest);
        }
    }
    if message.starts_with("assertion") {
        return Fault::assertion(message);
    }
    Fault::panic(message)
}
