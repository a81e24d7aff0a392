//! Panic recovery with a best-effort captured stack trace.
//!
//! `std::panic::catch_unwind` alone only hands back the panic payload; by
//! the time it returns, the original unwind location is gone. We install a
//! process-wide panic hook once (the common pattern `tower`/`actix` style
//! middleware use for the same problem) that stashes a captured backtrace
//! into a thread-local slot, then pull it back out immediately after
//! `catch_unwind` returns.
use std::cell::RefCell;
use std::sync::Once;

thread_local! {
    static LAST_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

fn install_hook_once() {
    INSTALL_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let backtrace = std::backtrace::Backtrace::force_capture();
            LAST_BACKTRACE.with(|cell| *cell.borrow_mut() = Some(backtrace.to_string()));
            previous(info);
        }));
    });
}

/// Run `f`, recovering a panic instead of unwinding past this call.
///
/// On success returns `Ok(value)`. On panic returns `Err((message, stack))`
/// where `message` is the panic payload downcast to a string (falling back
/// to a generic description for non-string payloads) and `stack` is the
/// captured backtrace, or an empty string if backtraces are disabled for
/// this run.
pub fn catch_and_capture<F, R>(f: F) -> Result<R, (String, String)>
where
    F: FnOnce() -> R + std::panic::UnwindSafe,
{
    install_hook_once();
    LAST_BACKTRACE.with(|cell| *cell.borrow_mut() = None);
    match std::panic::catch_unwind(f) {
        Ok(value) => Ok(value),
        Err(payload) => {
            let message = panic_message(&payload);
            let stack = LAST_BACKTRACE
                .with(|cell| cell.borrow_mut().take())
                .unwrap_or_default();
            Err((message, stack))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic payload of unrecognized type".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_string_panic() {
        let result = catch_and_capture(|| {
            panic!("boom");
        });
        let (message, _stack) = result.unwrap_err();
        assert_eq!(message, "boom");
    }

    #[test]
    fn passes_through_success() {
        let result = catch_and_capture(|| 1 + 1);
        assert_eq!(result.unwrap(), 2);
    }
}
