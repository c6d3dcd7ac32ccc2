use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

thread_local! {
    static CURRENT: RefCell<Option<Arc<ExecutionContext>>> = const { RefCell::new(None) };
}

/// Shared cancellation flag for one evaluation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Association installed on a thread while it runs script code.
#[derive(Debug)]
pub struct ExecutionContext {
    host: String,
    cancel: CancelToken,
}

impl ExecutionContext {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            cancel: CancelToken::new(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

/// Context currently associated with the calling thread.
pub fn current_context() -> Option<Arc<ExecutionContext>> {
    CURRENT.with(|current| current.borrow().clone())
}

/// True when the context installed on this thread has been cancelled.
pub fn interrupt_requested() -> bool {
    CURRENT.with(|current| {
        current
            .borrow()
            .as_ref()
            .map(|context| context.cancel.is_cancelled())
            .unwrap_or(false)
    })
}

/// Installs a context for the lifetime of the guard and puts back whatever was
/// there before when dropped, including during unwinding.
///
/// Guards are bound to the thread that created them and nest: dropping an
/// inner guard restores the context of the enclosing one.
#[must_use = "the previous context is restored as soon as the guard is dropped"]
pub struct ExecutionContextGuard {
    previous: Option<Arc<ExecutionContext>>,
    _not_send: PhantomData<*const ()>,
}

impl ExecutionContextGuard {
    pub fn enter(context: Arc<ExecutionContext>) -> Self {
        let previous = CURRENT.with(|current| current.replace(Some(context)));
        Self {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl Drop for ExecutionContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|current| {
            *current.borrow_mut() = previous;
        });
    }
}
