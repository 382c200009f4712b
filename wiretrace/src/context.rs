use crate::trace::SpanContext;
use pin_project_lite::pin_project;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

thread_local! {
    static CURRENT_CONTEXT: RefCell<Context> = RefCell::new(Context::default());
}

/// An execution-scoped snapshot of the active trace position.
///
/// A [`Context`] names the span that work on the current execution unit
/// belongs to, if any. Contexts are immutable: [`with_span_context`] returns a
/// new context rather than modifying the receiver.
///
/// ## Managing the current context
///
/// A context becomes the active one for the calling thread via [`attach`].
/// Dropping the returned [`ContextGuard`] restores whatever was active before,
/// so scopes nest in LIFO order and are released on every exit path,
/// including early returns and unwinding panics.
///
/// Async code does not stay on one thread, so a future is bound to a context
/// with [`FutureExt::with_context`], which re-attaches the context around
/// every poll.
///
/// [`with_span_context`]: Context::with_span_context()
/// [`attach`]: Context::attach()
///
/// # Examples
///
/// ```
/// use wiretrace::trace::{SpanContext, SpanId, TraceFlags, TraceId};
/// use wiretrace::Context;
///
/// let outer = SpanContext::new(TraceId::from(1), SpanId::from(1), TraceFlags::SAMPLED, false);
/// let inner = SpanContext::new(TraceId::from(1), SpanId::from(2), TraceFlags::SAMPLED, false);
///
/// let _outer_guard = Context::new().with_span_context(outer).attach();
/// {
///     let _inner_guard = Context::current().with_span_context(inner).attach();
///     assert_eq!(Context::current().span_context(), Some(&inner));
/// }
///
/// // Resets to the outer span context when the inner guard is dropped
/// assert_eq!(Context::current().span_context(), Some(&outer));
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct Context {
    span_context: Option<SpanContext>,
}

impl Context {
    /// Creates an empty `Context`.
    pub fn new() -> Self {
        Context::default()
    }

    /// Returns an immutable snapshot of the current thread's context.
    pub fn current() -> Self {
        Context::map_current(|cx| cx.clone())
    }

    /// Applies a function to the current context returning its value.
    ///
    /// Note: This function will panic if you attempt to attach another context
    /// while the current one is still borrowed.
    pub fn map_current<T>(f: impl FnOnce(&Context) -> T) -> T {
        CURRENT_CONTEXT.with(|cx| f(&cx.borrow()))
    }

    /// Returns a copy of this context with the given span context as its
    /// active span.
    pub fn with_span_context(&self, span_context: SpanContext) -> Self {
        Context {
            span_context: Some(span_context),
        }
    }

    /// The span context this context points at, if one has been set.
    pub fn span_context(&self) -> Option<&SpanContext> {
        self.span_context.as_ref()
    }

    /// Returns whether or not an active span has been set.
    ///
    /// ```
    /// use wiretrace::Context;
    ///
    /// assert!(!Context::map_current(|cx| cx.has_active_span()));
    /// ```
    pub fn has_active_span(&self) -> bool {
        self.span_context.is_some()
    }

    /// Replaces the current context on this thread with this context.
    ///
    /// Dropping the returned [`ContextGuard`] will reset the current context to the
    /// previous value.
    ///
    /// ```
    /// use wiretrace::trace::{SpanContext, SpanId, TraceFlags, TraceId};
    /// use wiretrace::Context;
    ///
    /// fn my_function() -> Result<(), String> {
    ///     let sc = SpanContext::new(TraceId::from(7), SpanId::from(7), TraceFlags::SAMPLED, false);
    ///     // NOTE: a variable name after the underscore is **required** or rust
    ///     // will drop the guard, restoring the previous context _immediately_.
    ///     let _guard = Context::new().with_span_context(sc).attach();
    ///
    ///     Err("failed".to_owned())
    /// }
    ///
    /// assert!(my_function().is_err());
    /// assert!(!Context::current().has_active_span());
    /// ```
    pub fn attach(self) -> ContextGuard {
        let previous_cx = CURRENT_CONTEXT
            .try_with(|current| current.replace(self))
            .ok();

        ContextGuard {
            previous_cx,
            _marker: PhantomData,
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Context");
        match &self.span_context {
            Some(sc) => dbg.field("span", sc),
            None => dbg.field("span", &"None"),
        };
        dbg.finish()
    }
}

/// A guard that resets the current context to the prior context when dropped.
#[allow(missing_debug_implementations)]
#[must_use = "Dropping the guard detaches the context."]
pub struct ContextGuard {
    previous_cx: Option<Context>,
    // ensure this type is !Send as it relies on thread locals
    _marker: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if let Some(previous_cx) = self.previous_cx.take() {
            let _ = CURRENT_CONTEXT.try_with(|current| current.replace(previous_cx));
        }
    }
}

pin_project! {
    /// A future that has an associated context.
    #[derive(Clone, Debug)]
    pub struct WithContext<T> {
        #[pin]
        inner: T,
        wt_cx: Context,
    }
}

impl<T: Sized> FutureExt for T {}

impl<T: std::future::Future> std::future::Future for WithContext<T> {
    type Output = T::Output;

    fn poll(self: Pin<&mut Self>, task_cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _guard = this.wt_cx.clone().attach();

        this.inner.poll(task_cx)
    }
}

/// Extension trait allowing futures to run inside a [`Context`].
pub trait FutureExt: Sized {
    /// Attaches the provided [`Context`] to this type, returning a `WithContext`
    /// wrapper.
    ///
    /// The attached context is current while the wrapped type is being polled
    /// and is detached again before each poll returns.
    fn with_context(self, wt_cx: Context) -> WithContext<Self> {
        WithContext { inner: self, wt_cx }
    }
}
