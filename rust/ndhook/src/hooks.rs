//! The hook registry: an optional callback pair plus the reentrancy-safe
//! invocation protocol.

use std::cell::RefCell;

use ndhook_view::{DataType, Layout, MemorySpace, View};

use crate::holder::{ConstViewHolderBase, HolderSelect, ViewHolderBase};

/// Callback invoked with write-capable `(destination, source)` holders.
pub type ViewCallback = Box<dyn FnMut(&mut dyn ViewHolderBase, &mut dyn ViewHolderBase)>;

/// Callback invoked with read-only `(destination, source)` holders.
pub type ConstViewCallback = Box<dyn FnMut(&dyn ConstViewHolderBase, &dyn ConstViewHolderBase)>;

/// The registered callback pair. Either side may be empty.
#[derive(Default)]
pub struct Callbacks {
    pub callback: Option<ViewCallback>,
    pub const_callback: Option<ConstViewCallback>,
}

impl Callbacks {
    /// Sets the write-capable side.
    pub fn with_callback<F>(mut self, callback: F) -> Callbacks
    where
        F: FnMut(&mut dyn ViewHolderBase, &mut dyn ViewHolderBase) + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Sets the const side.
    pub fn with_const_callback<CF>(mut self, const_callback: CF) -> Callbacks
    where
        CF: FnMut(&dyn ConstViewHolderBase, &dyn ConstViewHolderBase) + 'static,
    {
        self.const_callback = Some(Box::new(const_callback));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.callback.is_none() && self.const_callback.is_none()
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("callback", &self.callback.is_some())
            .field("const_callback", &self.const_callback.is_some())
            .finish()
    }
}

/// Hook registry threaded through copy-initiating calls.
///
/// The registry is single-threaded (`!Sync`) and takes no locks. It is shared
/// by reference, or through `Rc` when a callback needs to reach it.
///
/// [`ViewHooks::call`] moves the registered callbacks out for the duration of
/// the dispatch, so any `call` made from inside a callback sees an empty
/// registry and cannot recurse into it. The moved-out callbacks are put back
/// afterwards unconditionally: a `set` or `clear` performed by a callback on
/// the same registry is overwritten when the outer `call` returns.
#[derive(Default)]
pub struct ViewHooks {
    callbacks: RefCell<Callbacks>,
}

impl ViewHooks {
    pub fn new() -> ViewHooks {
        ViewHooks::default()
    }

    /// Installs both callbacks.
    ///
    /// To leave one side empty, pass a [`Callbacks`] with only that side built
    /// to [`ViewHooks::replace`].
    pub fn set<F, CF>(&self, callback: F, const_callback: CF)
    where
        F: FnMut(&mut dyn ViewHolderBase, &mut dyn ViewHolderBase) + 'static,
        CF: FnMut(&dyn ConstViewHolderBase, &dyn ConstViewHolderBase) + 'static,
    {
        self.replace(
            Callbacks::default()
                .with_callback(callback)
                .with_const_callback(const_callback),
        );
    }

    /// Installs the write-capable callback, leaving the const one as is.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: FnMut(&mut dyn ViewHolderBase, &mut dyn ViewHolderBase) + 'static,
    {
        log::debug!("view hooks: callback set");
        self.callbacks.borrow_mut().callback = Some(Box::new(callback));
    }

    /// Installs the const callback, leaving the write-capable one as is.
    pub fn set_const_callback<CF>(&self, const_callback: CF)
    where
        CF: FnMut(&dyn ConstViewHolderBase, &dyn ConstViewHolderBase) + 'static,
    {
        log::debug!("view hooks: const callback set");
        self.callbacks.borrow_mut().const_callback = Some(Box::new(const_callback));
    }

    /// Installs `callbacks` wholesale, returning the previous pair. Either side
    /// of `callbacks` may be empty.
    pub fn replace(&self, callbacks: Callbacks) -> Callbacks {
        log::debug!("view hooks: set {callbacks:?}");
        self.callbacks.replace(callbacks)
    }

    /// Removes both callbacks.
    pub fn clear(&self) {
        log::debug!("view hooks: cleared");
        self.callbacks.replace(Callbacks::default());
    }

    /// Whether at least one callback is registered.
    pub fn is_set(&self) -> bool {
        !self.callbacks.borrow().is_empty()
    }

    /// Dispatches one prospective hooked copy from `src_view` to `view`.
    ///
    /// The registered callbacks are moved out and the registry left empty;
    /// both views are wrapped in the holder kind their data type selects; the
    /// write-capable callback runs for non-const data, the const callback for
    /// const data; then the moved-out pair is restored. Restoration also
    /// happens if the callback panics.
    pub fn call<D, L, M>(&self, view: &mut View<D, L, M>, src_view: &mut View<D, L, M>)
    where
        D: DataType<Access: HolderSelect>,
        L: Layout,
        M: MemorySpace,
    {
        let mut guard = SwapGuard {
            hooks: self,
            saved: self.callbacks.take(),
        };
        log::trace!(
            "view hooks: dispatching '{}' <- '{}' ({})",
            view.label(),
            src_view.label(),
            if D::IS_CONST { "const" } else { "mutable" }
        );
        <D::Access as HolderSelect>::dispatch(&mut guard.saved, view, src_view);
    }
}

impl std::fmt::Debug for ViewHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewHooks")
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

/// Puts the swapped-out callbacks back into the registry on scope exit.
struct SwapGuard<'a> {
    hooks: &'a ViewHooks,
    saved: Callbacks,
}

impl Drop for SwapGuard<'_> {
    fn drop(&mut self) {
        self.hooks
            .callbacks
            .replace(std::mem::take(&mut self.saved));
    }
}
