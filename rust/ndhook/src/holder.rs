//! Type-erased capability interfaces over concretely typed views.
//!
//! A hook callback never sees the element type, rank, layout or memory space
//! of the views it is handed. It sees a holder: [`ConstViewHolderBase`] for
//! read-only access, or [`ViewHolderBase`] when the view's element type is
//! non-const. Which of the two a view produces is decided by its data type at
//! compile time, so a `Const<T>` view can never be reached through the
//! write-capable interface.
//!
//! ```compile_fail
//! use ndhook::{ConstViewHolder, ViewHolderBase};
//! use ndhook_view::{Const, View};
//!
//! let view = View::<f64>::new("v", &[4]).unwrap().into_const();
//! let mut holder = ConstViewHolder::new(&view);
//! // Const holders have no write path.
//! holder.deep_copy_from_buffer(&[0u8; 32]).unwrap();
//! ```
//!
//! ```compile_fail
//! use ndhook::ViewHolder;
//! use ndhook_view::{Const, View};
//!
//! let mut view = View::<f64>::new("v", &[4]).unwrap().into_const();
//! // A write-capable holder cannot be built over a const view.
//! let holder = ViewHolder::new(&mut view);
//! ```

use std::sync::Arc;

use ndhook_common::Result;
use ndhook_view::{
    DataType, Layout, MemorySpace, ReadOnly, ReadWrite, SharedAllocationRecord, View,
    set_allocation_record,
};

use crate::{hooks::Callbacks, metadata::ViewMetadata, staging::make_unmanaged_view_like};

/// Read-only capability over one wrapped view.
pub trait ConstViewHolderBase {
    fn metadata(&self) -> &ViewMetadata;

    fn span(&self) -> usize {
        self.metadata().span
    }

    fn span_is_contiguous(&self) -> bool {
        self.metadata().span_is_contiguous
    }

    fn data(&self) -> *const u8 {
        self.metadata().data
    }

    fn label(&self) -> &str {
        &self.metadata().label
    }

    fn data_type_size(&self) -> usize {
        self.metadata().data_type_size
    }

    fn is_hostspace(&self) -> bool {
        self.metadata().is_hostspace
    }

    /// Copies the wrapped view's elements into `buffer`, laid out as a
    /// contiguous host array of the view's shape.
    ///
    /// `buffer` must hold at least `span() * data_type_size()` bytes.
    fn deep_copy_to_buffer(&self, buffer: &mut [u8]) -> Result<()>;
}

/// Read-write capability over one wrapped view with a non-const element type.
pub trait ViewHolderBase: ConstViewHolderBase {
    /// Copies elements from `buffer`, laid out as by
    /// [`ConstViewHolderBase::deep_copy_to_buffer`], into the wrapped view.
    fn deep_copy_from_buffer(&mut self, buffer: &[u8]) -> Result<()>;

    /// Binds the wrapped view to a new, independent allocation derived from
    /// `src`'s current one. Element values are not copied.
    fn duplicate_allocation(&mut self, src: &dyn ViewHolderBase) -> Result<()>;

    /// The allocation record the wrapped view is currently bound to.
    fn allocation_record(&self) -> &Arc<SharedAllocationRecord>;
}

/// Write-capable holder over a view with a non-const element type.
pub struct ViewHolder<'a, D: DataType, L: Layout, M: MemorySpace> {
    view: &'a mut View<D, L, M>,
    metadata: ViewMetadata,
}

impl<'a, D, L, M> ViewHolder<'a, D, L, M>
where
    D: DataType<Access = ReadWrite>,
    L: Layout,
    M: MemorySpace,
{
    pub fn new(view: &'a mut View<D, L, M>) -> Self {
        let metadata = ViewMetadata::of(view);
        ViewHolder { view, metadata }
    }

    pub fn view(&self) -> &View<D, L, M> {
        &*self.view
    }
}

impl<D, L, M> ConstViewHolderBase for ViewHolder<'_, D, L, M>
where
    D: DataType<Access = ReadWrite>,
    L: Layout,
    M: MemorySpace,
{
    fn metadata(&self) -> &ViewMetadata {
        &self.metadata
    }

    fn deep_copy_to_buffer(&self, buffer: &mut [u8]) -> Result<()> {
        let mut staging = make_unmanaged_view_like(&*self.view, buffer);
        ndhook_view::deep_copy(&mut staging, &*self.view)
    }
}

impl<D, L, M> ViewHolderBase for ViewHolder<'_, D, L, M>
where
    D: DataType<Access = ReadWrite>,
    L: Layout,
    M: MemorySpace,
{
    fn deep_copy_from_buffer(&mut self, buffer: &[u8]) -> Result<()> {
        let staging = make_unmanaged_view_like(&*self.view, buffer);
        ndhook_view::deep_copy(&mut *self.view, &staging)
    }

    fn duplicate_allocation(&mut self, src: &dyn ViewHolderBase) -> Result<()> {
        let record = src.allocation_record().duplicate();
        set_allocation_record(self.view, record)?;
        self.metadata = ViewMetadata::of(self.view);
        Ok(())
    }

    fn allocation_record(&self) -> &Arc<SharedAllocationRecord> {
        self.view.allocation_record()
    }
}

/// Read-only holder; the only holder a const-element view can produce.
pub struct ConstViewHolder<'a, D: DataType, L: Layout, M: MemorySpace> {
    view: &'a View<D, L, M>,
    metadata: ViewMetadata,
}

impl<'a, D, L, M> ConstViewHolder<'a, D, L, M>
where
    D: DataType,
    L: Layout,
    M: MemorySpace,
{
    pub fn new(view: &'a View<D, L, M>) -> Self {
        ConstViewHolder {
            view,
            metadata: ViewMetadata::of(view),
        }
    }

    pub fn view(&self) -> &View<D, L, M> {
        self.view
    }
}

impl<D, L, M> ConstViewHolderBase for ConstViewHolder<'_, D, L, M>
where
    D: DataType,
    L: Layout,
    M: MemorySpace,
{
    fn metadata(&self) -> &ViewMetadata {
        &self.metadata
    }

    fn deep_copy_to_buffer(&self, buffer: &mut [u8]) -> Result<()> {
        let mut staging = make_unmanaged_view_like(self.view, buffer);
        ndhook_view::deep_copy(&mut staging, self.view)
    }
}

/// Selects the holder kind for a data type's access marker and invokes the
/// matching callback with a destination / source holder pair.
pub trait HolderSelect: ndhook_view::Access + Sized {
    fn dispatch<D, L, M>(
        callbacks: &mut Callbacks,
        view: &mut View<D, L, M>,
        src_view: &mut View<D, L, M>,
    ) where
        D: DataType<Access = Self>,
        L: Layout,
        M: MemorySpace;
}

impl HolderSelect for ReadWrite {
    fn dispatch<D, L, M>(
        callbacks: &mut Callbacks,
        view: &mut View<D, L, M>,
        src_view: &mut View<D, L, M>,
    ) where
        D: DataType<Access = Self>,
        L: Layout,
        M: MemorySpace,
    {
        let mut holder = ViewHolder::new(view);
        let mut src_holder = ViewHolder::new(src_view);
        if let Some(callback) = callbacks.callback.as_mut() {
            callback(&mut holder, &mut src_holder);
        }
    }
}

impl HolderSelect for ReadOnly {
    fn dispatch<D, L, M>(
        callbacks: &mut Callbacks,
        view: &mut View<D, L, M>,
        src_view: &mut View<D, L, M>,
    ) where
        D: DataType<Access = Self>,
        L: Layout,
        M: MemorySpace,
    {
        let holder = ConstViewHolder::new(view);
        let src_holder = ConstViewHolder::new(src_view);
        if let Some(callback) = callbacks.const_callback.as_mut() {
            callback(&holder, &src_holder);
        }
    }
}
