//! Shaping raw bytes to match a view for a buffer-mediated deep copy.

use ndhook_bytes::AlignedBytes;
use ndhook_common::Result;
use ndhook_view::{
    DataType, Layout, MAX_RANK, MemorySpace, UNSPECIFIED_EXTENT, UnmanagedView, View,
};

use crate::holder::{ConstViewHolderBase, ViewHolderBase};

/// The staging view type for `View<D, L, M>` over bytes `B`: the non-const
/// value type, `L`'s staging layout (left stays left, anything else becomes
/// right), host space, unmanaged.
pub type StagingView<B, D, L> = UnmanagedView<B, <D as DataType>::Value, <L as Layout>::Staging>;

/// Builds an unmanaged, contiguous host view over `buffer`, shaped like `view`.
///
/// Extents of the dynamic ranks are copied from `view`; the remaining ranks
/// are passed as [`UNSPECIFIED_EXTENT`] and resolve to the view's static
/// extents. The result is only meant to be one side of a `deep_copy` with
/// `view`.
///
/// `buffer` must hold at least `view.span()` elements' worth of bytes.
pub fn make_unmanaged_view_like<B, D, L, M>(view: &View<D, L, M>, buffer: B) -> StagingView<B, D, L>
where
    B: AsRef<[u8]>,
    D: DataType,
    L: Layout,
    M: MemorySpace,
{
    let mut args = [UNSPECIFIED_EXTENT; MAX_RANK];
    for (r, arg) in args.iter_mut().enumerate().take(view.rank_dynamic()) {
        *arg = view.extent(r);
    }
    UnmanagedView::new(buffer, view.shape().from_ctor_args(&args))
}

/// An owned, aligned buffer sized to stage one holder's view.
#[derive(Debug, Clone)]
pub struct StagingBuffer(AlignedBytes);

impl StagingBuffer {
    /// A zeroed buffer of `span() * data_type_size()` bytes.
    pub fn for_holder(holder: &dyn ConstViewHolderBase) -> StagingBuffer {
        StagingBuffer(AlignedBytes::zeroed(holder.metadata().byte_len()))
    }

    /// Allocates a buffer for `holder` and copies the view's elements into it.
    pub fn stage_from(holder: &dyn ConstViewHolderBase) -> Result<StagingBuffer> {
        let mut buffer = StagingBuffer::for_holder(holder);
        holder.deep_copy_to_buffer(buffer.as_mut_slice())?;
        Ok(buffer)
    }

    /// Copies the staged elements back into `holder`'s view.
    pub fn restore_into(&self, holder: &mut dyn ViewHolderBase) -> Result<()> {
        holder.deep_copy_from_buffer(self.as_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.0.as_mut_slice()
    }
}
