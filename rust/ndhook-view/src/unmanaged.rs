use std::marker::PhantomData;

use crate::{
    element::Element,
    layout::{Layout, LayoutRight, Mapping, Shape},
    space::{HostSpace, MemorySpace, SpaceKind},
};

/// A host-space view over caller-provided bytes.
///
/// The view is unmanaged: it does not participate in allocation tracking and
/// never owns more than the borrowed (or owned) byte container `B`. Elements
/// are read and written unaligned, so `B` can be any byte slice.
///
/// `B` must hold at least `span * size_of::<T>()` bytes; element access past
/// the end of `B` panics.
pub struct UnmanagedView<B, T, L = LayoutRight> {
    bytes: B,
    mapping: Mapping,
    _marker: PhantomData<fn() -> (T, L)>,
}

impl<B, T, L> UnmanagedView<B, T, L>
where
    B: AsRef<[u8]>,
    T: Element,
    L: Layout,
{
    /// The memory space of every unmanaged view.
    pub const SPACE: SpaceKind = HostSpace::KIND;

    /// Wraps `bytes` as a view of `shape` under `L`'s default mapping.
    pub fn new(bytes: B, shape: Shape) -> Self {
        let mapping = L::mapping(shape);
        debug_assert!(bytes.as_ref().len() >= mapping.span() * std::mem::size_of::<T>());
        UnmanagedView {
            bytes,
            mapping,
            _marker: PhantomData,
        }
    }

    pub fn shape(&self) -> &Shape {
        self.mapping.shape()
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn rank(&self) -> usize {
        self.shape().rank()
    }

    pub fn rank_dynamic(&self) -> usize {
        self.shape().rank_dynamic()
    }

    pub fn extent(&self, r: usize) -> usize {
        self.shape().extent(r)
    }

    pub fn span(&self) -> usize {
        self.mapping.span()
    }

    pub fn layout(&self) -> crate::LayoutKind {
        L::KIND
    }

    /// Unmanaged views never track their allocation.
    pub fn is_managed(&self) -> bool {
        false
    }

    pub fn get(&self, idx: &[usize]) -> T {
        self.read_at(self.mapping.offset(idx))
    }

    pub fn into_inner(self) -> B {
        self.bytes
    }

    #[inline]
    pub(crate) fn read_at(&self, offset: usize) -> T {
        let size = std::mem::size_of::<T>();
        bytemuck::pod_read_unaligned(&self.bytes.as_ref()[offset * size..(offset + 1) * size])
    }
}

impl<B, T, L> UnmanagedView<B, T, L>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
    T: Element,
    L: Layout,
{
    pub fn set(&mut self, idx: &[usize], value: T) {
        let offset = self.mapping.offset(idx);
        self.write_at(offset, value);
    }

    #[inline]
    pub(crate) fn write_at(&mut self, offset: usize, value: T) {
        let size = std::mem::size_of::<T>();
        self.bytes.as_mut()[offset * size..(offset + 1) * size]
            .copy_from_slice(bytemuck::bytes_of(&value));
    }
}

impl<B, T, L> std::fmt::Debug for UnmanagedView<B, T, L>
where
    L: Layout,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnmanagedView")
            .field("shape", self.mapping.shape())
            .field("layout", &L::KIND)
            .finish()
    }
}
