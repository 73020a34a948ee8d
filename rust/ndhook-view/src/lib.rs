//! Multidimensional views over tracked allocations in host, device and scratch
//! memory spaces.
//!
//! A [`View`] is parameterized at compile time by its data type (an element
//! type, possibly [`Const`]), its [`Layout`] and its [`MemorySpace`]. Views are
//! cheap shared handles onto a [`SharedAllocationRecord`]; [`UnmanagedView`]
//! wraps caller-owned bytes instead. [`deep_copy`] copies elements between any
//! two views of equal extents.

pub mod allocation;
pub mod copy;
pub mod element;
pub mod layout;
pub mod space;
pub mod unmanaged;
pub mod view;

pub use allocation::{
    AllocationOptions, SharedAllocationRecord, duplicate_allocation_record,
    set_allocation_record,
};
pub use copy::{ViewRead, ViewWrite, deep_copy};
pub use element::{Access, Const, DataType, Element, ReadOnly, ReadWrite};
pub use layout::{
    Layout, LayoutKind, LayoutLeft, LayoutRight, LayoutStride, MAX_RANK, Mapping, Shape,
    UNSPECIFIED_EXTENT,
};
pub use space::{AnonymousSpace, DeviceSpace, HostSpace, MemorySpace, ScratchSpace, SpaceKind};
pub use unmanaged::UnmanagedView;
pub use view::View;
