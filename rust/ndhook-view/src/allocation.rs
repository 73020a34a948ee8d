//! Shared allocation records and the tracking operations views rely on.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ndhook_bytes::AlignedBytes;
use ndhook_common::{Error, Result};

use crate::{
    element::DataType,
    layout::Layout,
    space::{MemorySpace, SpaceKind},
    view::View,
};

/// Allocation-time options for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationOptions {
    /// Requested start alignment in bytes. Raised to the element alignment
    /// when smaller.
    pub alignment: usize,
}

impl Default for AllocationOptions {
    fn default() -> Self {
        AllocationOptions {
            alignment: AlignedBytes::DEFAULT_ALIGNMENT,
        }
    }
}

/// The tracked unit behind one allocation.
///
/// Records are shared through `Arc`: every view handle bound to the record
/// holds one reference, and the memory is released with the last one.
pub struct SharedAllocationRecord {
    label: String,
    space: SpaceKind,
    bytes: RwLock<AlignedBytes>,
}

impl SharedAllocationRecord {
    /// Allocates a zero-filled record of `byte_len` bytes.
    pub fn allocate(
        label: impl Into<String>,
        space: SpaceKind,
        byte_len: usize,
        options: AllocationOptions,
    ) -> Arc<SharedAllocationRecord> {
        Arc::new(SharedAllocationRecord {
            label: label.into(),
            space,
            bytes: RwLock::new(AlignedBytes::zeroed_with_alignment(
                byte_len,
                options.alignment,
            )),
        })
    }

    /// Allocates a new, independent, zero-filled record with the same label,
    /// space, size and alignment as this one. Element values are not copied.
    pub fn duplicate(&self) -> Arc<SharedAllocationRecord> {
        let (byte_len, alignment) = {
            let bytes = self.read();
            (bytes.len(), bytes.alignment())
        };
        log::debug!(
            "duplicating allocation '{}' ({} bytes, {})",
            self.label,
            byte_len,
            self.space
        );
        SharedAllocationRecord::allocate(
            self.label.clone(),
            self.space,
            byte_len,
            AllocationOptions { alignment },
        )
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn space(&self) -> SpaceKind {
        self.space
    }

    pub fn byte_len(&self) -> usize {
        self.read().len()
    }

    /// Start address of the allocation. Stable for the record's lifetime.
    pub fn data_ptr(&self) -> *const u8 {
        self.read().as_ptr()
    }

    /// Number of live handles sharing the record.
    pub fn use_count(self: &Arc<Self>) -> usize {
        Arc::strong_count(self)
    }

    pub fn read(&self) -> RwLockReadGuard<'_, AlignedBytes> {
        self.bytes.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, AlignedBytes> {
        self.bytes.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SharedAllocationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedAllocationRecord")
            .field("label", &self.label)
            .field("space", &self.space)
            .field("byte_len", &self.byte_len())
            .finish()
    }
}

/// Requests a new, independent allocation record derived from `view`'s
/// current one. See [`SharedAllocationRecord::duplicate`].
pub fn duplicate_allocation_record<D, L, M>(view: &View<D, L, M>) -> Arc<SharedAllocationRecord>
where
    D: DataType,
    L: Layout,
    M: MemorySpace,
{
    view.allocation_record().duplicate()
}

/// Rebinds `view` to `record`, releasing its reference to the previous one.
///
/// Fails if the record is too small to back the view's span, if it does not
/// guarantee the element alignment, or if it lives in a different memory
/// space than a space-typed view.
pub fn set_allocation_record<D, L, M>(
    view: &mut View<D, L, M>,
    record: Arc<SharedAllocationRecord>,
) -> Result<()>
where
    D: DataType,
    L: Layout,
    M: MemorySpace,
{
    if M::KIND != SpaceKind::Anonymous && record.space() != M::KIND {
        return Err(Error::invalid_arg(
            "record",
            format!(
                "allocation '{}' lives in {}, view is in {}",
                record.label(),
                record.space(),
                M::KIND
            ),
        ));
    }
    let required = view.byte_span();
    let available = record.byte_len();
    if available < required {
        return Err(Error::allocation_too_small(
            record.label(),
            required,
            available,
        ));
    }
    let required_alignment = std::mem::align_of::<D::Value>();
    {
        let bytes = record.read();
        if bytes.alignment() < required_alignment || !bytes.is_aligned(required_alignment) {
            return Err(Error::misaligned_allocation(
                record.label(),
                required_alignment,
                bytes.as_ptr() as usize,
            ));
        }
    }
    log::debug!(
        "binding view '{}' to allocation {:p}",
        view.label(),
        record.data_ptr()
    );
    view.rebind(record);
    Ok(())
}
