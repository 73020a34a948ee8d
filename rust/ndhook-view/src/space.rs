//! Memory spaces a view's allocation can live in.

/// Runtime identity of a [`MemorySpace`] type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceKind {
    Host,
    Device,
    /// Team- or stack-local scratch memory.
    Scratch,
    /// Type-erased placeholder for a view whose space is not statically known.
    Anonymous,
}

impl std::fmt::Display for SpaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpaceKind::Host => write!(f, "HostSpace"),
            SpaceKind::Device => write!(f, "DeviceSpace"),
            SpaceKind::Scratch => write!(f, "ScratchSpace"),
            SpaceKind::Anonymous => write!(f, "AnonymousSpace"),
        }
    }
}

/// A compile-time memory space.
pub trait MemorySpace: Copy + Default + std::fmt::Debug + Send + Sync + 'static {
    const KIND: SpaceKind;

    const NAME: &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HostSpace;

/// Accelerator memory.
///
/// There is no device backend here: device allocations are host-addressable
/// and differ from host allocations only in their tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DeviceSpace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ScratchSpace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AnonymousSpace;

impl MemorySpace for HostSpace {
    const KIND: SpaceKind = SpaceKind::Host;
    const NAME: &'static str = "Host";
}

impl MemorySpace for DeviceSpace {
    const KIND: SpaceKind = SpaceKind::Device;
    const NAME: &'static str = "Device";
}

impl MemorySpace for ScratchSpace {
    const KIND: SpaceKind = SpaceKind::Scratch;
    const NAME: &'static str = "Scratch";
}

impl MemorySpace for AnonymousSpace {
    const KIND: SpaceKind = SpaceKind::Anonymous;
    const NAME: &'static str = "Anonymous";
}
