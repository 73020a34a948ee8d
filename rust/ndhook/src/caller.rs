//! Static eligibility of view types for hooking.

use ndhook_view::{DataType, Layout, LayoutKind, MemorySpace, SpaceKind, View};

use crate::{holder::HolderSelect, hooks::ViewHooks};

const SPACE_KINDS: usize = 4;
const LAYOUT_KINDS: usize = 3;

/// Eligibility by `[space][layout]`: hookable views live in a concrete,
/// non-scratch space and use one of the two simple contiguous layouts.
const HOOKS_ELIGIBILITY: [[bool; LAYOUT_KINDS]; SPACE_KINDS] = {
    let mut table = [[false; LAYOUT_KINDS]; SPACE_KINDS];
    table[space_index(SpaceKind::Host)][layout_index(LayoutKind::Left)] = true;
    table[space_index(SpaceKind::Host)][layout_index(LayoutKind::Right)] = true;
    table[space_index(SpaceKind::Device)][layout_index(LayoutKind::Left)] = true;
    table[space_index(SpaceKind::Device)][layout_index(LayoutKind::Right)] = true;
    table
};

const fn space_index(space: SpaceKind) -> usize {
    match space {
        SpaceKind::Host => 0,
        SpaceKind::Device => 1,
        SpaceKind::Scratch => 2,
        SpaceKind::Anonymous => 3,
    }
}

const fn layout_index(layout: LayoutKind) -> usize {
    match layout {
        LayoutKind::Left => 0,
        LayoutKind::Right => 1,
        LayoutKind::Stride => 2,
    }
}

/// Whether views in `space` with `layout` may ever reach [`ViewHooks::call`].
pub const fn hooks_eligible(space: SpaceKind, layout: LayoutKind) -> bool {
    HOOKS_ELIGIBILITY[space_index(space)][layout_index(layout)]
}

/// Per-type eligibility, evaluated once at compile time for each concrete
/// view type.
pub trait HookEligible {
    const ELIGIBLE: bool;
}

impl<D: DataType, L: Layout, M: MemorySpace> HookEligible for View<D, L, M> {
    const ELIGIBLE: bool = hooks_eligible(M::KIND, L::KIND);
}

/// The gate in front of [`ViewHooks::call`].
pub struct HooksCaller;

impl HooksCaller {
    /// Dispatches to `hooks` iff the view type is eligible and a callback is
    /// registered. Returns whether a dispatch happened.
    pub fn call<D, L, M>(
        hooks: &ViewHooks,
        view: &mut View<D, L, M>,
        src_view: &mut View<D, L, M>,
    ) -> bool
    where
        D: DataType<Access: HolderSelect>,
        L: Layout,
        M: MemorySpace,
    {
        if !<View<D, L, M> as HookEligible>::ELIGIBLE {
            log::trace!(
                "view hooks: '{}' not hookable ({}, {})",
                view.label(),
                M::KIND,
                L::KIND
            );
            return false;
        }
        if !hooks.is_set() {
            return false;
        }
        hooks.call(view, src_view);
        true
    }
}
