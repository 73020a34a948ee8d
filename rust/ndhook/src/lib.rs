//! Type-erased interception of deep copies between views.
//!
//! A copy-initiating call path hands a destination / source view pair to
//! [`HooksCaller::call`]. If the view type is eligible for hooking and a
//! callback is registered in the [`ViewHooks`] registry, both views are wrapped
//! in holders ([`ViewHolderBase`] for non-const element types,
//! [`ConstViewHolderBase`] otherwise) and handed to the matching callback,
//! which can inspect the views' footprint, stage their elements through a raw
//! buffer, or rebind the destination to a fresh allocation, all without
//! knowing the views' element type, rank, layout or memory space.
//!
//! [`deep_copy`] is the hooked copy entry point: the gated hook dispatch
//! followed by the element-wise copy.

pub mod caller;
pub mod copy;
pub mod holder;
pub mod hooks;
pub mod metadata;
pub mod staging;

pub use caller::{HookEligible, HooksCaller, hooks_eligible};
pub use copy::deep_copy;
pub use holder::{
    ConstViewHolder, ConstViewHolderBase, HolderSelect, ViewHolder, ViewHolderBase,
};
pub use hooks::{Callbacks, ConstViewCallback, ViewCallback, ViewHooks};
pub use metadata::ViewMetadata;
pub use staging::{StagingBuffer, StagingView, make_unmanaged_view_like};
