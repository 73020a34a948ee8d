use ndhook_common::Result;
use ndhook_view::{DataType, Layout, MemorySpace, ReadWrite, View};

use crate::{caller::HooksCaller, hooks::ViewHooks};

/// Copies `src_view` into `view`, giving the registered hook a chance to
/// observe the pair first.
///
/// The hook only fires for eligible view types (see
/// [`hooks_eligible`](crate::hooks_eligible)) when a callback is registered.
/// The element-wise copy always runs afterwards, so a callback that rebinds
/// `view` to a new allocation receives the copied values there.
pub fn deep_copy<D, L, M>(
    hooks: &ViewHooks,
    view: &mut View<D, L, M>,
    src_view: &mut View<D, L, M>,
) -> Result<()>
where
    D: DataType<Access = ReadWrite>,
    L: Layout,
    M: MemorySpace,
{
    HooksCaller::call(hooks, view, src_view);
    ndhook_view::deep_copy(view, &*src_view)
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use ndhook_view::{DeviceSpace, LayoutLeft, LayoutStride};

    #[test]
    fn test_copy_without_hooks() {
        let hooks = ViewHooks::new();
        let mut dst = View::<f64, LayoutLeft, DeviceSpace>::new("d", &[2, 3]).unwrap();
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut src =
            View::<f64, LayoutLeft, DeviceSpace>::from_elements("s", &[2, 3], &values).unwrap();
        deep_copy(&hooks, &mut dst, &mut src).unwrap();
        assert_eq!(dst.to_vec(), values);
    }

    #[test]
    fn test_hook_rebinds_destination_before_copy() {
        let hooks = ViewHooks::new();
        hooks.set_callback(|dst, src| dst.duplicate_allocation(&*src).unwrap());
        let mut dst = View::<u32>::new("d", &[3]).unwrap();
        let before = dst.allocation_record().clone();
        let mut src = View::<u32>::from_elements("s", &[3], &[5, 6, 7]).unwrap();
        deep_copy(&hooks, &mut dst, &mut src).unwrap();
        assert_eq!(dst.to_vec(), vec![5, 6, 7]);
        assert!(!std::sync::Arc::ptr_eq(&before, dst.allocation_record()));
        assert_eq!(before.read().typed_data::<u32>(), &[0, 0, 0]);
    }

    #[test]
    fn test_ineligible_views_still_copy() {
        let hooks = ViewHooks::new();
        let fired = Rc::new(Cell::new(0));
        {
            let fired = fired.clone();
            hooks.set_callback(move |_, _| fired.set(fired.get() + 1));
        }
        let mut dst = View::<i8, LayoutStride>::with_strides("d", &[2], &[3]).unwrap();
        let mut src = View::<i8, LayoutStride>::with_strides("s", &[2], &[1]).unwrap();
        src.copy_from_slice(&[-3, 3]).unwrap();
        deep_copy(&hooks, &mut dst, &mut src).unwrap();
        assert_eq!(dst.to_vec(), vec![-3, 3]);
        assert_eq!(fired.get(), 0);
    }
}
