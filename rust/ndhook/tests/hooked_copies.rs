use std::{cell::Cell, rc::Rc};

use ndhook::{
    ConstViewHolderBase, HooksCaller, StagingBuffer, ViewHolder, ViewHolderBase, ViewHooks,
    make_unmanaged_view_like,
};
use ndhook_view::{
    AnonymousSpace, Const, DeviceSpace, HostSpace, Layout, LayoutLeft, LayoutRight, LayoutStride,
    MemorySpace, ScratchSpace, View,
};

struct Counts {
    mutable: Rc<Cell<usize>>,
    constant: Rc<Cell<usize>>,
}

fn counting_hooks() -> (ViewHooks, Counts) {
    let hooks = ViewHooks::new();
    let counts = Counts {
        mutable: Rc::new(Cell::new(0)),
        constant: Rc::new(Cell::new(0)),
    };
    let mutable = counts.mutable.clone();
    let constant = counts.constant.clone();
    hooks.set(
        move |_, _| mutable.set(mutable.get() + 1),
        move |_, _| constant.set(constant.get() + 1),
    );
    (hooks, counts)
}

fn fire<L: Layout, M: MemorySpace>(hooks: &ViewHooks, mut a: View<f32, L, M>) -> bool {
    let mut b = a.clone();
    HooksCaller::call(hooks, &mut a, &mut b)
}

#[test]
fn eligible_views_reach_the_callback() {
    let (hooks, counts) = counting_hooks();
    assert!(fire(&hooks, View::<f32, LayoutLeft, HostSpace>::new("a", &[3]).unwrap()));
    assert!(fire(&hooks, View::<f32, LayoutRight, HostSpace>::new("b", &[3]).unwrap()));
    assert!(fire(&hooks, View::<f32, LayoutLeft, DeviceSpace>::new("c", &[3]).unwrap()));
    assert!(fire(&hooks, View::<f32, LayoutRight, DeviceSpace>::new("d", &[3]).unwrap()));
    assert_eq!(counts.mutable.get(), 4);
    assert_eq!(counts.constant.get(), 0);
}

#[test]
fn ineligible_views_never_reach_the_callback() {
    let (hooks, counts) = counting_hooks();
    assert!(hooks.is_set());
    assert!(!fire(&hooks, View::<f32, LayoutRight, ScratchSpace>::new("a", &[3]).unwrap()));
    assert!(!fire(&hooks, View::<f32, LayoutLeft, ScratchSpace>::new("b", &[3]).unwrap()));
    assert!(!fire(
        &hooks,
        View::<f32, LayoutRight, HostSpace>::new("c", &[3])
            .unwrap()
            .into_anonymous()
    ));
    assert!(!fire(
        &hooks,
        View::<f32, LayoutStride, DeviceSpace>::with_strides("d", &[3], &[2]).unwrap()
    ));
    let _: View<f32, LayoutRight, AnonymousSpace> =
        View::<f32, LayoutRight, DeviceSpace>::new("e", &[1]).unwrap().into_anonymous();
    assert_eq!(counts.mutable.get(), 0);
    assert_eq!(counts.constant.get(), 0);
}

#[test]
fn const_views_reach_the_const_callback() {
    let (hooks, counts) = counting_hooks();
    let mut a = View::<u64, LayoutLeft, DeviceSpace>::new("a", &[2]).unwrap().into_const();
    let mut b = a.clone();
    let _: &View<Const<u64>, LayoutLeft, DeviceSpace> = &a;
    assert!(HooksCaller::call(&hooks, &mut a, &mut b));
    assert_eq!(counts.constant.get(), 1);
    assert_eq!(counts.mutable.get(), 0);
}

#[test]
fn nested_copy_inside_callback_is_not_hooked() {
    let hooks = Rc::new(ViewHooks::new());
    let depth = Rc::new(Cell::new(0usize));
    let max_depth = Rc::new(Cell::new(0usize));
    {
        let inner = hooks.clone();
        let depth = depth.clone();
        let max_depth = max_depth.clone();
        hooks.set_callback(move |dst, src| {
            depth.set(depth.get() + 1);
            max_depth.set(max_depth.get().max(depth.get()));
            assert!(!inner.is_set());

            // Migrate through a temporary view using the hooked copy path.
            let mut tmp = View::<f64>::new("tmp", &[src.span()]).unwrap();
            let mut staged = View::<f64>::new("staged", &[src.span()]).unwrap();
            let buffer = StagingBuffer::stage_from(&*src).unwrap();
            ViewHolder::new(&mut staged)
                .deep_copy_from_buffer(buffer.as_slice())
                .unwrap();
            ndhook::deep_copy(&inner, &mut tmp, &mut staged).unwrap();
            dst.deep_copy_from_buffer(buffer.as_slice()).unwrap();

            depth.set(depth.get() - 1);
        });
    }

    let mut dst = View::<f64>::new("dst", &[5]).unwrap();
    let mut src = View::<f64>::from_elements("src", &[5], &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    ndhook::deep_copy(&hooks, &mut dst, &mut src).unwrap();
    assert_eq!(dst.to_vec(), src.to_vec());
    assert_eq!(max_depth.get(), 1);
    assert!(hooks.is_set());
}

fn round_trip<L, M>(extents: &[usize])
where
    L: Layout,
    M: MemorySpace,
{
    let mut view = View::<f64, L, M>::new("rt", extents).unwrap();
    let values: Vec<f64> = (0..view.size()).map(|_| fastrand::f64() * 100.0).collect();
    view.copy_from_slice(&values).unwrap();

    let mut holder = ViewHolder::new(&mut view);
    let buffer = StagingBuffer::stage_from(&holder).unwrap();
    holder.view().clone().fill(-1.0);
    buffer.restore_into(&mut holder).unwrap();
    assert_eq!(view.to_vec(), values, "{extents:?}");
}

#[test]
fn buffer_round_trip_restores_values() {
    for rank in 0..=4 {
        let extents: Vec<usize> = (0..rank).map(|_| fastrand::usize(1..5)).collect();
        round_trip::<LayoutLeft, HostSpace>(&extents);
        round_trip::<LayoutRight, DeviceSpace>(&extents);
        round_trip::<LayoutStride, HostSpace>(&extents);
    }
}

#[test]
fn staging_view_shape_matches_source() {
    let view = View::<i32, LayoutLeft, DeviceSpace>::with_static_extents("v", &[4, 3], &[2, 2])
        .unwrap();
    let buffer = vec![0u8; view.byte_span()];
    let staging = make_unmanaged_view_like(&view, &buffer[..]);
    assert_eq!(staging.rank(), view.rank());
    for r in 0..view.rank_dynamic() {
        assert_eq!(staging.extent(r), view.extent(r));
    }
    assert_eq!(staging.shape().extents(), view.extents());
    assert_eq!(staging.layout(), ndhook_view::LayoutKind::Left);
}

#[test]
fn holders_expose_source_metadata() {
    let hooks = ViewHooks::new();
    let seen = Rc::new(Cell::new(false));
    {
        let seen = seen.clone();
        hooks.set_callback(move |dst, src| {
            let dst: &dyn ConstViewHolderBase = &*dst;
            assert_eq!(dst.label(), "dst");
            assert!(!dst.is_hostspace());
            assert_eq!(src.span(), 12);
            assert!(src.span_is_contiguous());
            assert_eq!(src.data_type_size(), 2);
            assert!(!src.data().is_null());
            seen.set(true);
        });
    }
    let mut dst = View::<u16, LayoutRight, DeviceSpace>::new("dst", &[3, 4]).unwrap();
    let mut src = View::<u16, LayoutRight, DeviceSpace>::new("src", &[3, 4]).unwrap();
    ndhook::deep_copy(&hooks, &mut dst, &mut src).unwrap();
    assert!(seen.get());
}

#[test]
fn duplicate_then_fill_migrates_allocation() {
    let hooks = ViewHooks::new();
    hooks.set_callback(|dst, src| {
        let staged = StagingBuffer::stage_from(&*src).unwrap();
        dst.duplicate_allocation(&*src).unwrap();
        staged.restore_into(dst).unwrap();
    });
    let mut dst = View::<i32, LayoutLeft, HostSpace>::new("dst", &[2, 2]).unwrap();
    let old = dst.clone();
    let mut src =
        View::<i32, LayoutLeft, HostSpace>::from_elements("src", &[2, 2], &[9, 8, 7, 6]).unwrap();
    assert!(HooksCaller::call(&hooks, &mut dst, &mut src));
    assert_eq!(dst.to_vec(), vec![9, 8, 7, 6]);
    assert_eq!(old.to_vec(), vec![0, 0, 0, 0]);
    assert_eq!(dst.label(), "src");
}
