//! Element-wise deep copy between views of any layout and memory space.

use ndhook_common::{Error, Result};

use crate::{
    element::{DataType, Element, ReadWrite},
    layout::{Layout, Shape},
    space::MemorySpace,
    unmanaged::UnmanagedView,
    view::View,
};

/// A view whose elements can be read in logical row-major order.
pub trait ViewRead {
    type Value: Element;

    fn shape(&self) -> &Shape;

    /// Appends every logical element to `out`, in row-major order.
    fn gather(&self, out: &mut Vec<Self::Value>);
}

/// A view whose elements can be overwritten in logical row-major order.
pub trait ViewWrite: ViewRead {
    /// Overwrites every logical element from `values`, in row-major order.
    ///
    /// `values.len()` must equal the shape's size.
    fn scatter(&mut self, values: &[Self::Value]);
}

impl<D: DataType, L: Layout, M: MemorySpace> ViewRead for View<D, L, M> {
    type Value = D::Value;

    fn shape(&self) -> &Shape {
        View::shape(self)
    }

    fn gather(&self, out: &mut Vec<D::Value>) {
        self.gather_values(out);
    }
}

impl<D, L, M> ViewWrite for View<D, L, M>
where
    D: DataType<Access = ReadWrite>,
    L: Layout,
    M: MemorySpace,
{
    fn scatter(&mut self, values: &[D::Value]) {
        self.scatter_values(values);
    }
}

impl<B, T, L> ViewRead for UnmanagedView<B, T, L>
where
    B: AsRef<[u8]>,
    T: Element,
    L: Layout,
{
    type Value = T;

    fn shape(&self) -> &Shape {
        UnmanagedView::shape(self)
    }

    fn gather(&self, out: &mut Vec<T>) {
        let mapping = *self.mapping();
        mapping.for_each_index(|idx| out.push(self.read_at(mapping.offset(idx))));
    }
}

impl<B, T, L> ViewWrite for UnmanagedView<B, T, L>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
    T: Element,
    L: Layout,
{
    fn scatter(&mut self, values: &[T]) {
        assert_eq!(values.len(), self.shape().size());
        let mapping = *self.mapping();
        let mut it = values.iter();
        mapping.for_each_index(|idx| {
            if let Some(&v) = it.next() {
                self.write_at(mapping.offset(idx), v);
            }
        });
    }
}

/// Copies every element of `src` into `dst`.
///
/// Both views must have the same rank and extents; layouts and memory spaces
/// may differ. `dst` and `src` may share an allocation.
pub fn deep_copy<Dst, Src>(dst: &mut Dst, src: &Src) -> Result<()>
where
    Dst: ViewWrite + ?Sized,
    Src: ViewRead<Value = Dst::Value> + ?Sized,
{
    if dst.shape().extents() != src.shape().extents() {
        return Err(Error::shape_mismatch(
            dst.shape().extents(),
            src.shape().extents(),
        ));
    }
    log::trace!(
        "deep_copy: {} elements of {}",
        src.shape().size(),
        std::any::type_name::<Dst::Value>()
    );
    let mut values = Vec::with_capacity(src.shape().size());
    src.gather(&mut values);
    dst.scatter(&values);
    Ok(())
}
