use std::{marker::PhantomData, sync::Arc};

use ndhook_common::{Error, Result, verify_arg};

use crate::{
    allocation::{AllocationOptions, SharedAllocationRecord},
    element::{Const, DataType, Element, ReadWrite},
    layout::{Layout, LayoutRight, LayoutStride, Mapping, Shape},
    space::{AnonymousSpace, HostSpace, MemorySpace},
};

/// A multidimensional array handle bound to a data type, a layout and a
/// memory space.
///
/// Cloning a view is cheap: clones share the same allocation record, and a
/// write through any of them is visible through all of them. The element data
/// is only released when the last handle goes away.
pub struct View<D: DataType, L: Layout = LayoutRight, M: MemorySpace = HostSpace> {
    record: Arc<SharedAllocationRecord>,
    mapping: Mapping,
    _marker: PhantomData<fn() -> (D, L, M)>,
}

impl<D: DataType, L: Layout, M: MemorySpace> View<D, L, M> {
    /// Allocates a zero-filled view whose extents are all dynamic.
    pub fn new(label: impl Into<String>, extents: &[usize]) -> Result<Self> {
        Self::with_options(label, Shape::dynamic(extents)?, AllocationOptions::default())
    }

    /// Allocates a zero-filled view with `dynamic` runtime extents followed by
    /// `static_extents`.
    pub fn with_static_extents(
        label: impl Into<String>,
        dynamic: &[usize],
        static_extents: &[usize],
    ) -> Result<Self> {
        Self::with_options(
            label,
            Shape::new(dynamic, static_extents)?,
            AllocationOptions::default(),
        )
    }

    /// Allocates a zero-filled view of `shape` under the layout's default mapping.
    pub fn with_options(
        label: impl Into<String>,
        shape: Shape,
        options: AllocationOptions,
    ) -> Result<Self> {
        Self::allocate(label.into(), L::mapping(shape), options)
    }

    /// Allocates a view and fills it from `values`, given in row-major logical
    /// order.
    pub fn from_elements(
        label: impl Into<String>,
        extents: &[usize],
        values: &[D::Value],
    ) -> Result<Self> {
        let view = Self::new(label, extents)?;
        if values.len() != view.size() {
            return Err(Error::invalid_arg(
                "values",
                format!(
                    "{} values supplied for a view of {} elements",
                    values.len(),
                    view.size()
                ),
            ));
        }
        view.scatter_values(values);
        Ok(view)
    }

    fn allocate(label: String, mapping: Mapping, options: AllocationOptions) -> Result<Self> {
        let alignment = options
            .alignment
            .max(std::mem::align_of::<D::Value>());
        verify_arg!(alignment, alignment.is_power_of_two());
        let byte_len = mapping
            .span()
            .checked_mul(std::mem::size_of::<D::Value>())
            .filter(|&n| n.checked_add(alignment).is_some_and(|t| t <= isize::MAX as usize))
            .ok_or_else(|| {
                Error::invalid_arg(
                    "extents",
                    format!("{} elements exceed the addressable size", mapping.span()),
                )
            })?;
        let record = SharedAllocationRecord::allocate(
            label,
            M::KIND,
            byte_len,
            AllocationOptions { alignment },
        );
        Ok(View {
            record,
            mapping,
            _marker: PhantomData,
        })
    }

    pub fn label(&self) -> &str {
        self.record.label()
    }

    /// Number of elements covered by the allocation footprint; exceeds
    /// [`View::size`] for non-contiguous strided views.
    pub fn span(&self) -> usize {
        self.mapping.span()
    }

    pub fn span_is_contiguous(&self) -> bool {
        self.mapping.span_is_contiguous()
    }

    /// Bytes covered by the allocation footprint.
    pub fn byte_span(&self) -> usize {
        self.span() * std::mem::size_of::<D::Value>()
    }

    /// Opaque, non-owning address of the first element.
    pub fn data(&self) -> *const u8 {
        self.record.data_ptr()
    }

    pub fn rank(&self) -> usize {
        self.mapping.shape().rank()
    }

    pub fn rank_dynamic(&self) -> usize {
        self.mapping.shape().rank_dynamic()
    }

    pub fn extent(&self, r: usize) -> usize {
        self.mapping.shape().extent(r)
    }

    pub fn extents(&self) -> &[usize] {
        self.mapping.shape().extents()
    }

    /// Number of logical elements.
    pub fn size(&self) -> usize {
        self.mapping.shape().size()
    }

    pub fn shape(&self) -> &Shape {
        self.mapping.shape()
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn allocation_record(&self) -> &Arc<SharedAllocationRecord> {
        &self.record
    }

    /// Reads the element at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    pub fn get(&self, idx: &[usize]) -> D::Value {
        let offset = self.mapping.offset(idx);
        self.elements_read(|data| data[offset])
    }

    /// Copies all logical elements out in row-major order.
    pub fn to_vec(&self) -> Vec<D::Value> {
        let mut out = Vec::with_capacity(self.size());
        self.gather_values(&mut out);
        out
    }

    /// Erases the memory space from the view's type.
    pub fn into_anonymous(self) -> View<D, L, AnonymousSpace> {
        View {
            record: self.record,
            mapping: self.mapping,
            _marker: PhantomData,
        }
    }

    pub(crate) fn rebind(&mut self, record: Arc<SharedAllocationRecord>) {
        self.record = record;
    }

    pub(crate) fn gather_values(&self, out: &mut Vec<D::Value>) {
        self.elements_read(|data| {
            if self.mapping.is_row_major_contiguous() {
                out.extend_from_slice(&data[..self.mapping.span()]);
            } else {
                self.mapping
                    .for_each_index(|idx| out.push(data[self.mapping.offset(idx)]));
            }
        })
    }

    /// Writes through the shared record without requiring write access in the
    /// type; used at construction and by the `ReadWrite` mutators.
    pub(crate) fn scatter_values(&self, values: &[D::Value]) {
        assert_eq!(values.len(), self.size());
        self.elements_write(|data| {
            if self.mapping.is_row_major_contiguous() {
                data[..values.len()].copy_from_slice(values);
            } else {
                let mut it = values.iter();
                self.mapping.for_each_index(|idx| {
                    if let Some(&v) = it.next() {
                        data[self.mapping.offset(idx)] = v;
                    }
                });
            }
        })
    }

    fn elements_read<R>(&self, f: impl FnOnce(&[D::Value]) -> R) -> R {
        let bytes = self.record.read();
        f(bytemuck::cast_slice(&bytes.as_slice()[..self.byte_span()]))
    }

    fn elements_write<R>(&self, f: impl FnOnce(&mut [D::Value]) -> R) -> R {
        let byte_span = self.byte_span();
        let mut bytes = self.record.write();
        f(bytemuck::cast_slice_mut(&mut bytes.as_mut_slice()[..byte_span]))
    }
}

impl<D, L, M> View<D, L, M>
where
    D: DataType<Access = ReadWrite>,
    L: Layout,
    M: MemorySpace,
{
    /// Writes `value` at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    pub fn set(&mut self, idx: &[usize], value: D::Value) {
        let offset = self.mapping.offset(idx);
        self.elements_write(|data| data[offset] = value);
    }

    /// Sets every logical element to `value`.
    pub fn fill(&mut self, value: D::Value) {
        self.elements_write(|data| {
            self.mapping
                .for_each_index(|idx| data[self.mapping.offset(idx)] = value)
        });
    }

    /// Overwrites the view from `values` in row-major logical order.
    pub fn copy_from_slice(&mut self, values: &[D::Value]) -> Result<()> {
        if values.len() != self.size() {
            return Err(Error::shape_mismatch(&[self.size()], &[values.len()]));
        }
        self.scatter_values(values);
        Ok(())
    }
}

impl<T: Element, L: Layout, M: MemorySpace> View<T, L, M> {
    /// Converts into a read-only view of the same allocation.
    pub fn into_const(self) -> View<Const<T>, L, M> {
        View {
            record: self.record,
            mapping: self.mapping,
            _marker: PhantomData,
        }
    }
}

impl<D: DataType, M: MemorySpace> View<D, LayoutStride, M> {
    /// Allocates a zero-filled strided view; `strides` are in elements, one per
    /// rank.
    pub fn with_strides(
        label: impl Into<String>,
        extents: &[usize],
        strides: &[usize],
    ) -> Result<Self> {
        let mapping = Mapping::strided(Shape::dynamic(extents)?, strides)?;
        Self::allocate(label.into(), mapping, AllocationOptions::default())
    }
}

impl<D: DataType, L: Layout, M: MemorySpace> Clone for View<D, L, M> {
    fn clone(&self) -> Self {
        View {
            record: self.record.clone(),
            mapping: self.mapping,
            _marker: PhantomData,
        }
    }
}

impl<D: DataType, L: Layout, M: MemorySpace> std::fmt::Debug for View<D, L, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("label", &self.label())
            .field("extents", &self.extents())
            .field("layout", &L::KIND)
            .field("space", &M::KIND)
            .field("const", &D::IS_CONST)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeviceSpace, LayoutLeft, SpaceKind};

    #[test]
    fn test_new_view_metadata() {
        let v = View::<f64, LayoutLeft, DeviceSpace>::new("dev", &[3, 4]).unwrap();
        assert_eq!(v.label(), "dev");
        assert_eq!(v.span(), 12);
        assert!(v.span_is_contiguous());
        assert_eq!(v.rank(), 2);
        assert_eq!(v.rank_dynamic(), 2);
        assert_eq!(v.byte_span(), 96);
        assert_eq!(v.allocation_record().space(), SpaceKind::Device);
        assert!(!v.data().is_null());
        assert_eq!(v.to_vec(), vec![0.0; 12]);
    }

    #[test]
    fn test_layouts_agree_on_logical_order() {
        let values: Vec<i32> = (0..24).collect();
        let left = View::<i32, LayoutLeft>::from_elements("l", &[2, 3, 4], &values).unwrap();
        let right = View::<i32, LayoutRight>::from_elements("r", &[2, 3, 4], &values).unwrap();
        assert_eq!(left.to_vec(), values);
        assert_eq!(right.to_vec(), values);
        assert_eq!(left.get(&[1, 2, 3]), 23);
        assert_eq!(right.get(&[1, 0, 2]), 14);
    }

    #[test]
    fn test_strided_view() {
        let mut v = View::<u16, LayoutStride>::with_strides("s", &[3, 2], &[4, 1]).unwrap();
        assert_eq!(v.span(), 10);
        assert!(!v.span_is_contiguous());
        v.copy_from_slice(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(v.get(&[2, 1]), 6);
        assert_eq!(v.to_vec(), vec![1, 2, 3, 4, 5, 6]);
        let raw = v.allocation_record().read().typed_data::<u16>().to_vec();
        assert_eq!(raw, vec![1, 2, 0, 0, 3, 4, 0, 0, 5, 6]);
    }

    #[test]
    fn test_clones_share_allocation() {
        let mut a = View::<u32>::new("a", &[4]).unwrap();
        let b = a.clone();
        a.fill(7);
        assert_eq!(b.to_vec(), vec![7; 4]);
        assert_eq!(a.allocation_record().use_count(), 2);
        let c = b.into_const();
        assert_eq!(c.get(&[3]), 7);
    }

    #[test]
    fn test_from_elements_wrong_count() {
        assert!(View::<f32>::from_elements("x", &[2, 2], &[1.0]).is_err());
    }

    #[test]
    fn test_alignment_option() {
        let shape = Shape::dynamic(&[5]).unwrap();
        let v = View::<f64>::with_options("x", shape, AllocationOptions { alignment: 1 })
            .unwrap();
        assert!(v.allocation_record().read().is_aligned(8));
        let v = View::<u8>::with_options("y", shape, AllocationOptions { alignment: 4096 })
            .unwrap();
        assert!(v.allocation_record().read().is_aligned(4096));
    }

    #[test]
    fn test_static_extents() {
        let v = View::<i64>::with_static_extents("s", &[5], &[3, 2]).unwrap();
        assert_eq!(v.extents(), &[5, 3, 2]);
        assert_eq!(v.rank_dynamic(), 1);
        assert_eq!(v.shape().static_extents(), &[3, 2]);
    }

    #[test]
    fn test_oversized_extents_are_rejected() {
        assert!(View::<u8>::new("big", &[usize::MAX / 2, 4]).is_err());
        assert!(View::<u64>::new("big", &[usize::MAX / 4]).is_err());
        assert!(View::<u8>::new("big", &[0, usize::MAX, usize::MAX]).is_err());
        assert!(
            View::<u8, LayoutStride>::with_strides("big", &[2, 2], &[1, usize::MAX]).is_err()
        );
        assert!(
            View::<u8>::with_options(
                "x",
                Shape::dynamic(&[4]).unwrap(),
                AllocationOptions { alignment: 3 }
            )
            .is_err()
        );
    }

    #[test]
    fn test_overlapping_strides_are_rejected() {
        assert!(View::<f64, LayoutStride>::with_strides("z", &[3], &[0]).is_err());
        assert!(View::<f64, LayoutStride>::with_strides("o", &[2, 3], &[2, 1]).is_err());
        let v = View::<f64, LayoutStride>::with_strides("one", &[1, 3], &[0, 1]).unwrap();
        assert_eq!(v.span(), 3);
        assert!(v.span() >= v.size());
    }
}
