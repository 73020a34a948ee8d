use ndhook_view::{DataType, Layout, MemorySpace, SpaceKind, View};

/// A plain snapshot of a view's footprint, taken when a holder is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMetadata {
    /// Element-count footprint of the allocation; may exceed the logical
    /// element count when the span is not contiguous.
    pub span: usize,
    pub span_is_contiguous: bool,
    /// Opaque, non-owning address of the first element.
    pub data: *const u8,
    pub label: String,
    /// Bytes per element.
    pub data_type_size: usize,
    pub is_hostspace: bool,
}

impl ViewMetadata {
    pub fn of<D, L, M>(view: &View<D, L, M>) -> ViewMetadata
    where
        D: DataType,
        L: Layout,
        M: MemorySpace,
    {
        ViewMetadata {
            span: view.span(),
            span_is_contiguous: view.span_is_contiguous(),
            data: view.data(),
            label: view.label().to_string(),
            data_type_size: std::mem::size_of::<D::Value>(),
            is_hostspace: M::KIND == SpaceKind::Host,
        }
    }

    /// Minimum capacity, in bytes, of a buffer that stages the view.
    pub fn byte_len(&self) -> usize {
        self.span * self.data_type_size
    }
}
