use crate::align::{align_up, is_aligned};

/// A fixed-length, zero-initialized byte allocation whose start address
/// satisfies a caller-chosen alignment.
///
/// `AlignedBytes` never grows or reallocates after construction, so the address
/// returned by [`AlignedBytes::as_ptr`] is stable for the lifetime of the value.
/// This is what allows a view to publish an opaque data pointer that stays valid
/// while its allocation record is alive.
pub struct AlignedBytes {
    /// Backing storage, over-allocated by up to `alignment` bytes.
    inner: Vec<u8>,
    /// Offset of the first aligned byte within `inner`.
    start: usize,
    len: usize,
    alignment: usize,
}

impl AlignedBytes {
    /// Default alignment in bytes; enough for any primitive element type
    /// and a full cache line.
    pub const DEFAULT_ALIGNMENT: usize = 64;

    /// Allocates `len` zero bytes with the default alignment.
    pub fn zeroed(len: usize) -> AlignedBytes {
        Self::zeroed_with_alignment(len, Self::DEFAULT_ALIGNMENT)
    }

    /// Allocates `len` zero bytes aligned to `alignment`.
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is not a power of two, or if `len + alignment`
    /// overflows `usize`.
    pub fn zeroed_with_alignment(len: usize, alignment: usize) -> AlignedBytes {
        let alignment = alignment.max(1);
        assert!(alignment.is_power_of_two());

        let total = len.checked_add(alignment).expect("aligned allocation size overflows usize");
        let inner = vec![0u8; total];
        let p = inner.as_ptr() as usize;
        let start = align_up(p, alignment) - p;
        debug_assert!(start + len <= inner.len());
        AlignedBytes {
            inner,
            start,
            len,
            alignment,
        }
    }

    /// Allocates a copy of `data` aligned to `alignment`.
    pub fn copy_from_slice(data: &[u8], alignment: usize) -> AlignedBytes {
        let mut bytes = Self::zeroed_with_alignment(data.len(), alignment);
        bytes.as_mut_slice().copy_from_slice(data);
        bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The alignment requested at construction.
    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.as_slice().as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner[self.start..self.start + self.len]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.inner[self.start..self.start + self.len]
    }

    /// Checks whether the start of the allocation is aligned to `alignment`.
    pub fn is_aligned(&self, alignment: usize) -> bool {
        is_aligned(self.as_ptr() as usize, alignment)
    }

    /// Returns the bytes reinterpreted as a slice of `T`.
    ///
    /// # Panics
    ///
    /// Panics if the length is not a multiple of `size_of::<T>()` or the
    /// allocation is not sufficiently aligned for `T`.
    #[inline]
    pub fn typed_data<T>(&self) -> &[T]
    where
        T: bytemuck::AnyBitPattern,
    {
        bytemuck::cast_slice(self.as_slice())
    }

    /// Returns the bytes reinterpreted as a mutable slice of `T`.
    #[inline]
    pub fn typed_data_mut<T>(&mut self) -> &mut [T]
    where
        T: bytemuck::AnyBitPattern + bytemuck::NoUninit,
    {
        bytemuck::cast_slice_mut(self.as_mut_slice())
    }
}

impl Clone for AlignedBytes {
    fn clone(&self) -> Self {
        AlignedBytes::copy_from_slice(self.as_slice(), self.alignment)
    }
}

impl std::fmt::Debug for AlignedBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBytes")
            .field("len", &self.len)
            .field("alignment", &self.alignment)
            .finish()
    }
}

impl Default for AlignedBytes {
    fn default() -> Self {
        AlignedBytes::zeroed(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed() {
        let b = AlignedBytes::zeroed(100);
        assert_eq!(b.len(), 100);
        assert!(b.as_slice().iter().all(|&x| x == 0));
        assert!(b.is_aligned(AlignedBytes::DEFAULT_ALIGNMENT));
    }

    #[test]
    fn test_zero_length() {
        let b = AlignedBytes::zeroed(0);
        assert!(b.is_empty());
        assert!(b.is_aligned(64));
        assert!(b.typed_data::<f64>().is_empty());
    }

    #[test]
    fn test_custom_alignment() {
        for alignment in [1usize, 8, 32, 256, 4096] {
            let b = AlignedBytes::zeroed_with_alignment(17, alignment);
            assert!(b.is_aligned(alignment));
            assert_eq!(b.alignment(), alignment);
        }
    }

    #[test]
    fn test_typed_access() {
        let mut b = AlignedBytes::zeroed(8 * 4);
        b.typed_data_mut::<u64>()
            .iter_mut()
            .enumerate()
            .for_each(|(i, v)| *v = i as u64 * 10);
        assert_eq!(b.typed_data::<u64>(), &[0, 10, 20, 30]);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut a = AlignedBytes::copy_from_slice(&[1, 2, 3, 4], 128);
        let b = a.clone();
        a.as_mut_slice()[0] = 9;
        assert_eq!(b.as_slice(), &[1, 2, 3, 4]);
        assert!(b.is_aligned(128));
        assert_ne!(a.as_ptr(), b.as_ptr());
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AlignedBytes>();
    }
}
