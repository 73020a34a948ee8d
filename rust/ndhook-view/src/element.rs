//! Element types and the const / non-const data type split.

use std::marker::PhantomData;

/// A plain-old-data value that can be stored in a view.
pub trait Element:
    bytemuck::Pod + PartialEq + std::fmt::Debug + Send + Sync + 'static
{
}

macro_rules! impl_element {
    ($($t:ty),* $(,)?) => {
        $(impl Element for $t {})*
    };
}

impl_element!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize, isize, f32, f64);

/// Names the const-element data type of `T`.
///
/// `View<Const<f64>>` is a read-only view of `f64` values; it never
/// exposes a write path, and neither does anything built from it.
pub struct Const<T>(PhantomData<fn() -> T>);

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::ReadWrite {}
    impl Sealed for super::ReadOnly {}
}

/// Access capability carried by a [`DataType`].
pub trait Access: sealed::Sealed + 'static {
    const IS_CONST: bool;
}

/// Marker for non-const element data.
pub enum ReadWrite {}

/// Marker for const element data.
pub enum ReadOnly {}

impl Access for ReadWrite {
    const IS_CONST: bool = false;
}

impl Access for ReadOnly {
    const IS_CONST: bool = true;
}

/// The data type parameter of a view: an element type plus its constness.
pub trait DataType: 'static {
    /// The non-const value type.
    type Value: Element;
    type Access: Access;

    const IS_CONST: bool = <Self::Access as Access>::IS_CONST;
}

impl<T: Element> DataType for T {
    type Value = T;
    type Access = ReadWrite;
}

impl<T: Element> DataType for Const<T> {
    type Value = T;
    type Access = ReadOnly;
}
