//! Array layouts and the index-to-offset mappings they produce.

use ndhook_common::{Error, Result, verify_arg};

/// Maximum number of dimensions of a view.
pub const MAX_RANK: usize = 8;

/// Constructor sentinel meaning "no runtime extent supplied for this rank".
///
/// Ranks at or beyond a shape's dynamic rank take their extent from the static
/// part of the shape instead.
pub const UNSPECIFIED_EXTENT: usize = usize::MAX;

/// Runtime identity of a [`Layout`] type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// Column-major, contiguous: the leftmost index is fastest.
    Left,
    /// Row-major, contiguous: the rightmost index is fastest.
    Right,
    /// Arbitrary per-rank strides, possibly non-contiguous.
    Stride,
}

impl LayoutKind {
    /// Whether the layout is one of the two simple contiguous layouts.
    pub const fn is_simple(self) -> bool {
        matches!(self, LayoutKind::Left | LayoutKind::Right)
    }
}

impl std::fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutKind::Left => write!(f, "LayoutLeft"),
            LayoutKind::Right => write!(f, "LayoutRight"),
            LayoutKind::Stride => write!(f, "LayoutStride"),
        }
    }
}

/// A compile-time array layout.
pub trait Layout: Copy + Default + std::fmt::Debug + Send + Sync + 'static {
    const KIND: LayoutKind;

    /// The simple contiguous layout used when staging a view of this layout
    /// through a flat host buffer: `LayoutLeft` stays left, everything else
    /// becomes `LayoutRight`.
    type Staging: Layout;

    /// The default mapping of `shape` under this layout.
    fn mapping(shape: Shape) -> Mapping;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LayoutLeft;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LayoutRight;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LayoutStride;

impl Layout for LayoutLeft {
    const KIND: LayoutKind = LayoutKind::Left;
    type Staging = LayoutLeft;

    fn mapping(shape: Shape) -> Mapping {
        Mapping::left(shape)
    }
}

impl Layout for LayoutRight {
    const KIND: LayoutKind = LayoutKind::Right;
    type Staging = LayoutRight;

    fn mapping(shape: Shape) -> Mapping {
        Mapping::right(shape)
    }
}

impl Layout for LayoutStride {
    const KIND: LayoutKind = LayoutKind::Stride;
    type Staging = LayoutRight;

    /// Without explicit strides a strided view is laid out row-major.
    fn mapping(shape: Shape) -> Mapping {
        Mapping::right(shape)
    }
}

/// Extents of a view.
///
/// The first `rank_dynamic` extents are supplied at runtime; the remaining
/// `rank - rank_dynamic` are static, i.e. fixed by the view's data type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    extents: [usize; MAX_RANK],
    rank: u8,
    rank_dynamic: u8,
}

impl Shape {
    /// A rank-0 (scalar) shape.
    pub const fn scalar() -> Shape {
        Shape {
            extents: [1; MAX_RANK],
            rank: 0,
            rank_dynamic: 0,
        }
    }

    /// A shape whose extents are all dynamic.
    pub fn dynamic(extents: &[usize]) -> Result<Shape> {
        Shape::new(extents, &[])
    }

    /// A shape with `dynamic` runtime extents followed by `static_extents`.
    pub fn new(dynamic: &[usize], static_extents: &[usize]) -> Result<Shape> {
        let rank = dynamic.len() + static_extents.len();
        verify_arg!(rank, rank <= MAX_RANK);
        if let Some(r) = dynamic
            .iter()
            .chain(static_extents)
            .position(|&e| e == UNSPECIFIED_EXTENT)
        {
            return Err(Error::invalid_arg(
                "extents",
                format!("extent of rank {r} is unspecified"),
            ));
        }
        // Every stride and span derived from the shape stays below the
        // product of its non-zero extents.
        if dynamic
            .iter()
            .chain(static_extents)
            .filter(|&&e| e != 0)
            .try_fold(1usize, |acc, &e| acc.checked_mul(e))
            .is_none()
        {
            return Err(Error::invalid_arg("extents", "element count overflows usize"));
        }
        let mut extents = [1; MAX_RANK];
        extents[..dynamic.len()].copy_from_slice(dynamic);
        extents[dynamic.len()..rank].copy_from_slice(static_extents);
        Ok(Shape {
            extents,
            rank: rank as u8,
            rank_dynamic: dynamic.len() as u8,
        })
    }

    /// Builds a shape of the same rank and static extents as `self` from a full
    /// set of constructor arguments.
    ///
    /// `args[r]` supplies the extent of each dynamic rank `r`; every other slot
    /// must hold [`UNSPECIFIED_EXTENT`], and those ranks keep `self`'s static
    /// extent.
    pub fn from_ctor_args(&self, args: &[usize; MAX_RANK]) -> Shape {
        let mut extents = [1; MAX_RANK];
        for (r, extent) in extents.iter_mut().enumerate().take(self.rank()) {
            if r < self.rank_dynamic() {
                debug_assert_ne!(args[r], UNSPECIFIED_EXTENT);
                *extent = args[r];
            } else {
                debug_assert_eq!(args[r], UNSPECIFIED_EXTENT);
                *extent = self.extents[r];
            }
        }
        Shape {
            extents,
            rank: self.rank,
            rank_dynamic: self.rank_dynamic,
        }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank as usize
    }

    #[inline]
    pub fn rank_dynamic(&self) -> usize {
        self.rank_dynamic as usize
    }

    /// Extent of rank `r`; ranks beyond the view's rank report 1.
    #[inline]
    pub fn extent(&self, r: usize) -> usize {
        if r < self.rank() { self.extents[r] } else { 1 }
    }

    #[inline]
    pub fn extents(&self) -> &[usize] {
        &self.extents[..self.rank()]
    }

    /// The static (data-type) part of the extents.
    #[inline]
    pub fn static_extents(&self) -> &[usize] {
        &self.extents[self.rank_dynamic()..self.rank()]
    }

    /// Number of logical elements.
    pub fn size(&self) -> usize {
        self.extents().iter().product()
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shape")
            .field("extents", &self.extents())
            .field("rank_dynamic", &self.rank_dynamic)
            .finish()
    }
}

/// Maps multi-indices of a [`Shape`] onto element offsets of an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    shape: Shape,
    strides: [usize; MAX_RANK],
    span: usize,
}

impl Mapping {
    /// Column-major mapping.
    pub fn left(shape: Shape) -> Mapping {
        let mut strides = [0; MAX_RANK];
        let mut stride: usize = 1;
        for (r, s) in strides.iter_mut().enumerate().take(shape.rank()) {
            *s = stride;
            stride = stride.saturating_mul(shape.extent(r));
        }
        Mapping::contiguous(shape, strides)
    }

    /// Row-major mapping.
    pub fn right(shape: Shape) -> Mapping {
        let mut strides = [0; MAX_RANK];
        let mut stride: usize = 1;
        for r in (0..shape.rank()).rev() {
            strides[r] = stride;
            stride = stride.saturating_mul(shape.extent(r));
        }
        Mapping::contiguous(shape, strides)
    }

    /// Mapping with explicit per-rank strides, in elements.
    ///
    /// Ranks taken in increasing stride order must nest: each stride reaches
    /// past the full extent of the rank before it. Zero strides and every
    /// overlapping layout are rejected, so the span never falls below the
    /// logical size.
    pub fn strided(shape: Shape, strides: &[usize]) -> Result<Mapping> {
        verify_arg!(strides, strides.len() == shape.rank());
        let mut s = [0; MAX_RANK];
        s[..strides.len()].copy_from_slice(strides);
        if shape.size() == 0 {
            return Ok(Mapping {
                shape,
                strides: s,
                span: 0,
            });
        }

        let mut ranks: Vec<usize> = (0..shape.rank())
            .filter(|&r| shape.extent(r) > 1)
            .collect();
        ranks.sort_by_key(|&r| s[r]);
        let mut reach = 1usize;
        for &r in &ranks {
            if s[r] < reach {
                return Err(Error::invalid_arg(
                    "strides",
                    format!("stride {} of rank {r} overlaps a smaller rank", s[r]),
                ));
            }
            reach = s[r].checked_mul(shape.extent(r)).ok_or_else(|| {
                Error::invalid_arg("strides", format!("span of rank {r} overflows usize"))
            })?;
        }

        let span = ranks
            .iter()
            .try_fold(1usize, |acc, &r| {
                (shape.extent(r) - 1)
                    .checked_mul(s[r])
                    .and_then(|o| acc.checked_add(o))
            })
            .ok_or_else(|| Error::invalid_arg("strides", "span overflows usize"))?;
        Ok(Mapping {
            shape,
            strides: s,
            span,
        })
    }

    fn contiguous(shape: Shape, strides: [usize; MAX_RANK]) -> Mapping {
        Mapping {
            shape,
            strides,
            span: shape.size(),
        }
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides[..self.shape.rank()]
    }

    /// Number of elements the mapping can touch, including any gaps. Never
    /// below the logical size.
    #[inline]
    pub fn span(&self) -> usize {
        self.span
    }

    /// Whether the span holds exactly the logical elements and nothing else.
    #[inline]
    pub fn span_is_contiguous(&self) -> bool {
        self.span == self.shape.size()
    }

    /// Whether logical row-major order coincides with memory order.
    pub fn is_row_major_contiguous(&self) -> bool {
        self.span_is_contiguous() && *self == Mapping::right(self.shape)
    }

    /// Element offset of the multi-index `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not have exactly `rank` entries or any entry is out
    /// of bounds.
    #[inline]
    pub fn offset(&self, idx: &[usize]) -> usize {
        assert_eq!(idx.len(), self.shape.rank(), "index rank mismatch");
        idx.iter()
            .zip(self.shape.extents())
            .zip(&self.strides)
            .map(|((&i, &e), &s)| {
                assert!(i < e, "index {i} out of bounds for extent {e}");
                i * s
            })
            .sum()
    }

    /// Visits every logical multi-index in row-major order.
    pub fn for_each_index(&self, mut f: impl FnMut(&[usize])) {
        let rank = self.shape.rank();
        if self.shape.size() == 0 {
            return;
        }
        let mut idx = [0usize; MAX_RANK];
        loop {
            f(&idx[..rank]);
            let mut r = rank;
            loop {
                if r == 0 {
                    return;
                }
                r -= 1;
                idx[r] += 1;
                if idx[r] < self.shape.extent(r) {
                    break;
                }
                idx[r] = 0;
            }
        }
    }
}
