//! Partial shapes with dynamic rank and dynamic dimensions.

use std::fmt;

/// One tensor dimension: a known extent or `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Dimension {
    Static(u64),
    #[default]
    Dynamic,
}

impl Dimension {
    pub fn is_static(self) -> bool {
        matches!(self, Dimension::Static(_))
    }

    pub fn is_dynamic(self) -> bool {
        !self.is_static()
    }

    /// Static extent, if known.
    pub fn get(self) -> Option<u64> {
        match self {
            Dimension::Static(n) => Some(n),
            Dimension::Dynamic => None,
        }
    }

    pub fn compatible(self, other: Dimension) -> bool {
        match (self, other) {
            (Dimension::Static(a), Dimension::Static(b)) => a == b,
            _ => true,
        }
    }

    /// Merge two compatible dimensions, preferring the static one.
    pub fn merge(self, other: Dimension) -> Option<Dimension> {
        match (self, other) {
            (Dimension::Static(a), Dimension::Static(b)) => (a == b).then_some(self),
            (Dimension::Dynamic, d) | (d, Dimension::Dynamic) => Some(d),
        }
    }

    /// Numpy broadcast of two aligned dimensions.
    pub fn broadcast(self, other: Dimension) -> Option<Dimension> {
        match (self, other) {
            (Dimension::Static(a), Dimension::Static(b)) if a == b => Some(self),
            (Dimension::Static(1), d) | (d, Dimension::Static(1)) => Some(d),
            (Dimension::Static(_), Dimension::Static(_)) => None,
            (Dimension::Dynamic, d) | (d, Dimension::Dynamic) => Some(d),
        }
    }
}

impl From<u64> for Dimension {
    fn from(n: u64) -> Self {
        Dimension::Static(n)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Static(n) => write!(f, "{n}"),
            Dimension::Dynamic => f.write_str("?"),
        }
    }
}

/// Shape whose rank and dimensions may be unknown.
///
/// `dims == None` means the rank itself is dynamic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartialShape {
    dims: Option<Vec<Dimension>>,
}

impl PartialShape {
    /// Shape with dynamic rank.
    pub fn dynamic() -> Self {
        Self { dims: None }
    }

    /// Shape of the given rank where every dimension is dynamic.
    pub fn with_rank(rank: usize) -> Self {
        Self {
            dims: Some(vec![Dimension::Dynamic; rank]),
        }
    }

    pub fn new(dims: impl IntoIterator<Item = Dimension>) -> Self {
        Self {
            dims: Some(dims.into_iter().collect()),
        }
    }

    /// Fully static shape.
    pub fn fixed(dims: &[u64]) -> Self {
        Self::new(dims.iter().copied().map(Dimension::Static))
    }

    /// Rank-0 shape.
    pub fn scalar() -> Self {
        Self::new([])
    }

    pub fn rank(&self) -> Option<usize> {
        self.dims.as_ref().map(Vec::len)
    }

    pub fn dims(&self) -> Option<&[Dimension]> {
        self.dims.as_deref()
    }

    pub fn is_rank_dynamic(&self) -> bool {
        self.dims.is_none()
    }

    /// Rank and every dimension known.
    pub fn is_static(&self) -> bool {
        self.dims
            .as_ref()
            .is_some_and(|d| d.iter().all(|x| x.is_static()))
    }

    /// Fully static extents, if known.
    pub fn to_static(&self) -> Option<Vec<u64>> {
        self.dims.as_ref()?.iter().map(|d| d.get()).collect()
    }

    pub fn compatible(&self, other: &PartialShape) -> bool {
        match (&self.dims, &other.dims) {
            (Some(a), Some(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.compatible(*y))
            }
            _ => true,
        }
    }

    /// Merge two compatible shapes, keeping the most refined information.
    pub fn merge(&self, other: &PartialShape) -> Option<PartialShape> {
        match (&self.dims, &other.dims) {
            (None, _) => Some(other.clone()),
            (_, None) => Some(self.clone()),
            (Some(a), Some(b)) => {
                if a.len() != b.len() {
                    return None;
                }
                a.iter()
                    .zip(b)
                    .map(|(x, y)| x.merge(*y))
                    .collect::<Option<Vec<_>>>()
                    .map(PartialShape::new)
            }
        }
    }

    /// Numpy-style broadcast of two shapes (right-aligned).
    pub fn broadcast(&self, other: &PartialShape) -> Option<PartialShape> {
        let (a, b) = match (&self.dims, &other.dims) {
            (Some(a), Some(b)) => (a, b),
            _ => return Some(PartialShape::dynamic()),
        };
        let rank = a.len().max(b.len());
        let pad = |dims: &[Dimension], i: usize| -> Dimension {
            let offset = rank - dims.len();
            if i < offset {
                Dimension::Static(1)
            } else {
                dims[i - offset]
            }
        };
        (0..rank)
            .map(|i| pad(a, i).broadcast(pad(b, i)))
            .collect::<Option<Vec<_>>>()
            .map(PartialShape::new)
    }
}

impl From<Vec<Dimension>> for PartialShape {
    fn from(dims: Vec<Dimension>) -> Self {
        Self { dims: Some(dims) }
    }
}

impl fmt::Display for PartialShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.dims {
            None => f.write_str("[...]"),
            Some(dims) => {
                f.write_str("[")?;
                for (i, d) in dims.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{d}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Resolve a possibly negative axis against `rank`.
pub fn normalize_axis(axis: i64, rank: usize) -> Option<usize> {
    let rank = i64::try_from(rank).ok()?;
    let resolved = if axis < 0 { axis + rank } else { axis };
    (0..rank).contains(&resolved).then_some(resolved as usize)
}
