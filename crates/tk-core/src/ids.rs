use core::fmt;
use core::num::NonZeroU32;

use crate::{CoreError, CoreResult};

/// Compact, stable identifier used by every graph arena.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index by storing index+1.
    ///
    /// Panics if `index == u32::MAX`; arenas allocate through [`Id::from_usize`].
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::new(index.wrapping_add(1)).expect("index+1 is nonzero"))
    }

    /// Create an Id from an arena position, failing once the id space is exhausted.
    pub fn from_usize(index: usize) -> CoreResult<Self> {
        u32::try_from(index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(CoreError::IdOverflow { index })
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// Recover the 0-based index as an arena position.
    pub fn slot(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Node handle inside a graph arena.
pub type NodeId = Id;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn id_round_trip_index() {
        for i in [0_u32, 1, 2, 42, 10_000] {
            let id = Id::from_index(i);
            assert_eq!(id.index(), i);
            assert_eq!(id.slot(), i as usize);
        }
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<Id>(),
            core::mem::size_of::<Option<Id>>()
        );
    }

    #[test]
    fn from_usize_rejects_exhausted_space() {
        let last = u32::MAX as usize;
        assert_eq!(
            Id::from_usize(last),
            Err(CoreError::IdOverflow { index: last })
        );
        assert!(Id::from_usize(last - 1).is_ok());
    }

    proptest! {
        #[test]
        fn from_usize_matches_from_index(i in 0_u32..u32::MAX) {
            prop_assert_eq!(Id::from_usize(i as usize).unwrap(), Id::from_index(i));
        }
    }
}
