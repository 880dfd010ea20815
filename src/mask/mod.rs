pub mod codec;

pub use codec::{pack, unpack, LaneState, VertexState};

use crate::error::{MaskError, Result};

/// Maximum number of lanes a mask can address.
pub const MAX_LANES: usize = 80;

/// Byte length of a full mask.
pub const MASK_BYTES: usize = MAX_LANES / 8;

/// Number of bytes needed to hold `lanes` bits.
#[must_use]
pub fn byte_len(lanes: usize) -> usize {
    lanes.div_ceil(8)
}

/// A fixed-size per-lane bit vector.
///
/// Bit `i` (byte `i / 8`, shift `i % 8`) represents lane `i`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneMask([u8; MASK_BYTES]);

impl LaneMask {
    /// An all-zero mask.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A mask with the first `count` lanes set. `count` is capped at [`MAX_LANES`].
    #[must_use]
    pub fn with_lanes_on(count: usize) -> Self {
        let mut mask = Self::new();
        for lane in 0..count.min(MAX_LANES) {
            mask.set(lane);
        }
        mask
    }

    /// Builds a mask from a persisted byte array sized for `lanes` lanes.
    ///
    /// # Errors
    ///
    /// Returns [`MaskError::SizeMismatch`] when `bytes` is not exactly
    /// `ceil(lanes / 8)` long, and [`MaskError::LaneOutOfRange`] when `lanes`
    /// exceeds [`MAX_LANES`].
    pub fn from_bytes(bytes: &[u8], lanes: usize) -> Result<Self> {
        if lanes > MAX_LANES {
            return Err(MaskError::LaneOutOfRange {
                lane: lanes,
                count: MAX_LANES,
            }
            .into());
        }
        let expected = byte_len(lanes);
        if bytes.len() != expected {
            return Err(MaskError::SizeMismatch {
                expected,
                actual: bytes.len(),
            }
            .into());
        }
        let mut raw = [0u8; MASK_BYTES];
        raw[..expected].copy_from_slice(bytes);
        Ok(Self(raw))
    }

    /// Wraps a raw 10-byte array.
    #[must_use]
    pub fn from_raw(raw: [u8; MASK_BYTES]) -> Self {
        Self(raw)
    }

    /// The underlying bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; MASK_BYTES] {
        &self.0
    }

    /// The first `ceil(lanes / 8)` bytes, the persisted form for `lanes` lanes.
    #[must_use]
    pub fn to_bytes(&self, lanes: usize) -> Vec<u8> {
        self.0[..byte_len(lanes.min(MAX_LANES))].to_vec()
    }

    /// Returns the bit for `lane`. Lanes past [`MAX_LANES`] read as unset.
    #[must_use]
    pub fn get(&self, lane: usize) -> bool {
        lane < MAX_LANES && self.0[lane / 8] & (1 << (lane % 8)) != 0
    }

    /// Sets the bit for `lane`. Out-of-range lanes are ignored.
    pub fn set(&mut self, lane: usize) {
        if lane < MAX_LANES {
            self.0[lane / 8] |= 1 << (lane % 8);
        }
    }

    /// Clears the bit for `lane`. Out-of-range lanes are ignored.
    pub fn clear(&mut self, lane: usize) {
        if lane < MAX_LANES {
            self.0[lane / 8] &= !(1 << (lane % 8));
        }
    }

    /// Sets or clears the bit for `lane`.
    pub fn assign(&mut self, lane: usize, value: bool) {
        if value {
            self.set(lane);
        } else {
            self.clear(lane);
        }
    }

    /// Zeroes every bit.
    pub fn clear_all(&mut self) {
        self.0 = [0; MASK_BYTES];
    }

    /// Returns `true` if no bit is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Indices of the set lanes, ascending.
    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_LANES).filter(|lane| self.get(*lane))
    }

    /// Lanes whose bit differs between `self` and `next`, with the value in `next`.
    pub fn changes<'a>(&'a self, next: &'a LaneMask) -> impl Iterator<Item = (usize, bool)> + 'a {
        self.0
            .iter()
            .zip(next.0.iter())
            .enumerate()
            .filter(|(_, (old, new))| old != new)
            .flat_map(|(byte, (old, new))| {
                let diff = old ^ new;
                (0..8)
                    .filter(move |bit| diff & (1 << bit) != 0)
                    .map(move |bit| (byte * 8 + bit, new & (1 << bit) != 0))
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::LanetraceError;

    #[test]
    fn set_get_clear_address_byte_and_shift() {
        let mut m = LaneMask::new();
        m.set(0);
        m.set(9);
        m.set(79);
        assert_eq!(m.as_bytes()[0], 0b0000_0001);
        assert_eq!(m.as_bytes()[1], 0b0000_0010);
        assert_eq!(m.as_bytes()[9], 0b1000_0000);
        assert!(m.get(9));
        m.clear(9);
        assert!(!m.get(9));
        assert!(!m.get(200));
        m.set(200);
        assert_eq!(m.iter_set().collect::<Vec<_>>(), vec![0, 79]);
    }

    #[test]
    fn with_lanes_on_sets_prefix() {
        let m = LaneMask::with_lanes_on(11);
        assert_eq!(m.as_bytes()[0], 0xFF);
        assert_eq!(m.as_bytes()[1], 0b0000_0111);
        assert_eq!(m.as_bytes()[2], 0);
        assert_eq!(LaneMask::with_lanes_on(500).iter_set().count(), MAX_LANES);
    }

    #[test]
    fn from_bytes_checks_size() {
        let m = LaneMask::from_bytes(&[0b101, 0b1], 9).unwrap();
        assert!(m.get(0) && m.get(2) && m.get(8));
        assert_eq!(m.to_bytes(9), vec![0b101, 0b1]);

        let err = LaneMask::from_bytes(&[0, 0, 0], 9).unwrap_err();
        assert!(matches!(
            err,
            LanetraceError::Mask(MaskError::SizeMismatch {
                expected: 2,
                actual: 3
            })
        ));
        assert!(LaneMask::from_bytes(&[0; 11], 81).is_err());
    }

    #[test]
    fn changes_report_flipped_bits_with_new_value() {
        let mut old = LaneMask::new();
        old.set(1);
        old.set(17);
        let mut new = old;
        new.clear(1);
        new.set(3);
        new.set(64);
        let changes: Vec<_> = old.changes(&new).collect();
        assert_eq!(changes, vec![(1, false), (3, true), (64, true)]);
        assert_eq!(old.changes(&old).count(), 0);
    }
}
