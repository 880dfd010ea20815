use super::{LaneMask, MASK_BYTES};

/// Mask of the 20 payload bits in each packed word.
const WORD_BITS: u32 = 0x000F_FFFF;

/// Packs a mask into four 20-bit words.
///
/// Each 5-byte half is split at the middle nibble of its third byte.
#[must_use]
pub fn pack(mask: &LaneMask) -> [u32; 4] {
    let b = mask.as_bytes().map(u32::from);
    [
        b[0] | b[1] << 8 | (b[2] & 0xF) << 16,
        b[2] >> 4 | b[3] << 4 | b[4] << 12,
        b[5] | b[6] << 8 | (b[7] & 0xF) << 16,
        b[7] >> 4 | b[8] << 4 | b[9] << 12,
    ]
}

/// Inverse of [`pack`]. Bits above the 20-bit payload are ignored.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn unpack(words: [u32; 4]) -> LaneMask {
    let w = words.map(|word| word & WORD_BITS);
    let mut raw = [0u8; MASK_BYTES];
    for (half, pair) in w.chunks_exact(2).enumerate() {
        let (lo, hi) = (pair[0], pair[1]);
        let base = half * 5;
        raw[base] = lo as u8;
        raw[base + 1] = (lo >> 8) as u8;
        raw[base + 2] = ((lo >> 16) & 0xF | (hi & 0xF) << 4) as u8;
        raw[base + 3] = (hi >> 4) as u8;
        raw[base + 4] = (hi >> 12) as u8;
    }
    LaneMask::from_raw(raw)
}

/// The 3-bit state of one lane as seen from a stored vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneState {
    /// The vertex was classified onto this lane.
    pub on_lane: bool,
    /// The application had the lane switched on when the triangle was stored.
    pub painted: bool,
    /// The lane was flagged as revisited when the triangle was stored.
    pub intersection: bool,
}

impl LaneState {
    /// Encodes as `on_lane << 2 | painted << 1 | intersection`.
    #[must_use]
    pub fn to_bits(self) -> u8 {
        u8::from(self.on_lane) << 2 | u8::from(self.painted) << 1 | u8::from(self.intersection)
    }

    /// Decodes the low three bits of `bits`.
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        Self {
            on_lane: bits & 0b100 != 0,
            painted: bits & 0b010 != 0,
            intersection: bits & 0b001 != 0,
        }
    }
}

/// Packed per-vertex state: owning lane plus hit and application masks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexState {
    pub lane: u32,
    pub hit_words: [u32; 4],
    pub app_words: [u32; 4],
}

impl VertexState {
    #[must_use]
    pub fn new(lane: u32, hit: &LaneMask, app: &LaneMask) -> Self {
        Self {
            lane,
            hit_words: pack(hit),
            app_words: pack(app),
        }
    }

    #[must_use]
    pub fn hit_mask(&self) -> LaneMask {
        unpack(self.hit_words)
    }

    #[must_use]
    pub fn app_mask(&self) -> LaneMask {
        unpack(self.app_words)
    }

    /// State of `lane` relative to this vertex.
    #[must_use]
    pub fn lane_state(&self, lane: usize) -> LaneState {
        LaneState {
            on_lane: usize::try_from(self.lane).is_ok_and(|own| own == lane),
            painted: self.app_mask().get(lane),
            intersection: self.hit_mask().get(lane),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::{byte_len, MAX_LANES};

    /// Deterministic byte pattern for a mask covering `lanes` lanes.
    fn pattern_mask(lanes: usize, seed: u8) -> LaneMask {
        let mut mask = LaneMask::new();
        for lane in 0..lanes {
            let bit = (lane as u8).wrapping_mul(31).wrapping_add(seed) % 3 == 0;
            mask.assign(lane, bit);
        }
        mask
    }

    #[test]
    fn unpack_inverts_pack_for_every_lane_count() {
        for lanes in 0..=MAX_LANES {
            for seed in 0..3 {
                let mask = pattern_mask(lanes, seed);
                assert_eq!(unpack(pack(&mask)), mask, "lanes={lanes} seed={seed}");
                let bytes = mask.to_bytes(lanes);
                assert_eq!(bytes.len(), byte_len(lanes));
            }
            let full = LaneMask::with_lanes_on(lanes);
            assert_eq!(unpack(pack(&full)), full, "lanes={lanes} all on");
        }
    }

    #[test]
    fn nibble_split_across_words() {
        let mut raw = [0u8; MASK_BYTES];
        raw[2] = 0xA5;
        raw[7] = 0x3C;
        let words = pack(&LaneMask::from_raw(raw));
        assert_eq!(words[0], 0x5 << 16);
        assert_eq!(words[1], 0xA);
        assert_eq!(words[2], 0xC << 16);
        assert_eq!(words[3], 0x3);
        assert_eq!(unpack(words).as_bytes(), &raw);
    }

    #[test]
    fn packed_words_fit_twenty_bits() {
        let words = pack(&LaneMask::with_lanes_on(MAX_LANES));
        assert!(words.iter().all(|w| *w == WORD_BITS));
    }

    #[test]
    fn lane_state_bits() {
        let s = LaneState {
            on_lane: true,
            painted: false,
            intersection: true,
        };
        assert_eq!(s.to_bits(), 0b101);
        assert_eq!(LaneState::from_bits(0b101), s);
        assert_eq!(LaneState::from_bits(0b1000), LaneState::default());
    }

    #[test]
    fn vertex_state_lane_state() {
        let mut hit = LaneMask::new();
        hit.set(2);
        let app = LaneMask::with_lanes_on(2);
        let v = VertexState::new(1, &hit, &app);
        assert_eq!(v.lane_state(1).to_bits(), 0b110);
        assert_eq!(v.lane_state(2).to_bits(), 0b001);
        assert_eq!(v.lane_state(0).to_bits(), 0b010);
        assert_eq!(v.hit_mask(), hit);
        assert_eq!(v.app_mask(), app);
    }
}
