//! Z-order (Morton) encoding of signed integer keys.
//!
//! Bits are interleaved from the most significant level down: for each level
//! `l` from `bits_per_dim - 1` to `0`, bit `l` of every coordinate is emitted
//! in dimension order. Coordinates are taken in two's complement, so the top
//! bit of each window is the sign bit. Bits above the window are dropped.

use crate::address::Address;
use crate::error::{Result, ZrouteError};
use zroute_types::space::SpaceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MortonEncoder {
    space: SpaceConfig,
}

impl MortonEncoder {
    /// Encoder for `space`. Fails with `InvalidConfig` when the shape is
    /// out of range.
    pub fn new(space: SpaceConfig) -> Result<Self> {
        space.validate().map_err(ZrouteError::InvalidConfig)?;
        Ok(Self { space })
    }

    pub fn space(&self) -> SpaceConfig {
        self.space
    }

    /// Width in bits of every encoded address.
    pub fn width(&self) -> usize {
        self.space.width()
    }

    /// Encode `key` into its full-width Morton address.
    ///
    /// # Examples
    ///
    /// ```
    /// use zroute::MortonEncoder;
    /// use zroute_types::space::SpaceConfig;
    ///
    /// let encoder = MortonEncoder::new(SpaceConfig::new(3, 2))?;
    /// assert_eq!(encoder.encode(&[1, 0, 1])?.to_string(), "000101");
    /// assert_eq!(encoder.encode(&[-1, 0, -1])?.to_string(), "101101");
    /// # Ok::<(), zroute::ZrouteError>(())
    /// ```
    pub fn encode(&self, key: &[i64]) -> Result<Address> {
        self.check_dims(key)?;
        let mut addr = Address::with_capacity(self.width());
        for level in (0..self.space.bits_per_dim).rev() {
            for &coord in key {
                addr.push(coord_bit(coord, level));
            }
        }
        Ok(addr)
    }

    /// The single bit `encode(key)` would hold at `position`, without
    /// materializing the address.
    pub fn is_bit_set(&self, key: &[i64], position: usize) -> Result<bool> {
        self.check_dims(key)?;
        if position >= self.width() {
            return Err(ZrouteError::InvalidAddress(format!(
                "bit position {} out of range for width {}",
                position,
                self.width()
            )));
        }
        Ok(self.key_bit(key, position))
    }

    /// Unchecked form of [`is_bit_set`](Self::is_bit_set) for keys whose
    /// shape was already validated.
    pub(crate) fn key_bit(&self, key: &[i64], position: usize) -> bool {
        let dims = self.space.dims;
        let level = self.space.bits_per_dim - 1 - (position / dims) as u32;
        coord_bit(key[position % dims], level)
    }

    /// Recover the key of a full-width address. Each coordinate is sign
    /// extended from the top bit of its window.
    pub fn decode(&self, addr: &Address) -> Result<Vec<i64>> {
        if addr.width() != self.width() {
            return Err(ZrouteError::InvalidAddress(format!(
                "expected a {}-bit address, got {} bits",
                self.width(),
                addr.width()
            )));
        }
        let dims = self.space.dims;
        let mut raw = vec![0u64; dims];
        for (position, bit) in addr.bits().enumerate() {
            let slot = &mut raw[position % dims];
            *slot = (*slot << 1) | u64::from(bit);
        }
        let unused = 64 - self.space.bits_per_dim;
        Ok(raw
            .into_iter()
            .map(|word| ((word << unused) as i64) >> unused)
            .collect())
    }

    pub(crate) fn check_dims(&self, key: &[i64]) -> Result<()> {
        if key.len() != self.space.dims {
            return Err(ZrouteError::dimension_mismatch(self.space.dims, key.len()));
        }
        Ok(())
    }
}

#[inline]
fn coord_bit(coord: i64, level: u32) -> bool {
    (coord as u64 >> level) & 1 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder(dims: usize, bits_per_dim: u32) -> MortonEncoder {
        MortonEncoder::new(SpaceConfig::new(dims, bits_per_dim)).unwrap()
    }

    #[test]
    fn test_new_rejects_out_of_range_windows() {
        for bits_per_dim in [0, 65] {
            assert!(matches!(
                MortonEncoder::new(SpaceConfig::new(1, bits_per_dim)),
                Err(ZrouteError::InvalidConfig(_))
            ));
        }
        assert!(matches!(
            MortonEncoder::new(SpaceConfig::new(0, 8)),
            Err(ZrouteError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_encode_known_vectors() {
        assert_eq!(encoder(3, 1).encode(&[1, 1, 1]).unwrap().to_string(), "111");
        assert_eq!(
            encoder(3, 2).encode(&[1, 0, 1]).unwrap().to_string(),
            "000101"
        );
        assert_eq!(
            encoder(3, 2).encode(&[0, 1, 1]).unwrap().to_string(),
            "000011"
        );
        assert_eq!(
            encoder(3, 2).encode(&[-1, 0, -1]).unwrap().to_string(),
            "101101"
        );
    }

    #[test]
    fn test_encode_dimension_mismatch() {
        assert_eq!(
            encoder(3, 2).encode(&[1, 2]),
            Err(ZrouteError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_is_bit_set_matches_encode() {
        let enc = encoder(2, 5);
        let key = [13, -7];
        let full = enc.encode(&key).unwrap();
        for position in 0..enc.width() {
            assert_eq!(enc.is_bit_set(&key, position).unwrap(), full.bit(position));
        }
        assert!(enc.is_bit_set(&key, enc.width()).is_err());
    }

    #[test]
    fn test_decode_inverts_encode_within_window() {
        let enc = encoder(3, 4);
        for key in [[0, 0, 0], [7, -8, 3], [-1, -1, -1], [5, 0, -4]] {
            let addr = enc.encode(&key).unwrap();
            assert_eq!(enc.decode(&addr).unwrap(), key.to_vec());
        }

        let wide = encoder(1, 64);
        let addr = wide.encode(&[i64::MIN]).unwrap();
        assert_eq!(wide.decode(&addr).unwrap(), vec![i64::MIN]);
    }

    #[test]
    fn test_values_outside_window_are_truncated() {
        let enc = encoder(1, 2);
        assert_eq!(enc.encode(&[5]).unwrap(), enc.encode(&[1]).unwrap());
    }

    #[test]
    fn test_z_order_locality() {
        let enc = encoder(2, 3);
        let a = enc.encode(&[1, 1]).unwrap();
        let b = enc.encode(&[3, 3]).unwrap();
        assert_eq!(a.to_string(), "000011");
        assert_eq!(b.to_string(), "001111");
        assert!(a < b);
    }
}
