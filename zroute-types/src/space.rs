use serde::{Deserialize, Serialize};

/// Largest supported window per dimension; coordinates are `i64`.
pub const MAX_BITS_PER_DIM: u32 = 64;

/// Widest supported address, in bits.
pub const MAX_WIDTH: usize = 4096;

/// Shape of the key space: number of dimensions and bits kept per dimension.
///
/// The Morton address of a key is `dims × bits_per_dim` bits wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceConfig {
    pub dims: usize,
    pub bits_per_dim: u32,
}

impl SpaceConfig {
    pub const fn new(dims: usize, bits_per_dim: u32) -> Self {
        Self { dims, bits_per_dim }
    }

    /// Width in bits of every full address in this space.
    ///
    /// Saturates for shapes that [`validate`](Self::validate) rejects.
    pub const fn width(&self) -> usize {
        self.dims.saturating_mul(self.bits_per_dim as usize)
    }

    /// Smallest coordinate representable in the per-dimension window.
    pub const fn coord_min(&self) -> i64 {
        if self.bits_per_dim == 0 {
            0
        } else if self.bits_per_dim >= MAX_BITS_PER_DIM {
            i64::MIN
        } else {
            -(1i64 << (self.bits_per_dim - 1))
        }
    }

    /// Largest coordinate representable in the per-dimension window.
    pub const fn coord_max(&self) -> i64 {
        if self.bits_per_dim == 0 {
            0
        } else if self.bits_per_dim >= MAX_BITS_PER_DIM {
            i64::MAX
        } else {
            (1i64 << (self.bits_per_dim - 1)) - 1
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.dims == 0 {
            return Err("Dimension count must be greater than zero".to_string());
        }
        if self.bits_per_dim == 0 || self.bits_per_dim > MAX_BITS_PER_DIM {
            return Err(format!(
                "Bits per dimension must be in [1, {}], got: {}",
                MAX_BITS_PER_DIM, self.bits_per_dim
            ));
        }
        match self.dims.checked_mul(self.bits_per_dim as usize) {
            Some(width) if width <= MAX_WIDTH => Ok(()),
            _ => Err(format!(
                "Address width of {} x {} bits exceeds the {}-bit limit",
                self.dims, self.bits_per_dim, MAX_WIDTH
            )),
        }
    }
}
