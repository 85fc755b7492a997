//! Fixed-width bit strings with circular unsigned arithmetic.
//!
//! An [`Address`] is either a full Morton address (`dims × bits_per_dim` bits)
//! or a prefix of one. Bits are stored most-significant first, packed into
//! `u64` words; bits past `width` in the last word are always zero.

use crate::error::{Result, ZrouteError};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const WORD_BITS: usize = 64;

#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Address {
    words: SmallVec<[u64; 2]>,
    width: usize,
}

impl Address {
    /// The empty (zero-width) address.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_capacity(width: usize) -> Self {
        Self {
            words: SmallVec::with_capacity(width.div_ceil(WORD_BITS)),
            width: 0,
        }
    }

    /// All-zero address of the given width: the lowest value.
    pub fn zeros(width: usize) -> Self {
        Self {
            words: SmallVec::from_elem(0, width.div_ceil(WORD_BITS)),
            width,
        }
    }

    /// All-one address of the given width: the highest value.
    pub fn ones(width: usize) -> Self {
        let mut addr = Self {
            words: SmallVec::from_elem(u64::MAX, width.div_ceil(WORD_BITS)),
            width,
        };
        addr.clear_padding();
        addr
    }

    /// Render the low `width` bits of `value` as an address.
    ///
    /// # Examples
    ///
    /// ```
    /// use zroute::Address;
    ///
    /// assert_eq!(Address::from_u64(5, 4).to_string(), "0101");
    /// ```
    pub fn from_u64(value: u64, width: usize) -> Self {
        let mut addr = Self::with_capacity(width);
        for level in (0..width).rev() {
            addr.push(level < WORD_BITS && (value >> level) & 1 == 1);
        }
        addr
    }

    /// Interpret the address as an unsigned integer, if it fits in 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.width > WORD_BITS {
            return None;
        }
        match self.words.first() {
            Some(word) => Some(word >> (WORD_BITS - self.width)),
            None => Some(0),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0
    }

    /// Bit at position `index`, counted from the most significant end.
    ///
    /// # Panics
    ///
    /// Panics if `index >= width`.
    pub fn bit(&self, index: usize) -> bool {
        assert!(
            index < self.width,
            "bit index {} out of range for width {}",
            index,
            self.width
        );
        self.words[index / WORD_BITS] >> (WORD_BITS - 1 - index % WORD_BITS) & 1 == 1
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.width).then(|| self.bit(index))
    }

    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.width).map(move |i| self.bit(i))
    }

    /// Append one bit at the least significant end.
    pub fn push(&mut self, bit: bool) {
        if self.width % WORD_BITS == 0 {
            self.words.push(0);
        }
        if bit {
            let index = self.width;
            self.words[index / WORD_BITS] |= 1 << (WORD_BITS - 1 - index % WORD_BITS);
        }
        self.width += 1;
    }

    /// Copy of this address extended by one bit.
    pub fn with_bit(&self, bit: bool) -> Self {
        let mut out = self.clone();
        out.push(bit);
        out
    }

    /// Copy with bit `index` replaced.
    pub fn with_bit_at(&self, index: usize, bit: bool) -> Self {
        assert!(index < self.width, "bit index {} out of range", index);
        let mut out = self.clone();
        let mask = 1 << (WORD_BITS - 1 - index % WORD_BITS);
        if bit {
            out.words[index / WORD_BITS] |= mask;
        } else {
            out.words[index / WORD_BITS] &= !mask;
        }
        out
    }

    /// The first `len` bits (or the whole address if it is shorter).
    pub fn prefix(&self, len: usize) -> Self {
        let len = len.min(self.width);
        let mut out = Self {
            words: self.words[..len.div_ceil(WORD_BITS)].into(),
            width: len,
        };
        out.clear_padding();
        out
    }

    /// Length of the longest common prefix of `self` and `other`.
    pub fn common_prefix_len(&self, other: &Address) -> usize {
        let limit = self.width.min(other.width);
        for (i, (a, b)) in self.words.iter().zip(other.words.iter()).enumerate() {
            let diff = a ^ b;
            if diff != 0 {
                return (i * WORD_BITS + diff.leading_zeros() as usize).min(limit);
            }
        }
        limit
    }

    /// Check whether `self` is a (not necessarily proper) prefix of `other`.
    pub fn is_prefix_of(&self, other: &Address) -> bool {
        self.width <= other.width && other.common_prefix_len(self) == self.width
    }

    /// `(value + 1) mod 2^width`, keeping the width.
    ///
    /// # Examples
    ///
    /// ```
    /// use zroute::Address;
    ///
    /// let max: Address = "1111".parse()?;
    /// assert_eq!(max.next().to_string(), "0000");
    /// # Ok::<(), zroute::ZrouteError>(())
    /// ```
    pub fn next(&self) -> Self {
        let mut out = self.clone();
        if out.width == 0 {
            return out;
        }
        let mut carry = 1u64 << out.padding_bits();
        for word in out.words.iter_mut().rev() {
            let (sum, overflow) = word.overflowing_add(carry);
            *word = sum;
            if !overflow {
                break;
            }
            carry = 1;
        }
        out
    }

    /// `(value - 1) mod 2^width`, keeping the width. Exact inverse of [`next`](Self::next).
    pub fn previous(&self) -> Self {
        let mut out = self.clone();
        if out.width == 0 {
            return out;
        }
        let mut borrow = 1u64 << out.padding_bits();
        for word in out.words.iter_mut().rev() {
            let (diff, underflow) = word.overflowing_sub(borrow);
            *word = diff;
            if !underflow {
                break;
            }
            borrow = 1;
        }
        out
    }

    /// Compare two addresses as unsigned integers of the same width.
    pub fn value_cmp(&self, other: &Address) -> Result<Ordering> {
        if self.width != other.width {
            return Err(ZrouteError::InvalidAddress(format!(
                "cannot compare addresses of width {} and {}",
                self.width, other.width
            )));
        }
        Ok(self.words.cmp(&other.words))
    }

    fn padding_bits(&self) -> usize {
        self.words.len() * WORD_BITS - self.width
    }

    fn clear_padding(&mut self) {
        let padding = self.padding_bits();
        if padding > 0
            && let Some(last) = self.words.last_mut()
        {
            *last &= u64::MAX << padding;
        }
    }
}

/// Lexicographic bit-string order: a prefix sorts before its extensions.
/// For equal widths this is the unsigned integer order.
impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        self.words
            .cmp(&other.words)
            .then(self.width.cmp(&other.width))
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Address {
    type Err = ZrouteError;

    fn from_str(s: &str) -> Result<Self> {
        let mut addr = Self::with_capacity(s.len());
        for (i, c) in s.chars().enumerate() {
            match c {
                '0' => addr.push(false),
                '1' => addr.push(true),
                other => {
                    return Err(ZrouteError::InvalidAddress(format!(
                        "unexpected character {:?} at position {} in {:?}",
                        other, i, s
                    )));
                }
            }
        }
        Ok(addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(\"{}\")", self)
    }
}
