//! Decomposition of address intervals and key rectangles into canonical boxes.
//!
//! A closed interval `[lo, hi]` of full-width addresses splits at the first
//! bit where `lo` and `hi` differ. Below that point the interval is the upper
//! half of the `P0` subtree above `lo`; above it, the lower half of the `P1`
//! subtree below `hi`. Each half is a walk down one address, emitting the
//! sibling subtree that falls entirely on the wanted side at every level, so
//! a cover never holds more than `2 × width` boxes regardless of how many
//! dimensions were interleaved into the address.

use crate::address::Address;
use crate::canonical_box::CanonicalBox;
use crate::error::{Result, ZrouteError};
use crate::morton::MortonEncoder;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use zroute_types::space::SpaceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Below,
    Above,
}

#[derive(Debug, Clone, Copy)]
pub struct RangeDecomposer {
    encoder: MortonEncoder,
}

impl RangeDecomposer {
    pub fn new(space: SpaceConfig) -> Result<Self> {
        Ok(Self {
            encoder: MortonEncoder::new(space)?,
        })
    }

    pub fn encoder(&self) -> &MortonEncoder {
        &self.encoder
    }

    pub fn width(&self) -> usize {
        self.encoder.width()
    }

    /// Canonical cover of every address inside `space` strictly below `beta`.
    ///
    /// Empty when `beta` is the lowest address of `space`.
    ///
    /// # Examples
    ///
    /// ```
    /// use zroute::{Address, CanonicalBox, RangeDecomposer};
    /// use zroute_types::space::SpaceConfig;
    ///
    /// let decomposer = RangeDecomposer::new(SpaceConfig::new(2, 1))?;
    /// let cover = decomposer.lower_half_envelope(&CanonicalBox::root(), &"11".parse::<Address>()?)?;
    /// let rendered: Vec<String> = cover.iter().map(|b| b.prefix().to_string()).collect();
    /// assert_eq!(rendered, vec!["0", "10"]);
    /// # Ok::<(), zroute::ZrouteError>(())
    /// ```
    pub fn lower_half_envelope(
        &self,
        space: &CanonicalBox,
        beta: &Address,
    ) -> Result<BTreeSet<CanonicalBox>> {
        self.half_envelope(space, beta, Side::Below)
    }

    /// Canonical cover of every address inside `space` strictly above `beta`.
    ///
    /// Empty when `beta` is the highest address of `space`.
    pub fn upper_half_envelope(
        &self,
        space: &CanonicalBox,
        beta: &Address,
    ) -> Result<BTreeSet<CanonicalBox>> {
        self.half_envelope(space, beta, Side::Above)
    }

    fn half_envelope(
        &self,
        space: &CanonicalBox,
        beta: &Address,
        side: Side,
    ) -> Result<BTreeSet<CanonicalBox>> {
        self.check_width(beta)?;
        if !space.contains(beta) {
            return Err(ZrouteError::InvalidAddress(format!(
                "address {} lies outside box {}",
                beta, space
            )));
        }

        let mut cover = BTreeSet::new();
        let mut walked = space.prefix().clone();
        for level in space.level()..beta.width() {
            let bit = beta.bit(level);
            match (side, bit) {
                (Side::Below, true) => {
                    cover.insert(CanonicalBox::new(walked.with_bit(false)));
                }
                (Side::Above, false) => {
                    cover.insert(CanonicalBox::new(walked.with_bit(true)));
                }
                _ => {}
            }
            walked.push(bit);
        }
        Ok(cover)
    }

    /// Canonical cover of the open interval strictly between `lo` and `hi`.
    ///
    /// The boundary addresses themselves are not part of the envelope; see
    /// [`region_cover`](Self::region_cover) for the closed interval.
    pub fn region_envelope(&self, lo: &Address, hi: &Address) -> Result<BTreeSet<CanonicalBox>> {
        self.check_width(lo)?;
        self.check_width(hi)?;
        match lo.value_cmp(hi)? {
            Ordering::Greater => {
                return Err(ZrouteError::InvalidAddress(format!(
                    "range start {} is above range end {}",
                    lo, hi
                )));
            }
            Ordering::Equal => return Ok(BTreeSet::new()),
            Ordering::Less => {}
        }

        // lo < hi, so the first differing bit is 0 in lo and 1 in hi.
        let split = lo.common_prefix_len(hi);
        let shared = CanonicalBox::new(lo.prefix(split));

        let mut cover = self.upper_half_envelope(&shared.child(false), lo)?;
        cover.append(&mut self.lower_half_envelope(&shared.child(true), hi)?);

        log::trace!(
            "envelope of [{}, {}] split at level {} into {} boxes",
            lo,
            hi,
            split,
            cover.len()
        );
        Ok(cover)
    }

    /// Canonical cover of the closed interval `[lo, hi]`: the envelope plus
    /// the two boundary leaves.
    pub fn region_cover(&self, lo: &Address, hi: &Address) -> Result<BTreeSet<CanonicalBox>> {
        let mut cover = self.region_envelope(lo, hi)?;
        cover.insert(CanonicalBox::new(lo.clone()));
        cover.insert(CanonicalBox::new(hi.clone()));
        Ok(cover)
    }

    /// Envelope of the Z-order interval spanned by a rectangle's corners.
    pub fn rect_envelope(&self, start: &[i64], end: &[i64]) -> Result<BTreeSet<CanonicalBox>> {
        let lo = self.encoder.encode(start)?;
        let hi = self.encoder.encode(end)?;
        self.region_envelope(&lo, &hi)
    }

    /// Closed cover of the Z-order interval spanned by a rectangle's corners.
    ///
    /// Every key inside the rectangle whose coordinates share the corners'
    /// signs encodes into this interval.
    pub fn rect_cover(&self, start: &[i64], end: &[i64]) -> Result<BTreeSet<CanonicalBox>> {
        let lo = self.encoder.encode(start)?;
        let hi = self.encoder.encode(end)?;
        self.region_cover(&lo, &hi)
    }

    fn check_width(&self, addr: &Address) -> Result<()> {
        if addr.width() != self.width() {
            return Err(ZrouteError::InvalidAddress(format!(
                "expected a {}-bit address, got {} ({} bits)",
                self.width(),
                addr,
                addr.width()
            )));
        }
        Ok(())
    }
}

/// Merge complete sibling pairs into their parent until none remain.
///
/// Boxes nested inside another box of the input are dropped first. The union
/// of the result equals the union of the input and the result never holds
/// more boxes than the input.
pub fn coalesce<I>(boxes: I) -> BTreeSet<CanonicalBox>
where
    I: IntoIterator<Item = CanonicalBox>,
{
    let sorted: BTreeSet<CanonicalBox> = boxes.into_iter().collect();

    // Descendants sort right after their ancestor.
    let mut set = BTreeSet::new();
    let mut kept: Option<CanonicalBox> = None;
    for b in sorted {
        if let Some(ancestor) = &kept
            && ancestor.is_ancestor_of(&b)
        {
            continue;
        }
        kept = Some(b.clone());
        set.insert(b);
    }

    loop {
        let mut merged = false;
        let mut next = BTreeSet::new();
        let mut iter = set.into_iter().peekable();
        while let Some(b) = iter.next() {
            if let Some(sibling) = b.sibling()
                && !b.prefix().bit(b.level() - 1)
                && iter.peek() == Some(&sibling)
                && let Some(parent) = b.parent()
            {
                iter.next();
                next.insert(parent);
                merged = true;
            } else {
                next.insert(b);
            }
        }
        set = next;
        if !merged {
            return set;
        }
    }
}
