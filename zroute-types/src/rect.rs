use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle over signed integer keys.
///
/// Both corners are inclusive. The corners are kept as given; callers that
/// route a rectangle expect `start` to be the corner with the smaller Morton
/// address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyRect {
    /// The lower corner
    pub start: Vec<i64>,
    /// The upper corner
    pub end: Vec<i64>,
}

impl KeyRect {
    /// Create a rectangle from its two inclusive corners.
    ///
    /// # Examples
    ///
    /// ```
    /// use zroute_types::rect::KeyRect;
    ///
    /// let rect = KeyRect::new(vec![1, 1], vec![3, 3]);
    /// assert_eq!(rect.dims(), 2);
    /// ```
    pub fn new(start: Vec<i64>, end: Vec<i64>) -> Self {
        Self { start, end }
    }

    /// Create the pruning box of a nearest-neighbour search: every key within
    /// `radius` of `center` along each axis.
    ///
    /// Corners saturate at the `i64` range.
    ///
    /// # Examples
    ///
    /// ```
    /// use zroute_types::rect::KeyRect;
    ///
    /// let rect = KeyRect::around(&[10, 20], 5);
    /// assert_eq!(rect.start, vec![5, 15]);
    /// assert_eq!(rect.end, vec![15, 25]);
    /// ```
    pub fn around(center: &[i64], radius: u64) -> Self {
        let radius = i64::try_from(radius).unwrap_or(i64::MAX);
        Self {
            start: center.iter().map(|c| c.saturating_sub(radius)).collect(),
            end: center.iter().map(|c| c.saturating_add(radius)).collect(),
        }
    }

    /// Number of dimensions, taken from the lower corner.
    pub fn dims(&self) -> usize {
        self.start.len()
    }

    /// Check whether the two corners have the same dimensionality.
    pub fn is_well_formed(&self) -> bool {
        self.start.len() == self.end.len()
    }

    /// Check whether `key` lies inside the rectangle on every axis.
    pub fn contains(&self, key: &[i64]) -> bool {
        key.len() == self.start.len()
            && self.is_well_formed()
            && key
                .iter()
                .zip(self.start.iter().zip(self.end.iter()))
                .all(|(k, (lo, hi))| lo <= k && k <= hi)
    }
}
