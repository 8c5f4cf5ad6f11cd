use num_traits::{PrimInt, Unsigned};
use std::cmp::Ordering;

/// Represent a closed range `[start, end]`; both ends are inclusive,
/// matching how gene and pathway boundaries are stored.
#[derive(Eq, Debug, Clone)]
pub struct Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    pub start: I,
    pub end: I,
    pub val: T,
}

impl<I, T> Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    pub fn contains(&self, pos: I) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Check if the interval shares at least one position with `[start, end]`
    #[inline]
    pub fn overlap(&self, start: I, end: I) -> bool {
        self.start <= end && self.end >= start
    }
}

impl<I, T> Ord for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn cmp(&self, other: &Interval<I, T>) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end.cmp(&other.end))
    }
}

impl<I, T> PartialOrd for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I, T> PartialEq for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn eq(&self, other: &Interval<I, T>) -> bool {
        self.start == other.start && self.end == other.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(10, true)]
    #[case(20, true)]
    #[case(15, true)]
    #[case(9, false)]
    #[case(21, false)]
    fn test_contains_is_closed(#[case] pos: u32, #[case] expected: bool) {
        let iv = Interval {
            start: 10u32,
            end: 20,
            val: (),
        };
        assert_eq!(iv.contains(pos), expected);
    }

    #[rstest]
    fn test_overlap_touching_ends() {
        let iv = Interval {
            start: 10u32,
            end: 20,
            val: (),
        };
        assert!(iv.overlap(20, 30));
        assert!(iv.overlap(0, 10));
        assert!(!iv.overlap(21, 30));
    }
}
