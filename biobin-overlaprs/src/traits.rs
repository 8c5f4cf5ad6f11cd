use num_traits::{PrimInt, Unsigned};

pub use biobin_core::models::Interval;

/// Query interface over a static collection of closed intervals.
pub trait Overlapper<I, T>: Send + Sync
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    fn build(intervals: Vec<Interval<I, T>>) -> Self
    where
        Self: Sized;

    /// All intervals sharing at least one position with `[start, end]`.
    fn find(&self, start: I, end: I) -> Vec<Interval<I, T>>;

    fn find_iter<'a>(
        &'a self,
        start: I,
        end: I,
    ) -> Box<dyn Iterator<Item = &'a Interval<I, T>> + 'a>;

    /// All intervals containing `pos`.
    fn find_point<'a>(&'a self, pos: I) -> Box<dyn Iterator<Item = &'a Interval<I, T>> + 'a> {
        self.find_iter(pos, pos)
    }
}
