use std::mem::swap;

use num_traits::{PrimInt, Unsigned};

use super::Overlapper;
use biobin_core::models::Interval;

/// Minimum number of covered successors before an interval is moved to a later sublist.
const MIN_COVERAGE: usize = 10;

/// An Augmented Interval List over closed intervals.
///
/// From the following article: <https://academic.oup.com/bioinformatics/article/35/23/4907/5509521>
///
/// Intervals are split into sublists so that long intervals (a gene spanning
/// many smaller ones) do not defeat the running `max_ends` early exit. Every
/// sublist is sorted by start and queried by scanning backwards from the last
/// start at or before the query end.
///
/// # Examples
///
/// ```
/// use biobin_overlaprs::{AIList, Overlapper, Interval};
///
/// let genes = vec![
///     Interval { start: 1000u32, end: 2000, val: "GENE1" },
///     Interval { start: 1500, end: 2500, val: "GENE2" },
///     Interval { start: 5000, end: 6000, val: "GENE3" },
/// ];
///
/// let ailist = AIList::build(genes);
///
/// // both ends are inclusive
/// assert_eq!(ailist.find_point(2000).count(), 2);
/// assert_eq!(ailist.find_point(2501).count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct AIList<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    starts: Vec<I>,
    ends: Vec<I>,
    max_ends: Vec<I>,
    header_list: Vec<usize>,
    stored_intervals: Vec<Interval<I, T>>,
}

/// Scratch space for one [`AIList::decompose`] pass.
#[derive(Debug, Default)]
struct Sublist<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    starts: Vec<I>,
    ends: Vec<I>,
    max_ends: Vec<I>,
    stored_intervals: Vec<Interval<I, T>>,
    /// Intervals deferred to the next sublist.
    deferred: Vec<Interval<I, T>>,
}

impl<I, T> Sublist<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    fn with_capacity(cap: usize) -> Self {
        Self {
            starts: Vec::with_capacity(cap),
            ends: Vec::with_capacity(cap),
            max_ends: Vec::with_capacity(cap),
            stored_intervals: Vec::with_capacity(cap),
            deferred: Vec::with_capacity(cap),
        }
    }

    fn clear(&mut self) {
        self.starts.clear();
        self.ends.clear();
        self.max_ends.clear();
        self.stored_intervals.clear();
        self.deferred.clear();
    }
}

impl<I, T> Overlapper<I, T> for AIList<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    fn build(intervals: Vec<Interval<I, T>>) -> Self
    where
        Self: Sized,
    {
        let mut intervals = intervals;
        intervals.sort();

        let mut starts = Vec::with_capacity(intervals.len());
        let mut ends = Vec::with_capacity(intervals.len());
        let mut max_ends = Vec::with_capacity(intervals.len());
        let mut stored_intervals = Vec::with_capacity(intervals.len());

        // drained into the vectors above on every pass, capacity is reused
        let mut scratch = Sublist::with_capacity(intervals.len());

        let mut header_list = vec![0];

        loop {
            Self::decompose(&intervals, MIN_COVERAGE, &mut scratch);

            starts.append(&mut scratch.starts);
            ends.append(&mut scratch.ends);
            max_ends.append(&mut scratch.max_ends);
            stored_intervals.append(&mut scratch.stored_intervals);
            swap(&mut intervals, &mut scratch.deferred);

            if intervals.is_empty() {
                break;
            }
            header_list.push(starts.len());
        }

        AIList {
            starts,
            ends,
            max_ends,
            header_list,
            stored_intervals,
        }
    }

    fn find(&self, start: I, end: I) -> Vec<Interval<I, T>> {
        self.find_iter(start, end).cloned().collect()
    }

    fn find_iter<'a>(
        &'a self,
        start: I,
        end: I,
    ) -> Box<dyn Iterator<Item = &'a Interval<I, T>> + 'a> {
        Box::new(IterFind::new(self, start, end))
    }
}

impl<I, T> AIList<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    fn decompose(
        intervals: &[Interval<I, T>],
        minimum_coverage_length: usize,
        scratch: &mut Sublist<I, T>,
    ) {
        scratch.clear();

        for (index, interval) in intervals.iter().enumerate() {
            let covered = intervals
                .iter()
                .skip(index + 1)
                .take(minimum_coverage_length * 2 - 1)
                .filter(|next| interval.end > next.end)
                .count();

            if covered >= minimum_coverage_length {
                scratch.deferred.push(interval.clone());
            } else {
                scratch.starts.push(interval.start);
                scratch.ends.push(interval.end);
                scratch.stored_intervals.push(interval.clone());
            }
        }

        let mut max = I::zero();
        for end in scratch.ends.iter() {
            max = max.max(*end);
            scratch.max_ends.push(max);
        }
    }

    fn sublist_range(&self, idx: usize) -> std::ops::Range<usize> {
        let begin = self.header_list[idx];
        let end = self
            .header_list
            .get(idx + 1)
            .copied()
            .unwrap_or(self.starts.len());
        begin..end
    }

    /// Returns the number of intervals in the AIList.
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// Returns `true` if the AIList contains no intervals.
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}

/// Lazy iterator over the intervals of an [`AIList`] overlapping `[start, stop]`.
///
/// Created by [`find_iter`](Overlapper::find_iter).
#[derive(Debug)]
pub struct IterFind<'a, I, T>
where
    T: Eq + Clone + Send + Sync + 'a,
    I: PrimInt + Unsigned + Send + Sync,
{
    inner: &'a AIList<I, T>,
    header_list_idx: usize,
    list_idx: Option<usize>,
    start: I,
    stop: I,
}

impl<'a, I, T> IterFind<'a, I, T>
where
    I: PrimInt + Unsigned + Send + Sync + 'a,
    T: Eq + Clone + Send + Sync,
{
    fn new(ailist: &'a AIList<I, T>, start: I, stop: I) -> Self {
        Self {
            inner: ailist,
            header_list_idx: 0,
            list_idx: None,
            start,
            stop,
        }
    }
}

impl<'a, I, T> Iterator for IterFind<'a, I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync + 'a,
{
    type Item = &'a Interval<I, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start > self.stop {
            return None;
        }

        while self.header_list_idx < self.inner.header_list.len() {
            let range = self.inner.sublist_range(self.header_list_idx);
            let starts = &self.inner.starts[range.clone()];
            let ends = &self.inner.ends[range.clone()];
            let max_ends = &self.inner.max_ends[range.clone()];
            let stored = &self.inner.stored_intervals[range];

            let stop = self.stop;
            let i = self
                .list_idx
                .get_or_insert_with(|| starts.partition_point(|&x| x <= stop));

            while *i > 0 {
                *i -= 1;
                // closed on both ends
                if self.start > ends[*i] {
                    if self.start > max_ends[*i] {
                        break;
                    }
                } else {
                    return Some(&stored[*i]);
                }
            }
            self.list_idx = None;
            self.header_list_idx += 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn intervals() -> Vec<Interval<u32, &'static str>> {
        vec![
            Interval {
                start: 1,
                end: 5,
                val: "a",
            },
            Interval {
                start: 3,
                end: 7,
                val: "b",
            },
            Interval {
                start: 6,
                end: 10,
                val: "c",
            },
            Interval {
                start: 8,
                end: 12,
                val: "d",
            },
        ]
    }

    fn vals(found: Vec<&Interval<u32, &'static str>>) -> Vec<&'static str> {
        let mut vals: Vec<&str> = found.iter().map(|i| i.val).collect();
        vals.sort();
        vals
    }

    #[rstest]
    fn test_build_and_len(intervals: Vec<Interval<u32, &'static str>>) {
        let ailist = AIList::build(intervals.clone());
        assert_eq!(ailist.len(), intervals.len());
        assert_eq!(ailist.is_empty(), false);
    }

    #[rstest]
    #[case(5, vec!["a", "b"])]
    #[case(1, vec!["a"])]
    #[case(7, vec!["b", "c"])]
    #[case(12, vec!["d"])]
    #[case(13, vec![])]
    #[case(0, vec![])]
    fn test_find_point_inclusive_ends(
        intervals: Vec<Interval<u32, &'static str>>,
        #[case] pos: u32,
        #[case] expected: Vec<&'static str>,
    ) {
        let ailist = AIList::build(intervals);
        assert_eq!(vals(ailist.find_point(pos).collect()), expected);
    }

    #[rstest]
    fn test_find_range(intervals: Vec<Interval<u32, &'static str>>) {
        let ailist = AIList::build(intervals);
        let found = ailist.find(10, 20);
        let mut names: Vec<&str> = found.iter().map(|i| i.val).collect();
        names.sort();
        assert_eq!(names, vec!["c", "d"]);
    }

    #[rstest]
    fn test_empty_ailist() {
        let ailist: AIList<u32, &str> = AIList::build(vec![]);
        assert_eq!(ailist.is_empty(), true);
        assert_eq!(ailist.find_point(1).count(), 0);
    }

    #[rstest]
    fn test_nested_intervals_use_sublists() {
        let iv = |start: u32, end: u32| Interval {
            start,
            end,
            val: start * 1000 + end,
        };
        // one long gene spanning many short ones
        let mut intervals = vec![iv(0, 1000)];
        intervals.extend((0..30).map(|i| iv(i * 20 + 1, i * 20 + 5)));

        let ailist = AIList::build(intervals);
        assert_eq!(ailist.header_list.len(), 2);

        // the long interval is found even past a run of non-overlapping short ones
        let found: Vec<u32> = ailist.find_point(590).map(|i| i.val).collect();
        assert_eq!(found, vec![1000]);

        let mut found: Vec<u32> = ailist.find_point(21).map(|i| i.val).collect();
        found.sort();
        assert_eq!(found, vec![1000, 21025]);
    }
}
