//! Note: This entire mod is a candidate to upstream into arrow-rs.

use arrow_array::OffsetSizeTrait;
use arrow_buffer::OffsetBuffer;

/// Offsets utils that I miss from arrow2
pub trait OffsetBufferUtils<O: OffsetSizeTrait> {
    /// Returns the number of groups described by these offsets.
    fn num_groups(&self) -> usize;

    /// Returns a range (start, end) corresponding to the position `index`
    ///
    /// # Panic
    ///
    /// Panics iff `index >= self.num_groups()`
    fn start_end(&self, index: usize) -> (usize, usize);

    /// Returns the first offset as a `usize`.
    fn first_offset(&self) -> usize;

    /// Returns the last offset as a `usize`.
    fn last_offset(&self) -> usize;
}

impl<O: OffsetSizeTrait> OffsetBufferUtils<O> for OffsetBuffer<O> {
    #[inline]
    fn num_groups(&self) -> usize {
        self.len() - 1
    }

    #[inline]
    fn start_end(&self, index: usize) -> (usize, usize) {
        assert!(index < self.num_groups());
        let start = self[index].as_usize();
        let end = self[index + 1].as_usize();
        (start, end)
    }

    #[inline]
    fn first_offset(&self) -> usize {
        self[0].as_usize()
    }

    #[inline]
    fn last_offset(&self) -> usize {
        self[self.len() - 1].as_usize()
    }
}
