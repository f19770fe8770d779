//! Inbound UART byte ring.
//!
//! Bridges bursty non-blocking UART reads to the byte-at-a-time frame parser.
//! A burst is appended at the cursor (tail segment first, then the wrapped
//! head segment) and the parser then walks the same span.

/// Reasons a burst cannot be appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IngestError {
    /// The burst would overwrite its own first bytes.
    #[error("burst of {len} bytes exceeds the {capacity}-byte ring")]
    BurstTooLarge { len: usize, capacity: usize },
}

/// Fixed-capacity circular byte buffer with a single write cursor.
pub struct ByteRing<const N: usize> {
    buffer: [u8; N],
    cursor: usize,
}

impl<const N: usize> ByteRing<N> {
    /// Create an empty ring with the cursor at offset 0.
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            cursor: 0,
        }
    }

    /// Ring capacity in bytes.
    #[inline]
    pub const fn capacity(&self) -> usize { N }

    /// Offset the next burst will be written to.
    #[inline]
    pub const fn cursor(&self) -> usize { self.cursor }

    /// Byte stored at `offset` (taken modulo the capacity).
    #[inline]
    pub const fn get(
        &self,
        offset: usize,
    ) -> u8 {
        self.buffer[offset % N]
    }

    /// Append a burst and advance the cursor by its length.
    ///
    /// Returns the offset the burst starts at. A zero-length burst is a no-op.
    pub fn append(
        &mut self,
        burst: &[u8],
    ) -> Result<usize, IngestError> {
        if burst.len() > N {
            return Err(IngestError::BurstTooLarge {
                len: burst.len(),
                capacity: N,
            });
        }

        let start = self.cursor;
        let tail_space = N - start;

        if burst.len() > tail_space {
            let (tail, head) = burst.split_at(tail_space);
            self.buffer[start..].copy_from_slice(tail);
            self.buffer[..head.len()].copy_from_slice(head);
        } else {
            self.buffer[start..start + burst.len()].copy_from_slice(burst);
        }

        self.cursor = (start + burst.len()) % N;
        Ok(start)
    }

    /// Iterate `len` bytes starting at `start`, wrapping around the end.
    pub fn span(
        &self,
        start: usize,
        len: usize,
    ) -> impl Iterator<Item = u8> + '_ {
        (0..len).map(move |i| self.buffer[(start + i) % N])
    }
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ring() {
        let ring: ByteRing<8> = ByteRing::new();
        assert_eq!(ring.capacity(), 8);
        assert_eq!(ring.cursor(), 0);
    }

    #[test]
    fn test_empty_burst_is_noop() {
        let mut ring: ByteRing<8> = ByteRing::new();
        ring.append(&[1, 2, 3]).unwrap();
        assert_eq!(ring.append(&[]), Ok(3));
        assert_eq!(ring.cursor(), 3);
    }

    #[test]
    fn test_append_without_wrap() {
        let mut ring: ByteRing<8> = ByteRing::new();
        let start = ring.append(&[10, 20, 30]).unwrap();
        assert_eq!(start, 0);
        assert_eq!(ring.cursor(), 3);
        assert_eq!(ring.span(start, 3).collect::<Vec<_>>(), vec![10, 20, 30]);
    }

    #[test]
    fn test_append_exactly_to_end_wraps_cursor() {
        let mut ring: ByteRing<4> = ByteRing::new();
        ring.append(&[1, 2]).unwrap();
        ring.append(&[3, 4]).unwrap();
        assert_eq!(ring.cursor(), 0);
    }

    #[test]
    fn test_wraparound_matches_linear_append() {
        // Same logical byte sequence whether or not the burst straddles the end
        let data: Vec<u8> = (0..12).collect();

        let mut wrapping: ByteRing<16> = ByteRing::new();
        wrapping.append(&[0xEE; 10]).unwrap();
        let start = wrapping.append(&data).unwrap();
        assert_eq!(start, 10);
        assert_eq!(wrapping.cursor(), 6);

        let mut linear: ByteRing<16> = ByteRing::new();
        let linear_start = linear.append(&data).unwrap();

        assert_eq!(
            wrapping.span(start, data.len()).collect::<Vec<_>>(),
            linear.span(linear_start, data.len()).collect::<Vec<_>>()
        );
        // Head segment landed at the front of the buffer
        assert_eq!(wrapping.get(0), 6);
        assert_eq!(wrapping.get(5), 11);
        // Earlier bytes past the head segment are untouched
        assert_eq!(wrapping.get(6), 0xEE);
        assert_eq!(wrapping.get(9), 0xEE);
    }

    #[test]
    fn test_full_capacity_burst() {
        let mut ring: ByteRing<4> = ByteRing::new();
        ring.append(&[9]).unwrap();
        let start = ring.append(&[1, 2, 3, 4]).unwrap();
        assert_eq!(ring.span(start, 4).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(ring.cursor(), 1);
    }

    #[test]
    fn test_oversized_burst_rejected() {
        let mut ring: ByteRing<4> = ByteRing::new();
        assert_eq!(
            ring.append(&[0; 5]),
            Err(IngestError::BurstTooLarge { len: 5, capacity: 4 })
        );
        assert_eq!(ring.cursor(), 0);
    }
}
