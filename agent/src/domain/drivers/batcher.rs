//! Splitting mapped records into backend-sized chunks

use std::slice::Chunks;

/// Contiguous chunks of at most `max_chunk_size` items, in input order.
///
/// Empty input yields no chunks. A zero limit is treated as one.
pub fn batches<T>(items: &[T], max_chunk_size: usize) -> Chunks<'_, T> {
    items.chunks(max_chunk_size.max(1))
}
