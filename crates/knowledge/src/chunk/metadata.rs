//! Chunk metadata back-fill.

use super::Chunk;

/// Assign dense indices and the final chunk count.
pub fn finalize(chunks: &mut [Chunk]) {
    let total = chunks.len();
    for (index, chunk) in chunks.iter_mut().enumerate() {
        chunk.metadata.chunk_index = index;
        chunk.metadata.total_chunks = total;
    }
}

/// 1-based page for a character position: one plus the number of page
/// breaks strictly before it. `page_breaks` must be ascending.
pub fn find_page_number(position: usize, page_breaks: &[usize]) -> u32 {
    page_breaks.partition_point(|&b| b < position) as u32 + 1
}

/// Set `page_number` on every chunk from its start position.
pub fn assign_pages(chunks: &mut [Chunk], page_breaks: &[usize]) {
    for chunk in chunks {
        chunk.metadata.page_number = Some(find_page_number(
            chunk.metadata.start_position,
            page_breaks,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_page_number() {
        let breaks = [500, 1200];
        assert_eq!(find_page_number(0, &breaks), 1);
        assert_eq!(find_page_number(500, &breaks), 1);
        assert_eq!(find_page_number(501, &breaks), 2);
        assert_eq!(find_page_number(700, &breaks), 2);
        assert_eq!(find_page_number(5000, &breaks), 3);
        assert_eq!(find_page_number(42, &[]), 1);
    }
}
