/// Split `ids` into consecutive batches of at most `size` ids, in order.
///
/// The last batch holds the remainder. A `size` of zero is treated as one.
pub fn batches(ids: &[String], size: usize) -> std::slice::Chunks<'_, String> {
    ids.chunks(size.max(1))
}

/// Number of batches [`batches`] yields for `len` ids.
pub fn batch_count(len: usize, size: usize) -> usize {
    len.div_ceil(size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("id-{i}")).collect()
    }

    #[test]
    fn test_exact_multiple() {
        let ids = ids(98);
        let sizes: Vec<usize> = batches(&ids, 49).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![49, 49]);
    }

    #[test]
    fn test_partial_tail_is_flushed() {
        let ids = ids(100);
        let sizes: Vec<usize> = batches(&ids, 49).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![49, 49, 2]);
        assert_eq!(batch_count(100, 49), 3);
    }

    #[test]
    fn test_single_id() {
        let ids = ids(1);
        assert_eq!(batches(&ids, 49).count(), 1);
    }

    #[test]
    fn test_empty() {
        assert_eq!(batches(&[], 49).count(), 0);
        assert_eq!(batch_count(0, 49), 0);
    }

    #[test]
    fn test_zero_size() {
        let ids = ids(3);
        assert_eq!(batches(&ids, 0).count(), 3);
        assert_eq!(batch_count(3, 0), 3);
    }
}
