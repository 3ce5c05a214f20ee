/// Contiguous chunk of records handed to exactly one worker
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<T> {
    /// Position of the batch in partition order, starting at 1
    pub id: usize,
    pub records: Vec<T>,
}

impl<T> Batch<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Split `records` into ⌈N/B⌉ ordered batches of at most `batch_size` records
///
/// A batch size of 0 is treated as 1. No records yields no batches.
pub fn split_into_batches<T: Clone>(records: &[T], batch_size: usize) -> Vec<Batch<T>> {
    records
        .chunks(batch_size.max(1))
        .enumerate()
        .map(|(index, chunk)| Batch {
            id: index + 1,
            records: chunk.to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_250_records_make_three_batches() {
        let records: Vec<u32> = (0..250).collect();
        let batches = split_into_batches(&records, 100);

        let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(batches.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_input_makes_no_batches() {
        let batches = split_into_batches::<u32>(&[], 100);
        assert!(batches.is_empty());
    }

    #[test]
    fn test_partition_preserves_order_and_bounds() {
        for n in 0..40usize {
            for size in 1..12usize {
                let records: Vec<usize> = (0..n).collect();
                let batches = split_into_batches(&records, size);

                assert_eq!(batches.len(), n.div_ceil(size), "n={} size={}", n, size);
                assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= size));

                let flattened: Vec<usize> = batches.into_iter().flat_map(|b| b.records).collect();
                assert_eq!(flattened, records);
            }
        }
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let batches = split_into_batches(&[1, 2, 3], 0);
        assert_eq!(batches.len(), 3);
    }
}
