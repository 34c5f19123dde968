//! Decoded tile content.

use std::collections::BTreeMap;

use bytes::Bytes;

/// A named unit of decoded renderable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Style layer the content belongs to.
    pub layer_id: String,
    /// Decoded payload, opaque to the loading pipeline.
    pub data: Bytes,
}

impl Bucket {
    /// Creates a bucket.
    pub fn new(layer_id: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            layer_id: layer_id.into(),
            data: data.into(),
        }
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Buckets of a tile keyed by name.
pub type BucketMap = BTreeMap<String, Bucket>;

/// Merges `incoming` into `existing`.
///
/// Incoming keys overwrite, every other existing key is left untouched.
pub fn merge_buckets(existing: &mut BucketMap, incoming: BucketMap) {
    existing.extend(incoming);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn map(entries: &[(&str, u8)]) -> BucketMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), Bucket::new(*k, vec![*v])))
            .collect()
    }

    #[test]
    fn test_merge_is_additive() {
        let mut buckets = BucketMap::new();
        merge_buckets(&mut buckets, map(&[("a", 1)]));
        merge_buckets(&mut buckets, map(&[("b", 2)]));
        assert_eq!(buckets, map(&[("a", 1), ("b", 2)]));

        merge_buckets(&mut buckets, map(&[("a", 3)]));
        assert_eq!(buckets, map(&[("a", 3), ("b", 2)]));
    }

    #[test]
    fn test_merge_empty_is_noop() {
        let mut buckets = map(&[("a", 1)]);
        merge_buckets(&mut buckets, BucketMap::new());
        assert_eq!(buckets, map(&[("a", 1)]));
    }

    proptest! {
        #[test]
        fn prop_merge_idempotent_and_overwriting(
            first in proptest::collection::btree_map("[a-e]", any::<u8>(), 0..5),
            second in proptest::collection::btree_map("[a-e]", any::<u8>(), 0..5),
        ) {
            let to_map = |m: &BTreeMap<String, u8>| -> BucketMap {
                m.iter().map(|(k, v)| (k.clone(), Bucket::new(k.clone(), vec![*v]))).collect()
            };

            let mut merged = to_map(&first);
            merge_buckets(&mut merged, to_map(&second));
            let once = merged.clone();
            merge_buckets(&mut merged, to_map(&second));
            prop_assert_eq!(&merged, &once);

            for (k, v) in &second {
                prop_assert_eq!(merged[k].data.as_ref(), &[*v]);
            }
            for (k, v) in &first {
                if !second.contains_key(k) {
                    prop_assert_eq!(merged[k].data.as_ref(), &[*v]);
                }
            }
        }
    }
}
