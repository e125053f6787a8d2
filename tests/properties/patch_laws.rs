//! Patch-engine properties observed through the container

use crate::common::*;
use crate::strategies::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A batch either applies fully or leaves the document identical
    #[test]
    fn batches_are_all_or_nothing(
        body in document("A"),
        ops in prop::collection::vec(operation(), 1..6),
    ) {
        let container = example_container();
        let before = container.create_item(body).unwrap();
        let partition = before.partition_key().clone();
        match container.patch_item("A", &partition, &ops, &ItemOptions::new()) {
            Ok(patched) => {
                prop_assert_ne!(patched.etag(), before.etag());
                prop_assert_eq!(container.read_item("A", &partition).unwrap(), patched);
            }
            Err(err) => {
                prop_assert!(err.is_invalid_patch());
                prop_assert_eq!(container.read_item("A", &partition).unwrap(), before);
            }
        }
    }

    /// Increment(a) then Increment(b) equals Increment(a + b)
    #[test]
    fn increments_compose(start in -1000i64..1000, a in -1000i64..1000, b in -1000i64..1000) {
        let container = example_container();
        container.create_item(counter("A", "p", start)).unwrap();
        container.create_item(counter("B", "p", start)).unwrap();

        container
            .patch_item(
                "A",
                &pk("p"),
                &[PatchOperation::increment("/counter", a), PatchOperation::increment("/counter", b)],
                &ItemOptions::new(),
            )
            .unwrap();
        container
            .patch_item("B", &pk("p"), &[PatchOperation::increment("/counter", a + b)], &ItemOptions::new())
            .unwrap();

        let left = container.read_item("A", &pk("p")).unwrap();
        let right = container.read_item("B", &pk("p")).unwrap();
        prop_assert_eq!(left.get("counter"), right.get("counter"));
    }

    /// Float increments land on the same value in either grouping
    #[test]
    fn float_increments_compose(a in -100i32..100, b in -100i32..100) {
        let container = example_container();
        container.create_item(counter("A", "p", 0)).unwrap();
        let (a, b) = (a as f64 / 4.0, b as f64 / 4.0);
        container
            .patch_item(
                "A",
                &pk("p"),
                &[PatchOperation::increment("/counter", a), PatchOperation::increment("/counter", b)],
                &ItemOptions::new(),
            )
            .unwrap();
        let stored = container.read_item("A", &pk("p")).unwrap();
        let value = stored.get("counter").and_then(|v| v.as_f64()).unwrap();
        prop_assert_eq!(value, a + b);
    }
}
