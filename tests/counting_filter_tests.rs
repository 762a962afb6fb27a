use scaling_bloom_rs::CountingFilter;

mod common;

fn filter_1k() -> CountingFilter {
    CountingFilter::new(&common::test_config(1000, 0.01))
        .expect("Valid config should build a filter")
}

#[cfg(test)]
mod basic_operations_tests {
    use super::*;

    #[test]
    fn test_add_check_remove_cycle() {
        let mut filter = filter_1k();

        assert!(!filter.check(b"record"), "Empty filter contains nothing");
        assert!(!filter.add(b"record"), "First add reports the item as new");
        assert!(filter.check(b"record"), "Item present after add");

        filter.remove(b"record");
        assert!(
            !filter.check(b"record"),
            "Single item fully removed from an otherwise empty filter"
        );
    }

    #[test]
    fn test_add_reports_already_present() {
        let mut filter = filter_1k();
        assert!(!filter.add(b"dup"));
        assert!(filter.add(b"dup"), "All counters non-zero on second add");

        assert_eq!(filter.total_insertions(), 2);
        assert_eq!(filter.unique_insertions(), 1);
        assert_eq!(filter.element_count(), 2);
    }

    #[test]
    fn test_no_false_negatives() {
        let mut filter = filter_1k();
        let items = common::generate_test_items(800);

        for item in &items {
            filter.add(item);
        }
        for item in &items {
            assert!(
                filter.check(item),
                "FALSE NEGATIVE for {:?}",
                String::from_utf8_lossy(item)
            );
        }
    }

    #[test]
    fn test_reset() {
        let mut filter = filter_1k();
        for item in common::generate_test_items(50) {
            filter.add(&item);
        }
        filter.reset();

        assert_eq!(filter.element_count(), 0);
        assert_eq!(filter.total_insertions(), 0);
        assert!(!filter.check(b"test_item_000000"), "Counters zeroed by reset");
    }

    #[test]
    fn test_near_one_error_rate_rejected_at_construction() {
        // Sized-to-zero-bits configurations must fail construction rather
        // than surface later as a divide-by-zero during hashing.
        let result = CountingFilter::new(&common::test_config(1000, 0.9999999));
        assert!(result.is_err(), "Zero-bit sizing must not build a filter");
    }

    #[test]
    fn test_stats_surface() {
        let filter = filter_1k();
        assert_eq!(filter.capacity(), 1000);
        assert_eq!(filter.error_rate(), 0.01);
        assert_eq!(filter.hash_count(), 7);
        assert_eq!(filter.total_counters(), 7 * 1370);
    }
}

#[cfg(test)]
mod multiplicity_tests {
    use super::*;

    #[test]
    fn test_estimate_is_upper_bound_on_multiplicity() {
        let mut filter = filter_1k();

        assert_eq!(filter.estimate_count(b"thing"), 0, "Absent item estimates 0");
        for expected in 1..=5u8 {
            filter.add(b"thing");
            let estimate = filter.estimate_count(b"thing");
            assert!(
                estimate >= expected,
                "Estimate {} must never undercount true multiplicity {}",
                estimate,
                expected
            );
        }
    }

    #[test]
    fn test_check_and_add_returns_prior_estimate() {
        let mut filter = filter_1k();

        assert_eq!(filter.check_and_add(b"seq"), 0, "First insert saw nothing");
        let second = filter.check_and_add(b"seq");
        assert!(second >= 1, "Second insert must see the first");
        assert_eq!(filter.total_insertions(), 2);
        assert_eq!(filter.unique_insertions(), 1);
    }

    #[test]
    fn test_remove_decrements_estimate() {
        let mut filter = filter_1k();
        for _ in 0..4 {
            filter.add(b"multi");
        }
        let before = filter.estimate_count(b"multi");
        filter.remove(b"multi");
        let after = filter.estimate_count(b"multi");
        assert!(
            after < before,
            "Removal must lower the estimate ({} -> {})",
            before,
            after
        );
    }
}

#[cfg(test)]
mod saturation_and_underflow_tests {
    use super::*;

    #[test]
    fn test_counters_saturate_at_fifteen() {
        common::init_tracing();
        let mut filter = filter_1k();

        // Drive every selected counter past the 4-bit maximum.
        for _ in 0..20 {
            filter.add(b"hot item");
        }

        assert_eq!(
            filter.estimate_count(b"hot item"),
            15,
            "Estimate pins at the counter maximum"
        );
        assert!(filter.check(b"hot item"), "Saturated item stays present");
        assert!(
            filter.saturation_events() > 0,
            "Saturation must be reported, not silent"
        );
    }

    #[test]
    fn test_saturated_presence_survives_removals() {
        let mut filter = filter_1k();
        for _ in 0..20 {
            filter.add(b"pinned");
        }

        // 20 adds saturated at 15; 10 removals leave every counter >= 5.
        for _ in 0..10 {
            filter.remove(b"pinned");
        }
        assert!(
            filter.check(b"pinned"),
            "Presence must survive removals that cannot drain a pinned counter"
        );
    }

    #[test]
    fn test_remove_of_absent_item_is_nonfatal() {
        common::init_tracing();
        let mut filter = filter_1k();

        filter.remove(b"never added");
        assert!(
            filter.underflow_events() > 0,
            "Underflow must be reported, not silent"
        );
        assert!(!filter.check(b"never added"), "Counters stay at zero");

        // Filter keeps working normally afterwards.
        assert!(!filter.add(b"next"), "Add still works after underflow");
        assert!(filter.check(b"next"));
    }

    #[test]
    fn test_underflow_does_not_disturb_other_items() {
        let mut filter = filter_1k();
        filter.add(b"keeper");
        filter.remove(b"never added");
        assert!(
            filter.check(b"keeper"),
            "Underflow handling must not touch unrelated items"
        );
    }
}

#[cfg(test)]
mod behavioral_guarantees_tests {
    use super::*;

    #[test]
    fn test_check_is_idempotent() {
        let mut filter = filter_1k();
        filter.add(b"anchor");

        for _ in 0..50 {
            filter.check(b"anchor");
            filter.check(b"absent");
        }
        assert_eq!(filter.element_count(), 1, "check must not mutate counters");
        assert!(filter.add(b"anchor"), "add behavior unchanged after checks");
    }

    #[test]
    fn test_false_positive_rate_within_bounds() {
        let capacity = 10_000u64;
        let target_fpr = 0.01;
        let mut filter =
            CountingFilter::new(&common::test_config(capacity, target_fpr))
                .unwrap();

        for item in common::generate_test_items(capacity as usize) {
            filter.add(&item);
        }

        let probes = 10_000;
        let false_positives = (0..probes)
            .filter(|i| filter.check(format!("absent_probe_{i}").as_bytes()))
            .count();
        let measured = false_positives as f64 / probes as f64;

        assert!(
            measured <= target_fpr * 3.0,
            "Measured FPR {:.4} should be within 3x of target {:.4}",
            measured,
            target_fpr
        );
    }
}
