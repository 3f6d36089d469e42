/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use perf_histogram::Histogram;

fn spread(n: u64, low: u64, high: u64) -> impl Iterator<Item = u64> {
    // deterministic pseudo random values in [low, high]
    let mut state = 0x2545_f491_4f6c_dd1d_u64;
    (0..n).map(move |_| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        low + state % (high - low + 1)
    })
}

mod record {
    use super::*;

    #[test]
    fn in_range() {
        let mut h = Histogram::new(1, 1_000_000_000, 3).unwrap();
        for v in spread(10_000, 1, 1_000_000_000) {
            assert!(h.record(v));
            assert!(h.value_at_percentile(100.0) >= v);
        }
        assert_eq!(h.total_count(), 10_000);
    }

    #[test]
    fn out_of_range() {
        let mut h = Histogram::new(1_000, 2_000_000, 2).unwrap();
        h.record(5_000);
        for v in [0, 1, 999, 2_000_001, u64::MAX] {
            assert!(!h.record(v));
            assert_eq!(h.total_count(), 1);
        }
        assert_eq!(h.min(), 5_000);
        assert_eq!(h.max(), 5_000);
    }

    #[test]
    fn fixed_footprint() {
        let mut h = Histogram::new(1, 3_600_000_000_000, 3).unwrap();
        let len = h.len();
        for v in spread(100_000, 1, 3_600_000_000_000) {
            h.record(v);
        }
        assert_eq!(h.len(), len);
    }
}

mod reset {
    use super::*;

    #[test]
    fn empty_state() {
        let mut h = Histogram::new(1, 1_000_000, 3).unwrap();
        for v in spread(1_000, 1, 1_000_000) {
            h.record(v);
        }
        h.reset();
        h.reset();
        assert_eq!(h.total_count(), 0);
        assert_eq!(h.min(), 0);
        assert_eq!(h.max(), 0);
        assert_eq!(h.mean(), 0.0);
        for p in [0.0, 25.0, 50.0, 99.9, 100.0] {
            assert_eq!(h.value_at_percentile(p), 0);
        }
        assert_eq!(h.percentiles().count(), 0);
        assert_eq!(h, Histogram::new(1, 1_000_000, 3).unwrap());
    }
}

mod merge {
    use super::*;

    #[test]
    fn order_independent() {
        let mut h0 = Histogram::new(1, 10_000_000, 3).unwrap();
        let mut h1 = h0.clone();
        let mut h2 = h0.clone();
        for v in spread(500, 1, 1_000) {
            h0.record(v);
        }
        for v in spread(700, 1_000, 10_000_000) {
            h1.record(v);
        }
        for v in spread(300, 50, 500_000) {
            h2.record(v);
        }

        let mut a = h0.clone();
        a.merge(&h1).unwrap();
        a.merge(&h2).unwrap();

        let mut b = h0.clone();
        b.merge(&h2).unwrap();
        b.merge(&h1).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.total_count(), 1_500);
    }

    #[test]
    fn incompatible() {
        let mut a = Histogram::new(1, 10_000, 3).unwrap();
        a.record(10);
        let before = a.clone();

        for b in [
            Histogram::new(2, 10_000, 3).unwrap(),
            Histogram::new(1, 10_001, 3).unwrap(),
            Histogram::new(1, 10_000, 4).unwrap(),
        ] {
            assert!(a.merge(&b).is_err());
            assert_eq!(a, before);
        }
    }
}

mod percentile {
    use super::*;

    #[test]
    fn monotonic() {
        let mut h = Histogram::new(1, 100_000_000, 2).unwrap();
        for v in spread(5_000, 1, 100_000_000) {
            h.record(v);
        }
        let mut last = 0;
        let mut p = 0.0;
        while p <= 100.0 {
            let v = h.value_at_percentile(p);
            assert!(v >= last, "percentile {p}: {v} < {last}");
            last = v;
            p += 0.25;
        }
        assert_eq!(h.value_at_percentile(0.0), h.min());
        assert_eq!(h.value_at_percentile(100.0), h.max());
    }

    #[test]
    fn uniform_median() {
        let mut h = Histogram::new(1, 1_000_000, 3).unwrap();
        let mut values: Vec<u64> = spread(1_000, 100, 200).collect();
        for v in &values {
            h.record(*v);
        }
        values.sort_unstable();
        let true_median = values[499];

        let median = h.value_at_percentile(50.0);
        assert!((100..=200).contains(&median));
        let err = median.abs_diff(true_median) as f64 / true_median as f64;
        assert!(err <= 0.001, "median {median} vs {true_median}");
    }

    #[test]
    fn iterator_matches_queries() {
        let mut h = Histogram::new(1, 10_000_000, 3).unwrap();
        for v in spread(2_000, 1, 10_000_000) {
            h.record(v);
        }
        for (p, v) in h.percentiles() {
            if p > 0.0 && p < 100.0 {
                assert!(h.value_at_percentile(p) <= v);
            }
        }
    }
}

mod reference {
    use super::*;

    #[test]
    fn bucket_layout() {
        for (low, high, sigfig) in [
            (1, 3_600_000_000_000, 3),
            (1, (1 << 53) - 1, 3),
            (1_000, 1_000_000_000, 2),
            (1, 1_000_000, 5),
            (7, 100_000, 1),
        ] {
            let ours = Histogram::new(low, high, sigfig).unwrap();
            let theirs =
                hdrhistogram::Histogram::<u64>::new_with_bounds(low, high, sigfig).unwrap();
            assert_eq!(ours.len(), theirs.distinct_values());
            assert_eq!(ours.bucket_count(), theirs.buckets());

            for v in spread(1_000, low, high) {
                assert_eq!(ours.lowest_equivalent(v), theirs.lowest_equivalent(v));
                assert_eq!(ours.highest_equivalent(v), theirs.highest_equivalent(v));
                assert_eq!(ours.median_equivalent(v), theirs.median_equivalent(v));
            }
        }
    }

    #[test]
    fn mean_matches() {
        let mut ours = Histogram::new(1, 1_000_000_000, 3).unwrap();
        let mut theirs = hdrhistogram::Histogram::<u64>::new_with_bounds(1, 1_000_000_000, 3).unwrap();
        for v in spread(5_000, 1, 1_000_000_000) {
            ours.record(v);
            theirs.record(v).unwrap();
        }
        assert!((ours.mean() - theirs.mean()).abs() / theirs.mean() < 1e-9);
        assert!((ours.stddev() - theirs.stdev()).abs() / theirs.stdev() < 1e-9);
    }
}
