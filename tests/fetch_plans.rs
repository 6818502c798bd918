use StrataDB::Versioning;

#[test]
fn full_plan_is_a_single_revision() {
    for rev in [0u64, 1, 7, 1000] {
        assert_eq!(Versioning::Full.fetch_plan(rev, 3), vec![rev]);
        assert_eq!(Versioning::Full.fetch_plan(rev, 1), vec![rev]);
    }
}

#[test]
fn differential_plan_examples() {
    // Latest delta first, anchoring full dump second.
    assert_eq!(Versioning::Differential.fetch_plan(5, 3), vec![5, 3]);
    // A dump revision stands on its own.
    assert_eq!(Versioning::Differential.fetch_plan(6, 3), vec![6]);
    assert_eq!(Versioning::Differential.fetch_plan(0, 3), vec![0]);
}

#[test]
fn differential_plan_cardinality() {
    for window in 1u32..=5 {
        for rev in 0u64..=40 {
            let plan = Versioning::Differential.fetch_plan(rev, window);
            assert!(
                plan.len() == 1 || plan.len() == 2,
                "plan for rev {rev} window {window} has {} entries",
                plan.len()
            );
            assert_eq!(plan[0], rev, "plan must start at the latest revision");
            if rev % u64::from(window) == 0 {
                assert_eq!(plan.len(), 1, "dump revision {rev} needs only itself");
            } else {
                assert_eq!(
                    plan[1],
                    rev - rev % u64::from(window),
                    "second entry must be the last full dump"
                );
            }
        }
    }
}

#[test]
fn incremental_plan_examples() {
    assert_eq!(Versioning::Incremental.fetch_plan(5, 3), vec![5, 4, 3]);
    // Never reaches below revision 0.
    assert_eq!(Versioning::Incremental.fetch_plan(1, 3), vec![1, 0]);
    assert_eq!(Versioning::Incremental.fetch_plan(0, 4), vec![0]);
}

#[test]
fn incremental_plan_cardinality() {
    for window in 1u32..=5 {
        for rev in 0u64..=40 {
            let plan = Versioning::Incremental.fetch_plan(rev, window);
            let expected = std::cmp::min(u64::from(window), rev + 1) as usize;
            assert_eq!(
                plan.len(),
                expected,
                "plan length for rev {rev} window {window}"
            );
            // Newest first, consecutive.
            for (i, entry) in plan.iter().enumerate() {
                assert_eq!(*entry, rev - i as u64);
            }
        }
    }
}

#[test]
fn sliding_plan_matches_incremental() {
    for window in 1u32..=5 {
        for rev in 0u64..=40 {
            assert_eq!(
                Versioning::SlidingSnapshot.fetch_plan(rev, window),
                Versioning::Incremental.fetch_plan(rev, window)
            );
        }
    }
}
