//! Deterministic sell-through override.
//!
//! The clustering step proposes deadstock candidates statistically; this
//! rule gets the final word. An item that sold a sufficient share of its
//! reconstructed pre-sale inventory in the lookback window is never
//! deadstock, and a stocked-out item is never deadstock at all.

/// Per-item inputs for the override decision.
///
/// `on_hand` is the authoritative currently-persisted quantity, which may
/// differ from the snapshot used for clustering if the store was updated
/// mid-run.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OverrideContext {
    pub cluster: usize,
    pub low_movement_cluster: usize,
    pub on_hand: u64,
    pub recent_sold: u64,
}

/// Final per-item classification decision.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Decision {
    pub deadstock: bool,
    pub cluster: usize,
}

/// Recent units sold divided by reconstructed pre-sale inventory.
///
/// Pre-sale inventory is `on_hand + recent_sold`; the denominator is
/// clamped to 1 so a fully-sold-out item yields a ratio of 1, not a
/// division by zero.
pub fn sell_through_ratio(recent_sold: u64, on_hand: u64) -> f64 {
    let original_inventory = on_hand + recent_sold;
    recent_sold as f64 / original_inventory.max(1) as f64
}

/// Apply the override rule to a cluster assignment.
///
/// Decision order:
/// 1. `on_hand == 0` forces `deadstock = false` (a stocked-out item
///    cannot be overstocked).
/// 2. Otherwise the item is deadstock iff it sits in the low-movement
///    cluster and its sell-through ratio is below `override_threshold`.
pub fn evaluate(ctx: &OverrideContext, override_threshold: f64) -> Decision {
    if ctx.on_hand == 0 {
        return Decision {
            deadstock: false,
            cluster: ctx.cluster,
        };
    }

    let ratio = sell_through_ratio(ctx.recent_sold, ctx.on_hand);
    Decision {
        deadstock: ctx.cluster == ctx.low_movement_cluster && ratio < override_threshold,
        cluster: ctx.cluster,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 0.2;

    fn low_cluster(on_hand: u64, recent_sold: u64) -> OverrideContext {
        OverrideContext {
            cluster: 1,
            low_movement_cluster: 1,
            on_hand,
            recent_sold,
        }
    }

    #[test]
    fn low_movement_item_below_threshold_is_deadstock() {
        // Spec scenario: on_hand=100, recent=5 -> ratio 5/105 ~= 0.048.
        let decision = evaluate(&low_cluster(100, 5), THRESHOLD);
        assert!(decision.deadstock);
        assert_eq!(decision.cluster, 1);
    }

    #[test]
    fn sufficient_sell_through_vetoes_the_cluster_label() {
        // 10 sold out of 40 original -> 0.25 >= 0.2.
        let decision = evaluate(&low_cluster(30, 10), THRESHOLD);
        assert!(!decision.deadstock);
    }

    #[test]
    fn ratio_exactly_at_threshold_is_not_deadstock() {
        // 20 sold out of 100 original -> exactly 0.2.
        let decision = evaluate(&low_cluster(80, 20), THRESHOLD);
        assert!(!decision.deadstock);
    }

    #[test]
    fn stocked_out_item_is_never_deadstock() {
        let decision = evaluate(&low_cluster(0, 0), THRESHOLD);
        assert!(!decision.deadstock);

        let decision = evaluate(&low_cluster(0, 50), THRESHOLD);
        assert!(!decision.deadstock);
    }

    #[test]
    fn items_outside_the_low_movement_cluster_are_active() {
        let ctx = OverrideContext {
            cluster: 0,
            low_movement_cluster: 1,
            on_hand: 500,
            recent_sold: 0,
        };
        assert!(!evaluate(&ctx, THRESHOLD).deadstock);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 512,
                ..ProptestConfig::default()
            })]

            /// Property: zero on-hand forces deadstock=false, whatever
            /// the cluster or recent quantity.
            #[test]
            fn zero_on_hand_is_never_deadstock(
                cluster in 0usize..4,
                low in 0usize..4,
                recent in 0u64..10_000,
            ) {
                let ctx = OverrideContext {
                    cluster,
                    low_movement_cluster: low,
                    on_hand: 0,
                    recent_sold: recent,
                };
                prop_assert!(!evaluate(&ctx, THRESHOLD).deadstock);
            }

            /// Property: a ratio at or above the threshold is never
            /// deadstock, independent of cluster membership.
            #[test]
            fn high_sell_through_is_never_deadstock(
                on_hand in 1u64..10_000,
                recent in 0u64..10_000,
            ) {
                let ctx = low_cluster(on_hand, recent);
                let ratio = sell_through_ratio(recent, on_hand);
                if ratio >= THRESHOLD {
                    prop_assert!(!evaluate(&ctx, THRESHOLD).deadstock);
                }
            }

            /// Property: the decision always preserves the cluster label.
            #[test]
            fn cluster_label_passes_through(
                cluster in 0usize..4,
                on_hand in 0u64..1_000,
                recent in 0u64..1_000,
            ) {
                let ctx = OverrideContext {
                    cluster,
                    low_movement_cluster: 0,
                    on_hand,
                    recent_sold: recent,
                };
                prop_assert_eq!(evaluate(&ctx, THRESHOLD).cluster, cluster);
            }
        }
    }
}
