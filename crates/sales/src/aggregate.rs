//! Pure reduction of sale events into per-item quantity totals.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Duration, Utc};
use thiserror::Error;

use stocksense_core::ItemId;

use crate::event::SaleEvent;

/// Signals that there is nothing to aggregate.
///
/// Empty sales history is an expected steady state for a new deployment,
/// but callers must treat it as an abort signal for the run rather than
/// proceeding with empty maps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no usable sale events to aggregate")]
pub struct NoSalesData;

/// Per-item quantity totals over the aggregation windows.
///
/// `months_with_sales` counts distinct UTC calendar months containing at
/// least one sale of the item. It feeds the velocity denominator: months
/// with no recorded sales for an item do not dilute its average.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesAggregates {
    /// All-time totals, itemId -> summed quantity.
    pub all_time: BTreeMap<ItemId, u64>,
    /// Totals restricted to the lookback window, itemId -> summed quantity.
    pub recent: BTreeMap<ItemId, u64>,
    /// Distinct UTC (year, month) pairs with a recorded sale, per item.
    pub months_with_sales: BTreeMap<ItemId, u32>,
}

impl SalesAggregates {
    pub fn all_time_for(&self, id: &ItemId) -> u64 {
        self.all_time.get(id).copied().unwrap_or(0)
    }

    pub fn recent_for(&self, id: &ItemId) -> u64 {
        self.recent.get(id).copied().unwrap_or(0)
    }

    pub fn months_with_sales_for(&self, id: &ItemId) -> u32 {
        self.months_with_sales.get(id).copied().unwrap_or(0)
    }
}

/// Reduce raw sale events into per-item totals.
///
/// Events without a timestamp are dropped (never assumed to be "now").
/// All timestamps are already UTC-normalized by the wire type, so the
/// cutoff comparison is a plain instant comparison.
///
/// Returns [`NoSalesData`] when the input is empty or every event was
/// dropped for lacking a timestamp.
pub fn aggregate(
    events: &[SaleEvent],
    now: DateTime<Utc>,
    lookback_days: i64,
) -> Result<SalesAggregates, NoSalesData> {
    let cutoff = now - Duration::days(lookback_days);

    let mut all_time: BTreeMap<ItemId, u64> = BTreeMap::new();
    let mut recent: BTreeMap<ItemId, u64> = BTreeMap::new();
    let mut months: BTreeMap<ItemId, BTreeSet<(i32, u32)>> = BTreeMap::new();
    let mut usable = 0usize;

    for event in events {
        let Some(occurred_at) = event.occurred_at else {
            continue;
        };
        usable += 1;
        let in_window = occurred_at >= cutoff;
        let month_key = (occurred_at.year(), occurred_at.month());

        for line in &event.lines {
            *all_time.entry(line.item_id.clone()).or_default() += line.quantity;
            if in_window {
                *recent.entry(line.item_id.clone()).or_default() += line.quantity;
            }
            months.entry(line.item_id.clone()).or_default().insert(month_key);
        }
    }

    if usable == 0 {
        return Err(NoSalesData);
    }

    let months_with_sales = months
        .into_iter()
        .map(|(id, set)| (id, set.len() as u32))
        .collect();

    Ok(SalesAggregates {
        all_time,
        recent,
        months_with_sales,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SaleLine;
    use chrono::TimeZone;

    fn id(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    fn line(item: &str, qty: u64) -> SaleLine {
        SaleLine {
            item_id: id(item),
            quantity: qty,
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_input_is_an_explicit_no_data_outcome() {
        assert_eq!(aggregate(&[], now(), 30), Err(NoSalesData));
    }

    #[test]
    fn events_without_timestamps_are_dropped() {
        let events = vec![SaleEvent {
            occurred_at: None,
            lines: vec![line("a", 5)],
        }];
        assert_eq!(aggregate(&events, now(), 30), Err(NoSalesData));
    }

    #[test]
    fn splits_all_time_and_recent_windows() {
        let events = vec![
            SaleEvent::new(at("2026-01-10T09:00:00Z"), vec![line("a", 4)]),
            SaleEvent::new(at("2026-08-10T09:00:00Z"), vec![line("a", 3), line("b", 2)]),
        ];
        let agg = aggregate(&events, now(), 30).unwrap();
        assert_eq!(agg.all_time_for(&id("a")), 7);
        assert_eq!(agg.recent_for(&id("a")), 3);
        assert_eq!(agg.recent_for(&id("b")), 2);
        assert_eq!(agg.all_time_for(&id("b")), 2);
    }

    #[test]
    fn cutoff_is_inclusive() {
        let events = vec![SaleEvent::new(now() - Duration::days(30), vec![line("a", 1)])];
        let agg = aggregate(&events, now(), 30).unwrap();
        assert_eq!(agg.recent_for(&id("a")), 1);
    }

    #[test]
    fn counts_distinct_sale_months_only() {
        let events = vec![
            SaleEvent::new(at("2026-03-01T09:00:00Z"), vec![line("a", 1)]),
            SaleEvent::new(at("2026-03-20T09:00:00Z"), vec![line("a", 1)]),
            SaleEvent::new(at("2026-05-05T09:00:00Z"), vec![line("a", 1)]),
        ];
        let agg = aggregate(&events, now(), 30).unwrap();
        assert_eq!(agg.months_with_sales_for(&id("a")), 2);
        assert_eq!(agg.months_with_sales_for(&id("missing")), 0);
    }

    #[test]
    fn duplicate_timestamps_and_items_sum_arithmetically() {
        let ts = at("2026-08-10T09:00:00Z");
        let events = vec![
            SaleEvent::new(ts, vec![line("a", 2), line("a", 3)]),
            SaleEvent::new(ts, vec![line("a", 5)]),
        ];
        let agg = aggregate(&events, now(), 30).unwrap();
        assert_eq!(agg.all_time_for(&id("a")), 10);
        assert_eq!(agg.recent_for(&id("a")), 10);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_events() -> impl Strategy<Value = Vec<SaleEvent>> {
            let arb_line = ("[a-e]", 0u64..500).prop_map(|(item, qty)| line(&item, qty));
            let arb_event = (0i64..200, proptest::collection::vec(arb_line, 1..4)).prop_map(
                |(days_ago, lines)| SaleEvent::new(now() - Duration::days(days_ago), lines),
            );
            proptest::collection::vec(arb_event, 1..20)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: aggregation is order-independent.
            #[test]
            fn totals_do_not_depend_on_event_order(events in arb_events()) {
                let forward = aggregate(&events, now(), 30).unwrap();
                let mut reversed = events.clone();
                reversed.reverse();
                let backward = aggregate(&reversed, now(), 30).unwrap();
                prop_assert_eq!(forward, backward);
            }

            /// Property: recent totals never exceed all-time totals.
            #[test]
            fn recent_is_bounded_by_all_time(events in arb_events()) {
                let agg = aggregate(&events, now(), 30).unwrap();
                for (item, recent_qty) in &agg.recent {
                    prop_assert!(*recent_qty <= agg.all_time_for(item));
                }
            }
        }
    }
}
