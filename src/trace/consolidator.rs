// Edge Consolidator
// Groups raw payment edges into per-(sender, receiver, currency) summaries.

use super::{ConsolidatedEdge, PaymentEdge};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Consolidate raw edges into one summary per (sender, receiver, currency).
///
/// Output order follows the first appearance of each key in the input, so
/// repeated runs over the same edge list are deterministic. Within a group,
/// members are sorted by timestamp ascending; the total is an exact Decimal
/// sum.
pub fn consolidate(edges: &[PaymentEdge]) -> Vec<ConsolidatedEdge> {
    let mut key_order: Vec<(String, String, String)> = Vec::new();
    let mut groups: HashMap<(String, String, String), Vec<&PaymentEdge>> = HashMap::new();

    for edge in edges {
        let key = (
            edge.sender.clone(),
            edge.receiver.clone(),
            edge.currency.clone(),
        );
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                key_order.push(key);
                Vec::new()
            })
            .push(edge);
    }

    key_order
        .into_iter()
        .filter_map(|key| {
            let mut members = groups.remove(&key)?;
            members.sort_by_key(|e| e.timestamp);

            let first_timestamp = members.first()?.timestamp;
            let last_timestamp = members.last()?.timestamp;
            let total_amount = members
                .iter()
                .fold(Decimal::ZERO, |acc, e| acc + e.amount);

            let (sender, receiver, currency) = key;
            Some(ConsolidatedEdge {
                sender,
                receiver,
                currency,
                amounts: members.iter().map(|e| e.amount).collect(),
                tx_hashes: members.iter().map(|e| e.tx_hash.clone()).collect(),
                fees: members.iter().map(|e| e.fee).collect(),
                timestamps: members.iter().map(|e| e.timestamp).collect(),
                total_amount,
                first_timestamp,
                last_timestamp,
                transaction_count: members.len(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::PaymentKind;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn edge(
        sender: &str,
        receiver: &str,
        currency: &str,
        amount: Decimal,
        hash: &str,
        timestamp: DateTime<Utc>,
    ) -> PaymentEdge {
        PaymentEdge {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
            currency: currency.to_string(),
            tx_hash: hash.to_string(),
            timestamp,
            fee: dec!(0.00001),
            kind: PaymentKind::Payment,
        }
    }

    #[test]
    fn merges_same_pair_and_currency() {
        let edges = vec![
            edge("rA", "rB", "RLUSD", dec!(100), "T1", ts(1)),
            edge("rA", "rB", "RLUSD", dec!(50), "T2", ts(2)),
        ];

        let consolidated = consolidate(&edges);

        assert_eq!(consolidated.len(), 1);
        let c = &consolidated[0];
        assert_eq!(c.sender, "rA");
        assert_eq!(c.receiver, "rB");
        assert_eq!(c.currency, "RLUSD");
        assert_eq!(c.total_amount, dec!(150));
        assert_eq!(c.transaction_count, 2);
        assert_eq!(c.first_timestamp, ts(1));
        assert_eq!(c.last_timestamp, ts(2));
        assert_eq!(c.tx_hashes, vec!["T1", "T2"]);
    }

    #[test]
    fn sum_is_exact_for_fractional_amounts() {
        let edges = vec![
            edge("rA", "rB", "XRP", dec!(0.1), "T1", ts(1)),
            edge("rA", "rB", "XRP", dec!(0.2), "T2", ts(2)),
        ];

        let consolidated = consolidate(&edges);
        assert_eq!(consolidated[0].total_amount, dec!(0.3));
    }

    #[test]
    fn members_are_sorted_by_timestamp() {
        let edges = vec![
            edge("rA", "rB", "XRP", dec!(2), "LATE", ts(9)),
            edge("rA", "rB", "XRP", dec!(1), "EARLY", ts(3)),
        ];

        let consolidated = consolidate(&edges);
        let c = &consolidated[0];
        assert_eq!(c.tx_hashes, vec!["EARLY", "LATE"]);
        assert_eq!(c.amounts, vec![dec!(1), dec!(2)]);
        assert_eq!(c.first_timestamp, ts(3));
    }

    #[test]
    fn distinct_currencies_stay_separate() {
        let edges = vec![
            edge("rA", "rB", "XRP", dec!(1), "T1", ts(1)),
            edge("rA", "rB", "RLUSD", dec!(2), "T2", ts(2)),
        ];

        let consolidated = consolidate(&edges);
        assert_eq!(consolidated.len(), 2);
    }

    #[test]
    fn emits_groups_in_first_seen_order() {
        let edges = vec![
            edge("rA", "rB", "XRP", dec!(1), "T1", ts(1)),
            edge("rA", "rC", "XRP", dec!(2), "T2", ts(2)),
            edge("rA", "rB", "XRP", dec!(3), "T3", ts(3)),
            edge("rB", "rC", "XRP", dec!(4), "T4", ts(4)),
        ];

        let consolidated = consolidate(&edges);
        let receivers: Vec<_> = consolidated
            .iter()
            .map(|c| (c.sender.as_str(), c.receiver.as_str()))
            .collect();
        assert_eq!(receivers, vec![("rA", "rB"), ("rA", "rC"), ("rB", "rC")]);
        assert_eq!(consolidated[0].total_amount, dec!(4));
    }

    #[test]
    fn empty_input_consolidates_to_nothing() {
        assert!(consolidate(&[]).is_empty());
    }
}
