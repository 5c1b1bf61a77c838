// Payment Graph Traverser
// Bounded breadth-first walk over the address graph behind a seed address.

use super::{consolidate, flow, PaymentEdge, SkippedAddress, TraceReport};
use crate::errors::{EngineError, Result};
use crate::ledger::LedgerSource;
use crate::metrics;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct PaymentTracer {
    ledger: Arc<dyn LedgerSource>,
    page_limit: u32,
}

impl PaymentTracer {
    pub fn new(ledger: Arc<dyn LedgerSource>, page_limit: u32) -> Self {
        PaymentTracer { ledger, page_limit }
    }

    /// Walk the payment graph outward from `seed_address`.
    ///
    /// `max_depth` bounds the number of addresses *dequeued* (total nodes
    /// visited), not the hop distance from the seed; a wide first hop eats
    /// the same budget as a deep chain. Callers wanting a wall-clock bound
    /// should additionally wrap the call in a timeout.
    ///
    /// A history fetch failure skips that one address (reported in
    /// `skipped`) instead of aborting the trace.
    pub async fn trace(
        &self,
        seed_address: &str,
        max_depth: u32,
        currency_filter: Option<&str>,
    ) -> Result<TraceReport> {
        if seed_address.is_empty() {
            return Err(EngineError::Validation(
                "seed_address must not be empty".to_string(),
            ));
        }

        let mut queue: VecDeque<String> = VecDeque::new();
        // Everything ever queued, so an address discovered twice before its
        // dequeue is still enqueued once.
        let mut seen: HashSet<String> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut raw_edges: Vec<PaymentEdge> = Vec::new();
        let mut skipped: Vec<SkippedAddress> = Vec::new();
        let mut dequeues: u32 = 0;

        queue.push_back(seed_address.to_string());
        seen.insert(seed_address.to_string());

        while dequeues < max_depth {
            let current = match queue.pop_front() {
                Some(address) => address,
                None => break,
            };
            dequeues += 1;

            let history = match self.ledger.fetch_history(&current, self.page_limit).await {
                Ok(history) => history,
                Err(e) => {
                    metrics::LEDGER_FETCH_FAILURES.inc();
                    warn!("Skipping address {} during trace: {}", current, e);
                    skipped.push(SkippedAddress {
                        address: current.clone(),
                        reason: e.to_string(),
                    });
                    visited.insert(current);
                    continue;
                }
            };

            let step_edges: Vec<PaymentEdge> = history
                .iter()
                .filter_map(|tx| PaymentEdge::from_ledger_tx(tx, &current))
                .filter(|edge| {
                    currency_filter
                        .map(|currency| edge.currency == currency)
                        .unwrap_or(true)
                })
                .collect();

            debug!(
                "Visited {} ({} outgoing edges, {} dequeued so far)",
                current,
                step_edges.len(),
                dequeues
            );

            for edge in &step_edges {
                if seen.insert(edge.receiver.clone()) {
                    queue.push_back(edge.receiver.clone());
                }
            }

            raw_edges.extend(step_edges);
            visited.insert(current);
        }

        let edges = consolidate(&raw_edges);
        let flows = flow::summarize(&edges);

        Ok(TraceReport {
            seed_address: seed_address.to_string(),
            edges,
            flows,
            skipped,
            addresses_visited: visited.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerAmount, LedgerTransaction, LedgerTxKind, MockLedgerSource};
    use chrono::{TimeZone, Utc};
    use mockall::predicate::{always, eq};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn payment(source: &str, destination: &str, value: Decimal, currency: &str, hash: &str) -> LedgerTransaction {
        LedgerTransaction {
            kind: LedgerTxKind::Payment {
                source: source.to_string(),
                destination: destination.to_string(),
            },
            amount: LedgerAmount {
                currency: currency.to_string(),
                value,
            },
            hash: hash.to_string(),
            fee: dec!(0.00001),
            timestamp: Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn bfs_terminates_on_cycles() {
        let mut ledger = MockLedgerSource::new();
        ledger
            .expect_fetch_history()
            .with(eq("rA"), always())
            .times(1)
            .returning(|_, _| Ok(vec![payment("rA", "rB", dec!(10), "XRP", "T1")]));
        ledger
            .expect_fetch_history()
            .with(eq("rB"), always())
            .times(1)
            .returning(|_, _| Ok(vec![payment("rB", "rA", dec!(4), "XRP", "T2")]));

        let tracer = PaymentTracer::new(Arc::new(ledger), 20);
        let report = tracer.trace("rA", 10, None).await.unwrap();

        // The cycle closes after two visits; the visited set stops re-entry.
        assert_eq!(report.addresses_visited, 2);
        assert_eq!(report.edges.len(), 2);
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn max_depth_bounds_dequeues_not_hops() {
        let mut ledger = MockLedgerSource::new();
        ledger
            .expect_fetch_history()
            .with(eq("rA"), always())
            .times(1)
            .returning(|_, _| Ok(vec![payment("rA", "rB", dec!(1), "XRP", "T1")]));
        ledger
            .expect_fetch_history()
            .with(eq("rB"), always())
            .times(1)
            .returning(|_, _| Ok(vec![payment("rB", "rC", dec!(1), "XRP", "T2")]));
        // rC is discovered but never dequeued: the node budget is spent.

        let tracer = PaymentTracer::new(Arc::new(ledger), 20);
        let report = tracer.trace("rA", 2, None).await.unwrap();

        assert_eq!(report.addresses_visited, 2);
        assert_eq!(report.edges.len(), 2);
    }

    #[tokio::test]
    async fn zero_depth_visits_nothing() {
        let ledger = MockLedgerSource::new();
        let tracer = PaymentTracer::new(Arc::new(ledger), 20);

        let report = tracer.trace("rA", 0, None).await.unwrap();

        assert_eq!(report.addresses_visited, 0);
        assert!(report.edges.is_empty());
    }

    #[tokio::test]
    async fn currency_filter_drops_other_edges_and_their_receivers() {
        let mut ledger = MockLedgerSource::new();
        ledger
            .expect_fetch_history()
            .with(eq("rA"), always())
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    payment("rA", "rB", dec!(10), "RLUSD", "T1"),
                    payment("rA", "rX", dec!(99), "XRP", "T2"),
                ])
            });
        ledger
            .expect_fetch_history()
            .with(eq("rB"), always())
            .times(1)
            .returning(|_, _| Ok(vec![]));
        // rX must never be fetched: its discovering edge was filtered out.

        let tracer = PaymentTracer::new(Arc::new(ledger), 20);
        let report = tracer.trace("rA", 10, Some("RLUSD")).await.unwrap();

        assert_eq!(report.edges.len(), 1);
        assert_eq!(report.edges[0].currency, "RLUSD");
        assert_eq!(report.addresses_visited, 2);
    }

    #[tokio::test]
    async fn fetch_failure_skips_one_address_only() {
        let mut ledger = MockLedgerSource::new();
        ledger
            .expect_fetch_history()
            .with(eq("rA"), always())
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    payment("rA", "rB", dec!(5), "XRP", "T1"),
                    payment("rA", "rC", dec!(6), "XRP", "T2"),
                ])
            });
        ledger
            .expect_fetch_history()
            .with(eq("rB"), always())
            .times(1)
            .returning(|_, _| {
                Err(EngineError::UpstreamLedger {
                    address: "rB".to_string(),
                    reason: "node unreachable".to_string(),
                })
            });
        ledger
            .expect_fetch_history()
            .with(eq("rC"), always())
            .times(1)
            .returning(|_, _| Ok(vec![payment("rC", "rD", dec!(1), "XRP", "T3")]));
        ledger
            .expect_fetch_history()
            .with(eq("rD"), always())
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let tracer = PaymentTracer::new(Arc::new(ledger), 20);
        let report = tracer.trace("rA", 10, None).await.unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].address, "rB");
        // rA->rB, rA->rC and rC->rD still made it into the result.
        assert_eq!(report.edges.len(), 3);
        assert_eq!(report.addresses_visited, 4);
    }

    #[tokio::test]
    async fn repeated_discovery_enqueues_once() {
        let mut ledger = MockLedgerSource::new();
        ledger
            .expect_fetch_history()
            .with(eq("rA"), always())
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    payment("rA", "rB", dec!(1), "XRP", "T1"),
                    payment("rA", "rB", dec!(2), "XRP", "T2"),
                ])
            });
        // One fetch for rB despite two discovering edges.
        ledger
            .expect_fetch_history()
            .with(eq("rB"), always())
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let tracer = PaymentTracer::new(Arc::new(ledger), 20);
        let report = tracer.trace("rA", 10, None).await.unwrap();

        assert_eq!(report.addresses_visited, 2);
        assert_eq!(report.edges.len(), 1);
        assert_eq!(report.edges[0].transaction_count, 2);
        assert_eq!(report.edges[0].total_amount, dec!(3));
    }

    #[tokio::test]
    async fn empty_seed_is_rejected() {
        let ledger = MockLedgerSource::new();
        let tracer = PaymentTracer::new(Arc::new(ledger), 20);

        assert!(matches!(
            tracer.trace("", 5, None).await,
            Err(EngineError::Validation(_))
        ));
    }
}
