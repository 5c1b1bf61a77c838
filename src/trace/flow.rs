// Flow summary
// Builds one directed graph per currency from the consolidated edges and
// derives per-address inflow/outflow totals for the flow visualization.

use super::ConsolidatedEdge;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Currency-specific payment flow graph.
pub type FlowGraph = petgraph::Graph<AddressNode, TransferEdge, petgraph::Directed>;

#[derive(Debug, Clone)]
pub struct AddressNode {
    pub address: String,
}

#[derive(Debug, Clone)]
pub struct TransferEdge {
    pub amount: Decimal,
    pub transfer_count: usize,
}

/// Aggregated funds movement for one address in one currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressFlow {
    pub address: String,
    pub currency: String,
    pub inflow: Decimal,
    pub outflow: Decimal,
    /// inflow - outflow: positive for net receivers, negative for net payers.
    pub net_flow: Decimal,
}

/// Find existing node or create a new one for an address
fn find_or_create_node(graph: &mut FlowGraph, address: &str) -> NodeIndex {
    for node_idx in graph.node_indices() {
        if let Some(node) = graph.node_weight(node_idx) {
            if node.address == address {
                return node_idx;
            }
        }
    }

    graph.add_node(AddressNode {
        address: address.to_string(),
    })
}

/// Add a new edge or fold the amount into an existing one
fn add_or_update_edge(
    graph: &mut FlowGraph,
    from: NodeIndex,
    to: NodeIndex,
    amount: Decimal,
    transfer_count: usize,
) {
    if let Some(edge_idx) = graph.find_edge(from, to) {
        if let Some(edge) = graph.edge_weight_mut(edge_idx) {
            edge.amount = edge.amount.checked_add(amount).unwrap_or(edge.amount);
            edge.transfer_count += transfer_count;
        }
    } else {
        graph.add_edge(
            from,
            to,
            TransferEdge {
                amount,
                transfer_count,
            },
        );
    }
}

/// Calculate incoming and outgoing totals for a node
fn node_flows(graph: &FlowGraph, node: NodeIndex) -> (Decimal, Decimal) {
    let mut incoming = Decimal::ZERO;
    let mut outgoing = Decimal::ZERO;

    for edge in graph.edges_directed(node, petgraph::Direction::Incoming) {
        incoming = incoming.checked_add(edge.weight().amount).unwrap_or(incoming);
    }

    for edge in graph.edges_directed(node, petgraph::Direction::Outgoing) {
        outgoing = outgoing.checked_add(edge.weight().amount).unwrap_or(outgoing);
    }

    (incoming, outgoing)
}

/// Summarize consolidated edges into per-address flows.
///
/// Output is deterministic: currencies appear in first-seen order, addresses
/// in the order they entered each currency's graph.
pub fn summarize(edges: &[ConsolidatedEdge]) -> Vec<AddressFlow> {
    let mut currency_order: Vec<String> = Vec::new();
    let mut graphs: HashMap<String, FlowGraph> = HashMap::new();

    for edge in edges {
        let graph = graphs.entry(edge.currency.clone()).or_insert_with(|| {
            currency_order.push(edge.currency.clone());
            petgraph::Graph::new()
        });

        let from = find_or_create_node(graph, &edge.sender);
        let to = find_or_create_node(graph, &edge.receiver);
        add_or_update_edge(graph, from, to, edge.total_amount, edge.transaction_count);
    }

    let mut flows = Vec::new();
    for currency in currency_order {
        let graph = match graphs.get(&currency) {
            Some(graph) => graph,
            None => continue,
        };

        for node_idx in graph.node_indices() {
            let (inflow, outflow) = node_flows(graph, node_idx);
            if let Some(node) = graph.node_weight(node_idx) {
                flows.push(AddressFlow {
                    address: node.address.clone(),
                    currency: currency.clone(),
                    inflow,
                    outflow,
                    net_flow: inflow.checked_sub(outflow).unwrap_or(Decimal::ZERO),
                });
            }
        }
    }

    flows
}
