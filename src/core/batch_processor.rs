//! Batch processing with key-based partitioning for concurrent replay
//!
//! This module provides the `BatchProcessor` struct, which runs a batch of
//! replay operations concurrently without changing the outcome of replaying
//! them one after another.
//!
//! # Design
//!
//! Every operation touches a set of keys (`OperationKey`): the accounts it
//! reads or writes and the e-mail of any user it creates or opens an account
//! for. Operations that share a key, directly or through a chain of other
//! operations, land in the same group. Groups are disjoint in state, so they
//! can run in parallel, while each group runs its operations in file order.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── Arc<BankingEngine>  (shared, thread-safe orchestrator)
//! ```
//!
//! Engine calls block on account mutexes and may sleep while retrying a
//! compensation, so each group runs on tokio's blocking pool.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use log::error;

use crate::core::engine::BankingEngine;
use crate::types::{LedgerError, Operation, OperationKey};

/// Result of applying a single operation
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The operation that was applied
    pub operation: Operation,

    /// The result of applying it
    pub result: Result<(), LedgerError>,
}

/// Batch processor with key-based partitioning
#[derive(Clone)]
pub struct BatchProcessor {
    engine: Arc<BankingEngine>,
}

fn find(parent: &mut [usize], mut index: usize) -> usize {
    while parent[index] != index {
        parent[index] = parent[parent[index]];
        index = parent[index];
    }
    index
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}

impl BatchProcessor {
    pub fn new(engine: Arc<BankingEngine>) -> Self {
        Self { engine }
    }

    /// Split a batch into groups of operations with connected keys
    ///
    /// Groups are ordered by their first operation and keep file order
    /// internally.
    pub fn partition(&self, batch: Vec<Operation>) -> Vec<Vec<Operation>> {
        let mut parent: Vec<usize> = (0..batch.len()).collect();
        let mut owners: HashMap<OperationKey, usize> = HashMap::new();

        for (index, operation) in batch.iter().enumerate() {
            for key in operation.keys() {
                match owners.entry(key) {
                    Entry::Occupied(owner) => union(&mut parent, *owner.get(), index),
                    Entry::Vacant(slot) => {
                        slot.insert(index);
                    }
                }
            }
        }

        let mut groups: Vec<Vec<Operation>> = Vec::new();
        let mut group_of_root: HashMap<usize, usize> = HashMap::new();
        for (index, operation) in batch.into_iter().enumerate() {
            let root = find(&mut parent, index);
            let group = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[group].push(operation);
        }

        groups
    }

    /// Apply one group's operations sequentially
    pub fn process_group(&self, operations: Vec<Operation>) -> Vec<ProcessingResult> {
        operations
            .into_iter()
            .map(|operation| {
                let result = self.engine.apply(operation.clone());
                ProcessingResult { operation, result }
            })
            .collect()
    }

    /// Apply a batch, running independent groups concurrently
    ///
    /// Returns the results grouped as `partition` grouped the operations.
    pub async fn process_batch(&self, batch: Vec<Operation>) -> Vec<ProcessingResult> {
        let mut tasks = Vec::new();
        for group in self.partition(batch) {
            let processor = self.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                processor.process_group(group)
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(group_results) => results.extend(group_results),
                Err(e) => error!("Replay task panicked: {:?}", e),
            }
        }

        results
    }
}
