//! Demo command implementation.
//!
//! Runs the two reference flows against a fresh in-memory store:
//! a committed put that the next transaction sees, and a rolled-back
//! delete that leaves the previous value in place.

use crate::Format;
use clap::ValueEnum;
use serde::Serialize;
use txtable_codec::Transaction;
use txtable_core::{CoreResult, TransactionAwareTable};
use txtable_store::{CellStore, Delete, Get, InMemoryStore, Put, Version};

const ROW: &[u8] = b"R";
const FAMILY: &[u8] = b"F";
const QUALIFIER: &[u8] = b"C";

/// Which flow to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Commit a put, then read it from a new transaction
    Commit,
    /// Roll back a delete, then read the original value
    Rollback,
    /// Run both
    All,
}

/// Outcome of one flow.
#[derive(Debug, Serialize)]
pub struct ScenarioResult {
    /// Scenario name.
    pub name: &'static str,
    /// Value the final transaction read, if any.
    pub observed: Option<String>,
    /// Value the flow should produce.
    pub expected: String,
    /// Whether `observed` matches `expected`.
    pub passed: bool,
}

impl ScenarioResult {
    fn new(name: &'static str, observed: Option<Vec<u8>>, expected: &str) -> Self {
        let observed = observed.map(|v| String::from_utf8_lossy(&v).into_owned());
        Self {
            name,
            passed: observed.as_deref() == Some(expected),
            observed,
            expected: expected.to_string(),
        }
    }
}

fn tx(read_pointer: u64, write_pointer: u64) -> Transaction {
    Transaction::new(Version::new(read_pointer), Version::new(write_pointer), [])
}

fn read_value<S: CellStore>(table: &mut TransactionAwareTable<S>) -> CoreResult<Option<Vec<u8>>> {
    let row = table.get(&Get::new(ROW).add_column(FAMILY, QUALIFIER))?;
    Ok(row.value(FAMILY, QUALIFIER).map(<[u8]>::to_vec))
}

fn run_commit() -> CoreResult<ScenarioResult> {
    let mut table = TransactionAwareTable::new(InMemoryStore::new());

    table.bind(tx(0, 1))?;
    let mut put = Put::new(ROW);
    put.add(FAMILY, QUALIFIER, "V1");
    table.put(&put)?;
    tracing::info!(pending = table.pending_count(), "committing put");
    table.commit_tx()?;
    table.post_tx_commit();

    table.bind(tx(1, 2))?;
    let observed = read_value(&mut table)?;
    table.post_tx_commit();
    table.close()?;

    Ok(ScenarioResult::new("commit", observed, "V1"))
}

fn run_rollback() -> CoreResult<ScenarioResult> {
    let store = InMemoryStore::new();
    let mut seed = Put::with_timestamp(ROW, Version::new(1));
    seed.add(FAMILY, QUALIFIER, "V0");
    store.put(&seed)?;

    let mut table = TransactionAwareTable::new(store);
    table.bind(tx(1, 2))?;
    table.delete(&Delete::new(ROW))?;
    tracing::info!(pending = table.pending_count(), "rolling back delete");
    table.rollback_tx()?;

    table.bind(tx(2, 3))?;
    let observed = read_value(&mut table)?;
    table.post_tx_commit();
    table.close()?;

    Ok(ScenarioResult::new("rollback", observed, "V0"))
}

fn run_scenarios(scenario: Scenario) -> CoreResult<Vec<ScenarioResult>> {
    let mut results = Vec::new();
    if matches!(scenario, Scenario::Commit | Scenario::All) {
        results.push(run_commit()?);
    }
    if matches!(scenario, Scenario::Rollback | Scenario::All) {
        results.push(run_rollback()?);
    }
    Ok(results)
}

/// Runs the demo command.
pub fn run(scenario: Scenario, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let results = run_scenarios(scenario)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        Format::Text => {
            for result in &results {
                let status = if result.passed { "ok" } else { "FAILED" };
                println!(
                    "{}: {} (observed {}, expected {})",
                    result.name,
                    status,
                    result.observed.as_deref().unwrap_or("<absent>"),
                    result.expected
                );
            }
        }
    }

    if results.iter().all(|r| r.passed) {
        Ok(())
    } else {
        Err("demo scenario failed".into())
    }
}
