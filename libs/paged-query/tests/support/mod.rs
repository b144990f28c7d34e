//! In-memory store that records the transaction protocol it is driven with.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use pagewise_query::{
    CountStrategy, DecodeError, Fragment, JoinData, PageStore, PageTransaction, QuerySpec,
    RowDecoder, Statement, StoreError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct FakeRow {
    pub id: i64,
    pub name: String,
}

/// Where the fake store should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Begin,
    /// Fail the row stream after this many rows.
    QueryAfter(usize),
    Count,
    Commit,
    Rollback,
    /// Never answer the count statement.
    HangOnCount,
}

#[derive(Default)]
struct Shared {
    rows: Vec<FakeRow>,
    log: Vec<String>,
    faults: Vec<Fault>,
    total_override: Option<i64>,
    writer_between_reads: bool,
}

#[derive(Clone, Default)]
pub struct FakeStore {
    shared: Arc<Mutex<Shared>>,
}

impl FakeStore {
    pub fn with_rows(count: i64) -> Self {
        let store = Self::default();
        {
            let mut shared = store.shared.lock().unwrap();
            shared.rows = (1..=count)
                .map(|id| FakeRow {
                    id,
                    name: format!("Row {}", id),
                })
                .collect();
        }
        store
    }

    /// Inject a fault. Faults at different steps can be combined.
    pub fn fail_with(self, fault: Fault) -> Self {
        self.shared.lock().unwrap().faults.push(fault);
        self
    }

    /// Commit a new row from outside between each page read and count read.
    pub fn with_writer_between_reads(self) -> Self {
        self.shared.lock().unwrap().writer_between_reads = true;
        self
    }

    /// Rows visible to a read outside any transaction.
    pub fn committed_len(&self) -> usize {
        self.shared.lock().unwrap().rows.len()
    }

    pub fn with_total(self, total: i64) -> Self {
        self.shared.lock().unwrap().total_override = Some(total);
        self
    }

    /// Protocol steps seen so far: BEGIN, FETCH, COUNT, COMMIT, ROLLBACK.
    pub fn log(&self) -> Vec<String> {
        self.shared.lock().unwrap().log.clone()
    }

    /// Add a row outside any transaction.
    pub fn insert(&self, name: &str) {
        let mut shared = self.shared.lock().unwrap();
        let id = shared.rows.len() as i64 + 1;
        shared.rows.push(FakeRow {
            id,
            name: name.to_string(),
        });
    }

    fn record(&self, step: &str) {
        self.shared.lock().unwrap().log.push(step.to_string());
    }

    fn faulted(&self, fault: Fault) -> bool {
        self.shared.lock().unwrap().faults.contains(&fault)
    }

    fn query_fault(&self) -> Option<usize> {
        self.shared
            .lock()
            .unwrap()
            .faults
            .iter()
            .find_map(|fault| match fault {
                Fault::QueryAfter(n) => Some(*n),
                _ => None,
            })
    }
}

#[async_trait]
impl PageStore for FakeStore {
    type Transaction = FakeTransaction;

    fn count_strategy(&self) -> CountStrategy {
        CountStrategy::Requery
    }

    async fn begin(&self) -> Result<FakeTransaction, StoreError> {
        if self.faulted(Fault::Begin) {
            return Err(StoreError::Backend("pool exhausted".to_string()));
        }
        self.record("BEGIN");
        // transactions see the rows as of begin
        let snapshot = self.shared.lock().unwrap().rows.clone();
        Ok(FakeTransaction {
            store: self.clone(),
            snapshot,
        })
    }
}

pub struct FakeTransaction {
    store: FakeStore,
    snapshot: Vec<FakeRow>,
}

#[async_trait]
impl PageTransaction for FakeTransaction {
    type Row = FakeRow;

    fn fetch<'t>(
        &'t mut self,
        _statement: &'t Statement,
    ) -> BoxStream<'t, Result<FakeRow, StoreError>> {
        self.store.record("FETCH");
        let fail_after = self.store.query_fault();
        let rows: Vec<Result<FakeRow, StoreError>> = self
            .snapshot
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, row)| match fail_after {
                Some(n) if i >= n => Err(StoreError::Backend("connection reset".to_string())),
                _ => Ok(row),
            })
            .collect();
        stream::iter(rows).boxed()
    }

    async fn fetch_count(&mut self, _statement: &Statement) -> Result<i64, StoreError> {
        self.store.record("COUNT");
        if self.store.shared.lock().unwrap().writer_between_reads {
            self.store.insert("Interloper");
        }
        if self.store.faulted(Fault::Count) {
            return Err(StoreError::Backend("lost connection".to_string()));
        }
        if self.store.faulted(Fault::HangOnCount) {
            std::future::pending::<()>().await;
        }
        let total = self.store.shared.lock().unwrap().total_override;
        Ok(total.unwrap_or(self.snapshot.len() as i64))
    }

    async fn commit(self) -> Result<(), StoreError> {
        if self.store.faulted(Fault::Commit) {
            return Err(StoreError::Backend("commit refused".to_string()));
        }
        self.store.record("COMMIT");
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.store.record("ROLLBACK");
        if self.store.faulted(Fault::Rollback) {
            return Err(StoreError::Backend("connection gone".to_string()));
        }
        Ok(())
    }
}

/// Decodes a fake row into its name, optionally rejecting one id.
#[derive(Clone, Default)]
pub struct NameDecoder {
    pub reject_id: Option<i64>,
}

impl RowDecoder<FakeRow> for NameDecoder {
    type Item = String;

    fn decode(&self, row: &FakeRow) -> Result<String, DecodeError> {
        if self.reject_id == Some(row.id) {
            return Err(DecodeError::Invalid(format!("row {} has no name", row.id)));
        }
        Ok(row.name.clone())
    }
}

pub fn rows_spec(decoder: NameDecoder) -> QuerySpec<NameDecoder> {
    QuerySpec::new("rows", "r.id, r.name", "rows r", decoder)
        .with_scope("All", JoinData::unrestricted())
        .with_scope(
            "Named",
            JoinData::filter(Fragment::new("r.name <> ?").bind("")),
        )
        .with_sort("name-asc", "r.name ASC")
}
