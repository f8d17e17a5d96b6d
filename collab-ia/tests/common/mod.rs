//! Shared helpers for collab-ia integration tests

#![allow(dead_code)]

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use collab_common::db::init_memory_database;
use collab_common::{AssignmentRecord, Error, Result};
use collab_ia::db::SqliteAssignmentStore;
use collab_ia::services::{IngestOptions, IngestionCoordinator};
use collab_ia::store::AssignmentStore;
use tokio::sync::Notify;

pub const HEADER: &str = "EmpID,ProjectID,DateFrom,DateTo\n";

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

pub fn options(chunk_size: usize) -> IngestOptions {
    IngestOptions {
        chunk_size,
        read_ahead: 1,
        today: Some(today()),
    }
}

pub async fn memory_store() -> SqliteAssignmentStore {
    let pool = init_memory_database()
        .await
        .expect("Failed to create in-memory database");
    SqliteAssignmentStore::new(pool)
}

pub fn coordinator(store: Arc<dyn AssignmentStore>, chunk_size: usize) -> IngestionCoordinator {
    IngestionCoordinator::new(store, options(chunk_size))
}

/// `count` valid rows with distinct natural keys, header first
pub fn valid_csv(count: usize) -> String {
    let mut csv = String::from(HEADER);
    for i in 0..count {
        let employee = 1 + (i % 7) as i64;
        let project = 100 + (i / 7) as i64;
        csv.push_str(&format!("{},{},2020-01-01,2020-03-31\n", employee, project));
    }
    csv
}

/// Store wrapper that counts writes, tracks concurrent writes and can fail one employee
pub struct InstrumentedStore {
    inner: SqliteAssignmentStore,
    poison_employee: Option<i64>,
    assignment_writes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InstrumentedStore {
    pub fn new(inner: SqliteAssignmentStore) -> Self {
        Self {
            inner,
            poison_employee: None,
            assignment_writes: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn failing_for(mut self, employee_id: i64) -> Self {
        self.poison_employee = Some(employee_id);
        self
    }

    pub fn assignment_writes(&self) -> usize {
        self.assignment_writes.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssignmentStore for InstrumentedStore {
    async fn upsert_employee(&self, employee_id: i64) -> Result<()> {
        if self.poison_employee == Some(employee_id) {
            return Err(Error::Internal(format!("employee {} rejected", employee_id)));
        }
        self.inner.upsert_employee(employee_id).await
    }

    async fn upsert_project(&self, project_id: i64) -> Result<()> {
        self.inner.upsert_project(project_id).await
    }

    async fn upsert_assignment(&self, record: &AssignmentRecord) -> Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let result = self.inner.upsert_assignment(record).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.assignment_writes.fetch_add(1, Ordering::SeqCst);
        result
    }

    async fn scan_assignments(&self) -> Result<Vec<AssignmentRecord>> {
        self.inner.scan_assignments().await
    }
}

/// Serves `data`, then fails every read after it runs out
pub struct FailingReader {
    data: io::Cursor<Vec<u8>>,
}

impl FailingReader {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: io::Cursor::new(data.into()),
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.data.read(buf)?;
        if n == 0 && !buf.is_empty() {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "upload interrupted"));
        }
        Ok(n)
    }
}

/// Store whose first assignment write blocks until `release` is called
pub struct GatedStore {
    inner: SqliteAssignmentStore,
    held: AtomicBool,
    entered: Notify,
    gate: Notify,
}

impl GatedStore {
    pub fn new(inner: SqliteAssignmentStore) -> Self {
        Self {
            inner,
            held: AtomicBool::new(false),
            entered: Notify::new(),
            gate: Notify::new(),
        }
    }

    /// Resolves once the first write is parked on the gate
    pub async fn wait_until_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl AssignmentStore for GatedStore {
    async fn upsert_employee(&self, employee_id: i64) -> Result<()> {
        self.inner.upsert_employee(employee_id).await
    }

    async fn upsert_project(&self, project_id: i64) -> Result<()> {
        self.inner.upsert_project(project_id).await
    }

    async fn upsert_assignment(&self, record: &AssignmentRecord) -> Result<()> {
        if !self.held.swap(true, Ordering::SeqCst) {
            self.entered.notify_one();
            self.gate.notified().await;
        }
        self.inner.upsert_assignment(record).await
    }

    async fn scan_assignments(&self) -> Result<Vec<AssignmentRecord>> {
        self.inner.scan_assignments().await
    }
}

/// Hands out at most one line per read and counts the lines handed out
pub struct LineCountingReader {
    data: Vec<u8>,
    pos: usize,
    lines: Arc<AtomicUsize>,
}

impl LineCountingReader {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            lines: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.lines.clone()
    }
}

impl Read for LineCountingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let rest = &self.data[self.pos..];
        if rest.is_empty() || buf.is_empty() {
            return Ok(0);
        }
        let line_len = rest
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(rest.len());
        if line_len > buf.len() {
            let n = buf.len();
            buf.copy_from_slice(&rest[..n]);
            self.pos += n;
            return Ok(n);
        }
        buf[..line_len].copy_from_slice(&rest[..line_len]);
        self.pos += line_len;
        if rest[line_len - 1] == b'\n' {
            self.lines.fetch_add(1, Ordering::SeqCst);
        }
        Ok(line_len)
    }
}
