//! Shared fixtures for coordinator tests: an in-memory store with failure
//! injection and call gating, and a sink that records every report.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use outreach_client::{ObservabilitySink, Operation, OperationReport, ResourceStoreClient, StoreError};
use outreach_core::project::{Project, ProjectDraft, ProjectId, ProjectPatch};
use outreach_core::types::Timestamp;
use tokio::sync::Notify;

pub fn at(year: i32, month: u32, day: u32) -> Timestamp {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub fn project(id: &str, title: &str, created_at: Timestamp) -> Project {
    Project {
        id: ProjectId::from(id),
        title: title.to_string(),
        description: None,
        category: None,
        status: None,
        image_url: None,
        year: None,
        created_at,
        updated_at: created_at,
    }
}

/// `[p2 "B" 2024-02-01, p1 "A" 2024-01-01]`, the usual starting state.
pub fn two_projects() -> Vec<Project> {
    vec![
        project("p2", "B", at(2024, 2, 1)),
        project("p1", "A", at(2024, 1, 1)),
    ]
}

/// Blocks one store call until released.
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until the gated call has reached the store.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the gated call proceed.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// In-memory project store.
///
/// Records live in insertion order (not sorted) so tests can check that the
/// coordinator does its own ordering. Created records get ids `new-1`,
/// `new-2`, ... and `created_at` one day after the newest existing record.
#[derive(Default)]
pub struct FakeStore {
    records: Mutex<Vec<Project>>,
    failing: Mutex<HashSet<Operation>>,
    gates: Mutex<HashMap<Operation, Arc<Gate>>>,
    calls: Mutex<Vec<Operation>>,
    next_id: AtomicU32,
    strict_delete: bool,
}

impl FakeStore {
    pub fn with_records(records: Vec<Project>) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            ..Self::default()
        })
    }

    /// Like a REST API: deleting a missing id is `NotFound`.
    pub fn strict(records: Vec<Project>) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            strict_delete: true,
            ..Self::default()
        })
    }

    /// Make every call of `op` fail with HTTP 500 until [`recover`](Self::recover).
    pub fn fail(&self, op: Operation) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn recover(&self, op: Operation) {
        self.failing.lock().unwrap().remove(&op);
    }

    /// Hold the next call of `op` until the returned gate is released.
    pub fn hold(&self, op: Operation) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates.lock().unwrap().insert(op, Arc::clone(&gate));
        gate
    }

    pub fn records(&self) -> Vec<Project> {
        self.records.lock().unwrap().clone()
    }

    pub fn insert(&self, project: Project) {
        self.records.lock().unwrap().push(project);
    }

    pub fn calls(&self, op: Operation) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    async fn enter(&self, op: Operation) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(op);
        let gate = self.gates.lock().unwrap().remove(&op);
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.failing.lock().unwrap().contains(&op) {
            return Err(StoreError::Api {
                status: 500,
                message: format!("{op} exploded"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceStoreClient for FakeStore {
    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        self.enter(Operation::List).await?;
        Ok(self.records())
    }

    async fn get(&self, id: &ProjectId) -> Result<Project, StoreError> {
        self.enter(Operation::Get).await?;
        self.records()
            .into_iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn create(&self, draft: &ProjectDraft) -> Result<Project, StoreError> {
        self.enter(Operation::Create).await?;
        let mut records = self.records.lock().unwrap();
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created_at = records
            .iter()
            .map(|p| p.created_at)
            .max()
            .map_or_else(|| at(2024, 1, 1), |newest| newest + Duration::days(1));
        let mut project = Project::provisional(draft, created_at);
        project.id = ProjectId::new(format!("new-{n}"));
        records.push(project.clone());
        Ok(project)
    }

    async fn update(&self, id: &ProjectId, patch: &ProjectPatch) -> Result<Project, StoreError> {
        self.enter(Operation::Update).await?;
        let mut records = self.records.lock().unwrap();
        let project = records
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let now = project.updated_at.max(Utc::now());
        project.apply_patch(patch, now + Duration::seconds(1));
        Ok(project.clone())
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), StoreError> {
        self.enter(Operation::Delete).await?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|p| &p.id != id);
        if self.strict_delete && records.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

/// Collects every report it receives.
#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<OperationReport>>,
}

impl RecordingSink {
    pub fn reports(&self) -> Vec<OperationReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.reports().into_iter().map(|r| r.message).collect()
    }
}

impl ObservabilitySink for RecordingSink {
    fn report(&self, report: &OperationReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}
