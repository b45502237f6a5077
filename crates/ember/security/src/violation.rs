//! Security violations and the bounded audit log

use chrono::{DateTime, Utc};
use ember_types::ProjectRef;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info, warn};

/// Classification of a denied or invalid access attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// A function id's embedded tenant did not match the requesting tenant,
    /// or the tenant lacks baseline function access.
    NamespaceBoundaryViolation,
    /// An attempt to reach another tenant's resources or functions.
    CrossProjectAccess,
    /// Malformed identifiers or credentials that fail shape validation.
    InvalidResourceAccess,
    /// A known tenant without the permission the operation requires.
    PermissionDenied,
}

/// Alerting severity; maps to the log level the append emits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// An immutable audit record of one denied or invalid access attempt.
///
/// Appended once, never edited; ids are monotonically increasing within one
/// manager lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityViolation {
    pub id: u64,
    pub kind: ViolationKind,
    pub severity: Severity,
    pub source_project: Option<ProjectRef>,
    pub target_project: Option<ProjectRef>,
    pub resource: Option<String>,
    pub function: Option<String>,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl SecurityViolation {
    /// Whether the given tenant appears on either side of the violation.
    pub fn involves(&self, project: &ProjectRef) -> bool {
        self.source_project.as_ref() == Some(project)
            || self.target_project.as_ref() == Some(project)
    }
}

/// Fields of a violation before the log assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct ViolationRecord {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub source_project: Option<ProjectRef>,
    pub target_project: Option<ProjectRef>,
    pub resource: Option<String>,
    pub function: Option<String>,
    pub details: String,
}

impl ViolationRecord {
    pub fn new(kind: ViolationKind, severity: Severity, details: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            source_project: None,
            target_project: None,
            resource: None,
            function: None,
            details: details.into(),
        }
    }

    pub fn source(mut self, project: ProjectRef) -> Self {
        self.source_project = Some(project);
        self
    }

    pub fn target(mut self, project: ProjectRef) -> Self {
        self.target_project = Some(project);
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }
}

/// Append-only, bounded in-memory audit log.
///
/// Keeps the most recent `capacity` violations (drop-oldest); every append
/// is also emitted as a structured `tracing` event so external aggregation
/// does not depend on the in-memory window. Appends are the only mutation
/// path short of a whole-log reset.
#[derive(Debug)]
pub struct AuditLog {
    entries: RwLock<VecDeque<SecurityViolation>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(64))),
            next_id: AtomicU64::new(1),
            capacity,
        }
    }

    /// Append a violation, returning the assigned record.
    pub fn append(&self, record: ViolationRecord) -> SecurityViolation {
        let violation = SecurityViolation {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            kind: record.kind,
            severity: record.severity,
            source_project: record.source_project,
            target_project: record.target_project,
            resource: record.resource,
            function: record.function,
            details: record.details,
            timestamp: Utc::now(),
        };

        self.emit(&violation);

        let mut entries = self.entries.write();
        while entries.len() >= self.capacity.max(1) {
            entries.pop_front();
        }
        entries.push_back(violation.clone());
        violation
    }

    fn emit(&self, v: &SecurityViolation) {
        let source = v.source_project.as_ref().map(ProjectRef::as_str).unwrap_or("-");
        let target = v.target_project.as_ref().map(ProjectRef::as_str).unwrap_or("-");
        match v.severity {
            Severity::Critical | Severity::High => error!(
                id = v.id, kind = ?v.kind, severity = ?v.severity,
                source, target, details = %v.details,
                "security violation"
            ),
            Severity::Medium => warn!(
                id = v.id, kind = ?v.kind, source, target, details = %v.details,
                "security violation"
            ),
            Severity::Low => info!(
                id = v.id, kind = ?v.kind, source, target, details = %v.details,
                "security violation"
            ),
        }
    }

    /// All violations in the retained window, oldest first.
    pub fn all(&self) -> Vec<SecurityViolation> {
        self.entries.read().iter().cloned().collect()
    }

    /// Violations where the tenant appears as source or target.
    pub fn for_project(&self, project: &ProjectRef) -> Vec<SecurityViolation> {
        self.entries
            .read()
            .iter()
            .filter(|v| v.involves(project))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop all retained entries; ids keep increasing across a clear.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
