//! Security manager

use crate::context::{IsolationLevel, SecurityContext, TenantCredentials};
use crate::error::{Result, SecurityError};
use crate::permissions::{default_permissions, permission_key, Operation, ResourceType, FUNCTION_ACCESS};
use crate::violation::{AuditLog, SecurityViolation, Severity, ViolationKind, ViolationRecord};
use dashmap::DashMap;
use ember_namespace::NamespaceManager;
use ember_types::{FunctionId, ProjectRef, ResourceId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Security manager configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Domain used to derive expected per-tenant API URLs.
    pub platform_domain: String,
    /// Retained-violation window of the audit log.
    pub audit_capacity: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            platform_domain: "functions.ember.dev".to_string(),
            audit_capacity: 1024,
        }
    }
}

/// A request to touch a tenant-scoped resource.
#[derive(Debug, Clone)]
pub struct ResourceAccessRequest {
    /// Function performing the access.
    pub function: FunctionId,
    /// Tenant on whose behalf the access runs.
    pub project: ProjectRef,
    /// Resource class being touched.
    pub resource_type: ResourceType,
    /// Structured resource identity, tenant included.
    pub resource: ResourceId,
    /// Operation requested.
    pub operation: Operation,
    /// Optional credential bundle to shape-check.
    pub credentials: Option<TenantCredentials>,
}

/// Authoritative boundary enforcement over namespace identity.
///
/// The namespace manager is constructor-injected; there is no module-level
/// instance. Permission sets and cached contexts are keyed per tenant, the
/// audit log is append-only and bounded.
pub struct SecurityManager {
    namespaces: Arc<NamespaceManager>,
    permissions: DashMap<ProjectRef, HashSet<String>>,
    contexts: DashMap<(ProjectRef, FunctionId), SecurityContext>,
    audit: AuditLog,
    config: SecurityConfig,
}

impl SecurityManager {
    pub fn new(namespaces: Arc<NamespaceManager>) -> Self {
        Self::with_config(namespaces, SecurityConfig::default())
    }

    pub fn with_config(namespaces: Arc<NamespaceManager>, config: SecurityConfig) -> Self {
        Self {
            namespaces,
            permissions: DashMap::new(),
            contexts: DashMap::new(),
            audit: AuditLog::new(config.audit_capacity),
            config,
        }
    }

    // --- Permissions ---

    /// Seed the fixed default permission set for a tenant. A provisioning
    /// hook, not a policy engine; `set_project_permissions` overrides.
    pub fn initialize_project_permissions(&self, project: &ProjectRef) {
        self.permissions
            .entry(project.clone())
            .or_insert_with(default_permissions);
    }

    /// Replace a tenant's permission set.
    pub fn set_project_permissions(&self, project: &ProjectRef, permissions: HashSet<String>) {
        self.permissions.insert(project.clone(), permissions);
    }

    /// Whether the tenant holds the given permission key.
    pub fn has_permission(&self, project: &ProjectRef, key: &str) -> bool {
        self.permissions
            .get(project)
            .map(|set| set.contains(key))
            .unwrap_or(false)
    }

    // --- Access checks ---

    /// Validate that a function may be accessed on behalf of a tenant.
    ///
    /// Denies (logging a namespace boundary violation) when the id's
    /// embedded tenant differs from `project` or when the tenant lacks the
    /// baseline function-access permission.
    pub fn validate_project_access(&self, function: &FunctionId, project: &ProjectRef) -> bool {
        if !function.belongs_to(project) {
            self.audit.append(
                ViolationRecord::new(
                    ViolationKind::NamespaceBoundaryViolation,
                    Severity::High,
                    format!("function {} accessed by wrong project", function),
                )
                .source(project.clone())
                .target(function.project().clone())
                .function(function.to_string()),
            );
            return false;
        }

        if !self.has_permission(project, FUNCTION_ACCESS) {
            self.audit.append(
                ViolationRecord::new(
                    ViolationKind::NamespaceBoundaryViolation,
                    Severity::Medium,
                    format!("project {} lacks baseline {}", project, FUNCTION_ACCESS),
                )
                .source(project.clone())
                .function(function.to_string()),
            );
            return false;
        }

        true
    }

    /// Boundary entry point for raw `ef_<ref>_<name>` keys arriving from
    /// outside the process. Malformed or empty input is denied and logged,
    /// never an error.
    ///
    /// The key separator is ambiguous when the ref itself contains `_`: the
    /// split happens at the first `_`, so only refs without underscores
    /// round-trip through this boundary. Tenants with `_` in the ref must
    /// present structured ids via `validate_project_access`; their rendered
    /// keys are denied here rather than guessed at.
    pub fn validate_function_key(&self, raw: &str, project: &ProjectRef) -> bool {
        match FunctionId::parse_key(raw) {
            Some(function) => self.validate_project_access(&function, project),
            None => {
                self.audit.append(
                    ViolationRecord::new(
                        ViolationKind::InvalidResourceAccess,
                        Severity::Medium,
                        format!("malformed function key '{}'", raw),
                    )
                    .source(project.clone()),
                );
                false
            }
        }
    }

    /// Validate a resource access end to end: project access, permission,
    /// same-tenant resource identity, then optional credential shape.
    pub fn validate_resource_access(&self, request: &ResourceAccessRequest) -> bool {
        if !self.validate_project_access(&request.function, &request.project) {
            return false;
        }

        let key = permission_key(request.resource_type, request.operation);
        if !self.has_permission(&request.project, &key) {
            self.audit.append(
                ViolationRecord::new(
                    ViolationKind::PermissionDenied,
                    Severity::Medium,
                    format!("project {} lacks permission {}", request.project, key),
                )
                .source(request.project.clone())
                .resource(request.resource.to_string())
                .function(request.function.to_string()),
            );
            return false;
        }

        if request.resource.project() != &request.project {
            self.audit.append(
                ViolationRecord::new(
                    ViolationKind::CrossProjectAccess,
                    Severity::Critical,
                    format!(
                        "resource {} belongs to another project",
                        request.resource
                    ),
                )
                .source(request.project.clone())
                .target(request.resource.project().clone())
                .resource(request.resource.to_string())
                .function(request.function.to_string()),
            );
            return false;
        }

        if let Some(credentials) = &request.credentials {
            if !credentials.matches(&request.project, &self.config.platform_domain) {
                self.audit.append(
                    ViolationRecord::new(
                        ViolationKind::InvalidResourceAccess,
                        Severity::High,
                        "credential bundle does not match expected tenant shape".to_string(),
                    )
                    .source(request.project.clone())
                    .resource(request.resource.to_string())
                    .function(request.function.to_string()),
                );
                return false;
            }
        }

        true
    }

    /// The default-deny primitive all higher-level checks build on: same
    /// tenant allows, different tenants deny with exactly one logged
    /// violation per call.
    pub fn enforce_project_boundaries(&self, source: &ProjectRef, target: &ProjectRef) -> bool {
        if source == target {
            return true;
        }
        self.audit.append(
            ViolationRecord::new(
                ViolationKind::CrossProjectAccess,
                Severity::High,
                format!("project {} attempted to cross into {}", source, target),
            )
            .source(source.clone())
            .target(target.clone()),
        );
        false
    }

    /// Cross-tenant function calls are never allowed under strict isolation;
    /// this delegates to boundary enforcement so the denial is logged once.
    pub fn validate_cross_project_call(
        &self,
        source: &ProjectRef,
        target: &ProjectRef,
        target_function: &FunctionId,
    ) -> bool {
        debug!(
            source = %source, target = %target, function = %target_function,
            "cross-project call check"
        );
        self.enforce_project_boundaries(source, target)
    }

    // --- Security contexts ---

    /// Create (or return the cached) security context for a validated
    /// function/tenant pair.
    ///
    /// Fails with an explicit error when project-access validation does not
    /// pass; that is caller misuse, not an expected runtime denial.
    pub fn create_security_context(
        &self,
        function: &FunctionId,
        project: &ProjectRef,
    ) -> Result<SecurityContext> {
        if !self.validate_project_access(function, project) {
            return Err(SecurityError::AccessDenied {
                function: function.clone(),
                project: project.clone(),
            });
        }

        let key = (project.clone(), function.clone());
        if let Some(cached) = self.contexts.get(&key) {
            return Ok(cached.clone());
        }

        let namespace = self.namespaces.create_project_namespace(project);
        let credentials = self.tenant_credentials(project);
        let permissions = self
            .permissions
            .get(project)
            .map(|set| set.clone())
            .unwrap_or_default();

        let context = SecurityContext {
            project: project.clone(),
            function: function.clone(),
            namespace,
            credentials,
            permissions,
            isolation: IsolationLevel::Strict,
            created_at: chrono::Utc::now(),
        };
        self.contexts.insert(key, context.clone());
        debug!(function = %function, project = %project, "security context created");
        Ok(context)
    }

    /// Remove a cached context; returns whether one was present.
    pub fn clear_security_context(&self, function: &FunctionId, project: &ProjectRef) -> bool {
        self.contexts
            .remove(&(project.clone(), function.clone()))
            .is_some()
    }

    /// Invalidate everything derived for a tenant; pairs with namespace
    /// teardown.
    pub fn invalidate_project(&self, project: &ProjectRef) {
        self.contexts.retain(|(p, _), _| p != project);
        self.permissions.remove(project);
    }

    fn tenant_credentials(&self, project: &ProjectRef) -> TenantCredentials {
        // Prefer a provisioned key from the tenant's private environment;
        // derive a fresh one otherwise.
        let key = self
            .namespaces
            .env_var(project, "SERVICE_ROLE_KEY")
            .unwrap_or_else(|| format!("sk_{}_{}", project, Uuid::new_v4().simple()));
        let url = format!("https://{}.{}", project, self.config.platform_domain);
        TenantCredentials::new(key, url)
    }

    // --- Audit queries ---

    /// All retained violations, oldest first.
    pub fn violations(&self) -> Vec<SecurityViolation> {
        self.audit.all()
    }

    /// Violations involving the tenant as source or target.
    pub fn project_violations(&self, project: &ProjectRef) -> Vec<SecurityViolation> {
        self.audit.for_project(project)
    }

    pub fn violation_count(&self) -> usize {
        self.audit.len()
    }

    // --- Lifecycle ---

    /// Internal-consistency health check; findings are empty when healthy.
    pub fn validate(&self) -> Vec<String> {
        let mut findings = Vec::new();
        for entry in self.contexts.iter() {
            let (project, function) = entry.key();
            if !function.belongs_to(project) {
                findings.push(format!(
                    "cached context for {} keyed under wrong project {}",
                    function, project
                ));
            }
            if !self.has_permission(project, FUNCTION_ACCESS) {
                findings.push(format!(
                    "cached context for {} but project {} lost {}",
                    function, project, FUNCTION_ACCESS
                ));
            }
        }
        findings.extend(self.namespaces.validate());
        findings
    }

    /// Whole-manager reset: contexts, permissions and the audit log.
    pub fn reset(&self) {
        self.contexts.clear();
        self.permissions.clear();
        self.audit.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_types::{FunctionDescriptor, FunctionInstance};

    fn project(raw: &str) -> ProjectRef {
        ProjectRef::parse(raw).unwrap()
    }

    fn function(project_ref: &str, name: &str) -> FunctionId {
        FunctionId::new(project(project_ref), name).unwrap()
    }

    fn manager() -> SecurityManager {
        SecurityManager::new(Arc::new(NamespaceManager::new()))
    }

    fn provisioned(manager: &SecurityManager, raw: &str) -> ProjectRef {
        let p = project(raw);
        manager.initialize_project_permissions(&p);
        p
    }

    #[test]
    fn boundaries_allow_same_tenant_without_logging() {
        let m = manager();
        let p = project("t1");
        assert!(m.enforce_project_boundaries(&p, &p));
        assert_eq!(m.violation_count(), 0);
    }

    #[test]
    fn boundaries_deny_cross_tenant_with_one_violation_per_call() {
        let m = manager();
        let (t1, t2) = (project("t1"), project("t2"));

        assert!(!m.enforce_project_boundaries(&t1, &t2));
        assert_eq!(m.violation_count(), 1);
        assert!(!m.enforce_project_boundaries(&t1, &t2));
        assert_eq!(m.violation_count(), 2);

        let violation = &m.violations()[0];
        assert_eq!(violation.kind, ViolationKind::CrossProjectAccess);
        assert_eq!(violation.severity, Severity::High);
        assert!(violation.involves(&t1));
        assert!(violation.involves(&t2));
    }

    #[test]
    fn cross_project_call_is_always_denied() {
        let m = manager();
        let (t1, t2) = (provisioned(&m, "t1"), provisioned(&m, "t2"));
        let target = function("t2", "callee");
        assert!(!m.validate_cross_project_call(&t1, &t2, &target));
        assert!(m.validate_cross_project_call(&t1, &t1, &function("t1", "callee")));
    }

    #[test]
    fn project_access_requires_matching_tenant() {
        let m = manager();
        let t1 = provisioned(&m, "t1");
        let t2 = provisioned(&m, "t2");

        assert!(m.validate_project_access(&function("t1", "foo"), &t1));
        assert!(!m.validate_project_access(&function("t1", "foo"), &t2));

        let violations = m.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::NamespaceBoundaryViolation);
    }

    #[test]
    fn project_access_requires_baseline_permission() {
        let m = manager();
        let t1 = project("t1"); // never provisioned
        assert!(!m.validate_project_access(&function("t1", "foo"), &t1));
        assert_eq!(m.violations()[0].kind, ViolationKind::NamespaceBoundaryViolation);
    }

    #[test]
    fn malformed_keys_are_denied_and_logged_not_panicked() {
        let m = manager();
        let t1 = provisioned(&m, "t1");

        for raw in ["", "garbage", "ef_", "ef_only"] {
            assert!(!m.validate_function_key(raw, &t1), "{raw} must be denied");
        }
        assert!(m
            .violations()
            .iter()
            .all(|v| v.kind == ViolationKind::InvalidResourceAccess));

        assert!(m.validate_function_key("ef_t1_foo", &t1));
    }

    #[test]
    fn underscore_refs_must_use_structured_ids_at_the_key_boundary() {
        let m = manager();
        let t = provisioned(&m, "a1_b2");
        let id = function("a1_b2", "foo");

        // The rendered key ef_a1_b2_foo re-parses with tenant "a1"; the
        // boundary denies the mismatch instead of guessing the split.
        assert!(!m.validate_function_key(&id.to_string(), &t));
        assert_eq!(
            m.violations().pop().unwrap().kind,
            ViolationKind::NamespaceBoundaryViolation
        );

        // The structured id carries the tenant explicitly and passes.
        assert!(m.validate_project_access(&id, &t));
    }

    #[test]
    fn resource_access_denies_foreign_resource_despite_permission() {
        let m = manager();
        let t1 = provisioned(&m, "t1");
        let request = ResourceAccessRequest {
            function: function("t1", "foo"),
            project: t1.clone(),
            resource_type: ResourceType::Database,
            resource: ResourceId::new(project("t2"), "orders").unwrap(),
            operation: Operation::Read,
            credentials: None,
        };

        assert!(m.has_permission(&t1, "database_read"));
        assert!(!m.validate_resource_access(&request));

        let violation = m.violations().pop().unwrap();
        assert_eq!(violation.kind, ViolationKind::CrossProjectAccess);
        assert_eq!(violation.severity, Severity::Critical);
    }

    #[test]
    fn resource_access_denies_missing_permission() {
        let m = manager();
        let t1 = project("t1");
        m.set_project_permissions(&t1, HashSet::from([FUNCTION_ACCESS.to_string()]));

        let request = ResourceAccessRequest {
            function: function("t1", "foo"),
            project: t1.clone(),
            resource_type: ResourceType::Storage,
            resource: ResourceId::new(t1.clone(), "bucket").unwrap(),
            operation: Operation::Write,
            credentials: None,
        };
        assert!(!m.validate_resource_access(&request));
        assert_eq!(m.violations().pop().unwrap().kind, ViolationKind::PermissionDenied);
    }

    #[test]
    fn resource_access_checks_credential_shape() {
        let m = manager();
        let t1 = provisioned(&m, "t1");
        let mut request = ResourceAccessRequest {
            function: function("t1", "foo"),
            project: t1.clone(),
            resource_type: ResourceType::Api,
            resource: ResourceId::new(t1.clone(), "endpoint").unwrap(),
            operation: Operation::Read,
            credentials: Some(TenantCredentials::new(
                "sk_t1_secret",
                "https://t1.functions.ember.dev",
            )),
        };
        assert!(m.validate_resource_access(&request));

        request.credentials = Some(TenantCredentials::new(
            "sk_t2_secret",
            "https://t1.functions.ember.dev",
        ));
        assert!(!m.validate_resource_access(&request));
        assert_eq!(
            m.violations().pop().unwrap().kind,
            ViolationKind::InvalidResourceAccess
        );
    }

    #[test]
    fn context_creation_requires_passing_validation() {
        let m = manager();
        let t1 = provisioned(&m, "t1");
        let t2 = provisioned(&m, "t2");
        let f = function("t1", "foo");

        let context = m.create_security_context(&f, &t1).unwrap();
        assert_eq!(context.isolation, IsolationLevel::Strict);
        assert_eq!(context.namespace, "ns_t1");
        assert!(context.has_permission(FUNCTION_ACCESS));
        assert!(context.credentials.matches(&t1, "functions.ember.dev"));

        let err = m.create_security_context(&f, &t2).unwrap_err();
        assert!(matches!(err, SecurityError::AccessDenied { .. }));
    }

    #[test]
    fn context_is_cached_until_cleared() {
        let m = manager();
        let t1 = provisioned(&m, "t1");
        let f = function("t1", "foo");

        let first = m.create_security_context(&f, &t1).unwrap();
        let second = m.create_security_context(&f, &t1).unwrap();
        assert_eq!(first.created_at, second.created_at);

        assert!(m.clear_security_context(&f, &t1));
        assert!(!m.clear_security_context(&f, &t1));
    }

    #[test]
    fn invalidate_project_drops_contexts_and_permissions() {
        let m = manager();
        let t1 = provisioned(&m, "t1");
        let f = function("t1", "foo");
        m.create_security_context(&f, &t1).unwrap();

        m.invalidate_project(&t1);
        assert!(!m.has_permission(&t1, FUNCTION_ACCESS));
        assert!(!m.clear_security_context(&f, &t1));
    }

    #[test]
    fn credentials_prefer_provisioned_service_role_key() {
        let namespaces = Arc::new(NamespaceManager::new());
        let m = SecurityManager::new(namespaces.clone());
        let t1 = project("t1");
        m.initialize_project_permissions(&t1);
        namespaces.set_project_env(
            &t1,
            ember_types::EnvMap::from([("SERVICE_ROLE_KEY".into(), "sk_t1_provisioned".into())]),
        );

        let context = m
            .create_security_context(&function("t1", "foo"), &t1)
            .unwrap();
        assert_eq!(context.credentials.service_role_key, "sk_t1_provisioned");
    }

    #[test]
    fn validate_reports_healthy_manager() {
        let m = manager();
        let t1 = provisioned(&m, "t1");
        m.create_security_context(&function("t1", "foo"), &t1).unwrap();
        assert!(m.validate().is_empty());
    }

    #[test]
    fn reset_clears_all_state() {
        let m = manager();
        let t1 = provisioned(&m, "t1");
        m.enforce_project_boundaries(&t1, &project("t2"));
        m.create_security_context(&function("t1", "foo"), &t1).unwrap();

        m.reset();
        assert_eq!(m.violation_count(), 0);
        assert!(!m.has_permission(&t1, FUNCTION_ACCESS));
    }

    #[test]
    fn registered_function_access_flows_through_namespace() {
        let namespaces = Arc::new(NamespaceManager::new());
        let m = SecurityManager::new(namespaces.clone());
        let t1 = project("t1");
        m.initialize_project_permissions(&t1);

        let id = function("t1", "hello");
        namespaces
            .register_function(FunctionInstance::new(
                id.clone(),
                FunctionDescriptor::new("hello", "functions/hello/index.ts", "hello"),
            ))
            .unwrap();

        assert!(namespaces.is_registered(&id));
        assert!(m.validate_project_access(&id, &t1));
    }
}
