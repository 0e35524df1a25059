//! Read/write permission hooks, injected per entity when routers are composed.

use crate::error::AppError;
use crate::extractors::RequestContext;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A pure predicate over the request context.
pub type PermissionCheck = Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct Permissions {
    read: PermissionCheck,
    write: PermissionCheck,
}

impl Permissions {
    pub fn new<R, W>(read: R, write: W) -> Self
    where
        R: Fn(&RequestContext) -> bool + Send + Sync + 'static,
        W: Fn(&RequestContext) -> bool + Send + Sync + 'static,
    {
        Permissions {
            read: Arc::new(read),
            write: Arc::new(write),
        }
    }

    pub fn allow_all() -> Self {
        Permissions::new(|_| true, |_| true)
    }

    /// Both checks pass only when an authentication layer attached an `Identity`.
    pub fn require_identity() -> Self {
        Permissions::new(|ctx| ctx.identity.is_some(), |ctx| ctx.identity.is_some())
    }

    pub fn check_read(&self, ctx: &RequestContext) -> bool {
        (self.read)(ctx)
    }

    pub fn check_write(&self, ctx: &RequestContext) -> bool {
        (self.write)(ctx)
    }

    pub fn ensure_read(&self, ctx: &RequestContext) -> Result<(), AppError> {
        ensure(self.check_read(ctx), "read", ctx)
    }

    pub fn ensure_write(&self, ctx: &RequestContext) -> Result<(), AppError> {
        ensure(self.check_write(ctx), "write", ctx)
    }
}

fn ensure(allowed: bool, access: &'static str, ctx: &RequestContext) -> Result<(), AppError> {
    if allowed {
        return Ok(());
    }
    tracing::warn!(
        access,
        method = %ctx.method,
        path = %ctx.path,
        subject = ctx.identity.as_ref().map(|i| i.subject.as_str()),
        "permission denied"
    );
    Err(AppError::PermissionDenied)
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::allow_all()
    }
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permissions").finish_non_exhaustive()
    }
}

/// Permissions per entity path segment. Entities without an entry allow everything.
#[derive(Clone, Debug, Default)]
pub struct PermissionRegistry {
    by_path: HashMap<String, Permissions>,
}

impl PermissionRegistry {
    pub fn new() -> Self {
        PermissionRegistry::default()
    }

    pub fn with(mut self, path_segment: impl Into<String>, permissions: Permissions) -> Self {
        self.by_path.insert(path_segment.into(), permissions);
        self
    }

    pub fn get(&self, path_segment: &str) -> Permissions {
        self.by_path.get(path_segment).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::Identity;
    use axum::http::{HeaderMap, Method};

    fn ctx(identity: Option<Identity>) -> RequestContext {
        RequestContext {
            method: Method::GET,
            path: "/example".into(),
            headers: HeaderMap::new(),
            identity,
        }
    }

    #[test]
    fn allow_all_passes_anonymous() {
        let p = Permissions::allow_all();
        assert!(p.ensure_read(&ctx(None)).is_ok());
        assert!(p.ensure_write(&ctx(None)).is_ok());
    }

    #[test]
    fn require_identity_denies_anonymous() {
        let p = Permissions::require_identity();
        assert!(matches!(p.ensure_read(&ctx(None)), Err(AppError::PermissionDenied)));
        assert!(p.ensure_write(&ctx(Some(Identity::new("u1")))).is_ok());
    }

    #[test]
    fn read_and_write_are_independent() {
        let p = Permissions::new(
            |_| true,
            |c| c.identity.as_ref().is_some_and(|i| i.has_role("editor")),
        );
        let viewer = ctx(Some(Identity::new("v")));
        let editor = ctx(Some(Identity::new("e").with_role("editor")));
        assert!(p.check_read(&viewer));
        assert!(!p.check_write(&viewer));
        assert!(p.check_write(&editor));
    }

    #[test]
    fn registry_defaults_to_allow_all() {
        let reg = PermissionRegistry::new().with("secret", Permissions::new(|_| false, |_| false));
        assert!(!reg.get("secret").check_read(&ctx(None)));
        assert!(reg.get("other").check_read(&ctx(None)));
    }
}
