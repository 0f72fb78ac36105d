//! Path-scoped middleware.
//!
//! A [`ScopeGuard`] runs its wrapped middleware only for request paths that
//! start with the scope pattern and do not exactly match any exclusion. For
//! every other path the guard is a pass-through: it hands the request to the
//! rest of the pipeline untouched.

use crate::middleware::{BoxFuture, Middleware, Next};
use std::sync::Arc;
use tracing::debug;
use wirebind_core::{Container, Request, Response, WireResult};
use wirebind_pattern::{ExclusionSet, PathPattern};

/// Middleware restricted to a path scope.
///
/// # Example
///
/// ```ignore
/// let guard = ScopeGuard::builder(container, "/api")
///     .exclude(["/api/health"])
///     .build(auth_middleware)?;
/// ```
pub struct ScopeGuard {
    container: Arc<Container>,
    scope: PathPattern,
    exclusions: ExclusionSet,
    middleware: Arc<dyn Middleware>,
}

impl ScopeGuard {
    /// Starts building a guard for `scope` (prefix semantics).
    pub fn builder(container: Arc<Container>, scope: impl Into<String>) -> ScopeGuardBuilder {
        ScopeGuardBuilder {
            container,
            scope: scope.into(),
            exclusions: Vec::new(),
        }
    }

    /// Returns `true` if the wrapped middleware runs for `path`.
    #[must_use]
    pub fn applies_to(&self, path: &str) -> bool {
        self.scope.matches(path) && !self.exclusions.excludes(path)
    }

    /// Returns the wrapped middleware.
    #[must_use]
    pub fn middleware(&self) -> &Arc<dyn Middleware> {
        &self.middleware
    }

    /// Returns the scope pattern.
    #[must_use]
    pub fn scope(&self) -> &str {
        self.scope.as_str()
    }
}

impl Middleware for ScopeGuard {
    fn name(&self) -> &'static str {
        "scope_guard"
    }

    fn process<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, WireResult<Response>> {
        Box::pin(async move {
            if !self.applies_to(request.path()) {
                debug!(
                    path = %request.path(),
                    scope = %self.scope.as_str(),
                    middleware = self.middleware.name(),
                    "middleware skipped outside scope"
                );
                return next.run(request, response).await;
            }

            let next = next.with_container(Arc::clone(&self.container));
            self.middleware.process(request, response, next).await
        })
    }
}

/// Collects scope settings until the wrapped middleware is known.
pub struct ScopeGuardBuilder {
    container: Arc<Container>,
    scope: String,
    exclusions: Vec<String>,
}

impl ScopeGuardBuilder {
    /// Adds exact-match exclusion patterns.
    #[must_use]
    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Compiles the patterns and wraps `middleware`.
    ///
    /// # Errors
    ///
    /// Returns [`wirebind_core::WireError::InvalidPattern`] if any pattern
    /// fails to compile.
    pub fn build(self, middleware: Arc<dyn Middleware>) -> WireResult<ScopeGuard> {
        Ok(ScopeGuard {
            scope: PathPattern::compile(&self.scope, true)?,
            exclusions: ExclusionSet::compile(&self.exclusions)?,
            container: self.container,
            middleware,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnMiddleware;

    fn guard(scope: &str, exclusions: &[&str]) -> ScopeGuard {
        let noop: Arc<dyn Middleware> = Arc::new(FnMiddleware::new(
            "noop",
            |req: Request, res: Response, next: Next| next.run(req, res),
        ));
        ScopeGuard::builder(Arc::new(Container::new()), scope)
            .exclude(exclusions.iter().copied())
            .build(noop)
            .unwrap()
    }

    #[test]
    fn test_prefix_inclusion_exact_exclusion() {
        let guard = guard("/api", &["/api/health"]);

        assert!(guard.applies_to("/api"));
        assert!(guard.applies_to("/api/users"));
        assert!(guard.applies_to("/api/health/detail"));
        assert!(!guard.applies_to("/api/health"));
        assert!(!guard.applies_to("/public"));
    }

    #[test]
    fn test_template_scope() {
        let guard = guard("/org/{org}/", &["/org/{org}/status/"]);

        assert!(guard.applies_to("/org/acme/projects/"));
        assert!(!guard.applies_to("/org/acme/status/"));
        assert!(!guard.applies_to("/orgs/acme/"));
    }

    #[test]
    fn test_empty_exclusions() {
        let guard = guard("/", &[]);
        assert!(guard.applies_to("/anything"));
        assert_eq!(guard.scope(), "/");
        assert_eq!(guard.middleware().name(), "noop");
    }

    #[test]
    fn test_invalid_exclusion_fails_build() {
        let noop: Arc<dyn Middleware> = Arc::new(FnMiddleware::new(
            "noop",
            |req: Request, res: Response, next: Next| next.run(req, res),
        ));
        let result = ScopeGuard::builder(Arc::new(Container::new()), "/api")
            .exclude(["/api/{broken"])
            .build(noop);
        assert!(result.is_err());
    }
}
