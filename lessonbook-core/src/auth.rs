//! Authentication context seen by the resolution pipeline.

/// What the pipeline needs from the authentication provider.
pub trait IdentityContext {
    /// Whether the provider has finished loading the session.
    fn is_ready(&self) -> bool;

    /// External identity of the signed-in session, if any.
    fn session_identity(&self) -> Option<&str>;
}

/// Snapshot of the authentication provider's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    ready: bool,
    session: Option<String>,
}

impl AuthContext {
    /// Provider still loading.
    pub fn loading() -> Self {
        Self {
            ready: false,
            session: None,
        }
    }

    /// Loaded, nobody signed in.
    pub fn anonymous() -> Self {
        Self {
            ready: true,
            session: None,
        }
    }

    /// Loaded with a signed-in session.
    pub fn signed_in(external_identity: impl Into<String>) -> Self {
        Self {
            ready: true,
            session: Some(external_identity.into()),
        }
    }
}

impl IdentityContext for AuthContext {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn session_identity(&self) -> Option<&str> {
        self.session.as_deref()
    }
}

impl<T: IdentityContext + ?Sized> IdentityContext for &T {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn session_identity(&self) -> Option<&str> {
        (**self).session_identity()
    }
}
