//! Viewability-session seam.
//!
//! The measurement algorithm itself is external; this module specifies only
//! the session lifecycle the controller drives.  Sessions never fault the
//! banner: out-of-order calls are defined no-ops.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::host_context::{ExecutionContext, ForegroundActivity};
use crate::render_surface::RenderSurface;

/// Sub-state of a viewability session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ViewabilitySessionState {
    /// Created in deferred mode; measurement not yet running.
    #[default]
    Created,
    /// Measurement running.
    Started,
    /// Ended; terminal.
    Ended,
}

impl fmt::Display for ViewabilitySessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Started => write!(f, "started"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// A measurement session bound to one surface.
pub trait ViewabilitySession {
    /// Begin the deferred measurement sub-session against a resolved
    /// foreground activity.  No-op unless the session is `Created`.
    fn start_deferred(&mut self, activity: &ForegroundActivity);

    /// End the session.  Idempotent.
    fn end(&mut self);

    fn state(&self) -> ViewabilitySessionState;
}

/// Creates measurement sessions.
///
/// `deferred` selects the impression-counting mode: a non-deferred session
/// comes back already `Started`, a deferred one waits for
/// [`ViewabilitySession::start_deferred`].
pub trait ViewabilityProvider {
    fn create_session(
        &mut self,
        context: &ExecutionContext,
        surface: &dyn RenderSurface,
        deferred: bool,
    ) -> Box<dyn ViewabilitySession>;
}
