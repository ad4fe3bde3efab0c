//! Host execution contexts a banner can be bound to.
//!
//! A banner is loaded either against an application-scoped context or against
//! a foreground activity.  Only the latter can anchor viewability
//! measurement.  The activity is owned by the host; this module holds only a
//! weak pointer so a banner never keeps a torn-down activity alive, and a
//! dead handle at resolve time is a normal outcome rather than an error.

use std::fmt;
use std::sync::{Arc, Weak};

/// Foreground activity/window token owned by the host application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForegroundActivity {
    activity_id: String,
}

impl ForegroundActivity {
    pub fn new(activity_id: impl Into<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
        }
    }

    pub fn activity_id(&self) -> &str {
        &self.activity_id
    }
}

impl fmt::Display for ForegroundActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "activity:{}", self.activity_id)
    }
}

/// Opaque host context a banner load is bound to.
#[derive(Debug, Clone)]
pub enum ExecutionContext {
    /// Application-scoped context.  Cannot anchor viewability measurement.
    Application,
    /// Foreground activity-bound context.  Weak: the host owns the activity.
    Foreground(Weak<ForegroundActivity>),
}

impl ExecutionContext {
    /// Bind to a live foreground activity without taking ownership of it.
    pub fn foreground(activity: &Arc<ForegroundActivity>) -> Self {
        Self::Foreground(Arc::downgrade(activity))
    }

    /// Whether this context can anchor a viewability session.
    ///
    /// Capability is a property of the context kind, not of whether the
    /// activity is still alive; liveness is checked at use time via
    /// [`ExecutionContext::resolve_foreground`].
    pub fn is_foreground_capable(&self) -> bool {
        matches!(self, Self::Foreground(_))
    }

    /// Resolve the foreground activity at use time.
    ///
    /// Returns `None` for application contexts and for foreground contexts
    /// whose activity has already been torn down by the host.
    pub fn resolve_foreground(&self) -> Option<Arc<ForegroundActivity>> {
        match self {
            Self::Application => None,
            Self::Foreground(weak) => weak.upgrade(),
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application => write!(f, "application"),
            Self::Foreground(weak) => match weak.upgrade() {
                Some(activity) => write!(f, "foreground({activity})"),
                None => write!(f, "foreground(<gone>)"),
            },
        }
    }
}
