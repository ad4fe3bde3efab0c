//! Render-surface seam consumed by the banner lifecycle controller.
//!
//! The surface is an embeddable view that executes script-capable creative
//! markup and reports structural lifecycle events back to its owner.  The
//! controller treats it as an opaque capability: inject content, run script,
//! destroy.  Engine internals (markup execution, layout) live behind this
//! boundary and are out of scope for this crate.

use std::fmt;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};

use crate::host_context::{ExecutionContext, ForegroundActivity};

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// Where the creative renders within the host layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementType {
    /// Embedded in the host view hierarchy (banner).
    Inline,
    /// Covers the host screen.
    Interstitial,
}

impl PlacementType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Interstitial => "interstitial",
        }
    }
}

impl fmt::Display for PlacementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str((*self).as_str())
    }
}

// ---------------------------------------------------------------------------
// CreativeReport — typed dependency supplied through configuration
// ---------------------------------------------------------------------------

/// Serving metadata attached to a creative by the upstream framework.
///
/// Optional at load time; a present-but-malformed report is a construction
/// error, not a crash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreativeReport {
    pub ad_unit_id: String,
    #[serde(default)]
    pub dsp_creative_id: Option<String>,
    #[serde(default)]
    pub response_identifier: Option<String>,
}

// ---------------------------------------------------------------------------
// Surface events — the tagged channel the controller translates
// ---------------------------------------------------------------------------

/// Structural lifecycle event reported by a render surface.
///
/// Delivered zero or more times, asynchronously, on an unspecified turn; the
/// controller assumes nothing about the calling context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceEvent {
    /// The surface is prepared to begin measurement.  Fires before the load
    /// outcome is guaranteed to have been delivered.
    ContentReady,
    /// Creative markup loaded and rendered.
    Loaded,
    /// Creative markup failed to load.
    LoadFailed,
    /// The render engine terminated unexpectedly.
    RenderTerminated { crashed: bool },
    /// The creative requested expansion.
    ExpandRequested,
    /// The creative resized; `to_original_size` distinguishes a return to
    /// the original dimensions from a resize away from them.
    Resized { to_original_size: bool },
    /// The creative requested an outward navigation.
    OpenRequested,
    /// The creative requested to close/collapse.
    CloseRequested,
}

// ---------------------------------------------------------------------------
// Surface traits
// ---------------------------------------------------------------------------

/// Debug hook receiving script-console output from the surface.
pub trait SurfaceDebugListener {
    fn on_console_message(&self, message: &str);
}

/// An embeddable, script-capable render surface.
pub trait RenderSurface {
    /// Inject creative markup.  Returns immediately; outcomes arrive later
    /// as [`SurfaceEvent`]s.
    fn inject_content(&mut self, markup: &str);

    /// Allow the injected creative to execute script.
    fn enable_script_execution(&mut self);

    /// Run a script snippet against the live creative.
    fn run_script(&mut self, script: &str);

    /// Treat the creative's preferred dimensions as authoritative for
    /// layout.
    fn mark_preferred_size_authoritative(&mut self);

    /// Attach or clear the debug hook.
    fn set_debug_listener(&mut self, listener: Option<Arc<dyn SurfaceDebugListener>>);

    /// Tear the surface down.  No events may be delivered afterwards.
    fn destroy(&mut self);

    /// Weak back-reference to the foreground activity the surface was bound
    /// to.  Never keeps the activity alive; resolve at use time.
    fn foreground_context(&self) -> Weak<ForegroundActivity>;
}

/// Constructs render surfaces bound to a host context and placement.
pub trait SurfaceFactory {
    fn create(
        &mut self,
        context: &ExecutionContext,
        placement: PlacementType,
        report: Option<&CreativeReport>,
    ) -> Result<Box<dyn RenderSurface>, SurfaceError>;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Surface construction errors surfaced to the controller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// A typed dependency had an unexpected shape.
    #[error("typed dependency `{field}` has unexpected shape: {detail}")]
    InvalidDependency { field: &'static str, detail: String },
    /// The render engine could not be brought up.
    #[error("render engine unavailable ({code})")]
    EngineUnavailable { code: &'static str },
}

impl SurfaceError {
    /// Stable error code for structured logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDependency { .. } => "surface_invalid_dependency",
            Self::EngineUnavailable { .. } => "surface_engine_unavailable",
        }
    }
}
