#![forbid(unsafe_code)]

//! Banner creative lifecycle adapter.
//!
//! Loads an interactive, script-capable advertisement creative into a render
//! surface embedded in a host application and bridges the surface's
//! structural lifecycle events to the normalized ad-lifecycle listener
//! consumed by the upstream ad-serving framework.  Optionally coordinates a
//! viewability-measurement session tied to the surface's foreground
//! activity.

pub mod banner_lifecycle;
pub mod host_context;
pub mod listener;
pub mod mocks;
pub mod render_surface;
pub mod viewability;

pub use banner_lifecycle::{
    AdapterLogEvent, BannerLifecycleController, BannerState,
    BANNER_IMPRESSION_PIXEL_COUNT_ENABLED, CREATIVE_REPORT, HTML_RESPONSE_BODY,
    VISIBILITY_NOTIFICATION_SCRIPT,
};
pub use host_context::{ExecutionContext, ForegroundActivity};
pub use listener::{BannerErrorKind, BannerListener, InternalBannerListener};
pub use render_surface::{
    CreativeReport, PlacementType, RenderSurface, SurfaceDebugListener, SurfaceError,
    SurfaceEvent, SurfaceFactory,
};
pub use viewability::{ViewabilityProvider, ViewabilitySession, ViewabilitySessionState};
