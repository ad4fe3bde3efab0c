//! Normalized ad-lifecycle listener contract.
//!
//! The upstream ad-serving framework supplies a listener at load time.  The
//! base contract covers the events every integration consumes; banner
//! refresh pacing needs the extended internal contract, and a listener that
//! does not provide it is rejected at the load boundary with a typed
//! configuration error instead of a cast fault.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::render_surface::RenderSurface;

/// Normalized error kind delivered through [`BannerListener::on_failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerErrorKind {
    /// Configuration, construction, or creative load failure.
    CreativeLoadError,
    /// The render engine crashed while hosting the creative.
    RenderProcessGoneWithCrash,
    /// The render engine terminated without a crash classification.
    RenderProcessGoneUnspecified,
}

impl BannerErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreativeLoadError => "creative_load_error",
            Self::RenderProcessGoneWithCrash => "render_process_gone_with_crash",
            Self::RenderProcessGoneUnspecified => "render_process_gone_unspecified",
        }
    }

    /// Stable error code for structured logging.
    pub const fn error_code(self) -> &'static str {
        self.as_str()
    }

    /// Numeric code reported alongside failures.
    pub const fn int_code(self) -> u32 {
        match self {
            Self::CreativeLoadError => 300,
            Self::RenderProcessGoneWithCrash => 901,
            Self::RenderProcessGoneUnspecified => 902,
        }
    }
}

impl fmt::Display for BannerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Base ad-lifecycle listener contract.
///
/// Methods take `&self`: the listener belongs to the upstream framework and
/// handles its own mutation.  The controller holds it weakly and never owns
/// it.
pub trait BannerListener {
    /// The creative rendered; the surface handle is ready to attach.
    fn on_loaded(&self, surface: &dyn RenderSurface);
    /// The load attempt ended in failure.
    fn on_failed(&self, kind: BannerErrorKind);
    /// The creative expanded over the host content.
    fn on_expanded(&self);
    /// The creative collapsed back to its slot.
    fn on_collapsed(&self);
    /// The user interacted with the creative.
    fn on_clicked(&self);

    /// Capability hook for the extended internal contract.
    ///
    /// Integrations that support refresh pacing return `Some(self)`; the
    /// default `None` causes the load boundary to reject the listener.
    fn as_internal(&self) -> Option<&dyn InternalBannerListener> {
        None
    }
}

/// Extended internal contract adding auto-refresh pacing.
pub trait InternalBannerListener: BannerListener {
    /// The creative left its original size; pause banner auto-refresh.
    fn on_pause_auto_refresh(&self);
    /// The creative returned to its original size; resume auto-refresh.
    fn on_resume_auto_refresh(&self);
}
