//! Banner creative lifecycle controller.
//!
//! Owns one render surface per load cycle, translates the surface's
//! structural events into the normalized listener contract, gates
//! viewability-session creation on the execution context, and guarantees
//! ordered teardown whichever path ends the banner's life.
//!
//! The controller is single-owner: every operation is expected to run on the
//! host's ad-lifecycle management context, sequentially.  `load` is
//! asynchronous in effect — it returns before the outcome is known, and
//! completion arrives only through [`BannerLifecycleController::on_surface_event`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::host_context::ExecutionContext;
use crate::listener::{BannerErrorKind, BannerListener};
use crate::render_surface::{
    CreativeReport, PlacementType, RenderSurface, SurfaceDebugListener, SurfaceEvent,
    SurfaceFactory,
};
use crate::viewability::{ViewabilityProvider, ViewabilitySession, ViewabilitySessionState};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const COMPONENT: &str = "banner_lifecycle";

/// Server-payload key carrying the creative markup.
pub const HTML_RESPONSE_BODY: &str = "HTML_RESPONSE_BODY";

/// Configuration key enabling deferred viewability start on confirmed
/// impression.
pub const BANNER_IMPRESSION_PIXEL_COUNT_ENABLED: &str = "BANNER_IMPRESSION_PIXEL_COUNT_ENABLED";

/// Configuration key carrying the optional [`CreativeReport`].
pub const CREATIVE_REPORT: &str = "CREATIVE_REPORT";

/// Script notifying the creative that it is now visible to the user.
pub const VISIBILITY_NOTIFICATION_SCRIPT: &str = "creativeDidAppear();";

// ---------------------------------------------------------------------------
// Controller state machine
// ---------------------------------------------------------------------------

/// Lifecycle state of one banner controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerState {
    /// No load attempted.
    Idle,
    /// Content injected; outcome pending.
    Loading,
    /// Creative rendered; terminal success.
    Loaded,
    /// Load ended in failure; terminal.
    Failed,
    /// Invalidated; every further operation is a no-op.
    Destroyed,
}

impl fmt::Display for BannerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Loaded => write!(f, "loaded"),
            Self::Failed => write!(f, "failed"),
            Self::Destroyed => write!(f, "destroyed"),
        }
    }
}

// ---------------------------------------------------------------------------
// AdapterLogEvent — structured observability
// ---------------------------------------------------------------------------

/// Structured event emitted at the controller's decision points.
///
/// The buffer these accumulate in is the controller's observability sink;
/// the host drains it with [`BannerLifecycleController::drain_events`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterLogEvent {
    /// Component name.
    pub component: String,
    /// Event name (load_attempted, load_success, show_attempted,
    /// load_failed, clicked, custom).
    pub event: String,
    /// Outcome (ok, error, ignored, dropped).
    pub outcome: String,
    /// Error code if the outcome is an error.
    pub error_code: Option<String>,
    /// Free-form diagnostic detail.
    pub detail: Option<String>,
}

// ---------------------------------------------------------------------------
// BannerLifecycleController
// ---------------------------------------------------------------------------

/// Loads a script-capable banner creative into a render surface and bridges
/// its lifecycle to the upstream listener.
///
/// One controller serves one load cycle.  The surface and the viewability
/// session are exclusively owned; the listener is held weakly and used only
/// for event delivery.
pub struct BannerLifecycleController {
    state: BannerState,
    surface: Option<Box<dyn RenderSurface>>,
    session: Option<Box<dyn ViewabilitySession>>,
    listener: Option<Weak<dyn BannerListener>>,
    context: Option<ExecutionContext>,
    surface_factory: Box<dyn SurfaceFactory>,
    viewability_provider: Box<dyn ViewabilityProvider>,
    debug_listener: Option<Arc<dyn SurfaceDebugListener>>,
    impression_pixel_count_enabled: bool,
    content_ready_seen: bool,
    terminal_delivered: bool,
    events: Vec<AdapterLogEvent>,
}

impl BannerLifecycleController {
    /// Create a controller with its collaborator seams injected.
    pub fn new(
        surface_factory: impl SurfaceFactory + 'static,
        viewability_provider: impl ViewabilityProvider + 'static,
    ) -> Self {
        Self {
            state: BannerState::Idle,
            surface: None,
            session: None,
            listener: None,
            context: None,
            surface_factory: Box::new(surface_factory),
            viewability_provider: Box::new(viewability_provider),
            debug_listener: None,
            impression_pixel_count_enabled: false,
            content_ready_seen: false,
            terminal_delivered: false,
            events: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // load
    // -----------------------------------------------------------------------

    /// Load the creative described by `payload` and `config` into a new
    /// render surface bound to `context`.
    ///
    /// Returns before the outcome is known; completion arrives through
    /// [`Self::on_surface_event`].  Every failure is reported once through
    /// the listener with a configuration-error classification — nothing is
    /// returned or panicked.
    pub fn load(
        &mut self,
        context: ExecutionContext,
        listener: Arc<dyn BannerListener>,
        config: &BTreeMap<String, Value>,
        payload: &BTreeMap<String, String>,
    ) {
        if self.state != BannerState::Idle {
            self.fail_load(
                &listener,
                "controller is not idle; banner controllers serve one load cycle",
            );
            return;
        }

        if listener.as_internal().is_none() {
            self.fail_load(
                &listener,
                "listener does not implement the internal banner contract",
            );
            return;
        }

        self.push_event("load_attempted", "ok", None, None);

        let markup = match payload.get(HTML_RESPONSE_BODY) {
            Some(body) if !body.trim().is_empty() => body.clone(),
            _ => {
                self.fail_load(&listener, "payload is missing creative markup");
                return;
            }
        };

        self.impression_pixel_count_enabled = config
            .get(BANNER_IMPRESSION_PIXEL_COUNT_ENABLED)
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let report = match config.get(CREATIVE_REPORT) {
            None => None,
            Some(value) => match serde_json::from_value::<CreativeReport>(value.clone()) {
                Ok(report) => Some(report),
                Err(e) => {
                    self.fail_load(
                        &listener,
                        &format!("creative report has unexpected shape: {e}"),
                    );
                    return;
                }
            },
        };

        let mut surface =
            match self
                .surface_factory
                .create(&context, PlacementType::Inline, report.as_ref())
            {
                Ok(surface) => surface,
                Err(e) => {
                    self.push_event(
                        "load_failed",
                        "error",
                        Some(e.error_code()),
                        Some(&e.to_string()),
                    );
                    listener.on_failed(BannerErrorKind::CreativeLoadError);
                    return;
                }
            };

        surface.set_debug_listener(self.debug_listener.clone());
        surface.inject_content(&markup);

        self.surface = Some(surface);
        self.listener = Some(Arc::downgrade(&listener));
        self.context = Some(context);
        self.state = BannerState::Loading;
    }

    // -----------------------------------------------------------------------
    // Event translation
    // -----------------------------------------------------------------------

    /// Translate one surface event into the normalized listener contract.
    ///
    /// Terminal events (load success, load failure, engine termination) are
    /// delivered at most once total; a later terminal is a protocol
    /// violation and is dropped with a diagnostic.  Non-terminal events may
    /// recur.  After [`Self::invalidate`], every event is dropped.
    pub fn on_surface_event(&mut self, event: SurfaceEvent) {
        if self.state == BannerState::Destroyed || self.surface.is_none() {
            return;
        }

        match event {
            SurfaceEvent::ContentReady => self.handle_content_ready(),
            SurfaceEvent::Loaded => self.handle_load_success(),
            SurfaceEvent::LoadFailed => {
                self.handle_load_failure(BannerErrorKind::CreativeLoadError);
            }
            SurfaceEvent::RenderTerminated { crashed } => {
                let kind = if crashed {
                    BannerErrorKind::RenderProcessGoneWithCrash
                } else {
                    BannerErrorKind::RenderProcessGoneUnspecified
                };
                self.handle_load_failure(kind);
            }
            SurfaceEvent::ExpandRequested => {
                if let Some(listener) = self.upgrade_listener() {
                    if let Some(internal) = listener.as_internal() {
                        internal.on_expanded();
                        internal.on_clicked();
                    }
                }
            }
            SurfaceEvent::Resized { to_original_size } => {
                if let Some(listener) = self.upgrade_listener() {
                    if let Some(internal) = listener.as_internal() {
                        if to_original_size {
                            internal.on_resume_auto_refresh();
                        } else {
                            internal.on_pause_auto_refresh();
                        }
                    }
                }
            }
            SurfaceEvent::OpenRequested => {
                self.push_event("clicked", "ok", None, None);
                if let Some(listener) = self.upgrade_listener() {
                    if let Some(internal) = listener.as_internal() {
                        internal.on_clicked();
                    }
                }
            }
            SurfaceEvent::CloseRequested => {
                if let Some(listener) = self.upgrade_listener() {
                    if let Some(internal) = listener.as_internal() {
                        internal.on_collapsed();
                    }
                }
            }
        }
    }

    fn handle_content_ready(&mut self) {
        if self.content_ready_seen {
            return;
        }
        self.content_ready_seen = true;

        if let Some(surface) = self.surface.as_mut() {
            surface.enable_script_execution();
        }

        // Viewability is only measured against an activity-bound context.
        let foreground_capable = self
            .context
            .as_ref()
            .is_some_and(ExecutionContext::is_foreground_capable);
        if !foreground_capable || self.session.is_some() {
            return;
        }

        if let (Some(context), Some(surface)) = (self.context.as_ref(), self.surface.as_deref()) {
            let session = self.viewability_provider.create_session(
                context,
                surface,
                self.impression_pixel_count_enabled,
            );
            self.session = Some(session);
        }
    }

    fn handle_load_success(&mut self) {
        if self.terminal_delivered {
            self.push_event(
                "custom",
                "ignored",
                None,
                Some("duplicate terminal load event dropped"),
            );
            return;
        }
        self.terminal_delivered = true;
        self.state = BannerState::Loaded;

        if let Some(surface) = self.surface.as_mut() {
            surface.mark_preferred_size_authoritative();
        }
        self.push_event("load_success", "ok", None, None);
        self.push_event("show_attempted", "ok", None, None);

        if let Some(listener) = self.upgrade_listener() {
            if let Some(internal) = listener.as_internal() {
                if let Some(surface) = self.surface.as_deref() {
                    internal.on_loaded(surface);
                }
            }
        }
    }

    fn handle_load_failure(&mut self, kind: BannerErrorKind) {
        if self.terminal_delivered {
            self.push_event(
                "custom",
                "ignored",
                None,
                Some("duplicate terminal load event dropped"),
            );
            return;
        }
        self.terminal_delivered = true;
        self.state = BannerState::Failed;

        self.push_event("load_failed", "error", Some(kind.error_code()), None);
        if let Some(listener) = self.upgrade_listener() {
            if let Some(internal) = listener.as_internal() {
                internal.on_failed(kind);
            }
        }
    }

    // -----------------------------------------------------------------------
    // confirm_impression
    // -----------------------------------------------------------------------

    /// Confirm the banner became visible and billable.
    ///
    /// Silently a no-op once invalidated.  Always notifies the creative of
    /// visibility; starts the deferred measurement sub-session only when the
    /// impression-counting flag is set, a session exists, and the surface's
    /// weak foreground handle still resolves.  A lost handle is logged and
    /// dropped — the banner keeps operating.
    pub fn confirm_impression(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.run_script(VISIBILITY_NOTIFICATION_SCRIPT);

        if !self.impression_pixel_count_enabled || self.session.is_none() {
            return;
        }

        let resolved = self
            .surface
            .as_ref()
            .map(|s| s.foreground_context())
            .and_then(|weak| weak.upgrade());
        match resolved {
            Some(activity) => {
                if let Some(session) = self.session.as_mut() {
                    session.start_deferred(&activity);
                }
            }
            None => {
                self.push_event(
                    "custom",
                    "dropped",
                    None,
                    Some("lost the foreground activity for deferred viewability tracking; dropping the session start"),
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // invalidate
    // -----------------------------------------------------------------------

    /// End the banner's life.  Idempotent; safe while a load is in flight.
    ///
    /// The event-translation path is detached before the surface is torn
    /// down, so a surface that emits during destruction cannot reach the
    /// listener.
    pub fn invalidate(&mut self) {
        if self.state == BannerState::Destroyed {
            return;
        }

        if let Some(mut session) = self.session.take() {
            session.end();
        }

        self.listener = None;
        self.state = BannerState::Destroyed;

        if let Some(mut surface) = self.surface.take() {
            surface.destroy();
        }
        self.context = None;
    }

    // -----------------------------------------------------------------------
    // Debug hooks
    // -----------------------------------------------------------------------

    /// Attach or clear the surface debug hook.  Forwarded to the live
    /// surface immediately and to any surface created by a later load.
    pub fn set_debug_listener(&mut self, listener: Option<Arc<dyn SurfaceDebugListener>>) {
        self.debug_listener = listener.clone();
        if let Some(surface) = self.surface.as_mut() {
            surface.set_debug_listener(listener);
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn state(&self) -> BannerState {
        self.state
    }

    pub fn is_impression_pixel_count_enabled(&self) -> bool {
        self.impression_pixel_count_enabled
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    pub fn has_viewability_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn viewability_session_state(&self) -> Option<ViewabilitySessionState> {
        self.session.as_ref().map(|s| s.state())
    }

    /// View accumulated observability events.
    pub fn events(&self) -> &[AdapterLogEvent] {
        &self.events
    }

    /// Drain accumulated observability events.
    pub fn drain_events(&mut self) -> Vec<AdapterLogEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn upgrade_listener(&self) -> Option<Arc<dyn BannerListener>> {
        self.listener.as_ref().and_then(|weak| weak.upgrade())
    }

    fn fail_load(&mut self, listener: &Arc<dyn BannerListener>, detail: &str) {
        self.push_event(
            "load_failed",
            "error",
            Some(BannerErrorKind::CreativeLoadError.error_code()),
            Some(detail),
        );
        listener.on_failed(BannerErrorKind::CreativeLoadError);
    }

    fn push_event(
        &mut self,
        event: &str,
        outcome: &str,
        error_code: Option<&str>,
        detail: Option<&str>,
    ) {
        self.events.push(AdapterLogEvent {
            component: COMPONENT.to_string(),
            event: event.to_string(),
            outcome: outcome.to_string(),
            error_code: error_code.map(str::to_string),
            detail: detail.map(str::to_string),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
