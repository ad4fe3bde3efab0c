//! Deterministic test doubles for the controller's collaborator seams.
//!
//! Used by the in-crate unit suites and the integration tests.  The
//! controller takes ownership of the factory and provider it is constructed
//! with, so every mock exposes a shared probe handle the test keeps to
//! observe calls after the move.

use std::sync::{Arc, Mutex, Weak};

use crate::host_context::{ExecutionContext, ForegroundActivity};
use crate::listener::{BannerErrorKind, BannerListener, InternalBannerListener};
use crate::render_surface::{
    CreativeReport, PlacementType, RenderSurface, SurfaceDebugListener, SurfaceError,
    SurfaceFactory,
};
use crate::viewability::{ViewabilityProvider, ViewabilitySession, ViewabilitySessionState};

/// Failure injection knob shared by the mock collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MockFailureMode {
    #[default]
    Never,
    FailAlways {
        code: &'static str,
    },
    FailAfterN {
        remaining_successes: u32,
        code: &'static str,
    },
}

fn apply_failure_mode(mode: &mut MockFailureMode) -> Result<(), &'static str> {
    match mode {
        MockFailureMode::Never => Ok(()),
        MockFailureMode::FailAlways { code } => Err(code),
        MockFailureMode::FailAfterN {
            remaining_successes,
            code,
        } => {
            if *remaining_successes == 0 {
                Err(code)
            } else {
                *remaining_successes -= 1;
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Render surface
// ---------------------------------------------------------------------------

/// Observable state of one mock surface.
#[derive(Debug, Default)]
pub struct SurfaceProbe {
    pub injected_markup: Vec<String>,
    pub scripts_run: Vec<String>,
    pub script_execution_enabled: bool,
    pub preferred_size_authoritative: bool,
    pub debug_listener_attached: bool,
    pub destroyed: bool,
}

/// Mock render surface recording every call into its probe.
pub struct MockSurface {
    probe: Arc<Mutex<SurfaceProbe>>,
    foreground: Weak<ForegroundActivity>,
}

impl RenderSurface for MockSurface {
    fn inject_content(&mut self, markup: &str) {
        self.probe
            .lock()
            .expect("surface probe")
            .injected_markup
            .push(markup.to_string());
    }

    fn enable_script_execution(&mut self) {
        self.probe.lock().expect("surface probe").script_execution_enabled = true;
    }

    fn run_script(&mut self, script: &str) {
        self.probe
            .lock()
            .expect("surface probe")
            .scripts_run
            .push(script.to_string());
    }

    fn mark_preferred_size_authoritative(&mut self) {
        self.probe
            .lock()
            .expect("surface probe")
            .preferred_size_authoritative = true;
    }

    fn set_debug_listener(&mut self, listener: Option<Arc<dyn SurfaceDebugListener>>) {
        self.probe.lock().expect("surface probe").debug_listener_attached = listener.is_some();
    }

    fn destroy(&mut self) {
        self.probe.lock().expect("surface probe").destroyed = true;
    }

    fn foreground_context(&self) -> Weak<ForegroundActivity> {
        self.foreground.clone()
    }
}

/// Observable state of the mock surface factory.
#[derive(Default)]
pub struct FactoryProbe {
    pub created: usize,
    pub last_placement: Option<PlacementType>,
    pub last_report: Option<CreativeReport>,
    pub surfaces: Vec<Arc<Mutex<SurfaceProbe>>>,
}

impl FactoryProbe {
    /// Probe of the most recently created surface.
    pub fn last_surface(&self) -> Option<Arc<Mutex<SurfaceProbe>>> {
        self.surfaces.last().cloned()
    }
}

/// Mock surface factory with failure injection.
///
/// Surfaces it creates carry the weak foreground handle configured via
/// [`MockSurfaceFactory::with_foreground`]; the default handle is dead,
/// matching an application-scoped bind.
pub struct MockSurfaceFactory {
    probe: Arc<Mutex<FactoryProbe>>,
    failure_mode: MockFailureMode,
    foreground: Weak<ForegroundActivity>,
}

impl MockSurfaceFactory {
    pub fn new() -> Self {
        Self {
            probe: Arc::new(Mutex::new(FactoryProbe::default())),
            failure_mode: MockFailureMode::Never,
            foreground: Weak::new(),
        }
    }

    pub fn with_foreground(mut self, activity: &Arc<ForegroundActivity>) -> Self {
        self.foreground = Arc::downgrade(activity);
        self
    }

    pub fn with_failure_mode(mut self, mode: MockFailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Shared probe handle; keep a clone before moving the factory into the
    /// controller.
    pub fn probe(&self) -> Arc<Mutex<FactoryProbe>> {
        Arc::clone(&self.probe)
    }
}

impl Default for MockSurfaceFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceFactory for MockSurfaceFactory {
    fn create(
        &mut self,
        _context: &ExecutionContext,
        placement: PlacementType,
        report: Option<&CreativeReport>,
    ) -> Result<Box<dyn RenderSurface>, SurfaceError> {
        apply_failure_mode(&mut self.failure_mode)
            .map_err(|code| SurfaceError::EngineUnavailable { code })?;

        let surface_probe = Arc::new(Mutex::new(SurfaceProbe::default()));
        let mut probe = self.probe.lock().expect("factory probe");
        probe.created += 1;
        probe.last_placement = Some(placement);
        probe.last_report = report.cloned();
        probe.surfaces.push(Arc::clone(&surface_probe));

        Ok(Box::new(MockSurface {
            probe: surface_probe,
            foreground: self.foreground.clone(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Viewability
// ---------------------------------------------------------------------------

/// Observable state of one mock session.
#[derive(Debug, Default)]
pub struct SessionProbe {
    pub state: ViewabilitySessionState,
    pub started_for: Option<String>,
    pub end_calls: usize,
}

struct MockViewabilitySession {
    probe: Arc<Mutex<SessionProbe>>,
}

impl ViewabilitySession for MockViewabilitySession {
    fn start_deferred(&mut self, activity: &ForegroundActivity) {
        let mut probe = self.probe.lock().expect("session probe");
        if probe.state == ViewabilitySessionState::Created {
            probe.state = ViewabilitySessionState::Started;
            probe.started_for = Some(activity.activity_id().to_string());
        }
    }

    fn end(&mut self) {
        let mut probe = self.probe.lock().expect("session probe");
        probe.state = ViewabilitySessionState::Ended;
        probe.end_calls += 1;
    }

    fn state(&self) -> ViewabilitySessionState {
        self.probe.lock().expect("session probe").state
    }
}

/// Observable state of the mock viewability provider.
#[derive(Debug, Default)]
pub struct ViewabilityProbe {
    pub sessions_created: usize,
    pub last_deferred: Option<bool>,
    pub sessions: Vec<Arc<Mutex<SessionProbe>>>,
}

impl ViewabilityProbe {
    pub fn last_session(&self) -> Option<Arc<Mutex<SessionProbe>>> {
        self.sessions.last().cloned()
    }
}

/// Mock viewability provider.
pub struct MockViewabilityProvider {
    probe: Arc<Mutex<ViewabilityProbe>>,
}

impl MockViewabilityProvider {
    pub fn new() -> Self {
        Self {
            probe: Arc::new(Mutex::new(ViewabilityProbe::default())),
        }
    }

    pub fn probe(&self) -> Arc<Mutex<ViewabilityProbe>> {
        Arc::clone(&self.probe)
    }
}

impl Default for MockViewabilityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewabilityProvider for MockViewabilityProvider {
    fn create_session(
        &mut self,
        _context: &ExecutionContext,
        _surface: &dyn RenderSurface,
        deferred: bool,
    ) -> Box<dyn ViewabilitySession> {
        let session_probe = Arc::new(Mutex::new(SessionProbe {
            state: if deferred {
                ViewabilitySessionState::Created
            } else {
                ViewabilitySessionState::Started
            },
            started_for: None,
            end_calls: 0,
        }));

        let mut probe = self.probe.lock().expect("viewability probe");
        probe.sessions_created += 1;
        probe.last_deferred = Some(deferred);
        probe.sessions.push(Arc::clone(&session_probe));

        Box::new(MockViewabilitySession {
            probe: session_probe,
        })
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// A single recorded listener delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerCall {
    Loaded,
    Failed(BannerErrorKind),
    Expanded,
    Collapsed,
    Clicked,
    PauseAutoRefresh,
    ResumeAutoRefresh,
}

/// Listener implementing the full internal contract, recording every call.
#[derive(Default)]
pub struct RecordingListener {
    calls: Mutex<Vec<ListenerCall>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<ListenerCall> {
        self.calls.lock().expect("listener calls").clone()
    }

    fn record(&self, call: ListenerCall) {
        self.calls.lock().expect("listener calls").push(call);
    }
}

impl BannerListener for RecordingListener {
    fn on_loaded(&self, _surface: &dyn RenderSurface) {
        self.record(ListenerCall::Loaded);
    }

    fn on_failed(&self, kind: BannerErrorKind) {
        self.record(ListenerCall::Failed(kind));
    }

    fn on_expanded(&self) {
        self.record(ListenerCall::Expanded);
    }

    fn on_collapsed(&self) {
        self.record(ListenerCall::Collapsed);
    }

    fn on_clicked(&self) {
        self.record(ListenerCall::Clicked);
    }

    fn as_internal(&self) -> Option<&dyn InternalBannerListener> {
        Some(self)
    }
}

impl InternalBannerListener for RecordingListener {
    fn on_pause_auto_refresh(&self) {
        self.record(ListenerCall::PauseAutoRefresh);
    }

    fn on_resume_auto_refresh(&self) {
        self.record(ListenerCall::ResumeAutoRefresh);
    }
}

/// Listener implementing only the base contract; the load boundary must
/// reject it.
#[derive(Default)]
pub struct BaseOnlyListener {
    failures: Mutex<Vec<BannerErrorKind>>,
}

impl BaseOnlyListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failures(&self) -> Vec<BannerErrorKind> {
        self.failures.lock().expect("listener failures").clone()
    }
}

impl BannerListener for BaseOnlyListener {
    fn on_loaded(&self, _surface: &dyn RenderSurface) {}

    fn on_failed(&self, kind: BannerErrorKind) {
        self.failures.lock().expect("listener failures").push(kind);
    }

    fn on_expanded(&self) {}

    fn on_collapsed(&self) {}

    fn on_clicked(&self) {}
}

/// Debug listener recording console output.
#[derive(Default)]
pub struct RecordingDebugListener {
    messages: Mutex<Vec<String>>,
}

impl RecordingDebugListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("debug messages").clone()
    }
}

impl SurfaceDebugListener for RecordingDebugListener {
    fn on_console_message(&self, message: &str) {
        self.messages
            .lock()
            .expect("debug messages")
            .push(message.to_string());
    }
}
