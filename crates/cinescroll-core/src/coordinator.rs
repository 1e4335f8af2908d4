//! Lifecycle coordinator
//!
//! Single source of truth for whether the scroll system is initialized.
//! Orders construction (smooth-scroll engine, then trigger engine) and
//! teardown (triggers, smooth-scroll engine, zones), and collapses
//! overlapping `initialize` calls onto one in-flight construction.
//!
//! State machine:
//!
//! ```text
//! Uninitialized --initialize--> Initializing --lands--> Ready
//!       ^                            |                    |
//!       +-------- destroy -----------+----- destroy ------+
//! ```
//!
//! Every initialization claims an epoch. `destroy` moves the state back to
//! `Uninitialized`, so a pending initialization that lands afterwards sees
//! its epoch is no longer current and tears down what it built.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{resolve, Config, Options, Orientation};
use crate::host::{Capability, ElementId, Host, ScrollPosition};
use crate::session::{Diagnostics, Session, TriggerHandle, ZoneHandle};
use crate::smooth::{InputDisposition, ScrollInput, SmoothScroll};
use crate::triggers::{
    FadeInOptions, LinkedValueOptions, ParallaxOptions, TriggerEngine, TriggerId, TriggerSpec,
};
use crate::zones::ZoneRegistry;
use crate::Result;

/// Public view of the orchestration state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Engines and settings of one initialized lifetime
#[derive(Debug)]
pub(crate) struct Active {
    pub(crate) epoch: u64,
    pub(crate) config: Arc<Config>,
    pub(crate) smooth: Option<SmoothScroll>,
    pub(crate) triggers: Option<TriggerEngine>,
    frame_loop: Option<JoinHandle<()>>,
}

impl Active {
    /// One frame: smooth-scroll first, then feed its position to the triggers
    pub(crate) fn frame(&mut self, now_ms: f64, host: &dyn Host) {
        if let Some(smooth) = self.smooth.as_mut() {
            if let Some(position) = smooth.tick(now_ms, host) {
                if let Some(triggers) = self.triggers.as_mut() {
                    triggers.update(position.y, host);
                }
            }
        }
        if let Some(triggers) = self.triggers.as_mut() {
            triggers.tick(now_ms, host);
        }
    }

    /// Triggers first, then the frame loop and smooth-scroll engine
    fn teardown(&mut self, host: &dyn Host) {
        if let Some(mut triggers) = self.triggers.take() {
            triggers.destroy(host);
        }
        if let Some(frame_loop) = self.frame_loop.take() {
            frame_loop.abort();
        }
        if let Some(mut smooth) = self.smooth.take() {
            smooth.destroy(host);
        }
    }
}

#[derive(Debug)]
pub(crate) enum Phase {
    Uninitialized,
    Initializing {
        epoch: u64,
        config: Arc<Config>,
        done: watch::Receiver<Option<Session>>,
    },
    Ready(Box<Active>),
}

#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) phase: Phase,
    /// Latest claimed epoch; bumped by every initialize/transition
    epoch: u64,
    pub(crate) zones: ZoneRegistry,
    /// Triggers registered while initializing, applied once ready
    pub(crate) pending_triggers: Vec<(TriggerId, ElementId, TriggerSpec)>,
    next_trigger: u64,
}

impl Inner {
    fn is_initializing(&self, epoch: u64) -> bool {
        matches!(self.phase, Phase::Initializing { epoch: e, .. } if e == epoch)
    }

    pub(crate) fn state(&self) -> LifecycleState {
        match self.phase {
            Phase::Uninitialized => LifecycleState::Uninitialized,
            Phase::Initializing { .. } => LifecycleState::Initializing,
            Phase::Ready(_) => LifecycleState::Ready,
        }
    }

    fn clear_registrations(&mut self) {
        self.pending_triggers.clear();
        self.zones.clear();
    }

    /// Tear everything down; returns false when there was nothing to do
    fn teardown(&mut self, host: &dyn Host) -> bool {
        match std::mem::replace(&mut self.phase, Phase::Uninitialized) {
            Phase::Uninitialized => return false,
            Phase::Initializing { epoch, .. } => {
                info!(epoch, "Destroy during initialization, pending engines will be discarded");
            }
            Phase::Ready(mut active) => {
                active.teardown(host);
                info!(epoch = active.epoch, "Scroll system destroyed");
            }
        }
        self.clear_registrations();
        true
    }
}

/// State shared between the coordinator and every handle it gives out
pub(crate) struct Shared {
    pub(crate) host: Arc<dyn Host>,
    state: Mutex<Inner>,
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared").finish_non_exhaustive()
    }
}

impl Shared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one frame if the given lifetime (or any, for `None`) is ready
    pub(crate) fn frame(&self, epoch: Option<u64>, now_ms: f64) -> bool {
        let mut inner = self.lock();
        let Phase::Ready(active) = &mut inner.phase else {
            return false;
        };
        if epoch.is_some_and(|e| e != active.epoch) {
            return false;
        }
        active.frame(now_ms, self.host.as_ref());
        true
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let host = &*self.host;
        let inner = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        inner.teardown(host);
    }
}

/// What an `initialize` call gets to do
enum Claim {
    Existing(Session),
    Follow(watch::Receiver<Option<Session>>),
    Lead {
        epoch: u64,
        tx: watch::Sender<Option<Session>>,
        config: Arc<Config>,
    },
}

/// Engines built by a pending initialization that has not landed yet
///
/// Dropping it before landing (the caller's future was cancelled) tears the
/// engines down and rolls the state back to `Uninitialized`.
struct PendingInit {
    shared: Arc<Shared>,
    epoch: u64,
    smooth: Option<SmoothScroll>,
    triggers: Option<TriggerEngine>,
    landed: bool,
}

impl PendingInit {
    fn new(shared: Arc<Shared>, epoch: u64) -> Self {
        Self {
            shared,
            epoch,
            smooth: None,
            triggers: None,
            landed: false,
        }
    }

    /// Load capabilities and construct the engines in order
    async fn build(&mut self, config: &Config) -> Result<()> {
        let host = self.shared.host.clone();
        if config.smooth_scroll_active() {
            host.load_capability(Capability::SmoothScroll).await?;
            self.smooth = Some(SmoothScroll::new(config, host.as_ref()));
        }
        if config.scroll_trigger_active() {
            host.load_capability(Capability::ScrollTrigger).await?;
            self.triggers = Some(TriggerEngine::new(config, host.as_ref()));
        }
        Ok(())
    }

    fn discard(&mut self, host: &dyn Host) {
        if let Some(mut triggers) = self.triggers.take() {
            triggers.destroy(host);
        }
        if let Some(mut smooth) = self.smooth.take() {
            smooth.destroy(host);
        }
    }
}

impl Drop for PendingInit {
    fn drop(&mut self) {
        if self.landed {
            return;
        }
        let shared = self.shared.clone();
        self.discard(shared.host.as_ref());
        let mut inner = shared.lock();
        if inner.is_initializing(self.epoch) {
            warn!(epoch = self.epoch, "Initialization cancelled before completion");
            inner.phase = Phase::Uninitialized;
            inner.clear_registrations();
        }
    }
}

/// Orchestrates the smooth-scroll engine, the trigger engine and the
/// nested zones for one host
///
/// Cheap to clone; all clones share one orchestration state. Owned by the
/// composition root of the host application and passed to whatever needs it.
#[derive(Debug, Clone)]
pub struct Coordinator {
    shared: Arc<Shared>,
}

impl Coordinator {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            shared: Arc::new(Shared {
                host,
                state: Mutex::new(Inner {
                    phase: Phase::Uninitialized,
                    epoch: 0,
                    zones: ZoneRegistry::new(),
                    pending_triggers: Vec::new(),
                    next_trigger: 0,
                }),
            }),
        }
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.shared.host
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.lock().state()
    }

    /// Initialize the scroll system
    ///
    /// While another initialization is in flight, waits for it and returns
    /// its session; when already ready, returns the existing session. Never
    /// fails: construction problems yield `is_initialized: false`.
    pub async fn initialize(&self, options: Options) -> Session {
        let (epoch, tx, config) = match self.claim(&options) {
            Claim::Existing(session) => return session,
            Claim::Follow(done) => return wait_for_session(done).await,
            Claim::Lead { epoch, tx, config } => (epoch, tx, config),
        };

        let mut pending = PendingInit::new(self.shared.clone(), epoch);
        let outcome = pending.build(&config).await;
        let session = self.land(&mut pending, config, outcome);
        tx.send_replace(Some(session.clone()));
        session
    }

    fn claim(&self, options: &Options) -> Claim {
        let mut inner = self.shared.lock();
        match &inner.phase {
            Phase::Ready(active) => {
                debug!("Already initialized, reusing session");
                return Claim::Existing(Session::ready(&self.shared, active));
            }
            Phase::Initializing { done, .. } => {
                debug!("Initialization in flight, waiting for it");
                return Claim::Follow(done.clone());
            }
            Phase::Uninitialized => {}
        }

        let config = Arc::new(resolve(options, self.shared.host.as_ref()));
        inner.epoch += 1;
        let epoch = inner.epoch;
        let (tx, rx) = watch::channel(None);
        inner.phase = Phase::Initializing {
            epoch,
            config: config.clone(),
            done: rx,
        };
        info!(
            epoch,
            smooth_scroll = config.smooth_scroll_active(),
            scroll_trigger = config.scroll_trigger_active(),
            reduced_motion = config.motion_reduced(),
            "Initializing scroll system"
        );
        Claim::Lead { epoch, tx, config }
    }

    fn land(&self, pending: &mut PendingInit, config: Arc<Config>, outcome: Result<()>) -> Session {
        pending.landed = true;
        let host = self.shared.host.as_ref();
        let mut guard = self.shared.lock();
        let inner = &mut *guard;

        if !inner.is_initializing(pending.epoch) {
            pending.discard(host);
            info!(epoch = pending.epoch, "Initialization superseded, engines discarded");
            return Session::inactive();
        }

        if let Err(e) = outcome {
            pending.discard(host);
            warn!(error = %e, "Engine construction failed, continuing without animations");
            inner.phase = Phase::Uninitialized;
            inner.clear_registrations();
            return Session::inactive();
        }

        let mut active = Box::new(Active {
            epoch: pending.epoch,
            config,
            smooth: pending.smooth.take(),
            triggers: pending.triggers.take(),
            frame_loop: None,
        });

        for (id, element, spec) in inner.pending_triggers.drain(..) {
            match active.triggers.as_mut() {
                Some(triggers) => {
                    triggers.add(id, element, spec, host);
                }
                None => debug!(?id, "Scroll triggers disabled, dropping queued trigger"),
            }
        }

        if active.config.smooth.auto_raf {
            active.frame_loop = spawn_frame_loop(
                Arc::downgrade(&self.shared),
                active.epoch,
                active.config.smooth.frame_interval_ms(),
            );
        }

        let session = Session::ready(&self.shared, &active);
        info!(
            epoch = active.epoch,
            fully_active = session.is_fully_active(),
            "Scroll system ready"
        );
        inner.phase = Phase::Ready(active);
        session
    }

    /// Tear everything down and return to `Uninitialized`
    ///
    /// A no-op when nothing is initialized. During initialization the
    /// pending engines are discarded as soon as they land.
    pub fn destroy(&self) {
        let host = self.shared.host.as_ref();
        if !self.shared.lock().teardown(host) {
            debug!("Destroy requested while uninitialized, nothing to do");
        }
    }

    /// Route-change re-initialization as one step
    ///
    /// New engines are built while the old ones keep running, then swapped
    /// in under a single lock. Falls back to `destroy` + `initialize` when
    /// the system is not ready.
    pub async fn transition(&self, options: Options) -> Session {
        let claimed = {
            let mut inner = self.shared.lock();
            if matches!(inner.phase, Phase::Ready(_)) {
                inner.epoch += 1;
                let config = Arc::new(resolve(&options, self.shared.host.as_ref()));
                Some((inner.epoch, config))
            } else {
                None
            }
        };
        let Some((epoch, config)) = claimed else {
            self.destroy();
            return self.initialize(options).await;
        };
        info!(epoch, "Transitioning scroll system");

        let mut pending = PendingInit::new(self.shared.clone(), epoch);
        let outcome = pending.build(&config).await;
        pending.landed = true;

        let host = self.shared.host.as_ref();
        let mut guard = self.shared.lock();
        let inner = &mut *guard;

        let current = inner.epoch == epoch && matches!(inner.phase, Phase::Ready(_));
        if !current || outcome.is_err() {
            pending.discard(host);
            if let Err(e) = outcome {
                warn!(error = %e, "Transition failed, keeping current engines");
            } else {
                info!(epoch, "Transition superseded, engines discarded");
            }
            return match &inner.phase {
                Phase::Ready(active) => Session::ready(&self.shared, active),
                _ => Session::inactive(),
            };
        }

        let mut active = Box::new(Active {
            epoch,
            config,
            smooth: pending.smooth.take(),
            triggers: pending.triggers.take(),
            frame_loop: None,
        });
        if active.config.smooth.auto_raf {
            active.frame_loop = spawn_frame_loop(
                Arc::downgrade(&self.shared),
                epoch,
                active.config.smooth.frame_interval_ms(),
            );
        }

        if let Phase::Ready(mut old) = std::mem::replace(&mut inner.phase, Phase::Ready(active)) {
            old.teardown(host);
        }
        inner.clear_registrations();

        match &inner.phase {
            Phase::Ready(active) => {
                info!(epoch, "Transition complete");
                Session::ready(&self.shared, active)
            }
            _ => Session::inactive(),
        }
    }

    /// Recompute trigger boundaries and scroll limits after layout changes
    ///
    /// Engine identity and zones are untouched. No-op unless ready.
    pub fn refresh(&self) {
        let host = self.shared.host.as_ref();
        let mut inner = self.shared.lock();
        let Phase::Ready(active) = &mut inner.phase else {
            debug!("Refresh requested while not ready, ignoring");
            return;
        };
        if let Some(smooth) = active.smooth.as_mut() {
            smooth.resize(host);
        }
        if let Some(triggers) = active.triggers.as_mut() {
            triggers.refresh(host);
        }
    }

    /// Current session (inactive unless ready)
    pub fn session(&self) -> Session {
        match &self.shared.lock().phase {
            Phase::Ready(active) => Session::ready(&self.shared, active),
            _ => Session::inactive(),
        }
    }

    /// Pump one frame manually (for `auto_raf = false`)
    ///
    /// Returns false when not ready.
    pub fn tick(&self, timestamp_ms: f64) -> bool {
        self.shared.frame(None, timestamp_ms)
    }

    /// Route a wheel/touch event; the host should suppress default scrolling
    /// when [`InputDisposition::prevents_default`] is true
    pub fn handle_input(&self, input: &ScrollInput) -> InputDisposition {
        let host = self.shared.host.as_ref();
        let mut guard = self.shared.lock();
        let inner = &mut *guard;
        match &mut inner.phase {
            Phase::Ready(active) => match active.smooth.as_mut() {
                Some(smooth) => smooth.handle_input(input, &inner.zones, host),
                None => InputDisposition::NATIVE,
            },
            _ => InputDisposition::NATIVE,
        }
    }

    /// The document scrolled natively (scrollbar drag, keyboard, no smooth
    /// engine): resync the engine and update every trigger
    pub fn handle_native_scroll(&self, position: ScrollPosition) {
        let host = self.shared.host.as_ref();
        let mut inner = self.shared.lock();
        let Phase::Ready(active) = &mut inner.phase else {
            return;
        };
        if let Some(smooth) = active.smooth.as_mut() {
            smooth.sync_native(position);
        }
        if let Some(triggers) = active.triggers.as_mut() {
            triggers.update(position.y, host);
        }
    }

    /// Keep native scrolling on `directions` inside `element`
    ///
    /// Returns `None` while uninitialized. Zones registered during
    /// initialization take effect once ready.
    pub fn register_zone(&self, element: ElementId, directions: Orientation) -> Option<ZoneHandle> {
        let mut inner = self.shared.lock();
        if matches!(inner.phase, Phase::Uninitialized) {
            debug!(?element, "Zone registration ignored while uninitialized");
            return None;
        }
        let id = inner.zones.register(element, directions);
        debug!(?id, ?element, ?directions, "Nested zone registered");
        Some(ZoneHandle::new(&self.shared, id))
    }

    /// Translate `element` proportionally to scroll progress
    pub fn parallax(&self, element: ElementId, options: ParallaxOptions) -> Option<TriggerHandle> {
        self.add_trigger(element, TriggerSpec::Parallax(options))
    }

    /// Fade and raise `element` when it enters the viewport
    pub fn fade_in(&self, element: ElementId, options: FadeInOptions) -> Option<TriggerHandle> {
        self.add_trigger(element, TriggerSpec::FadeIn(options))
    }

    /// Interpolate a numeric style property with scroll progress
    pub fn linked_value(
        &self,
        element: ElementId,
        options: LinkedValueOptions,
    ) -> Option<TriggerHandle> {
        self.add_trigger(element, TriggerSpec::LinkedValue(options))
    }

    /// Register any trigger spec
    ///
    /// Returns `None` while uninitialized, when scroll triggers are
    /// disabled, or when the trigger's category is switched off.
    pub fn add_trigger(&self, element: ElementId, spec: TriggerSpec) -> Option<TriggerHandle> {
        let host = self.shared.host.as_ref();
        let mut guard = self.shared.lock();
        let inner = &mut *guard;
        let kind = spec.kind();

        match &mut inner.phase {
            Phase::Uninitialized => {
                debug!(?element, ?kind, "Trigger registration ignored while uninitialized");
                None
            }
            Phase::Initializing { config, .. } => {
                if !config.scroll_trigger_active() || !config.performance.allows(kind) {
                    debug!(?element, ?kind, "Trigger category disabled, not queued");
                    return None;
                }
                inner.next_trigger += 1;
                let id = TriggerId(inner.next_trigger);
                inner.pending_triggers.push((id, element, spec));
                debug!(?id, ?kind, "Trigger queued until ready");
                Some(TriggerHandle::new(&self.shared, id, kind))
            }
            Phase::Ready(active) => {
                let triggers = active.triggers.as_mut()?;
                inner.next_trigger += 1;
                let id = TriggerId(inner.next_trigger);
                triggers
                    .add(id, element, spec, host)
                    .then(|| TriggerHandle::new(&self.shared, id, kind))
            }
        }
    }

    /// Counts of live engines, triggers and zones
    pub fn diagnostics(&self) -> Diagnostics {
        let inner = self.shared.lock();
        let (smooth_engines, trigger_engines, frame_loops, triggers) = match &inner.phase {
            Phase::Ready(active) => (
                usize::from(active.smooth.is_some()),
                usize::from(active.triggers.is_some()),
                usize::from(active.frame_loop.as_ref().is_some_and(|h| !h.is_finished())),
                active.triggers.as_ref().map_or(0, TriggerEngine::len),
            ),
            _ => (0, 0, 0, 0),
        };
        Diagnostics {
            state: inner.state(),
            smooth_engines,
            trigger_engines,
            frame_loops,
            triggers: triggers + inner.pending_triggers.len(),
            zones: inner.zones.len(),
        }
    }
}

/// Follow an in-flight initialization to its outcome
async fn wait_for_session(mut done: watch::Receiver<Option<Session>>) -> Session {
    let session = match done.wait_for(Option::is_some).await {
        Ok(session) => (*session).clone(),
        // The initializing call was cancelled
        Err(_) => None,
    };
    session.unwrap_or_else(Session::inactive)
}

/// Self-owned frame loop, stopped by `abort` on teardown
fn spawn_frame_loop(shared: Weak<Shared>, epoch: u64, interval_ms: u64) -> Option<JoinHandle<()>> {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!("No async runtime available, frames must be pumped with tick()");
        return None;
    };
    Some(runtime.spawn(async move {
        let origin = tokio::time::Instant::now();
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let Some(shared) = shared.upgrade() else {
                break;
            };
            let now_ms = origin.elapsed().as_secs_f64() * 1000.0;
            if !shared.frame(Some(epoch), now_ms) {
                break;
            }
        }
        debug!(epoch, "Frame loop stopped");
    }))
}
