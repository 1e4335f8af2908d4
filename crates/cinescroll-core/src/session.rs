//! Handles given out by the [`Coordinator`](crate::Coordinator)
//!
//! Every handle holds a weak reference to the coordinator's shared state and
//! turns into a no-op once that state is gone or the lifetime it was created
//! in has been destroyed.

use std::sync::{Arc, Weak};

use serde::Serialize;

use crate::config::Config;
use crate::coordinator::{Active, LifecycleState, Phase, Shared};
use crate::host::{Host, ScrollPosition};
use crate::smooth::SmoothScroll;
use crate::triggers::{TriggerId, TriggerKind, TriggerState};
use crate::zones::ZoneId;

/// Outcome of an initialization
#[derive(Debug, Clone)]
pub struct Session {
    /// The smooth-scroll engine, absent when disabled, under reduced motion
    /// or after a failed initialization
    pub engine: Option<EngineHandle>,
    pub is_initialized: bool,
    fully_active: bool,
    config: Option<Arc<Config>>,
}

impl Session {
    pub(crate) fn inactive() -> Self {
        Self {
            engine: None,
            is_initialized: false,
            fully_active: false,
            config: None,
        }
    }

    pub(crate) fn ready(shared: &Arc<Shared>, active: &Active) -> Self {
        let config = &active.config;
        let smooth_ok = active.smooth.is_some() || !config.smooth_scroll;
        let triggers_ok = active.triggers.is_some() || !config.enable_scroll_trigger;
        Self {
            engine: active.smooth.as_ref().map(|_| EngineHandle {
                shared: Arc::downgrade(shared),
                epoch: active.epoch,
            }),
            is_initialized: true,
            fully_active: smooth_ok && triggers_ok && !config.motion_reduced(),
            config: Some(config.clone()),
        }
    }

    /// Every requested engine is running with full motion
    pub fn is_fully_active(&self) -> bool {
        self.fully_active
    }

    /// Resolved configuration of this session
    pub fn config(&self) -> Option<&Config> {
        self.config.as_deref()
    }
}

/// Control surface of the smooth-scroll engine of one lifetime
#[derive(Debug, Clone)]
pub struct EngineHandle {
    shared: Weak<Shared>,
    epoch: u64,
}

impl EngineHandle {
    fn with_active<R>(&self, f: impl FnOnce(&mut Active, &dyn Host) -> R) -> Option<R> {
        let shared = self.shared.upgrade()?;
        let mut inner = shared.lock();
        let Phase::Ready(active) = &mut inner.phase else {
            return None;
        };
        if active.epoch != self.epoch {
            return None;
        }
        Some(f(active, shared.host.as_ref()))
    }

    fn with_engine<R>(&self, f: impl FnOnce(&mut SmoothScroll, &dyn Host) -> R) -> Option<R> {
        self.with_active(|active, host| active.smooth.as_mut().map(|s| f(s, host)))
            .flatten()
    }

    /// Whether the engine this handle points at is still alive
    pub fn is_live(&self) -> bool {
        self.with_engine(|_, _| ()).is_some()
    }

    pub fn position(&self) -> Option<ScrollPosition> {
        self.with_engine(|engine, _| engine.position())
    }

    pub fn is_scrolling(&self) -> bool {
        self.with_engine(|engine, _| engine.is_scrolling())
            .unwrap_or(false)
    }

    /// Scroll programmatically; an immediate jump updates triggers at once
    pub fn scroll_to(&self, target: ScrollPosition, immediate: bool) -> bool {
        self.with_active(|active, host| {
            let Some(engine) = active.smooth.as_mut() else {
                return false;
            };
            engine.scroll_to(target, immediate, host);
            if immediate {
                let y = engine.position().y;
                if let Some(triggers) = active.triggers.as_mut() {
                    triggers.update(y, host);
                }
            }
            true
        })
        .unwrap_or(false)
    }

    pub fn stop(&self) {
        self.with_engine(|engine, _| engine.stop());
    }

    pub fn start(&self) {
        self.with_engine(|engine, _| engine.start());
    }

    /// Pump one frame of this lifetime
    pub fn tick(&self, timestamp_ms: f64) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.frame(Some(self.epoch), timestamp_ms))
    }
}

/// Registration of one animation trigger
///
/// Dropping the handle keeps the trigger alive; call
/// [`TriggerHandle::dispose`] to kill it.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    shared: Weak<Shared>,
    id: TriggerId,
    kind: TriggerKind,
}

impl TriggerHandle {
    pub(crate) fn new(shared: &Arc<Shared>, id: TriggerId, kind: TriggerKind) -> Self {
        Self {
            shared: Arc::downgrade(shared),
            id,
            kind,
        }
    }

    pub fn id(&self) -> TriggerId {
        self.id
    }

    pub fn kind(&self) -> TriggerKind {
        self.kind
    }

    /// Current state, `None` once disposed, destroyed or still queued
    pub fn state(&self) -> Option<TriggerState> {
        let shared = self.shared.upgrade()?;
        let inner = shared.lock();
        match &inner.phase {
            Phase::Ready(active) => active.triggers.as_ref()?.state(self.id),
            _ => None,
        }
    }

    /// Halt any in-flight tween and unregister; returns whether the trigger
    /// was still registered
    pub fn dispose(&self) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let host = shared.host.as_ref();
        let mut guard = shared.lock();
        let inner = &mut *guard;

        let queued = inner.pending_triggers.len();
        inner.pending_triggers.retain(|(id, _, _)| *id != self.id);
        if inner.pending_triggers.len() != queued {
            return true;
        }
        match &mut inner.phase {
            Phase::Ready(active) => active
                .triggers
                .as_mut()
                .is_some_and(|triggers| triggers.remove(self.id, host)),
            _ => false,
        }
    }
}

/// Registration of one nested scroll zone
#[derive(Debug, Clone)]
pub struct ZoneHandle {
    shared: Weak<Shared>,
    id: ZoneId,
}

impl ZoneHandle {
    pub(crate) fn new(shared: &Arc<Shared>, id: ZoneId) -> Self {
        Self {
            shared: Arc::downgrade(shared),
            id,
        }
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    /// Restore smooth scrolling inside the zone's element
    pub fn unregister(&self) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let removed = shared.lock().zones.unregister(self.id);
        removed
    }
}

/// Live counts, used to check that teardown leaves nothing behind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub state: LifecycleState,
    pub smooth_engines: usize,
    pub trigger_engines: usize,
    pub frame_loops: usize,
    /// Registered plus queued triggers
    pub triggers: usize,
    pub zones: usize,
}
