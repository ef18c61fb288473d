use super::quota::GenerationGate;
use super::storage::{Persisted, StateStorage};
use crate::error::AppResult;
use crate::models::{Destination, NavigationStack};

/// Broadcast to observers after the stack changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationEvent {
    Pushed(Destination),
    Popped(Destination),
    Reset,
    /// A gated destination was requested with no allowance left
    QuotaExceeded { requested: Destination },
}

/// What `navigate` actually pushed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    Pushed(Destination),
    Redirected { requested: Destination },
}

impl NavigationOutcome {
    pub fn destination(self) -> Destination {
        match self {
            NavigationOutcome::Pushed(destination) => destination,
            NavigationOutcome::Redirected { .. } => Destination::UpgradeRequired,
        }
    }

    pub fn is_redirected(self) -> bool {
        matches!(self, NavigationOutcome::Redirected { .. })
    }
}

type Listener = Box<dyn Fn(&NavigationEvent) + Send + Sync>;

/// Destination stack with quota-gated entry
pub struct NavigationController {
    stack: NavigationStack,
    storage: StateStorage,
    listeners: Vec<Listener>,
}

impl NavigationController {
    /// Restore the persisted stack, or start at the dashboard
    pub fn load(storage: StateStorage) -> Self {
        let stack = storage.load_navigation_stack().unwrap_or_default();
        tracing::debug!("Navigation restored at {}", stack.current());
        Self {
            stack,
            storage,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&NavigationEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Push `destination`, or `UpgradeRequired` in its place when the gate is closed.
    ///
    /// The stack always grows by exactly one.
    pub fn navigate(
        &mut self,
        destination: Destination,
        gate: &mut dyn GenerationGate,
    ) -> Persisted<NavigationOutcome> {
        let outcome = if destination.is_quota_gated() && !gate.can_generate() {
            tracing::info!("Quota exhausted, redirecting {} to upgrade", destination);
            NavigationOutcome::Redirected {
                requested: destination,
            }
        } else {
            NavigationOutcome::Pushed(destination)
        };

        let pushed = outcome.destination();
        self.stack.push(pushed);
        let saved = self.save();

        if let NavigationOutcome::Redirected { requested } = outcome {
            self.emit(NavigationEvent::QuotaExceeded { requested });
        }
        self.emit(NavigationEvent::Pushed(pushed));
        Persisted::new(outcome, saved)
    }

    /// Pop the visible destination. At the root this does nothing.
    pub fn back(&mut self) -> Persisted<Option<Destination>> {
        let Some(popped) = self.stack.pop() else {
            return Persisted::new(None, Ok(()));
        };
        let saved = self.save();
        self.emit(NavigationEvent::Popped(popped));
        Persisted::new(Some(popped), saved)
    }

    pub fn reset(&mut self) -> Persisted<()> {
        self.stack.reset();
        let saved = self.save();
        self.emit(NavigationEvent::Reset);
        Persisted::new((), saved)
    }

    pub fn current(&self) -> Destination {
        self.stack.current()
    }

    pub fn history(&self, limit: usize) -> Vec<Destination> {
        self.stack.history(limit)
    }

    pub fn stack(&self) -> &NavigationStack {
        &self.stack
    }

    fn save(&self) -> AppResult<()> {
        let saved = self.storage.save_navigation_stack(self.stack.entries());
        if let Err(e) = &saved {
            tracing::warn!("Failed to persist navigation stack: {}", e);
        }
        saved
    }

    fn emit(&self, event: NavigationEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }
}
