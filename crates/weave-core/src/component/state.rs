use std::fmt;

/// Lifecycle state of a registered component.
///
/// `Created → Configured → Initialized → Running → Stopped`, with any state
/// allowed to fall into `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentState {
    Created,
    Configured,
    Initialized,
    Running,
    Stopped,
    Failed,
}

impl ComponentState {
    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: ComponentState) -> bool {
        use ComponentState::*;
        match (self, next) {
            (_, Failed) => true,
            (Created, Configured) => true,
            // Repeated configuration before init
            (Configured, Configured) => true,
            (Configured, Initialized) => true,
            (Initialized, Running) => true,
            (Initialized, Stopped) => true,
            (Running, Stopped) => true,
            _ => false,
        }
    }

    /// `init` has already happened (whether or not `run` followed).
    pub fn is_initialized(self) -> bool {
        matches!(self, ComponentState::Initialized | ComponentState::Running)
    }

    /// Configuration may still be extended.
    pub fn accepts_config(self) -> bool {
        matches!(self, ComponentState::Created | ComponentState::Configured)
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ComponentState::Created => "created",
            ComponentState::Configured => "configured",
            ComponentState::Initialized => "initialized",
            ComponentState::Running => "running",
            ComponentState::Stopped => "stopped",
            ComponentState::Failed => "failed",
        };
        f.write_str(label)
    }
}
