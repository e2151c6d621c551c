//! Exactly-once readiness signalling.
//!
//! Most components report readiness simply by returning from
//! [`Component::run`](crate::component::Component::run). A component whose
//! readiness is decided elsewhere (a spawned accept loop, a child process that
//! prints a banner) hands a [`Completion`] to that code and awaits the paired
//! [`CompletionWaiter`] from `run`.
//!
//! Only the first `complete` call is honoured; later calls are logged and
//! ignored. If every `Completion` clone is dropped without completing, the
//! waiter resolves to [`ComponentError::CompletionDropped`].
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::component::error::ComponentError;
use crate::kernel::error::Result;
use crate::utils::lock;

#[derive(Clone, Debug)]
pub struct Completion {
    component: Arc<str>,
    sender: Arc<Mutex<Option<oneshot::Sender<Result<()>>>>>,
}

#[derive(Debug)]
pub struct CompletionWaiter {
    component: Arc<str>,
    receiver: oneshot::Receiver<Result<()>>,
}

impl Completion {
    /// Create a readiness signal for `component` and the waiter observing it.
    pub fn new(component: &str) -> (Completion, CompletionWaiter) {
        let (sender, receiver) = oneshot::channel();
        let component: Arc<str> = Arc::from(component);
        (
            Completion {
                component: component.clone(),
                sender: Arc::new(Mutex::new(Some(sender))),
            },
            CompletionWaiter {
                component,
                receiver,
            },
        )
    }

    /// Report the outcome. Returns `true` if this call was the one accepted.
    pub fn complete(&self, result: Result<()>) -> bool {
        let sender = lock(&self.sender).take();
        match sender {
            Some(sender) => {
                if sender.send(result).is_err() {
                    log::debug!(
                        "Readiness of '{}' reported after its waiter was dropped",
                        self.component
                    );
                }
                true
            }
            None => {
                log::warn!(
                    "Component '{}' completed its readiness signal more than once; ignoring ({})",
                    self.component,
                    match &result {
                        Ok(()) => "success".to_string(),
                        Err(e) => e.to_string(),
                    }
                );
                false
            }
        }
    }

    pub fn succeed(&self) -> bool {
        self.complete(Ok(()))
    }

    pub fn fail(&self, error: impl Into<crate::kernel::error::Error>) -> bool {
        self.complete(Err(error.into()))
    }

    pub fn is_completed(&self) -> bool {
        lock(&self.sender).is_none()
    }
}

impl CompletionWaiter {
    /// Wait for the first reported outcome.
    pub async fn wait(self) -> Result<()> {
        match self.receiver.await {
            Ok(result) => result,
            Err(_) => Err(ComponentError::CompletionDropped {
                component: self.component.to_string(),
            }
            .into()),
        }
    }
}
