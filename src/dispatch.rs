//! Notification dispatcher
//!
//! Consumers register callbacks that receive every fired trigger. Each callback
//! runs in isolation: an error return or a panic is logged and the remaining
//! callbacks still run. Suppressed triggers never reach this module.

use crate::catalog::TriggerDefinition;
use crate::types::TriggerData;
use std::panic::{self, AssertUnwindSafe};
use uuid::Uuid;

/// Handle returned by [`Dispatcher::on_trigger`]
pub type CallbackId = Uuid;

/// What a callback may report back
pub type CallbackResult = Result<(), Box<dyn std::error::Error>>;

type Callback = Box<dyn FnMut(&TriggerDefinition, &TriggerData) -> CallbackResult>;

/// Summary of one dispatch round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct Dispatcher {
    callbacks: Vec<(CallbackId, Callback)>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a consumer for every fired trigger
    pub fn on_trigger<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&TriggerDefinition, &TriggerData) -> CallbackResult + 'static,
    {
        let id = Uuid::new_v4();
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Unregister a consumer; returns whether it was registered
    pub fn remove_callback(&mut self, id: CallbackId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(cb_id, _)| *cb_id != id);
        self.callbacks.len() != before
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Deliver a fired trigger to every registered callback
    pub fn dispatch(&mut self, trigger: &TriggerDefinition, data: &TriggerData) -> DispatchReport {
        let mut report = DispatchReport::default();

        for (id, callback) in self.callbacks.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(trigger, data)));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    tracing::warn!(callback = %id, trigger = %trigger.id, "trigger callback failed: {err}");
                }
                Err(_) => {
                    report.failed += 1;
                    tracing::warn!(callback = %id, trigger = %trigger.id, "trigger callback panicked");
                }
            }
        }

        report
    }
}
