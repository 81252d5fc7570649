//! A recording controller backend for unit tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sortable_lattice_core::Signal;

use crate::controller::{ControllerEvent, ControllerHandle, ReorderEvent, SortableBackend};
use crate::error::BackendError;
use crate::options::{Configuration, OptionValue};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Create { handle: u64, element: u32 },
    Set { handle: u64, name: String, value: OptionValue },
    Remove { handle: u64, name: String },
    Destroy { handle: u64 },
}

#[derive(Default)]
struct Shared {
    log: Mutex<Vec<Call>>,
    next_id: AtomicU64,
    fail_next: AtomicBool,
}

#[derive(Clone, Default)]
pub(crate) struct RecordingBackend {
    shared: Arc<Shared>,
}

impl RecordingBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.shared.log.lock().clone()
    }

    pub(crate) fn clear_log(&self) {
        self.shared.log.lock().clear();
    }

    pub(crate) fn fail_next_create(&self) {
        self.shared.fail_next.store(true, Ordering::SeqCst);
    }

    pub(crate) fn creates(&self) -> usize {
        self.count(|c| matches!(c, Call::Create { .. }))
    }

    pub(crate) fn destroys(&self) -> usize {
        self.count(|c| matches!(c, Call::Destroy { .. }))
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.shared.log.lock().iter().filter(|c| pred(c)).count()
    }
}

impl SortableBackend for RecordingBackend {
    type Element = u32;
    type Handle = RecordingHandle;

    fn create(&self, element: &u32, options: &Configuration) -> Result<RecordingHandle, BackendError> {
        if self.shared.fail_next.swap(false, Ordering::SeqCst) {
            return Err(BackendError::new("element rejected"));
        }
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.log.lock().push(Call::Create {
            handle: id,
            element: *element,
        });
        Ok(RecordingHandle {
            id,
            element: *element,
            options: options.clone(),
            reordered: Signal::new(),
            shared: self.shared.clone(),
        })
    }
}

pub(crate) struct RecordingHandle {
    pub(crate) id: u64,
    pub(crate) element: u32,
    pub(crate) options: Configuration,
    reordered: Signal<ReorderEvent>,
    shared: Arc<Shared>,
}

impl RecordingHandle {
    /// Simulate a gesture: invoke the option callback, then notify listeners.
    pub(crate) fn fire(&self, event: ReorderEvent) {
        if let Some(OptionValue::Callback(callback)) = self.options.get(event.callback_name()) {
            callback.call(&ControllerEvent::from(&event));
        }
        self.reordered.emit(event);
    }
}

impl ControllerHandle for RecordingHandle {
    fn set_option(&mut self, name: &str, value: OptionValue) {
        self.shared.log.lock().push(Call::Set {
            handle: self.id,
            name: name.to_string(),
            value: value.clone(),
        });
        self.options.set(name, value);
    }

    fn remove_option(&mut self, name: &str) {
        self.shared.log.lock().push(Call::Remove {
            handle: self.id,
            name: name.to_string(),
        });
        self.options.remove(name);
    }

    fn reordered(&self) -> &Signal<ReorderEvent> {
        &self.reordered
    }

    fn destroy(self) {
        self.reordered.disconnect_all();
        self.shared.log.lock().push(Call::Destroy { handle: self.id });
    }
}
