//! Shared mock controller for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use sortable_lattice::{
    BackendError, Configuration, ControllerEvent, ControllerHandle, OptionValue, ReorderEvent,
    SortableBackend,
};
use sortable_lattice_core::Signal;

/// Install a test subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A host element, identified by name.
pub type Element = &'static str;

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Create(u64, Element),
    Set(u64, String, OptionValue),
    Remove(u64, String),
    Destroy(u64),
}

/// Records every call the binding layer makes on its controllers.
#[derive(Clone, Default)]
pub struct MockBackend {
    ops: Arc<Mutex<Vec<Op>>>,
    next: Arc<AtomicU64>,
    live: Arc<Mutex<Vec<u64>>>,
    /// Signals of live handles, so tests can play the controller's part.
    signals: Arc<Mutex<Vec<(u64, Arc<Signal<ReorderEvent>>, Arc<Mutex<Configuration>>)>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().clone()
    }

    pub fn clear(&self) {
        self.ops.lock().clear();
    }

    pub fn live(&self) -> Vec<u64> {
        self.live.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.ops.lock().iter().filter(|op| pred(op)).count()
    }

    /// Options the live handle `id` currently holds.
    pub fn options_of(&self, id: u64) -> Option<Configuration> {
        self.signals
            .lock()
            .iter()
            .find(|(h, _, _)| *h == id)
            .map(|(_, _, options)| options.lock().clone())
    }

    /// Act as the controller of handle `id`: invoke the matching option
    /// callback, then notify listeners.
    pub fn gesture(&self, id: u64, event: ReorderEvent) {
        let found = self
            .signals
            .lock()
            .iter()
            .find(|(h, _, _)| *h == id)
            .map(|(_, signal, options)| (signal.clone(), options.clone()));
        let Some((signal, options)) = found else {
            panic!("no live controller {id}");
        };
        let callback = options.lock().get(event.callback_name()).cloned();
        if let Some(OptionValue::Callback(callback)) = callback {
            callback.call(&ControllerEvent::from(&event));
        }
        signal.emit(event);
    }
}

impl SortableBackend for MockBackend {
    type Element = Element;
    type Handle = MockHandle;

    fn create(&self, element: &Element, options: &Configuration) -> Result<MockHandle, BackendError> {
        let id = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        self.ops.lock().push(Op::Create(id, element));
        self.live.lock().push(id);

        let reordered = Arc::new(Signal::new());
        let options = Arc::new(Mutex::new(options.clone()));
        self.signals
            .lock()
            .push((id, reordered.clone(), options.clone()));
        Ok(MockHandle {
            id,
            backend: self.clone(),
            reordered,
            options,
        })
    }
}

pub struct MockHandle {
    pub id: u64,
    backend: MockBackend,
    reordered: Arc<Signal<ReorderEvent>>,
    options: Arc<Mutex<Configuration>>,
}

impl ControllerHandle for MockHandle {
    fn set_option(&mut self, name: &str, value: OptionValue) {
        self.backend
            .ops
            .lock()
            .push(Op::Set(self.id, name.to_string(), value.clone()));
        self.options.lock().set(name, value);
    }

    fn remove_option(&mut self, name: &str) {
        self.backend
            .ops
            .lock()
            .push(Op::Remove(self.id, name.to_string()));
        self.options.lock().remove(name);
    }

    fn reordered(&self) -> &Signal<ReorderEvent> {
        &self.reordered
    }

    fn destroy(self) {
        assert_eq!(
            self.reordered.connection_count(),
            0,
            "listeners must be gone before destroy"
        );
        self.backend.ops.lock().push(Op::Destroy(self.id));
        self.backend.live.lock().retain(|id| *id != self.id);
        self.backend.signals.lock().retain(|(id, _, _)| *id != self.id);
    }
}
