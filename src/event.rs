//! # Event Emitter
//!
//! A small observer registry shared by graphs, ports and sockets.
//!
//! Listeners are keyed by an event kind and stored in a single list, so they
//! are invoked in registration order. Emission is synchronous: every matching
//! listener runs before `emit` returns.
//!
//! The listener list is snapshotted before dispatch, which makes the emitter
//! re-entrant. A listener may register further listeners, remove listeners or
//! trigger another emission on the same emitter without tripping a
//! `RefCell` borrow. Listeners registered during a dispatch are not invoked by
//! that dispatch.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Identifies a registered listener so it can be removed later.
pub type ListenerId = u64;

struct Listener<K, F: ?Sized> {
  id: ListenerId,
  event: K,
  once: bool,
  callback: Rc<F>,
}

/// Ordered registry of callbacks keyed by event kind.
///
/// `F` is the (usually unsized) callback type, e.g. `dyn Fn(&Signal, &Socket)`.
pub struct EventEmitter<K, F: ?Sized> {
  next_id: Cell<ListenerId>,
  listeners: RefCell<Vec<Listener<K, F>>>,
}

impl<K, F: ?Sized> Default for EventEmitter<K, F> {
  fn default() -> Self {
    Self {
      next_id: Cell::new(0),
      listeners: RefCell::new(Vec::new()),
    }
  }
}

impl<K: Copy + PartialEq, F: ?Sized> EventEmitter<K, F> {
  /// Creates an emitter without listeners.
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a listener invoked on every emission of `event`.
  pub fn on(&self, event: K, callback: Rc<F>) -> ListenerId {
    self.register(event, callback, false)
  }

  /// Registers a listener removed right before its first invocation.
  pub fn once(&self, event: K, callback: Rc<F>) -> ListenerId {
    self.register(event, callback, true)
  }

  fn register(&self, event: K, callback: Rc<F>, once: bool) -> ListenerId {
    let id = self.next_id.get();
    self.next_id.set(id + 1);
    self.listeners.borrow_mut().push(Listener {
      id,
      event,
      once,
      callback,
    });
    id
  }

  /// Removes a listener. Returns false if it was not registered.
  pub fn remove_listener(&self, id: ListenerId) -> bool {
    let mut listeners = self.listeners.borrow_mut();
    let before = listeners.len();
    listeners.retain(|listener| listener.id != id);
    listeners.len() != before
  }

  /// Drops every listener.
  pub fn remove_all_listeners(&self) {
    self.listeners.borrow_mut().clear();
  }

  /// Number of listeners registered for `event`.
  pub fn listener_count(&self, event: K) -> usize {
    self
      .listeners
      .borrow()
      .iter()
      .filter(|listener| listener.event == event)
      .count()
  }

  /// Takes a snapshot of the callbacks for `event`, consuming one-shot listeners.
  fn snapshot(&self, event: K) -> Vec<Rc<F>> {
    let mut listeners = self.listeners.borrow_mut();
    let callbacks = listeners
      .iter()
      .filter(|listener| listener.event == event)
      .map(|listener| Rc::clone(&listener.callback))
      .collect();
    listeners.retain(|listener| !(listener.once && listener.event == event));
    callbacks
  }

  /// Invokes every listener of `event` through `invoke`, in registration order.
  pub fn emit_with(&self, event: K, mut invoke: impl FnMut(&F)) {
    for callback in self.snapshot(event) {
      invoke(&callback);
    }
  }

  /// Like [`emit_with`](Self::emit_with), but stops at the first listener error.
  pub fn try_emit_with<E>(
    &self,
    event: K,
    mut invoke: impl FnMut(&F) -> Result<(), E>,
  ) -> Result<(), E> {
    for callback in self.snapshot(event) {
      invoke(&callback)?;
    }
    Ok(())
  }
}
