//! # Event Emitter Test Suite

use crate::event::EventEmitter;
use std::cell::RefCell;
use std::rc::Rc;

type Callback = dyn Fn(&str);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
  Ping,
  Pong,
}

fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &'static str) -> Rc<Callback> {
  let log = Rc::clone(log);
  Rc::new(move |payload: &str| log.borrow_mut().push(format!("{tag}:{payload}")))
}

#[test]
fn test_listeners_run_in_registration_order() {
  let emitter: EventEmitter<Kind, Callback> = EventEmitter::new();
  let log = Rc::new(RefCell::new(Vec::new()));
  emitter.on(Kind::Ping, recorder(&log, "a"));
  emitter.on(Kind::Pong, recorder(&log, "x"));
  emitter.on(Kind::Ping, recorder(&log, "b"));

  emitter.emit_with(Kind::Ping, |listener| listener("1"));

  assert_eq!(*log.borrow(), vec!["a:1", "b:1"]);
  assert_eq!(emitter.listener_count(Kind::Ping), 2);
  assert_eq!(emitter.listener_count(Kind::Pong), 1);
}

#[test]
fn test_once_listener_fires_once() {
  let emitter: EventEmitter<Kind, Callback> = EventEmitter::new();
  let log = Rc::new(RefCell::new(Vec::new()));
  emitter.once(Kind::Ping, recorder(&log, "once"));

  emitter.emit_with(Kind::Ping, |listener| listener("1"));
  emitter.emit_with(Kind::Ping, |listener| listener("2"));

  assert_eq!(*log.borrow(), vec!["once:1"]);
  assert_eq!(emitter.listener_count(Kind::Ping), 0);
}

#[test]
fn test_remove_listener() {
  let emitter: EventEmitter<Kind, Callback> = EventEmitter::new();
  let log = Rc::new(RefCell::new(Vec::new()));
  let id = emitter.on(Kind::Ping, recorder(&log, "a"));

  assert!(emitter.remove_listener(id));
  assert!(!emitter.remove_listener(id));
  emitter.emit_with(Kind::Ping, |listener| listener("1"));
  assert!(log.borrow().is_empty());
}

#[test]
fn test_listener_may_reenter_emitter() {
  let emitter: Rc<EventEmitter<Kind, dyn Fn()>> = Rc::new(EventEmitter::new());
  let log = Rc::new(RefCell::new(Vec::new()));

  let inner = Rc::clone(&emitter);
  let inner_log = Rc::clone(&log);
  emitter.on(
    Kind::Ping,
    Rc::new(move || {
      inner_log.borrow_mut().push("ping");
      let late_log = Rc::clone(&inner_log);
      inner.on(Kind::Ping, Rc::new(move || late_log.borrow_mut().push("late")));
      inner.emit_with(Kind::Pong, |listener| listener());
    }),
  );
  let pong_log = Rc::clone(&log);
  emitter.on(Kind::Pong, Rc::new(move || pong_log.borrow_mut().push("pong")));

  emitter.emit_with(Kind::Ping, |listener| listener());

  // Listeners added during a dispatch only see later emissions.
  assert_eq!(*log.borrow(), vec!["ping", "pong"]);
  assert_eq!(emitter.listener_count(Kind::Ping), 2);
}

#[test]
fn test_try_emit_stops_at_first_error() {
  let emitter: EventEmitter<Kind, dyn Fn() -> Result<(), String>> = EventEmitter::new();
  let calls = Rc::new(RefCell::new(0));

  let counter = Rc::clone(&calls);
  emitter.on(
    Kind::Ping,
    Rc::new(move || {
      *counter.borrow_mut() += 1;
      Err("boom".to_string())
    }),
  );
  let counter = Rc::clone(&calls);
  emitter.on(
    Kind::Ping,
    Rc::new(move || {
      *counter.borrow_mut() += 1;
      Ok(())
    }),
  );

  let result = emitter.try_emit_with(Kind::Ping, |listener| listener());

  assert_eq!(result, Err("boom".to_string()));
  assert_eq!(*calls.borrow(), 1);
}

#[test]
fn test_remove_all_listeners() {
  let emitter: EventEmitter<Kind, Callback> = EventEmitter::new();
  let log = Rc::new(RefCell::new(Vec::new()));
  emitter.on(Kind::Ping, recorder(&log, "a"));
  emitter.on(Kind::Pong, recorder(&log, "b"));

  emitter.remove_all_listeners();

  assert_eq!(emitter.listener_count(Kind::Ping), 0);
  assert_eq!(emitter.listener_count(Kind::Pong), 0);
}
