//! # Hooks Test Suite

use crate::hooks::Hooks;
use crate::socket::{Signal, SignalKind, Socket};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_unknown_event_is_rejected() {
  let mut hooks = Hooks::new();
  let error = hooks.add("explode", "trace", |_, _| {}).unwrap_err();
  assert!(error.is_definition_error());

  // Known signal, but not one sockets expose to hooks.
  assert!(hooks.add("shutdown", "trace", |_, _| {}).is_err());
  assert!(hooks.is_empty());
}

#[test]
fn test_duplicate_alias_is_rejected_per_event() {
  let mut hooks = Hooks::new();
  hooks.add("data", "trace", |_, _| {}).unwrap();

  assert!(hooks.add("data", "trace", |_, _| {}).unwrap_err().is_definition_error());
  hooks.add("connect", "trace", |_, _| {}).unwrap();

  let aliases = hooks.aliases();
  assert_eq!(aliases["data"], vec!["trace".to_string()]);
  assert_eq!(aliases["connect"], vec!["trace".to_string()]);
}

#[test]
fn test_apply_attaches_every_hook() {
  let mut hooks = Hooks::new();
  let log = Rc::new(RefCell::new(Vec::new()));
  for (event, alias) in [("data", "a"), ("data", "b"), ("connect", "a")] {
    let log = Rc::clone(&log);
    hooks
      .add(event, alias, move |signal: &Signal, _: &Socket| {
        log.borrow_mut().push(format!("{alias}:{}", signal.kind()))
      })
      .unwrap();
  }
  let socket = Socket::default();

  hooks.apply(&socket);
  socket.connect();
  socket.send(json!(1));

  assert_eq!(socket.listener_count(SignalKind::Data), 2);
  assert_eq!(*log.borrow(), vec!["a:connect", "a:data", "b:data"]);
}
