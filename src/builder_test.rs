//! # Component Builder Test Suite

use crate::builder::{ComponentBuilder, ComponentFactory, ComponentRegistry};
use crate::component::{BaseComponent, Component};
use crate::components::Counter;
use crate::port::PortAttributes;
use crate::port_registry::PortRegistry;
use std::rc::Rc;

fn bare() -> crate::FlowResult<BaseComponent> {
  let mut in_ports = PortRegistry::new();
  in_ports.add("in", PortAttributes::default())?;
  Ok(BaseComponent::new("bare", in_ports, PortRegistry::new()))
}

#[test]
fn test_defaults_are_registered() {
  let factory = ComponentFactory::with_defaults();
  let names: Vec<&str> = factory.names().collect();
  assert_eq!(names, vec!["ReadFile", "SplitStr", "Counter", "Output", "Queue"]);

  let counter = factory.build("Counter").unwrap();
  assert!(counter.in_ports().has("in"));
  assert!(counter.out_ports().has("count"));
}

#[test]
fn test_build_creates_fresh_instances() {
  let factory = ComponentFactory::with_defaults();
  let first = factory.build("Counter").unwrap();
  let second = factory.build("Counter").unwrap();
  assert!(!Rc::ptr_eq(&first, &second));
}

#[test]
fn test_unknown_type_is_definition_error() {
  let factory = ComponentFactory::new();
  let error = factory.build("Missing").err().unwrap();
  assert!(error.is_definition_error());
  assert!(error.to_string().contains("Component class Missing not found"));
}

#[test]
fn test_register_custom_component() {
  let mut factory = ComponentFactory::new();
  factory.register("Bare", bare).unwrap();

  assert!(factory.contains("Bare"));
  assert_eq!(factory.build("Bare").unwrap().description(), "bare");
  assert!(factory.register("Bare", bare).unwrap_err().is_definition_error());
}

#[test]
fn test_registry_shares_instances() {
  let mut registry = ComponentRegistry::new();
  let counter: Rc<dyn Component> = Rc::new(Counter::new().unwrap());
  registry.add("counter", Rc::clone(&counter)).unwrap();

  let built = registry.build("counter").unwrap();
  assert!(Rc::ptr_eq(&built, &counter));
  assert!(registry.contains("counter"));
}

#[test]
fn test_registry_rejects_duplicates_and_unknown_aliases() {
  let mut registry = ComponentRegistry::new();
  registry.add("bare", Rc::new(bare().unwrap())).unwrap();

  let duplicate = registry.add("bare", Rc::new(bare().unwrap())).unwrap_err();
  assert!(duplicate.to_string().contains("already registered"));

  let missing = registry.get("ghost").err().unwrap();
  assert!(missing.is_definition_error());
  assert!(missing.to_string().contains("Could not find component ghost"));
}
