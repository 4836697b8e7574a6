//! # Component Builders
//!
//! The network never constructs components itself. It asks a
//! [`ComponentBuilder`] to resolve a component type name into a fresh
//! instance.
//!
//! Two builders are provided:
//!
//! - [`ComponentFactory`]: maps type names to constructors. Every `build`
//!   creates a new instance.
//! - [`ComponentRegistry`]: maps aliases to already constructed, shared
//!   instances, in the manner of a dependency injection container.

use crate::component::Component;
use crate::components::{Counter, Output, Queue, ReadFile, SplitStr};
use crate::error::{FlowError, FlowResult};
use indexmap::IndexMap;
use std::rc::Rc;
use tracing::debug;

/// Resolves a component type name into a component instance.
pub trait ComponentBuilder {
  /// Builds the component registered as `component`.
  ///
  /// Fails with a definition error when the name cannot be resolved.
  fn build(&self, component: &str) -> FlowResult<Rc<dyn Component>>;
}

type Constructor = Box<dyn Fn() -> FlowResult<Rc<dyn Component>>>;

/// Type name to constructor table.
#[derive(Default)]
pub struct ComponentFactory {
  constructors: IndexMap<String, Constructor>,
}

impl ComponentFactory {
  /// Creates an empty factory.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a factory with the bundled components registered under their
  /// type names: `ReadFile`, `SplitStr`, `Counter`, `Output` and `Queue`.
  pub fn with_defaults() -> Self {
    let mut factory = Self::new();
    let defaults: [(&str, Constructor); 5] = [
      ("ReadFile", Box::new(|| Ok(Rc::new(ReadFile::new()?) as Rc<dyn Component>))),
      ("SplitStr", Box::new(|| Ok(Rc::new(SplitStr::new()?) as Rc<dyn Component>))),
      ("Counter", Box::new(|| Ok(Rc::new(Counter::new()?) as Rc<dyn Component>))),
      ("Output", Box::new(|| Ok(Rc::new(Output::new()?) as Rc<dyn Component>))),
      ("Queue", Box::new(|| Ok(Rc::new(Queue::new()?) as Rc<dyn Component>))),
    ];
    for (name, constructor) in defaults {
      factory.constructors.insert(name.to_string(), constructor);
    }
    factory
  }

  /// Registers a constructor. Fails if the name is taken.
  pub fn register<C, F>(&mut self, name: &str, constructor: F) -> FlowResult<()>
  where
    C: Component + 'static,
    F: Fn() -> FlowResult<C> + 'static,
  {
    if self.constructors.contains_key(name) {
      return Err(FlowError::definition(format!(
        "Component class {name} is already registered"
      )));
    }
    self.constructors.insert(
      name.to_string(),
      Box::new(move || Ok(Rc::new(constructor()?) as Rc<dyn Component>)),
    );
    Ok(())
  }

  /// Whether a constructor is registered under `name`.
  pub fn contains(&self, name: &str) -> bool {
    self.constructors.contains_key(name)
  }

  /// Registered type names in registration order.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.constructors.keys().map(String::as_str)
  }
}

impl ComponentBuilder for ComponentFactory {
  fn build(&self, component: &str) -> FlowResult<Rc<dyn Component>> {
    let constructor = self
      .constructors
      .get(component)
      .ok_or_else(|| FlowError::definition(format!("Component class {component} not found")))?;
    debug!(component, "building component");
    constructor()
  }
}

/// Alias to shared component instance table.
///
/// `build` hands out the registered instance itself, so the same component is
/// shared by every process built from one alias.
#[derive(Default)]
pub struct ComponentRegistry {
  components: IndexMap<String, Rc<dyn Component>>,
}

impl ComponentRegistry {
  /// Creates an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers an instance under `alias`. Fails if the alias is taken.
  pub fn add(&mut self, alias: &str, component: Rc<dyn Component>) -> FlowResult<()> {
    if self.components.contains_key(alias) {
      return Err(FlowError::definition(format!(
        "The component {alias} is already registered."
      )));
    }
    self.components.insert(alias.to_string(), component);
    Ok(())
  }

  /// The instance registered under `alias`.
  pub fn get(&self, alias: &str) -> FlowResult<Rc<dyn Component>> {
    self
      .components
      .get(alias)
      .cloned()
      .ok_or_else(|| FlowError::definition(format!("Could not find component {alias} in registry.")))
  }

  /// Whether `alias` is registered.
  pub fn contains(&self, alias: &str) -> bool {
    self.components.contains_key(alias)
  }
}

impl ComponentBuilder for ComponentRegistry {
  fn build(&self, component: &str) -> FlowResult<Rc<dyn Component>> {
    self.get(component)
  }
}
