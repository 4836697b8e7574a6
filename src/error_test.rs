//! # Error Test Suite

use crate::error::FlowError;

#[test]
fn test_error_classes_are_distinct() {
  let definition = FlowError::definition("no such node");
  let incompatible = FlowError::IncompatibleDatatype("string -> int".to_string());
  let flow = FlowError::flow("not booted");

  assert!(definition.is_definition_error());
  assert!(!definition.is_incompatible_datatype());
  assert!(incompatible.is_incompatible_datatype());
  assert!(!incompatible.is_definition_error());
  assert!(!flow.is_definition_error());
  assert!(!flow.is_incompatible_datatype());
}

#[test]
fn test_display() {
  assert_eq!(
    FlowError::definition("x").to_string(),
    "invalid definition: x"
  );
  assert_eq!(
    FlowError::Parse {
      line: 3,
      message: "bad".to_string()
    }
    .to_string(),
    "parse error on line 3: bad"
  );
}

#[test]
fn test_wraps_io_and_serde_errors() {
  let io: FlowError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
  assert!(matches!(io, FlowError::Io(_)));

  let json: FlowError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
  assert!(matches!(json, FlowError::Json(_)));
}
