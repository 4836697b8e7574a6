//! # FBP Parser, Dumper and Loader Test Suite

use crate::error::FlowError;
use crate::fbp::definition::{GraphDefinition, ProcessDefinition};
use crate::fbp::{Format, dumper, load_file, parser};
use crate::socket::Endpoint;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

const LINECOUNT: &str = "\
ReadFile(ReadFile) OUT -> IN SplitbyLines(SplitStr)
ReadFile() ERROR -> IN Display(Output)
SplitbyLines() OUT -> IN CountLines(Counter)
CountLines() COUNT -> IN Display()
";

#[test]
fn test_parse_simple_definition() {
  let definition = parser::parse(LINECOUNT).unwrap();

  assert_eq!(definition.name(), "");
  assert!(definition.initializers.is_empty());
  let processes: Vec<(&str, &str)> = definition
    .processes
    .iter()
    .map(|(id, process)| (id.as_str(), process.component.as_str()))
    .collect();
  assert_eq!(
    processes,
    vec![
      ("ReadFile", "ReadFile"),
      ("SplitbyLines", "SplitStr"),
      ("Display", "Output"),
      ("CountLines", "Counter"),
    ]
  );
  assert_eq!(
    definition.processes["Display"].metadata.as_ref().unwrap()["label"],
    json!("Output")
  );

  let connections: Vec<(Endpoint, Endpoint)> = definition
    .connections
    .iter()
    .map(|connection| (connection.src.clone(), connection.tgt.clone()))
    .collect();
  assert_eq!(
    connections,
    vec![
      (Endpoint::new("ReadFile", "OUT"), Endpoint::new("SplitbyLines", "IN")),
      (Endpoint::new("ReadFile", "ERROR"), Endpoint::new("Display", "IN")),
      (Endpoint::new("SplitbyLines", "OUT"), Endpoint::new("CountLines", "IN")),
      (Endpoint::new("CountLines", "COUNT"), Endpoint::new("Display", "IN")),
    ]
  );
}

#[test]
fn test_parse_chained_line_with_initializer() {
  let source = "\
'8003' -> LISTEN WebServer(HTTP/Server) REQUEST -> IN Profiler(HTTP/Profiler) OUT -> IN Authentication(HTTP/BasicAuth)
Authentication() OUT -> IN GreetUser(HelloController) OUT[0] -> IN[0] WriteResponse(HTTP/WriteResponse) OUT -> IN Send(HTTP/SendResponse)";

  let definition = parser::parse(source).unwrap();

  assert_eq!(definition.initializers.len(), 1);
  assert_eq!(definition.initializers[0].data, json!("8003"));
  assert_eq!(definition.initializers[0].tgt, Endpoint::new("WebServer", "LISTEN"));
  assert_eq!(definition.processes.len(), 6);
  assert_eq!(definition.processes["Authentication"].component, "HTTP/BasicAuth");
  assert_eq!(definition.connections.len(), 5);
  assert_eq!(definition.connections[0].src, Endpoint::new("WebServer", "REQUEST"));
  assert_eq!(definition.connections[3].src, Endpoint::new("GreetUser", "OUT[0]"));
  assert_eq!(definition.connections[3].tgt, Endpoint::new("WriteResponse", "IN[0]"));
}

#[test]
fn test_first_line_comment_names_graph() {
  let definition = parser::parse("# counting lines\n\n# ignored\nA out -> in B").unwrap();
  assert_eq!(definition.name(), "counting lines");
  assert_eq!(definition.processes["A"].component, "A");
  assert_eq!(definition.processes["B"].component, "B");
  assert_eq!(definition.connections.len(), 1);
}

#[test]
fn test_process_keeps_first_component() {
  let definition = parser::parse("A(Source) out -> in B(Sink)\nB(Other) out -> in C").unwrap();
  assert_eq!(definition.processes["B"].component, "Sink");
  assert_eq!(
    definition.processes["C"],
    ProcessDefinition {
      component: "C".to_string(),
      metadata: Some([("label".to_string(), json!("C"))].into_iter().collect()),
    }
  );
}

#[test]
fn test_empty_source_is_parse_error() {
  assert!(matches!(parser::parse("  \n"), Err(FlowError::Parse { .. })));
}

#[test]
fn test_line_without_target_reports_line_number() {
  let error = parser::parse("A(Source) out -> in B(Sink)\nA(Source) out").unwrap_err();
  assert!(matches!(error, FlowError::Parse { line: 2, .. }));
}

#[test]
fn test_malformed_segment_is_parse_error() {
  let error = parser::parse("A(Source) out -> B(Sink)").unwrap_err();
  assert!(matches!(error, FlowError::Parse { line: 1, .. }));
}

#[test]
fn test_dump_fbp() {
  let definition = parser::parse("# demo\n'5' -> in B(Sink)\nA(Source) out -> in B()").unwrap();

  assert_eq!(
    dumper::to_fbp(&definition).unwrap(),
    "# demo\n'5' -> in B(Sink)\nA(Source) out -> in B(Sink)"
  );
}

#[test]
fn test_dump_fbp_rejects_unknown_process() {
  let mut definition = parser::parse("A(Source) out -> in B(Sink)").unwrap();
  definition.processes.shift_remove("B");

  let error = dumper::to_fbp(&definition).unwrap_err();
  assert!(matches!(error, FlowError::Dumper(_)));
  assert!(error.to_string().contains("B is not defined in processes"));
}

#[test]
fn test_dump_fbp_rejects_non_string_initializer() {
  let mut definition = parser::parse("'2' -> size Q(Queue)").unwrap();
  definition.initializers[0].data = json!(5);

  let error = dumper::to_fbp(&definition).unwrap_err();
  assert!(matches!(error, FlowError::Dumper(_)));

  let json = dumper::to_json(&definition).unwrap();
  assert_eq!(
    GraphDefinition::from_json(&json).unwrap().initializers[0].data,
    json!(5)
  );
}

#[test]
fn test_dump_fbp_rejects_multiline_initializer() {
  let mut definition = parser::parse("'x' -> in S(SplitStr)").unwrap();

  for data in ["a\nb", "a -> b", "it's"] {
    definition.initializers[0].data = json!(data);
    assert!(
      matches!(dumper::to_fbp(&definition), Err(FlowError::Dumper(_))),
      "{data:?}"
    );
  }

  definition.initializers[0].data = json!("a b");
  let reparsed = parser::parse(&dumper::to_fbp(&definition).unwrap()).unwrap();
  assert_eq!(reparsed.initializers[0].data, json!("a b"));
}

#[test]
fn test_json_and_yaml_round_trip() {
  let definition = parser::parse("# demo\n'x' -> in B(Sink)\nA(Source) out -> in B()").unwrap();

  let json = dumper::to_json(&definition).unwrap();
  assert!(json.contains("\n  \"properties\""));
  assert_eq!(GraphDefinition::from_json(&json).unwrap(), definition);

  let yaml = dumper::to_yaml(&definition).unwrap();
  assert_eq!(GraphDefinition::from_yaml(&yaml).unwrap(), definition);
}

#[test]
fn test_format_from_extension() {
  assert_eq!(Format::from_extension("fbp"), Some(Format::Fbp));
  assert_eq!(Format::from_extension("JSON"), Some(Format::Json));
  assert_eq!(Format::from_extension("yml"), Some(Format::Yaml));
  assert_eq!(Format::from_extension("yaml"), Some(Format::Yaml));
  assert_eq!(Format::from_extension("txt"), None);
}

#[test]
fn test_load_file_by_extension() {
  let mut file = tempfile::Builder::new().suffix(".fbp").tempfile().unwrap();
  write!(file, "# from disk\nA(Source) out -> in B(Sink)").unwrap();

  let definition = load_file(file.path()).unwrap();

  assert_eq!(definition.name(), "from disk");
  assert_eq!(definition.connections.len(), 1);
}

#[test]
fn test_load_file_errors() {
  let unknown = NamedTempFile::new().unwrap();
  assert!(matches!(load_file(unknown.path()), Err(FlowError::Loader(_))));

  assert!(matches!(
    load_file("/definitely/not/here.fbp"),
    Err(FlowError::Loader(_))
  ));

  let empty = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
  assert!(matches!(load_file(empty.path()), Err(FlowError::Loader(_))));
}
