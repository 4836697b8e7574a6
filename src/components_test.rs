//! # Bundled Components Test Suite

use crate::network::Network;
use crate::port::Port;
use crate::test_support::{Log, entries, new_log, probe_factory};
use serde_json::json;
use std::io::Write;

fn boot(log: &Log, fbp: &str) -> Network {
  let network = Network::new(probe_factory(log));
  network.boot(fbp).unwrap();
  network
}

fn out_port(network: &Network, process: &str, port: &str) -> Port {
  network.get_node(process).unwrap().component.out_ports()[port].clone()
}

#[test]
fn test_read_file_sends_contents_then_disconnects() {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  write!(file, "one\ntwo").unwrap();
  let log = new_log();
  let network = boot(
    &log,
    "R(ReadFile) out -> in B(Sink)\nR() error -> any B()",
  );

  let path = file.path().to_string_lossy().to_string();
  network.run(json!(path), "R", "source").unwrap();

  assert_eq!(
    entries(&log),
    vec![
      "in connect".to_string(),
      format!("in data {}", json!("one\ntwo")),
      "in disconnect".to_string(),
    ]
  );
}

#[test]
fn test_read_file_reports_missing_file() {
  let log = new_log();
  let network = boot(&log, "R(ReadFile) out -> in B(Sink)\nR() error -> any B()");

  network.run(json!("/no/such/file.txt"), "R", "source").unwrap();

  assert!(entries(&log).contains(&format!(
    "any data {}",
    json!("File /no/such/file.txt doesn't exist")
  )));
  assert!(!entries(&log).iter().any(|line| line.starts_with("in data")));
}

#[test]
fn test_read_file_rejects_non_string_path() {
  let log = new_log();
  let network = boot(&log, "R(ReadFile) error -> any B(Sink)");

  network.run(json!(42), "R", "source").unwrap();

  assert!(entries(&log).contains(&r#"any data "Invalid path 42""#.to_string()));
}

#[test]
fn test_read_file_without_error_edge_keeps_running() {
  let log = new_log();
  let network = boot(&log, "R(ReadFile) out -> in B(Sink)");
  network.run(json!("/no/such/file.txt"), "R", "source").unwrap();
  assert!(entries(&log).is_empty());
}

#[test]
fn test_split_str_splits_on_disconnect() {
  let log = new_log();
  let network = boot(&log, "A(Source) out -> in S(SplitStr) out -> in B(Sink)");
  let out = out_port(&network, "A", "out");

  out.send(json!("a\nb")).unwrap();
  out.send(json!("\nc")).unwrap();
  assert!(entries(&log).is_empty());
  out.disconnect();

  assert_eq!(
    entries(&log),
    vec![
      "in connect",
      r#"in data "a""#,
      r#"in data "b""#,
      r#"in data "c""#,
      "in disconnect",
    ]
  );
}

#[test]
fn test_split_str_custom_delimiter() {
  let log = new_log();
  let network = boot(&log, "A(Source) out -> in S(SplitStr) out -> in B(Sink)");
  network.add_initial(json!(","), "S", "delimiter").unwrap();
  let out = out_port(&network, "A", "out");

  out.send(json!("x,y")).unwrap();
  out.disconnect();

  let data: Vec<String> = entries(&log)
    .into_iter()
    .filter(|line| line.starts_with("in data"))
    .collect();
  assert_eq!(data, vec![r#"in data "x""#, r#"in data "y""#]);
}

#[test]
fn test_counter_counts_per_connection() {
  let log = new_log();
  let network = boot(&log, "A(Source) out -> in C(Counter) count -> count B(Sink)");
  let out = out_port(&network, "A", "out");

  for line in ["a", "b", "c"] {
    out.send(json!(line)).unwrap();
  }
  out.disconnect();

  out.connect().unwrap();
  out.disconnect();

  assert_eq!(
    entries(&log),
    vec![
      "count connect",
      "count data 3",
      "count disconnect",
      "count connect",
      "count data null",
      "count disconnect",
    ]
  );
}

#[test]
fn test_queue_flushes_when_full() {
  let log = new_log();
  let network = boot(&log, "A(Source) any -> in Q(Queue) messages -> any B(Sink)");
  network.add_initial(json!(2), "Q", "size").unwrap();
  let out = out_port(&network, "A", "any");

  for value in 1..=3 {
    out.send(json!(value)).unwrap();
  }

  assert_eq!(
    entries(&log),
    vec!["any connect", "any data [1,2]", "any disconnect"]
  );
}

#[test]
fn test_queue_flushes_remainder_on_detach() {
  let log = new_log();
  let network = boot(&log, "A(Source) any -> in Q(Queue) messages -> any B(Sink)");
  let out = out_port(&network, "A", "any");
  out.send(json!("only")).unwrap();
  assert!(entries(&log).is_empty());

  network.graph().unwrap().remove_edge("A", "any").unwrap();

  assert!(entries(&log).contains(&r#"any data ["only"]"#.to_string()));
}

#[test]
fn test_queue_rejects_invalid_size() {
  let log = new_log();
  let network = boot(
    &log,
    "A(Source) any -> in Q(Queue) messages -> any B(Sink)\nQ() err -> in B()",
  );
  network.add_initial(json!("big"), "Q", "size").unwrap();
  network.add_initial(json!(1), "Q", "size").unwrap();

  let errors: Vec<String> = entries(&log)
    .into_iter()
    .filter(|line| line.starts_with("in data"))
    .collect();
  assert_eq!(errors.len(), 1);
  assert!(errors[0].contains("Invalid queue size"));

  out_port(&network, "A", "any").send(json!(7)).unwrap();
  assert!(entries(&log).contains(&"any data [7]".to_string()));
}

#[test]
fn test_queue_rejects_negative_and_fractional_sizes() {
  let log = new_log();
  let network = boot(
    &log,
    "A(Source) any -> in Q(Queue) messages -> any B(Sink)\nQ() err -> in B()",
  );
  network.add_initial(json!(1), "Q", "size").unwrap();
  network.add_initial(json!(-3), "Q", "size").unwrap();
  network.add_initial(json!(2.5), "Q", "size").unwrap();

  let errors = entries(&log)
    .into_iter()
    .filter(|line| line.starts_with("in data"))
    .count();
  assert_eq!(errors, 2);

  out_port(&network, "A", "any").send(json!("x")).unwrap();
  assert!(entries(&log).contains(&r#"any data ["x"]"#.to_string()));
}

#[test]
fn test_output_accepts_many_sockets() {
  let log = new_log();
  let network = boot(&log, "A(Source) any -> in O(Output)\nA() out -> in O()");

  let output = network.get_node("O").unwrap();
  let input = &output.component.in_ports()["in"];
  assert!(input.is_addressable());
  assert_eq!(input.list_attached(), vec![0, 1]);

  out_port(&network, "A", "any").send(json!({"shown": true})).unwrap();
  out_port(&network, "A", "out").send(json!("also shown")).unwrap();
  assert!(input.is_connected_at(0) && input.is_connected_at(1));
}
