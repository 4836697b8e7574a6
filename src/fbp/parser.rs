//! # FBP DSL Parser
//!
//! Parses the line based FBP notation into a [`GraphDefinition`].
//!
//! ```text
//! # linecount
//! 'input.txt' -> source ReadFile(ReadFile)
//! ReadFile(ReadFile) out -> in SplitbyLines(SplitStr)
//! ReadFile() error -> in Display(Output)
//! SplitbyLines() out -> in CountLines(Counter) count -> in Display()
//! ```
//!
//! Each line is a chain of segments separated by `->`:
//!
//! - the first segment is `Process(Component) outport`, or a quoted
//!   initializer value `'data'`;
//! - middle segments are `inport Process(Component) outport`;
//! - the last segment is `inport Process(Component)`.
//!
//! The component may be omitted (`Process()` or `Process`); a process keeps
//! the component it was first declared with, and defaults to its own name.
//! Ports may carry an index suffix, `out[0]`, which stays part of the port
//! name. A `#` comment on the very first line names the graph; other comments
//! and blank lines are skipped.

use crate::error::{FlowError, FlowResult};
use crate::fbp::definition::{
  ConnectionDefinition, GraphDefinition, InitializerDefinition, ProcessDefinition,
};
use crate::socket::{Endpoint, Packet};
use indexmap::IndexMap;
use regex::{Captures, Regex};

/// Separates the segments of a line.
pub const SEPARATOR: &str = "->";

const PORT: &str = r"[A-Za-z_]+(?:\[[0-9]+\])?";
const PROCESS: &str = r"(?P<process>[\w/]+)(?:\((?P<component>[\w/\\.]*)\))?";

/// One resolved segment of a line.
struct Segment {
  process: String,
  component: Option<String>,
  inport: Option<String>,
  outport: Option<String>,
}

impl Segment {
  fn from_captures(captures: &Captures<'_>) -> Self {
    let text = |name: &str| {
      captures
        .name(name)
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
    };
    Self {
      process: text("process").unwrap_or_default(),
      component: text("component"),
      inport: text("inport"),
      outport: text("outport"),
    }
  }
}

/// Line based FBP parser.
pub struct FbpParser {
  head: Regex,
  middle: Regex,
  tail: Regex,
}

impl FbpParser {
  /// Compiles the segment patterns.
  pub fn new() -> FlowResult<Self> {
    Ok(Self {
      head: Regex::new(&format!(r"^{PROCESS}\s+(?P<outport>{PORT})$"))?,
      middle: Regex::new(&format!(
        r"^(?P<inport>{PORT})\s+{PROCESS}\s+(?P<outport>{PORT})$"
      ))?,
      tail: Regex::new(&format!(r"^(?P<inport>{PORT})\s+{PROCESS}$"))?,
    })
  }

  /// Parses `source` into a definition.
  pub fn parse(&self, source: &str) -> FlowResult<GraphDefinition> {
    if source.trim().is_empty() {
      return Err(FlowError::Parse {
        line: 1,
        message: "no source data or empty string given".to_string(),
      });
    }

    let mut definition = GraphDefinition::default();
    for (index, line) in source.lines().enumerate() {
      let number = index + 1;
      let trimmed = line.trim();
      if trimmed.is_empty() {
        continue;
      }
      if let Some(comment) = trimmed.strip_prefix('#') {
        if number == 1 {
          definition.properties.name = comment.trim().to_string();
        }
        continue;
      }
      self.parse_line(trimmed, number, &mut definition)?;
    }
    Ok(definition)
  }

  fn parse_line(
    &self,
    line: &str,
    number: usize,
    definition: &mut GraphDefinition,
  ) -> FlowResult<()> {
    let error = |message: String| FlowError::Parse {
      line: number,
      message,
    };

    let parts: Vec<&str> = line.split(SEPARATOR).map(str::trim).collect();
    if parts.len() < 2 {
      return Err(error(format!("{line} does not contain in or out ports")));
    }

    let last = parts.len() - 1;
    let mut data: Option<Packet> = None;
    let mut upstream: Option<Endpoint> = None;

    for (position, part) in parts.iter().enumerate() {
      if position == 0 && part.starts_with('\'') {
        let value = part.trim_matches(|c| c == '\'' || c == ' ');
        data = Some(Packet::String(value.to_string()));
        continue;
      }

      let pattern = match position {
        0 => &self.head,
        p if p == last => &self.tail,
        _ => &self.middle,
      };
      let segment = pattern
        .captures(part)
        .map(|captures| Segment::from_captures(&captures))
        .ok_or_else(|| error(format!("invalid process definition \"{part}\" in {line}")))?;
      declare(definition, &segment);

      if let Some(inport) = &segment.inport {
        let target = Endpoint::new(segment.process.clone(), inport.clone());
        if let Some(data) = data.take() {
          definition
            .initializers
            .push(InitializerDefinition { data, tgt: target });
        } else if let Some(source) = upstream.take() {
          definition.connections.push(ConnectionDefinition {
            src: source,
            tgt: target,
          });
        } else {
          return Err(error(format!(
            "there is no source defined for {target} in {line}"
          )));
        }
      }

      upstream = segment
        .outport
        .map(|outport| Endpoint::new(segment.process.clone(), outport));
    }

    Ok(())
  }
}

/// Parses FBP text with a fresh parser.
pub fn parse(source: &str) -> FlowResult<GraphDefinition> {
  FbpParser::new()?.parse(source)
}

/// Registers the process of `segment` unless it was declared before.
fn declare(definition: &mut GraphDefinition, segment: &Segment) {
  if definition.processes.contains_key(&segment.process) {
    return;
  }
  let component = segment
    .component
    .clone()
    .unwrap_or_else(|| segment.process.clone());
  let mut metadata = IndexMap::new();
  metadata.insert("label".to_string(), Packet::String(component.clone()));
  definition.processes.insert(
    segment.process.clone(),
    ProcessDefinition {
      component,
      metadata: Some(metadata),
    },
  );
}
