//! Node descriptors and the lookup table the host loads them from.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::capture::capture_screen_with;
use crate::config::NodeConfig;
use crate::image::ImageTensor;

/// Directory of front-end scripts, relative to the plugin root.
pub const WEB_DIRECTORY: &str = "./js";

/// Name the front-end extension registers itself under.
pub const EXTENSION_NAME: &str = "ComfyUI.WebROI";

/// Widget values keyed by input name.
pub type NodeInputs = Map<String, Value>;

/// One tensor per declared output.
pub type NodeOutputs = Vec<ImageTensor>;

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("unknown node type: {0}")]
    UnknownNode(String),
    #[error("{node}: missing required input `{input}`")]
    MissingInput {
        node: &'static str,
        input: &'static str,
    },
    #[error("{node}: input `{input}` expects {expected}, got {got}")]
    InvalidInput {
        node: &'static str,
        input: &'static str,
        expected: InputKind,
        got: Value,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputKind {
    #[serde(rename = "STRING")]
    String,
    #[serde(rename = "INT")]
    Int,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::String => "STRING",
            InputKind::Int => "INT",
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Str(&'static str),
    Int(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputSpec {
    pub name: &'static str,
    pub kind: InputKind,
    pub default: DefaultValue,
    pub multiline: bool,
    pub min: Option<u64>,
    pub max: Option<u64>,
    /// Shown as a socket rather than a widget; the value must be wired in.
    pub force_input: bool,
}

impl InputSpec {
    /// `(KIND, {options})`, the tuple shape the host expects per input.
    fn to_host_json(&self) -> Value {
        let mut options = Map::new();
        options.insert("default".into(), json!(self.default));
        if self.multiline {
            options.insert("multiline".into(), json!(true));
        }
        if let Some(min) = self.min {
            options.insert("min".into(), json!(min));
        }
        if let Some(max) = self.max {
            options.insert("max".into(), json!(max));
        }
        if self.force_input {
            options.insert("forceInput".into(), json!(true));
        }
        json!([self.kind.as_str(), options])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputSpec {
    pub kind: &'static str,
    pub name: &'static str,
}

type Execute = fn(&NodeConfig, &NodeInputs) -> Result<NodeOutputs, NodeError>;

#[derive(Clone, Copy, Serialize)]
pub struct NodeDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
    pub function: &'static str,
    pub required: &'static [InputSpec],
    pub optional: &'static [InputSpec],
    pub outputs: &'static [OutputSpec],
    #[serde(skip)]
    execute: Execute,
}

impl std::fmt::Debug for NodeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeDescriptor")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("function", &self.function)
            .finish_non_exhaustive()
    }
}

impl NodeDescriptor {
    /// The `INPUT_TYPES` table: `{"required": {...}, "optional": {...}}`.
    pub fn input_types(&self) -> Value {
        let section = |specs: &[InputSpec]| -> Map<String, Value> {
            specs
                .iter()
                .map(|spec| (spec.name.to_string(), spec.to_host_json()))
                .collect()
        };

        json!({
            "required": section(self.required),
            "optional": section(self.optional),
        })
    }

    pub fn return_types(&self) -> Vec<&'static str> {
        self.outputs.iter().map(|o| o.kind).collect()
    }

    pub fn return_names(&self) -> Vec<&'static str> {
        self.outputs.iter().map(|o| o.name).collect()
    }

    pub fn execute(
        &self,
        config: &NodeConfig,
        inputs: &NodeInputs,
    ) -> Result<NodeOutputs, NodeError> {
        for spec in self.required {
            if !inputs.contains_key(spec.name) {
                return Err(NodeError::MissingInput {
                    node: self.name,
                    input: spec.name,
                });
            }
        }

        (self.execute)(config, inputs)
    }
}

pub static WEB_ROI_CAPTURE: NodeDescriptor = NodeDescriptor {
    name: "WebROICapture",
    display_name: "🖥️ Web ROI Capture",
    category: "WebROI",
    function: "capture_screen",
    required: &[InputSpec {
        name: "image_data",
        kind: InputKind::String,
        default: DefaultValue::Str(""),
        multiline: true,
        min: None,
        max: None,
        force_input: false,
    }],
    optional: &[InputSpec {
        name: "trigger_always",
        kind: InputKind::Int,
        default: DefaultValue::Int(0),
        multiline: false,
        min: Some(0),
        max: Some(u64::MAX),
        force_input: true,
    }],
    outputs: &[OutputSpec {
        kind: "IMAGE",
        name: "image",
    }],
    execute: execute_capture,
};

fn execute_capture(config: &NodeConfig, inputs: &NodeInputs) -> Result<NodeOutputs, NodeError> {
    let node = WEB_ROI_CAPTURE.name;

    let image_data = match inputs.get("image_data") {
        Some(Value::String(s)) => s.as_str(),
        Some(other) => {
            return Err(NodeError::InvalidInput {
                node,
                input: "image_data",
                expected: InputKind::String,
                got: other.clone(),
            })
        }
        None => "",
    };

    let trigger = match inputs.get("trigger_always") {
        None | Some(Value::Null) => 0,
        Some(value) => value.as_u64().ok_or_else(|| NodeError::InvalidInput {
            node,
            input: "trigger_always",
            expected: InputKind::Int,
            got: value.clone(),
        })?,
    };

    let capture = capture_screen_with(config, image_data, trigger);
    Ok(vec![capture.into_image()])
}

static NODES: [&NodeDescriptor; 1] = [&WEB_ROI_CAPTURE];

/// Every node this plugin provides, plus the config they run with.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    config: NodeConfig,
}

impl NodeRegistry {
    pub fn new(config: NodeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn nodes(&self) -> impl Iterator<Item = &'static NodeDescriptor> {
        NODES.iter().copied()
    }

    pub fn get(&self, name: &str) -> Option<&'static NodeDescriptor> {
        self.nodes().find(|node| node.name == name)
    }

    /// Node type name to palette label.
    pub fn display_names(&self) -> BTreeMap<&'static str, &'static str> {
        self.nodes()
            .map(|node| (node.name, node.display_name))
            .collect()
    }

    pub fn web_directory(&self) -> &'static str {
        WEB_DIRECTORY
    }

    pub fn invoke(&self, name: &str, inputs: &NodeInputs) -> Result<NodeOutputs, NodeError> {
        let node = self
            .get(name)
            .ok_or_else(|| NodeError::UnknownNode(name.to_string()))?;

        log::debug!("Invoking {} ({})", node.name, node.function);
        node.execute(&self.config, inputs)
    }

    /// Everything the host reads at load time, as JSON.
    pub fn manifest(&self) -> Value {
        let nodes: Map<String, Value> = self
            .nodes()
            .map(|node| {
                let entry = json!({
                    "display_name": node.display_name,
                    "category": node.category,
                    "function": node.function,
                    "input_types": node.input_types(),
                    "return_types": node.return_types(),
                    "return_names": node.return_names(),
                });
                (node.name.to_string(), entry)
            })
            .collect();

        json!({
            "extension": EXTENSION_NAME,
            "web_directory": self.web_directory(),
            "nodes": nodes,
        })
    }
}
