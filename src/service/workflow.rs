use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context as _;
use serde_json::{Map, Value};

use crate::assets::handle::ensure_parent_dir;
use crate::foundation::error::{ParallaxError, ParallaxResult};

const BUILTIN_TEMPLATE: &str = include_str!("../../workflows/outpaint.json");

/// Inpainting job graph in the service's API format: node id -> `{class_type, inputs, _meta}`.
#[derive(Clone, Debug, PartialEq)]
pub struct Workflow {
    name: String,
    nodes: Map<String, Value>,
}

impl Workflow {
    /// Wrap a parsed graph, checking that every node has a `class_type`.
    pub fn from_value(name: impl Into<String>, value: Value) -> ParallaxResult<Self> {
        let Value::Object(nodes) = value else {
            return Err(ParallaxError::validation("workflow must be a JSON object"));
        };
        for (id, node) in &nodes {
            if node.get("class_type").and_then(Value::as_str).is_none() {
                return Err(ParallaxError::validation(format!(
                    "workflow node '{id}' has no class_type"
                )));
            }
        }
        Ok(Self {
            name: name.into(),
            nodes,
        })
    }

    /// Load a template from disk.
    pub fn load(path: &Path) -> ParallaxResult<Self> {
        let f = File::open(path).with_context(|| format!("open workflow '{}'", path.display()))?;
        let value: Value = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| ParallaxError::serde(format!("parse '{}': {e}", path.display())))?;
        let name = path
            .file_stem()
            .map_or_else(|| "workflow".to_string(), |s| s.to_string_lossy().into_owned());
        Self::from_value(name, value)
    }

    /// Template shipped with the crate.
    pub fn builtin() -> ParallaxResult<Self> {
        let value: Value = serde_json::from_str(BUILTIN_TEMPLATE)
            .map_err(|e| ParallaxError::serde(format!("parse builtin workflow: {e}")))?;
        Self::from_value("outpaint", value)
    }

    /// Template name, from the file stem it was loaded from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filename of the per-project copy, `<template>-<project>.json`.
    pub fn project_copy_filename(&self, project_name: &str) -> String {
        format!("{}-{project_name}.json", self.name)
    }

    /// Write the graph as pretty JSON.
    pub fn save(&self, path: &Path) -> ParallaxResult<()> {
        ensure_parent_dir(path)?;
        let f = File::create(path).with_context(|| format!("create workflow '{}'", path.display()))?;
        serde_json::to_writer_pretty(f, &self.nodes)
            .map_err(|e| ParallaxError::serde(format!("write '{}': {e}", path.display())))
    }

    /// The graph as submitted to the service.
    pub fn to_value(&self) -> Value {
        Value::Object(self.nodes.clone())
    }

    /// Id of the node titled `key`, else the first node whose class type is `key`.
    pub fn find_node(&self, key: &str) -> Option<&str> {
        let by_title = self.nodes.iter().find(|(_, n)| {
            n.pointer("/_meta/title").and_then(Value::as_str) == Some(key)
        });
        let by_class = || {
            self.nodes
                .iter()
                .find(|(_, n)| n.get("class_type").and_then(Value::as_str) == Some(key))
        };
        by_title.or_else(by_class).map(|(id, _)| id.as_str())
    }

    /// Display name of node `id`: its title, else its class type.
    pub fn node_name(&self, id: &str) -> String {
        let Some(node) = self.nodes.get(id) else {
            return "Unknown".to_string();
        };
        node.pointer("/_meta/title")
            .or_else(|| node.get("class_type"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string()
    }

    /// Set `inputs.<input>` of the node found by `key`.
    pub fn set_input(&mut self, key: &str, input: &str, value: impl Into<Value>) -> ParallaxResult<()> {
        let id = self
            .find_node(key)
            .ok_or_else(|| ParallaxError::validation(format!("workflow has no '{key}' node")))?
            .to_string();
        let node = self
            .nodes
            .get_mut(&id)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| ParallaxError::validation(format!("workflow node '{id}' is not an object")))?;
        let inputs = node
            .entry("inputs")
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(inputs) = inputs.as_object_mut() else {
            return Err(ParallaxError::validation(format!(
                "workflow node '{id}' inputs are not an object"
            )));
        };
        inputs.insert(input.to_string(), value.into());
        Ok(())
    }

    /// Like [`Workflow::set_input`], but a missing node is skipped. Returns whether it was set.
    pub fn set_input_if_present(
        &mut self,
        key: &str,
        input: &str,
        value: impl Into<Value>,
    ) -> ParallaxResult<bool> {
        if self.find_node(key).is_none() {
            tracing::debug!(node = key, "workflow node not present; input left unset");
            return Ok(false);
        }
        self.set_input(key, input, value)?;
        Ok(true)
    }

    /// Current value of `inputs.<input>` on the node found by `key`.
    pub fn input(&self, key: &str, input: &str) -> Option<&Value> {
        let id = self.find_node(key)?;
        self.nodes.get(id)?.get("inputs")?.get(input)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/workflow.rs"]
mod tests;
