//! Persistence of a power tree as a JSON project document.
//!
//! A document stores every stage record with its layout position, plus the
//! edge list. Upstream pointers inside stage records are informative only:
//! on load the structure is rebuilt from `edges`, each edge re-validated.

use crate::graph::tree::check_edge;
use crate::graph::{Edge, PowerTree};
use crate::store::{NodeId, Position, Registry, Stage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Malformed project document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not access project file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Stage id {0} appears more than once in the document")]
    DuplicateNode(NodeId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub stage: Stage,
    #[serde(alias = "pos", default)]
    pub position: Position,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Document {
    /// Pretty-printed JSON, two-space indented.
    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }
}

impl PowerTree {
    /// Snapshot of the tree, stages in id order.
    pub fn serialize(&self) -> Document {
        let nodes = self
            .registry
            .ids()
            .filter_map(|id| {
                let stage = self.registry.get(id)?.clone();
                let position = self.registry.position(id)?;
                Some(NodeRecord { stage, position })
            })
            .collect();
        Document { nodes, edges: self.edges() }
    }

    /// Replaces the whole tree with the document's content and recomputes.
    /// On error the tree is left as it was.
    pub fn deserialize(&mut self, document: Document) -> Result<(), DocumentError> {
        self.registry = build_registry(document)?;
        self.recompute();
        Ok(())
    }

    pub fn from_document(document: Document) -> Result<Self, DocumentError> {
        let mut tree = PowerTree::new();
        tree.deserialize(document)?;
        Ok(tree)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        self.serialize().to_json_string()
    }

    pub fn load_json(&mut self, s: &str) -> Result<(), DocumentError> {
        self.deserialize(Document::from_json_str(s)?)
    }
}

fn build_registry(document: Document) -> Result<Registry, DocumentError> {
    let mut registry = Registry::new();
    for record in document.nodes {
        registry
            .insert_existing(record.stage, record.position)
            .map_err(DocumentError::DuplicateNode)?;
    }

    let mut skipped = 0;
    for edge in document.edges {
        match check_edge(&registry, edge.src, edge.dst) {
            Ok(()) => registry.link(edge.src, edge.dst),
            Err(e) => {
                skipped += 1;
                log::warn!("skipping edge {} while loading document: {}", edge, e);
            }
        }
    }
    log::debug!("loaded {} stage(s), skipped {} edge(s)", registry.count(), skipped);
    Ok(registry)
}
