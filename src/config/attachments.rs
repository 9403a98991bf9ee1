//! Node attachment metadata.
//!
//! A JSON array mapping a model name to a model ID and a list of named-node
//! attachments. The host decides what to spawn for each binding.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::importer::Model;
use crate::scene::SceneNode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentType {
    StaticMesh,
    #[serde(rename = "VFX")]
    Vfx,
    Blueprint,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NodeAttachment {
    pub node_name: String,
    pub attachment_type: AttachmentType,
    pub asset_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModelAttachmentConfig {
    pub model_name: String,
    #[serde(rename = "ModelID")]
    pub model_id: String,
    pub attachments: Vec<NodeAttachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentConfig {
    pub models: Vec<ModelAttachmentConfig>,
}

/// An attachment paired with the node it targets.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentBinding<'a> {
    pub node: &'a SceneNode,
    pub attachment: &'a NodeAttachment,
}

impl AttachmentConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read attachment config {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Failed to parse attachment config {}", path.display()))
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// First entry for this model name.
    pub fn for_model(&self, model_name: &str) -> Option<&ModelAttachmentConfig> {
        self.models.iter().find(|m| m.model_name == model_name)
    }

    /// Copy the configured model ID onto the model. Returns false when the
    /// model has no entry.
    pub fn apply_model_id(&self, model: &mut Model) -> bool {
        match self.for_model(model.model_name()) {
            Some(entry) if !entry.model_id.is_empty() => {
                model.set_model_id(entry.model_id.clone());
                true
            }
            _ => false,
        }
    }

    /// Pair every attachment configured for `model` with its target node.
    /// Attachments naming a missing node are skipped with a warning.
    pub fn bind<'a>(&'a self, model: &'a Model) -> Vec<AttachmentBinding<'a>> {
        let Some(entry) = self.for_model(model.model_name()) else {
            log::debug!("no attachments configured for '{}'", model.model_name());
            return Vec::new();
        };

        let mut bindings = Vec::with_capacity(entry.attachments.len());
        for attachment in &entry.attachments {
            if attachment.attachment_type == AttachmentType::Unknown {
                log::warn!(
                    "attachment '{}' on node '{}' has an unknown type",
                    attachment.asset_path,
                    attachment.node_name
                );
            }
            match model.find_node(&attachment.node_name) {
                Some(node) => bindings.push(AttachmentBinding { node, attachment }),
                None => log::warn!(
                    "attachment node '{}' not found in model '{}'",
                    attachment.node_name,
                    model.model_name()
                ),
            }
        }
        bindings
    }
}
