//! Engine-agnostic model import.
//!
//! Parses a 3D model file (glTF/GLB, OBJ, or a host-built [`source::SourceScene`]),
//! converts its node hierarchy into a [`scene::SceneNode`] tree in a Z-up
//! convention, and resolves every material once into a [`material::ResolvedMaterial`]
//! whose textures are decoded to BGRA8 (including embedded and DDS textures).
//!
//! ```no_run
//! use scene_import_lib::{ImportOptions, ModelImporter};
//!
//! let model = ModelImporter::new(ImportOptions::default())
//!     .import(std::path::Path::new("assets/ship.glb"))?;
//! for node in model.nodes() {
//!     for section in &node.sections {
//!         let _material = model.material_for(section);
//!     }
//! }
//! # Ok::<(), scene_import_lib::ImportError>(())
//! ```

pub mod config;
pub mod error;
pub mod importer;
pub mod material;
pub mod math;
pub mod scene;
pub mod source;
pub mod texture;

pub use config::attachments::{AttachmentBinding, AttachmentConfig, AttachmentType};
pub use config::ImportOptions;
pub use error::ImportError;
pub use importer::{Model, ModelImporter, ModelStats};
pub use material::{MaterialKey, ResolvedMaterial, TextureChannel};
pub use math::Transform;
pub use scene::{MeshSection, SceneNode};
pub use texture::{ColorSpace, DecodedTexture};
