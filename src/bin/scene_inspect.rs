use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ptree::{print_tree, TreeBuilder};

use scene_import_lib::{AttachmentConfig, ImportOptions, Model, ModelImporter, SceneNode, TextureChannel};

#[derive(Parser, Debug)]
#[command(name = "scene-inspect")]
#[command(about = "Import a 3D model and print its scene tree, materials and attachments")]
struct CliArgs {
    /// Model file (.gltf, .glb, .obj)
    model: PathBuf,

    /// Attachment config JSON (array of {ModelName, ModelID, Attachments})
    #[arg(long)]
    attachments: Option<PathBuf>,

    /// Import options JSON; flags below override it
    #[arg(long)]
    options: Option<PathBuf>,

    #[arg(long)]
    no_flip_uvs: bool,

    #[arg(long)]
    no_triangulate: bool,

    /// Also print every resolved material
    #[arg(long)]
    materials: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CliArgs::parse();

    let mut options = match &args.options {
        Some(path) => match ImportOptions::from_json_file(path) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("{:#}", e);
                return ExitCode::FAILURE;
            }
        },
        None => ImportOptions::default(),
    };
    if args.no_flip_uvs {
        options.flip_uvs = false;
    }
    if args.no_triangulate {
        options.triangulate = false;
    }

    let mut model = match ModelImporter::new(options).import(&args.model) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Import failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match &args.attachments {
        Some(path) => match AttachmentConfig::load(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("{:#}", e);
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };
    if let Some(config) = &config {
        config.apply_model_id(&mut model);
    }

    print_scene(&model);
    println!("{}", model.stats());

    if args.materials {
        print_materials(&model);
    }
    if let Some(config) = &config {
        print_attachments(config, &model);
    }

    ExitCode::SUCCESS
}

fn print_scene(model: &Model) {
    let mut tree = TreeBuilder::new(format!("{} ({})", model.model_name(), model.model_id()));
    add_node_to_tree(model.root(), &mut tree);
    if let Err(e) = print_tree(&tree.build()) {
        eprintln!("Failed to print tree: {}", e);
    }
}

fn add_node_to_tree(node: &SceneNode, tree: &mut TreeBuilder) {
    let p = node.transform.position;
    let s = node.transform.scale;
    let mut label = format!(
        "{}  pos ({:.2}, {:.2}, {:.2}) scale ({:.2}, {:.2}, {:.2})",
        node.name, p.x, p.y, p.z, s.x, s.y, s.z
    );
    if !node.sections.is_empty() {
        let triangles: usize = node.sections.iter().map(|s| s.triangle_count()).sum();
        label.push_str(&format!("  [{} sections, {} tris]", node.sections.len(), triangles));
    }

    if node.children.is_empty() {
        tree.add_empty_child(label);
    } else {
        tree.begin_child(label);
        for child in &node.children {
            add_node_to_tree(child, tree);
        }
        tree.end_child();
    }
}

fn print_materials(model: &Model) {
    println!("Materials:");
    for (key, material) in model.materials().iter() {
        let [r, g, b] = material.base_color_or_default();
        println!(
            "  #{} '{}': base ({:.3}, {:.3}, {:.3}) metallic {:.2} roughness {:.2} opacity {:.2}",
            key.0,
            material.name,
            r,
            g,
            b,
            material.metallic_or_default(),
            material.roughness_or_default(),
            material.opacity_or_default()
        );
        for channel in TextureChannel::ALL {
            if let Some(tex) = material.texture(channel) {
                println!(
                    "      {:<10} {}x{} {:?}, {} mips",
                    channel.name(),
                    tex.width(),
                    tex.height(),
                    tex.color_space(),
                    tex.mip_levels().len()
                );
            }
        }
    }
}

fn print_attachments(config: &AttachmentConfig, model: &Model) {
    let bindings = config.bind(model);
    println!("Attachments ({}):", bindings.len());
    for binding in bindings {
        println!(
            "  {} <- {:?} {}",
            binding.node.name, binding.attachment.attachment_type, binding.attachment.asset_path
        );
    }
}
