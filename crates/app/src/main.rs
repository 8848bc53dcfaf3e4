//! Entry point: load models and textures through one resource cache and report them.
//!
//! Usage:
//!   app [--asset-root=DIR] [--model=[KEY=]PATH]... [--texture=[KEY=]PATH]...
//!       [--obj-missing=first|default] [--no-flip-v] [--log=LEVEL]

use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::{Result, bail};
use asset::{MissingAttributes, ObjOptions};
use resource::{Model, ModelFormat, Resource, ResourceCache, Texture};

#[derive(Clone, Debug, PartialEq)]
struct AssetArg {
    key: String,
    path: PathBuf,
}

#[derive(Debug)]
struct Config {
    asset_root: PathBuf,
    models: Vec<AssetArg>,
    textures: Vec<AssetArg>,
    obj: ObjOptions,
    log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            models: Vec::new(),
            textures: Vec::new(),
            obj: ObjOptions::default(),
            log_level: "info".to_string(),
        }
    }
}

/// `KEY=PATH`, or bare `PATH` keyed by its file stem.
fn parse_asset_arg(value: &str) -> AssetArg {
    match value.split_once('=') {
        Some((key, path)) if !key.is_empty() => AssetArg {
            key: key.to_string(),
            path: PathBuf::from(path),
        },
        _ => {
            let path = PathBuf::from(value);
            let key = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| value.to_string());
            AssetArg { key, path }
        }
    }
}

fn parse_args<I, S>(args: I) -> Config
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut config = Config::default();
    for arg in args {
        let arg = arg.as_ref();
        if let Some(v) = arg.strip_prefix("--asset-root=") {
            config.asset_root = PathBuf::from(v);
        } else if let Some(v) = arg.strip_prefix("--model=") {
            config.models.push(parse_asset_arg(v));
        } else if let Some(v) = arg.strip_prefix("--texture=") {
            config.textures.push(parse_asset_arg(v));
        } else if let Some(v) = arg.strip_prefix("--obj-missing=") {
            config.obj.missing_attributes = match v.to_ascii_lowercase().as_str() {
                "first" => MissingAttributes::FirstDeclared,
                "default" | "none" => MissingAttributes::Default,
                other => {
                    eprintln!("[warn] Unknown --obj-missing '{}', keeping 'first'.", other);
                    MissingAttributes::FirstDeclared
                }
            };
        } else if arg == "--no-flip-v" {
            config.obj.flip_v = false;
        } else if let Some(v) = arg.strip_prefix("--log=") {
            config.log_level = v.to_string();
        } else {
            eprintln!("[warn] Ignoring unknown argument '{}'.", arg);
        }
    }
    config
}

fn report_model(key: &str, model: &Model) {
    let info = model.info();
    log::info!(
        "Model '{}' {} ({:?}): {} meshes, {} bytes",
        key,
        info.id(),
        info.kind(),
        model.meshes().len(),
        model.size_in_bytes()
    );
    for (i, mesh) in model.meshes().iter().enumerate() {
        let bounds = mesh
            .bounds()
            .map(|b| format!("min={:?} max={:?}", b.min, b.max))
            .unwrap_or_else(|| "empty".to_string());
        log::info!(
            "  mesh {} {:?}: {} vertices, {} indices, {} triangles, {}",
            i,
            mesh.name.as_deref().unwrap_or("-"),
            mesh.vertex_count(),
            mesh.index_count(),
            mesh.triangle_count(),
            bounds
        );
    }
    for tex in model.texture_file_names() {
        log::info!("  references texture {}", tex);
    }
}

/// Load one model, request it again to take the cache-hit path, then pull in the
/// textures it references from the model's directory.
fn load_model(cache: &mut ResourceCache, config: &Config, arg: &AssetArg) -> Result<()> {
    let path = config.asset_root.join(&arg.path);
    let format = match ModelFormat::from_path(&path) {
        Some(ModelFormat::Obj(_)) => ModelFormat::Obj(config.obj),
        Some(format) => format,
        None => bail!("unsupported model format: {}", path.display()),
    };

    let model = cache.get_or_load::<Model>(&arg.key, &path, format)?;
    let again = cache.get_or_load::<Model>(&arg.key, &path, format)?;
    if !Rc::ptr_eq(&model, &again) {
        bail!("cache returned two copies of '{}'", arg.key);
    }

    let model = model.borrow();
    report_model(&arg.key, &model);

    let dir = path.parent().unwrap_or(Path::new("."));
    for name in model.texture_file_names() {
        if let Err(e) = cache.get_or_load::<Texture>(name, dir.join(name), ()) {
            log::warn!("Texture referenced by '{}' unavailable: {}", arg.key, e);
        }
    }
    Ok(())
}

fn load_texture(cache: &mut ResourceCache, config: &Config, arg: &AssetArg) -> Result<()> {
    let path = config.asset_root.join(&arg.path);
    let texture = cache.get_or_load::<Texture>(&arg.key, &path, ())?;
    let texture = texture.borrow();
    let (w, h) = texture.dimensions().unwrap_or_default();
    log::info!(
        "Texture '{}' {}: {}x{}, {} bytes",
        arg.key,
        texture.info().id(),
        w,
        h,
        texture.size_in_bytes()
    );
    Ok(())
}

fn main() -> Result<()> {
    let config = parse_args(std::env::args().skip(1));
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    log::info!(
        "Starting asset loader. root={}, models={}, textures={}, obj={:?}",
        config.asset_root.display(),
        config.models.len(),
        config.textures.len(),
        config.obj
    );

    let mut cache = ResourceCache::new();
    let mut failures = 0usize;

    for arg in &config.models {
        if let Err(e) = load_model(&mut cache, &config, arg) {
            log::error!("Model '{}': {:#}", arg.key, e);
            failures += 1;
        }
    }
    for arg in &config.textures {
        if let Err(e) = load_texture(&mut cache, &config, arg) {
            log::error!("Texture '{}': {:#}", arg.key, e);
            failures += 1;
        }
    }

    log::info!(
        "{} resources cached, {} bytes total",
        cache.len(),
        cache.total_size_in_bytes()
    );
    cache.unload_all();

    if failures > 0 {
        bail!("{} asset(s) failed to load", failures);
    }
    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
