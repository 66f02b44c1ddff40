/// SV3D Terminal Viewer
///
/// Loads a model, flattens it into one normalized vertex stream and renders it
/// in the terminal as a side-by-side stereo pair (or a single mono view).
/// Controls:
///   - Up/Down: move forward/backward (mono) or change convergence depth (stereo)
///   - Left/Right: narrow/widen the field of view
///   - z/x, a/s: rotate the model, Space resets the rotation
///   - M: toggle mono/stereo
///   - Q/ESC: Quit
use clap::Parser;
use log::info;
use std::path::PathBuf;
use sv3d_core::{
    compute_bounding_box, flatten_with, import_scene, Normalization, PrimitiveMode, StereoCamera,
};
use sv3d_terminal::{TerminalApp, ViewerConfig};

#[derive(Parser, Debug)]
#[command(name = "sv3d-terminal", version, about = "Stereo ASCII model viewer")]
struct Args {
    /// Model file (.obj, .stl, .gltf or .glb)
    model: PathBuf,

    /// Primitive type: points, lines or triangles
    render_type: PrimitiveMode,

    /// TOML config file, defaults are used when it does not exist
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start with a single mono view instead of the stereo pair
    #[arg(long)]
    mono: bool,

    /// Distance between the eyes, overrides the config
    #[arg(long)]
    interocular: Option<f32>,

    /// Distance of the zero parallax plane, overrides the config
    #[arg(long)]
    z_depth: Option<f32>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut config = ViewerConfig::load(args.config.as_deref())?;
    if let Some(interocular) = args.interocular {
        config.stereo.interocular = interocular;
    }
    if let Some(z_depth) = args.z_depth {
        config.stereo.z_depth = z_depth;
        config.stereo.adjust_depth(0.0);
    }

    let scene = import_scene(&args.model)?;
    let bounds = compute_bounding_box(&scene);
    let normalization = Normalization::from_bounds(&bounds, config.normalization.target_width);
    let (buffer, ranges) = flatten_with(&scene, &normalization, config.normalization.space);
    info!(
        "Flattened {} vertices into {} draw ranges, drawing {}",
        buffer.vertex_count(),
        ranges.len(),
        args.render_type
    );

    let camera = StereoCamera::new(&config.camera);
    let mut app = TerminalApp::new(
        buffer,
        ranges,
        args.render_type,
        camera,
        config.stereo,
        !args.mono,
    )?;
    app.run()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_render_type_is_validated() {
        let args = Args::try_parse_from(["sv3d-terminal", "cube.obj", "lines", "--mono"]).unwrap();
        assert_eq!(args.render_type, PrimitiveMode::Lines);
        assert!(args.mono);

        let err = Args::try_parse_from(["sv3d-terminal", "cube.obj", "quads"]).unwrap_err();
        assert!(err.to_string().contains("need a valid render type"));
    }
}
