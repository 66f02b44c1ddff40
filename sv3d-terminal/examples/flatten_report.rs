/// Example: flatten a model and print its draw ranges
///
/// Usage: cargo run --example flatten_report -- path/to/model.gltf
use std::env;
use sv3d_core::{compute_bounding_box, count_components, flatten, import_scene, Normalization};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("Usage: flatten_report <model-file>");
        std::process::exit(2);
    };

    let scene = import_scene(&path)?;
    let bounds = compute_bounding_box(&scene);
    let normalization = Normalization::reference(&bounds);
    let (buffer, ranges) = flatten(&scene, &normalization);

    println!("bounds: {:?} .. {:?}", bounds.min, bounds.max);
    println!(
        "scale {:.4}, {} components ({} expected), {} vertices",
        normalization.scale,
        buffer.len(),
        count_components(&scene),
        buffer.vertex_count()
    );
    for range in &ranges {
        println!(
            "node {:>4} {:<24} floats {:>8}..{:<8} vertices {:?}",
            range.node,
            range.name.as_deref().unwrap_or("-"),
            range.offset,
            range.end(),
            range.vertices()
        );
    }
    Ok(())
}
