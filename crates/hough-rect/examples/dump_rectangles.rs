use anyhow::Context;
use hough_rect::{find_rectangles_image, load_config, DetectionConfig};
use image::ImageReader;
use serde::Serialize;
use std::time::Instant;
use std::{fs::File, io::Write, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct RectangleDump {
    image: String,
    width: u32,
    height: u32,
    elapsed_ms: f64,
    rectangles: Vec<hough_rect::Rectangle>,
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let mut input: Option<PathBuf> = None;
    let mut cfg = DetectionConfig::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path: PathBuf = args.next().context("expected a path after --config")?.into();
                cfg = load_config(&path)?;
            }
            other if other.starts_with("--") => anyhow::bail!("unknown argument: {other}"),
            other => input = Some(other.into()),
        }
    }

    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .init();

    let input = input
        .or_else(|| cfg.image.clone())
        .context("usage: dump_rectangles <edge-image> [--config cfg.json]")?;
    let rect_cfg = cfg.rectangle_config()?;

    let img = ImageReader::open(&input)
        .with_context(|| format!("opening {}", input.display()))?
        .decode()?
        .to_luma8();

    let started = Instant::now();
    let rectangles = find_rectangles_image(&img, &rect_cfg)?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    tracing::info!(count = rectangles.len(), elapsed_ms, "rectangle scan finished");

    let dump = RectangleDump {
        image: input.to_string_lossy().into_owned(),
        width: img.width(),
        height: img.height(),
        elapsed_ms,
        rectangles,
    };

    let json_out = cfg
        .output_json
        .unwrap_or_else(|| input.with_extension("rectangles.json"));
    let mut json_file = File::create(&json_out)?;
    serde_json::to_writer_pretty(&mut json_file, &dump)?;
    json_file.write_all(b"\n")?;
    println!("rectangles: {:?} -> {:?}", input, json_out);

    Ok(())
}
