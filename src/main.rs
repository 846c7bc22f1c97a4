//! Softdepth CLI - Luminance-driven Depth Maps
//!
//! Renders depth maps from the command line and inspects or stamps the PNG
//! text records the library writes.

use anyhow::{bail, Context, Result};
use softdepth::metadata::{self, png};
use softdepth::prelude::*;
use std::path::Path;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("softdepth");

    if args.len() < 2 {
        print_usage(program);
        return;
    }

    let result = match args[1].as_str() {
        "render" => render(&args[2..]),
        "inspect" => inspect(&args[2..]),
        "stamp" => stamp(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage(program);
            Ok(())
        }
        "version" | "--version" => {
            println!("{} {}", softdepth::NAME, softdepth::VERSION);
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(program);
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    println!("🌗 Softdepth v{}", softdepth::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  render <in> <out> [options]      Render a depth map (settings embedded)");
    println!("  inspect <png>                    List chunks and text records");
    println!("  stamp <in.png> <key> <value> <out.png>  Add a text record");
    println!("  help                             Show this help message");
    println!();
    println!("Render options:");
    println!("  --bias <0..1>       Near/far balance (default: 0.5)");
    println!("  --contrast <0..1>   Tone curve steepness (default: 1.0)");
    println!("  --edge <0..1>       Edge emphasis (default: 0)");
    println!("  --smooth <px>       Guided filter radius, 0 disables (default: 0)");
    println!("  --invert            Swap near and far");
    println!("  --config <file>     Pipeline configuration (TOML)");
    println!();
    println!("Settings stamped into a PNG input are restored first; flags override them.");
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .with_context(|| format!("{} needs a value", flag))
}

fn parse_number<T: std::str::FromStr>(raw: &str, flag: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| anyhow::anyhow!("invalid value for {}: '{}'", flag, raw))
}

fn render(args: &[String]) -> Result<()> {
    if args.len() < 2 {
        bail!("render needs an input and an output path");
    }
    let input = &args[0];
    let output = &args[1];

    let mut edits: Vec<Box<dyn Fn(FilterParameters) -> FilterParameters>> = Vec::new();
    let mut config = PipelineConfig::default();

    let mut i = 2;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--bias" => {
                let v: f32 = parse_number(flag_value(args, i, flag)?, flag)?;
                edits.push(Box::new(move |p| p.with_bias(v)));
                i += 2;
            }
            "--contrast" => {
                let v: f32 = parse_number(flag_value(args, i, flag)?, flag)?;
                edits.push(Box::new(move |p| p.with_contrast(v)));
                i += 2;
            }
            "--edge" => {
                let v: f32 = parse_number(flag_value(args, i, flag)?, flag)?;
                edits.push(Box::new(move |p| p.with_edge_amount(v)));
                i += 2;
            }
            "--smooth" => {
                let v: u32 = parse_number(flag_value(args, i, flag)?, flag)?;
                edits.push(Box::new(move |p| p.with_smooth_radius(v)));
                i += 2;
            }
            "--invert" => {
                edits.push(Box::new(|p| p.with_invert(true)));
                i += 1;
            }
            "--config" => {
                let path = flag_value(args, i, flag)?;
                config = PipelineConfig::load(path)
                    .with_context(|| format!("loading config {}", path))?;
                i += 2;
            }
            other => bail!("unknown option: {}", other),
        }
    }

    let mut session = DepthSession::new(config);
    let restored = session
        .load_path(input)
        .with_context(|| format!("loading {}", input))?;
    if restored.is_some() {
        println!("↺  Restored embedded settings from {}", input);
    }
    for edit in &edits {
        session.update_params(edit);
    }

    println!("⚙️  Rendering {} -> {}", input, output);
    let png = session.export_png().context("rendering depth map")?;
    softdepth::io::write_file(output, &png).with_context(|| format!("writing {}", output))?;

    let params = session.params();
    if let Some(stats) = session.last_stats() {
        println!(
            "✅ {} pixels in {:?} (bias {:.2}, contrast {:.2}, edge {:.2}, smooth {}, invert {})",
            stats.pixels,
            stats.total_duration,
            params.bias,
            params.contrast,
            params.edge_amount,
            params.smooth_radius,
            params.invert
        );
    }
    Ok(())
}

fn inspect(args: &[String]) -> Result<()> {
    let path = args.first().context("inspect needs a file")?;
    let bytes = softdepth::io::read_file(path).with_context(|| format!("reading {}", path))?;
    let Some(report) = png::inspect(&bytes) else {
        bail!("{} is not a PNG file", path);
    };

    println!("{} ({} bytes)", path, bytes.len());
    println!();
    println!("  {:>8}  {:<4}  {:>8}  CRC", "offset", "type", "length");
    for chunk in &report.chunks {
        println!(
            "  {:>8}  {:<4}  {:>8}  {}",
            chunk.offset,
            chunk.kind,
            chunk.length,
            if chunk.crc_ok { "ok" } else { "BAD" }
        );
    }
    if !report.terminated {
        println!("  ⚠️  no IEND chunk reached");
    }
    if report.trailing_bytes > 0 {
        println!("  ⚠️  {} trailing bytes after the last chunk", report.trailing_bytes);
    }

    let records = png::read_text_records(&bytes);
    if !records.is_empty() {
        println!();
        println!("Text records:");
        for record in &records {
            println!("  • {} = {}", record.key, truncate(&record.value, 96));
        }
    }

    if let Some(params) = metadata::read_settings(&bytes) {
        println!();
        println!("Depth settings: {}", serde_json::to_string(&params)?);
    }
    if let Some(pose) = metadata::read_pose(&bytes) {
        let (w, h) = pose.image_size.map(|[w, h]| (w, h)).unwrap_or((1, 1));
        let joints = pose.to_skeleton(w, h).map(|s| s.joint_count()).unwrap_or(0);
        println!();
        println!(
            "Pose: {} people, {} joints on the first, format '{}'",
            pose.people.len(),
            joints,
            pose.keypoint_format
        );
    }
    Ok(())
}

fn stamp(args: &[String]) -> Result<()> {
    let [input, key, value, output] = args else {
        bail!("stamp needs <in.png> <key> <value> <out.png>");
    };
    let bytes = softdepth::io::read_file(input).with_context(|| format!("reading {}", input))?;
    if !png::has_signature(&bytes) {
        bail!("{} is not a PNG file", input);
    }
    let stamped = png::write_text_record(&bytes, key, value);
    if stamped.len() == bytes.len() {
        bail!("could not add record '{}' (invalid key or no IEND chunk)", key);
    }
    softdepth::io::write_file(Path::new(output), &stamped)
        .with_context(|| format!("writing {}", output))?;
    println!("✅ Stamped '{}' into {}", key, output);
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
