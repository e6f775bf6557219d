use clap::Parser;
use slam_viewer_lib::common::{
    DEFAULT_DOWNSAMPLE_CAMERAS, DEFAULT_DOWNSAMPLE_LINKS, DEFAULT_RESIZE, DEFAULT_RESIZE_FOR_LINKS,
};
use slam_viewer_lib::{
    build_mesh, load_poses, load_poses_async, save_ply, save_ply_async, Color, TrajectoryConfig,
};
use std::error::Error;
use std::process;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "SLAM Viewer",
    version = "1.0",
    author = "Denis Avvakumov",
    about = "Converts camera trajectories into PLY meshes"
)]
struct Cli {
    #[arg(
        short = 'i',
        long = "input",
        value_name = "INPUT",
        required = true,
        help = "Path to the pose file (one pose per line, last 7 values: x y z qx qy qz qw)."
    )]
    input: String,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "OUTPUT",
        required = true,
        help = "Path to the output file ('.ply' is appended if missing)."
    )]
    output: String,

    #[arg(
        short = 'r',
        long = "resize",
        value_name = "FACTOR",
        default_value_t = DEFAULT_RESIZE,
        help = "Scale of the camera glyphs."
    )]
    resize: f32,

    #[arg(
        short = 'l',
        long = "resize-links",
        value_name = "FACTOR",
        default_value_t = DEFAULT_RESIZE_FOR_LINKS,
        help = "Scale of the links, relative to the camera scale."
    )]
    resize_for_links: f32,

    #[arg(
        short = 'f',
        long = "first-color",
        value_names = ["R", "G", "B"],
        num_args = 3,
        allow_negative_numbers = true,
        default_values_t = [255, 0, 0],
        help = "Color of the first camera (values are clamped to 0..=255)."
    )]
    first_color: Vec<i32>,

    #[arg(
        short = 'c',
        long = "last-color",
        value_names = ["R", "G", "B"],
        num_args = 3,
        allow_negative_numbers = true,
        default_values_t = [0, 0, 255],
        help = "Color of the last camera (values are clamped to 0..=255)."
    )]
    last_color: Vec<i32>,

    #[arg(
        short = 'd',
        long = "downsample-cameras",
        value_name = "STRIDE",
        default_value_t = DEFAULT_DOWNSAMPLE_CAMERAS,
        allow_negative_numbers = true,
        help = "Draw every n-th camera (the last one is always drawn, <= 0 draws none)."
    )]
    downsample_cameras: i32,

    #[arg(
        short = 'k',
        long = "downsample-links",
        value_name = "STRIDE",
        default_value_t = DEFAULT_DOWNSAMPLE_LINKS,
        allow_negative_numbers = true,
        help = "Link every n-th camera (the last one is always linked, <= 0 draws no links)."
    )]
    downsample_links: i32,

    #[arg(
        short = 'q',
        long = "correction",
        value_names = ["RX", "RY", "RZ"],
        num_args = 1..=3,
        allow_negative_numbers = true,
        help = "Rotation applied to every camera orientation, as Euler angles in degrees."
    )]
    correction: Vec<f32>,

    #[arg(short = 'v', long = "verbose", help = "Enable debug logging.")]
    verbose: bool,

    #[arg(
        short = 'a',
        long = "async",
        default_value = "false",
        help = "Enable asynchronous file I/O."
    )]
    async_mode: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn color_from_args(values: &[i32]) -> Color {
    match values {
        [r, g, b] => Color::from_ints(*r, *g, *b),
        _ => Color::default(),
    }
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if !cli.correction.is_empty() && cli.correction.len() < 3 {
        warn!(
            "Ignoring angle correction: expected 3 angles, got {}",
            cli.correction.len()
        );
    }

    let config = TrajectoryConfig::default()
        .with_resize(cli.resize)
        .with_resize_for_links(cli.resize_for_links)
        .with_first_color(color_from_args(&cli.first_color))
        .with_last_color(color_from_args(&cli.last_color))
        .with_cameras_downsample(cli.downsample_cameras)
        .with_links_downsample(cli.downsample_links)
        .with_angle_correction(&cli.correction);
    debug!(?config, "configuration");

    let mode = if cli.async_mode {
        "Asynchronous"
    } else {
        "Synchronous"
    };
    info!("Mode: {} | Input: {} | Output: {}", mode, cli.input, cli.output);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let start = Instant::now();

    let poses = if cli.async_mode {
        rt.block_on(load_poses_async(&cli.input))
    } else {
        load_poses(&cli.input)
    }
    .unwrap_or_else(|e| {
        error!("Error reading poses from {}: {}", cli.input, e);
        process::exit(1);
    });

    let mesh = build_mesh(&poses, &config).unwrap_or_else(|e| {
        error!("Invalid trajectory: {}", e);
        process::exit(1);
    });

    let written = if cli.async_mode {
        rt.block_on(save_ply_async(&mesh, &cli.output))
    } else {
        save_ply(&mesh, &cli.output)
    }
    .unwrap_or_else(|e| {
        error!("Error writing output '{}': {}", cli.output, e);
        process::exit(1);
    });

    let elapsed = start.elapsed().as_millis();
    info!("Conversion Time: {} ms", elapsed);
    info!(
        "Successfully wrote {} vertices and {} faces to '{}'.",
        mesh.vertex_count(),
        mesh.face_count(),
        written.display()
    );

    Ok(())
}
