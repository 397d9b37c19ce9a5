//! Cluster Bench
//!
//! Runs the clustered light assignment over a scene for a number of frames
//! while orbiting the camera around the origin, and reports timing and
//! cluster statistics.
//!
//! Usage:
//!   cluster-bench [--scene FILE] [--lights N] [--frames N] [--grid X Y Z]
//!                 [--max-lights N] [--perspective-correct] [--counts-only]
//!                 [--gpu] [--save FILE]
//!
//! Set `RUST_LOG=debug` for per-frame statistics.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use glam::Quat;
use light_clusters::{
    CameraState, ClusterAssigner, ClusterError, ClusterGrid, ClusterScene, ClusterSink, ClusterStats,
    GpuClusterTexture, LateralScaling, RecordingSink, ResetMode, Result,
};

struct BenchArgs {
    scene: Option<PathBuf>,
    lights: usize,
    frames: u32,
    grid: Option<(u32, u32, u32)>,
    max_lights: Option<u32>,
    perspective_correct: bool,
    counts_only: bool,
    gpu: bool,
    save: Option<PathBuf>,
}

impl Default for BenchArgs {
    fn default() -> Self {
        Self {
            scene: None,
            lights: 512,
            frames: 120,
            grid: None,
            max_lights: None,
            perspective_correct: false,
            counts_only: false,
            gpu: false,
            save: None,
        }
    }
}

fn parse_args() -> BenchArgs {
    let mut args = BenchArgs::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scene" => args.scene = it.next().map(PathBuf::from),
            "--save" => args.save = it.next().map(PathBuf::from),
            "--lights" => {
                if let Some(n) = it.next().and_then(|s| s.parse().ok()) {
                    args.lights = n;
                }
            }
            "--frames" => {
                if let Some(n) = it.next().and_then(|s| s.parse().ok()) {
                    args.frames = n;
                }
            }
            "--grid" => {
                let dims: Vec<u32> = (0..3).filter_map(|_| it.next()?.parse().ok()).collect();
                if let [x, y, z] = dims[..] {
                    args.grid = Some((x, y, z));
                }
            }
            "--max-lights" => args.max_lights = it.next().and_then(|s| s.parse().ok()),
            "--perspective-correct" => args.perspective_correct = true,
            "--counts-only" => args.counts_only = true,
            "--gpu" => args.gpu = true,
            other => log::warn!("[Bench] ignoring unknown argument '{}'", other),
        }
    }
    args
}

fn build_scene(args: &BenchArgs) -> Result<ClusterScene> {
    let mut scene = match &args.scene {
        Some(path) => {
            log::info!("[Bench] loading scene {}", path.display());
            ClusterScene::load(path)?
        }
        None => ClusterScene::light_rings(args.lights, 4, 40.0, 6.0),
    };

    if let Some((x, y, z)) = args.grid {
        scene.config.grid = ClusterGrid::new(x, y, z)?;
    }
    if let Some(max_lights) = args.max_lights {
        scene.config.max_lights_per_cluster = max_lights;
    }
    if args.perspective_correct {
        scene.config.lateral_scaling = LateralScaling::PerspectiveCorrect;
    }
    if args.counts_only {
        scene.config.reset_mode = ResetMode::CountsOnly;
    }
    scene.config.validate()?;
    Ok(scene)
}

/// Camera rotated about the world Y axis through the origin.
fn orbit(camera: &CameraState, angle: f32) -> CameraState {
    let rotation = Quat::from_rotation_y(angle);
    CameraState {
        position: rotation * camera.position,
        forward: rotation * camera.forward,
        up: rotation * camera.up,
        ..*camera
    }
}

fn create_gpu_sink(texture: &light_clusters::ClusterTexture) -> Result<GpuClusterTexture> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .map_err(|e| ClusterError::Upload(format!("no GPU adapter: {}", e)))?;

    log::info!("[Bench] Using GPU: {}", adapter.get_info().name);

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("Cluster Bench Device"),
        ..Default::default()
    }))
    .map_err(|e| ClusterError::Upload(format!("failed to create device: {}", e)))?;

    GpuClusterTexture::new(&device, &queue, texture)
}

fn run_frames(
    assigner: &mut ClusterAssigner,
    scene: &ClusterScene,
    frames: u32,
    sink: &mut dyn ClusterSink,
) -> Result<(Duration, ClusterStats)> {
    let mut elapsed = Duration::ZERO;
    let mut peak = ClusterStats::default();

    for frame in 0..frames {
        let angle = frame as f32 / frames.max(1) as f32 * std::f32::consts::TAU;
        let camera = orbit(&scene.camera, angle);

        let start = Instant::now();
        let stats = *assigner.update_clusters(&camera, &scene.lights, sink)?;
        elapsed += start.elapsed();

        if stats.light_assignments > peak.light_assignments {
            peak = stats;
        }
    }

    Ok((elapsed, peak))
}

fn run(args: BenchArgs) -> Result<()> {
    let scene = build_scene(&args)?;

    if let Some(path) = &args.save {
        scene.save(path)?;
        log::info!("[Bench] scene written to {}", path.display());
    }

    let mut assigner = ClusterAssigner::new(scene.config.clone())?;
    log::info!(
        "[Bench] {} lights, {} frames, {:?} lateral scaling, {:?} reset",
        scene.lights.len(),
        args.frames,
        scene.config.lateral_scaling,
        scene.config.reset_mode
    );

    let (elapsed, peak) = if args.gpu {
        let mut sink = create_gpu_sink(assigner.texture())?;
        let result = run_frames(&mut assigner, &scene, args.frames, &mut sink)?;
        log::info!("[Bench] uploaded {} frames", sink.uploads());
        result
    } else {
        let mut sink = RecordingSink::new();
        run_frames(&mut assigner, &scene, args.frames, &mut sink)?
    };

    let frames = args.frames.max(1);
    log::info!(
        "[Bench] total {:.2} ms, {:.3} ms/frame",
        elapsed.as_secs_f64() * 1000.0,
        elapsed.as_secs_f64() * 1000.0 / frames as f64
    );
    log::info!(
        "[Bench] busiest frame: {}/{} active clusters, {} assignments, avg {:.2} per active cluster, max {}",
        peak.active_clusters,
        peak.total_clusters,
        peak.light_assignments,
        peak.average_lights_per_active_cluster(),
        peak.max_lights_in_cluster
    );
    if peak.overflow_clusters > 0 {
        log::info!(
            "[Bench] busiest frame overflowed {} clusters ({} lights unscanned)",
            peak.overflow_clusters,
            peak.unscanned_lights
        );
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(parse_args()) {
        log::error!("[Bench] {}", err);
        std::process::exit(1);
    }
}
