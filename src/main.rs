use clap::Parser;
use glam::{UVec2, Vec2};
use rand::{SeedableRng, rngs::StdRng};
use stablefluid::{
    AnalysisRecorder, ImageExporter, PointerEvent, PointerTracker, Simulation,
    SimulationConfig, input,
};
use std::path::PathBuf;

/// Run a headless fluid simulation and export its dye as PNG frames
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON simulation configuration, defaults are used for missing keys
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 120)]
    frames: usize,

    /// Directory receiving the PNG frames and the metrics report
    #[arg(short, long, default_value = "frames")]
    output: PathBuf,

    /// Export one frame every N simulated frames
    #[arg(short, long, default_value_t = 10)]
    export_every: usize,

    /// Size of the exported images, in pixels
    #[arg(long, default_value_t = 512)]
    image_size: u32,

    /// Number of random splats seeding the first frame
    #[arg(long, default_value_t = 8)]
    bursts: usize,

    /// Seed of the random splat generator
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SimulationConfig::from_json_file(path)?,
        None => SimulationConfig::default(),
    };
    let dt = config.max_dt;
    let mut simulation = Simulation::new(config)?;
    std::fs::create_dir_all(&args.output)?;

    let exporter = ImageExporter::new(args.image_size, args.image_size);
    let mut recorder = AnalysisRecorder::new();
    let display = UVec2::splat(args.image_size);
    let field = UVec2::from_array(simulation.config().velocity_resolution);

    // Seed the domain with random bursts of dye and momentum
    let mut rng = StdRng::seed_from_u64(args.seed);
    let radius = simulation.config().splat_radius;
    for splat in input::random_splats(&mut rng, args.bursts, field, radius, 60.0) {
        simulation.inject_splat(splat);
    }

    // Then keep stirring with a scripted circular drag
    let mut pointer = PointerTracker::new(radius, simulation.config().splat_force);
    let center = display.as_vec2() / 2.0;
    let orbit = display.x as f32 / 4.0;
    let mut last_position = center + Vec2::new(orbit, 0.0);

    for frame in 0..args.frames {
        let angle = frame as f32 * 0.1;
        let position = center + orbit * Vec2::from_angle(angle);
        let event = PointerEvent {
            position,
            delta: position - last_position,
            active: frame + 1 < args.frames / 2,
        };
        last_position = position;
        pointer.handle(event, display, field);
        for splat in pointer.take_splats() {
            simulation.inject_splat(splat);
        }

        simulation.advance(dt)?;

        let metrics = recorder.record_frame(simulation.state(), frame);
        if frame % args.export_every.max(1) == 0 {
            metrics.print_summary();
            let path = args.output.join(format!("dye_{frame:04}.png"));
            exporter.export_dye_png(simulation.current_dye(), &path)?;
            let path = args.output.join(format!("velocity_{frame:04}.png"));
            exporter.export_velocity_png(
                simulation.state().current_velocity(),
                metrics.max_velocity,
                &path,
            )?;
        }
    }

    recorder.print_trends();
    std::fs::write(args.output.join("metrics.json"), recorder.to_json()?)?;
    println!(
        "Simulated {} frames, output written to {}",
        args.frames,
        args.output.display()
    );
    Ok(())
}
