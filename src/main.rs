//! motion-piano — prerender sampled instruments and play them from a random
//! note pool.

use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use motion_piano::assemble::{sampler_from_manifest, Assembler, RenderSettings, SampledBuffersRequest};
use motion_piano::audio::{AudioCommand, AudioEngine};
use motion_piano::config::Config;
use motion_piano::instrument::{Instrument, SamplerOptions, Synth};
use motion_piano::library::DiskLibrary;
use motion_piano::render::RenderCoordinator;
use motion_piano::sample::{FileLoader, Manifest};
use motion_piano::stage::{ActiveStage, EndFn, EndHandle};
use motion_piano::theory::Note;
use motion_piano::toy::{note_pool, NotePicker};

/// Seconds of release tail allowed to ring out before the engine stops.
const RELEASE_TAIL: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(name = "motion-piano")]
#[command(about = "Prerender sampled instruments and play them note by note")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.motion-piano/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Octaves of the note pool, overriding the config
    #[arg(long, global = true, value_delimiter = ',')]
    octaves: Option<Vec<i32>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the note pool
    Notes,

    /// Prerender one buffer per pool note into the sample library
    Render {
        /// Samples manifest (JSON)
        manifest: PathBuf,

        /// Instrument in the manifest to render from
        instrument: String,

        /// Library name of the result (default: <instrument>-rendered)
        #[arg(long)]
        name: Option<String>,

        /// Semitones added on top of each note
        #[arg(long, allow_hyphen_values = true)]
        pitch_shift: Option<i32>,

        /// Render the recordings backwards
        #[arg(long)]
        reverse: bool,
    },

    /// Trigger random pool notes until Ctrl-C
    Play {
        /// Samples manifest; without it a synth plays
        #[arg(long, requires = "instrument")]
        manifest: Option<PathBuf>,

        /// Instrument in the manifest
        #[arg(long)]
        instrument: Option<String>,

        /// Play prerendered buffers instead of stretching at trigger time
        #[arg(long)]
        prerender: bool,

        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,

        /// Seed of the note picker
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if let Some(octaves) = cli.octaves {
        config.octaves = octaves;
    }

    match cli.command {
        Commands::Notes => {
            let pool: Vec<String> = note_pool(&config.octaves).iter().map(Note::to_string).collect();
            println!("{}", pool.join(" "));
            Ok(())
        }
        Commands::Render {
            manifest,
            instrument,
            name,
            pitch_shift,
            reverse,
        } => render(&config, manifest, instrument, name, pitch_shift, reverse),
        Commands::Play {
            manifest,
            instrument,
            prerender,
            seconds,
            seed,
        } => play(&config, manifest, instrument, prerender, seconds, seed),
    }
}

fn assembler(config: &Config) -> Assembler {
    Assembler::new(
        Arc::new(RenderCoordinator::new()),
        Arc::new(DiskLibrary::new(&config.library_dir)),
        Arc::new(FileLoader::new(&config.samples_dir, config.sample_rate)),
        RenderSettings {
            format: config.render_format(),
            search: config.search,
        },
    )
}

fn sampled_request(config: &Config, instrument: &str, name: String) -> SampledBuffersRequest {
    SampledBuffersRequest {
        additional_render_length: config.additional_render_length,
        pitch_shift: config.pitch_shift,
        ..SampledBuffersRequest::new(instrument, name, note_pool(&config.octaves))
    }
    .on_progress(|fraction| eprint!("\rrendering {:>3.0}%", fraction * 100.0))
}

fn render(
    config: &Config,
    manifest: PathBuf,
    instrument: String,
    name: Option<String>,
    pitch_shift: Option<i32>,
    reverse: bool,
) -> Result<(), Box<dyn Error>> {
    let samples = Manifest::load(&manifest)?;
    let name = name.unwrap_or_else(|| format!("{instrument}-rendered"));
    let mut request = sampled_request(config, &instrument, name.clone());
    if let Some(shift) = pitch_shift {
        request.pitch_shift = shift;
    }
    request.reverse = reverse;

    let started = Instant::now();
    let rendered = assembler(config).prerender_sampled_buffers(&samples, &request)?;
    eprintln!();
    println!(
        "'{name}': {} notes in {:.1}s, stored in {}",
        rendered.len(),
        started.elapsed().as_secs_f64(),
        config.library_dir.display()
    );
    Ok(())
}

fn play(
    config: &Config,
    manifest: Option<PathBuf>,
    instrument: Option<String>,
    prerender: bool,
    seconds: Option<u64>,
    seed: Option<u64>,
) -> Result<(), Box<dyn Error>> {
    let source: Box<dyn Instrument> = match (manifest, instrument) {
        (Some(manifest), Some(instrument)) => {
            let samples = Manifest::load(&manifest)?;
            if prerender {
                let request = sampled_request(config, &instrument, format!("{instrument}-rendered"));
                let sampler = assembler(config).prerender_sampler(&samples, &request, SamplerOptions::default())?;
                eprintln!();
                Box::new(sampler)
            } else {
                let loader = FileLoader::new(&config.samples_dir, config.sample_rate);
                let options = SamplerOptions {
                    search: config.search,
                    pitch_shift: config.pitch_shift,
                    ..SamplerOptions::default()
                };
                Box::new(sampler_from_manifest(&samples, &instrument, &loader, options)?)
            }
        }
        _ => Box::new(Synth::default()),
    };

    let mut engine = AudioEngine::with_config(source, config.sample_rate, config.channels as u16)?;

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))?;

    // The stage schedules through a channel; the loop below owns the engine.
    let (commands, pending) = mpsc::channel::<AudioCommand>();
    let pool = note_pool(&config.octaves);
    let mut picker = seed.map(NotePicker::new).unwrap_or_else(NotePicker::from_entropy);
    let on_deactivate = commands.clone();
    let stage = ActiveStage::new(
        move || {
            let _ = on_deactivate.send(AudioCommand::ReleaseAll);
        },
        move || {
            let note = *picker.pick_random(&pool)?;
            let velocity = picker.random_between(0.5, 1.0) as f32;
            log::debug!("trigger {note} at {velocity:.2}");
            commands.send(AudioCommand::TriggerAttack { note, velocity }).ok()?;
            let release = commands.clone();
            Some(Box::new(move || {
                let _ = release.send(AudioCommand::TriggerRelease { note });
            }) as EndFn)
        },
    );

    let interval = Duration::from_millis(config.trigger_interval_ms.max(1));
    let deadline = seconds.map(|s| Instant::now() + Duration::from_secs(s));
    log::info!("playing; press Ctrl-C to stop");

    let mut current: Option<EndHandle> = None;
    while running.load(Ordering::SeqCst) && deadline.map_or(true, |d| Instant::now() < d) {
        if let Some(previous) = current.take() {
            previous.end();
        }
        current = Some(stage.schedule()?);
        forward(&mut engine, &pending);
        thread::sleep(interval);
    }

    stage.deactivate();
    forward(&mut engine, &pending);
    thread::sleep(RELEASE_TAIL);
    engine.stop()?;

    let rejected = engine.rejected_commands();
    if rejected > 0 {
        log::warn!("{rejected} triggers could not be played");
    }
    Ok(())
}

fn forward(engine: &mut AudioEngine, pending: &mpsc::Receiver<AudioCommand>) {
    for cmd in pending.try_iter() {
        if let Err(e) = engine.send(cmd) {
            log::warn!("dropping {cmd:?}: {e}");
        }
    }
}
