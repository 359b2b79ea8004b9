use clap::{ArgAction, Parser, Subcommand};
use passport_photo::pipeline::{self, Pipeline, PipelineOptions};
use passport_photo::{config, models, output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that read input photos.
#[derive(clap::Args, Clone)]
struct InputArgs {
    /// Input image files or directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Passport standard code (see `standards`)
    #[arg(long, short = 's')]
    standard: Option<String>,
}

#[derive(clap::Args, Clone)]
struct ProcessArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Directory to store processed photos
    #[arg(long, short = 'o', default_value = ".")]
    output_dir: PathBuf,

    /// Center the crop on a detected face. Needs a build with the `rustface`
    /// feature and `face_detection.model` in passport.toml; otherwise the crop
    /// stays centered and the report says so.
    #[arg(long)]
    auto_crop: bool,

    /// Also create a printable sheet with several copies of each photo
    #[arg(long)]
    sheet: bool,

    /// Copies per sheet (defaults to the standard's sheet layout)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    copies: Option<u32>,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "passport-photo")]
#[command(about = "Turn portraits into passport photos and printable sheets")]
#[command(long_about = "\
Turn portraits into passport photos and printable sheets

Each input is checked against the chosen standard's minimum resolution,
cropped to the standard's aspect ratio (optionally around the detected face),
cut out onto a pure white background, resampled to the exact pixel size and
saved as JPEG with the standard's DPI.

Outputs (in --output-dir):

  portrait_us_passport.jpg         # finished photo
  portrait_us_passport_4x6.jpg     # print sheet (--sheet)

Background removal runs an external tool (rembg by default) or an ONNX
model; face detection needs a SeetaFace model. Both are configured in
passport.toml. Run 'passport-photo gen-config' for a documented config.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (defaults to ./passport.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Produce passport photos (and optionally sheets) from portraits
    Process(ProcessArgs),
    /// Check inputs against a standard without writing anything
    Check(InputArgs),
    /// List the available passport standards
    Standards {
        /// Print the registry as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock passport.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cli.command {
        Command::Process(args) => {
            let config = config::load_config(cli.config.as_deref(), Path::new("."))?;
            let registry = config.registry()?;
            let standard = registry.get(args.input.standard.as_deref())?;
            let inputs = pipeline::discover_inputs(&args.input.inputs, &registry);
            init_thread_pool(&config.processing);

            let segmenter = models::build_segmenter(&config.segmentation)?;
            let face_detector = if args.auto_crop {
                models::build_face_detector(&config.face_detection)
                    .map_err(|e| warn!(error = %e, "Auto-crop disabled"))
                    .ok()
            } else {
                None
            };

            let options = PipelineOptions {
                auto_crop: args.auto_crop,
                sheet: args.sheet,
                copies: args.copies,
                ..PipelineOptions::from_config(&config)
            };
            let pipeline = Pipeline::new(
                standard,
                segmenter.as_ref(),
                face_detector.as_deref(),
                options,
            );

            let reports = pipeline.process_batch(&inputs, &args.output_dir);
            output::print_process_output(&reports, standard);
            Ok(exit_code(reports.iter().all(|r| r.result.is_ok())))
        }
        Command::Check(args) => {
            let config = config::load_config(cli.config.as_deref(), Path::new("."))?;
            let registry = config.registry()?;
            let standard = registry.get(args.standard.as_deref())?;
            let inputs = pipeline::discover_inputs(&args.inputs, &registry);
            init_thread_pool(&config.processing);

            let reports = pipeline::check_batch(&inputs, standard);
            output::print_check_output(&reports, standard);
            Ok(exit_code(reports.iter().all(|r| r.result.is_ok())))
        }
        Command::Standards { json } => {
            let config = config::load_config(cli.config.as_deref(), Path::new("."))?;
            let registry = config.registry()?;
            if json {
                let standards: Vec<_> = registry.iter().collect();
                println!("{}", serde_json::to_string_pretty(&standards)?);
            } else {
                output::print_standards(&registry);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(all_ok: bool) -> ExitCode {
    if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Log to stderr; `RUST_LOG` overrides the `-v` level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can only lower it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
