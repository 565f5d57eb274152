//! Grid Builder CLI
//!
//! 격자 디코더 보정 + 대상지별 거리구간 분석 도구

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use grid_builder::{RecordColumns, RunOptions};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "grid_builder")]
#[command(about = "Calibrate coded grids and build per-site distance band tables", long_about = None)]
struct Cli {
    /// Grid code column header
    #[arg(long, global = true, default_value = "격자코드")]
    code_column: String,

    /// Reference point column header
    #[arg(long, global = true, default_value = "대상지")]
    site_column: String,

    /// Distance band column header
    #[arg(long, global = true, default_value = "거리구간")]
    band_column: String,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Calibrate the grid decoder from labeled records
    Calibrate {
        /// Record CSV (grid code, site, distance band)
        #[arg(long)]
        records: PathBuf,

        /// Analysis config (YAML or JSON); Seoul stadium preset if omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output decoder JSON file
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Build per-site distance band tables
    Analyze {
        /// Record CSV
        #[arg(long)]
        records: PathBuf,

        /// Analysis config (YAML or JSON); Seoul stadium preset if omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Saved decoder JSON (skips calibration)
        #[arg(long)]
        decoder: Option<PathBuf>,

        /// Constraint polygon JSON files (repeatable)
        #[arg(long)]
        constraints: Vec<PathBuf>,

        /// Output directory
        #[arg(long)]
        out_dir: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let columns = RecordColumns {
        code: cli.code_column,
        reference: cli.site_column,
        band: cli.band_column,
    };

    match cli.command {
        Commands::Calibrate {
            records,
            config,
            out,
        } => {
            println!("🔨 Calibrating grid decoder...");
            println!("   Records: {}", records.display());

            let config = grid_builder::load_config(config.as_deref())?;
            let calibration = grid_builder::calibrate_from_csv(&records, &config, &columns)?;
            print_calibration(&calibration);

            if let Some(out) = out {
                grid_builder::save_decoder(&out, &calibration.decoder)?;
                println!("\n📄 Decoder saved to: {}", out.display());
            }
        }

        Commands::Analyze {
            records,
            config,
            decoder,
            constraints,
            out_dir,
        } => {
            println!("🔨 Building distance band tables...");
            println!("   Records:     {}", records.display());
            println!("   Constraints: {} file(s)", constraints.len());
            println!("   Output:      {}", out_dir.display());

            let options = RunOptions {
                records,
                config,
                decoder,
                constraints,
                out_dir,
                columns,
            };
            let manifest = grid_builder::run_analysis(&options)?;
            if let Some(calibration) = &manifest.calibration {
                print_calibration(calibration);
            }
            print_manifest(&manifest);

            println!("\n🔍 Verifying outputs...");
            for site in &manifest.sites {
                if !grid_builder::verify_output(&options.out_dir, &site.output)? {
                    anyhow::bail!("❌ Output verification failed for {}", site.output.name);
                }
            }
            println!("✅ Output verification passed");
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_calibration(calibration: &grid_core::Calibration) {
    let d = &calibration.decoder;
    println!("\n✅ Decoder calibrated");
    println!("   base_x:  {:.3}", d.offset_x);
    println!("   base_y:  {:.3}", d.offset_y);
    println!("   swap:    {}", d.axis_swap);
    println!(
        "   Score:   {:.2} m (swap=false) / {:.2} m (swap=true)",
        calibration.unswapped.score, calibration.swapped.score
    );
    println!(
        "   Sample:  {} of {} usable records ({} dropped)",
        calibration.sample_size, calibration.usable_records, calibration.dropped_records
    );
}

#[cfg(feature = "cli")]
fn print_manifest(manifest: &grid_builder::RunManifest) {
    println!("\n✅ Tables built");
    for site in &manifest.sites {
        println!(
            "   {}: {} cells, {} masked, {} available → {}",
            site.reference_id,
            site.summary.total_cells,
            site.summary.masked_cells,
            site.summary.available_cells(),
            site.output.name
        );
    }
    println!("   Created: {}", manifest.created_at);
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("grid_builder CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
