use clap::Parser;
use region_borders::adjacency::export::write_adjacency_csv;
use region_borders::definitions::Definitions;
use region_borders::{bitmap, render};
use region_borders::{
    BorderConfig, BorderSystem, NoOwners, OwnerLookup, OwnerTable, RegionPixelIndex, TileKernel,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "region-borders",
    about = "Region map to adjacency table, border curves and distance field"
)]
struct Cli {
    /// Colour-coded region map (PNG)
    #[arg(short, long)]
    input: PathBuf,

    /// Region definition table (`province;red;green;blue;name;x`)
    #[arg(short, long)]
    definitions: PathBuf,

    /// Owner groups JSON; without it every region is unowned
    #[arg(long)]
    owners: Option<PathBuf>,

    /// JSON preset for BorderConfig; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for adjacency.csv, borders.png and distance.png
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Endpoint snap distance in pixels (overrides the preset)
    #[arg(long)]
    snap: Option<f64>,

    /// Curve fitting accuracy in pixels (overrides the preset)
    #[arg(long)]
    accuracy: Option<f64>,

    /// Use the sequential adjacency scanner
    #[arg(long)]
    sequential: bool,

    /// Skip the distance field (no flood kernel)
    #[arg(long)]
    no_distance: bool,

    /// Preview scale, output pixels per map pixel
    #[arg(long, default_value = "4")]
    scale: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => BorderConfig::from_json_file(path)?,
        None => BorderConfig::default(),
    };
    if let Some(snap) = cli.snap {
        config.snap_distance = snap;
    }
    if let Some(accuracy) = cli.accuracy {
        config.fit_accuracy = accuracy;
    }
    if cli.sequential {
        config.parallel_scan = false;
    }
    config.validate()?;

    eprintln!();
    eprintln!("  region-borders \u{00b7} {}", cli.input.display());
    eprintln!();

    let defs = Definitions::load(&cli.definitions)?;
    let raster = bitmap::load_region_raster(&cli.input, &defs, &config)?;
    let index = RegionPixelIndex::build(&raster);
    let owner_table = cli.owners.as_deref().map(OwnerTable::load).transpose()?;
    let owners: &dyn OwnerLookup = match &owner_table {
        Some(table) => table,
        None => &NoOwners,
    };
    let kernel: Option<Arc<dyn region_borders::FloodKernel>> = if cli.no_distance {
        None
    } else {
        Some(Arc::new(TileKernel))
    };

    let system = BorderSystem::initialize(config, raster, index, owners, kernel)?;

    std::fs::create_dir_all(&cli.output)?;
    let csv_path = cli.output.join("adjacency.csv");
    let rows = write_adjacency_csv(
        system.adjacency(),
        Some(&defs),
        BufWriter::new(File::create(&csv_path)?),
    )?;
    let preview_path = cli.output.join("borders.png");
    render::render_preview(system.raster(), system.curves(), cli.scale, &preview_path)?;

    eprintln!();
    eprintln!("  \u{2713} {}  ({rows} rows)", csv_path.display());
    eprintln!("  \u{2713} {}", preview_path.display());
    if !cli.no_distance {
        let distance_path = cli.output.join("distance.png");
        system.distance_field().save_png(&distance_path)?;
        eprintln!("  \u{2713} {}", distance_path.display());
    }
    eprintln!();

    system.shutdown();
    Ok(())
}
