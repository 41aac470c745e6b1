//! Corridor View Render CLI
//!
//! Runs one render pass against the demo catalogue and writes the recorded
//! map state (layers, center, color bars) plus the render report as JSON.
//!
//! Usage:
//!   render-corridor --variant scene-5d --region cornwall-hedgerows \
//!                   --anchor 2024-06-06 --distance --output view.json

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use corridor_view::{
    demo::demo_evaluator, render, Region, RecordingHost, RenderReport, RenderRequest,
    VariantConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "render-corridor",
    about = "Run one Corridor View render pass and dump the map state"
)]
struct Args {
    /// Anchor date (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    anchor: Option<NaiveDate>,

    /// Deployment variant id (scene-5d, scene-7d, composite-7d, composite-10d)
    #[arg(short = 'V', long, default_value = "scene-5d")]
    variant: String,

    /// Region id (global, cornwall-hedgerows, belgium-field-boundaries)
    #[arg(short, long, default_value = "global")]
    region: String,

    /// Enable the distance-to-trees overlay
    #[arg(long)]
    distance: bool,

    /// Output JSON file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the region boundary as GeoJSON next to the output
    #[arg(long)]
    geojson: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Everything one render pass produced.
#[derive(Serialize)]
struct RenderDump {
    report: RenderReport,
    map: RecordingHost,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let Some(variant) = VariantConfig::by_id(&args.variant) else {
        bail!(
            "unknown variant {:?}; expected one of {}",
            args.variant,
            VariantConfig::all()
                .iter()
                .map(|v| v.id)
                .collect::<Vec<_>>()
                .join(", ")
        );
    };
    let Some(region) = Region::from_id(&args.region) else {
        bail!(
            "unknown region {:?}; expected one of {}",
            args.region,
            Region::ALL.map(|r| r.id()).join(", ")
        );
    };

    let anchor = args.anchor.unwrap_or_else(|| Utc::now().date_naive());
    let req = RenderRequest {
        anchor,
        region,
        show_distance: args.distance,
    };

    let evaluator = demo_evaluator(anchor);
    let mut host = RecordingHost::new();
    let report = render(&req, &variant, &evaluator, &mut host)?;

    info!(
        variant = variant.id,
        window = %report.window,
        imagery_count = report.imagery_count,
        layers = host.layers.len(),
        "render pass complete"
    );
    for warning in &report.warnings {
        info!("warning: {warning}");
    }

    let dump = RenderDump { map: host, report };
    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            serde_json::to_writer_pretty(BufWriter::new(file), &dump)?;
            info!("wrote {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&dump)?),
    }

    if args.geojson {
        write_boundary_geojson(region, args.output.as_deref())?;
    }

    Ok(())
}

/// Export the active region's clip extent as a GeoJSON polygon feature.
fn write_boundary_geojson(region: Region, output: Option<&std::path::Path>) -> Result<()> {
    use geojson::{Feature, Geometry, JsonObject, Value};

    let view = region.view();
    let b = view.bounds;
    let ring = vec![
        vec![b.min_lon, b.min_lat],
        vec![b.max_lon, b.min_lat],
        vec![b.max_lon, b.max_lat],
        vec![b.min_lon, b.max_lat],
        vec![b.min_lon, b.min_lat],
    ];
    let mut properties = JsonObject::new();
    properties.insert("region".to_string(), region.id().into());
    properties.insert("label".to_string(), region.label().into());
    let feature = Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    };

    let path = match output {
        Some(p) => p.with_extension("geojson"),
        None => PathBuf::from(format!("{}.geojson", region.id())),
    };
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &feature)?;
    info!("wrote {}", path.display());
    Ok(())
}
