use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use forecast::query::{default_query_date_local, DEFAULT_QUERY_TIME};
use forecast::{FetchOutcome, ForecastConfig, ForecastError, HttpPredictionSource, Orchestrator};
use formats::{PredictionPayload, ZoneSource};
use layers::{map_to_geojson, IdFields, ZoneIndex, ZoneMap};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Zone demand map front-end for the prediction service")]
struct Args {
    /// Prediction service base URL (default: $ZONECAST_API_URL or http://localhost:5000)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Zone boundaries GeoJSON (default: $ZONECAST_ZONES or Dataset/zones.geojson)
    #[arg(long, global = true)]
    zones: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Feature property holding the zone id; repeat to set the lookup order
    #[arg(long = "id-field", global = true)]
    id_fields: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the zone source and report what was indexed
    Zones,

    /// Resolve a coordinate to the zone with the nearest center
    Nearest {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Request predictions from the service and render them
    Predict {
        /// YYYY-MM-DD (default: tomorrow)
        #[arg(long)]
        date: Option<String>,
        /// HH:MM
        #[arg(long, default_value = DEFAULT_QUERY_TIME)]
        time: String,
        /// Write the styled map as GeoJSON
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Render a saved prediction response without calling the service
    Replay {
        #[arg(long)]
        predictions: PathBuf,
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = DEFAULT_QUERY_TIME)]
        time: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Write the neutral, prediction-free map state
    Clear {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&args, ForecastConfig::from_env());
    let fields = if args.id_fields.is_empty() {
        IdFields::default()
    } else {
        IdFields::new(args.id_fields.iter().cloned())
    };
    let mut map = load_map(&config.zones_path, &fields).await?;
    let mut orchestrator = Orchestrator::new();

    match args.command {
        Command::Zones => {
            let report = map.index().report();
            println!(
                "zones={} centers={}",
                map.index().len(),
                map.index().center_count()
            );
            info!(
                features = report.features,
                rejected = report.rejected,
                without_center = report.without_center,
                duplicates = report.duplicates,
                "zone source summary"
            );
        }
        Command::Nearest { lat, lon } => match map.find_nearest(lat, lon) {
            Some(id) => println!("{id}"),
            None => println!("no zone"),
        },
        Command::Predict { date, time, out } => {
            let date = date.unwrap_or_else(default_query_date_local);
            let source = HttpPredictionSource::new(&config)?;
            let outcome = orchestrator
                .request_predictions(&mut map, &source, &date, &time)
                .await;
            report_outcome(&map, &orchestrator, outcome, out.as_deref()).await?;
        }
        Command::Replay {
            predictions,
            date,
            time,
            out,
        } => {
            let date = date.unwrap_or_else(default_query_date_local);
            let pending = orchestrator.issue(&mut map, &date, &time)?;
            let body = tokio::fs::read_to_string(&predictions).await?;
            let payload: Result<PredictionPayload, ForecastError> =
                PredictionPayload::from_json_str(&body).map_err(Into::into);
            let outcome = orchestrator.complete(&mut map, pending, payload);
            report_outcome(&map, &orchestrator, outcome, out.as_deref()).await?;
        }
        Command::Clear { out } => {
            orchestrator.clear(&mut map);
            println!("{}", orchestrator.status());
            write_map(&map, out.as_deref()).await?;
        }
    }
    Ok(())
}

/// CLI flags win over the environment.
fn resolve_config(args: &Args, mut config: ForecastConfig) -> ForecastConfig {
    if let Some(url) = &args.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(path) = &args.zones {
        config.zones_path = path.clone();
    }
    if let Some(secs) = args.timeout_secs.filter(|s| *s > 0) {
        config.request_timeout = Some(Duration::from_secs(secs));
    }
    config
}

async fn load_map(path: &Path, fields: &IdFields) -> Result<ZoneMap, Box<dyn std::error::Error>> {
    let body = tokio::fs::read_to_string(path).await.map_err(|err| {
        error!(path = %path.display(), "failed to read zone source: {err}");
        format!("could not read zone source {}: {err}", path.display())
    })?;
    let source = ZoneSource::from_geojson_str(&body)?;
    let index = ZoneIndex::build(&source, fields)?;
    Ok(ZoneMap::new(index))
}

/// Prints the labels and status line and writes the map state, failed or not,
/// then hands back the request error if there was one.
async fn report_outcome(
    map: &ZoneMap,
    orchestrator: &Orchestrator,
    outcome: Result<FetchOutcome, ForecastError>,
    out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    print_labels(map);
    println!("{}", orchestrator.status());
    write_map(map, out).await?;
    outcome?;
    Ok(())
}

fn print_labels(map: &ZoneMap) {
    for label in map.labels().iter() {
        println!("{}\t{}", label.zone, label.text);
    }
}

async fn write_map(map: &ZoneMap, out: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(out) = out else {
        return Ok(());
    };
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(&map_to_geojson(map))?;
    tokio::fs::write(out, json).await?;
    info!(path = %out.display(), "wrote map state");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{report_outcome, resolve_config, Args, Command};
    use clap::Parser;
    use forecast::{ForecastConfig, ForecastError, Orchestrator};
    use formats::{PredictionPayload, ZoneSource};
    use layers::{IdFields, ZoneIndex, ZoneMap};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn flags_override_environment() {
        let args = Args::try_parse_from([
            "zonecast",
            "--api-url",
            "http://10.0.0.5:5000",
            "--timeout-secs",
            "30",
            "zones",
        ])
        .expect("parse");
        let env = ForecastConfig {
            api_base_url: "http://from-env".to_string(),
            zones_path: PathBuf::from("/env/zones.geojson"),
            request_timeout: None,
        };
        let cfg = resolve_config(&args, env);
        assert_eq!(cfg.api_base_url, "http://10.0.0.5:5000");
        assert_eq!(cfg.zones_path, PathBuf::from("/env/zones.geojson"));
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn nearest_accepts_negative_longitude() {
        let args = Args::try_parse_from(["zonecast", "nearest", "--lat", "40.75", "--lon", "-73.98"])
            .expect("parse");
        match args.command {
            Command::Nearest { lat, lon } => {
                assert_eq!(lat, 40.75);
                assert_eq!(lon, -73.98);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn predict_defaults_time_to_noon() {
        let args = Args::try_parse_from(["zonecast", "predict", "--date", "2025-04-20"]).expect("parse");
        match args.command {
            Command::Predict { date, time, out } => {
                assert_eq!(date.as_deref(), Some("2025-04-20"));
                assert_eq!(time, "12:00");
                assert!(out.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn id_fields_repeat_in_order() {
        let args = Args::try_parse_from([
            "zonecast",
            "--id-field",
            "zone",
            "--id-field",
            "LocationID",
            "zones",
        ])
        .expect("parse");
        assert_eq!(args.id_fields, vec!["zone", "LocationID"]);
    }

    fn map() -> ZoneMap {
        let src = ZoneSource::from_geojson_str(
            r#"{"type": "FeatureCollection", "features": [{
                "type": "Feature",
                "properties": {"LocationID": 1},
                "geometry": {"type": "Polygon", "coordinates": [[
                    [-74.0, 40.7], [-73.99, 40.7], [-73.99, 40.71], [-74.0, 40.7]
                ]]}
            }]}"#,
        )
        .expect("zone source");
        ZoneMap::new(ZoneIndex::build(&src, &IdFields::default()).expect("index"))
    }

    #[tokio::test]
    async fn failed_request_still_writes_cleared_map() {
        let mut map = map();
        let mut orchestrator = Orchestrator::new();
        let first = orchestrator.issue(&mut map, "2025-04-20", "08:00").expect("issue");
        orchestrator
            .complete(&mut map, first, Ok(PredictionPayload::from_pairs([("1", 90.0)])))
            .expect("render");
        assert_eq!(map.labels().len(), 1);

        let second = orchestrator.issue(&mut map, "2025-04-20", "09:00").expect("issue");
        let outcome = orchestrator.complete(
            &mut map,
            second,
            Err(ForecastError::Service {
                status: 500,
                message: "Internal Server Error".to_string(),
            }),
        );

        let out = std::env::temp_dir().join(format!("zonecast-failed-{}.geojson", std::process::id()));
        let result = report_outcome(&map, &orchestrator, outcome, Some(&out)).await;
        let err = result.expect_err("error is propagated");
        assert_eq!(err.to_string(), "API Error (500): Internal Server Error");

        let written = std::fs::read_to_string(&out).expect("map written");
        let _ = std::fs::remove_file(&out);
        let geojson: serde_json::Value = serde_json::from_str(&written).expect("geojson");
        let features = geojson["features"].as_array().expect("features");
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["properties"]["fill"], "#ffffff");
    }
}
