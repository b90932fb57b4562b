//! `analyze` command implementation.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use contracts::{AnalysisConfig, AnalyzeResult, CapabilitiesReport, WindowingResult};
use ingestion::FrameReader;
use motion_engine::MotionAnalyzer;
use observability::RideMetricsAggregator;
use serde::Serialize;
use tracing::{info, warn};

use super::load_config;
use crate::cli::{AnalysisMode, AnalyzeArgs};
use crate::error::CliError;

/// Per-mode analysis output
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AnalysisReport {
    Windowed(WindowingResult),
    SinglePass(AnalyzeResult),
}

/// One analyzed file, as written to the output
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileAnalysis {
    file: String,
    mode: AnalysisMode,
    frame_count: usize,
    result: AnalysisReport,
}

/// Execute the `analyze` command
pub async fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let capabilities = args
        .capabilities
        .as_deref()
        .map(|path| FrameReader::read_capabilities(path).map_err(|e| CliError::input(path, e)))
        .transpose()?;

    if capabilities.is_some() && args.mode == AnalysisMode::Windowed {
        warn!("--capabilities only affects single-pass analysis; ignoring");
    }

    info!(
        files = args.files.len(),
        mode = args.mode.as_str(),
        "Starting analysis"
    );

    tokio::select! {
        result = analyze_files(args, Arc::new(config), capabilities) => {
            let analyses = result?;
            write_output(args, &analyses)?;
            if args.summary {
                print_summary(args, &analyses);
            }
            info!(files = analyses.len(), "Analysis finished");
            Ok(())
        }
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, cancelling analysis...");
            Err(CliError::Cancelled.into())
        }
    }
}

/// Analyze every file on a blocking worker, keeping input order
async fn analyze_files(
    args: &AnalyzeArgs,
    config: Arc<AnalysisConfig>,
    capabilities: Option<CapabilitiesReport>,
) -> Result<Vec<FileAnalysis>, CliError> {
    let handles: Vec<_> = args
        .files
        .iter()
        .cloned()
        .map(|path| {
            let config = Arc::clone(&config);
            let mode = args.mode;
            tokio::task::spawn_blocking(move || analyze_file(&path, mode, &config, capabilities))
        })
        .collect();

    let mut analyses = Vec::with_capacity(handles.len());
    for handle in handles {
        let analysis = handle
            .await
            .map_err(|e| CliError::worker(e.to_string()))??;
        analyses.push(analysis);
    }
    Ok(analyses)
}

fn analyze_file(
    path: &Path,
    mode: AnalysisMode,
    config: &AnalysisConfig,
    capabilities: Option<CapabilitiesReport>,
) -> Result<FileAnalysis, CliError> {
    let frames = FrameReader::read_path(path).map_err(|e| CliError::input(path, e))?;
    let frame_count = frames.len();
    observability::record_frames_loaded("file", frame_count);

    let result = match mode {
        AnalysisMode::Windowed => {
            let result = motion_engine::build_core_windowing(&frames, config)
                .map_err(|e| CliError::analysis(path, e))?;
            observability::record_windowing_metrics(&result);
            info!(
                file = %path.display(),
                windows = result.windows.len(),
                segments = result.segments.len(),
                events = result.events.len(),
                "File analyzed"
            );
            AnalysisReport::Windowed(result)
        }
        AnalysisMode::SinglePass => {
            let mut analyzer = MotionAnalyzer::new(config.clone());
            if let Some(report) = capabilities {
                analyzer.set_capabilities(report);
            }
            analyzer
                .ingest_all(frames)
                .map_err(|e| CliError::analysis(path, e))?;
            let result = analyzer.finalize();
            observability::record_analyze_metrics(&result);
            info!(
                file = %path.display(),
                flags = result.flags.len(),
                events = result.events.len(),
                "File analyzed"
            );
            AnalysisReport::SinglePass(result)
        }
    };

    Ok(FileAnalysis {
        file: path.display().to_string(),
        mode,
        frame_count,
        result,
    })
}

fn write_output(args: &AnalyzeArgs, analyses: &[FileAnalysis]) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(analyses)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json).map_err(|e| CliError::io(path, e))?;
            info!(output = %path.display(), "Results written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn aggregate(analyses: &[FileAnalysis]) -> RideMetricsAggregator {
    let mut aggregator = RideMetricsAggregator::new();
    for analysis in analyses {
        match &analysis.result {
            AnalysisReport::Windowed(result) => aggregator.update_windowing(result),
            AnalysisReport::SinglePass(result) => aggregator.update_analyze(result),
        }
    }
    aggregator
}

/// Summary goes to stderr when stdout carries the JSON results
fn print_summary(args: &AnalyzeArgs, analyses: &[FileAnalysis]) {
    let summary = aggregate(analyses).summary();
    if args.output.is_some() {
        println!("\n{summary}");
    } else {
        eprintln!("\n{summary}");
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Vector3;
    use ingestion::{write_frames_to_path, RidePhase, RideSimulator, RideSimulatorConfig};

    fn short_ride() -> RideSimulator {
        RideSimulator::new(RideSimulatorConfig::default())
            .phase(RidePhase::Moving {
                duration_sec: 20.0,
                speed_mps: 10.0,
            })
            .phase(RidePhase::Static { duration_sec: 20.0 })
    }

    fn args(files: Vec<std::path::PathBuf>, mode: AnalysisMode) -> AnalyzeArgs {
        AnalyzeArgs {
            files,
            config: None,
            mode,
            output: None,
            capabilities: None,
            summary: false,
            metrics_port: 0,
        }
    }

    #[test]
    fn test_analyze_file_windowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ride.jsonl");
        let sim = short_ride();
        write_frames_to_path(&path, &sim.generate()).unwrap();

        let analysis =
            analyze_file(&path, AnalysisMode::Windowed, &AnalysisConfig::default(), None).unwrap();
        assert_eq!(analysis.frame_count, 1000);
        let AnalysisReport::Windowed(result) = &analysis.result else {
            panic!("expected windowed result");
        };
        assert!(!result.windows.is_empty());
        assert!(!result.segments.is_empty());
    }

    #[test]
    fn test_analyze_file_single_pass_uses_capabilities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ride.json");
        let sim = short_ride();
        write_frames_to_path(&path, &sim.generate()).unwrap();

        let analysis = analyze_file(
            &path,
            AnalysisMode::SinglePass,
            &AnalysisConfig::default(),
            Some(sim.capabilities()),
        )
        .unwrap();
        let AnalysisReport::SinglePass(result) = &analysis.result else {
            panic!("expected single-pass result");
        };
        assert_eq!(result.frame_count, 1000);
        assert_eq!(result.capabilities, Some(sim.capabilities()));
        assert!(result.flags.is_empty(), "unexpected flags: {:?}", result.flags);
    }

    #[test]
    fn test_unreadable_frame_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(
            &path,
            r#"[{"timestamp": 0, "accG": {"x": null, "y": 0.0, "z": 9.81}}]"#,
        )
        .unwrap();

        let err = analyze_file(&path, AnalysisMode::Windowed, &AnalysisConfig::default(), None)
            .unwrap_err();
        assert!(matches!(err, CliError::Input { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_non_finite_frames_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let frames = vec![
            contracts::Frame::new(0, Vector3::new(0.0, 0.0, 9.81)),
            contracts::Frame::new(40, Vector3::new(f64::INFINITY, 0.0, 9.81)),
        ];
        assert!(write_frames_to_path(&path, &frames).is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_run_analyze_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.jsonl");
        let second = dir.path().join("b.json");
        let frames = short_ride().generate();
        write_frames_to_path(&first, &frames).unwrap();
        write_frames_to_path(&second, &frames).unwrap();

        let output = dir.path().join("out.json");
        let mut args = args(vec![first, second], AnalysisMode::Windowed);
        args.output = Some(output.clone());
        args.summary = true;
        run_analyze(&args).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        let items = written.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["mode"], "windowed");
        assert_eq!(items[0]["result"], items[1]["result"]);
        assert!(items[0]["result"]["segments"].is_array());
    }

    #[tokio::test]
    async fn test_run_analyze_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(vec![dir.path().join("nope.json")], AnalysisMode::SinglePass);
        let err = run_analyze(&args).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::Input { .. })
        ));
    }

    #[test]
    fn test_aggregate_counts_rides() {
        let frames = short_ride().generate();
        let result =
            motion_engine::build_core_windowing(&frames, &AnalysisConfig::default()).unwrap();
        let analyses = vec![
            FileAnalysis {
                file: "a".into(),
                mode: AnalysisMode::Windowed,
                frame_count: frames.len(),
                result: AnalysisReport::Windowed(result.clone()),
            },
            FileAnalysis {
                file: "b".into(),
                mode: AnalysisMode::Windowed,
                frame_count: frames.len(),
                result: AnalysisReport::Windowed(result),
            },
        ];
        assert_eq!(aggregate(&analyses).total_rides, 2);
    }
}
