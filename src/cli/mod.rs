// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, picks the burn backend and hands off to Layer 2.
//
//   1. `train`    — train, checkpoint, forecast the holdout year
//   2. `forecast` — reload a checkpoint and forecast N months
//
// Reference: Rust Book §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use burn::backend::{
    ndarray::NdArrayDevice,
    wgpu::WgpuDevice,
    Autodiff, NdArray, Wgpu,
};
use clap::Parser;
use commands::{Commands, ComputeBackend, ForecastArgs, TrainArgs};

use crate::domain::{observation::Observation, score::ForecastScore};

#[derive(Parser, Debug)]
#[command(
    name = "temperature-transformer",
    version = "0.1.0",
    about = "Train a causal transformer on monthly land temperatures, then forecast forward."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the use case; the CLI layer never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Forecast(args) => run_forecast(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let backend = args.backend;
    if args.synthetic {
        tracing::info!("Starting training on the synthetic series");
    } else {
        tracing::info!("Starting training on: {}", args.data_path);
    }

    let use_case = TrainUseCase::new(args.into());
    let report = match backend {
        ComputeBackend::Wgpu => {
            let device = WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            use_case.execute::<Autodiff<Wgpu>>(&device)?
        }
        ComputeBackend::Ndarray => use_case.execute::<Autodiff<NdArray>>(&NdArrayDevice::Cpu)?,
    };

    println!("\nHoldout forecast:");
    println!("{:<12} {:>10} {:>10}", "month", "real", "predicted");
    for (real, predicted) in report.holdout.iter().zip(&report.forecast) {
        println!("{:<12} {:>10.3} {:>10.3}", real.date, real.value, predicted.value);
    }
    print_score(&report.score);
    println!("Training complete. Checkpoint saved.");
    Ok(())
}

fn run_forecast(args: ForecastArgs) -> Result<()> {
    use crate::application::forecast_use_case::ForecastUseCase;

    let use_case = ForecastUseCase::new(args.checkpoint_dir, args.steps);
    let report = match args.backend {
        ComputeBackend::Wgpu    => use_case.execute::<Wgpu>(&WgpuDevice::default())?,
        ComputeBackend::Ndarray => use_case.execute::<NdArray>(&NdArrayDevice::Cpu)?,
    };

    println!();
    print_forecast(&report.forecast);
    match &report.score {
        Some(score) => print_score(score),
        None        => println!("(no holdout observations overlap the forecast)"),
    }
    println!("Forecast written to {}", report.csv_path.display());
    Ok(())
}

fn print_forecast(forecast: &[Observation]) {
    println!("{:<12} {:>10}", "month", "predicted");
    for o in forecast {
        println!("{:<12} {:>10.3}", o.date, o.value);
    }
}

fn print_score(score: &ForecastScore) {
    println!("RMSE: {:.4}  bias: {:+.4}", score.rmse, score.bias);
}
