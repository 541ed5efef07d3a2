// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `forecast`, and all
// their configurable flags. Defaults reproduce the reference
// run: W = 100, batch 10, 40 epochs, lr 0.005 decaying by 0.95.
//
// Reference: Rust Book §12 (Building a CLI Program)

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the transformer on the monthly temperature series
    Train(TrainArgs),

    /// Forecast forward from a trained checkpoint
    Forecast(ForecastArgs),
}

/// Which burn backend runs the tensors
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComputeBackend {
    /// GPU through wgpu
    Wgpu,
    /// CPU through ndarray
    Ndarray,
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV file with one row per month
    #[arg(long, default_value = "data/GlobalTemperatures.csv")]
    pub data_path: String,

    /// Train on the generated sine-mixture series instead of the CSV
    #[arg(long)]
    pub synthetic: bool,

    #[arg(long, default_value = "dt")]
    pub date_column: String,

    #[arg(long, default_value = "LandAverageTemperature")]
    pub value_column: String,

    /// First month of history used for training
    #[arg(long, default_value = "1900-01-01")]
    pub start_date: NaiveDate,

    /// First month held out from training and used for scoring
    #[arg(long, default_value = "2014-01-01")]
    pub holdout_start: NaiveDate,

    /// Months in the holdout forecast
    #[arg(long, default_value_t = 12)]
    pub holdout_len: usize,

    /// Share of history (in time order) used for training
    #[arg(long, default_value_t = 0.85)]
    pub train_fraction: f64,

    /// Directory for checkpoints, config, scaler and metrics.csv
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Directory for PNG charts
    #[arg(long, default_value = "graph")]
    pub graph_dir: String,

    /// Window length W fed to the model
    #[arg(long, default_value_t = 100)]
    pub input_window: usize,

    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    /// Batch size for the cheap per-epoch validation pass
    #[arg(long, default_value_t = 300)]
    pub eval_batch_size: usize,

    #[arg(long, default_value_t = 40)]
    pub epochs: usize,

    /// Initial learning rate
    #[arg(long, default_value_t = 0.005)]
    pub lr: f64,

    /// Multiplicative learning-rate decay per epoch
    #[arg(long, default_value_t = 0.95)]
    pub lr_decay: f64,

    /// Gradient norm clipping threshold
    #[arg(long, default_value_t = 0.7)]
    pub grad_clip: f32,

    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f32,

    /// Plot, roll forward and checkpoint every N epochs
    #[arg(long, default_value_t = 10)]
    pub plot_every: usize,

    /// Length of the diagnostic roll-forward plotted on plot epochs
    #[arg(long, default_value_t = 200)]
    pub future_steps: usize,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Channels each scalar is broadcast into (d_model)
    /// Must be divisible by num_heads
    #[arg(long, default_value_t = 250)]
    pub feature_size: usize,

    #[arg(long, default_value_t = 10)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 1)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 2048)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    #[arg(long, value_enum, default_value_t = ComputeBackend::Wgpu)]
    pub backend: ComputeBackend,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:       a.data_path,
            synthetic:       a.synthetic,
            date_column:     a.date_column,
            value_column:    a.value_column,
            start_date:      a.start_date,
            holdout_start:   a.holdout_start,
            holdout_len:     a.holdout_len,
            train_fraction:  a.train_fraction,
            checkpoint_dir:  a.checkpoint_dir,
            graph_dir:       a.graph_dir,
            input_window:    a.input_window,
            batch_size:      a.batch_size,
            eval_batch_size: a.eval_batch_size,
            epochs:          a.epochs,
            lr:              a.lr,
            lr_decay:        a.lr_decay,
            grad_clip:       a.grad_clip,
            weight_decay:    a.weight_decay,
            plot_every:      a.plot_every,
            future_steps:    a.future_steps,
            seed:            a.seed,
            feature_size:    a.feature_size,
            num_heads:       a.num_heads,
            num_layers:      a.num_layers,
            d_ff:            a.d_ff,
            dropout:         a.dropout,
        }
    }
}

/// All arguments for the `forecast` command
#[derive(Args, Debug)]
pub struct ForecastArgs {
    /// Directory where `train` saved its checkpoints
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Months to forecast after the last history month
    #[arg(long, default_value_t = 12)]
    pub steps: usize,

    #[arg(long, value_enum, default_value_t = ComputeBackend::Ndarray)]
    pub backend: ComputeBackend,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["temperature-transformer", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(args.backend, ComputeBackend::Wgpu);

        let from_cli: TrainConfig = args.into();
        let defaults = TrainConfig::default();
        assert_eq!(from_cli.input_window, defaults.input_window);
        assert_eq!(from_cli.start_date, defaults.start_date);
        assert_eq!(from_cli.lr, defaults.lr);
        assert_eq!(from_cli.feature_size, defaults.feature_size);
        assert_eq!(from_cli.grad_clip, defaults.grad_clip);
    }

    #[test]
    fn test_forecast_flags() {
        let cli = Cli::try_parse_from([
            "temperature-transformer", "forecast", "--steps", "24", "--backend", "wgpu",
        ]).unwrap();
        let Commands::Forecast(args) = cli.command else { panic!("expected forecast") };
        assert_eq!(args.steps, 24);
        assert_eq!(args.backend, ComputeBackend::Wgpu);
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(Cli::try_parse_from([
            "temperature-transformer", "train", "--start-date", "1900/01/01",
        ]).is_err());
    }
}
