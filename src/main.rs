use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cryptostat::application::analysis::{
    AnovaRequest, HypothesisRequest, PredictionRequest, anova, descriptive, hypothesis, prediction,
};
use cryptostat::config::Config;
use cryptostat::domain::market::{CryptoSymbol, Period};
use cryptostat::domain::ports::AnalysisContext;
use cryptostat::infrastructure::CsvPriceLoader;
use cryptostat::infrastructure::observability::init_logging;
use cryptostat::infrastructure::reporting::{ConsoleReport, SvgCharts};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about = "Analysis and forecasting of crypto closing prices", long_about = None)]
struct Cli {
    /// Directory holding one <SYMBOL>.csv file per asset
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory where charts and exports are written
    #[arg(long, global = true)]
    figures_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Descriptive statistics and distribution charts for every asset
    Stats {
        /// Chart resolution
        #[arg(long, default_value_t = 250)]
        dpi: u32,
    },
    /// Next-close prediction with the MLP, plus profit simulation
    Predict {
        /// Asset to model (BTC, ETH, ...)
        #[arg(long)]
        crypto: CryptoSymbol,

        /// Folds for cross-validation
        #[arg(long, default_value_t = 5)]
        kfold: usize,

        /// Number of lagged closes per sample
        #[arg(long, default_value_t = 7)]
        window: usize,

        /// Also compare the MLP with linear and polynomial regressions
        #[arg(long)]
        compare: bool,
    },
    /// ANOVA of period-averaged returns across assets
    Anova {
        /// Aggregation period: W, ME or QE
        #[arg(long, default_value = "ME")]
        period: Period,

        /// Number of most recent periods kept
        #[arg(long, default_value_t = 6)]
        window_size: usize,
    },
    /// One-sided test of the mean return against a threshold
    Hypothesis {
        /// Threshold mean return in percent
        #[arg(long, default_value_t = 0.2)]
        expected_return: f64,

        /// Test daily returns over the full history instead of recent months
        #[arg(long)]
        daily: bool,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()
        .context("Failed to load configuration")?
        .with_data_dir(cli.data_dir)
        .with_figures_dir(cli.figures_dir);
    init_logging(&config.data.log_dir)?;
    info!("cryptostat {} starting", env!("CARGO_PKG_VERSION"));

    let dataset = CsvPriceLoader::new(&config.data.data_dir).load_all(&CryptoSymbol::ALL);
    info!("Loaded {} of {} assets", dataset.len(), CryptoSymbol::ALL.len());

    let dpi = match cli.command {
        Commands::Stats { dpi } => dpi,
        _ => config.data.dpi,
    };
    let charts = SvgCharts::new(&config.data.figures_dir, dpi);
    let mut report = ConsoleReport;
    let mut ctx = AnalysisContext::new(&config, &mut report, &charts);

    match cli.command {
        Commands::Stats { .. } => {
            descriptive::run(&mut ctx, &dataset)?;
        }
        Commands::Predict {
            crypto,
            kfold,
            window,
            compare,
        } => {
            let request = PredictionRequest {
                symbol: crypto,
                folds: kfold,
                window,
                compare,
            };
            prediction::run(&mut ctx, &dataset, &request)?;
        }
        Commands::Anova { period, window_size } => {
            anova::run(&mut ctx, &dataset, &AnovaRequest { period, window_size })?;
        }
        Commands::Hypothesis {
            expected_return,
            daily,
        } => {
            hypothesis::run(
                &mut ctx,
                &dataset,
                &HypothesisRequest {
                    expected_return,
                    daily,
                },
            )?;
        }
    }

    info!("Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_defaults() {
        let cli = Cli::try_parse_from(["cryptostat", "predict", "--crypto", "btc"]).unwrap();
        match cli.command {
            Commands::Predict {
                crypto,
                kfold,
                window,
                compare,
            } => {
                assert_eq!(crypto, CryptoSymbol::Btc);
                assert_eq!((kfold, window, compare), (5, 7, false));
            }
            _ => panic!("expected predict"),
        }
    }

    #[test]
    fn test_global_dirs_and_period() {
        let cli = Cli::try_parse_from([
            "cryptostat",
            "anova",
            "--period",
            "QE",
            "--data-dir",
            "prices",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("prices")));
        assert!(matches!(
            cli.command,
            Commands::Anova {
                period: Period::QuarterEnd,
                window_size: 6
            }
        ));
        assert!(Cli::try_parse_from(["cryptostat", "anova", "--period", "D"]).is_err());
        assert!(Cli::try_parse_from(["cryptostat", "predict", "--crypto", "LUNA"]).is_err());
    }
}
