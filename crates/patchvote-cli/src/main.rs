use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use patchvote_cli::commands::calibrate::run_calibration;
use patchvote_cli::commands::classify::{run_classification, ClassifyOutputs};
use patchvote_cli::commands::gather::run_gather;
use patchvote_cli::commands::scores::run_scores;
use patchvote_cli::commands::train::run_training;
use patchvote_cli::input::PipelineConfig;
use patchvote_cli::util::{validate_directory, validate_file, verbosity_filter};

fn data_dir_arg() -> Arg {
    Arg::new("data_dir")
        .short('d')
        .long("data")
        .help("Directory of patch feature files (vg_* and nvg_*)")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::DirPath)
}

fn unlabeled_dir_arg() -> Arg {
    Arg::new("data_dir")
        .short('d')
        .long("data")
        .help("Directory of patch feature files; no class prefix needed")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::DirPath)
}

fn model_arg(help: &'static str) -> Arg {
    Arg::new("model")
        .short('m')
        .long("model")
        .help(help)
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn score_model_arg(help: &'static str) -> Arg {
    Arg::new("score_model")
        .short('s')
        .long("score-model")
        .help(help)
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn build_cli() -> Command {
    Command::new("patchvote")
        .version(clap::crate_version!())
        .about("Patch-based painting attribution: train, calibrate and classify")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Raise log verbosity (-v debug, -vv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("cores")
                .short('c')
                .long("cores")
                .help("Number of threads used to load feature files")
                .value_parser(clap::value_parser!(usize))
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Pipeline JSON configuration file. Command line flags override it.")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .subcommand(
            Command::new("gather")
                .about("Load the patch corpus and summarise it")
                .arg(data_dir_arg()),
        )
        .subcommand(
            Command::new("train")
                .about("Train the patch classifier with cross-validated hyperparameter search")
                .arg(data_dir_arg())
                .arg(model_arg("File the trained model is written to"))
                .arg(
                    Arg::new("kernel")
                        .short('k')
                        .long("kernel")
                        .help("SVM kernel")
                        .value_parser(["linear", "rbf"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("search")
                        .short('s')
                        .long("search")
                        .help("Hyperparameter search strategy")
                        .value_parser(["grid", "random"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("iterations")
                        .short('i')
                        .long("iterations")
                        .help("Candidates sampled by random search")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("folds")
                        .long("folds")
                        .help("Cross-validation folds")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for fold shuffling and random search")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new("calibrate")
                .about("Fit the distance-to-probability calibrator for a trained model")
                .arg(data_dir_arg())
                .arg(model_arg("Trained model file"))
                .arg(score_model_arg("File the calibration model is written to"))
                .arg(
                    Arg::new("calibration_folds")
                        .long("folds")
                        .help("Cross-validation folds for the calibrator")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("classify")
                .about("Leave-one-group-out classification of every painting")
                .arg(data_dir_arg())
                .arg(model_arg("Trained model file"))
                .arg(
                    Arg::new("aggregation")
                        .short('a')
                        .long("aggregation")
                        .help("How patch scores are folded into one verdict per painting")
                        .value_parser(["mode", "sum", "far", "mean", "median"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Write verdicts to this TSV file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("report")
                        .long("report")
                        .help("Write an HTML evaluation report to this file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("scores")
                .about("Calibrated probabilities at the distance extremes of target paintings")
                .arg(unlabeled_dir_arg())
                .arg(model_arg("Trained model file"))
                .arg(score_model_arg("Calibration model file"))
                .arg(
                    Arg::new("targets")
                        .short('t')
                        .long("targets")
                        .help("Newline-delimited painting labels to report on")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("n_extremes")
                        .short('n')
                        .long("extremes")
                        .help("Distances taken from each end of a painting")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
}

fn init_logging(verbosity: u8) {
    let level = verbosity_filter(verbosity).to_string().to_lowercase();
    let default_filter = format!(
        "error,patchvote={0},patchvote_cli={0},patchvote_classifiers={0}",
        level
    );
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("PATCHVOTE_LOG", default_filter))
        .init();
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    init_logging(matches.get_count("verbose"));

    let (name, sub_m) = match matches.subcommand() {
        Some(pair) => pair,
        None => unreachable!("Subcommand is required by CLI configuration"),
    };

    let config_path = sub_m.get_one::<PathBuf>("config");
    if let Some(path) = config_path {
        validate_file(path)?;
        log::info!("[patchvote] Using config: {}", path.display());
    }
    let config = PipelineConfig::from_arguments(config_path, &matches, sub_m)?;
    if config_path.is_none() {
        let default_json = serde_json::to_string_pretty(&config).unwrap_or_default();
        eprintln!("[patchvote] No config provided; using:\n{}", default_json);
    }

    let data_dir: &PathBuf = required(sub_m, "data_dir")?;
    validate_directory(data_dir)?;

    let outcome = match name {
        "gather" => run_gather(data_dir, &config).map(|_| ()),
        "train" => {
            let model_path: &PathBuf = required(sub_m, "model")?;
            run_training(data_dir, model_path, &config).map(|_| ())
        }
        "calibrate" => {
            let model_path: &PathBuf = required(sub_m, "model")?;
            let score_model_path: &PathBuf = required(sub_m, "score_model")?;
            validate_file(model_path)?;
            run_calibration(data_dir, model_path, score_model_path, &config).map(|_| ())
        }
        "classify" => {
            let model_path: &PathBuf = required(sub_m, "model")?;
            validate_file(model_path)?;
            let outputs = ClassifyOutputs {
                verdicts: sub_m.get_one::<PathBuf>("output_file").map(PathBuf::as_path),
                report: sub_m.get_one::<PathBuf>("report").map(PathBuf::as_path),
            };
            run_classification(data_dir, model_path, &config, outputs).map(|_| ())
        }
        "scores" => {
            let model_path: &PathBuf = required(sub_m, "model")?;
            let score_model_path: &PathBuf = required(sub_m, "score_model")?;
            let targets_path: &PathBuf = required(sub_m, "targets")?;
            validate_file(model_path)?;
            validate_file(score_model_path)?;
            validate_file(targets_path)?;
            run_scores(data_dir, model_path, score_model_path, targets_path, &config).map(|_| ())
        }
        _ => unreachable!(),
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("{} failed: {:#}", capitalize(name), e);
            std::process::exit(1)
        }
    }
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a PathBuf> {
    matches
        .get_one::<PathBuf>(id)
        .ok_or_else(|| anyhow::anyhow!("Missing required argument: {}", id))
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
