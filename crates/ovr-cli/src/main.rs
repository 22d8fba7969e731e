use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;

use ovr_cli::config::TrainConfig;
use ovr_cli::predict::{run_prediction, write_predictions};
use ovr_cli::saved_model::SavedModel;
use ovr_cli::train::run_training;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("OVR_LOG", "error,ovr=info"))
        .init();

    let matches = Command::new("ovr")
        .version(clap::crate_version!())
        .about("One-vs-Rest multi-class training over partitioned CSV datasets")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            training_command("train")
                .about("Train a new multi-class model from labeled data"),
        )
        .subcommand(
            training_command("update")
                .about("Continue training a saved model on new labeled data")
                .arg(
                    Arg::new("model_path")
                        .short('m')
                        .long("model")
                        .help("Path to the previously trained model (*.json)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Predict class labels with a trained model")
                .arg(
                    Arg::new("model_path")
                        .short('m')
                        .long("model")
                        .help("Path to the trained model file (*.json)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .help("Path to the CSV file to predict")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Path to write predictions (CSV). Defaults to stdout.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_training(sub_m, false),
        Some(("update", sub_m)) => handle_training(sub_m, true),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

/// Arguments shared by `train` and `update`.
fn training_command(name: &'static str) -> Command {
    Command::new(name)
        .arg(
            Arg::new("config")
                .help("Path to training configuration file (JSON)")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("data")
                .short('d')
                .long("data")
                .help("Path to the labeled training data (CSV)")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("output_file")
                .short('o')
                .long("output")
                .help("File the trained model is written to")
                .default_value("ovr_model.json")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("partitions")
                .short('p')
                .long("partitions")
                .help("Number of partitions. Overrides the configuration file.")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Random seed. Overrides the configuration file.")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("label_column")
                .long("label-column")
                .help("Name of the label column. Overrides the configuration file.")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("model_type")
                .long("model-type")
                .help("Override the binary model type from the JSON config.")
                .value_parser(["logistic", "svm"])
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("sequential")
                .long("sequential")
                .help("Train the per-class models one after another.")
                .action(ArgAction::SetTrue),
        )
}

fn handle_training(matches: &ArgMatches, update: bool) -> Result<()> {
    let config_path: &PathBuf = matches.get_one("config").unwrap();
    let data_path: &PathBuf = matches.get_one("data").unwrap();
    let output_path: &PathBuf = matches.get_one("output_file").unwrap();
    log::info!("[OvR] Training from config: {:?}", config_path);

    let config = TrainConfig::from_arguments(config_path, matches)?;
    let previous = if update {
        let model_path: &PathBuf = matches.get_one("model_path").unwrap();
        log::info!("[OvR] Updating model: {:?}", model_path);
        Some(SavedModel::load(model_path)?)
    } else {
        None
    };

    match run_training(&config, data_path, previous) {
        Ok(saved) => {
            saved.save(output_path)?;
            log::info!("[OvR] Model written to {:?}", output_path);
            Ok(())
        }
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let model_path: &PathBuf = matches.get_one("model_path").unwrap();
    let data_path: &PathBuf = matches.get_one("data").unwrap();
    let output_path: Option<&PathBuf> = matches.get_one("output_file");

    let saved = SavedModel::load(model_path)?;
    let predictions = run_prediction(&saved, data_path)?;
    let labels = saved.ensemble.labels();

    match output_path {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            write_predictions(file, &labels, &predictions)?;
            log::info!("[OvR] Predictions written to {:?}", path);
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write_predictions(&mut lock, &labels, &predictions)?;
            lock.flush()?;
        }
    }
    Ok(())
}
