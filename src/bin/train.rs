//! Command line tool to trigger training

use anyhow::anyhow;
use burn_taggers::{
    cli::{
        backend::{self, Training},
        datasets::Dataset,
        pipelines::Pipeline,
    },
    datasets::{self, sst::SstReader, tagging::TaggingReader, LoadableDataset, Reader, Record},
    pipelines::{
        artifacts::Artifacts, config::TrainingConfig, history::History, text_classification,
        token_classification,
    },
    utils::renderer::{Renderer, Simple, Writer},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: train PIPELINE [DATASET] [OPTIONS]

Arguments:
  PIPELINE             The pipeline to use ('text-classification' or 'token-classification')
  DATASET              The dataset to use ('sst' or 'pos', defaults to the pipeline's own)

Options:
  -h, --help           Print help
  -c, --config         A JSON or YAML training configuration file
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
  -n, --num-epochs     Number of epochs to train for
  -b, --batch-size     Batch size
  -p, --patience       Epochs without improvement before stopping early
  -e, --encoder        The encoder to use ('lstm' or 'embeddings')
  -g, --granularity    Sentiment label granularity ('5-class', '3-class' or '2-class')
  --subtrees           Train on every labeled phrase of the sentiment trees
  --progress           Append per-epoch progress to this file instead of the log
";

#[derive(Debug)]
struct Args {
    pipeline: String,
    dataset: Option<String>,
    config: Option<String>,
    data_dir: Option<String>,
    num_epochs: Option<usize>,
    batch_size: Option<usize>,
    patience: Option<usize>,
    encoder: Option<String>,
    granularity: Option<String>,
    subtrees: bool,
    progress: Option<String>,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            config: pargs.opt_value_from_str(["-c", "--config"])?,
            data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
            num_epochs: pargs.opt_value_from_str(["-n", "--num-epochs"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            patience: pargs.opt_value_from_str(["-p", "--patience"])?,
            encoder: pargs.opt_value_from_str(["-e", "--encoder"])?,
            granularity: pargs.opt_value_from_str(["-g", "--granularity"])?,
            subtrees: pargs.contains("--subtrees"),
            progress: pargs.opt_value_from_str("--progress")?,
            pipeline: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: PIPELINE"),
                _ => anyhow!("{}", e),
            })?,
            dataset: pargs.opt_free_from_str()?,
        };

        Ok(Some(args))
    }

    fn config(&self) -> anyhow::Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::from_file(path)?,
            None => TrainingConfig::new(),
        };

        if let Some(num_epochs) = self.num_epochs {
            config.num_epochs = num_epochs;
        }

        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }

        if let Some(patience) = self.patience {
            config.patience = Some(patience);
        }

        if let Some(encoder) = &self.encoder {
            config.encoder = encoder.parse()?;
        }

        config.validate()?;

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    let pipeline = Pipeline::try_from(args.pipeline.as_str())?;

    let dataset = match &args.dataset {
        Some(dataset) => Dataset::try_from(dataset.as_str())?,
        None => pipeline.default_dataset(),
    };

    pipeline.check(dataset)?;

    let config = args.config()?;
    let data_dir = args.data_dir.clone().unwrap_or_else(|| "data".to_string());

    let (train, valid) = match dataset {
        Dataset::Pos => load(&TaggingReader::default(), dataset, &data_dir).await?,
        Dataset::Sst => {
            let granularity = match &args.granularity {
                Some(granularity) => granularity.parse()?,
                None => Default::default(),
            };

            load(&SstReader::new(args.subtrees, granularity), dataset, &data_dir).await?
        }
    };

    let artifacts = Artifacts::create(pipeline.artifact_dir(&data_dir))?;

    let history = match &args.progress {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;

            run(pipeline, &train, &valid, config, artifacts, Writer::new(file))?
        }
        None => run(pipeline, &train, &valid, config, artifacts, Simple::new())?,
    };

    println!(
        "{} finished as {:?} after {} epochs; best epoch {}",
        pipeline,
        history.state,
        history.epochs.len(),
        history
            .best_epoch
            .map(|epoch| epoch.to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    Ok(())
}

async fn load<P: Reader + Sync>(
    reader: &P,
    dataset: Dataset,
    data_dir: &str,
) -> anyhow::Result<(Vec<Record>, Vec<Record>)> {
    let train = datasets::Dataset::load(reader, &dataset.path(data_dir, "train")).await?;

    let valid_path = dataset.path(data_dir, "valid");
    let valid = if valid_path.exists() {
        datasets::Dataset::load(reader, &valid_path).await?.records()
    } else {
        log::warn!(
            "No validation data at {}, tracking the training metric instead",
            valid_path.display()
        );

        Vec::new()
    };

    Ok((train.records(), valid))
}

fn run<R: Renderer>(
    pipeline: Pipeline,
    train: &[Record],
    valid: &[Record],
    config: TrainingConfig,
    artifacts: Artifacts,
    renderer: R,
) -> anyhow::Result<History> {
    let device = backend::device();

    let history = match pipeline {
        Pipeline::TextClassification => {
            text_classification::train::<Training, R>(
                &device, train, valid, config, artifacts, renderer,
            )?
            .history
        }
        Pipeline::TokenClassification => {
            token_classification::train::<Training, R>(
                &device, train, valid, config, artifacts, renderer,
            )?
            .history
        }
    };

    Ok(history)
}
