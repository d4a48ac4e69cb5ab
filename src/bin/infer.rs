//! Command line tool for inference

use std::io::BufRead;

use anyhow::anyhow;
use burn_taggers::{
    cli::{
        backend::{self, Backend},
        pipelines::Pipeline,
    },
    pipelines::{text_classification, token_classification},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: infer PIPELINE [SENTENCE]... [OPTIONS]

Arguments:
  PIPELINE             The pipeline to use ('text-classification' or 'token-classification')
  SENTENCE             Whitespace tokenized sentences; read one per line from stdin if omitted

Options:
  -h, --help           Print help
  -d, --data-dir       The path to the top-level data directory (defaults to 'data')
  -a, --artifact-dir   The directory holding a trained model (defaults to DATA_DIR/PIPELINE)
  --json               Print one JSON prediction per line, with raw scores
";

#[derive(Debug)]
struct Args {
    /// The pipeline to use
    pipeline: String,

    /// Input sentences
    sentences: Vec<String>,

    /// The top-level data directory
    data_dir: Option<String>,

    /// The trained model directory
    artifact_dir: Option<String>,

    /// Print JSON instead of text
    json: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let data_dir = pargs.opt_value_from_str(["-d", "--data-dir"])?;
        let artifact_dir = pargs.opt_value_from_str(["-a", "--artifact-dir"])?;
        let json = pargs.contains("--json");

        let pipeline = pargs.free_from_str().map_err(|e| match e {
            pico_args::Error::MissingArgument => anyhow!("Missing required argument: PIPELINE"),
            _ => anyhow!("{}", e),
        })?;

        let sentences = pargs
            .finish()
            .into_iter()
            .map(|arg| {
                arg.into_string()
                    .map_err(|arg| anyhow!("Invalid UTF-8 in argument {:?}", arg))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Some(Args {
            pipeline,
            sentences,
            data_dir,
            artifact_dir,
            json,
        }))
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

    let artifact_dir = match &args.artifact_dir {
        Some(dir) => dir.into(),
        None => pipeline.artifact_dir(args.data_dir.as_deref().unwrap_or("data")),
    };

    let sentences = if args.sentences.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<_>>>()?
    } else {
        args.sentences.clone()
    };

    let device = backend::device();

    match pipeline {
        Pipeline::TextClassification => {
            let predictor = text_classification::Predictor::<Backend>::load(artifact_dir, &device)?;

            for sentence in &sentences {
                let prediction = predictor.predict(sentence)?;

                if args.json {
                    println!("{}", serde_json::to_string(&prediction)?);
                } else {
                    println!("{}\t{}", prediction.label, sentence);
                }
            }
        }
        Pipeline::TokenClassification => {
            let predictor =
                token_classification::Predictor::<Backend>::load(artifact_dir, &device)?;

            for sentence in &sentences {
                let prediction = predictor.predict(sentence)?;

                if args.json {
                    println!("{}", serde_json::to_string(&prediction)?);
                } else {
                    let tagged: Vec<String> = prediction
                        .tokens
                        .iter()
                        .zip(&prediction.labels)
                        .map(|(token, label)| format!("{token}/{label}"))
                        .collect();

                    println!("{}", tagged.join(" "));
                }
            }
        }
    }

    Ok(())
}
