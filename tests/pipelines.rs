use std::path::PathBuf;

use burn::backend::{Autodiff, NdArray};
use burn_taggers::{
    datasets::{sst::SstReader, tagging::TaggingReader, Reader, Record},
    models::Encoder,
    pipelines::{
        artifacts::Artifacts,
        config::TrainingConfig,
        history::TrainingState,
        text_classification, token_classification,
    },
    utils::renderer::Writer,
    Result,
};
use pretty_assertions::assert_eq;

type TrainBackend = Autodiff<NdArray>;
type InferBackend = NdArray;

fn read<P: Reader>(reader: &P, input: &str) -> Vec<Record> {
    reader
        .read(input.as_bytes())
        .collect::<Result<Vec<_>>>()
        .unwrap()
}

fn artifact_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);

    dir
}

fn small_config() -> TrainingConfig {
    TrainingConfig::new()
        .with_batch_size(2)
        .with_embedding_dim(8)
        .with_hidden_size(8)
}

#[test]
fn test_pos_tagger_trains_and_predicts() {
    let train = read(
        &TaggingReader::default(),
        "The###DET dog###NN ate###V the###DET apple###NN",
    );
    let dir = artifact_dir("burn_taggers_e2e_pos");
    let device = Default::default();

    let fitted = token_classification::train::<TrainBackend, _>(
        &device,
        &train,
        &[],
        small_config().with_num_epochs(5),
        Artifacts::create(&dir).unwrap(),
        Writer::new(Vec::new()),
    )
    .unwrap();

    assert_eq!(fitted.history.state, TrainingState::Completed);
    assert_eq!(fitted.history.epochs.len(), 5);

    let predictor = token_classification::Predictor::<InferBackend>::load(&dir, &device).unwrap();

    assert_eq!(predictor.vocabulary().labels(), &["DET", "NN", "V"]);
    assert_eq!(predictor.vocabulary().tokens_len(), 7);

    let prediction = predictor.predict("the dog ate").unwrap();

    assert_eq!(prediction.logits.len(), 3);
    for scores in &prediction.logits {
        assert_eq!(scores.len(), 3);
    }
    assert_eq!(prediction.labels.len(), 3);
}

#[test]
fn test_pos_tagger_fits_its_training_data() {
    let train = read(
        &TaggingReader::default(),
        "The###DET dog###NN ate###V the###DET apple###NN\nEverybody###NN read###V that###DET book###NN",
    );
    let dir = artifact_dir("burn_taggers_e2e_pos_fit");
    let device = Default::default();

    let config = small_config()
        .with_num_epochs(100)
        .with_learning_rate(0.05)
        .with_encoder(Encoder::Embeddings);

    let fitted = token_classification::train::<TrainBackend, _>(
        &device,
        &train,
        &train,
        config,
        Artifacts::create(&dir).unwrap(),
        Writer::new(Vec::new()),
    )
    .unwrap();

    let best = fitted.history.best_epoch.unwrap();
    assert_eq!(fitted.history.epochs[best - 1].valid_accuracy, Some(1.0));

    let predictor = token_classification::Predictor::<InferBackend>::load(&dir, &device).unwrap();
    let prediction = predictor.predict("Everybody read the apple").unwrap();

    assert_eq!(prediction.labels, vec!["NN", "V", "DET", "NN"]);
}

#[test]
fn test_sentiment_classifier_trains_and_predicts() {
    let reader = SstReader::new(true, Default::default());
    let train = read(&reader, "(2 (2 good) (2 (2 but) (1 bad)))");
    assert_eq!(train.len(), 5);

    let valid = read(&reader, "(1 (1 bad) (2 good))");

    let dir = artifact_dir("burn_taggers_e2e_sst");
    let device = Default::default();

    let fitted = text_classification::train::<TrainBackend, _>(
        &device,
        &train,
        &valid,
        small_config().with_num_epochs(4).with_patience(Some(2)),
        Artifacts::create(&dir).unwrap(),
        Writer::new(Vec::new()),
    )
    .unwrap();

    assert!(fitted.history.epochs.len() <= 4);
    assert!(fitted
        .history
        .epochs
        .iter()
        .all(|epoch| epoch.valid_loss.is_some()));

    let artifacts = Artifacts::new(&dir);
    assert_eq!(artifacts.load_history().unwrap(), fitted.history);
    assert_eq!(
        TrainingConfig::from_file(artifacts.training_path())
            .unwrap()
            .num_epochs,
        4
    );

    let predictor = text_classification::Predictor::<InferBackend>::load(&dir, &device).unwrap();
    let prediction = predictor.predict("good but bad").unwrap();

    assert_eq!(prediction.logits.len(), 2);
    assert!(["1", "2"].contains(&prediction.label.as_str()));
}

#[test]
fn test_malformed_validation_records_fail_training() {
    let train = read(&TaggingReader::default(), "a###X b###Y");
    let dir = artifact_dir("burn_taggers_e2e_schema");
    let device = Default::default();

    let valid = vec![Record::new(
        vec!["a".to_string(), "b".to_string()],
        Some(burn_taggers::datasets::Labels::Tokens(vec!["X".to_string()])),
        4,
    )];

    let err = token_classification::train::<TrainBackend, _>(
        &device,
        &train,
        &valid,
        small_config().with_num_epochs(1),
        Artifacts::create(&dir).unwrap(),
        Writer::new(Vec::new()),
    )
    .err()
    .unwrap();

    assert!(matches!(err, burn_taggers::Error::Shape { line: 4, .. }));
}
