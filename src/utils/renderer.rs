use std::io::Write;

use derive_new::new;

use crate::pipelines::history::{EpochMetrics, History};

/// Receives training progress as it happens
pub trait Renderer {
    /// Called once after each epoch
    fn render_epoch(&mut self, metrics: &EpochMetrics);

    /// Called once the run reached a terminal state
    fn render_summary(&mut self, history: &History);
}

fn describe(metrics: &EpochMetrics) -> String {
    let mut line = format!(
        "epoch {}: train loss {:.4}, train accuracy {:.4}",
        metrics.epoch, metrics.train_loss, metrics.train_accuracy
    );

    if let (Some(loss), Some(accuracy)) = (metrics.valid_loss, metrics.valid_accuracy) {
        line.push_str(&format!(", valid loss {loss:.4}, valid accuracy {accuracy:.4}"));
    }

    line
}

/// A simple renderer that writes progress through the `log` facade
#[derive(new)]
pub struct Simple {}

impl Renderer for Simple {
    fn render_epoch(&mut self, metrics: &EpochMetrics) {
        log::info!("{}", describe(metrics));
    }

    fn render_summary(&mut self, history: &History) {
        log::info!(
            "finished as {:?} after {} epochs, best epoch {:?}",
            history.state,
            history.epochs.len(),
            history.best_epoch
        );
    }
}

/// Writes one line per epoch to any sink, e.g. a log file or a buffer
#[derive(new)]
pub struct Writer<W: Write> {
    /// The destination
    pub sink: W,
}

impl<W: Write> Renderer for Writer<W> {
    fn render_epoch(&mut self, metrics: &EpochMetrics) {
        if let Err(e) = writeln!(self.sink, "{}", describe(metrics)) {
            log::warn!("unable to write progress: {e}");
        }
    }

    fn render_summary(&mut self, history: &History) {
        if let Err(e) = writeln!(
            self.sink,
            "finished as {:?} after {} epochs",
            history.state,
            history.epochs.len()
        ) {
            log::warn!("unable to write progress: {e}");
        }
    }
}
