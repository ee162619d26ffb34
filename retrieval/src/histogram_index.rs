use crate::block_histogram::{BlockHistogramExtractor, BlockHistograms};
use crate::config::HistogramConfig;
use crate::error::{Result, RetrievalError};
use crate::ranking::{rank_top_k, RankedMatch};
use cv_core::Picture;
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use std::sync::Arc;

struct HistogramEntry {
    picture: Arc<Picture>,
    histograms: BlockHistograms,
}

/// Colour-histogram retrieval over a linearly scanned, in-memory corpus.
///
/// `train` replaces the whole corpus at once; queries running meanwhile keep
/// reading the snapshot they started with.
pub struct HistogramSimilarityIndex {
    config: HistogramConfig,
    extractor: BlockHistogramExtractor,
    entries: RwLock<Arc<Vec<HistogramEntry>>>,
    train_lock: Mutex<()>,
}

impl HistogramSimilarityIndex {
    pub fn new(config: HistogramConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    pub(crate) fn build(config: HistogramConfig) -> Self {
        Self {
            extractor: BlockHistogramExtractor::new(config.grid, config.color_space),
            config,
            entries: RwLock::new(Arc::new(Vec::new())),
            train_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &HistogramConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn train(&self, images: &[Arc<Picture>]) -> Result<()> {
        if images.is_empty() {
            return Err(RetrievalError::EmptyTrainingSet);
        }

        let entries = images
            .par_iter()
            .map(|picture| -> Result<HistogramEntry> {
                Ok(HistogramEntry {
                    histograms: self.extractor.extract(picture.image())?,
                    picture: Arc::clone(picture),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let _training = self.train_lock.lock();

        tracing::debug!(
            entries = entries.len(),
            grid = %self.config.grid,
            color_space = %self.config.color_space,
            "trained histogram index"
        );
        *self.entries.write() = Arc::new(entries);
        Ok(())
    }

    pub fn query(&self, picture: &Picture) -> Vec<RankedMatch> {
        let entries = Arc::clone(&self.entries.read());
        if entries.is_empty() {
            return Vec::new();
        }

        let query = match self.extractor.extract(picture.image()) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(picture = %picture.id(), error = %e, "histogram extraction failed");
                return Vec::new();
            }
        };

        let scored: Vec<RankedMatch> = entries
            .par_iter()
            .map(|entry| {
                RankedMatch::new(
                    Arc::clone(&entry.picture),
                    self.extractor.similarity(&query, &entry.histograms),
                )
            })
            .collect();

        let ranked = rank_top_k(scored, self.config.k);
        tracing::trace!(picture = %picture.id(), results = ranked.len(), "histogram query");
        ranked
    }
}
