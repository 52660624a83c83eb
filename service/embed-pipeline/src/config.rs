use file_chunker::text_segmenter::ChunkConfig;
use file_chunker::ReadConfig;

/// Exponential backoff applied to a sink's transient failures
/// (base 100ms, factor 2, up to 3 attempts).
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub base_delay_ms: u64,
    pub factor: u32,
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { base_delay_ms: 100, factor: 2, max_attempts: 3 }
    }
}

impl RetryConfig {
    pub fn delay_for_attempt(&self, attempt: u32) -> std::time::Duration {
        let multiplier = self.factor.saturating_pow(attempt);
        std::time::Duration::from_millis(self.base_delay_ms.saturating_mul(multiplier as u64))
    }
}

/// Settings for one [`crate::driver::EmbedPipeline::run`] invocation.
pub struct PipelineConfig<'a> {
    pub chunk: ChunkConfig<'a>,
    pub read: ReadConfig<'a>,
    /// How many `EmbedInput`s the embedder stage batches together before
    /// calling `embed_batch`.
    pub batch_size: usize,
    /// Bound on each inter-stage channel; back-pressures upstream stages
    /// once a downstream stage falls behind.
    pub queue_capacity: usize,
    /// If a source errors, keep going rather than aborting the whole run.
    pub continue_on_error: bool,
    pub retry: RetryConfig,
    pub index_name: String,
}

impl<'a> Default for PipelineConfig<'a> {
    fn default() -> Self {
        Self {
            chunk: ChunkConfig::default(),
            read: ReadConfig::default(),
            batch_size: 32,
            queue_capacity: 100,
            continue_on_error: true,
            retry: RetryConfig::default(),
            index_name: "default".into(),
        }
    }
}
