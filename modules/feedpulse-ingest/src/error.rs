/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The provider rejected or failed the dataset fetch. Fatal to this
    /// ingestion call and not retried here; the upstream trigger (webhook
    /// redelivery or a later scheduled re-fetch) owns retry.
    #[error("Provider fetch failed for dataset {dataset_id}: {message}")]
    ProviderFetch { dataset_id: String, message: String },

    #[error("Store write failed: {0}")]
    Store(String),
}
