use reqwest::StatusCode;
use thiserror::Error;

/// Price text that could not be turned into integer candidates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("price text is empty")]
    Empty,
    #[error("no digits found in price text {0:?}")]
    NoDigits(String),
    #[error("price range {0:?} has an empty side")]
    EmptySegment(String),
    #[error("price segment {0:?} is not a number")]
    InvalidSegment(String),
    #[error("price {0:?} does not fit in an integer")]
    Overflow(String),
}

/// Failure reported by a page fetch collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The page does not exist (HTTP 404/410). Walkers skip these.
    #[error("page not found: {url}")]
    NotFound { url: String },
    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: StatusCode },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid page url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

/// A category walk aborted on a page that could not be fetched.
#[derive(Debug, Error)]
#[error("scraping {category} page {page} failed: {source}")]
pub struct ScrapeError {
    pub category: String,
    pub page: u32,
    #[source]
    pub source: FetchError,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("storage connection lock poisoned")]
    LockPoisoned,
    #[error("value for {field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

/// Stage of a dataset refresh, used in logs and to report where a refresh failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStage {
    Idle,
    Deleting,
    Scraping,
    Inserting,
    Done,
    Failed,
}

impl std::fmt::Display for RefreshStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RefreshStage::Idle => "idle",
            RefreshStage::Deleting => "deleting",
            RefreshStage::Scraping => "scraping",
            RefreshStage::Inserting => "inserting",
            RefreshStage::Done => "done",
            RefreshStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum DeletionError {
    #[error("could not scan existing products: {0}")]
    Scan(#[source] StoreError),
    #[error("{failed} of {total} products could not be deleted")]
    Partial {
        failed: usize,
        total: usize,
        #[source]
        first: StoreError,
    },
}

/// Stage-level failure of a full refresh. The store is not rolled back.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("deleting existing products failed: {0}")]
    Deletion(#[from] DeletionError),
    #[error("scraping failed: {0}")]
    Scrape(#[from] ScrapeError),
    #[error("inserting product {product_id} failed after {inserted} of {total} inserts: {source}")]
    Insert {
        product_id: String,
        inserted: usize,
        total: usize,
        #[source]
        source: StoreError,
    },
}

impl RefreshError {
    pub fn stage(&self) -> RefreshStage {
        match self {
            RefreshError::Deletion(_) => RefreshStage::Deleting,
            RefreshError::Scrape(_) => RefreshStage::Scraping,
            RefreshError::Insert { .. } => RefreshStage::Inserting,
        }
    }
}

/// Errors from the read side of the catalog.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("product {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
