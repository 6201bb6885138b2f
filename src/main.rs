use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use prodex_api::RestApi;
use prodex_core::Distance;
use prodex_search::config::{
    DEFAULT_CANDIDATES_PER_CATEGORY, DEFAULT_CATEGORY_COLLECTION, DEFAULT_CATEGORY_FIELD,
    DEFAULT_COMPUTE_WORKERS, DEFAULT_FALLBACK_CANDIDATE_COUNT, DEFAULT_INTENT_TOP_K,
    DEFAULT_OVERSAMPLE_FACTOR, DEFAULT_PRODUCT_COLLECTION, DEFAULT_TASK_TIMEOUT_MS,
};
use prodex_search::{
    HashingEmbedder, LexicalReranker, LocalStore, SearchConfig, SearchService,
    DEFAULT_EMBEDDING_DIM,
};
use prodex_storage::StorageManager;

/// Product search service with intent-scoped retrieval and reranking
#[derive(Parser, Debug)]
#[command(name = "prodex")]
#[command(about = "Product search service", long_about = None)]
struct Args {
    /// HTTP API port
    #[arg(long, env = "PRODEX_HTTP_PORT", default_value_t = 8000)]
    http_port: u16,

    /// Log level
    #[arg(long, env = "PRODEX_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Collection holding product documents
    #[arg(long, env = "PRODEX_PRODUCT_COLLECTION", default_value = DEFAULT_PRODUCT_COLLECTION)]
    product_collection: String,

    /// Collection holding category search phrases
    #[arg(long, env = "PRODEX_CATEGORY_COLLECTION", default_value = DEFAULT_CATEGORY_COLLECTION)]
    category_collection: String,

    /// Product metadata field holding the category label
    #[arg(long, env = "PRODEX_CATEGORY_FIELD", default_value = DEFAULT_CATEGORY_FIELD)]
    category_field: String,

    /// Category labels predicted per query
    #[arg(long, env = "PRODEX_INTENT_TOP_K", default_value_t = DEFAULT_INTENT_TOP_K)]
    intent_top_k: usize,

    #[arg(long, env = "PRODEX_OVERSAMPLE_FACTOR", default_value_t = DEFAULT_OVERSAMPLE_FACTOR)]
    oversample_factor: usize,

    /// Candidates fetched per predicted category
    #[arg(long, env = "PRODEX_CANDIDATES_PER_CATEGORY", default_value_t = DEFAULT_CANDIDATES_PER_CATEGORY)]
    candidates_per_category: usize,

    /// Candidates fetched when no category is predicted
    #[arg(long, env = "PRODEX_FALLBACK_CANDIDATES", default_value_t = DEFAULT_FALLBACK_CANDIDATE_COUNT)]
    fallback_candidate_count: usize,

    /// Per-lookup timeout in milliseconds (0 disables)
    #[arg(long, env = "PRODEX_TASK_TIMEOUT_MS", default_value_t = DEFAULT_TASK_TIMEOUT_MS)]
    task_timeout_ms: u64,

    /// Worker threads for embedding and reranking
    #[arg(long, env = "PRODEX_COMPUTE_WORKERS", default_value_t = DEFAULT_COMPUTE_WORKERS)]
    compute_workers: usize,

    /// Similarity used by new collections: cosine, dot or euclidean
    #[arg(long, env = "PRODEX_DISTANCE", default_value = "cosine")]
    distance: Distance,

    /// Dimension of the hashed text embeddings
    #[arg(long, env = "PRODEX_EMBEDDING_DIM", default_value_t = DEFAULT_EMBEDDING_DIM)]
    embedding_dim: usize,
}

impl Args {
    fn search_config(&self) -> SearchConfig {
        SearchConfig {
            product_collection: self.product_collection.clone(),
            category_collection: self.category_collection.clone(),
            category_field: self.category_field.clone(),
            intent_top_k: self.intent_top_k,
            oversample_factor: self.oversample_factor,
            candidates_per_category: self.candidates_per_category,
            fallback_candidate_count: self.fallback_candidate_count,
            task_timeout_ms: (self.task_timeout_ms > 0).then_some(self.task_timeout_ms),
            compute_workers: self.compute_workers,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting prodex v{}", env!("CARGO_PKG_VERSION"));

    let config = args.search_config();
    info!(?config, distance = ?args.distance, "search configuration");

    let storage = Arc::new(StorageManager::with_distance(args.distance));
    let store = Arc::new(LocalStore::new(storage));
    let embedder = Arc::new(HashingEmbedder::new(args.embedding_dim)?);
    let reranker = Arc::new(LexicalReranker::default());
    let service = Arc::new(SearchService::new(config, store, embedder, reranker)?);
    info!("Search service initialized");

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(service, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
