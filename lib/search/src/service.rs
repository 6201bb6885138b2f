//! Search orchestration and index insertion

use crate::config::SearchConfig;
use crate::embedder::Embedder;
use crate::intent::IntentClassifier;
use crate::pool::ComputePool;
use crate::rerank::{RerankStage, Reranker};
use crate::retriever::CandidateRetriever;
use crate::store::VectorStore;
use crate::types::{
    check_unique_ids, CategoryEntry, CollectionBatch, ProductRecord, SearchOutcome,
};
use crate::{Result, SearchError};
use ahash::AHashSet;
use prodex_core::Vector;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Query pipeline: embed, classify, fan out, rerank.
///
/// One instance serves any number of concurrent searches; per-query state
/// lives on the stack of each call.
pub struct SearchService {
    config: SearchConfig,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    pool: Arc<ComputePool>,
    classifier: IntentClassifier,
    retriever: CandidateRetriever,
    reranker: RerankStage,
}

impl SearchService {
    pub fn new(
        config: SearchConfig,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        reranker: Arc<dyn Reranker>,
    ) -> Result<Self> {
        config.validate()?;
        let pool = Arc::new(ComputePool::new(config.compute_workers)?);

        Ok(Self {
            classifier: IntentClassifier::new(store.clone(), &config),
            retriever: CandidateRetriever::new(store.clone(), &config),
            reranker: RerankStage::new(reranker, pool.clone()),
            config,
            store,
            embedder,
            pool,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Product ids ordered by descending relevance to `query`
    pub async fn search(&self, query: &str) -> Result<Vec<String>> {
        Ok(self.search_detailed(query).await?.ranked_ids)
    }

    pub async fn search_detailed(&self, query: &str) -> Result<SearchOutcome> {
        let start = Instant::now();
        info!(query, "search started");

        let embedding = Arc::new(self.embed_query(query).await?);

        let categories = self
            .classifier
            .predict_categories(&embedding, self.config.intent_top_k)
            .await;

        let (candidates, lookups) = self
            .retriever
            .retrieve_with_stats(&embedding, &categories)
            .await?;
        let candidate_count = candidates.len();

        let ranked_ids = self.reranker.rerank(query, candidates).await?;

        info!(
            ?categories,
            candidates = candidate_count,
            results = ranked_ids.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search finished"
        );
        Ok(SearchOutcome {
            ranked_ids,
            categories,
            candidate_count,
            lookups,
        })
    }

    /// Embed and store products in one batch. Returns the number written.
    ///
    /// A batch that repeats an id is rejected before anything is embedded.
    pub async fn insert_products(&self, products: Vec<ProductRecord>) -> Result<usize> {
        if products.is_empty() {
            return Ok(0);
        }

        let mut ids = Vec::with_capacity(products.len());
        let mut documents = Vec::with_capacity(products.len());
        let mut metadatas = Vec::with_capacity(products.len());
        for product in products {
            ids.push(product.id);
            documents.push(product.document);
            metadatas.push(product.metadata);
        }
        check_unique_ids(&ids)?;

        let embeddings = self.embed_batch(documents.clone()).await?;
        let batch = CollectionBatch {
            collection: self.config.product_collection.clone(),
            ids,
            documents,
            embeddings,
            metadatas: Some(metadatas),
        };
        let written = self.store.add(batch).await?;
        info!(count = written, collection = %self.config.product_collection, "products indexed");
        Ok(written)
    }

    /// Embed each search phrase and store it with its label as the document.
    ///
    /// Repeated (label, phrase) pairs in one call are written once.
    pub async fn insert_categories(&self, entries: Vec<CategoryEntry>) -> Result<usize> {
        let mut seen = AHashSet::new();
        let entries: Vec<CategoryEntry> = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.clone()))
            .collect();
        if entries.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = entries.iter().map(CategoryEntry::id).collect();
        check_unique_ids(&ids)?;
        let mut phrases = Vec::with_capacity(entries.len());
        let mut labels = Vec::with_capacity(entries.len());
        for entry in entries {
            phrases.push(entry.search_string);
            labels.push(entry.subcategory);
        }

        let embeddings = self.embed_batch(phrases).await?;
        let batch = CollectionBatch {
            collection: self.config.category_collection.clone(),
            ids,
            documents: labels,
            embeddings,
            metadatas: None,
        };
        let written = self.store.add(batch).await?;
        info!(count = written, collection = %self.config.category_collection, "categories indexed");
        Ok(written)
    }

    async fn embed_query(&self, query: &str) -> Result<Vector> {
        let embedder = self.embedder.clone();
        let text = query.to_string();
        self.pool.run(move || embedder.encode(&text)).await?
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vector>> {
        let expected = texts.len();
        let embedder = self.embedder.clone();
        let embeddings = self
            .pool
            .run(move || embedder.encode_batch(&texts))
            .await??;

        if embeddings.len() != expected {
            return Err(SearchError::Embedding(format!(
                "embedder returned {} vectors for {} texts",
                embeddings.len(),
                expected
            )));
        }
        debug!(count = expected, "embedded batch");
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedEmbedder, MockReply, MockStore, ScriptedReranker};
    use serde_json::json;

    fn config() -> SearchConfig {
        SearchConfig {
            product_collection: "products".to_string(),
            category_collection: "categories".to_string(),
            compute_workers: 1,
            ..SearchConfig::default()
        }
    }

    fn service(
        store: Arc<MockStore>,
        embedder: Arc<FixedEmbedder>,
        reranker: Arc<ScriptedReranker>,
    ) -> SearchService {
        SearchService::new(config(), store, embedder, reranker).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_single_category() {
        let store = Arc::new(MockStore::new());
        store.reply(
            "categories",
            None,
            MockReply::hits(&[("c1", "Laptops"), ("c2", "Laptops")]),
        );
        store.reply(
            "products",
            Some("Laptops"),
            MockReply::hits(&[("P1", "doc1"), ("P2", "doc2")]),
        );
        let reranker = Arc::new(ScriptedReranker::new(&[("doc1", 0.1), ("doc2", 0.8)]));
        let embedder = Arc::new(FixedEmbedder::new(vec![1.0, 0.0]));
        let service = service(store.clone(), embedder.clone(), reranker.clone());

        let outcome = service.search_detailed("thin laptop").await.unwrap();

        assert_eq!(outcome.ranked_ids, vec!["P2".to_string(), "P1".to_string()]);
        assert_eq!(outcome.categories, vec!["Laptops".to_string()]);
        assert_eq!(outcome.candidate_count, 2);
        assert_eq!(outcome.lookups.completed, 1);
        assert_eq!(embedder.single_calls(), 1);
        assert_eq!(reranker.calls(), 1);

        let product_queries: Vec<_> = store
            .queries()
            .into_iter()
            .filter(|q| q.collection == "products")
            .collect();
        assert_eq!(product_queries.len(), 1);
        assert_eq!(product_queries[0].limit, 70);
        assert_eq!(
            product_queries[0].filter.as_ref().map(|f| f.value.as_str()),
            Some("Laptops")
        );
    }

    #[tokio::test]
    async fn test_intent_failure_falls_back_to_unscoped() {
        let store = Arc::new(MockStore::new());
        store.mark_missing("categories");
        store.reply("products", None, MockReply::hits(&[("P9", "doc9")]));
        let service = service(
            store.clone(),
            Arc::new(FixedEmbedder::new(vec![1.0, 0.0])),
            Arc::new(ScriptedReranker::new(&[])),
        );

        let ranked = service.search("anything").await.unwrap();

        assert_eq!(ranked, vec!["P9".to_string()]);
        let fallback: Vec<_> = store
            .queries()
            .into_iter()
            .filter(|q| q.collection == "products")
            .collect();
        assert_eq!(fallback.len(), 1);
        assert!(fallback[0].filter.is_none());
        assert_eq!(fallback[0].limit, 200);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_fatal() {
        let store = Arc::new(MockStore::new());
        let service = service(
            store.clone(),
            Arc::new(FixedEmbedder::failing()),
            Arc::new(ScriptedReranker::new(&[])),
        );

        let err = service.search("laptop").await.unwrap_err();
        assert!(matches!(err, SearchError::Embedding(_)));
        assert!(store.queries().is_empty());
    }

    #[tokio::test]
    async fn test_no_candidates_skips_reranker() {
        let store = Arc::new(MockStore::new());
        let reranker = Arc::new(ScriptedReranker::new(&[]));
        let service = service(
            store,
            Arc::new(FixedEmbedder::new(vec![1.0, 0.0])),
            reranker.clone(),
        );

        assert!(service.search("nothing indexed").await.unwrap().is_empty());
        assert_eq!(reranker.calls(), 0);
    }

    #[tokio::test]
    async fn test_insert_products_single_batch() {
        let store = Arc::new(MockStore::new());
        let embedder = Arc::new(FixedEmbedder::new(vec![0.5, 0.5]));
        let service = service(
            store.clone(),
            embedder.clone(),
            Arc::new(ScriptedReranker::new(&[])),
        );

        let products: Vec<ProductRecord> = (1..=3)
            .map(|i| ProductRecord {
                id: format!("P{i}"),
                document: format!("product {i}"),
                metadata: json!({ "subcategory": "Laptops" })
                    .as_object()
                    .cloned()
                    .unwrap(),
            })
            .collect();

        assert_eq!(service.insert_products(products).await.unwrap(), 3);
        assert_eq!(embedder.batch_calls(), 1);

        let batches = store.batches();
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        assert_eq!(batch.collection, "products");
        assert_eq!(batch.ids, vec!["P1", "P2", "P3"]);
        assert_eq!(batch.documents.len(), 3);
        assert_eq!(batch.embeddings.len(), 3);
        assert_eq!(batch.metadatas.as_ref().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn test_insert_products_rejects_repeated_id() {
        let store = Arc::new(MockStore::new());
        let embedder = Arc::new(FixedEmbedder::new(vec![1.0, 0.0]));
        let service = service(
            store.clone(),
            embedder.clone(),
            Arc::new(ScriptedReranker::new(&[])),
        );

        let products = ["P1", "P2", "P1"]
            .iter()
            .map(|id| ProductRecord {
                id: id.to_string(),
                document: format!("document for {id}"),
                metadata: Default::default(),
            })
            .collect();

        let err = service.insert_products(products).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidBatch(msg) if msg.contains("P1")));
        assert_eq!(embedder.batch_calls(), 0);
        assert!(store.batches().is_empty());
    }

    #[tokio::test]
    async fn test_empty_insert_is_noop() {
        let store = Arc::new(MockStore::new());
        let embedder = Arc::new(FixedEmbedder::new(vec![1.0]));
        let service = service(
            store.clone(),
            embedder.clone(),
            Arc::new(ScriptedReranker::new(&[])),
        );

        assert_eq!(service.insert_products(Vec::new()).await.unwrap(), 0);
        assert_eq!(service.insert_categories(Vec::new()).await.unwrap(), 0);
        assert_eq!(embedder.batch_calls(), 0);
        assert!(store.batches().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_fails_insert() {
        let store = Arc::new(MockStore::failing_adds());
        let service = service(
            store,
            Arc::new(FixedEmbedder::new(vec![1.0])),
            Arc::new(ScriptedReranker::new(&[])),
        );
        let products = vec![ProductRecord {
            id: "P1".to_string(),
            document: "doc".to_string(),
            metadata: Default::default(),
        }];
        assert!(service.insert_products(products).await.is_err());
    }

    #[tokio::test]
    async fn test_insert_categories_maps_label_to_document() {
        let store = Arc::new(MockStore::new());
        let service = service(
            store.clone(),
            Arc::new(FixedEmbedder::new(vec![1.0, 0.0])),
            Arc::new(ScriptedReranker::new(&[])),
        );

        let entries = vec![
            CategoryEntry::new("Laptops", "gaming notebook"),
            CategoryEntry::new("Laptops", "ultrabook"),
            CategoryEntry::new("Laptops", "gaming notebook"),
        ];
        assert_eq!(service.insert_categories(entries).await.unwrap(), 2);

        let batches = store.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].collection, "categories");
        assert_eq!(
            batches[0].ids,
            vec!["Laptops_gaming notebook", "Laptops_ultrabook"]
        );
        assert_eq!(batches[0].documents, vec!["Laptops", "Laptops"]);
        assert!(batches[0].metadatas.is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SearchConfig {
            intent_top_k: 0,
            ..config()
        };
        let result = SearchService::new(
            config,
            Arc::new(MockStore::new()),
            Arc::new(FixedEmbedder::new(vec![1.0])),
            Arc::new(ScriptedReranker::new(&[])),
        );
        assert!(matches!(result, Err(SearchError::InvalidConfig(_))));
    }
}
