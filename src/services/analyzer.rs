// Speech Analyzer
// Empty-input policy, both analyzers, and the display buckets

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::models::{AnalysisOutcome, SpeechAnalysis};
use crate::services::classify::{classify_polarity, classify_subjectivity};
use crate::services::entities::{EntityExtractor, Gazetteer, GazetteerEntityExtractor};
use crate::services::model_store::{ModelError, ModelSpec, ModelStore};
use crate::services::nlp_client::NlpServiceClient;
use crate::services::sentiment::{Lexicon, LexiconSentimentScorer, SentimentScorer};
use crate::services::text_processor::word_count;

pub const EMPTY_INPUT_WARNING: &str = "Please enter a speech to analyze.";

pub const SAMPLE_SPEECH: &str = concat!(
    "Honorable members of the parliament, today we gather to discuss critical reforms that will shape the future of our nation. ",
    "Our focus must be on improving education, healthcare, and infrastructure to ensure prosperity for all citizens. I firmly believe that by working together, we can create a more inclusive and equitable society. ",
    "We must also invest in renewable energy and sustainable development to protect our environment for future generations. ",
    "Let us commit to transparency, accountability, and the welfare of every citizen. Together, we will overcome challenges and build a stronger nation."
);

pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

pub struct SpeechAnalyzer {
    scorer: Arc<dyn SentimentScorer>,
    extractor: Arc<dyn EntityExtractor>,
    service: Option<NlpServiceClient>,
}

impl SpeechAnalyzer {
    pub fn new(scorer: Arc<dyn SentimentScorer>, extractor: Arc<dyn EntityExtractor>) -> Self {
        Self {
            scorer,
            extractor,
            service: None,
        }
    }

    pub fn with_service(mut self, service: Option<NlpServiceClient>) -> Self {
        self.service = service;
        self
    }

    /// Load both models from the store, fetching any that are missing.
    pub async fn load(
        store: &ModelStore,
        sentiment: &ModelSpec,
        entities: &ModelSpec,
    ) -> Result<Self, ModelError> {
        let t0 = Instant::now();

        let lexicon = store.load_or_fetch::<Lexicon>(sentiment).await?;
        let scorer = LexiconSentimentScorer::new(lexicon.model);
        if scorer.is_empty() {
            return Err(ModelError::Invalid(format!(
                "sentiment lexicon {} has no words",
                lexicon.path.display()
            )));
        }
        info!(
            path = %lexicon.path.display(),
            words = scorer.len(),
            version = scorer.version(),
            fetched = lexicon.fetched,
            "sentiment.loaded"
        );

        let gazetteer = store.load_or_fetch::<Gazetteer>(entities).await?;
        let extractor = GazetteerEntityExtractor::new(gazetteer.model)?;
        info!(
            path = %gazetteer.path.display(),
            version = extractor.version(),
            fetched = gazetteer.fetched,
            "entities.loaded"
        );

        info!(elapsed_ms = t0.elapsed().as_millis(), "models.ready");
        Ok(Self::new(Arc::new(scorer), Arc::new(extractor)))
    }

    /// Analyze with the local models only.
    pub fn analyze_local(&self, text: &str) -> AnalysisOutcome {
        if is_blank(text) {
            return AnalysisOutcome::Warning {
                message: EMPTY_INPUT_WARNING.to_string(),
            };
        }

        let scores = self.scorer.score(text);
        let entities = self.extractor.extract(text);
        AnalysisOutcome::Analyzed(build_analysis(scores.polarity, scores.subjectivity, entities))
    }

    /// Analyze, preferring the remote service when one is configured.
    pub async fn analyze(&self, text: &str) -> AnalysisOutcome {
        if is_blank(text) {
            info!("analysis.skipped_empty_input");
            return AnalysisOutcome::Warning {
                message: EMPTY_INPUT_WARNING.to_string(),
            };
        }

        let t0 = Instant::now();
        let words = word_count(text);

        let service = match &self.service {
            Some(s) => s,
            None => {
                let outcome = self.analyze_local(text);
                log_outcome(&outcome, words, "local", t0);
                return outcome;
            }
        };

        let scores = match service.sentiment(text).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, url = service.base_url(), "nlp_service.sentiment_failed, using local model");
                self.scorer.score(text)
            }
        };
        let entities = match service.entities(text).await {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, url = service.base_url(), "nlp_service.entities_failed, using local model");
                self.extractor.extract(text)
            }
        };

        let outcome = AnalysisOutcome::Analyzed(build_analysis(scores.polarity, scores.subjectivity, entities));
        log_outcome(&outcome, words, "service", t0);
        outcome
    }
}

fn build_analysis(polarity: f64, subjectivity: f64, entities: Vec<crate::models::NamedEntity>) -> SpeechAnalysis {
    SpeechAnalysis {
        polarity,
        subjectivity,
        sentiment: classify_polarity(polarity),
        subjectivity_label: classify_subjectivity(subjectivity),
        entities,
    }
}

fn log_outcome(outcome: &AnalysisOutcome, words: usize, backend: &str, t0: Instant) {
    if let AnalysisOutcome::Analyzed(a) = outcome {
        info!(
            backend,
            words,
            polarity = a.polarity,
            subjectivity = a.subjectivity,
            sentiment = a.sentiment.as_str(),
            entities = a.entities.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "analysis.done"
        );
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{NamedEntity, SentimentLabel, SentimentScores, SubjectivityLabel};
    use crate::services::model_store::{
        BUNDLED_ENTITY_GAZETTEER, BUNDLED_SENTIMENT_LEXICON, ENTITY_GAZETTEER_FILE, SENTIMENT_LEXICON_FILE,
    };
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serve `app` on an ephemeral local port; returns its base URL.
    pub(crate) async fn spawn_stub(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    const SERVICE_TEXT: &str = "Namaste \u{2014} India will rise.";

    /// NLP service double. Entity offsets are char offsets, listed out of order.
    fn nlp_stub(entities_ok: bool) -> Router {
        let entities = if entities_ok {
            post(|| async {
                Json(json!({
                    "entities": [
                        { "text": "India", "label": "GPE", "start": 10, "end": 15 },
                        { "text": "Namaste", "label": "PERSON", "start": 0, "end": 7 }
                    ]
                }))
            })
        } else {
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR })
        };

        Router::new()
            .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
            .route(
                "/sentiment",
                post(|| async { Json(json!({ "polarity": 1.7, "subjectivity": 0.25 })) }),
            )
            .route("/entities", entities)
    }

    pub(crate) fn bundled_analyzer() -> SpeechAnalyzer {
        let lexicon: Lexicon = serde_json::from_str(BUNDLED_SENTIMENT_LEXICON).unwrap();
        let gazetteer: Gazetteer = serde_json::from_str(BUNDLED_ENTITY_GAZETTEER).unwrap();
        SpeechAnalyzer::new(
            Arc::new(LexiconSentimentScorer::new(lexicon)),
            Arc::new(GazetteerEntityExtractor::new(gazetteer).unwrap()),
        )
    }

    struct CountingScorer {
        calls: AtomicUsize,
    }

    impl SentimentScorer for CountingScorer {
        fn score(&self, _text: &str) -> SentimentScores {
            self.calls.fetch_add(1, Ordering::SeqCst);
            SentimentScores { polarity: 0.1, subjectivity: 0.5 }
        }
    }

    struct NoEntities;

    impl EntityExtractor for NoEntities {
        fn extract(&self, _text: &str) -> Vec<NamedEntity> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn test_blank_input_only_warns() {
        let scorer = Arc::new(CountingScorer { calls: AtomicUsize::new(0) });
        let analyzer = SpeechAnalyzer::new(scorer.clone(), Arc::new(NoEntities));

        for input in ["", "   ", "\n\t  \n"] {
            let outcome = analyzer.analyze(input).await;
            assert_eq!(
                outcome,
                AnalysisOutcome::Warning { message: EMPTY_INPUT_WARNING.to_string() }
            );
        }
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_boundary_scores_bucket_as_neutral_and_factual() {
        let scorer = Arc::new(CountingScorer { calls: AtomicUsize::new(0) });
        let analyzer = SpeechAnalyzer::new(scorer.clone(), Arc::new(NoEntities));

        match analyzer.analyze("anything at all").await {
            AnalysisOutcome::Analyzed(a) => {
                assert_eq!(a.sentiment, SentimentLabel::Neutral);
                assert_eq!(a.subjectivity_label, SubjectivityLabel::Factual);
                assert!(a.entities.is_empty());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sample_speech_analysis() {
        let analyzer = bundled_analyzer();
        let analysis = match analyzer.analyze(SAMPLE_SPEECH).await {
            AnalysisOutcome::Analyzed(a) => a,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert!((analysis.polarity - 0.3).abs() < 1e-9);
        assert!((analysis.subjectivity - 0.477).abs() < 1e-9);
        assert_eq!(analysis.sentiment, classify_polarity(analysis.polarity));
        assert_eq!(analysis.subjectivity_label, classify_subjectivity(analysis.subjectivity));
        assert_eq!(analysis.sentiment, SentimentLabel::Positive);
        assert_eq!(analysis.subjectivity_label, SubjectivityLabel::Factual);
        assert_eq!(analysis.entity_texts(), vec!["today"]);
        assert_eq!(analysis.entities[0].label, "DATE");
    }

    #[tokio::test]
    async fn test_repeat_analysis_is_identical() {
        let analyzer = bundled_analyzer();
        let text = "Shri Kumar told the Lok Sabha that 40 percent of villages in Bihar are not safe.";
        let first = analyzer.analyze(text).await;
        let second = analyzer.analyze(text).await;
        assert_eq!(first, second);
        assert_eq!(analyzer.analyze_local(text), first);
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back_to_local() {
        let local = bundled_analyzer().analyze_local(SAMPLE_SPEECH);
        let analyzer = bundled_analyzer().with_service(Some(NlpServiceClient::new("http://127.0.0.1:9")));
        assert_eq!(analyzer.analyze(SAMPLE_SPEECH).await, local);
    }

    #[tokio::test]
    async fn test_service_results_are_used_when_available() {
        let base = spawn_stub(nlp_stub(true)).await;
        let analyzer = bundled_analyzer().with_service(Some(NlpServiceClient::new(&base)));

        let analysis = match analyzer.analyze(SERVICE_TEXT).await {
            AnalysisOutcome::Analyzed(a) => a,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(analysis.polarity, 1.0);
        assert_eq!(analysis.subjectivity, 0.25);
        assert_eq!(analysis.sentiment, SentimentLabel::Positive);
        assert_eq!(analysis.subjectivity_label, SubjectivityLabel::Factual);
        assert_eq!(
            analysis.entities,
            vec![
                NamedEntity { text: "Namaste".to_string(), label: "PERSON".to_string(), start: 0, end: 7 },
                NamedEntity { text: "India".to_string(), label: "GPE".to_string(), start: 12, end: 17 },
            ]
        );
        for e in &analysis.entities {
            assert_eq!(&SERVICE_TEXT[e.start..e.end], e.text);
        }
    }

    #[tokio::test]
    async fn test_failed_entities_call_falls_back_alone() {
        let base = spawn_stub(nlp_stub(false)).await;
        let analyzer = bundled_analyzer().with_service(Some(NlpServiceClient::new(&base)));

        let local = match analyzer.analyze_local(SERVICE_TEXT) {
            AnalysisOutcome::Analyzed(a) => a,
            other => panic!("unexpected outcome: {:?}", other),
        };
        let analysis = match analyzer.analyze(SERVICE_TEXT).await {
            AnalysisOutcome::Analyzed(a) => a,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(analysis.polarity, 1.0);
        assert_eq!(analysis.subjectivity, 0.25);
        assert!(!local.entities.is_empty());
        assert_eq!(analysis.entities, local.entities);
    }

    #[tokio::test]
    async fn test_load_installs_missing_models() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path().to_path_buf());
        let analyzer = SpeechAnalyzer::load(
            &store,
            &ModelSpec::sentiment(SENTIMENT_LEXICON_FILE, None),
            &ModelSpec::entities(ENTITY_GAZETTEER_FILE, None),
        )
        .await
        .unwrap();

        assert!(tmp.path().join(SENTIMENT_LEXICON_FILE).exists());
        assert!(tmp.path().join(ENTITY_GAZETTEER_FILE).exists());
        assert!(matches!(analyzer.analyze_local(SAMPLE_SPEECH), AnalysisOutcome::Analyzed(_)));
    }
}
