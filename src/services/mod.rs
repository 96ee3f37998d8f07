// VoxPopuli Core Services
// Text processing, the two analyzers, bucketing, config and page rendering

pub mod text_processor;
pub mod classify;
pub mod model_store;
pub mod sentiment;
pub mod entities;
pub mod nlp_client;
pub mod analyzer;
pub mod config_store;
pub mod page;

pub use analyzer::{SpeechAnalyzer, EMPTY_INPUT_WARNING, SAMPLE_SPEECH};
pub use classify::{classify_polarity, classify_subjectivity};
pub use config_store::{AppConfig, ConfigError, ConfigStore};
pub use entities::{EntityExtractor, Gazetteer, GazetteerEntityExtractor};
pub use model_store::{ModelError, ModelSpec, ModelStore};
pub use nlp_client::NlpServiceClient;
pub use sentiment::{Lexicon, LexiconSentimentScorer, SentimentScorer};
