//! Command-line arguments.
//!
//! Every option can also come from the environment (or a `.env` file loaded
//! before parsing).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use jarvis_rag::DistanceMetric;
use jarvis_telemetry::LogFormat;

#[derive(Debug, Parser)]
#[command(
    name = "jarvis",
    about = "Answer questions about one person from a document corpus",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub options: Options,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the index from a directory of .txt/.md documents
    Ingest {
        /// Directory to read documents from
        #[arg(long, env = "JARVIS_DOCUMENTS_DIR", default_value = "documents")]
        documents_dir: PathBuf,
    },

    /// Answer a single question
    Ask {
        /// The question (remaining words are joined with spaces)
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        question: Vec<String>,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive conversation (/new, /history, /exit)
    Chat,
}

/// Which backend produces embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbeddingProviderKind {
    /// Offline feature hashing
    Hash,
    /// Gemini embedding API
    Gemini,
    /// OpenAI-compatible /embeddings endpoint
    Openai,
}

/// What to do when the index is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NoContextArg {
    /// Answer with a "no relevant context" note
    Proceed,
    /// Reply with the canned refusal
    Refuse,
}

#[derive(Debug, Clone, Args)]
pub struct Options {
    /// Persisted index file
    #[arg(long, global = true, env = "JARVIS_INDEX_PATH", default_value = "data/index.json")]
    pub index_path: PathBuf,

    /// Embedding backend
    #[arg(
        long,
        global = true,
        env = "JARVIS_EMBEDDING_PROVIDER",
        value_enum,
        default_value_t = EmbeddingProviderKind::Hash
    )]
    pub embedding_provider: EmbeddingProviderKind,

    /// Embedding model (defaults depend on the provider)
    #[arg(long, global = true, env = "JARVIS_EMBEDDING_MODEL")]
    pub embedding_model: Option<String>,

    /// Vector width produced by the embedding model
    #[arg(long, global = true, env = "JARVIS_EMBEDDING_DIMENSIONS")]
    pub embedding_dimensions: Option<usize>,

    /// Base URL of the embedding API
    #[arg(long, global = true, env = "JARVIS_EMBEDDING_BASE_URL")]
    pub embedding_base_url: Option<String>,

    /// API key for the embedding API (Gemini falls back to GOOGLE_API_KEY)
    #[arg(long, global = true, env = "JARVIS_EMBEDDING_API_KEY", hide_env_values = true)]
    pub embedding_api_key: Option<String>,

    /// Maximum chunk size in bytes
    #[arg(long, global = true, env = "JARVIS_CHUNK_SIZE", default_value_t = 1000)]
    pub chunk_size: usize,

    /// Bytes shared by consecutive chunks
    #[arg(long, global = true, env = "JARVIS_CHUNK_OVERLAP", default_value_t = 200)]
    pub chunk_overlap: usize,

    /// Chunks retrieved per question
    #[arg(long, global = true, env = "JARVIS_TOP_K", default_value_t = 4)]
    pub top_k: usize,

    /// Ranking metric: cosine or l2
    #[arg(
        long,
        global = true,
        env = "JARVIS_DISTANCE_METRIC",
        default_value_t = DistanceMetric::Cosine
    )]
    pub distance_metric: DistanceMetric,

    /// Drop matches below this similarity (cosine) or above this distance (l2)
    #[arg(long, global = true, env = "JARVIS_SCORE_THRESHOLD")]
    pub score_threshold: Option<f32>,

    /// The person questions are about
    #[arg(long, global = true, env = "JARVIS_SUBJECT", default_value = "Ankit")]
    pub subject: String,

    /// The assistant's name
    #[arg(long, global = true, env = "JARVIS_ASSISTANT_NAME", default_value = "Jarvis")]
    pub assistant_name: String,

    /// Gemini model used for answers
    #[arg(long, global = true, env = "JARVIS_MODEL", default_value = "gemini-2.5-flash")]
    pub model: String,

    /// Google API key for the Gemini model
    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    /// Keep at most this many turns of conversation
    #[arg(long, global = true, env = "JARVIS_MAX_HISTORY_TURNS")]
    pub max_history_turns: Option<usize>,

    /// Seconds to wait for each model call and each embedding request
    #[arg(long, global = true, env = "JARVIS_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Behaviour when the index is empty
    #[arg(
        long,
        global = true,
        env = "JARVIS_NO_CONTEXT",
        value_enum,
        default_value_t = NoContextArg::Proceed
    )]
    pub no_context: NoContextArg,

    /// Rewrite follow-up questions into standalone ones before retrieval
    #[arg(long, global = true, env = "JARVIS_CONDENSE_FOLLOW_UPS")]
    pub condense_follow_ups: bool,

    /// Log output: pretty or json
    #[arg(long, global = true, env = "JARVIS_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}
