use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "meditongue")]
#[command(author, version, about = "Medical translation backend with glossary enforcement and emergency flagging", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the translation HTTP server
    Serve(ServeArgs),

    /// Translate a single text through the configured backend
    Translate(TranslateArgs),

    /// Inspect the glossary
    Glossary(GlossaryArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Backend selection shared by commands that talk to a model.
#[derive(Args, Debug, Default, Clone)]
pub struct BackendArgs {
    /// Completion backend (ollama, openai)
    #[arg(long)]
    pub backend: Option<String>,

    /// Model name to use
    #[arg(long)]
    pub model: Option<String>,

    /// Backend base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key for OpenAI-compatible backends
    #[arg(long)]
    pub api_key: Option<String>,

    /// Glossary JSON file (defaults to the bundled glossary)
    #[arg(long)]
    pub glossary: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Parser, Debug)]
pub struct TranslateArgs {
    /// Text to translate
    #[arg(required = true)]
    pub text: String,

    /// Source language code (e.g., en)
    #[arg(short, long)]
    pub from: String,

    /// Target language code (e.g., es)
    #[arg(short, long)]
    pub to: String,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Parser, Debug)]
pub struct GlossaryArgs {
    #[command(subcommand)]
    pub action: GlossaryAction,

    /// Glossary JSON file (defaults to the bundled glossary)
    #[arg(long, global = true)]
    pub glossary: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum GlossaryAction {
    /// List language pairs and their term counts
    Pairs,

    /// Show glossary terms found in a text
    Match {
        /// Text to scan
        text: String,

        /// Source language code
        #[arg(short, long)]
        from: String,

        /// Target language code
        #[arg(short, long)]
        to: String,
    },
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., openai.base_url)
        key: String,
        /// Value to set
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show config file path
    Path,
}
