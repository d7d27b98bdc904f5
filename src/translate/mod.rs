pub mod glossary;
pub mod llm;
pub mod normalize;
pub mod prompt;

use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tracing::Instrument;

use crate::cli::{BackendArgs, GlossaryAction, GlossaryArgs, TranslateArgs};
use crate::config::Config;
use glossary::{Glossary, match_terms};
use llm::{CompletionProvider, ProviderError};
use normalize::{ModelOutput, TranslationResult, normalize};
use prompt::{EMERGENCY_FLAG, build_prompt};

/// One translation pipeline: glossary lookup, prompt, completion, normalization.
#[derive(Clone)]
pub struct Translator {
    glossary: Arc<Glossary>,
    provider: Arc<dyn CompletionProvider>,
}

impl Translator {
    pub fn new(glossary: Arc<Glossary>, provider: Arc<dyn CompletionProvider>) -> Self {
        Self { glossary, provider }
    }

    pub fn provider(&self) -> &dyn CompletionProvider {
        self.provider.as_ref()
    }

    pub async fn translate(
        &self,
        from_lang: &str,
        to_lang: &str,
        text: &str,
    ) -> Result<TranslationResult, ProviderError> {
        let span = tracing::info_span!("translate", pair = %glossary::pair_key(from_lang, to_lang));

        async {
            let hits = match_terms(text, self.glossary.lookup(from_lang, to_lang));
            tracing::debug!(hits = hits.len(), chars = text.chars().count(), "Matched glossary terms");

            let prompt = build_prompt(from_lang, to_lang, text, &hits);
            let raw = self.provider.complete(&prompt).await?;

            if !ModelOutput::parse(&raw).is_structured() {
                tracing::warn!(raw_len = raw.len(), "Model output was not JSON, using raw text");
            }

            let result = normalize(&raw, &hits);
            if result.has_flag(EMERGENCY_FLAG) {
                tracing::warn!("Emergency flagged");
            }
            tracing::info!(
                terms = result.terms.len(),
                flags = result.flags.len(),
                "Translation complete"
            );
            Ok::<_, ProviderError>(result)
        }
        .instrument(span)
        .await
    }
}

/// Loads the configured glossary, or the bundled one when no path is set.
pub fn load_glossary(cfg: &Config) -> Result<Glossary> {
    match cfg.glossary.path.as_deref() {
        Some(path) => {
            let glossary = Glossary::load(path)
                .with_context(|| format!("Failed to load glossary from {}", path))?;
            tracing::info!("Loaded {} glossary terms from {}", glossary.len(), path);
            Ok(glossary)
        }
        None => Glossary::bundled().context("Bundled glossary is malformed"),
    }
    .inspect(|glossary| {
        if glossary.is_empty() {
            tracing::warn!("Glossary has no terms; responses will carry no glossary hints");
        }
    })
}

pub async fn run(args: TranslateArgs) -> Result<()> {
    let cfg = Config::resolve(&args.backend)?;
    let glossary = Arc::new(load_glossary(&cfg)?);
    let provider: Arc<dyn CompletionProvider> = llm::create_provider(cfg.llm_config())?.into();

    let info = provider.describe();
    eprintln!(
        "{}",
        format!("[Translate] {} -> {} via {} ({})", args.from, args.to, info.backend, info.model)
            .cyan()
    );

    let translator = Translator::new(glossary, provider);
    let result = translator
        .translate(&args.from, &args.to, &args.text)
        .await
        .inspect_err(|e| {
            if let Some(body) = e.upstream_body() {
                tracing::error!(status = ?e.status(), body = %body, "Upstream rejected the request");
            }
        })
        .context("Translation failed")?;

    if result.has_flag(EMERGENCY_FLAG) {
        eprintln!("{}", "[EMERGENCY] Possible medical emergency detected".red().bold());
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub fn inspect_glossary(args: GlossaryArgs) -> Result<()> {
    let cfg = Config::resolve(&BackendArgs {
        glossary: args.glossary,
        ..Default::default()
    })?;
    let glossary = load_glossary(&cfg)?;

    match args.action {
        GlossaryAction::Pairs => {
            println!(
                "{}",
                format!("[Glossary] {} terms", glossary.len()).green()
            );
            for (pair, count) in glossary.pairs() {
                println!("  {:<12} {} terms", pair, count);
            }
        }
        GlossaryAction::Match { text, from, to } => {
            let hits = match_terms(&text, glossary.lookup(&from, &to));
            eprintln!(
                "{}",
                format!("[Glossary] {} hit(s) for {}", hits.len(), glossary::pair_key(&from, &to))
                    .cyan()
            );
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
    }

    Ok(())
}
