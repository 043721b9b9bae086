use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, bail};
use axum::http::HeaderName;
use clap::{Args, Parser, Subcommand};
use morpho_grammar::{
    AffixReportOptions, DEFAULT_MIN_FREQUENCY, DEFAULT_MIN_RULE_FREQUENCY, Peeler, Validator,
    affix_report,
};
use morpho_lexicon::{Corpus, CorpusStats, GrammarDir, LoadMode, StatsLimits};
use morpho_types::{Category, RuleKind};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use morpho_cli::rate_limit::{DEFAULT_CLIENT_HEADER, RateLimiterLayer, parse_client_header};
use morpho_cli::{
    AppState, DEMO_WORDS, inventory_from, load_corpus, parse_load_mode, render_affix_report,
    render_stats, router, run_lexicon_stage, run_pipeline, run_rules_stage, validate_words,
};

const DEFAULT_CORPUS: &str = "corpus_clean.txt";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_RATE_LIMIT_RPS: u32 = 5;
const DEFAULT_RATE_LIMIT_BURST: u32 = 10;

#[derive(Parser)]
#[command(name = "morpho")]
#[command(about = "Induce a morphological grammar from a corpus and validate words against it")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    grammar: GrammarArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GrammarArgs {
    /// Directory holding the lexicon and rule files.
    #[arg(long, global = true, env = "MORPHO_DIR", default_value = ".")]
    dir: PathBuf,
    /// Comma-separated prefix candidates, in match priority order.
    #[arg(long, global = true, env = "MORPHO_PREFIXES", value_delimiter = ',')]
    prefixes: Option<Vec<String>>,
    /// Comma-separated suffix candidates, in match priority order.
    #[arg(long, global = true, env = "MORPHO_SUFFIXES", value_delimiter = ',')]
    suffixes: Option<Vec<String>>,
}

#[derive(Args)]
struct CorpusArgs {
    /// Cleaned, whitespace-separated corpus.
    #[arg(long, env = "MORPHO_CORPUS", default_value = DEFAULT_CORPUS)]
    corpus: PathBuf,
    /// How to read the corpus: `mmap` or `owned`.
    #[arg(
        long = "corpus-mode",
        env = "CORPUS_LOAD_MODE",
        default_value = "mmap",
        value_parser = parse_load_mode
    )]
    corpus_mode: LoadMode,
}

impl CorpusArgs {
    fn load(&self) -> anyhow::Result<Corpus> {
        load_corpus(&self.corpus, self.corpus_mode)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build the prefix, root and suffix lexicons.
    Lexicon {
        #[command(flatten)]
        corpus: CorpusArgs,
        #[arg(long, env = "MORPHO_MIN_FREQUENCY", default_value_t = DEFAULT_MIN_FREQUENCY)]
        min_frequency: u32,
    },
    /// Induce prefix-root and root-suffix rules from existing lexicons.
    Rules {
        #[command(flatten)]
        corpus: CorpusArgs,
        #[arg(long, env = "MORPHO_MIN_RULE_FREQUENCY", default_value_t = DEFAULT_MIN_RULE_FREQUENCY)]
        min_rule_frequency: u32,
    },
    /// Run the lexicon stage followed by the rule stage.
    Pipeline {
        #[command(flatten)]
        corpus: CorpusArgs,
        #[arg(long, env = "MORPHO_MIN_FREQUENCY", default_value_t = DEFAULT_MIN_FREQUENCY)]
        min_frequency: u32,
        #[arg(long, env = "MORPHO_MIN_RULE_FREQUENCY", default_value_t = DEFAULT_MIN_RULE_FREQUENCY)]
        min_rule_frequency: u32,
    },
    /// Print token, vocabulary and character statistics for the corpus.
    Stats {
        #[command(flatten)]
        corpus: CorpusArgs,
        #[arg(long, default_value_t = 20)]
        top_words: usize,
        #[arg(long, default_value_t = 5)]
        top_edges: usize,
        #[arg(long, default_value_t = 10)]
        top_bigrams: usize,
    },
    /// Report frequent word edges and n-grams next to the affix inventory.
    Affixes {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// Affix lengths to report.
        #[arg(long, value_delimiter = ',', default_values_t = [1, 2])]
        lengths: Vec<usize>,
        #[arg(long, default_value_t = 5)]
        top: usize,
        /// Stems listed per affix.
        #[arg(long, default_value_t = 3)]
        stems: usize,
        #[arg(long, default_value_t = 3)]
        ngram: usize,
        #[arg(long, default_value_t = 15)]
        top_ngrams: usize,
    },
    /// Validate words against the grammar files.
    Validate {
        /// Print one JSON array instead of text lines.
        #[arg(long)]
        json: bool,
        /// Append the built-in demonstration words.
        #[arg(long)]
        demo: bool,
        words: Vec<String>,
    },
    /// Show how words split into prefix, root and suffix.
    Peel {
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Serve the validator over HTTP.
    Serve {
        #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
        host: String,
        #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        #[arg(
            long,
            env = "RATE_LIMIT_RPS",
            default_value_t = DEFAULT_RATE_LIMIT_RPS,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        rate_limit_rps: u32,
        #[arg(
            long,
            env = "RATE_LIMIT_BURST",
            default_value_t = DEFAULT_RATE_LIMIT_BURST,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        rate_limit_burst: u32,
        /// Header whose last comma-separated hop identifies the client.
        #[arg(
            long,
            env = "RATE_LIMIT_CLIENT_HEADER",
            default_value = DEFAULT_CLIENT_HEADER,
            value_parser = parse_client_header
        )]
        client_header: HeaderName,
        /// Omit Cache-Control headers.
        #[arg(long)]
        no_cache: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let peeler = Peeler::new(inventory_from(cli.grammar.prefixes, cli.grammar.suffixes));
    let dir = GrammarDir::new(cli.grammar.dir);

    match cli.command {
        Command::Lexicon {
            corpus,
            min_frequency,
        } => lexicon(&peeler, &corpus.load()?, &dir, min_frequency),
        Command::Rules {
            corpus,
            min_rule_frequency,
        } => rules(&peeler, &corpus.load()?, &dir, min_rule_frequency),
        Command::Pipeline {
            corpus,
            min_frequency,
            min_rule_frequency,
        } => {
            let start = Instant::now();
            let corpus = corpus.load()?;
            let (build, induction) =
                run_pipeline(&peeler, &corpus, &dir, min_frequency, min_rule_frequency)?;
            for category in Category::ALL {
                println!("{} {category} entries", build.morphemes(category).len());
            }
            for kind in RuleKind::ALL {
                println!("{} {kind} rules", induction.rules(kind).len());
            }
            info!("pipeline finished in {} ms", start.elapsed().as_millis());
            Ok(())
        }
        Command::Stats {
            corpus,
            top_words,
            top_edges,
            top_bigrams,
        } => {
            let corpus = corpus.load()?;
            let limits = StatsLimits {
                words: top_words,
                edges: top_edges,
                bigrams: top_bigrams,
            };
            let stats = CorpusStats::compute(&corpus, limits);
            print!("{}", render_stats(&corpus, &stats));
            Ok(())
        }
        Command::Affixes {
            corpus,
            lengths,
            top,
            stems,
            ngram,
            top_ngrams,
        } => {
            let corpus = corpus.load()?;
            let options = AffixReportOptions {
                lengths,
                top_affixes: top,
                top_stems: stems,
                ngram_size: ngram,
                top_ngrams,
            };
            let words = corpus.tokens().iter().map(String::as_str);
            let report = affix_report(words, peeler.inventory(), &options);
            print!("{}", render_affix_report(&report));
            Ok(())
        }
        Command::Validate { json, demo, words } => validate(peeler, &dir, json, demo, words),
        Command::Peel { words } => {
            for word in &words {
                println!("{word}: {}", peeler.peel(word));
            }
            Ok(())
        }
        Command::Serve {
            host,
            port,
            rate_limit_rps,
            rate_limit_burst,
            client_header,
            no_cache,
        } => {
            let config = ServeConfig {
                host,
                port,
                rate_limit_rps,
                rate_limit_burst,
                client_header,
                disable_cache: no_cache,
            };
            serve(peeler, &dir, config).await
        }
    }
}

fn lexicon(
    peeler: &Peeler,
    corpus: &Corpus,
    dir: &GrammarDir,
    min_frequency: u32,
) -> anyhow::Result<()> {
    let (build, written) = run_lexicon_stage(peeler, corpus, dir, min_frequency)?;
    for (category, path) in Category::ALL.iter().zip(&written) {
        println!(
            "{} {category} entries (of {} candidates) -> {}",
            build.morphemes(*category).len(),
            build.candidates(*category),
            path.display()
        );
    }
    Ok(())
}

fn rules(
    peeler: &Peeler,
    corpus: &Corpus,
    dir: &GrammarDir,
    min_rule_frequency: u32,
) -> anyhow::Result<()> {
    let (induction, written) = run_rules_stage(peeler, corpus, dir, min_rule_frequency)?;
    for (kind, path) in RuleKind::ALL.iter().zip(&written) {
        println!(
            "{} {kind} rules (of {} candidates) -> {}",
            induction.rules(*kind).len(),
            induction.candidates(*kind),
            path.display()
        );
    }
    Ok(())
}

fn validate(
    peeler: Peeler,
    dir: &GrammarDir,
    json: bool,
    demo: bool,
    mut words: Vec<String>,
) -> anyhow::Result<()> {
    if demo {
        words.extend(DEMO_WORDS.iter().map(|w| w.to_string()));
    }
    if words.is_empty() {
        bail!("no words to validate; pass WORD... or --demo");
    }

    let validator = Validator::load(peeler, dir);
    let reports = validate_words(&validator, words.iter().map(String::as_str))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", report.line());
        }
    }
    Ok(())
}

struct ServeConfig {
    host: String,
    port: u16,
    rate_limit_rps: u32,
    rate_limit_burst: u32,
    client_header: HeaderName,
    disable_cache: bool,
}

async fn serve(peeler: Peeler, dir: &GrammarDir, config: ServeConfig) -> anyhow::Result<()> {
    info!("binding to {}:{}", config.host, config.port);
    info!("using grammar files in {}", dir.root().display());
    if config.disable_cache {
        info!("cache headers disabled");
    }
    info!(
        "rate limit: {} req/s (burst {}) keyed on {}",
        config.rate_limit_rps, config.rate_limit_burst, config.client_header
    );

    let start = Instant::now();
    let validator = Arc::new(Validator::load(peeler, dir));
    info!("grammar loaded in {} ms", start.elapsed().as_millis());

    let state = AppState {
        validator,
        disable_cache: config.disable_cache,
    };

    let rate_limiter = RateLimiterLayer::with_client_header(
        config.rate_limit_rps,
        config.rate_limit_burst,
        config.client_header,
    );
    let app = router(state)
        .layer(rate_limiter)
        .layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();
}
