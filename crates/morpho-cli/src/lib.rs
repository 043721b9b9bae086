pub mod handlers;
pub mod rate_limit;
pub mod stages;

pub use handlers::{AppState, MAX_WORD_LEN, parse_word, router};
pub use stages::{
    DEMO_WORDS, WordReport, inventory_from, load_corpus, parse_load_mode, render_affix_report,
    render_stats, run_lexicon_stage, run_pipeline, run_rules_stage, validate_words,
};
