//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives).
//!   Unset or invalid, it falls back to `DEFAULT_FILTER`:
//!   "info,session=debug,engine=info,rewrite_lab=debug,tower_http=info,axum=info".
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Notes:
//! - Targets are printed so replay diagnostics (`engine`) stand apart from
//!   session events (`session`) and service events (`rewrite_lab`).

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,session=debug,engine=info,rewrite_lab=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Choose JSON vs pretty; the two builders have different types.
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => {
            builder.json().init();
        }
        _ => {
            builder.init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_docs_quote_the_default_filter() {
        assert!(include_str!("telemetry.rs").contains(&format!("\"{DEFAULT_FILTER}\".")));
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
