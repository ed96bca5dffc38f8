//! Logging setup utilities for the Podium binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The default filter enables `default_log_level` for the binary itself and for
/// every Podium crate. `RUST_LOG` overrides the whole filter when set.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "podium-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info")
///
/// # Examples
///
/// ```no_run
/// use podium_shared::logger::setup_logger;
///
/// setup_logger("podium-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Crates whose logs are enabled at the default level
const PODIUM_CRATES: [&str; 2] = ["podium_server", "podium_shared"];

/// Build the filter directive used when `RUST_LOG` is not set.
///
/// The binary gets its own directive unless it shares a name with one of the crates.
fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    let mut directives: Vec<String> = PODIUM_CRATES
        .iter()
        .map(|target| format!("{}={}", target, default_log_level))
        .collect();
    if !PODIUM_CRATES.contains(&binary_target.as_str()) {
        directives.push(format!("{}={}", binary_target, default_log_level));
    }
    directives.push("tower_http=info".to_string());
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_lists_each_target_once() {
        // テスト項目: バイナリ名がクレート名と同じとき、ディレクティブが重複しない
        // given (前提条件):
        let binary_name = "podium-server";

        // when (操作):
        let filter = default_filter(binary_name, "debug");

        // then (期待する結果):
        assert_eq!(
            filter,
            "podium_server=debug,podium_shared=debug,tower_http=info"
        );
    }

    #[test]
    fn test_default_filter_adds_other_binaries() {
        // テスト項目: クレート名と異なるバイナリには専用のディレクティブが追加される
        // when (操作):
        let filter = default_filter("podium-loadgen", "info");

        // then (期待する結果):
        assert!(filter.contains("podium_loadgen=info"));
        assert_eq!(filter.matches("podium_server=info").count(), 1);
        assert!(filter.ends_with("tower_http=info"));
    }
}
