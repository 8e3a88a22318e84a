//! Logging setup utilities for the hiroba chat server.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are enabled by the default filter.
const LOGGED_CRATES: &[&str] = &["hiroba_server", "hiroba_shared", "tower_http"];

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "hiroba-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use hiroba_shared::logger::setup_logger;
///
/// setup_logger("hiroba-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!("Logger initialized for '{}'", binary_name);
}

/// Build the `EnvFilter` directive used when `RUST_LOG` is not set.
fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    LOGGED_CRATES
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_includes_binary_and_crates() {
        // テスト項目: デフォルトのフィルタにバイナリ名とライブラリのクレートが含まれる
        // given (前提条件):
        let binary_name = "hiroba-server";

        // when (操作):
        let filter = default_filter(binary_name, "debug");

        // then (期待する結果): ハイフンはアンダースコアに変換される
        assert!(filter.contains("hiroba_server=debug"));
        assert!(filter.contains("hiroba_shared=debug"));
        assert!(filter.contains("tower_http=debug"));
        assert!(!filter.contains('-'));
    }

    #[test]
    fn test_default_filter_is_valid_directive() {
        // テスト項目: 生成したフィルタが EnvFilter として解釈できる
        // given (前提条件):
        let filter = default_filter("hiroba-server", "info");

        // when (操作):
        let parsed = EnvFilter::try_new(&filter);

        // then (期待する結果):
        assert!(parsed.is_ok());
    }
}
