use std::sync::Once;

use log::LevelFilter;

/// How the viewer and the snapshot tool set up their log output.
///
/// `env_filter` takes `env_logger` directives such as
/// `"scanline_renderer::rasterizer=trace,warn"`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            env_filter: Some(filter.into()),
            ..Self::default()
        }
    }

    /// Filter directives in effect: explicit filter, else `RUST_LOG`
    fn directives(&self) -> Option<String> {
        self.env_filter
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
    }
}

static LOGGER: Once = Once::new();

/// Route the `log` macros to stderr. Only the first call has any effect.
///
/// Per-frame rasterizer stats go out at `trace`, scene loading at `info`
/// and `debug`. Without directives everything at `info` and above is shown.
pub fn init_logging(config: LoggingConfig) {
    LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();
        match config.directives() {
            Some(directives) => builder.parse_filters(&directives),
            None => builder.filter_level(LevelFilter::Info),
        };
        builder.write_style(config.write_style);

        // The test harness may have installed a logger first
        if builder.try_init().is_ok() {
            log::debug!("logger ready");
        }
    });
}
