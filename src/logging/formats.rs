use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::Layer,
    registry::LookupSpan,
};

use super::config::LogFormat;

/// Слой форматирования для выбранного формата.
pub fn build_layer<S, W>(
    format: LogFormat,
    writer: W,
    with_ansi: bool,
    with_target: bool,
) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_ansi(with_ansi)
        .with_target(with_target);

    match format {
        LogFormat::Pretty => Box::new(base.pretty()),
        LogFormat::Compact => Box::new(base.compact()),
        LogFormat::Json => Box::new(base.json().with_current_span(true)),
    }
}
