//! Formatter layer construction shared by every output format

/// `fmt` layer in the given text style with the display options applied
macro_rules! create_fmt_layer {
    ($style:ident, $display:expr, $writer:expr) => {
        tracing_subscriber::fmt::layer()
            .$style()
            .with_writer($writer)
            .with_ansi($display.colors)
            .with_target($display.target)
            .with_file($display.source)
            .with_line_number($display.source)
            .with_thread_ids($display.thread_ids)
    };
}

/// `fmt` layer emitting one flattened JSON object per event
macro_rules! create_json_layer {
    ($display:expr, $writer:expr) => {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_writer($writer)
            .with_ansi(false)
            .with_target($display.target)
            .with_file($display.source)
            .with_line_number($display.source)
            .with_thread_ids($display.thread_ids)
    };
}
