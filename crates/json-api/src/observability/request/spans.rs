//! HTTP span helpers.
//!
//! Span names and metric route labels use the route template rather than the raw path, so
//! slugs, ids and order tokens never become label values.

use uuid::Uuid;

#[derive(Debug, Clone)]
pub(super) struct RequestSpanName {
    pub(super) otel_path: String,
    pub(super) otel_span_name: String,
}

pub(super) fn request_span_name(method: &str, path: &str) -> RequestSpanName {
    let otel_path = route_template(path);
    let otel_span_name = format!("{method} {otel_path}");

    RequestSpanName {
        otel_path,
        otel_span_name,
    }
}

fn route_template(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.is_empty() {
        return "/".to_owned();
    }

    let mut template = String::new();
    let mut previous: Option<&str> = None;

    for segment in segments {
        template.push('/');

        let placeholder = match previous {
            Some("products" | "categories") => Some("{identifier}"),
            Some("orders") => Some("{token}"),
            _ if Uuid::parse_str(segment).is_ok() => Some("{uuid}"),
            _ => None,
        };

        template.push_str(placeholder.unwrap_or(segment));
        previous = Some(segment);
    }

    template
}
