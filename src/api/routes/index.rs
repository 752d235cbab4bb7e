//! Landing page

use axum::{extract::State, response::Html};

use crate::api::state::ApiState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GET /
pub async fn index(State(state): State<ApiState>) -> Html<String> {
    let health = state.health.snapshot().await;

    let (color, status) = if health.is_healthy() {
        ("#00d4aa", "Healthy")
    } else {
        ("#ff6b6b", "Unhealthy")
    };
    let session = if health.session_valid { "Valid" } else { "Invalid" };
    let last_collection = health
        .last_collection
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>eero Prometheus Exporter</title>
    <style>
        body {{
            font-family: -apple-system, "Segoe UI", Roboto, sans-serif;
            max-width: 650px; margin: 50px auto; padding: 20px;
            background: #1a1a2e; color: #eee;
        }}
        h1 {{ color: #00d4aa; border-bottom: 2px solid #00d4aa; padding-bottom: 10px; }}
        a {{ color: #00d4aa; text-decoration: none; }}
        .version {{ color: #888; font-size: 0.9em; }}
        .status {{
            display: inline-block; padding: 4px 12px; border-radius: 4px;
            color: {color}; border: 1px solid {color};
        }}
        td {{ padding: 6px 12px 6px 0; }}
    </style>
</head>
<body>
    <h1>eero Prometheus Exporter <span class="version">v{VERSION}</span></h1>
    <p><span class="status">{status}</span></p>
    <table>
        <tr><td>Session</td><td>{session}</td></tr>
        <tr><td>Collections</td><td>{total} ({failed} failed)</td></tr>
        <tr><td>Last collection</td><td>{last_collection}</td></tr>
    </table>
    <ul>
        <li><a href="/metrics">Metrics</a></li>
        <li><a href="/health">Health</a></li>
        <li><a href="/ready">Ready</a></li>
    </ul>
</body>
</html>
"#,
        total = health.cycles_total,
        failed = health.cycles_failed,
    ))
}
