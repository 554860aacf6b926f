//! Shared route helpers for page rendering.

use axum::response::Html;

/// Wrap an admin body in a minimal HTML document.
pub fn admin_page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} | Tessera</title>
</head>
<body class="admin">
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>"#,
        title = html_escape(title),
    ))
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
