//! Landing-page rendering.
//!
//! One static HTML page, rendered per request from a const template. The
//! embedded script opens the WebSocket, appends every received text frame as
//! a new `<pre>` block, and, when the connection closes for any reason,
//! shows a closed indicator and reopens a connection for the currently
//! selected source after a short pause. Changing the selection closes the
//! current connection; the close handler then reconnects with the new value.
//!
//! Data frames are inserted with `textContent`, never as markup: the wire
//! carries raw, unescaped tailed bytes.

use crate::domain::TailMode;

const HOME_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>webtail</title>
<style>
  body { font-family: monospace; margin: 1rem; }
  pre { margin: 0; padding: 0; }
  #status { color: #888; margin: 0.5rem 0; }
</style>
</head>
<body>
{{selector}}
<div id="status"></div>
<div id="data"></div>
<script>
(function () {
    var data = document.getElementById("data");
    var status = document.getElementById("status");
    var select = document.getElementById("source");
    var conn = null;

    function wsUrl() {
        var url = "ws://" + location.host + "/ws";
        if (select && select.value) {
            url += "?file=" + encodeURIComponent(select.value);
        }
        return url;
    }

    function connect() {
        conn = new WebSocket(wsUrl());
        conn.onopen = function () {
            status.textContent = "";
        };
        conn.onmessage = function (evt) {
            if (evt.data !== "") {
                var block = document.createElement("pre");
                block.textContent = evt.data;
                data.appendChild(block);
            }
        };
        conn.onclose = function () {
            status.textContent = "Connection closed";
            setTimeout(connect, 1000);
        };
    }

    if (select) {
        select.addEventListener("change", function () {
            data.textContent = "";
            conn.close();
        });
    }
    connect();
})();
</script>
</body>
</html>
"#;

/// Renders the landing page for the configured mode.
///
/// Multi-file mode gets a `<select>` listing every configured path; the
/// other modes have nothing to pick, so the selector is omitted and the
/// script connects without a query parameter.
pub fn render_home(mode: &TailMode) -> String {
    let selector = match mode {
        TailMode::Select(files) => {
            let options: String = files
                .iter()
                .map(|path| {
                    let name = escape_html(&path.to_string_lossy());
                    format!("<option value=\"{name}\">{name}</option>")
                })
                .collect();
            format!("File: <select id=\"source\">{options}</select>")
        }
        TailMode::Single(_) | TailMode::Stdin => String::new(),
    };
    HOME_HTML.replace("{{selector}}", &selector)
}

/// Escapes a path for use inside an HTML attribute value.
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ── Tests ─────────────────────────────────────────────────────────────────────
