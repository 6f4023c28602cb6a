use quick_xml::escape::escape;

use crate::paper::Keyword;

/// Data shown on the options panel
pub struct OptionsView<'a> {
    pub keywords: &'a [Keyword],
    pub schedule_minutes: u64,
    pub per_keyword_limit: usize,
    pub source_name: &'a str,
    pub source_ready: bool,
    pub discord_ready: bool,
}

/// Data shown on the status page
pub struct StatusView {
    pub keywords: u32,
    pub seen_papers: u32,
    pub last_cycle: Option<String>,
}

const STYLE: &str = r#"
    body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial; margin: 24px; }
    .card { max-width: 980px; margin: 0 auto; padding: 20px; border: 1px solid #ddd; border-radius: 14px; }
    form { display: flex; gap: 8px; margin: 16px 0; }
    input[type=text] { flex: 1; padding: 10px 12px; border: 1px solid #ccc; border-radius: 10px; }
    button { padding: 10px 14px; border: 0; border-radius: 10px; cursor: pointer; }
    .add { background: #111; color: #fff; }
    .del { background: #c62828; color: #fff; }
    table { width: 100%; border-collapse: collapse; margin-top: 10px; }
    th, td { padding: 10px; border-bottom: 1px solid #eee; text-align: left; }
    .muted { color: #666; font-size: 14px; }
    .badge { display: inline-block; padding: 4px 8px; border-radius: 999px; background: #eef; color: #224; font-size: 12px; }
    .right { text-align: right; }
    .mono { font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; }
"#;

fn ok_missing(flag: bool) -> &'static str {
    if flag {
        "<b style='color:green'>OK</b>"
    } else {
        "<b style='color:crimson'>Missing</b>"
    }
}

fn keyword_rows(keywords: &[Keyword]) -> String {
    if keywords.is_empty() {
        return "<tr><td colspan='2' class='muted'>No keywords yet.</td></tr>".to_string();
    }

    keywords
        .iter()
        .map(|kw| {
            format!(
                "<tr><td><a href='/rss?kw={query}'>{term}</a></td>\
                 <td class='right'><form method='post' action='/delete' style='display:inline'>\
                 <input type='hidden' name='id' value='{id}'/>\
                 <button class='del' type='submit'>Delete</button></form></td></tr>",
                query = escape(&url::form_urlencoded::byte_serialize(kw.term.as_bytes()).collect::<String>()),
                term = escape(&kw.term),
                id = kw.id,
            )
        })
        .collect()
}

/// Keyword management panel
pub fn render_options_page(view: &OptionsView<'_>) -> String {
    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>Scholar Watcher | Options</title>
  <meta name="viewport" content="width=device-width,initial-scale=1">
  <style>{style}</style>
</head>
<body>
  <div class="card">
    <h1>Scholar Watcher</h1>
    <p class="muted">Watches {source} for new papers matching your keywords and republishes them as RSS.</p>

    <h2>Keywords</h2>
    <form method="post" action="/add">
      <input name="term" type="text" placeholder="Add a keyword, e.g. graph attention networks" required>
      <button class="add" type="submit">Add</button>
    </form>
    <table>
      <thead><tr><th>Keyword</th><th style="width:200px;" class="right">Actions</th></tr></thead>
      <tbody>{rows}</tbody>
    </table>

    <h2>Config</h2>
    <div><span class="badge">Schedule</span> every <b>{schedule}</b> minutes</div>
    <div><span class="badge">Per-run cap</span> <b>{limit}</b> results / keyword</div>
    <div><span class="badge">Source</span> {source} {source_ok}</div>
    <div><span class="badge">Discord</span> {discord_ok}</div>

    <h2>Manual</h2>
    <form method="post" action="/run-now">
      <button class="add" type="submit">Run a cycle now</button>
    </form>

    <h2>RSS</h2>
    <p class="muted">Recent items: <span class="mono"><a href="/">/</a></span> or <span class="mono">/rss?kw=your+keyword</span></p>
    <p class="muted">Health: <span class="mono"><a href="/health">/health</a></span> • Status: <span class="mono"><a href="/status">/status</a></span></p>
  </div>
</body>
</html>
"#,
        style = STYLE,
        source = escape(view.source_name),
        rows = keyword_rows(view.keywords),
        schedule = view.schedule_minutes,
        limit = view.per_keyword_limit,
        source_ok = ok_missing(view.source_ready),
        discord_ok = ok_missing(view.discord_ready),
    )
}

pub fn render_status_page(view: &StatusView) -> String {
    let last_cycle = view
        .last_cycle
        .as_deref()
        .map(|s| escape(s).into_owned())
        .unwrap_or_else(|| "never".to_string());

    format!(
        "<h1>Status</h1><p>Keywords: <b>{}</b> • Seen papers: <b>{}</b></p><p>Last cycle: {}</p>",
        view.keywords, view.seen_papers, last_cycle
    )
}
