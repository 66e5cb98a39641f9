//! The upload page.

use axum::response::Html;

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>ledgersplit</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 36rem; margin: 4rem auto; }
  #status { margin-top: 1rem; white-space: pre-wrap; }
</style>
</head>
<body>
<h1>Split payments by accountant</h1>
<p>Upload a CSV, TSV or Excel export. You get back a ZIP with one table per accountant,
a mapping of every spelling to its accountant, and a summary.</p>
<form id="upload">
  <input type="file" name="file" accept=".csv,.tsv,.txt,.xlsx,.xlsm,.xls,.ods" required>
  <button type="submit">Split</button>
</form>
<div id="status"></div>
<script>
document.getElementById('upload').addEventListener('submit', async (event) => {
  event.preventDefault();
  const status = document.getElementById('status');
  status.textContent = 'Working...';
  const response = await fetch('/api/split', { method: 'POST', body: new FormData(event.target) });
  if (!response.ok) {
    const body = await response.json().catch(() => ({ message: response.statusText }));
    status.textContent = 'Error: ' + body.message;
    return;
  }
  const disposition = response.headers.get('Content-Disposition') || '';
  const match = disposition.match(/filename="([^"]+)"/);
  const link = document.createElement('a');
  link.href = URL.createObjectURL(await response.blob());
  link.download = match ? match[1] : 'by_accountant.zip';
  link.click();
  status.textContent = 'Done.';
});
</script>
</body>
</html>
"#;

/// Serve the upload page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
