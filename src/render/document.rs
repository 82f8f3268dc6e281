use super::markup::{escape_html, DisplayTree};

fn json_for_script_tag(value: &str) -> String {
    value.replace("</", "<\\/")
}

/// Wraps a rendered tree in a standalone page.
///
/// `data` is embedded as JSON for hosts that want the raw records next to
/// the markup. Clicks on `data-event` controls are re-emitted as
/// `ngaji:event` DOM events; the page itself never mutates the tree.
pub fn render_document(tree: &DisplayTree, data: Option<&serde_json::Value>) -> String {
    let title = escape_html(&tree.title);
    let body = tree.to_html();
    let data = data
        .and_then(|v| serde_json::to_string(v).ok())
        .unwrap_or_else(|| "null".to_string());
    let data = json_for_script_tag(&data);

    format!(
        r####"<!DOCTYPE html>
<html lang="id">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>{title}</title>
  <script src="https://cdn.tailwindcss.com?plugins=forms,container-queries"></script>
  <link href="https://fonts.googleapis.com/css2?family=Amiri&amp;family=Inter:wght@400;500;600;700&amp;display=swap" rel="stylesheet"/>
  <script id="tailwind-config">
    tailwind.config = {{
      darkMode: "class",
      theme: {{
        extend: {{
          colors: {{
            "primary": "#0f766e",
            "background-light": "#f8fafc",
            "background-dark": "#0f172a"
          }},
          fontFamily: {{
            "sans": ["Inter", "sans-serif"],
            "arabic": ["Amiri", "serif"]
          }}
        }}
      }}
    }};
  </script>
  <style type="text/tailwindcss">
    .page-title {{ @apply text-3xl font-bold mb-6; }}
    .status {{ @apply rounded-xl px-4 py-3 mb-4 text-sm font-semibold; }}
    .status-info {{ @apply bg-sky-50 text-sky-800 dark:bg-sky-900/20 dark:text-sky-300; }}
    .status-success {{ @apply bg-emerald-50 text-emerald-800 dark:bg-emerald-900/20 dark:text-emerald-300; }}
    .status-error {{ @apply bg-rose-50 text-rose-800 dark:bg-rose-900/20 dark:text-rose-300; }}
    .stats {{ @apply grid grid-cols-2 md:grid-cols-4 gap-4 mb-6; }}
    .stat {{ @apply flex flex-col rounded-2xl bg-white dark:bg-slate-900 border border-slate-200 dark:border-slate-800 p-4; }}
    .controls {{ @apply flex flex-wrap items-center gap-3 mb-6; }}
    .filter-btn, .refresh-toggle, .page-btn, .back-btn, .retry-btn {{ @apply rounded-lg border border-slate-200 dark:border-slate-700 px-3 py-2 text-xs font-bold; }}
    .active {{ @apply bg-primary text-white; }}
    .card-grid {{ @apply grid grid-cols-1 md:grid-cols-2 xl:grid-cols-3 gap-5; }}
    .card {{ @apply rounded-2xl border border-slate-200 dark:border-slate-800 bg-white dark:bg-slate-900 p-5 shadow-sm cursor-pointer; }}
    .very-new {{ @apply ring-2 ring-rose-400; }}
    .new {{ @apply ring-2 ring-amber-300; }}
    .thumbnail {{ @apply relative mb-3; }}
    .badge {{ @apply absolute top-2 left-2 rounded bg-rose-600 px-2 py-0.5 text-xs font-bold text-white; }}
    .duration {{ @apply absolute bottom-2 right-2 rounded bg-black/70 px-2 py-0.5 text-xs text-white; }}
    .arabic, .section-text {{ @apply font-arabic text-2xl text-right; }}
    .meta, .caption, .channel {{ @apply text-xs text-slate-500 dark:text-slate-400; }}
    .pagination {{ @apply flex justify-center gap-2 mt-8; }}
    .section {{ @apply border-b border-slate-100 dark:border-slate-800 py-4; }}
    .empty-state {{ @apply text-center py-16 flex flex-col items-center gap-4; }}
  </style>
</head>
<body class="bg-background-light dark:bg-background-dark text-slate-900 dark:text-slate-100 min-h-screen">
  <script type="application/json" id="page-data">{data}</script>
  <header class="flex items-center justify-between border-b border-slate-200 dark:border-slate-800 bg-white dark:bg-slate-900 px-8 py-4">
    <h2 class="text-xl font-bold">{title}</h2>
    <button id="theme-toggle" class="rounded-xl bg-slate-100 dark:bg-slate-800 px-3 py-2 text-xs font-bold" type="button">Tema</button>
  </header>
  <div class="max-w-[1280px] mx-auto w-full px-8 py-10">
{body}
  </div>
  <script>
    (function() {{
      const htmlEl = document.documentElement;
      function setTheme(mode) {{
        htmlEl.classList.toggle('dark', mode === 'dark');
        localStorage.setItem('ngaji-theme', mode);
      }}
      const storedTheme = localStorage.getItem('ngaji-theme');
      if (storedTheme === 'dark' || storedTheme === 'light') {{
        setTheme(storedTheme);
      }} else {{
        setTheme(window.matchMedia && window.matchMedia('(prefers-color-scheme: dark)').matches ? 'dark' : 'light');
      }}
      document.getElementById('theme-toggle').addEventListener('click', function() {{
        setTheme(htmlEl.classList.contains('dark') ? 'light' : 'dark');
      }});

      function emit(el, extra) {{
        const detail = Object.assign({{ event: el.getAttribute('data-event') }}, el.dataset, extra || {{}});
        document.dispatchEvent(new CustomEvent('ngaji:event', {{ detail: detail }}));
      }}
      for (const el of document.querySelectorAll('[data-event]')) {{
        if (el.tagName === 'INPUT') {{
          let timer = null;
          el.addEventListener('input', function() {{
            clearTimeout(timer);
            timer = setTimeout(function() {{ emit(el, {{ value: el.value || '' }}); }}, 80);
          }});
        }} else {{
          el.addEventListener('click', function() {{
            if (!el.disabled) emit(el);
          }});
        }}
      }}
    }})();
  </script>
</body>
</html>
"####
    )
}
