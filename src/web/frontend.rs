//! Embedded HTML/CSS/JS frontend for the ozon-dash web dashboard.
//!
//! The entire SPA is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Ozon Seller Dashboard</title>
<style>
:root {
  --bg: #f5f7fa;
  --surface: #ffffff;
  --border: #dde3ea;
  --text: #1d2330;
  --text-muted: #6b7685;
  --accent: #005bff;
  --green: #1f9d55;
  --yellow: #c98a00;
  --red: #d93025;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}

body.dark-theme {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1200px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 16px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 22px; font-weight: 600; }
header h1 .logo { color: var(--accent); }
.header-actions { display: flex; gap: 8px; align-items: center; }

.banner {
  padding: 10px 14px;
  border-radius: var(--radius);
  margin-bottom: 12px;
  border: 1px solid var(--yellow);
  color: var(--yellow);
  background: var(--surface);
}
.banner.error { border-color: var(--red); color: var(--red); }
.hidden { display: none !important; }

nav {
  display: flex;
  gap: 4px;
  margin-bottom: 20px;
  background: var(--surface);
  border-radius: var(--radius);
  padding: 4px;
  border: 1px solid var(--border);
}
nav button {
  flex: 1;
  padding: 8px 16px;
  border: none;
  border-radius: 6px;
  background: transparent;
  color: var(--text-muted);
  font-weight: 500;
  cursor: pointer;
}
nav button.active { background: var(--accent); color: #fff; }

button.btn {
  padding: 6px 12px;
  border: 1px solid var(--border);
  border-radius: 6px;
  background: var(--surface);
  color: var(--text);
  cursor: pointer;
}
button.btn.primary { background: var(--accent); border-color: var(--accent); color: #fff; }
button.btn:disabled { opacity: 0.5; cursor: default; }

input, select {
  padding: 6px 10px;
  border: 1px solid var(--border);
  border-radius: 6px;
  background: var(--surface);
  color: var(--text);
}

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 16px;
}

.tiles { display: grid; grid-template-columns: repeat(auto-fill, minmax(180px, 1fr)); gap: 12px; margin-bottom: 20px; }
.tile .label { color: var(--text-muted); font-size: 12px; }
.tile .value { font-size: 22px; font-weight: 600; }

.charts { display: grid; grid-template-columns: repeat(auto-fill, minmax(320px, 1fr)); gap: 12px; margin-bottom: 20px; }
.charts img { width: 100%; }

.toolbar { display: flex; flex-wrap: wrap; gap: 8px; align-items: center; margin-bottom: 12px; }
.toolbar .grow { flex: 1; }

.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 12px; }
.product { position: relative; cursor: pointer; }
.product.selected { outline: 2px solid var(--accent); }
.product img { width: 100%; height: 140px; object-fit: cover; border-radius: 6px; margin-bottom: 8px; }
.product .name { font-weight: 600; }
.product .meta { color: var(--text-muted); font-size: 12px; }
.product .row { display: flex; gap: 6px; align-items: center; margin-top: 6px; }
.product .row input { width: 100px; }
.low-margin .margin { color: var(--red); }
.high-margin .margin { color: var(--green); }

.pager { display: flex; gap: 4px; align-items: center; justify-content: center; margin-top: 16px; }
.pager button.current { background: var(--accent); color: #fff; }
.info { color: var(--text-muted); text-align: center; margin-top: 8px; }

table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 6px 8px; border-bottom: 1px solid var(--border); }
th { color: var(--text-muted); font-weight: 500; }
td.num { text-align: right; font-variant-numeric: tabular-nums; }

.form { display: grid; gap: 8px; max-width: 420px; }
.form label { color: var(--text-muted); font-size: 12px; }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1><span class="logo">ozon</span>-dash</h1>
    <div class="header-actions">
      <select id="period">
        <option value="day">Day</option>
        <option value="week">Week</option>
        <option value="month">Month</option>
        <option value="year">Year</option>
      </select>
      <button class="btn" id="refresh">Refresh</button>
      <button class="btn" id="theme">Theme</button>
    </div>
  </header>

  <div id="banner" class="banner hidden"></div>
  <div id="error" class="banner error hidden"></div>

  <nav id="tabs">
    <button data-tab="home">Home</button>
    <button data-tab="products">Products</button>
    <button data-tab="analytics">Analytics</button>
    <button data-tab="settings">Settings</button>
  </nav>

  <section id="tab-home">
    <div class="card">
      <h2>Welcome</h2>
      <p id="home-status"></p>
      <p>Use the Products tab to enter product costs and the Analytics tab to review sales, margin and ROI.</p>
      <div class="toolbar" style="margin-top:12px">
        <button class="btn primary" id="report">Send report to Telegram</button>
        <span id="report-status"></span>
      </div>
    </div>
  </section>

  <section id="tab-products" class="hidden">
    <div class="toolbar">
      <input id="search" class="grow" placeholder="Search by name or offer id">
      <select id="category"><option value="">All categories</option></select>
      <select id="limit"></select>
      <button class="btn primary" id="save-all">Save all costs</button>
    </div>
    <div class="toolbar card" id="bulk">
      <span id="bulk-count">0 selected</span>
      <input id="bulk-cost" placeholder="Cost for selected">
      <button class="btn primary" id="bulk-apply" disabled>Apply</button>
      <button class="btn" id="bulk-clear">Clear selection</button>
    </div>
    <div class="grid" id="products"></div>
    <div class="pager" id="pager"></div>
    <div class="info" id="items-info"></div>
  </section>

  <section id="tab-analytics" class="hidden">
    <div class="tiles" id="tiles"></div>
    <div class="charts">
      <div class="card"><img id="chart-sales" alt="Sales"></div>
      <div class="card"><img id="chart-margin" alt="Margin"></div>
      <div class="card"><img id="chart-roi" alt="ROI"></div>
    </div>
    <div class="card">
      <table>
        <thead><tr><th>Offer</th><th>Name</th><th>Price</th><th>Cost</th><th>Profit</th><th>Margin</th><th>ROI</th></tr></thead>
        <tbody id="cost-table"></tbody>
      </table>
    </div>
  </section>

  <section id="tab-settings" class="hidden">
    <div class="card">
      <h2>Account</h2>
      <p id="account"></p>
      <div class="form" style="margin-top:12px">
        <label>Telegram user id</label>
        <input id="tg-user">
        <button class="btn primary" id="tg-login">Load tokens from Telegram</button>
        <label>Ozon API token</label>
        <input id="token" type="password">
        <label>Ozon client id</label>
        <input id="client">
        <label>Backend API key</label>
        <input id="apikey">
        <button class="btn" id="login">Save tokens</button>
        <button class="btn" id="logout">Sign out</button>
      </div>
    </div>
  </section>
</div>

<script>
const $ = (id) => document.getElementById(id);
const fmt = (n) => Number(n || 0).toLocaleString('ru-RU', { maximumFractionDigits: 2 });
let state = null;

async function api(method, path, params) {
  const body = params ? new URLSearchParams(params).toString() : undefined;
  const resp = await fetch(path, {
    method,
    headers: body ? { 'Content-Type': 'application/x-www-form-urlencoded' } : {},
    body,
  });
  const data = await resp.json().catch(() => ({}));
  if (!resp.ok) {
    showError(data.error || resp.statusText);
    return null;
  }
  return data;
}

function showError(message) {
  const el = $('error');
  el.textContent = message || '';
  el.classList.toggle('hidden', !message);
}

function renderState(s) {
  if (!s) return;
  state = s;
  document.body.className = s.theme_class;
  $('period').value = s.period;
  $('banner').textContent = s.banner || '';
  $('banner').classList.toggle('hidden', !s.banner);
  showError(s.error);

  document.querySelectorAll('#tabs button').forEach((b) => {
    b.classList.toggle('active', b.dataset.tab === s.tab);
  });
  ['home', 'products', 'analytics', 'settings'].forEach((t) => {
    $('tab-' + t).classList.toggle('hidden', t !== s.tab);
  });

  $('home-status').textContent = s.authenticated
    ? `Signed in as client ${s.client_id}.`
    : 'Not signed in. Load your tokens from the Telegram bot in Settings.';
  $('report-status').textContent = s.report_status || '';
  $('account').textContent = s.authenticated
    ? `Client ${s.client_id}, token ${s.masked_token}`
    : 'No credentials stored.';
  if (s.telegram_user) $('tg-user').value = s.telegram_user;

  const category = $('category');
  const current = category.value;
  category.innerHTML = '<option value="">All categories</option>' +
    s.categories.map((c) => `<option>${escapeHtml(c)}</option>`).join('');
  category.value = current;

  if (s.tab === 'analytics') renderAnalytics(s);
  if (s.tab === 'products') loadProducts({});
}

function renderAnalytics(s) {
  const a = s.analytics;
  const tiles = [
    ['Sales', fmt(a.sales) + ' ₽'], ['Profit', fmt(a.profit) + ' ₽'],
    ['Margin', fmt(a.margin) + '%'], ['ROI', fmt(a.roi) + '%'],
    ['Orders', a.orders], ['Average order', fmt(a.average_order) + ' ₽'],
    ['Products', `${a.active_products} / ${a.total_products}`],
    ['Marketplace fees', fmt(a.marketplace_fees) + ' ₽'],
    ['Advertising', fmt(a.advertising_costs) + ' ₽'],
  ];
  $('tiles').innerHTML = tiles.map(([l, v]) =>
    `<div class="card tile"><div class="label">${l}</div><div class="value">${v}</div></div>`).join('');

  const bust = Date.now();
  ['sales', 'margin', 'roi'].forEach((k) => { $('chart-' + k).src = `/api/charts/${k}.svg?t=${bust}`; });

  $('cost-table').innerHTML = s.cost_table.map((r) => `
    <tr class="${r.band}">
      <td>${escapeHtml(r.offer_id)}</td><td>${escapeHtml(r.name)}</td>
      <td class="num">${fmt(r.price)}</td><td class="num">${fmt(r.cost)}</td>
      <td class="num">${fmt(r.profit)}</td><td class="num margin">${fmt(r.margin)}%</td>
      <td class="num">${fmt(r.roi)}%</td>
    </tr>`).join('');
}

async function loadProducts(params) {
  const query = new URLSearchParams(params).toString();
  renderProducts(await api('GET', '/api/products' + (query ? '?' + query : '')));
}

function renderProducts(p) {
  if (!p) return;
  $('limit').innerHTML = p.page_sizes.map((n) =>
    `<option value="${n}" ${n === p.items_per_page ? 'selected' : ''}>${n} per page</option>`).join('');

  $('products').innerHTML = p.items.map((item) => `
    <div class="card product ${item.band_class} ${item.selected ? 'selected' : ''}" data-offer="${escapeHtml(item.offer_id)}">
      <img src="${escapeHtml(item.image)}" alt="">
      <div class="name">${escapeHtml(item.name)}</div>
      <div class="meta">${escapeHtml(item.offer_id)} ${escapeHtml(item.category)}</div>
      <div>Price: ${fmt(item.price)} ₽</div>
      <div>Profit: ${fmt(item.profit)} ₽ · <span class="margin">Margin ${fmt(item.margin)}%</span> · ROI ${fmt(item.roi)}%</div>
      <div class="row">
        <input class="cost" value="${item.draft_cost}" data-offer="${escapeHtml(item.offer_id)}">
        <button class="btn save" data-offer="${escapeHtml(item.offer_id)}" ${item.changed && !item.saving ? '' : 'disabled'}>
          ${item.saving ? 'Saving...' : 'Save'}
        </button>
      </div>
    </div>`).join('') || '<p>No products found.</p>';

  $('pager').innerHTML = p.total_pages > 1 ? [
    `<button class="btn" data-page="${p.page - 1}" ${p.has_prev ? '' : 'disabled'}>‹</button>`,
    ...p.page_buttons.map((n) =>
      `<button class="btn ${n === p.page ? 'current' : ''}" data-page="${n}">${n}</button>`),
    `<button class="btn" data-page="${p.page + 1}" ${p.has_next ? '' : 'disabled'}>›</button>`,
  ].join('') : '';
  $('items-info').textContent = p.info.total ? p.info_text : '';

  $('bulk-count').textContent = `${p.selected.length} selected`;
  $('bulk-apply').disabled = !p.can_apply_bulk;
  $('bulk-apply').textContent = p.bulk_updating ? 'Applying...' : 'Apply';
  if (document.activeElement !== $('bulk-cost')) $('bulk-cost').value = p.bulk_cost;
}

function escapeHtml(s) {
  return String(s ?? '').replace(/[&<>"']/g, (c) =>
    ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' }[c]));
}

// Events

$('tabs').addEventListener('click', async (e) => {
  const tab = e.target.dataset.tab;
  if (tab) renderState(await api('POST', '/api/tab', { tab }));
});
$('period').addEventListener('change', async (e) => {
  renderState(await api('POST', '/api/period', { period: e.target.value }));
});
$('refresh').addEventListener('click', async () => renderState(await api('POST', '/api/refresh')));
$('theme').addEventListener('click', async () => {
  const r = await api('POST', '/api/theme');
  if (r) document.body.className = r.theme_class;
});

$('report').addEventListener('click', async () => {
  $('report-status').textContent = 'Sending report...';
  const r = await api('POST', '/api/report');
  $('report-status').textContent = r ? r.status : '';
});

let searchTimer = null;
$('search').addEventListener('input', (e) => {
  clearTimeout(searchTimer);
  searchTimer = setTimeout(() => loadProducts({ search: e.target.value, page: 1 }), 200);
});
$('category').addEventListener('change', (e) => loadProducts({ category: e.target.value, page: 1 }));
$('limit').addEventListener('change', (e) => loadProducts({ limit: e.target.value }));
$('pager').addEventListener('click', (e) => {
  const page = e.target.dataset.page;
  if (page && !e.target.disabled) loadProducts({ page });
});

$('products').addEventListener('change', async (e) => {
  if (e.target.classList.contains('cost')) {
    renderProducts(await api('POST', '/api/products/cost', { offer_id: e.target.dataset.offer, cost: e.target.value }));
  }
});
$('products').addEventListener('click', async (e) => {
  if (e.target.classList.contains('save')) {
    renderProducts(await api('POST', '/api/products/save', { offer_id: e.target.dataset.offer }));
    return;
  }
  if (e.target.tagName === 'INPUT' || e.target.tagName === 'BUTTON') return;
  const card = e.target.closest('.product');
  if (card) renderProducts(await api('POST', '/api/products/bulk', { action: 'toggle', offer_id: card.dataset.offer }));
});
$('bulk-cost').addEventListener('input', async (e) => {
  renderProducts(await api('POST', '/api/products/bulk', { action: 'value', cost: e.target.value }));
});
$('bulk-apply').addEventListener('click', async () => {
  renderProducts(await api('POST', '/api/products/bulk', { action: 'apply' }));
});
$('bulk-clear').addEventListener('click', async () => {
  renderProducts(await api('POST', '/api/products/bulk', { action: 'clear' }));
});
$('save-all').addEventListener('click', async () => {
  const r = await api('POST', '/api/products/save');
  if (r) alert(r.message);
});

$('tg-login').addEventListener('click', async () => {
  renderState(await api('POST', '/api/telegram', { user_id: $('tg-user').value }));
});
$('login').addEventListener('click', async () => {
  renderState(await api('POST', '/api/login', {
    ozon_api_token: $('token').value, ozon_client_id: $('client').value, api_key: $('apikey').value,
  }));
});
$('logout').addEventListener('click', async () => renderState(await api('POST', '/api/logout')));

api('GET', '/api/state').then(renderState);
setInterval(async () => {
  const s = await api('GET', '/api/state');
  if (s && state && (s.api_available !== state.api_available)) renderState(s);
}, 30000);
</script>
</body>
</html>
"##;
