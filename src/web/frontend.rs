//! Embedded HTML/CSS/JS frontend for the gridcast web dashboard.
//!
//! The entire SPA is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>POWERGRID Material Forecast</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1100px; margin: 0 auto; padding: 24px; }
.hidden { display: none !important; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 22px; font-weight: 600; }
header .who { color: var(--text-muted); }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 20px;
}
.card h2 { font-size: 16px; margin-bottom: 12px; }

.grid { display: grid; grid-template-columns: 1fr 1fr; gap: 20px; }
.stats { display: grid; grid-template-columns: repeat(3, 1fr); gap: 20px; margin-bottom: 20px; }
.stat .value { font-size: 24px; font-weight: 600; color: var(--accent); }
.stat .label { color: var(--text-muted); }

label { display: block; margin: 10px 0 4px; color: var(--text-muted); }
input, select {
  width: 100%;
  padding: 8px 10px;
  background: var(--bg);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 6px;
}
.field-error { color: var(--red); font-size: 12px; min-height: 16px; }

button {
  margin-top: 14px;
  padding: 8px 16px;
  border: 1px solid var(--border);
  border-radius: 6px;
  background: var(--accent);
  color: #0d1117;
  font-weight: 600;
  cursor: pointer;
}
button.secondary { background: transparent; color: var(--text); }
button.danger { background: var(--red); color: #fff; }
button:disabled { opacity: 0.5; cursor: wait; }

.banner { padding: 10px 14px; border-radius: 6px; margin-bottom: 16px; }
.banner.error { background: rgba(248, 81, 73, 0.15); color: var(--red); }
.banner.warn { background: rgba(210, 153, 34, 0.15); color: var(--yellow); }

table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 6px 8px; border-bottom: 1px solid var(--border); }
th { color: var(--text-muted); font-weight: 500; }
td.num { text-align: right; font-variant-numeric: tabular-nums; }

.login { max-width: 360px; margin: 80px auto; }
.hint { color: var(--text-muted); font-size: 12px; margin-top: 10px; }
</style>
</head>
<body>
<div class="app">

<div id="login-view" class="card login hidden">
  <h2>POWERGRID Material Forecast</h2>
  <div id="login-error" class="banner error hidden"></div>
  <form id="login-form">
    <label for="username">Username</label>
    <input id="username" autocomplete="username">
    <label for="password">Password</label>
    <input id="password" type="password" autocomplete="current-password">
    <button id="login-btn" type="submit">Log in</button>
  </form>
  <p class="hint">Demo accounts: admin/admin123, user/user123</p>
</div>

<div id="dashboard-view" class="hidden">
  <header>
    <h1>POWERGRID Material Forecast</h1>
    <div><span class="who" id="who"></span>
      <button class="secondary" id="logout-btn">Log out</button></div>
  </header>

  <div class="stats">
    <div class="card stat"><div class="value" id="stat-total">0</div><div class="label">Total predictions</div></div>
    <div class="card stat"><div class="value" id="stat-avg">₹0.00 Cr</div><div class="label">Average budget</div></div>
    <div class="card stat"><div class="value" id="stat-last">None</div><div class="label">Last prediction</div></div>
  </div>

  <div id="error-banner" class="banner error hidden"></div>
  <div id="warn-banner" class="banner warn hidden"></div>

  <div class="grid">
    <div class="card">
      <h2>Project Parameters</h2>
      <form id="predict-form">
        <label for="budget">Budget (crore)</label>
        <input id="budget" name="budget" inputmode="decimal">
        <div class="field-error" data-field="budget"></div>
        <label for="location">Location</label>
        <select id="location" name="location"></select>
        <div class="field-error" data-field="location"></div>
        <label for="tower_type">Tower type</label>
        <select id="tower_type" name="tower_type"></select>
        <div class="field-error" data-field="tower_type"></div>
        <label for="substation_type">Substation type</label>
        <select id="substation_type" name="substation_type"></select>
        <div class="field-error" data-field="substation_type"></div>
        <button id="predict-btn" type="submit">Predict materials</button>
      </form>
    </div>

    <div class="card">
      <h2>Predicted Materials</h2>
      <div id="result-empty" class="hint">Submit the form to see a forecast.</div>
      <table id="result-table" class="hidden">
        <thead><tr><th>Material</th><th class="num">Quantity</th></tr></thead>
        <tbody></tbody>
      </table>
      <button class="secondary hidden" id="export-btn">Export report</button>
    </div>
  </div>

  <div class="card">
    <h2>Recent Predictions</h2>
    <table id="history-table">
      <thead><tr><th>Time</th><th class="num">Budget</th><th>Location</th><th>Tower</th><th>Substation</th><th></th></tr></thead>
      <tbody></tbody>
    </table>
    <button class="danger" id="clear-btn">Clear history</button>
  </div>
</div>

</div>
<script>
const $ = (id) => document.getElementById(id);
let currentEntryId = null;

async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body !== undefined) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const resp = await fetch(path, opts);
  const data = await resp.json().catch(() => ({}));
  return { ok: resp.ok, status: resp.status, data };
}

function show(el, visible) { el.classList.toggle('hidden', !visible); }

function banner(el, message) {
  el.textContent = message || '';
  show(el, !!message);
}

function fmtBudget(n) { return '₹' + Number(n).toFixed(2) + ' Cr'; }

function fillSelect(el, choices) {
  el.innerHTML = '';
  for (const c of choices) {
    const opt = document.createElement('option');
    opt.value = c;
    opt.textContent = c;
    el.appendChild(opt);
  }
}

function renderStats(stats) {
  $('stat-total').textContent = stats.totalPredictions;
  $('stat-avg').textContent = fmtBudget(stats.avgBudget);
  $('stat-last').textContent = stats.lastPrediction ? stats.lastPrediction.timestamp : 'None';
}

function renderResult(entry) {
  const body = $('result-table').querySelector('tbody');
  body.innerHTML = '';
  currentEntryId = entry ? entry.id : null;
  show($('result-table'), !!entry);
  show($('result-empty'), !entry);
  show($('export-btn'), !!entry);
  if (!entry) return;
  for (const [material, qty] of Object.entries(entry.results)) {
    const tr = document.createElement('tr');
    tr.innerHTML = '<td></td><td class="num"></td>';
    tr.children[0].textContent = material;
    tr.children[1].textContent = qty;
    body.appendChild(tr);
  }
}

function renderHistory(entries) {
  const body = $('history-table').querySelector('tbody');
  body.innerHTML = '';
  for (const e of entries) {
    const tr = document.createElement('tr');
    tr.innerHTML = '<td></td><td class="num"></td><td></td><td></td><td></td><td></td>';
    tr.children[0].textContent = e.timestamp;
    tr.children[1].textContent = fmtBudget(e.inputs.budget);
    tr.children[2].textContent = e.inputs.location;
    tr.children[3].textContent = e.inputs.tower_type;
    tr.children[4].textContent = e.inputs.substation_type;
    const view = document.createElement('button');
    view.className = 'secondary';
    view.textContent = 'View';
    view.onclick = () => renderResult(e);
    tr.children[5].appendChild(view);
    body.appendChild(tr);
  }
  show($('clear-btn'), entries.length > 0);
}

async function refresh() {
  const [history, stats] = await Promise.all([api('GET', '/api/history'), api('GET', '/api/stats')]);
  if (history.ok) renderHistory(history.data.entries);
  if (stats.ok) renderStats(stats.data);
}

async function enterDashboard(user) {
  $('who').textContent = user.username + ' (' + user.role + ') ';
  show($('login-view'), false);
  show($('dashboard-view'), true);
  const options = await api('GET', '/api/options');
  fillSelect($('location'), options.data.locations);
  fillSelect($('tower_type'), options.data.tower_types);
  fillSelect($('substation_type'), options.data.substation_types);
  $('budget').placeholder = options.data.min_budget + ' - ' + options.data.max_budget;
  renderResult(null);
  await refresh();
}

function enterLogin() {
  show($('dashboard-view'), false);
  show($('login-view'), true);
}

$('login-form').onsubmit = async (ev) => {
  ev.preventDefault();
  $('login-btn').disabled = true;
  $('login-btn').textContent = 'Logging in...';
  const r = await api('POST', '/api/login', { username: $('username').value, password: $('password').value });
  $('login-btn').disabled = false;
  $('login-btn').textContent = 'Log in';
  if (r.ok) {
    banner($('login-error'), null);
    await enterDashboard(r.data.user);
  } else {
    banner($('login-error'), r.data.error);
  }
};

$('logout-btn').onclick = async () => {
  await api('POST', '/api/logout');
  enterLogin();
};

$('predict-form').onsubmit = async (ev) => {
  ev.preventDefault();
  document.querySelectorAll('.field-error').forEach((el) => el.textContent = '');
  banner($('error-banner'), null);
  banner($('warn-banner'), null);
  const form = {
    budget: $('budget').value,
    location: $('location').value,
    tower_type: $('tower_type').value,
    substation_type: $('substation_type').value,
  };
  $('predict-btn').disabled = true;
  $('predict-btn').textContent = 'Predicting...';
  const r = await api('POST', '/api/predict', form);
  $('predict-btn').disabled = false;
  $('predict-btn').textContent = 'Predict materials';

  if (r.ok) {
    renderResult(r.data.entry);
    renderStats(r.data.stats);
    banner($('warn-banner'), r.data.warning);
    await refresh();
  } else if (r.status === 422) {
    for (const [field, msg] of Object.entries(r.data.fields || {})) {
      const el = document.querySelector('.field-error[data-field="' + field + '"]');
      if (el) el.textContent = msg;
    }
  } else if (r.status === 401) {
    enterLogin();
  } else {
    banner($('error-banner'), r.data.error || 'Request failed');
  }
};

$('export-btn').onclick = () => {
  if (currentEntryId === null) return;
  window.location = '/api/export?id=' + currentEntryId;
};

$('clear-btn').onclick = async () => {
  if (!window.confirm('Are you sure you want to clear all prediction history?')) return;
  const r = await api('DELETE', '/api/history?confirm=true');
  if (r.ok) {
    renderStats(r.data.stats);
    banner($('warn-banner'), r.data.warning);
    renderResult(null);
    await refresh();
  } else {
    banner($('error-banner'), r.data.error);
  }
};

(async () => {
  const r = await api('GET', '/api/session');
  if (r.data.user) {
    await enterDashboard(r.data.user);
  } else {
    enterLogin();
  }
})();
</script>
</body>
</html>
"##;
