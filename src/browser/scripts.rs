//! In-page JavaScript used by the locator, extractors and renderer.
//!
//! Scripts are built as strings and run through `Page::evaluate`. Every
//! script that touches a specific element resolves it by a marker attribute
//! stamped at discovery time, inside the same document context (top document
//! or a same-origin frame path), so interaction happens where the element
//! was found. Cross-origin frames throw on document access; the scripts
//! catch that and report "nothing here" instead of failing the evaluation.

/// Attribute used to re-resolve discovered elements.
pub(crate) const MARK_ATTR: &str = "data-cap-mark";

/// Quote a Rust string as a JS string literal.
pub(crate) fn js_str(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}

/// Render a frame path as a JS array literal.
pub(crate) fn js_path(path: &[usize]) -> String {
    let items: Vec<String> = path.iter().map(|i| i.to_string()).collect();
    format!("[{}]", items.join(","))
}

/// Shared prelude resolving `win`/`doc` for a frame path. Must run inside a
/// try/catch: cross-origin access throws.
fn context_prelude(path: &[usize]) -> String {
    format!(
        "let win = window; for (const i of {}) {{ win = win.frames[i]; }} const doc = win.document;",
        js_path(path)
    )
}

fn marked(mark: u64) -> String {
    format!("doc.querySelector('[{}=\"{}\"]')", MARK_ATTR, mark)
}

/// Query `selector` in the given context; stamp the hit with `mark`.
pub(crate) fn query_in_context(path: &[usize], selector: &str, mark: u64) -> String {
    format!(
        r#"(() => {{
  try {{
    {prelude}
    if (!doc) return false;
    const el = doc.querySelector({selector});
    if (!el) return false;
    el.setAttribute('{attr}', '{mark}');
    return true;
  }} catch (e) {{ return false; }}
}})()"#,
        prelude = context_prelude(path),
        selector = js_str(selector),
        attr = MARK_ATTR,
        mark = mark,
    )
}

/// Deep query: same-document walk that additionally descends into shadow
/// roots. Used when a dynamically inserted element lives in a shadow tree.
pub(crate) fn query_deep_in_context(path: &[usize], selector: &str, mark: u64) -> String {
    format!(
        r#"(() => {{
  try {{
    {prelude}
    if (!doc) return false;
    const seen = new Set();
    function walk(node) {{
      if (!node || seen.has(node)) return null;
      seen.add(node);
      try {{
        const el = node.querySelector && node.querySelector({selector});
        if (el) return el;
      }} catch (e) {{}}
      const kids = node.children || [];
      for (let i = 0; i < kids.length; i++) {{
        const r = walk(kids[i]);
        if (r) return r;
      }}
      if (node.shadowRoot) {{
        const r = walk(node.shadowRoot);
        if (r) return r;
      }}
      return null;
    }}
    const hit = walk(doc);
    if (!hit) return false;
    hit.setAttribute('{attr}', '{mark}');
    return true;
  }} catch (e) {{ return false; }}
}})()"#,
        prelude = context_prelude(path),
        selector = js_str(selector),
        attr = MARK_ATTR,
        mark = mark,
    )
}

/// Number of child frames reachable from a context (0 when cross-origin).
pub(crate) fn frame_count(path: &[usize]) -> String {
    format!(
        r#"(() => {{
  try {{
    let win = window; for (const i of {}) {{ win = win.frames[i]; }}
    return win.frames.length;
  }} catch (e) {{ return 0; }}
}})()"#,
        js_path(path)
    )
}

/// Direct script-dispatched click.
pub(crate) fn script_click(path: &[usize], mark: u64) -> String {
    format!(
        r#"(() => {{
  try {{
    {prelude}
    const el = {marked};
    if (!el) return false;
    el.click();
    return true;
  }} catch (e) {{ return false; }}
}})()"#,
        prelude = context_prelude(path),
        marked = marked(mark),
    )
}

/// Synthetic mousedown/mouseup/click sequence.
pub(crate) fn dispatch_mouse(path: &[usize], mark: u64) -> String {
    format!(
        r#"(() => {{
  try {{
    {prelude}
    const el = {marked};
    if (!el) return false;
    const opts = {{bubbles: true, cancelable: true, view: win}};
    el.dispatchEvent(new MouseEvent('mousedown', opts));
    el.dispatchEvent(new MouseEvent('mouseup', opts));
    el.dispatchEvent(new MouseEvent('click', opts));
    return true;
  }} catch (e) {{ return false; }}
}})()"#,
        prelude = context_prelude(path),
        marked = marked(mark),
    )
}

/// Keyboard activation: focus + Enter.
pub(crate) fn keyboard_enter(path: &[usize], mark: u64) -> String {
    format!(
        r#"(() => {{
  try {{
    {prelude}
    const el = {marked};
    if (!el) return false;
    if (typeof el.focus === 'function') el.focus();
    const opts = {{bubbles: true, cancelable: true, key: 'Enter', code: 'Enter'}};
    el.dispatchEvent(new KeyboardEvent('keydown', opts));
    el.dispatchEvent(new KeyboardEvent('keyup', opts));
    return true;
  }} catch (e) {{ return false; }}
}})()"#,
        prelude = context_prelude(path),
        marked = marked(mark),
    )
}

pub(crate) fn scroll_center(path: &[usize], mark: u64) -> String {
    format!(
        r#"(() => {{
  try {{
    {prelude}
    const el = {marked};
    if (!el) return false;
    el.scrollIntoView({{block: 'center', inline: 'center'}});
    return true;
  }} catch (e) {{ return false; }}
}})()"#,
        prelude = context_prelude(path),
        marked = marked(mark),
    )
}

/// Computed visibility of a marked element.
pub(crate) fn visible_probe(path: &[usize], mark: u64) -> String {
    format!(
        r#"(() => {{
  try {{
    {prelude}
    const el = {marked};
    if (!el) return false;
    const cs = win.getComputedStyle(el);
    return cs.display !== 'none' && cs.visibility !== 'hidden' && cs.opacity !== '0';
  }} catch (e) {{ return false; }}
}})()"#,
        prelude = context_prelude(path),
        marked = marked(mark),
    )
}

/// Whether a marked element carries a class (activation success probes).
pub(crate) fn class_probe(path: &[usize], mark: u64, class: &str) -> String {
    format!(
        r#"(() => {{
  try {{
    {prelude}
    const el = {marked};
    if (!el) return false;
    return el.classList.contains({class});
  }} catch (e) {{ return false; }}
}})()"#,
        prelude = context_prelude(path),
        marked = marked(mark),
        class = js_str(class),
    )
}

/// Locate a disclosure widget by the visible text of its title link.
///
/// The content pane is the nearest following sibling of the title's
/// ancestor row that matches the pane selector. Stamps link, row and pane
/// with consecutive marks; returns `{active}` or `null`.
pub(crate) fn find_disclosure(
    row_selector: &str,
    link_selector: &str,
    pane_selector: &str,
    indicator_class: &str,
    title: &str,
    link_mark: u64,
    row_mark: u64,
    pane_mark: u64,
) -> String {
    format!(
        r#"(() => {{
  const needle = {title};
  const links = Array.from(document.querySelectorAll({row_sel} + ' ' + {link_sel}));
  const hit = links.find(a => (a.textContent || '').trim().includes(needle));
  if (!hit) return null;
  const row = hit.closest({row_sel});
  if (!row) return null;
  let pane = row.nextElementSibling;
  while (pane && !pane.matches({pane_sel})) pane = pane.nextElementSibling;
  if (!pane) return null;
  hit.setAttribute('{attr}', '{link_mark}');
  row.setAttribute('{attr}', '{row_mark}');
  pane.setAttribute('{attr}', '{pane_mark}');
  return {{ active: row.classList.contains({indicator}) }};
}})()"#,
        title = js_str(title),
        row_sel = js_str(row_selector),
        link_sel = js_str(link_selector),
        pane_sel = js_str(pane_selector),
        indicator = js_str(indicator_class),
        attr = MARK_ATTR,
        link_mark = link_mark,
        row_mark = row_mark,
        pane_mark = pane_mark,
    )
}

/// Clone the marked element and freeze its appearance: each clone node gets
/// the full enumerated computed style of its original as an inline style,
/// lazy-loading attributes are stripped, and the clone is wrapped in the
/// fixed-id capture root. Returns the wrapper's outer HTML or `null`.
pub(crate) fn inline_snapshot(path: &[usize], mark: u64) -> String {
    format!(
        r#"(() => {{
  try {{
    {prelude}
    const el = {marked};
    if (!el) return null;

    const clone = el.cloneNode(true);

    function* walk(node) {{
      const tw = doc.createTreeWalker(node, NodeFilter.SHOW_ELEMENT, null);
      let cur = tw.currentNode;
      while (cur) {{ yield cur; cur = tw.nextNode(); }}
    }}

    const origList = Array.from(walk(el));
    const cloneList = Array.from(walk(clone));

    for (let i = 0; i < cloneList.length; i++) {{
      const o = origList[i];
      const c = cloneList[i];
      if (!o) break;
      const cs = win.getComputedStyle(o);
      let styleText = '';
      for (const prop of cs) {{
        styleText += prop + ':' + cs.getPropertyValue(prop) + ';';
      }}
      c.setAttribute('style', styleText);
    }}

    clone.querySelectorAll("img[loading='lazy']").forEach(img => img.removeAttribute('loading'));
    clone.querySelectorAll("source[loading='lazy']").forEach(s => s.removeAttribute('loading'));
    clone.removeAttribute('{attr}');

    const wrapper = doc.createElement('div');
    wrapper.id = 'capture-root';
    wrapper.style.cssText = 'display:inline-block;background:#fff;margin:0;padding:16px;box-sizing:border-box;';
    wrapper.appendChild(clone);
    return wrapper.outerHTML;
  }} catch (e) {{ return null; }}
}})()"#,
        prelude = context_prelude(path),
        marked = marked(mark),
        attr = MARK_ATTR,
    )
}

/// Raw outer HTML of the marked element (replay mode).
pub(crate) fn outer_html(path: &[usize], mark: u64) -> String {
    format!(
        r#"(() => {{
  try {{
    {prelude}
    const el = {marked};
    if (!el) return null;
    const clone = el.cloneNode(true);
    clone.removeAttribute('{attr}');
    return clone.outerHTML;
  }} catch (e) {{ return null; }}
}})()"#,
        prelude = context_prelude(path),
        marked = marked(mark),
        attr = MARK_ATTR,
    )
}

/// Page-wide stylesheet snapshot for replay-mode documents.
pub(crate) const STYLE_MANIFEST: &str = r#"(() => {
  const styleTags = Array.from(document.querySelectorAll('style'))
    .map(s => s.textContent || '')
    .filter(t => t.trim().length > 0);
  const links = Array.from(document.querySelectorAll('link[rel="stylesheet"]'))
    .map(l => l.href)
    .filter(Boolean);
  return { styleTags, links, baseHref: location.href };
})()"#;

/// Resolved URL of the current page.
pub(crate) const BASE_HREF: &str = "location.href";

/// Font loading finished (or the API is unavailable).
pub(crate) const FONTS_LOADED: &str =
    "(() => !document.fonts || document.fonts.status === 'loaded')()";

/// All images report complete with a nonzero natural width.
pub(crate) const IMAGES_COMPLETE: &str = r#"(() => {
  const imgs = Array.from(document.images || []);
  if (imgs.length === 0) return true;
  return imgs.every(img => img.complete && img.naturalWidth > 0);
})()"#;

/// Presence probe for the capture root in a preview document.
pub(crate) const ROOT_PRESENT: &str =
    "(() => document.querySelector('#capture-root') !== null)()";

/// Natural width of the capture root plus its opt-in base font, measured
/// before any transform is applied.
pub(crate) const MEASURE_ROOT: &str = r#"(() => {
  const root = document.querySelector('#capture-root');
  if (!root) return null;
  const width = root.scrollWidth || root.getBoundingClientRect().width;
  if (!width) return null;
  const baseFont = Number(getComputedStyle(root).getPropertyValue('--cap-base-font')) || 0;
  return { width: width, baseFont: baseFont };
})()"#;

/// Apply the shrink transform (and optional corrected font size), then size
/// the document to the scaled root so the screenshot is not clipped.
pub(crate) fn apply_scale(scale: f64, font_px: Option<f64>) -> String {
    let font = match font_px {
        Some(px) => format!("{px:.2}"),
        None => "0".to_string(),
    };
    format!(
        r#"(() => {{
  const root = document.querySelector('#capture-root');
  if (!root) return null;
  root.style.transformOrigin = 'top left';
  root.style.transform = 'scale({scale})';
  const font = {font};
  if (font > 0) {{
    root.style.fontSize = font.toFixed(2) + 'px';
  }}
  const rect = root.getBoundingClientRect();
  const w = Math.ceil(rect.width);
  const h = Math.ceil(rect.height);
  document.documentElement.style.width = w + 'px';
  document.documentElement.style.height = h + 'px';
  document.body.style.width = w + 'px';
  document.body.style.height = h + 'px';
  return {{ width: w, height: h }};
}})()"#,
    )
}

/// Bounding box of the capture root, used as the screenshot clip.
pub(crate) const ROOT_RECT: &str = r#"(() => {
  const root = document.querySelector('#capture-root');
  if (!root) return null;
  const r = root.getBoundingClientRect();
  return { x: r.x, y: r.y, width: Math.ceil(r.width), height: Math.ceil(r.height) };
})()"#;
