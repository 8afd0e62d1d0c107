//! Admin page: project tree with checkboxes and a link builder.

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::catalog::Project;
use crate::formats::Format;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectNode {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub children: Vec<ProjectNode>,
}

/// Nest projects under their parents. Projects whose parent is missing
/// (or inactive) become roots. Sibling order follows the input order.
pub fn build_tree(projects: &[Project]) -> Vec<ProjectNode> {
    let known: HashSet<i64> = projects.iter().map(|p| p.id).collect();
    let mut children: HashMap<i64, Vec<&Project>> = HashMap::new();
    let mut roots: Vec<&Project> = Vec::new();

    for project in projects {
        match project.parent_project_id {
            Some(parent) if parent != project.id && known.contains(&parent) => {
                children.entry(parent).or_default().push(project)
            }
            _ => roots.push(project),
        }
    }

    // Projects in a parent cycle are never reached from a root
    fn node(project: &Project, children: &HashMap<i64, Vec<&Project>>) -> ProjectNode {
        ProjectNode {
            id: project.id,
            name: project.name.clone(),
            path: project.path.clone(),
            children: children
                .get(&project.id)
                .map(|list| list.iter().map(|c| node(c, children)).collect())
                .unwrap_or_default(),
        }
    }

    roots.iter().map(|p| node(p, &children)).collect()
}

fn render_nodes(out: &mut String, nodes: &[ProjectNode]) {
    if nodes.is_empty() {
        return;
    }
    out.push_str("<ul>\n");
    for node in nodes {
        out.push_str(&format!(
            "<li class=\"project-item\"><label><input type=\"checkbox\" class=\"project-checkbox\" name=\"project\" value=\"{}\"> {}</label> <code>{}</code>\n",
            encode_double_quoted_attribute(&node.path),
            encode_text(&node.name),
            encode_text(&node.path),
        ));
        render_nodes(out, &node.children);
        out.push_str("</li>\n");
    }
    out.push_str("</ul>\n");
}

const SCRIPT: &str = r#"<script>
function byId(id) { return document.getElementById(id); }

function on(id, event, handler) {
  const el = byId(id);
  if (el) { el.addEventListener(event, handler); }
}

on('project-search', 'input', function () {
  const term = this.value.toLowerCase();
  document.querySelectorAll('.project-item').forEach(function (item) {
    const label = item.querySelector('label').textContent + ' ' + item.querySelector('code').textContent;
    item.style.display = label.toLowerCase().indexOf(term) > -1 ? '' : 'none';
  });
});

on('select-all', 'click', function () {
  document.querySelectorAll('.project-checkbox').forEach(function (box) {
    if (box.offsetParent !== null) { box.checked = true; }
  });
});

on('deselect-all', 'click', function () {
  document.querySelectorAll('.project-checkbox').forEach(function (box) { box.checked = false; });
});

on('build-link', 'click', async function () {
  const projects = Array.from(document.querySelectorAll('.project-checkbox:checked')).map(function (el) { return el.value; });
  const error = byId('link-error');
  error.textContent = '';
  if (projects.length === 0) {
    error.textContent = 'Select at least one project.';
    return;
  }
  const headers = { 'Content-Type': 'application/json' };
  const apiKey = new URLSearchParams(window.location.search).get('api_key');
  if (apiKey) {
    headers['X-API-Key'] = apiKey;
  }
  const response = await fetch(this.dataset.endpoint, {
    method: 'POST',
    headers: headers,
    body: JSON.stringify({
      projects: projects,
      flatten: byId('flatten').checked,
      include_key: byId('include-key') ? byId('include-key').checked : false
    })
  });
  if (!response.ok) {
    error.textContent = await response.text();
    return;
  }
  const data = await response.json();
  byId('generated-link').value = data.url;
  byId('filename-preview').textContent = data.filename;
  byId('direct-download').href = data.url;
  byId('copy-link').disabled = false;
  byId('link-result').hidden = false;
});

function copyText(text, button) {
  navigator.clipboard.writeText(text).then(function () {
    const original = button.textContent;
    button.textContent = 'Copied!';
    setTimeout(function () { button.textContent = original; }, 2000);
  });
}

on('copy-link', 'click', function () {
  copyText(byId('generated-link').value, this);
});

on('generate-key', 'click', function () {
  const chars = 'ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-';
  const bytes = new Uint8Array(40);
  crypto.getRandomValues(bytes);
  byId('new-key-value').textContent = Array.from(bytes, function (b) { return chars[b % chars.length]; }).join('');
  byId('new-key').hidden = false;
});

on('copy-new-key', 'click', function () {
  copyText(byId('new-key-value').textContent, this);
});
</script>"#;

/// Render the admin page. `base_url` is the public root the page posts back to.
pub fn render_page(
    tree: &[ProjectNode],
    formats: &[&dyn Format],
    key_configured: bool,
    base_url: &str,
) -> String {
    let mut out = String::with_capacity(8192);
    out.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Bulk Download Translations</title>\n</head>\n<body>\n\
         <h1>Bulk Download Translations</h1>\n",
    );

    out.push_str("<h2>Exported formats</h2>\n<ul id=\"formats\">\n");
    for format in formats {
        out.push_str(&format!(
            "<li>{} <code>{}</code></li>\n",
            encode_text(format.name()),
            encode_text(format.slug())
        ));
    }
    out.push_str("</ul>\n");

    out.push_str("<h2>Projects</h2>\n");
    if tree.is_empty() {
        out.push_str("<p>No projects found.</p>\n");
    } else {
        out.push_str(
            "<p><input type=\"search\" id=\"project-search\" placeholder=\"Search projects\">\n\
             <button type=\"button\" id=\"select-all\">Select all</button>\n\
             <button type=\"button\" id=\"deselect-all\">Deselect all</button></p>\n",
        );
        out.push_str("<form id=\"projects\">\n");
        render_nodes(&mut out, tree);
        out.push_str("</form>\n");
    }

    out.push_str(
        "<p><label><input type=\"checkbox\" id=\"flatten\"> Flatten archive (no project directories)</label></p>\n",
    );
    if key_configured {
        out.push_str(
            "<p><label><input type=\"checkbox\" id=\"include-key\"> Include access key in the link</label></p>\n",
        );
    }
    out.push_str(&format!(
        "<p><button type=\"button\" id=\"build-link\" data-endpoint=\"{}\">Build download link</button></p>\n",
        encode_double_quoted_attribute(&format!("{}/admin/api/link", base_url))
    ));
    out.push_str(
        "<p id=\"link-error\"></p>\n\
         <div id=\"link-result\" hidden>\n\
         <textarea id=\"generated-link\" rows=\"3\" cols=\"80\" readonly></textarea>\n\
         <p>File name: <code id=\"filename-preview\"></code></p>\n\
         <p><button type=\"button\" id=\"copy-link\" disabled>Copy link</button>\n\
         <a id=\"direct-download\" href=\"#\">Download now</a></p>\n\
         </div>\n",
    );

    out.push_str(
        "<h2>Access key</h2>\n\
         <p>Generate a random value for <code>DOWNLOAD_ACCESS_KEY</code>.</p>\n\
         <p><button type=\"button\" id=\"generate-key\">Generate key</button></p>\n\
         <p id=\"new-key\" hidden><code id=\"new-key-value\"></code>\n\
         <button type=\"button\" id=\"copy-new-key\">Copy</button></p>\n",
    );

    out.push_str(SCRIPT);
    out.push_str("\n</body>\n</html>\n");
    out
}
