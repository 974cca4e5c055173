use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per-route access flags. Field names follow the client route table.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
pub struct RouteMeta {
    #[serde(default, rename = "requiresAuth")]
    pub requires_auth: bool,
    #[serde(default, rename = "requiresGuest")]
    pub requires_guest: bool,
}

impl RouteMeta {
    pub const fn public() -> Self {
        RouteMeta {
            requires_auth: false,
            requires_guest: false,
        }
    }

    pub const fn auth() -> Self {
        RouteMeta {
            requires_auth: true,
            requires_guest: false,
        }
    }

    pub const fn guest() -> Self {
        RouteMeta {
            requires_auth: false,
            requires_guest: true,
        }
    }

    /// A flag set on any matched segment applies to the whole match.
    pub fn merge(self, other: RouteMeta) -> RouteMeta {
        RouteMeta {
            requires_auth: self.requires_auth || other.requires_auth,
            requires_guest: self.requires_guest || other.requires_guest,
        }
    }
}

/// One entry of the route table. `path` segments starting with `:` capture a
/// parameter; children paths are always relative to their parent.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct RouteRecord {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub meta: RouteMeta,
    #[serde(default)]
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    pub fn new(name: impl Into<String>, path: impl Into<String>, meta: RouteMeta) -> Self {
        RouteRecord {
            name: name.into(),
            path: path.into(),
            meta,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<RouteRecord>) -> Self {
        self.children = children;
        self
    }
}

/// The route table the browser client shipped with.
pub fn default_routes() -> Vec<RouteRecord> {
    vec![
        RouteRecord::new("home", "/", RouteMeta::auth()),
        RouteRecord::new("login", "/login", RouteMeta::guest()),
        RouteRecord::new("chat", "/chat/:id", RouteMeta::auth()),
    ]
}

/// The result of resolving a path: every matched record from root to leaf.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub matched: Vec<&'a RouteRecord>,
    pub params: HashMap<String, String>,
}

impl RouteMatch<'_> {
    /// Flags combined across every matched segment.
    pub fn meta(&self) -> RouteMeta {
        self.matched
            .iter()
            .fold(RouteMeta::public(), |acc, record| acc.merge(record.meta))
    }

    /// Name of the innermost matched record.
    pub fn name(&self) -> &str {
        self.matched.last().map(|r| r.name.as_str()).unwrap_or_default()
    }
}

/// Static mapping from paths to route records.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteRecord>,
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

impl RouteTable {
    pub fn new(routes: Vec<RouteRecord>) -> Self {
        RouteTable { routes }
    }

    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    /// Resolve a request path (without query string). Records are tried in
    /// declaration order and the first full match wins.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segs = segments(path);
        self.routes.iter().find_map(|record| {
            let mut params = HashMap::new();
            match_record(record, &segs, &mut params).map(|matched| RouteMatch { matched, params })
        })
    }

    /// Flags for `path`; unknown paths carry no requirements.
    pub fn meta_for(&self, path: &str) -> RouteMeta {
        self.resolve(path).map(|m| m.meta()).unwrap_or_default()
    }

    /// Every routable pattern as a full path (`/chat/:id`), parents included.
    /// The `:param` form is what the axum router expects.
    pub fn axum_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        for record in &self.routes {
            collect_paths(record, &[], &mut out);
        }
        out
    }
}

fn match_record<'a>(
    record: &'a RouteRecord,
    segs: &[&str],
    params: &mut HashMap<String, String>,
) -> Option<Vec<&'a RouteRecord>> {
    let pattern = segments(&record.path);
    if pattern.len() > segs.len() {
        return None;
    }

    let mut captured = Vec::new();
    for (pat, seg) in pattern.iter().zip(segs) {
        match pat.strip_prefix(':') {
            Some(name) => captured.push((name.to_string(), (*seg).to_string())),
            None if pat == seg => {}
            None => return None,
        }
    }

    let rest = &segs[pattern.len()..];
    let tail = if rest.is_empty() {
        Vec::new()
    } else {
        let mut child_params = HashMap::new();
        let found = record
            .children
            .iter()
            .find_map(|child| match_record(child, rest, &mut child_params))?;
        params.extend(child_params);
        found
    };

    params.extend(captured);
    let mut matched = Vec::with_capacity(tail.len() + 1);
    matched.push(record);
    matched.extend(tail);
    Some(matched)
}

fn collect_paths(record: &RouteRecord, prefix: &[String], out: &mut Vec<String>) {
    let mut full: Vec<String> = prefix.to_vec();
    full.extend(segments(&record.path).into_iter().map(str::to_string));

    let path = format!("/{}", full.join("/"));
    if !out.contains(&path) {
        out.push(path);
    }
    for child in &record.children {
        collect_paths(child, &full, out);
    }
}
