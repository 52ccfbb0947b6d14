// Router module
//
// First-match route lookup and per-request option extraction.

use regex::Captures;
use std::borrow::Cow;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::RouteConfig;
use crate::image_processor::{OptionsError, ProcessingOptions};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no route matches path '{path}'")]
pub struct NoRouteMatched {
    pub path: String,
}

/// What a matched request asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    /// Key handed to the route's source
    pub source_key: String,
    pub options: ProcessingOptions,
}

/// Ordered route bindings, immutable after startup.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<RouteConfig>,
}

impl Router {
    pub fn new(routes: Vec<RouteConfig>) -> Self {
        Router { routes }
    }

    pub fn routes(&self) -> &[RouteConfig] {
        &self.routes
    }

    /// The first route, in configuration order, whose pattern matches.
    pub fn match_path(&self, path: &str) -> Result<&RouteConfig, NoRouteMatched> {
        self.routes
            .iter()
            .find(|route| route.pattern.is_match(path))
            .ok_or_else(|| NoRouteMatched {
                path: path.to_string(),
            })
    }
}

/// Extract the source key and processing options for a matched route.
///
/// A named capture in the route pattern takes precedence over a query
/// parameter with the same name, even when the group did not participate in
/// the match. Unnamed captures are ignored.
pub fn resolve(
    route: &RouteConfig,
    path: &str,
    query: &HashMap<String, String>,
) -> Result<ResolvedRequest, OptionsError> {
    let captures = route.pattern.captures(path);
    let options = ProcessingOptions::from_lookup(|key| {
        captured(route, captures.as_ref(), key).or_else(|| query.get(key).map(String::as_str))
    })?;

    Ok(ResolvedRequest {
        source_key: captured(route, captures.as_ref(), &route.image_key)
            .unwrap_or("")
            .to_string(),
        options,
    })
}

/// Value of the named group `key`, or `None` when the pattern has no such
/// group. A defined group that did not participate yields `""`.
fn captured<'h>(
    route: &RouteConfig,
    captures: Option<&Captures<'h>>,
    key: &str,
) -> Option<&'h str> {
    if !route.pattern.capture_names().flatten().any(|n| n == key) {
        return None;
    }
    Some(
        captures
            .and_then(|c| c.name(key))
            .map(|m| m.as_str())
            .unwrap_or(""),
    )
}

/// Decode `a=1&b=2` into a map; the first occurrence of a key wins.
///
/// Components are form-decoded: `+` is a space and `%2B` a literal plus.
pub fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let Some(query) = query else {
        return params;
    };

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(decode_form(key))
            .or_insert_with(|| decode_form(value));
    }
    params
}

fn decode_form(component: &str) -> String {
    decode(&component.replace('+', " ")).into_owned()
}

/// Percent-decode a path or query component, keeping it raw if invalid.
pub fn decode(value: &str) -> Cow<'_, str> {
    urlencoding::decode(value).unwrap_or(Cow::Borrowed(value))
}
