//! Top-level routing: which screen a path belongs to. Only [`Route::Viewer`]
//! paths are handed to the synchronizer.

use serde::{Deserialize, Serialize};

/// Paths starting with `prefix` leave the application for `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub prefix: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    /// Static pages, matched on the first segment.
    pub pages: Vec<String>,
    /// Dataset families served by the viewer, matched on the first segment.
    pub datasets: Vec<String>,
    pub redirects: Vec<Redirect>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            pages: vec!["methods".into(), "about".into(), "help".into()],
            datasets: vec!["zika".into(), "ebola".into()],
            redirects: vec![Redirect {
                prefix: "flu".into(),
                target: "http://nextflu.org/".into(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Page(String),
    Viewer,
    External(String),
    Splash,
}

impl RouteTable {
    pub fn resolve(&self, pathname: &str) -> Route {
        let trimmed = pathname.trim_start_matches('/');
        let first = trimmed.split('/').next().unwrap_or_default();

        if let Some(page) = self.pages.iter().find(|p| *p == first) {
            return Route::Page(page.clone());
        }
        if self.datasets.iter().any(|d| d == first) {
            return Route::Viewer;
        }
        if let Some(r) = self
            .redirects
            .iter()
            .find(|r| !r.prefix.is_empty() && trimmed.starts_with(&r.prefix))
        {
            return Route::External(r.target.clone());
        }
        Route::Splash
    }
}
