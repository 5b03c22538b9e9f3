//! Path-based routing between the four views.

use crate::error::{Error, Result};
use crate::model::DocId;

/// A view reachable by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Upload,
    /// `/analyze/{id}`
    Analyze(DocId),
    /// `/qa/{id}`
    Qa(DocId),
    /// `/translate/{id}`
    Translate(DocId),
}

impl Route {
    /// Resolve a path. The id segment is passed through untouched; an id the
    /// backend does not know only shows up when the view makes its first call.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.strip_suffix('/').unwrap_or(path);
        if trimmed.is_empty() {
            return Ok(Self::Upload);
        }

        let unknown = || Error::UnknownRoute(path.to_string());
        let rest = trimmed.strip_prefix('/').ok_or_else(unknown)?;
        let (view, id) = rest.split_once('/').ok_or_else(unknown)?;
        if id.is_empty() || id.contains('/') {
            return Err(unknown());
        }

        let id = DocId::new(id);
        match view {
            "analyze" => Ok(Self::Analyze(id)),
            "qa" => Ok(Self::Qa(id)),
            "translate" => Ok(Self::Translate(id)),
            _ => Err(unknown()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Upload => "/".to_string(),
            Self::Analyze(id) => format!("/analyze/{id}"),
            Self::Qa(id) => format!("/qa/{id}"),
            Self::Translate(id) => format!("/translate/{id}"),
        }
    }

    pub const fn doc_id(&self) -> Option<&DocId> {
        match self {
            Self::Upload => None,
            Self::Analyze(id) | Self::Qa(id) | Self::Translate(id) => Some(id),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

impl std::str::FromStr for Route {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Back/forward stack of visited routes. Starts at the upload view.
#[derive(Debug, Clone)]
pub struct History {
    stack: Vec<Route>,
}

impl History {
    pub fn new() -> Self {
        Self {
            stack: vec![Route::Upload],
        }
    }

    pub fn push(&mut self, route: Route) {
        self.stack.push(route);
    }

    /// Parse and push `path`, returning the new current route
    pub fn navigate(&mut self, path: &str) -> Result<&Route> {
        let route = Route::parse(path)?;
        self.push(route);
        Ok(self.current())
    }

    /// Step back one entry. The first entry is never popped.
    pub fn back(&mut self) -> &Route {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        self.current()
    }

    pub fn current(&self) -> &Route {
        static ROOT: Route = Route::Upload;
        // `stack` is never empty: `new` seeds it and `back` keeps one entry
        self.stack.last().unwrap_or(&ROOT)
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
