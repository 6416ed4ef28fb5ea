//! Lvalue paths: a root plus index/key steps

use std::fmt;

/// Where a path starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRoot {
    /// A named variable (local first, then global)
    Variable(String),

    /// A member of the current method's receiver (`self.x`)
    SelfMember(String),
}

/// One step below the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// Sequence element `[n]`
    Index(i64),

    /// Map key or object member `["k"]` / `.k`
    Key(String),
}

/// A resolvable lvalue: `v[3]["k"]`, `self.items[0]`, ...
///
/// # Example
///
/// ```
/// use ferrule::LvaluePath;
///
/// let path = LvaluePath::var("v").index(5).key("k");
/// assert_eq!(path.to_string(), "v[5].k");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LvaluePath {
    /// The root
    pub root: PathRoot,

    /// Steps applied in order
    pub steps: Vec<PathStep>,
}

impl LvaluePath {
    /// A path rooted at a variable
    pub fn var(name: impl Into<String>) -> Self {
        Self {
            root: PathRoot::Variable(name.into()),
            steps: Vec::new(),
        }
    }

    /// A path rooted at a member of the current receiver
    pub fn self_member(name: impl Into<String>) -> Self {
        Self {
            root: PathRoot::SelfMember(name.into()),
            steps: Vec::new(),
        }
    }

    /// Append an index step
    pub fn index(mut self, index: i64) -> Self {
        self.steps.push(PathStep::Index(index));
        self
    }

    /// Append a key step
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.steps.push(PathStep::Key(key.into()));
        self
    }

    /// Append any step
    pub fn step(mut self, step: PathStep) -> Self {
        self.steps.push(step);
        self
    }

    /// True if the path names only its root
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for LvaluePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            PathRoot::Variable(name) => write!(f, "{}", name)?,
            PathRoot::SelfMember(name) => write!(f, "self.{}", name)?,
        }
        for step in &self.steps {
            match step {
                PathStep::Index(i) => write!(f, "[{}]", i)?,
                PathStep::Key(k) => write!(f, ".{}", k)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(LvaluePath::var("v").to_string(), "v");
        assert_eq!(
            LvaluePath::self_member("items").index(0).key("name").to_string(),
            "self.items[0].name"
        );
    }

    #[test]
    fn test_builder_collects_steps() {
        let path = LvaluePath::var("m").key("a").step(PathStep::Index(-1));
        assert!(!path.is_root());
        assert_eq!(
            path.steps,
            vec![PathStep::Key("a".into()), PathStep::Index(-1)]
        );
    }
}
