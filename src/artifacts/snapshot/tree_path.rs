use crate::errors::ImportError;

/// A relative path split into the components it will have in the tree
///
/// Empty and `.` components are dropped (archives commonly store `./name`); `..`
/// components and paths without any component are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreePath {
    components: Vec<String>,
}

impl TreePath {
    /// `origin` names the source in the error
    pub fn try_parse(raw: &str, origin: &str) -> Result<Self, ImportError> {
        let invalid = |reason: &str| ImportError::InvalidPath {
            origin: origin.to_string(),
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        let mut components = Vec::new();
        for component in raw.split('/') {
            match component {
                "" | "." => continue,
                ".." => return Err(invalid("parent directory components are not allowed")),
                component => components.push(component.to_string()),
            }
        }

        if components.is_empty() {
            return Err(invalid("path has no file name"));
        }

        Ok(Self { components })
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Parent components and the final name
    pub fn split_last(&self) -> (&[String], &str) {
        match self.components.split_last() {
            Some((name, parents)) => (parents, name),
            None => unreachable!("tree paths always have a file name"),
        }
    }

    /// The path made of the first `len` components
    pub fn prefix(&self, len: usize) -> String {
        self.components[..len.min(self.components.len())].join("/")
    }
}

impl std::fmt::Display for TreePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}
