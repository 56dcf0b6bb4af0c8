use std::fmt;
use crate::LoadError;

/**
 * Deconstructed path to a document.
 * Bodies are kept normalized so that two references to the same file compare equal.
 */
#[derive(Clone, Eq, PartialEq, Default, Debug, Hash)]
pub struct AssetPath {
    pub protocol: String,
    pub prefix: Option<String>,
    pub body: String,
    pub extension: String,
}

impl AssetPath {

    pub fn parse(path: &str, default_protocol: Option<&str>) -> Result<Self, LoadError> {
        let protocol: Option<&str>;
        let mut remainder = path;

        // Reads protocol
        match remainder.split_once("://") {
            Some((left, right)) => {
                protocol = Some(left);
                remainder = right;
            },
            None => protocol = None,
        };
        let Some(protocol) = protocol.or(default_protocol) else {
            return Err(LoadError::NoDefaultProtocol)
        };

        // Reads body and extension.
        // Only the final path segment may hold the extension.
        let remainder = normalize(remainder);
        let (dir, file) = match remainder.rsplit_once('/') {
            Some((dir, file)) => (Some(dir), file),
            None => (None, remainder.as_str()),
        };
        let Some((stem, extension)) = file.rsplit_once('.') else {
            return Err(LoadError::PathMissingExtension { path: path.into() });
        };
        if stem.is_empty() || extension.is_empty() {
            return Err(LoadError::PathMissingExtension { path: path.into() });
        }
        let body = match dir {
            Some(dir) => format!("{dir}/{stem}"),
            None => String::from(stem),
        };

        Ok(Self {
            protocol: protocol.into(),
            prefix: None,
            body,
            extension: extension.into(),
        })
    }

    /// Resolves a reference found inside this document.
    /// Relative references are joined to this document's directory.
    /// References with their own protocol or a leading slash are taken as-is.
    pub fn resolve(&self, reference: &str) -> Result<Self, LoadError> {
        if reference.contains("://") {
            let mut path = Self::parse(reference, None)?;
            path.prefix = self.prefix.clone();
            return Ok(path);
        }
        let joined = match self.parent() {
            Some(parent) if !reference.starts_with('/') => format!("{parent}/{reference}"),
            _ => String::from(reference),
        };
        let mut path = Self::parse(&joined, Some(&self.protocol))?;
        path.prefix = self.prefix.clone();
        Ok(path)
    }

    /// Body and extension. No protocol.
    pub fn without_protocol(&self) -> String {
        match self.prefix.as_deref() {
            Some(prefix) => format!("{}/{}.{}", prefix, self.body, self.extension),
            None => format!("{}.{}", self.body, self.extension),
        }
    }

    /// Parent directory of this file.
    /// None if it's at the root.
    pub fn parent(&self) -> Option<String> {
        let parts: Vec<&str> = self.body.split('/').collect();
        if parts.len() == 1 { return None }
        let parent_parts = &parts[..parts.len() - 1];
        let parent = parent_parts.join("/");
        Some(parent)
    }

    /// True if the path refers to a document of the extension given, ignoring case.
    pub fn has_extension(&self, extension: &str) -> bool {
        self.extension.eq_ignore_ascii_case(extension)
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix.as_deref() {
            Some(prefix) => write!(f, "{}://{}/{}.{}", self.protocol, prefix, self.body, self.extension),
            None => write!(f, "{}://{}.{}", self.protocol, self.body, self.extension),
        }
    }
}

/// Collapses "." and ".." segments.
/// Leading ".." segments that cannot be collapsed are kept.
fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for (i, part) in path.split('/').enumerate() {
        match part {
            "" if i == 0 => parts.push(""),
            "" | "." => {},
            ".." => match parts.last() {
                Some(&last) if last != ".." && !last.is_empty() => { parts.pop(); },
                _ => parts.push(".."),
            },
            part => parts.push(part),
        }
    }
    parts.join("/")
}

/**
 * Wrapper for the hash of a path.
 */
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct PathHash(pub u64);
impl PathHash {
    pub fn of(path: &AssetPath) -> Self {
        Self(fxhash::hash64(&path.to_string()))
    }
}
