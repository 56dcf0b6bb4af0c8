use derive_more::*;
use serde::Deserialize;
use crate::{AssetPath, HashMap, PathHash, Protocol};

/// Options that control how documents are located and how strictly maps are checked.
/// Can be read from YAML.
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Directory prepended to every document path.
    pub path_prefix: Option<String>,
    /// Protocol used for paths that don't name one.
    pub default_protocol: Option<String>,
    /// Checks that every tile cell refers to a declared tileset.
    pub validate_gids: bool,
    /// Upper bound on the number of cells a single chunk may declare.
    pub max_chunk_cells: u32,
    /// Upper bound on the number of cells a finite tile layer may declare.
    pub max_layer_cells: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            path_prefix: None,
            default_protocol: None,
            validate_gids: true,
            max_chunk_cells: 256 * 256,
            max_layer_cells: 4096 * 4096,
        }
    }
}

impl LoadOptions {
    pub fn from_yaml(source: &str) -> Result<Self, LoadError> {
        serde_yaml::from_str(source).map_err(|err| LoadError::InvalidOptions { reason: err.to_string() })
    }
}

/// Fetches documents through a registry of [`Protocol`]s.
/// Every read is synchronous.
pub struct DocumentSource {
    options: LoadOptions,
    protocols: HashMap<String, Box<dyn Protocol>>,
    default_protocol: Option<String>,
}

impl DocumentSource {

    pub fn builder() -> DocumentSourceBuilder {
        DocumentSourceBuilder::default()
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Parses a top-level path, applying the default protocol and path prefix.
    pub fn path(&self, path: &str) -> Result<AssetPath, LoadError> {
        let mut path = AssetPath::parse(path, self.default_protocol.as_deref())?;
        path.prefix = self.options.path_prefix.clone();
        Ok(path)
    }

    /// Reads the bytes of a document.
    pub fn read(&self, path: &AssetPath) -> Result<Vec<u8>, LoadError> {
        let protocol = match self.protocols.get(&path.protocol) {
            Some(protocol) => protocol,
            None => return Err(LoadError::NoSuchProtocol { name: path.protocol.clone() }),
        };
        log::trace!("Reading {path}");
        protocol.read(path).map_err(|err| LoadError::ReadFailed {
            path: path.to_string(),
            reason: format!("{err:#}"),
        })
    }

    /// Reads a document as UTF-8 text.
    pub fn read_text(&self, path: &AssetPath) -> Result<String, LoadError> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|_| LoadError::InvalidUtf8 { path: path.to_string() })
    }

    pub fn hash(&self, path: &AssetPath) -> PathHash {
        PathHash::of(path)
    }
}

#[derive(Default)]
pub struct DocumentSourceBuilder {
    options: LoadOptions,
    protocols: Vec<Box<dyn Protocol>>,
    default_protocol: Option<String>,
}

impl DocumentSourceBuilder {

    /// Adds a protocol for use in reading documents.
    pub fn protocol(mut self, protocol: impl Protocol) -> Self {
        self.protocols.push(Box::new(protocol));
        self
    }

    /// Adds a protocol and makes it the default.
    pub fn default_protocol(mut self, protocol: impl Protocol) -> Self {
        self.default_protocol = Some(String::from(protocol.name()));
        self.protocols.push(Box::new(protocol));
        self
    }

    pub fn options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> DocumentSource {
        let mut protocols = HashMap::default();
        for protocol in self.protocols {
            protocols.insert(String::from(protocol.name()), protocol);
        }
        // Options may name the default, overriding the builder.
        let default_protocol = self.options.default_protocol.clone().or(self.default_protocol);
        DocumentSource {
            options: self.options,
            protocols,
            default_protocol,
        }
    }
}

#[derive(Error, Debug, Display, Clone, Eq, PartialEq)]
pub enum LoadError {
    #[display(fmt="No default protocol")]
    NoDefaultProtocol,
    #[display(fmt="No such protocol '{name}'")]
    NoSuchProtocol { name: String },
    #[display(fmt="Path '{path}' missing extension")]
    PathMissingExtension { path: String },
    #[display(fmt="Failed to read '{path}': {reason}")]
    ReadFailed { path: String, reason: String },
    #[display(fmt="Document '{path}' is not valid UTF-8")]
    InvalidUtf8 { path: String },
    #[display(fmt="Invalid load options: {reason}")]
    InvalidOptions { reason: String },
}
