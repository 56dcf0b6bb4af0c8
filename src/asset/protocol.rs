use anyhow::anyhow;
use crate::{AssetPath, HashMap};

/**
 * A method of receiving bytes from documents.
 * IE: file, in-memory, archives, etc.
 */
pub trait Protocol: Send + Sync + 'static {
    /**
     * Name of the protocol. IE: file, mem etc.
     * Should not change across invocations.
     */
    fn name(&self) -> &str;
    /**
     * Retrieves raw bytes from the path specified.
     */
    fn read(&self, path: &AssetPath) -> anyhow::Result<Vec<u8>>;
}

/**
 * An implementation of [`Protocol`] that fetches bytes from the file system.
 */
#[derive(Copy, Clone, Debug)]
pub struct FileProtocol;
impl Protocol for FileProtocol {
    fn name(&self) -> &str { "file" }
    fn read(&self, path: &AssetPath) -> anyhow::Result<Vec<u8>> {
        let bytes = std::fs::read(path.without_protocol())?;
        Ok(bytes)
    }
}

/**
 * An implementation of [`Protocol`] that serves documents stored in memory, keyed by path.
 * Useful for testing purposes, or for maps embedded in a binary.
 */
#[derive(Clone, Default, Debug)]
pub struct MemProtocol {
    documents: HashMap<String, Vec<u8>>,
}

impl MemProtocol {

    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a document under the path given, without protocol. IE: "maps/level.tmx".
    pub fn with(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.documents.insert(path.into(), contents.into());
    }
}

impl Protocol for MemProtocol {
    fn name(&self) -> &str { "mem" }
    fn read(&self, path: &AssetPath) -> anyhow::Result<Vec<u8>> {
        let key = path.without_protocol();
        match self.documents.get(&key) {
            Some(bytes) => Ok(bytes.clone()),
            None => Err(anyhow!("no document stored at '{key}'")),
        }
    }
}
