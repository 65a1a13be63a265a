use crc32fast::Hasher;

/// Generate a page seed from its identifier using CRC32
pub fn get_page_seed(page_id: &str) -> String {
    let mut buff = String::from(page_id);
    if !page_id.starts_with("page://") {
        buff = format!("page://{}", buff);
    }

    let mut hasher = Hasher::new();
    hasher.update(buff.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Maps element ordinals to the string ids carried by sandbox messages
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementIds {
    seed: String,
}

impl ElementIds {
    pub fn new(page_id: &str) -> Self {
        Self {
            seed: get_page_seed(page_id),
        }
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed }
    }

    /// Element id for an ordinal
    pub fn id_for(&self, ordinal: usize) -> String {
        format!("{}-{}", self.seed, ordinal)
    }

    /// Recover the ordinal from an element id minted by this seed
    pub fn ordinal_of(&self, element_id: &str) -> Option<usize> {
        element_id
            .strip_prefix(self.seed.as_str())?
            .strip_prefix('-')?
            .parse()
            .ok()
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
