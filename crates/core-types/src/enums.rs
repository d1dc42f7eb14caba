use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of rows the repository can look up by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entity {
    Artist,
    Record,
}

impl Entity {
    /// Name of the backing table.
    pub fn table(&self) -> &'static str {
        match self {
            Entity::Artist => "artistas",
            Entity::Record => "discos",
        }
    }

    /// Spanish name used in the CLI's status lines.
    pub fn label_es(&self) -> &'static str {
        match self {
            Entity::Artist => "artista",
            Entity::Record => "disco",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Artist => "artist",
            Entity::Record => "record",
        };
        f.write_str(name)
    }
}
