//! Items flowing through the pipeline.

use crate::error::ItemError;
use serde::{Deserialize, Serialize};

/// An opaque value handed from stage to stage.
///
/// Stages only ever look at an item through [`Item::to_text`], which is
/// pure and must be called once per item per stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Item {
    /// Integer input, rendered in decimal
    Int(i64),
    /// Text input or stage output
    Text(String),
    /// Raw bytes; must be valid UTF-8 to have a string form
    Bytes(Vec<u8>),
}

impl Item {
    /// The stable string form of this item
    pub fn to_text(&self) -> Result<String, ItemError> {
        match self {
            Item::Int(value) => Ok(value.to_string()),
            Item::Text(text) => Ok(text.clone()),
            Item::Bytes(bytes) => {
                String::from_utf8(bytes.clone()).map_err(|e| ItemError::Malformed {
                    reason: format!("bytes are not valid UTF-8: {}", e.utf8_error()),
                })
            }
        }
    }
}

impl From<i64> for Item {
    fn from(value: i64) -> Self {
        Item::Int(value)
    }
}

impl From<i32> for Item {
    fn from(value: i32) -> Self {
        Item::Int(value.into())
    }
}

impl From<u32> for Item {
    fn from(value: u32) -> Self {
        Item::Int(value.into())
    }
}

impl From<String> for Item {
    fn from(value: String) -> Self {
        Item::Text(value)
    }
}

impl From<&str> for Item {
    fn from(value: &str) -> Self {
        Item::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Item {
    fn from(value: Vec<u8>) -> Self {
        Item::Bytes(value)
    }
}
