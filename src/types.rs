//! Core types for the store: item ids, items, view modes and icons.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

/// Opaque identifier of a folder or file, stable for the item's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Create a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for ItemId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Current time cut to whole milliseconds, the precision timestamps
/// serialize at.
pub(crate) fn now_millis() -> SystemTime {
    let now = SystemTime::now();
    match now.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => UNIX_EPOCH + Duration::from_millis(elapsed.as_millis() as u64),
        Err(_) => now,
    }
}

/// Enum for distinguishing item types at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Folder,
    File,
}

/// A node in the virtual tree.
///
/// `parent_id == None` means the item sits directly under the root. The
/// root itself is never stored as an item.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSystemItem {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serialize_always]
    pub parent_id: Option<ItemId>,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
    #[serde(with = "serde_millis")]
    pub created_at: SystemTime,
    #[serde(with = "serde_millis")]
    pub updated_at: SystemTime,
}

impl FileSystemItem {
    /// Create a new folder
    pub fn new_folder(name: impl Into<String>, parent_id: Option<ItemId>) -> Self {
        let now = now_millis();
        Self {
            id: ItemId::new(),
            name: name.into(),
            item_type: ItemType::Folder,
            parent_id,
            mime_type: None,
            size: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new file record; content bytes live elsewhere
    pub fn new_file(
        name: impl Into<String>,
        parent_id: Option<ItemId>,
        size: u64,
        mime_type: impl Into<String>,
    ) -> Self {
        let now = now_millis();
        Self {
            id: ItemId::new(),
            name: name.into(),
            item_type: ItemType::File,
            parent_id,
            mime_type: Some(mime_type.into()),
            size: Some(size),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.item_type == ItemType::Folder
    }

    pub fn is_file(&self) -> bool {
        self.item_type == ItemType::File
    }

    pub fn icon(&self) -> IconKind {
        IconKind::for_item(self.item_type, self.mime_type.as_deref())
    }
}

/// Externally visible mode of the current folder view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    Viewing,
    Selecting,
}

/// Visual representation picked from an item's type and MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconKind {
    Folder,
    Image,
    Video,
    Audio,
    Pdf,
    Text,
    Spreadsheet,
    Document,
    Archive,
    Generic,
}

impl IconKind {
    /// Pure function of the two fields; never inspects content.
    pub fn for_item(item_type: ItemType, mime_type: Option<&str>) -> Self {
        if item_type == ItemType::Folder {
            return IconKind::Folder;
        }
        let Some(mime) = mime_type.map(str::to_ascii_lowercase) else {
            return IconKind::Generic;
        };

        if mime.starts_with("image/") {
            IconKind::Image
        } else if mime.starts_with("video/") {
            IconKind::Video
        } else if mime.starts_with("audio/") {
            IconKind::Audio
        } else if mime == "application/pdf" {
            IconKind::Pdf
        } else if mime == "text/csv"
            || mime.contains("spreadsheet")
            || mime.contains("ms-excel")
        {
            IconKind::Spreadsheet
        } else if mime.starts_with("text/") {
            IconKind::Text
        } else if mime.contains("wordprocessing")
            || mime.contains("msword")
            || mime.contains("presentation")
            || mime.contains("opendocument")
        {
            IconKind::Document
        } else if mime.contains("zip")
            || mime.contains("tar")
            || mime.contains("compressed")
            || mime.contains("7z")
        {
            IconKind::Archive
        } else {
            IconKind::Generic
        }
    }
}
