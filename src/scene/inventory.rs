//! Contained-inventory items of a prim.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permissions::ItemPermissions;

/// Asset type of an inventory item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Texture,
    Sound,
    Callcard,
    Landmark,
    Script,
    Clothing,
    Object,
    Notecard,
    Category,
    LslText,
    LslByte,
    TextureTga,
    Bodypart,
    Snapshot,
    Animation,
    Gesture,
}

impl AssetType {
    /// Short type name used in file extensions and the output document.
    pub fn lookup(self) -> &'static str {
        match self {
            Self::Texture => "texture",
            Self::Sound => "sound",
            Self::Callcard => "callcard",
            Self::Landmark => "landmark",
            Self::Script => "script",
            Self::Clothing => "clothing",
            Self::Object => "object",
            Self::Notecard => "notecard",
            Self::Category => "category",
            Self::LslText => "lsltext",
            Self::LslByte => "lslbyte",
            Self::TextureTga => "txtr_tga",
            Self::Bodypart => "bodypart",
            Self::Snapshot => "snapshot",
            Self::Animation => "animatn",
            Self::Gesture => "gesture",
        }
    }

    /// Asset types whose bytes can be fetched from a task inventory.
    pub fn is_downloadable(self) -> bool {
        matches!(
            self,
            Self::Texture
                | Self::Script
                | Self::Clothing
                | Self::Notecard
                | Self::LslText
                | Self::TextureTga
                | Self::Bodypart
                | Self::Gesture
        )
    }
}

/// One item in a prim's inventory listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub item_id: Uuid,
    #[serde(default)]
    pub asset_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub asset_type: AssetType,
    #[serde(default)]
    pub permissions: ItemPermissions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downloadable_types() {
        assert!(AssetType::Notecard.is_downloadable());
        assert!(AssetType::LslText.is_downloadable());
        assert!(!AssetType::Object.is_downloadable());
        assert!(!AssetType::Animation.is_downloadable());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&AssetType::LslText).unwrap();
        assert_eq!(json, "\"lsl_text\"");
        assert_eq!(AssetType::LslText.lookup(), "lsltext");
    }
}
