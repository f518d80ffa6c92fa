// Widget palette - the catalog of creatable widget archetypes
use super::error::InvalidSettings;
use super::settings::{WidgetSettings, WidgetType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WidgetSize {
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaletteGroup {
    Charts,
    Tables,
    #[serde(rename = "KPIs")]
    Kpis,
}

impl PaletteGroup {
    pub const ORDER: [PaletteGroup; 3] = [PaletteGroup::Charts, PaletteGroup::Tables, PaletteGroup::Kpis];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ArchetypeRecord")]
pub struct Archetype {
    pub label: String,
    pub default_title: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub group: PaletteGroup,
    pub description: String,
    pub default_size: WidgetSize,
    pub default_settings: WidgetSettings,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchetypeRecord {
    label: String,
    #[serde(default)]
    default_title: String,
    #[serde(rename = "type")]
    widget_type: WidgetType,
    group: PaletteGroup,
    #[serde(default)]
    description: String,
    default_size: WidgetSize,
    #[serde(default)]
    default_settings: serde_json::Value,
}

impl TryFrom<ArchetypeRecord> for Archetype {
    type Error = InvalidSettings;

    fn try_from(record: ArchetypeRecord) -> Result<Self, Self::Error> {
        Ok(Archetype {
            default_settings: WidgetSettings::from_value(record.widget_type, record.default_settings)?,
            label: record.label,
            default_title: record.default_title,
            widget_type: record.widget_type,
            group: record.group,
            description: record.description,
            default_size: record.default_size,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaletteSection<'a> {
    pub group: PaletteGroup,
    pub items: Vec<&'a Archetype>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    #[serde(default)]
    pub archetypes: Vec<Archetype>,
}

impl Palette {
    pub fn new(archetypes: Vec<Archetype>) -> Self {
        Self { archetypes }
    }

    /// First archetype of the given type.
    pub fn find_by_type(&self, widget_type: WidgetType) -> Option<&Archetype> {
        self.archetypes.iter().find(|a| a.widget_type == widget_type)
    }

    pub fn find_by_label(&self, label: &str) -> Option<&Archetype> {
        self.archetypes
            .iter()
            .find(|a| a.label.eq_ignore_ascii_case(label.trim()))
    }

    /// Archetypes grouped as Charts, Tables, KPIs, keeping catalog order inside a group.
    pub fn sections(&self) -> Vec<PaletteSection<'_>> {
        PaletteGroup::ORDER
            .into_iter()
            .map(|group| PaletteSection {
                group,
                items: self.archetypes.iter().filter(|a| a.group == group).collect(),
            })
            .collect()
    }
}
