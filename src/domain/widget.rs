// Widget domain model - placed widgets and the copy-on-write list operations
use super::error::InvalidSettings;
use super::layout::{place_new_widget, GRID_COLUMNS, MAX_WIDGET_HEIGHT};
use super::palette::Archetype;
use super::settings::{WidgetSettings, WidgetType};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

pub const UNTITLED: &str = "Untitled";

/// Grid position and size. Missing fields read as `x=0, y=0, w=4, h=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Default for LayoutRect {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            w: 4,
            h: 4,
        }
    }
}

impl LayoutRect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn overlaps(&self, other: &LayoutRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Enforces `w >= 1`, `h >= 1` and `x + w <= 12`.
    pub fn normalized(self) -> Self {
        let w = self.w.clamp(1, GRID_COLUMNS);
        Self {
            x: self.x.min(GRID_COLUMNS - w),
            y: self.y,
            w,
            h: self.h.max(1),
        }
    }
}

/// Partial layout update; unset fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPatch {
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub w: Option<u32>,
    pub h: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub widget_id: String,
    pub title: String,
    pub description: String,
    pub layout: LayoutRect,
    pub settings: WidgetSettings,
}

impl Widget {
    pub fn widget_type(&self) -> WidgetType {
        self.settings.widget_type()
    }

    fn patched(&self, patch: &WidgetPatch) -> Widget {
        let mut widget = self.clone();

        if let Some(title) = &patch.title {
            widget.title = title.clone();
        }
        if let Some(description) = &patch.description {
            widget.description = description.clone();
        }
        if let Some(settings) = &patch.settings {
            if settings.widget_type() == widget.widget_type() {
                widget.settings = settings.clone();
            } else {
                tracing::warn!(
                    "Ignoring {} settings for {} widget {}",
                    settings.widget_type(),
                    widget.widget_type(),
                    widget.widget_id
                );
            }
        }
        if let Some(layout) = &patch.layout {
            let mut rect = widget.layout;
            if let Some(x) = layout.x {
                rect.x = x;
            }
            if let Some(y) = layout.y {
                rect.y = y;
            }
            if let Some(w) = layout.w {
                rect.w = w;
            }
            if let Some(h) = layout.h {
                rect.h = h.min(MAX_WIDGET_HEIGHT);
            }
            widget.layout = rect.normalized();
        }

        widget
    }
}

/// Wire shape: `{widgetId, type, title, description, layout, settings}`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WidgetRecord {
    widget_id: String,
    #[serde(rename = "type")]
    widget_type: WidgetType,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    layout: LayoutRect,
    #[serde(default)]
    settings: serde_json::Value,
}

impl TryFrom<WidgetRecord> for Widget {
    type Error = InvalidSettings;

    fn try_from(record: WidgetRecord) -> Result<Self, Self::Error> {
        Ok(Widget {
            widget_id: record.widget_id,
            title: record.title.unwrap_or_else(|| UNTITLED.to_string()),
            description: record.description.unwrap_or_default(),
            layout: record.layout,
            settings: WidgetSettings::from_value(record.widget_type, record.settings)?,
        })
    }
}

impl<'de> Deserialize<'de> for Widget {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = WidgetRecord::deserialize(deserializer)?;
        Widget::try_from(record).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Widget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Widget", 6)?;
        state.serialize_field("widgetId", &self.widget_id)?;
        state.serialize_field("type", &self.widget_type())?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("layout", &self.layout)?;
        state.serialize_field("settings", &self.settings)?;
        state.end()
    }
}

/// Changes applied by the settings panel. Title, description and settings are
/// replaced wholesale; layout is merged field by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub layout: Option<LayoutPatch>,
    pub settings: Option<WidgetSettings>,
}

/// Builds a widget from a palette archetype, placed below the current layout.
pub fn create_widget(existing: &[Widget], archetype: &Archetype) -> Widget {
    let title = if archetype.default_title.is_empty() {
        archetype.label.clone()
    } else {
        archetype.default_title.clone()
    };

    Widget {
        widget_id: Uuid::new_v4().to_string(),
        title,
        description: String::new(),
        layout: place_new_widget(existing, archetype.default_size),
        settings: archetype.default_settings.clone(),
    }
}

/// Returns the extended list together with the newly created widget.
pub fn add_widget(widgets: &[Widget], archetype: &Archetype) -> (Vec<Widget>, Widget) {
    let widget = create_widget(widgets, archetype);
    let mut updated = widgets.to_vec();
    updated.push(widget.clone());
    (updated, widget)
}

pub fn update_widget(widgets: &[Widget], widget_id: &str, patch: &WidgetPatch) -> Vec<Widget> {
    widgets
        .iter()
        .map(|w| {
            if w.widget_id == widget_id {
                w.patched(patch)
            } else {
                w.clone()
            }
        })
        .collect()
}

pub fn delete_widget(widgets: &[Widget], widget_id: &str) -> Vec<Widget> {
    widgets
        .iter()
        .filter(|w| w.widget_id != widget_id)
        .cloned()
        .collect()
}

pub fn find_widget<'a>(widgets: &'a [Widget], widget_id: &str) -> Option<&'a Widget> {
    widgets.iter().find(|w| w.widget_id == widget_id)
}
