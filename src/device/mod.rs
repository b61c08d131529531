mod rm2;
mod rmpp;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

use crate::config::PropertyMap;
use crate::error::{Error, Result};
use crate::input::event::{abs_code_from_name, EV_ABS, EV_KEY};
use crate::input::RawEvent;

pub use rm2::rm2;
pub use rmpp::rmpp;

/// Range and noise characteristics of one absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawAxisInfo {
    pub min: i32,
    pub max: i32,
    #[serde(default)]
    pub flat: i32,
    #[serde(default)]
    pub fuzz: i32,
    #[serde(default)]
    pub resolution: i32,
}

impl RawAxisInfo {
    pub fn new(min: i32, max: i32) -> Self {
        Self {
            min,
            max,
            ..Default::default()
        }
    }

    pub fn with_resolution(mut self, resolution: i32) -> Self {
        self.resolution = resolution;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputProperty {
    Pointer,
    Direct,
    Buttonpad,
    SemiMt,
}

/// A virtual key region in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VirtualKeyDefinition {
    pub scan_code: i32,
    pub center_x: i32,
    pub center_y: i32,
    pub width: i32,
    pub height: i32,
}

/// Read-only queries the touch engine makes against the device it serves.
///
/// Called at configuration and reset time only.
pub trait DeviceInfo {
    fn name(&self) -> &str;
    fn is_external(&self) -> bool;
    fn has_input_property(&self, prop: InputProperty) -> bool;
    fn abs_axis_info(&self, code: u16) -> Option<RawAxisInfo>;
    fn has_rel_axis(&self, code: u16) -> bool;
    fn has_key(&self, code: u16) -> bool;
    fn is_key_pressed(&self, code: u16) -> bool;
    fn abs_value(&self, code: u16) -> Option<i32>;
    fn configuration(&self) -> PropertyMap;
    fn virtual_key_definitions(&self) -> Vec<VirtualKeyDefinition>;
    /// Map a scan code to a key code.
    fn map_key(&self, scan_code: i32) -> Option<i32>;
}

/// Static description of an input device plus the key/axis state seen so far.
#[derive(Debug, Clone, Default)]
pub struct DeviceProfile {
    pub name: String,
    pub external: bool,
    /// Size of one raw input_event on the device (bytes).
    pub input_event_size: usize,
    /// Display the device is bound to, when it has one.
    pub display: Option<(i32, i32)>,
    properties: BTreeSet<InputProperty>,
    axes: BTreeMap<u16, RawAxisInfo>,
    rel_axes: BTreeSet<u16>,
    keys: BTreeSet<u16>,
    configuration: PropertyMap,
    virtual_keys: Vec<VirtualKeyDefinition>,
    key_layout: BTreeMap<i32, i32>,
    pressed: BTreeSet<u16>,
    values: BTreeMap<u16, i32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileFile {
    name: String,
    #[serde(default)]
    external: bool,
    #[serde(default = "default_event_size")]
    input_event_size: usize,
    display_width: Option<i32>,
    display_height: Option<i32>,
    #[serde(default)]
    properties: Vec<InputProperty>,
    #[serde(default)]
    axes: BTreeMap<String, RawAxisInfo>,
    #[serde(default)]
    relative_axes: Vec<u16>,
    #[serde(default)]
    keys: Vec<u16>,
    #[serde(default)]
    configuration: toml::Table,
    #[serde(default)]
    virtual_keys: Vec<VirtualKeyDefinition>,
    #[serde(default)]
    key_layout: BTreeMap<String, i32>,
}

fn default_event_size() -> usize {
    crate::input::event::INPUT_EVENT_SIZE_32
}

impl DeviceProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_event_size: default_event_size(),
            ..Default::default()
        }
    }

    /// Look up one of the built-in profiles.
    pub fn builtin(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "rm2" | "remarkable2" => Ok(rm2()),
            "rmpp" | "paper-pro" => Ok(rmpp()),
            _ => Err(Error::UnknownProfile(name.into())),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let profile = Self::from_toml_str(&content)?;
        log::debug!("Loaded device profile '{}' from {}", profile.name, path.display());
        Ok(profile)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ProfileFile = toml::from_str(content)?;

        let mut profile = Self::new(file.name);
        profile.external = file.external;
        profile.input_event_size = file.input_event_size;
        profile.display = file.display_width.zip(file.display_height);
        profile.properties = file.properties.into_iter().collect();
        for (name, info) in file.axes {
            let code = abs_code_from_name(&name).ok_or(Error::UnknownAxis(name))?;
            profile.axes.insert(code, info);
        }
        profile.rel_axes = file.relative_axes.into_iter().collect();
        profile.keys = file.keys.into_iter().collect();
        profile.configuration = PropertyMap::from_toml(&file.configuration);
        profile.virtual_keys = file.virtual_keys;
        for (scan, key) in file.key_layout {
            match scan.parse::<i32>() {
                Ok(scan) => {
                    profile.key_layout.insert(scan, key);
                }
                Err(_) => log::warn!("Ignoring key layout entry with bad scan code '{}'", scan),
            }
        }
        Ok(profile)
    }

    pub fn with_axis(mut self, code: u16, info: RawAxisInfo) -> Self {
        self.axes.insert(code, info);
        self
    }

    pub fn with_property(mut self, prop: InputProperty) -> Self {
        self.properties.insert(prop);
        self
    }

    pub fn with_key(mut self, code: u16) -> Self {
        self.keys.insert(code);
        self
    }

    pub fn with_rel_axis(mut self, code: u16) -> Self {
        self.rel_axes.insert(code);
        self
    }

    pub fn with_config(mut self, key: &str, value: &str) -> Self {
        self.configuration.insert(key, value);
        self
    }

    pub fn with_virtual_key(mut self, def: VirtualKeyDefinition, key_code: i32) -> Self {
        self.key_layout.insert(def.scan_code, key_code);
        self.virtual_keys.push(def);
        self
    }

    pub fn with_display(mut self, width: i32, height: i32) -> Self {
        self.display = Some((width, height));
        self
    }

    /// Track key and axis state from the live event stream so reset-time
    /// queries see what the hardware currently reports.
    pub fn observe(&mut self, event: &RawEvent) {
        match event.event_type {
            EV_KEY if self.keys.contains(&event.code) => {
                if event.value != 0 {
                    self.pressed.insert(event.code);
                } else {
                    self.pressed.remove(&event.code);
                }
            }
            EV_ABS if self.axes.contains_key(&event.code) => {
                self.values.insert(event.code, event.value);
            }
            _ => {}
        }
    }
}

impl DeviceInfo for DeviceProfile {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_external(&self) -> bool {
        self.external
    }

    fn has_input_property(&self, prop: InputProperty) -> bool {
        self.properties.contains(&prop)
    }

    fn abs_axis_info(&self, code: u16) -> Option<RawAxisInfo> {
        self.axes.get(&code).copied()
    }

    fn has_rel_axis(&self, code: u16) -> bool {
        self.rel_axes.contains(&code)
    }

    fn has_key(&self, code: u16) -> bool {
        self.keys.contains(&code)
    }

    fn is_key_pressed(&self, code: u16) -> bool {
        self.pressed.contains(&code)
    }

    fn abs_value(&self, code: u16) -> Option<i32> {
        let info = self.axes.get(&code)?;
        Some(self.values.get(&code).copied().unwrap_or(info.min))
    }

    fn configuration(&self) -> PropertyMap {
        self.configuration.clone()
    }

    fn virtual_key_definitions(&self) -> Vec<VirtualKeyDefinition> {
        self.virtual_keys.clone()
    }

    fn map_key(&self, scan_code: i32) -> Option<i32> {
        self.key_layout.get(&scan_code).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::{ABS_MT_POSITION_X, ABS_MT_SLOT, BTN_TOUCH};
    use std::time::Duration;

    #[test]
    fn test_profile_from_toml() {
        let profile = DeviceProfile::from_toml_str(
            r#"
            name = "panel"
            properties = ["direct"]
            keys = [330]
            display_width = 800
            display_height = 480

            [axes.mt_position_x]
            min = 0
            max = 799
            resolution = 4

            [axes.mt_slot]
            min = 0
            max = 9

            [configuration]
            "touch.deviceType" = "touchScreen"

            [[virtual_keys]]
            scan_code = 158
            center_x = 40
            center_y = 500
            width = 80
            height = 40

            [key_layout]
            158 = 4
            "#,
        )
        .unwrap();

        assert!(profile.has_input_property(InputProperty::Direct));
        assert!(!profile.has_input_property(InputProperty::Pointer));
        assert_eq!(
            profile.abs_axis_info(ABS_MT_POSITION_X),
            Some(RawAxisInfo::new(0, 799).with_resolution(4))
        );
        assert_eq!(profile.abs_axis_info(ABS_MT_SLOT).map(|a| a.max), Some(9));
        assert!(profile.has_key(BTN_TOUCH));
        assert_eq!(profile.display, Some((800, 480)));
        assert_eq!(profile.configuration().get("touch.deviceType"), Some("touchScreen"));
        assert_eq!(profile.virtual_key_definitions().len(), 1);
        assert_eq!(profile.map_key(158), Some(4));
        assert_eq!(profile.map_key(159), None);
    }

    #[test]
    fn test_unknown_axis_rejected() {
        let err = DeviceProfile::from_toml_str(
            r#"
            name = "panel"
            [axes.warp_drive]
            min = 0
            max = 1
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownAxis(_)));
    }

    #[test]
    fn test_observe_tracks_state() {
        let mut profile = DeviceProfile::new("t")
            .with_key(BTN_TOUCH)
            .with_axis(ABS_MT_SLOT, RawAxisInfo::new(0, 9));
        assert_eq!(profile.abs_value(ABS_MT_SLOT), Some(0));

        let t = Duration::ZERO;
        profile.observe(&RawEvent::key(t, BTN_TOUCH, true));
        profile.observe(&RawEvent::abs(t, ABS_MT_SLOT, 3));
        assert!(profile.is_key_pressed(BTN_TOUCH));
        assert_eq!(profile.abs_value(ABS_MT_SLOT), Some(3));

        profile.observe(&RawEvent::key(t, BTN_TOUCH, false));
        assert!(!profile.is_key_pressed(BTN_TOUCH));
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(DeviceProfile::builtin("rm2").unwrap().name, "reMarkable 2 touch");
        assert!(matches!(
            DeviceProfile::builtin("kindle"),
            Err(Error::UnknownProfile(_))
        ));
    }
}
