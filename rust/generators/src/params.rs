// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parameter bundles for every feature.
//!
//! Each feature owns its sub-parameters by value (split, arch, fill). All
//! structs deserialize with defaults for missing fields, so stored instances
//! survive new fields being added. Lengths are metres, angles radians.

use serde::{Deserialize, Serialize};

/// Grid split of a face: cell counts, interior/outer size ratio and offsets.
///
/// `offset.2` is a displacement along the face normal applied by consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitParameters {
    pub count: (u32, u32),
    pub ratio: (f64, f64),
    pub offset: (f64, f64, f64),
}

impl Default for SplitParameters {
    fn default() -> Self {
        Self {
            count: (3, 3),
            ratio: (2.0, 2.7),
            offset: (0.0, 0.0, 0.0),
        }
    }
}

/// Size of an opening and its offset.
///
/// For windows the offset is measured from the centre of the opening's
/// slot; for doors `offset.1` is measured from the bottom of the face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeOffset {
    pub size: (f64, f64),
    pub offset: (f64, f64),
}

impl SizeOffset {
    pub fn window() -> Self {
        Self {
            size: (1.0, 1.0),
            offset: (0.0, 0.0),
        }
    }

    pub fn door() -> Self {
        Self {
            size: (1.0, 2.0),
            offset: (0.0, 0.0),
        }
    }
}

impl Default for SizeOffset {
    fn default() -> Self {
        Self::window()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchParameters {
    /// Number of arc segments. Below 2 the top stays straight.
    pub resolution: u32,
    /// Height of the band at the top of the opening that the arch occupies.
    pub offset: f64,
    /// Rise of the arc above its spring line.
    pub height: f64,
    pub detail: bool,
    pub detail_thickness: f64,
    pub detail_depth: f64,
}

impl Default for ArchParameters {
    fn default() -> Self {
        Self {
            resolution: 5,
            offset: 0.5,
            height: 0.4,
            detail: false,
            detail_thickness: 0.02,
            detail_depth: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarFill {
    pub count_x: u32,
    pub count_y: u32,
    pub thickness: f64,
    pub depth: f64,
}

impl Default for BarFill {
    fn default() -> Self {
        Self {
            count_x: 1,
            count_y: 1,
            thickness: 0.05,
            depth: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LouverFill {
    pub margin: f64,
    pub density: f64,
    pub depth: f64,
}

impl Default for LouverFill {
    fn default() -> Self {
        Self {
            margin: 0.1,
            density: 0.5,
            depth: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlassPaneFill {
    pub count_x: u32,
    pub count_y: u32,
    pub thickness: f64,
    pub depth: f64,
}

impl Default for GlassPaneFill {
    fn default() -> Self {
        Self {
            count_x: 2,
            count_y: 2,
            thickness: 0.05,
            depth: 0.02,
        }
    }
}

/// Infill of an opening.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FillParameters {
    #[default]
    None,
    Bars(BarFill),
    Louver(LouverFill),
    GlassPanes(GlassPaneFill),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowParameters {
    pub frame_thickness: f64,
    /// Extrusion of the frame out of the wall; negative recesses it.
    pub frame_depth: f64,
    /// Recess of the glazing behind the frame.
    pub window_depth: f64,
    /// Openings per face, evenly spaced.
    pub count: u32,
    pub add_arch: bool,
    pub arch: ArchParameters,
    pub size_offset: SizeOffset,
    pub fill: FillParameters,
}

impl Default for WindowParameters {
    fn default() -> Self {
        Self {
            frame_thickness: 0.1,
            frame_depth: 0.0,
            window_depth: 0.05,
            count: 1,
            add_arch: false,
            arch: ArchParameters::default(),
            size_offset: SizeOffset::window(),
            fill: FillParameters::None,
        }
    }
}

/// Shallow grooves cut into a door leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrooveParameters {
    pub enabled: bool,
    pub count: (u32, u32),
    pub thickness: f64,
    pub depth: f64,
    /// Fraction of the leaf width covered by the groove grid.
    pub width: f64,
    /// Vertical shift of the groove grid.
    pub offset: f64,
}

impl Default for GrooveParameters {
    fn default() -> Self {
        Self {
            enabled: false,
            count: (1, 1),
            thickness: 0.05,
            depth: 0.01,
            width: 1.0,
            offset: 0.0,
        }
    }
}

/// Glazed panes in the upper part of a door leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorPaneParameters {
    pub enabled: bool,
    pub count: (u32, u32),
    pub thickness: f64,
    pub depth: f64,
    /// Height above the leaf bottom where the pane region starts.
    pub offset: f64,
    /// Fraction of the leaf width covered by panes.
    pub width: f64,
}

impl Default for DoorPaneParameters {
    fn default() -> Self {
        Self {
            enabled: false,
            count: (1, 1),
            thickness: 0.05,
            depth: 0.01,
            offset: 1.0,
            width: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorParameters {
    pub outer_frame_thickness: f64,
    pub outer_frame_depth: f64,
    pub inner_frame_thickness: f64,
    pub inner_frame_depth: f64,
    pub count: u32,
    pub add_arch: bool,
    pub arch: ArchParameters,
    pub size_offset: SizeOffset,
    pub double_door: bool,
    pub grooves: GrooveParameters,
    pub panes: DoorPaneParameters,
}

impl Default for DoorParameters {
    fn default() -> Self {
        Self {
            outer_frame_thickness: 0.0,
            outer_frame_depth: 0.0,
            inner_frame_thickness: 0.1,
            inner_frame_depth: 0.1,
            count: 1,
            add_arch: false,
            arch: ArchParameters::default(),
            size_offset: SizeOffset::door(),
            double_door: false,
            grooves: GrooveParameters::default(),
            panes: DoorPaneParameters::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RailFill {
    #[default]
    Posts,
    Rails,
    Wall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RailingParameters {
    pub post_width: f64,
    pub post_height: f64,
    /// In `[0, 1]`; higher puts more posts on each edge.
    pub post_density: f64,
    pub rail_width: f64,
    pub rail_height: f64,
    pub rail_density: f64,
    pub wall_width: f64,
    pub wall_height: f64,
    pub corner_post_width: f64,
    pub corner_post_height: f64,
    pub has_corner_posts: bool,
    /// Drop the interior-facing side of wall panels.
    pub delete_faces: bool,
    pub fill: RailFill,
}

impl Default for RailingParameters {
    fn default() -> Self {
        Self {
            post_width: 0.15,
            post_height: 0.7,
            post_density: 0.9,
            rail_width: 0.15,
            rail_height: 0.025,
            rail_density: 0.2,
            wall_width: 0.075,
            wall_height: 0.7,
            corner_post_width: 0.15,
            corner_post_height: 0.7,
            has_corner_posts: true,
            delete_faces: true,
            fill: RailFill::Posts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalconyParameters {
    /// Protrusion out of the wall.
    pub width: f64,
    pub railing: bool,
    pub has_split: bool,
    pub split: SplitParameters,
    pub rail: RailingParameters,
}

impl Default for BalconyParameters {
    fn default() -> Self {
        Self {
            width: 2.0,
            railing: true,
            has_split: false,
            split: SplitParameters::default(),
            rail: RailingParameters::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StairsParameters {
    pub step_count: u32,
    /// Run of each step.
    pub step_width: f64,
    /// Recess of each riser as a fraction of half the run.
    pub scale: f64,
    pub keep_bottom_faces: bool,
}

impl Default for StairsParameters {
    fn default() -> Self {
        Self {
            step_count: 3,
            step_width: 0.5,
            scale: 0.0,
            keep_bottom_faces: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaircaseParameters {
    pub landing_count: u32,
    pub landing_width: f64,
    pub landing_length: f64,
    pub landing_thickness: f64,
    /// Rise between consecutive landings.
    pub landing_offset_z: f64,
    /// Horizontal gap between consecutive landings, spanned by a flight.
    pub landing_offset_y: f64,
    pub landing_support: bool,
    pub landing_support_size: f64,
    pub landing_railing: bool,
    pub landing_rail_post_width: f64,
    pub landing_rail_post_height: f64,
    pub landing_rail_post_density: f64,
    pub landing_rail_width: f64,
    pub step_count: u32,
    /// Clearance between a flight and the landing edges.
    pub step_gap: f64,
    pub step_support: bool,
    pub step_support_count: u32,
    pub step_support_width: f64,
    pub step_railing: bool,
    pub inner_step_railing: bool,
    pub outer_step_railing: bool,
    pub step_rail_post_height: f64,
    pub step_rail_post_width: f64,
    pub step_rail_width: f64,
}

impl Default for StaircaseParameters {
    fn default() -> Self {
        Self {
            landing_count: 3,
            landing_width: 4.0,
            landing_length: 2.5,
            landing_thickness: 0.25,
            landing_offset_z: 2.0,
            landing_offset_y: 4.0,
            landing_support: false,
            landing_support_size: 0.25,
            landing_railing: false,
            landing_rail_post_width: 0.1,
            landing_rail_post_height: 1.0,
            landing_rail_post_density: 0.4,
            landing_rail_width: 0.2,
            step_count: 5,
            step_gap: 0.25,
            step_support: false,
            step_support_count: 2,
            step_support_width: 0.2,
            step_railing: false,
            inner_step_railing: true,
            outer_step_railing: true,
            step_rail_post_height: 1.0,
            step_rail_post_width: 0.1,
            step_rail_width: 0.15,
        }
    }
}

impl StaircaseParameters {
    /// Railing used around landings.
    pub fn landing_rail(&self) -> RailingParameters {
        RailingParameters {
            post_width: self.landing_rail_post_width,
            post_height: self.landing_rail_post_height,
            post_density: self.landing_rail_post_density,
            rail_width: self.landing_rail_width,
            corner_post_width: self.landing_rail_post_width,
            corner_post_height: self.landing_rail_post_height,
            ..RailingParameters::default()
        }
    }

    /// Railing used along flights.
    pub fn step_rail(&self) -> RailingParameters {
        RailingParameters {
            post_width: self.step_rail_post_width,
            post_height: self.step_rail_post_height,
            post_density: self.landing_rail_post_density,
            rail_width: self.step_rail_width,
            corner_post_width: self.step_rail_post_width,
            corner_post_height: self.step_rail_post_height,
            ..RailingParameters::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofOrientation {
    /// Ridge along the footprint's long axis.
    #[default]
    Left,
    /// Ridge along the footprint's short axis.
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatRoof {
    pub thickness: f64,
    pub outset: f64,
}

impl Default for FlatRoof {
    fn default() -> Self {
        Self {
            thickness: 0.1,
            outset: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GableRoof {
    pub thickness: f64,
    pub outset: f64,
    pub height: f64,
    pub orientation: RoofOrientation,
}

impl Default for GableRoof {
    fn default() -> Self {
        Self {
            thickness: 0.1,
            outset: 0.1,
            height: 1.0,
            orientation: RoofOrientation::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HipRoof {
    pub thickness: f64,
    pub outset: f64,
    pub height: f64,
    /// Horizontal inset of the hip ridge from the eaves.
    pub amount: f64,
    pub dissolve: bool,
    pub dissolve_angle: f64,
}

impl Default for HipRoof {
    fn default() -> Self {
        Self {
            thickness: 0.1,
            outset: 0.1,
            height: 1.0,
            amount: 0.5,
            dissolve: false,
            dissolve_angle: 5f64.to_radians(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoofParameters {
    Flat(FlatRoof),
    Gable(GableRoof),
    Hip(HipRoof),
}

impl Default for RoofParameters {
    fn default() -> Self {
        RoofParameters::Flat(FlatRoof::default())
    }
}

/// Parameters of one feature instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "feature", content = "params", rename_all = "snake_case")]
pub enum GeneratorParameters {
    Window(WindowParameters),
    Door(DoorParameters),
    Balcony(BalconyParameters),
    Railing(RailingParameters),
    Stairs(StairsParameters),
    Staircase(StaircaseParameters),
    Roof(RoofParameters),
}

impl GeneratorParameters {
    /// Feature name for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            GeneratorParameters::Window(_) => "window",
            GeneratorParameters::Door(_) => "door",
            GeneratorParameters::Balcony(_) => "balcony",
            GeneratorParameters::Railing(_) => "railing",
            GeneratorParameters::Stairs(_) => "stairs",
            GeneratorParameters::Staircase(_) => "staircase",
            GeneratorParameters::Roof(_) => "roof",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let window: WindowParameters = serde_json::from_str(r#"{"count": 2}"#).unwrap();
        assert_eq!(window.count, 2);
        assert_eq!(window.frame_thickness, 0.1);
        assert_eq!(window.fill, FillParameters::None);
    }

    #[test]
    fn tagged_enums_round_trip() {
        let params = GeneratorParameters::Window(WindowParameters {
            fill: FillParameters::Bars(BarFill::default()),
            ..WindowParameters::default()
        });
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains(r#""feature":"window""#));
        assert!(json.contains(r#""type":"bars""#));
        let back: GeneratorParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn roof_variants_parse() {
        let roof: RoofParameters = serde_json::from_str(r#"{"type":"gable","orientation":"right"}"#).unwrap();
        match roof {
            RoofParameters::Gable(g) => {
                assert_eq!(g.orientation, RoofOrientation::Right);
                assert_eq!(g.height, 1.0);
            }
            other => panic!("unexpected roof {other:?}"),
        }
    }
}
