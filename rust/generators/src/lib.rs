// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Storey Generators
//!
//! Parametric building features on top of [`storey_kernel`]: windows and
//! doors cut into wall faces, balconies, railings along edge chains, stair
//! flights and staircases, and flat, gable and hip roofs.
//!
//! Every `build_*` entry point takes a mesh, the face or edges it works on
//! and a parameter bundle. It either commits the whole feature or leaves the
//! mesh exactly as it was. Generated faces are tagged with material slots
//! named after their role (frame, glass, post, ...), so slots stay stable
//! across regenerations.
//!
//! [`Building`] ties features to a mesh. It records each instance with a
//! geometric anchor and rebuilds the mesh from scratch whenever parameters
//! change, so results do not depend on edit history.
//!
//! ```
//! use nalgebra::{Point3, Vector3};
//! use storey_generators::{Building, GeneratorParameters, Selection, WindowParameters};
//! use storey_kernel::{build_box, Mesh};
//!
//! let mut mesh = Mesh::new();
//! let block = build_box(
//!     &mut mesh,
//!     Point3::origin(),
//!     Vector3::new(4.0, 0.0, 0.0),
//!     Vector3::new(0.0, 4.0, 0.0),
//!     Vector3::new(0.0, 0.0, 3.0),
//!     0,
//! )
//! .unwrap();
//! let wall = block.sides[0];
//!
//! let mut building = Building::new(mesh);
//! let id = building
//!     .add_feature(&Selection::face(wall), GeneratorParameters::Window(WindowParameters::default()))
//!     .unwrap();
//! assert!(!building.generated_faces(id).unwrap().is_empty());
//! ```

pub mod arch;
pub mod balcony;
pub mod building;
pub mod config;
pub mod error;
pub mod fill;
pub mod host;
pub mod index;
pub mod materials;
pub mod observer;
pub mod opening;
pub mod params;
pub mod picking;
pub mod railing;
pub mod reference;
pub mod roof;
pub mod split;
pub mod stairs;

pub use arch::{build_arch, ArchResult};
pub use balcony::{build_balcony, BalconyResult};
pub use building::Building;
pub use config::GeneratorConfig;
pub use error::{Error, Result};
pub use fill::{apply_fill, bar_fill, glass_pane_fill, louver_fill, FillResult};
pub use host::{HostSelection, Selection};
pub use index::{BuildingInstanceIndex, InstanceId, InstanceRecord};
pub use materials::{MaterialRole, MaterialSlotAssignment};
pub use observer::{ParameterHandle, RegenerationObserver, RegenerationRequest};
pub use opening::{build_door, build_window, OpeningParts, OpeningResult, OpeningStage};
pub use params::*;
pub use picking::FacePicker;
pub use railing::{build_railing, build_railing_along, chain_edges, post_count, Polyline, RailingResult};
pub use reference::{Anchor, EdgeReference, FaceReference};
pub use roof::{build_flat_roof, build_gable_roof, build_hip_roof, build_roof, RoofResult};
pub use split::{carve, carve_spans, compute_split_grid, face_size, split_face, Carved, Rect, SplitGrid, SplitResult};
pub use stairs::{build_staircase, build_stairs, Flight, StaircaseResult, StairsResult};
