// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Storey Kernel
//!
//! Editable polygon mesh and the modelling operators the building generators
//! are made of.
//!
//! The [`Mesh`] stores vertices, edges and faces in slot maps with stable,
//! generational keys and keeps upward adjacency indices, so operators can walk
//! from a face to its neighbours without scanning. On top of the storage sit
//! the operators in [`ops`]: grid split, region extrude, inset, loop bridge,
//! face join and triangulation, plus closed prisms for posts and steps.
//!
//! Geometry follows a right-handed, Z-up world in metres. Face loops are
//! counter-clockwise seen from the side their normal points to.

pub mod construction;
pub mod error;
pub mod geometry;
pub mod keys;
pub mod materials;
pub mod mesh;
pub mod ops;
pub mod serialization;
pub mod spatial;
pub mod transaction;
pub mod transform;
pub mod traversal;

pub use construction::make_quad;
pub use error::{Error, Result};
pub use geometry::{newell_vector, polygon_area, polygon_normal, LocalFrame, EPSILON};
pub use keys::{EdgeKey, FaceKey, MeshKey, VertexKey};
pub use mesh::{EdgeData, FaceData, Mesh, VertexData, DEFAULT_MATERIAL};
pub use ops::{build_box, build_prism, offset_polygon, Extrusion, GridLines, Prism};
pub use serialization::{MeshSignature, MeshSnapshot};
pub use spatial::SpatialIndex;
