// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Modelling operators.
//!
//! Every operator is an `impl Mesh` block (or a free function over a mesh)
//! that validates its inputs before mutating. Operators that stitch new
//! faces onto existing ones keep shared edges shared, so a region stays
//! watertight across repeated edits. Use [`Mesh::staged`] to make a chain
//! of operators all-or-nothing.

pub mod bridge;
pub mod dissolve;
pub mod extrude;
pub mod inset;
pub mod prism;
pub mod split;
pub mod triangulate;

pub use extrude::Extrusion;
pub use inset::offset_polygon;
pub use prism::{build_box, build_prism, Prism};
pub use split::GridLines;
