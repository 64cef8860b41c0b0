// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! All-or-nothing edits.

use std::fmt::Display;

use tracing::debug;

use crate::mesh::Mesh;

impl Mesh {
    /// Runs `edit` against a working copy and commits it only on success.
    ///
    /// On error the mesh is left exactly as it was, including key
    /// allocation state.
    ///
    /// ```
    /// use storey_kernel::{Error, Mesh};
    ///
    /// let mut mesh = Mesh::new();
    /// let result: Result<(), Error> = mesh.staged(|m| {
    ///     m.add_vertex(0.0, 0.0, 0.0);
    ///     Err(Error::DegenerateGeometry("abort".into()))
    /// });
    /// assert!(result.is_err());
    /// assert_eq!(mesh.vertex_count(), 0);
    /// ```
    pub fn staged<T, E, F>(&mut self, edit: F) -> Result<T, E>
    where
        E: Display,
        F: FnOnce(&mut Mesh) -> Result<T, E>,
    {
        let mut work = self.clone();
        match edit(&mut work) {
            Ok(value) => {
                *self = work;
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "staged edit rolled back");
                Err(err)
            }
        }
    }
}
