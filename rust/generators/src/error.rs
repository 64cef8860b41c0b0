// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::index::InstanceId;

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating building features
#[derive(Error, Debug)]
pub enum Error {
    #[error("Split out of bounds: {0}")]
    SplitOutOfBounds(String),

    #[error("Invalid placement: {0}")]
    InvalidPlacement(String),

    #[error("Invalid stair geometry: {0}")]
    InvalidStairGeometry(String),

    #[error("Invalid footprint: {0}")]
    InvalidFootprint(String),

    #[error("Stale reference: {0}")]
    StaleReference(String),

    #[error("Unknown instance: {0}")]
    UnknownInstance(InstanceId),

    #[error("Invalid instance index: {0}")]
    InvalidIndex(String),

    #[error(transparent)]
    Kernel(#[from] storey_kernel::Error),
}
