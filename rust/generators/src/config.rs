// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generator configuration loaded from environment variables.

/// Tunables shared by every generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Geometric tolerance in metres for coincidence checks.
    pub tolerance: f64,
    /// Distance within which a stored reference corner matches a vertex.
    pub reference_tolerance: f64,
    /// Upper bound on posts generated along a single railing edge.
    pub max_posts_per_edge: usize,
    /// Upper bound on arch segments.
    pub max_arch_resolution: usize,
    /// Upper bound on louver slats in one fill and on stacked rails per edge.
    pub max_slats: usize,
}

impl GeneratorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            tolerance: std::env::var("STOREY_TOLERANCE")
                .unwrap_or_else(|_| "1e-6".into())
                .parse()
                .unwrap_or(1e-6),
            reference_tolerance: std::env::var("STOREY_REFERENCE_TOLERANCE")
                .unwrap_or_else(|_| "1e-4".into())
                .parse()
                .unwrap_or(1e-4),
            max_posts_per_edge: std::env::var("STOREY_MAX_POSTS_PER_EDGE")
                .unwrap_or_else(|_| "64".into())
                .parse()
                .unwrap_or(64),
            max_arch_resolution: std::env::var("STOREY_MAX_ARCH_RESOLUTION")
                .unwrap_or_else(|_| "64".into())
                .parse()
                .unwrap_or(64),
            max_slats: std::env::var("STOREY_MAX_SLATS")
                .unwrap_or_else(|_| "64".into())
                .parse()
                .unwrap_or(64),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
