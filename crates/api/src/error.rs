// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the publication boundary.

use thiserror::Error;

/// Publication errors.
///
/// These never affect the persisted auction state; a failed publication is
/// logged and retried out of band.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP request failed or the upstream rejected it.
    #[error("Result publication request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The payload could not be serialized.
    #[error("Result payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
