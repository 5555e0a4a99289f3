// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};

/// A bidder display label rendered in the three fixed publication locales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedLabel {
    /// English rendering.
    pub en: String,
    /// Russian rendering.
    pub ru: String,
    /// Ukrainian rendering.
    pub uk: String,
}

impl LocalizedLabel {
    /// Builds the label record for a bidder display name.
    ///
    /// The prefixes are fixed by the publication format and are not
    /// configurable.
    #[must_use]
    pub fn for_bidder(bidder_name: &str) -> Self {
        Self {
            en: format!("Bidder #{bidder_name}"),
            ru: format!("Участник №{bidder_name}"),
            uk: format!("Учасник №{bidder_name}"),
        }
    }
}
