// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagecraft contributors

//! Utility modules
//!
//! Common utilities for the stagecraft CLI.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise `stagecraft=info`, or
/// `stagecraft=debug` when `verbose`. A subscriber installed earlier by the
/// embedding program is left in place.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "stagecraft=debug"
    } else {
        "stagecraft=info"
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}
