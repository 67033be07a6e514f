// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod enforce;
mod normalize;
mod verify;

pub use enforce::{EnforceStats, enforce};
pub use normalize::normalize;
pub use verify::{verify, verify_all};
