/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod clock;
pub use clock::{ManualClock, MonotonicClock, SystemClock};

mod origin;
pub use origin::TimeOrigin;

mod timer;
pub use timer::RotationTimer;
