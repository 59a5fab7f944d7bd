/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The scheduling and synchronization runtime: atomic relaxation primitives,
//! reduction accumulators, bulk-synchronous loops, the approximate-priority
//! bucket worklist and the asynchronous executor driving it.

mod threads;
pub use threads::Threads;

mod atomics;
pub use atomics::Weight;

pub mod reduce;

mod do_all;
pub use do_all::{do_all, do_all_mut_steal, do_all_steal};

mod worklist;
pub use worklist::{Obim, SerialBucketWl};

mod for_each;
pub use for_each::{for_each, for_each_with_barrier, Ctx};
