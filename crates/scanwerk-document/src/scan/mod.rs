// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — the five-stage "scan mode" enhancement applied to
// source images before they are assembled into a document.

pub mod enhance;

pub use enhance::{EnhancementPipeline, Stage};
