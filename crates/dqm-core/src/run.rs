//! Run-level context handed to the monitor at the start of every run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::event::InputTag;

/// What is known about a run before its first event: the run number and
/// the trigger menus that were active.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunContext {
    /// Run number.
    pub run: u32,
    /// High-level trigger path names per trigger-results tag.
    #[serde(default)]
    pub hlt_menus: BTreeMap<InputTag, Vec<String>>,
    /// First-level trigger algorithm names.
    #[serde(default)]
    pub l1_menu: Vec<String>,
}

impl RunContext {
    /// Context with empty menus.
    pub fn new(run: u32) -> Self {
        Self { run, ..Default::default() }
    }

    /// Register the high-level path names available under `tag`.
    pub fn with_hlt_menu<S: Into<String>>(
        mut self,
        tag: impl Into<InputTag>,
        paths: impl IntoIterator<Item = S>,
    ) -> Self {
        self.hlt_menus.insert(tag.into(), paths.into_iter().map(Into::into).collect());
        self
    }

    /// Register the first-level algorithm names.
    pub fn with_l1_menu<S: Into<String>>(mut self, algorithms: impl IntoIterator<Item = S>) -> Self {
        self.l1_menu = algorithms.into_iter().map(Into::into).collect();
        self
    }

    /// High-level path names under `tag`, if the menu is known.
    pub fn hlt_menu(&self, tag: &InputTag) -> Option<&[String]> {
        self.hlt_menus.get(tag).map(Vec::as_slice)
    }
}
