use shared::domain::Location;

use crate::catalog::RegionCatalog;

/// How a transition treats already-selected descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Interactive change: descendants are reset.
    UserEdit,
    /// Restoring saved data: descendants that still resolve under the new
    /// parent are kept so the next call in the restore sequence can land.
    Prefill,
}

/// Region → sub-region → ward selection for one form instance.
///
/// Values are only ever names that resolve in the catalog; anything that does
/// not resolve is stored as empty. Enabled flags are derived from the parent
/// values, so `sub_region_enabled() == !region().is_empty()` and
/// `ward_enabled() == !sub_region().is_empty()` hold by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    region: String,
    sub_region: String,
    ward: String,
    sub_region_options: Vec<String>,
    ward_options: Vec<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a selection from saved data through the prefill sequence.
    /// Components that no longer resolve are dropped, along with everything
    /// beneath them.
    pub fn restore(catalog: &RegionCatalog, saved: &Location) -> Self {
        let mut state = Self::new();
        state.select_region(catalog, &saved.county, SelectMode::Prefill);
        if state.sub_region_enabled() {
            state.select_sub_region(catalog, &saved.constituency, SelectMode::Prefill);
        }
        if state.ward_enabled() {
            state.select_ward(&saved.ward);
        }
        state
    }

    pub fn select_region(&mut self, catalog: &RegionCatalog, region: &str, mode: SelectMode) {
        let Some(entry) = catalog.region(region.trim()) else {
            self.region.clear();
            self.sub_region_options.clear();
            self.clear_sub_region();
            return;
        };

        self.region = entry.name.clone();
        self.sub_region_options = entry.sub_region_names();

        match mode {
            SelectMode::UserEdit => self.clear_sub_region(),
            SelectMode::Prefill => match entry.sub_region(&self.sub_region) {
                // Same sub-region name may exist under a different region, so
                // ward options are always re-read from the new parent.
                Some(sub) => {
                    self.ward_options = sub.wards.clone();
                    if !sub.has_ward(&self.ward) {
                        self.ward.clear();
                    }
                }
                None => self.clear_sub_region(),
            },
        }
    }

    pub fn select_sub_region(
        &mut self,
        catalog: &RegionCatalog,
        sub_region: &str,
        mode: SelectMode,
    ) {
        let Some(entry) = catalog.sub_region(&self.region, sub_region.trim()) else {
            self.clear_sub_region();
            return;
        };

        self.sub_region = entry.name.clone();
        self.ward_options = entry.wards.clone();

        match mode {
            SelectMode::UserEdit => self.ward.clear(),
            SelectMode::Prefill => {
                if !entry.has_ward(&self.ward) {
                    self.ward.clear();
                }
            }
        }
    }

    /// Direct leaf assignment. Returns `false` and leaves the ward empty when
    /// the value is not one of the current ward options.
    pub fn select_ward(&mut self, ward: &str) -> bool {
        let ward = ward.trim();
        if ward.is_empty() {
            self.ward.clear();
            return true;
        }
        if self.ward_options.iter().any(|option| option == ward) {
            self.ward = ward.to_string();
            true
        } else {
            self.ward.clear();
            false
        }
    }

    fn clear_sub_region(&mut self) {
        self.sub_region.clear();
        self.ward.clear();
        self.ward_options.clear();
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn sub_region(&self) -> &str {
        &self.sub_region
    }

    pub fn ward(&self) -> &str {
        &self.ward
    }

    pub fn sub_region_options(&self) -> &[String] {
        &self.sub_region_options
    }

    pub fn ward_options(&self) -> &[String] {
        &self.ward_options
    }

    pub fn sub_region_enabled(&self) -> bool {
        !self.region.is_empty()
    }

    pub fn ward_enabled(&self) -> bool {
        !self.sub_region.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        !self.ward.is_empty()
    }

    pub fn location(&self) -> Location {
        Location {
            county: self.region.clone(),
            constituency: self.sub_region.clone(),
            ward: self.ward.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/selector_tests.rs"]
mod tests;
