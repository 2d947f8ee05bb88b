//! Dashboard state and views
//!
//! `Dashboard` owns everything the views need: configuration, the current
//! reading set, the data-source toggle, the selected area and the map layer
//! toggles. Views are recomputed from the reading set on every call.

use crate::aggregator::{aggregate, compute_statistics};
use crate::classifier::{classify, is_well_lit, LuxCategory};
use crate::config::DashboardConfig;
use crate::error::LiwanagError;
use crate::map_layer::{build_map_layer, MapLayers};
use crate::source::{DataSourceKind, FixtureSource};
use crate::store::{LoadState, LoadTicket, ReadingStore};
use crate::types::{AreaGroup, AreaStatistics, Reading, SensorPayload, NO_STREET};
use serde::Serialize;
use std::collections::BTreeMap;

/// One analytics card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaCard {
    pub name: String,
    #[serde(flatten)]
    pub statistics: AreaStatistics,
    pub critical: bool,
    pub status: String,
}

/// One row of an area's sensor table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorRow {
    pub id: i64,
    pub sensor_label: String,
    pub street: String,
    pub lux: u32,
    pub well_lit: bool,
    pub category: LuxCategory,
    pub timestamp: String,
}

/// Card plus sensor table for a selected area
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaDetail {
    pub card: AreaCard,
    pub sensors: Vec<SensorRow>,
}

/// Readings per lux category, for the legend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: LuxCategory,
    pub label: &'static str,
    pub color: &'static str,
    pub count: usize,
}

/// City-wide summary for the overview page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_readings: usize,
    pub area_count: usize,
    pub well_lit_count: usize,
    pub well_lit_percentage: u32,
    pub average_lux: u32,
    pub critical_areas: Vec<String>,
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug)]
pub struct Dashboard {
    config: DashboardConfig,
    store: ReadingStore,
    source_kind: DataSourceKind,
    selected_area: Option<String>,
    layers: MapLayers,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            store: ReadingStore::new(),
            source_kind: DataSourceKind::Sample,
            selected_area: None,
            layers: MapLayers::default(),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn readings(&self) -> &[Reading] {
        self.store.readings()
    }

    /// Source of the reading set currently held, if any
    pub fn loaded_source(&self) -> Option<DataSourceKind> {
        self.store.source()
    }

    /// Record count reported by the backend alongside the current set
    pub fn reported_count(&self) -> Option<u64> {
        self.store.reported_count()
    }

    pub fn load_state(&self) -> &LoadState {
        self.store.state()
    }

    // Data loading

    pub fn source_kind(&self) -> DataSourceKind {
        self.source_kind
    }

    /// Flip between sample and API data; the caller starts the new load.
    pub fn toggle_source(&mut self) -> DataSourceKind {
        self.source_kind = self.source_kind.toggled();
        self.source_kind
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.store.begin_load(self.source_kind)
    }

    /// Apply a finished load. Returns `false` if a newer load superseded it.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<SensorPayload, LiwanagError>,
    ) -> bool {
        match result {
            Ok(payload) => self.store.apply(ticket, payload),
            Err(e) => self.store.fail(ticket, e.to_string()),
        }
    }

    /// Load the bundled sample set
    pub fn load_sample(&mut self) -> Result<bool, LiwanagError> {
        self.load_fixture(&FixtureSource::bundled())
    }

    /// Load a fixture as sample data.
    ///
    /// A bad fixture leaves the previous set in place, marks the load failed
    /// and returns the error. `Ok(false)` means a newer load superseded this one.
    pub fn load_fixture(&mut self, fixture: &FixtureSource) -> Result<bool, LiwanagError> {
        self.source_kind = DataSourceKind::Sample;
        let ticket = self.begin_load();
        match fixture.load() {
            Ok(payload) => Ok(self.finish_load(ticket, Ok(payload))),
            Err(e) => {
                self.store.fail(ticket, e.to_string());
                Err(e)
            }
        }
    }

    // Selection and toggles

    pub fn select_area(&mut self, name: &str) -> Result<(), LiwanagError> {
        if !self.groups().contains_key(name) {
            return Err(LiwanagError::UnknownArea(name.to_string()));
        }
        self.selected_area = Some(name.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected_area = None;
    }

    pub fn selected_area(&self) -> Option<&str> {
        self.selected_area.as_deref()
    }

    pub fn layers(&self) -> MapLayers {
        self.layers
    }

    pub fn toggle_markers(&mut self) -> bool {
        self.layers.markers = !self.layers.markers;
        self.layers.markers
    }

    pub fn toggle_street_lines(&mut self) -> bool {
        self.layers.street_lines = !self.layers.street_lines;
        self.layers.street_lines
    }

    pub fn set_layers(&mut self, layers: MapLayers) {
        self.layers = layers;
    }

    // Views

    pub fn groups(&self) -> BTreeMap<String, AreaGroup> {
        aggregate(self.store.readings())
    }

    /// Analytics cards, sorted by area name
    pub fn area_cards(&self) -> Vec<AreaCard> {
        self.groups()
            .values()
            .map(|group| self.card_for(group))
            .collect()
    }

    pub fn area_detail(&self, name: &str) -> Result<AreaDetail, LiwanagError> {
        let groups = self.groups();
        let group = groups
            .get(name)
            .ok_or_else(|| LiwanagError::UnknownArea(name.to_string()))?;

        let threshold = self.config.well_lit_threshold;
        let sensors = group
            .readings
            .iter()
            .map(|r| SensorRow {
                id: r.id,
                sensor_label: r.sensor_label.clone(),
                street: r.street_name().unwrap_or(NO_STREET).to_string(),
                lux: r.lux,
                well_lit: is_well_lit(r.lux, threshold),
                category: classify(f64::from(r.lux)),
                timestamp: r.timestamp.clone(),
            })
            .collect();

        Ok(AreaDetail {
            card: self.card_for(group),
            sensors,
        })
    }

    /// Detail view of the selected area, if one is selected and still present
    pub fn selected_detail(&self) -> Option<AreaDetail> {
        self.selected_area
            .as_deref()
            .and_then(|name| self.area_detail(name).ok())
    }

    pub fn overview(&self) -> Overview {
        let readings = self.store.readings();
        let all = AreaGroup {
            area_name: String::new(),
            readings: readings.to_vec(),
        };
        let totals = compute_statistics(&all, self.config.well_lit_threshold);

        let cards = self.area_cards();
        let critical_areas = cards
            .iter()
            .filter(|c| c.critical)
            .map(|c| c.name.clone())
            .collect();

        let categories = LuxCategory::ALL
            .iter()
            .map(|category| CategoryCount {
                category: *category,
                label: category.label(),
                color: category.color(),
                count: readings
                    .iter()
                    .filter(|r| classify(f64::from(r.lux)) == *category)
                    .count(),
            })
            .collect();

        Overview {
            total_readings: totals.total,
            area_count: cards.len(),
            well_lit_count: totals.well_lit_count,
            well_lit_percentage: totals.well_lit_percentage,
            average_lux: totals.average_lux,
            critical_areas,
            categories,
        }
    }

    /// GeoJSON overlay honoring the current layer toggles
    pub fn map_layer(&self) -> serde_json::Value {
        build_map_layer(
            self.store.readings(),
            self.layers,
            self.config.interpolation_steps,
            &self.config.viewport,
        )
    }

    fn card_for(&self, group: &AreaGroup) -> AreaCard {
        let statistics = compute_statistics(group, self.config.well_lit_threshold);
        let cutoff = self.config.critical_percentage;
        AreaCard {
            name: group.area_name.clone(),
            critical: statistics.is_critical_below(cutoff),
            status: statistics.status_below(cutoff).to_string(),
            statistics,
        }
    }
}
