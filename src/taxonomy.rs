use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// Tour type assigned to bookings whose product name matches nothing in the table
pub const UNKNOWN_TOUR_TYPE: &str = "Unknown";

pub const TREE_TOPS_TREEHOUSE: &str = "Tree Tops Treehouse Options";
pub const FOREST_FLIGHT_TREEHOUSE: &str = "Forest Flight Treehouse Options";

const BUILTIN_TAXONOMY: &str = include_str!("../config/tour_types.json");

/// Staffing configuration for one canonical tour type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourTypeConfig {
    pub course: String,
    /// Lead role first, at most two
    pub roles: Vec<String>,
    pub duration_hours_per_tour: f64,
    pub max_tours_per_guide_per_shift: usize,
    pub is_night_tour: bool,
    pub color_hint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_of: Option<String>,
}

impl TourTypeConfig {
    /// Length of a single tour in whole minutes
    pub fn tour_minutes(&self) -> i32 {
        (self.duration_hours_per_tour * 60.0).round() as i32
    }
}

/// Spacing constants used when partitioning tours into shifts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SynthesisRules {
    pub min_gap_minutes: u16,
    pub arrival_lead_minutes: u16,
}

impl Default for SynthesisRules {
    fn default() -> Self {
        SynthesisRules {
            min_gap_minutes: 180,
            arrival_lead_minutes: 15,
        }
    }
}

// On-disk shape. Variants only name their parent and, optionally, a colour.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct TourTypeEntry {
    variant_of: Option<String>,
    course: Option<String>,
    roles: Option<Vec<String>>,
    duration_hours_per_tour: Option<f64>,
    max_tours_per_guide_per_shift: Option<usize>,
    is_night_tour: Option<bool>,
    color_hint: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaxonomyFile {
    #[serde(default)]
    rules: SynthesisRules,
    tour_types: BTreeMap<String, TourTypeEntry>,
}

/// The table mapping free-text product names to canonical tour types
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomy {
    rules: SynthesisRules,
    tour_types: BTreeMap<String, TourTypeConfig>,
}

impl Taxonomy {
    /// The table shipped with the binary (`config/tour_types.json`)
    pub fn builtin() -> Result<Self, ImportError> {
        Self::from_json(BUILTIN_TAXONOMY)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parses and validates a taxonomy table, resolving `variantOf` entries
    /// against their parents.
    pub fn from_json(text: &str) -> Result<Self, ImportError> {
        let file: TaxonomyFile = serde_json::from_str(text)?;
        let mut tour_types = BTreeMap::new();

        // Base entries first so variants can inherit from them
        for (name, entry) in file.tour_types.iter().filter(|(_, e)| e.variant_of.is_none()) {
            tour_types.insert(name.clone(), base_config(name, entry)?);
        }

        for (name, entry) in file.tour_types.iter() {
            let Some(parent_name) = &entry.variant_of else {
                continue;
            };
            if entry.course.is_some()
                || entry.roles.is_some()
                || entry.duration_hours_per_tour.is_some()
                || entry.max_tours_per_guide_per_shift.is_some()
                || entry.is_night_tour.is_some()
            {
                return Err(ImportError::Config(format!(
                    "variant '{}' may only set colorHint",
                    name
                )));
            }
            let parent = tour_types
                .get(parent_name)
                .filter(|p: &&TourTypeConfig| p.variant_of.is_none())
                .ok_or_else(|| {
                    ImportError::Config(format!(
                        "variant '{}' refers to unknown or variant tour type '{}'",
                        name, parent_name
                    ))
                })?;
            let mut config = parent.clone();
            config.variant_of = Some(parent_name.clone());
            if let Some(color) = &entry.color_hint {
                config.color_hint = color.clone();
            }
            tour_types.insert(name.clone(), config);
        }

        if file.rules.min_gap_minutes == 0 {
            return Err(ImportError::Config("minGapMinutes must be positive".to_string()));
        }

        Ok(Taxonomy {
            rules: file.rules,
            tour_types,
        })
    }

    pub fn rules(&self) -> &SynthesisRules {
        &self.rules
    }

    pub fn get(&self, tour_type: &str) -> Option<&TourTypeConfig> {
        self.tour_types.get(tour_type)
    }

    pub fn tour_types(&self) -> impl Iterator<Item = (&str, &TourTypeConfig)> {
        self.tour_types.iter().map(|(name, config)| (name.as_str(), config))
    }

    /// Resolves a free-text product or summary name to a canonical tour type.
    ///
    /// Treehouse Options names are reclassified first. When several configured
    /// names occur in the text the longest wins, so table order is irrelevant.
    pub fn classify(&self, product: &str) -> Option<&str> {
        let candidate = reclassify_variant(product);
        self.tour_types
            .keys()
            .filter(|name| candidate.contains(name.as_str()))
            .max_by_key(|name| name.len())
            .map(|name| name.as_str())
    }
}

fn base_config(name: &str, entry: &TourTypeEntry) -> Result<TourTypeConfig, ImportError> {
    let missing = |field: &str| ImportError::Config(format!("tour type '{}' is missing {}", name, field));

    let course = entry.course.clone().ok_or_else(|| missing("course"))?;
    let roles = entry.roles.clone().ok_or_else(|| missing("roles"))?;
    let duration = entry.duration_hours_per_tour.ok_or_else(|| missing("durationHoursPerTour"))?;
    let max_tours = entry
        .max_tours_per_guide_per_shift
        .ok_or_else(|| missing("maxToursPerGuidePerShift"))?;

    if name.trim().is_empty() || course.trim().is_empty() {
        return Err(ImportError::Config("tour type and course names must not be empty".to_string()));
    }
    if roles.is_empty() || roles.len() > 2 {
        return Err(ImportError::Config(format!(
            "tour type '{}' must list one or two roles, found {}",
            name,
            roles.len()
        )));
    }
    if duration.is_nan() || duration <= 0.0 {
        return Err(ImportError::Config(format!(
            "tour type '{}' needs a positive durationHoursPerTour",
            name
        )));
    }
    if max_tours == 0 {
        return Err(ImportError::Config(format!(
            "tour type '{}' needs maxToursPerGuidePerShift of at least 1",
            name
        )));
    }

    Ok(TourTypeConfig {
        course,
        roles,
        duration_hours_per_tour: duration,
        max_tours_per_guide_per_shift: max_tours,
        is_night_tour: entry.is_night_tour.unwrap_or(false),
        color_hint: entry.color_hint.clone().unwrap_or_else(|| "#9e9e9e".to_string()),
        variant_of: None,
    })
}

/// Maps a "Treehouse Options" product to the variant key of its zipline tour.
/// Other names pass through unchanged.
pub fn reclassify_variant(summary: &str) -> Cow<'_, str> {
    if !summary.contains("Treehouse Options") {
        return Cow::Borrowed(summary);
    }
    if summary.contains("Tree Tops") {
        Cow::Borrowed(TREE_TOPS_TREEHOUSE)
    } else if summary.contains("Forest Flight") {
        Cow::Borrowed(FOREST_FLIGHT_TREEHOUSE)
    } else {
        Cow::Borrowed(summary)
    }
}

/// Treehouse Adventures without a zipline tour is an overnight stay, not a guided tour
pub fn is_overnight_stay(summary: &str) -> bool {
    summary.contains("Treehouse Adventures") && !summary.contains("Zipline Tour")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_loads() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let tree_tops = taxonomy.get("Tree Tops Zipline Tour").unwrap();
        assert_eq!(tree_tops.course, "Tree Tops");
        assert_eq!(tree_tops.roles, vec!["Lead Guide", "Sweep Guide"]);
        assert_eq!(tree_tops.tour_minutes(), 150);
        assert_eq!(taxonomy.rules().min_gap_minutes, 180);
        assert_eq!(taxonomy.rules().arrival_lead_minutes, 15);
    }

    #[test]
    fn test_classify_substring_match() {
        let taxonomy = Taxonomy::builtin().unwrap();
        assert_eq!(
            taxonomy.classify("Tree Tops Zipline Tour (Adult)"),
            Some("Tree Tops Zipline Tour")
        );
        assert_eq!(
            taxonomy.classify("Booking: Forest Flight Zipline Tour"),
            Some("Forest Flight Zipline Tour")
        );
        assert_eq!(taxonomy.classify("Sunset Kayak Tour"), None);
        // Case-sensitive on the configured names
        assert_eq!(taxonomy.classify("tree tops zipline tour"), None);
    }

    #[test]
    fn test_treehouse_options_variant_inherits_parent() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let classified = taxonomy
            .classify("Tree Tops Zipline Tour + Treehouse Options")
            .unwrap();
        assert_eq!(classified, TREE_TOPS_TREEHOUSE);

        let variant = taxonomy.get(classified).unwrap();
        let parent = taxonomy.get("Tree Tops Zipline Tour").unwrap();
        assert_eq!(variant.course, parent.course);
        assert_eq!(variant.roles, parent.roles);
        assert_ne!(variant.color_hint, parent.color_hint);
        assert_eq!(variant.variant_of.as_deref(), Some("Tree Tops Zipline Tour"));
    }

    #[test]
    fn test_reclassify_variant() {
        assert_eq!(
            reclassify_variant("Forest Flight - Treehouse Options"),
            FOREST_FLIGHT_TREEHOUSE
        );
        assert_eq!(reclassify_variant("Treehouse Options"), "Treehouse Options");
        assert_eq!(reclassify_variant("Tree Tops Zipline Tour"), "Tree Tops Zipline Tour");
    }

    #[test]
    fn test_overnight_stay_rule() {
        assert!(is_overnight_stay("Treehouse Adventures - 1 Night"));
        assert!(!is_overnight_stay("Treehouse Adventures + Zipline Tour"));
        assert!(!is_overnight_stay("Forest Flight Zipline Tour"));
    }

    #[test]
    fn test_longest_name_wins_regardless_of_order() {
        let json = r##"{
            "tourTypes": {
                "Zipline": { "course": "A", "roles": ["Lead Guide"], "durationHoursPerTour": 1.0,
                             "maxToursPerGuidePerShift": 3, "isNightTour": false, "colorHint": "#000" },
                "Night Zipline": { "course": "B", "roles": ["Lead Guide"], "durationHoursPerTour": 1.0,
                                   "maxToursPerGuidePerShift": 3, "isNightTour": true, "colorHint": "#111" }
            }
        }"##;
        let taxonomy = Taxonomy::from_json(json).unwrap();
        assert_eq!(taxonomy.classify("Late Night Zipline"), Some("Night Zipline"));
        assert_eq!(taxonomy.classify("Day Zipline"), Some("Zipline"));
        assert_eq!(*taxonomy.rules(), SynthesisRules::default());
    }

    #[test]
    fn test_rejects_bad_tables() {
        let too_many_roles = r#"{ "tourTypes": { "X": { "course": "C", "roles": ["a", "b", "c"],
            "durationHoursPerTour": 1.0, "maxToursPerGuidePerShift": 1 } } }"#;
        assert!(matches!(Taxonomy::from_json(too_many_roles), Err(ImportError::Config(_))));

        let orphan_variant = r#"{ "tourTypes": { "X": { "variantOf": "Y" } } }"#;
        assert!(matches!(Taxonomy::from_json(orphan_variant), Err(ImportError::Config(_))));

        let zero_duration = r#"{ "tourTypes": { "X": { "course": "C", "roles": ["a"],
            "durationHoursPerTour": 0.0, "maxToursPerGuidePerShift": 1 } } }"#;
        assert!(matches!(Taxonomy::from_json(zero_duration), Err(ImportError::Config(_))));

        assert!(matches!(Taxonomy::from_json("not json"), Err(ImportError::Json(_))));
    }
}
