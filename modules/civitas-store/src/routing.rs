use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use civitas_common::ComplaintCategory;

/// Routes within one category: specific sub-types plus a fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRoutes {
    pub by_sub_type: HashMap<String, String>,
    pub default: String,
}

/// The category/sub-type → assignee routing table. An immutable
/// configuration value handed to [`AssignmentRouter`] at construction;
/// nothing mutates it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingTable {
    pub routes: HashMap<ComplaintCategory, CategoryRoutes>,
    /// Used when the category itself has no routes.
    pub fallback: String,
}

impl Default for RoutingTable {
    fn default() -> Self {
        fn routes(pairs: &[(&str, &str)], default: &str) -> CategoryRoutes {
            CategoryRoutes {
                by_sub_type: pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                default: default.to_string(),
            }
        }

        let mut table = HashMap::new();
        table.insert(
            ComplaintCategory::SanitationWaste,
            routes(
                &[
                    ("Garbage Overflow", "dept-sanitation"),
                    ("Missed Waste Pickup", "dept-sanitation"),
                ],
                "dept-sanitation",
            ),
        );
        table.insert(
            ComplaintCategory::DrainageWater,
            routes(
                &[
                    ("Drainage Overflow", "dept-drainage"),
                    ("Waterlogging / Flooded Street", "dept-drainage"),
                ],
                "dept-drainage",
            ),
        );
        table.insert(
            ComplaintCategory::ElectricalLighting,
            routes(
                &[
                    ("Streetlight Not Working", "dept-electrical"),
                    ("Streetlight Always ON", "dept-electrical"),
                ],
                "dept-electrical",
            ),
        );
        table.insert(
            ComplaintCategory::RoadInfrastructure,
            routes(
                &[
                    ("Pothole / Damaged Road", "dept-roads"),
                    ("Tree Fallen / Road Obstruction", "dept-roads"),
                ],
                "dept-roads",
            ),
        );
        table.insert(
            ComplaintCategory::AnimalSafety,
            routes(
                &[
                    ("Stray Dog Issue", "animal-control"),
                    ("Cattle Blocking Road", "animal-control"),
                ],
                "animal-control",
            ),
        );
        table.insert(
            ComplaintCategory::PublicSafety,
            routes(
                &[
                    ("Noise Complaint", "dept-police"),
                    // Footpath/manhole hazards go to the roads department
                    // even though they arrive under Public Safety.
                    ("Broken Footpath / Open Manhole", "dept-roads"),
                ],
                "public-safety-general",
            ),
        );

        Self {
            routes: table,
            fallback: "city-admin".to_string(),
        }
    }
}

/// Suggests a responsible party for a (category, sub-type) pair. Pure
/// lookup, always produces a value; the suggestion is advisory — only the
/// administrator assign action writes `assigned_to`.
#[derive(Debug, Clone)]
pub struct AssignmentRouter {
    table: RoutingTable,
}

impl AssignmentRouter {
    pub fn new(table: RoutingTable) -> Self {
        Self { table }
    }

    pub fn suggest(&self, category: ComplaintCategory, sub_type: &str) -> &str {
        match self.table.routes.get(&category) {
            Some(routes) => routes
                .by_sub_type
                .get(sub_type)
                .map(String::as_str)
                .unwrap_or(&routes.default),
            None => &self.table.fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> AssignmentRouter {
        AssignmentRouter::new(RoutingTable::default())
    }

    #[test]
    fn known_sub_type_routes_directly() {
        assert_eq!(
            router().suggest(ComplaintCategory::RoadInfrastructure, "Pothole / Damaged Road"),
            "dept-roads"
        );
    }

    #[test]
    fn unknown_sub_type_falls_back_to_category_default() {
        assert_eq!(
            router().suggest(ComplaintCategory::SanitationWaste, "Dead Leaves Everywhere"),
            "dept-sanitation"
        );
    }

    #[test]
    fn missing_category_falls_back_globally() {
        let table = RoutingTable {
            routes: HashMap::new(),
            fallback: "city-admin".to_string(),
        };
        let router = AssignmentRouter::new(table);
        assert_eq!(
            router.suggest(ComplaintCategory::PublicSafety, "Noise Complaint"),
            "city-admin"
        );
    }

    #[test]
    fn footpath_hazard_cross_routes_to_roads() {
        assert_eq!(
            router().suggest(ComplaintCategory::PublicSafety, "Broken Footpath / Open Manhole"),
            "dept-roads"
        );
    }

    #[test]
    fn table_round_trips_through_json() {
        let table = RoutingTable::default();
        let json = serde_json::to_string(&table).unwrap();
        let back: RoutingTable = serde_json::from_str(&json).unwrap();
        let router = AssignmentRouter::new(back);
        assert_eq!(
            router.suggest(ComplaintCategory::AnimalSafety, "Stray Dog Issue"),
            "animal-control"
        );
    }
}
