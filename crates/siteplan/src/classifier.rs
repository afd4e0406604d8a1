//! Process classification: the validation boundary between raw definitions
//! and the placement engine.
//!
//! [`ProcessClassifier`] splits the configured spaces into the ordered main
//! chain, free sub units and fixed-position spaces, resolves adjacency keys
//! and hazard tags, and rejects anything malformed with a [`ConfigError`].
//! Components downstream only ever see the resulting [`Problem`].

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::Serialize;

use siteplan_core::{
    adjacency::{AdjacencyTable, AdjacencyWeight, SlpWeight},
    geometry::{Bounds, Point, Size},
    hazard::{HazardMap, HazardTag},
    identifier::SpaceId,
    site::{BuildingType, FixedZone, Site, Space},
};

use crate::{
    definition::{AdjacencyDefinition, SiteDefinition},
    error::ConfigError,
};

/// Spaces partitioned by role.
#[derive(Debug, Clone)]
pub struct ClassifiedSpaces {
    site: Site,
    mains: Vec<Space>,
    subs: Vec<Space>,
    fixed: Vec<Space>,
}

impl ClassifiedSpaces {
    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Main units sorted by sequence index.
    pub fn mains(&self) -> &[Space] {
        &self.mains
    }

    pub fn subs(&self) -> &[Space] {
        &self.subs
    }

    /// Fixed-type spaces at their configured positions.
    pub fn fixed(&self) -> &[Space] {
        &self.fixed
    }

    pub fn get(&self, id: SpaceId) -> Option<&Space> {
        self.mains
            .iter()
            .chain(&self.subs)
            .chain(&self.fixed)
            .find(|space| space.id() == id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Space> {
        self.mains.iter().chain(&self.subs).chain(&self.fixed)
    }
}

/// A validated optimization problem.
#[derive(Debug, Clone)]
pub struct Problem {
    spaces: ClassifiedSpaces,
    adjacency: AdjacencyTable,
    fixed_zones: Vec<FixedZone>,
    hazards: HazardMap,
}

impl Problem {
    pub fn new(
        spaces: ClassifiedSpaces,
        adjacency: AdjacencyTable,
        fixed_zones: Vec<FixedZone>,
        hazards: HazardMap,
    ) -> Self {
        Self {
            spaces,
            adjacency,
            fixed_zones,
            hazards,
        }
    }

    pub fn spaces(&self) -> &ClassifiedSpaces {
        &self.spaces
    }

    pub fn site(&self) -> &Site {
        self.spaces.site()
    }

    pub fn adjacency(&self) -> &AdjacencyTable {
        &self.adjacency
    }

    pub fn fixed_zones(&self) -> &[FixedZone] {
        &self.fixed_zones
    }

    pub fn hazards(&self) -> &HazardMap {
        &self.hazards
    }

    /// Descriptive statistics about the problem.
    pub fn summary(&self) -> ProblemSummary {
        let total_area: f32 = self.spaces.all().map(|space| space.size().area()).sum();
        let site_area = self.site().area();
        ProblemSummary {
            main_flow: self.spaces.mains().iter().map(Space::display_name).collect(),
            main_count: self.spaces.mains().len(),
            sub_count: self.spaces.subs().len(),
            fixed_count: self.spaces.fixed().len(),
            zone_count: self.fixed_zones.len(),
            adjacency_pairs: self.adjacency.len(),
            hazardous_units: self
                .spaces
                .all()
                .filter(|space| self.hazards.is_hazardous(space.id()))
                .count(),
            total_area,
            site_area,
            area_ratio: if site_area > 0.0 { total_area / site_area } else { 0.0 },
        }
    }
}

/// Counts and areas describing a [`Problem`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemSummary {
    pub main_flow: Vec<String>,
    pub main_count: usize,
    pub sub_count: usize,
    pub fixed_count: usize,
    pub zone_count: usize,
    pub adjacency_pairs: usize,
    pub hazardous_units: usize,
    pub total_area: f32,
    pub site_area: f32,
    pub area_ratio: f32,
}

impl ProblemSummary {
    /// Main flow rendered as `A → B → C`.
    pub fn flow_string(&self) -> String {
        self.main_flow.join(" → ")
    }
}

/// Classifies a raw [`SiteDefinition`] into a [`Problem`].
///
/// # Examples
///
/// ```
/// use siteplan::classifier::ProcessClassifier;
/// use siteplan::definition::{SiteDefinition, SpaceDefinition};
///
/// let definition = SiteDefinition::new(30.0, 20.0)
///     .with_space("B", SpaceDefinition::main(4.0, 3.0, 2))
///     .with_space("A", SpaceDefinition::main(4.0, 3.0, 1))
///     .with_space("W", SpaceDefinition::sub(2.0, 2.0));
///
/// let problem = ProcessClassifier::new(&definition).classify().unwrap();
/// let order: Vec<String> = problem.spaces().mains().iter().map(|s| s.id().to_string()).collect();
/// assert_eq!(order, vec!["A", "B"]);
/// assert_eq!(problem.spaces().subs().len(), 1);
/// ```
pub struct ProcessClassifier<'a> {
    definition: &'a SiteDefinition,
}

impl<'a> ProcessClassifier<'a> {
    pub fn new(definition: &'a SiteDefinition) -> Self {
        Self { definition }
    }

    /// Validates the definition and builds the [`Problem`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for missing or non-positive dimensions, unknown
    /// building types, main units without a sequence index, duplicated or
    /// non-contiguous sequence indices, fixed spaces without a position,
    /// malformed adjacency entries, or hazard tags for unknown spaces.
    pub fn classify(&self) -> Result<Problem, ConfigError> {
        let site = self.site()?;
        let (mut mains, subs, fixed) = self.partition()?;

        if mains.is_empty() {
            return Err(ConfigError::NoMainUnits);
        }
        mains.sort_by_key(|space| space.sequence_index());
        check_sequence(&mains)?;

        let spaces = ClassifiedSpaces {
            site,
            mains,
            subs,
            fixed,
        };
        let adjacency = self.adjacency(&spaces)?;
        let fixed_zones = self.fixed_zones()?;
        let hazards = self.hazards(&spaces)?;

        let problem = Problem::new(spaces, adjacency, fixed_zones, hazards);
        let summary = problem.summary();
        if summary.area_ratio > 1.0 {
            warn!(
                total_area = summary.total_area,
                site_area = summary.site_area;
                "Configured units need more area than the site provides"
            );
        }
        info!(
            mains = summary.main_count,
            subs = summary.sub_count,
            fixed = summary.fixed_count,
            zones = summary.zone_count,
            adjacency_pairs = summary.adjacency_pairs;
            "Spaces classified"
        );
        debug!(flow = summary.flow_string(); "Main process flow");

        Ok(problem)
    }

    fn site(&self) -> Result<Site, ConfigError> {
        let (width, height) = self
            .definition
            .site_dimensions()
            .ok_or_else(|| ConfigError::Validation("site dimensions are missing".to_string()))?;
        if !Size::new(width, height).is_positive() {
            return Err(ConfigError::NonPositiveDimensions {
                subject: "site".to_string(),
                width,
                height,
            });
        }
        Ok(Site::new(width, height))
    }

    fn partition(&self) -> Result<(Vec<Space>, Vec<Space>, Vec<Space>), ConfigError> {
        let entries = self.definition.spaces.entries();
        if entries.is_empty() {
            return Err(ConfigError::NoSpaces);
        }

        let mut seen = HashSet::new();
        let (mut mains, mut subs, mut fixed) = (Vec::new(), Vec::new(), Vec::new());

        for (id, raw) in entries {
            if !seen.insert(id.clone()) {
                return Err(ConfigError::DuplicateSpace(id));
            }

            let size = Size::new(raw.width, raw.height);
            if !size.is_positive() {
                return Err(ConfigError::NonPositiveDimensions {
                    subject: format!("space `{id}`"),
                    width: raw.width,
                    height: raw.height,
                });
            }

            let building_type: BuildingType = raw
                .building_type
                .as_deref()
                .ok_or_else(|| ConfigError::Validation(format!("space `{id}` has no building_type")))?
                .parse()
                .map_err(|source| ConfigError::Model {
                    id: id.clone(),
                    source,
                })?;

            let hazards = raw
                .hazard_factors
                .iter()
                .filter_map(|tag| tag.parse::<HazardTag>().ok())
                .collect();

            let mut space = Space::new(SpaceId::new(&id), size, building_type).with_hazards(hazards);
            if let Some(name) = &raw.name {
                space = space.with_name(name.clone());
            }

            match building_type {
                BuildingType::Main => {
                    let index = raw
                        .main_process_sequence
                        .ok_or_else(|| ConfigError::MissingSequence(id.clone()))?;
                    mains.push(space.with_sequence_index(index));
                }
                BuildingType::Sub => {
                    if raw.main_process_sequence.is_some() {
                        debug!(space = id; "Ignoring sequence index on sub unit");
                    }
                    subs.push(space);
                }
                BuildingType::Fixed => {
                    let (Some(x), Some(y)) = (raw.x, raw.y) else {
                        return Err(ConfigError::MissingPosition(id));
                    };
                    fixed.push(space.with_position(Point::new(x, y)));
                }
            }
        }

        Ok((mains, subs, fixed))
    }

    fn adjacency(&self, spaces: &ClassifiedSpaces) -> Result<AdjacencyTable, ConfigError> {
        let mut table = AdjacencyTable::new();
        for (key, raw) in &self.definition.adjacency_weights {
            let (first, second) = split_pair_key(key, spaces)?;
            table.insert(first, second, adjacency_weight(key, raw)?);
        }
        Ok(table)
    }

    fn fixed_zones(&self) -> Result<Vec<FixedZone>, ConfigError> {
        self.definition
            .fixed_zones
            .iter()
            .map(|raw| {
                let size = Size::new(raw.width, raw.height);
                if !size.is_positive() {
                    return Err(ConfigError::NonPositiveDimensions {
                        subject: format!("fixed zone `{}`", raw.id),
                        width: raw.width,
                        height: raw.height,
                    });
                }
                let bounds = Bounds::new_from_top_left(Point::new(raw.x, raw.y), size);
                let mut zone = FixedZone::new(SpaceId::new(&raw.id), bounds);
                if let Some(name) = &raw.name {
                    zone = zone.with_name(name.clone());
                }
                if let Some(access) = raw.access {
                    zone = zone.with_access(access);
                }
                Ok(zone)
            })
            .collect()
    }

    fn hazards(&self, spaces: &ClassifiedSpaces) -> Result<HazardMap, ConfigError> {
        let mut hazards = HazardMap::new();
        for space in spaces.all() {
            if !space.hazards().is_empty() {
                hazards.add(space.id(), space.hazards().iter().cloned());
            }
        }
        for (id, tags) in &self.definition.hazard_factors {
            let space_id = SpaceId::new(id);
            if spaces.get(space_id).is_none() {
                return Err(ConfigError::UnknownHazardSpace(id.clone()));
            }
            hazards.add(
                space_id,
                tags.iter().filter_map(|tag| tag.parse::<HazardTag>().ok()),
            );
        }
        Ok(hazards)
    }
}

/// Requires sorted main units to carry exactly the indices 1..=N.
fn check_sequence(mains: &[Space]) -> Result<(), ConfigError> {
    for pair in mains.windows(2) {
        if pair[0].sequence_index() == pair[1].sequence_index() {
            return Err(ConfigError::DuplicateSequence {
                index: pair[0].sequence_index().unwrap_or_default(),
                first: pair[0].id().to_string(),
                second: pair[1].id().to_string(),
            });
        }
    }

    let found: Vec<u32> = mains.iter().filter_map(Space::sequence_index).collect();
    let expected = mains.len() as u32;
    if !found.iter().copied().eq(1..=expected) {
        return Err(ConfigError::NonContiguousSequence { expected, found });
    }
    Ok(())
}

/// Splits `"<id>-<id>"` at the hyphen that separates two known spaces, so ids
/// may contain hyphens themselves.
fn split_pair_key(key: &str, spaces: &ClassifiedSpaces) -> Result<(SpaceId, SpaceId), ConfigError> {
    let known = |name: &str| spaces.get(SpaceId::new(name)).is_some();

    let splits: Vec<(&str, &str)> = key
        .match_indices('-')
        .map(|(idx, _)| (&key[..idx], &key[idx + 1..]))
        .filter(|(first, second)| !first.is_empty() && !second.is_empty())
        .collect();

    if splits.is_empty() {
        return Err(ConfigError::MalformedAdjacencyKey(key.to_string()));
    }

    if let Some((first, second)) = splits
        .iter()
        .find(|(first, second)| known(first) && known(second))
    {
        if first == second {
            return Err(ConfigError::SelfAdjacency(key.to_string()));
        }
        return Ok((SpaceId::new(first), SpaceId::new(second)));
    }

    let (first, second) = splits[0];
    let unknown = if known(first) { second } else { first };
    Err(ConfigError::UnknownAdjacencySpace {
        key: key.to_string(),
        id: unknown.to_string(),
    })
}

fn adjacency_weight(key: &str, raw: &AdjacencyDefinition) -> Result<AdjacencyWeight, ConfigError> {
    let weight = SlpWeight::try_from(raw.weight).map_err(|source| ConfigError::Model {
        id: key.to_string(),
        source,
    })?;
    if !(raw.preferred_gap.is_finite() && raw.preferred_gap >= 0.0) {
        return Err(ConfigError::NegativeGap {
            key: key.to_string(),
            gap: raw.preferred_gap,
        });
    }
    Ok(AdjacencyWeight::new(weight, raw.preferred_gap))
}

/// Classifies a definition. Shorthand for [`ProcessClassifier::classify`].
///
/// # Errors
///
/// See [`ProcessClassifier::classify`].
pub fn classify(definition: &SiteDefinition) -> Result<Problem, ConfigError> {
    ProcessClassifier::new(definition).classify()
}

#[cfg(test)]
mod tests {
    use siteplan_core::ModelError;

    use super::*;
    use crate::definition::{FixedZoneDefinition, SpaceDefinition};

    fn three_mains() -> SiteDefinition {
        SiteDefinition::new(30.0, 20.0)
            .with_space("A", SpaceDefinition::main(4.0, 3.0, 1))
            .with_space("B", SpaceDefinition::main(4.0, 3.0, 2))
            .with_space("C", SpaceDefinition::main(4.0, 3.0, 3))
    }

    #[test]
    fn test_classify_orders_mains() {
        let definition = SiteDefinition::new(30.0, 20.0)
            .with_space("C", SpaceDefinition::main(4.0, 3.0, 3))
            .with_space("A", SpaceDefinition::main(4.0, 3.0, 1))
            .with_space("B", SpaceDefinition::main(4.0, 3.0, 2));

        let problem = classify(&definition).unwrap();
        let order: Vec<String> = problem
            .spaces()
            .mains()
            .iter()
            .map(|space| space.id().to_string())
            .collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_non_contiguous_sequence() {
        let definition = SiteDefinition::new(30.0, 20.0)
            .with_space("A", SpaceDefinition::main(4.0, 3.0, 1))
            .with_space("B", SpaceDefinition::main(4.0, 3.0, 3));

        assert_eq!(
            classify(&definition).unwrap_err(),
            ConfigError::NonContiguousSequence {
                expected: 2,
                found: vec![1, 3]
            }
        );
    }

    #[test]
    fn test_sequence_must_start_at_one() {
        let definition = SiteDefinition::new(30.0, 20.0)
            .with_space("A", SpaceDefinition::main(4.0, 3.0, 2))
            .with_space("B", SpaceDefinition::main(4.0, 3.0, 3));

        assert!(matches!(
            classify(&definition),
            Err(ConfigError::NonContiguousSequence { .. })
        ));
    }

    #[test]
    fn test_duplicate_sequence() {
        let definition = SiteDefinition::new(30.0, 20.0)
            .with_space("A", SpaceDefinition::main(4.0, 3.0, 1))
            .with_space("B", SpaceDefinition::main(4.0, 3.0, 1));

        assert!(matches!(
            classify(&definition),
            Err(ConfigError::DuplicateSequence { index: 1, .. })
        ));
    }

    #[test]
    fn test_missing_sequence() {
        let mut main = SpaceDefinition::main(4.0, 3.0, 1);
        main.main_process_sequence = None;
        let definition = SiteDefinition::new(30.0, 20.0).with_space("A", main);

        assert_eq!(
            classify(&definition).unwrap_err(),
            ConfigError::MissingSequence("A".to_string())
        );
    }

    #[test]
    fn test_no_spaces() {
        let definition = SiteDefinition::new(30.0, 20.0);
        assert_eq!(classify(&definition).unwrap_err(), ConfigError::NoSpaces);
    }

    #[test]
    fn test_no_main_units() {
        let definition =
            SiteDefinition::new(30.0, 20.0).with_space("W", SpaceDefinition::sub(2.0, 2.0));
        assert_eq!(classify(&definition).unwrap_err(), ConfigError::NoMainUnits);
    }

    #[test]
    fn test_duplicate_space() {
        let definition = three_mains().with_space("A", SpaceDefinition::sub(1.0, 1.0));
        assert_eq!(
            classify(&definition).unwrap_err(),
            ConfigError::DuplicateSpace("A".to_string())
        );
    }

    #[test]
    fn test_non_positive_dimensions() {
        let definition = SiteDefinition::new(30.0, 0.0)
            .with_space("A", SpaceDefinition::main(4.0, 3.0, 1));
        assert!(matches!(
            classify(&definition),
            Err(ConfigError::NonPositiveDimensions { .. })
        ));

        let definition = SiteDefinition::new(30.0, 20.0)
            .with_space("A", SpaceDefinition::main(-4.0, 3.0, 1));
        assert!(matches!(
            classify(&definition),
            Err(ConfigError::NonPositiveDimensions { .. })
        ));
    }

    #[test]
    fn test_oversized_unit_is_accepted() {
        let definition = SiteDefinition::new(10.0, 10.0)
            .with_space("A", SpaceDefinition::main(40.0, 3.0, 1));
        assert!(classify(&definition).is_ok());
    }

    #[test]
    fn test_unknown_building_type() {
        let mut space = SpaceDefinition::sub(2.0, 2.0);
        space.building_type = Some("office".to_string());
        let definition = three_mains().with_space("X", space);

        assert_eq!(
            classify(&definition).unwrap_err(),
            ConfigError::Model {
                id: "X".to_string(),
                source: ModelError::UnknownBuildingType("office".to_string())
            }
        );
    }

    #[test]
    fn test_fixed_space_requires_position() {
        let mut fixed = SpaceDefinition::fixed(2.0, 2.0, 0.0, 0.0);
        fixed.y = None;
        let definition = three_mains().with_space("G", fixed);

        assert_eq!(
            classify(&definition).unwrap_err(),
            ConfigError::MissingPosition("G".to_string())
        );
    }

    #[test]
    fn test_adjacency_resolution() {
        let definition = SiteDefinition::new(30.0, 20.0)
            .with_space("line-1", SpaceDefinition::main(4.0, 3.0, 1))
            .with_space("B", SpaceDefinition::main(4.0, 3.0, 2))
            .with_adjacency("line-1", "B", 10, 0.0);

        let problem = classify(&definition).unwrap();
        let weight = problem
            .adjacency()
            .get(SpaceId::new("B"), SpaceId::new("line-1"))
            .unwrap();
        assert_eq!(weight.weight().value(), 10);
        assert_eq!(weight.preferred_gap(), 0.0);
    }

    #[test]
    fn test_adjacency_errors() {
        let unknown = three_mains().with_adjacency("A", "Z", 4, 0.0);
        assert_eq!(
            classify(&unknown).unwrap_err(),
            ConfigError::UnknownAdjacencySpace {
                key: "A-Z".to_string(),
                id: "Z".to_string()
            }
        );

        let self_pair = three_mains().with_adjacency("A", "A", 4, 0.0);
        assert_eq!(
            classify(&self_pair).unwrap_err(),
            ConfigError::SelfAdjacency("A-A".to_string())
        );

        let bad_weight = three_mains().with_adjacency("A", "B", 5, 0.0);
        assert!(matches!(
            classify(&bad_weight),
            Err(ConfigError::Model {
                source: ModelError::InvalidWeight(5),
                ..
            })
        ));

        let bad_gap = three_mains().with_adjacency("A", "B", 4, -1.0);
        assert!(matches!(
            classify(&bad_gap),
            Err(ConfigError::NegativeGap { .. })
        ));
    }

    #[test]
    fn test_malformed_adjacency_key() {
        let mut definition = three_mains();
        definition.adjacency_weights.insert(
            "AB".to_string(),
            AdjacencyDefinition {
                weight: 4,
                preferred_gap: 0.0,
            },
        );
        assert_eq!(
            classify(&definition).unwrap_err(),
            ConfigError::MalformedAdjacencyKey("AB".to_string())
        );
    }

    #[test]
    fn test_hazards_merged() {
        let definition = three_mains()
            .with_space("W", SpaceDefinition::sub(2.0, 2.0).with_hazards(&["fire"]))
            .with_hazards("W", &["폭발"])
            .with_hazards("A", &["toxic"]);

        let problem = classify(&definition).unwrap();
        assert_eq!(
            problem.hazards().tags(SpaceId::new("W")),
            &[HazardTag::Fire, HazardTag::Explosion]
        );
        assert_eq!(problem.summary().hazardous_units, 2);

        let unknown = three_mains().with_hazards("Q", &["fire"]);
        assert_eq!(
            classify(&unknown).unwrap_err(),
            ConfigError::UnknownHazardSpace("Q".to_string())
        );
    }

    #[test]
    fn test_fixed_zones() {
        let definition = three_mains()
            .with_fixed_zone(FixedZoneDefinition::new("R", 0.0, 18.0, 30.0, 2.0).with_name("Road"))
            .with_fixed_zone(FixedZoneDefinition::new("P", 0.0, 0.0, 5.0, 5.0).with_name("Parking"))
            .with_fixed_zone(FixedZoneDefinition::new("E", 25.0, 0.0, 5.0, 5.0).with_access(true));

        let problem = classify(&definition).unwrap();
        let access: Vec<bool> = problem.fixed_zones().iter().map(FixedZone::is_access).collect();
        assert_eq!(access, vec![true, false, true]);
    }

    #[test]
    fn test_summary() {
        let definition = three_mains()
            .with_space("W", SpaceDefinition::sub(2.0, 2.0))
            .with_adjacency("A", "B", 10, 0.0);
        let summary = classify(&definition).unwrap().summary();

        assert_eq!(summary.main_count, 3);
        assert_eq!(summary.sub_count, 1);
        assert_eq!(summary.adjacency_pairs, 1);
        assert_eq!(summary.total_area, 40.0);
        assert_eq!(summary.site_area, 600.0);
        assert_eq!(summary.flow_string(), "A → B → C");
    }
}
