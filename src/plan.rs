// ==============================================================================
// plan.rs - Overwrite Plan Selection
// ==============================================================================
// Description: Ordered pass/scrub/unlink steps chosen per storage medium
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Plans:
//   disabled          : unlink
//   SSD               : random(len) -> unlink
//   HDD / Unknown     : random(len) -> scrub(len * growth) -> zeros(len * growth) -> unlink
// ==============================================================================

use crate::models::StorageMedium;
use crate::overwrite::FillStrategy;

pub const DEFAULT_GROWTH_FACTOR: u64 = 3;

/// One step of an overwrite plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    Overwrite { length: u64, fill: FillStrategy },
    Scrub { new_length: u64 },
    Unlink,
}

/// Knobs that shape plan selection
#[derive(Debug, Clone, Copy)]
pub struct PlanOptions {
    /// When false, only unlink is scheduled
    pub secure: bool,
    /// Include the metadata scrub on rotating media
    pub change_metadata: bool,
    /// Length multiplier applied by the scrub step
    pub growth_factor: u64,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            secure: true,
            change_metadata: true,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

/// Ordered steps applied to one deletion target. Always ends in `Unlink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverwritePlan {
    steps: Vec<PlanStep>,
}

impl OverwritePlan {
    pub fn for_target(medium: StorageMedium, length: u64, options: &PlanOptions) -> Self {
        let mut steps = Vec::new();

        if options.secure {
            steps.push(PlanStep::Overwrite {
                length,
                fill: FillStrategy::RandomBytes,
            });

            if medium.is_conservative() {
                let final_length = if options.change_metadata {
                    let grown = length.saturating_mul(options.growth_factor.max(1));
                    steps.push(PlanStep::Scrub { new_length: grown });
                    grown
                } else {
                    length
                };

                steps.push(PlanStep::Overwrite {
                    length: final_length,
                    fill: FillStrategy::zeros(),
                });
            }
        }

        steps.push(PlanStep::Unlink);
        Self { steps }
    }

    /// Plan for a symbolic link: the link itself is removed, nothing else
    pub fn unlink_only() -> Self {
        Self {
            steps: vec![PlanStep::Unlink],
        }
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn overwrite_passes(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, PlanStep::Overwrite { .. }))
            .count()
    }

    pub fn has_scrub(&self) -> bool {
        self.steps.iter().any(|s| matches!(s, PlanStep::Scrub { .. }))
    }

    /// Short description for logs, e.g. "random(1000) > scrub(3000) > fixed-pattern(3000) > unlink"
    pub fn describe(&self) -> String {
        self.steps
            .iter()
            .map(|step| match step {
                PlanStep::Overwrite { length, fill } => format!("{}({})", fill.name(), length),
                PlanStep::Scrub { new_length } => format!("scrub({})", new_length),
                PlanStep::Unlink => "unlink".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_state_plan() {
        let plan = OverwritePlan::for_target(StorageMedium::SolidState, 1000, &PlanOptions::default());

        assert_eq!(plan.overwrite_passes(), 1);
        assert!(!plan.has_scrub());
        assert_eq!(
            plan.steps(),
            &[
                PlanStep::Overwrite {
                    length: 1000,
                    fill: FillStrategy::RandomBytes
                },
                PlanStep::Unlink
            ]
        );
    }

    #[test]
    fn test_rotating_plan_triples_length() {
        let plan = OverwritePlan::for_target(StorageMedium::Rotating, 1000, &PlanOptions::default());

        assert_eq!(plan.overwrite_passes(), 2);
        assert_eq!(
            plan.steps(),
            &[
                PlanStep::Overwrite {
                    length: 1000,
                    fill: FillStrategy::RandomBytes
                },
                PlanStep::Scrub { new_length: 3000 },
                PlanStep::Overwrite {
                    length: 3000,
                    fill: FillStrategy::zeros()
                },
                PlanStep::Unlink
            ]
        );
    }

    #[test]
    fn test_unknown_follows_rotating() {
        let options = PlanOptions::default();
        assert_eq!(
            OverwritePlan::for_target(StorageMedium::Unknown, 42, &options),
            OverwritePlan::for_target(StorageMedium::Rotating, 42, &options)
        );
    }

    #[test]
    fn test_growth_factor_is_configurable() {
        let options = PlanOptions {
            growth_factor: 5,
            ..PlanOptions::default()
        };
        let plan = OverwritePlan::for_target(StorageMedium::Rotating, 10, &options);
        assert!(plan.steps().contains(&PlanStep::Scrub { new_length: 50 }));
    }

    #[test]
    fn test_without_metadata_change() {
        let options = PlanOptions {
            change_metadata: false,
            ..PlanOptions::default()
        };
        let plan = OverwritePlan::for_target(StorageMedium::Rotating, 10, &options);
        assert_eq!(plan.overwrite_passes(), 2);
        assert!(!plan.has_scrub());
        assert_eq!(plan.describe(), "random(10) > fixed-pattern(10) > unlink");
    }

    #[test]
    fn test_disabled_plan_only_unlinks() {
        let options = PlanOptions {
            secure: false,
            ..PlanOptions::default()
        };
        for medium in [StorageMedium::SolidState, StorageMedium::Rotating] {
            let plan = OverwritePlan::for_target(medium, 1000, &options);
            assert_eq!(plan.overwrite_passes(), 0);
            assert_eq!(plan.steps(), &[PlanStep::Unlink]);
        }
    }

    #[test]
    fn test_every_plan_ends_with_unlink() {
        for medium in [StorageMedium::SolidState, StorageMedium::Rotating, StorageMedium::Unknown] {
            let plan = OverwritePlan::for_target(medium, 0, &PlanOptions::default());
            assert_eq!(plan.steps().last(), Some(&PlanStep::Unlink));
        }
        assert_eq!(OverwritePlan::unlink_only().steps(), &[PlanStep::Unlink]);
    }
}
