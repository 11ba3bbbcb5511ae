use crate::planning::types::{Complexity, QueryEntity};

const GENERIC_SECS: u64 = 60;

fn technology_factor(entities: &QueryEntity) -> f64 {
    (0.5 * entities.technologies.len() as f64).max(1.0)
}

fn scaled(base: u64, complexity: Complexity) -> u64 {
    base * complexity.multiplier()
}

pub(crate) fn implementation_secs(complexity: Complexity, entities: &QueryEntity) -> u64 {
    (scaled(300, complexity) as f64 * technology_factor(entities)).round() as u64
}

pub(crate) fn planning_secs(complexity: Complexity) -> u64 {
    scaled(120, complexity)
}

pub(crate) fn testing_secs(complexity: Complexity, entities: &QueryEntity) -> u64 {
    scaled(180, complexity) + 30 * entities.files.len() as u64
}

pub(crate) fn validation_secs(complexity: Complexity) -> u64 {
    scaled(120, complexity)
}

pub(crate) fn deployment_secs(complexity: Complexity) -> u64 {
    scaled(240, complexity)
}

pub(crate) fn analysis_secs(complexity: Complexity, entities: &QueryEntity) -> u64 {
    let mentions = (entities.files.len() + entities.concepts.len()) as u64;
    scaled(120, complexity) + 30 * mentions
}

pub(crate) fn optimization_secs(complexity: Complexity, entities: &QueryEntity) -> u64 {
    (scaled(240, complexity) as f64 * technology_factor(entities)).round() as u64
}

/// Shared by modification and bugfix steps
pub(crate) fn modification_secs(complexity: Complexity, entities: &QueryEntity) -> u64 {
    scaled(150, complexity) + 60 * entities.files.len() as u64
}

pub(crate) fn generic_secs() -> u64 {
    GENERIC_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(files: &[&str], technologies: &[&str], concepts: &[&str]) -> QueryEntity {
        QueryEntity {
            files: files.iter().map(|s| s.to_string()).collect(),
            technologies: technologies.iter().map(|s| s.to_string()).collect(),
            concepts: concepts.iter().map(|s| s.to_string()).collect(),
            patterns: Default::default(),
        }
    }

    #[test]
    fn test_implementation_scales_with_technologies() {
        let none = QueryEntity::default();
        assert_eq!(implementation_secs(Complexity::Low, &none), 300);
        assert_eq!(implementation_secs(Complexity::High, &none), 1200);

        // One technology keeps the floor of 1.0
        let one = entities(&[], &["react"], &[]);
        assert_eq!(implementation_secs(Complexity::Low, &one), 300);

        let three = entities(&[], &["react", "redis", "docker"], &[]);
        assert_eq!(implementation_secs(Complexity::Medium, &three), 900);
    }

    #[test]
    fn test_file_and_concept_terms() {
        let e = entities(&["a.ts", "b.ts"], &[], &["login"]);
        assert_eq!(testing_secs(Complexity::Low, &e), 240);
        assert_eq!(analysis_secs(Complexity::Medium, &e), 330);
        assert_eq!(modification_secs(Complexity::Low, &e), 270);
    }

    #[test]
    fn test_fixed_estimates() {
        assert_eq!(planning_secs(Complexity::Medium), 240);
        assert_eq!(validation_secs(Complexity::Low), 120);
        assert_eq!(deployment_secs(Complexity::High), 960);
        assert_eq!(optimization_secs(Complexity::Low, &QueryEntity::default()), 240);
        assert_eq!(generic_secs(), 60);
    }
}
