//! Workloads command - lists the built-in workloads.

use strum::IntoEnumIterator as _;
use workloads::WorkloadName;

/// One line per workload: `name  db.collection`.
#[must_use]
pub fn listing() -> Vec<String> {
    WorkloadName::iter()
        .map(|name| {
            let (db, collection) = name.default_namespace();
            format!("{name:<10} {db}.{collection}")
        })
        .collect()
}

pub fn run() {
    for line in listing() {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_contains_every_workload() {
        let lines = listing();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().any(|l| l.starts_with("test") && l.ends_with("ember2018.ember_test")));
        assert!(lines.iter().any(|l| l.ends_with("linkbench.linktable")));
    }
}
