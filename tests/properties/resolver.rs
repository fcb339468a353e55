//! Property tests for dependency resolution ordering.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;

use proptest::prelude::*;

use simpack::{resolve_dependencies, PackageDescriptor, SimpackResult, VcsQuery};

struct RecordingVcs {
    calls: RefCell<Vec<String>>,
}

impl VcsQuery for RecordingVcs {
    fn revision(&self, name: &str) -> SimpackResult<String> {
        self.calls.borrow_mut().push(format!("revision:{name}"));
        Ok(format!("sha-{name}"))
    }

    fn branch(&self, name: &str) -> SimpackResult<String> {
        self.calls.borrow_mut().push(format!("branch:{name}"));
        Ok("main".to_string())
    }
}

fn unique_names() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(
        proptest::string::string_regex("[a-z][a-z0-9-]{0,10}").unwrap(),
        0..8,
    )
    .prop_filter("names must be unique", |names| {
        let mut seen = HashSet::new();
        names.iter().all(|n| seen.insert(n.clone()))
    })
}

fn descriptor_with(names: &[String]) -> PackageDescriptor {
    let deps = names
        .iter()
        .map(|n| format!("\"{n}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let json = format!(
        r#"{{
            "name": "energy-forms",
            "version": "1.2.0",
            "license": "MIT",
            "titleStringKey": "energy-forms.title",
            "main": "a.js",
            "template": "t.html",
            "strings": "s.json",
            "dependencies": [{deps}]
        }}"#
    );
    PackageDescriptor::from_json(&json, Path::new("package.json")).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: records appear in declaration order, one per dependency.
    #[test]
    fn property_records_preserve_declaration_order(names in unique_names()) {
        let descriptor = descriptor_with(&names);
        let vcs = RecordingVcs { calls: RefCell::new(Vec::new()) };

        let manifest = resolve_dependencies(&descriptor, &vcs).unwrap();

        let resolved: Vec<String> = manifest.iter().map(|(n, _)| n.to_string()).collect();
        prop_assert_eq!(resolved, names);
    }

    /// PROPERTY: the revision query of each dependency completes before its
    /// branch query, and both before the next dependency's queries.
    #[test]
    fn property_queries_are_strictly_sequential(names in unique_names()) {
        let descriptor = descriptor_with(&names);
        let vcs = RecordingVcs { calls: RefCell::new(Vec::new()) };

        resolve_dependencies(&descriptor, &vcs).unwrap();

        let expected: Vec<String> = names
            .iter()
            .flat_map(|n| [format!("revision:{n}"), format!("branch:{n}")])
            .collect();
        prop_assert_eq!(vcs.calls.into_inner(), expected);
    }

    /// PROPERTY: resolution against unchanged metadata is idempotent.
    #[test]
    fn property_resolution_is_idempotent(names in unique_names()) {
        let descriptor = descriptor_with(&names);
        let vcs = RecordingVcs { calls: RefCell::new(Vec::new()) };

        let first = resolve_dependencies(&descriptor, &vcs).unwrap();
        let second = resolve_dependencies(&descriptor, &vcs).unwrap();

        let rows = |m: &simpack::DependencyManifest| {
            m.iter().map(|(n, r)| (n.to_string(), r.clone())).collect::<Vec<_>>()
        };
        prop_assert_eq!(rows(&first), rows(&second));
    }
}
