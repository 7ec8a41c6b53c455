use fetcher::Fetched;
use graph::{AccountGraph, Resolver};
use models::{LinkPath, LinkSource, Record, Registry};
use serde_json::{json, Value};
use std::collections::BTreeMap;

const A1: &str = "001000000000001AAA";
const A2: &str = "001000000000002AAA";

fn registry() -> Registry {
    serde_json::from_value(json!({"objects": [
        {"name": "Account", "label": "Account", "link": {"kind": "root"}},
        {"name": "Contact", "label": "Contact", "requiredFields": ["AccountId", "IndividualId"],
            "link": {"kind": "direct", "field": "AccountId"}},
        {"name": "Case", "label": "Case", "requiredFields": ["AccountId"],
            "link": {"kind": "direct", "field": "AccountId"}},
        {"name": "Individual", "label": "Individual",
            "link": {"kind": "contactReference", "field": "IndividualId"}},
        {"name": "ContactPointEmail", "label": "Contact Point Email",
            "link": {"kind": "contactPoint", "contactField": "Contact__c", "individualField": "ParentId"}},
    ]}))
    .unwrap()
}

fn records(rows: Value) -> Vec<Record> {
    serde_json::from_value::<Vec<Value>>(rows)
        .unwrap()
        .into_iter()
        .filter_map(Record::from_value)
        .collect()
}

fn both_paths() -> Vec<LinkSource> {
    vec![
        LinkSource {
            path: LinkPath::Contact,
            field: "Contact__c".to_string(),
        },
        LinkSource {
            path: LinkPath::Individual,
            field: "ParentId".to_string(),
        },
    ]
}

fn fetched(link_sources: Vec<LinkSource>) -> Fetched {
    let mut records_by_type = BTreeMap::new();
    records_by_type.insert(
        "Account".to_string(),
        records(json!([{"Id": A1, "Name": "Acme"}, {"Id": A2, "Name": "Globex"}])),
    );
    records_by_type.insert(
        "Contact".to_string(),
        records(json!([
            {"Id": "003000000000001AAA", "AccountId": A1, "IndividualId": "0PK000000000001AAA"},
            {"Id": "003000000000002AAA", "AccountId": A1, "IndividualId": null},
            {"Id": "003000000000003AAA", "AccountId": A2, "IndividualId": "0PK000000000002AAA"},
        ])),
    );
    records_by_type.insert(
        "Case".to_string(),
        records(json!([
            {"Id": "500000000000001AAA", "AccountId": A1, "Status": "New"},
            {"AccountId": A1, "Status": "Closed"},
            {"Id": "500000000000002AAA", "AccountId": A2, "Status": "New"},
        ])),
    );
    records_by_type.insert(
        "Individual".to_string(),
        records(json!([
            {"Id": "0PK000000000001AAA", "LastName": "Ada"},
            {"Id": "0PK000000000002AAA", "LastName": "Cy"},
            {"Id": "0PK000000000009AAA", "LastName": "Unreferenced"},
        ])),
    );
    records_by_type.insert(
        "ContactPointEmail".to_string(),
        records(json!([
            {"Id": "9PE000000000001AAA", "Contact__c": "003000000000001AAA",
                "ParentId": "0PK000000000001AAA"},
            {"Id": "9PE000000000002AAA", "Contact__c": null, "ParentId": "0PK000000000002AAA"},
            {"Id": "9PE000000000003AAA", "Contact__c": "003000000000002AAA", "ParentId": null},
        ])),
    );

    let mut sources = BTreeMap::new();
    sources.insert("ContactPointEmail".to_string(), link_sources);

    Fetched {
        account_ids: vec![A1.to_string(), A2.to_string()],
        records: records_by_type,
        link_sources: sources,
        ..Default::default()
    }
}

fn keys<'a>(graph: &'a AccountGraph, object: &str) -> Vec<&'a str> {
    graph
        .records(object)
        .iter()
        .map(|record| record.key.as_str())
        .collect()
}

#[test]
fn test_resolve_related_records() {
    let resolver = Resolver::new(&registry(), fetched(both_paths()));
    let graph = resolver.resolve(A1);

    assert_eq!(graph.account_id, A1);
    assert_eq!(graph.account().id(), Some(A1));
    assert_eq!(
        graph.iter().map(|(object, _)| object).collect::<Vec<_>>(),
        vec!["Account", "Contact", "Case", "Individual", "ContactPointEmail"]
    );
    assert_eq!(
        keys(&graph, "Contact"),
        vec!["003000000000001AAA", "003000000000002AAA"]
    );
    // Records without an Id are keyed on their pool position.
    assert_eq!(keys(&graph, "Case"), vec!["500000000000001AAA", "Case:1"]);
    // Only individuals referenced by the account's contacts are included.
    assert_eq!(keys(&graph, "Individual"), vec!["0PK000000000001AAA"]);
    assert_eq!(
        keys(&graph, "ContactPointEmail"),
        vec!["9PE000000000001AAA", "9PE000000000003AAA"]
    );

    let graph = resolver.resolve(A2);
    assert_eq!(keys(&graph, "Contact"), vec!["003000000000003AAA"]);
    assert_eq!(keys(&graph, "Case"), vec!["500000000000002AAA"]);
    assert_eq!(keys(&graph, "Individual"), vec!["0PK000000000002AAA"]);
    assert_eq!(keys(&graph, "ContactPointEmail"), vec!["9PE000000000002AAA"]);
}

#[test]
fn test_contact_point_provenance() {
    let resolver = Resolver::new(&registry(), fetched(both_paths()));
    let graph = resolver.resolve(A1);
    let points = graph.records("ContactPointEmail");

    // Reached through both the contact and its individual.
    assert_eq!(points[0].link_sources, both_paths());
    // Reached through the contact only.
    assert_eq!(points[1].link_sources, both_paths()[..1].to_vec());

    let graph = resolver.resolve(A2);
    assert_eq!(
        graph.records("ContactPointEmail")[0].link_sources,
        both_paths()[1..].to_vec()
    );
}

#[test]
fn test_inactive_path_is_not_followed() {
    let resolver = Resolver::new(&registry(), fetched(both_paths()[..1].to_vec()));

    let graph = resolver.resolve(A1);
    let points = graph.records("ContactPointEmail");
    assert_eq!(points.len(), 2);
    assert!(points
        .iter()
        .all(|point| point.link_sources == both_paths()[..1].to_vec()));

    // A2's only contact point is linked through its individual.
    assert!(resolver.resolve(A2).records("ContactPointEmail").is_empty());
}

#[test]
fn test_missing_account_has_empty_record() {
    let resolver = Resolver::new(&registry(), fetched(both_paths()));
    let graph = resolver.resolve("001000000000003AAA");

    assert_eq!(graph.account().key, "Account:0");
    assert!(graph.account().record.is_empty());
    assert_eq!(graph.account().id(), None);
    for (object, records) in graph.iter().skip(1) {
        assert!(records.is_empty(), "{object} should have no records");
    }
}

#[test]
fn test_unfetched_types_are_empty() {
    let resolver = Resolver::new(&registry(), Fetched::default());
    let graph = resolver.resolve(A1);

    assert_eq!(graph.account().key, "Account:0");
    assert!(graph.records("Contact").is_empty());
    assert!(graph.records("ContactPointEmail").is_empty());
    assert!(graph.records("NotAType").is_empty());
    assert_eq!(resolver.pools().count("Contact"), 0);
}
