//! Seek pagination: pages concatenate to the unlimited result

use crate::common::*;
use proptest::prelude::*;
use std::collections::HashSet;

const C: &str = "tasks";
const P: &str = "alice";

fn seed(store: &TestStore) {
    let options = WriteOptions::new();
    for i in 0..23 {
        let mut record = rec(json!({"id": format!("t{:02}", i), "priority": i % 4}));
        // Some records lack the sort key entirely, others hold null
        match i % 5 {
            0 => {}
            1 => {
                record.insert("due", Value::Null);
            }
            _ => {
                record.insert("due", json!(format!("2024-01-{:02}", (i * 7) % 28 + 1)));
            }
        }
        store.create(C, P, record, &options).unwrap();
    }
    for id in ["t03", "t10", "t17"] {
        store.delete(C, P, id, &DeleteOptions::new()).unwrap();
    }
}

#[test]
fn pages_reproduce_unlimited_result() {
    let sortings = vec![
        vec![],
        vec![Sort::asc("priority")],
        vec![Sort::desc("priority"), Sort::asc("due")],
        vec![Sort::desc("due")],
        vec![Sort::asc("due"), Sort::desc("id")],
        vec![Sort::desc("last_modified")],
    ];
    for store in TestStore::all() {
        seed(&store);
        for sorting in &sortings {
            for include_deleted in [false, true] {
                let query = GetAllQuery::new()
                    .sorting(sorting.clone())
                    .include_deleted(include_deleted);
                let everything = store.get_all(C, P, &query).unwrap();
                assert_eq!(everything.records.len(), everything.total);

                for limit in [1, 2, 3, 5, 7, 20, 23, 50] {
                    let paged = fetch_all_pages(&*store, C, P, &query, limit);
                    assert_eq!(
                        ids(&paged),
                        ids(&everything.records),
                        "{} sorting {:?} deleted {} limit {}",
                        store.name,
                        sorting,
                        include_deleted,
                        limit
                    );
                }
            }
        }
    }
}

#[test]
fn total_ignores_pagination_and_limit() {
    for store in TestStore::all() {
        seed(&store);
        let query = GetAllQuery::new().filter(Filter::eq("priority", 1)).limit(2);
        let page = store.get_all(C, P, &query).unwrap();
        assert_eq!(page.records.len(), 2);
        let expected = (0..23).filter(|i| i % 4 == 1 && ![3, 10, 17].contains(i)).count();
        assert_eq!(page.total, expected, "{}", store.name);

        let with_deleted = store
            .get_all(C, P, &GetAllQuery::new().include_deleted(true))
            .unwrap();
        assert_eq!(with_deleted.total, 23);
        assert_eq!(store.get_all(C, P, &GetAllQuery::new()).unwrap().total, 20);
    }
}

#[test]
fn writes_between_pages_cause_no_gap_or_duplicate() {
    for store in TestStore::all() {
        let options = WriteOptions::new();
        for i in 0..10 {
            store
                .create(C, P, rec(json!({"id": format!("r{:02}", i), "n": i})), &options)
                .unwrap();
        }
        let sorting = vec![Sort::asc("n")];
        let query = GetAllQuery::new().sorting(sorting.clone());
        let fields = FieldNames::default();

        let first = store.get_all(C, P, &query.clone().limit(4)).unwrap();
        assert_eq!(ids(&first.records), vec!["r00", "r01", "r02", "r03"]);
        let token = PaginationCursor::after(first.last().unwrap(), &sorting, &fields).token();

        // Before the cursor: must not show up; after: must show up once
        store.create(C, P, rec(json!({"id": "early", "n": -1})), &options).unwrap();
        store.create(C, P, rec(json!({"id": "late", "n": 100})), &options).unwrap();
        store.delete(C, P, "r02", &DeleteOptions::new()).unwrap();
        store.delete(C, P, "r05", &DeleteOptions::new()).unwrap();

        let rules = PaginationCursor::from_token(&token, &sorting, &fields)
            .unwrap()
            .rules();
        let rest = store
            .get_all(C, P, &query.clone().pagination_rules(rules))
            .unwrap();
        assert_eq!(
            ids(&rest.records),
            vec!["r04", "r06", "r07", "r08", "r09", "late"],
            "{}",
            store.name
        );

        let seen: HashSet<String> = ids(&first.records).into_iter().chain(ids(&rest.records)).collect();
        assert_eq!(seen.len(), first.records.len() + rest.records.len());
    }
}

#[test]
fn invalid_token_is_rejected() {
    let err = PaginationCursor::from_token("%%%", &[], &FieldNames::default()).unwrap_err();
    assert!(matches!(err, StoreError::InvalidInput { .. }));
}

fn arb_records() -> impl Strategy<Value = Vec<(Option<i64>, Option<bool>, bool)>> {
    prop::collection::vec(
        (prop::option::of(0i64..4), prop::option::of(any::<bool>()), any::<bool>()),
        0..25,
    )
}

fn arb_sort() -> impl Strategy<Value = Vec<Sort>> {
    let key = (prop_oneof![Just("a"), Just("b"), Just("id")], any::<bool>()).prop_map(
        |(field, asc)| if asc { Sort::asc(field) } else { Sort::desc(field) },
    );
    prop::collection::vec(key, 0..3)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_paging_is_complete(records in arb_records(), sorting in arb_sort(), limit in 1usize..6) {
        let store = TestStore::memory();
        let options = WriteOptions::new();
        for (i, (a, b, deleted)) in records.iter().enumerate() {
            let id = format!("{:02}", i);
            let mut record = rec(json!({"id": id}));
            if let Some(a) = a {
                record.insert("a", json!(a));
            }
            if let Some(b) = b {
                record.insert("b", json!(b));
            }
            store.create(C, P, record, &options).unwrap();
            if *deleted {
                store.delete(C, P, &id, &DeleteOptions::new()).unwrap();
            }
        }

        let query = GetAllQuery::new().sorting(sorting).include_deleted(true);
        let everything = store.get_all(C, P, &query).unwrap();
        let paged = fetch_all_pages(&*store, C, P, &query, limit);
        prop_assert_eq!(ids(&paged), ids(&everything.records));
    }
}
