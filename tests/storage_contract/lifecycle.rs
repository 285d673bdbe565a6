//! Record lifecycle: absent -> active -> tombstoned -> absent

use crate::common::*;

const C: &str = "articles";
const P: &str = "alice";

#[test]
fn create_delete_sync_scenario() {
    for store in TestStore::all() {
        let options = WriteOptions::new();
        let a = store.create(C, P, rec(json!({"x": 1})), &options).unwrap();
        let b = store.create(C, P, rec(json!({"x": 2})), &options).unwrap();
        let t1 = version_of(&a);
        let t2 = version_of(&b);
        assert!(t2 > t1, "{}", store.name);

        let tombstone = store.delete(C, P, &id_of(&a), &DeleteOptions::new()).unwrap();
        let t3 = version_of(&tombstone);
        assert!(t3 > t2, "{}", store.name);

        let live = store.get_all(C, P, &GetAllQuery::new()).unwrap();
        assert_eq!(live.records, vec![b.clone()], "{}", store.name);
        assert_eq!(live.total, 1);

        let everything = store
            .get_all(
                C,
                P,
                &GetAllQuery::new()
                    .sort(Sort::desc("last_modified"))
                    .include_deleted(true),
            )
            .unwrap();
        let expected_tombstone = rec(json!({"id": id_of(&a), "last_modified": t3, "deleted": true}));
        assert_eq!(everything.records, vec![expected_tombstone, b], "{}", store.name);
        assert_eq!(everything.total, 2);
    }
}

#[test]
fn create_then_get_round_trips_all_fields() {
    for store in TestStore::all() {
        let submitted = json!({
            "title": "Hello",
            "score": 4.5,
            "tags": ["a", "b"],
            "meta": {"nested": true, "n": null}
        });
        let created = store
            .create(C, P, rec(submitted.clone()), &WriteOptions::new())
            .unwrap();
        let fetched = store
            .get(C, P, &id_of(&created), &FieldNames::default())
            .unwrap();
        assert_eq!(fetched, created, "{}", store.name);

        for (field, value) in submitted.as_object().unwrap() {
            assert_eq!(fetched.get(field), Some(value), "{} {}", store.name, field);
        }
        assert_eq!(fetched.len(), 6);
    }
}

#[test]
fn deleted_records_are_not_found() {
    for store in TestStore::all() {
        let fields = FieldNames::default();
        store
            .create(C, P, rec(json!({"id": "a", "title": "t"})), &WriteOptions::new())
            .unwrap();
        store.delete(C, P, "a", &DeleteOptions::new()).unwrap();

        assert!(store.get(C, P, "a", &fields).unwrap_err().is_not_found());
        assert!(store
            .delete(C, P, "a", &DeleteOptions::new())
            .unwrap_err()
            .is_not_found());
        assert!(store
            .delete(C, P, "missing", &DeleteOptions::new())
            .unwrap_err()
            .is_not_found());

        let all = store
            .get_all(C, P, &GetAllQuery::new().include_deleted(true))
            .unwrap();
        assert_eq!(all.records.len(), 1);
        let tombstone = &all.records[0];
        assert!(tombstone.is_deleted(&fields));
        assert!(tombstone.get("title").is_none());
        assert_eq!(tombstone.len(), 3);
    }
}

#[test]
fn unique_fields_conflict_with_existing_record() {
    for store in TestStore::all() {
        let options = WriteOptions::new().unique_fields(["email"]);
        let a = store
            .create(C, P, rec(json!({"email": "x@y", "name": "A"})), &options)
            .unwrap();

        let err = store
            .create(C, P, rec(json!({"email": "x@y", "name": "B"})), &options)
            .unwrap_err();
        match &err {
            StoreError::UnicityConflict { fields, existing } => {
                assert_eq!(fields, &vec!["email".to_string()]);
                assert_eq!(**existing, a, "{}", store.name);
            }
            other => panic!("{}: expected conflict, got {:?}", store.name, other),
        }

        assert!(store
            .create(C, P, rec(json!({"email": "z@y", "name": "B"})), &options)
            .is_ok());

        // Another parent is another collection
        assert!(store
            .create(C, "bob", rec(json!({"email": "x@y"})), &options)
            .is_ok());

        // Tombstoned records do not hold their values
        store.delete(C, P, &id_of(&a), &DeleteOptions::new()).unwrap();
        assert!(store
            .create(C, P, rec(json!({"email": "x@y"})), &options)
            .is_ok());
    }
}

#[test]
fn each_unique_field_is_its_own_constraint() {
    for store in TestStore::all() {
        let options = WriteOptions::new().unique_fields(["email", "login"]);
        let a = store
            .create(C, P, rec(json!({"email": "x@y", "login": "alice"})), &options)
            .unwrap();

        let err = store
            .create(C, P, rec(json!({"id": "b", "email": "x@y", "login": "bob"})), &options)
            .unwrap_err();
        match &err {
            StoreError::UnicityConflict { fields, existing } => {
                assert_eq!(fields, &vec!["email".to_string()], "{}", store.name);
                assert_eq!(id_of(existing), id_of(&a), "{}", store.name);
            }
            other => panic!("{}: expected conflict, got {:?}", store.name, other),
        }
        assert!(store.get(C, P, "b", &FieldNames::default()).unwrap_err().is_not_found());

        assert!(store
            .create(C, P, rec(json!({"email": "z@y", "login": "alice"})), &options)
            .unwrap_err()
            .is_conflict());
        assert!(store
            .create(C, P, rec(json!({"email": "z@y", "login": "bob"})), &options)
            .is_ok());
    }
}

#[test]
fn update_upserts_and_revalidates() {
    for store in TestStore::all() {
        let options = WriteOptions::new().unique_fields(["slug"]);
        let first = store
            .update(C, P, "page-1", rec(json!({"slug": "home", "body": "v1"})), &options)
            .unwrap();
        assert_eq!(id_of(&first), "page-1");

        let second = store
            .update(C, P, "page-1", rec(json!({"slug": "home"})), &options)
            .unwrap();
        assert!(version_of(&second) > version_of(&first));
        assert!(second.get("body").is_none(), "{}: update replaces", store.name);

        store
            .update(C, P, "page-2", rec(json!({"slug": "about"})), &options)
            .unwrap();
        let err = store
            .update(C, P, "page-2", rec(json!({"slug": "home"})), &options)
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(id_of(err.conflicting_record().unwrap()), "page-1");

        // The failed update changed nothing
        let page_2 = store.get(C, P, "page-2", &FieldNames::default()).unwrap();
        assert_eq!(page_2.get("slug"), Some(&json!("about")));
    }
}

#[test]
fn purge_deleted_removes_only_older_tombstones() {
    for store in TestStore::all() {
        let options = WriteOptions::new();
        for id in ["a", "b", "c", "d"] {
            store.create(C, P, rec(json!({"id": id})), &options).unwrap();
        }
        let t_a = version_of(&store.delete(C, P, "a", &DeleteOptions::new()).unwrap());
        let t_b = version_of(&store.delete(C, P, "b", &DeleteOptions::new()).unwrap());
        let t_c = version_of(&store.delete(C, P, "c", &DeleteOptions::new()).unwrap());
        assert!(t_a < t_b && t_b < t_c);

        assert_eq!(store.purge_deleted(C, P, Some(t_c)).unwrap(), 2, "{}", store.name);

        let remaining = store
            .get_all(
                C,
                P,
                &GetAllQuery::new().sort(Sort::asc("id")).include_deleted(true),
            )
            .unwrap();
        assert_eq!(ids(&remaining.records), vec!["c", "d"]);
        assert!(remaining.records[0].is_deleted(&FieldNames::default()));

        assert_eq!(store.purge_deleted(C, P, None).unwrap(), 1);
        assert_eq!(store.purge_deleted(C, P, None).unwrap(), 0);
    }
}

#[test]
fn purge_deleted_accepts_any_bound() {
    for store in TestStore::all() {
        store
            .create(C, P, rec(json!({"id": "a"})), &WriteOptions::new())
            .unwrap();
        store.delete(C, P, "a", &DeleteOptions::new()).unwrap();

        assert_eq!(store.purge_deleted(C, P, Some(u64::MAX)).unwrap(), 1, "{}", store.name);
        let page = store
            .get_all(C, P, &GetAllQuery::new().include_deleted(true))
            .unwrap();
        assert_eq!(page.total, 0, "{}", store.name);
    }
}

#[test]
fn hard_delete_skips_tombstone() {
    for store in TestStore::all() {
        let options = WriteOptions::new();
        store.create(C, P, rec(json!({"id": "a"})), &options).unwrap();
        store.create(C, P, rec(json!({"id": "b"})), &options).unwrap();

        store.delete(C, P, "a", &DeleteOptions::hard()).unwrap();
        let deleted = store
            .delete_all(C, P, &[], &DeleteOptions::hard())
            .unwrap();
        assert_eq!(ids(&deleted), vec!["b"]);

        let all = store
            .get_all(C, P, &GetAllQuery::new().include_deleted(true))
            .unwrap();
        assert!(all.records.is_empty(), "{}", store.name);
        assert_eq!(store.purge_deleted(C, P, None).unwrap(), 0);
    }
}

#[test]
fn delete_all_matches_filters_and_stamps_each_tombstone() {
    for store in TestStore::all() {
        let options = WriteOptions::new();
        for (id, status) in [("a", "done"), ("b", "open"), ("c", "done"), ("d", "done")] {
            store
                .create(C, P, rec(json!({"id": id, "status": status})), &options)
                .unwrap();
        }

        let deleted = store
            .delete_all(C, P, &[Filter::eq("status", "done")], &DeleteOptions::new())
            .unwrap();
        assert_eq!(deleted.len(), 3);
        let mut versions: Vec<u64> = deleted.iter().map(version_of).collect();
        versions.dedup();
        assert_eq!(versions.len(), 3, "{}: versions must be distinct", store.name);
        assert!(deleted.iter().all(|t| t.is_deleted(&FieldNames::default())));

        let live = store.get_all(C, P, &GetAllQuery::new()).unwrap();
        assert_eq!(ids(&live.records), vec!["b"]);
        assert_eq!(
            store.collection_timestamp(C, P).unwrap(),
            *versions.iter().max().unwrap()
        );
    }
}

#[test]
fn field_name_overrides_apply_end_to_end() {
    for store in TestStore::all() {
        let fields = FieldNames::default()
            .with_id("uid")
            .with_modified("ts")
            .with_deleted("removed");
        let options = WriteOptions::new().fields(fields.clone());
        store
            .create(C, P, rec(json!({"uid": "k1", "n": 1})), &options)
            .unwrap();
        store
            .create(C, P, rec(json!({"uid": "k2", "n": 2})), &options)
            .unwrap();
        store
            .delete(C, P, "k1", &DeleteOptions::new().fields(fields.clone()))
            .unwrap();

        let page = store
            .get_all(
                C,
                P,
                &GetAllQuery::new()
                    .fields(fields.clone())
                    .sort(Sort::asc("ts"))
                    .include_deleted(true),
            )
            .unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].get("uid"), Some(&json!("k2")));
        assert_eq!(page.records[1].get("removed"), Some(&json!(true)));
        assert!(page.records.iter().all(|r| r.get("id").is_none()));
    }
}

#[test]
fn flush_and_ping() {
    for store in TestStore::all() {
        store
            .create(C, P, rec(json!({"id": "a"})), &WriteOptions::new())
            .unwrap();
        for _ in 0..10 {
            assert!(store.ping(), "{}", store.name);
        }
        store.flush().unwrap();
        assert!(store
            .get(C, P, "a", &FieldNames::default())
            .unwrap_err()
            .is_not_found());
        assert!(store.ping());
    }
}
