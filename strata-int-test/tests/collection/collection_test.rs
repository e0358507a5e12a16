use strata::collection::ObjectId;
use strata::doc;
use strata::errors::ErrorKind;
use strata::query::{by_id, field, not, or, query};
use strata_int_test::test_util::{cleanup, create_test_context, key_value_schema, run_test};

#[test]
fn test_insert_then_find_round_trip() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().create_collection("kv", key_value_schema()?)?;
            let stored = collection.insert(doc! { key: "a", value: 1 }).wait()?;

            assert!(stored.has_id());
            assert_eq!(stored.get_double("value")?, 1.0);

            let id = stored.object_id().unwrap();
            assert_eq!(collection.get_by_id(id).wait()?, Some(stored.clone()));
            assert_eq!(collection.find_one(by_id(id)).wait()?, Some(stored.clone()));
            assert_eq!(collection.find(field("key").eq("a")).wait()?, vec![stored]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_remove_then_find_is_empty() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().create_collection("kv", key_value_schema()?)?;
            collection.insert(doc! { key: "a", value: 1.0 }).wait()?;
            collection.insert(doc! { key: "a", value: 2.0 }).wait()?;
            collection.insert(doc! { key: "b", value: 3.0 }).wait()?;

            let removed = collection.remove(field("key").eq("a")).wait()?;
            assert_eq!(removed.count(), 2);
            assert!(collection.find(field("key").eq("a")).wait()?.is_empty());
            assert_eq!(collection.size(), 1);

            let removed = collection.remove(field("key").eq("a")).wait()?;
            assert_eq!(removed.count(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_remove_one_takes_first_inserted() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().create_collection("kv", key_value_schema()?)?;
            let first = collection.insert(doc! { key: "a", value: 1.0 }).wait()?;
            let second = collection.insert(doc! { key: "a", value: 2.0 }).wait()?;

            let removed = collection.remove_one(field("key").eq("a")).wait()?;
            assert_eq!(removed.affected_ids(), &vec![first.object_id().unwrap()]);
            assert_eq!(collection.find(query()).wait()?, vec![second]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_or_query_keeps_insertion_order() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().create_collection("kv", key_value_schema()?)?;
            for (key, value) in [("c", 1.0), ("a", 2.0), ("b", 3.0), ("a", 4.0)] {
                collection.insert(doc! { key: key, value: value }).wait()?;
            }

            let found = collection
                .find(or(vec![field("key").eq("a"), field("key").eq("c")]))
                .wait()?;
            let values: Vec<f64> = found.iter().map(|d| d.get_double("value").unwrap()).collect();
            assert_eq!(values, vec![1.0, 2.0, 4.0]);

            let others = collection.find(not(field("key").eq("a"))).wait()?;
            assert_eq!(others.len(), 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_save_replaces_in_place() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().create_collection("kv", key_value_schema()?)?;
            let a = collection.insert(doc! { key: "a", value: 1.0 }).wait()?;
            collection.insert(doc! { key: "b", value: 2.0 }).wait()?;

            let saved = collection.save(a.with("value", 9.0)?).wait()?;
            assert_eq!(saved.object_id(), a.object_id());

            let all = collection.find(query()).wait()?;
            assert_eq!(all[0].get_double("value")?, 9.0);
            assert_eq!(all.len(), 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_save_failures() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().create_collection("kv", key_value_schema()?)?;

            let err = collection.save(doc! { key: "a", value: 1.0 }).wait().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidId);

            let mut unknown = doc! { key: "a", value: 1.0 };
            unknown.put("_id", ObjectId::new())?;
            let err = collection.save(unknown).wait().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_collection_registry() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            db.create_collection("b", key_value_schema()?)?;
            db.create_collection("a", key_value_schema()?)?;

            let err = db.create_collection("a", key_value_schema()?).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::CollectionAlreadyExists);
            assert_eq!(db.collection("x").unwrap_err().kind(), &ErrorKind::CollectionNotFound);
            assert_eq!(db.collection_names(), vec!["a", "b"]);

            let handle = db.collection("a")?;
            handle.insert(doc! { key: "k", value: 1.0 }).wait()?;
            assert_eq!(db.collection("a")?.size(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_operations_after_close_fail() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let collection = db.create_collection("kv", key_value_schema()?)?;
            db.close();

            assert!(db.is_closed());
            let err = collection.find(query()).wait().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::StoreClosed);
            let err = db.create_collection("other", key_value_schema()?).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::StoreClosed);
            Ok(())
        },
        cleanup,
    )
}
