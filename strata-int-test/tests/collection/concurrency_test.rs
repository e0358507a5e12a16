use rand::Rng;
use std::sync::{Arc, Barrier};
use std::thread;
use strata::doc;
use strata::future::Future;
use strata::query::{field, query};
use strata_int_test::test_util::{cleanup, create_test_context, key_value_schema, run_test};

#[test]
fn test_concurrent_inserts_are_all_stored() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().create_collection("kv", key_value_schema()?)?;
            let num_threads = 5;
            let inserts_per_thread = 20;
            let barrier = Arc::new(Barrier::new(num_threads));

            let handles: Vec<_> = (0..num_threads)
                .map(|thread_id| {
                    let collection = collection.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        let pending = (0..inserts_per_thread)
                            .map(|i| {
                                let key = format!("thread_{}_seq_{}", thread_id, i);
                                collection.insert(doc! { key: key, value: (i as f64) })
                            })
                            .collect();
                        Future::sequence(pending).wait().map(|docs| docs.len())
                    })
                })
                .collect();

            for handle in handles {
                assert_eq!(handle.join().unwrap()?, inserts_per_thread);
            }
            assert_eq!(collection.size(), num_threads * inserts_per_thread);
            assert_eq!(collection.find(query()).wait()?.len(), num_threads * inserts_per_thread);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_concurrent_saves_keep_one_document_per_key() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().create_collection("kv", key_value_schema()?)?;
            let keys = ["a", "b", "c"];
            for key in keys {
                collection.insert(doc! { key: key, value: 0.0 }).wait()?;
            }

            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let collection = collection.clone();
                    thread::spawn(move || -> strata::errors::StrataResult<()> {
                        let mut rng = rand::rng();
                        for _ in 0..25 {
                            let key = keys[rng.random_range(0..keys.len())];
                            let value = rng.random::<f64>();
                            let current = collection.find_one(field("key").eq(key)).wait()?;
                            if let Some(doc) = current {
                                collection.save(doc.with("value", value)?).wait()?;
                            }
                        }
                        Ok(())
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap()?;
            }

            let all = collection.find(query()).wait()?;
            assert_eq!(all.len(), keys.len());
            let stored: Vec<String> = all.iter().map(|d| d.get_string("key").unwrap()).collect();
            assert_eq!(stored, vec!["a", "b", "c"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_racing_saves_to_one_identity_leave_a_whole_state() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().create_collection("kv", key_value_schema()?)?;
            let stored = collection.insert(doc! { key: "a", value: 0.0 }).wait()?;

            let left = collection.save(stored.with("key", "left")?.with("value", 1.0)?);
            let right = collection.save(stored.with("key", "right")?.with("value", 2.0)?);
            Future::sequence(vec![left, right]).wait()?;

            let all = collection.find(query()).wait()?;
            assert_eq!(all.len(), 1);
            let state = (all[0].get_string("key")?, all[0].get_double("value")?);
            assert!(state == ("left".to_string(), 1.0) || state == ("right".to_string(), 2.0));
            Ok(())
        },
        cleanup,
    )
}
