use strata::errors::ErrorKind;
use strata::query::field;
use strata_int_test::test_util::{cleanup, create_test_context, run_test};
use strata_plugin::{Reply, Request, KEY_VALUE_COLLECTION, REFERENCE_COLLECTION};

fn documents(reply: Reply) -> Vec<strata::collection::Document> {
    match reply {
        Reply::Documents(docs) => docs,
        other => panic!("expected documents, got {:?}", other),
    }
}

#[test]
fn test_key_value_flow() {
    run_test(
        create_test_context,
        |ctx| {
            let plugin = ctx.plugin()?;
            plugin.handle(&Request::new("insert", &["a", "1"])).wait()?;
            plugin.handle(&Request::new("insert", &["b", "2"])).wait()?;
            plugin.handle(&Request::new("insert", &["c", "3"])).wait()?;

            let found = documents(plugin.handle(&Request::new("find", &["c", "a"])).wait()?);
            let keys: Vec<String> = found.iter().map(|d| d.get_string("key").unwrap()).collect();
            assert_eq!(keys, vec!["a", "c"]);

            plugin.handle(&Request::new("save", &["7", "a", "b"])).wait()?;
            let saved = documents(plugin.handle(&Request::new("find", &["a", "b"])).wait()?);
            let values: Vec<f64> = saved.iter().map(|d| d.get_double("value").unwrap()).collect();
            assert_eq!(values, vec![7.0, 2.0]);

            plugin.handle(&Request::new("remove", &["a", "b"])).wait()?;
            let rest = ctx.db().collection(KEY_VALUE_COLLECTION)?.find(field("key").eq("c")).wait()?;
            assert_eq!(rest.len(), 1);
            assert_eq!(ctx.db().collection(KEY_VALUE_COLLECTION)?.size(), 1);

            assert!(ctx.reporter().errors().is_empty());
            assert!(!ctx.reporter().infos().is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_dangling_reference_is_reported() {
    run_test(
        create_test_context,
        |ctx| {
            let plugin = ctx.plugin()?;
            plugin.handle(&Request::new("insert", &["a", "1"])).wait()?;
            plugin.handle(&Request::new("referenceInsert", &["a"])).wait()?;
            plugin.handle(&Request::new("removeOne", &["a"])).wait()?;

            let err = plugin
                .handle(&Request::new("referenceFindOne", &["a"]))
                .wait()
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ReferenceResolution);
            assert!(!ctx.reporter().errors().is_empty());

            // the referencing document itself is untouched
            assert_eq!(ctx.db().collection(REFERENCE_COLLECTION)?.size(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_plugins_share_collections() {
    run_test(
        create_test_context,
        |ctx| {
            let first = ctx.plugin()?;
            let second = ctx.plugin()?;
            first.handle(&Request::new("insert", &["shared", "1"])).wait()?;

            let reply = second.handle(&Request::new("findOne", &["shared"])).wait()?;
            assert!(matches!(reply, Reply::Document(_)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_runtime_operators() {
    run_test(
        create_test_context,
        |ctx| {
            let plugin = ctx.plugin()?;
            assert_eq!(plugin.handle(&Request::new("sequence", &[])).wait()?, Reply::Number(10.0));
            assert_eq!(plugin.handle(&Request::new("andThen", &[])).wait()?, Reply::Number(1.0));
            assert_eq!(ctx.reporter().infos(), vec!["andThen1: 1", "andThen2: 1"]);

            let reply = plugin.handle(&Request::new("futureCounter", &[])).wait()?;
            assert_eq!(reply, Reply::Text("Hello future /plugins/futureCounter 1".to_string()));

            match plugin.handle(&Request::new("uuid", &[])).wait()? {
                Reply::Text(id) => assert!(uuid::Uuid::parse_str(&id).is_ok()),
                other => panic!("expected text, got {:?}", other),
            }
            Ok(())
        },
        cleanup,
    )
}
