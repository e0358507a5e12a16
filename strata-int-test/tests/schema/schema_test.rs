use chrono::{TimeZone, Utc};
use strata::doc;
use strata::errors::ErrorKind;
use strata::query::{field, query};
use strata::schema::{FieldSpec, Schema};
use strata_int_test::test_util::{cleanup, create_test_context, key_value_schema, run_test};

fn event_schema() -> strata::errors::StrataResult<Schema> {
    Schema::new(vec![
        ("name", FieldSpec::string()),
        ("at", FieldSpec::date()),
        ("note", FieldSpec::string().optional()),
    ])
}

#[test]
fn test_invalid_documents_are_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().create_collection("kv", key_value_schema()?)?;

            let err = collection.insert(doc! { key: "a" }).wait().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::MissingRequiredField);

            let err = collection.insert(doc! { key: "a", value: "x" }).wait().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidDataType);

            let err = collection
                .insert(doc! { key: "a", value: 1.0, extra: true })
                .wait()
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UnknownField);

            assert_eq!(collection.size(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_dates_and_optional_fields() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().create_collection("events", event_schema()?)?;
            let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
            let stored = collection.insert(doc! { name: "launch", at: at }).wait()?;

            let schema = collection.schema();
            assert_eq!(schema.accessor("at")?.date(&stored)?, at);
            assert!(schema.accessor("note")?.get(&stored).is_null());

            let noted = schema.accessor("note")?.set(&stored, "went fine")?;
            let saved = collection.save(noted).wait()?;
            assert_eq!(saved.get_string("note")?, "went fine");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_schema_evolution() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().create_collection("kv", key_value_schema()?)?;
            collection.insert(doc! { key: "a", value: 1.0 }).wait()?;

            let stale = Schema::new(vec![("key", FieldSpec::string())])?;
            let err = collection.evolve_schema(stale).wait().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::SchemaVersionError);

            let too_strict = collection.schema().evolve(vec![
                ("key", FieldSpec::string()),
                ("value", FieldSpec::double()),
                ("label", FieldSpec::string()),
            ])?;
            let err = collection.evolve_schema(too_strict).wait().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::SchemaVersionError);
            assert_eq!(collection.schema().version(), 1);

            let relaxed = collection.schema().evolve(vec![
                ("key", FieldSpec::string()),
                ("value", FieldSpec::double()),
                ("label", FieldSpec::string().optional()),
            ])?;
            collection.evolve_schema(relaxed).wait()?;
            assert_eq!(collection.schema().version(), 2);

            collection.insert(doc! { key: "b", value: 2.0, label: "new" }).wait()?;
            assert_eq!(collection.find(field("label").eq("new")).wait()?.len(), 1);
            assert_eq!(collection.find(query()).wait()?.len(), 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_references_and_embeddings() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let targets = db.create_collection("kv", key_value_schema()?)?;
            let links = db.create_collection(
                "links",
                Schema::new(vec![
                    ("key", FieldSpec::string()),
                    ("ref", FieldSpec::reference("kv")),
                    ("embed", FieldSpec::embedding(key_value_schema()?)),
                ])?,
            )?;

            let target = targets.insert(doc! { key: "t", value: 1.0 }).wait()?;
            let id = target.object_id().unwrap();

            // a whole target document is reduced to its id
            let stored = links
                .insert(doc! { key: "l", "ref": (target.clone()), embed: { key: "e", value: 2 } })
                .wait()?;
            assert_eq!(stored.get_reference("ref")?, id);
            assert_eq!(stored.get_double("embed.value")?, 2.0);

            let by_text = links
                .insert(doc! { key: "m", "ref": (id.to_string()), embed: { key: "f", value: 3.0 } })
                .wait()?;
            assert_eq!(by_text.get_reference("ref")?, id);

            let err = links
                .insert(doc! { key: "n", "ref": (id), embed: { key: "g" } })
                .wait()
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::MissingRequiredField);

            let found = links.find(field("embed.key").eq("f")).wait()?;
            assert_eq!(found, vec![by_text]);
            Ok(())
        },
        cleanup,
    )
}
