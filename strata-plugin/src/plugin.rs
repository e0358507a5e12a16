use crate::counter::RequestCounter;
use crate::demo_store::DemoStore;
use crate::id_generator::{IdGenerator, UuidGenerator};
use crate::reply::Reply;
use crate::reporter::{LogReporter, Reporter};
use crate::request::Request;
use std::sync::Arc;
use strata::database::Database;
use strata::errors::{ErrorKind, StrataError, StrataResult};
use strata::future::{Future, Outcome};

/// Operator tokens understood by [Plugin::handle].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Counter,
    FutureCounter,
    Uuid,
    Successful,
    AndThen,
    Sequence,
    FirstCompletedOf,
    Insert,
    Find,
    FindOne,
    ReferenceFindOne,
    ReferenceInsert,
    ReferenceUpdate,
    Remove,
    RemoveOne,
    FindOneWithKey,
    EmbeddingInsert,
    EmbeddingFind,
    Save,
    Unknown,
}

impl Operator {
    pub fn from_token(token: &str) -> Operator {
        match token {
            "counter" => Operator::Counter,
            "futureCounter" => Operator::FutureCounter,
            "uuid" => Operator::Uuid,
            "successful" => Operator::Successful,
            "andThen" => Operator::AndThen,
            "sequence" => Operator::Sequence,
            "firstCompletedOf" => Operator::FirstCompletedOf,
            "insert" => Operator::Insert,
            "find" => Operator::Find,
            "findOne" => Operator::FindOne,
            "referenceFindOne" => Operator::ReferenceFindOne,
            "referenceInsert" => Operator::ReferenceInsert,
            "referenceUpdate" => Operator::ReferenceUpdate,
            "remove" => Operator::Remove,
            "removeOne" => Operator::RemoveOne,
            "findOneWithKey" => Operator::FindOneWithKey,
            "embeddingInsert" => Operator::EmbeddingInsert,
            "embeddingFind" => Operator::EmbeddingFind,
            "save" => Operator::Save,
            _ => Operator::Unknown,
        }
    }
}

/// Dispatches decoded requests onto the futures runtime and the demo store.
///
/// # Examples
///
/// ```rust
/// use strata::database::Database;
/// use strata_plugin::{Plugin, Reply, Request};
///
/// let db = Database::builder().worker_threads(2).open().unwrap();
/// let plugin = Plugin::with_defaults(db).unwrap();
///
/// let reply = plugin.handle(&Request::from_uri("/plugins/sequence")).wait().unwrap();
/// assert_eq!(reply, Reply::Number(10.0));
/// ```
pub struct Plugin {
    db: Database,
    store: DemoStore,
    reporter: Arc<dyn Reporter>,
    id_generator: Arc<dyn IdGenerator>,
    counter: Arc<RequestCounter>,
}

impl Plugin {
    pub fn new(
        db: Database,
        reporter: Arc<dyn Reporter>,
        id_generator: Arc<dyn IdGenerator>,
    ) -> StrataResult<Plugin> {
        let store = DemoStore::open(&db, reporter.clone())?;
        Ok(Plugin {
            db,
            store,
            reporter,
            id_generator,
            counter: Arc::new(RequestCounter::new()),
        })
    }

    /// A plugin reporting to the `log` facade and generating v4 UUIDs.
    pub fn with_defaults(db: Database) -> StrataResult<Plugin> {
        Plugin::new(db, Arc::new(LogReporter), Arc::new(UuidGenerator))
    }

    pub fn store(&self) -> &DemoStore {
        &self.store
    }

    pub fn counter(&self) -> &RequestCounter {
        &self.counter
    }

    /// Handles one request. Unknown operators reply `Hello World`; malformed
    /// arguments fail the returned future.
    pub fn handle(&self, request: &Request) -> Future<Reply> {
        log::debug!("Handling {}", request.uri());
        match self.dispatch(request) {
            Ok(reply) => reply,
            Err(err) => {
                self.reporter.error(&format!("Cannot handle {}. ERROR: {}", request.uri(), err));
                Future::failed(err)
            }
        }
    }

    fn dispatch(&self, request: &Request) -> StrataResult<Future<Reply>> {
        let store = &self.store;
        let reply = match Operator::from_token(request.operator()) {
            Operator::Counter => Future::successful(Reply::Text(format!(
                "Hello {} {}",
                request.uri(),
                self.counter.next()
            ))),
            Operator::FutureCounter => {
                let uri = request.uri().to_string();
                let counter = self.counter.clone();
                Future::spawn(self.db.pool(), move || {
                    Ok(Reply::Text(format!("Hello future {} {}", uri, counter.next())))
                })
            }
            Operator::Uuid => Future::successful(Reply::Text(self.id_generator.generate())),
            Operator::Successful => Future::successful(1).map(|v| Reply::Number(f64::from(v))),
            Operator::AndThen => {
                let (first, second) = (self.reporter.clone(), self.reporter.clone());
                Future::successful(1)
                    .and_then(move |outcome| first.info(&format!("andThen1: {}", describe(outcome))))
                    .and_then(move |outcome| second.info(&format!("andThen2: {}", describe(outcome))))
                    .map(|v| Reply::Number(f64::from(v)))
            }
            Operator::Sequence => {
                let futures = (1..=4).map(Future::<i32>::successful).collect();
                Future::sequence(futures).map(|values| Reply::Number(f64::from(values.iter().sum::<i32>())))
            }
            Operator::FirstCompletedOf => {
                let futures = (1..=4).map(Future::<i32>::successful).collect();
                Future::first_completed_of(futures).map(|v| Reply::Number(f64::from(v)))
            }
            Operator::Insert => store
                .insert(required(request, 0, "key")?, required(request, 1, "value")?)
                .map(Reply::Document),
            Operator::Find => store.find(request.args()).map(Reply::Documents),
            Operator::FindOne => store.find_one(request.args()).map(Reply::from),
            Operator::ReferenceFindOne => store
                .reference_find_one(required(request, 0, "key")?)
                .map(Reply::Document),
            Operator::ReferenceInsert => store
                .reference_insert(required(request, 0, "key")?)
                .map(Reply::Document),
            Operator::ReferenceUpdate => store
                .reference_update(required(request, 0, "key1")?, required(request, 1, "key2")?)
                .map(Reply::Document),
            Operator::Remove => store.remove(request.args()).map(Reply::Removed),
            Operator::RemoveOne => store.remove_one(request.args()).map(Reply::Removed),
            Operator::FindOneWithKey => store
                .find_one_with_key(required(request, 0, "id")?)
                .map(Reply::from),
            Operator::EmbeddingInsert => store
                .embedding_insert(required(request, 0, "key")?, required(request, 1, "value")?)
                .map(Reply::Document),
            Operator::EmbeddingFind => store.embedding_find(request.args()).map(Reply::Documents),
            Operator::Save => {
                let new_value = required(request, 0, "value")?;
                store.save(new_value, &request.args()[1..]).map(Reply::Document)
            }
            Operator::Unknown => Future::successful(Reply::Text("Hello World".to_string())),
        };
        Ok(reply)
    }
}

fn required<'a>(request: &'a Request, index: usize, name: &str) -> StrataResult<&'a str> {
    request.arg(index).ok_or_else(|| {
        log::error!("{} is missing argument '{}'", request.operator(), name);
        StrataError::new(
            &format!("{} needs argument '{}'", request.operator(), name),
            ErrorKind::InvalidOperation,
        )
    })
}

fn describe(outcome: &Outcome<i32>) -> String {
    match outcome {
        Ok(value) => value.to_string(),
        Err(err) => err.to_string(),
    }
}
