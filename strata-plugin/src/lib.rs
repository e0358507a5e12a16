//! # strata-plugin
//!
//! A request handler over the strata runtime. Each [Request] names an
//! operator; [Plugin::handle] runs it and answers with a
//! [strata::future::Future] of [Reply].
//!
//! The operators fall into three groups:
//!
//! - runtime demos: `counter`, `futureCounter`, `uuid`, `successful`,
//!   `andThen`, `sequence`, `firstCompletedOf`
//! - key-value collection: `insert`, `find`, `findOne`, `remove`,
//!   `removeOne`, `save`, `findOneWithKey`
//! - references and embeddings: `referenceInsert`, `referenceFindOne`,
//!   `referenceUpdate`, `embeddingInsert`, `embeddingFind`
//!
//! Any other operator replies `Hello World`. Outcomes are reported through
//! an injected [Reporter].

mod counter;
mod demo_store;
mod id_generator;
mod plugin;
mod reply;
mod reporter;
mod request;

pub use counter::*;
pub use demo_store::*;
pub use id_generator::*;
pub use plugin::*;
pub use reply::*;
pub use reporter::{LogReporter, Reporter};
pub use request::*;
