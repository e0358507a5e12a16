mod accessor;
mod field_spec;
mod schema;

pub use accessor::*;
pub use field_spec::*;
pub use schema::*;
