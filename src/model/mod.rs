//! RDF data model: terms, statements and statement patterns

mod statement;
mod term;


pub use statement::{ContextFilter, Statement, StatementPattern};
pub use term::Term;

/// Well-known vocabulary IRIs
pub mod vocab {
    pub const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const PROV_WAS_DERIVED_FROM: &str = "http://www.w3.org/ns/prov#wasDerivedFrom";
}
