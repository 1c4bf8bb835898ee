//! Citation providers: derive extra statements at write time

use crate::model::{vocab, Statement, Term};

/// Computes the statements derived from one added statement.
///
/// Called inline on the write path of enriching connections, so
/// implementations must be fast and free of side effects. Deriving twice from
/// the same statement must give the same result.
pub trait CitationProvider: Send + Sync {
    /// Derived statements for `statement`; empty when there are none
    fn derive_statements(&self, statement: &Statement) -> Vec<Statement>;
}

/// Provider that never derives anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCitations;

impl CitationProvider for NoCitations {
    fn derive_statements(&self, _statement: &Statement) -> Vec<Statement> {
        Vec::new()
    }
}

/// Links every subject written to a fixed source:
/// `(s, p, o)` yields `(s, derivedFrom, source)` in the same graph.
///
/// Statements that already use the derivation predicate yield nothing, so
/// derived statements never feed back into further derivations.
#[derive(Debug, Clone)]
pub struct DerivedFromProvider {
    predicate: Term,
    source: Term,
}

impl DerivedFromProvider {
    /// Derive with `prov:wasDerivedFrom`
    pub fn new(source: Term) -> Self {
        Self {
            predicate: Term::iri(vocab::PROV_WAS_DERIVED_FROM),
            source,
        }
    }

    pub fn with_predicate(mut self, predicate: Term) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn predicate(&self) -> &Term {
        &self.predicate
    }

    pub fn source(&self) -> &Term {
        &self.source
    }
}

impl CitationProvider for DerivedFromProvider {
    fn derive_statements(&self, statement: &Statement) -> Vec<Statement> {
        if statement.predicate == self.predicate {
            return Vec::new();
        }
        vec![Statement {
            subject: statement.subject.clone(),
            predicate: self.predicate.clone(),
            object: self.source.clone(),
            context: statement.context.clone(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st() -> Statement {
        Statement::new(
            Term::iri("http://ex.org/obj1"),
            Term::iri("http://ex.org/title"),
            Term::literal("Flux data"),
        )
    }

    #[test]
    fn no_citations_is_empty() {
        assert!(NoCitations.derive_statements(&st()).is_empty());
    }

    #[test]
    fn derives_one_statement_per_subject() {
        let provider = DerivedFromProvider::new(Term::iri("http://ex.org/source"));
        let derived = provider.derive_statements(&st());
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].subject, st().subject);
        assert_eq!(derived[0].predicate, Term::iri(vocab::PROV_WAS_DERIVED_FROM));
        assert_eq!(derived[0].object, Term::iri("http://ex.org/source"));
    }

    #[test]
    fn derivation_is_idempotent() {
        let provider = DerivedFromProvider::new(Term::iri("http://ex.org/source"));
        assert_eq!(provider.derive_statements(&st()), provider.derive_statements(&st()));
    }

    #[test]
    fn derived_statements_do_not_derive_further() {
        let provider = DerivedFromProvider::new(Term::iri("http://ex.org/source"));
        let derived = provider.derive_statements(&st());
        assert!(provider.derive_statements(&derived[0]).is_empty());
    }

    #[test]
    fn derived_statement_keeps_graph() {
        let provider = DerivedFromProvider::new(Term::iri("http://ex.org/source"))
            .with_predicate(Term::iri("http://ex.org/citedFrom"));
        let graph = Term::iri("http://ex.org/g");
        let derived = provider.derive_statements(&st().in_context(graph.clone()));
        assert_eq!(derived[0].context, Some(graph));
        assert_eq!(provider.predicate(), &Term::iri("http://ex.org/citedFrom"));
    }
}
