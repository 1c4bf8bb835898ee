//! Statements and equality patterns over them

use super::term::Term;
use serde::{Deserialize, Serialize};

/// A subject-predicate-object triple, optionally placed in a named graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Statement {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    /// Named graph; `None` is the default graph
    pub context: Option<Term>,
}

impl Statement {
    /// Create a statement in the default graph
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
            context: None,
        }
    }

    /// Place the statement in a named graph
    pub fn in_context(mut self, context: Term) -> Self {
        self.context = Some(context);
        self
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(ctx) = &self.context {
            write!(f, " {}", ctx)?;
        }
        write!(f, " .")
    }
}

/// Which graphs a pattern or operation applies to
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ContextFilter {
    /// Every graph, default included
    #[default]
    Any,
    /// Only the default graph
    Default,
    /// Only the given named graph
    Named(Term),
}

impl ContextFilter {
    pub fn matches(&self, context: Option<&Term>) -> bool {
        match self {
            Self::Any => true,
            Self::Default => context.is_none(),
            Self::Named(term) => context == Some(term),
        }
    }
}

/// Equality pattern; `None` positions are wildcards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementPattern {
    pub subject: Option<Term>,
    pub predicate: Option<Term>,
    pub object: Option<Term>,
    pub context: ContextFilter,
}

impl StatementPattern {
    /// Pattern matching every statement
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject: Term) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_predicate(mut self, predicate: Term) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn with_object(mut self, object: Term) -> Self {
        self.object = Some(object);
        self
    }

    pub fn with_context(mut self, context: ContextFilter) -> Self {
        self.context = context;
        self
    }

    /// Pattern matching exactly one statement
    pub fn exact(statement: &Statement) -> Self {
        Self {
            subject: Some(statement.subject.clone()),
            predicate: Some(statement.predicate.clone()),
            object: Some(statement.object.clone()),
            context: match &statement.context {
                Some(ctx) => ContextFilter::Named(ctx.clone()),
                None => ContextFilter::Default,
            },
        }
    }

    pub fn matches(&self, statement: &Statement) -> bool {
        fn pos(want: &Option<Term>, have: &Term) -> bool {
            want.as_ref().map_or(true, |w| w == have)
        }
        pos(&self.subject, &statement.subject)
            && pos(&self.predicate, &statement.predicate)
            && pos(&self.object, &statement.object)
            && self.context.matches(statement.context.as_ref())
    }
}
