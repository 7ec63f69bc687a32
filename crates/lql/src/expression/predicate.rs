//! Predicate combinators.
//!
//! Predicates built independently usually disagree on their parameter
//! name. `and`/`or` rebind the right-hand predicate's parameter to the
//! left-hand one before joining the bodies, so the result is again a
//! single-parameter predicate.

use super::{Entity, Expr, Lambda};
use std::fmt;
use std::marker::PhantomData;

/// Boolean expression over one parameter of entity type `T`.
pub struct Predicate<T> {
    parameter: String,
    body: Expr,
    _entity: PhantomData<fn(&T)>,
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            parameter: self.parameter.clone(),
            body: self.body.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("parameter", &self.parameter)
            .field("body", &self.body)
            .finish()
    }
}

impl<T> PartialEq for Predicate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.parameter == other.parameter && self.body == other.body
    }
}

const DEFAULT_PARAMETER: &str = "x";

impl<T: Entity> Predicate<T> {
    pub fn new(parameter: impl Into<String>, body: Expr) -> Self {
        Self {
            parameter: parameter.into(),
            body,
            _entity: PhantomData,
        }
    }

    /// Build the body from the parameter expression
    pub fn lambda(parameter: impl Into<String>, build: impl FnOnce(Expr) -> Expr) -> Self {
        let lambda = Lambda::new(parameter, build);
        Self::new(lambda.parameter, lambda.body)
    }

    /// Matches every row
    pub fn always_true() -> Self {
        Self::new(DEFAULT_PARAMETER, Expr::constant(true))
    }

    /// Matches no row
    pub fn always_false() -> Self {
        Self::new(DEFAULT_PARAMETER, Expr::constant(false))
    }

    pub fn and(self, other: Predicate<T>) -> Self {
        let right = other.body.rebind(&other.parameter, &self.parameter);
        Self::new(self.parameter, self.body.and_also(right))
    }

    pub fn or(self, other: Predicate<T>) -> Self {
        let right = other.body.rebind(&other.parameter, &self.parameter);
        Self::new(self.parameter, self.body.or_else(right))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::new(self.parameter, self.body.negate())
    }

    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    pub fn body(&self) -> &Expr {
        &self.body
    }

    pub fn into_lambda(self) -> Lambda {
        Lambda {
            parameter: self.parameter,
            body: self.body,
        }
    }
}
