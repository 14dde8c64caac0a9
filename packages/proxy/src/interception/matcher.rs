// packages/proxy/src/interception/matcher.rs
//! Interceptor matchers
//!
//! Decide whether an interceptor applies to a target type. Matchers are
//! plain data and compose with [`InterceptorMatcher::and`],
//! [`InterceptorMatcher::or`] and [`InterceptorMatcher::negate`].

use crate::model::descriptor::{TypeDescriptor, TypeRef};
use std::fmt;

/// Predicate over target types
#[derive(Clone)]
pub enum InterceptorMatcher {
    /// Every type
    Any,
    /// No type
    None,
    /// Types that are one of the listed types or a supertype of one
    Types(Vec<TypeRef>),
    /// Types carrying the annotation on themselves or a declared method
    Annotated(String),
    And(Box<InterceptorMatcher>, Box<InterceptorMatcher>),
    Or(Box<InterceptorMatcher>, Box<InterceptorMatcher>),
    Not(Box<InterceptorMatcher>),
}

impl InterceptorMatcher {
    pub fn any() -> Self {
        InterceptorMatcher::Any
    }

    pub fn none() -> Self {
        InterceptorMatcher::None
    }

    pub fn types<I>(types: I) -> Self
    where
        I: IntoIterator<Item = TypeRef>,
    {
        InterceptorMatcher::Types(types.into_iter().collect())
    }

    pub fn annotated(annotation: impl Into<String>) -> Self {
        InterceptorMatcher::Annotated(annotation.into())
    }

    pub fn and(self, other: InterceptorMatcher) -> Self {
        InterceptorMatcher::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: InterceptorMatcher) -> Self {
        InterceptorMatcher::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        InterceptorMatcher::Not(Box::new(self))
    }

    /// Whether the interceptor applies to `ty`
    pub fn matches(&self, ty: &TypeDescriptor) -> bool {
        match self {
            InterceptorMatcher::Any => true,
            InterceptorMatcher::None => false,
            InterceptorMatcher::Types(registered) => {
                registered.iter().any(|r| ty.is_assignable_from(r))
            }
            InterceptorMatcher::Annotated(annotation) => {
                ty.has_annotation(annotation)
                    || ty
                        .declared_methods()
                        .iter()
                        .any(|m| m.has_annotation(annotation))
            }
            InterceptorMatcher::And(a, b) => a.matches(ty) && b.matches(ty),
            InterceptorMatcher::Or(a, b) => a.matches(ty) || b.matches(ty),
            InterceptorMatcher::Not(inner) => !inner.matches(ty),
        }
    }
}

impl Default for InterceptorMatcher {
    fn default() -> Self {
        InterceptorMatcher::Any
    }
}

impl fmt::Debug for InterceptorMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterceptorMatcher::Any => write!(f, "any"),
            InterceptorMatcher::None => write!(f, "none"),
            InterceptorMatcher::Types(types) => f
                .debug_set()
                .entries(types.iter().map(|t| t.name()))
                .finish(),
            InterceptorMatcher::Annotated(a) => write!(f, "@{}", a),
            InterceptorMatcher::And(a, b) => write!(f, "({:?} && {:?})", a, b),
            InterceptorMatcher::Or(a, b) => write!(f, "({:?} || {:?})", a, b),
            InterceptorMatcher::Not(inner) => write!(f, "!{:?}", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::descriptor::MethodDescriptor;

    struct Fixture {
        repository: TypeRef,
        user_repository: TypeRef,
        sql_user_repository: TypeRef,
        clock: TypeRef,
    }

    fn fixture() -> Fixture {
        let repository = TypeDescriptor::capability("Repository").build();
        let user_repository = TypeDescriptor::capability("UserRepository")
            .extends(&repository)
            .method(MethodDescriptor::new("find").arity(1).annotated("Cached"))
            .build();
        let sql_user_repository = TypeDescriptor::concrete("SqlUserRepository")
            .extends(&user_repository)
            .annotated("Transactional")
            .build();
        let clock = TypeDescriptor::capability("Clock").build();
        Fixture {
            repository,
            user_repository,
            sql_user_repository,
            clock,
        }
    }

    #[test]
    fn test_type_set_matches_registered_and_ancestors() {
        let f = fixture();
        let matcher = InterceptorMatcher::types([f.sql_user_repository.clone()]);

        assert!(matcher.matches(&f.sql_user_repository));
        assert!(matcher.matches(&f.user_repository));
        assert!(matcher.matches(&f.repository));
        assert!(!matcher.matches(&f.clock));
    }

    #[test]
    fn test_type_set_does_not_match_descendants() {
        let f = fixture();
        let matcher = InterceptorMatcher::types([f.repository.clone()]);

        assert!(matcher.matches(&f.repository));
        assert!(!matcher.matches(&f.user_repository));
    }

    #[test]
    fn test_annotation_on_type_or_method() {
        let f = fixture();
        assert!(InterceptorMatcher::annotated("Transactional").matches(&f.sql_user_repository));
        assert!(InterceptorMatcher::annotated("Cached").matches(&f.user_repository));
        assert!(!InterceptorMatcher::annotated("Cached").matches(&f.clock));
    }

    #[test]
    fn test_composition() {
        let f = fixture();
        let repos = InterceptorMatcher::types([f.user_repository.clone()]);
        let cached = InterceptorMatcher::annotated("Cached");

        assert!(repos.clone().and(cached.clone()).matches(&f.user_repository));
        assert!(!repos.clone().and(cached.clone().negate()).matches(&f.user_repository));
        assert!(repos.clone().or(InterceptorMatcher::none()).matches(&f.repository));
        assert!(!InterceptorMatcher::none().or(cached).matches(&f.clock));
        assert!(InterceptorMatcher::default().matches(&f.clock));
    }

    #[test]
    fn test_debug_rendering() {
        let f = fixture();
        let matcher = InterceptorMatcher::types([f.clock.clone()]).and(InterceptorMatcher::any());
        assert_eq!(format!("{:?}", matcher), "({\"Clock\"} && any)");
    }
}
