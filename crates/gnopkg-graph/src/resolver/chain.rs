use super::{ResolveError, ResolveResult, Resolver};

/// Tries resolvers in priority order.
///
/// Only [`ResolveError::NotFound`] falls through to the next resolver; any
/// other outcome, including skips, is returned as is.
#[derive(Default)]
pub struct ChainResolver {
    resolvers: Vec<Box<dyn Resolver>>,
}

impl ChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R: Resolver + 'static>(mut self, resolver: R) -> Self {
        self.push(resolver);
        self
    }

    pub fn push<R: Resolver + 'static>(&mut self, resolver: R) {
        self.resolvers.push(Box::new(resolver));
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl Resolver for ChainResolver {
    fn name(&self) -> &str {
        "chain"
    }

    fn resolve(&self, path: &str) -> ResolveResult {
        for resolver in &self.resolvers {
            match resolver.resolve(path) {
                Err(e) if e.is_not_found() => continue,
                other => return other,
            }
        }
        Err(ResolveError::NotFound(path.to_string()))
    }
}
