use std::fmt;

/// Error returned when a resource limit is exceeded while dispatching a subscript.
///
/// Limits are checked by the dispatcher before aggregation, so binding itself never
/// observes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// Too many positional index components were written.
    IndexComponents { limit: usize, count: usize },
    /// Too many keyword arguments were written.
    Keywords { limit: usize, count: usize },
    /// Maximum number of dispatched operations exceeded.
    Operation { limit: usize, count: usize },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexComponents { limit, count } => {
                write!(f, "index component limit exceeded: {count} > {limit}")
            }
            Self::Keywords { limit, count } => {
                write!(f, "keyword argument limit exceeded: {count} > {limit}")
            }
            Self::Operation { limit, count } => {
                write!(f, "operation limit exceeded: {count} > {limit}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// Trait for tracking resource usage across subscript dispatches.
///
/// Implementations can enforce limits on argument sizes and the number of operations.
/// [`NoLimitTracker`] compiles every check away; [`LimitedTracker`] enforces a
/// [`ResourceLimits`] configuration.
pub trait ResourceTracker: fmt::Debug {
    /// Called once per dispatch with the flattened argument sizes, before aggregation.
    fn on_subscript(&mut self, positional: usize, keywords: usize) -> Result<(), ResourceError>;
}

/// A resource tracker that imposes no limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLimitTracker;

impl ResourceTracker for NoLimitTracker {
    #[inline]
    fn on_subscript(&mut self, _positional: usize, _keywords: usize) -> Result<(), ResourceError> {
        Ok(())
    }
}

/// Configuration for [`LimitedTracker`]; `None` disables the corresponding limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Maximum number of positional index components per subscript.
    pub max_index_components: Option<usize>,
    /// Maximum number of keyword arguments per subscript.
    pub max_keywords: Option<usize>,
    /// Maximum number of subscript operations over the tracker's lifetime.
    pub max_operations: Option<usize>,
}

/// Recommended cap on keyword arguments when embedding untrusted code.
pub const DEFAULT_MAX_KEYWORDS: usize = 256;

impl ResourceLimits {
    /// Creates limits with everything disabled except the keyword cap.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_keywords: Some(DEFAULT_MAX_KEYWORDS),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn max_index_components(mut self, limit: usize) -> Self {
        self.max_index_components = Some(limit);
        self
    }

    #[must_use]
    pub fn max_keywords(mut self, limit: usize) -> Self {
        self.max_keywords = Some(limit);
        self
    }

    #[must_use]
    pub fn max_operations(mut self, limit: usize) -> Self {
        self.max_operations = Some(limit);
        self
    }
}

/// A resource tracker that enforces [`ResourceLimits`].
#[derive(Debug, Clone)]
pub struct LimitedTracker {
    limits: ResourceLimits,
    operation_count: usize,
}

impl LimitedTracker {
    #[must_use]
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            operation_count: 0,
        }
    }

    /// Number of subscript operations checked so far.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operation_count
    }
}

impl ResourceTracker for LimitedTracker {
    fn on_subscript(&mut self, positional: usize, keywords: usize) -> Result<(), ResourceError> {
        self.operation_count += 1;
        if let Some(limit) = self.limits.max_operations
            && self.operation_count > limit
        {
            return Err(ResourceError::Operation {
                limit,
                count: self.operation_count,
            });
        }
        if let Some(limit) = self.limits.max_index_components
            && positional > limit
        {
            return Err(ResourceError::IndexComponents {
                limit,
                count: positional,
            });
        }
        if let Some(limit) = self.limits.max_keywords
            && keywords > limit
        {
            return Err(ResourceError::Keywords { limit, count: keywords });
        }
        Ok(())
    }
}
