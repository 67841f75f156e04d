use crate::object::Object;

/// Collapses the positional components of a subscript into the single index value
/// passed as the handler's first argument.
///
/// - no components: the empty tuple, as in `obj[kw=1]`
/// - one component: that component itself, never wrapped
/// - two or more: a tuple of the components in the order they were written
///
/// Keyword arguments interleaved between components have no effect on the order.
#[must_use]
pub fn aggregate_index(mut positional: Vec<Object>) -> Object {
    if positional.len() == 1
        && let Some(only) = positional.pop()
    {
        return only;
    }
    // an empty vector is the empty-tuple sentinel
    Object::Tuple(positional)
}
