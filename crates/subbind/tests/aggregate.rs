use pretty_assertions::assert_eq;
use subbind::{Object, aggregate_index};

#[test]
fn no_components_is_empty_tuple() {
    let index = aggregate_index(vec![]);
    assert_eq!(index, Object::empty_tuple());
    assert_eq!(index.py_repr(), "()");
}

#[test]
fn one_component_is_bare() {
    assert_eq!(aggregate_index(vec![Object::Int(1)]), Object::Int(1));
    assert_eq!(aggregate_index(vec![Object::str("a")]), Object::str("a"));

    let slice = Object::slice(None, Some(Object::Int(3)), None);
    assert_eq!(aggregate_index(vec![slice.clone()]), slice);
}

#[test]
fn one_empty_tuple_component_stays_as_written() {
    // obj[()] and obj[kw=1] both receive ()
    assert_eq!(aggregate_index(vec![Object::empty_tuple()]), Object::empty_tuple());
}

#[test]
fn many_components_form_tuple_in_order() {
    let index = aggregate_index(vec![Object::Int(1), Object::Int(2)]);
    assert_eq!(index, Object::Tuple(vec![Object::Int(1), Object::Int(2)]));

    let index = aggregate_index(vec![
        Object::slice(Some(Object::Int(1)), None, None),
        Object::Ellipsis,
        Object::Tuple(vec![Object::Int(0)]),
    ]);
    assert_eq!(index.py_repr(), "(slice(1, None, None), Ellipsis, (0,))");
}

#[test]
fn arity_law() {
    for n in 0..6_i64 {
        let components: Vec<Object> = (0..n).map(Object::Int).collect();
        let index = aggregate_index(components.clone());
        match n {
            0 => assert_eq!(index, Object::empty_tuple()),
            1 => assert_eq!(index, components[0]),
            _ => assert_eq!(index, Object::Tuple(components)),
        }
    }
}
