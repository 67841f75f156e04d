use pretty_assertions::assert_eq;
use subbind::{
    BindingError, KwargsValues, NoopTracer, Object, ParameterSpec, RecordingTracer, Signature, SignatureError,
    SubscriptOp, TraceEvent, aggregate_index,
};

fn kwargs(pairs: &[(&str, Object)]) -> KwargsValues {
    let mut kw = KwargsValues::new();
    for (name, value) in pairs {
        kw.insert(*name, value.clone()).unwrap();
    }
    kw
}

fn getitem(names: &[&str]) -> Signature {
    Signature::from_names(SubscriptOp::GetItem, names.iter().copied()).unwrap()
}

fn bind_get(sig: &Signature, positional: Vec<Object>, kw: &[(&str, Object)]) -> Result<Vec<Object>, BindingError> {
    sig.bind(aggregate_index(positional), None, kwargs(kw), &mut NoopTracer)
        .map(subbind::BoundArguments::into_vec)
}

#[test]
fn keyword_order_does_not_matter() {
    let sig = getitem(&["index", "kw1", "kw2"]);
    let forward = bind_get(
        &sig,
        vec![Object::Int(1)],
        &[("kw1", Object::str("hello")), ("kw2", Object::str("hi"))],
    );
    let backward = bind_get(
        &sig,
        vec![Object::Int(1)],
        &[("kw2", Object::str("hi")), ("kw1", Object::str("hello"))],
    );
    assert_eq!(forward, backward);
    assert_eq!(
        forward.unwrap(),
        vec![Object::Int(1), Object::str("hello"), Object::str("hi")]
    );
}

#[test]
fn missing_names_follow_declaration_order() {
    let sig = getitem(&["index", "a", "b", "c"]);
    let err = bind_get(&sig, vec![Object::Int(0)], &[("b", Object::Int(2))]).unwrap_err();
    assert_eq!(err, BindingError::MissingRequired(vec!["a".to_owned(), "c".to_owned()]));
    assert_eq!(err.missing_names(), ["a".to_owned(), "c".to_owned()]);
    assert_eq!(err.to_string(), "missing 2 required positional arguments: 'a' and 'c'");

    let err = bind_get(&sig, vec![Object::Int(0)], &[]).unwrap_err();
    assert_eq!(err.to_string(), "missing 3 required positional arguments: 'a', 'b' and 'c'");
}

#[test]
fn unexpected_keyword_reports_first_leftover() {
    let sig = getitem(&["index", "kw1"]);
    let err = bind_get(
        &sig,
        vec![Object::Int(1)],
        &[
            ("zzz", Object::Int(0)),
            ("kw1", Object::Int(1)),
            ("aaa", Object::Int(2)),
        ],
    )
    .unwrap_err();
    assert_eq!(err, BindingError::UnexpectedKeyword("zzz".to_owned()));
    assert_eq!(err.to_string(), "got an unexpected keyword argument 'zzz'");
    assert!(err.missing_names().is_empty());
}

#[test]
fn missing_wins_over_unexpected() {
    let sig = getitem(&["index", "kw1"]);
    let err = bind_get(&sig, vec![Object::Int(1)], &[("other", Object::Int(0))]).unwrap_err();
    assert_eq!(err, BindingError::MissingRequired(vec!["kw1".to_owned()]));
}

#[test]
fn index_param_name_is_not_a_keyword_target() {
    let sig = getitem(&["index", "kw1"]);
    let err = bind_get(
        &sig,
        vec![Object::Int(1)],
        &[("kw1", Object::Int(2)), ("index", Object::Int(3))],
    )
    .unwrap_err();
    assert_eq!(err, BindingError::UnexpectedKeyword("index".to_owned()));
}

#[test]
fn positional_only_signature_rejects_any_keyword() {
    let sig = getitem(&["key"]);
    assert_eq!(
        bind_get(&sig, vec![Object::str("a")], &[]).unwrap(),
        vec![Object::str("a")]
    );
    let err = bind_get(&sig, vec![Object::str("a")], &[("kw", Object::None)]).unwrap_err();
    assert_eq!(err, BindingError::UnexpectedKeyword("kw".to_owned()));
}

#[test]
fn defaults_fill_unsupplied_extras() {
    let sig = Signature::new(
        SubscriptOp::GetItem,
        vec![
            ParameterSpec::required("index"),
            ParameterSpec::with_default("kw1", "kw1def"),
            ParameterSpec::with_default("kw2", "kw2def"),
        ],
    )
    .unwrap();

    let bound = bind_get(&sig, vec![Object::Int(1), Object::Int(2)], &[]).unwrap();
    assert_eq!(
        Object::Tuple(bound).py_repr(),
        "((1, 2), 'kw1def', 'kw2def')"
    );

    let bound = bind_get(
        &sig,
        vec![Object::Int(1), Object::Int(2)],
        &[("kw2", Object::str("hello"))],
    )
    .unwrap();
    assert_eq!(Object::Tuple(bound).py_repr(), "((1, 2), 'kw1def', 'hello')");
}

#[test]
fn none_is_a_real_default() {
    let sig = Signature::new(
        SubscriptOp::GetItem,
        vec![ParameterSpec::required("index"), ParameterSpec::with_default("kw", Object::None)],
    )
    .unwrap();
    assert_eq!(
        bind_get(&sig, vec![], &[]).unwrap(),
        vec![Object::empty_tuple(), Object::None]
    );
}

#[test]
fn setitem_value_fills_second_slot() {
    let sig = Signature::from_names(SubscriptOp::SetItem, ["index", "value", "kw1"]).unwrap();
    let bound = sig
        .bind(
            aggregate_index(vec![Object::Int(1), Object::Int(2)]),
            Some(Object::Int(5)),
            kwargs(&[("kw1", Object::str("hello"))]),
            &mut NoopTracer,
        )
        .unwrap();
    assert_eq!(
        bound.as_slice(),
        [
            Object::Tuple(vec![Object::Int(1), Object::Int(2)]),
            Object::Int(5),
            Object::str("hello"),
        ]
    );
    assert_eq!(bound.get(1), Some(&Object::Int(5)));
}

#[test]
fn setitem_value_is_never_taken_from_keywords() {
    let sig = Signature::from_names(SubscriptOp::SetItem, ["index", "value"]).unwrap();
    let err = sig
        .bind(
            Object::Int(1),
            None,
            kwargs(&[("value", Object::Int(5))]),
            &mut NoopTracer,
        )
        .unwrap_err();
    assert_eq!(err, BindingError::MissingRequired(vec!["value".to_owned()]));
}

#[test]
fn binding_does_not_mutate_signature() {
    let sig = Signature::new(
        SubscriptOp::DelItem,
        vec![ParameterSpec::required("index"), ParameterSpec::with_default("kw", 0)],
    )
    .unwrap();
    let before = sig.clone();
    let _ = bind_get(&sig, vec![Object::Int(1)], &[("kw", Object::Int(9))]);
    let _ = bind_get(&sig, vec![Object::Int(1)], &[("bad", Object::Int(9))]);
    assert_eq!(sig, before);
    assert_eq!(
        bind_get(&sig, vec![Object::Int(1)], &[]).unwrap(),
        vec![Object::Int(1), Object::Int(0)]
    );
}

#[test]
fn tracer_records_binding_steps() {
    let sig = Signature::new(
        SubscriptOp::GetItem,
        vec![
            ParameterSpec::required("index"),
            ParameterSpec::required("kw1"),
            ParameterSpec::with_default("kw2", "dflt"),
        ],
    )
    .unwrap();
    let mut tracer = RecordingTracer::new();
    sig.bind(
        Object::Int(1),
        None,
        kwargs(&[("kw1", Object::str("a"))]),
        &mut tracer,
    )
    .unwrap();

    assert_eq!(
        tracer.take_events(),
        vec![
            TraceEvent::BindStart {
                op: SubscriptOp::GetItem,
                params: 3,
                keywords: 1,
            },
            TraceEvent::KeywordBound { name: "kw1".to_owned() },
            TraceEvent::DefaultApplied { name: "kw2".to_owned() },
        ]
    );

    let err = sig.bind(Object::Int(1), None, KwargsValues::new(), &mut tracer).unwrap_err();
    assert_eq!(
        tracer.events().last(),
        Some(&TraceEvent::BindError { error: err })
    );
}

// === signature validation ===

#[test]
fn signature_accessors_split_params() {
    let sig = Signature::new(
        SubscriptOp::SetItem,
        vec![
            ParameterSpec::required("index"),
            ParameterSpec::required("value"),
            ParameterSpec::required("kw1"),
            ParameterSpec::with_default("kw2", 1),
        ],
    )
    .unwrap();
    assert_eq!(sig.op(), SubscriptOp::SetItem);
    assert_eq!(sig.index_param().name(), "index");
    assert_eq!(sig.value_param().map(ParameterSpec::name), Some("value"));
    let extras: Vec<&str> = sig.extra_params().iter().map(ParameterSpec::name).collect();
    assert_eq!(extras, ["kw1", "kw2"]);
    assert_eq!(sig.param_names().collect::<Vec<_>>(), ["index", "value", "kw1", "kw2"]);
    assert_eq!(sig.extra_params()[1].default_value(), Some(&Object::Int(1)));

    let get = getitem(&["index", "kw"]);
    assert_eq!(get.value_param(), None);
}

#[test]
fn signature_requires_positional_slots() {
    assert_eq!(
        Signature::new(SubscriptOp::GetItem, vec![]).unwrap_err(),
        SignatureError::MissingIndexParam(SubscriptOp::GetItem)
    );
    assert_eq!(
        Signature::from_names(SubscriptOp::SetItem, ["index"]).unwrap_err(),
        SignatureError::MissingValueParam
    );
    assert_eq!(
        SignatureError::MissingIndexParam(SubscriptOp::DelItem).to_string(),
        "__delitem__() must accept an index parameter"
    );
}

#[test]
fn signature_rejects_duplicate_names() {
    let err = Signature::from_names(SubscriptOp::GetItem, ["index", "kw", "kw"]).unwrap_err();
    assert_eq!(err, SignatureError::DuplicateParameter("kw".to_owned()));
    assert_eq!(err.to_string(), "duplicate argument 'kw' in function definition");
}

#[test]
fn signature_rejects_required_after_default() {
    let err = Signature::new(
        SubscriptOp::GetItem,
        vec![
            ParameterSpec::required("index"),
            ParameterSpec::with_default("kw1", 1),
            ParameterSpec::required("kw2"),
        ],
    )
    .unwrap_err();
    assert_eq!(err, SignatureError::NonDefaultAfterDefault("kw2".to_owned()));
    assert_eq!(
        err.to_string(),
        "parameter without a default follows parameter with a default: 'kw2'"
    );
}

#[test]
fn signature_dump_load_preserves_binding() {
    let sig = Signature::new(
        SubscriptOp::SetItem,
        vec![
            ParameterSpec::required("index"),
            ParameterSpec::required("value"),
            ParameterSpec::with_default("kw", Object::Tuple(vec![Object::Int(1), Object::str("x")])),
        ],
    )
    .unwrap();
    let bytes = sig.dump().unwrap();
    let loaded = Signature::load(&bytes).unwrap();
    assert_eq!(loaded, sig);

    let bound = loaded
        .bind(Object::Int(0), Some(Object::None), KwargsValues::new(), &mut NoopTracer)
        .unwrap();
    assert_eq!(bound.into_tuple().py_repr(), "(0, None, (1, 'x'))");
}

#[test]
fn signature_load_rejects_garbage() {
    let err = Signature::load(&[0xff, 0xff, 0xff]).unwrap_err();
    assert!(matches!(err, SignatureError::Decode(_)), "got {err:?}");
}

#[test]
fn deserializing_revalidates_parameters() {
    let short_setitem = r#"{"op":"SetItem","params":[{"name":"index","kind":"PositionalOrKeyword","default":null}]}"#;
    let err = serde_json::from_str::<Signature>(short_setitem).unwrap_err();
    assert!(
        err.to_string().contains("__setitem__() must accept index and value parameters"),
        "got {err}"
    );

    let duplicate = r#"{"op":"GetItem","params":[
        {"name":"index","kind":"PositionalOrKeyword","default":null},
        {"name":"index","kind":"PositionalOrKeyword","default":null}
    ]}"#;
    let err = serde_json::from_str::<Signature>(duplicate).unwrap_err();
    assert!(err.to_string().contains("duplicate argument 'index'"), "got {err}");

    let valid = Signature::from_names(SubscriptOp::SetItem, ["index", "value"]).unwrap();
    let json = serde_json::to_string(&valid).unwrap();
    assert!(!json.contains("bind_mode"), "got {json}");
    assert_eq!(serde_json::from_str::<Signature>(&json).unwrap(), valid);
}

#[test]
fn load_rejects_invalid_parameter_list() {
    let short = Signature::from_names(SubscriptOp::GetItem, ["index"]).unwrap();
    // a __getitem__ signature reinterpreted as __setitem__ has no value slot
    let mut bytes = short.dump().unwrap();
    bytes[0] = 1;
    let err = Signature::load(&bytes).unwrap_err();
    assert!(matches!(err, SignatureError::Decode(_)), "got {err:?}");
}
