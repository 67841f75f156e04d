use std::{cell::RefCell, env, fs, process::ExitCode, time::Instant};

use serde::{Deserialize, Deserializer};
use subbind::{
    BindTracer, BoundArguments, Dispatcher, ItemHandlers, KwargsValues, NoLimitTracker, NoopTracer, Object,
    ParameterSpec, RunError, RunResult, StderrTracer, SubscriptArgs,
};

/// One subscript operation to run, read from a JSON file.
#[derive(Debug, Deserialize)]
struct Scenario {
    op: OpName,
    #[serde(default = "default_type_name")]
    type_name: String,
    params: Vec<ParamDecl>,
    #[serde(default)]
    positional: Vec<serde_json::Value>,
    #[serde(default)]
    keywords: serde_json::Map<String, serde_json::Value>,
    /// Assigned value for `setitem`; `null` assigns `None`.
    #[serde(default, deserialize_with = "present")]
    value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum OpName {
    Getitem,
    Setitem,
    Delitem,
}

#[derive(Debug, Deserialize)]
struct ParamDecl {
    name: String,
    /// `null` is a real default (`None`), so presence is tracked separately from the value.
    #[serde(default, deserialize_with = "present")]
    default: Option<serde_json::Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error> {
    serde_json::Value::deserialize(deserializer).map(Some)
}

fn default_type_name() -> String {
    "Scenario".to_owned()
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let file_path = if args.len() > 1 { &args[1] } else { "scenario.json" };
    let scenario = match read_scenario(file_path) {
        Ok(scenario) => scenario,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let trace = env::var_os("SUBBIND_TRACE").is_some_and(|v| !v.is_empty() && v != "0");
    let start = Instant::now();
    let outcome = if trace {
        run(scenario, Dispatcher::new(NoLimitTracker, StderrTracer::new()))
    } else {
        run(scenario, Dispatcher::new(NoLimitTracker, NoopTracer))
    };
    let elapsed = start.elapsed();

    match outcome {
        Ok(output) => {
            println!("{output}");
            eprintln!("success after: {elapsed:?}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error after: {elapsed:?}\n{err}");
            ExitCode::FAILURE
        }
    }
}

fn read_scenario(file_path: &str) -> Result<Scenario, String> {
    let text = fs::read_to_string(file_path).map_err(|err| format!("reading {file_path}: {err}"))?;
    parse_scenario(&text).map_err(|err| format!("parsing {file_path}: {err}"))
}

fn parse_scenario(text: &str) -> Result<Scenario, String> {
    let scenario: Scenario = serde_json::from_str(text).map_err(|err| err.to_string())?;
    match (scenario.op, scenario.value.is_some()) {
        (OpName::Setitem, false) => Err("setitem scenario requires a \"value\"".to_owned()),
        (OpName::Getitem | OpName::Delitem, true) => Err("only setitem scenarios take a \"value\"".to_owned()),
        _ => Ok(scenario),
    }
}

/// Registers an echo handler for the scenario's operation and dispatches once.
///
/// Reads print the tuple of bound arguments; writes and deletes print the call the
/// handler received.
fn run<T: BindTracer>(scenario: Scenario, mut dispatcher: Dispatcher<NoLimitTracker, T>) -> Result<String, String> {
    let params: Vec<ParameterSpec> = scenario
        .params
        .into_iter()
        .map(|decl| match decl.default {
            Some(default) => ParameterSpec::with_default(decl.name, Object::from_json_value(default)),
            None => ParameterSpec::required(decl.name),
        })
        .collect();

    let mut keywords = KwargsValues::new();
    for (name, value) in scenario.keywords {
        keywords
            .insert(name, Object::from_json_value(value))
            .map_err(|err| err.to_string())?;
    }
    let args = SubscriptArgs {
        positional: scenario.positional.into_iter().map(Object::from_json_value).collect(),
        keywords,
    };

    let calls: RefCell<Vec<Object>> = RefCell::new(Vec::new());
    let record = |bound: BoundArguments| -> RunResult<()> {
        calls.borrow_mut().push(bound.into_tuple());
        Ok(())
    };
    let handlers = ItemHandlers::new(scenario.type_name);
    let render = |err: RunError| err.to_string();

    match scenario.op {
        OpName::Getitem => {
            let handlers = handlers
                .on_getitem(params, |bound| Ok(bound.into_tuple()))
                .map_err(|err| err.to_string())?;
            let result = dispatcher.get_item(&handlers, args).map_err(render)?;
            Ok(result.py_repr())
        }
        OpName::Setitem => {
            let Some(value) = scenario.value.map(Object::from_json_value) else {
                return Err("setitem scenario requires a \"value\"".to_owned());
            };
            let mut handlers = handlers.on_setitem(params, record).map_err(|err| err.to_string())?;
            dispatcher.set_item(&mut handlers, args, value).map_err(render)?;
            Ok(last_call("__setitem__", &calls))
        }
        OpName::Delitem => {
            let mut handlers = handlers.on_delitem(params, record).map_err(|err| err.to_string())?;
            dispatcher.del_item(&mut handlers, args).map_err(render)?;
            Ok(last_call("__delitem__", &calls))
        }
    }
}

fn last_call(dunder: &str, calls: &RefCell<Vec<Object>>) -> String {
    match calls.borrow().last() {
        Some(call) => format!("{dunder}{}", call.py_repr()),
        None => format!("{dunder} was not called"),
    }
}
