#![allow(dead_code)]

use appx::prelude::*;
use std::sync::Mutex;

/// Shared, ordered record of what hooks ran
#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries starting with `prefix`, in order
    pub fn filtered(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.starts_with(prefix))
            .collect()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}

/// Which steps of a recording behavior should fail
#[derive(Clone, Copy, Default)]
pub struct Fail {
    pub init: bool,
    pub validate: bool,
    pub start: bool,
    pub stop: bool,
    pub clean: bool,
}

fn outcome(fail: bool, step: &str, name: &str) -> HookResult {
    if fail {
        Err(format!("{step} {name} failed").into())
    } else {
        Ok(())
    }
}

pub fn recording(trace: &Trace, name: &'static str) -> Behavior {
    recording_with(trace, name, Fail::default())
}

/// A behavior that records `"<step> <name>"` for every step it runs
pub fn recording_with(trace: &Trace, name: &'static str, fail: Fail) -> Behavior {
    let on_init = trace.clone();
    let on_start = trace.clone();
    let on_stop = trace.clone();
    let on_clean = trace.clone();

    Behavior::new()
        .on_init(move |_ctx: InitContext| {
            let trace = on_init.clone();
            async move {
                trace.record(format!("init {name}"));
                outcome(fail.init, "init", name)
            }
        })
        .on_validate(move || outcome(fail.validate, "validate", name))
        .on_start(move |_ctx: Context| {
            let trace = on_start.clone();
            async move {
                trace.record(format!("start {name}"));
                outcome(fail.start, "start", name)
            }
        })
        .on_stop(move |_ctx: Context| {
            let trace = on_stop.clone();
            async move {
                trace.record(format!("stop {name}"));
                outcome(fail.stop, "stop", name)
            }
        })
        .on_clean(move || {
            let trace = on_clean.clone();
            async move {
                trace.record(format!("clean {name}"));
                outcome(fail.clean, "clean", name)
            }
        })
}

/// Options whose error handler records `"error <message>"` into `trace`
pub fn options_with_sink(trace: &Trace) -> OptionsBuilder {
    let sink = trace.clone();
    Options::builder().error_handler(move |err| sink.record(format!("error {err}")))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
