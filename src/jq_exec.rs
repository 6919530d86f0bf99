//! jq pre-processing of input documents (via `jaq`).
use anyhow::{anyhow, Context, Result};
use jaq_core::{load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

/// Run `filter_src` over `input`; every output of the filter becomes one
/// document.
pub fn run_jaq(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader.load(&arena, program).map_err(|errs| {
        compile_error("parse", errs.into_iter().map(|(_, err)| format!("{err:?}")))
    })?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| {
            compile_error(
                "compile",
                errs.into_iter()
                    .flat_map(|(_, undefined)| undefined)
                    .map(|(name, undef)| format!("undefined `{name}` ({undef:?})")),
            )
        })?;

    let inputs = RcIter::new(core::iter::empty());
    let outputs = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut docs = Vec::new();
    for item in outputs {
        let val = item.map_err(|e| anyhow!("jq runtime error: {e:?}"))?;
        // Val renders as JSON text
        let doc = serde_json::from_str::<Value>(&val.to_string())
            .with_context(|| format!("jq output is not JSON: {val}"))?;
        docs.push(doc);
    }
    Ok(docs)
}

/// One error listing every problem jaq reported while loading or compiling.
fn compile_error(stage: &str, problems: impl IntoIterator<Item = String>) -> anyhow::Error {
    let problems: Vec<String> = problems.into_iter().collect();
    anyhow!("jq {stage} failed: {}", problems.join("; "))
}
