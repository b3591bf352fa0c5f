//! Runtime license key requests
//!
//! The key identifies this host and is exchanged for a license token, which
//! is then handed to the engine through `license_token_file` or
//! `license_token_data`.

use serde_json::json;
use std::path::Path;
use tracing::info;

use crate::cli::RuntimeKeyArgs;
use crate::engine::{EngineResult, MicrEngine, Session};
use crate::error::Result;
use crate::utils::normalize_separators;

/// Minimal `init` configuration: only the assets folder, when given
pub fn init_config_json(assets: Option<&Path>) -> String {
    match assets {
        Some(folder) => {
            json!({ "assets_folder": normalize_separators(&folder.to_string_lossy()) }).to_string()
        }
        None => "{}".to_string(),
    }
}

/// Ask the engine for the runtime key.
///
/// A refused request is not an error: the non-OK result is handed to
/// `on_result` like any other so it can be reported.
pub fn request_runtime_key<E, F, C>(
    args: &RuntimeKeyArgs,
    load_engine: F,
    on_result: C,
) -> Result<EngineResult>
where
    E: MicrEngine,
    F: FnOnce() -> Result<E>,
    C: FnOnce(&EngineResult),
{
    let config = init_config_json(args.assets.as_deref());
    let engine = load_engine()?;
    let mut session = Session::init_with_json(engine, &config)?;

    info!(
        "Requesting runtime license key ({})...",
        if args.json { "json" } else { "raw" }
    );
    let result = session.request_runtime_license_key(!args.json)?;

    on_result(&result);

    session.deinit()?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_flat;
    use crate::engine::fake::{Call, FakeEngine};
    use serde_json::Value;

    fn args(items: &[&str]) -> RuntimeKeyArgs {
        parse_flat(std::iter::once("runtime-key").chain(items.iter().copied())).unwrap()
    }

    #[test]
    fn test_init_config_json() {
        assert_eq!(init_config_json(None), "{}");

        let json: Value =
            serde_json::from_str(&init_config_json(Some(Path::new("/opt/micr/assets")))).unwrap();
        assert_eq!(json["assets_folder"], "/opt/micr/assets");
        assert_eq!(json.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_request_json_key() {
        let engine = FakeEngine::new();
        let calls = engine.calls();
        let mut printed = String::new();

        let result = request_runtime_key(&args(&[]), || Ok(engine), |r| {
            printed = r.json.clone()
        })
        .unwrap();

        assert!(result.is_ok());
        assert_eq!(printed, r#"{"key":"AAECAwQF"}"#);
        assert_eq!(
            *calls.borrow(),
            vec![
                Call::Init("{}".to_string()),
                Call::RuntimeKey(false),
                Call::DeInit
            ]
        );
    }

    #[test]
    fn test_request_raw_key() {
        let engine = FakeEngine::new();
        let calls = engine.calls();

        let result = request_runtime_key(
            &args(&["--json", "false", "--assets", "../assets"]),
            || Ok(engine),
            |_| {},
        )
        .unwrap();

        assert_eq!(result.json, "AAECAwQF");
        let calls = calls.borrow();
        match &calls[0] {
            Call::Init(json) => assert!(json.contains("../assets")),
            other => panic!("expected Init, got {:?}", other),
        }
        assert_eq!(calls[1], Call::RuntimeKey(true));
    }

    #[test]
    fn test_refused_request_is_reported() {
        let engine = FakeEngine::new().failing("RuntimeKey");
        let calls = engine.calls();
        let mut code = None;

        let result =
            request_runtime_key(&args(&[]), || Ok(engine), |r| code = Some(r.code)).unwrap();

        assert!(!result.is_ok());
        assert_eq!(code, Some(1));
        assert_eq!(calls.borrow().last(), Some(&Call::DeInit));
    }

    #[test]
    fn test_init_failure() {
        let engine = FakeEngine::new().failing("Init");
        let err = request_runtime_key(&args(&[]), || Ok(engine), |_| {}).unwrap_err();
        assert!(matches!(
            err,
            crate::error::MicrError::Engine { operation: "Init", .. }
        ));
    }
}
