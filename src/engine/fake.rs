use std::cell::RefCell;
use std::rc::Rc;

use super::{EngineResult, Frame, ImageType, MicrEngine, PlanarFrame};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Init(String),
    Process {
        image_type: ImageType,
        width: usize,
        height: usize,
        stride: usize,
        exif_orientation: i32,
        len: usize,
    },
    ProcessPlanar {
        image_type: ImageType,
        width: usize,
        height: usize,
    },
    WarmUp(ImageType),
    DeInit,
    RuntimeKey(bool),
}

/// In-memory engine that records every call
pub struct FakeEngine {
    calls: Rc<RefCell<Vec<Call>>>,
    failing: Option<&'static str>,
    process_json: String,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            calls: Rc::new(RefCell::new(Vec::new())),
            failing: None,
            process_json: r#"{"frame_id":0,"lines":[]}"#.to_string(),
        }
    }

    /// Make the named operation ("Init", "Process", ...) return a non-OK result
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing = Some(operation);
        self
    }

    pub fn with_process_json(mut self, json: &str) -> Self {
        self.process_json = json.to_string();
        self
    }

    pub fn calls(&self) -> Rc<RefCell<Vec<Call>>> {
        Rc::clone(&self.calls)
    }

    fn respond(&self, operation: &'static str, call: Call, json: &str) -> Result<EngineResult> {
        self.calls.borrow_mut().push(call);
        if self.failing == Some(operation) {
            Ok(EngineResult {
                code: 1,
                phrase: format!("{} failed", operation),
                json: "{}".to_string(),
            })
        } else {
            Ok(EngineResult {
                code: 0,
                phrase: "OK".to_string(),
                json: json.to_string(),
            })
        }
    }
}

impl MicrEngine for FakeEngine {
    fn init(&mut self, config_json: &str) -> Result<EngineResult> {
        self.respond("Init", Call::Init(config_json.to_string()), "{}")
    }

    fn process(&mut self, frame: &Frame<'_>) -> Result<EngineResult> {
        let json = self.process_json.clone();
        self.respond(
            "Process",
            Call::Process {
                image_type: frame.image_type,
                width: frame.width,
                height: frame.height,
                stride: frame.stride,
                exif_orientation: frame.exif_orientation,
                len: frame.data.len(),
            },
            &json,
        )
    }

    fn process_planar(&mut self, frame: &PlanarFrame<'_>) -> Result<EngineResult> {
        let json = self.process_json.clone();
        self.respond(
            "Process",
            Call::ProcessPlanar {
                image_type: frame.image_type,
                width: frame.width,
                height: frame.height,
            },
            &json,
        )
    }

    fn warm_up(&mut self, image_type: ImageType) -> Result<EngineResult> {
        self.respond("WarmUp", Call::WarmUp(image_type), "{}")
    }

    fn deinit(&mut self) -> Result<EngineResult> {
        self.respond("DeInit", Call::DeInit, "{}")
    }

    fn request_runtime_license_key(&mut self, raw_instead_of_json: bool) -> Result<EngineResult> {
        let json = if raw_instead_of_json {
            "AAECAwQF"
        } else {
            r#"{"key":"AAECAwQF"}"#
        };
        self.respond("RuntimeKey", Call::RuntimeKey(raw_instead_of_json), json)
    }
}
