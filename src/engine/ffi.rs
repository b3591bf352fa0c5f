//! C ABI exported by the engine shared library
//!
//! Every entry point returns a [`RawResult`] by value. Its strings belong to
//! the engine and stay valid until the next call, so they are copied out
//! immediately.

use std::ffi::{c_char, c_int, c_void, CStr};

use super::EngineResult;

pub const SYM_INIT: &str = "ultmicr_sdk_init";
pub const SYM_PROCESS: &str = "ultmicr_sdk_process";
pub const SYM_PROCESS_PLANAR: &str = "ultmicr_sdk_process_planar";
pub const SYM_WARM_UP: &str = "ultmicr_sdk_warm_up";
pub const SYM_DEINIT: &str = "ultmicr_sdk_deinit";
pub const SYM_RUNTIME_KEY: &str = "ultmicr_sdk_request_runtime_license_key";

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawResult {
    pub code: c_int,
    pub phrase: *const c_char,
    pub json: *const c_char,
}

impl RawResult {
    /// Copy the result out of engine-owned memory.
    ///
    /// # Safety
    /// `phrase` and `json` must each be null or point to a NUL-terminated
    /// string that is valid for the duration of this call.
    pub unsafe fn into_result(self) -> EngineResult {
        EngineResult {
            code: self.code,
            phrase: copy_c_str(self.phrase),
            json: copy_c_str(self.json),
        }
    }
}

unsafe fn copy_c_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

pub type InitFn = unsafe extern "C" fn(json_config: *const c_char) -> RawResult;

pub type ProcessFn = unsafe extern "C" fn(
    image_type: c_int,
    data: *const c_void,
    width: usize,
    height: usize,
    stride: usize,
    exif_orientation: c_int,
) -> RawResult;

pub type ProcessPlanarFn = unsafe extern "C" fn(
    image_type: c_int,
    y: *const c_void,
    u: *const c_void,
    v: *const c_void,
    width: usize,
    height: usize,
    y_stride: usize,
    u_stride: usize,
    v_stride: usize,
    uv_pixel_stride: usize,
    exif_orientation: c_int,
) -> RawResult;

pub type WarmUpFn = unsafe extern "C" fn(image_type: c_int) -> RawResult;

pub type DeInitFn = unsafe extern "C" fn() -> RawResult;

pub type RuntimeKeyFn = unsafe extern "C" fn(raw_instead_of_json: bool) -> RawResult;
