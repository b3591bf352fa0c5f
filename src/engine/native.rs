use libloading::{Library, Symbol};
use std::ffi::{c_void, CString};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ffi::{self, RawResult};
use super::{EngineResult, Frame, ImageType, MicrEngine, PlanarFrame};
use crate::error::{MicrError, Result};

/// Base name of the engine library, decorated per platform by the loader
#[cfg(windows)]
pub const LIBRARY_NAME: &str = "ultimateMICR-SDK";
#[cfg(not(windows))]
pub const LIBRARY_NAME: &str = "ultimate_micr-sdk";

/// `libultimate_micr-sdk.so`, `ultimateMICR-SDK.dll`, ...
pub fn default_library_path() -> PathBuf {
    PathBuf::from(libloading::library_filename(LIBRARY_NAME))
}

/// The engine shared library, loaded at run time
pub struct NativeEngine {
    library: Library,
}

impl NativeEngine {
    /// Load the engine from `path`, or from the platform default name
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_library_path);
        debug!("Loading engine library: {}", path.display());

        // SAFETY: loading runs the library initializers; the engine is trusted vendor code.
        let library = unsafe { Library::new(&path) }
            .map_err(|source| MicrError::LibraryLoad { path, source })?;

        Ok(Self { library })
    }

    fn symbol<T>(&self, name: &'static str) -> Result<Symbol<'_, T>> {
        // SAFETY: T is one of the fn pointer types declared in `ffi`, matching the exported ABI.
        unsafe { self.library.get::<T>(name.as_bytes()) }
            .map_err(|source| MicrError::MissingSymbol { symbol: name, source })
    }
}

fn owned(raw: RawResult) -> EngineResult {
    // SAFETY: the engine returns null or NUL-terminated strings alive until its next call.
    unsafe { raw.into_result() }
}

impl MicrEngine for NativeEngine {
    fn init(&mut self, config_json: &str) -> Result<EngineResult> {
        let init = self.symbol::<ffi::InitFn>(ffi::SYM_INIT)?;
        let config = CString::new(config_json)?;
        // SAFETY: `config` outlives the call.
        Ok(owned(unsafe { init(config.as_ptr()) }))
    }

    fn process(&mut self, frame: &Frame<'_>) -> Result<EngineResult> {
        let process = self.symbol::<ffi::ProcessFn>(ffi::SYM_PROCESS)?;
        // SAFETY: `Frame::new` checked that `data` covers stride * height pixels.
        Ok(owned(unsafe {
            process(
                frame.image_type.as_raw(),
                frame.data.as_ptr() as *const c_void,
                frame.width,
                frame.height,
                frame.stride,
                frame.exif_orientation,
            )
        }))
    }

    fn process_planar(&mut self, frame: &PlanarFrame<'_>) -> Result<EngineResult> {
        frame.validate()?;
        let process = self.symbol::<ffi::ProcessPlanarFn>(ffi::SYM_PROCESS_PLANAR)?;
        // SAFETY: planes are borrowed for the duration of the call and were validated above.
        Ok(owned(unsafe {
            process(
                frame.image_type.as_raw(),
                frame.y.as_ptr() as *const c_void,
                frame.u.as_ptr() as *const c_void,
                frame.v.as_ptr() as *const c_void,
                frame.width,
                frame.height,
                frame.y_stride,
                frame.u_stride,
                frame.v_stride,
                frame.uv_pixel_stride,
                frame.exif_orientation,
            )
        }))
    }

    fn warm_up(&mut self, image_type: ImageType) -> Result<EngineResult> {
        let warm_up = self.symbol::<ffi::WarmUpFn>(ffi::SYM_WARM_UP)?;
        Ok(owned(unsafe { warm_up(image_type.as_raw()) }))
    }

    fn deinit(&mut self) -> Result<EngineResult> {
        let deinit = self.symbol::<ffi::DeInitFn>(ffi::SYM_DEINIT)?;
        Ok(owned(unsafe { deinit() }))
    }

    fn request_runtime_license_key(&mut self, raw_instead_of_json: bool) -> Result<EngineResult> {
        let request = self.symbol::<ffi::RuntimeKeyFn>(ffi::SYM_RUNTIME_KEY)?;
        Ok(owned(unsafe { request(raw_instead_of_json) }))
    }
}
