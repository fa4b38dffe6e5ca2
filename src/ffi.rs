//! C FFI layer for cross-language interoperability.
//!
//! Every string returned by a `preview_*` function, apart from
//! `preview_version`, must be released with `preview_free_string`.

use crate::config::RenderConfig;
use crate::Renderer;
use libc::c_char;
use log::warn;
use std::ffi::{CStr, CString};
use std::ptr;

fn into_c_string(data: String) -> *mut c_char {
    // Interior NULs cannot cross the boundary; drop them rather than fail.
    let c_string = CString::new(data).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|&b| b != 0);
        CString::new(bytes).unwrap_or_default()
    });
    c_string.into_raw()
}

unsafe fn read_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok()
}

/// Render a document with the default configuration.
///
/// `file_type` is a token such as `"md"` or `"tex"`; unknown tokens render as
/// plain text. Returns null if either argument is null or not UTF-8.
///
/// # Safety
///
/// - `content` and `file_type` must be valid null-terminated strings.
/// - The returned string must be freed with `preview_free_string`.
#[no_mangle]
pub unsafe extern "C" fn preview_render(
    content: *const c_char,
    file_type: *const c_char,
) -> *mut c_char {
    let (Some(content), Some(file_type)) = (read_str(content), read_str(file_type)) else {
        return ptr::null_mut();
    };

    into_c_string(crate::render(content, file_type))
}

/// Render a document with a TOML configuration.
///
/// A null `config` uses the defaults. Returns null when the arguments are
/// invalid or the configuration does not build a renderer.
///
/// # Safety
///
/// - `content`, `file_type` and `config` (if not null) must be valid
///   null-terminated strings.
/// - The returned string must be freed with `preview_free_string`.
#[no_mangle]
pub unsafe extern "C" fn preview_render_with_config(
    content: *const c_char,
    file_type: *const c_char,
    config: *const c_char,
) -> *mut c_char {
    let (Some(content), Some(file_type)) = (read_str(content), read_str(file_type)) else {
        return ptr::null_mut();
    };

    let config = if config.is_null() {
        RenderConfig::default()
    } else {
        let Some(toml) = read_str(config) else {
            return ptr::null_mut();
        };
        match RenderConfig::from_toml_str(toml) {
            Ok(config) => config,
            Err(e) => {
                warn!("rejected FFI configuration: {}", e);
                return ptr::null_mut();
            }
        }
    };

    match Renderer::new(config) {
        Ok(renderer) => into_c_string(renderer.render(content, file_type)),
        Err(e) => {
            warn!("rejected FFI configuration: {}", e);
            ptr::null_mut()
        }
    }
}

/// Free a string returned by a `preview_*` function.
///
/// # Safety
///
/// - `s` must be a pointer returned by a `preview_*` function, or null.
#[no_mangle]
pub unsafe extern "C" fn preview_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Get the library version.
///
/// The returned string is static and must not be freed.
#[no_mangle]
pub extern "C" fn preview_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}
