//! C ABI for the did:jis engine. See `include/did_jis.h`.
//!
//! Every `char*` returned here is owned by the caller and must be released
//! with `did_free_string`. Engine handles are released with
//! `did_engine_free`. Functions returning `int32_t` use the stable codes of
//! [`StatusCode`].

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use did_jis_core::did::{self, ID_BUFFER_CAPACITY, METHOD_BUFFER_CAPACITY};
use did_jis_core::{DidEngine, JisError, StatusCode};
use tracing::{debug, error};

/// Opaque engine handle (`did_engine_t` in C).
pub struct DidEngineHandle {
    engine: DidEngine,
}

static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
static UNKNOWN_STATUS: &str = "unknown status\0";

unsafe fn str_arg<'a>(p: *const c_char, name: &str) -> Result<&'a str, StatusCode> {
    if p.is_null() {
        debug!(argument = name, "null pointer argument");
        return Err(StatusCode::InvalidArgument);
    }
    CStr::from_ptr(p).to_str().map_err(|_| {
        debug!(argument = name, "argument is not valid UTF-8");
        StatusCode::InvalidArgument
    })
}

/// Message bytes up to the terminator; any byte values are accepted.
unsafe fn bytes_arg<'a>(p: *const c_char, name: &str) -> Result<&'a [u8], StatusCode> {
    if p.is_null() {
        debug!(argument = name, "null pointer argument");
        return Err(StatusCode::InvalidArgument);
    }
    Ok(CStr::from_ptr(p).to_bytes())
}

unsafe fn engine_arg<'a>(p: *const DidEngineHandle) -> Result<&'a DidEngine, StatusCode> {
    p.as_ref().map(|h| &h.engine).ok_or_else(|| {
        debug!("null engine handle");
        StatusCode::InvalidArgument
    })
}

fn status_of(err: &JisError) -> StatusCode {
    if err.is_fatal() {
        error!(error = %err, "fatal engine error");
    } else {
        debug!(error = %err, "engine call rejected");
    }
    err.status()
}

fn into_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c) => c.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn string_or_null(r: Result<String, StatusCode>) -> *mut c_char {
    r.map(into_c_string).unwrap_or(ptr::null_mut())
}

fn into_handle(engine: DidEngine) -> *mut DidEngineHandle {
    Box::into_raw(Box::new(DidEngineHandle { engine }))
}

/// Create an engine with a fresh Ed25519 keypair. NULL on RNG failure.
#[no_mangle]
pub extern "C" fn did_engine_new() -> *mut DidEngineHandle {
    match DidEngine::generate() {
        Ok(engine) => into_handle(engine),
        Err(e) => {
            status_of(&e);
            ptr::null_mut()
        }
    }
}

/// Create an engine from a 64 character hex secret. NULL on invalid input.
///
/// # Safety
/// `secret_hex` must be NULL or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn did_engine_from_secret(secret_hex: *const c_char) -> *mut DidEngineHandle {
    let mut out = ptr::null_mut();
    did_engine_from_secret_ex(secret_hex, &mut out);
    out
}

/// Like `did_engine_from_secret` but reports why construction failed.
///
/// # Safety
/// `secret_hex` must be NULL or a valid NUL-terminated string; `out_engine`
/// must be NULL or writable. `*out_engine` is set to NULL on failure.
#[no_mangle]
pub unsafe extern "C" fn did_engine_from_secret_ex(
    secret_hex: *const c_char,
    out_engine: *mut *mut DidEngineHandle,
) -> i32 {
    if out_engine.is_null() {
        return StatusCode::InvalidArgument.code();
    }
    *out_engine = ptr::null_mut();

    let secret = match str_arg(secret_hex, "secret_hex") {
        Ok(s) => s,
        Err(status) => return status.code(),
    };
    match DidEngine::from_secret(secret) {
        Ok(engine) => {
            *out_engine = into_handle(engine);
            StatusCode::Ok.code()
        }
        Err(e) => status_of(&e).code(),
    }
}

/// Release an engine. NULL is ignored.
///
/// # Safety
/// `engine` must be NULL or a handle from this library not yet freed.
#[no_mangle]
pub unsafe extern "C" fn did_engine_free(engine: *mut DidEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// 64 character lowercase hex public key.
///
/// # Safety
/// `engine` must be NULL or a live handle.
#[no_mangle]
pub unsafe extern "C" fn did_get_public_key(engine: *const DidEngineHandle) -> *mut c_char {
    string_or_null(engine_arg(engine).map(DidEngine::public_key_hex))
}

/// Multibase (`z6Mk…`) public key.
///
/// # Safety
/// `engine` must be NULL or a live handle.
#[no_mangle]
pub unsafe extern "C" fn did_get_public_key_multibase(
    engine: *const DidEngineHandle,
) -> *mut c_char {
    string_or_null(engine_arg(engine).map(DidEngine::public_key_multibase))
}

/// `did:jis:<id>`, or NULL when `id` is outside the grammar.
///
/// # Safety
/// Pointers must be NULL or valid (see header).
#[no_mangle]
pub unsafe extern "C" fn did_create(
    engine: *const DidEngineHandle,
    id: *const c_char,
) -> *mut c_char {
    string_or_null((|| -> Result<String, StatusCode> {
        let engine = engine_arg(engine)?;
        let id = str_arg(id, "id")?;
        engine
            .create_did(id)
            .map(String::from)
            .map_err(|e| status_of(&e))
    })())
}

/// DID derived from the SHA-256 of the engine's public key.
///
/// # Safety
/// `engine` must be NULL or a live handle.
#[no_mangle]
pub unsafe extern "C" fn did_create_from_key(engine: *const DidEngineHandle) -> *mut c_char {
    string_or_null(engine_arg(engine).map(|e| e.create_did_from_key().into()))
}

/// Parse into `method[32]` and `id[256]`. False on any failure.
///
/// # Safety
/// `method` must point to 32 writable bytes and `id` to 256.
#[no_mangle]
pub unsafe extern "C" fn did_parse(did: *const c_char, method: *mut c_char, id: *mut c_char) -> bool {
    did_parse_ex(did, method, METHOD_BUFFER_CAPACITY, id, ID_BUFFER_CAPACITY) == StatusCode::Ok.code()
}

/// Parse with explicit buffer capacities. Returns `BufferTooSmall` rather
/// than truncating; buffers are untouched on failure.
///
/// # Safety
/// `method` must point to `method_cap` writable bytes and `id` to `id_cap`.
#[no_mangle]
pub unsafe extern "C" fn did_parse_ex(
    did: *const c_char,
    method: *mut c_char,
    method_cap: usize,
    id: *mut c_char,
    id_cap: usize,
) -> i32 {
    if method.is_null() || id.is_null() {
        return StatusCode::InvalidArgument.code();
    }
    let did = match str_arg(did, "did") {
        Ok(s) => s,
        Err(status) => return status.code(),
    };
    let method_buf = std::slice::from_raw_parts_mut(method.cast::<u8>(), method_cap);
    let id_buf = std::slice::from_raw_parts_mut(id.cast::<u8>(), id_cap);
    match did::parse_into(did, method_buf, id_buf) {
        Ok(_) => StatusCode::Ok.code(),
        Err(e) => status_of(&e).code(),
    }
}

/// True for a well-formed `did:jis:` identifier.
///
/// # Safety
/// `did` must be NULL or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn did_is_valid(did: *const c_char) -> bool {
    str_arg(did, "did").map(DidEngine::is_valid_did).unwrap_or(false)
}

/// Signed DID document as compact JSON, or NULL.
///
/// # Safety
/// Pointers must be NULL or valid (see header).
#[no_mangle]
pub unsafe extern "C" fn did_create_document(
    engine: *const DidEngineHandle,
    did: *const c_char,
) -> *mut c_char {
    string_or_null((|| -> Result<String, StatusCode> {
        let engine = engine_arg(engine)?;
        let did = str_arg(did, "did")?;
        engine
            .create_document(did)
            .and_then(|doc| doc.to_json())
            .map_err(|e| status_of(&e))
    })())
}

/// Hex signature over the bytes of `message` (terminator excluded).
///
/// # Safety
/// Pointers must be NULL or valid (see header).
#[no_mangle]
pub unsafe extern "C" fn did_sign(
    engine: *const DidEngineHandle,
    message: *const c_char,
) -> *mut c_char {
    string_or_null((|| -> Result<String, StatusCode> {
        let engine = engine_arg(engine)?;
        let message = bytes_arg(message, "message")?;
        Ok(engine.sign(message))
    })())
}

/// True when `signature` verifies under the engine key.
///
/// # Safety
/// Pointers must be NULL or valid (see header).
#[no_mangle]
pub unsafe extern "C" fn did_verify(
    engine: *const DidEngineHandle,
    message: *const c_char,
    signature: *const c_char,
) -> bool {
    let mut valid = false;
    did_verify_ex(engine, message, signature, &mut valid) == StatusCode::Ok.code() && valid
}

/// Verify with the engine key, separating bad encoding from a mismatch.
/// `*out_valid` is false unless the call returns `DID_OK`.
///
/// # Safety
/// Pointers must be NULL or valid; `out_valid` must be writable.
#[no_mangle]
pub unsafe extern "C" fn did_verify_ex(
    engine: *const DidEngineHandle,
    message: *const c_char,
    signature: *const c_char,
    out_valid: *mut bool,
) -> i32 {
    if out_valid.is_null() {
        return StatusCode::InvalidArgument.code();
    }
    *out_valid = false;

    let result = (|| -> Result<bool, StatusCode> {
        let engine = engine_arg(engine)?;
        let message = bytes_arg(message, "message")?;
        let signature = str_arg(signature, "signature")?;
        engine
            .verify(message, signature)
            .map_err(|e| status_of(&e))
    })();
    match result {
        Ok(valid) => {
            *out_valid = valid;
            StatusCode::Ok.code()
        }
        Err(status) => status.code(),
    }
}

/// Verify with a 64 character hex public key. Fails closed.
///
/// # Safety
/// Pointers must be NULL or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn did_verify_with_key(
    message: *const c_char,
    signature: *const c_char,
    public_key_hex: *const c_char,
) -> bool {
    let (Ok(message), Ok(signature), Ok(pk)) = (
        bytes_arg(message, "message"),
        str_arg(signature, "signature"),
        str_arg(public_key_hex, "public_key_hex"),
    ) else {
        return false;
    };
    DidEngine::verify_with_key(message, signature, pk)
}

/// Release a string returned by this library. NULL is ignored.
///
/// # Safety
/// `s` must be NULL or a pointer returned by this library not yet freed.
#[no_mangle]
pub unsafe extern "C" fn did_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Static version string. Do not free.
#[no_mangle]
pub extern "C" fn did_version() -> *const c_char {
    VERSION.as_ptr().cast()
}

/// Static description of a status code. Do not free.
#[no_mangle]
pub extern "C" fn did_status_message(code: i32) -> *const c_char {
    StatusCode::from_code(code)
        .map(StatusCode::message_with_nul)
        .unwrap_or(UNKNOWN_STATUS)
        .as_ptr()
        .cast()
}
