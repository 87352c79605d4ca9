use std::ffi::{c_char, c_void, CStr};

use mfx_sys::*;

use super::format::{format, VaArgs};
use super::varargs::{self, SUPPORTED};
use super::{c_str, handle_mut};
use crate::error::{into_status, MfxError};
use crate::mesh_effect::{MeshEffect, MessageType};

pub static MESSAGE_SUITE_V2: OfxMessageSuiteV2 = OfxMessageSuiteV2 {
    message: Some(if SUPPORTED {
        varargs::message(message)
    } else {
        varargs::message_fixed(message_unformatted)
    }),
    setPersistentMessage: Some(if SUPPORTED {
        varargs::message(set_persistent_message)
    } else {
        varargs::message_fixed(set_persistent_message_unformatted)
    }),
    clearPersistentMessage: Some(clear_persistent_message),
};

/// Renders a message; without a format string the text is empty.
unsafe fn render(format_string: *const c_char, args: &mut VaArgs<'_>) -> String {
    match c_str(format_string) {
        Some(format_string) => format(format_string, args),
        None => String::new(),
    }
}

fn log(kind: Option<MessageType>, id: Option<&CStr>, text: &str) {
    let id = id.map(CStr::to_string_lossy).unwrap_or_default();
    match kind {
        Some(MessageType::Fatal | MessageType::Error) => tracing::error!(%id, "{text}"),
        Some(MessageType::Warning) => tracing::warn!(%id, "{text}"),
        Some(MessageType::Log) => tracing::debug!(%id, "{text}"),
        _ => tracing::info!(%id, "{text}"),
    }
}

fn post(message_type: *const c_char, id: *const c_char, text: String) -> OfxStatus {
    unsafe {
        let kind = c_str(message_type).and_then(MessageType::from_cstr);
        log(kind, c_str(id), &text);
    }
    kOfxStatOK
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn message(
    _handle: *mut c_void,
    message_type: *const c_char,
    id: *const c_char,
    format_string: *const c_char,
    a0: usize,
    a1: usize,
    f0: f64,
    f1: f64,
    f2: f64,
    f3: f64,
    f4: f64,
    f5: f64,
    f6: f64,
    f7: f64,
) -> OfxStatus {
    let ints = [a0, a1];
    let floats = [f0, f1, f2, f3, f4, f5, f6, f7];
    let text = render(format_string, &mut VaArgs::new(&ints, &floats));
    post(message_type, id, text)
}

unsafe extern "C" fn message_unformatted(
    _handle: *mut c_void,
    message_type: *const c_char,
    id: *const c_char,
    format_string: *const c_char,
) -> OfxStatus {
    let text = c_str(format_string)
        .map(|text| text.to_string_lossy().into_owned())
        .unwrap_or_default();
    post(message_type, id, text)
}

/// Stores a message on the effect. Only Error, Warning and Message may persist.
unsafe fn persist(handle: *mut c_void, message_type: *const c_char, text: impl FnOnce() -> String) -> OfxStatus {
    into_status((|| {
        let effect = handle_mut::<MeshEffect, _>(handle)?;
        let kind = c_str(message_type)
            .and_then(MessageType::from_cstr)
            .filter(|kind| {
                matches!(kind, MessageType::Error | MessageType::Warning | MessageType::Message)
            })
            .ok_or(MfxError::Value)?;
        let text = text();
        tracing::debug!(kind = ?kind, "persistent message: {text}");
        effect.set_persistent_message(kind, text);
        Ok(())
    })())
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn set_persistent_message(
    handle: *mut c_void,
    message_type: *const c_char,
    _id: *const c_char,
    format_string: *const c_char,
    a0: usize,
    a1: usize,
    f0: f64,
    f1: f64,
    f2: f64,
    f3: f64,
    f4: f64,
    f5: f64,
    f6: f64,
    f7: f64,
) -> OfxStatus {
    let ints = [a0, a1];
    let floats = [f0, f1, f2, f3, f4, f5, f6, f7];
    persist(handle, message_type, || {
        render(format_string, &mut VaArgs::new(&ints, &floats))
    })
}

unsafe extern "C" fn set_persistent_message_unformatted(
    handle: *mut c_void,
    message_type: *const c_char,
    _id: *const c_char,
    format_string: *const c_char,
) -> OfxStatus {
    persist(handle, message_type, || {
        c_str(format_string)
            .map(|text| text.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

unsafe extern "C" fn clear_persistent_message(handle: *mut c_void) -> OfxStatus {
    into_status((|| {
        handle_mut::<MeshEffect, _>(handle)?.clear_persistent_message();
        Ok(())
    })())
}
